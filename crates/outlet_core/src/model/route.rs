//! Route configuration and immutable route snapshots.
//!
//! # Responsibility
//! - Define static `RouteConfig` records shared by every navigation.
//! - Define `RouteSnapshot`, the per-navigation value the reuse strategy sees.
//!
//! # Invariants
//! - Config identity is `Arc::ptr_eq`; two structurally equal configs are
//!   still different routes.
//! - Path patterns and outlet names are validated at construction.
//! - The root snapshot is the only snapshot without a config.

use crate::component::factory::ComponentFactory;
use crate::model::tree::TreeNode;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Name of the default (unnamed) outlet.
pub const PRIMARY_OUTLET: &str = "primary";

static PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*\*|(:[A-Za-z_][A-Za-z0-9_]*|[A-Za-z0-9._~-]+)(/(:[A-Za-z_][A-Za-z0-9_]*|[A-Za-z0-9._~-]+))*)?$")
        .expect("route path pattern is a valid regex")
});

static OUTLET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("outlet name pattern is a valid regex")
});

/// Shared parameter map (`:id` -> `42`).
pub type RouteParams = BTreeMap<String, String>;

/// Route declaration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteConfigError {
    InvalidPath(String),
    InvalidOutlet(String),
}

impl Display for RouteConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(value) => write!(f, "route path pattern is invalid: `{value}`"),
            Self::InvalidOutlet(value) => write!(f, "outlet name is invalid: `{value}`"),
        }
    }
}

impl Error for RouteConfigError {}

/// Static route definition.
///
/// Configs are created once and shared as `Arc<RouteConfig>`; every snapshot
/// matched against this route points at the same allocation.
pub struct RouteConfig {
    id: Uuid,
    path: String,
    outlet: String,
    component: Option<Arc<dyn ComponentFactory>>,
    data: BTreeMap<String, Value>,
}

impl RouteConfig {
    /// Creates a primary-outlet route for one path pattern.
    ///
    /// # Errors
    /// - `InvalidPath` when the pattern is not empty, `**`, or `/`-separated
    ///   literal and `:param` segments.
    pub fn new(path: &str) -> Result<Self, RouteConfigError> {
        let trimmed = path.trim().trim_start_matches('/');
        if !PATH_PATTERN.is_match(trimmed) {
            return Err(RouteConfigError::InvalidPath(path.to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            path: trimmed.to_string(),
            outlet: PRIMARY_OUTLET.to_string(),
            component: None,
            data: BTreeMap::new(),
        })
    }

    /// Moves this route to a named outlet.
    pub fn outlet(mut self, outlet: &str) -> Result<Self, RouteConfigError> {
        let trimmed = outlet.trim();
        if !OUTLET_PATTERN.is_match(trimmed) {
            return Err(RouteConfigError::InvalidOutlet(outlet.to_string()));
        }
        self.outlet = trimmed.to_string();
        Ok(self)
    }

    /// Sets the factory used to create this route's component.
    pub fn component(mut self, factory: Arc<dyn ComponentFactory>) -> Self {
        self.component = Some(factory);
        self
    }

    /// Attaches one static data entry copied into every snapshot.
    pub fn data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Identity of this declaration, unique per constructed config.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn outlet_name(&self) -> &str {
        &self.outlet
    }

    pub fn component_factory(&self) -> Option<&Arc<dyn ComponentFactory>> {
        self.component.as_ref()
    }

    pub fn static_data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    /// Names of `:param` segments declared by the path pattern.
    pub fn param_names(&self) -> Vec<&str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
            .collect()
    }
}

impl Debug for RouteConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteConfig")
            .field("path", &self.path)
            .field("outlet", &self.outlet)
            .field(
                "component",
                &self.component.as_ref().map(|factory| factory.selector()),
            )
            .finish()
    }
}

/// Immutable record of one matched route at one navigation.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSnapshot {
    #[serde(skip)]
    route_config: Option<Arc<RouteConfig>>,
    outlet: String,
    url: Vec<String>,
    params: RouteParams,
    query_params: RouteParams,
    data: BTreeMap<String, Value>,
}

impl RouteSnapshot {
    /// Snapshot for the application root (no config, primary outlet).
    pub fn root() -> Self {
        Self {
            route_config: None,
            outlet: PRIMARY_OUTLET.to_string(),
            url: Vec::new(),
            params: RouteParams::new(),
            query_params: RouteParams::new(),
            data: BTreeMap::new(),
        }
    }

    /// Snapshot matched against `config`; inherits its outlet and static data.
    pub fn for_config(config: &Arc<RouteConfig>) -> Self {
        Self {
            route_config: Some(Arc::clone(config)),
            outlet: config.outlet_name().to_string(),
            url: Vec::new(),
            params: RouteParams::new(),
            query_params: RouteParams::new(),
            data: config.static_data().clone(),
        }
    }

    pub fn with_url<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.url = segments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Resolved data entry; overrides static config data with the same key.
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn route_config(&self) -> Option<&Arc<RouteConfig>> {
        self.route_config.as_ref()
    }

    pub fn outlet(&self) -> &str {
        &self.outlet
    }

    pub fn url(&self) -> &[String] {
        &self.url
    }

    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn query_params(&self) -> &RouteParams {
        &self.query_params
    }

    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    pub fn is_root(&self) -> bool {
        self.route_config.is_none()
    }

    /// Returns whether both snapshots point at the very same config object.
    ///
    /// Two root snapshots (no config) are considered the same route.
    pub fn same_config(&self, other: &RouteSnapshot) -> bool {
        match (&self.route_config, &other.route_config) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns whether url, params, query params and data are all equal.
    pub fn same_bindings(&self, other: &RouteSnapshot) -> bool {
        self.url == other.url
            && self.params == other.params
            && self.query_params == other.query_params
            && self.data == other.data
    }

    /// Readable label `outlet:path` used by keyed reuse strategies.
    ///
    /// Configs declared at different depths may share a label; pair it with
    /// `RouteConfig::id` to address one route. Returns `None` for the root.
    pub fn store_key(&self) -> Option<String> {
        self.route_config
            .as_ref()
            .map(|config| format!("{}:{}", self.outlet, config.path()))
    }
}

impl TreeNode<RouteSnapshot> {
    /// Child snapshot rendered into `outlet`, if any.
    pub fn child_for_outlet(&self, outlet: &str) -> Option<&TreeNode<RouteSnapshot>> {
        self.children
            .iter()
            .find(|child| child.value.outlet() == outlet)
    }

    /// Returns the first outlet name that appears twice among the children.
    pub fn duplicate_outlet(&self) -> Option<&str> {
        duplicate_outlet(&self.children)
    }
}

/// Returns the first outlet name shared by two siblings.
pub(crate) fn duplicate_outlet(nodes: &[TreeNode<RouteSnapshot>]) -> Option<&str> {
    let mut seen = BTreeSet::new();
    nodes
        .iter()
        .map(|node| node.value.outlet())
        .find(|outlet| !seen.insert(*outlet))
}

#[cfg(test)]
mod tests {
    use super::{RouteConfig, RouteConfigError, RouteSnapshot, PRIMARY_OUTLET};
    use crate::model::tree::TreeNode;
    use serde_json::json;

    #[test]
    fn accepts_literal_param_and_wildcard_paths() {
        for path in ["", "users", "users/:id", "/files/:dir/raw", "**", "a.b/c-d_e~f"] {
            RouteConfig::new(path).expect("path should be accepted");
        }
    }

    #[test]
    fn rejects_malformed_paths_and_outlets() {
        let err = RouteConfig::new("users//:id").expect_err("empty segment must fail");
        assert!(matches!(err, RouteConfigError::InvalidPath(_)));
        let err = RouteConfig::new("users/:").expect_err("unnamed param must fail");
        assert!(matches!(err, RouteConfigError::InvalidPath(_)));

        let err = RouteConfig::new("users")
            .expect("valid path")
            .outlet("side bar")
            .expect_err("outlet with space must fail");
        assert_eq!(err, RouteConfigError::InvalidOutlet("side bar".to_string()));
    }

    #[test]
    fn snapshot_inherits_outlet_and_static_data() {
        let config = RouteConfig::new("users/:id")
            .expect("valid path")
            .outlet("detail")
            .expect("valid outlet")
            .data("title", json!("User"))
            .shared();
        let snapshot = RouteSnapshot::for_config(&config)
            .with_param("id", "7")
            .with_data("title", json!("Override"));

        assert_eq!(snapshot.outlet(), "detail");
        assert_eq!(snapshot.param("id"), Some("7"));
        assert_eq!(snapshot.data()["title"], json!("Override"));
        assert_eq!(snapshot.store_key().as_deref(), Some("detail:users/:id"));
        assert_eq!(config.param_names(), vec!["id"]);
    }

    #[test]
    fn same_config_uses_identity_not_structure() {
        let left = RouteConfig::new("users").expect("valid path").shared();
        let twin = RouteConfig::new("users").expect("valid path").shared();

        let a = RouteSnapshot::for_config(&left);
        let b = RouteSnapshot::for_config(&left).with_param("page", "2");
        let c = RouteSnapshot::for_config(&twin);

        assert!(a.same_config(&b));
        assert!(!a.same_config(&c));
        assert!(RouteSnapshot::root().same_config(&RouteSnapshot::root()));
        assert!(!RouteSnapshot::root().same_config(&a));
    }

    #[test]
    fn detects_duplicate_sibling_outlets() {
        let config = RouteConfig::new("a").expect("valid path").shared();
        let tree = TreeNode::new(RouteSnapshot::root())
            .with_child(TreeNode::new(RouteSnapshot::for_config(&config)))
            .with_child(TreeNode::new(RouteSnapshot::for_config(&config)));

        assert_eq!(tree.duplicate_outlet(), Some(PRIMARY_OUTLET));
        assert!(tree.child_for_outlet(PRIMARY_OUTLET).is_some());
        assert!(tree.child_for_outlet("aux").is_none());
    }
}
