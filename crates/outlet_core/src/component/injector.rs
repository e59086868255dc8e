//! Dependency lookup seam used by component factories.
//!
//! The real dependency-injection container is external. `Injector` is the
//! narrow contract factories resolve tokens through; `StaticInjector` is a
//! map-backed implementation with parent fallback.

use crate::component::view::ElementRef;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Token under which a `HostRegistry` is provided.
pub const HOST_REGISTRY_TOKEN: &str = "HostRegistry";

/// Type-erased provided value.
pub type Provided = Arc<dyn Any + Send + Sync>;

/// Token-based dependency lookup.
pub trait Injector: Send + Sync {
    /// Returns the value provided for `token`, searching parents as needed.
    fn get(&self, token: &str) -> Option<Provided>;
}

/// Resolves `token` and downcasts it to `T`.
///
/// Returns `None` when the token is missing or provided with another type.
pub fn resolve<T: Any + Send + Sync>(injector: &dyn Injector, token: &str) -> Option<Arc<T>> {
    injector.get(token)?.downcast::<T>().ok()
}

/// Map-backed injector with optional parent fallback.
#[derive(Default)]
pub struct StaticInjector {
    providers: BTreeMap<String, Provided>,
    parent: Option<Arc<dyn Injector>>,
}

impl StaticInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an injector that falls back to `parent` for unknown tokens.
    pub fn with_parent(parent: Arc<dyn Injector>) -> Self {
        Self {
            providers: BTreeMap::new(),
            parent: Some(parent),
        }
    }

    /// Provides `value` under `token`; later calls for the same token win.
    pub fn provide<T: Any + Send + Sync>(mut self, token: impl Into<String>, value: T) -> Self {
        self.providers.insert(token.into(), Arc::new(value));
        self
    }

    /// Provides an already type-erased value.
    pub fn provide_erased(mut self, token: impl Into<String>, value: Provided) -> Self {
        self.providers.insert(token.into(), value);
        self
    }

    pub fn shared(self) -> Arc<dyn Injector> {
        Arc::new(self)
    }

    /// Tokens provided directly by this injector (parents excluded).
    pub fn tokens(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

impl Injector for StaticInjector {
    fn get(&self, token: &str) -> Option<Provided> {
        if let Some(value) = self.providers.get(token) {
            return Some(Arc::clone(value));
        }
        self.parent.as_ref().and_then(|parent| parent.get(token))
    }
}

impl Debug for StaticInjector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticInjector")
            .field("tokens", &self.tokens())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Host module whose injector backs dependency lookups the element injector misses.
#[derive(Clone)]
pub struct ModuleRef {
    name: String,
    injector: Arc<dyn Injector>,
}

impl ModuleRef {
    pub fn new(name: impl Into<String>, injector: Arc<dyn Injector>) -> Self {
        Self {
            name: name.into(),
            injector,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn injector(&self) -> &Arc<dyn Injector> {
        &self.injector
    }
}

impl Debug for ModuleRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRef").field("name", &self.name).finish()
    }
}

/// Host elements the renderer already materialised, addressable by selector.
#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    hosts: BTreeMap<String, ElementRef>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a host element reachable through `selector`.
    pub fn with_host(mut self, selector: impl Into<String>) -> Self {
        let selector = selector.into();
        let element = ElementRef::new(selector.trim_start_matches('#'));
        self.hosts.insert(selector, element);
        self
    }

    pub fn resolve(&self, selector: &str) -> Option<&ElementRef> {
        self.hosts.get(selector.trim())
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
