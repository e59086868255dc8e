//! Component factories: the only way to instantiate a routed component.
//!
//! # Responsibility
//! - Describe a component (selector, type, content selectors, bindings).
//! - Resolve dependencies and the host location, then construct exactly one
//!   instance per `create()` call.
//!
//! # Invariants
//! - `create()` either returns a complete `ComponentRef` or an error; no
//!   partially constructed ref escapes.
//! - Selectors are validated when the factory is defined, not at creation.

use crate::component::component_ref::{
    ComponentInstance, ComponentRefHandle, ComponentType, ViewComponentRef,
};
use crate::component::injector::{
    resolve, HostRegistry, Injector, ModuleRef, Provided, StaticInjector, HOST_REGISTRY_TOKEN,
};
use crate::component::view::{ElementRef, ProjectableNodes, ViewRef};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

static ELEMENT_SELECTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").expect("element selector pattern is valid")
});

static ATTRIBUTE_SELECTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[[a-z][a-z0-9-]*\]$").expect("attribute selector pattern is valid")
});

/// Input/output property binding (`propName` <-> `templateName`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyBinding {
    pub prop_name: String,
    pub template_name: String,
}

/// Where a created component is hosted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostTarget {
    /// Resolve an existing host through the injector's `HostRegistry`.
    Selector(String),
    /// Use a caller-supplied element as is.
    Element(ElementRef),
}

/// Component creation and definition errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateError {
    /// Selector is neither a kebab-case element nor an `[attr]` selector.
    InvalidSelector(String),
    /// Declared dependency token is not provided by any injector.
    MissingDependency {
        component: String,
        token: String,
    },
    /// Requested host selector does not resolve to an element.
    HostNotFound(String),
    /// More projection groups than declared content selectors.
    TooManyProjectionGroups {
        component: String,
        declared: usize,
        supplied: usize,
    },
    /// Component constructor reported a failure.
    ConstructorFailed {
        component: String,
        message: String,
    },
}

impl Display for CreateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSelector(value) => write!(f, "component selector is invalid: `{value}`"),
            Self::MissingDependency { component, token } => {
                write!(f, "no provider for `{token}` while creating {component}")
            }
            Self::HostNotFound(selector) => {
                write!(f, "host selector `{selector}` did not match any element")
            }
            Self::TooManyProjectionGroups {
                component,
                declared,
                supplied,
            } => write!(
                f,
                "{component} declares {declared} content selector(s) but {supplied} projection group(s) were supplied"
            ),
            Self::ConstructorFailed { component, message } => {
                write!(f, "{component} constructor failed: {message}")
            }
        }
    }
}

impl Error for CreateError {}

/// Factory contract for one component type.
pub trait ComponentFactory: Send + Sync {
    /// Element or attribute selector of the component.
    fn selector(&self) -> &str;
    fn component_type(&self) -> &ComponentType;
    /// Selectors of every content-projection slot.
    fn content_selectors(&self) -> &[String];
    fn inputs(&self) -> &[PropertyBinding];
    fn outputs(&self) -> &[PropertyBinding];
    /// Creates one new component instance.
    ///
    /// # Errors
    /// Fails without side effects when a dependency, the host or the
    /// projection layout cannot be resolved, or the constructor fails.
    fn create(
        &self,
        injector: Arc<dyn Injector>,
        projectable_nodes: Option<ProjectableNodes>,
        root: Option<HostTarget>,
        module: Option<&ModuleRef>,
    ) -> Result<ComponentRefHandle, CreateError>;
}

/// Dependencies resolved for one constructor call.
pub struct ComponentDeps {
    values: BTreeMap<String, Provided>,
}

impl ComponentDeps {
    /// Returns the dependency provided under `token`, downcast to `T`.
    pub fn get<T: std::any::Any + Send + Sync>(&self, token: &str) -> Option<Arc<T>> {
        self.values
            .get(token)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.values.contains_key(token)
    }
}

type Constructor =
    Arc<dyn Fn(&ComponentDeps) -> Result<ComponentInstance, String> + Send + Sync>;

/// View-backed factory defined from a constructor closure.
#[derive(Clone)]
pub struct ViewComponentFactory {
    selector: String,
    component_type: ComponentType,
    content_selectors: Vec<String>,
    inputs: Vec<PropertyBinding>,
    outputs: Vec<PropertyBinding>,
    dependencies: Vec<String>,
    constructor: Constructor,
}

impl ViewComponentFactory {
    /// Defines a factory for `component_type` rendered at `selector`.
    ///
    /// # Errors
    /// - `InvalidSelector` when `selector` is not `kebab-case` or `[attr]`.
    pub fn new<F>(
        selector: &str,
        component_type: ComponentType,
        constructor: F,
    ) -> Result<Self, CreateError>
    where
        F: Fn(&ComponentDeps) -> Result<ComponentInstance, String> + Send + Sync + 'static,
    {
        let trimmed = selector.trim();
        if !is_valid_selector(trimmed) {
            return Err(CreateError::InvalidSelector(selector.to_string()));
        }
        Ok(Self {
            selector: trimmed.to_string(),
            component_type,
            content_selectors: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            dependencies: Vec::new(),
            constructor: Arc::new(constructor),
        })
    }

    /// Declares a dependency token the constructor needs.
    pub fn with_dependency(mut self, token: impl Into<String>) -> Self {
        self.dependencies.push(token.into());
        self
    }

    pub fn with_content_selector(mut self, selector: impl Into<String>) -> Self {
        self.content_selectors.push(selector.into());
        self
    }

    pub fn with_input(mut self, prop_name: &str, template_name: &str) -> Self {
        self.inputs.push(PropertyBinding {
            prop_name: prop_name.to_string(),
            template_name: template_name.to_string(),
        });
        self
    }

    pub fn with_output(mut self, prop_name: &str, template_name: &str) -> Self {
        self.outputs.push(PropertyBinding {
            prop_name: prop_name.to_string(),
            template_name: template_name.to_string(),
        });
        self
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn shared(self) -> Arc<dyn ComponentFactory> {
        Arc::new(self)
    }

    fn resolve_dependencies(
        &self,
        injector: &dyn Injector,
        module: Option<&ModuleRef>,
    ) -> Result<ComponentDeps, CreateError> {
        let mut values = BTreeMap::new();
        for token in &self.dependencies {
            let value = injector
                .get(token)
                .or_else(|| module.and_then(|module| module.injector().get(token)))
                .ok_or_else(|| CreateError::MissingDependency {
                    component: self.component_type.name().to_string(),
                    token: token.clone(),
                })?;
            values.insert(token.clone(), value);
        }
        Ok(ComponentDeps { values })
    }

    fn resolve_host(
        &self,
        injector: &dyn Injector,
        module: Option<&ModuleRef>,
        root: Option<HostTarget>,
    ) -> Result<ElementRef, CreateError> {
        match root {
            None => Ok(ElementRef::new(self.selector.as_str())),
            Some(HostTarget::Element(element)) => Ok(element),
            Some(HostTarget::Selector(selector)) => {
                let registry = resolve::<HostRegistry>(injector, HOST_REGISTRY_TOKEN).or_else(
                    || {
                        module.and_then(|module| {
                            resolve::<HostRegistry>(module.injector().as_ref(), HOST_REGISTRY_TOKEN)
                        })
                    },
                );
                registry
                    .and_then(|registry| registry.resolve(&selector).cloned())
                    .ok_or(CreateError::HostNotFound(selector))
            }
        }
    }
}

impl ComponentFactory for ViewComponentFactory {
    fn selector(&self) -> &str {
        &self.selector
    }

    fn component_type(&self) -> &ComponentType {
        &self.component_type
    }

    fn content_selectors(&self) -> &[String] {
        &self.content_selectors
    }

    fn inputs(&self) -> &[PropertyBinding] {
        &self.inputs
    }

    fn outputs(&self) -> &[PropertyBinding] {
        &self.outputs
    }

    fn create(
        &self,
        injector: Arc<dyn Injector>,
        projectable_nodes: Option<ProjectableNodes>,
        root: Option<HostTarget>,
        module: Option<&ModuleRef>,
    ) -> Result<ComponentRefHandle, CreateError> {
        let projected = projectable_nodes.unwrap_or_default();
        if projected.len() > self.content_selectors.len() {
            return Err(CreateError::TooManyProjectionGroups {
                component: self.component_type.name().to_string(),
                declared: self.content_selectors.len(),
                supplied: projected.len(),
            });
        }

        let deps = self.resolve_dependencies(injector.as_ref(), module)?;
        let location = self.resolve_host(injector.as_ref(), module, root)?;
        let instance =
            (self.constructor)(&deps).map_err(|message| CreateError::ConstructorFailed {
                component: self.component_type.name().to_string(),
                message,
            })?;

        // Descendants resolve this instance by its type name.
        let component_injector = StaticInjector::with_parent(injector)
            .provide_erased(self.component_type.name(), Arc::clone(&instance))
            .shared();
        let component = ViewComponentRef::new(
            self.component_type.clone(),
            location,
            component_injector,
            ViewRef::new(projected),
            instance,
        );

        debug!(
            "event=component_created module=component status=ok component={} selector={}",
            self.component_type, self.selector
        );
        Ok(Arc::new(component))
    }
}

impl Debug for ViewComponentFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewComponentFactory")
            .field("selector", &self.selector)
            .field("component_type", &self.component_type)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

fn is_valid_selector(value: &str) -> bool {
    ELEMENT_SELECTOR.is_match(value) || ATTRIBUTE_SELECTOR.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::{ComponentFactory, CreateError, HostTarget, ViewComponentFactory};
    use crate::component::component_ref::ComponentType;
    use crate::component::injector::{
        HostRegistry, Injector, ModuleRef, StaticInjector, HOST_REGISTRY_TOKEN,
    };
    use std::sync::Arc;

    fn greeter() -> ViewComponentFactory {
        ViewComponentFactory::new("app-greeter", ComponentType::new("Greeter"), |deps| {
            let name = deps
                .get::<String>("UserName")
                .ok_or_else(|| "UserName missing".to_string())?;
            Ok(Arc::new(format!("hello {name}")))
        })
        .expect("valid selector")
        .with_dependency("UserName")
        .with_content_selector("[slot=header]")
        .with_input("name", "userName")
        .with_output("greeted", "onGreet")
    }

    #[test]
    fn rejects_invalid_selectors() {
        for selector in ["AppGreeter", "app_greeter", "-app", "[Bad]", ""] {
            let result = ViewComponentFactory::new(selector, ComponentType::new("X"), |_| {
                Ok(Arc::new(()))
            });
            assert!(matches!(result, Err(CreateError::InvalidSelector(_))));
        }
        ViewComponentFactory::new("[app-tooltip]", ComponentType::new("Tooltip"), |_| {
            Ok(Arc::new(()))
        })
        .expect("attribute selector should be valid");
    }

    #[test]
    fn creates_instance_with_resolved_dependencies() {
        let injector = StaticInjector::new()
            .provide("UserName", "ada".to_string())
            .shared();
        let factory = greeter();
        let component = factory
            .create(injector, None, None, None)
            .expect("component should be created");

        let instance = component.instance().expect("live instance");
        assert_eq!(
            instance.downcast_ref::<String>().map(String::as_str),
            Some("hello ada")
        );
        assert_eq!(component.location().tag(), "app-greeter");
        assert_eq!(component.component_type().name(), "Greeter");
        assert!(component.injector().get("Greeter").is_some());
        assert_eq!(factory.inputs()[0].template_name, "userName");
        assert_eq!(factory.outputs()[0].prop_name, "greeted");
    }

    #[test]
    fn falls_back_to_module_injector() {
        let module = ModuleRef::new(
            "FeatureModule",
            StaticInjector::new()
                .provide("UserName", "grace".to_string())
                .shared(),
        );
        let component = greeter()
            .create(StaticInjector::new().shared(), None, None, Some(&module))
            .expect("module provides the dependency");
        assert!(component.instance().is_some());
    }

    #[test]
    fn reports_missing_dependency_and_unknown_host() {
        let err = greeter()
            .create(StaticInjector::new().shared(), None, None, None)
            .err()
            .expect("missing dependency must fail");
        assert_eq!(
            err,
            CreateError::MissingDependency {
                component: "Greeter".to_string(),
                token: "UserName".to_string(),
            }
        );

        let injector = StaticInjector::new()
            .provide("UserName", "ada".to_string())
            .provide(HOST_REGISTRY_TOKEN, HostRegistry::new().with_host("#main"))
            .shared();
        let err = greeter()
            .create(
                Arc::clone(&injector),
                None,
                Some(HostTarget::Selector("#sidebar".to_string())),
                None,
            )
            .err()
            .expect("unknown host must fail");
        assert_eq!(err, CreateError::HostNotFound("#sidebar".to_string()));

        let component = greeter()
            .create(
                injector,
                None,
                Some(HostTarget::Selector("#main".to_string())),
                None,
            )
            .expect("registered host resolves");
        assert_eq!(component.location().tag(), "main");
    }

    #[test]
    fn rejects_extra_projection_groups() {
        let injector = StaticInjector::new()
            .provide("UserName", "ada".to_string())
            .shared();
        let err = greeter()
            .create(
                injector,
                Some(vec![vec!["h1".to_string()], vec!["p".to_string()]]),
                None,
                None,
            )
            .err()
            .expect("two groups for one slot must fail");
        assert!(matches!(
            err,
            CreateError::TooManyProjectionGroups {
                declared: 1,
                supplied: 2,
                ..
            }
        ));
    }
}
