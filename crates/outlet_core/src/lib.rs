//! Core outlet runtime: route reuse, outlet reconciliation and component lifecycle.
//! This crate is the single source of truth for what happens to mounted
//! components when a navigation completes.

pub mod component;
pub mod config;
pub mod logging;
pub mod model;
pub mod outlet;
pub mod reconcile;
pub mod reuse;
pub mod router;

pub use component::component_ref::{
    destroy_callback, ComponentInstance, ComponentRef, ComponentRefHandle, ComponentType,
    DestroyCallback, DestroyError, HookFailure,
};
pub use component::factory::{
    ComponentDeps, ComponentFactory, CreateError, HostTarget, PropertyBinding,
    ViewComponentFactory,
};
pub use component::injector::{
    resolve, HostRegistry, Injector, ModuleRef, StaticInjector, HOST_REGISTRY_TOKEN,
};
pub use component::view::{ChangeDetectorRef, ElementRef, ProjectableNodes, ViewRef};
pub use config::{ConfigError, ReuseConfig, RouterConfig};
pub use logging::{default_log_level, init_logging, LogLevels, LoggingError, Subsystem};
pub use model::route::{RouteConfig, RouteConfigError, RouteParams, RouteSnapshot, PRIMARY_OUTLET};
pub use model::tree::{OutletPath, TreeNode};
pub use outlet::activated_route::{ActivatedRoute, ACTIVATED_ROUTE_TOKEN};
pub use outlet::context::{OutletContext, OutletContextStore};
pub use reconcile::error::ReconcileError;
pub use reconcile::reconciler::Reconciler;
pub use reconcile::report::{EventKind, LifecycleEvent, ReconcileReport};
pub use reuse::caching::{CachingReuseStrategy, DEFAULT_CACHE_CAPACITY};
pub use reuse::handle::DetachedRouteHandle;
pub use reuse::strategy::{DefaultReuseStrategy, RouteReuseStrategy};
pub use router::{NavigationError, NavigationTicket, Router};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
