//! Observable route binding shared between an outlet and its component.

use crate::component::injector::{Injector, StaticInjector};
use crate::model::route::RouteSnapshot;
use std::sync::{Arc, PoisonError, RwLock};

/// Token under which an outlet injector provides its `ActivatedRoute`.
pub const ACTIVATED_ROUTE_TOKEN: &str = "ActivatedRoute";

#[derive(Debug)]
struct RouteBinding {
    snapshot: RouteSnapshot,
    version: u64,
}

/// Current snapshot of one outlet position.
///
/// Reused components keep the same `ActivatedRoute`; the reconciler advances
/// it to the future snapshot and bumps `version` when bindings changed.
#[derive(Debug, Clone)]
pub struct ActivatedRoute {
    inner: Arc<RwLock<RouteBinding>>,
}

impl ActivatedRoute {
    pub fn new(snapshot: RouteSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RouteBinding {
                snapshot,
                version: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> RouteSnapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    /// Number of times the binding changed since creation.
    pub fn version(&self) -> u64 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    /// Returns whether `self` and `other` are the same binding.
    pub fn ptr_eq(&self, other: &ActivatedRoute) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Rebinds to `next`; returns whether url, params or data changed.
    pub(crate) fn advance(&self, next: RouteSnapshot) -> bool {
        let mut binding = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let changed = !binding.snapshot.same_bindings(&next);
        binding.snapshot = next;
        if changed {
            binding.version += 1;
        }
        changed
    }
}

/// Builds the injector a routed component is created with.
pub(crate) fn outlet_injector(
    route: &ActivatedRoute,
    parent: Arc<dyn Injector>,
) -> Arc<dyn Injector> {
    StaticInjector::with_parent(parent)
        .provide(ACTIVATED_ROUTE_TOKEN, route.clone())
        .shared()
}
