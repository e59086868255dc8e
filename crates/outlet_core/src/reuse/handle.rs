//! Opaque detached-subtree handle.

use crate::component::component_ref::{ComponentRefHandle, DestroyError};
use crate::model::route::RouteSnapshot;
use crate::model::tree::{OutletPath, TreeNode};
use crate::outlet::activated_route::ActivatedRoute;
use crate::outlet::context::OutletContextStore;
use log::debug;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Mounted state of one detached subtree.
pub(crate) struct DetachedSubtree {
    pub(crate) contexts: OutletContextStore,
    pub(crate) component_ref: ComponentRefHandle,
    pub(crate) activated_route: ActivatedRoute,
    pub(crate) route: TreeNode<RouteSnapshot>,
}

struct HandleInner {
    id: Uuid,
    config: Option<Uuid>,
    spent: AtomicBool,
    subtree: Mutex<Option<DetachedSubtree>>,
}

/// Opaque token for a detached subtree.
///
/// Clones share the same subtree. The subtree can be reattached exactly once;
/// afterwards (or after `destroy`) the handle is spent.
#[derive(Clone)]
pub struct DetachedRouteHandle {
    inner: Arc<HandleInner>,
}

impl DetachedRouteHandle {
    pub(crate) fn new(subtree: DetachedSubtree) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: Uuid::new_v4(),
                config: subtree.route.value.route_config().map(|config| config.id()),
                spent: AtomicBool::new(false),
                subtree: Mutex::new(Some(subtree)),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Id of the route config the subtree was detached from.
    pub fn route_config_id(&self) -> Option<Uuid> {
        self.inner.config
    }

    /// Returns whether the subtree was already reattached or destroyed.
    pub fn is_spent(&self) -> bool {
        self.inner.spent.load(Ordering::Acquire)
    }

    /// Destroys the held subtree (children before parent) and spends the handle.
    ///
    /// Spent handles are left untouched.
    ///
    /// # Errors
    /// Aggregates destroy-callback failures of every component in the subtree.
    pub fn destroy(&self) -> Result<(), DestroyError> {
        let Some(subtree) = self.take() else {
            return Ok(());
        };
        let path = OutletPath::root().child(subtree.route.value.outlet());
        let mut destroyed = 0_usize;
        let mut failures = subtree
            .contexts
            .destroy_all(&path, &mut |_, _| destroyed += 1);
        if let Err(err) = subtree.component_ref.destroy() {
            failures.extend(err.failures);
        }
        debug!(
            "event=detached_handle_destroyed module=reuse status={} handle={} components={}",
            if failures.is_empty() { "ok" } else { "error" },
            self.id(),
            destroyed + 1
        );
        DestroyError::from_failures(failures)
    }

    /// Takes the subtree out for reattachment.
    pub(crate) fn take(&self) -> Option<DetachedSubtree> {
        let taken = self.lock().take();
        if taken.is_some() {
            self.inner.spent.store(true, Ordering::Release);
        }
        taken
    }

    /// Puts a taken subtree back (rollback of an aborted reattachment).
    pub(crate) fn restore(&self, subtree: DetachedSubtree) {
        *self.lock() = Some(subtree);
        self.inner.spent.store(false, Ordering::Release);
    }

    /// Runs `f` against the held subtree without taking it.
    pub(crate) fn with_subtree<R>(&self, f: impl FnOnce(&DetachedSubtree) -> R) -> Option<R> {
        self.lock().as_ref().map(f)
    }

    fn lock(&self) -> MutexGuard<'_, Option<DetachedSubtree>> {
        self.inner
            .subtree
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for DetachedRouteHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for DetachedRouteHandle {}

impl Debug for DetachedRouteHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetachedRouteHandle")
            .field("id", &self.inner.id)
            .field("spent", &self.is_spent())
            .finish()
    }
}
