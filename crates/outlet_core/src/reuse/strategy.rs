//! Route reuse strategy contract and default policy.

use crate::model::route::RouteSnapshot;
use crate::reuse::handle::DetachedRouteHandle;

/// Policy consulted by the reconciler at every route position.
///
/// Every method except `store` is a pure decision over snapshot identity.
pub trait RouteReuseStrategy {
    /// Whether `route` (and its subtree) should be detached instead of destroyed.
    fn should_detach(&self, route: &RouteSnapshot) -> bool;

    /// Stores a detached subtree under a key derived from `route`.
    ///
    /// `None` erases the stored value; erasing an unknown key is a no-op.
    fn store(&mut self, route: &RouteSnapshot, handle: Option<DetachedRouteHandle>);

    /// Whether a stored subtree should be reattached for `route`.
    fn should_attach(&self, route: &RouteSnapshot) -> bool;

    /// Returns the subtree stored for `route`.
    ///
    /// Only called after `should_attach(route)` returned `true`; returning
    /// `None` then aborts the navigation as a contract violation.
    fn retrieve(&self, route: &RouteSnapshot) -> Option<DetachedRouteHandle>;

    /// Whether the component mounted for `current` stays for `future`.
    fn should_reuse_route(&self, future: &RouteSnapshot, current: &RouteSnapshot) -> bool;
}

/// Never detaches; reuses a route only when its config object is unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultReuseStrategy;

impl DefaultReuseStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl RouteReuseStrategy for DefaultReuseStrategy {
    fn should_detach(&self, _route: &RouteSnapshot) -> bool {
        false
    }

    fn store(&mut self, _route: &RouteSnapshot, _handle: Option<DetachedRouteHandle>) {}

    fn should_attach(&self, _route: &RouteSnapshot) -> bool {
        false
    }

    fn retrieve(&self, _route: &RouteSnapshot) -> Option<DetachedRouteHandle> {
        None
    }

    fn should_reuse_route(&self, future: &RouteSnapshot, current: &RouteSnapshot) -> bool {
        future.same_config(current)
    }
}

impl<S: RouteReuseStrategy + ?Sized> RouteReuseStrategy for Box<S> {
    fn should_detach(&self, route: &RouteSnapshot) -> bool {
        (**self).should_detach(route)
    }

    fn store(&mut self, route: &RouteSnapshot, handle: Option<DetachedRouteHandle>) {
        (**self).store(route, handle)
    }

    fn should_attach(&self, route: &RouteSnapshot) -> bool {
        (**self).should_attach(route)
    }

    fn retrieve(&self, route: &RouteSnapshot) -> Option<DetachedRouteHandle> {
        (**self).retrieve(route)
    }

    fn should_reuse_route(&self, future: &RouteSnapshot, current: &RouteSnapshot) -> bool {
        (**self).should_reuse_route(future, current)
    }
}
