//! Outlet context store.
//!
//! # Responsibility
//! - Map outlet names to live contexts, one level per mounted component.
//! - Address nested contexts by `OutletPath`.
//! - Tear a context subtree down in a fixed order.
//!
//! # Invariants
//! - At most one `ComponentRef` per context.
//! - Sibling contexts iterate in outlet-name order.
//! - Subtree destruction runs children before their parent.

use crate::component::component_ref::{ComponentRefHandle, DestroyError, HookFailure};
use crate::model::route::RouteSnapshot;
use crate::model::tree::{OutletPath, TreeNode};
use crate::outlet::activated_route::ActivatedRoute;
use log::warn;
use std::collections::BTreeMap;

/// Live binding of one outlet position.
#[derive(Default)]
pub struct OutletContext {
    component_ref: Option<ComponentRefHandle>,
    route: Option<ActivatedRoute>,
    children: OutletContextStore,
}

impl OutletContext {
    pub fn component_ref(&self) -> Option<&ComponentRefHandle> {
        self.component_ref.as_ref()
    }

    pub fn route(&self) -> Option<&ActivatedRoute> {
        self.route.as_ref()
    }

    pub fn children(&self) -> &OutletContextStore {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut OutletContextStore {
        &mut self.children
    }

    /// Returns whether a component is mounted here.
    pub fn is_activated(&self) -> bool {
        self.component_ref.is_some()
    }

    /// Snapshot subtree this context currently represents.
    ///
    /// Returns `None` when no route is bound.
    pub fn snapshot_tree(&self) -> Option<TreeNode<RouteSnapshot>> {
        let route = self.route.as_ref()?;
        Some(TreeNode::new(route.snapshot()).with_children(self.children.snapshot_trees()))
    }

    /// Mounts `component_ref` bound to `route`.
    ///
    /// A component that is still mounted here is destroyed first.
    pub(crate) fn activate_with(
        &mut self,
        component_ref: ComponentRefHandle,
        route: ActivatedRoute,
    ) -> Result<(), DestroyError> {
        let previous = self.component_ref.replace(component_ref);
        self.route = Some(route);
        match previous {
            Some(previous) => {
                warn!(
                    "event=outlet_overwrite module=outlet status=error component={}",
                    previous.component_type()
                );
                previous.destroy()
            }
            None => Ok(()),
        }
    }

    /// Splits this context into its parts.
    pub(crate) fn into_parts(
        self,
    ) -> (
        Option<ComponentRefHandle>,
        Option<ActivatedRoute>,
        OutletContextStore,
    ) {
        (self.component_ref, self.route, self.children)
    }
}

/// Child outlet contexts of one component (or of the application root).
#[derive(Default)]
pub struct OutletContextStore {
    contexts: BTreeMap<String, OutletContext>,
}

impl OutletContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn outlet_names(&self) -> Vec<&str> {
        self.contexts.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutletContext)> {
        self.contexts
            .iter()
            .map(|(outlet, context)| (outlet.as_str(), context))
    }

    pub fn get_context(&self, outlet: &str) -> Option<&OutletContext> {
        self.contexts.get(outlet)
    }

    pub(crate) fn get_context_mut(&mut self, outlet: &str) -> Option<&mut OutletContext> {
        self.contexts.get_mut(outlet)
    }

    pub(crate) fn get_or_create_context(&mut self, outlet: &str) -> &mut OutletContext {
        self.contexts.entry(outlet.to_string()).or_default()
    }

    /// Removes one context (the outlet is going away).
    pub(crate) fn remove_context(&mut self, outlet: &str) -> Option<OutletContext> {
        self.contexts.remove(outlet)
    }

    /// Takes every context out, leaving this store empty.
    pub(crate) fn on_outlet_deactivated(&mut self) -> OutletContextStore {
        std::mem::take(self)
    }

    /// Replaces every context with previously detached ones.
    pub(crate) fn on_outlet_reattached(&mut self, contexts: OutletContextStore) {
        let stale = std::mem::replace(self, contexts);
        if !stale.is_empty() {
            warn!(
                "event=reattach_over_live_contexts module=outlet status=error count={}",
                stale.len()
            );
            for failure in stale.destroy_all(&OutletPath::root(), &mut |_, _| {}) {
                warn!(
                    "event=destroy_callback_failed module=outlet status=error detail={}",
                    failure
                );
            }
        }
    }

    /// Looks a nested context up by its outlet path.
    pub fn context_at(&self, path: &OutletPath) -> Option<&OutletContext> {
        let (first, rest) = path.segments().split_first()?;
        let mut context = self.contexts.get(first)?;
        for outlet in rest {
            context = context.children.contexts.get(outlet)?;
        }
        Some(context)
    }

    /// Component mounted at `path`, if any.
    pub fn component_at(&self, path: &OutletPath) -> Option<&ComponentRefHandle> {
        self.context_at(path)?.component_ref()
    }

    /// Paths of every mounted component, parents before children.
    pub fn mounted_paths(&self) -> Vec<OutletPath> {
        let mut out = Vec::new();
        self.collect_mounted(&OutletPath::root(), &mut out);
        out
    }

    fn collect_mounted(&self, base: &OutletPath, out: &mut Vec<OutletPath>) {
        for (outlet, context) in &self.contexts {
            let path = base.child(outlet);
            if context.is_activated() {
                out.push(path.clone());
            }
            context.children.collect_mounted(&path, out);
        }
    }

    /// Snapshot subtrees of every bound context, in outlet-name order.
    pub fn snapshot_trees(&self) -> Vec<TreeNode<RouteSnapshot>> {
        self.contexts
            .values()
            .filter_map(OutletContext::snapshot_tree)
            .collect()
    }

    /// Destroys every context below `base`, children before parents.
    ///
    /// `on_destroyed` observes each destroyed component with its path.
    pub(crate) fn destroy_all(
        self,
        base: &OutletPath,
        on_destroyed: &mut dyn FnMut(&OutletPath, &ComponentRefHandle),
    ) -> Vec<HookFailure> {
        let mut failures = Vec::new();
        for (outlet, context) in self.contexts {
            let path = base.child(&outlet);
            failures.extend(destroy_context(&path, context, on_destroyed));
        }
        failures
    }
}

/// Destroys one context subtree: children first, then its own component.
pub(crate) fn destroy_context(
    path: &OutletPath,
    context: OutletContext,
    on_destroyed: &mut dyn FnMut(&OutletPath, &ComponentRefHandle),
) -> Vec<HookFailure> {
    let (component_ref, _route, children) = context.into_parts();
    let mut failures = children.destroy_all(path, on_destroyed);
    if let Some(component_ref) = component_ref {
        if let Err(err) = component_ref.destroy() {
            failures.extend(err.failures);
        }
        on_destroyed(path, &component_ref);
    }
    failures
}
