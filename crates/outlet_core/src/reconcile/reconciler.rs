//! Tree reconciler.
//!
//! # Responsibility
//! - Diff a future snapshot tree against the live outlet contexts.
//! - Apply create, attach, detach, destroy and reuse operations, consulting
//!   the reuse strategy at every position.
//!
//! # Invariants
//! - Any error is returned before the context store is mutated; components
//!   created during an aborted pass are destroyed again.
//! - Deactivations run before activations; destruction runs children before
//!   parent, activation runs parent before children.
//! - The future root is always reused.

use crate::component::component_ref::ComponentRefHandle;
use crate::component::injector::{Injector, ModuleRef};
use crate::model::route::RouteSnapshot;
use crate::model::tree::{OutletPath, TreeNode};
use crate::outlet::activated_route::outlet_injector;
use crate::outlet::context::OutletContextStore;
use crate::reconcile::error::ReconcileError;
use crate::reconcile::plan::{
    Activation, ActivationSource, Deactivation, DeactivationMode, PlanOp, Planner, Reuse,
};
use crate::reconcile::report::{EventKind, LifecycleEvent, ReconcileReport};
use crate::reuse::handle::{DetachedRouteHandle, DetachedSubtree};
use crate::reuse::strategy::RouteReuseStrategy;
use log::{debug, info, warn};
use std::sync::Arc;

/// One reconciliation pass over an outlet context store.
pub struct Reconciler<'a> {
    strategy: &'a mut dyn RouteReuseStrategy,
    root_injector: Arc<dyn Injector>,
    module: Option<&'a ModuleRef>,
    report: ReconcileReport,
}

impl<'a> Reconciler<'a> {
    pub fn new(strategy: &'a mut dyn RouteReuseStrategy, root_injector: Arc<dyn Injector>) -> Self {
        Self {
            strategy,
            root_injector,
            module: None,
            report: ReconcileReport::default(),
        }
    }

    /// Module whose injector backs dependency lookups of created components.
    pub fn with_module(mut self, module: &'a ModuleRef) -> Self {
        self.module = Some(module);
        self
    }

    /// Brings `contexts` in line with `future`.
    ///
    /// # Errors
    /// - `InvalidRoot` when the future root carries a route config.
    /// - `DuplicateOutlet` / `MissingComponent` for malformed future trees.
    /// - `ContractViolation` when the strategy breaks the attach contract.
    /// - `Creation` when a factory fails.
    ///
    /// The store is untouched whenever an error is returned.
    pub fn reconcile(
        mut self,
        future: &TreeNode<RouteSnapshot>,
        contexts: &mut OutletContextStore,
    ) -> Result<ReconcileReport, ReconcileError> {
        if !future.value.is_root() {
            return Err(ReconcileError::InvalidRoot);
        }
        info!(
            "event=reconcile_start module=reconcile status=ok future_nodes={} mounted={}",
            future.node_count(),
            contexts.mounted_paths().len()
        );

        let root = OutletPath::root();
        let mut ops = Planner::new(&*self.strategy)
            .plan_children(&future.children, Some(&*contexts), &root)
            .map_err(log_abort)?;

        let root_injector = Arc::clone(&self.root_injector);
        if let Err(err) = self.instantiate(&mut ops, &root_injector, &root) {
            rollback(&mut ops);
            return Err(log_abort(err));
        }

        self.deactivate_pass(&mut ops, contexts, &root);
        self.activate_pass(ops, contexts, &root);

        let report = self.report;
        info!(
            "event=reconcile_finish module=reconcile status={} reused={} created={} attached={} detached={} destroyed={} hook_failures={}",
            if report.is_clean() { "ok" } else { "error" },
            report.count(EventKind::Reused),
            report.count(EventKind::Created),
            report.count(EventKind::Attached),
            report.count(EventKind::Detached),
            report.count(EventKind::Destroyed),
            report.destroy_failures().len()
        );
        Ok(report)
    }

    /// Creates new components parent first and claims reattached subtrees.
    fn instantiate(
        &self,
        ops: &mut [PlanOp],
        parent_injector: &Arc<dyn Injector>,
        base: &OutletPath,
    ) -> Result<(), ReconcileError> {
        for op in ops {
            match op {
                PlanOp::Reuse(Reuse {
                    outlet,
                    injector,
                    children,
                    ..
                }) => self.instantiate(children, injector, &base.child(outlet))?,
                PlanOp::Activate(Activation {
                    outlet,
                    source,
                    children,
                    ..
                }) => {
                    let path = base.child(outlet);
                    let child_injector = match source {
                        ActivationSource::Create {
                            factory,
                            route,
                            created,
                        } => {
                            let injector = outlet_injector(route, Arc::clone(parent_injector));
                            let component = factory
                                .create(injector, None, None, self.module)
                                .map_err(|source| ReconcileError::Creation {
                                    path: path.clone(),
                                    source,
                                })?;
                            let child_injector = component.injector();
                            *created = Some(component);
                            child_injector
                        }
                        ActivationSource::Attach {
                            handle,
                            injector,
                            claimed,
                        } => {
                            let subtree =
                                handle
                                    .take()
                                    .ok_or_else(|| ReconcileError::ContractViolation {
                                        path: path.clone(),
                                        reason: "retrieved handle was spent during planning"
                                            .to_string(),
                                    })?;
                            *claimed = Some(subtree);
                            Arc::clone(injector)
                        }
                    };
                    self.instantiate(children, &child_injector, &path)?;
                }
                PlanOp::Deactivate(_) => {}
            }
        }
        Ok(())
    }

    fn deactivate_pass(
        &mut self,
        ops: &mut [PlanOp],
        contexts: &mut OutletContextStore,
        base: &OutletPath,
    ) {
        for op in ops {
            match op {
                PlanOp::Reuse(Reuse {
                    outlet, children, ..
                }) => {
                    let Some(context) = contexts.get_context_mut(outlet) else {
                        warn!(
                            "event=reused_context_missing module=reconcile status=error path={}",
                            base.child(outlet)
                        );
                        continue;
                    };
                    self.deactivate_pass(children, context.children_mut(), &base.child(outlet));
                }
                PlanOp::Activate(Activation {
                    outlet,
                    source: ActivationSource::Attach {
                        claimed: Some(subtree),
                        ..
                    },
                    children,
                    ..
                }) => {
                    // Stored children absent from the future tree leave the subtree now.
                    self.deactivate_pass(children, &mut subtree.contexts, &base.child(outlet));
                }
                PlanOp::Activate(_) => {}
                PlanOp::Deactivate(deactivation) => {
                    self.apply_deactivation(deactivation, contexts, base)
                }
            }
        }
    }

    fn apply_deactivation(
        &mut self,
        deactivation: &Deactivation,
        contexts: &mut OutletContextStore,
        base: &OutletPath,
    ) {
        let path = base.child(&deactivation.outlet);
        let Some(mut context) = contexts.remove_context(&deactivation.outlet) else {
            return;
        };

        match &deactivation.mode {
            DeactivationMode::Detach { route } => {
                let children = context.children_mut().on_outlet_deactivated();
                let (component_ref, activated_route, _) = context.into_parts();
                let (Some(component_ref), Some(activated_route)) = (component_ref, activated_route)
                else {
                    self.destroy_store(children, &path);
                    return;
                };
                component_ref.change_detector_ref().detach();
                let snapshot = TreeNode::new(route.clone()).with_children(children.snapshot_trees());
                let component = component_ref.component_type().to_string();
                let handle = DetachedRouteHandle::new(DetachedSubtree {
                    contexts: children,
                    component_ref,
                    activated_route,
                    route: snapshot,
                });
                debug!(
                    "event=subtree_detached module=reconcile status=ok path={} handle={}",
                    path,
                    handle.id()
                );
                self.report.record(LifecycleEvent::Detached {
                    path,
                    component,
                    handle: handle.id(),
                });
                self.strategy.store(route, Some(handle));
            }
            DeactivationMode::Destroy { children } => {
                for child in children {
                    self.apply_deactivation(child, context.children_mut(), &path);
                }
                let (component_ref, _route, leftover) = context.into_parts();
                self.destroy_store(leftover, &path);
                if let Some(component_ref) = component_ref {
                    self.destroy_component(&path, &component_ref);
                }
            }
        }
    }

    fn destroy_store(&mut self, contexts: OutletContextStore, base: &OutletPath) {
        if contexts.is_empty() {
            return;
        }
        let report = &mut self.report;
        let failures = contexts.destroy_all(base, &mut |path, component_ref| {
            report.record(LifecycleEvent::Destroyed {
                path: path.clone(),
                component: component_ref.component_type().to_string(),
            });
        });
        self.report.record_failures(failures);
    }

    fn destroy_component(&mut self, path: &OutletPath, component_ref: &ComponentRefHandle) {
        if let Err(err) = component_ref.destroy() {
            warn!(
                "event=destroy_hooks_failed module=reconcile status=error path={} failures={}",
                path,
                err.failures.len()
            );
            self.report.record_failures(err.failures);
        }
        self.report.record(LifecycleEvent::Destroyed {
            path: path.clone(),
            component: component_ref.component_type().to_string(),
        });
    }

    fn activate_pass(
        &mut self,
        ops: Vec<PlanOp>,
        contexts: &mut OutletContextStore,
        base: &OutletPath,
    ) {
        for op in ops {
            match op {
                PlanOp::Reuse(reuse) => {
                    let path = base.child(&reuse.outlet);
                    let Some(context) = contexts.get_context_mut(&reuse.outlet) else {
                        continue;
                    };
                    let rebound = match (context.route(), context.component_ref()) {
                        (Some(route), Some(component_ref)) => {
                            let rebound = route.advance(reuse.future);
                            if rebound {
                                component_ref.change_detector_ref().mark_for_check();
                            }
                            rebound
                        }
                        _ => false,
                    };
                    self.report.record(LifecycleEvent::Reused {
                        path: path.clone(),
                        rebound,
                    });
                    self.activate_pass(reuse.children, context.children_mut(), &path);
                }
                PlanOp::Activate(activation) => {
                    self.apply_activation(activation, contexts, base);
                }
                PlanOp::Deactivate(_) => {}
            }
        }
    }

    fn apply_activation(
        &mut self,
        activation: Activation,
        contexts: &mut OutletContextStore,
        base: &OutletPath,
    ) {
        let Activation {
            outlet,
            future,
            source,
            children,
        } = activation;
        let path = base.child(&outlet);
        let context = contexts.get_or_create_context(&outlet);

        match source {
            ActivationSource::Create { route, created, .. } => {
                let Some(component_ref) = created else {
                    return;
                };
                if let Err(err) = context.activate_with(Arc::clone(&component_ref), route) {
                    self.report.record_failures(err.failures);
                }
                component_ref.change_detector_ref().mark_for_check();
                self.report.record(LifecycleEvent::Created {
                    path: path.clone(),
                    component: component_ref.component_type().to_string(),
                });
            }
            ActivationSource::Attach {
                handle, claimed, ..
            } => {
                let Some(subtree) = claimed else {
                    return;
                };
                let DetachedSubtree {
                    contexts: stored,
                    component_ref,
                    activated_route,
                    ..
                } = subtree;
                context.children_mut().on_outlet_reattached(stored);
                let rebind =
                    context.activate_with(Arc::clone(&component_ref), activated_route.clone());
                if let Err(err) = rebind {
                    self.report.record_failures(err.failures);
                }
                activated_route.advance(future.clone());
                let detector = component_ref.change_detector_ref();
                detector.reattach();
                detector.mark_for_check();
                debug!(
                    "event=subtree_attached module=reconcile status=ok path={} handle={}",
                    path,
                    handle.id()
                );
                self.report.record(LifecycleEvent::Attached {
                    path: path.clone(),
                    component: component_ref.component_type().to_string(),
                    handle: handle.id(),
                });
                self.strategy.store(&future, None);
            }
        }

        self.activate_pass(children, context.children_mut(), &path);
    }
}

/// Undoes `instantiate`: destroys created components and returns claimed
/// subtrees to their handles, children before parents.
fn rollback(ops: &mut [PlanOp]) {
    for op in ops.iter_mut().rev() {
        match op {
            PlanOp::Reuse(reuse) => rollback(&mut reuse.children),
            PlanOp::Activate(activation) => {
                rollback(&mut activation.children);
                match &mut activation.source {
                    ActivationSource::Create { created, .. } => {
                        if let Some(component_ref) = created.take() {
                            if let Err(err) = component_ref.destroy() {
                                warn!(
                                    "event=rollback_destroy_failed module=reconcile status=error component={} detail={}",
                                    component_ref.component_type(),
                                    err
                                );
                            }
                        }
                    }
                    ActivationSource::Attach {
                        handle, claimed, ..
                    } => {
                        if let Some(subtree) = claimed.take() {
                            handle.restore(subtree);
                        }
                    }
                }
            }
            PlanOp::Deactivate(_) => {}
        }
    }
}

fn log_abort(err: ReconcileError) -> ReconcileError {
    warn!(
        "event=reconcile_aborted module=reconcile status=error detail={}",
        err
    );
    err
}
