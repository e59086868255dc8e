//! Reconciliation planning: strategy queries only, no mutation.
//!
//! Each level lists its deactivations first, sorted by outlet name, followed
//! by reuse and activation ops in future-tree order.

use crate::component::component_ref::ComponentRefHandle;
use crate::component::factory::ComponentFactory;
use crate::component::injector::Injector;
use crate::model::route::{duplicate_outlet, RouteSnapshot};
use crate::model::tree::{OutletPath, TreeNode};
use crate::outlet::activated_route::ActivatedRoute;
use crate::outlet::context::{OutletContext, OutletContextStore};
use crate::reconcile::error::ReconcileError;
use crate::reuse::handle::{DetachedRouteHandle, DetachedSubtree};
use crate::reuse::strategy::RouteReuseStrategy;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

pub(crate) enum PlanOp {
    Reuse(Reuse),
    Activate(Activation),
    Deactivate(Deactivation),
}

/// Keep the mounted component and rebind it to `future`.
pub(crate) struct Reuse {
    pub(crate) outlet: String,
    pub(crate) future: RouteSnapshot,
    /// Injector of the kept component; its new children resolve through it.
    pub(crate) injector: Arc<dyn Injector>,
    pub(crate) children: Vec<PlanOp>,
}

/// Mount a component for `future`, either freshly created or reattached.
pub(crate) struct Activation {
    pub(crate) outlet: String,
    pub(crate) future: RouteSnapshot,
    pub(crate) source: ActivationSource,
    pub(crate) children: Vec<PlanOp>,
}

pub(crate) enum ActivationSource {
    Create {
        factory: Arc<dyn ComponentFactory>,
        route: ActivatedRoute,
        created: Option<ComponentRefHandle>,
    },
    Attach {
        handle: DetachedRouteHandle,
        injector: Arc<dyn Injector>,
        claimed: Option<DetachedSubtree>,
    },
}

/// Remove the context mounted at `outlet`.
pub(crate) struct Deactivation {
    pub(crate) outlet: String,
    pub(crate) mode: DeactivationMode,
}

pub(crate) enum DeactivationMode {
    /// Bundle the whole subtree into a handle stored under `route`.
    Detach { route: RouteSnapshot },
    /// Deactivate children first, then destroy the component.
    Destroy { children: Vec<Deactivation> },
}

/// Builds a plan by walking the future tree against live contexts.
pub(crate) struct Planner<'a> {
    strategy: &'a dyn RouteReuseStrategy,
    retrieved: HashSet<Uuid>,
}

impl<'a> Planner<'a> {
    pub(crate) fn new(strategy: &'a dyn RouteReuseStrategy) -> Self {
        Self {
            strategy,
            retrieved: HashSet::new(),
        }
    }

    /// Plans one level: future children against the contexts of their parent.
    pub(crate) fn plan_children(
        &mut self,
        future: &[TreeNode<RouteSnapshot>],
        current: Option<&OutletContextStore>,
        path: &OutletPath,
    ) -> Result<Vec<PlanOp>, ReconcileError> {
        if let Some(outlet) = duplicate_outlet(future) {
            return Err(ReconcileError::DuplicateOutlet {
                path: path.clone(),
                outlet: outlet.to_string(),
            });
        }

        let mut deactivations = Vec::new();
        let mut ops = Vec::with_capacity(future.len());
        for node in future {
            let outlet = node.value.outlet();
            let child_path = path.child(outlet);
            let Some(context) = current.and_then(|contexts| contexts.get_context(outlet)) else {
                ops.push(PlanOp::Activate(self.plan_activation(node, &child_path)?));
                continue;
            };

            if let Some((component_ref, snapshot)) = live_binding(context) {
                if self.strategy.should_reuse_route(&node.value, &snapshot) {
                    let children =
                        self.plan_children(&node.children, Some(context.children()), &child_path)?;
                    ops.push(PlanOp::Reuse(Reuse {
                        outlet: outlet.to_string(),
                        future: node.value.clone(),
                        injector: component_ref.injector(),
                        children,
                    }));
                    continue;
                }
            }

            deactivations.push(self.plan_deactivation(outlet, context));
            ops.push(PlanOp::Activate(self.plan_activation(node, &child_path)?));
        }

        // Positions only present in the current tree.
        if let Some(current) = current {
            for (outlet, context) in current.iter() {
                if future.iter().any(|node| node.value.outlet() == outlet) {
                    continue;
                }
                deactivations.push(self.plan_deactivation(outlet, context));
            }
        }

        // Replaced and removed siblings leave in outlet-name order.
        deactivations.sort_by(|left, right| left.outlet.cmp(&right.outlet));
        Ok(deactivations
            .into_iter()
            .map(PlanOp::Deactivate)
            .chain(ops)
            .collect())
    }

    fn plan_deactivation(&self, outlet: &str, context: &OutletContext) -> Deactivation {
        if let Some((_, snapshot)) = live_binding(context) {
            if self.strategy.should_detach(&snapshot) {
                return Deactivation {
                    outlet: outlet.to_string(),
                    mode: DeactivationMode::Detach { route: snapshot },
                };
            }
        }

        let children = context
            .children()
            .iter()
            .map(|(child_outlet, child)| self.plan_deactivation(child_outlet, child))
            .collect();
        Deactivation {
            outlet: outlet.to_string(),
            mode: DeactivationMode::Destroy { children },
        }
    }

    fn plan_activation(
        &mut self,
        node: &TreeNode<RouteSnapshot>,
        path: &OutletPath,
    ) -> Result<Activation, ReconcileError> {
        let Some(config) = node.value.route_config() else {
            return Err(ReconcileError::MissingComponent { path: path.clone() });
        };

        if self.strategy.should_attach(&node.value) {
            return self.plan_attach(node, path);
        }

        let Some(factory) = config.component_factory() else {
            return Err(ReconcileError::MissingComponent { path: path.clone() });
        };
        let children = self.plan_children(&node.children, None, path)?;
        Ok(Activation {
            outlet: node.value.outlet().to_string(),
            future: node.value.clone(),
            source: ActivationSource::Create {
                factory: Arc::clone(factory),
                route: ActivatedRoute::new(node.value.clone()),
                created: None,
            },
            children,
        })
    }

    fn plan_attach(
        &mut self,
        node: &TreeNode<RouteSnapshot>,
        path: &OutletPath,
    ) -> Result<Activation, ReconcileError> {
        let violation = |reason: &str| ReconcileError::ContractViolation {
            path: path.clone(),
            reason: reason.to_string(),
        };

        let handle = self
            .strategy
            .retrieve(&node.value)
            .ok_or_else(|| violation("retrieve returned no handle after should_attach"))?;
        if handle.is_spent() {
            return Err(violation("retrieved handle was already reattached or destroyed"));
        }
        if !self.retrieved.insert(handle.id()) {
            return Err(violation("one handle was retrieved for two positions"));
        }

        // Future children are diffed against the subtree stored in the handle.
        let planned = handle.with_subtree(|subtree| {
            self.plan_children(&node.children, Some(&subtree.contexts), path)
                .map(|children| (subtree.component_ref.injector(), children))
        });
        let Some(planned) = planned else {
            return Err(violation("retrieved handle holds no subtree"));
        };
        let (injector, children) = planned?;

        Ok(Activation {
            outlet: node.value.outlet().to_string(),
            future: node.value.clone(),
            source: ActivationSource::Attach {
                handle,
                injector,
                claimed: None,
            },
            children,
        })
    }
}

/// Mounted component and current snapshot of a context, when both exist.
fn live_binding(context: &OutletContext) -> Option<(&ComponentRefHandle, RouteSnapshot)> {
    Some((context.component_ref()?, context.route()?.snapshot()))
}
