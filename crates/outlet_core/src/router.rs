//! Router facade.
//!
//! # Responsibility
//! - Own the outlet context store, the reuse strategy and the root injector.
//! - Serialize navigations through tickets: the guard/resolve pipeline runs
//!   outside this crate and hands back a finalized future tree.
//!
//! # Invariants
//! - Only the latest live ticket may reconcile; stale or cancelled tickets
//!   never touch the store.
//! - Components still mounted when the router is dropped are destroyed.

use crate::component::injector::{Injector, ModuleRef, StaticInjector};
use crate::config::RouterConfig;
use crate::model::route::RouteSnapshot;
use crate::model::tree::{OutletPath, TreeNode};
use crate::outlet::context::OutletContextStore;
use crate::reconcile::error::ReconcileError;
use crate::reconcile::reconciler::Reconciler;
use crate::reconcile::report::ReconcileReport;
use crate::reuse::strategy::{DefaultReuseStrategy, RouteReuseStrategy};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Identifies one in-flight navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NavigationTicket(u64);

impl NavigationTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Display for NavigationTicket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors returned by router navigation APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// A newer navigation was started after this ticket.
    Superseded {
        ticket: NavigationTicket,
        latest: NavigationTicket,
    },
    /// The navigation was cancelled before it completed.
    Cancelled(NavigationTicket),
    /// The ticket was never issued or already completed.
    UnknownTicket(NavigationTicket),
    /// Reconciliation of the future tree failed.
    Reconcile(ReconcileError),
}

impl Display for NavigationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Superseded { ticket, latest } => {
                write!(f, "navigation {ticket} was superseded by {latest}")
            }
            Self::Cancelled(ticket) => write!(f, "navigation {ticket} was cancelled"),
            Self::UnknownTicket(ticket) => write!(f, "navigation {ticket} is not pending"),
            Self::Reconcile(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NavigationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Reconcile(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReconcileError> for NavigationError {
    fn from(value: ReconcileError) -> Self {
        Self::Reconcile(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TicketState {
    Pending,
    Cancelled,
    Done,
}

/// Owns one outlet tree and applies finalized navigations to it.
pub struct Router<S: RouteReuseStrategy = DefaultReuseStrategy> {
    strategy: S,
    root_injector: Arc<dyn Injector>,
    module: Option<ModuleRef>,
    contexts: OutletContextStore,
    issued: u64,
    latest: Option<(NavigationTicket, TicketState)>,
}

impl Router<DefaultReuseStrategy> {
    /// Router with the default strategy and an empty root injector.
    pub fn new() -> Self {
        Self::with_strategy(DefaultReuseStrategy::new(), StaticInjector::new().shared())
    }
}

impl Default for Router<DefaultReuseStrategy> {
    fn default() -> Self {
        Self::new()
    }
}

impl Router<Box<dyn RouteReuseStrategy>> {
    /// Router using the strategy described by `config`.
    pub fn from_config(config: &RouterConfig, root_injector: Arc<dyn Injector>) -> Self {
        Self::with_strategy(config.build_strategy(), root_injector)
    }
}

impl<S: RouteReuseStrategy> Router<S> {
    pub fn with_strategy(strategy: S, root_injector: Arc<dyn Injector>) -> Self {
        Self {
            strategy,
            root_injector,
            module: None,
            contexts: OutletContextStore::new(),
            issued: 0,
            latest: None,
        }
    }

    /// Module injector consulted when a dependency is not provided by the tree.
    pub fn with_module(mut self, module: ModuleRef) -> Self {
        self.module = Some(module);
        self
    }

    pub fn contexts(&self) -> &OutletContextStore {
        &self.contexts
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    /// Snapshot tree the mounted contexts currently represent.
    pub fn current_tree(&self) -> TreeNode<RouteSnapshot> {
        TreeNode::new(RouteSnapshot::root()).with_children(self.contexts.snapshot_trees())
    }

    /// Starts a navigation; any earlier pending ticket is superseded.
    pub fn begin_navigation(&mut self) -> NavigationTicket {
        self.issued += 1;
        let ticket = NavigationTicket(self.issued);
        if let Some((previous, TicketState::Pending)) = self.latest {
            info!(
                "event=navigation_superseded module=router status=ok ticket={} latest={}",
                previous, ticket
            );
        }
        self.latest = Some((ticket, TicketState::Pending));
        ticket
    }

    /// Cancels a pending navigation.
    ///
    /// # Errors
    /// Fails when `ticket` is not the latest pending navigation.
    pub fn cancel(&mut self, ticket: NavigationTicket) -> Result<(), NavigationError> {
        self.check_pending(ticket)?;
        self.latest = Some((ticket, TicketState::Cancelled));
        info!(
            "event=navigation_cancelled module=router status=ok ticket={}",
            ticket
        );
        Ok(())
    }

    /// Reconciles `future` for `ticket`.
    ///
    /// # Errors
    /// - `Superseded` / `Cancelled` / `UnknownTicket` when the ticket is not
    ///   the latest pending navigation; the store is not touched.
    /// - `Reconcile` when reconciliation aborts; the store is not touched and
    ///   the ticket is consumed.
    pub fn complete_navigation(
        &mut self,
        ticket: NavigationTicket,
        future: &TreeNode<RouteSnapshot>,
    ) -> Result<ReconcileReport, NavigationError> {
        if let Err(err) = self.check_pending(ticket) {
            warn!(
                "event=navigation_rejected module=router status=error ticket={} detail={}",
                ticket, err
            );
            return Err(err);
        }
        self.latest = Some((ticket, TicketState::Done));

        let mut reconciler = Reconciler::new(&mut self.strategy, Arc::clone(&self.root_injector));
        if let Some(module) = self.module.as_ref() {
            reconciler = reconciler.with_module(module);
        }
        let report = reconciler.reconcile(future, &mut self.contexts)?;
        info!(
            "event=navigation_complete module=router status=ok ticket={} events={}",
            ticket,
            report.events().len()
        );
        Ok(report)
    }

    /// Begins and immediately completes a navigation to `future`.
    ///
    /// # Errors
    /// See `complete_navigation`.
    pub fn navigate(
        &mut self,
        future: &TreeNode<RouteSnapshot>,
    ) -> Result<ReconcileReport, NavigationError> {
        let ticket = self.begin_navigation();
        self.complete_navigation(ticket, future)
    }

    fn check_pending(&self, ticket: NavigationTicket) -> Result<(), NavigationError> {
        match self.latest {
            Some((latest, state)) if latest == ticket => match state {
                TicketState::Pending => Ok(()),
                TicketState::Cancelled => Err(NavigationError::Cancelled(ticket)),
                TicketState::Done => Err(NavigationError::UnknownTicket(ticket)),
            },
            Some((latest, _)) if ticket < latest => {
                Err(NavigationError::Superseded { ticket, latest })
            }
            _ => Err(NavigationError::UnknownTicket(ticket)),
        }
    }
}

impl<S: RouteReuseStrategy> Drop for Router<S> {
    fn drop(&mut self) {
        let contexts = std::mem::take(&mut self.contexts);
        if contexts.is_empty() {
            return;
        }
        let failures = contexts.destroy_all(&OutletPath::root(), &mut |_, _| {});
        if !failures.is_empty() {
            warn!(
                "event=router_teardown module=router status=error hook_failures={}",
                failures.len()
            );
        }
    }
}
