//! Per-navigation lifecycle report.

use crate::component::component_ref::HookFailure;
use crate::model::tree::OutletPath;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// One lifecycle operation applied at one outlet position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Component kept mounted; `rebound` is true when url/params/data changed.
    Reused { path: OutletPath, rebound: bool },
    Created { path: OutletPath, component: String },
    Attached {
        path: OutletPath,
        component: String,
        handle: Uuid,
    },
    Detached {
        path: OutletPath,
        component: String,
        handle: Uuid,
    },
    Destroyed { path: OutletPath, component: String },
}

/// Discriminant of a `LifecycleEvent`, used to query a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Reused,
    Created,
    Attached,
    Detached,
    Destroyed,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reused => "reused",
            Self::Created => "created",
            Self::Attached => "attached",
            Self::Detached => "detached",
            Self::Destroyed => "destroyed",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LifecycleEvent {
    pub fn path(&self) -> &OutletPath {
        match self {
            Self::Reused { path, .. }
            | Self::Created { path, .. }
            | Self::Attached { path, .. }
            | Self::Detached { path, .. }
            | Self::Destroyed { path, .. } => path,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Reused { .. } => EventKind::Reused,
            Self::Created { .. } => EventKind::Created,
            Self::Attached { .. } => EventKind::Attached,
            Self::Detached { .. } => EventKind::Detached,
            Self::Destroyed { .. } => EventKind::Destroyed,
        }
    }
}

/// Ordered record of everything one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    events: Vec<LifecycleEvent>,
    destroy_failures: Vec<HookFailure>,
}

impl ReconcileReport {
    pub fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    pub fn destroy_failures(&self) -> &[HookFailure] {
        &self.destroy_failures
    }

    /// True when no destroy callback failed.
    pub fn is_clean(&self) -> bool {
        self.destroy_failures.is_empty()
    }

    /// Paths of events of one kind, in order.
    pub fn paths(&self, kind: EventKind) -> Vec<String> {
        self.events
            .iter()
            .filter(|event| event.kind() == kind)
            .map(|event| event.path().to_string())
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|event| event.kind() == kind).count()
    }

    pub(crate) fn record(&mut self, event: LifecycleEvent) {
        self.events.push(event);
    }

    pub(crate) fn record_failures(&mut self, failures: Vec<HookFailure>) {
        self.destroy_failures.extend(failures);
    }
}
