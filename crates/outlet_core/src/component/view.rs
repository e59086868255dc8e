//! Host element, host view and change-detector handles.
//!
//! These are thin stand-ins for the renderer and change-detection engine: they
//! carry identity and lifecycle flags but never touch a real document.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use uuid::Uuid;

/// Host or anchor element of one component instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementRef {
    id: Uuid,
    tag: String,
}

impl ElementRef {
    /// Creates a fresh element for `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tag: tag.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// Projected content groups, one group per declared content selector.
pub type ProjectableNodes = Vec<Vec<String>>;

/// Host view created for one component instance.
#[derive(Debug)]
pub struct ViewRef {
    id: Uuid,
    projected_nodes: ProjectableNodes,
    destroyed: AtomicBool,
}

impl ViewRef {
    pub(crate) fn new(projected_nodes: ProjectableNodes) -> Self {
        Self {
            id: Uuid::new_v4(),
            projected_nodes,
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn projected_nodes(&self) -> &ProjectableNodes {
        &self.projected_nodes
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub(crate) fn destroy(&self) {
        self.destroyed.store(true, Ordering::Release);
    }
}

/// Change-detector handle of one component instance.
///
/// The change-detection engine is external; this handle records check
/// requests and whether the view currently participates in checks.
#[derive(Debug)]
pub struct ChangeDetectorRef {
    check_requests: AtomicU64,
    attached: AtomicBool,
}

impl ChangeDetectorRef {
    pub(crate) fn new() -> Self {
        Self {
            check_requests: AtomicU64::new(0),
            attached: AtomicBool::new(true),
        }
    }

    /// Requests one check on the next change-detection run.
    pub fn mark_for_check(&self) {
        self.check_requests.fetch_add(1, Ordering::AcqRel);
    }

    pub fn check_requests(&self) -> u64 {
        self.check_requests.load(Ordering::Acquire)
    }

    /// Removes the view from change detection (detached subtrees are not checked).
    pub fn detach(&self) {
        self.attached.store(false, Ordering::Release);
    }

    pub fn reattach(&self) {
        self.attached.store(true, Ordering::Release);
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}
