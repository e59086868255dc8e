//! Tree reconciliation between the mounted outlet tree and a future route tree.
//!
//! # Responsibility
//! - Diff current and future trees positionally (by outlet path).
//! - Consult the reuse strategy per position and apply
//!   create/attach/detach/destroy/reuse to the outlet context store.
//!
//! # Invariants
//! - Planning and instantiation never mutate the store; a failed pass leaves
//!   it untouched and destroys every instance it created.
//! - Activation runs parent before child; destruction runs children before
//!   their parent.
//! - Applying a plan cannot fail; destroy-callback failures are reported.

pub mod error;
mod plan;
pub mod reconciler;
pub mod report;
