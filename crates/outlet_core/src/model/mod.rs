//! Route snapshot model shared by the reuse strategy and the reconciler.
//!
//! # Responsibility
//! - Define static route configuration and immutable per-navigation snapshots.
//! - Provide the ordered tree shape and stable outlet-position keys.
//!
//! # Invariants
//! - Route configuration identity is `Arc` pointer identity, never field equality.
//! - Sibling snapshots are addressed by unique outlet names.

pub mod route;
pub mod tree;
