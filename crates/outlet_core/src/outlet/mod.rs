//! Live outlet bindings.
//!
//! # Responsibility
//! - Keep the mapping from outlet positions to mounted components.
//! - Expose the current route snapshot of each position to its component.
//!
//! # Invariants
//! - At most one component is mounted per context.
//! - The store is owned by one router; there is no global registry.

pub mod activated_route;
pub mod context;
