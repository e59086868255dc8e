//! Component instantiation and lifecycle contracts.
//!
//! # Responsibility
//! - Define the `ComponentFactory` / `ComponentRef` contracts consumed by the
//!   reconciler and host application code.
//! - Provide view-backed implementations plus the injector seam they resolve
//!   dependencies through.
//!
//! # Invariants
//! - A factory's `create()` is the only path to a new `ComponentRef`.
//! - `ComponentRef::destroy()` runs every destroy callback exactly once.
//! - A destroyed ref is never resurrected.

pub mod component_ref;
pub mod factory;
pub mod injector;
pub mod view;
