//! Route reuse policy.
//!
//! # Responsibility
//! - Define the `RouteReuseStrategy` contract the reconciler consults.
//! - Provide the default policy and a keyed caching policy.
//! - Define the opaque `DetachedRouteHandle` strategies store.
//!
//! # Invariants
//! - Strategies only see handles as opaque tokens (id, spent flag, destroy).
//! - `retrieve` is only called after `should_attach` returned `true`.

pub mod caching;
pub mod handle;
pub mod strategy;
