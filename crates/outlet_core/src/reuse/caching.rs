//! Keyed caching reuse strategy.
//!
//! # Responsibility
//! - Detach routes whose config path is listed, and reattach them when the
//!   same route config is navigated to again at the same outlet.
//! - Bound retention with a capacity and least-recently-stored eviction.
//!
//! # Invariants
//! - Entries are keyed by outlet, path and config identity; two configs that
//!   share a path never share an entry.
//! - A handle that leaves the cache without being reattached is destroyed.
//! - `should_attach` is true only for held, unspent handles whose stored route
//!   has the future node's config.
//! - Reuse decisions match `DefaultReuseStrategy`.

use crate::model::route::RouteSnapshot;
use crate::reuse::handle::DetachedRouteHandle;
use crate::reuse::strategy::RouteReuseStrategy;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Default number of detached subtrees kept alive.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CacheKey {
    label: String,
    config: Uuid,
}

impl CacheKey {
    fn for_route(route: &RouteSnapshot) -> Option<Self> {
        let config = route.route_config()?;
        let label = route.store_key()?;
        Some(Self {
            label,
            config: config.id(),
        })
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.label, self.config)
    }
}

/// Strategy that caches detached subtrees for selected route paths.
#[derive(Debug)]
pub struct CachingReuseStrategy {
    detach_paths: BTreeSet<String>,
    capacity: usize,
    entries: BTreeMap<CacheKey, DetachedRouteHandle>,
    recency: VecDeque<CacheKey>,
}

impl CachingReuseStrategy {
    /// Caches routes whose config path is in `detach_paths`.
    ///
    /// A zero `capacity` is raised to one.
    pub fn new<I, S>(detach_paths: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            detach_paths: detach_paths
                .into_iter()
                .map(|path| path.into().trim().trim_start_matches('/').to_string())
                .collect(),
            capacity: capacity.max(1),
            entries: BTreeMap::new(),
            recency: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored `outlet:path` labels, least recently stored first.
    pub fn stored_keys(&self) -> Vec<&str> {
        self.recency.iter().map(|key| key.label.as_str()).collect()
    }

    /// Most recently stored handle labelled `label`, if any.
    pub fn get(&self, label: &str) -> Option<&DetachedRouteHandle> {
        self.recency
            .iter()
            .rev()
            .find(|key| key.label == label)
            .and_then(|key| self.entries.get(key))
    }

    /// Drops every stored handle, destroying unspent subtrees.
    pub fn clear(&mut self) {
        let keys = std::mem::take(&mut self.recency);
        for key in keys {
            if let Some(handle) = self.entries.remove(&key) {
                release(&key, handle, "clear");
            }
        }
    }

    fn remove(&mut self, key: &CacheKey) -> Option<DetachedRouteHandle> {
        self.recency.retain(|stored| stored != key);
        self.entries.remove(key)
    }

    fn evict_overflow(&mut self) {
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.recency.pop_front() else {
                break;
            };
            if let Some(handle) = self.entries.remove(&oldest) {
                release(&oldest, handle, "evict");
            }
        }
    }

    /// Held handle for `route`, provided it was detached from that very config.
    fn matching(&self, route: &RouteSnapshot) -> Option<&DetachedRouteHandle> {
        let key = CacheKey::for_route(route)?;
        self.entries
            .get(&key)
            .filter(|handle| handle.route_config_id() == Some(key.config))
    }
}

impl Drop for CachingReuseStrategy {
    fn drop(&mut self) {
        self.clear();
    }
}

impl RouteReuseStrategy for CachingReuseStrategy {
    fn should_detach(&self, route: &RouteSnapshot) -> bool {
        route
            .route_config()
            .is_some_and(|config| self.detach_paths.contains(config.path()))
    }

    fn store(&mut self, route: &RouteSnapshot, handle: Option<DetachedRouteHandle>) {
        let Some(key) = CacheKey::for_route(route) else {
            warn!("event=store_without_key module=reuse status=error outlet={}", route.outlet());
            if let Some(handle) = handle {
                release(&"root", handle, "unkeyed");
            }
            return;
        };

        let previous = self.remove(&key);
        match handle {
            Some(handle) => {
                if let Some(previous) = previous.filter(|previous| *previous != handle) {
                    release(&key, previous, "overwrite");
                }
                debug!(
                    "event=handle_stored module=reuse status=ok key={} handle={}",
                    key,
                    handle.id()
                );
                self.recency.push_back(key.clone());
                self.entries.insert(key, handle);
                self.evict_overflow();
            }
            None => {
                if let Some(previous) = previous {
                    release(&key, previous, "erase");
                }
            }
        }
    }

    fn should_attach(&self, route: &RouteSnapshot) -> bool {
        self.matching(route).is_some_and(|handle| !handle.is_spent())
    }

    fn retrieve(&self, route: &RouteSnapshot) -> Option<DetachedRouteHandle> {
        self.matching(route).cloned()
    }

    fn should_reuse_route(&self, future: &RouteSnapshot, current: &RouteSnapshot) -> bool {
        future.same_config(current)
    }
}

/// Forgets `handle`; an unspent subtree is destroyed so it cannot leak.
fn release(key: &dyn Display, handle: DetachedRouteHandle, reason: &str) {
    if handle.is_spent() {
        return;
    }
    match handle.destroy() {
        Ok(()) => debug!(
            "event=handle_released module=reuse status=ok key={} reason={} handle={}",
            key,
            reason,
            handle.id()
        ),
        Err(err) => warn!(
            "event=handle_released module=reuse status=error key={} reason={} handle={} detail={}",
            key,
            reason,
            handle.id(),
            err
        ),
    }
}
