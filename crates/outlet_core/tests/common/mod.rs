#![allow(dead_code)]

use outlet_core::{
    destroy_callback, ComponentFactory, ComponentType, DetachedRouteHandle, EventKind,
    OutletContextStore, OutletPath, ReconcileReport, RouteConfig, RouteReuseStrategy,
    RouteSnapshot, TreeNode, ViewComponentFactory,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().expect("log lock").clone()
}

pub fn clear(log: &Log) {
    log.lock().expect("log lock").clear();
}

/// Factory whose constructor records `create:<name>`.
pub fn page(name: &str, log: &Log) -> Arc<dyn ComponentFactory> {
    let log = Arc::clone(log);
    let label = name.to_string();
    let selector = format!("app-{}", name.to_ascii_lowercase());
    ViewComponentFactory::new(&selector, ComponentType::new(name), move |_| {
        log.lock().expect("log lock").push(format!("create:{label}"));
        Ok(Arc::new(label.clone()))
    })
    .expect("valid selector")
    .shared()
}

pub fn route(path: &str, factory: &Arc<dyn ComponentFactory>) -> Arc<RouteConfig> {
    RouteConfig::new(path)
        .expect("valid path")
        .component(Arc::clone(factory))
        .shared()
}

pub fn named_route(
    path: &str,
    outlet: &str,
    factory: &Arc<dyn ComponentFactory>,
) -> Arc<RouteConfig> {
    RouteConfig::new(path)
        .expect("valid path")
        .outlet(outlet)
        .expect("valid outlet")
        .component(Arc::clone(factory))
        .shared()
}

pub fn node(config: &Arc<RouteConfig>) -> TreeNode<RouteSnapshot> {
    TreeNode::new(RouteSnapshot::for_config(config))
}

pub fn root(children: Vec<TreeNode<RouteSnapshot>>) -> TreeNode<RouteSnapshot> {
    TreeNode::new(RouteSnapshot::root()).with_children(children)
}

/// Registers `destroy:<component>` callbacks on every component the report created.
pub fn track_destroys(contexts: &OutletContextStore, report: &ReconcileReport, log: &Log) {
    for path in report.paths(EventKind::Created) {
        let component = contexts
            .component_at(&OutletPath::parse(&path))
            .expect("created component is mounted");
        let log = Arc::clone(log);
        let label = component.component_type().to_string();
        component.on_destroy(destroy_callback(move || {
            log.lock().expect("log lock").push(format!("destroy:{label}"));
            Ok(())
        }));
    }
}

/// Presence-keyed strategy that records every `store` call.
#[derive(Default)]
pub struct RecordingStrategy {
    detach: BTreeSet<String>,
    stored: BTreeMap<String, DetachedRouteHandle>,
    pub stores: Vec<(String, bool)>,
}

impl RecordingStrategy {
    pub fn detaching(paths: &[&str]) -> Self {
        Self {
            detach: paths.iter().map(|path| path.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn stored(&self, key: &str) -> Option<&DetachedRouteHandle> {
        self.stored.get(key)
    }
}

impl RouteReuseStrategy for RecordingStrategy {
    fn should_detach(&self, route: &RouteSnapshot) -> bool {
        route
            .route_config()
            .is_some_and(|config| self.detach.contains(config.path()))
    }

    fn store(&mut self, route: &RouteSnapshot, handle: Option<DetachedRouteHandle>) {
        let key = route.store_key().expect("only routed snapshots are stored");
        self.stores.push((key.clone(), handle.is_some()));
        match handle {
            Some(handle) => {
                self.stored.insert(key, handle);
            }
            None => {
                self.stored.remove(&key);
            }
        }
    }

    fn should_attach(&self, route: &RouteSnapshot) -> bool {
        route
            .store_key()
            .is_some_and(|key| self.stored.contains_key(&key))
    }

    fn retrieve(&self, route: &RouteSnapshot) -> Option<DetachedRouteHandle> {
        self.stored.get(&route.store_key()?).cloned()
    }

    fn should_reuse_route(&self, future: &RouteSnapshot, current: &RouteSnapshot) -> bool {
        future.same_config(current)
    }
}
