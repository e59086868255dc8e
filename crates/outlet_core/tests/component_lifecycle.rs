use outlet_core::{
    destroy_callback, ComponentFactory, ComponentType, CreateError, ElementRef, HostRegistry,
    HostTarget, ModuleRef, StaticInjector, ViewComponentFactory, HOST_REGISTRY_TOKEN,
};
use std::sync::{Arc, Mutex};

fn counter_factory() -> ViewComponentFactory {
    ViewComponentFactory::new("app-counter", ComponentType::new("Counter"), |deps| {
        let start = deps.get::<u32>("Start").map(|value| *value).unwrap_or(0);
        Ok(Arc::new(Mutex::new(start)))
    })
    .unwrap()
    .with_dependency("Start")
    .with_content_selector("header")
    .with_input("count", "value")
    .with_output("changed", "valueChange")
}

#[test]
fn factory_describes_the_component() {
    let factory = counter_factory();
    assert_eq!(factory.selector(), "app-counter");
    assert_eq!(factory.component_type().name(), "Counter");
    assert_eq!(factory.content_selectors(), ["header".to_string()]);
    assert_eq!(factory.inputs()[0].template_name, "value");
    assert_eq!(factory.outputs()[0].prop_name, "changed");
}

#[test]
fn create_returns_a_complete_ref() {
    let injector = StaticInjector::new().provide("Start", 7_u32).shared();
    let component = counter_factory()
        .create(injector, Some(vec![vec!["<h1>".to_string()]]), None, None)
        .unwrap();

    let instance = component.instance().unwrap().downcast::<Mutex<u32>>().unwrap();
    assert_eq!(*instance.lock().unwrap(), 7);
    assert_eq!(component.location().tag(), "app-counter");
    assert_eq!(component.host_view().projected_nodes().len(), 1);
    assert!(component.change_detector_ref().is_attached());
    assert!(component.injector().get("Counter").is_some());
    assert!(!component.is_destroyed());
}

#[test]
fn each_create_makes_a_distinct_instance() {
    let injector = StaticInjector::new().provide("Start", 1_u32).shared();
    let factory = counter_factory();
    let first = factory.create(Arc::clone(&injector), None, None, None).unwrap();
    let second = factory.create(injector, None, None, None).unwrap();

    assert_ne!(first.id(), second.id());
    assert_ne!(first.host_view().id(), second.host_view().id());
}

#[test]
fn module_injector_backs_missing_tokens() {
    let module = ModuleRef::new(
        "AppModule",
        StaticInjector::new().provide("Start", 3_u32).shared(),
    );
    let component = counter_factory()
        .create(StaticInjector::new().shared(), None, None, Some(&module))
        .unwrap();
    let instance = component.instance().unwrap().downcast::<Mutex<u32>>().unwrap();
    assert_eq!(*instance.lock().unwrap(), 3);

    let missing = counter_factory()
        .create(StaticInjector::new().shared(), None, None, None)
        .err()
        .expect("missing dependency should fail");
    assert_eq!(
        missing,
        CreateError::MissingDependency {
            component: "Counter".to_string(),
            token: "Start".to_string()
        }
    );
}

#[test]
fn host_selector_resolves_through_registry() {
    let injector = StaticInjector::new()
        .provide("Start", 0_u32)
        .provide(HOST_REGISTRY_TOKEN, HostRegistry::new().with_host("#root"))
        .shared();
    let factory = counter_factory();

    let hosted = factory
        .create(
            Arc::clone(&injector),
            None,
            Some(HostTarget::Selector("#root".to_string())),
            None,
        )
        .unwrap();
    assert_eq!(hosted.location().tag(), "root");

    let element = ElementRef::new("section");
    let placed = factory
        .create(
            Arc::clone(&injector),
            None,
            Some(HostTarget::Element(element.clone())),
            None,
        )
        .unwrap();
    assert_eq!(placed.location(), &element);

    let missing = factory
        .create(injector, None, Some(HostTarget::Selector("#nope".to_string())), None)
        .err()
        .expect("unknown host should fail");
    assert_eq!(missing, CreateError::HostNotFound("#nope".to_string()));
}

#[test]
fn destroy_runs_callbacks_once_in_order_and_is_irreversible() {
    let injector = StaticInjector::new().provide("Start", 0_u32).shared();
    let component = counter_factory().create(injector, None, None, None).unwrap();
    let calls = Arc::new(Mutex::new(Vec::new()));
    for label in ["first", "second", "third"] {
        let calls = Arc::clone(&calls);
        component.on_destroy(destroy_callback(move || {
            calls.lock().unwrap().push(label);
            Ok(())
        }));
    }

    component.destroy().unwrap();
    component.destroy().unwrap();
    component.change_detector_ref().mark_for_check();

    assert_eq!(*calls.lock().unwrap(), vec!["first", "second", "third"]);
    assert!(component.is_destroyed());
    assert!(component.host_view().is_destroyed());
    assert!(component.instance().is_none());
}

#[test]
fn on_destroy_after_destroy_fires_immediately_once() {
    let injector = StaticInjector::new().provide("Start", 0_u32).shared();
    let component = counter_factory().create(injector, None, None, None).unwrap();
    component.destroy().unwrap();

    let calls = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&calls);
    component.on_destroy(destroy_callback(move || {
        *counter.lock().unwrap() += 1;
        Ok(())
    }));
    component.destroy().unwrap();

    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn failing_callbacks_are_aggregated() {
    let injector = StaticInjector::new().provide("Start", 0_u32).shared();
    let component = counter_factory().create(injector, None, None, None).unwrap();
    let ran = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&ran);
    component.on_destroy(destroy_callback(|| Err("socket close failed".to_string())));
    component.on_destroy(destroy_callback(move || {
        *flag.lock().unwrap() = true;
        Ok(())
    }));

    let err = component.destroy().unwrap_err();

    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].component, "Counter");
    assert_eq!(err.failures[0].message, "socket close failed");
    assert!(err.to_string().contains("1 destroy callback(s) failed"));
    assert!(*ran.lock().unwrap());
    assert!(component.is_destroyed());
}
