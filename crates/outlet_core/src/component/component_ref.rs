//! Live component handles and their destruction lifecycle.
//!
//! # Responsibility
//! - Own one component instance together with its host view, injector and
//!   change-detector handle.
//! - Run registered destroy callbacks exactly once, in registration order.
//!
//! # Invariants
//! - `destroy()` is safe to call repeatedly; only the first call has effects.
//! - One failing (or panicking) callback never prevents later callbacks.
//! - A callback registered after destruction fires immediately, once.
//! - No lock is held while user callbacks run.

use crate::component::injector::Injector;
use crate::component::view::{ChangeDetectorRef, ElementRef, ViewRef};
use log::{debug, warn};
use serde::Serialize;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

const MAX_FAILURE_MESSAGE_CHARS: usize = 160;

/// Type-erased component instance.
pub type ComponentInstance = Arc<dyn Any + Send + Sync>;

/// Shared handle to one live component.
pub type ComponentRefHandle = Arc<dyn ComponentRef>;

/// Cleanup callback run when a component is destroyed.
pub type DestroyCallback = Box<dyn FnOnce() -> Result<(), String> + Send>;

/// Wraps a closure as a `DestroyCallback`.
pub fn destroy_callback<F>(callback: F) -> DestroyCallback
where
    F: FnOnce() -> Result<(), String> + Send + 'static,
{
    Box::new(callback)
}

/// Component type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ComponentType {
    name: String,
}

impl ComponentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for ComponentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Live component handle produced by a `ComponentFactory`.
pub trait ComponentRef: Send + Sync {
    /// Stable id of this instance.
    fn id(&self) -> Uuid;
    /// Host or anchor element.
    fn location(&self) -> &ElementRef;
    /// Injector of this component; children resolve through it.
    fn injector(&self) -> Arc<dyn Injector>;
    /// The instance, or `None` once destroyed and released.
    fn instance(&self) -> Option<ComponentInstance>;
    fn host_view(&self) -> &ViewRef;
    fn change_detector_ref(&self) -> &ChangeDetectorRef;
    fn component_type(&self) -> &ComponentType;
    /// Runs destroy callbacks, then releases view and instance.
    ///
    /// # Errors
    /// Returns every callback failure in aggregate. The ref is destroyed
    /// regardless.
    fn destroy(&self) -> Result<(), DestroyError>;
    /// Registers a cleanup callback.
    fn on_destroy(&self, callback: DestroyCallback);
    fn is_destroyed(&self) -> bool;
}

/// One failed destroy callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookFailure {
    /// Component type name whose callback failed.
    pub component: String,
    /// Registration index of the failed callback.
    pub index: usize,
    pub message: String,
}

impl Display for HookFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} destroy callback #{}: {}",
            self.component, self.index, self.message
        )
    }
}

/// Aggregated destroy callback failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyError {
    pub failures: Vec<HookFailure>,
}

impl DestroyError {
    /// Returns `Ok(())` when `failures` is empty.
    pub fn from_failures(failures: Vec<HookFailure>) -> Result<(), Self> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Self { failures })
        }
    }
}

impl Display for DestroyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} destroy callback(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {failure}")?;
        }
        Ok(())
    }
}

impl Error for DestroyError {}

struct RefState {
    instance: Option<ComponentInstance>,
    callbacks: Vec<DestroyCallback>,
    destroyed: bool,
}

/// View-backed `ComponentRef` created by `ViewComponentFactory`.
pub struct ViewComponentRef {
    id: Uuid,
    component_type: ComponentType,
    location: ElementRef,
    injector: Arc<dyn Injector>,
    host_view: ViewRef,
    change_detector: ChangeDetectorRef,
    state: Mutex<RefState>,
}

impl ViewComponentRef {
    pub(crate) fn new(
        component_type: ComponentType,
        location: ElementRef,
        injector: Arc<dyn Injector>,
        host_view: ViewRef,
        instance: ComponentInstance,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            component_type,
            location,
            injector,
            host_view,
            change_detector: ChangeDetectorRef::new(),
            state: Mutex::new(RefState {
                instance: Some(instance),
                callbacks: Vec::new(),
                destroyed: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, RefState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ComponentRef for ViewComponentRef {
    fn id(&self) -> Uuid {
        self.id
    }

    fn location(&self) -> &ElementRef {
        &self.location
    }

    fn injector(&self) -> Arc<dyn Injector> {
        Arc::clone(&self.injector)
    }

    fn instance(&self) -> Option<ComponentInstance> {
        self.state().instance.clone()
    }

    fn host_view(&self) -> &ViewRef {
        &self.host_view
    }

    fn change_detector_ref(&self) -> &ChangeDetectorRef {
        &self.change_detector
    }

    fn component_type(&self) -> &ComponentType {
        &self.component_type
    }

    fn destroy(&self) -> Result<(), DestroyError> {
        let callbacks = {
            let mut state = self.state();
            if state.destroyed {
                return Ok(());
            }
            state.destroyed = true;
            std::mem::take(&mut state.callbacks)
        };

        let callback_count = callbacks.len();
        let failures = run_destroy_callbacks(self.component_type.name(), callbacks);

        self.host_view.destroy();
        self.change_detector.detach();
        let released = self.state().instance.take();
        drop(released);

        debug!(
            "event=component_destroyed module=component status={} component={} id={} callbacks={} failures={}",
            if failures.is_empty() { "ok" } else { "error" },
            self.component_type,
            self.id,
            callback_count,
            failures.len()
        );
        DestroyError::from_failures(failures)
    }

    fn on_destroy(&self, callback: DestroyCallback) {
        let late = {
            let mut state = self.state();
            if state.destroyed {
                Some(callback)
            } else {
                state.callbacks.push(callback);
                None
            }
        };

        // Registered after destruction: fire now, exactly once.
        if let Some(callback) = late {
            for failure in run_destroy_callbacks(self.component_type.name(), vec![callback]) {
                warn!(
                    "event=late_destroy_callback_failed module=component status=error component={} message={}",
                    failure.component, failure.message
                );
            }
        }
    }

    fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }
}

/// Runs callbacks in order, isolating errors and panics per callback.
pub(crate) fn run_destroy_callbacks(
    component: &str,
    callbacks: Vec<DestroyCallback>,
) -> Vec<HookFailure> {
    let mut failures = Vec::new();
    for (index, callback) in callbacks.into_iter().enumerate() {
        let message = match catch_unwind(AssertUnwindSafe(callback)) {
            Ok(Ok(())) => continue,
            Ok(Err(message)) => message,
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };
        failures.push(HookFailure {
            component: component.to_string(),
            index,
            message: truncate_message(&message),
        });
    }
    failures
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn truncate_message(value: &str) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized
        .chars()
        .take(MAX_FAILURE_MESSAGE_CHARS)
        .collect::<String>();
    if normalized.chars().count() > MAX_FAILURE_MESSAGE_CHARS {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::{destroy_callback, ComponentRef, ComponentType, ViewComponentRef};
    use crate::component::injector::StaticInjector;
    use crate::component::view::{ElementRef, ViewRef};
    use std::sync::{Arc, Mutex};

    fn make_ref() -> ViewComponentRef {
        ViewComponentRef::new(
            ComponentType::new("Probe"),
            ElementRef::new("app-widget"),
            StaticInjector::new().shared(),
            ViewRef::new(Vec::new()),
            Arc::new(5_u32),
        )
    }

    #[test]
    fn destroy_runs_callbacks_in_order_once() {
        let component = make_ref();
        let calls = Arc::new(Mutex::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let calls = Arc::clone(&calls);
            component.on_destroy(destroy_callback(move || {
                calls.lock().expect("calls lock").push(label);
                Ok(())
            }));
        }

        component.destroy().expect("clean destroy");
        component.destroy().expect("second destroy is a no-op");

        assert_eq!(*calls.lock().expect("calls lock"), vec!["first", "second", "third"]);
        assert!(component.is_destroyed());
        assert!(component.host_view().is_destroyed());
        assert!(component.instance().is_none());
    }

    #[test]
    fn failing_and_panicking_callbacks_are_isolated() {
        let component = make_ref();
        let reached = Arc::new(Mutex::new(false));
        component.on_destroy(destroy_callback(|| Err("socket close failed".to_string())));
        component.on_destroy(destroy_callback(|| panic!("cleanup exploded")));
        {
            let reached = Arc::clone(&reached);
            component.on_destroy(destroy_callback(move || {
                *reached.lock().expect("reached lock") = true;
                Ok(())
            }));
        }

        let err = component.destroy().expect_err("failures should be reported");
        assert_eq!(err.failures.len(), 2);
        assert_eq!(err.failures[0].index, 0);
        assert_eq!(err.failures[0].message, "socket close failed");
        assert_eq!(err.failures[1].index, 1);
        assert!(err.failures[1].message.contains("cleanup exploded"));
        assert!(*reached.lock().expect("reached lock"));
    }

    #[test]
    fn instance_is_available_until_destroy() {
        let component = make_ref();
        let instance = component.instance().expect("live instance");
        assert_eq!(instance.downcast_ref::<u32>(), Some(&5));
        assert!(!component.is_destroyed());
    }
}
