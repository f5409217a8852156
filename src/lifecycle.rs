//! Lifecycle adapter.
//!
//! Translates host foreground/background transitions into the controller's
//! hooks. The host owns a [`LifecycleSource`]; binding installs a listener
//! there, and rebinding replaces whatever listener was installed before.

use std::sync::Arc;

use crate::sdk_warn;
use crate::session::SessionController;

/// Receives host lifecycle transitions. Methods are called from arbitrary
/// host threads and must return promptly.
pub trait LifecycleListener: Send + Sync {
    fn on_foreground(&self);
    fn on_background(&self);
}

/// Host-side registration point for lifecycle callbacks. `set_listener`
/// replaces any previously installed listener; `None` unbinds.
pub trait LifecycleSource: Send + Sync {
    fn set_listener(&self, listener: Option<Arc<dyn LifecycleListener>>);
}

struct ControllerListener {
    controller: Arc<SessionController>,
    runtime: tokio::runtime::Handle,
}

impl LifecycleListener for ControllerListener {
    fn on_foreground(&self) {
        let controller = Arc::clone(&self.controller);
        self.runtime.spawn(async move {
            controller.on_foreground().await;
        });
    }

    fn on_background(&self) {
        let controller = Arc::clone(&self.controller);
        self.runtime.spawn(async move {
            controller.on_background().await;
        });
    }
}

/// Installs the controller as the source's listener. Safe to call again:
/// the previous binding is replaced, never duplicated.
pub(crate) fn bind(source: &dyn LifecycleSource, controller: Arc<SessionController>) {
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            sdk_warn!("lifecycle binding requested outside a tokio runtime, skipping");
            return;
        }
    };
    source.set_listener(Some(Arc::new(ControllerListener {
        controller,
        runtime,
    })));
}

pub(crate) fn unbind(source: &dyn LifecycleSource) {
    source.set_listener(None);
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct MockSource {
        listener: Mutex<Option<Arc<dyn LifecycleListener>>>,
        set_calls: Mutex<usize>,
    }

    impl LifecycleSource for MockSource {
        fn set_listener(&self, listener: Option<Arc<dyn LifecycleListener>>) {
            *self.listener.lock().unwrap() = listener;
            *self.set_calls.lock().unwrap() += 1;
        }
    }

    struct NoopListener;

    impl LifecycleListener for NoopListener {
        fn on_foreground(&self) {}
        fn on_background(&self) {}
    }

    #[test]
    fn rebinding_replaces_the_previous_listener() {
        let source = MockSource::default();

        let first: Arc<dyn LifecycleListener> = Arc::new(NoopListener);
        source.set_listener(Some(Arc::clone(&first)));
        let second: Arc<dyn LifecycleListener> = Arc::new(NoopListener);
        source.set_listener(Some(Arc::clone(&second)));

        let held = source.listener.lock().unwrap();
        assert!(Arc::ptr_eq(held.as_ref().unwrap(), &second));
        assert_eq!(*source.set_calls.lock().unwrap(), 2);
    }

    #[test]
    fn unbind_clears_the_listener() {
        let source = MockSource::default();
        source.set_listener(Some(Arc::new(NoopListener)));
        unbind(&source);
        assert!(source.listener.lock().unwrap().is_none());
    }
}
