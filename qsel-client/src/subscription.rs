//! Listener registry shared between a subscription's owner and the task feeding it.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::Value;

pub type MessageListener = Arc<dyn Fn(&Value) + Send + Sync>;
pub type ErrorListener = Arc<dyn Fn(&anyhow::Error) + Send + Sync>;
pub type EventListener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Listeners {
  message: Vec<MessageListener>,
  close: Vec<EventListener>,
  error: Vec<ErrorListener>,
  open: Vec<EventListener>,
  closer: Option<Box<dyn FnOnce() + Send>>,
  closed: bool,
}

/// A live subscription.
///
/// Cloning yields another handle to the same subscription. Listeners are invoked outside of the
/// internal lock, so a listener may register further listeners or call [`close`](Self::close).
#[derive(Clone, Default)]
pub struct SubscriptionHandle {
  inner: Arc<Mutex<Listeners>>,
}

impl std::fmt::Debug for SubscriptionHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubscriptionHandle").finish_non_exhaustive()
  }
}

#[derive(Clone, Default)]
pub struct WeakSubscriptionHandle {
  inner: Weak<Mutex<Listeners>>,
}

impl WeakSubscriptionHandle {
  pub fn upgrade(&self) -> Option<SubscriptionHandle> {
    self.inner.upgrade().map(|inner| SubscriptionHandle { inner })
  }
}

impl SubscriptionHandle {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, Listeners> {
    // A panicking listener never runs under the lock, so a poisoned state is still consistent.
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }

  pub fn downgrade(&self) -> WeakSubscriptionHandle {
    WeakSubscriptionHandle {
      inner: Arc::downgrade(&self.inner),
    }
  }

  /// Registers a message listener.
  pub fn on(&self, f: impl Fn(&Value) + Send + Sync + 'static) -> &Self {
    self.lock().message.push(Arc::new(f));
    self
  }

  /// Registers a listener for the end of the subscription.
  pub fn off(&self, f: impl Fn() + Send + Sync + 'static) -> &Self {
    self.lock().close.push(Arc::new(f));
    self
  }

  pub fn error(&self, f: impl Fn(&anyhow::Error) + Send + Sync + 'static) -> &Self {
    self.lock().error.push(Arc::new(f));
    self
  }

  pub fn open(&self, f: impl Fn() + Send + Sync + 'static) -> &Self {
    self.lock().open.push(Arc::new(f));
    self
  }

  /// Installs the action run by the first call to [`close`](Self::close).
  pub fn set_closer(&self, f: impl FnOnce() + Send + 'static) {
    self.lock().closer = Some(Box::new(f));
  }

  /// Asks the transport to end the subscription. Later calls do nothing.
  pub fn close(&self) {
    let closer = self.lock().closer.take();
    if let Some(f) = closer {
      f();
    }
  }

  pub fn is_closed(&self) -> bool {
    self.lock().closed
  }

  pub fn dispatch_message(&self, value: &Value) {
    let listeners = self.lock().message.clone();
    for f in listeners {
      f(value);
    }
  }

  pub fn dispatch_error(&self, error: &anyhow::Error) {
    let listeners = self.lock().error.clone();
    if listeners.is_empty() {
      log::warn!("unhandled subscription error: {:?}", error);
    }
    for f in listeners {
      f(error);
    }
  }

  pub fn dispatch_open(&self) {
    let listeners = self.lock().open.clone();
    for f in listeners {
      f();
    }
  }

  /// Notifies close listeners once. Later calls do nothing.
  pub fn dispatch_close(&self) {
    let listeners = {
      let mut state = self.lock();
      if state.closed {
        return;
      }
      state.closed = true;
      state.closer = None;
      state.close.clone()
    };
    for f in listeners {
      f();
    }
  }
}
