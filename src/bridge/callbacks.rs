//! Host-side registry of selection callback targets.
//!
//! The engine cannot hold a reference into the host runtime. Instead the host
//! registers a handler under a ULID token, passes the token at graph
//! initialization, and the engine echoes it back with every selection.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rmpv::Value;
use ulid::Ulid;

use super::protocol::{SelectedPerson, SET_SELECTED_PERSON};

type SelectionHandler = Arc<dyn Fn(i64) + Send + Sync>;

/// Opaque token naming a registered selection handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallbackTarget(String);

impl CallbackTarget {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallbackTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared table of selection handlers.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    handlers: Arc<Mutex<HashMap<String, SelectionHandler>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler and returns the token the engine should call back.
    pub fn register<F>(&self, handler: F) -> CallbackTarget
    where
        F: Fn(i64) + Send + Sync + 'static,
    {
        let token = Ulid::new().to_string();
        self.lock().insert(token.clone(), Arc::new(handler));
        tracing::debug!(callback = %token, "Registered selection callback");
        CallbackTarget(token)
    }

    /// Removes a handler. Later notifications for it are dropped.
    pub fn unregister(&self, target: &CallbackTarget) -> bool {
        self.lock().remove(target.as_str()).is_some()
    }

    pub fn is_registered(&self, target: &CallbackTarget) -> bool {
        self.lock().contains_key(target.as_str())
    }

    /// Drops every handler, e.g. once the engine connection is gone.
    ///
    /// Returns how many handlers were registered.
    pub fn clear(&self) -> usize {
        let handlers = std::mem::take(&mut *self.lock());
        // Dropped outside the lock: handler state may re-enter on drop.
        let count = handlers.len();
        drop(handlers);
        count
    }

    /// Routes an engine notification to its handler.
    ///
    /// Never fails: malformed or unknown notifications are logged and dropped.
    pub fn dispatch(&self, method: &str, params: Vec<Value>) {
        if method != SET_SELECTED_PERSON {
            tracing::warn!(method, "Ignoring unknown notification");
            return;
        }
        let selected = match SelectedPerson::from_params(params) {
            Ok(selected) => selected,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed selection");
                return;
            }
        };

        // Release the lock before calling out so handlers may re-enter.
        let handler = self.lock().get(&selected.callback_target).cloned();
        match handler {
            Some(handler) => {
                tracing::debug!(id = selected.id, "Selection changed");
                handler(selected.id);
            }
            None => tracing::warn!(
                callback = %selected.callback_target,
                "Selection for unknown callback target"
            ),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SelectionHandler>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
