//! Shared codec context
//!
//! A `Context` bundles the configuration, the type registry and the call
//! history. Create one at startup, register types on it, and pass it to
//! every proxy that should share them. Clones share the registry and
//! history; the configuration is copied.

use crate::config::Config;
use crate::error::Result;
use crate::history::History;
use crate::jsonclass::{self, DumpOptions};
use crate::object::{Construct, Object};
use crate::registry::TypeRegistry;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Configuration plus process-shared registry and history
#[derive(Debug, Clone, Default)]
pub struct Context {
    config: Config,
    registry: Arc<RwLock<TypeRegistry>>,
    history: Arc<Mutex<History>>,
}

impl Context {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Make `T` reconstructible by `load`
    pub fn register<T: Construct>(&self) {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register::<T>();
    }

    /// Snapshot of the registry
    pub fn registry(&self) -> TypeRegistry {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Encode an object graph with this context's serializer names
    pub fn dump(&self, obj: &Object) -> Result<Value> {
        self.dump_ignoring(obj, &[])
    }

    /// Like `dump`, with extra attribute names to skip
    pub fn dump_ignoring(&self, obj: &Object, ignore: &[String]) -> Result<Value> {
        jsonclass::dump(
            obj,
            DumpOptions {
                serialize_method: &self.config.serialize_method,
                ignore_attribute: &self.config.ignore_attribute,
                ignore,
            },
        )
    }

    /// Decode a JSON value against this context's registry
    pub fn load(&self, value: &Value) -> Result<Object> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        jsonclass::load(value, &registry)
    }

    pub fn record_request(&self, request: &str) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add_request(request);
    }

    pub fn record_response(&self, response: &str) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add_response(response);
    }

    /// Snapshot of the call history
    pub fn history(&self) -> History {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_history(&self) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
