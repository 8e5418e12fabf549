//! Call proxy
//!
//! [`Method`] accumulates a dotted method name and sends nothing until
//! [`Method::call`] is awaited. The owning [`ServerProxy`](crate::ServerProxy)
//! supplies the [`RequestRunner`] that does the sending.
//!
//! ```rust,no_run
//! use veles_client::{Args, ServerProxy};
//!
//! # async fn example() -> veles_core::Result<()> {
//! let proxy = ServerProxy::new("http://localhost:8080")?;
//! let sum = proxy.method("math").attr("add").call(Args::new().arg(5).arg(3)).await?;
//! assert_eq!(sum, serde_json::json!(8));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use veles_core::{Error, Object, Result};

pub(crate) const MIXED_ARGS_MESSAGE: &str =
    "Cannot use both positional and keyword arguments in one JSON-RPC call.";

/// Arguments for one call: positional or keyword, never both
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Object>,
    keyword: BTreeMap<String, Object>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Object>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Object>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    pub fn positional<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Object>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            keyword: BTreeMap::new(),
        }
    }

    pub fn keyword<I, K, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Object>,
    {
        Self {
            positional: Vec::new(),
            keyword: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Turn the arguments into call params
    ///
    /// Positional arguments become a tuple; otherwise the (possibly empty)
    /// keyword map is used.
    ///
    /// # Errors
    ///
    /// `Error::Protocol` if both kinds were given.
    pub fn into_params(self) -> Result<Object> {
        if !self.positional.is_empty() && !self.keyword.is_empty() {
            return Err(Error::Protocol(MIXED_ARGS_MESSAGE.into()));
        }
        if self.positional.is_empty() {
            Ok(Object::Map(self.keyword))
        } else {
            Ok(Object::Tuple(self.positional))
        }
    }
}

/// Sends one call and returns the raw `result` value
#[async_trait]
pub trait RequestRunner: Send + Sync {
    async fn run(&self, method: &str, params: Object) -> Result<Value>;
}

/// A lazily built method name bound to a runner
#[derive(Clone)]
pub struct Method<'a> {
    runner: &'a dyn RequestRunner,
    name: String,
}

impl<'a> Method<'a> {
    pub fn new(runner: &'a dyn RequestRunner, name: impl Into<String>) -> Self {
        Self {
            runner,
            name: name.into(),
        }
    }

    /// Extend the name with `.segment`
    pub fn attr(self, segment: &str) -> Self {
        Self {
            runner: self.runner,
            name: format!("{}.{}", self.name, segment),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send the call and return the raw result
    pub async fn call(&self, args: Args) -> Result<Value> {
        let params = args.into_params()?;
        self.runner.run(&self.name, params).await
    }

    /// Send the call and deserialize the result
    pub async fn call_as<R: DeserializeOwned>(&self, args: Args) -> Result<R> {
        let value = self.call(args).await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl fmt::Display for Method<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Method \"{}\">", self.name)
    }
}

impl fmt::Debug for Method<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("name", &self.name).finish()
    }
}
