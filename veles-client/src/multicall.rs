//! Batch aggregator
//!
//! A [`MultiCall`] collects pending calls and ships them as one JSON array in
//! a single transport round-trip. Calls added through [`MultiCall::notify`]
//! are flagged as notifications; the server does not answer them, so they
//! take no slot in the response array.
//!
//! Submitting empties the job list as soon as the batch body is built, before
//! any I/O. A failed submission cannot be retried by calling
//! [`MultiCall::request`] again; rebuild the batch instead. If a job cannot
//! be encoded, nothing is sent and the job list is left as it was.
//!
//! ```rust,no_run
//! use veles_client::{Args, ServerProxy};
//!
//! # async fn example() -> veles_core::Result<()> {
//! let proxy = ServerProxy::new("http://localhost:8080")?;
//! let mut batch = proxy.multicall();
//! batch.method("math").attr("add").call(Args::positional([1, 2]))?;
//! batch.notify().method("audit.log").call(Args::positional(["added"]))?;
//! batch.method("math.mul").call(Args::positional([3, 4]))?;
//!
//! if let Some(results) = batch.request().await? {
//!     for result in &results {
//!         println!("{result}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::server_proxy::ServerProxy;
use crate::Args;
use serde_json::Value;
use std::fmt;
use std::ops::Index;
use veles_core::codec::{self, MessageKind};
use veles_core::{Config, Error, ErrorData, Object, Result};

const BATCH_MIXED_ARGS_MESSAGE: &str =
    "JSON-RPC does not support both positional and keyword arguments.";

static NULL: Value = Value::Null;

/// One pending call in a batch
#[derive(Debug, Clone, PartialEq)]
pub struct MultiCallMethod {
    method: String,
    params: Object,
    notify: bool,
}

impl MultiCallMethod {
    pub fn new(method: impl Into<String>, notify: bool) -> Self {
        Self {
            method: method.into(),
            params: Object::List(Vec::new()),
            notify,
        }
    }

    /// Extend the method name with `.segment`
    pub fn attr(&mut self, segment: &str) -> &mut Self {
        self.method = format!("{}.{}", self.method, segment);
        self
    }

    /// Set the arguments for this call
    ///
    /// Nothing is sent until the batch is submitted.
    pub fn call(&mut self, args: Args) -> Result<()> {
        self.params = args
            .into_params()
            .map_err(|_| Error::Protocol(BATCH_MIXED_ARGS_MESSAGE.into()))?;
        Ok(())
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &Object {
        &self.params
    }

    pub fn is_notify(&self) -> bool {
        self.notify
    }

    /// Render this call as a single envelope
    pub fn request(&self, config: &Config) -> Result<String> {
        let kind = if self.notify {
            MessageKind::Notify
        } else {
            MessageKind::Request
        };
        codec::dumps(&self.params, Some(&self.method), kind, config)
    }
}

/// Adds notification jobs to a [`MultiCall`]
pub struct MultiCallNotify<'m, 'a> {
    multicall: &'m mut MultiCall<'a>,
}

impl<'m, 'a> MultiCallNotify<'m, 'a> {
    pub fn method(self, name: &str) -> &'m mut MultiCallMethod {
        self.multicall.push(name, true)
    }
}

/// Pending calls bound to one server proxy
pub struct MultiCall<'a> {
    server: &'a ServerProxy,
    jobs: Vec<MultiCallMethod>,
}

impl<'a> MultiCall<'a> {
    pub fn new(server: &'a ServerProxy) -> Self {
        Self {
            server,
            jobs: Vec::new(),
        }
    }

    /// Queue a call to `name`
    pub fn method(&mut self, name: &str) -> &mut MultiCallMethod {
        self.push(name, false)
    }

    /// View that queues notifications instead of calls
    pub fn notify(&mut self) -> MultiCallNotify<'_, 'a> {
        MultiCallNotify { multicall: self }
    }

    pub fn jobs(&self) -> &[MultiCallMethod] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn push(&mut self, name: &str, notify: bool) -> &mut MultiCallMethod {
        self.jobs.push(MultiCallMethod::new(name, notify));
        let last = self.jobs.len() - 1;
        &mut self.jobs[last]
    }

    /// Submit every queued call in one round-trip
    ///
    /// Returns `Ok(None)` without touching the transport when nothing is
    /// queued. A response with no body yields an empty result set.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` or `Error::Serialization` if a job cannot be
    ///   encoded; the queued jobs are kept
    /// - `Error::Fault` if the server answered the whole batch with an error envelope
    /// - `Error::Protocol` if the reply is neither an array of envelopes nor an error envelope
    /// - any transport error, unchanged
    pub async fn request(&mut self) -> Result<Option<MultiCallIterator>> {
        if self.jobs.is_empty() {
            return Ok(None);
        }

        let config = self.server.context().config();
        let parts = self
            .jobs
            .iter()
            .map(|job| job.request(config))
            .collect::<Result<Vec<_>>>()?;
        let body = codec::encode_batch(&parts);
        let jobs = std::mem::take(&mut self.jobs);

        let calls = jobs.iter().filter(|job| !job.notify).count();
        tracing::debug!(jobs = jobs.len(), calls, "Submitting batch");
        if let Some(metrics) = self.server.metrics() {
            metrics.record_batch(jobs.len() as u64);
        }

        let results = match self.server.run_request("multicall", &body).await? {
            None => Vec::new(),
            Some(Value::Array(items)) if items.is_empty() => items,
            Some(value) if codec::is_batch(&value) => serde_json::from_value(value)?,
            Some(Value::Object(envelope)) if envelope.contains_key("error") => {
                let data: ErrorData = serde_json::from_value(envelope["error"].clone())?;
                return Err(Error::Fault(data));
            }
            Some(other) => {
                return Err(Error::Protocol(format!(
                    "Expected an array of envelopes, got {}.",
                    other
                )));
            }
        };

        if results.len() != calls {
            tracing::warn!(expected = calls, received = results.len(), "Batch response size mismatch");
        }
        Ok(Some(MultiCallIterator::new(results)))
    }
}

impl fmt::Debug for MultiCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiCall")
            .field("server", &self.server.to_string())
            .field("jobs", &self.jobs)
            .finish()
    }
}

/// Results of a submitted batch, in submission order of the non-notify calls
///
/// Indexing and iteration project each envelope's `result` member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiCallIterator {
    results: Vec<Value>,
}

impl MultiCallIterator {
    pub fn new(results: Vec<Value>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// `result` of the i-th envelope; `None` past the end
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.results
            .get(index)
            .map(|envelope| envelope.get("result").unwrap_or(&NULL))
    }

    /// `error` of the i-th envelope, if that call failed
    pub fn error(&self, index: usize) -> Option<ErrorData> {
        let error = self.results.get(index)?.get("error")?;
        if error.is_null() {
            return None;
        }
        serde_json::from_value(error.clone()).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> + '_ {
        self.results
            .iter()
            .map(|envelope| envelope.get("result").unwrap_or(&NULL))
    }

    /// The raw envelopes
    pub fn results(&self) -> &[Value] {
        &self.results
    }
}

impl Index<usize> for MultiCallIterator {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        self.results[index].get("result").unwrap_or(&NULL)
    }
}

impl<'r> IntoIterator for &'r MultiCallIterator {
    type Item = &'r Value;
    type IntoIter = Box<dyn Iterator<Item = &'r Value> + 'r>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
