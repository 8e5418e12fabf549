//! Server proxy builder
//!
//! The `ServerProxyBuilder` configures a proxy before it is created:
//! - Supply a custom transport (defaults to a [`WsTransport`] sending the
//!   configured user agent)
//! - Share a [`Context`] (registry, history, configuration) between proxies
//! - Enable OpenTelemetry metrics and set the service name
//!
//! # Examples
//!
//! ```rust,no_run
//! use veles_client::ServerProxyBuilder;
//! use veles_core::{Config, Context};
//!
//! # fn example() -> veles_core::Result<()> {
//! let context = Context::new(Config::from_env());
//!
//! let inventory = ServerProxyBuilder::new("http://inventory:8080")
//!     .context(context.clone())
//!     .build()?;
//!
//! let billing = ServerProxyBuilder::new("http://billing:8080/rpc")
//!     .context(context)
//!     .with_default_observability()
//!     .service_name("billing-client")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::metrics::ClientMetrics;
use crate::transport::{Transport, WsTransport};
use crate::ServerProxy;
use std::sync::Arc;
use veles_core::{Context, Error, ObservabilityConfig, Result};

/// Builder for configuring and creating a [`ServerProxy`]
pub struct ServerProxyBuilder {
    uri: String,
    transport: Option<Box<dyn Transport>>,
    context: Option<Context>,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ServerProxyBuilder {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            transport: None,
            context: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Use `transport` instead of a new [`WsTransport`]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Use a shared context instead of a default one
    pub fn context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Initialize observability with this configuration and record metrics
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Service name for telemetry (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Resolve the URL and create the proxy
    ///
    /// No connection is opened here; the transport connects per request.
    pub fn build(self) -> Result<ServerProxy> {
        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            veles_core::init_observability(config.clone()).map_err(|e| {
                Error::Internal(format!("Failed to initialize observability: {}", e))
            })?;

            Some(Arc::new(ClientMetrics::new(&config.service_name)))
        } else {
            None
        };

        let context = self.context.unwrap_or_default();
        let transport = self.transport.unwrap_or_else(|| {
            Box::new(WsTransport::new().with_user_agent(context.config().user_agent.clone()))
        });

        ServerProxy::from_parts(&self.uri, transport, context, metrics)
    }
}
