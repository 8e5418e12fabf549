//! Codec configuration
//!
//! # Environment Variables
//!
//! `Config::from_env()` starts from the defaults and applies:
//! - `VELES_USE_JSONCLASS`: `true`/`false` (also `1`/`0`)
//! - `VELES_SERIALIZE_METHOD`: name passed to `JsonClass::serialize`
//! - `VELES_IGNORE_ATTRIBUTE`: name passed to `JsonClass::ignored`

use serde::{Deserialize, Serialize};

pub const DEFAULT_SERIALIZE_METHOD: &str = "_serialize";
pub const DEFAULT_IGNORE_ATTRIBUTE: &str = "_ignore";

/// Options recognised by the message and object codecs
///
/// # Examples
///
/// ```rust
/// use veles_core::Config;
///
/// let config = Config::default().with_jsonclass(false).with_serialize_method("to_wire");
/// assert!(!config.use_jsonclass);
/// assert_eq!(config.serialize_method, "to_wire");
/// assert_eq!(config.ignore_attribute, "_ignore");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run params through the jsonclass encoder before building envelopes
    pub use_jsonclass: bool,
    /// Serializer name handed to each instance
    pub serialize_method: String,
    /// Ignore-list name handed to each instance
    pub ignore_attribute: String,
    /// Sent as the `User-Agent` header by the default WebSocket transport
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_jsonclass: true,
            serialize_method: DEFAULT_SERIALIZE_METHOD.to_string(),
            ignore_attribute: DEFAULT_IGNORE_ATTRIBUTE.to_string(),
            user_agent: format!("(Rust veles/{})", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Defaults overridden by `VELES_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("VELES_USE_JSONCLASS") {
            match parse_bool(&value) {
                Some(flag) => config.use_jsonclass = flag,
                None => tracing::warn!(value = %value, "Ignoring invalid VELES_USE_JSONCLASS"),
            }
        }
        if let Ok(value) = std::env::var("VELES_SERIALIZE_METHOD") {
            config.serialize_method = value;
        }
        if let Ok(value) = std::env::var("VELES_IGNORE_ATTRIBUTE") {
            config.ignore_attribute = value;
        }
        config
    }

    pub fn with_jsonclass(mut self, enable: bool) -> Self {
        self.use_jsonclass = enable;
        self
    }

    pub fn with_serialize_method(mut self, name: impl Into<String>) -> Self {
        self.serialize_method = name.into();
        self
    }

    pub fn with_ignore_attribute(mut self, name: impl Into<String>) -> Self {
        self.ignore_attribute = name.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
