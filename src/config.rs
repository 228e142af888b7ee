//! Loader configuration
//!
//! All settings have defaults, so an empty YAML document is a valid config.
//!
//! ```yaml
//! markers:
//!   enum_marker: __enum
//!   typedefs_marker: __typedefs
//!   map_of_marker: map_of
//! http:
//!   timeout_seconds: 30
//!   max_retries: 3
//!   retry_backoff:
//!     type: exponential
//!     initial_ms: 100
//! discovery:
//!   jschema_extension: jschema
//!   json_extension: json
//! ```

use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete loader configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Inference-only marker keys
    #[serde(default)]
    pub markers: SchemaMarkers,

    /// HTTP transport settings for fetch methods
    #[serde(default)]
    pub http: HttpConfig,

    /// Source discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl LoaderConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: LoaderConfig = if yaml.trim().is_empty() {
            LoaderConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.markers.validate()?;
        self.discovery.validate()?;
        if self.http.timeout_seconds == 0 {
            return Err(Error::config("http.timeout_seconds must be greater than 0"));
        }
        Ok(())
    }
}

// ============================================================================
// Markers
// ============================================================================

/// Keys that carry schema meaning during inference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMarkers {
    /// Key whose value lists enum literals
    #[serde(default = "default_enum_marker")]
    pub enum_marker: String,

    /// Key whose value maps local aliases to type names
    #[serde(default = "default_typedefs_marker")]
    pub typedefs_marker: String,

    /// Key that makes a map a homogeneous map of its value
    #[serde(default = "default_map_of_marker")]
    pub map_of_marker: String,
}

impl Default for SchemaMarkers {
    fn default() -> Self {
        Self {
            enum_marker: default_enum_marker(),
            typedefs_marker: default_typedefs_marker(),
            map_of_marker: default_map_of_marker(),
        }
    }
}

impl SchemaMarkers {
    fn validate(&self) -> Result<()> {
        let markers = [
            ("enum_marker", &self.enum_marker),
            ("typedefs_marker", &self.typedefs_marker),
            ("map_of_marker", &self.map_of_marker),
        ];
        for (field, value) in &markers {
            if value.is_empty() {
                return Err(Error::config(format!("markers.{field} cannot be empty")));
            }
        }
        let distinct: std::collections::HashSet<_> = markers.iter().map(|(_, v)| v).collect();
        if distinct.len() != markers.len() {
            return Err(Error::config("Marker keys must be distinct"));
        }
        Ok(())
    }
}

fn default_enum_marker() -> String {
    "__enum".to_string()
}

fn default_typedefs_marker() -> String {
    "__typedefs".to_string()
}

fn default_map_of_marker() -> String {
    "map_of".to_string()
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub retry_backoff: BackoffConfig,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: BackoffConfig::default(),
            user_agent: None,
            headers: HashMap::new(),
        }
    }
}

impl HttpConfig {
    /// Translate into the client's runtime configuration
    pub fn to_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .connect_timeout(Duration::from_secs(self.connect_timeout_seconds))
            .max_retries(self.max_retries)
            .backoff(
                self.retry_backoff.backoff_type,
                Duration::from_millis(self.retry_backoff.initial_ms),
                Duration::from_millis(self.retry_backoff.max_ms),
            );
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

// ============================================================================
// Discovery Config
// ============================================================================

/// Source discovery configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Extension of JSchema sources (without the dot)
    #[serde(default = "default_jschema_extension")]
    pub jschema_extension: String,

    /// Extension of plain JSON sample sources
    #[serde(default = "default_json_extension")]
    pub json_extension: String,

    /// Skip files and directories whose name starts with '.'
    #[serde(default = "default_true")]
    pub skip_hidden: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            jschema_extension: default_jschema_extension(),
            json_extension: default_json_extension(),
            skip_hidden: true,
        }
    }
}

impl DiscoveryConfig {
    fn validate(&self) -> Result<()> {
        if self.jschema_extension.is_empty() || self.json_extension.is_empty() {
            return Err(Error::config("Discovery extensions cannot be empty"));
        }
        if self.jschema_extension == self.json_extension {
            return Err(Error::config(
                "discovery.jschema_extension and discovery.json_extension must differ",
            ));
        }
        Ok(())
    }
}

fn default_jschema_extension() -> String {
    "jschema".to_string()
}

fn default_json_extension() -> String {
    "json".to_string()
}

fn default_true() -> bool {
    true
}
