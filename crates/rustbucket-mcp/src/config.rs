//! Transport server configuration.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Address the server binds when `MCP_LISTEN` is not set.
const DEFAULT_LISTEN: &str = "0.0.0.0:9999";

/// SSE server configuration.
///
/// # Examples
///
/// ```
/// use rustbucket_mcp::McpServerConfig;
///
/// let config = McpServerConfig::default();
/// assert_eq!(config.listen, "0.0.0.0:9999");
/// assert_eq!(config.keepalive_secs, 15);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct McpServerConfig {
    /// Socket address the server binds.
    #[builder(default = String::from(DEFAULT_LISTEN))]
    pub listen: String,

    /// Server name advertised during `initialize`.
    #[builder(default = String::from("rustbucket"))]
    pub server_name: String,

    /// Usage hint advertised during `initialize`.
    #[builder(default)]
    pub instructions: Option<String>,

    /// Seconds between keepalive comments on idle streams. Zero disables
    /// keepalives.
    #[builder(default = 15)]
    pub keepalive_secs: u64,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            listen: String::from(DEFAULT_LISTEN),
            server_name: String::from("rustbucket"),
            instructions: None,
            keepalive_secs: 15,
        }
    }
}

impl McpServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `MCP_LISTEN` | `0.0.0.0:9999` |
    /// | `MCP_KEEPALIVE_SECS` | `15` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("MCP_LISTEN") {
            config.listen = v;
        }
        if let Ok(v) = std::env::var("MCP_KEEPALIVE_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                config.keepalive_secs = n;
            }
        }

        config
    }
}
