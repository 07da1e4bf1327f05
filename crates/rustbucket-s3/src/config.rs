//! Storage backend configuration.
//!
//! Provides [`S3Config`] for configuring the AWS SDK client. Values are
//! loaded from environment variables once at startup and are read-only
//! afterwards.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Region assumed when `AWS_REGION` is not set.
pub(crate) const DEFAULT_REGION: &str = "us-east-1";

/// S3 backend configuration.
///
/// All fields have defaults suitable for talking to a local S3-compatible
/// endpoint. Configuration can be loaded from environment variables via
/// [`S3Config::from_env`].
///
/// # Examples
///
/// ```
/// use rustbucket_s3::S3Config;
///
/// let config = S3Config::default();
/// assert_eq!(config.region, "us-east-1");
/// assert_eq!(config.max_buckets, 5);
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    /// Default AWS region for bucket operations.
    #[builder(default = String::from(DEFAULT_REGION))]
    pub region: String,

    /// Endpoint override for S3-compatible backends (e.g. MinIO). When
    /// set, path-style addressing is used.
    #[builder(default)]
    pub endpoint_url: Option<String>,

    /// Static access key id. When unset, the SDK's default provider chain
    /// resolves credentials.
    #[builder(default)]
    pub access_key_id: Option<String>,

    /// Static secret access key, paired with `access_key_id`.
    #[builder(default)]
    pub secret_access_key: Option<String>,

    /// Maximum number of buckets returned by bucket listings.
    #[builder(default = 5)]
    pub max_buckets: usize,

    /// Per-operation timeout for backend calls, in seconds.
    #[builder(default = 30)]
    pub operation_timeout_secs: u64,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "..."),
            )
            .field("max_buckets", &self.max_buckets)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .finish()
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: String::from(DEFAULT_REGION),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            max_buckets: 5,
            operation_timeout_secs: 30,
        }
    }
}

impl S3Config {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `AWS_REGION` | `us-east-1` |
    /// | `S3_ENDPOINT_URL` | *(unset)* |
    /// | `AWS_ACCESS_KEY_ID` | *(unset)* |
    /// | `AWS_SECRET_ACCESS_KEY` | *(unset)* |
    /// | `S3_MAX_BUCKETS` | `5` |
    /// | `S3_OPERATION_TIMEOUT_SECS` | `30` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("AWS_REGION") {
            config.region = v;
        }
        if let Ok(v) = std::env::var("S3_ENDPOINT_URL") {
            config.endpoint_url = Some(v);
        }
        if let Ok(v) = std::env::var("AWS_ACCESS_KEY_ID") {
            config.access_key_id = Some(v);
        }
        if let Ok(v) = std::env::var("AWS_SECRET_ACCESS_KEY") {
            config.secret_access_key = Some(v);
        }
        if let Ok(v) = std::env::var("S3_MAX_BUCKETS") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_buckets = n;
            }
        }
        if let Ok(v) = std::env::var("S3_OPERATION_TIMEOUT_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                config.operation_timeout_secs = n;
            }
        }

        config
    }

    /// The static credential pair, when both halves are configured.
    #[must_use]
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(access), Some(secret)) => Some((access.as_str(), secret.as_str())),
            _ => None,
        }
    }
}
