use std::time::Duration;

use tracing::error;
use xacml_core::ValidationRules;

/// Body size limit applied when none is configured or the configured value
/// is unusable.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 16_384;

/// Request-pipeline configuration, read-only once the server starts.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Maximum accepted body size in bytes. 0 disables the limit.
    pub max_content_length: usize,
    /// Realm used when the request path carries no meta alias.
    pub default_realm: String,
    /// `qop` advertised in digest challenges. `None` omits it.
    pub qop: Option<String>,
    /// Interval between nonce rotations.
    pub nonce_rotation_interval: Duration,
    /// Path advertised for the PDP resource in the home document.
    pub pdp_path: String,
    /// Element names the classifier looks for.
    pub rules: ValidationRules,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            default_realm: "/".to_string(),
            qop: Some("auth".to_string()),
            nonce_rotation_interval: Duration::from_secs(60),
            pdp_path: "/xacml/pdp".to_string(),
            rules: ValidationRules::default(),
        }
    }
}

/// Parses a configured maximum content length.
///
/// A missing value yields the default. A value that is not a non-negative
/// integer is logged and also yields the default.
#[must_use]
pub fn parse_max_content_length(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return DEFAULT_MAX_CONTENT_LENGTH;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        error!(
            value = raw,
            fallback = DEFAULT_MAX_CONTENT_LENGTH,
            "invalid maximum content length, using default"
        );
        DEFAULT_MAX_CONTENT_LENGTH
    })
}
