//! Listener configuration for the gateway.

use std::path::PathBuf;
use std::time::Duration;

/// Where and how the gateway listens.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub host: String,
    /// 0 lets the OS pick a port.
    pub port: u16,
    /// Serve HTTPS instead of plain HTTP when set.
    pub tls: Option<TlsConfig>,
    /// Allowed CORS origins; `*` allows any.
    pub cors_origins: Vec<String>,
    /// Requests still running after this are answered with 408.
    pub request_timeout: Duration,
    /// How long shutdown waits for in-flight decisions.
    pub drain_timeout: Duration,
}

impl NetworkConfig {
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            tls: None,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

/// PEM certificate chain and private key for rustls.
///
/// No `Default` impl because certificate paths have no sensible defaults.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}
