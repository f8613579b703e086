//! XACML gateway server: digest-authenticated XACML REST endpoint on axum,
//! with nonce rotation, health probes and graceful shutdown.

pub mod network;
pub mod service;
pub mod traits;

pub use network::{NetworkConfig, NetworkModule, TlsConfig};
pub use service::{Dispatcher, GatewayConfig, NonceManager, NotApplicableDecisionPoint};
pub use traits::PolicyDecisionPoint;
