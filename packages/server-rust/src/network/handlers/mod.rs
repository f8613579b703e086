//! HTTP handlers and the state they share.

pub mod health;
pub mod xacml;

pub use health::{health_handler, liveness_handler, readiness_handler};
pub use xacml::xacml_handler;

use std::sync::Arc;
use std::time::Instant;

use super::ShutdownController;
use crate::service::Dispatcher;

/// Shared state passed to every handler via `State` extraction.
///
/// All fields are `Arc` (or `Copy`), so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Request pipeline for the XACML endpoint.
    pub dispatcher: Arc<Dispatcher>,
    /// Health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Used for uptime reporting.
    pub start_time: Instant,
}
