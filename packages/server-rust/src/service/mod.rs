//! Request pipeline for the XACML endpoint.
//!
//! 1. **Admission** (`admission`): size limit and media-type normalization
//! 2. **Classification** (`xacml_core::classify`): wrapper and decision-request detection
//! 3. **Authentication** (`authenticator`): RFC 2617 digest against the rotating nonce (`nonce`)
//! 4. **Dispatch** (`dispatch`): per-method flow, engine call
//! 5. **Rendering** (`render`): status, headers and body
//! 6. **Background workers** (`worker`): nonce rotation

pub mod admission;
pub mod authenticator;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod nonce;
pub mod outcome;
pub mod render;
pub mod worker;

pub use admission::AdmissionController;
pub use authenticator::DigestAuthenticator;
pub use config::{parse_max_content_length, GatewayConfig, DEFAULT_MAX_CONTENT_LENGTH};
pub use dispatch::{Dispatcher, Flow};
pub use domain::NotApplicableDecisionPoint;
pub use nonce::{NonceManager, NonceRotator, NonceTask};
pub use outcome::FlowError;
pub use render::Rendered;
pub use worker::{BackgroundRunnable, BackgroundWorker};
