//! XACML gateway core: media types, HTTP Digest math, nonce derivation,
//! request classification and the home document.
//!
//! Everything in this crate is synchronous and free of I/O; the server crate
//! owns sockets, timers and shared state.

pub mod classify;
pub mod content_type;
pub mod context;
pub mod digest;
pub mod document;
pub mod error;
pub mod hash;
pub mod home;
pub mod nonce;
pub mod schema;
pub mod traits;

pub use classify::classify;
pub use content_type::{CommonType, ContentType};
pub use context::{RequestContext, RouteInfo, WrapperFields};
pub use digest::AuthenticationChallenge;
pub use document::{ParsedDocument, StructuralQuery, XmlElement};
pub use error::{AdmissionError, AuthenticationError, ClassifyError, ParseError, ValidationError};
pub use nonce::{ClockSource, SystemClock};
pub use schema::ValidationRules;
pub use traits::{CredentialStore, StaticCredentials};
