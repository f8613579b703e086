//! Error taxonomy for the request pipeline.
//!
//! Each enum covers one pipeline stage. None of them is retryable by the
//! server; the dispatcher turns every variant into a rendered HTTP status.

/// Rejections raised before the body is read or parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("content length required")]
    LengthRequired,
    #[error("payload too large: declared {declared} bytes, limit {limit}")]
    PayloadTooLarge { declared: u64, limit: u64 },
    #[error("unsupported media type: {}", media_type.as_deref().unwrap_or("<none>"))]
    UnsupportedMediaType { media_type: Option<String> },
}

/// Digest authentication failures. The caller answers all of them with a
/// fresh challenge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationError {
    #[error("authorization scheme is not Digest")]
    UnsupportedScheme,
    #[error("digest header is missing the `{0}` field")]
    MissingField(&'static str),
    #[error("unknown user for realm")]
    UnknownUser,
    #[error("digest response does not match")]
    ResponseMismatch,
}

/// Structural problems in an otherwise well-formed document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("wrapper element is missing required field `{0}`")]
    MissingWrapperField(&'static str),
    #[error("no decision request element present")]
    MissingDecisionRequest,
}

/// The body could not be turned into a tree at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(String),
    #[error("malformed JSON: {0}")]
    Json(String),
    #[error("request body is not valid UTF-8")]
    Encoding,
}

/// Outcome of classifying a request body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
