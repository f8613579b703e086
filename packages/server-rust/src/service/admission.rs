//! Size and media-type checks applied before the body is read.

use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::HeaderMap;
use xacml_core::{AdmissionError, ContentType};

/// Enforces the configured body limit and the closed set of media types.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionController {
    max_content_length: usize,
}

impl AdmissionController {
    /// `max_content_length` of 0 disables the length checks.
    #[must_use]
    pub fn new(max_content_length: usize) -> Self {
        Self { max_content_length }
    }

    /// Checks the declared length, then normalizes the content type.
    ///
    /// A missing or unparseable `Content-Length` counts as negative.
    ///
    /// # Errors
    ///
    /// - [`AdmissionError::LengthRequired`] when a limit is configured and the
    ///   declared length is negative
    /// - [`AdmissionError::PayloadTooLarge`] when it exceeds the limit
    /// - [`AdmissionError::UnsupportedMediaType`] when the content type is
    ///   absent or not recognized
    pub fn admit(&self, headers: &HeaderMap) -> Result<ContentType, AdmissionError> {
        if self.max_content_length > 0 {
            let declared = declared_length(headers);
            let limit = u64::try_from(self.max_content_length).unwrap_or(u64::MAX);
            match declared {
                None => return Err(AdmissionError::LengthRequired),
                Some(declared) if declared > limit => {
                    return Err(AdmissionError::PayloadTooLarge { declared, limit });
                }
                Some(_) => {}
            }
        }

        let raw = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        raw.and_then(ContentType::normalize)
            .ok_or_else(|| AdmissionError::UnsupportedMediaType {
                media_type: raw.map(str::to_owned),
            })
    }

    /// Hard cap for reading the body, so under-declared lengths still stop at
    /// the limit.
    #[must_use]
    pub fn body_limit(&self) -> usize {
        if self.max_content_length == 0 {
            usize::MAX
        } else {
            self.max_content_length
        }
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
