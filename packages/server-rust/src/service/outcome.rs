use axum::http::StatusCode;
use xacml_core::{AdmissionError, AuthenticationError, ValidationError};

/// Every way a request can end without a 200.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Admission(#[from] AdmissionError),
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
    #[error("request body could not be read")]
    BodyUnreadable,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("credentials required")]
    CredentialsRequired,
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("request is not authenticated")]
    Forbidden,
    #[error("policy decision point failed: {0}")]
    Engine(#[source] anyhow::Error),
}

impl FlowError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Admission(AdmissionError::LengthRequired) => StatusCode::LENGTH_REQUIRED,
            Self::Admission(AdmissionError::PayloadTooLarge { .. }) | Self::BodyTooLarge { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::Admission(AdmissionError::UnsupportedMediaType { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::CredentialsRequired | Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::BodyUnreadable | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the response must carry a fresh digest challenge.
    #[must_use]
    pub fn needs_challenge(&self) -> bool {
        self.status() == StatusCode::UNAUTHORIZED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        let cases: Vec<(FlowError, StatusCode)> = vec![
            (AdmissionError::LengthRequired.into(), StatusCode::LENGTH_REQUIRED),
            (
                AdmissionError::PayloadTooLarge {
                    declared: 2,
                    limit: 1,
                }
                .into(),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (FlowError::BodyTooLarge { limit: 1 }, StatusCode::PAYLOAD_TOO_LARGE),
            (FlowError::BodyUnreadable, StatusCode::BAD_REQUEST),
            (
                AdmissionError::UnsupportedMediaType { media_type: None }.into(),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (FlowError::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED),
            (FlowError::CredentialsRequired, StatusCode::UNAUTHORIZED),
            (
                AuthenticationError::ResponseMismatch.into(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ValidationError::MissingDecisionRequest.into(),
                StatusCode::BAD_REQUEST,
            ),
            (FlowError::Forbidden, StatusCode::FORBIDDEN),
            (
                FlowError::Engine(anyhow::anyhow!("down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.status(), status, "{error}");
        }
    }

    #[test]
    fn only_unauthorized_needs_challenge() {
        assert!(FlowError::CredentialsRequired.needs_challenge());
        assert!(FlowError::from(AuthenticationError::UnknownUser).needs_challenge());
        assert!(!FlowError::Forbidden.needs_challenge());
    }
}
