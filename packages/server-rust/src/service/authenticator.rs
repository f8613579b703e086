//! Server side of HTTP Digest authentication.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::debug;
use xacml_core::digest::{challenge_header, expected_response, DigestInput};
use xacml_core::{AuthenticationChallenge, AuthenticationError, CredentialStore};

use super::nonce::NonceManager;

/// Validates `Authorization: Digest` headers against the current nonce.
#[derive(Clone)]
pub struct DigestAuthenticator {
    nonces: NonceManager,
    credentials: Arc<dyn CredentialStore>,
    qop: Option<String>,
}

impl DigestAuthenticator {
    #[must_use]
    pub fn new(
        nonces: NonceManager,
        credentials: Arc<dyn CredentialStore>,
        qop: Option<String>,
    ) -> Self {
        Self {
            nonces,
            credentials,
            qop,
        }
    }

    #[must_use]
    pub fn nonces(&self) -> &NonceManager {
        &self.nonces
    }

    /// Checks a digest header for a request in `realm`.
    ///
    /// The nonce is read once, so a rotation during the check cannot mix two
    /// values. The client's `uri` field is what goes into HA2.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthenticationError`] when the header is not Digest, lacks a
    /// field the computation needs, names an unknown user, or carries a
    /// response that does not match.
    pub fn authenticate(
        &self,
        header: &str,
        method: &str,
        realm: &str,
        body: &[u8],
    ) -> Result<AuthenticationChallenge, AuthenticationError> {
        let challenge = AuthenticationChallenge::parse(header)?;
        let username = required(challenge.username.as_deref(), "username")?;
        let uri = required(challenge.uri.as_deref(), "uri")?;
        let response = required(challenge.response.as_deref(), "response")?;
        let qop = challenge.qop();
        let (nc, cnonce) = match qop {
            Some(_) => (
                required(challenge.nc.as_deref(), "nc")?,
                required(challenge.cnonce.as_deref(), "cnonce")?,
            ),
            None => ("", ""),
        };

        let ha1 = self
            .credentials
            .ha1(realm, username)
            .ok_or(AuthenticationError::UnknownUser)?;
        let nonce = self.nonces.current();

        let expected = expected_response(&DigestInput {
            ha1: &ha1,
            nonce: &nonce,
            method,
            uri,
            qop,
            nc,
            cnonce,
            body,
        });

        if bool::from(expected.as_bytes().ct_eq(response.as_bytes())) {
            debug!(username, realm, "digest response accepted");
            Ok(challenge)
        } else {
            Err(AuthenticationError::ResponseMismatch)
        }
    }

    /// `WWW-Authenticate` value carrying the current nonce.
    #[must_use]
    pub fn challenge(&self, realm: &str) -> String {
        challenge_header(realm, self.qop.as_deref(), &self.nonces.current())
    }
}

impl std::fmt::Debug for DigestAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestAuthenticator")
            .field("qop", &self.qop)
            .finish_non_exhaustive()
    }
}

fn required<'a>(
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str, AuthenticationError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(AuthenticationError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use xacml_core::digest::ha1;
    use xacml_core::StaticCredentials;

    use super::*;

    const BODY: &[u8] = b"<Request/>";

    fn authenticator(qop: Option<&str>) -> DigestAuthenticator {
        DigestAuthenticator::new(
            NonceManager::default(),
            Arc::new(StaticCredentials::new().with_user("pep", "secret")),
            qop.map(str::to_owned),
        )
    }

    fn response_for(auth: &DigestAuthenticator, qop: Option<&str>, password: &str) -> String {
        let nonce = auth.nonces().current();
        let ha1 = ha1("pep", "/", password);
        expected_response(&DigestInput {
            ha1: &ha1,
            nonce: &nonce,
            method: "POST",
            uri: "/xacml/pdp",
            qop,
            nc: "00000001",
            cnonce: "c0ffee",
            body: BODY,
        })
    }

    fn header(auth: &DigestAuthenticator, qop: Option<&str>, response: &str) -> String {
        let nonce = auth.nonces().current();
        let qop_part = qop.map_or(String::new(), |q| {
            format!(r#"qop={q}, nc=00000001, cnonce="c0ffee", "#)
        });
        format!(
            r#"Digest username="pep", realm="/", nonce="{nonce}", uri="/xacml/pdp", {qop_part}response="{response}""#
        )
    }

    #[test]
    fn accepts_valid_qop_auth_response() {
        let auth = authenticator(Some("auth"));
        let response = response_for(&auth, Some("auth"), "secret");
        let parsed = auth
            .authenticate(&header(&auth, Some("auth"), &response), "POST", "/", BODY)
            .unwrap();
        assert_eq!(parsed.username.as_deref(), Some("pep"));
    }

    #[test]
    fn accepts_auth_int_and_binds_body() {
        let auth = authenticator(Some("auth-int"));
        let response = response_for(&auth, Some("auth-int"), "secret");
        let header = header(&auth, Some("auth-int"), &response);
        assert!(auth.authenticate(&header, "POST", "/", BODY).is_ok());
        assert_eq!(
            auth.authenticate(&header, "POST", "/", b"<Request></Request>"),
            Err(AuthenticationError::ResponseMismatch)
        );
    }

    #[test]
    fn accepts_response_without_qop() {
        let auth = authenticator(None);
        let response = response_for(&auth, None, "secret");
        assert!(auth
            .authenticate(&header(&auth, None, &response), "POST", "/", BODY)
            .is_ok());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let auth = authenticator(Some("auth"));
        let response = response_for(&auth, Some("auth"), "guess");
        assert_eq!(
            auth.authenticate(&header(&auth, Some("auth"), &response), "POST", "/", BODY),
            Err(AuthenticationError::ResponseMismatch)
        );
    }

    #[test]
    fn rotated_nonce_invalidates_old_response() {
        let auth = authenticator(Some("auth"));
        let response = response_for(&auth, Some("auth"), "secret");
        let header = header(&auth, Some("auth"), &response);
        auth.nonces().rotate();
        assert_eq!(
            auth.authenticate(&header, "POST", "/", BODY),
            Err(AuthenticationError::ResponseMismatch)
        );
    }

    #[test]
    fn realm_is_part_of_ha1() {
        let auth = authenticator(Some("auth"));
        let response = response_for(&auth, Some("auth"), "secret");
        assert_eq!(
            auth.authenticate(&header(&auth, Some("auth"), &response), "POST", "/other", BODY),
            Err(AuthenticationError::ResponseMismatch)
        );
    }

    #[test]
    fn unknown_user_and_missing_fields() {
        let auth = authenticator(Some("auth"));
        assert_eq!(
            auth.authenticate(
                r#"Digest username="ghost", uri="/", response="00""#,
                "POST",
                "/",
                BODY
            ),
            Err(AuthenticationError::UnknownUser)
        );
        assert_eq!(
            auth.authenticate(r#"Digest uri="/", response="00""#, "POST", "/", BODY),
            Err(AuthenticationError::MissingField("username"))
        );
        assert_eq!(
            auth.authenticate(
                r#"Digest username="pep", uri="/", qop=auth, response="00""#,
                "POST",
                "/",
                BODY
            ),
            Err(AuthenticationError::MissingField("nc"))
        );
        assert_eq!(
            auth.authenticate("Basic cGVwOnNlY3JldA==", "POST", "/", BODY),
            Err(AuthenticationError::UnsupportedScheme)
        );
    }

    #[test]
    fn challenge_carries_current_nonce() {
        let auth = authenticator(Some("auth"));
        let nonce = auth.nonces().current();
        let challenge = auth.challenge("/sub");
        assert!(challenge.starts_with(r#"Digest realm="/sub", qop=auth, algorithm="md5""#));
        assert!(challenge.contains(&format!(r#"nonce="{nonce}""#)));
    }

    proptest! {
        #[test]
        fn single_character_flip_is_rejected(idx in 0usize..32, replacement in "[0-9a-f]") {
            let auth = authenticator(Some("auth"));
            let valid = response_for(&auth, Some("auth"), "secret");
            let mut flipped: Vec<char> = valid.chars().collect();
            let replacement = replacement.chars().next().unwrap();
            prop_assume!(flipped[idx] != replacement);
            flipped[idx] = replacement;
            let flipped: String = flipped.into_iter().collect();

            prop_assert_eq!(
                auth.authenticate(&header(&auth, Some("auth"), &flipped), "POST", "/", BODY),
                Err(AuthenticationError::ResponseMismatch)
            );
        }
    }
}
