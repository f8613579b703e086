//! HTTP Digest (RFC 2617) header codec and response computation.
//!
//! Everything here is pure: the caller supplies the nonce snapshot, the HA1
//! for the user and the request body, and gets back the expected response.

use crate::error::AuthenticationError;
use crate::hash::md5_hex;

/// Scheme token that prefixes both the challenge and the credentials.
pub const DIGEST_SCHEME: &str = "Digest";

/// Quality-of-protection value that folds the body hash into HA2.
pub const QOP_AUTH_INT: &str = "auth-int";

/// Returns true when an `Authorization` value uses the Digest scheme.
#[must_use]
pub fn is_digest_scheme(header: &str) -> bool {
    let header = header.trim_start();
    header
        .get(..DIGEST_SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(DIGEST_SCHEME))
        && !header[DIGEST_SCHEME.len()..]
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace())
}

/// Parsed key/value pairs of an `Authorization: Digest ...` header.
///
/// Lives only for the duration of one authentication check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationChallenge {
    pub username: Option<String>,
    pub realm: Option<String>,
    pub nonce: Option<String>,
    pub uri: Option<String>,
    pub qop: Option<String>,
    pub nc: Option<String>,
    pub cnonce: Option<String>,
    pub response: Option<String>,
    pub opaque: Option<String>,
}

impl AuthenticationChallenge {
    /// Parses a raw `Authorization` header value.
    ///
    /// Pairs without `=` and unknown keys are skipped; surrounding quotes and
    /// whitespace are stripped. Commas inside quoted values do not split.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::UnsupportedScheme`] when the header does
    /// not start with the Digest scheme.
    pub fn parse(header: &str) -> Result<Self, AuthenticationError> {
        if !is_digest_scheme(header) {
            return Err(AuthenticationError::UnsupportedScheme);
        }
        let params = header.trim_start()[DIGEST_SCHEME.len()..].trim();

        let mut challenge = Self::default();
        for member in split_params(params) {
            let Some((key, value)) = member.split_once('=') else {
                continue;
            };
            let value = value.replace('"', "").trim().to_string();
            let slot = match key.trim().to_ascii_lowercase().as_str() {
                "username" => &mut challenge.username,
                "realm" => &mut challenge.realm,
                "nonce" => &mut challenge.nonce,
                "uri" => &mut challenge.uri,
                "qop" => &mut challenge.qop,
                "nc" => &mut challenge.nc,
                "cnonce" => &mut challenge.cnonce,
                "response" => &mut challenge.response,
                "opaque" => &mut challenge.opaque,
                _ => continue,
            };
            *slot = Some(value);
        }
        Ok(challenge)
    }

    /// The `qop` value, treating an empty value as absent.
    #[must_use]
    pub fn qop(&self) -> Option<&str> {
        self.qop.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// Splits a parameter list on top-level commas, keeping quoted commas.
fn split_params(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (idx, ch) in s.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&s[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// `HA1 = MD5(username:realm:password)`.
#[must_use]
pub fn ha1(username: &str, realm: &str, password: &str) -> String {
    md5_hex(format!("{username}:{realm}:{password}"))
}

/// `HA2 = MD5(method:uri)`, or `MD5(method:uri:MD5(body))` for `auth-int`.
#[must_use]
pub fn ha2(method: &str, uri: &str, qop: Option<&str>, body: &[u8]) -> String {
    if qop == Some(QOP_AUTH_INT) {
        md5_hex(format!("{method}:{uri}:{}", md5_hex(body)))
    } else {
        md5_hex(format!("{method}:{uri}"))
    }
}

/// Inputs to the server-side response computation.
#[derive(Debug, Clone, Copy)]
pub struct DigestInput<'a> {
    pub ha1: &'a str,
    pub nonce: &'a str,
    pub method: &'a str,
    pub uri: &'a str,
    pub qop: Option<&'a str>,
    pub nc: &'a str,
    pub cnonce: &'a str,
    pub body: &'a [u8],
}

/// Computes the response a correct client must have sent.
///
/// # Examples
///
/// ```
/// use xacml_core::digest::{expected_response, ha1, DigestInput};
///
/// let ha1 = ha1("Mufasa", "testrealm@host.com", "Circle Of Life");
/// let response = expected_response(&DigestInput {
///     ha1: &ha1,
///     nonce: "dcd98b7102dd2f0e8b11d0f600bfb0c093",
///     method: "GET",
///     uri: "/dir/index.html",
///     qop: Some("auth"),
///     nc: "00000001",
///     cnonce: "0a4f113b",
///     body: b"",
/// });
/// assert_eq!(response, "6629fae49393a05397450978507c4ef1");
/// ```
#[must_use]
pub fn expected_response(input: &DigestInput<'_>) -> String {
    let ha2 = ha2(input.method, input.uri, input.qop, input.body);
    match input.qop {
        None => md5_hex(format!("{}:{}:{ha2}", input.ha1, input.nonce)),
        Some(qop) => md5_hex(format!(
            "{}:{}:{}:{}:{qop}:{ha2}",
            input.ha1, input.nonce, input.nc, input.cnonce
        )),
    }
}

/// `opaque = MD5(realm ++ nonce)`.
#[must_use]
pub fn opaque(realm: &str, nonce: &str) -> String {
    md5_hex(format!("{realm}{nonce}"))
}

/// Builds the `WWW-Authenticate` challenge value.
///
/// # Examples
///
/// ```
/// use xacml_core::digest::challenge_header;
///
/// let header = challenge_header("/", Some("auth"), "abc");
/// assert!(header.starts_with(r#"Digest realm="/", qop=auth, algorithm="md5", nonce="abc""#));
/// ```
#[must_use]
pub fn challenge_header(realm: &str, qop: Option<&str>, nonce: &str) -> String {
    let mut header = format!("{DIGEST_SCHEME} realm=\"{realm}\", ");
    if let Some(qop) = qop.map(str::trim).filter(|q| !q.is_empty()) {
        header.push_str("qop=");
        header.push_str(qop);
        header.push_str(", ");
    }
    header.push_str("algorithm=\"md5\", ");
    header.push_str(&format!("nonce=\"{nonce}\", "));
    header.push_str(&format!("opaque=\"{}\"", opaque(realm, nonce)));
    header
}
