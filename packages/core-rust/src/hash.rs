//! Hex-encoded digests used by the authentication layer.
//!
//! MD5 is fixed by the HTTP Digest `algorithm="md5"` challenge; SHA-256 is
//! used wherever the gateway only needs an unpredictable token (the nonce).

use sha2::{Digest, Sha256};

/// Lowercase hex MD5 of `input`.
///
/// # Examples
///
/// ```
/// use xacml_core::hash::md5_hex;
///
/// assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
/// ```
#[must_use]
pub fn md5_hex(input: impl AsRef<[u8]>) -> String {
    format!("{:x}", md5::compute(input))
}

/// Lowercase hex SHA-256 of `input`.
#[must_use]
pub fn sha256_hex(input: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(input.as_ref()))
}
