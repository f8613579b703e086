use std::collections::HashMap;

use crate::digest::ha1;

/// Source of digest credentials.
///
/// Implementations return `HA1 = MD5(username:realm:password)` so the caller
/// never handles plaintext passwords.
pub trait CredentialStore: Send + Sync {
    /// HA1 for `username` in `realm`, or `None` if the user is unknown there.
    fn ha1(&self, realm: &str, username: &str) -> Option<String>;
}

/// Fixed in-memory user table, valid in every realm.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    passwords: HashMap<String, String>,
}

impl StaticCredentials {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.passwords.insert(username.into(), password.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.passwords.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passwords.is_empty()
    }
}

impl FromIterator<(String, String)> for StaticCredentials {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            passwords: iter.into_iter().collect(),
        }
    }
}

impl CredentialStore for StaticCredentials {
    fn ha1(&self, realm: &str, username: &str) -> Option<String> {
        self.passwords
            .get(username)
            .map(|password| ha1(username, realm, password))
    }
}
