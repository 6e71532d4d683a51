//! Credential handling
//!
//! SugarCRM's v1 SOAP API authenticates with an MD5 hex digest of the
//! password. The clear-text password is hashed when [`Credentials`] are
//! built and is not kept afterwards.

use md5::{Digest, Md5};
use std::fmt;

use super::models::UserAuth;

/// API version sent with the `login` call
pub const LOGIN_VERSION: &str = "1";

/// Username plus password digest
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password_digest: String,
}

impl Credentials {
    /// Build credentials from a clear-text password
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_digest: password_digest(password),
        }
    }

    /// Build credentials from an already computed digest
    pub fn from_digest(username: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_digest: digest.into().to_ascii_lowercase(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_digest(&self) -> &str {
        &self.password_digest
    }

    /// The `user_auth` structure for a login call
    pub fn user_auth(&self) -> UserAuth {
        UserAuth {
            user_name: self.username.clone(),
            password: self.password_digest.clone(),
            version: LOGIN_VERSION.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password_digest", &"<redacted>")
            .finish()
    }
}

/// Lowercase hex MD5 digest of the UTF-8 password bytes
pub fn password_digest(password: &str) -> String {
    hex::encode(Md5::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(password_digest(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(password_digest("password"), "5f4dcc3b5aa765d61d8327deb882cf99");
    }

    #[test]
    fn test_digest_is_fixed_length_hex() {
        let digest = password_digest("correct horse battery staple");
        assert_eq!(digest.len(), 32);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_credentials_hash_once() {
        let creds = Credentials::new("admin", "password");
        assert_eq!(creds.username(), "admin");
        assert_eq!(creds.password_digest(), "5f4dcc3b5aa765d61d8327deb882cf99");

        let auth = creds.user_auth();
        assert_eq!(auth.user_name, "admin");
        assert_eq!(auth.password, "5f4dcc3b5aa765d61d8327deb882cf99");
        assert_eq!(auth.version, "1");
    }

    #[test]
    fn test_from_digest_normalizes_case() {
        let creds = Credentials::from_digest("admin", "5F4DCC3B5AA765D61D8327DEB882CF99");
        assert_eq!(creds, Credentials::new("admin", "password"));
    }

    #[test]
    fn test_debug_redacts_digest() {
        let rendered = format!("{:?}", Credentials::new("admin", "password"));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("5f4dcc3b"));
    }
}
