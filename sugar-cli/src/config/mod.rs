//! Connection configuration
//!
//! [`ClientConfig`] is the resolved, validated form handed to
//! [`SugarClient::from_config`](crate::api::SugarClient::from_config).
//! It is either built directly or resolved from [`Settings`] layers
//! (command line, environment, config file).

pub mod layers;

pub use layers::{CONFIG_FILE_NAME, Settings, default_config_path};

use std::fmt;
use std::time::Duration;

use crate::api::{ClientError, Credentials, Result};

/// Password as configured: plain text, or an MD5 digest computed elsewhere
#[derive(Clone, PartialEq, Eq)]
pub enum Password {
    Plain(String),
    Digest(String),
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(_) => write!(f, "Plain(<redacted>)"),
            Self::Digest(_) => write!(f, "Digest(<redacted>)"),
        }
    }
}

/// Everything needed to open a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Full URL of the `soap.php` endpoint
    pub url: String,
    pub username: String,
    pub password: Password,
    /// Reported with the login call
    pub application_name: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn builder(url: impl Into<String>, username: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            url: url.into(),
            username: username.into(),
            password: None,
            application_name: String::new(),
            timeout: None,
        }
    }

    /// Login credentials, hashing a plain password
    pub fn credentials(&self) -> Result<Credentials> {
        match &self.password {
            Password::Plain(plain) => Ok(Credentials::new(self.username.clone(), plain)),
            Password::Digest(digest) => {
                if digest.len() != 32 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(ClientError::Config(
                        "password digest must be 32 hex characters".to_string(),
                    ));
                }
                Ok(Credentials::from_digest(self.username.clone(), digest.clone()))
            }
        }
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    url: String,
    username: String,
    password: Option<Password>,
    application_name: String,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Password::Plain(password.into()));
        self
    }

    /// Use a precomputed MD5 hex digest instead of a plain password
    pub fn password_digest(mut self, digest: impl Into<String>) -> Self {
        self.password = Some(Password::Digest(digest.into()));
        self
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        if self.url.trim().is_empty() {
            return Err(ClientError::Config("no SugarCRM URL configured".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(ClientError::Config("no username configured".to_string()));
        }
        let password = self
            .password
            .ok_or_else(|| ClientError::Config("no password configured".to_string()))?;

        Ok(ClientConfig {
            url: self.url,
            username: self.username,
            password,
            application_name: self.application_name,
            timeout: self.timeout,
        })
    }
}
