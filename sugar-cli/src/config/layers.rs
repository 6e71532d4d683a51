//! Layered settings: command line over environment over config file

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::ClientConfig;
use crate::api::{ClientError, Result};

pub const CONFIG_FILE_NAME: &str = "config.toml";

const APP_DIR: &str = "sugar-cli";

pub const ENV_URL: &str = "SUGAR_URL";
pub const ENV_USERNAME: &str = "SUGAR_USERNAME";
pub const ENV_PASSWORD: &str = "SUGAR_PASSWORD";
pub const ENV_PASSWORD_DIGEST: &str = "SUGAR_PASSWORD_DIGEST";
pub const ENV_APP_NAME: &str = "SUGAR_APP_NAME";
pub const ENV_TIMEOUT_SECS: &str = "SUGAR_TIMEOUT_SECS";

/// `~/.config/sugar-cli/config.toml` or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// One configuration layer; unset values fall through to the next layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// MD5 hex digest, so the plain password need not be stored
    pub password_digest: Option<String>,
    pub application_name: Option<String>,
    /// Request timeout in seconds; 0 disables it
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Read a TOML settings file. A missing file is an empty layer.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        debug!("Loaded config file {}", path.display());
        Self::from_toml(&content)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Settings from any key lookup shaped like the environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let timeout_secs = get(ENV_TIMEOUT_SECS)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|_| {
                    ClientError::Config(format!("{ENV_TIMEOUT_SECS} is not a number: {raw}"))
                })
            })
            .transpose()?;

        Ok(Self {
            url: get(ENV_URL),
            username: get(ENV_USERNAME),
            password: get(ENV_PASSWORD),
            password_digest: get(ENV_PASSWORD_DIGEST),
            application_name: get(ENV_APP_NAME),
            timeout_secs,
        })
    }

    /// Fill every unset value of `self` from `lower`
    pub fn or(self, lower: Settings) -> Self {
        // A password set on a higher layer hides a digest from a lower one
        let (password, password_digest) =
            if self.password.is_some() || self.password_digest.is_some() {
                (self.password, self.password_digest)
            } else {
                (lower.password, lower.password_digest)
            };

        Self {
            url: self.url.or(lower.url),
            username: self.username.or(lower.username),
            password,
            password_digest,
            application_name: self.application_name.or(lower.application_name),
            timeout_secs: self.timeout_secs.or(lower.timeout_secs),
        }
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some() || self.password_digest.is_some()
    }

    pub fn into_config(self) -> Result<ClientConfig> {
        let mut builder = ClientConfig::builder(
            self.url.unwrap_or_default(),
            self.username.unwrap_or_default(),
        )
        .application_name(self.application_name.unwrap_or_default())
        .timeout(
            self.timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        );

        if let Some(password) = self.password {
            builder = builder.password(password);
        } else if let Some(digest) = self.password_digest {
            builder = builder.password_digest(digest);
        }

        builder.build()
    }
}
