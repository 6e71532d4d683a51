//! Command-line interface
//!
//! Resolves connection settings, opens one session, runs one command and
//! always logs out before printing the result.

pub mod commands;
pub mod output;

use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use log::{info, warn};
use std::path::PathBuf;

use crate::api::{ClientError, SugarClient, SugarFault};
use crate::config::{Settings, default_config_path};
use commands::Command;
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "sugar-cli", version, about = "Query and update a SugarCRM instance over SOAP")]
pub struct Cli {
    /// Full URL of the soap.php endpoint
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[arg(long, short, global = true)]
    pub username: Option<String>,

    /// Prefer SUGAR_PASSWORD or the config file over passing this on the command line
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Application name reported at login
    #[arg(long, global = true)]
    pub app_name: Option<String>,

    /// Request timeout in seconds (0 disables it)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Config file (default: <config dir>/sugar-cli/config.toml)
    #[arg(long, global = true, env = "SUGAR_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, short, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The command-line settings layer
    pub fn settings(&self) -> Settings {
        Settings {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            password_digest: None,
            application_name: self.app_name.clone(),
            timeout_secs: self.timeout,
        }
    }

    /// Merge command line, environment and config file, prompting for a
    /// password when none is configured
    pub fn resolve_settings(&self) -> Result<Settings> {
        let file = match self.config.clone().or_else(default_config_path) {
            Some(path) => Settings::from_file(&path)?,
            None => Settings::default(),
        };
        let settings = self.settings().or(Settings::from_env()?).or(file);
        with_password(settings, prompt_password)
    }
}

/// Fill in a missing password from `prompt`, but only once the endpoint and
/// username are known
fn with_password<F>(mut settings: Settings, prompt: F) -> Result<Settings>
where
    F: FnOnce(Option<&str>) -> Result<String>,
{
    let has_endpoint = [&settings.url, &settings.username]
        .iter()
        .all(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()));

    if has_endpoint && !settings.has_password() {
        settings.password = Some(prompt(settings.username.as_deref())?);
    }
    Ok(settings)
}

fn prompt_password(username: Option<&str>) -> Result<String> {
    if !std::io::stdin().is_terminal() {
        anyhow::bail!("No password configured; set SUGAR_PASSWORD or add it to the config file");
    }
    let prompt = match username {
        Some(user) => format!("SugarCRM password for {user}: "),
        None => "SugarCRM password: ".to_string(),
    };
    rpassword::prompt_password(prompt).context("Failed to read password")
}

/// Run the parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    if cli.no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let config = cli
        .resolve_settings()?
        .into_config()
        .context("Incomplete SugarCRM connection settings")?;

    let client = SugarClient::from_config(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.url))?;

    let outcome = commands::handler::execute(&client, cli.command).await;

    match client.logout().await {
        Ok(status) if status.is_success() => info!("{status}"),
        Ok(status) => warn!("{status}"),
        Err(err) => warn!("Logout failed: {err}"),
    }

    let rendered = output::render(&outcome?, cli.format)?;
    println!("{rendered}");
    Ok(())
}

/// The server error signal behind `err`, if there is one
pub fn fault_of(err: &anyhow::Error) -> Option<&SugarFault> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ClientError>())
        .and_then(ClientError::as_fault)
}
