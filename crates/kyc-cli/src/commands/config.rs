//! Configuration management commands.

use std::path::PathBuf;

use crate::cli::ConfigCommand;
use crate::output::{info, prompt, success};
use crate::{CliConfig, CliError, CliResult};

/// Keys accepted by `config set`.
const KEYS: &str =
    "api_url, session_dir, output_format, timeout_secs, login_route, landing_route, public_endpoints";

/// Runs a config command.
pub fn run_config(cmd: ConfigCommand, config: &mut CliConfig) -> CliResult<()> {
    match cmd {
        ConfigCommand::Show => show_config(config),
        ConfigCommand::Set { key, value } => {
            apply(config, &key, &value)?;
            config.save()?;
            success(&format!("Set {key} = {value}"));
            Ok(())
        }
        ConfigCommand::Init => init_config(config),
    }
}

/// Shows the current configuration.
fn show_config(config: &CliConfig) -> CliResult<()> {
    info(&format!(
        "Configuration file: {}",
        CliConfig::config_path()?.display()
    ));
    println!();
    println!("api_url: {}", config.api_url);
    println!(
        "session_dir: {}",
        config.effective_session_dir(None)?.display()
    );
    println!("output_format: {:?}", config.output_format);
    println!("timeout_secs: {}", config.timeout_secs);
    println!("login_route: {}", config.session.login_route);
    println!("landing_route: {}", config.session.landing_route);
    println!(
        "public_endpoints: {}",
        config.session.public_endpoints.join(", ")
    );
    Ok(())
}

/// Sets one configuration value.
fn apply(config: &mut CliConfig, key: &str, value: &str) -> CliResult<()> {
    let mut updated = config.clone();
    match key {
        "api_url" | "api" => updated.api_url = value.trim_end_matches('/').to_string(),
        "session_dir" => {
            updated.session_dir = if value.is_empty() || value == "none" {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        "output_format" | "output" => updated.output_format = value.parse()?,
        "timeout_secs" | "timeout" => {
            updated.timeout_secs = value.parse().map_err(|_| {
                CliError::InvalidArgument(format!("timeout must be a number of seconds: {value}"))
            })?;
        }
        "login_route" => updated.session.login_route = value.to_string(),
        "landing_route" => updated.session.landing_route = value.to_string(),
        "public_endpoints" => {
            updated.session.public_endpoints = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        _ => {
            return Err(CliError::InvalidArgument(format!(
                "Unknown configuration key: {key}. Known keys: {KEYS}"
            )));
        }
    }
    updated.session.validate()?;
    *config = updated;
    Ok(())
}

/// Initializes configuration interactively.
fn init_config(config: &mut CliConfig) -> CliResult<()> {
    let config_path = CliConfig::config_path()?;

    info("Initializing KYC console configuration...");
    println!();

    let url = prompt(&format!("API URL [{}]: ", config.api_url))?;
    if !url.is_empty() {
        apply(config, "api_url", &url)?;
    }

    let format = prompt(&format!(
        "Output format (table/json/yaml/quiet) [{:?}]: ",
        config.output_format
    ))?;
    if !format.is_empty() {
        apply(config, "output_format", &format)?;
    }

    config.save()?;

    println!();
    success(&format!("Configuration saved to: {}", config_path.display()));
    Ok(())
}
