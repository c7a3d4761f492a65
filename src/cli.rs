use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use crate::auth::Token;
use crate::error::NotifierError;
use crate::plugin::{dispatch, SUCCESS_RESPONSE_CODE};
use crate::settings::{PluginSettings, SettingsProvider};

#[derive(Parser)]
#[command(name = "bitbucket-notifier")]
#[command(author, version, about = "Reports GoCD stage status to Bitbucket", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one GoCD plugin request and print its response body
    Handle {
        /// Plugin request name (e.g. "stage-status", "notifications-interested-in")
        #[arg(short, long, default_value = "stage-status")]
        request: String,

        /// Request body file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Plugin settings, either from a JSON settings file or from individual values.
#[derive(Args)]
pub struct SettingsArgs {
    /// JSON file with api_url, api_user, api_key and go_server_url; takes precedence over the flags below
    #[arg(long, env = "BITBUCKET_NOTIFIER_SETTINGS")]
    settings: Option<PathBuf>,

    /// Bitbucket Server base URL (e.g. "https://bitbucket.example.com")
    #[arg(long, env = "BITBUCKET_API_URL")]
    api_url: Option<String>,

    /// Bitbucket user
    #[arg(long, env = "BITBUCKET_API_USER")]
    api_user: Option<String>,

    /// Bitbucket password or HTTP access token
    #[arg(long, env = "BITBUCKET_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Externally reachable GoCD server URL, used for links back to the pipeline
    #[arg(long, env = "GO_SERVER_URL")]
    go_server_url: Option<String>,
}

impl SettingsProvider for SettingsArgs {
    fn plugin_settings(&self) -> crate::error::Result<PluginSettings> {
        if let Some(path) = &self.settings {
            let contents = std::fs::read_to_string(path)?;
            return Ok(serde_json::from_str(&contents)?);
        }

        Ok(PluginSettings::new(
            required(self.api_url.as_deref(), "api_url")?,
            required(self.api_user.as_deref(), "api_user")?,
            Token::from(required(self.api_key.as_deref(), "api_key")?),
            required(self.go_server_url.as_deref(), "go_server_url")?,
        ))
    }
}

fn required<'a>(value: Option<&'a str>, key: &str) -> crate::error::Result<&'a str> {
    value.ok_or_else(|| NotifierError::Config(format!("{key} is not set")))
}

fn read_body(input: Option<&PathBuf>) -> Result<String> {
    if let Some(path) = input {
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }

    let mut body = String::new();
    stdin.read_to_string(&mut body)?;
    Ok(body)
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Handle {
                request,
                input,
                settings,
            } => {
                info!("Handling plugin request: {request}");

                let body = read_body(input.as_ref())?;
                let response = dispatch(request, &body, settings).await;

                if response.response_code != SUCCESS_RESPONSE_CODE {
                    bail!(
                        "Plugin request '{request}' answered {}: {}",
                        response.response_code,
                        response.response_body
                    );
                }

                let output = if self.pretty {
                    let value: serde_json::Value = serde_json::from_str(&response.response_body)?;
                    serde_json::to_string_pretty(&value)?
                } else {
                    response.response_body
                };

                if let Some(output_path) = &self.output {
                    std::fs::write(output_path, output)?;
                    info!("Response written to: {}", output_path.display());
                } else {
                    println!("{output}");
                }

                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn settings_of(cli: Cli) -> SettingsArgs {
        let Commands::Handle { settings, .. } = cli.command;
        settings
    }

    #[test]
    fn test_handle_defaults_to_stage_status() {
        let cli = parse(&["bitbucket-notifier", "handle"]);

        let Commands::Handle { request, input, .. } = cli.command;
        assert_eq!(request, "stage-status");
        assert!(input.is_none());
    }

    #[test]
    fn test_settings_from_flags() {
        let cli = parse(&[
            "bitbucket-notifier",
            "handle",
            "--api-url",
            "https://bitbucket.example.com",
            "--api-user",
            "gocd",
            "--api-key",
            "secret",
            "--go-server-url",
            "https://gocd.example.com",
        ]);

        let settings = settings_of(cli).plugin_settings().unwrap();

        assert_eq!(settings.api_url(), "https://bitbucket.example.com");
        assert_eq!(settings.api_user(), "gocd");
        assert_eq!(settings.api_key().as_str(), "secret");
        assert_eq!(settings.go_server_url(), "https://gocd.example.com");
    }

    #[test]
    fn test_missing_setting_is_config_error() {
        let settings = SettingsArgs {
            settings: None,
            api_url: Some("https://bitbucket.example.com".to_string()),
            api_user: Some("gocd".to_string()),
            api_key: None,
            go_server_url: Some("https://gocd.example.com".to_string()),
        };

        let err = settings.plugin_settings().unwrap_err();

        assert!(matches!(err, NotifierError::Config(_)));
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_missing_settings_file_is_io_error() {
        let settings = SettingsArgs {
            settings: Some(PathBuf::from("/nonexistent/bitbucket-notifier.json")),
            api_url: None,
            api_user: None,
            api_key: None,
            go_server_url: None,
        };

        let err = settings.plugin_settings().unwrap_err();

        assert!(matches!(err, NotifierError::Io(_)));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["bitbucket-notifier", "handle", "--pretty", "-o", "out.json"]);

        assert!(cli.pretty);
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
    }
}
