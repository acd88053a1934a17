use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::info;

use crate::activities::{ActivityMap, ActivityRegistry};
use crate::config::Config;
use crate::error::MergingtonError;

#[derive(Parser)]
#[command(
    name = "mergington",
    version,
    about = "Mergington High School extracurricular activity sign-up service"
)]
pub struct Cli {
    /// Path to a config.toml (default: the app's data directory)
    #[arg(long = "config", short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the server (default if no command specified)
    Serve {
        /// Address to bind (overrides config)
        #[arg(long = "host")]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long = "port", short = 'p')]
        port: Option<u16>,
    },

    /// Print the activities the server would start with, then exit
    Activities {
        /// Only show the named activity
        #[arg(long = "name", short = 'n')]
        name: Option<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    pub fn handle_command_line(self, config: Config) -> Result<(), MergingtonError> {
        let registry = Self::build_registry(&config)?;

        // Default to Serve if no command specified
        match self.command.unwrap_or(Command::Serve {
            host: None,
            port: None,
        }) {
            Command::Serve { host, port } => {
                let host = host.unwrap_or(config.server.host);
                let port = port.unwrap_or(config.server.port);
                Self::start_server(host, port, registry)
            }
            Command::Activities { name } => {
                let activities = match name {
                    Some(name) => {
                        let activity = registry.get(&name)?;
                        ActivityMap::from([(name, activity)])
                    }
                    None => registry.list_all(),
                };
                print!("{}", Self::format_roster(&activities));
                Ok(())
            }
        }
    }

    fn build_registry(config: &Config) -> Result<ActivityRegistry, MergingtonError> {
        match &config.registry.seed_file {
            Some(path) => ActivityRegistry::load_seed_file(path),
            None => Ok(ActivityRegistry::seeded()),
        }
    }

    fn start_server(host: String, port: u16, registry: ActivityRegistry) -> Result<(), MergingtonError> {
        info!("Starting server on {}:{}", host, port);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| MergingtonError::Error(format!("Failed to create runtime: {}", e)))?;

        rt.block_on(async {
            let web_server = crate::server::WebServer::new(host, port, Arc::new(registry));
            web_server.start().await
        })
    }

    fn format_roster(activities: &ActivityMap) -> String {
        let mut out = String::new();
        for (name, activity) in activities {
            out.push_str(&format!(
                "{} ({}/{} - {} spots left)\n  {}\n  {}\n",
                name,
                activity.participants.len(),
                activity.max_participants,
                activity.spots_left(),
                activity.description,
                activity.schedule
            ));
            for email in &activity.participants {
                out.push_str(&format!("    - {}\n", email));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::Activity;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_parsing_no_command_defaults_to_serve() {
        let result = Cli::try_parse_from(["mergington"]);
        assert!(result.is_ok(), "Should accept no command");

        let cli = result.unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parsing_serve_overrides() {
        let cli = Cli::try_parse_from(["mergington", "serve", "--host", "0.0.0.0", "-p", "9000"])
            .unwrap();
        match cli.command {
            Some(Command::Serve { host, port }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(9000));
            }
            _ => panic!("Expected serve command"),
        }
    }

    #[test]
    fn test_cli_parsing_global_config_flag() {
        let cli = Cli::try_parse_from(["mergington", "activities", "--config", "alt.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Activities { name: None })));
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
    }

    #[test]
    fn test_cli_parsing_invalid_arguments() {
        let result = Cli::try_parse_from(["mergington", "nonexistent-command"]);
        assert!(result.is_err(), "Should reject unknown commands");

        let result = Cli::try_parse_from(["mergington", "serve", "--port", "not-a-port"]);
        assert!(result.is_err(), "Should reject a non-numeric port");
    }

    #[test]
    fn test_build_registry_uses_seed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"Robotics": {{"description": "Build robots", "schedule": "Mondays", "max_participants": 8, "participants": []}}}}"#
        )
        .unwrap();

        let mut config = Config::default();
        config.registry.seed_file = Some(file.path().to_path_buf());
        let registry = Cli::build_registry(&config).unwrap();
        assert_eq!(registry.len(), 1);

        config.registry.seed_file = None;
        let registry = Cli::build_registry(&config).unwrap();
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn test_activities_command_unknown_name_fails() {
        let cli = Cli::try_parse_from(["mergington", "activities", "--name", "Ghost Club"]).unwrap();
        let result = cli.handle_command_line(Config::default());
        assert!(matches!(
            result,
            Err(MergingtonError::RegistryError(
                crate::activities::RegistryError::NotFound { .. }
            ))
        ));
    }

    #[test]
    fn test_format_roster() {
        let mut activities = ActivityMap::new();
        activities.insert(
            "Chess Club".to_string(),
            Activity::new("Chess", "Fridays", 12, &["a@x.edu"]),
        );

        let out = Cli::format_roster(&activities);
        assert!(out.starts_with("Chess Club (1/12 - 11 spots left)"));
        assert!(out.contains("    - a@x.edu\n"));
    }
}
