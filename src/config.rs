use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "MERGINGTON_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    const HOST: &str = "127.0.0.1";
    const PORT: u16 = 8000;

    fn default() -> Self {
        ServerConfig {
            host: Self::HOST.to_owned(),
            port: Self::PORT,
        }
    }

    fn ensure_valid(&mut self) {
        self.host = self.host.trim().to_owned();
        if self.host.is_empty() {
            eprintln!(
                "Config error: server host is empty - using default of '{}'",
                Self::HOST
            );
            self.host = Self::HOST.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    /// When set, logs are also written to rotating files in this directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const LEVEL: &str = "info";

    fn default() -> Self {
        LoggingConfig {
            level: Self::LEVEL.to_string(),
            directory: None,
        }
    }

    fn ensure_valid(&mut self) {
        // trim and lowercase, then fall back to the default for anything
        // that isn't a recognized level
        let str_original = self.level.clone();
        self.level = self.level.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.level.as_str()) {
            eprintln!(
                "Config error: log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::LEVEL
            );
            self.level = Self::LEVEL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RegistryConfig {
    /// JSON file replacing the built-in activity list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl Config {
    pub fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            registry: RegistryConfig::default(),
        }
    }

    pub fn get_config_path(project_dirs: &ProjectDirs) -> PathBuf {
        project_dirs.data_local_dir().join("config.toml")
    }

    /// Loads configuration from `explicit_path`, or from the app's data
    /// directory when no path is given. In the latter case a default config
    /// file is written to disk if none exists yet.
    pub fn load_config(explicit_path: Option<&Path>) -> Self {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        match ProjectDirs::from("", "", "mergington") {
            Some(project_dirs) => {
                let config_path = Self::get_config_path(&project_dirs);
                if !config_path.exists() {
                    Self::write_default(&config_path);
                }
                Self::load(&config_path)
            }
            None => {
                eprintln!("Could not determine a config directory. Using default configuration.");
                Self::load_from(Self::base_figment())
            }
        }
    }

    /// Layers defaults, the TOML file at `config_path` (if present) and
    /// `MERGINGTON_*` environment variables, in increasing precedence.
    pub fn load(config_path: &Path) -> Self {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_path))
            .merge(Self::env_provider());

        Self::load_from(figment)
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Self::env_provider())
    }

    fn env_provider() -> Env {
        // MERGINGTON_SERVER__PORT -> server.port
        Env::prefixed(ENV_PREFIX).split("__")
    }

    fn load_from(figment: Figment) -> Self {
        // On error, report and fall back to defaults rather than refusing to start
        let mut config: Config = figment.extract().unwrap_or_else(|err| {
            eprintln!("Could not load configuration: {}. Using default configuration.", err);
            Self::default()
        });

        config.ensure_valid();

        config
    }

    fn write_default(config_path: &Path) {
        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
            }
        }
        match toml::to_string_pretty(&Self::default()) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(_) => eprintln!("Failed to serialize default config."),
        }
    }

    fn ensure_valid(&mut self) {
        self.server.ensure_valid();
        self.logging.ensure_valid();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_when_file_missing() {
        Jail::expect_with(|_jail| {
            let config = Config::load(Path::new("missing.toml"));
            assert_eq!(config, Config::default());
            assert_eq!(config.server.port, 8000);
            assert_eq!(config.logging.level, "info");
            assert!(config.registry.seed_file.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [server]
                host = "0.0.0.0"
                port = 9100

                [registry]
                seed_file = "seed.json"
                "#,
            )?;

            let config = Config::load(Path::new("config.toml"));
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.logging.level, "info");
            assert_eq!(config.registry.seed_file, Some(PathBuf::from("seed.json")));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[server]\nport = 9100\n")?;
            jail.set_env("MERGINGTON_SERVER__PORT", "9200");
            jail.set_env("MERGINGTON_LOGGING__LEVEL", "debug");

            let config = Config::load(Path::new("config.toml"));
            assert_eq!(config.server.port, 9200);
            assert_eq!(config.logging.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_are_normalized() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[server]\nhost = \"   \"\n\n[logging]\nlevel = \" WARN \"\n",
            )?;

            let config = Config::load(Path::new("config.toml"));
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.logging.level, "warn");

            jail.create_file("config.toml", "[logging]\nlevel = \"chatty\"\n")?;
            let config = Config::load(Path::new("config.toml"));
            assert_eq!(config.logging.level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_unparseable_file_falls_back_to_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[server]\nport = \"not a port\"\n")?;

            let config = Config::load(Path::new("config.toml"));
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let toml_string = toml::to_string_pretty(&Config::default()).unwrap();
        let restored: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(restored, Config::default());
    }
}
