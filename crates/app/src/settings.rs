//! Handles settings for the application.
//!
//! Values are read from `config/confbot.toml` (or the file given with
//! `--config`) and can be overridden by environment variables prefixed with
//! `CONFBOT__`, e.g. `CONFBOT__TELEGRAM__TOKEN`.
use std::{path::PathBuf, time::Duration};

use chrono_tz::Tz;
use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG: &str = "config/confbot.toml";

#[derive(Parser, Debug)]
#[command(name = "confbot")]
#[command(about = "Booking and voting bot for a conference")]
struct Cli {
    /// Configuration file (also read from `CONFBOT_CONFIG`).
    #[arg(long, env = "CONFBOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    #[default]
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    /// Administrator allow-list.
    #[serde(default)]
    pub admins: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Forms {
    pub idle_timeout_secs: Option<u64>,
}

impl Forms {
    /// `0` disables expiry, same as leaving the key out.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct Activities {
    pub default_capacity: u32,
}

impl Default for Activities {
    fn default() -> Self {
        Self {
            default_capacity: engine::DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Export {
    pub timezone: String,
}

impl Default for Export {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

impl Export {
    pub fn timezone(&self) -> Result<Tz, String> {
        self.timezone
            .parse()
            .map_err(|err| format!("invalid export timezone \"{}\": {err}", self.timezone))
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub database: Database,
    pub telegram: Option<Telegram>,
    #[serde(default)]
    pub forms: Forms,
    #[serde(default)]
    pub activities: Activities,
    #[serde(default)]
    pub export: Export,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let cli = Cli::parse();
        // An explicit path must exist, the default one is optional.
        let file = match cli.config {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG).required(false),
        };

        Self::from_config(
            Config::builder()
                .add_source(file)
                .add_source(
                    Environment::with_prefix("CONFBOT")
                        .prefix_separator("__")
                        .separator("__")
                        .list_separator(",")
                        .with_list_parse_key("telegram.admins")
                        .try_parsing(true),
                )
                .build()?,
        )
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        if !(1..=engine::MAX_CAPACITY).contains(&settings.activities.default_capacity) {
            return Err(ConfigError::Message(format!(
                "activities.default_capacity must be between 1 and {}",
                engine::MAX_CAPACITY
            )));
        }
        Ok(settings)
    }

    pub fn form_settings(&self) -> engine::FormSettings {
        engine::FormSettings {
            default_capacity: self.activities.default_capacity,
            idle_timeout: self.forms.idle_timeout(),
        }
    }
}
