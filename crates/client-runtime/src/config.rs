//! # Client Configuration
//!
//! Layered configuration: built-in defaults, then an optional TOML file,
//! then environment / CLI flags.
//!
//! ## Config File Format
//!
//! ```toml
//! actor = "0x00000000000000000000000000000000000000a1"
//! demo = true
//!
//! [sync]
//! sync_interval_ms = 2000
//! sync_on_start = true
//! max_name_len = 256
//!
//! [telemetry]
//! log_level = "info,sc_ledger_sync=debug"
//! json_logs = false
//! ```
//!
//! Without a `[telemetry]` section, telemetry settings come from the
//! `SC_*` environment variables.

use clap::Parser;
use sc_ledger_sync::{ActorId, ActorIdParseError, SyncConfig};
use sc_telemetry::TelemetryConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Command-line arguments. Every flag can also come from the environment.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sc-client")]
#[command(author, version, about = "Supply-chain ledger client", long_about = None)]
pub struct CliArgs {
    /// TOML configuration file
    #[arg(long, env = "SC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Acting account as a 20-byte hex address, or "none"
    #[arg(long, env = "SC_ACTOR")]
    pub actor: Option<String>,

    /// Periodic sync interval in milliseconds
    #[arg(long, env = "SC_SYNC_INTERVAL_MS")]
    pub sync_interval_ms: Option<u64>,

    /// Seed the devnet ledger with sample records
    #[arg(long)]
    pub demo: bool,
}

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// The actor is not a valid address.
    #[error("Invalid actor {value:?}: {source}")]
    InvalidActor {
        /// Value supplied
        value: String,
        /// Parse failure
        source: ActorIdParseError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    actor: Option<String>,
    demo: bool,
    sync: SyncConfig,
    telemetry: Option<TelemetryConfig>,
}

impl ConfigFile {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Sync loop and dispatcher settings
    pub sync: SyncConfig,
    /// Logging and metrics settings
    pub telemetry: TelemetryConfig,
    /// Initial acting account
    pub actor: Option<ActorId>,
    /// Seed the devnet ledger with sample records
    pub demo: bool,
}

impl ClientConfig {
    /// Load configuration for `args`, reading the config file if one is given.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        Self::resolve(file, args, TelemetryConfig::from_env)
    }

    /// Parse a TOML document and apply `args` on top of it.
    pub fn from_toml(content: &str, args: &CliArgs) -> Result<Self, ConfigError> {
        Self::resolve(ConfigFile::parse(content)?, args, TelemetryConfig::default)
    }

    fn resolve(
        file: ConfigFile,
        args: &CliArgs,
        env_telemetry: impl FnOnce() -> TelemetryConfig,
    ) -> Result<Self, ConfigError> {
        let actor = match args.actor.as_deref().or(file.actor.as_deref()) {
            Some(value) => parse_actor(value)?,
            None => None,
        };

        let mut sync = file.sync;
        if let Some(interval_ms) = args.sync_interval_ms {
            sync.sync_interval_ms = interval_ms;
        }

        Ok(Self {
            sync,
            telemetry: file.telemetry.unwrap_or_else(env_telemetry),
            actor,
            demo: args.demo || file.demo,
        })
    }
}

/// Parse an actor address. `"none"` and the empty string mean no actor.
pub fn parse_actor(value: &str) -> Result<Option<ActorId>, ConfigError> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|source| ConfigError::InvalidActor {
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_HEX: &str = "0x00000000000000000000000000000000000000a1";

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ClientConfig::from_toml("", &CliArgs::default()).unwrap();
        assert_eq!(config.sync, SyncConfig::default());
        assert_eq!(config.actor, None);
        assert!(!config.demo);
    }

    #[test]
    fn test_file_sections() {
        let toml = format!(
            r#"
            actor = "{ALICE_HEX}"
            demo = true

            [sync]
            sync_interval_ms = 500

            [telemetry]
            json_logs = true
            "#
        );
        let config = ClientConfig::from_toml(&toml, &CliArgs::default()).unwrap();

        assert_eq!(config.sync.sync_interval_ms, 500);
        assert_eq!(config.sync.max_name_len, 256);
        assert!(config.telemetry.json_logs);
        assert!(config.demo);
        assert_eq!(config.actor.unwrap().as_bytes()[19], 0xa1);
    }

    #[test]
    fn test_flags_override_file() {
        let args = CliArgs {
            actor: Some("none".to_string()),
            sync_interval_ms: Some(100),
            ..CliArgs::default()
        };
        let toml = format!("actor = \"{ALICE_HEX}\"\n[sync]\nsync_interval_ms = 500\n");
        let config = ClientConfig::from_toml(&toml, &args).unwrap();

        assert_eq!(config.actor, None);
        assert_eq!(config.sync.sync_interval_ms, 100);
    }

    #[test]
    fn test_invalid_actor() {
        let args = CliArgs {
            actor: Some("0x1234".to_string()),
            ..CliArgs::default()
        };
        assert!(matches!(
            ClientConfig::from_toml("", &args),
            Err(ConfigError::InvalidActor { .. })
        ));
    }

    #[test]
    fn test_malformed_file() {
        assert!(matches!(
            ClientConfig::from_toml("[sync]\nsync_interval_ms = \"fast\"", &CliArgs::default()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let args = CliArgs {
            config: Some(PathBuf::from("/nonexistent/sc-client.toml")),
            ..CliArgs::default()
        };
        assert!(matches!(ClientConfig::load(&args), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_cli_parsing() {
        let args = CliArgs::try_parse_from(["sc-client", "--actor", ALICE_HEX, "--demo"]).unwrap();
        assert_eq!(args.actor.as_deref(), Some(ALICE_HEX));
        assert!(args.demo);
    }
}
