//! # Supply-Chain Client Runtime
//!
//! Wiring for the `sc-client` executable.
//!
//! ## Modular Structure
//!
//! - `config` - CLI arguments, environment and TOML configuration
//! - `commands` - Line command parser
//! - `metrics_sink` - Presentation sink feeding the Prometheus metrics
//! - `runtime` - Session, devnet ledger and sinks tied together
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, TOML file, environment, CLI flags)
//! 2. Initialize telemetry
//! 3. Build the devnet ledger and the session
//! 4. Start the sync loop
//! 5. Read commands until `quit` or Ctrl+C

pub mod commands;
pub mod config;
pub mod metrics_sink;
pub mod runtime;

pub use commands::{parse_command, Command, CommandError};
pub use config::{CliArgs, ClientConfig, ConfigError};
pub use metrics_sink::{record_dispatch, MetricsSink};
pub use runtime::{ClientRuntime, Reply};
