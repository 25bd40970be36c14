//! Line command parser for the interactive front-end.
//!
//! ```text
//! create <name...> <cost>   register a record (name may contain spaces)
//! pay <id>                  pay a Created record
//! deliver <id>              deliver a Paid record
//! list                      show the current snapshot
//! export                    print the current snapshot as JSON
//! sync                      sync now
//! actor <address>|none      switch the acting account
//! help
//! quit
//! ```

use primitive_types::U256;
use sc_ledger_sync::{ActorId, RecordId};
use thiserror::Error;

use crate::config::parse_actor;

/// A parsed command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Register a record
    Create {
        /// Record name
        name: String,
        /// Price in the ledger's smallest unit
        cost: U256,
    },
    /// Pay for a record
    Pay(RecordId),
    /// Deliver a record
    Deliver(RecordId),
    /// Show the snapshot
    List,
    /// Snapshot as JSON
    Export,
    /// Sync immediately
    Sync,
    /// Switch actor
    Actor(Option<ActorId>),
    /// Show usage
    Help,
    /// Leave
    Quit,
}

impl Command {
    /// Whether the command submits a transaction.
    pub fn is_dispatch(&self) -> bool {
        matches!(self, Self::Create { .. } | Self::Pay(_) | Self::Deliver(_))
    }
}

/// Command parse failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// First word is not a command.
    #[error("Unknown command {0:?}, try \"help\"")]
    Unknown(String),

    /// A required argument is missing.
    #[error("Usage: {0}")]
    Usage(&'static str),

    /// A number could not be parsed.
    #[error("Invalid number {0:?}")]
    InvalidNumber(String),

    /// The actor address could not be parsed.
    #[error("{0}")]
    InvalidActor(String),
}

/// Usage text shown by `help`.
pub const HELP: &str = "\
commands:
  create <name> <cost>   register a record
  pay <id>               pay a Created record
  deliver <id>           deliver a Paid record
  list                   show records
  export                 show records as JSON
  sync                   sync now
  actor <address>|none   switch the acting account
  quit";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match head.to_lowercase().as_str() {
        "create" | "add" => {
            let Some((cost, name)) = args.split_last() else {
                return Err(CommandError::Usage("create <name> <cost>"));
            };
            if name.is_empty() {
                return Err(CommandError::Usage("create <name> <cost>"));
            }
            let cost = U256::from_dec_str(cost)
                .map_err(|_| CommandError::InvalidNumber(cost.to_string()))?;
            Command::Create {
                name: name.join(" "),
                cost,
            }
        }
        "pay" => Command::Pay(record_id(&args, "pay <id>")?),
        "deliver" => Command::Deliver(record_id(&args, "deliver <id>")?),
        "list" | "ls" => Command::List,
        "export" => Command::Export,
        "sync" => Command::Sync,
        "actor" => {
            let [value] = args.as_slice() else {
                return Err(CommandError::Usage("actor <address>|none"));
            };
            let actor = parse_actor(value).map_err(|e| CommandError::InvalidActor(e.to_string()))?;
            Command::Actor(actor)
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn record_id(args: &[&str], usage: &'static str) -> Result<RecordId, CommandError> {
    let [value] = args else {
        return Err(CommandError::Usage(usage));
    };
    value
        .parse()
        .map_err(|_| CommandError::InvalidNumber(value.to_string()))
}
