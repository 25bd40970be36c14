//! # Client Runtime
//!
//! Owns the session, the devnet ledger it talks to and the actor input, and
//! executes parsed commands against them.

use primitive_types::U256;
use sc_ledger_sync::{
    ActionKind, ActorId, ChannelSink, ClientSession, DispatchError, DispatchKey, FanoutSink,
    InMemoryLedger, PresentationSink, RecordState, SyncOutcome, TracingSink, TransactionResult,
    ViewEvent,
};
use sc_telemetry::log_record_event;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::info;

use crate::commands::{Command, HELP};
use crate::config::ClientConfig;
use crate::metrics_sink::{record_dispatch, MetricsSink};

/// Result of executing one command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Text to show the user.
    Text(String),
    /// The user asked to leave.
    Quit,
}

/// The running client.
pub struct ClientRuntime {
    session: ClientSession,
    ledger: Arc<InMemoryLedger>,
    view: Arc<ChannelSink>,
    actor_tx: watch::Sender<Option<ActorId>>,
}

impl ClientRuntime {
    /// Build the runtime. Nothing runs until [`ClientRuntime::start`].
    pub fn new(config: &ClientConfig) -> Self {
        let ledger = Arc::new(InMemoryLedger::with_id("devnet"));
        if config.demo {
            seed_demo(&ledger);
        }

        let view = Arc::new(ChannelSink::default());
        let mut sink = FanoutSink::new()
            .with(Arc::new(tracing_sink(&config.telemetry.log_level)))
            .with(Arc::clone(&view) as Arc<dyn PresentationSink>);
        if config.telemetry.metrics_enabled {
            sink = sink.with(Arc::new(MetricsSink::new()));
        }

        let (actor_tx, actor_rx) = watch::channel(config.actor);
        let session = ClientSession::new(
            config.sync.clone(),
            Arc::clone(&ledger) as _,
            Arc::new(sink),
            actor_rx,
        );

        Self {
            session,
            ledger,
            view,
            actor_tx,
        }
    }

    /// Start the sync loop.
    pub fn start(&self) {
        info!(
            actor = ?self.session.current_actor(),
            records = self.ledger.len(),
            "Supply-chain client started"
        );
        self.session.start();
    }

    /// Subscribe to snapshot, in-flight and error events.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.view.subscribe()
    }

    /// The session.
    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    /// Execute one command.
    pub async fn execute(&self, command: Command) -> Reply {
        let text = match command {
            Command::Create { name, cost } => {
                let result = self.session.create(&name, cost).await;
                dispatch_reply(ActionKind::Create, result)
            }
            Command::Pay(id) => {
                log_record_event!(debug, "Pay requested", id);
                let result = self.session.pay(id).await;
                dispatch_reply(ActionKind::Pay, result)
            }
            Command::Deliver(id) => {
                log_record_event!(debug, "Deliver requested", id);
                let result = self.session.deliver(id).await;
                dispatch_reply(ActionKind::Deliver, result)
            }
            Command::List => self.render_list(),
            Command::Export => {
                let snapshot = self.session.snapshot();
                match serde_json::to_string_pretty(snapshot.as_ref()) {
                    Ok(json) => json,
                    Err(e) => format!("error: {}", e),
                }
            }
            Command::Sync => match self.session.sync_now().await {
                SyncOutcome::Completed { records } => format!("synced {} records", records),
                SyncOutcome::Coalesced => "sync already running".to_string(),
                SyncOutcome::Failed(e) => format!("error: {}", e),
                SyncOutcome::Discarded => "session ended".to_string(),
            },
            Command::Actor(actor) => {
                self.actor_tx.send_replace(actor);
                match actor {
                    Some(actor) => format!("actor set to {}", actor),
                    None => "actor cleared".to_string(),
                }
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Reply::Quit,
        };
        Reply::Text(text)
    }

    fn render_list(&self) -> String {
        let snapshot = self.session.snapshot();
        if snapshot.is_empty() {
            return "no records".to_string();
        }

        let mut out = String::new();
        for record in snapshot.iter() {
            let _ = write!(out, "[{}] {}", record.id, record);
            let pending = match record.state {
                RecordState::Created => DispatchKey::Pay(record.id),
                RecordState::Paid => DispatchKey::Deliver(record.id),
                RecordState::Delivered => {
                    out.push('\n');
                    continue;
                }
            };
            if self.session.is_in_flight(&pending) {
                out.push_str(" (processing...)");
            } else if record.owner.is_some() && record.owner == self.session.current_actor() {
                let _ = write!(out, " ({} available)", pending.action());
            }
            out.push('\n');
        }
        if self.session.is_in_flight(&DispatchKey::Create) {
            out.push_str("(adding...)\n");
        }
        out.truncate(out.trim_end().len());
        out
    }

    /// Stop the sync loop and end the session.
    pub async fn shutdown(&self) {
        self.session.shutdown().await;
    }
}

fn dispatch_reply(action: ActionKind, result: Result<TransactionResult, DispatchError>) -> String {
    record_dispatch(action, &result);
    match result {
        Ok(receipt) => format!(
            "{} confirmed: tx {:?} in block {}",
            action, receipt.tx_hash, receipt.block_number
        ),
        Err(e) => format!("error: {}", e),
    }
}

/// Per-record snapshot logging when the log level asks for detail.
fn tracing_sink(log_level: &str) -> TracingSink {
    let level = log_level.to_ascii_lowercase();
    if level.contains("debug") || level.contains("trace") {
        TracingSink::verbose()
    } else {
        TracingSink::new()
    }
}

fn seed_demo(ledger: &InMemoryLedger) {
    ledger.seed("Pallet of bricks", U256::from(1_200), RecordState::Created);
    ledger.seed("Steel beams", U256::from(8_500), RecordState::Paid);
    ledger.seed("Cement bags", U256::from(300), RecordState::Delivered);
}
