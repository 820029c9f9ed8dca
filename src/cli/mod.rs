use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "asset-lifecycle")]
#[command(about = "Lifecycle state tracking for IT assets")]
#[command(long_about = "Registers assets, validates and commits lifecycle transitions, \
                       shows the audit trail and escalates long-lost assets to Disposed. \
                       Start with 'asset-lifecycle register <id>'.")]
pub struct Cli {
    /// Directory holding asset snapshots and transition logs
    #[arg(long, global = true, help = "Override storage.state_dir from configuration")]
    pub state_dir: Option<PathBuf>,

    /// Configuration file
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true, help = "Write structured JSON logs to stderr")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new asset in its initial state
    Register {
        /// Global asset id
        asset_id: String,
        /// Initial state (Ordered or Received)
        #[arg(long, default_value = "Ordered", help = "Initial state: Ordered or Received")]
        state: String,
        /// Current owner
        #[arg(long)]
        owner: Option<String>,
        /// Physical location
        #[arg(long)]
        location: Option<String>,
        /// EDR attestation
        #[arg(long, default_value = "unknown", help = "EDR status: compliant, non-compliant, unknown")]
        edr: String,
        /// Who is registering the asset
        #[arg(long)]
        actor: Option<String>,
    },
    /// Show an asset's current record
    Show {
        asset_id: String,
        #[arg(long, help = "Print the record as JSON")]
        json: bool,
    },
    /// List the states an asset can move to next
    NextStates {
        asset_id: String,
        #[arg(long, help = "Print the result as JSON")]
        json: bool,
    },
    /// Validate and commit a state transition
    Transition {
        asset_id: String,
        /// Target state, e.g. "In Service" or in-service
        to: String,
        /// Free-text reason kept in the audit trail
        #[arg(long)]
        reason: Option<String>,
        /// Who performs the transition
        #[arg(long)]
        actor: Option<String>,
        /// State you expect the asset to be in; the commit fails if it moved
        #[arg(long, help = "Fail with a stale-state error unless the asset is in this state")]
        expect: Option<String>,
        /// Wipe certificate id, required when disposing an asset still in hand
        #[arg(long)]
        wipe_certificate: Option<String>,
        /// Issuer of the wipe certificate
        #[arg(long, default_value = "unspecified")]
        wipe_issuer: String,
    },
    /// Show an asset's transition history, newest first
    History {
        asset_id: String,
        #[arg(long, help = "Print the history as JSON")]
        json: bool,
    },
    /// Dispose of assets that have been Lost for longer than the grace period
    Sweep {
        /// Keep running on the configured interval until Ctrl-C
        #[arg(long, help = "Run continuously on lifecycle.sweep_interval_minutes")]
        watch: bool,
        /// Override lifecycle.lost_escalation_days
        #[arg(long)]
        threshold_days: Option<u32>,
    },
    /// Print every lifecycle state with its display color and transitions
    States,
}
