use anyhow::Result;
use clap::Parser;

use asset_lifecycle::cli::commands::{
    build_service, default_actor, history::HistoryCommand, next_states::NextStatesCommand,
    register::RegisterCommand, show::ShowCommand, states::StatesCommand, sweep::SweepCommand,
    transition::TransitionCommand, Command,
};
use asset_lifecycle::cli::{Cli, Commands};
use asset_lifecycle::config::LifecycleAppConfig;
use asset_lifecycle::telemetry::{init_telemetry, shutdown_telemetry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    LifecycleAppConfig::load_env_file()?;
    let mut config = LifecycleAppConfig::load(cli.config.as_deref())?;
    if let Some(state_dir) = cli.state_dir {
        config.storage.state_dir = state_dir;
    }

    init_telemetry(
        &config.observability.log_level,
        cli.json_logs || config.observability.json_logs,
    )?;

    let result = tokio::runtime::Runtime::new()?.block_on(run(cli.command, config));
    shutdown_telemetry();
    result
}

async fn run(command: Commands, config: LifecycleAppConfig) -> Result<()> {
    // `states` only needs the graph, so it never opens the store
    let service = || build_service(&config);

    match command {
        Commands::States => {
            StatesCommand {
                engine: config.engine()?,
            }
            .execute()
            .await
        }
        Commands::Register {
            asset_id,
            state,
            owner,
            location,
            edr,
            actor,
        } => {
            RegisterCommand {
                service: service().await?,
                asset_id,
                state,
                owner,
                location,
                edr,
                actor: actor.unwrap_or_else(default_actor),
            }
            .execute()
            .await
        }
        Commands::Show { asset_id, json } => {
            ShowCommand {
                service: service().await?,
                asset_id,
                json,
            }
            .execute()
            .await
        }
        Commands::NextStates { asset_id, json } => {
            NextStatesCommand {
                service: service().await?,
                asset_id,
                json,
            }
            .execute()
            .await
        }
        Commands::Transition {
            asset_id,
            to,
            reason,
            actor,
            expect,
            wipe_certificate,
            wipe_issuer,
        } => {
            TransitionCommand {
                service: service().await?,
                asset_id,
                to,
                reason,
                actor: actor.unwrap_or_else(default_actor),
                expect,
                wipe_certificate,
                wipe_issuer,
            }
            .execute()
            .await
        }
        Commands::History { asset_id, json } => {
            HistoryCommand {
                service: service().await?,
                asset_id,
                json,
            }
            .execute()
            .await
        }
        Commands::Sweep {
            watch,
            threshold_days,
        } => {
            SweepCommand {
                service: service().await?,
                threshold_days: threshold_days.unwrap_or(config.lifecycle.lost_escalation_days),
                watch,
                interval: config.sweep_interval(),
            }
            .execute()
            .await
        }
    }
}
