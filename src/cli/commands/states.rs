use anyhow::Result;

use super::Command;
use crate::lifecycle::{AssetState, LifecycleEngine};
use crate::presentation::{ansi_color, get_state_display};

pub struct StatesCommand {
    pub engine: LifecycleEngine,
}

impl Command for StatesCommand {
    async fn execute(&self) -> Result<()> {
        println!("📋 LIFECYCLE STATES");
        println!("───────────────────");
        for state in AssetState::ALL {
            let display = get_state_display(state);
            let targets: Vec<&str> = self
                .engine
                .graph()
                .targets(state)
                .map(|to| to.label())
                .collect();
            let targets = if targets.is_empty() {
                "(terminal)".to_string()
            } else {
                targets.join(", ")
            };
            println!(
                "{}{:<11}\x1b[0m {:<7} → {}",
                ansi_color(display.color),
                display.label,
                display.color,
                targets
            );
        }
        Ok(())
    }
}
