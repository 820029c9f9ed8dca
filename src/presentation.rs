// Display metadata for lifecycle states. Kept apart from validation; only the
// UI layer (CLI output, dashboards) reads it.

use serde::Serialize;

use crate::lifecycle::AssetState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateDisplay {
    pub label: &'static str,
    pub color: &'static str,
}

const STATE_DISPLAY: [(AssetState, &str); 7] = [
    (AssetState::Ordered, "blue"),
    (AssetState::Received, "cyan"),
    (AssetState::InStaging, "purple"),
    (AssetState::InService, "green"),
    (AssetState::InRepair, "orange"),
    (AssetState::Lost, "red"),
    (AssetState::Disposed, "gray"),
];

pub fn get_state_display(state: AssetState) -> StateDisplay {
    let color = STATE_DISPLAY
        .iter()
        .find(|(s, _)| *s == state)
        .map(|(_, color)| *color)
        .unwrap_or("gray");

    StateDisplay {
        label: state.label(),
        color,
    }
}

/// ANSI escape for a display color, used by the terminal renderer
pub fn ansi_color(color: &str) -> &'static str {
    match color {
        "blue" => "\x1b[34m",
        "cyan" => "\x1b[36m",
        "purple" => "\x1b[35m",
        "green" => "\x1b[32m",
        "orange" | "red" => "\x1b[31m",
        _ => "\x1b[90m",
    }
}
