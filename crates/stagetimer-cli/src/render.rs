//! Text rendering of the timer display.

use stagetimer_core::{DisplayModel, DisplayTone};

/// One status line, e.g. `Presentation   ! 00:42  running  stage Presentation started`.
pub fn status_line(model: &DisplayModel) -> String {
    let marker = match model.tone {
        DisplayTone::Normal => ' ',
        DisplayTone::Warning => '!',
        DisplayTone::Overtime => '+',
    };
    let state = if model.running { "running" } else { "stopped" };
    let mut line = format!("{:<14} {marker} {}  {state}", model.stage_label, model.clock);
    if !model.message.is_empty() {
        line.push_str("  ");
        line.push_str(&model.message);
    }
    line
}
