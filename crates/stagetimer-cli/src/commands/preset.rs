use clap::Subcommand;
use stagetimer_core::{Preset, PresetBook, SqliteStore};

use super::common::{format_clock, parse_clock};

#[derive(Subcommand)]
pub enum PresetAction {
    /// List saved presets
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one preset and the stages it produces
    Show {
        /// Preset ID
        id: String,
    },
    /// Add a preset, or replace the one with the given --id
    Add {
        /// Display name
        name: String,
        /// Presentation time (MM:SS or minutes)
        #[arg(long, value_parser = parse_clock, default_value = "5:00")]
        presentation: u64,
        /// Q&A time (MM:SS or minutes)
        #[arg(long, value_parser = parse_clock, default_value = "3:00")]
        qa: u64,
        /// Presentation warning threshold in seconds
        #[arg(long, default_value = "60")]
        presentation_warning: u64,
        /// Q&A warning threshold in seconds
        #[arg(long, default_value = "30")]
        qa_warning: u64,
        /// Replace the preset with this ID instead of creating a new one
        #[arg(long)]
        id: Option<String>,
    },
    /// Remove a preset
    Remove {
        /// Preset ID
        id: String,
    },
}

fn summary(preset: &Preset) -> String {
    format!(
        "{}  {}  presentation {} (warn {}s)  Q&A {} (warn {}s)",
        preset.id,
        preset.name,
        format_clock(preset.presentation_secs()),
        preset.presentation_warning,
        format_clock(preset.qa_secs()),
        preset.qa_warning,
    )
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = SqliteStore::open_default()?;
    let mut book = PresetBook::load(&mut store)?;

    match action {
        PresetAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(book.presets())?);
            } else if book.presets().is_empty() {
                println!("No presets.");
            } else {
                for preset in book.presets() {
                    println!("{}", summary(preset));
                }
            }
        }
        PresetAction::Show { id } => {
            let preset = book
                .find(&id)
                .ok_or_else(|| format!("preset not found: {id}"))?;
            println!("{}", summary(preset));
            for (i, stage) in preset.stages().iter().enumerate() {
                println!(
                    "  {}. {} {} (warn {}s)",
                    i + 1,
                    stage.name,
                    format_clock(stage.duration_secs),
                    stage.warning_threshold_secs
                );
            }
        }
        PresetAction::Add {
            name,
            presentation,
            qa,
            presentation_warning,
            qa_warning,
            id,
        } => {
            let mut preset = Preset::new(name)
                .with_presentation(presentation / 60, presentation % 60, presentation_warning)
                .with_qa(qa / 60, qa % 60, qa_warning);
            if let Some(id) = id {
                preset.id = id;
            }
            let line = summary(&preset);
            book.upsert(preset, &mut store)?;
            println!("Preset saved: {line}");
        }
        PresetAction::Remove { id } => {
            let removed = book.remove(&id, &mut store)?;
            println!("Preset removed: {}", removed.name);
        }
    }
    Ok(())
}
