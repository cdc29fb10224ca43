use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use stagetimer_core::sync::serve_mirrors;
use stagetimer_core::{
    DisplayModel, Intent, KvStore, LocalChannel, Notifier, Plan, PolicyOptions, Preset, PresetBook,
    Session, SessionInputs, Settings, SoundPalette, Stage, StageSequencer, SyncBroadcaster,
    TokioCountdown, ValidationError,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::warn;

use super::common::{open_store_or_memory, parse_clock};
use crate::bell::TerminalBell;
use crate::render::status_line;

#[derive(Args)]
pub struct RunArgs {
    /// Use a saved preset by id
    #[arg(long, conflicts_with_all = ["plan", "presentation", "qa"])]
    preset: Option<String>,
    /// Load stages from a TOML plan file
    #[arg(long, conflicts_with_all = ["presentation", "qa"])]
    plan: Option<PathBuf>,
    /// Presentation time (MM:SS or minutes)
    #[arg(long, value_parser = parse_clock)]
    presentation: Option<u64>,
    /// Q&A time (MM:SS or minutes)
    #[arg(long, value_parser = parse_clock)]
    qa: Option<u64>,
    /// Seconds left when the presentation warning sounds
    #[arg(long, default_value = "60")]
    presentation_warning: u64,
    /// Seconds left when the Q&A warning sounds
    #[arg(long, default_value = "30")]
    qa_warning: u64,
    /// Skip the warning sound during Q&A
    #[arg(long)]
    quiet_qa: bool,
    /// Do not take overtime off the next stage
    #[arg(long)]
    no_deduct: bool,
    /// Play no sounds
    #[arg(long)]
    mute: bool,
    /// Sound palette (standard, electronic, bell, chime)
    #[arg(long)]
    palette: Option<SoundPalette>,
    /// Serve mirror displays on this address, e.g. 127.0.0.1:7878
    #[arg(long)]
    serve: Option<String>,
    /// Start the first stage without waiting for `s`
    #[arg(long)]
    autostart: bool,
    /// Print events as JSON lines instead of a status display
    #[arg(long)]
    json: bool,
}

fn resolve_stages(
    args: &RunArgs,
    store: &mut dyn KvStore,
) -> Result<Vec<Stage>, Box<dyn std::error::Error>> {
    if let Some(path) = &args.plan {
        return Ok(Plan::load(path)?.stages());
    }
    if args.presentation.is_some() || args.qa.is_some() {
        let presentation = args.presentation.unwrap_or(0);
        let qa = args.qa.unwrap_or(0);
        let preset = Preset::new("custom")
            .with_presentation(presentation / 60, presentation % 60, args.presentation_warning)
            .with_qa(qa / 60, qa % 60, args.qa_warning);
        return Ok(preset.stages());
    }

    let book = PresetBook::load(store)?;
    let id = args.preset.as_deref().unwrap_or("default");
    let preset = book
        .find(id)
        .or_else(|| if args.preset.is_none() { book.presets().first() } else { None })
        .ok_or_else(|| ValidationError::NotFound {
            collection: "preset".to_string(),
            id: id.to_string(),
        })?;
    Ok(preset.stages())
}

fn intent_for(line: &str) -> Option<Intent> {
    match line.trim() {
        "s" => Some(Intent::Toggle),
        "r" => Some(Intent::Reset),
        "n" => Some(Intent::Advance),
        "q" => Some(Intent::Shutdown),
        _ => None,
    }
}

/// Forward keyboard commands from stdin. End of input quits.
fn spawn_keyboard(intents: mpsc::UnboundedSender<Intent>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match intent_for(&line) {
                Some(intent) => {
                    if intents.send(intent).is_err() {
                        return;
                    }
                }
                None if line.trim().is_empty() => {}
                None => eprintln!("keys: s start/stop, r reset, n next, q quit"),
            }
        }
        let _ = intents.send(Intent::Shutdown);
    });
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store_or_memory();
    let settings = Settings::load(store.as_ref())?;
    let stages = resolve_stages(&args, store.as_mut())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_session(args, settings, stages));
    runtime.shutdown_background();
    result
}

async fn run_session(
    args: RunArgs,
    settings: Settings,
    stages: Vec<Stage>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (countdown, ticks) = TokioCountdown::channel();
    let channel = LocalChannel::default();
    let (sync_tx, sync) = mpsc::unbounded_channel();

    if let Some(addr) = &args.serve {
        let listener = TcpListener::bind(addr).await?;
        eprintln!("serving mirrors on {}", listener.local_addr()?);
        let channel = channel.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_mirrors(listener, channel, sync_tx).await {
                warn!(error = %e, "mirror server stopped");
            }
        });
    }

    let sequencer = StageSequencer::new(
        Box::new(countdown),
        SyncBroadcaster::new(Arc::new(channel)),
    )
    .with_policy(PolicyOptions {
        suppress_qa_warning: args.quiet_qa,
    });
    let mut notifier = Notifier::new(Box::new(TerminalBell))
        .with_palette(args.palette.unwrap_or(settings.sound_palette));
    notifier.set_enabled(settings.enable_sound && !args.mute);
    let session = Session::new(sequencer, notifier)
        .with_deduct_overtime(settings.deduct_overtime && !args.no_deduct);

    let (intent_tx, intents) = mpsc::unbounded_channel();
    intent_tx.send(Intent::Setup(stages))?;
    if args.autostart {
        intent_tx.send(Intent::Start)?;
    }
    if !args.json {
        eprintln!("keys: s start/stop, r reset, n next, q quit");
    }
    spawn_keyboard(intent_tx);

    let json = args.json;
    let mut last_line = String::new();
    session
        .run(SessionInputs { intents, ticks, sync }, |update| {
            if let Some(e) = &update.error {
                eprintln!("error: {e}");
            }
            if json {
                for event in &update.events {
                    match serde_json::to_string(event) {
                        Ok(line) => println!("{line}"),
                        Err(e) => warn!(error = %e, "failed to encode event"),
                    }
                }
                return;
            }
            let line = status_line(&DisplayModel::from_snapshot(&update.sequencer.snapshot()));
            if line != last_line {
                println!("{line}");
                last_line = line;
            }
        })
        .await;
    Ok(())
}
