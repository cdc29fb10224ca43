use clap::Args;
use serde::Serialize;
use stagetimer_core::sync::MirrorConnection;
use stagetimer_core::{DisplayModel, MirrorReplica, Snapshot};

use crate::render::status_line;

#[derive(Args)]
pub struct MirrorArgs {
    /// Controller address, as given to `run --serve`
    #[arg(long)]
    connect: String,
    /// Print each state change as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Frame<'a> {
    snapshot: &'a Snapshot,
    display: DisplayModel,
}

pub fn run(args: MirrorArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(follow(args))
}

async fn follow(args: MirrorArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut connection = MirrorConnection::connect(args.connect.as_str()).await?;
    let mut replica = MirrorReplica::new();
    if let Some(request) = replica.attach() {
        connection.send(&request).await?;
    }

    let mut last_line = String::new();
    while let Some(message) = connection.next_message().await? {
        let was_synced = replica.is_synced();
        let changed = replica.apply(&message);
        if !replica.is_synced() || (was_synced && !changed) {
            continue;
        }
        let display = DisplayModel::from_snapshot(replica.state());
        if args.json {
            let frame = Frame {
                snapshot: replica.state(),
                display,
            };
            println!("{}", serde_json::to_string(&frame)?);
        } else {
            let line = status_line(&display);
            if line != last_line {
                println!("{line}");
                last_line = line;
            }
        }
    }
    eprintln!("controller disconnected");
    Ok(())
}
