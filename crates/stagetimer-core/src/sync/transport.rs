//! JSON-lines transport for mirrors in another process.
//!
//! The controller accepts TCP connections and forwards every message published
//! on its [`LocalChannel`]. Lines a mirror writes back are decoded and handed
//! to the controller's event queue, which answers snapshot requests.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::channel::LocalChannel;
use super::message::SyncMessage;
use crate::error::SyncError;

/// Accept mirrors on `listener` until the request queue is closed.
pub async fn serve_mirrors(
    listener: TcpListener,
    channel: LocalChannel,
    requests: mpsc::UnboundedSender<SyncMessage>,
) -> Result<(), SyncError> {
    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = requests.closed() => return Ok(()),
        };
        info!(%peer, "mirror attached");
        let updates = channel.subscribe();
        let requests = requests.clone();
        tokio::spawn(async move {
            if let Err(e) = forward(stream, updates, requests).await {
                debug!(%peer, error = %e, "mirror connection ended");
            }
            info!(%peer, "mirror detached");
        });
    }
}

async fn forward(
    stream: TcpStream,
    mut updates: broadcast::Receiver<SyncMessage>,
    requests: mpsc::UnboundedSender<SyncMessage>,
) -> Result<(), SyncError> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(message) => write_line(&mut write, &message).await?,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // The mirror missed patches; have the controller resend everything.
                    warn!(skipped, "mirror lagged behind, requesting full snapshot");
                    if requests.send(SyncMessage::SnapshotRequest).is_err() {
                        return Ok(());
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            },
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match SyncMessage::decode(&line) {
                    // Mirrors may only ask; anything else is ignored.
                    Ok(SyncMessage::SnapshotRequest) => {
                        if requests.send(SyncMessage::SnapshotRequest).is_err() {
                            return Ok(());
                        }
                    }
                    Ok(other) => {
                        debug!(event = other.event_name(), "ignoring state message from mirror")
                    }
                    Err(e) => warn!(error = %e, "malformed line from mirror"),
                },
                None => return Ok(()),
            },
        }
    }
}

async fn write_line(write: &mut OwnedWriteHalf, message: &SyncMessage) -> Result<(), SyncError> {
    let mut line = message.encode()?;
    line.push('\n');
    write.write_all(line.as_bytes()).await?;
    Ok(())
}

/// Mirror end of a transport connection.
pub struct MirrorConnection {
    lines: Lines<BufReader<OwnedReadHalf>>,
    write: OwnedWriteHalf,
}

impl MirrorConnection {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, SyncError> {
        let stream = TcpStream::connect(addr).await?;
        let (read, write) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(read).lines(),
            write,
        })
    }

    pub async fn send(&mut self, message: &SyncMessage) -> Result<(), SyncError> {
        write_line(&mut self.write, message).await
    }

    /// Next message from the controller; `None` once the controller is gone.
    pub async fn next_message(&mut self) -> Result<Option<SyncMessage>, SyncError> {
        while let Some(line) = self.lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match SyncMessage::decode(&line) {
                Ok(message) => return Ok(Some(message)),
                Err(e) => warn!(error = %e, "malformed line from controller"),
            }
        }
        Ok(None)
    }
}
