//! Accepting network clients.
//!
//! The acceptor task only hands raw streams to the coordinator over a
//! channel; seat numbers and the handshake are assigned by the coordinator.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chinese_checkers::{PlayerId, ServerMessage};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::connection::{HumanConnection, LineReader, LineWriter};

/// A client that connected but has no seat yet.
pub struct Joiner {
    reader: LineReader,
    writer: LineWriter,
    peer: String,
}

impl std::fmt::Debug for Joiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Joiner").field("peer", &self.peer).finish_non_exhaustive()
    }
}

impl Joiner {
    /// Wraps the two halves of a client stream.
    pub fn new(reader: LineReader, writer: LineWriter, peer: impl Into<String>) -> Self {
        Self {
            reader,
            writer,
            peer: peer.into(),
        }
    }

    /// Wraps an accepted socket.
    pub fn from_tcp(stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let (read, write) = stream.into_split();
        Self::new(Box::new(BufReader::new(read)), Box::new(write), peer)
    }

    /// Remote address, for logging.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Turns the client into the connection for seat `player_id`.
    pub fn seat(self, player_id: PlayerId, move_timeout: Option<Duration>) -> HumanConnection {
        info!(peer = %self.peer, player_id, "Client seated");
        HumanConnection::new(player_id, self.reader, self.writer, move_timeout)
    }

    /// Tells a late client the game is already running and hangs up.
    #[instrument(skip(self), fields(peer = %self.peer))]
    pub async fn reject(mut self) {
        let line = format!("{}\n", ServerMessage::AlreadyStarted);
        if let Err(e) = self.writer.write_all(line.as_bytes()).await {
            debug!(error = %e, "Could not notify rejected client");
        }
        if let Err(e) = self.writer.shutdown().await {
            debug!(error = %e, "Could not close rejected client");
        }
        info!("Late client rejected");
    }
}

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Spawns the accept loop.
///
/// Before `started` is set every client is forwarded on `joiners`; after
/// that, or once the receiving side is gone, clients are rejected on the
/// spot. The loop runs until the returned handle is aborted.
#[instrument(skip_all)]
pub fn spawn_acceptor(
    listener: TcpListener,
    joiners: mpsc::Sender<Joiner>,
    started: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let stream = match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(%addr, "Connection accepted");
                    stream
                }
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            let joiner = Joiner::from_tcp(stream);
            if started.load(Ordering::SeqCst) {
                joiner.reject().await;
                continue;
            }
            if let Err(mpsc::error::SendError(joiner)) = joiners.send(joiner).await {
                debug!("Coordinator no longer admitting");
                joiner.reject().await;
            }
        }
    })
}
