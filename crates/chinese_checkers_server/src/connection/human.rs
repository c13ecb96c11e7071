//! Network client connection.

use std::time::Duration;

use chinese_checkers::{PlayerId, SKIP_TURN, ServerMessage};
use futures::FutureExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

use super::PlayerConnection;

/// Boxed read half of a client stream.
pub type LineReader = Box<dyn AsyncBufRead + Send + Unpin>;
/// Boxed write half of a client stream.
pub type LineWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A human player on the other end of a byte stream.
pub struct HumanConnection {
    player_id: PlayerId,
    reader: LineReader,
    writer: LineWriter,
    move_timeout: Option<Duration>,
    connected: bool,
    /// Bytes of a line still being received. Survives a timed-out read.
    pending: Vec<u8>,
}

impl std::fmt::Debug for HumanConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HumanConnection")
            .field("player_id", &self.player_id)
            .field("move_timeout", &self.move_timeout)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl HumanConnection {
    /// Wraps the two halves of a client stream.
    ///
    /// With a `move_timeout`, a player that stays silent for that long on
    /// their turn is told so and their turn is skipped.
    pub fn new(
        player_id: PlayerId,
        reader: LineReader,
        writer: LineWriter,
        move_timeout: Option<Duration>,
    ) -> Self {
        Self {
            player_id,
            reader,
            writer,
            move_timeout,
            connected: true,
            pending: Vec::new(),
        }
    }

    /// Wraps an accepted socket.
    #[instrument(skip(stream))]
    pub fn from_tcp(player_id: PlayerId, stream: TcpStream, move_timeout: Option<Duration>) -> Self {
        let (read, write) = stream.into_split();
        Self::new(
            player_id,
            Box::new(BufReader::new(read)),
            Box::new(write),
            move_timeout,
        )
    }

    async fn read_line(&mut self) -> Option<String> {
        match self.reader.read_until(b'\n', &mut self.pending).await {
            Ok(0) => {
                info!(player_id = self.player_id, "Client closed the stream");
                self.connected = false;
                None
            }
            Ok(_) => {
                let raw = std::mem::take(&mut self.pending);
                let line = String::from_utf8_lossy(&raw);
                Some(line.trim_end_matches(['\r', '\n']).to_string())
            }
            Err(e) => {
                warn!(player_id = self.player_id, error = %e, "Read failed");
                self.connected = false;
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl PlayerConnection for HumanConnection {
    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    #[instrument(skip(self, line), fields(player_id = self.player_id))]
    async fn send(&mut self, line: &str) {
        if !self.connected {
            return;
        }
        let mut framed = String::with_capacity(line.len() + 1);
        framed.push_str(line);
        framed.push('\n');
        let written = match self.writer.write_all(framed.as_bytes()).await {
            Ok(()) => self.writer.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!(error = %e, "Write failed, marking connection closed");
            self.connected = false;
        }
    }

    #[instrument(skip(self), fields(player_id = self.player_id))]
    async fn receive_move(&mut self) -> Option<String> {
        if !self.connected {
            return None;
        }
        let Some(limit) = self.move_timeout else {
            return self.read_line().await;
        };
        match tokio::time::timeout(limit, self.read_line()).await {
            Ok(line) => line,
            Err(_) => {
                info!(?limit, "Move timed out");
                self.send(&ServerMessage::TimedOut(self.player_id).to_string())
                    .await;
                Some(SKIP_TURN.to_string())
            }
        }
    }

    /// Probes the stream without consuming input: a pending read means the
    /// peer is idle, an empty buffer means it hung up.
    async fn is_connected(&mut self) -> bool {
        if !self.connected {
            return false;
        }
        let alive = match self.reader.fill_buf().now_or_never() {
            None => true,
            Some(Ok(buf)) => !buf.is_empty(),
            Some(Err(_)) => false,
        };
        if !alive {
            debug!(player_id = self.player_id, "Liveness probe failed");
            self.connected = false;
        }
        alive
    }

    #[instrument(skip(self), fields(player_id = self.player_id))]
    async fn close(&mut self) {
        if let Err(e) = self.writer.shutdown().await {
            debug!(error = %e, "Shutdown failed");
        }
        self.connected = false;
    }
}
