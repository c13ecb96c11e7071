//! One hosted game from listening socket to final standings.

use std::sync::Arc;

use chinese_checkers::PlayerId;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::admission::{Joiner, spawn_acceptor};
use crate::config::ServerConfig;
use crate::coordinator::{CoordinatorError, TurnCoordinator};
use crate::store::GameStore;

/// Pending clients the acceptor may queue ahead of the coordinator.
const JOIN_QUEUE: usize = 16;

/// Hosts a single game on `listener` and returns the finishing order.
///
/// Human seats are filled from incoming connections, the remaining seats
/// go to bots, and clients arriving after the start are turned away.
///
/// # Errors
///
/// Returns [`CoordinatorError`] if the game cannot be set up or a saved
/// game cannot be restored.
#[instrument(skip(config, listener, store), fields(address = %config.address()))]
pub async fn host(
    config: &ServerConfig,
    listener: TcpListener,
    store: Arc<dyn GameStore>,
) -> Result<Vec<PlayerId>, CoordinatorError> {
    let mut coordinator = TurnCoordinator::new(config, store)?;

    let (tx, rx) = mpsc::channel(JOIN_QUEUE);
    let acceptor = spawn_acceptor(listener, tx, coordinator.started_flag());

    let result = play(&mut coordinator, config, rx).await;

    acceptor.abort();
    let standings = result?;
    info!(?standings, disconnected = ?coordinator.disconnected(), "Session finished");
    Ok(standings)
}

async fn play(
    coordinator: &mut TurnCoordinator,
    config: &ServerConfig,
    mut joiners: mpsc::Receiver<Joiner>,
) -> Result<Vec<PlayerId>, CoordinatorError> {
    coordinator
        .admit_humans(&mut joiners, config.move_timeout())
        .await?;
    coordinator.attach_bots(config.bot_delay()).await?;
    coordinator.assign_order().await?;
    coordinator.reject_late_joiners(&mut joiners).await;
    drop(joiners);
    coordinator.run().await
}
