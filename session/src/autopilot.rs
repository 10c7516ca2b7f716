use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use common::{calculate_ai_move, PlayerSlot, RoundCommand, RoundState, RoundStatus};
use crate::roster::ParticipantId;
use crate::runner::SessionClient;

/// Steer one snake from the host's committed state. The task ends when the
/// session stops.
pub fn spawn_autopilot(
    client: SessionClient,
    participant: ParticipantId,
    player: PlayerSlot,
    mut state_rx: watch::Receiver<RoundState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let turn = {
                let state = state_rx.borrow_and_update();
                if matches!(state.status, RoundStatus::Countdown { .. } | RoundStatus::Running) {
                    let current = state.snake(player).direction;
                    calculate_ai_move(&state, player).filter(|direction| *direction != current)
                } else {
                    None
                }
            };

            if let Some(direction) = turn {
                if client.command(participant, RoundCommand::Turn { direction }).await.is_err() {
                    break;
                }
            }
        }
        debug!(?player, "Autopilot stopped");
    })
}
