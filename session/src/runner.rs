use std::sync::Arc;
use std::time::Duration;
use anyhow::{anyhow, Context, Result};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use common::{RoundCommand, RoundEngine, RoundEvent, RoundEventMessage, RoundState};
use crate::config::SessionConfig;
use crate::replication::{publish_round, SharedState};
use crate::roster::{ParticipantId, Roster};

#[derive(Debug, Clone)]
pub enum SessionMessage {
    Join(ParticipantId),
    Leave(ParticipantId),
    Command { participant: ParticipantId, command: RoundCommand },
}

/// Cheap, cloneable sender for participant traffic into a session.
#[derive(Debug, Clone)]
pub struct SessionClient {
    message_tx: mpsc::Sender<SessionMessage>,
}

impl SessionClient {
    pub async fn join(&self, participant: ParticipantId) -> Result<()> {
        self.send(SessionMessage::Join(participant)).await
    }

    pub async fn leave(&self, participant: ParticipantId) -> Result<()> {
        self.send(SessionMessage::Leave(participant)).await
    }

    pub async fn command(&self, participant: ParticipantId, command: RoundCommand) -> Result<()> {
        self.send(SessionMessage::Command { participant, command }).await
    }

    async fn send(&self, message: SessionMessage) -> Result<()> {
        self.message_tx
            .send(message)
            .await
            .map_err(|_| anyhow!("session has stopped"))
    }
}

/// Handle to a running session task.
pub struct SessionHandle {
    client: SessionClient,
    event_tx: broadcast::Sender<RoundEventMessage>,
    state_rx: watch::Receiver<RoundState>,
    cancellation_token: CancellationToken,
    task: JoinHandle<Result<RoundState>>,
}

impl SessionHandle {
    pub fn client(&self) -> SessionClient {
        self.client.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RoundEventMessage> {
        self.event_tx.subscribe()
    }

    /// The host's committed round, updated after every change.
    pub fn watch_state(&self) -> watch::Receiver<RoundState> {
        self.state_rx.clone()
    }

    /// Stop the loop and return the last committed round.
    pub async fn shutdown(self) -> Result<RoundState> {
        self.cancellation_token.cancel();
        self.task.await.context("session task panicked")?
    }
}

/// Start the round loop for one session on the current tokio runtime.
pub fn spawn_session(config: &SessionConfig, shared: Arc<dyn SharedState>) -> SessionHandle {
    let seed = config.resolve_seed();
    let state = RoundState::new(config.round.clone(), seed);
    let engine = RoundEngine::new(state.clone(), config.timing);
    info!(seed, tick_ms = config.timing.tick_ms, "Starting session");

    let (message_tx, message_rx) = mpsc::channel(64);
    let (event_tx, _) = broadcast::channel(256);
    let (state_tx, state_rx) = watch::channel(state);
    let cancellation_token = CancellationToken::new();

    let task = tokio::spawn(run_session(
        engine,
        shared,
        message_rx,
        event_tx.clone(),
        state_tx,
        cancellation_token.clone(),
    ));

    SessionHandle {
        client: SessionClient { message_tx },
        event_tx,
        state_rx,
        cancellation_token,
        task,
    }
}

/// The loop owns the engine. Each pass either handles one inbound message or
/// runs the steps that have come due, then commits: events to subscribers, records to shared
/// state, and last the new state to the watchers.
async fn run_session(
    mut engine: RoundEngine,
    shared: Arc<dyn SharedState>,
    mut message_rx: mpsc::Receiver<SessionMessage>,
    event_tx: broadcast::Sender<RoundEventMessage>,
    state_tx: watch::Sender<RoundState>,
    cancellation_token: CancellationToken,
) -> Result<RoundState> {
    let clock = Instant::now();
    let now_ms = move || clock.elapsed().as_millis() as i64;
    let mut roster = Roster::new();

    publish_round(shared.as_ref(), engine.state())
        .await
        .context("Failed to publish initial round")?;

    loop {
        // Anything the engine records from here on belongs to this pass
        let log_start = engine.event_log().len();
        let next_step = engine
            .next_step_ms()
            .map(|due_ms| clock + Duration::from_millis(due_ms.max(0) as u64));

        // `None` when nothing changed and there is nothing to commit
        let committed = tokio::select! {
            biased;

            _ = cancellation_token.cancelled() => {
                info!("Session loop shutting down");
                break;
            }

            message = message_rx.recv() => match message {
                Some(message) => {
                    let events = handle_message(&mut engine, &mut roster, message, now_ms());
                    (!events.is_empty()).then_some(events)
                }
                None => {
                    info!("All session handles dropped, stopping");
                    break;
                }
            },

            _ = sleep_until_due(next_step) => Some(engine.run_until(now_ms())),
        };

        let Some(events) = committed else {
            continue;
        };

        // Each message keeps the tick of the step that produced it
        for message in &engine.event_log()[log_start..] {
            // No subscribers is fine
            let _ = event_tx.send(message.clone());
        }
        if events.iter().any(|event| matches!(event, RoundEvent::RoundOver { .. })) {
            let state = engine.state();
            info!(winner = ?state.winner, score = ?state.score, ticks = state.tick, "Round over");
        }

        if let Err(e) = publish_round(shared.as_ref(), engine.state()).await {
            warn!(error = %e, "Failed to publish round");
        }
        state_tx.send_replace(engine.state().clone());
    }

    Ok(engine.state().clone())
}

async fn sleep_until_due(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn handle_message(
    engine: &mut RoundEngine,
    roster: &mut Roster,
    message: SessionMessage,
    now_ms: i64,
) -> Vec<RoundEvent> {
    match message {
        SessionMessage::Join(participant) => {
            if roster.join(participant) {
                info!(%participant, seat = ?roster.seat_of(&participant), "Participant joined");
            }
            Vec::new()
        }

        SessionMessage::Leave(participant) => {
            if roster.leave(&participant) {
                info!(%participant, host = ?roster.host(), "Participant left");
            }
            Vec::new()
        }

        SessionMessage::Command { participant, command } => {
            let Some(seat) = roster.seat_of(&participant) else {
                warn!(%participant, ?command, "Command from unknown participant");
                return Vec::new();
            };

            match engine.exec_command(seat, command, now_ms) {
                Ok(events) => events,
                Err(e) => {
                    // Rejected actions are dropped, callers are not told
                    debug!(%participant, error = %e, "Ignoring command");
                    Vec::new()
                }
            }
        }
    }
}
