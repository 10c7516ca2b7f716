use std::collections::HashMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tracing::trace;
use common::{Arena, Direction, PlayerSlot, Position, RoundState, RoundStatus, Snake, Winner};

/// Keys the browser clients read the round from.
pub const GAME_STATE_KEY: &str = "snake-game-state";
pub const SNAKE1_KEY: &str = "snake1";
pub const SNAKE2_KEY: &str = "snake2";

pub fn snake_key(player: PlayerSlot) -> &'static str {
    match player {
        PlayerSlot::Player1 => SNAKE1_KEY,
        PlayerSlot::Player2 => SNAKE2_KEY,
    }
}

#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("failed to encode or decode {key}")]
    Serialization {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Updater = Box<dyn FnOnce(Option<&Value>) -> Value + Send>;

/// A set of named values kept in sync between all participants.
///
/// Nothing beyond "a writer sees its own write on the next read" is assumed
/// about ordering or delivery.
#[async_trait]
pub trait SharedState: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;

    async fn set(&self, key: &str, value: Value);

    /// Replace the value with a function of the previous one.
    async fn update(&self, key: &str, updater: Updater) -> Value;

    async fn subscribe(&self, key: &str) -> watch::Receiver<Option<Value>>;
}

/// In-process [`SharedState`]: one watch channel per key.
#[derive(Default)]
pub struct LocalReplica {
    cells: RwLock<HashMap<String, watch::Sender<Option<Value>>>>,
}

impl LocalReplica {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SharedState for LocalReplica {
    async fn get(&self, key: &str) -> Option<Value> {
        let cells = self.cells.read().await;
        cells.get(key).and_then(|cell| cell.borrow().clone())
    }

    async fn set(&self, key: &str, value: Value) {
        let mut cells = self.cells.write().await;
        trace!(key, "set shared value");
        match cells.get(key) {
            Some(cell) => {
                cell.send_replace(Some(value));
            }
            None => {
                let (cell, _) = watch::channel(Some(value));
                cells.insert(key.to_string(), cell);
            }
        }
    }

    async fn update(&self, key: &str, updater: Updater) -> Value {
        let mut cells = self.cells.write().await;
        let cell = cells
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(None).0);
        let next = updater(cell.borrow().as_ref());
        cell.send_replace(Some(next.clone()));
        next
    }

    async fn subscribe(&self, key: &str) -> watch::Receiver<Option<Value>> {
        let mut cells = self.cells.write().await;
        cells
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn from_position(arena: &Arena, position: &Position) -> Self {
        let (x, y) = arena.to_pixels(position);
        PixelPoint { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub player1: u32,
    pub player2: u32,
}

/// Shared round summary, shaped like the record the browser game keeps under
/// [`GAME_STATE_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateRecord {
    pub is_started: bool,
    pub is_paused: bool,
    pub game_over: bool,
    pub countdown: u8,
    pub winner: Option<Winner>,
    pub food: Option<PixelPoint>,
    pub score: ScoreRecord,
}

impl GameStateRecord {
    pub fn from_round(state: &RoundState) -> Self {
        let countdown = match state.status {
            RoundStatus::Countdown { remaining } => remaining,
            _ => 0,
        };
        GameStateRecord {
            is_started: !matches!(state.status, RoundStatus::NotStarted),
            is_paused: state.status == RoundStatus::Paused,
            game_over: state.is_over(),
            countdown,
            winner: state.winner,
            food: state.food.map(|food| PixelPoint::from_position(state.arena(), &food)),
            score: ScoreRecord {
                player1: state.score.player1,
                player2: state.score.player2,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnakeRecord {
    pub body: Vec<PixelPoint>,
    pub direction: Direction,
    pub alive: bool,
}

impl SnakeRecord {
    pub fn from_snake(arena: &Arena, snake: &Snake) -> Self {
        SnakeRecord {
            body: snake
                .body
                .iter()
                .map(|segment| PixelPoint::from_position(arena, segment))
                .collect(),
            direction: snake.direction,
            alive: snake.is_alive,
        }
    }
}

/// Write the committed round to the shared keys.
pub async fn publish_round(
    shared: &dyn SharedState,
    state: &RoundState,
) -> Result<(), ReplicationError> {
    shared.set(GAME_STATE_KEY, encode(GAME_STATE_KEY, &GameStateRecord::from_round(state))?).await;
    for player in PlayerSlot::BOTH {
        let key = snake_key(player);
        let record = SnakeRecord::from_snake(state.arena(), state.snake(player));
        shared.set(key, encode(key, &record)?).await;
    }
    Ok(())
}

pub async fn read_game_state(
    shared: &dyn SharedState,
) -> Result<Option<GameStateRecord>, ReplicationError> {
    read(shared, GAME_STATE_KEY).await
}

pub async fn read_snake(
    shared: &dyn SharedState,
    player: PlayerSlot,
) -> Result<Option<SnakeRecord>, ReplicationError> {
    read(shared, snake_key(player)).await
}

fn encode<T: Serialize>(key: &'static str, record: &T) -> Result<Value, ReplicationError> {
    serde_json::to_value(record).map_err(|source| ReplicationError::Serialization { key, source })
}

async fn read<T: DeserializeOwned>(
    shared: &dyn SharedState,
    key: &'static str,
) -> Result<Option<T>, ReplicationError> {
    match shared.get(key).await {
        None => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| ReplicationError::Serialization { key, source }),
    }
}
