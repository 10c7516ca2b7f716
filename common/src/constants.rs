use crate::{Direction, Position};

/// Default tick interval in milliseconds for the round loop
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 150;

/// Default length of one countdown step in milliseconds
pub const DEFAULT_COUNTDOWN_STEP_MS: u64 = 1000;

/// Number of countdown steps between `start` and the first tick
pub const DEFAULT_COUNTDOWN_STEPS: u8 = 3;

/// Canvas the browser clients draw on, and the size of one cell on it
pub const CANVAS_WIDTH: u16 = 800;
pub const CANVAS_HEIGHT: u16 = 400;
pub const GRID_SIZE: u16 = 20;

pub const PLAYER1_SPAWN: Position = Position { x: 3, y: 10 };
pub const PLAYER1_SPAWN_DIRECTION: Direction = Direction::Right;
pub const PLAYER2_SPAWN: Position = Position { x: 37, y: 10 };
pub const PLAYER2_SPAWN_DIRECTION: Direction = Direction::Left;
