mod ai;
mod arena;
mod collision;
mod error;
mod game_engine;
mod round;
mod snake;

pub mod constants;
pub mod food;
pub mod util;

pub use ai::*;
pub use arena::*;
pub use collision::*;
pub use error::*;
pub use food::FoodPlacement;
pub use game_engine::*;
pub use round::*;
pub use snake::*;
pub use util::PseudoRandom;
