use serde::{Deserialize, Serialize};
use crate::{Arena, Position, PseudoRandom, Snake};

/// Where new food is allowed to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FoodPlacement {
    /// Independent uniform x and y. May land on a snake.
    #[default]
    Anywhere,
    /// Uniform over the cells no snake currently covers.
    AvoidSnakes,
}

pub fn spawn_food(
    arena: &Arena,
    rng: &mut PseudoRandom,
    placement: FoodPlacement,
    snakes: &[Snake],
) -> Position {
    match placement {
        FoodPlacement::Anywhere => spawn_anywhere(arena, rng),
        FoodPlacement::AvoidSnakes => {
            let free: Vec<Position> = arena
                .cells()
                .filter(|cell| !snakes.iter().any(|s| s.contains_point(cell)))
                .collect();

            if free.is_empty() {
                // Board is full, nothing sensible left to avoid
                return spawn_anywhere(arena, rng);
            }

            free[rng.next_below(free.len() as u32) as usize]
        }
    }
}

fn spawn_anywhere(arena: &Arena, rng: &mut PseudoRandom) -> Position {
    Position {
        x: rng.next_below(arena.width as u32) as i16,
        y: rng.next_below(arena.height as u32) as i16,
    }
}

pub fn is_consumed(head: &Position, food: &Position) -> bool {
    head == food
}
