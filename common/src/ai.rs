use crate::{Arena, Direction, PlayerSlot, Position, RoundState};

/// Basic autopilot that heads for the food while avoiding walls and bodies.
/// Returns `None` when the snake is dead.
pub fn calculate_ai_move(state: &RoundState, player: PlayerSlot) -> Option<Direction> {
    let snake = state.snake(player);
    if !snake.is_alive {
        return None;
    }

    let arena = state.arena();
    let head = *snake.head();
    let target = state.food.unwrap_or(Position {
        x: arena.width as i16 / 2,
        y: arena.height as i16 / 2,
    });

    // Score each direction, always excluding the opposite of the current direction
    let mut best_direction = snake.direction;
    let mut best_score = i32::MIN;

    for direction in Direction::ALL {
        if direction.is_opposite(&snake.direction) {
            continue;
        }

        let new_pos = head.step(direction);
        if !is_free(state, arena, &new_pos) {
            continue;
        }

        let escape_routes = count_escape_routes(state, arena, &new_pos);
        if escape_routes == 0 {
            continue; // Skip moves that would trap us
        }

        let mut score = -(new_pos.manhattan_distance(&target) as i32) * 10;
        score += escape_routes as i32 * 5;

        // Don't steer into the cell the opponent is about to enter
        let opponent = state.snake(player.other());
        if opponent.is_alive && opponent.head().step(opponent.direction) == new_pos {
            score -= 1000;
        }

        if score > best_score {
            best_score = score;
            best_direction = direction;
        }
    }

    // If no safe move found, keep current direction
    Some(best_direction)
}

fn is_free(state: &RoundState, arena: &Arena, pos: &Position) -> bool {
    arena.in_bounds(pos) && !state.snakes.iter().any(|snake| snake.contains_point(pos))
}

fn count_escape_routes(state: &RoundState, arena: &Arena, pos: &Position) -> usize {
    Direction::ALL
        .iter()
        .filter(|direction| is_free(state, arena, &pos.step(**direction)))
        .count()
}
