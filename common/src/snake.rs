use std::collections::VecDeque;
use serde::{Deserialize, Serialize};
use crate::{Arena, Direction, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Wall,
    SelfHit,
    HeadOn,
    OpponentBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { new_head: Position },
    Crashed(DeathCause),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snake {
    /// Head first.
    pub body: VecDeque<Position>,
    /// The direction the next move will take.
    pub direction: Direction,
    pub is_alive: bool,
}

impl Snake {
    pub fn new(head: Position, direction: Direction) -> Self {
        Snake::with_body([head], direction)
    }

    /// Build a snake from its segments, head first.
    ///
    /// # Panics
    ///
    /// Panics if `body` yields no segments. Every other method relies on a
    /// snake having a head.
    pub fn with_body(body: impl IntoIterator<Item = Position>, direction: Direction) -> Self {
        let body: VecDeque<Position> = body.into_iter().collect();
        assert!(!body.is_empty(), "Snake body should not be empty");
        Snake {
            body,
            direction,
            is_alive: true,
        }
    }

    pub fn head(&self) -> &Position {
        self.body.front().expect("Snake body should not be empty")
    }

    pub fn tail(&self) -> &Position {
        self.body.back().expect("Snake body should not be empty")
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn contains_point(&self, point: &Position) -> bool {
        self.body.iter().any(|segment| segment == point)
    }

    /// Request a new direction. Ignored for dead snakes and for the exact
    /// reverse of the current direction. Returns whether the request was taken.
    pub fn turn(&mut self, requested: Direction) -> bool {
        if !self.is_alive || requested.is_opposite(&self.direction) {
            return false;
        }
        self.direction = requested;
        true
    }

    /// Work out where the head goes next without touching the body.
    ///
    /// The self check runs against the whole current body, tail included,
    /// because whether the tail moves out of the way is only known once food
    /// has been looked at.
    pub fn plan_move(&self, arena: &Arena) -> MoveOutcome {
        let new_head = self.head().step(self.direction);

        if !arena.in_bounds(&new_head) {
            return MoveOutcome::Crashed(DeathCause::Wall);
        }

        if self.contains_point(&new_head) {
            return MoveOutcome::Crashed(DeathCause::SelfHit);
        }

        MoveOutcome::Moved { new_head }
    }

    /// Commit a planned move. The tail stays in place when `grow` is set.
    pub fn advance(&mut self, new_head: Position, grow: bool) {
        self.body.push_front(new_head);
        if !grow {
            self.body.pop_back();
        }
    }

    pub fn kill(&mut self) {
        self.is_alive = false;
    }
}
