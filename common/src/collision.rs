use crate::{DeathCause, Snake};

/// What the cross-snake check found for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub head_on: bool,
    pub first_hit_second: bool,
    pub second_hit_first: bool,
}

impl CollisionReport {
    pub fn cause_for_first(&self) -> Option<DeathCause> {
        if self.head_on {
            Some(DeathCause::HeadOn)
        } else if self.first_hit_second {
            Some(DeathCause::OpponentBody)
        } else {
            None
        }
    }

    pub fn cause_for_second(&self) -> Option<DeathCause> {
        if self.head_on {
            Some(DeathCause::HeadOn)
        } else if self.second_hit_first {
            Some(DeathCause::OpponentBody)
        } else {
            None
        }
    }
}

/// Check both snakes against each other after they have moved.
///
/// `moved` says which of the two actually advanced this tick. A snake that
/// did not move (already dead, or crashed into a wall or itself) has no new
/// head, so it can't cause a collision, but its body still blocks the other.
/// Bodies are the post-move ones, so a snake that just ate is checked with
/// its grown tail.
pub fn detect_collisions(first: &Snake, second: &Snake, moved: [bool; 2]) -> CollisionReport {
    let head_on = moved[0] && moved[1] && first.head() == second.head();
    CollisionReport {
        head_on,
        first_hit_second: moved[0] && second.contains_point(first.head()),
        second_hit_first: moved[1] && first.contains_point(second.head()),
    }
}
