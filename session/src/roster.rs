use serde::{Deserialize, Serialize};
use uuid::Uuid;
use common::{PlayerSlot, Seat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    pub fn new() -> Self {
        ParticipantId(Uuid::new_v4())
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Connected participants in join order. The first one hosts and plays
/// snake 1, the second plays snake 2, everyone after that spectates.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    participants: Vec<ParticipantId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the participant was already connected.
    pub fn join(&mut self, id: ParticipantId) -> bool {
        if self.participants.contains(&id) {
            return false;
        }
        self.participants.push(id);
        true
    }

    pub fn leave(&mut self, id: &ParticipantId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p != id);
        self.participants.len() != before
    }

    pub fn host(&self) -> Option<&ParticipantId> {
        self.participants.first()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// `None` for someone who is not connected.
    pub fn seat_of(&self, id: &ParticipantId) -> Option<Seat> {
        let position = self.participants.iter().position(|p| p == id)?;
        Some(match position {
            0 => Seat::host(PlayerSlot::Player1),
            1 => Seat::player(PlayerSlot::Player2),
            _ => Seat::spectator(),
        })
    }
}
