use thiserror::Error;
use crate::{RoundCommand, RoundStatus};

/// Why a participant command was not applied to the round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("only the host may {command:?} the round")]
    PermissionDenied { command: RoundCommand },

    #[error("cannot {command:?} while the round is {status:?}")]
    InvalidTransition { command: RoundCommand, status: RoundStatus },

    #[error("spectators do not control a snake")]
    NotAPlayer,
}
