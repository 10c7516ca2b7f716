pub mod autopilot;
pub mod config;
pub mod replication;
pub mod roster;
pub mod runner;

pub use autopilot::spawn_autopilot;
pub use config::{ConfigError, SessionConfig};
pub use replication::{LocalReplica, SharedState};
pub use roster::{ParticipantId, Roster};
pub use runner::{spawn_session, SessionClient, SessionHandle, SessionMessage};
