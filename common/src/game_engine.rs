use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use crate::constants::{DEFAULT_COUNTDOWN_STEP_MS, DEFAULT_TICK_INTERVAL_MS};
use crate::{CommandError, RoundCommand, RoundEvent, RoundState, RoundStatus, Seat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineTiming {
    pub tick_ms: u64,
    pub countdown_step_ms: u64,
}

impl Default for EngineTiming {
    fn default() -> Self {
        EngineTiming {
            tick_ms: DEFAULT_TICK_INTERVAL_MS,
            countdown_step_ms: DEFAULT_COUNTDOWN_STEP_MS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RoundEventMessage {
    pub tick: u32,
    pub event: RoundEvent,
}

/// Drives a [`RoundState`] from a clock.
///
/// The engine never reads the time itself. Callers pass a monotonic
/// millisecond timestamp and the engine runs whatever countdown steps or
/// ticks have come due since the last call, each exactly once and in order.
pub struct RoundEngine {
    state: RoundState,
    timing: EngineTiming,
    next_step_ms: Option<i64>,
    event_log: Vec<RoundEventMessage>,
}

impl RoundEngine {
    pub fn new(state: RoundState, timing: EngineTiming) -> Self {
        RoundEngine {
            state,
            timing,
            next_step_ms: None,
            event_log: Vec::new(),
        }
    }

    pub fn exec_command(
        &mut self,
        seat: Seat,
        command: RoundCommand,
        now_ms: i64,
    ) -> Result<Vec<RoundEvent>, CommandError> {
        let events = self.state.exec_command(seat, command)?;

        // Turns never touch the schedule; a lifecycle change restarts it from now
        if !events.is_empty() && !matches!(command, RoundCommand::Turn { .. }) {
            self.next_step_ms = self.step_interval().map(|interval| now_ms + interval);
            debug!("{:?} at {}ms, next step at {:?}", command, now_ms, self.next_step_ms);
        }

        self.record(&events);
        Ok(events)
    }

    /// Run every step that is due at `now_ms`.
    pub fn run_until(&mut self, now_ms: i64) -> Vec<RoundEvent> {
        let mut out = Vec::new();

        while let Some(due_ms) = self.next_step_ms {
            if due_ms > now_ms {
                break;
            }

            let events = match self.state.status {
                RoundStatus::Countdown { .. } => self.state.countdown_step(),
                RoundStatus::Running => self.state.tick(),
                _ => Vec::new(),
            };
            self.record(&events);
            out.extend(events);

            self.next_step_ms = self.step_interval().map(|interval| due_ms + interval);
        }

        out
    }

    fn step_interval(&self) -> Option<i64> {
        let interval = match self.state.status {
            RoundStatus::Countdown { .. } => self.timing.countdown_step_ms,
            RoundStatus::Running => self.timing.tick_ms,
            _ => return None,
        };
        Some(interval.max(1) as i64)
    }

    fn record(&mut self, events: &[RoundEvent]) {
        let tick = self.state.tick;
        self.event_log
            .extend(events.iter().cloned().map(|event| RoundEventMessage { tick, event }));
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn timing(&self) -> EngineTiming {
        self.timing
    }

    pub fn current_tick(&self) -> u32 {
        self.state.tick
    }

    /// When the next countdown step or tick is due, if anything is scheduled.
    pub fn next_step_ms(&self) -> Option<i64> {
        self.next_step_ms
    }

    pub fn event_log(&self) -> &[RoundEventMessage] {
        &self.event_log
    }

    pub fn get_state_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.state)?)
    }

    pub fn get_event_log_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.event_log)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, PlayerSlot, RoundConfig};

    const HOST: Seat = Seat { is_host: true, slot: Some(PlayerSlot::Player1) };

    fn engine() -> RoundEngine {
        RoundEngine::new(RoundState::new(RoundConfig::default(), 11), EngineTiming::default())
    }

    #[test]
    fn test_nothing_scheduled_before_start() {
        let mut engine = engine();
        assert!(engine.run_until(1_000_000).is_empty());
        assert_eq!(engine.next_step_ms(), None);
    }

    #[test]
    fn test_countdown_then_ticks() {
        let mut engine = engine();
        engine.exec_command(HOST, RoundCommand::Start, 0).unwrap();
        assert_eq!(engine.next_step_ms(), Some(1000));

        engine.run_until(2999);
        assert_eq!(engine.state().status, RoundStatus::Countdown { remaining: 1 });

        engine.run_until(3000);
        assert_eq!(engine.state().status, RoundStatus::Running);
        assert_eq!(engine.current_tick(), 0);

        // Ticks land every 150 ms after the countdown ends
        engine.run_until(3000 + 150 * 4);
        assert_eq!(engine.current_tick(), 4);
    }

    #[test]
    fn test_pause_suspends_ticks() {
        let mut engine = engine();
        engine.exec_command(HOST, RoundCommand::Start, 0).unwrap();
        engine.run_until(3150);
        assert_eq!(engine.current_tick(), 1);

        engine.exec_command(HOST, RoundCommand::Pause, 3200).unwrap();
        assert_eq!(engine.next_step_ms(), None);
        engine.run_until(60_000);
        assert_eq!(engine.current_tick(), 1);

        engine.exec_command(HOST, RoundCommand::Resume, 60_000).unwrap();
        assert_eq!(engine.next_step_ms(), Some(60_150));
        engine.run_until(60_150);
        assert_eq!(engine.current_tick(), 2);
    }

    #[test]
    fn test_turn_keeps_schedule() {
        let mut engine = engine();
        engine.exec_command(HOST, RoundCommand::Start, 0).unwrap();
        engine.run_until(3000);
        let scheduled = engine.next_step_ms();
        engine.exec_command(HOST, RoundCommand::Turn { direction: Direction::Up }, 3100).unwrap();
        assert_eq!(engine.next_step_ms(), scheduled);
    }

    #[test]
    fn test_schedule_stops_when_round_ends() {
        let mut engine = engine();
        engine.exec_command(HOST, RoundCommand::Start, 0).unwrap();
        engine.exec_command(HOST, RoundCommand::Turn { direction: Direction::Up }, 10).unwrap();

        // Ten rows up to the top edge, one more to crash
        engine.run_until(3000 + 150 * 20);
        assert!(engine.state().is_over());
        assert_eq!(engine.next_step_ms(), None);
        assert!(engine
            .event_log()
            .iter()
            .any(|message| matches!(message.event, RoundEvent::RoundOver { .. })));
        assert!(engine.get_event_log_json().unwrap().contains("RoundOver"));
    }
}
