use log::{debug, trace};
use serde::{Deserialize, Serialize};
use crate::constants::*;
use crate::food::{is_consumed, spawn_food, FoodPlacement};
use crate::{
    detect_collisions, Arena, CommandError, DeathCause, Direction, MoveOutcome, Position,
    PseudoRandom, Snake,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSlot {
    Player1,
    Player2,
}

impl PlayerSlot {
    pub const BOTH: [PlayerSlot; 2] = [PlayerSlot::Player1, PlayerSlot::Player2];

    pub fn index(&self) -> usize {
        match self {
            PlayerSlot::Player1 => 0,
            PlayerSlot::Player2 => 1,
        }
    }

    pub fn other(&self) -> PlayerSlot {
        match self {
            PlayerSlot::Player1 => PlayerSlot::Player2,
            PlayerSlot::Player2 => PlayerSlot::Player1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    Player1,
    Player2,
    Tie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    NotStarted,
    Countdown { remaining: u8 },
    Running,
    Paused,
    Over,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub player1: u32,
    pub player2: u32,
}

impl Score {
    pub fn get(&self, slot: PlayerSlot) -> u32 {
        match slot {
            PlayerSlot::Player1 => self.player1,
            PlayerSlot::Player2 => self.player2,
        }
    }

    fn credit(&mut self, slot: PlayerSlot) {
        match slot {
            PlayerSlot::Player1 => self.player1 += 1,
            PlayerSlot::Player2 => self.player2 += 1,
        }
    }
}

/// Who is issuing a command: whether they host the session, and which snake
/// (if any) belongs to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub is_host: bool,
    pub slot: Option<PlayerSlot>,
}

impl Seat {
    pub fn host(slot: PlayerSlot) -> Self {
        Seat { is_host: true, slot: Some(slot) }
    }

    pub fn player(slot: PlayerSlot) -> Self {
        Seat { is_host: false, slot: Some(slot) }
    }

    pub fn spectator() -> Self {
        Seat { is_host: false, slot: None }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RoundCommand {
    Start,
    Pause,
    Resume,
    Reset,
    Turn { direction: Direction },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    RoundStarted,
    CountdownStepped { remaining: u8 },
    RoundRunning,
    SnakeTurned { player: PlayerSlot, direction: Direction },
    FoodSpawned { position: Position },
    FoodEaten { player: PlayerSlot, position: Position },
    SnakeDied { player: PlayerSlot, cause: DeathCause },
    Paused,
    Resumed,
    RoundOver { winner: Winner },
    RoundReset,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPoint {
    pub position: Position,
    pub direction: Direction,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RoundConfig {
    pub arena: Arena,
    pub spawns: [SpawnPoint; 2],
    pub countdown_steps: u8,
    pub food_placement: FoodPlacement,
}

impl Default for RoundConfig {
    fn default() -> Self {
        RoundConfig {
            arena: Arena::from_canvas(CANVAS_WIDTH, CANVAS_HEIGHT, GRID_SIZE),
            spawns: [
                SpawnPoint { position: PLAYER1_SPAWN, direction: PLAYER1_SPAWN_DIRECTION },
                SpawnPoint { position: PLAYER2_SPAWN, direction: PLAYER2_SPAWN_DIRECTION },
            ],
            countdown_steps: DEFAULT_COUNTDOWN_STEPS,
            food_placement: FoodPlacement::Anywhere,
        }
    }
}

impl RoundConfig {
    fn spawn_snakes(&self) -> [Snake; 2] {
        self.spawns.map(|spawn| Snake::new(spawn.position, spawn.direction))
    }
}

/// The whole state of one two-player round. Only mutated through
/// [`RoundState::exec_command`], [`RoundState::countdown_step`],
/// [`RoundState::tick`] and [`RoundState::apply_event`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub tick: u32,
    pub config: RoundConfig,
    pub snakes: [Snake; 2],
    pub food: Option<Position>,
    pub score: Score,
    pub status: RoundStatus,
    pub winner: Option<Winner>,
    pub rng: PseudoRandom,
}

impl RoundState {
    pub fn new(config: RoundConfig, rng_seed: u64) -> Self {
        RoundState {
            tick: 0,
            snakes: config.spawn_snakes(),
            config,
            food: None,
            score: Score::default(),
            status: RoundStatus::NotStarted,
            winner: None,
            rng: PseudoRandom::new(rng_seed),
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.config.arena
    }

    pub fn snake(&self, slot: PlayerSlot) -> &Snake {
        &self.snakes[slot.index()]
    }

    pub fn is_over(&self) -> bool {
        self.status == RoundStatus::Over
    }

    pub fn exec_command(
        &mut self,
        seat: Seat,
        command: RoundCommand,
    ) -> Result<Vec<RoundEvent>, CommandError> {
        if !seat.is_host && !matches!(command, RoundCommand::Turn { .. }) {
            return Err(CommandError::PermissionDenied { command });
        }

        let mut out = Vec::new();
        let invalid = CommandError::InvalidTransition { command, status: self.status };
        match (command, self.status) {
            (RoundCommand::Turn { direction }, _) => return self.exec_turn(seat, direction),

            (RoundCommand::Start, RoundStatus::NotStarted | RoundStatus::Over) => {
                self.apply_event(RoundEvent::RoundStarted, Some(&mut out));
                if self.config.countdown_steps == 0 {
                    self.begin_running(&mut out);
                }
            }
            (RoundCommand::Start, _) => return Err(invalid),

            (RoundCommand::Pause, RoundStatus::Running) => {
                self.apply_event(RoundEvent::Paused, Some(&mut out));
            }
            (RoundCommand::Pause, RoundStatus::Paused) => {}
            (RoundCommand::Pause, _) => return Err(invalid),

            (RoundCommand::Resume, RoundStatus::Paused) => {
                self.apply_event(RoundEvent::Resumed, Some(&mut out));
            }
            (RoundCommand::Resume, RoundStatus::Running) => {}
            (RoundCommand::Resume, _) => return Err(invalid),

            (RoundCommand::Reset, _) => {
                self.apply_event(RoundEvent::RoundReset, Some(&mut out));
            }
        }

        Ok(out)
    }

    /// Advance the pre-round countdown by one step. Does nothing outside of
    /// the countdown.
    pub fn countdown_step(&mut self) -> Vec<RoundEvent> {
        let mut out = Vec::new();
        if let RoundStatus::Countdown { remaining } = self.status {
            if remaining <= 1 {
                self.begin_running(&mut out);
            } else {
                let event = RoundEvent::CountdownStepped { remaining: remaining - 1 };
                self.apply_event(event, Some(&mut out));
            }
        }
        out
    }

    /// Run one simulation step. Only has an effect while the round is running.
    pub fn tick(&mut self) -> Vec<RoundEvent> {
        let mut out = Vec::new();
        if self.status != RoundStatus::Running {
            return out;
        }

        let arena = self.config.arena;

        // Plan both moves from the same pre-move state
        let plans = self
            .snakes
            .each_ref()
            .map(|snake| snake.is_alive.then(|| snake.plan_move(&arena)));

        let mut moved = [false; 2];
        let mut deaths: Vec<(PlayerSlot, DeathCause)> = Vec::new();
        let mut eaten: Vec<(PlayerSlot, Position)> = Vec::new();

        for player in PlayerSlot::BOTH {
            match plans[player.index()] {
                Some(MoveOutcome::Moved { new_head }) => {
                    let grow = self.food.is_some_and(|food| is_consumed(&new_head, &food));
                    self.snakes[player.index()].advance(new_head, grow);
                    moved[player.index()] = true;
                    if grow {
                        eaten.push((player, new_head));
                    }
                }
                Some(MoveOutcome::Crashed(cause)) => deaths.push((player, cause)),
                None => {}
            }
        }

        let report = detect_collisions(&self.snakes[0], &self.snakes[1], moved);
        if let Some(cause) = report.cause_for_first() {
            deaths.push((PlayerSlot::Player1, cause));
        }
        if let Some(cause) = report.cause_for_second() {
            deaths.push((PlayerSlot::Player2, cause));
        }

        for (player, position) in &eaten {
            let event = RoundEvent::FoodEaten { player: *player, position: *position };
            self.apply_event(event, Some(&mut out));
        }
        if !eaten.is_empty() {
            let position = self.next_food();
            self.apply_event(RoundEvent::FoodSpawned { position }, Some(&mut out));
        }

        for (player, cause) in &deaths {
            let event = RoundEvent::SnakeDied { player: *player, cause: *cause };
            self.apply_event(event, Some(&mut out));
        }

        if !deaths.is_empty() {
            let winner = match (self.snakes[0].is_alive, self.snakes[1].is_alive) {
                (true, false) => Winner::Player1,
                (false, true) => Winner::Player2,
                _ => Winner::Tie,
            };
            self.apply_event(RoundEvent::RoundOver { winner }, Some(&mut out));
        }

        self.tick += 1;
        trace!("tick {} done, {} events", self.tick, out.len());
        out
    }

    pub fn apply_event(&mut self, event: RoundEvent, out: Option<&mut Vec<RoundEvent>>) {
        if let Some(out) = out {
            out.push(event.clone());
        }

        match event {
            RoundEvent::RoundStarted => {
                self.clear_round();
                self.status = RoundStatus::Countdown { remaining: self.config.countdown_steps };
            }

            RoundEvent::CountdownStepped { remaining } => {
                self.status = RoundStatus::Countdown { remaining };
            }

            RoundEvent::RoundRunning | RoundEvent::Resumed => {
                self.status = RoundStatus::Running;
            }

            RoundEvent::SnakeTurned { player, direction } => {
                self.snakes[player.index()].turn(direction);
            }

            RoundEvent::FoodSpawned { position } => {
                self.food = Some(position);
            }

            RoundEvent::FoodEaten { player, position } => {
                debug!("{:?} ate food at {:?}", player, position);
                if self.food == Some(position) {
                    self.food = None;
                }
                self.score.credit(player);
            }

            RoundEvent::SnakeDied { player, cause } => {
                debug!("{:?} died: {:?}", player, cause);
                self.snakes[player.index()].kill();
            }

            RoundEvent::Paused => {
                self.status = RoundStatus::Paused;
            }

            RoundEvent::RoundOver { winner } => {
                debug!("round over after {} ticks, winner {:?}", self.tick, winner);
                self.status = RoundStatus::Over;
                self.winner = Some(winner);
            }

            RoundEvent::RoundReset => {
                self.clear_round();
                self.status = RoundStatus::NotStarted;
            }
        }
    }

    fn exec_turn(
        &mut self,
        seat: Seat,
        direction: Direction,
    ) -> Result<Vec<RoundEvent>, CommandError> {
        let player = seat.slot.ok_or(CommandError::NotAPlayer)?;
        let steerable = matches!(
            self.status,
            RoundStatus::Countdown { .. } | RoundStatus::Running | RoundStatus::Paused
        );
        if !steerable {
            return Err(CommandError::InvalidTransition {
                command: RoundCommand::Turn { direction },
                status: self.status,
            });
        }

        // Reversals and turns of a dead snake are dropped, not errors
        let mut out = Vec::new();
        let snake = self.snake(player);
        if snake.is_alive
            && snake.direction != direction
            && !direction.is_opposite(&snake.direction)
        {
            self.apply_event(RoundEvent::SnakeTurned { player, direction }, Some(&mut out));
        }
        Ok(out)
    }

    fn begin_running(&mut self, out: &mut Vec<RoundEvent>) {
        self.apply_event(RoundEvent::RoundRunning, Some(&mut *out));
        let position = self.next_food();
        self.apply_event(RoundEvent::FoodSpawned { position }, Some(&mut *out));
    }

    fn next_food(&mut self) -> Position {
        spawn_food(&self.config.arena, &mut self.rng, self.config.food_placement, &self.snakes)
    }

    fn clear_round(&mut self) {
        self.tick = 0;
        self.snakes = self.config.spawn_snakes();
        self.food = None;
        self.score = Score::default();
        self.winner = None;
    }
}
