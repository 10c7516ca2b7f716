use std::env;
use std::str::FromStr;
use thiserror::Error;
use common::{EngineTiming, FoodPlacement, RoundConfig};

pub const TICK_MS_VAR: &str = "SNAKE_DUEL_TICK_MS";
pub const COUNTDOWN_MS_VAR: &str = "SNAKE_DUEL_COUNTDOWN_MS";
pub const COUNTDOWN_STEPS_VAR: &str = "SNAKE_DUEL_COUNTDOWN_STEPS";
pub const SEED_VAR: &str = "SNAKE_DUEL_SEED";
pub const FOOD_VAR: &str = "SNAKE_DUEL_FOOD";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub round: RoundConfig,
    pub timing: EngineTiming,
    /// Fixed food seed. A random one is drawn per session when unset.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            round: RoundConfig::default(),
            timing: EngineTiming::default(),
            seed: None,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by any `SNAKE_DUEL_*` variables in the process
    /// environment. Loading a `.env` file is left to the binary.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = SessionConfig::default();

        if let Some(tick_ms) = parse_var(&lookup, TICK_MS_VAR)? {
            config.timing.tick_ms = tick_ms;
        }
        if let Some(countdown_ms) = parse_var(&lookup, COUNTDOWN_MS_VAR)? {
            config.timing.countdown_step_ms = countdown_ms;
        }
        if let Some(steps) = parse_var(&lookup, COUNTDOWN_STEPS_VAR)? {
            config.round.countdown_steps = steps;
        }
        config.seed = parse_var(&lookup, SEED_VAR)?;

        if let Some(value) = lookup(FOOD_VAR) {
            let placement = match value.trim() {
                "anywhere" => Some(FoodPlacement::Anywhere),
                "avoid-snakes" => Some(FoodPlacement::AvoidSnakes),
                _ => None,
            };
            config.round.food_placement =
                placement.ok_or(ConfigError::InvalidValue { var: FOOD_VAR, value })?;
        }

        Ok(config)
    }

    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}
