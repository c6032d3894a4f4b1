pub mod learning;
pub mod search;
pub mod simulation;
pub mod strategy;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

pub use learning::{
    schedule::{CancellationToken, ProgressFn, TrainingHandler, TrainingSummary},
    value_table::{ActionValues, StateKey, ValueTable},
    Agent, Trajectory,
};
pub use simulation::{
    hand::Hand,
    shoe::{CardSource, Shoe, StackedDeck},
    Card, Rank, Round, RoundPhase, Settlement, Suit,
};

pub type Result<T> = std::result::Result<T, Error>;

/// The decisions a player can make. The declaration order is also the
/// tie-break priority used everywhere a best action is picked.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Hit,
    Stand,
    Double,
}

impl Action {
    /// All actions, highest tie-break priority first.
    pub const PRIORITY: [Action; 3] = [Action::Hit, Action::Stand, Action::Double];
}

/// Learning and table parameters of an [`Agent`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Step size of the Monte Carlo backup.
    pub learning_rate: f64,
    pub exploration_start: f64,
    pub exploration_floor: f64,
    /// Episode horizon of the geometric exploration decay.
    pub decay_horizon: u64,
    pub deck_count: u8,
    /// Episodes between two suspension points of `Agent::train`.
    pub batch_size: u64,
    /// Episodes between two progress callbacks.
    pub progress_interval: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.02,
            exploration_start: 1.0,
            exploration_floor: 0.05,
            decay_horizon: 200_000,
            deck_count: 6,
            batch_size: 500,
            progress_interval: 1_000,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.exploration_start) {
            return Err(Error::InvalidConfig(format!(
                "exploration_start must be in [0, 1], got {}",
                self.exploration_start
            )));
        }
        if !(0.0..=1.0).contains(&self.exploration_floor) {
            return Err(Error::InvalidConfig(format!(
                "exploration_floor must be in [0, 1], got {}",
                self.exploration_floor
            )));
        }
        if self.exploration_floor > self.exploration_start {
            return Err(Error::InvalidConfig(format!(
                "exploration_floor ({}) cannot exceed exploration_start ({})",
                self.exploration_floor, self.exploration_start
            )));
        }
        if self.decay_horizon == 0 {
            return Err(Error::InvalidConfig(String::from(
                "decay_horizon must be positive",
            )));
        }
        if self.deck_count == 0 {
            return Err(Error::InvalidConfig(String::from(
                "deck_count must be positive",
            )));
        }
        if self.batch_size == 0 || self.progress_interval == 0 {
            return Err(Error::InvalidConfig(String::from(
                "batch_size and progress_interval must be positive",
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The dealer policy kept drawing past `DEALER_DRAW_LIMIT`. This is a
    /// logic fault, never a legitimate game state.
    #[error("dealer drew {draws} cards without reaching a standing total")]
    DealerRunaway { draws: usize },

    #[error("invalid card rank `{0}`")]
    InvalidRank(String),

    #[error("invalid state key `{0}`")]
    InvalidStateKey(String),

    #[error("{operation} is only allowed in {expected:?} phase, not in {actual:?} phase")]
    WrongPhase {
        operation: &'static str,
        expected: RoundPhase,
        actual: RoundPhase,
    },
}
