use rand::Rng;

use crate::{Action, AgentConfig};

/// The epsilon of an epsilon-greedy policy, decayed geometrically after every
/// episode towards a floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exploration {
    epsilon: f64,
    floor: f64,
    decay_horizon: u64,
}

impl Exploration {
    pub fn new(start: f64, floor: f64, decay_horizon: u64) -> Self {
        Exploration {
            epsilon: start,
            floor,
            decay_horizon,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(
            config.exploration_start,
            config.exploration_floor,
            config.decay_horizon,
        )
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// `epsilon <- max(floor, epsilon * (1 - 1 / decay_horizon))`.
    pub fn decay(&mut self) {
        let ratio = 1.0 - 1.0 / self.decay_horizon as f64;
        self.epsilon = self.floor.max(self.epsilon * ratio);
    }

    /// Draws once to decide whether to explore, and if so returns a uniformly
    /// random action.
    pub fn explore<R: Rng>(&self, rng: &mut R) -> Option<Action> {
        if rng.gen::<f64>() < self.epsilon {
            Some(Action::PRIORITY[rng.gen_range(0..Action::PRIORITY.len())])
        } else {
            None
        }
    }
}
