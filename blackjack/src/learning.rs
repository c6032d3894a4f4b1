pub mod exploration;
pub mod schedule;
pub mod value_table;

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::simulation::{shoe::Shoe, Card, Round, Settlement};
use crate::{Action, AgentConfig, Result};

use self::{
    exploration::Exploration,
    schedule::{CancellationToken, TrainingHandler, TrainingSummary},
    value_table::{ActionValues, StateKey, ValueTable},
};

/// One recorded decision of an episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: StateKey,
    pub action: Action,
    /// Bet multiplier in force when the action was chosen.
    pub multiplier: u8,
}

/// The decisions of one episode, consumed by the terminal backup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    steps: Vec<Step>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self {
            steps: Vec::with_capacity(4),
        }
    }

    pub fn record(&mut self, state: StateKey, action: Action, multiplier: u8) {
        self.steps.push(Step {
            state,
            action,
            multiplier,
        });
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Result of a single self-play episode.
#[derive(Debug, Clone)]
pub struct Episode {
    pub trajectory: Trajectory,
    pub settlement: Settlement,
}

/// A tabular Monte Carlo control agent. It owns its shoe, its value table and
/// its random generator, so independent agents never share state.
pub struct Agent<R: Rng = StdRng> {
    config: AgentConfig,
    table: ValueTable,
    exploration: Exploration,
    shoe: Shoe<R>,
    rng: R,
    episodes_seen: u64,
}

impl Agent<StdRng> {
    /// Creates an agent whose shoe and exploration draws are seeded from the
    /// operating system.
    pub fn new(config: AgentConfig) -> Result<Self> {
        Self::with_rngs(config, StdRng::from_entropy(), StdRng::from_entropy())
    }

    /// Creates an agent whose every run is reproducible from `seed`.
    pub fn with_seed(config: AgentConfig, seed: u64) -> Result<Self> {
        let mut master = StdRng::seed_from_u64(seed);
        let shoe_rng = StdRng::seed_from_u64(master.gen());
        let rng = StdRng::seed_from_u64(master.gen());
        Self::with_rngs(config, shoe_rng, rng)
    }
}

impl<R: Rng> Agent<R> {
    /// Creates an agent from injected generators: one shuffles the shoe, the
    /// other drives exploration. Fails if the configuration is invalid.
    pub fn with_rngs(config: AgentConfig, shoe_rng: R, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Agent {
            config,
            table: ValueTable::new(),
            exploration: Exploration::from_config(&config),
            shoe: Shoe::with_rng(config.deck_count, shoe_rng),
            rng,
            episodes_seen: 0,
        })
    }

    /// Picks an action for the given state. With `explore` set this is the
    /// epsilon-greedy behaviour policy and consumes randomness; without it the
    /// pure greedy action is returned and nothing changes.
    pub fn choose(&mut self, state: &StateKey, explore: bool) -> Action {
        if explore {
            if let Some(action) = self.exploration.explore(&mut self.rng) {
                return action;
            }
        }
        self.table.greedy(state)
    }

    /// Plays one self-play episode, backs its reward up into the value table
    /// and decays exploration.
    pub fn run_episode(&mut self) -> Result<Episode> {
        let mut trajectory = Trajectory::new();
        let mut round = Round::deal(&mut self.shoe);

        let settlement = loop {
            let state = round.state_key();
            let action = self.choose(&state, true);
            trajectory.record(state, action, round.multiplier());
            if let Some(settlement) = round.apply(action, &mut self.shoe)? {
                break settlement;
            }
        };

        self.table
            .backup(&trajectory, settlement.reward(), self.config.learning_rate);
        self.exploration.decay();
        self.episodes_seen += 1;

        Ok(Episode {
            trajectory,
            settlement,
        })
    }

    /// Trains for `episodes` episodes. See `train_with_cancellation`.
    pub fn train<H: TrainingHandler + ?Sized>(
        &mut self,
        episodes: u64,
        handler: &mut H,
    ) -> Result<TrainingSummary> {
        self.train_with_cancellation(episodes, handler, &CancellationToken::new())
    }

    /// Trains for `episodes` episodes in batches of `batch_size`.
    ///
    /// `handler.on_progress` fires after every `progress_interval`-th episode,
    /// starting with the first. After each full batch `handler.on_suspend` is
    /// called and the token is checked; either can stop the run early. A
    /// stopped run leaves the value table valid.
    pub fn train_with_cancellation<H: TrainingHandler + ?Sized>(
        &mut self,
        episodes: u64,
        handler: &mut H,
        cancellation: &CancellationToken,
    ) -> Result<TrainingSummary> {
        info!(
            episodes,
            epsilon = self.exploration.epsilon(),
            "training started"
        );
        let mut summary = TrainingSummary::default();
        let mut total_reward = 0.0;

        for episode in 0..episodes {
            let played = self.run_episode()?;
            total_reward += played.settlement.reward();
            summary.episodes_run += 1;

            if episode % self.config.progress_interval == 0 {
                handler.on_progress(episode, episodes, self.exploration.epsilon());
            }

            let episodes_done = episode + 1;
            if episodes_done % self.config.batch_size == 0 && episodes_done < episodes {
                debug!(
                    episodes_done,
                    states = self.table.len(),
                    epsilon = self.exploration.epsilon(),
                    "suspending after batch"
                );
                let flow = handler.on_suspend(episodes_done);
                if flow.is_break() || cancellation.is_cancelled() {
                    warn!(episodes_done, "training cancelled");
                    summary.cancelled = true;
                    break;
                }
            }
        }

        summary.epsilon = self.exploration.epsilon();
        summary.states = self.table.len();
        if summary.episodes_run > 0 {
            summary.mean_reward = total_reward / summary.episodes_run as f64;
        }
        info!(
            episodes_run = summary.episodes_run,
            states = summary.states,
            epsilon = summary.epsilon,
            mean_reward = summary.mean_reward,
            "training finished"
        );
        Ok(summary)
    }

    /// Deals the next card of the agent's shoe.
    pub fn draw(&mut self) -> Card {
        self.shoe.draw()
    }

    pub fn shoe_mut(&mut self) -> &mut Shoe<R> {
        &mut self.shoe
    }

    pub fn values(&self) -> &ValueTable {
        &self.table
    }

    pub fn epsilon(&self) -> f64 {
        self.exploration.epsilon()
    }

    pub fn episodes_seen(&self) -> u64 {
        self.episodes_seen
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn export_values(&self) -> BTreeMap<String, ActionValues> {
        self.table.export()
    }

    /// Replaces the value table, e.g. to resume an earlier training run.
    pub fn import_values(&mut self, exported: BTreeMap<String, ActionValues>) -> Result<()> {
        self.table = ValueTable::import(exported)?;
        Ok(())
    }

    pub fn set_values(&mut self, table: ValueTable) {
        self.table = table;
    }
}
