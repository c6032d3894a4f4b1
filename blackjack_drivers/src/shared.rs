use std::fs;
use std::path::{Path, PathBuf};

use blackjack_brain::{AgentConfig, ValueTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to (de)serialize value table {path}")]
    ValueTable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config {path}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: blackjack_brain::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub agent: ConfigAgent,
    pub trainer: ConfigTrainer,
}

/// Mirrors `blackjack_brain::AgentConfig`; missing fields take its defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigAgent {
    pub learning_rate: f64,
    pub exploration_start: f64,
    pub exploration_floor: f64,
    pub decay_horizon: u64,
    pub deck_count: u8,
    pub batch_size: u64,
    pub progress_interval: u64,
}

impl Default for ConfigAgent {
    fn default() -> Self {
        let defaults = AgentConfig::default();
        Self {
            learning_rate: defaults.learning_rate,
            exploration_start: defaults.exploration_start,
            exploration_floor: defaults.exploration_floor,
            decay_horizon: defaults.decay_horizon,
            deck_count: defaults.deck_count,
            batch_size: defaults.batch_size,
            progress_interval: defaults.progress_interval,
        }
    }
}

impl TryInto<AgentConfig> for ConfigAgent {
    type Error = blackjack_brain::Error;

    fn try_into(self) -> Result<AgentConfig, Self::Error> {
        let agent_config = AgentConfig {
            learning_rate: self.learning_rate,
            exploration_start: self.exploration_start,
            exploration_floor: self.exploration_floor,
            decay_horizon: self.decay_horizon,
            deck_count: self.deck_count,
            batch_size: self.batch_size,
            progress_interval: self.progress_interval,
        };
        agent_config.validate()?;

        Ok(agent_config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigTrainer {
    pub episodes: u64,
    pub seed: Option<u64>,
    /// Episodes between two progress log lines, 0 for none. Progress is only
    /// reported every `agent.progress_interval` episodes, so this must be a
    /// multiple of it.
    pub log_every: u64,
    /// Stops training at the first suspension point past this many seconds.
    pub time_limit_secs: Option<u64>,
    /// Where the trained value table is written as JSON.
    pub output: Option<PathBuf>,
}

impl Default for ConfigTrainer {
    fn default() -> Self {
        Self {
            episodes: 200_000,
            seed: None,
            log_every: 20_000,
            time_limit_secs: None,
            output: None,
        }
    }
}

/// Reads the content of a given config file, parses it to a Config and checks
/// the agent parameters and the logging cadence.
pub fn parse_config_from_file(filename: impl AsRef<Path>) -> Result<Config, DriverError> {
    let path = filename.as_ref().to_path_buf();
    let file_content = fs::read_to_string(&path).map_err(|source| DriverError::Read {
        path: path.clone(),
        source,
    })?;
    let config: Config =
        serde_yaml::from_str(&file_content).map_err(|source| DriverError::ParseConfig {
            path: path.clone(),
            source,
        })?;
    let agent_config: AgentConfig =
        config.agent.clone().try_into().map_err(|source| DriverError::Invalid {
            path: path.clone(),
            source,
        })?;
    if config.trainer.log_every % agent_config.progress_interval != 0 {
        return Err(DriverError::Invalid {
            path,
            source: blackjack_brain::Error::InvalidConfig(format!(
                "trainer.log_every ({}) must be a multiple of agent.progress_interval ({})",
                config.trainer.log_every, agent_config.progress_interval
            )),
        });
    }
    Ok(config)
}

/// Writes a value table as a JSON object keyed by state strings.
pub fn save_value_table(filename: impl AsRef<Path>, table: &ValueTable) -> Result<(), DriverError> {
    let path = filename.as_ref().to_path_buf();
    let json = serde_json::to_string_pretty(table).map_err(|source| DriverError::ValueTable {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, json).map_err(|source| DriverError::Write { path, source })
}

pub fn load_value_table(filename: impl AsRef<Path>) -> Result<ValueTable, DriverError> {
    let path = filename.as_ref().to_path_buf();
    let json = fs::read_to_string(&path).map_err(|source| DriverError::Read {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| DriverError::ValueTable { path, source })
}
