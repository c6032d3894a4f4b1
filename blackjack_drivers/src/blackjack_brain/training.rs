use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use blackjack_brain::TrainingHandler;
use tracing::{info, warn};

/// Logs training progress and stops the run once a wall-clock budget is spent.
pub struct LoggingHandler {
    log_every: u64,
    time_limit: Option<Duration>,
    started: Instant,
}

impl LoggingHandler {
    pub fn new(log_every: u64, time_limit: Option<Duration>) -> Self {
        LoggingHandler {
            log_every,
            time_limit,
            started: Instant::now(),
        }
    }

    fn should_log(&self, episode: u64) -> bool {
        self.log_every > 0 && episode % self.log_every == 0
    }
}

impl TrainingHandler for LoggingHandler {
    fn on_progress(&mut self, episode: u64, total: u64, epsilon: f64) {
        if self.should_log(episode) {
            info!(
                episode,
                total,
                epsilon = format!("{:.4}", epsilon),
                "training"
            );
        }
    }

    fn on_suspend(&mut self, episodes_done: u64) -> ControlFlow<()> {
        match self.time_limit {
            Some(limit) if self.started.elapsed() >= limit => {
                warn!(episodes_done, ?limit, "time limit reached");
                ControlFlow::Break(())
            }
            _ => ControlFlow::Continue(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_brain::{Agent, AgentConfig};

    #[test]
    fn logs_on_multiples_only() {
        let handler = LoggingHandler::new(1000, None);
        assert!(handler.should_log(0));
        assert!(handler.should_log(3000));
        assert!(!handler.should_log(1500));
        assert!(!LoggingHandler::new(0, None).should_log(0));
    }

    #[test]
    fn aligned_cadence_logs_every_log_every_episodes() {
        struct Logged {
            inner: LoggingHandler,
            episodes: Vec<u64>,
        }
        impl TrainingHandler for Logged {
            fn on_progress(&mut self, episode: u64, total: u64, epsilon: f64) {
                if self.inner.should_log(episode) {
                    self.episodes.push(episode);
                }
                self.inner.on_progress(episode, total, epsilon);
            }
        }

        let config = AgentConfig {
            progress_interval: 250,
            ..Default::default()
        };
        let mut agent = Agent::with_seed(config, 4).unwrap();
        let mut logged = Logged {
            inner: LoggingHandler::new(500, None),
            episodes: Vec::new(),
        };
        agent.train(3_000, &mut logged).unwrap();
        assert_eq!(logged.episodes, vec![0, 500, 1000, 1500, 2000, 2500]);
    }

    #[test]
    fn exhausted_budget_stops_at_first_batch() {
        let config = AgentConfig {
            batch_size: 50,
            ..Default::default()
        };
        let mut agent = Agent::with_seed(config, 3).unwrap();
        let mut handler = LoggingHandler::new(0, Some(Duration::ZERO));
        let summary = agent.train(1_000, &mut handler).unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.episodes_run, 50);
    }

    #[test]
    fn no_budget_runs_to_completion() {
        let mut agent = Agent::with_seed(AgentConfig::default(), 3).unwrap();
        let mut handler = LoggingHandler::new(100, None);
        let summary = agent.train(1_200, &mut handler).unwrap();
        assert!(!summary.cancelled);
        assert_eq!(summary.episodes_run, 1_200);
    }
}
