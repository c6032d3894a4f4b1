mod training;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use blackjack_brain::simulation::evaluate_strategy;
use blackjack_brain::strategy::GreedyStrategy;
use blackjack_brain::{search, Agent, AgentConfig, Hand, Rank, Shoe, StateKey};
use blackjack_brain_drivers::{load_value_table, parse_config_from_file, save_value_table, Config};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use training::LoggingHandler;

const DEFAULT_CONFIG_PATH: &str = "~/.blackjack_brain.yml";

#[derive(Debug, Parser)]
#[command(author, about, long_about = None)]
struct CommandLineArgs {
    /// The path of the config file
    #[arg(short, long, global = true, default_value_t = String::from(DEFAULT_CONFIG_PATH))]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Trains a value table by self-play
    Train {
        #[arg(long)]
        episodes: Option<u64>,
        #[arg(long)]
        seed: Option<u64>,
        /// Where to write the trained table as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Shows the expectimax hint for a hand, and the learned choice if a table is given
    Hint {
        /// Player cards, e.g. "8 8" or "A,6"
        #[arg(long)]
        player: String,
        /// Dealer up card, e.g. "6" or "T"
        #[arg(long)]
        dealer: String,
        #[arg(long)]
        table: Option<PathBuf>,
    },
    /// Plays the greedy policy of a trained table and reports its mean reward
    Evaluate {
        #[arg(long)]
        table: PathBuf,
        #[arg(long, default_value_t = 100_000)]
        rounds: u64,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Resolves the config. The default path may be absent, in which case the
/// built-in defaults apply; an explicit path must exist.
fn load_config(config: &str) -> anyhow::Result<Config> {
    if config != DEFAULT_CONFIG_PATH {
        return Ok(parse_config_from_file(config)?);
    }

    let home_dir = home::home_dir().context("cannot find home directory")?;
    let config_file_path = home_dir.join(".blackjack_brain.yml");
    if !config_file_path.exists() {
        info!("no config at {}, using defaults", config_file_path.display());
        return Ok(Config::default());
    }
    if config_file_path.is_dir() {
        bail!("{} should be a file rather than a directory", config_file_path.display());
    }
    Ok(parse_config_from_file(&config_file_path)?)
}

fn train(
    config: Config,
    episodes: Option<u64>,
    seed: Option<u64>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let agent_config: AgentConfig = config.agent.try_into()?;
    let episodes = episodes.unwrap_or(config.trainer.episodes);
    let seed = seed.or(config.trainer.seed);
    let output = output.or(config.trainer.output);

    let mut agent = match seed {
        Some(seed) => Agent::with_seed(agent_config, seed)?,
        None => Agent::new(agent_config)?,
    };
    let mut handler = LoggingHandler::new(
        config.trainer.log_every,
        config.trainer.time_limit_secs.map(Duration::from_secs),
    );
    let summary = agent.train(episodes, &mut handler)?;
    println!(
        "episodes: {}{}",
        summary.episodes_run,
        if summary.cancelled { " (stopped early)" } else { "" }
    );
    println!("states learned: {}", summary.states);
    println!("final epsilon: {:.4}", summary.epsilon);
    println!("mean reward while training: {:.4}", summary.mean_reward);

    if let Some(output) = output {
        save_value_table(&output, agent.values())?;
        println!("value table written to {}", output.display());
    }
    Ok(())
}

fn hint(player: &str, dealer: &str, table: Option<&Path>) -> anyhow::Result<()> {
    let player_hand: Hand = player.parse()?;
    if player_hand.is_empty() {
        bail!("the player hand needs at least one card");
    }
    let dealer_up: Rank = dealer.parse()?;

    let values = search::scores(&player_hand, dealer_up)?;
    println!("player {} ({}) against {}", player_hand, player_hand.sum(), dealer_up);
    println!(
        "expectimax  hit {:+.4}  stand {:+.4}  double {:+.4}  => {}",
        values.hit,
        values.stand,
        values.double,
        values.best().1
    );

    if let Some(table) = table {
        let table = load_value_table(table)?;
        let state = StateKey::from_hand(&player_hand, dealer_up);
        if table.contains_state(&state) {
            let learned = &table[&state];
            println!(
                "learned     hit {:+.4}  stand {:+.4}  double {:+.4}  => {}",
                learned.hit,
                learned.stand,
                learned.double,
                table.greedy(&state)
            );
        } else {
            println!("learned     state {} was never visited", state);
        }
    }
    Ok(())
}

fn evaluate(config: Config, table: &Path, rounds: u64, seed: Option<u64>) -> anyhow::Result<()> {
    let agent_config: AgentConfig = config.agent.try_into()?;
    let table = load_value_table(table)?;
    let mut shoe = match seed {
        Some(seed) => Shoe::seeded(agent_config.deck_count, seed),
        None => Shoe::new(agent_config.deck_count),
    };
    let report = evaluate_strategy(&mut GreedyStrategy::new(&table), &mut shoe, rounds)?;
    println!("rounds: {}", report.rounds);
    println!(
        "wins {} / pushes {} / losses {}",
        report.wins, report.pushes, report.losses
    );
    println!("mean reward: {:+.4}", report.mean_reward());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = CommandLineArgs::parse();
    let config = load_config(&args.config)?;

    match args.command {
        Command::Train {
            episodes,
            seed,
            output,
        } => train(config, episodes, seed, output),
        Command::Hint {
            player,
            dealer,
            table,
        } => hint(&player, &dealer, table.as_deref()),
        Command::Evaluate {
            table,
            rounds,
            seed,
        } => evaluate(config, &table, rounds, seed),
    }
}
