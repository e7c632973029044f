//! Mathematico command line
//!
//! Subcommands:
//!   play     - Play full games with the MCTS player (or the random baseline) and summarize scores
//!   analyze  - Search one position and print the statistics of every root action
//!
//! Usage:
//!   mathematico play --games 100 --iterations 2000 --output games.json
//!   mathematico analyze --board '[[1,0,0,0,0],[0,0,0,0,0],[0,0,0,0,0],[0,0,0,0,0],[0,0,0,0,0]]' --card 1

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rand::prelude::*;
use rayon::prelude::*;
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use mathematico::game::board::{Board, Grid};
use mathematico::game::card::Card;
use mathematico::game::player::{MctsPlayer, RandomPlayer};
use mathematico::game::simulate_game::play_game;
use mathematico::game::state::GameState;
use mathematico::logging::setup_logging;
use mathematico::mcts::parallel::search_root_parallel;
use mathematico::mcts::{Mcts, MctsConfig, RolloutKind};
use mathematico::recording::{save_records, GameRecord};

#[derive(Parser)]
#[command(name = "mathematico", version, about = "MCTS engine for the Mathematico card game")]
struct Cli {
    /// Default log level, overridden by RUST_LOG
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Write rotating log files to this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(flatten)]
    search: SearchArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Search options shared by every subcommand; they override the config file.
#[derive(clap::Args)]
struct SearchArgs {
    /// JSON file with an MCTS configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Iterations per move
    #[arg(short = 'i', long, global = true)]
    iterations: Option<u64>,

    /// Milliseconds per move
    #[arg(short = 't', long, global = true)]
    time_ms: Option<u64>,

    /// Exploration constant
    #[arg(short = 'c', long, global = true)]
    exploration: Option<f64>,

    #[arg(long, global = true)]
    seed: Option<u64>,

    #[arg(long, value_enum, global = true)]
    rollout: Option<RolloutArg>,

    /// Search only one cell per class of symmetric boards
    #[arg(long, default_value_t = false, global = true)]
    symmetry: bool,

    /// Start every move from a fresh tree
    #[arg(long, default_value_t = false, global = true)]
    no_reuse: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum RolloutArg {
    Random,
    Static,
}

impl From<RolloutArg> for RolloutKind {
    fn from(arg: RolloutArg) -> Self {
        match arg {
            RolloutArg::Random => RolloutKind::Random,
            RolloutArg::Static => RolloutKind::Static,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PlayerArg {
    Mcts,
    Random,
}

#[derive(Subcommand)]
enum Commands {
    /// Play full games and report score statistics
    Play {
        #[arg(short = 'g', long, default_value_t = 10)]
        games: usize,

        #[arg(long, value_enum, default_value = "mcts")]
        player: PlayerArg,

        /// Save the game records as JSON
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Analyze a single position
    Analyze {
        /// Board as a JSON 5x5 grid, 0 for empty cells
        #[arg(long)]
        board: String,

        /// Card to place
        #[arg(long)]
        card: u8,

        /// Independent root-parallel searches
        #[arg(short = 'w', long, default_value_t = 1)]
        workers: usize,
    },
}

impl SearchArgs {
    fn to_config(&self) -> Result<MctsConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => MctsConfig::from_json_file(path)?,
            None => MctsConfig::default(),
        };
        if self.iterations.is_some() {
            config.max_iterations = self.iterations;
        }
        if self.time_ms.is_some() {
            config.max_time_ms = self.time_ms;
            // An explicit time budget alone replaces the default iteration budget.
            if self.iterations.is_none() {
                config.max_iterations = None;
            }
        }
        if let Some(c) = self.exploration {
            config.exploration_constant = c;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(rollout) = self.rollout {
            config.rollout = rollout.into();
        }
        if self.symmetry {
            config.deduplicate_symmetric_moves = true;
        }
        if self.no_reuse {
            config.reuse_tree = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _logger = setup_logging(&cli.log_level, cli.log_dir.as_deref())?;

    let config = cli.search.to_config()?;
    info!("{} {} | {}", mathematico::NAME, mathematico::VERSION, config.to_config_string());

    match cli.command {
        Commands::Play {
            games,
            player,
            output,
        } => run_play(&config, games, player, output),
        Commands::Analyze {
            board,
            card,
            workers,
        } => run_analyze(&config, &board, card, workers),
    }
}

fn run_play(
    config: &MctsConfig,
    games: usize,
    player: PlayerArg,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let policy = config.rollout.build();
    let base_seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let start = Instant::now();

    let records: Vec<GameRecord> = (0..games)
        .into_par_iter()
        .map(|index| {
            let seed = base_seed.wrapping_add(index as u64);
            let mut rng = StdRng::seed_from_u64(seed);
            let game_id = format!("game-{}", index);
            let record = match player {
                PlayerArg::Mcts => {
                    let mut mcts = MctsPlayer::new(config.clone().with_seed(Some(seed)), policy.as_ref())?;
                    play_game(&mut mcts, game_id, &mut rng)?
                }
                PlayerArg::Random => play_game(&mut RandomPlayer::new(seed), game_id, &mut rng)?,
            };
            info!(
                "{} finished with {} points",
                record.game_id,
                record.final_score.unwrap_or_default()
            );
            Ok(record)
        })
        .collect::<mathematico::Result<Vec<_>>>()?;

    let scores: Vec<f64> = records
        .iter()
        .filter_map(|r| r.final_score)
        .map(f64::from)
        .collect();
    if !scores.is_empty() {
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        println!(
            "{} games in {:.1}s: mean {:.2} | std {:.2} | min {} | max {}",
            scores.len(),
            start.elapsed().as_secs_f64(),
            mean,
            variance.sqrt(),
            min,
            max
        );
    }

    if let Some(path) = output {
        save_records(&path, &records)?;
        info!("saved {} game records to {}", records.len(), path.display());
    }
    Ok(())
}

fn run_analyze(
    config: &MctsConfig,
    board: &str,
    card: u8,
    workers: usize,
) -> Result<(), Box<dyn Error>> {
    let grid: Grid = serde_json::from_str(board)?;
    let board = Board::from_grid(grid)?;
    let state = GameState::decision(board, Card::new(card)?)?;
    println!("{}", state);

    let policy = config.rollout.build();
    let result = if workers > 1 {
        search_root_parallel(&state, config, policy.as_ref(), workers)?
    } else {
        Mcts::new(config.clone(), policy.as_ref())?.choose_action(&state)?
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    info!(
        "best: {} (expected {:.2}, {:.0} iterations/s)",
        result.action,
        result.value,
        result.iterations_per_second()
    );
    Ok(())
}
