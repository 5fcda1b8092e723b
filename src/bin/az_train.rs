//! az-train - runs the AlphaZero iteration loop
//!
//! Configuration priority: command-line flags, then `ALPHAZERO_*`
//! environment variables, then the TOML file given with `--config`, then
//! built-in defaults. Checkpoints and example batches go to `--data-dir`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use alphazero::arena::PromotionRule;
use alphazero::games::{Connect4, TicTacToe};
use alphazero::nn::TabularEvaluator;
use alphazero::pipeline::{FileStore, IterationController, PipelineConfig, PipelineReport};
use alphazero::rules::RulesEngine;

#[derive(Parser, Debug)]
#[command(name = "az-train", about = "AlphaZero self-play training loop")]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Game to train: connect4 or tictactoe
    #[arg(long)]
    game: Option<String>,

    /// Iteration to start (or resume) from
    #[arg(long)]
    iteration: Option<u32>,

    #[arg(long)]
    total_iterations: Option<u32>,

    /// Retries per iteration, or "none" for unbounded
    #[arg(long)]
    max_retries: Option<String>,

    #[arg(long)]
    num_workers: Option<usize>,

    #[arg(long)]
    games_per_worker: Option<usize>,

    /// MCTS simulations per move (self-play and arena)
    #[arg(long)]
    simulations: Option<u32>,

    #[arg(long)]
    c_puct: Option<f64>,

    /// Self-play temperature for the opening moves
    #[arg(long)]
    temperature: Option<f64>,

    #[arg(long)]
    arena_games: Option<u32>,

    /// Promote only above this candidate win rate instead of on more wins
    #[arg(long)]
    promotion_win_rate: Option<f64>,

    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(long)]
    epochs: Option<u32>,

    #[arg(long)]
    lr: Option<f32>,

    #[arg(long)]
    grad_acc_steps: Option<u32>,

    #[arg(long)]
    max_norm: Option<f32>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn apply(&self, config: &mut PipelineConfig) -> Result<()> {
        if let Some(game) = &self.game {
            config.game = game.clone();
        }
        if let Some(iteration) = self.iteration {
            config.start_iteration = iteration;
        }
        if let Some(total) = self.total_iterations {
            config.total_iterations = total;
        }
        if let Some(raw) = &self.max_retries {
            config.max_retries = match raw.to_ascii_lowercase().as_str() {
                "none" | "unbounded" => None,
                n => Some(n.parse().with_context(|| format!("invalid --max-retries {raw}"))?),
            };
        }
        if let Some(workers) = self.num_workers {
            config.self_play.num_workers = workers;
        }
        if let Some(games) = self.games_per_worker {
            config.self_play.games_per_worker = games;
        }
        if self.simulations.is_some() || self.c_puct.is_some() {
            let simulations = self.simulations.unwrap_or(config.self_play.mcts.simulations);
            let c_puct = self.c_puct.unwrap_or(config.self_play.mcts.c_puct);
            config.set_search_budget(simulations, c_puct);
        }
        if let Some(temperature) = self.temperature {
            config.self_play.schedule.initial = temperature;
        }
        if let Some(games) = self.arena_games {
            config.arena.num_games = games;
        }
        if let Some(rate) = self.promotion_win_rate {
            config.arena.promotion = PromotionRule::WinRateAbove(rate);
        }
        if let Some(batch_size) = self.batch_size {
            config.training.batch_size = batch_size;
        }
        if let Some(epochs) = self.epochs {
            config.training.epochs = epochs;
        }
        if let Some(lr) = self.lr {
            config.training.learning_rate = lr;
        }
        if let Some(steps) = self.grad_acc_steps {
            config.training.gradient_accumulation_steps = steps;
        }
        if let Some(norm) = self.max_norm {
            config.training.max_grad_norm = norm;
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        Ok(())
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load_from_path(path)?,
        None => PipelineConfig::default(),
    };
    config.apply_env_overrides()?;
    cli.apply(&mut config)?;
    config.validate()?;
    Ok(config)
}

fn train<G: RulesEngine>(game: &G, config: PipelineConfig) -> Result<PipelineReport> {
    let store = FileStore::open(&config.data_dir)?;
    let initial = TabularEvaluator::new(game.action_space_size());
    let mut controller = IterationController::new(game, initial, config, store)?;
    Ok(controller.run()?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let config = load_config(&cli)?;
    info!(
        game = %config.game,
        start = config.start_iteration,
        total = config.total_iterations,
        workers = config.self_play.num_workers,
        data_dir = %config.data_dir.display(),
        "Starting training"
    );

    let report = match config.game.as_str() {
        "connect4" => train(&Connect4::new(), config)?,
        "tictactoe" => train(&TicTacToe::new(), config)?,
        other => bail!("unknown game {other:?}, expected connect4 or tictactoe"),
    };

    for iteration in &report.iterations {
        info!(
            iteration = iteration.iteration,
            attempts = iteration.attempts,
            promoted = iteration.promoted,
            retries_exhausted = iteration.retries_exhausted,
            examples = iteration.examples,
            "Iteration summary"
        );
    }
    info!(best_checkpoint = report.best_checkpoint, "Training complete");
    Ok(())
}
