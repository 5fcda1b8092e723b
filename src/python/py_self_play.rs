//! Self-play and arena entry points for Python.
//!
//! Both functions run on Connect Four and release the GIL while searching;
//! the evaluator reacquires it for each `infer` call.

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

use crate::arena::{Arena, ArenaConfig, PromotionRule, Verdict};
use crate::games::Connect4;
use crate::mcts::MCTSConfig;
use crate::training::{run_self_play, SelfPlayConfig, TemperatureSchedule};

use super::py_evaluator::PyEvaluator;
use super::py_nn::PyTrainingExample;

/// Summary of an arena match.
#[pyclass(name = "ArenaVerdict", frozen)]
#[derive(Clone, Debug)]
pub struct PyArenaVerdict {
    #[pyo3(get)]
    promoted: bool,
    #[pyo3(get)]
    candidate_wins: u32,
    #[pyo3(get)]
    incumbent_wins: u32,
    #[pyo3(get)]
    draws: u32,
    #[pyo3(get)]
    candidate_win_rate: f64,
}

impl From<&Verdict> for PyArenaVerdict {
    fn from(verdict: &Verdict) -> Self {
        Self {
            promoted: verdict.promoted(),
            candidate_wins: verdict.result.candidate_wins,
            incumbent_wins: verdict.result.incumbent_wins,
            draws: verdict.result.draws,
            candidate_win_rate: verdict.result.candidate_win_rate(),
        }
    }
}

#[pymethods]
impl PyArenaVerdict {
    fn __repr__(&self) -> String {
        format!(
            "ArenaVerdict(promoted={}, candidate={}, incumbent={}, draws={})",
            self.promoted, self.candidate_wins, self.incumbent_wins, self.draws
        )
    }
}

/// Play a Connect Four self-play batch and return its training examples.
#[pyfunction]
#[pyo3(signature = (
    evaluator,
    num_workers = 1,
    games_per_worker = 2,
    simulations = 100,
    c_puct = 1.0,
    temperature = 1.1,
    temperature_threshold = 10,
    start_offset = 0,
    seed_offset = 0
))]
#[allow(clippy::too_many_arguments)]
pub fn self_play_connect4(
    py: Python<'_>,
    evaluator: Py<PyEvaluator>,
    num_workers: usize,
    games_per_worker: usize,
    simulations: u32,
    c_puct: f64,
    temperature: f64,
    temperature_threshold: usize,
    start_offset: u64,
    seed_offset: u64,
) -> PyResult<Vec<PyTrainingExample>> {
    let config = SelfPlayConfig::default()
        .with_workers(num_workers)
        .with_games_per_worker(games_per_worker)
        .with_mcts(MCTSConfig::for_self_play(simulations).with_c_puct(c_puct))
        .with_schedule(TemperatureSchedule {
            initial: temperature,
            threshold_ply: temperature_threshold,
            ..TemperatureSchedule::default()
        })
        .with_seed_offset(seed_offset);

    let evaluator = evaluator.get();
    let game = Connect4::new();
    let batch = py
        .allow_threads(|| run_self_play(&game, evaluator, &config, start_offset))
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;

    Ok(batch.examples().into_iter().map(PyTrainingExample).collect())
}

/// Play `incumbent` against `candidate` on Connect Four.
///
/// With `win_rate` set the candidate needs a win rate strictly above it;
/// otherwise it needs strictly more wins than the incumbent.
#[pyfunction]
#[pyo3(signature = (incumbent, candidate, num_games = 2, simulations = 100, win_rate = None))]
pub fn arena_connect4(
    py: Python<'_>,
    incumbent: Py<PyEvaluator>,
    candidate: Py<PyEvaluator>,
    num_games: u32,
    simulations: u32,
    win_rate: Option<f64>,
) -> PyResult<PyArenaVerdict> {
    let promotion = win_rate.map_or(PromotionRule::MoreWins, PromotionRule::WinRateAbove);
    let arena = Arena::new(
        ArenaConfig::default()
            .with_mcts(MCTSConfig::for_arena(simulations))
            .with_promotion(promotion),
    );

    let incumbent = incumbent.get();
    let candidate = candidate.get();
    let game = Connect4::new();
    let verdict = py
        .allow_threads(|| arena.evaluate(&game, incumbent, candidate, num_games))
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;

    Ok(PyArenaVerdict::from(&verdict))
}
