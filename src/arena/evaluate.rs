//! Head-to-head matches between the incumbent and a candidate evaluator.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{Action, GameRng, PlayerId};
use crate::error::{ArenaError, SearchError};
use crate::mcts::policy::GREEDY_TEMPERATURE;
use crate::mcts::{MCTSConfig, MCTSSearch, SearchResult};
use crate::nn::Evaluator;
use crate::rules::{GameResult, RulesEngine};

/// One side of an arena match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Contender {
    /// The current best evaluator.
    Incumbent,
    /// The freshly trained evaluator.
    Candidate,
}

impl Contender {
    /// The other side.
    #[must_use]
    pub fn opponent(self) -> Self {
        match self {
            Contender::Incumbent => Contender::Candidate,
            Contender::Candidate => Contender::Incumbent,
        }
    }
}

impl fmt::Display for Contender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contender::Incumbent => write!(f, "incumbent"),
            Contender::Candidate => write!(f, "candidate"),
        }
    }
}

/// Result of one arena game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArenaOutcome {
    /// One side won.
    Win(Contender),
    /// Draw, including games stopped at the move cap.
    Draw,
}

/// Per-game record kept for logging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Index within the match.
    pub game_index: u32,

    /// Who moved first.
    pub first_mover: Contender,

    /// How the game ended.
    pub outcome: ArenaOutcome,

    /// Moves in play order.
    pub moves: Vec<Action>,
}

/// Aggregated match results.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenaResult {
    /// Every game in play order.
    pub records: Vec<GameRecord>,

    /// Games won by the incumbent.
    pub incumbent_wins: u32,

    /// Games won by the candidate.
    pub candidate_wins: u32,

    /// Drawn games.
    pub draws: u32,
}

impl ArenaResult {
    /// Number of games played.
    #[must_use]
    pub fn games(&self) -> u32 {
        self.records.len() as u32
    }

    /// Wins for one side.
    #[must_use]
    pub fn wins(&self, contender: Contender) -> u32 {
        match contender {
            Contender::Incumbent => self.incumbent_wins,
            Contender::Candidate => self.candidate_wins,
        }
    }

    /// Candidate wins over games played; draws count as non-wins.
    #[must_use]
    pub fn candidate_win_rate(&self) -> f64 {
        if self.records.is_empty() {
            0.0
        } else {
            self.candidate_wins as f64 / self.records.len() as f64
        }
    }

    fn record(&mut self, record: GameRecord) {
        match record.outcome {
            ArenaOutcome::Win(Contender::Incumbent) => self.incumbent_wins += 1,
            ArenaOutcome::Win(Contender::Candidate) => self.candidate_wins += 1,
            ArenaOutcome::Draw => self.draws += 1,
        }
        self.records.push(record);
    }
}

/// Rule deciding whether the candidate replaces the incumbent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionRule {
    /// Candidate needs strictly more wins than the incumbent.
    #[default]
    MoreWins,

    /// Candidate win rate must strictly exceed the threshold.
    WinRateAbove(f64),
}

impl PromotionRule {
    /// Whether the candidate is promoted.
    #[must_use]
    pub fn accepts(&self, result: &ArenaResult) -> bool {
        match *self {
            PromotionRule::MoreWins => result.candidate_wins > result.incumbent_wins,
            PromotionRule::WinRateAbove(threshold) => result.candidate_win_rate() > threshold,
        }
    }
}

/// Arena match settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Games per match. Odd counts are rounded up so both sides move first
    /// equally often.
    pub num_games: u32,

    /// Search settings; root noise is always disabled in the arena.
    pub mcts: MCTSConfig,

    /// Move temperature (0 = play the most visited move).
    pub arena_temperature: f64,

    /// Promotion rule.
    pub promotion: PromotionRule,

    /// Plies after which a game is scored as a draw.
    pub max_moves: usize,

    /// Base seed for games played at non-zero temperature.
    pub seed: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            num_games: 2,
            mcts: MCTSConfig::for_arena(100),
            arena_temperature: 0.0,
            promotion: PromotionRule::MoreWins,
            max_moves: 512,
            seed: 0,
        }
    }
}

impl ArenaConfig {
    /// Set games per match.
    pub fn with_games(mut self, games: u32) -> Self {
        self.num_games = games;
        self
    }

    /// Set search settings.
    pub fn with_mcts(mut self, mcts: MCTSConfig) -> Self {
        self.mcts = mcts;
        self
    }

    /// Set the move temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.arena_temperature = temperature;
        self
    }

    /// Set the promotion rule.
    pub fn with_promotion(mut self, rule: PromotionRule) -> Self {
        self.promotion = rule;
        self
    }

    /// Set the move cap.
    pub fn with_max_moves(mut self, max: usize) -> Self {
        self.max_moves = max;
        self
    }
}

/// Arena decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// The evaluator that should be the best from now on.
    pub accepted: Contender,

    /// Raw match results.
    pub result: ArenaResult,
}

impl Verdict {
    /// Whether the candidate won promotion.
    #[must_use]
    pub fn promoted(&self) -> bool {
        self.accepted == Contender::Candidate
    }
}

/// Plays matches between two evaluators.
#[derive(Clone, Debug, Default)]
pub struct Arena {
    config: ArenaConfig,
}

impl Arena {
    /// Create an arena.
    pub fn new(config: ArenaConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Play `num_games` games and decide promotion.
    ///
    /// Games are played in seat-swapped pairs: even-indexed games start with
    /// the incumbent, odd-indexed games with the candidate. An odd
    /// `num_games` is rounded up to the next even count. Each side searches
    /// with its own evaluator and tree.
    pub fn evaluate<G, A, B>(
        &self,
        game: &G,
        incumbent: &A,
        candidate: &B,
        num_games: u32,
    ) -> Result<Verdict, ArenaError>
    where
        G: RulesEngine,
        A: Evaluator + ?Sized,
        B: Evaluator + ?Sized,
    {
        if num_games == 0 {
            return Err(ArenaError::NoGames);
        }

        let num_games = paired_games(num_games);
        let mut result = ArenaResult::default();
        for game_index in 0..num_games {
            let first_mover = if game_index % 2 == 0 {
                Contender::Incumbent
            } else {
                Contender::Candidate
            };
            let record = self.play_game(game, incumbent, candidate, game_index, first_mover)?;
            debug!(
                game_index,
                first_mover = %first_mover,
                outcome = ?record.outcome,
                plies = record.moves.len(),
                "Arena game finished"
            );
            result.record(record);
        }

        let accepted = if self.config.promotion.accepts(&result) {
            Contender::Candidate
        } else {
            Contender::Incumbent
        };

        info!(
            games = result.games(),
            candidate_wins = result.candidate_wins,
            incumbent_wins = result.incumbent_wins,
            draws = result.draws,
            accepted = %accepted,
            "Arena verdict"
        );

        Ok(Verdict { accepted, result })
    }

    fn play_game<G, A, B>(
        &self,
        game: &G,
        incumbent: &A,
        candidate: &B,
        game_index: u32,
        first_mover: Contender,
    ) -> Result<GameRecord, ArenaError>
    where
        G: RulesEngine,
        A: Evaluator + ?Sized,
        B: Evaluator + ?Sized,
    {
        let seed = self.config.seed.wrapping_add(game_index as u64);
        let mut rng = GameRng::new(seed);
        let mcts = self
            .config
            .mcts
            .clone()
            .without_noise()
            .with_temperature(self.config.arena_temperature)
            .with_seed(seed);
        let mut incumbent_search = MCTSSearch::new(mcts.clone());
        let mut candidate_search = MCTSSearch::new(mcts);

        let mut state = game.initial_state();
        let mut moves = Vec::new();

        while !game.is_terminal(&state) {
            if moves.len() >= self.config.max_moves {
                warn!(game_index, max_moves = self.config.max_moves, "Arena game hit the move cap, scoring as a draw");
                return Ok(GameRecord {
                    game_index,
                    first_mover,
                    outcome: ArenaOutcome::Draw,
                    moves,
                });
            }

            let mover = seat_owner(first_mover, game.current_player(&state));
            let searched = match mover {
                Contender::Incumbent => incumbent_search.search(game, &state, incumbent),
                Contender::Candidate => candidate_search.search(game, &state, candidate),
            }
            .map_err(|source| ArenaError::Search { game_index, source })?;

            let action = self
                .choose(&searched, &mut rng)
                .ok_or(ArenaError::Search {
                    game_index,
                    source: SearchError::NoLegalActions,
                })?;

            state = game
                .apply(&state, action)
                .map_err(|source| ArenaError::Game { game_index, source })?;
            moves.push(action);
        }

        let outcome = match game.outcome(&state) {
            Some(GameResult::Winner(player)) => ArenaOutcome::Win(seat_owner(first_mover, player)),
            Some(GameResult::Draw) | None => ArenaOutcome::Draw,
        };

        Ok(GameRecord {
            game_index,
            first_mover,
            outcome,
            moves,
        })
    }

    fn choose(&self, result: &SearchResult, rng: &mut GameRng) -> Option<Action> {
        if self.config.arena_temperature <= GREEDY_TEMPERATURE {
            result.best_action()
        } else {
            result.sample_action(rng)
        }
    }
}

/// Round up to whole seat-swapped pairs.
fn paired_games(num_games: u32) -> u32 {
    let paired = num_games.saturating_add(num_games % 2);
    if paired != num_games {
        debug!(requested = num_games, played = paired, "Rounding arena games up to an even count");
    }
    paired
}

/// Which contender sits in `seat` when `first_mover` took the first seat.
fn seat_owner(first_mover: Contender, seat: PlayerId) -> Contender {
    if seat == PlayerId::FIRST {
        first_mover
    } else {
        first_mover.opponent()
    }
}
