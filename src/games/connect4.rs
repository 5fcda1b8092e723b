//! Connect Four.
//!
//! Six rows by seven columns. Action `c` drops a stone into column `c`; the
//! first player to line up four stones horizontally, vertically or
//! diagonally wins, and a full board is a draw.
//!
//! The evaluator input is three 6x7 planes: the side to move's stones, the
//! opponent's stones, and a constant plane that is 1.0 when the first
//! player is to move.

use std::fmt;

use im::Vector;

use crate::core::{Action, PlayerId};
use crate::error::GameError;
use crate::nn::EncodedState;
use crate::rules::{GameResult, RulesEngine};

/// Board height.
pub const ROWS: usize = 6;

/// Board width, and the size of the action space.
pub const COLS: usize = 7;

const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Connect Four position.
///
/// Cells are stored row-major with row 0 at the bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connect4State {
    cells: [Option<PlayerId>; ROWS * COLS],
    heights: [u8; COLS],
    to_move: PlayerId,
    winner: Option<PlayerId>,
    history: Vector<Action>,
}

impl Connect4State {
    fn empty() -> Self {
        Self {
            cells: [None; ROWS * COLS],
            heights: [0; COLS],
            to_move: PlayerId::FIRST,
            winner: None,
            history: Vector::new(),
        }
    }

    /// Stone at `(row, col)`, row 0 being the bottom.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<PlayerId> {
        if row < ROWS && col < COLS {
            self.cells[row * COLS + col]
        } else {
            None
        }
    }

    /// Moves played so far.
    #[must_use]
    pub fn history(&self) -> &Vector<Action> {
        &self.history
    }

    /// Winner, if someone has connected four.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    fn is_full(&self) -> bool {
        self.heights.iter().all(|&h| h as usize == ROWS)
    }

    /// Whether the stone just placed at `(row, col)` completes a line.
    fn connects_four(&self, row: usize, col: usize) -> bool {
        let Some(player) = self.cell(row, col) else {
            return false;
        };

        DIRECTIONS.iter().any(|&(dr, dc)| {
            let run = |sign: isize| {
                let mut count = 0;
                let (mut r, mut c) = (row as isize, col as isize);
                loop {
                    r += sign * dr;
                    c += sign * dc;
                    if r < 0 || c < 0 || self.cell(r as usize, c as usize) != Some(player) {
                        return count;
                    }
                    count += 1;
                }
            };
            1 + run(1) + run(-1) >= 4
        })
    }
}

impl fmt::Display for Connect4State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..ROWS).rev() {
            for col in 0..COLS {
                let c = match self.cell(row, col) {
                    Some(PlayerId::FIRST) => 'X',
                    Some(_) => 'O',
                    None => '.',
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        write!(f, "0123456")
    }
}

/// Connect Four rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct Connect4;

impl Connect4 {
    /// Create the rules engine.
    pub fn new() -> Self {
        Self
    }

    /// Play a sequence of columns from the initial position.
    pub fn play_sequence(&self, columns: &[u16]) -> Result<Connect4State, GameError> {
        columns
            .iter()
            .try_fold(self.initial_state(), |state, &c| self.apply(&state, Action::new(c)))
    }
}

impl RulesEngine for Connect4 {
    type State = Connect4State;

    fn name(&self) -> &'static str {
        "connect4"
    }

    fn initial_state(&self) -> Connect4State {
        Connect4State::empty()
    }

    fn action_space_size(&self) -> usize {
        COLS
    }

    fn encoded_shape(&self) -> Vec<usize> {
        vec![3, ROWS, COLS]
    }

    fn legal_actions(&self, state: &Connect4State) -> Vec<Action> {
        if state.winner.is_some() {
            return Vec::new();
        }
        (0..COLS)
            .filter(|&c| (state.heights[c] as usize) < ROWS)
            .map(|c| Action::new(c as u16))
            .collect()
    }

    fn apply(&self, state: &Connect4State, action: Action) -> Result<Connect4State, GameError> {
        let col = action.index();
        if self.is_terminal(state) || col >= COLS || state.heights[col] as usize >= ROWS {
            return Err(GameError::IllegalAction {
                action,
                legal: self.legal_actions(state),
            });
        }

        let mut next = state.clone();
        let row = next.heights[col] as usize;
        next.cells[row * COLS + col] = Some(state.to_move);
        next.heights[col] += 1;
        next.history.push_back(action);

        if next.connects_four(row, col) {
            next.winner = Some(state.to_move);
        }
        next.to_move = state.to_move.opponent();
        Ok(next)
    }

    fn is_terminal(&self, state: &Connect4State) -> bool {
        state.winner.is_some() || state.is_full()
    }

    fn outcome(&self, state: &Connect4State) -> Option<GameResult> {
        match state.winner {
            Some(p) => Some(GameResult::Winner(p)),
            None if state.is_full() => Some(GameResult::Draw),
            None => None,
        }
    }

    fn current_player(&self, state: &Connect4State) -> PlayerId {
        state.to_move
    }

    fn move_count(&self, state: &Connect4State) -> usize {
        state.history.len()
    }

    fn encode(&self, state: &Connect4State) -> EncodedState {
        let plane = ROWS * COLS;
        let mut encoded = EncodedState::zeros(self.encoded_shape());

        for (i, cell) in state.cells.iter().enumerate() {
            match cell {
                Some(p) if *p == state.to_move => encoded.set(i, 1.0),
                Some(_) => encoded.set(plane + i, 1.0),
                None => {}
            }
        }
        if state.to_move == PlayerId::FIRST {
            for i in 0..plane {
                encoded.set(2 * plane + i, 1.0);
            }
        }
        encoded
    }
}
