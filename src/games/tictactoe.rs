//! Tic-tac-toe on a 3x3 board.
//!
//! Small enough that whole pipeline runs finish in milliseconds, which makes
//! it the default game for tests. Action `i` marks cell `i` in row-major
//! order. Encoding follows Connect Four: own marks, opponent marks, and a
//! first-player-to-move plane.

use serde::{Deserialize, Serialize};

use crate::core::{Action, PlayerId};
use crate::error::GameError;
use crate::nn::EncodedState;
use crate::rules::{GameResult, RulesEngine};

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Tic-tac-toe position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicTacToeState {
    cells: [Option<PlayerId>; 9],
    to_move: PlayerId,
    moves: usize,
    winner: Option<PlayerId>,
}

impl TicTacToeState {
    /// Mark in cell `i`.
    #[must_use]
    pub fn cell(&self, i: usize) -> Option<PlayerId> {
        self.cells.get(i).copied().flatten()
    }

    fn line_winner(&self) -> Option<PlayerId> {
        LINES.iter().find_map(|line| {
            let first = self.cells[line[0]]?;
            line.iter()
                .all(|&i| self.cells[i] == Some(first))
                .then_some(first)
        })
    }
}

/// Tic-tac-toe rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicTacToe;

impl TicTacToe {
    /// Create the rules engine.
    pub fn new() -> Self {
        Self
    }

    /// Play a sequence of cells from the initial position.
    pub fn play_sequence(&self, cells: &[u16]) -> Result<TicTacToeState, GameError> {
        cells
            .iter()
            .try_fold(self.initial_state(), |state, &c| self.apply(&state, Action::new(c)))
    }
}

impl RulesEngine for TicTacToe {
    type State = TicTacToeState;

    fn name(&self) -> &'static str {
        "tictactoe"
    }

    fn initial_state(&self) -> TicTacToeState {
        TicTacToeState {
            cells: [None; 9],
            to_move: PlayerId::FIRST,
            moves: 0,
            winner: None,
        }
    }

    fn action_space_size(&self) -> usize {
        9
    }

    fn encoded_shape(&self) -> Vec<usize> {
        vec![3, 3, 3]
    }

    fn legal_actions(&self, state: &TicTacToeState) -> Vec<Action> {
        if state.winner.is_some() {
            return Vec::new();
        }
        (0..9)
            .filter(|&i| state.cells[i].is_none())
            .map(|i| Action::new(i as u16))
            .collect()
    }

    fn apply(&self, state: &TicTacToeState, action: Action) -> Result<TicTacToeState, GameError> {
        let i = action.index();
        if self.is_terminal(state) || i >= 9 || state.cells[i].is_some() {
            return Err(GameError::IllegalAction {
                action,
                legal: self.legal_actions(state),
            });
        }

        let mut next = state.clone();
        next.cells[i] = Some(state.to_move);
        next.moves += 1;
        next.winner = next.line_winner();
        next.to_move = state.to_move.opponent();
        Ok(next)
    }

    fn is_terminal(&self, state: &TicTacToeState) -> bool {
        state.winner.is_some() || state.moves == 9
    }

    fn outcome(&self, state: &TicTacToeState) -> Option<GameResult> {
        match state.winner {
            Some(p) => Some(GameResult::Winner(p)),
            None if state.moves == 9 => Some(GameResult::Draw),
            None => None,
        }
    }

    fn current_player(&self, state: &TicTacToeState) -> PlayerId {
        state.to_move
    }

    fn move_count(&self, state: &TicTacToeState) -> usize {
        state.moves
    }

    fn encode(&self, state: &TicTacToeState) -> EncodedState {
        let mut encoded = EncodedState::zeros(self.encoded_shape());
        for (i, cell) in state.cells.iter().enumerate() {
            match cell {
                Some(p) if *p == state.to_move => encoded.set(i, 1.0),
                Some(_) => encoded.set(9 + i, 1.0),
                None => {}
            }
        }
        if state.to_move == PlayerId::FIRST {
            for i in 18..27 {
                encoded.set(i, 1.0);
            }
        }
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let game = TicTacToe::new();
        let state = game.initial_state();
        assert_eq!(game.legal_actions(&state).len(), 9);
        assert!(!game.is_terminal(&state));
    }

    #[test]
    fn test_row_win() {
        let game = TicTacToe::new();
        let state = game.play_sequence(&[0, 3, 1, 4, 2]).unwrap();
        assert_eq!(game.outcome(&state), Some(GameResult::Winner(PlayerId::FIRST)));
        assert!(game.legal_actions(&state).is_empty());
    }

    #[test]
    fn test_diagonal_win_for_second_player() {
        let game = TicTacToe::new();
        let state = game.play_sequence(&[1, 0, 2, 4, 3, 8]).unwrap();
        assert_eq!(game.outcome(&state), Some(GameResult::Winner(PlayerId::SECOND)));
    }

    #[test]
    fn test_draw() {
        let game = TicTacToe::new();
        // X O X / X O O / O X X
        let state = game.play_sequence(&[0, 1, 2, 4, 3, 5, 7, 6, 8]).unwrap();
        assert_eq!(game.outcome(&state), Some(GameResult::Draw));
        assert!(game.legal_actions(&state).is_empty());
    }

    #[test]
    fn test_occupied_cell_is_illegal() {
        let game = TicTacToe::new();
        let state = game.play_sequence(&[4]).unwrap();
        let GameError::IllegalAction { action, legal } = game.apply(&state, Action::new(4)).unwrap_err();
        assert_eq!(action, Action::new(4));
        assert_eq!(legal.len(), 8);
    }

    #[test]
    fn test_move_after_win_is_illegal() {
        let game = TicTacToe::new();
        let state = game.play_sequence(&[0, 3, 1, 4, 2]).unwrap();
        let err = game.apply(&state, Action::new(8)).unwrap_err();
        assert_eq!(
            err,
            GameError::IllegalAction {
                action: Action::new(8),
                legal: vec![],
            }
        );
    }

    #[test]
    fn test_encode() {
        let game = TicTacToe::new();
        let state = game.play_sequence(&[4, 0]).unwrap();
        let encoded = game.encode(&state);

        assert_eq!(encoded.shape, vec![3, 3, 3]);
        assert_eq!(encoded.get(4), Some(1.0));
        assert_eq!(encoded.get(9), Some(1.0));
        assert_eq!(encoded.get(18), Some(1.0));
        assert_eq!(state.cell(0), Some(PlayerId::SECOND));
    }
}
