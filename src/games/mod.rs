//! Reference games implementing `RulesEngine`.
//!
//! - `Connect4`: the 6x7 board game the pipeline is usually trained on
//! - `TicTacToe`: a tiny game for fast end-to-end tests

pub mod connect4;
pub mod tictactoe;

pub use connect4::{Connect4, Connect4State};
pub use tictactoe::{TicTacToe, TicTacToeState};
