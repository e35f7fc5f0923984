//! Error types for the board, history, rules and sample layers.

use thiserror::Error;

/// Construction, parsing and self-audit failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("invalid board size {x_size}x{y_size}")]
    InvalidSize { x_size: usize, y_size: usize },
    #[error("could not parse board location: {0}")]
    ParseLocation(String),
    #[error("could not parse player: {0}")]
    ParsePlayer(String),
    #[error("could not parse board: {0}")]
    ParseBoard(String),
    #[error("board inconsistency: {0}")]
    Inconsistent(String),
}

/// Reasons a move is rejected by the checked move API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move: point not empty")]
    Occupied,
    #[error("illegal move: point is off the board")]
    OffBoard,
    #[error("illegal move: retakes ko")]
    Ko,
    #[error("illegal move: repeats a previous position")]
    Superko,
    #[error("illegal move: suicide")]
    Suicide,
    #[error("illegal move: not a player color")]
    WrongPlayer,
    #[error("illegal move: game is already over")]
    GameOver,
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("unknown rules: {0}")]
    Unknown(String),
    #[error("invalid komi: {0}")]
    InvalidKomi(f32),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("malformed sample json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("malformed sample: {0}")]
    Field(String),
}
