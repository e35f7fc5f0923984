//! Position samples exchanged with data-mining tools as one JSON object per line.
//!
//! A sample is a starting board, the moves played from it, and the move the
//! player to move should consider (`hintLoc`). Keys are written in sorted
//! order so lines compare byte-for-byte with existing corpora.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Move};
use crate::color::{Color, Player};
use crate::constants::{Loc, NULL_LOC};
use crate::error::{BoardError, SampleError};
use crate::location;

#[derive(Debug, Clone)]
pub struct PositionSample {
    pub board: Board,
    /// Player to move after `moves` have been played.
    pub next_pla: Player,
    pub moves: Vec<Move>,
    pub initial_turn_number: i64,
    /// `NULL_LOC` when there is no hint.
    pub hint_loc: Loc,
    pub weight: f64,
}

/// Wire form. Field order is the key order of the emitted JSON.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SampleLine {
    board: String,
    hint_loc: String,
    initial_turn_number: i64,
    move_locs: Vec<String>,
    move_plas: Vec<String>,
    next_pla: String,
    #[serde(default = "default_weight")]
    weight: f64,
    x_size: usize,
    y_size: usize,
}

fn default_weight() -> f64 {
    1.0
}

fn parse_player(s: &str) -> Result<Player, SampleError> {
    Color::try_parse_player(s).ok_or_else(|| SampleError::Board(BoardError::ParsePlayer(s.to_string())))
}

impl PositionSample {
    pub fn to_json_line(&self) -> String {
        let board = &self.board;
        let line = SampleLine {
            board: board.to_string_simple('/').trim_end_matches('/').to_string(),
            hint_loc: location::to_string(self.hint_loc, board.x_size, board.y_size),
            initial_turn_number: self.initial_turn_number,
            move_locs: self
                .moves
                .iter()
                .map(|m| location::to_string(m.loc, board.x_size, board.y_size))
                .collect(),
            move_plas: self.moves.iter().map(|m| m.pla.to_short_string().to_string()).collect(),
            next_pla: self.next_pla.to_short_string().to_string(),
            weight: self.weight,
            x_size: board.x_size,
            y_size: board.y_size,
        };
        serde_json::to_string(&line).unwrap_or_default()
    }

    pub fn of_json_line(s: &str) -> Result<Self, SampleError> {
        let line: SampleLine = serde_json::from_str(s.trim())?;
        let board = Board::parse_board_with_delimiter(
            line.x_size,
            line.y_size,
            line.board.trim_end_matches('/'),
            '/',
        )?;

        if line.move_locs.len() != line.move_plas.len() {
            return Err(SampleError::Field(format!(
                "{} move locations but {} move players",
                line.move_locs.len(),
                line.move_plas.len()
            )));
        }
        let moves = line
            .move_locs
            .iter()
            .zip(&line.move_plas)
            .map(|(loc, pla)| {
                let loc = location::of_string(loc, board.x_size, board.y_size)?;
                Ok(Move::new(loc, parse_player(pla)?))
            })
            .collect::<Result<Vec<_>, SampleError>>()?;

        let hint_loc = if line.hint_loc == "null" {
            NULL_LOC
        } else {
            location::of_string(&line.hint_loc, board.x_size, board.y_size)?
        };

        Ok(PositionSample {
            next_pla: parse_player(&line.next_pla)?,
            board,
            moves,
            initial_turn_number: line.initial_turn_number,
            hint_loc,
            weight: line.weight,
        })
    }

    /// Turn number after all sample moves, never negative.
    pub fn current_turn_number(&self) -> i64 {
        (self.initial_turn_number + self.moves.len() as i64).max(0)
    }

    /// The same sample one move earlier, without a hint and with `new_weight`.
    /// Unchanged when there are no moves.
    pub fn previous_position(&self, new_weight: f64) -> PositionSample {
        let mut other = self.clone();
        if let Some(last) = other.moves.pop() {
            other.next_pla = last.pla;
            other.hint_loc = NULL_LOC;
            other.weight = new_weight;
        }
        other
    }

    pub fn has_previous_positions(&self, num_previous: usize) -> bool {
        self.moves.len() >= num_previous
    }

    pub fn is_equal_for_testing(&self, other: &PositionSample, check_num_captures: bool, check_simple_ko: bool) -> bool {
        self.board
            .is_equal_for_testing(&other.board, check_num_captures, check_simple_ko)
            .unwrap_or(false)
            && self.next_pla == other.next_pla
            && self.moves == other.moves
            && self.initial_turn_number == other.initial_turn_number
            && self.hint_loc == other.hint_loc
            && self.weight == other.weight
    }
}
