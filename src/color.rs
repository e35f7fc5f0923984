//! Stone colors and players.
//!
//! Players and colors share one representation: a player is a color that is
//! either [`Color::Black`] or [`Color::White`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Content of a board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    #[default]
    Empty = 0,
    Black = 1,
    White = 2,
    Wall = 3,
}

/// A color restricted by convention to `Black` or `White`.
pub type Player = Color;

pub const NUM_BOARD_COLORS: usize = 4;

impl Color {
    /// The other player. Only meaningful for `Black` and `White`.
    #[inline]
    pub fn opp(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
            other => other,
        }
    }

    #[inline]
    pub fn is_player(self) -> bool {
        matches!(self, Color::Black | Color::White)
    }

    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }

    /// Single character used by the text board format.
    pub fn to_char(self) -> char {
        match self {
            Color::Black => 'X',
            Color::White => 'O',
            Color::Empty => '.',
            Color::Wall => '#',
        }
    }

    pub fn to_long_string(self) -> &'static str {
        match self {
            Color::Black => "Black",
            Color::White => "White",
            Color::Empty => "Empty",
            Color::Wall => "Wall",
        }
    }

    pub fn to_short_string(self) -> &'static str {
        match self {
            Color::Black => "B",
            Color::White => "W",
            Color::Empty => "E",
            Color::Wall => "",
        }
    }

    /// Parse `b`/`black`/`w`/`white`, ignoring case.
    pub fn try_parse_player(s: &str) -> Option<Player> {
        match s.trim().to_lowercase().as_str() {
            "b" | "black" => Some(Color::Black),
            "w" | "white" => Some(Color::White),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_long_string())
    }
}

impl FromStr for Color {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::try_parse_player(s).ok_or_else(|| BoardError::ParsePlayer(s.to_string()))
    }
}
