//! Tengen: a Go rules engine.
//!
//! This crate tracks board state and full game history for Go under a family
//! of rule sets (simple, positional, situational and spight ko; area and
//! territory scoring with an encore; group tax, button and handicap bonus),
//! and provides the helpers a self-play or search driver needs around it.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions and sentinel locations
//! - [`color`] - Stone colors and players
//! - [`location`] - Location encoding and coordinate strings
//! - [`hash`] - 128-bit Zobrist hashing
//! - [`board`] - Board with incremental chain and liberty tracking
//! - [`rules`] - Rule sets and presets
//! - [`history`] - Move history, legality, encore and scoring
//! - [`kohash`] - Shared ko-hash lookup table for searches
//! - [`nn`] - Evaluator contract and rule-based evaluators
//! - [`playutils`] - Komi, sampling and life-and-death helpers
//! - [`sample`] - Position samples as JSON lines
//! - [`gtp`] - Go Text Protocol front end
//!
//! ## Example
//!
//! ```
//! use tengen::board::Board;
//! use tengen::color::Color;
//! use tengen::history::BoardHistory;
//! use tengen::rules::Rules;
//!
//! let mut board = Board::new(9, 9).unwrap();
//! let mut hist = BoardHistory::new(&board, Color::Black, Rules::chinese(), 0);
//!
//! let loc = board.loc(4, 4);
//! let mv = hist.verify_move(&board, loc, Color::Black).unwrap();
//! hist.make_verified_move(&mut board, mv, None);
//!
//! let score_area = hist.clone().end_and_score_game_now(&board);
//! assert_eq!(score_area[loc], Color::Black);
//! ```

pub mod board;
pub mod color;
pub mod constants;
pub mod error;
pub mod gtp;
pub mod hash;
pub mod history;
pub mod kohash;
pub mod location;
pub mod nn;
pub mod playutils;
pub mod rules;
pub mod sample;
