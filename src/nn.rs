//! Contract between the core and a position evaluator.
//!
//! An evaluator maps `(board, history, player)` to a policy over a fixed
//! `nn_x_len * nn_y_len + 1` grid (the last slot is pass) and value and score
//! estimates from white's perspective. Boards smaller than the grid occupy
//! its top-left corner.
//!
//! No network is bundled. [`UniformEvaluator`] and [`AreaEvaluator`] are
//! rule-based stand-ins used by the demo, the GTP front end and tests.

use anyhow::{Result, bail};

use crate::board::Board;
use crate::color::{Color, Player};
use crate::constants::{Loc, MAX_LEN, NULL_LOC, PASS_LOC};
use crate::history::BoardHistory;
use crate::location;

/// Mapping between board locations and policy indices.
pub struct NNPos;

impl NNPos {
    pub const MAX_BOARD_LEN: usize = MAX_LEN;
    pub const MAX_NN_POLICY_SIZE: usize = MAX_LEN * MAX_LEN + 1;

    pub fn get_policy_size(nn_x_len: usize, nn_y_len: usize) -> usize {
        nn_x_len * nn_y_len + 1
    }

    /// Policy index of `loc`, or `None` for `NULL_LOC` and walls.
    pub fn loc_to_pos(loc: Loc, board_x_size: usize, nn_x_len: usize, nn_y_len: usize) -> Option<usize> {
        if loc == PASS_LOC {
            return Some(nn_x_len * nn_y_len);
        }
        if loc == NULL_LOC {
            return None;
        }
        let x = location::get_x(loc, board_x_size);
        let y = location::get_y(loc, board_x_size);
        if x < 0 || y < 0 || x as usize >= nn_x_len || y as usize >= nn_y_len {
            return None;
        }
        Some(x as usize + y as usize * nn_x_len)
    }

    /// Location for policy index `pos`. Grid cells outside the board map to `NULL_LOC`.
    pub fn pos_to_loc(pos: usize, board_x_size: usize, board_y_size: usize, nn_x_len: usize, nn_y_len: usize) -> Loc {
        if pos == nn_x_len * nn_y_len {
            return PASS_LOC;
        }
        let x = pos % nn_x_len;
        let y = pos / nn_x_len;
        if x >= board_x_size || y >= board_y_size {
            return NULL_LOC;
        }
        location::get_loc(x, y, board_x_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiscNNInputParams {
    /// How much a draw is worth to white, between 0 and 1.
    pub draw_equivalent_wins_for_white: f64,
    pub playout_doubling_advantage: f64,
}

impl Default for MiscNNInputParams {
    fn default() -> Self {
        MiscNNInputParams {
            draw_equivalent_wins_for_white: 0.5,
            playout_doubling_advantage: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NNOutput {
    pub nn_x_len: usize,
    pub nn_y_len: usize,
    /// One entry per policy index. Illegal moves are negative.
    pub policy_probs: Vec<f32>,
    pub white_win_prob: f32,
    pub white_loss_prob: f32,
    pub white_no_result_prob: f32,
    pub white_score_mean: f32,
    pub white_score_stdev: f32,
    pub white_lead: f32,
    /// Per grid cell, +1 for white and -1 for black.
    pub white_ownership: Option<Vec<f32>>,
}

impl NNOutput {
    /// White win probability minus white loss probability.
    pub fn win_loss_value(&self) -> f64 {
        self.white_win_prob as f64 - self.white_loss_prob as f64
    }

    /// White utility: the win/loss value plus a bounded score term.
    pub fn utility(&self, score_utility_factor: f64) -> f64 {
        let scale = ((self.nn_x_len * self.nn_y_len) as f64).sqrt().max(1.0);
        let score_value = (self.white_score_mean as f64 / scale).atan() * std::f64::consts::FRAC_2_PI;
        self.win_loss_value() + score_utility_factor * score_value
    }

    pub fn policy_prob(&self, loc: Loc, board_x_size: usize) -> f32 {
        NNPos::loc_to_pos(loc, board_x_size, self.nn_x_len, self.nn_y_len)
            .and_then(|pos| self.policy_probs.get(pos).copied())
            .unwrap_or(-1.0)
    }
}

pub trait NNEvaluator: Send + Sync {
    fn nn_x_len(&self) -> usize;
    fn nn_y_len(&self) -> usize;

    fn evaluate(
        &self,
        board: &Board,
        hist: &BoardHistory,
        pla: Player,
        params: &MiscNNInputParams,
    ) -> Result<NNOutput>;
}

fn check_fits(board: &Board, nn_x_len: usize, nn_y_len: usize) -> Result<()> {
    if board.x_size > nn_x_len || board.y_size > nn_y_len {
        bail!(
            "board {}x{} does not fit evaluator grid {}x{}",
            board.x_size,
            board.y_size,
            nn_x_len,
            nn_y_len
        );
    }
    Ok(())
}

/// Equal probability on every legal move including pass, -1 elsewhere.
fn uniform_legal_policy(board: &Board, hist: &BoardHistory, pla: Player, nn_x_len: usize, nn_y_len: usize) -> Vec<f32> {
    let policy_size = NNPos::get_policy_size(nn_x_len, nn_y_len);
    let mut policy = vec![-1.0f32; policy_size];
    let mut num_legal = 0;
    for (pos, prob) in policy.iter_mut().enumerate() {
        let loc = NNPos::pos_to_loc(pos, board.x_size, board.y_size, nn_x_len, nn_y_len);
        if loc != NULL_LOC && hist.is_legal(board, loc, pla) {
            *prob = 1.0;
            num_legal += 1;
        }
    }
    for prob in policy.iter_mut().filter(|p| **p > 0.0) {
        *prob /= num_legal as f32;
    }
    policy
}

/// Uniform policy over legal moves and an even value.
#[derive(Debug, Clone, Copy)]
pub struct UniformEvaluator {
    pub nn_x_len: usize,
    pub nn_y_len: usize,
}

impl UniformEvaluator {
    pub fn new(nn_x_len: usize, nn_y_len: usize) -> Self {
        UniformEvaluator { nn_x_len, nn_y_len }
    }
}

impl NNEvaluator for UniformEvaluator {
    fn nn_x_len(&self) -> usize {
        self.nn_x_len
    }

    fn nn_y_len(&self) -> usize {
        self.nn_y_len
    }

    fn evaluate(
        &self,
        board: &Board,
        hist: &BoardHistory,
        pla: Player,
        _params: &MiscNNInputParams,
    ) -> Result<NNOutput> {
        check_fits(board, self.nn_x_len, self.nn_y_len)?;
        Ok(NNOutput {
            nn_x_len: self.nn_x_len,
            nn_y_len: self.nn_y_len,
            policy_probs: uniform_legal_policy(board, hist, pla, self.nn_x_len, self.nn_y_len),
            white_win_prob: 0.5,
            white_loss_prob: 0.5,
            white_no_result_prob: 0.0,
            white_score_mean: 0.0,
            white_score_stdev: 0.0,
            white_lead: 0.0,
            white_ownership: None,
        })
    }
}

/// Scores the position as if the game ended now, counting only what the
/// pass-alive analysis can prove, and squashes the score into a value.
#[derive(Debug, Clone, Copy)]
pub struct AreaEvaluator {
    pub nn_x_len: usize,
    pub nn_y_len: usize,
    /// Score difference that maps to a win probability of about 0.88.
    pub score_scale: f32,
}

impl AreaEvaluator {
    pub fn new(nn_x_len: usize, nn_y_len: usize) -> Self {
        AreaEvaluator {
            nn_x_len,
            nn_y_len,
            score_scale: 5.0,
        }
    }
}

impl NNEvaluator for AreaEvaluator {
    fn nn_x_len(&self) -> usize {
        self.nn_x_len
    }

    fn nn_y_len(&self) -> usize {
        self.nn_y_len
    }

    fn evaluate(
        &self,
        board: &Board,
        hist: &BoardHistory,
        pla: Player,
        params: &MiscNNInputParams,
    ) -> Result<NNOutput> {
        check_fits(board, self.nn_x_len, self.nn_y_len)?;

        let mut scored = hist.clone();
        let area = scored.end_and_score_game_now(board);
        let score = scored.final_white_minus_black_score;

        let mut ownership = vec![0.0f32; self.nn_x_len * self.nn_y_len];
        for loc in board.locs() {
            if let Some(pos) = NNPos::loc_to_pos(loc, board.x_size, self.nn_x_len, self.nn_y_len) {
                ownership[pos] = match area[loc] {
                    Color::White => 1.0,
                    Color::Black => -1.0,
                    _ => 0.0,
                };
            }
        }

        let (white_win_prob, white_loss_prob) = if score == 0.0 {
            let draw = params.draw_equivalent_wins_for_white as f32;
            (draw, 1.0 - draw)
        } else {
            let win = 0.5 * (1.0 + (score / self.score_scale).tanh());
            (win, 1.0 - win)
        };

        Ok(NNOutput {
            nn_x_len: self.nn_x_len,
            nn_y_len: self.nn_y_len,
            policy_probs: uniform_legal_policy(board, hist, pla, self.nn_x_len, self.nn_y_len),
            white_win_prob,
            white_loss_prob,
            white_no_result_prob: 0.0,
            white_score_mean: score,
            white_score_stdev: ((board.x_size * board.y_size) as f32).sqrt(),
            white_lead: score,
            white_ownership: Some(ownership),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rules;

    #[test]
    fn test_pos_round_trip() {
        let board = Board::new(7, 7).unwrap();
        for loc in board.locs() {
            let pos = NNPos::loc_to_pos(loc, 7, 9, 9).unwrap();
            assert_eq!(NNPos::pos_to_loc(pos, 7, 7, 9, 9), loc);
        }
        assert_eq!(NNPos::loc_to_pos(PASS_LOC, 7, 9, 9), Some(81));
        assert_eq!(NNPos::pos_to_loc(81, 7, 7, 9, 9), PASS_LOC);
        assert_eq!(NNPos::pos_to_loc(8, 7, 7, 9, 9), NULL_LOC);
        assert_eq!(NNPos::loc_to_pos(NULL_LOC, 7, 9, 9), None);
        assert_eq!(NNPos::get_policy_size(9, 9), 82);
    }

    #[test]
    fn test_uniform_policy_sums_to_one() {
        let board = Board::new(5, 5).unwrap();
        let hist = BoardHistory::new(&board, Color::Black, Rules::default(), 0);
        let eval = UniformEvaluator::new(5, 5);
        let out = eval.evaluate(&board, &hist, Color::Black, &MiscNNInputParams::default()).unwrap();
        let total: f32 = out.policy_probs.iter().filter(|p| **p > 0.0).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert_eq!(out.policy_probs.len(), 26);
        assert_eq!(out.win_loss_value(), 0.0);
    }

    #[test]
    fn test_board_must_fit() {
        let board = Board::new(9, 9).unwrap();
        let hist = BoardHistory::new(&board, Color::Black, Rules::default(), 0);
        let eval = UniformEvaluator::new(7, 7);
        assert!(eval.evaluate(&board, &hist, Color::Black, &MiscNNInputParams::default()).is_err());
    }

    #[test]
    fn test_area_evaluator_favors_komi() {
        let board = Board::new(5, 5).unwrap();
        let hist = BoardHistory::new(&board, Color::Black, Rules::default(), 0);
        let eval = AreaEvaluator::new(5, 5);
        let out = eval.evaluate(&board, &hist, Color::Black, &MiscNNInputParams::default()).unwrap();
        assert_eq!(out.white_lead, 7.5);
        assert!(out.win_loss_value() > 0.0);
        assert!(out.utility(0.5) > out.win_loss_value());
        assert!(out.white_ownership.unwrap().iter().all(|&o| o == 0.0));
    }
}
