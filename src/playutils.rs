//! Game setup and self-play helpers built on the history and an evaluator:
//! komi selection, random and policy move sampling, fair-komi search and
//! life-and-death estimates.

use std::collections::HashMap;

use anyhow::{Result, bail};
use log::{debug, warn};

use crate::board::Board;
use crate::color::{Color, Player};
use crate::constants::{Loc, MAX_ARR_SIZE, NULL_LOC, PASS_LOC};
use crate::history::BoardHistory;
use crate::nn::{MiscNNInputParams, NNEvaluator, NNOutput, NNPos};
use crate::rules::{KoRule, Rules, ScoringRule, TaxRule};

/// Handicap and komi chosen for a new game. The komi is applied later
/// with [`set_komi_with_noise`] or [`set_komi_without_noise`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtraBlackAndKomi {
    pub extra_black: usize,
    pub komi_mean: f32,
    pub komi_stdev: f32,
    pub make_game_fair: bool,
    pub make_game_fair_for_empty_board: bool,
    pub allow_integer: bool,
}

/// Evaluators used to judge komi. When `white` is a different evaluator its
/// estimates are averaged with `black`'s.
#[derive(Clone, Copy)]
pub struct KomiBots<'a> {
    pub black: &'a dyn NNEvaluator,
    pub white: Option<&'a dyn NNEvaluator>,
}

impl<'a> KomiBots<'a> {
    pub fn single(bot: &'a dyn NNEvaluator) -> Self {
        KomiBots {
            black: bot,
            white: None,
        }
    }

    fn for_player(&self, pla: Player) -> &'a dyn NNEvaluator {
        match (pla, self.white) {
            (Color::White, Some(white)) => white,
            _ => self.black,
        }
    }
}

/// Value estimates from white's perspective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiteScoreValues {
    pub win_loss_value: f64,
    pub no_result_value: f64,
    pub score_mean: f64,
    pub score_stdev: f64,
    pub lead: f64,
}

fn next_bool(rng: &mut fastrand::Rng, prob: f64) -> bool {
    rng.f64() < prob
}

fn next_exponential(rng: &mut fastrand::Rng) -> f64 {
    -(1.0 - rng.f64()).ln()
}

fn next_gaussian(rng: &mut fastrand::Rng) -> f64 {
    let u1 = 1.0 - rng.f64();
    let u2 = rng.f64();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Index drawn with probability proportional to `weights`.
fn choose_weighted(rng: &mut fastrand::Rng, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    let mut r = rng.f64() * total;
    for (i, &w) in weights.iter().enumerate() {
        if r < w {
            return i;
        }
        r -= w;
    }
    // Rounding can leave r just above the last bucket.
    weights.iter().rposition(|&w| w > 0.0).unwrap_or(0)
}

fn default_max_extra_black(sqrt_board_area: f64) -> usize {
    match sqrt_board_area {
        a if a <= 10.00001 => 0,
        a if a <= 14.00001 => 1,
        a if a <= 16.00001 => 2,
        a if a <= 17.00001 => 3,
        a if a <= 18.00001 => 4,
        _ => 5,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn choose_extra_black_and_komi(
    base: f32,
    stdev: f32,
    allow_integer_prob: f64,
    handicap_prob: f64,
    num_extra_black_fixed: usize,
    big_stdev_prob: f64,
    big_stdev: f32,
    sqrt_board_area: f64,
    rng: &mut fastrand::Rng,
) -> ExtraBlackAndKomi {
    let mut stdev_to_use = stdev.max(0.0);
    if big_stdev > 0.0 && next_bool(rng, big_stdev_prob) {
        stdev_to_use = big_stdev;
    }
    // Smaller boards get proportionally smaller komi swings.
    stdev_to_use *= (sqrt_board_area / 6.0) as f32;

    let mut extra_black = 0;
    let max_extra_black = default_max_extra_black(sqrt_board_area);
    if (num_extra_black_fixed > 0 || max_extra_black > 0) && next_bool(rng, handicap_prob) {
        extra_black = if num_extra_black_fixed > 0 {
            num_extra_black_fixed
        } else {
            1 + rng.usize(..max_extra_black)
        };
    }

    ExtraBlackAndKomi {
        extra_black,
        komi_mean: base,
        komi_stdev: stdev_to_use,
        make_game_fair: false,
        make_game_fair_for_empty_board: false,
        allow_integer: next_bool(rng, allow_integer_prob),
    }
}

/// Round to a multiple of 0.5, going up with probability equal to the
/// distance from the lower multiple.
fn round_komi_with_linear_prob(komi: f32, rng: &mut fastrand::Rng) -> f32 {
    let lower = (komi * 2.0).floor() / 2.0;
    let upper = (komi * 2.0).ceil() / 2.0;
    if lower == upper {
        return lower;
    }
    if (rng.f64() as f32) < (komi - lower) / (upper - lower) {
        upper
    } else {
        lower
    }
}

/// Applies the mean komi rounded to the nearest half point. Ignores `allow_integer`.
pub fn set_komi_without_noise(ebk: &ExtraBlackAndKomi, hist: &mut BoardHistory) {
    hist.set_komi((ebk.komi_mean * 2.0).round() / 2.0);
}

pub fn set_komi_with_noise(ebk: &ExtraBlackAndKomi, hist: &mut BoardHistory, rng: &mut fastrand::Rng) {
    let mut komi = ebk.komi_mean;
    if ebk.komi_stdev > 0.0 {
        komi += ebk.komi_stdev * next_gaussian(rng) as f32;
    }
    komi = round_komi_with_linear_prob(komi, rng);
    if !ebk.allow_integer && komi == komi.round() {
        komi += if rng.bool() { 0.5 } else { -0.5 };
    }
    hist.set_komi(komi);
}

/// Clamp to a board-size dependent range and round to a multiple of 0.5.
pub fn round_and_clip_komi(unrounded: f64, board: &Board, loose_clipping: bool) -> f32 {
    let area = (board.x_size * board.y_size) as f64;
    let range = if loose_clipping { 40.0 + area } else { 40.0 + 0.5 * area };
    let clipped = unrounded.clamp(-range, range);
    (0.5 * (2.0 * clipped).round()) as f32
}

fn legal_board_moves(board: &Board, hist: &BoardHistory, pla: Player, ban_move: Option<Loc>) -> Vec<Loc> {
    board
        .locs()
        .filter(|&loc| Some(loc) != ban_move && hist.is_legal(board, loc, pla))
        .collect()
}

/// A uniformly random legal board move, never pass.
pub fn choose_random_legal_move(
    board: &Board,
    hist: &BoardHistory,
    pla: Player,
    rng: &mut fastrand::Rng,
    ban_move: Option<Loc>,
) -> Option<Loc> {
    let moves = legal_board_moves(board, hist, pla, ban_move);
    if moves.is_empty() {
        return None;
    }
    Some(moves[rng.usize(..moves.len())])
}

/// `len` legal board moves drawn with replacement, or none if there are no legal moves.
pub fn choose_random_legal_moves(
    board: &Board,
    hist: &BoardHistory,
    pla: Player,
    rng: &mut fastrand::Rng,
    len: usize,
) -> Vec<Loc> {
    let moves = legal_board_moves(board, hist, pla, None);
    if moves.is_empty() {
        return Vec::new();
    }
    (0..len).map(|_| moves[rng.usize(..moves.len())]).collect()
}

/// Index drawn with probability proportional to `rel_probs ^ (1 / temperature)`.
/// A temperature near zero picks the first maximum.
pub fn choose_index_with_temperature(rng: &mut fastrand::Rng, rel_probs: &[f64], temperature: f64) -> usize {
    let max_value = rel_probs.iter().copied().fold(f64::MIN, f64::max);
    if temperature <= 1e-4 || max_value <= 0.0 {
        return rel_probs.iter().position(|&p| p == max_value).unwrap_or(0);
    }
    let weights: Vec<f64> = rel_probs
        .iter()
        .map(|&p| (p / max_value).powf(1.0 / temperature))
        .collect();
    choose_weighted(rng, &weights)
}

#[allow(clippy::too_many_arguments)]
pub fn choose_random_policy_move(
    nn_output: &NNOutput,
    board: &Board,
    hist: &BoardHistory,
    pla: Player,
    rng: &mut fastrand::Rng,
    temperature: f64,
    allow_pass: bool,
    ban_move: Option<Loc>,
) -> Option<Loc> {
    let policy_size = NNPos::get_policy_size(nn_output.nn_x_len, nn_output.nn_y_len);
    let mut moves = Vec::new();
    let mut rel_probs = Vec::new();
    for pos in 0..policy_size {
        let loc = NNPos::pos_to_loc(pos, board.x_size, board.y_size, nn_output.nn_x_len, nn_output.nn_y_len);
        if loc == NULL_LOC || (loc == PASS_LOC && !allow_pass) || Some(loc) == ban_move {
            continue;
        }
        let prob = nn_output.policy_probs.get(pos).copied().unwrap_or(-1.0);
        if prob > 0.0 && hist.is_legal(board, loc, pla) {
            moves.push(loc);
            rel_probs.push(prob as f64);
        }
    }

    if moves.is_empty() {
        warn!("policy proposes no legal move for {pla}");
        return None;
    }
    Some(moves[choose_index_with_temperature(rng, &rel_probs, temperature)])
}

/// A move for opening randomization: policy sharpened by `temperature`,
/// with a tiny chance of a uniform pick among the candidates.
pub fn get_game_initialization_move(
    evaluator: &dyn NNEvaluator,
    board: &Board,
    hist: &BoardHistory,
    pla: Player,
    rng: &mut fastrand::Rng,
    temperature: f64,
    params: &MiscNNInputParams,
) -> Result<Loc> {
    let nn_output = evaluator.evaluate(board, hist, pla, params)?;
    let policy_size = NNPos::get_policy_size(nn_output.nn_x_len, nn_output.nn_y_len);

    let mut moves = Vec::new();
    let mut weights = Vec::new();
    for pos in 0..policy_size {
        let loc = NNPos::pos_to_loc(pos, board.x_size, board.y_size, nn_output.nn_x_len, nn_output.nn_y_len);
        let prob = nn_output.policy_probs.get(pos).copied().unwrap_or(-1.0) as f64;
        if loc == NULL_LOC || prob <= 0.0 || !hist.is_legal(board, loc, pla) {
            continue;
        }
        moves.push(loc);
        weights.push(prob.powf(1.0 / temperature));
    }

    if moves.is_empty() {
        warn!("policy proposes no legal move for {pla}");
        bail!("no legal move with positive policy for {pla}");
    }

    let idx = if next_bool(rng, 0.0002) {
        rng.usize(..moves.len())
    } else {
        choose_weighted(rng, &weights)
    };
    Ok(moves[idx])
}

/// Play an exponentially distributed number of policy moves, averaging
/// `proportion_of_board_area` of the board area, to randomize the opening.
#[allow(clippy::too_many_arguments)]
pub fn initialize_game_using_policy(
    bots: KomiBots<'_>,
    board: &mut Board,
    hist: &mut BoardHistory,
    pla: &mut Player,
    rng: &mut fastrand::Rng,
    do_end_game_if_all_pass_alive: bool,
    proportion_of_board_area: f64,
    temperature: f64,
) -> Result<()> {
    let area = (board.x_size * board.y_size) as f64;
    let num_moves = (next_exponential(rng) * area * proportion_of_board_area).floor() as usize;
    debug!("initializing game with {num_moves} policy moves");

    let params = MiscNNInputParams::default();
    for _ in 0..num_moves {
        let loc = get_game_initialization_move(bots.for_player(*pla), board, hist, *pla, rng, temperature, &params)?;
        hist.make_board_move_assume_legal(board, loc, *pla, None);
        *pla = pla.opp();

        if do_end_game_if_all_pass_alive && !hist.is_game_finished {
            hist.end_game_if_all_pass_alive(board);
        }
        if hist.is_game_finished {
            break;
        }
    }
    Ok(())
}

pub fn get_white_score_values(
    evaluator: &dyn NNEvaluator,
    board: &Board,
    hist: &BoardHistory,
    pla: Player,
    params: &MiscNNInputParams,
) -> Result<WhiteScoreValues> {
    let out = evaluator.evaluate(board, hist, pla, params)?;
    Ok(WhiteScoreValues {
        win_loss_value: out.win_loss_value(),
        no_result_value: out.white_no_result_prob as f64,
        score_mean: out.white_score_mean as f64,
        score_stdev: out.white_score_stdev as f64,
        lead: out.white_lead as f64,
    })
}

/// `(lead, win_loss)` keyed by komi in half points.
type KomiCache = HashMap<i64, (f64, f64)>;

fn eval_komi(
    cache: &mut KomiCache,
    bots: KomiBots<'_>,
    board: &Board,
    hist: &mut BoardHistory,
    pla: Player,
    params: &MiscNNInputParams,
    komi: f32,
) -> Result<(f64, f64)> {
    let key = (komi * 2.0).round() as i64;
    if let Some(&cached) = cache.get(&key) {
        return Ok(cached);
    }

    let old_komi = hist.rules.komi;
    hist.rules.komi = komi;
    let result = eval_bots(bots, board, hist, pla, params);
    hist.rules.komi = old_komi;

    let result = result?;
    cache.insert(key, result);
    Ok(result)
}

fn eval_bots(
    bots: KomiBots<'_>,
    board: &Board,
    hist: &BoardHistory,
    pla: Player,
    params: &MiscNNInputParams,
) -> Result<(f64, f64)> {
    let v0 = get_white_score_values(bots.black, board, hist, pla, params)?;
    match bots.white {
        Some(white) if !std::ptr::addr_eq(white, bots.black) => {
            let v1 = get_white_score_values(white, board, hist, pla, params)?;
            Ok((0.5 * (v0.lead + v1.lead), 0.5 * (v0.win_loss_value + v1.win_loss_value)))
        }
        _ => Ok((v0.lead, v0.win_loss_value)),
    }
}

/// Komi, possibly fractional, at which white's win/loss value crosses zero.
/// Leaves `hist.rules.komi` unchanged.
fn get_naive_even_komi_helper(
    cache: &mut KomiCache,
    bots: KomiBots<'_>,
    board: &Board,
    hist: &mut BoardHistory,
    pla: Player,
    params: &MiscNNInputParams,
    loose_clipping: bool,
) -> Result<f64> {
    let old_komi = hist.rules.komi;
    let result = naive_even_komi_search(cache, bots, board, hist, pla, params, loose_clipping);
    hist.rules.komi = old_komi;
    result
}

fn naive_even_komi_search(
    cache: &mut KomiCache,
    bots: KomiBots<'_>,
    board: &Board,
    hist: &mut BoardHistory,
    pla: Player,
    params: &MiscNNInputParams,
    loose_clipping: bool,
) -> Result<f64> {
    // Shift by the predicted lead a few times to get close to fair.
    let mut last_shift = 0.0f64;
    let mut last_win_loss = 0.0f64;
    let mut last_lead = 0.0f64;
    for i in 0..3 {
        let komi = hist.rules.komi;
        let (lead, win_loss) = eval_komi(cache, bots, board, hist, pla, params, komi)?;

        // The last shift made things worse by a nontrivial amount: revert half and stop.
        if i > 0
            && ((last_lead > 0.0 && lead > last_lead + 5.0 && win_loss < 0.75)
                || (last_lead < 0.0 && lead < last_lead - 5.0 && win_loss > -0.75)
                || (last_win_loss > 0.0 && win_loss > last_win_loss + 0.1)
                || (last_win_loss < 0.0 && win_loss < last_win_loss - 0.1))
        {
            hist.rules.komi = round_and_clip_komi(hist.rules.komi as f64 - last_shift * 0.5, board, loose_clipping);
            break;
        }
        last_lead = lead;
        last_win_loss = win_loss;

        let mut shift = -lead;
        if i > 0 && shift.abs() > last_shift.abs() {
            shift = last_shift.abs().copysign(shift);
        }
        last_shift = shift;

        // Score and winrate disagree on the direction.
        if (shift > 0.0 && win_loss > 0.0) || (shift < 0.0 && lead < 0.0) {
            break;
        }

        hist.rules.komi = round_and_clip_komi(hist.rules.komi as f64 + shift, board, loose_clipping);
        if shift.abs() < 16.0 {
            break;
        }
    }

    let base_komi = hist.rules.komi as f64;
    let mut eval_win_loss = |delta: f64, hist: &mut BoardHistory| -> Result<f64> {
        let komi = round_and_clip_komi(base_komi + delta, board, loose_clipping);
        Ok(eval_komi(cache, bots, board, hist, pla, params, komi)?.1)
    };

    // Grow a window outward until the win/loss sign flips.
    let mut lower_delta;
    let mut upper_delta;
    let mut lower_win_loss;
    let mut upper_win_loss;
    let win_loss_zero = eval_win_loss(0.0, hist)?;
    if win_loss_zero < 0.0 {
        lower_delta = 0.0;
        lower_win_loss = win_loss_zero;
        upper_delta = 1.0;
        upper_win_loss = win_loss_zero;
        for i in 0..=5 {
            upper_delta = 2.0f64.powi(i);
            upper_win_loss = eval_win_loss(upper_delta, hist)?;
            if upper_win_loss >= 0.0 {
                break;
            }
        }
    } else {
        upper_delta = 0.0;
        upper_win_loss = win_loss_zero;
        lower_delta = -1.0;
        lower_win_loss = win_loss_zero;
        for i in 0..=5 {
            lower_delta = -(2.0f64.powi(i));
            lower_win_loss = eval_win_loss(lower_delta, hist)?;
            if lower_win_loss <= 0.0 {
                break;
            }
        }
    }

    while upper_delta - lower_delta > 0.50001 {
        let mid_delta = 0.5 * (lower_delta + upper_delta);
        let mid_win_loss = eval_win_loss(mid_delta, hist)?;
        if mid_win_loss < 0.0 {
            lower_delta = mid_delta;
            lower_win_loss = mid_win_loss;
        } else {
            upper_delta = mid_delta;
            upper_win_loss = mid_win_loss;
        }
    }

    let final_delta = if lower_win_loss >= upper_win_loss - 1e-30 {
        0.5 * (lower_delta + upper_delta)
    } else if upper_win_loss <= 0.0 {
        upper_delta
    } else if lower_win_loss >= 0.0 {
        lower_delta
    } else {
        lower_delta + (upper_delta - lower_delta) * (0.0 - lower_win_loss) / (upper_win_loss - lower_win_loss)
    };
    Ok(base_komi + final_delta)
}

/// Set the komi so the position is as close to even as the evaluators judge,
/// rounding the fair komi randomly to a neighbouring half point.
pub fn adjust_komi_to_even(
    bots: KomiBots<'_>,
    board: &Board,
    hist: &mut BoardHistory,
    pla: Player,
    params: &MiscNNInputParams,
    rng: &mut fastrand::Rng,
) -> Result<()> {
    let mut cache = KomiCache::new();
    let new_komi = get_naive_even_komi_helper(&mut cache, bots, board, hist, pla, params, false)?;
    let lower = (new_komi * 2.0).floor() * 0.5;
    let upper = lower + 0.5;
    let rounded = if next_bool(rng, (new_komi - lower) / (upper - lower)) { upper } else { lower };
    let komi = round_and_clip_komi(rounded, board, false);
    debug!("adjusted komi from {} to {komi}", hist.rules.komi);
    hist.set_komi(komi);
    Ok(())
}

/// White's lead in points: how much komi white could give back and still
/// break even. Leaves the history unchanged.
pub fn compute_lead(
    bots: KomiBots<'_>,
    board: &Board,
    hist: &mut BoardHistory,
    pla: Player,
    params: &MiscNNInputParams,
) -> Result<f32> {
    let mut cache = KomiCache::new();
    let old_komi = hist.rules.komi as f64;
    let naive_komi = get_naive_even_komi_helper(&mut cache, bots, board, hist, pla, params, true)?;

    // Territory scoring and integer fair komi need no smoothing.
    if hist.rules.scoring != ScoringRule::Area || naive_komi == naive_komi.round() {
        return Ok((old_komi - naive_komi) as f32);
    }

    // Area scoring moves in steps of two points, so average the oscillation.
    let lower = (naive_komi * 2.0).floor() * 0.5;
    let upper = lower + 0.5;
    let mut eval_win_loss = |komi: f64, hist: &mut BoardHistory| -> Result<f64> {
        let komi = round_and_clip_komi(komi, board, true);
        Ok(eval_komi(&mut cache, bots, board, hist, pla, params, komi)?.1)
    };
    let lower_win_loss = 0.5 * (eval_win_loss(upper, hist)? + eval_win_loss(lower - 0.5, hist)?);
    let upper_win_loss = 0.5 * (eval_win_loss(upper + 0.5, hist)? + eval_win_loss(lower, hist)?);

    let result = if lower_win_loss >= upper_win_loss - 1e-30 {
        0.5 * (lower + upper)
    } else {
        let interpolated = lower + (upper - lower) * (0.0 - lower_win_loss) / (upper_win_loss - lower_win_loss);
        interpolated.clamp(lower - 0.5, upper + 0.5)
    };
    Ok((old_komi - result) as f32)
}

/// Search effort multiplier: drops toward `search_factor_when_winning` once
/// the last three values all show `pla` winning by more than the threshold.
pub fn get_search_factor(
    search_factor_when_winning_threshold: f64,
    search_factor_when_winning: f64,
    win_loss_utility_factor: f64,
    recent_win_loss_values: &[f64],
    pla: Player,
) -> f64 {
    let span = win_loss_utility_factor - search_factor_when_winning_threshold;
    if recent_win_loss_values.len() < 3 || span <= 1e-10 {
        return 1.0;
    }

    let recent = &recent_win_loss_values[recent_win_loss_values.len() - 3..];
    let excess_winning = if pla == Color::Black {
        let least_winning = recent.iter().copied().fold(-win_loss_utility_factor, f64::max);
        -search_factor_when_winning_threshold - least_winning
    } else {
        let least_winning = recent.iter().copied().fold(win_loss_utility_factor, f64::min);
        least_winning - search_factor_when_winning_threshold
    };

    if excess_winning > 0.0 {
        let lambda = excess_winning / span;
        1.0 + lambda * (search_factor_when_winning - 1.0)
    } else {
        1.0
    }
}

/// White ownership per board location, indexed by `Loc`.
pub fn compute_ownership(
    evaluator: &dyn NNEvaluator,
    board: &Board,
    hist: &BoardHistory,
    pla: Player,
) -> Result<Vec<f64>> {
    let out = evaluator.evaluate(board, hist, pla, &MiscNNInputParams::default())?;
    let Some(ownership) = out.white_ownership.as_ref() else {
        bail!("evaluator does not report ownership");
    };

    let mut by_loc = vec![0.0; MAX_ARR_SIZE];
    for loc in board.locs() {
        if let Some(pos) = NNPos::loc_to_pos(loc, board.x_size, out.nn_x_len, out.nn_y_len) {
            by_loc[loc] = ownership.get(pos).copied().unwrap_or(0.0) as f64;
        }
    }
    Ok(by_loc)
}

/// Stone statuses from scoring the position now: a stone lives if its point
/// scores for its own color. Every stone lives in a no-result game.
pub fn compute_anticipated_statuses_simple(board: &Board, hist: &BoardHistory) -> Vec<bool> {
    let mut is_alive = vec![false; MAX_ARR_SIZE];
    if hist.is_game_finished && hist.is_no_result {
        for loc in board.locs() {
            is_alive[loc] = board.colors[loc] != Color::Empty;
        }
        return is_alive;
    }

    let mut scored = hist.clone();
    let area = scored.end_and_score_game_now(board);
    for loc in board.locs() {
        if board.colors[loc] != Color::Empty {
            is_alive[loc] = board.colors[loc] == area[loc];
        }
    }
    is_alive
}

/// Stone statuses from evaluator ownership. A chain lives when its average
/// ownership in its own color is at least 0.2 and no stone is below -0.6.
/// Also returns the ownership used.
pub fn compute_anticipated_statuses_with_ownership(
    evaluator: &dyn NNEvaluator,
    board: &Board,
    hist: &BoardHistory,
    pla: Player,
) -> Result<(Vec<bool>, Vec<f64>)> {
    const AVG_THRESHOLD_FOR_LIFE: f64 = 0.2;
    const WORST_THRESHOLD_FOR_LIFE: f64 = -0.6;

    let ownership = compute_ownership(evaluator, board, hist, pla)?;
    let mut is_alive = vec![false; MAX_ARR_SIZE];
    let mut solved = vec![false; MAX_ARR_SIZE];

    for loc in board.locs() {
        let color = board.colors[loc];
        if solved[loc] || !color.is_player() {
            continue;
        }
        let sign = if color == Color::White { 1.0 } else { -1.0 };
        let chain = board.chain_locs(loc);
        let own: Vec<f64> = chain.iter().map(|&l| sign * ownership[l]).collect();
        let avg = own.iter().sum::<f64>() / own.len() as f64;
        let worst = own.iter().copied().fold(f64::MAX, f64::min);
        let alive = avg >= AVG_THRESHOLD_FOR_LIFE && worst >= WORST_THRESHOLD_FOR_LIFE;
        for &l in &chain {
            solved[l] = true;
            is_alive[l] = alive;
        }
    }
    Ok((is_alive, ownership))
}

/// Random ko, scoring and tax rules over otherwise default rules.
pub fn gen_random_rules(rng: &mut fastrand::Rng) -> Rules {
    const KO_RULES: [KoRule; 3] = [KoRule::Simple, KoRule::Positional, KoRule::Situational];
    const SCORING_RULES: [ScoringRule; 2] = [ScoringRule::Area, ScoringRule::Territory];
    const TAX_RULES: [TaxRule; 3] = [TaxRule::None, TaxRule::Seki, TaxRule::All];
    Rules {
        ko: KO_RULES[rng.usize(..KO_RULES.len())],
        scoring: SCORING_RULES[rng.usize(..SCORING_RULES.len())],
        tax: TAX_RULES[rng.usize(..TAX_RULES.len())],
        ..Rules::default()
    }
}
