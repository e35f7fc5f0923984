//! Game record layered over a [`Board`].
//!
//! `BoardHistory` tracks everything the board alone cannot: superko bans,
//! consecutive passes, the encore phases of territory scoring, bonus points,
//! and the terminal state of the game. It does not own the current board.
//! The caller keeps a `Board` and a `BoardHistory` side by side and passes
//! the board into every call, which lets a search clone or mutate boards
//! independently of the (larger) history.

use std::fmt;

use log::debug;

use crate::board::{AreaMap, Board, Move};
use crate::color::{Color, Player};
use crate::constants::{Loc, MAX_ARR_SIZE, NO_RESULT_REPETITIONS, NULL_LOC, PASS_LOC};
use crate::error::MoveError;
use crate::hash::{Hash128, basic_lcong, murmur_mix};
use crate::kohash::KoHashTable;
use crate::location;
use crate::rules::{KoRule, Rules, ScoringRule, TaxRule, WhiteHandicapBonusRule};

/// A ko capture made during the encore. A player may capture a given ko
/// from a given position only once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoreKoCapture {
    pub pos_hash_before_move: Hash128,
    pub move_loc: Loc,
    pub move_pla: Player,
}

/// A move that [`BoardHistory::verify_move`] accepted for one specific turn.
///
/// Only `verify_move` can create one, so holding a `VerifiedMove` is proof
/// that the move was legal when checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedMove {
    loc: Loc,
    pla: Player,
    turn_idx: usize,
}

impl VerifiedMove {
    pub fn loc(&self) -> Loc {
        self.loc
    }

    pub fn pla(&self) -> Player {
        self.pla
    }
}

#[derive(Clone)]
pub struct BoardHistory {
    pub rules: Rules,
    /// Every move since the initial position, passes included.
    pub move_history: Vec<Move>,
    /// Ko hash of the initial position and after every move, so its length
    /// is always `move_history.len() + 1`.
    pub ko_hash_history: Vec<Hash128>,
    /// Repetition checks only consider `ko_hash_history[first_turn_idx_with_ko_history..]`.
    /// Passes under spight-like rules and phase changes move this forward.
    pub first_turn_idx_with_ko_history: usize,

    pub initial_board: Board,
    pub initial_pla: Player,
    pub initial_encore_phase: u8,
    /// Turn number of the initial position. Affects nothing else.
    pub initial_turn_number: usize,
    pub assume_multiple_starting_black_moves_are_handicap: bool,
    pub white_has_moved: bool,
    pub presumed_next_move_pla: Player,

    pub consecutive_ending_passes: u32,
    /// Ko hashes right before each pass, used for spight-like phase endings.
    pub hashes_before_black_pass: Vec<Hash128>,
    pub hashes_before_white_pass: Vec<Hash128>,

    /// 0 during normal play, 1 and 2 in the encore of territory scoring.
    pub encore_phase: u8,
    pub num_turns_this_phase: usize,
    /// Stones that may not be captured back as a ko until a pass-for-ko.
    pub ko_recap_blocked: [bool; MAX_ARR_SIZE],
    pub ko_recap_block_hash: Hash128,
    pub ko_captures_in_encore: Vec<EncoreKoCapture>,
    pub second_encore_start_colors: AreaMap,

    /// Points added to white's score by passing rules (button, territory chill).
    pub white_bonus_score: f32,
    pub white_handicap_bonus_score: f32,
    /// Whether the button is still available to be taken.
    pub has_button: bool,

    /// Moves forbidden for the next player by superko, or in the encore by
    /// the one-capture-per-ko rule.
    pub super_ko_banned: [bool; MAX_ARR_SIZE],
    pub was_ever_occupied_or_played: [bool; MAX_ARR_SIZE],

    pub is_game_finished: bool,
    /// Winner when the game has ended, `Empty` for a draw or no result.
    pub winner: Player,
    /// Always an integer or half-integer.
    pub final_white_minus_black_score: f32,
    pub is_scored: bool,
    pub is_no_result: bool,
    pub is_resignation: bool,
}

impl fmt::Debug for BoardHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardHistory")
            .field("rules", &self.rules)
            .field("moves", &self.move_history.len())
            .field("encore_phase", &self.encore_phase)
            .field("presumed_next_move_pla", &self.presumed_next_move_pla)
            .field("is_game_finished", &self.is_game_finished)
            .field("winner", &self.winner)
            .field("final_white_minus_black_score", &self.final_white_minus_black_score)
            .finish_non_exhaustive()
    }
}

impl Default for BoardHistory {
    fn default() -> Self {
        BoardHistory::new(&Board::default(), Color::Black, Rules::default(), 0)
    }
}

/// Ko hash for a position with `pla` to move.
fn ko_hash(rules: &Rules, board: &Board, pla: Player, encore_phase: u8, ko_recap_block_hash: Hash128) -> Hash128 {
    if rules.ko == KoRule::Situational || rules.ko == KoRule::Simple || encore_phase > 0 {
        let z = board.zobrist();
        let mut hash = board.pos_hash ^ z.player[pla.idx()];
        if encore_phase > 0 {
            hash ^= z.encore[encore_phase as usize];
            hash ^= ko_recap_block_hash;
        }
        hash
    } else {
        board.pos_hash
    }
}

fn ko_hash_after_move_non_encore(rules: &Rules, board: &Board, pos_hash_after_move: Hash128, next_pla: Player) -> Hash128 {
    if rules.ko == KoRule::Situational || rules.ko == KoRule::Simple {
        pos_hash_after_move ^ board.zobrist().player[next_pla.idx()]
    } else {
        pos_hash_after_move
    }
}

impl BoardHistory {
    pub fn new(board: &Board, pla: Player, rules: Rules, encore_phase: u8) -> Self {
        let mut hist = BoardHistory {
            rules,
            move_history: Vec::new(),
            ko_hash_history: Vec::new(),
            first_turn_idx_with_ko_history: 0,
            initial_board: board.clone(),
            initial_pla: pla,
            initial_encore_phase: encore_phase,
            initial_turn_number: 0,
            assume_multiple_starting_black_moves_are_handicap: false,
            white_has_moved: false,
            presumed_next_move_pla: pla,
            consecutive_ending_passes: 0,
            hashes_before_black_pass: Vec::new(),
            hashes_before_white_pass: Vec::new(),
            encore_phase,
            num_turns_this_phase: 0,
            ko_recap_blocked: [false; MAX_ARR_SIZE],
            ko_recap_block_hash: Hash128::ZERO,
            ko_captures_in_encore: Vec::new(),
            second_encore_start_colors: [Color::Empty; MAX_ARR_SIZE],
            white_bonus_score: 0.0,
            white_handicap_bonus_score: 0.0,
            has_button: false,
            super_ko_banned: [false; MAX_ARR_SIZE],
            was_ever_occupied_or_played: [false; MAX_ARR_SIZE],
            is_game_finished: false,
            winner: Color::Empty,
            final_white_minus_black_score: 0.0,
            is_scored: false,
            is_no_result: false,
            is_resignation: false,
        };
        hist.clear(board, pla, rules, encore_phase);
        hist
    }

    /// Reset to a fresh game starting from `board` with `pla` to move.
    pub fn clear(&mut self, board: &Board, pla: Player, rules: Rules, encore_phase: u8) {
        self.rules = rules;
        self.move_history.clear();
        self.ko_hash_history.clear();
        self.first_turn_idx_with_ko_history = 0;

        self.initial_board = board.clone();
        self.initial_pla = pla;
        self.initial_encore_phase = encore_phase;
        self.initial_turn_number = 0;
        self.assume_multiple_starting_black_moves_are_handicap = false;
        self.white_has_moved = false;
        self.presumed_next_move_pla = pla;

        self.consecutive_ending_passes = 0;
        self.hashes_before_black_pass.clear();
        self.hashes_before_white_pass.clear();

        self.encore_phase = encore_phase;
        self.num_turns_this_phase = 0;
        self.ko_recap_blocked = [false; MAX_ARR_SIZE];
        self.ko_recap_block_hash = Hash128::ZERO;
        self.ko_captures_in_encore.clear();
        self.second_encore_start_colors = if encore_phase >= 2 {
            board.colors
        } else {
            [Color::Empty; MAX_ARR_SIZE]
        };

        self.white_bonus_score = 0.0;
        self.has_button = rules.has_button && encore_phase == 0;

        self.super_ko_banned = [false; MAX_ARR_SIZE];
        self.was_ever_occupied_or_played = [false; MAX_ARR_SIZE];
        for loc in board.locs() {
            self.was_ever_occupied_or_played[loc] = board.colors[loc] != Color::Empty;
        }

        self.is_game_finished = false;
        self.winner = Color::Empty;
        self.final_white_minus_black_score = 0.0;
        self.is_scored = false;
        self.is_no_result = false;
        self.is_resignation = false;

        self.white_handicap_bonus_score = self.compute_white_handicap_bonus();
        let hash = self.get_ko_hash(board, pla);
        self.ko_hash_history.push(hash);
    }

    pub fn set_initial_turn_number(&mut self, n: usize) {
        self.initial_turn_number = n;
    }

    pub fn set_assume_multiple_starting_black_moves_are_handicap(&mut self, assume: bool) {
        self.assume_multiple_starting_black_moves_are_handicap = assume;
        self.white_handicap_bonus_score = self.compute_white_handicap_bonus();
    }

    pub fn set_komi(&mut self, komi: f32) {
        self.rules.komi = komi;
    }

    pub fn get_current_turn_number(&self) -> usize {
        self.initial_turn_number + self.move_history.len()
    }

    /// The phase whose end also ends the game.
    pub fn is_final_phase(&self) -> bool {
        self.rules.scoring == ScoringRule::Area || self.encore_phase >= 2
    }

    /// Ko hash of `board` with `pla` to move under the current phase.
    pub fn get_ko_hash(&self, board: &Board, pla: Player) -> Hash128 {
        ko_hash(&self.rules, board, pla, self.encore_phase, self.ko_recap_block_hash)
    }

    /// White's komi plus all bonuses, seen from `pla`.
    pub fn current_self_komi(&self, pla: Player) -> f32 {
        let white_komi = self.white_bonus_score + self.white_handicap_bonus_score + self.rules.komi;
        if pla == Color::White { white_komi } else { -white_komi }
    }

    // =========================================================================
    // Repetition
    // =========================================================================

    /// Whether `hash` occurs in the active window, using `root_ko_hash_table`
    /// for the prefix it covers when it was built from this window.
    pub fn ko_hash_occurs_in_history(&self, hash: Hash128, root_ko_hash_table: Option<&KoHashTable>) -> bool {
        let mut start = self.first_turn_idx_with_ko_history;
        if let Some(table) = root_ko_hash_table
            && table.first_turn_idx_with_ko_history == self.first_turn_idx_with_ko_history
        {
            if table.contains_hash(hash) {
                return true;
            }
            start += table.size();
        }
        self.ko_hash_history.iter().skip(start).any(|&h| h == hash)
    }

    pub fn number_of_ko_hash_occurrences_in_history(
        &self,
        hash: Hash128,
        root_ko_hash_table: Option<&KoHashTable>,
    ) -> usize {
        let mut start = self.first_turn_idx_with_ko_history;
        let mut count = 0;
        if let Some(table) = root_ko_hash_table
            && table.first_turn_idx_with_ko_history == self.first_turn_idx_with_ko_history
        {
            count += table.number_of_occurrences_of_hash(hash);
            start += table.size();
        }
        count + self.ko_hash_history.iter().skip(start).filter(|&&h| h == hash).count()
    }

    fn phase_has_spightlike_ending_and_pass_history_clearing(&self) -> bool {
        self.encore_phase > 0 || self.rules.ko == KoRule::Simple || self.rules.ko == KoRule::Spight
    }

    fn new_consecutive_ending_passes_after_pass(&self) -> u32 {
        if self.has_button { 0 } else { self.consecutive_ending_passes + 1 }
    }

    /// A pass that repeats the position from before an earlier pass by the
    /// same player ends the phase under spight-like rules.
    fn would_be_spightlike_ending_pass(&self, pla: Player, ko_hash_before_pass: Hash128) -> bool {
        if !self.phase_has_spightlike_ending_and_pass_history_clearing() || self.has_button {
            return false;
        }
        let hashes = match pla {
            Color::Black => &self.hashes_before_black_pass,
            _ => &self.hashes_before_white_pass,
        };
        hashes.contains(&ko_hash_before_pass)
    }

    pub fn pass_would_end_phase(&self, board: &Board, pla: Player) -> bool {
        let ko_hash_before = self.get_ko_hash(board, pla);
        self.new_consecutive_ending_passes_after_pass() >= 2
            || self.would_be_spightlike_ending_pass(pla, ko_hash_before)
    }

    pub fn pass_would_end_game(&self, board: &Board, pla: Player) -> bool {
        self.pass_would_end_phase(board, pla) && self.is_final_phase()
    }

    fn set_ko_recap_blocked(&mut self, loc: Loc, blocked: bool) {
        if self.ko_recap_blocked[loc] != blocked {
            self.ko_recap_blocked[loc] = blocked;
            self.ko_recap_block_hash ^= self.initial_board.zobrist().ko_mark[loc];
        }
    }

    // =========================================================================
    // Legality
    // =========================================================================

    /// In the encore, touching a recapture-blocked ko (either the blocked
    /// stone or the point that would retake it) is a pass-for-ko.
    fn is_pass_for_ko(&self, board: &Board, loc: Loc, pla: Player) -> bool {
        if self.encore_phase == 0 || loc == PASS_LOC || loc >= MAX_ARR_SIZE {
            return false;
        }
        let opp = pla.opp();
        if board.colors[loc] == opp
            && self.ko_recap_blocked[loc]
            && board.get_chain_size(loc) == 1
            && board.get_num_liberties(loc) == 1
        {
            return true;
        }
        let ko_capture_loc = board.get_ko_capture_loc(loc, pla);
        ko_capture_loc != NULL_LOC && self.ko_recap_blocked[ko_capture_loc] && board.colors[ko_capture_loc] == opp
    }

    /// Full legality: simple ko, suicide rule, superko and encore ko rules.
    pub fn is_legal(&self, board: &Board, loc: Loc, pla: Player) -> bool {
        if self.encore_phase > 0 {
            if self.is_pass_for_ko(board, loc, pla) {
                return true;
            }
        } else if board.is_ko_banned(loc) {
            return false;
        }
        if !board.is_legal_ignoring_ko(loc, pla, self.rules.multi_stone_suicide_legal) {
            return false;
        }
        !(loc < MAX_ARR_SIZE && self.super_ko_banned[loc])
    }

    /// Legality for moves coming from outside, such as game records: ignores
    /// superko and allows suicide whatever the rules say.
    pub fn is_legal_tolerant(&self, board: &Board, loc: Loc, pla: Player) -> bool {
        if self.is_pass_for_ko(board, loc, pla) {
            return true;
        }
        if self.encore_phase == 0 && board.is_ko_banned(loc) {
            return false;
        }
        board.is_legal_ignoring_ko(loc, pla, true)
    }

    fn classify_illegal(&self, board: &Board, loc: Loc, pla: Player) -> MoveError {
        if !pla.is_player() {
            MoveError::WrongPlayer
        } else if !board.is_on_board(loc) {
            MoveError::OffBoard
        } else if board.colors[loc] != Color::Empty {
            MoveError::Occupied
        } else if self.encore_phase == 0 && board.is_ko_banned(loc) {
            MoveError::Ko
        } else if board.is_illegal_suicide(loc, pla, self.rules.multi_stone_suicide_legal) {
            MoveError::Suicide
        } else if self.encore_phase > 0 {
            MoveError::Ko
        } else {
            MoveError::Superko
        }
    }

    /// Checked tier: verify a move against the full game state.
    pub fn verify_move(&self, board: &Board, loc: Loc, pla: Player) -> Result<VerifiedMove, MoveError> {
        if self.is_game_finished {
            return Err(MoveError::GameOver);
        }
        if !pla.is_player() {
            return Err(MoveError::WrongPlayer);
        }
        if !self.is_legal(board, loc, pla) {
            return Err(self.classify_illegal(board, loc, pla));
        }
        Ok(VerifiedMove {
            loc,
            pla,
            turn_idx: self.move_history.len(),
        })
    }

    /// Play a move previously accepted by [`BoardHistory::verify_move`] on
    /// this history and board.
    pub fn make_verified_move(
        &mut self,
        board: &mut Board,
        mv: VerifiedMove,
        root_ko_hash_table: Option<&KoHashTable>,
    ) {
        debug_assert_eq!(mv.turn_idx, self.move_history.len(), "verified move is stale");
        self.make_board_move_assume_legal(board, mv.loc, mv.pla, root_ko_hash_table);
    }

    /// Play a move that passes [`BoardHistory::is_legal_tolerant`], or
    /// report why it does not.
    pub fn make_board_move_tolerant(
        &mut self,
        board: &mut Board,
        loc: Loc,
        pla: Player,
        root_ko_hash_table: Option<&KoHashTable>,
    ) -> Result<(), MoveError> {
        if !pla.is_player() {
            return Err(MoveError::WrongPlayer);
        }
        if !self.is_legal_tolerant(board, loc, pla) {
            return Err(self.classify_illegal(board, loc, pla));
        }
        self.make_board_move_assume_legal(board, loc, pla, root_ko_hash_table);
        Ok(())
    }

    // =========================================================================
    // Moves
    // =========================================================================

    /// Apply a move to `board` and record it, updating bans, bonuses, phase
    /// and game end.
    ///
    /// No legality check is performed. The move must satisfy
    /// [`BoardHistory::is_legal`] (or [`BoardHistory::is_legal_tolerant`]);
    /// anything else silently corrupts both the board and the history.
    pub fn make_board_move_assume_legal(
        &mut self,
        board: &mut Board,
        loc: Loc,
        pla: Player,
        root_ko_hash_table: Option<&KoHashTable>,
    ) {
        let pos_hash_before_move = board.pos_hash;

        // Moving after the game ended just continues the game.
        self.is_game_finished = false;
        self.winner = Color::Empty;
        self.final_white_minus_black_score = 0.0;
        self.is_scored = false;
        self.is_no_result = false;
        self.is_resignation = false;

        let mut is_spightlike_ending_pass = false;
        let mut restart_ko_window = false;
        if loc != PASS_LOC {
            self.consecutive_ending_passes = 0;
        } else if self.has_button {
            self.has_button = false;
            self.white_bonus_score += if pla == Color::White { 0.5 } else { -0.5 };
            self.consecutive_ending_passes = 0;
            self.hashes_before_black_pass.clear();
            self.hashes_before_white_pass.clear();
            restart_ko_window = true;
        } else {
            // Passes lift spight ko bans and restart cycle detection, but a
            // pass repeating a position from before an earlier pass by the
            // same player still ends the phase.
            restart_ko_window = self.phase_has_spightlike_ending_and_pass_history_clearing();
            let ko_hash_before = self.get_ko_hash(board, pla);
            self.consecutive_ending_passes = self.new_consecutive_ending_passes_after_pass();
            is_spightlike_ending_pass = self.would_be_spightlike_ending_pass(pla, ko_hash_before);
            match pla {
                Color::Black => self.hashes_before_black_pass.push(ko_hash_before),
                _ => self.hashes_before_white_pass.push(ko_hash_before),
            }
        }

        let was_pass_for_ko = self.encore_phase > 0 && loc != PASS_LOC && self.lift_ko_recap_block(board, loc, pla);
        if !was_pass_for_ko {
            board.play_move_assume_legal(loc, pla);
            if self.encore_phase > 0 {
                if board.ko_loc != NULL_LOC {
                    self.set_ko_recap_blocked(loc, true);
                    self.ko_captures_in_encore.push(EncoreKoCapture {
                        pos_hash_before_move,
                        move_loc: loc,
                        move_pla: pla,
                    });
                    // The recapture block now carries the ko.
                    board.clear_simple_ko_loc();
                }
                for l in board.locs() {
                    if board.colors[l] == Color::Empty && self.ko_recap_blocked[l] {
                        self.set_ko_recap_blocked(l, false);
                    }
                }
            }
        }

        let hash_after = self.get_ko_hash(board, pla.opp());
        self.ko_hash_history.push(hash_after);
        self.move_history.push(Move::new(loc, pla));
        if restart_ko_window {
            self.first_turn_idx_with_ko_history = self.move_history.len();
        }
        self.num_turns_this_phase += 1;
        self.presumed_next_move_pla = pla.opp();
        if loc != PASS_LOC {
            self.was_ever_occupied_or_played[loc] = true;
        }

        self.update_super_ko_bans(board, pla.opp(), root_ko_hash_table);

        // Territory scoring charges a point per stone played in the first two phases.
        if self.rules.scoring == ScoringRule::Territory && self.encore_phase <= 1 && loc != PASS_LOC && !was_pass_for_ko {
            self.white_bonus_score += if pla == Color::Black { 1.0 } else { -1.0 };
        }

        if pla == Color::White && loc != PASS_LOC {
            self.white_has_moved = true;
        }
        if self.assume_multiple_starting_black_moves_are_handicap
            && !self.white_has_moved
            && pla == Color::Black
            && self.rules.white_handicap_bonus_rule != WhiteHandicapBonusRule::Zero
        {
            self.white_handicap_bonus_score = self.compute_white_handicap_bonus();
        }

        if self.consecutive_ending_passes >= 2 || is_spightlike_ending_pass {
            if self.is_final_phase() {
                self.end_and_score_game_now(board);
            } else {
                self.advance_encore_phase(board, pla.opp());
            }
        }

        if loc != PASS_LOC && (self.encore_phase > 0 || self.rules.ko == KoRule::Simple) {
            let last = self.ko_hash_history[self.ko_hash_history.len() - 1];
            if self.number_of_ko_hash_occurrences_in_history(last, root_ko_hash_table) >= NO_RESULT_REPETITIONS {
                debug!(
                    "position repeated {NO_RESULT_REPETITIONS} times at turn {}, no result",
                    self.get_current_turn_number()
                );
                self.is_no_result = true;
                self.is_game_finished = true;
            }
        }
    }

    /// Handle a pass-for-ko, returning whether the move was one.
    fn lift_ko_recap_block(&mut self, board: &mut Board, loc: Loc, pla: Player) -> bool {
        let opp = pla.opp();
        let blocked = if board.colors[loc] == opp && self.ko_recap_blocked[loc] {
            loc
        } else {
            let ko_capture_loc = board.get_ko_capture_loc(loc, pla);
            if ko_capture_loc != NULL_LOC && self.ko_recap_blocked[ko_capture_loc] && board.colors[ko_capture_loc] == opp {
                ko_capture_loc
            } else {
                return false;
            }
        };
        self.set_ko_recap_blocked(blocked, false);
        // The board sees the same player move twice, so no simple ko survives.
        board.clear_simple_ko_loc();
        true
    }

    fn update_super_ko_bans(&mut self, board: &Board, next_pla: Player, root_ko_hash_table: Option<&KoHashTable>) {
        if self.encore_phase == 0 && self.rules.ko != KoRule::Simple {
            let msl = self.rules.multi_stone_suicide_legal;
            for loc in board.locs() {
                let banned = if board.colors[loc] != Color::Empty
                    || board.is_illegal_suicide(loc, next_pla, msl)
                    || loc == board.ko_loc
                {
                    false
                } else if !self.was_ever_occupied_or_played[loc] && !board.is_suicide(loc, next_pla) {
                    // A new stone on a never-used point cannot recreate a position.
                    false
                } else {
                    let pos_hash = board.get_pos_hash_after_move(loc, next_pla);
                    let hash = ko_hash_after_move_non_encore(&self.rules, board, pos_hash, next_pla.opp());
                    self.ko_hash_occurs_in_history(hash, root_ko_hash_table)
                };
                self.super_ko_banned[loc] = banned;
            }
        } else if self.encore_phase > 0 {
            self.super_ko_banned = [false; MAX_ARR_SIZE];
            for capture in &self.ko_captures_in_encore {
                if capture.pos_hash_before_move == board.pos_hash && capture.move_pla == next_pla {
                    self.super_ko_banned[capture.move_loc] = true;
                }
            }
        }
    }

    fn advance_encore_phase(&mut self, board: &Board, next_pla: Player) {
        self.encore_phase += 1;
        debug!(
            "entering encore phase {} at turn {}",
            self.encore_phase,
            self.get_current_turn_number()
        );
        self.num_turns_this_phase = 0;
        if self.encore_phase == 2 {
            self.second_encore_start_colors = board.colors;
        }
        self.super_ko_banned = [false; MAX_ARR_SIZE];
        self.consecutive_ending_passes = 0;
        self.hashes_before_black_pass.clear();
        self.hashes_before_white_pass.clear();
        self.ko_recap_blocked = [false; MAX_ARR_SIZE];
        self.ko_recap_block_hash = Hash128::ZERO;
        self.ko_captures_in_encore.clear();

        // The current position restarts the repetition window under the new phase's hash.
        let hash = self.get_ko_hash(board, next_pla);
        if let Some(last) = self.ko_hash_history.last_mut() {
            *last = hash;
        }
        self.first_turn_idx_with_ko_history = self.move_history.len();
    }

    // =========================================================================
    // Game end and scoring
    // =========================================================================

    fn set_final_score_and_winner(&mut self, score: f32) {
        self.final_white_minus_black_score = score;
        self.winner = if score > 0.0 {
            Color::White
        } else if score < 0.0 {
            Color::Black
        } else {
            Color::Empty
        };
    }

    pub fn set_winner_by_resignation(&mut self, pla: Player) {
        self.is_game_finished = true;
        self.is_scored = false;
        self.is_no_result = false;
        self.is_resignation = true;
        self.winner = pla;
        self.final_white_minus_black_score = 0.0;
    }

    fn count_area_score_white_minus_black(&self, board: &Board) -> (i32, AreaMap) {
        let msl = self.rules.multi_stone_suicide_legal;
        let mut score = 0;
        let area = match self.rules.tax {
            TaxRule::None => board.calculate_area(true, true, true, msl),
            TaxRule::Seki | TaxRule::All => {
                let (area, region_count) = board.calculate_independent_life_area(false, true, msl);
                if self.rules.tax == TaxRule::All {
                    score -= 2 * region_count;
                }
                area
            }
        };
        score += area_balance(board, &area);
        (score, area)
    }

    fn count_territory_area_score_white_minus_black(&self, board: &Board) -> (i32, AreaMap) {
        let msl = self.rules.multi_stone_suicide_legal;
        let keep_territories = self.rules.tax == TaxRule::None;
        let (area, region_count) = board.calculate_independent_life_area(keep_territories, true, msl);
        let mut score = area_balance(board, &area);
        if self.rules.tax == TaxRule::All {
            score -= 2 * region_count;
        }
        // Stones lost during the second encore count as prisoners.
        for loc in board.locs() {
            let start = self.second_encore_start_colors[loc];
            if start.is_player() && board.colors[loc] != start {
                score += if start == Color::Black { 1 } else { -1 };
            }
        }
        (score, area)
    }

    /// Score the board as it stands and finish the game. Returns the area
    /// map used for scoring.
    pub fn end_and_score_game_now(&mut self, board: &Board) -> AreaMap {
        let (board_score, area) = match self.rules.scoring {
            ScoringRule::Area => self.count_area_score_white_minus_black(board),
            ScoringRule::Territory => self.count_territory_area_score_white_minus_black(board),
        };
        if self.has_button {
            self.has_button = false;
            self.white_bonus_score += if self.presumed_next_move_pla == Color::White { 0.5 } else { -0.5 };
        }
        let score = board_score as f32 + self.white_bonus_score + self.white_handicap_bonus_score + self.rules.komi;
        self.set_final_score_and_winner(score);
        self.is_scored = true;
        self.is_no_result = false;
        self.is_resignation = false;
        self.is_game_finished = true;
        debug!(
            "game scored at turn {}: W{:+} ({})",
            self.get_current_turn_number(),
            score,
            self.winner.to_long_string()
        );
        area
    }

    /// End the game if every point is a pass-alive stone or inside
    /// pass-alive territory. Returns whether it ended.
    pub fn end_game_if_all_pass_alive(&mut self, board: &Board) -> bool {
        let area = board.calculate_area(false, true, false, self.rules.multi_stone_suicide_legal);
        if board.locs().any(|loc| area[loc] == Color::Empty) {
            return false;
        }
        self.end_and_score_game_now(board);
        true
    }

    // =========================================================================
    // Handicap
    // =========================================================================

    /// Black stones on an all-black initial board, plus black's opening
    /// moves before white's first move when those are assumed to be
    /// handicap placements. A single stone is not a handicap.
    pub fn compute_num_handicap_stones(&self) -> usize {
        let board = &self.initial_board;
        let mut num_black = 0;
        for loc in board.locs() {
            match board.colors[loc] {
                Color::White => return 0,
                Color::Black => num_black += 1,
                _ => {}
            }
        }
        if self.assume_multiple_starting_black_moves_are_handicap {
            for mv in &self.move_history {
                if mv.pla == Color::White {
                    break;
                }
                if mv.loc != PASS_LOC && mv.loc != NULL_LOC {
                    num_black += 1;
                }
            }
        }
        if num_black <= 1 { 0 } else { num_black }
    }

    pub fn compute_white_handicap_bonus(&self) -> f32 {
        let n = self.compute_num_handicap_stones() as f32;
        match self.rules.white_handicap_bonus_rule {
            WhiteHandicapBonusRule::Zero => 0.0,
            WhiteHandicapBonusRule::N => n,
            WhiteHandicapBonusRule::NMinusOne => (n - 1.0).max(0.0),
        }
    }

    // =========================================================================
    // Situation hash and printing
    // =========================================================================

    /// Hash of everything that determines the outcome from here with optimal
    /// play: position, player to move, phase, bans, komi and rules. Used as a
    /// cache key by evaluators and searches.
    pub fn get_situation_rules_and_ko_hash(
        board: &Board,
        hist: &BoardHistory,
        next_pla: Player,
        draw_equivalent_wins_for_white: f64,
    ) -> Hash128 {
        let z = board.zobrist();
        let mut hash = board.pos_hash ^ z.player[next_pla.idx()];
        hash ^= z.encore[hist.encore_phase.min(2) as usize];

        if hist.encore_phase == 0 {
            if board.ko_loc != NULL_LOC {
                hash ^= z.ko_loc[board.ko_loc];
            }
            for loc in board.locs() {
                if hist.super_ko_banned[loc] && loc != board.ko_loc {
                    hash ^= z.ko_loc[loc];
                }
            }
        } else {
            for loc in board.locs() {
                if hist.super_ko_banned[loc] {
                    hash ^= z.ko_loc[loc];
                }
            }
            hash ^= hist.ko_recap_block_hash;
            if hist.encore_phase >= 2 {
                for loc in board.locs() {
                    hash ^= z.second_encore_start[loc][hist.second_encore_start_colors[loc].idx()];
                }
            }
        }

        // Integer komi can be drawn, so the draw valuation matters there.
        let mut self_komi = hist.current_self_komi(next_pla);
        if self_komi.fract() == 0.0 {
            let draw_for_self = if next_pla == Color::White {
                draw_equivalent_wins_for_white
            } else {
                1.0 - draw_equivalent_wins_for_white
            };
            self_komi += (draw_for_self as f32 - 0.5) * 0.5;
        }
        let komi_discretized = (self_komi * 256.0) as i64;
        let komi_hash = murmur_mix(komi_discretized as u64);
        hash.hash0 ^= komi_hash;
        hash.hash1 ^= basic_lcong(komi_hash);

        hash ^= z.ko_rule[hist.rules.ko.idx()];
        hash ^= z.scoring_rule[hist.rules.scoring.idx()];
        hash ^= z.tax_rule[hist.rules.tax.idx()];
        if hist.rules.multi_stone_suicide_legal {
            hash ^= z.multi_stone_suicide;
        }
        if hist.has_button {
            hash ^= z.button;
        }
        hash
    }

    pub fn print_basic_info(&self, out: &mut impl fmt::Write, board: &Board) -> fmt::Result {
        board.print_board(out, NULL_LOC, Some(&self.move_history))?;
        writeln!(out, "Next player: {}", self.presumed_next_move_pla.to_long_string())?;
        if self.encore_phase > 0 {
            writeln!(out, "Encore phase {}", self.encore_phase)?;
        }
        writeln!(out, "Rules: {}", self.rules.to_json_string())?;
        writeln!(out, "B stones captured: {}", board.num_black_captures)?;
        writeln!(out, "W stones captured: {}", board.num_white_captures)
    }

    pub fn print_debug_info(&self, out: &mut impl fmt::Write, board: &Board) -> fmt::Result {
        writeln!(out, "{board}")?;
        writeln!(out, "Initial pla {}", self.initial_pla.to_long_string())?;
        writeln!(out, "Encore phase {}", self.encore_phase)?;
        writeln!(out, "Turns this phase {}", self.num_turns_this_phase)?;
        writeln!(out, "Rules {}", self.rules)?;
        writeln!(out, "Ko recap block hash {}", self.ko_recap_block_hash)?;
        writeln!(out, "White bonus score {}", self.white_bonus_score)?;
        writeln!(out, "White handicap bonus score {}", self.white_handicap_bonus_score)?;
        writeln!(out, "Has button {}", self.has_button)?;
        writeln!(out, "Presumed next pla {}", self.presumed_next_move_pla.to_long_string())?;
        writeln!(
            out,
            "Game result {} {} {} {} {} {}",
            self.is_game_finished,
            self.winner.to_long_string(),
            self.final_white_minus_black_score,
            self.is_scored,
            self.is_no_result,
            self.is_resignation
        )?;
        out.write_str("Last moves")?;
        for mv in &self.move_history {
            write!(out, " {}", location::to_string(mv.loc, board.x_size, board.y_size))?;
        }
        writeln!(out)
    }
}

/// White points minus black points in an area map.
fn area_balance(board: &Board, area: &AreaMap) -> i32 {
    board
        .locs()
        .map(|loc| match area[loc] {
            Color::White => 1,
            Color::Black => -1,
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIPLE_KO: &str = "
        . X O . . . X O .
        X O . O . X O . O
        . X O . . . X O .
        . . . . . . . . .
        . X O . . . . . .
        X . X O . . . . .
        . X O . . . . . .
        . . . . . . . . .
        . . . . . . . . .";

    /// Black takes, white takes, three times round: returns to the start.
    const TRIPLE_KO_CYCLE: [&str; 6] = ["C8", "B4", "H8", "B8", "C4", "G8"];

    fn setup(board_str: &str, rules: Rules) -> (Board, BoardHistory) {
        let board = Board::parse_board(9, 9, board_str).unwrap();
        let hist = BoardHistory::new(&board, Color::Black, rules, 0);
        (board, hist)
    }

    fn loc(s: &str) -> Loc {
        location::of_string(s, 9, 9).unwrap()
    }

    fn play(board: &mut Board, hist: &mut BoardHistory, s: &str) {
        let pla = hist.presumed_next_move_pla;
        let mv = hist.verify_move(board, loc(s), pla).unwrap();
        hist.make_verified_move(board, mv, None);
    }

    #[test]
    fn test_two_passes_end_area_game() {
        let (mut board, mut hist) = setup(&".........\n".repeat(9), Rules::tromp_taylor());
        assert!(!hist.pass_would_end_game(&board, Color::Black));
        play(&mut board, &mut hist, "pass");
        assert!(hist.pass_would_end_game(&board, Color::White));
        play(&mut board, &mut hist, "pass");
        assert!(hist.is_game_finished);
        assert!(hist.is_scored);
        assert!(!hist.is_resignation);
        assert_eq!(hist.final_white_minus_black_score, 7.5);
        assert_eq!(hist.winner, Color::White);
        assert_eq!(hist.ko_hash_history.len(), hist.move_history.len() + 1);
    }

    #[test]
    fn test_area_score_counts_stones_and_territory() {
        let mut board = Board::parse_board(5, 5, &". X O . .\n".repeat(5)).unwrap();
        let mut hist = BoardHistory::new(&board, Color::Black, Rules::chinese(), 0);
        for pla in [Color::Black, Color::White] {
            let mv = hist.verify_move(&board, PASS_LOC, pla).unwrap();
            hist.make_verified_move(&mut board, mv, None);
        }
        // Black owns two columns, white three.
        assert!(hist.is_scored);
        assert_eq!(hist.final_white_minus_black_score, 15.0 - 10.0 + 7.5);
    }

    #[test]
    fn test_triple_ko_cycle_is_no_result_under_simple_ko() {
        let (mut board, mut hist) = setup(TRIPLE_KO, Rules::chinese());
        for (i, mv) in TRIPLE_KO_CYCLE.iter().cycle().take(12).enumerate() {
            assert!(!hist.is_game_finished, "finished early at move {i}");
            play(&mut board, &mut hist, mv);
            board.check_consistency().unwrap();
        }
        assert!(hist.is_game_finished);
        assert!(hist.is_no_result);
        assert!(!hist.is_scored);
        assert_eq!(hist.winner, Color::Empty);
        assert_eq!(board.colors, hist.initial_board.colors);
    }

    #[test]
    fn test_triple_ko_cycle_is_banned_by_positional_superko() {
        let (mut board, mut hist) = setup(TRIPLE_KO, Rules::tromp_taylor());
        for mv in &TRIPLE_KO_CYCLE[..5] {
            play(&mut board, &mut hist, mv);
        }
        let g8 = loc("G8");
        assert!(board.is_legal(g8, Color::White, true));
        assert!(!hist.is_legal(&board, g8, Color::White));
        assert!(hist.super_ko_banned[g8]);
        assert_eq!(hist.verify_move(&board, g8, Color::White), Err(MoveError::Superko));
        assert!(hist.is_legal_tolerant(&board, g8, Color::White));
    }

    #[test]
    fn test_situational_superko_uses_root_table() {
        let (mut board, mut hist) = setup(TRIPLE_KO, Rules::aga());
        play(&mut board, &mut hist, "C8");
        let table = KoHashTable::new(&hist);
        for mv in &TRIPLE_KO_CYCLE[1..5] {
            let pla = hist.presumed_next_move_pla;
            let l = loc(mv);
            assert!(hist.is_legal(&board, l, pla));
            hist.make_board_move_assume_legal(&mut board, l, pla, Some(&table));
        }
        assert!(hist.super_ko_banned[loc("G8")]);
        let h = hist.ko_hash_history[0];
        assert_eq!(hist.number_of_ko_hash_occurrences_in_history(h, Some(&table)), 1);
        assert_eq!(hist.number_of_ko_hash_occurrences_in_history(h, None), 1);
    }

    #[test]
    fn test_simple_ko_ban() {
        let (mut board, mut hist) = setup(TRIPLE_KO, Rules::chinese());
        play(&mut board, &mut hist, "C8");
        assert_eq!(hist.verify_move(&board, loc("B8"), Color::White), Err(MoveError::Ko));
        assert_eq!(hist.verify_move(&board, loc("C9"), Color::White), Err(MoveError::Occupied));
        assert_eq!(hist.verify_move(&board, loc("H8"), Color::Empty), Err(MoveError::WrongPlayer));
    }

    #[test]
    fn test_territory_game_goes_through_encore() {
        let (mut board, mut hist) = setup(&".........\n".repeat(9), Rules::japanese());
        for phase in 0..3 {
            assert_eq!(hist.encore_phase, phase);
            assert!(!hist.is_game_finished);
            play(&mut board, &mut hist, "pass");
            play(&mut board, &mut hist, "pass");
        }
        assert!(hist.is_game_finished);
        assert!(hist.is_scored);
        assert_eq!(hist.final_white_minus_black_score, 6.5);
        assert_eq!(hist.ko_hash_history.len(), 7);
        assert_eq!(hist.first_turn_idx_with_ko_history, 6);
    }

    #[test]
    fn test_territory_chill() {
        let (mut board, mut hist) = setup(&".........\n".repeat(9), Rules::japanese());
        play(&mut board, &mut hist, "E5");
        assert_eq!(hist.white_bonus_score, 1.0);
        play(&mut board, &mut hist, "C3");
        assert_eq!(hist.white_bonus_score, 0.0);
        play(&mut board, &mut hist, "G7");
        assert_eq!(hist.white_bonus_score, 1.0);
    }

    #[test]
    fn test_encore_pass_for_ko() {
        let board = Board::parse_board(9, 9, TRIPLE_KO).unwrap();
        let mut hist = BoardHistory::new(&board, Color::Black, Rules::japanese(), 1);
        let mut board = board;
        play(&mut board, &mut hist, "C8");
        let c8 = loc("C8");
        let b8 = loc("B8");
        assert!(hist.ko_recap_blocked[c8]);
        assert_eq!(board.ko_loc, NULL_LOC);
        assert_ne!(hist.ko_recap_block_hash, Hash128::ZERO);

        assert!(hist.is_legal(&board, b8, Color::White));
        let before = board.pos_hash;
        play(&mut board, &mut hist, "B8");
        assert_eq!(board.pos_hash, before);
        assert_eq!(board.colors[c8], Color::Black);
        assert!(!hist.ko_recap_blocked[c8]);
        assert_eq!(hist.ko_recap_block_hash, Hash128::ZERO);
        // Only black's real move is charged.
        assert_eq!(hist.white_bonus_score, 1.0);
    }

    #[test]
    fn test_button_goes_to_first_passer() {
        let rules: Rules = "aga-button".parse().unwrap();
        let (mut board, mut hist) = setup(&".........\n".repeat(9), rules);
        assert!(hist.has_button);
        play(&mut board, &mut hist, "pass");
        assert!(!hist.has_button);
        assert_eq!(hist.white_bonus_score, -0.5);
        assert_eq!(hist.consecutive_ending_passes, 0);
        play(&mut board, &mut hist, "pass");
        assert!(!hist.is_game_finished);
        play(&mut board, &mut hist, "pass");
        assert!(hist.is_game_finished);
        assert_eq!(hist.final_white_minus_black_score, 7.0 - 0.5);
    }

    #[test]
    fn test_resignation() {
        let (_, mut hist) = setup(&".........\n".repeat(9), Rules::default());
        hist.set_winner_by_resignation(Color::White);
        assert!(hist.is_game_finished);
        assert!(hist.is_resignation);
        assert!(!hist.is_scored);
        assert_eq!(hist.winner, Color::White);
    }

    #[test]
    fn test_game_over_rejects_moves() {
        let (mut board, mut hist) = setup(&".........\n".repeat(9), Rules::default());
        play(&mut board, &mut hist, "pass");
        play(&mut board, &mut hist, "pass");
        assert_eq!(hist.verify_move(&board, loc("E5"), Color::Black), Err(MoveError::GameOver));
    }

    #[test]
    fn test_handicap_bonus() {
        let board = Board::parse_board(9, 9, &".........\n".repeat(9)).unwrap();
        let mut hist = BoardHistory::new(&board, Color::Black, Rules::chinese(), 0);
        hist.set_assume_multiple_starting_black_moves_are_handicap(true);
        let mut board = board;
        for s in ["C3", "G7", "C7"] {
            let l = loc(s);
            hist.make_board_move_assume_legal(&mut board, l, Color::Black, None);
        }
        assert_eq!(hist.compute_num_handicap_stones(), 3);
        assert_eq!(hist.white_handicap_bonus_score, 3.0);
        hist.make_board_move_assume_legal(&mut board, loc("G3"), Color::White, None);
        hist.make_board_move_assume_legal(&mut board, loc("E5"), Color::Black, None);
        assert_eq!(hist.white_handicap_bonus_score, 3.0);

        let mut aga = hist.clone();
        aga.rules = Rules::aga();
        assert_eq!(aga.compute_white_handicap_bonus(), 2.0);

        let with_white = Board::parse_board(9, 9, &format!("X.......O\n{}", ".........\n".repeat(8))).unwrap();
        let hist = BoardHistory::new(&with_white, Color::Black, Rules::chinese(), 0);
        assert_eq!(hist.compute_num_handicap_stones(), 0);
    }

    #[test]
    fn test_end_game_if_all_pass_alive() {
        let board = Board::parse_board(
            5,
            5,
            ". X . X .\nX X X X X\nO O O O O\n. O . O .\n. O . O .",
        )
        .unwrap();
        let mut hist = BoardHistory::new(&board, Color::Black, Rules::chinese(), 0);
        assert!(hist.end_game_if_all_pass_alive(&board));
        assert!(hist.is_scored);
        // Black: 7 stones and 3 eyes, white: 9 stones and 6 points.
        assert_eq!(hist.final_white_minus_black_score, 15.0 - 10.0 + 7.5);

        let open = Board::parse_board(5, 5, &".....\n".repeat(5)).unwrap();
        let mut hist = BoardHistory::new(&open, Color::Black, Rules::chinese(), 0);
        assert!(!hist.end_game_if_all_pass_alive(&open));
        assert!(!hist.is_game_finished);
    }

    #[test]
    fn test_situation_hash_depends_on_komi_and_rules() {
        let (board, hist) = setup(&".........\n".repeat(9), Rules::tromp_taylor());
        let base = BoardHistory::get_situation_rules_and_ko_hash(&board, &hist, Color::Black, 0.5);
        let mut other = hist.clone();
        other.set_komi(6.5);
        assert_ne!(base, BoardHistory::get_situation_rules_and_ko_hash(&board, &other, Color::Black, 0.5));
        let mut other = hist.clone();
        other.rules.ko = KoRule::Situational;
        assert_ne!(base, BoardHistory::get_situation_rules_and_ko_hash(&board, &other, Color::Black, 0.5));
        assert_ne!(base, BoardHistory::get_situation_rules_and_ko_hash(&board, &hist, Color::White, 0.5));
        assert_eq!(base, BoardHistory::get_situation_rules_and_ko_hash(&board, &hist.clone(), Color::Black, 0.5));
    }

    #[test]
    fn test_print_basic_info() {
        let (mut board, mut hist) = setup(&".........\n".repeat(9), Rules::default());
        play(&mut board, &mut hist, "E5");
        let mut out = String::new();
        hist.print_basic_info(&mut out, &board).unwrap();
        assert!(out.contains("Next player: White"));
        assert!(out.contains("B stones captured: 0"));
        let mut debug = String::new();
        hist.print_debug_info(&mut debug, &board).unwrap();
        assert!(debug.contains("Last moves E5"));
    }
}
