//! Mutable Go position with incremental chain and liberty tracking.
//!
//! Every stone belongs to a chain. A chain is identified by its head, an
//! arbitrary member whose `chain_data` entry holds the owner, size and
//! liberty count. Members are threaded through `next_in_chain` as a circular
//! singly-linked list, so merging two chains is a constant-time splice.
//!
//! The position hash is the XOR of one Zobrist term per stone plus the board
//! dimensions, and is kept up to date on every placement and removal.
//!
//! Two move APIs exist:
//! - [`Board::play_move`] checks legality first and reports why a move fails.
//! - [`Board::play_move_assume_legal`] and [`Board::play_move_recorded`] do no
//!   checking at all. Calling them on an illegal move silently corrupts the
//!   board. They are the search hot path and the caller must have verified
//!   the move with [`Board::is_legal`].

use std::fmt;

use crate::color::{Color, Player};
use crate::constants::{Loc, MAX_ARR_SIZE, MAX_LEN, MAX_PLAY_SIZE, NULL_LOC, PASS_LOC};
use crate::error::{BoardError, MoveError};
use crate::hash::{Hash128, ZobristTables, zobrist};
use crate::location;

/// Per-location ownership map produced by the area computations.
pub type AreaMap = [Color; MAX_ARR_SIZE];

/// Suicide marker stored in [`MoveRecord::cap_dirs`].
const CAP_DIRS_SUICIDE: u8 = 0x10;

/// Column letters for the coordinate header, skipping `I`.
const X_CHARS: &[u8; 25] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub loc: Loc,
    pub pla: Player,
}

impl Move {
    pub fn new(loc: Loc, pla: Player) -> Self {
        Move { loc, pla }
    }
}

/// Enough state to reverse one [`Board::play_move_recorded`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub pla: Player,
    pub loc: Loc,
    /// Simple ko point before the move.
    pub ko_loc: Loc,
    /// Bit `i` set when the chain in direction `i` was captured.
    /// `0x10` alone means the move was a suicide.
    pub cap_dirs: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ChainData {
    owner: Color,
    num_locs: usize,
    num_liberties: usize,
}

/// A Go board of fixed size.
#[derive(Clone)]
pub struct Board {
    pub x_size: usize,
    pub y_size: usize,
    /// Cell contents. Everything outside the playable rectangle is `Wall`.
    pub colors: [Color; MAX_ARR_SIZE],
    /// Point where an immediate single-stone recapture is forbidden, or `NULL_LOC`.
    pub ko_loc: Loc,
    /// Hash of stones and board size only. Excludes ko and player to move.
    pub pos_hash: Hash128,
    /// Black stones lost so far (captured or suicided).
    pub num_black_captures: u32,
    /// White stones lost so far (captured or suicided).
    pub num_white_captures: u32,
    /// Up, left, right, down, then the diagonals.
    pub adj_offsets: [isize; 8],
    chain_data: [ChainData; MAX_ARR_SIZE],
    chain_head: [Loc; MAX_ARR_SIZE],
    next_in_chain: [Loc; MAX_ARR_SIZE],
    zobrist: &'static ZobristTables,
}

impl Default for Board {
    fn default() -> Self {
        Self::with_tables(crate::constants::DEFAULT_SIZE, crate::constants::DEFAULT_SIZE, zobrist())
    }
}

impl Board {
    /// Create an empty board.
    pub fn new(x_size: usize, y_size: usize) -> Result<Self, BoardError> {
        if x_size > MAX_LEN || y_size > MAX_LEN {
            return Err(BoardError::InvalidSize { x_size, y_size });
        }
        Ok(Self::with_tables(x_size, y_size, zobrist()))
    }

    fn with_tables(x_size: usize, y_size: usize, zobrist: &'static ZobristTables) -> Self {
        let mut board = Board {
            x_size,
            y_size,
            colors: [Color::Wall; MAX_ARR_SIZE],
            ko_loc: NULL_LOC,
            pos_hash: Hash128::ZERO,
            num_black_captures: 0,
            num_white_captures: 0,
            adj_offsets: location::adjacent_offsets(x_size),
            chain_data: [ChainData::default(); MAX_ARR_SIZE],
            chain_head: [NULL_LOC; MAX_ARR_SIZE],
            next_in_chain: [NULL_LOC; MAX_ARR_SIZE],
            zobrist,
        };
        for y in 0..y_size {
            for x in 0..x_size {
                board.colors[location::get_loc(x, y, x_size)] = Color::Empty;
            }
        }
        board.pos_hash = zobrist.size_x[x_size] ^ zobrist.size_y[y_size];
        board
    }

    /// The Zobrist tables this board hashes with.
    pub fn zobrist(&self) -> &'static ZobristTables {
        self.zobrist
    }

    #[inline]
    fn adj(&self, loc: Loc, i: usize) -> Loc {
        loc.wrapping_add_signed(self.adj_offsets[i])
    }

    /// All playable locations in row-major order.
    pub fn locs(&self) -> impl Iterator<Item = Loc> + use<> {
        let (x_size, y_size) = (self.x_size, self.y_size);
        (0..y_size).flat_map(move |y| (0..x_size).map(move |x| location::get_loc(x, y, x_size)))
    }

    pub fn loc(&self, x: usize, y: usize) -> Loc {
        location::get_loc(x, y, self.x_size)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_on_board(&self, loc: Loc) -> bool {
        loc < MAX_ARR_SIZE && self.colors[loc] != Color::Wall
    }

    pub fn is_ko_banned(&self, loc: Loc) -> bool {
        self.ko_loc != NULL_LOC && loc == self.ko_loc
    }

    /// Stone count of the chain at `loc`. `loc` must hold a stone.
    pub fn get_chain_size(&self, loc: Loc) -> usize {
        self.chain_data[self.chain_head[loc]].num_locs
    }

    /// Liberty count of the chain at `loc`. `loc` must hold a stone.
    pub fn get_num_liberties(&self, loc: Loc) -> usize {
        self.chain_data[self.chain_head[loc]].num_liberties
    }

    /// Representative stone of the chain at `loc`.
    pub fn chain_head(&self, loc: Loc) -> Loc {
        self.chain_head[loc]
    }

    /// Every stone in the chain at `loc`, starting at `loc`.
    pub fn chain_locs(&self, loc: Loc) -> Vec<Loc> {
        let mut locs = Vec::with_capacity(self.get_chain_size(loc));
        let mut cur = loc;
        loop {
            locs.push(cur);
            cur = self.next_in_chain[cur];
            if cur == loc {
                break;
            }
        }
        locs
    }

    pub fn get_num_immediate_liberties(&self, loc: Loc) -> usize {
        (0..4)
            .filter(|&i| self.colors[self.adj(loc, i)] == Color::Empty)
            .count()
    }

    /// Whether placing `pla` at `loc` would leave its chain with no liberties.
    pub fn is_suicide(&self, loc: Loc, pla: Player) -> bool {
        if loc == PASS_LOC {
            return false;
        }
        let opp = pla.opp();
        for i in 0..4 {
            let adj = self.adj(loc, i);
            let c = self.colors[adj];
            if c == Color::Empty {
                return false;
            } else if c == pla {
                if self.get_num_liberties(adj) > 1 {
                    return false;
                }
            } else if c == opp && self.get_num_liberties(adj) == 1 {
                return false;
            }
        }
        true
    }

    /// Like [`Board::is_suicide`], but when multi-stone suicide is legal only
    /// a lone stone with no liberties counts.
    pub fn is_illegal_suicide(&self, loc: Loc, pla: Player, multi_stone_suicide_legal: bool) -> bool {
        let opp = pla.opp();
        for i in 0..4 {
            let adj = self.adj(loc, i);
            let c = self.colors[adj];
            if c == Color::Empty {
                return false;
            } else if c == pla {
                if multi_stone_suicide_legal || self.get_num_liberties(adj) > 1 {
                    return false;
                }
            } else if c == opp && self.get_num_liberties(adj) == 1 {
                return false;
            }
        }
        true
    }

    pub fn is_legal(&self, loc: Loc, pla: Player, multi_stone_suicide_legal: bool) -> bool {
        if !pla.is_player() {
            return false;
        }
        loc == PASS_LOC
            || (loc < MAX_ARR_SIZE
                && self.colors[loc] == Color::Empty
                && !self.is_ko_banned(loc)
                && !self.is_illegal_suicide(loc, pla, multi_stone_suicide_legal))
    }

    pub fn is_legal_ignoring_ko(&self, loc: Loc, pla: Player, multi_stone_suicide_legal: bool) -> bool {
        if !pla.is_player() {
            return false;
        }
        loc == PASS_LOC
            || (loc < MAX_ARR_SIZE
                && self.colors[loc] == Color::Empty
                && !self.is_illegal_suicide(loc, pla, multi_stone_suicide_legal))
    }

    /// Classify why a move is illegal.
    pub fn check_move(&self, loc: Loc, pla: Player, multi_stone_suicide_legal: bool) -> Result<(), MoveError> {
        if !pla.is_player() {
            return Err(MoveError::WrongPlayer);
        }
        if loc == PASS_LOC {
            return Ok(());
        }
        if !self.is_on_board(loc) {
            return Err(MoveError::OffBoard);
        }
        if self.colors[loc] != Color::Empty {
            return Err(MoveError::Occupied);
        }
        if self.is_ko_banned(loc) {
            return Err(MoveError::Ko);
        }
        if self.is_illegal_suicide(loc, pla, multi_stone_suicide_legal) {
            return Err(MoveError::Suicide);
        }
        Ok(())
    }

    pub fn is_adjacent_to_pla(&self, loc: Loc, pla: Player) -> bool {
        (0..4).any(|i| self.colors[self.adj(loc, i)] == pla)
    }

    pub fn is_adjacent_or_diagonal_to_pla(&self, loc: Loc, pla: Player) -> bool {
        (0..8).any(|i| self.colors[self.adj(loc, i)] == pla)
    }

    /// Whether `loc` touches the chain containing the stone at `chain`.
    pub fn is_adjacent_to_chain(&self, loc: Loc, chain: Loc) -> bool {
        let pla = self.colors[chain];
        let head = self.chain_head[chain];
        (0..4).any(|i| {
            let adj = self.adj(loc, i);
            self.colors[adj] == pla && self.chain_head[adj] == head
        })
    }

    /// Eye test for `pla`: every neighbor is own stone or wall, and at most
    /// one diagonal is an opponent stone (none against the edge).
    pub fn is_simple_eye(&self, loc: Loc, pla: Player) -> bool {
        if self.colors[loc] != Color::Empty {
            return false;
        }
        for i in 0..4 {
            let c = self.colors[self.adj(loc, i)];
            if c != pla && c != Color::Wall {
                return false;
            }
        }
        let opp = pla.opp();
        let mut against_wall = false;
        let mut opp_corners = 0;
        for i in 4..8 {
            let c = self.colors[self.adj(loc, i)];
            if c == opp {
                opp_corners += 1;
            } else if c == Color::Wall {
                against_wall = true;
            }
        }
        !(opp_corners >= 2 || (against_wall && opp_corners >= 1))
    }

    pub fn would_be_capture(&self, loc: Loc, pla: Player) -> bool {
        if self.colors[loc] != Color::Empty {
            return false;
        }
        let opp = pla.opp();
        (0..4).any(|i| {
            let adj = self.adj(loc, i);
            self.colors[adj] == opp && self.get_num_liberties(adj) == 1
        })
    }

    /// If playing `loc` would capture exactly one lone stone while `loc`
    /// itself is surrounded by opponent stones, the location of that stone.
    pub fn get_ko_capture_loc(&self, loc: Loc, pla: Player) -> Loc {
        if loc == PASS_LOC || self.colors[loc] != Color::Empty {
            return NULL_LOC;
        }
        let opp = pla.opp();
        let mut capturable = NULL_LOC;
        for i in 0..4 {
            let adj = self.adj(loc, i);
            let c = self.colors[adj];
            if c != Color::Wall && c != opp {
                return NULL_LOC;
            }
            if c == opp && self.get_num_liberties(adj) == 1 {
                if capturable != NULL_LOC {
                    return NULL_LOC;
                }
                capturable = adj;
            }
        }
        if capturable == NULL_LOC || self.get_chain_size(capturable) != 1 {
            return NULL_LOC;
        }
        capturable
    }

    pub fn would_be_ko_capture(&self, loc: Loc, pla: Player) -> bool {
        self.get_ko_capture_loc(loc, pla) != NULL_LOC
    }

    pub fn is_empty(&self) -> bool {
        self.locs().all(|loc| self.colors[loc] == Color::Empty)
    }

    pub fn num_stones_on_board(&self) -> usize {
        self.locs().filter(|&loc| self.colors[loc].is_player()).count()
    }

    pub fn num_pla_stones_on_board(&self, pla: Player) -> usize {
        self.locs().filter(|&loc| self.colors[loc] == pla).count()
    }

    /// Distinct liberties of the chain at `loc`.
    pub fn find_liberties(&self, loc: Loc) -> Vec<Loc> {
        let mut seen = [false; MAX_ARR_SIZE];
        let mut libs = Vec::new();
        let mut cur = loc;
        loop {
            for i in 0..4 {
                let adj = self.adj(cur, i);
                if self.colors[adj] == Color::Empty && !seen[adj] {
                    seen[adj] = true;
                    libs.push(adj);
                }
            }
            cur = self.next_in_chain[cur];
            if cur == loc {
                break;
            }
        }
        libs
    }

    fn count_chain_liberties(&self, loc: Loc) -> usize {
        let mut seen = [false; MAX_ARR_SIZE];
        let mut count = 0;
        let mut cur = loc;
        loop {
            for i in 0..4 {
                let adj = self.adj(cur, i);
                if self.colors[adj] == Color::Empty && !seen[adj] {
                    seen[adj] = true;
                    count += 1;
                }
            }
            cur = self.next_in_chain[cur];
            if cur == loc {
                break;
            }
        }
        count
    }

    /// Whether empty `loc` is adjacent to the chain headed by `head`.
    fn is_liberty_of(&self, loc: Loc, head: Loc) -> bool {
        let owner = self.colors[head];
        (0..4).any(|i| {
            let adj = self.adj(loc, i);
            self.colors[adj] == owner && self.chain_head[adj] == head
        })
    }

    /// Cheap `(lower, upper)` bounds on the liberties of the chain formed by
    /// playing `pla` at `loc`.
    pub fn get_bound_num_liberties_after_play(&self, loc: Loc, pla: Player) -> (usize, usize) {
        let opp = pla.opp();
        let mut num_immediate_libs = 0;
        let mut num_caps = 0;
        let mut potential_libs_from_caps = 0;
        let mut num_connection_libs = 0;
        let mut max_connection_libs = 0;

        for i in 0..4 {
            let adj = self.adj(loc, i);
            let c = self.colors[adj];
            if c == Color::Empty {
                num_immediate_libs += 1;
            } else if c == opp {
                if self.get_num_liberties(adj) == 1 {
                    num_caps += 1;
                    potential_libs_from_caps += self.get_chain_size(adj);
                }
            } else if c == pla {
                let conn_libs = self.get_num_liberties(adj) - 1;
                num_connection_libs += conn_libs;
                max_connection_libs = max_connection_libs.max(conn_libs);
            }
        }

        let lower = num_caps + max_connection_libs.max(num_immediate_libs);
        let upper = num_immediate_libs + potential_libs_from_caps + num_connection_libs;
        (lower, upper)
    }

    /// Exact liberties of the chain formed by playing `pla` at `loc`,
    /// stopping early at `max`.
    pub fn get_num_liberties_after_play(&self, loc: Loc, pla: Player, max: usize) -> usize {
        let opp = pla.opp();
        let mut libs: Vec<Loc> = Vec::with_capacity(8);
        let mut captured_heads: [Loc; 4] = [NULL_LOC; 4];
        let mut num_captured = 0;

        for i in 0..4 {
            let adj = self.adj(loc, i);
            let c = self.colors[adj];
            if c == Color::Empty {
                libs.push(adj);
                if libs.len() >= max {
                    return max;
                }
            } else if c == opp && self.get_num_liberties(adj) == 1 {
                libs.push(adj);
                if libs.len() >= max {
                    return max;
                }
                let head = self.chain_head[adj];
                if !captured_heads[..num_captured].contains(&head) {
                    captured_heads[num_captured] = head;
                    num_captured += 1;
                }
            }
        }

        let would_be_empty = |lc: Loc| {
            let c = self.colors[lc];
            c == Color::Empty || (c == opp && captured_heads[..num_captured].contains(&self.chain_head[lc]))
        };

        let mut connecting_heads: [Loc; 4] = [NULL_LOC; 4];
        let mut num_connecting = 0;
        for i in 0..4 {
            let adj = self.adj(loc, i);
            if self.colors[adj] != pla {
                continue;
            }
            let head = self.chain_head[adj];
            if connecting_heads[..num_connecting].contains(&head) {
                continue;
            }
            connecting_heads[num_connecting] = head;
            num_connecting += 1;

            let mut cur = adj;
            loop {
                for k in 0..4 {
                    let possible = self.adj(cur, k);
                    if possible != loc && would_be_empty(possible) && !libs.contains(&possible) {
                        libs.push(possible);
                        if libs.len() >= max {
                            return max;
                        }
                    }
                }
                cur = self.next_in_chain[cur];
                if cur == adj {
                    break;
                }
            }
        }
        libs.len()
    }

    /// Position hash after `pla` plays at `loc`, including captures and
    /// suicide. Does not modify the board.
    pub fn get_pos_hash_after_move(&self, loc: Loc, pla: Player) -> Hash128 {
        if loc == PASS_LOC {
            return self.pos_hash;
        }
        let z = self.zobrist;
        let opp = pla.opp();
        let mut hash = self.pos_hash ^ z.board[loc][pla.idx()];

        let mut seen: [Loc; 4] = [NULL_LOC; 4];
        let mut num_seen = 0;
        for i in 0..4 {
            let adj = self.adj(loc, i);
            if self.colors[adj] != opp || self.get_num_liberties(adj) != 1 {
                continue;
            }
            let head = self.chain_head[adj];
            if seen[..num_seen].contains(&head) {
                continue;
            }
            seen[num_seen] = head;
            num_seen += 1;
            let mut cur = adj;
            loop {
                hash ^= z.board[cur][opp.idx()];
                cur = self.next_in_chain[cur];
                if cur == adj {
                    break;
                }
            }
        }

        if num_seen == 0 && self.is_suicide(loc, pla) {
            hash ^= z.board[loc][pla.idx()];
            let mut own: [Loc; 4] = [NULL_LOC; 4];
            let mut num_own = 0;
            for i in 0..4 {
                let adj = self.adj(loc, i);
                if self.colors[adj] != pla {
                    continue;
                }
                let head = self.chain_head[adj];
                if own[..num_own].contains(&head) {
                    continue;
                }
                own[num_own] = head;
                num_own += 1;
                let mut cur = adj;
                loop {
                    hash ^= z.board[cur][pla.idx()];
                    cur = self.next_in_chain[cur];
                    if cur == adj {
                        break;
                    }
                }
            }
        }
        hash
    }

    /// Situation hash: position, player to move and simple ko point.
    pub fn get_sit_hash_with_simple_ko(&self, pla: Player) -> Hash128 {
        let mut h = self.pos_hash;
        if self.ko_loc != NULL_LOC {
            h ^= self.zobrist.ko_loc[self.ko_loc];
        }
        h ^ self.zobrist.player[pla.idx()]
    }

    pub fn clear_simple_ko_loc(&mut self) {
        self.ko_loc = NULL_LOC;
    }

    pub fn set_simple_ko_loc(&mut self, loc: Loc) {
        self.ko_loc = loc;
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Checked move. Returns why the move is illegal without touching the board.
    pub fn play_move(&mut self, loc: Loc, pla: Player, multi_stone_suicide_legal: bool) -> Result<(), MoveError> {
        self.check_move(loc, pla, multi_stone_suicide_legal)?;
        self.play_move_assume_legal(loc, pla);
        Ok(())
    }

    /// Place a stone directly, ignoring turn order. Setting `Empty` removes a
    /// stone. Clears the simple ko point. Returns false for off-board
    /// locations or non-stone colors.
    pub fn set_stone(&mut self, loc: Loc, color: Color) -> bool {
        if !self.is_on_board(loc) || color == Color::Wall {
            return false;
        }
        let current = self.colors[loc];
        if current == color {
        } else if current == Color::Empty {
            self.play_move_assume_legal(loc, color);
        } else if color == Color::Empty {
            self.remove_single_stone(loc);
        } else {
            self.remove_single_stone(loc);
            if !self.is_suicide(loc, color) {
                self.play_move_assume_legal(loc, color);
            }
        }
        self.ko_loc = NULL_LOC;
        true
    }

    /// Play a move and return the record needed to undo it.
    ///
    /// The move must be legal.
    pub fn play_move_recorded(&mut self, loc: Loc, pla: Player) -> MoveRecord {
        let ko_loc = self.ko_loc;
        let mut cap_dirs = 0u8;
        if loc != PASS_LOC {
            let opp = pla.opp();
            for i in 0..4 {
                let adj = self.adj(loc, i);
                if self.colors[adj] == opp && self.get_num_liberties(adj) == 1 {
                    cap_dirs |= 1 << i;
                }
            }
            if cap_dirs == 0 && self.is_suicide(loc, pla) {
                cap_dirs = CAP_DIRS_SUICIDE;
            }
        }
        self.play_move_assume_legal(loc, pla);
        MoveRecord { pla, loc, ko_loc, cap_dirs }
    }

    /// Reverse the most recent un-undone [`Board::play_move_recorded`].
    ///
    /// Records must be undone in exact reverse order. Chain heads and list
    /// order may differ afterwards, but colors, hash and capture counts match.
    pub fn undo(&mut self, record: MoveRecord) {
        self.ko_loc = record.ko_loc;
        let loc = record.loc;
        if loc == PASS_LOC {
            return;
        }
        let pla = record.pla;
        let opp = pla.opp();

        for i in 0..4 {
            let adj = self.adj(loc, i);
            if record.cap_dirs & (1 << i) != 0 && self.colors[adj] == Color::Empty {
                let num_uncaptured = self.add_chain(adj, opp);
                match pla {
                    Color::Black => self.num_white_captures -= num_uncaptured as u32,
                    _ => self.num_black_captures -= num_uncaptured as u32,
                }
            }
        }
        if record.cap_dirs == CAP_DIRS_SUICIDE {
            let num_unsuicided = self.add_chain(loc, pla);
            match pla {
                Color::Black => self.num_black_captures -= num_unsuicided as u32,
                _ => self.num_white_captures -= num_unsuicided as u32,
            }
        }

        self.pos_hash ^= self.zobrist.board[loc][self.colors[loc].idx()];
        self.colors[loc] = Color::Empty;
        self.change_surrounding_liberties(loc, opp, 1, true);

        if self.chain_data[self.chain_head[loc]].num_locs <= 1 {
            return;
        }

        let num_neighbors = (0..4).filter(|&i| self.colors[self.adj(loc, i)] == pla).count();
        if num_neighbors <= 1 {
            // Removing a stone with one friendly neighbor cannot split the chain.
            let mut head = self.chain_head[loc];
            if head == loc {
                let new_head = self.next_in_chain[loc];
                let mut cur = loc;
                loop {
                    self.chain_head[cur] = new_head;
                    cur = self.next_in_chain[cur];
                    if cur == loc {
                        break;
                    }
                }
                self.chain_data[new_head] = self.chain_data[head];
                head = new_head;
            }

            let mut cur = head;
            while self.next_in_chain[cur] != loc {
                cur = self.next_in_chain[cur];
            }
            self.next_in_chain[cur] = self.next_in_chain[loc];

            let mut lost = 0;
            for i in 0..4 {
                let adj = self.adj(loc, i);
                if self.colors[adj] == Color::Empty && !self.is_liberty_of(adj, head) {
                    lost += 1;
                }
            }
            let data = &mut self.chain_data[head];
            data.num_liberties = data.num_liberties + 1 - lost;
            data.num_locs -= 1;
        } else {
            let mut cur = loc;
            loop {
                self.chain_head[cur] = NULL_LOC;
                cur = self.next_in_chain[cur];
                if cur == loc {
                    break;
                }
            }
            for i in 0..4 {
                let adj = self.adj(loc, i);
                if self.colors[adj] == pla && self.chain_head[adj] == NULL_LOC {
                    self.rebuild_chain(adj, pla);
                }
            }
        }
    }

    /// Play a move with no legality check. The move must be legal.
    pub fn play_move_assume_legal(&mut self, loc: Loc, pla: Player) {
        if loc == PASS_LOC {
            self.ko_loc = NULL_LOC;
            return;
        }
        let opp = pla.opp();

        self.colors[loc] = pla;
        self.pos_hash ^= self.zobrist.board[loc][pla.idx()];
        self.chain_data[loc] = ChainData {
            owner: pla,
            num_locs: 1,
            num_liberties: self.get_num_immediate_liberties(loc),
        };
        self.chain_head[loc] = loc;
        self.next_in_chain[loc] = loc;

        let mut num_captured = 0;
        let mut possible_ko_loc = NULL_LOC;
        let mut opp_heads_seen: [Loc; 4] = [NULL_LOC; 4];
        let mut num_opps_seen = 0;

        for i in 0..4 {
            let adj = self.adj(loc, i);
            let c = self.colors[adj];
            if c == pla {
                if self.chain_head[adj] == self.chain_head[loc] {
                    continue;
                }
                self.chain_data[self.chain_head[adj]].num_liberties -= 1;
                self.merge_chains(adj, loc);
            } else if c == opp {
                let opp_head = self.chain_head[adj];
                if opp_heads_seen[..num_opps_seen].contains(&opp_head) {
                    continue;
                }
                opp_heads_seen[num_opps_seen] = opp_head;
                num_opps_seen += 1;
                self.chain_data[opp_head].num_liberties -= 1;
                if self.chain_data[opp_head].num_liberties == 0 {
                    num_captured += self.remove_chain(adj);
                    possible_ko_loc = adj;
                }
            }
        }

        let own = self.chain_data[self.chain_head[loc]];
        self.ko_loc = if num_captured == 1 && own.num_locs == 1 && own.num_liberties == 1 {
            possible_ko_loc
        } else {
            NULL_LOC
        };
        match pla {
            Color::Black => self.num_white_captures += num_captured as u32,
            _ => self.num_black_captures += num_captured as u32,
        }

        if self.get_num_liberties(loc) == 0 {
            let num_suicided = self.remove_chain(loc);
            match pla {
                Color::Black => self.num_black_captures += num_suicided as u32,
                _ => self.num_white_captures += num_suicided as u32,
            }
        }
    }

    /// Absorb the smaller of the two chains into the larger.
    fn merge_chains(&mut self, loc1: Loc, loc2: Loc) {
        let mut head1 = self.chain_head[loc1];
        let mut head2 = self.chain_head[loc2];
        if self.chain_data[head1].num_locs < self.chain_data[head2].num_locs {
            std::mem::swap(&mut head1, &mut head2);
        }

        self.chain_data[head1].num_locs += self.chain_data[head2].num_locs;

        // Heads are reassigned as we go, so a liberty shared between two
        // absorbed stones is only counted once.
        let mut new_libs = 0;
        let mut cur = head2;
        loop {
            for i in 0..4 {
                let adj = self.adj(cur, i);
                if self.colors[adj] == Color::Empty && !self.is_liberty_of(adj, head1) {
                    new_libs += 1;
                }
            }
            self.chain_head[cur] = head1;
            if self.next_in_chain[cur] == head2 {
                break;
            }
            cur = self.next_in_chain[cur];
        }
        self.chain_data[head1].num_liberties += new_libs;

        // head1 -> head2 -> ... -> last2 -> next1 -> ... -> head1
        self.next_in_chain[cur] = self.next_in_chain[head1];
        self.next_in_chain[head1] = head2;
    }

    /// Remove every stone of the chain at `loc`, returning how many.
    fn remove_chain(&mut self, loc: Loc) -> usize {
        let pla = self.colors[loc];
        let opp = pla.opp();
        let mut removed = 0;
        let mut cur = loc;
        loop {
            self.colors[cur] = Color::Empty;
            self.pos_hash ^= self.zobrist.board[cur][pla.idx()];
            removed += 1;
            self.change_surrounding_liberties(cur, opp, 1, true);
            cur = self.next_in_chain[cur];
            if cur == loc {
                break;
            }
        }
        removed
    }

    /// Refill the empty region containing `loc` with `pla` stones as one
    /// chain headed at `loc`. Returns the number of stones placed.
    ///
    /// Used to restore a chain removed by the move being undone, whose cells
    /// form a region enclosed by the capturing side.
    fn add_chain(&mut self, loc: Loc, pla: Player) -> usize {
        let opp = pla.opp();
        let mut stack = vec![loc];
        let mut count = 0;
        self.colors[loc] = pla;
        self.next_in_chain[loc] = loc;
        while let Some(cur) = stack.pop() {
            self.pos_hash ^= self.zobrist.board[cur][pla.idx()];
            self.chain_head[cur] = loc;
            if cur != loc {
                self.next_in_chain[cur] = self.next_in_chain[loc];
                self.next_in_chain[loc] = cur;
            }
            self.change_surrounding_liberties(cur, opp, 1, false);
            count += 1;
            for i in 0..4 {
                let adj = self.adj(cur, i);
                if self.colors[adj] == Color::Empty {
                    self.colors[adj] = pla;
                    stack.push(adj);
                }
            }
        }
        let num_liberties = self.count_chain_liberties(loc);
        self.chain_data[loc] = ChainData {
            owner: pla,
            num_locs: count,
            num_liberties,
        };
        count
    }

    /// Flood-fill the chain containing `loc` and make `loc` its head.
    fn rebuild_chain(&mut self, loc: Loc, pla: Player) {
        let mut stack = vec![loc];
        let mut count = 0;
        self.chain_head[loc] = loc;
        self.next_in_chain[loc] = loc;
        while let Some(cur) = stack.pop() {
            count += 1;
            if cur != loc {
                self.next_in_chain[cur] = self.next_in_chain[loc];
                self.next_in_chain[loc] = cur;
            }
            for i in 0..4 {
                let adj = self.adj(cur, i);
                if self.colors[adj] == pla && self.chain_head[adj] != loc {
                    self.chain_head[adj] = loc;
                    stack.push(adj);
                }
            }
        }
        let num_liberties = self.count_chain_liberties(loc);
        self.chain_data[loc] = ChainData {
            owner: pla,
            num_locs: count,
            num_liberties,
        };
    }

    /// Add (`increase`) or remove one liberty from each distinct `pla`
    /// chain adjacent to `loc`.
    fn change_surrounding_liberties(&mut self, loc: Loc, pla: Player, delta: usize, increase: bool) {
        let mut seen: [Loc; 4] = [NULL_LOC; 4];
        let mut num_seen = 0;
        for i in 0..4 {
            let adj = self.adj(loc, i);
            if self.colors[adj] != pla {
                continue;
            }
            let head = self.chain_head[adj];
            if seen[..num_seen].contains(&head) {
                continue;
            }
            seen[num_seen] = head;
            num_seen += 1;
            let libs = &mut self.chain_data[head].num_liberties;
            if increase {
                *libs += delta;
            } else {
                *libs -= delta;
            }
        }
    }

    /// Remove one stone, keeping the rest of its chain.
    fn remove_single_stone(&mut self, loc: Loc) {
        let pla = self.colors[loc];
        let locs = self.chain_locs(loc);
        self.remove_chain(loc);
        for other in locs {
            if other != loc {
                self.play_move_assume_legal(other, pla);
            }
        }
    }

    // =========================================================================
    // Area
    // =========================================================================

    /// Ownership map from Benson pass-alive analysis for both players.
    ///
    /// - `non_pass_alive_stones`: also mark stones that are not pass-alive.
    /// - `safe_big_territories`: mark empty regions bordered only by
    ///   pass-alive stones of one player.
    /// - `unsafe_big_territories`: mark empty regions bordered only by one
    ///   player, on cells nothing else has claimed.
    pub fn calculate_area(
        &self,
        non_pass_alive_stones: bool,
        safe_big_territories: bool,
        unsafe_big_territories: bool,
        multi_stone_suicide_legal: bool,
    ) -> AreaMap {
        let mut result = [Color::Empty; MAX_ARR_SIZE];
        for pla in [Color::Black, Color::White] {
            self.calculate_area_for_pla(
                pla,
                safe_big_territories,
                unsafe_big_territories,
                multi_stone_suicide_legal,
                &mut result,
            );
        }
        if non_pass_alive_stones {
            for loc in self.locs() {
                if result[loc] == Color::Empty {
                    result[loc] = self.colors[loc];
                }
            }
        }
        result
    }

    /// Area that is independently alive: regions touching dame or containing
    /// a stone in atari are treated as seki and left out. Also returns the
    /// number of white independent regions minus black ones.
    pub fn calculate_independent_life_area(
        &self,
        keep_territories: bool,
        keep_stones: bool,
        multi_stone_suicide_legal: bool,
    ) -> (AreaMap, i32) {
        let basic_area = self.calculate_area(true, true, true, multi_stone_suicide_legal);
        let mut result = [Color::Empty; MAX_ARR_SIZE];
        let region_count = self.independent_life_regions(&basic_area, &mut result);

        for loc in self.locs() {
            let owner = basic_area[loc];
            if owner == Color::Empty {
                continue;
            }
            if keep_territories && owner != self.colors[loc] {
                result[loc] = owner;
            }
            if keep_stones && owner == self.colors[loc] {
                result[loc] = owner;
            }
        }
        (result, region_count)
    }

    fn independent_life_regions(&self, basic_area: &AreaMap, result: &mut AreaMap) -> i32 {
        let mut is_seki = [false; MAX_ARR_SIZE];
        let mut queue: Vec<Loc> = Vec::new();

        for loc in self.locs() {
            let owner = basic_area[loc];
            if owner == Color::Empty || is_seki[loc] {
                continue;
            }
            let in_atari = self.colors[loc] == owner && self.get_num_liberties(loc) == 1;
            let touches_dame = (0..4).any(|i| {
                let adj = self.adj(loc, i);
                self.colors[adj] == Color::Empty && basic_area[adj] == Color::Empty
            });
            if !in_atari && !touches_dame {
                continue;
            }
            is_seki[loc] = true;
            queue.push(loc);
            while let Some(cur) = queue.pop() {
                for i in 0..4 {
                    let adj = self.adj(cur, i);
                    if basic_area[adj] == owner && !is_seki[adj] {
                        is_seki[adj] = true;
                        queue.push(adj);
                    }
                }
            }
        }

        let mut white_minus_black = 0;
        for loc in self.locs() {
            let owner = basic_area[loc];
            if owner == Color::Empty || is_seki[loc] || result[loc] == owner {
                continue;
            }
            white_minus_black += if owner == Color::White { 1 } else { -1 };
            result[loc] = owner;
            queue.push(loc);
            while let Some(cur) = queue.pop() {
                for i in 0..4 {
                    let adj = self.adj(cur, i);
                    if basic_area[adj] == owner && result[adj] != owner {
                        result[adj] = owner;
                        queue.push(adj);
                    }
                }
            }
        }
        white_minus_black
    }

    fn calculate_area_for_pla(
        &self,
        pla: Player,
        safe_big_territories: bool,
        unsafe_big_territories: bool,
        multi_stone_suicide_legal: bool,
        result: &mut AreaMap,
    ) {
        struct Region {
            locs: Vec<Loc>,
            vital_for: Vec<Loc>,
            num_internal_spaces_max2: u8,
            contains_opp: bool,
            borders_non_pass_alive: bool,
        }

        let opp = pla.opp();
        let is_adjacent_to_pla_head = |loc: Loc, head: Loc| {
            (0..4).any(|i| {
                let adj = self.adj(loc, i);
                self.colors[adj] == pla && self.chain_head[adj] == head
            })
        };

        // Maximal connected empty-or-opponent regions, seeded from empty cells.
        let mut region_idx_by_loc: Vec<Option<usize>> = vec![None; MAX_ARR_SIZE];
        let mut regions: Vec<Region> = Vec::new();
        let mut at_least_one_pla = false;

        for start in self.locs() {
            if region_idx_by_loc[start].is_some() {
                continue;
            }
            if self.colors[start] != Color::Empty {
                at_least_one_pla |= self.colors[start] == pla;
                continue;
            }
            let idx = regions.len();
            let mut region = Region {
                locs: Vec::new(),
                vital_for: Vec::new(),
                num_internal_spaces_max2: 0,
                contains_opp: false,
                borders_non_pass_alive: false,
            };
            for i in 0..4 {
                let adj = self.adj(start, i);
                if self.colors[adj] == pla {
                    let head = self.chain_head[adj];
                    if !region.vital_for.contains(&head) {
                        region.vital_for.push(head);
                    }
                }
            }

            let mut queue = std::collections::VecDeque::from([start]);
            region_idx_by_loc[start] = Some(idx);
            while let Some(loc) = queue.pop_front() {
                // Without multi-stone suicide, opponent stones inside the
                // region do not have to touch the chains it is vital for.
                if multi_stone_suicide_legal || self.colors[loc] == Color::Empty {
                    region.vital_for.retain(|&head| is_adjacent_to_pla_head(loc, head));
                }
                if region.num_internal_spaces_max2 < 2 && !self.is_adjacent_to_pla(loc, pla) {
                    region.num_internal_spaces_max2 += 1;
                }
                if self.colors[loc] == opp {
                    region.contains_opp = true;
                }
                region.locs.push(loc);

                for i in 0..4 {
                    let adj = self.adj(loc, i);
                    let c = self.colors[adj];
                    if (c == Color::Empty || c == opp) && region_idx_by_loc[adj].is_none() {
                        region_idx_by_loc[adj] = Some(idx);
                        queue.push_back(adj);
                    }
                }
            }
            regions.push(region);
        }

        let pla_heads: Vec<Loc> = self
            .locs()
            .filter(|&loc| self.colors[loc] == pla && self.chain_head[loc] == loc)
            .collect();
        let mut killed = vec![false; pla_heads.len()];
        let mut vital_count = vec![0u32; MAX_ARR_SIZE];

        // Benson iteration: a chain needs two vital regions that border no
        // dead chain.
        loop {
            for &head in &pla_heads {
                vital_count[head] = 0;
            }
            for region in regions.iter().filter(|r| !r.borders_non_pass_alive) {
                for &head in &region.vital_for {
                    vital_count[head] += 1;
                }
            }

            let mut killed_anything = false;
            for (i, &head) in pla_heads.iter().enumerate() {
                if killed[i] || vital_count[head] >= 2 {
                    continue;
                }
                killed[i] = true;
                killed_anything = true;
                let mut cur = head;
                loop {
                    for k in 0..4 {
                        let adj = self.adj(cur, k);
                        let c = self.colors[adj];
                        if c == Color::Empty || c == opp {
                            if let Some(idx) = region_idx_by_loc[adj] {
                                regions[idx].borders_non_pass_alive = true;
                            }
                        }
                    }
                    cur = self.next_in_chain[cur];
                    if cur == head {
                        break;
                    }
                }
            }
            if !killed_anything {
                break;
            }
        }

        for (i, &head) in pla_heads.iter().enumerate() {
            if killed[i] {
                continue;
            }
            let mut cur = head;
            loop {
                result[cur] = pla;
                cur = self.next_in_chain[cur];
                if cur == head {
                    break;
                }
            }
        }

        for region in &regions {
            let alive_border = at_least_one_pla && !region.borders_non_pass_alive;
            let should_mark = (region.num_internal_spaces_max2 <= 1 && alive_border)
                || (safe_big_territories && alive_border && !region.contains_opp);
            if should_mark {
                for &loc in &region.locs {
                    result[loc] = pla;
                }
            } else if unsafe_big_territories && at_least_one_pla && !region.contains_opp {
                // Do not overwrite the opponent's pass-alive territory.
                for &loc in &region.locs {
                    if result[loc] == Color::Empty {
                        result[loc] = pla;
                    }
                }
            }
        }
    }

    // =========================================================================
    // Self-audit
    // =========================================================================

    /// Verify every internal invariant, naming the first one that fails.
    pub fn check_consistency(&self) -> Result<(), BoardError> {
        let fail = |msg: &str| Err(BoardError::Inconsistent(msg.to_string()));
        let mut chain_loc_checked = [false; MAX_ARR_SIZE];

        let z = self.zobrist;
        let mut expected_hash = z.size_x[self.x_size] ^ z.size_y[self.y_size];
        for loc in 0..MAX_ARR_SIZE {
            if !location::is_in_rect(loc, self.x_size, self.y_size) {
                if self.colors[loc] != Color::Wall {
                    return fail("non-wall value outside of board legal area");
                }
                continue;
            }
            match self.colors[loc] {
                Color::Black | Color::White => {
                    if !chain_loc_checked[loc] {
                        self.check_chain_consistency(loc, &mut chain_loc_checked)?;
                    }
                    expected_hash ^= z.board[loc][self.colors[loc].idx()];
                }
                Color::Empty => {}
                Color::Wall => return fail("wall value within board legal area"),
            }
        }

        if self.pos_hash != expected_hash {
            return fail("pos hash does not match expected");
        }

        if self.ko_loc != NULL_LOC {
            if !location::is_in_rect(self.ko_loc, self.x_size, self.y_size) {
                return fail("invalid simple ko loc");
            }
            if self.get_num_immediate_liberties(self.ko_loc) != 0 {
                return fail("simple ko loc has immediate liberties");
            }
        }

        if location::adjacent_offsets(self.x_size) != self.adj_offsets {
            return fail("corrupted adj_offsets array");
        }
        Ok(())
    }

    fn check_chain_consistency(&self, loc: Loc, checked: &mut [bool; MAX_ARR_SIZE]) -> Result<(), BoardError> {
        let fail = |msg: &str| Err(BoardError::Inconsistent(msg.to_string()));
        let pla = self.colors[loc];
        let head = self.chain_head[loc];
        let mut cur = loc;
        let mut stone_count = 0;
        let mut pseudo_libs = 0;
        let mut found_head = false;
        loop {
            checked[cur] = true;
            if self.colors[cur] != pla {
                return fail("chain is not all the same color");
            }
            if self.chain_head[cur] != head {
                return fail("chain does not all have the same head");
            }
            stone_count += 1;
            pseudo_libs += self.get_num_immediate_liberties(cur);
            if cur == head {
                found_head = true;
            }
            if stone_count > MAX_PLAY_SIZE {
                return fail("chain exceeds size of board, broken circular list");
            }
            cur = self.next_in_chain[cur];
            if cur >= MAX_ARR_SIZE {
                return fail("chain location is outside of board bounds");
            }
            if cur == loc {
                break;
            }
        }

        if !found_head {
            return fail("chain loop does not contain head");
        }
        let data = &self.chain_data[head];
        if data.owner != pla {
            return fail("chain data owner does not match stones");
        }
        if data.num_locs != stone_count {
            return fail("chain data num_locs does not match actual stone count");
        }
        if data.num_liberties > pseudo_libs {
            return fail("chain data liberties exceeds pseudoliberties");
        }
        if data.num_liberties == 0 {
            return fail("chain data liberties is nonpositive");
        }
        if self.find_liberties(loc).len() != data.num_liberties {
            return fail("find_liberties found a different number of libs");
        }
        Ok(())
    }

    /// Compare the externally visible state of two boards after auditing both.
    pub fn is_equal_for_testing(
        &self,
        other: &Board,
        check_num_captures: bool,
        check_simple_ko: bool,
    ) -> Result<bool, BoardError> {
        self.check_consistency()?;
        other.check_consistency()?;
        Ok(self.x_size == other.x_size
            && self.y_size == other.y_size
            && (!check_simple_ko || self.ko_loc == other.ko_loc)
            && (!check_num_captures
                || (self.num_black_captures == other.num_black_captures
                    && self.num_white_captures == other.num_white_captures))
            && self.pos_hash == other.pos_hash
            && self.colors == other.colors)
    }

    // =========================================================================
    // Text format
    // =========================================================================

    /// Write the board as a grid with a coordinate header. `mark_loc` is shown
    /// as `@` when empty, and the last three moves of `hist` are numbered.
    pub fn print_board(&self, out: &mut impl fmt::Write, mark_loc: Loc, hist: Option<&[Move]>) -> fmt::Result {
        if let Some(hist) = hist {
            write!(out, "MoveNum: {} ", hist.len())?;
        }
        writeln!(out, "HASH: {}", self.pos_hash)?;

        let show_coords = self.x_size <= 50 && self.y_size <= 50;
        if show_coords {
            out.write_str("  ")?;
            for x in 0..self.x_size {
                if x <= 24 {
                    write!(out, " {}", X_CHARS[x] as char)?;
                } else {
                    write!(out, "A{}", X_CHARS[x - 25] as char)?;
                }
            }
            out.write_char('\n')?;
        }

        let recent: &[Move] = match hist {
            Some(h) => &h[h.len().saturating_sub(3)..],
            None => &[],
        };
        for y in 0..self.y_size {
            if show_coords {
                write!(out, "{:>2} ", self.y_size - y)?;
            }
            for x in 0..self.x_size {
                let loc = self.loc(x, y);
                let c = self.colors[loc];
                if c == Color::Empty && loc == mark_loc {
                    out.write_char('@')?;
                } else {
                    out.write_char(c.to_char())?;
                }
                let marked = recent.iter().position(|m| m.loc == loc);
                if let Some(i) = marked {
                    write!(out, "{}", i + 1)?;
                }
                if x + 1 < self.x_size && marked.is_none() {
                    out.write_char(' ')?;
                }
            }
            out.write_char('\n')?;
        }
        out.write_char('\n')
    }

    /// One character per cell, rows terminated by `delimiter`.
    pub fn to_string_simple(&self, delimiter: char) -> String {
        let mut s = String::with_capacity((self.x_size + 1) * self.y_size);
        for y in 0..self.y_size {
            for x in 0..self.x_size {
                s.push(self.colors[self.loc(x, y)].to_char());
            }
            s.push(delimiter);
        }
        s
    }

    pub fn parse_board(x_size: usize, y_size: usize, s: &str) -> Result<Board, BoardError> {
        Self::parse_board_with_delimiter(x_size, y_size, s, '\n')
    }

    /// Parse the grid format written by [`Board::print_board`] or
    /// [`Board::to_string_simple`]. Coordinate labels are optional and
    /// cells may be separated by single spaces.
    pub fn parse_board_with_delimiter(
        x_size: usize,
        y_size: usize,
        s: &str,
        delimiter: char,
    ) -> Result<Board, BoardError> {
        let mut board = Board::new(x_size, y_size)?;
        let mut lines: Vec<&str> = s.trim().split(delimiter).collect();

        if lines.len() == y_size + 1 && lines[0].trim_start().starts_with('A') {
            lines.remove(0);
        }
        if lines.len() != y_size {
            return Err(BoardError::ParseBoard(format!(
                "expected {y_size} rows, found {}",
                lines.len()
            )));
        }

        for (y, line) in lines.iter().enumerate() {
            let line = line.trim().trim_start_matches(|c: char| c.is_ascii_digit()).trim();
            let chars: Vec<char> = line.chars().collect();
            let spaced = if chars.len() == x_size {
                false
            } else if x_size > 0 && chars.len() == 2 * x_size - 1 {
                true
            } else {
                return Err(BoardError::ParseBoard(format!(
                    "row {} has length {}, incompatible with width {x_size}",
                    y + 1,
                    chars.len()
                )));
            };

            for x in 0..x_size {
                let c = if spaced { chars[x * 2] } else { chars[x] };
                let loc = board.loc(x, y);
                match c {
                    '.' | ' ' | '*' | ',' | '`' => {}
                    'o' | 'O' => {
                        board.set_stone(loc, Color::White);
                    }
                    'x' | 'X' => {
                        board.set_stone(loc, Color::Black);
                    }
                    other => {
                        return Err(BoardError::ParseBoard(format!(
                            "could not parse board character: {other}"
                        )));
                    }
                }
            }
        }
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print_board(f, NULL_LOC, None)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({}x{})\n{}", self.x_size, self.y_size, self.to_string_simple('\n'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str, size: usize) -> Board {
        Board::parse_board(size, size, s).unwrap()
    }

    fn at(board: &Board, s: &str) -> Loc {
        location::of_string(s, board.x_size, board.y_size).unwrap()
    }

    #[test]
    fn test_new_board() {
        let board = Board::new(9, 9).unwrap();
        assert!(board.is_empty());
        assert_eq!(board.colors[PASS_LOC], Color::Wall);
        assert_eq!(board.colors[NULL_LOC], Color::Wall);
        board.check_consistency().unwrap();
    }

    #[test]
    fn test_invalid_size() {
        assert!(matches!(
            Board::new(MAX_LEN + 1, 9),
            Err(BoardError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_single_stone_liberties() {
        let mut board = Board::new(9, 9).unwrap();
        let e5 = at(&board, "E5");
        board.play_move_assume_legal(e5, Color::Black);
        assert_eq!(board.num_stones_on_board(), 1);
        assert_eq!(board.get_num_liberties(e5), 4);
        let a1 = at(&board, "A1");
        board.play_move_assume_legal(a1, Color::White);
        assert_eq!(board.get_num_liberties(a1), 2);
        board.check_consistency().unwrap();
    }

    #[test]
    fn test_merge_shares_liberties() {
        let mut board = Board::new(9, 9).unwrap();
        board.play_move_assume_legal(at(&board, "C3"), Color::Black);
        board.play_move_assume_legal(at(&board, "E3"), Color::Black);
        board.play_move_assume_legal(at(&board, "D3"), Color::Black);
        let d3 = at(&board, "D3");
        assert_eq!(board.get_chain_size(d3), 3);
        assert_eq!(board.get_num_liberties(d3), 8);
        assert_eq!(board.chain_locs(d3).len(), 3);
        board.check_consistency().unwrap();
    }

    #[test]
    fn test_capture_and_ko() {
        let mut board = parse(
            "
. X O . .
X O . O .
. X O . .
. . . . .
. . . . .",
            5,
        );
        let c4 = at(&board, "C4");
        assert!(board.would_be_ko_capture(c4, Color::Black));
        board.play_move_assume_legal(c4, Color::Black);
        let b4 = at(&board, "B4");
        assert_eq!(board.colors[b4], Color::Empty);
        assert_eq!(board.num_white_captures, 1);
        assert_eq!(board.ko_loc, b4);
        assert!(!board.is_legal(b4, Color::White, false));
        assert!(board.is_legal_ignoring_ko(b4, Color::White, false));
        assert_eq!(board.check_move(b4, Color::White, false), Err(MoveError::Ko));
        board.check_consistency().unwrap();
    }

    #[test]
    fn test_suicide_rules() {
        let board = parse(
            "
. X . . .
X X . . .
. . . . .
. . . . .
. . . . .",
            5,
        );
        let a5 = at(&board, "A5");
        assert!(board.is_suicide(a5, Color::White));
        assert!(board.is_illegal_suicide(a5, Color::White, true));
        assert!(!board.is_suicide(a5, Color::Black));

        let board = parse(
            "
. O X . .
O O X . .
X X . . .
. . . . .
. . . . .",
            5,
        );
        let a5 = at(&board, "A5");
        assert!(board.is_suicide(a5, Color::White));
        assert!(board.is_illegal_suicide(a5, Color::White, false));
        assert!(!board.is_illegal_suicide(a5, Color::White, true));
    }

    #[test]
    fn test_multi_stone_suicide_removes_chain() {
        let mut board = parse(
            "
. O X . .
O O X . .
X X . . .
. . . . .
. . . . .",
            5,
        );
        let before = board.clone();
        let a5 = at(&board, "A5");
        let record = board.play_move_recorded(a5, Color::White);
        assert_eq!(record.cap_dirs, CAP_DIRS_SUICIDE);
        assert_eq!(board.num_white_captures, 4);
        assert_eq!(board.num_stones_on_board(), 4);
        board.check_consistency().unwrap();
        board.undo(record);
        assert!(board.is_equal_for_testing(&before, true, true).unwrap());
    }

    #[test]
    fn test_undo_capture_restores_chain() {
        let mut board = parse(
            "
. . . . .
. X X . .
X O O . .
. X X . .
. . . . .",
            5,
        );
        let before = board.clone();
        let d3 = at(&board, "D3");
        let record = board.play_move_recorded(d3, Color::Black);
        assert_eq!(record.cap_dirs, 1 << 1);
        assert_eq!(board.num_white_captures, 2);
        assert_eq!(board.colors[at(&board, "B3")], Color::Empty);
        board.check_consistency().unwrap();
        board.undo(record);
        assert!(board.is_equal_for_testing(&before, true, true).unwrap());
        assert_eq!(board.get_num_liberties(at(&board, "B3")), 1);
    }

    #[test]
    fn test_undo_after_replaying_into_captured_area() {
        let mut board = parse(
            "
. . . . .
. X X . .
X O O . .
. X X . .
. . . . .",
            5,
        );
        let before = board.clone();
        let r1 = board.play_move_recorded(at(&board, "D3"), Color::Black);
        let r2 = board.play_move_recorded(at(&board, "B3"), Color::White);
        let r3 = board.play_move_recorded(at(&board, "C3"), Color::Black);
        board.undo(r3);
        board.undo(r2);
        board.undo(r1);
        assert!(board.is_equal_for_testing(&before, true, true).unwrap());
    }

    #[test]
    fn test_undo_splits_chain() {
        let mut board = Board::new(7, 7).unwrap();
        for s in ["B4", "D4", "C5"] {
            board.play_move_assume_legal(at(&board, s), Color::Black);
        }
        let before = board.clone();
        let c4 = at(&board, "C4");
        let record = board.play_move_recorded(c4, Color::Black);
        assert_eq!(board.get_chain_size(c4), 4);
        board.undo(record);
        assert!(board.is_equal_for_testing(&before, true, true).unwrap());
        assert_eq!(board.get_chain_size(at(&board, "B4")), 1);
    }

    #[test]
    fn test_undo_patches_chain_in_place() {
        let mut board = Board::new(7, 7).unwrap();
        board.play_move_assume_legal(at(&board, "C3"), Color::Black);
        let before = board.clone();
        let c4 = at(&board, "C4");
        let record = board.play_move_recorded(c4, Color::Black);
        let record2 = board.play_move_recorded(at(&board, "C5"), Color::Black);
        board.undo(record2);
        board.undo(record);
        assert!(board.is_equal_for_testing(&before, true, true).unwrap());
        assert_eq!(board.get_num_liberties(at(&board, "C3")), 4);
    }

    #[test]
    fn test_liberties_after_play() {
        let board = parse(
            "
. . . . .
. X . . .
X O . . .
. X . . .
. . . . .",
            5,
        );
        let c3 = at(&board, "C3");
        assert_eq!(board.get_num_liberties_after_play(c3, Color::Black, 10), 4);
        assert_eq!(board.get_num_liberties_after_play(c3, Color::White, 10), 3);
        assert_eq!(board.get_num_liberties_after_play(c3, Color::White, 2), 2);
        let (lower, upper) = board.get_bound_num_liberties_after_play(c3, Color::White);
        assert!(lower <= 3 && upper >= 3);
        let (lower, upper) = board.get_bound_num_liberties_after_play(c3, Color::Black);
        assert!(lower <= 4 && upper >= 4);
    }

    #[test]
    fn test_pos_hash_after_move() {
        let mut board = parse(
            "
. X O . .
X O . O .
. X O . .
. . . . .
. . . . .",
            5,
        );
        let c4 = at(&board, "C4");
        let predicted = board.get_pos_hash_after_move(c4, Color::Black);
        board.play_move_assume_legal(c4, Color::Black);
        assert_eq!(predicted, board.pos_hash);
        assert_eq!(board.get_pos_hash_after_move(PASS_LOC, Color::White), board.pos_hash);
    }

    #[test]
    fn test_simple_eye() {
        let board = parse(
            "
. X . . .
X X . . .
. . X . .
. X . X .
. . X . .",
            5,
        );
        assert!(board.is_simple_eye(at(&board, "A5"), Color::Black));
        assert!(board.is_simple_eye(at(&board, "C2"), Color::Black));
        assert!(!board.is_simple_eye(at(&board, "C4"), Color::Black));
    }

    #[test]
    fn test_set_stone_replaces_color() {
        let mut board = Board::new(5, 5).unwrap();
        let c3 = at(&board, "C3");
        let d3 = at(&board, "D3");
        board.set_stone(c3, Color::Black);
        board.set_stone(d3, Color::Black);
        board.set_stone(c3, Color::White);
        assert_eq!(board.colors[c3], Color::White);
        assert_eq!(board.get_chain_size(d3), 1);
        board.check_consistency().unwrap();
        assert!(!board.set_stone(PASS_LOC, Color::Black));
    }

    #[test]
    fn test_consistency_detects_corruption() {
        let mut board = Board::new(5, 5).unwrap();
        let c3 = at(&board, "C3");
        board.play_move_assume_legal(c3, Color::Black);
        board.chain_data[c3].num_liberties = 3;
        assert!(board.check_consistency().is_err());
        board.chain_data[c3].num_liberties = 4;
        board.pos_hash ^= Hash128::new(1, 0);
        let err = board.check_consistency().unwrap_err();
        assert_eq!(err, BoardError::Inconsistent("pos hash does not match expected".into()));
    }

    #[test]
    fn test_benson_two_eyes_alive() {
        let board = parse(
            "
. X . X O . .
X X X X O . .
O O O O O . .
. . . . . . .
. . . . . . .
. . . . . . .
. . . . . . .",
            7,
        );
        let area = board.calculate_area(false, false, false, false);
        assert_eq!(area[at(&board, "A7")], Color::Black);
        assert_eq!(area[at(&board, "C7")], Color::Black);
        assert_eq!(area[at(&board, "B6")], Color::Black);
        assert_eq!(area[at(&board, "A5")], Color::Empty);
    }

    #[test]
    fn test_benson_one_eye_dead() {
        let board = parse(
            "
. X X O . . .
X X X O . . .
O O O O . . .
. . . . . . .
. . . . . . .
. . . . . . .
. . . . . . .",
            7,
        );
        let area = board.calculate_area(false, false, false, false);
        assert_eq!(area[at(&board, "A7")], Color::Empty);
        assert_eq!(area[at(&board, "B6")], Color::Empty);
        let with_stones = board.calculate_area(true, false, false, false);
        assert_eq!(with_stones[at(&board, "B6")], Color::Black);
    }

    #[test]
    fn test_print_and_parse() {
        let mut board = Board::new(5, 5).unwrap();
        board.play_move_assume_legal(at(&board, "B2"), Color::Black);
        board.play_move_assume_legal(at(&board, "D4"), Color::White);
        let printed = board.to_string();
        let first_line_end = printed.find('\n').unwrap();
        let parsed = Board::parse_board(5, 5, &printed[first_line_end + 1..]).unwrap();
        assert!(parsed.is_equal_for_testing(&board, false, false).unwrap());
        assert_eq!(board.to_string_simple('/'), "...../...O./...../.X.../...../");
    }

    #[test]
    fn test_print_with_history() {
        let mut board = Board::new(3, 3).unwrap();
        let b2 = at(&board, "B2");
        board.play_move_assume_legal(b2, Color::Black);
        let hist = [Move::new(b2, Color::Black)];
        let mut out = String::new();
        board.print_board(&mut out, at(&board, "A1"), Some(&hist)).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("MoveNum: 1 HASH: "));
        assert_eq!(lines[1], "   A B C");
        assert_eq!(lines[3], " 2 . X1.");
        assert_eq!(lines[4], " 1 @ . .");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Board::parse_board(3, 3, "...\n.Z.\n...").is_err());
        assert!(Board::parse_board(3, 3, "...\n...").is_err());
        assert!(Board::parse_board(3, 3, "....\n...\n...").is_err());
    }
}
