//! 128-bit Zobrist hashing.
//!
//! The tables are generated once per process from a fixed seed and then
//! shared read-only; boards hold a `&'static` reference to them.

use std::fmt;
use std::ops::{BitXor, BitXorAssign};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::color::NUM_BOARD_COLORS;
use crate::constants::{MAX_ARR_SIZE, MAX_LEN};

/// A 128-bit hash, compared as `(hash0, hash1)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Hash128 {
    pub hash0: u64,
    pub hash1: u64,
}

impl Hash128 {
    pub const ZERO: Hash128 = Hash128 { hash0: 0, hash1: 0 };

    pub const fn new(hash0: u64, hash1: u64) -> Self {
        Hash128 { hash0, hash1 }
    }
}

impl BitXor for Hash128 {
    type Output = Hash128;

    #[inline]
    fn bitxor(self, rhs: Hash128) -> Hash128 {
        Hash128::new(self.hash0 ^ rhs.hash0, self.hash1 ^ rhs.hash1)
    }
}

impl BitXorAssign for Hash128 {
    #[inline]
    fn bitxor_assign(&mut self, rhs: Hash128) {
        self.hash0 ^= rhs.hash0;
        self.hash1 ^= rhs.hash1;
    }
}

impl fmt::Display for Hash128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}{:016X}", self.hash1, self.hash0)
    }
}

/// Finalizer of MurmurHash3, used to spread small integers over 64 bits.
pub fn murmur_mix(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^= x >> 33;
    x
}

/// One step of a linear congruential generator.
pub fn basic_lcong(x: u64) -> u64 {
    x.wrapping_mul(2_862_933_555_777_941_757)
        .wrapping_add(3_037_000_493)
}

const ZOBRIST_SEED: u64 = 0x7e6e_6e67_6f5f_6b61;

/// Random terms for every hashed piece of game state.
pub struct ZobristTables {
    pub size_x: [Hash128; MAX_LEN + 1],
    pub size_y: [Hash128; MAX_LEN + 1],
    /// Indexed by `[loc][color]`. Empty and wall terms are zero.
    pub board: Vec<[Hash128; NUM_BOARD_COLORS]>,
    pub player: [Hash128; NUM_BOARD_COLORS],
    pub ko_loc: Vec<Hash128>,
    /// Ko-recapture block marks.
    pub ko_mark: Vec<Hash128>,
    pub encore: [Hash128; 3],
    /// Stones present at the start of the second encore, indexed by `[loc][color]`.
    pub second_encore_start: Vec<[Hash128; NUM_BOARD_COLORS]>,
    pub pass_ends_phase: Hash128,
    pub game_is_over: Hash128,
    pub ko_rule: [Hash128; 4],
    pub scoring_rule: [Hash128; 2],
    pub tax_rule: [Hash128; 3],
    pub multi_stone_suicide: Hash128,
    pub button: Hash128,
}

impl ZobristTables {
    fn generate() -> Self {
        let mut rng = fastrand::Rng::with_seed(ZOBRIST_SEED);
        let mut next = || Hash128::new(rng.u64(..), rng.u64(..));

        let mut board = vec![[Hash128::ZERO; NUM_BOARD_COLORS]; MAX_ARR_SIZE];
        let mut ko_loc = vec![Hash128::ZERO; MAX_ARR_SIZE];
        let mut ko_mark = vec![Hash128::ZERO; MAX_ARR_SIZE];
        let mut second_encore_start = vec![[Hash128::ZERO; NUM_BOARD_COLORS]; MAX_ARR_SIZE];
        for loc in 0..MAX_ARR_SIZE {
            // Only black and white stones contribute to the position hash.
            board[loc][1] = next();
            board[loc][2] = next();
            ko_loc[loc] = next();
            ko_mark[loc] = next();
            second_encore_start[loc][1] = next();
            second_encore_start[loc][2] = next();
        }

        let mut player = [Hash128::ZERO; NUM_BOARD_COLORS];
        for term in player.iter_mut() {
            *term = next();
        }
        let encore = [next(), next(), next()];

        let mut size_x = [Hash128::ZERO; MAX_LEN + 1];
        let mut size_y = [Hash128::ZERO; MAX_LEN + 1];
        for i in 0..=MAX_LEN {
            size_x[i] = next();
            size_y[i] = next();
        }

        ZobristTables {
            size_x,
            size_y,
            board,
            player,
            ko_loc,
            ko_mark,
            encore,
            second_encore_start,
            pass_ends_phase: next(),
            game_is_over: next(),
            ko_rule: [next(), next(), next(), next()],
            scoring_rule: [next(), next()],
            tax_rule: [next(), next(), next()],
            multi_stone_suicide: next(),
            button: next(),
        }
    }
}

static ZOBRIST: OnceLock<ZobristTables> = OnceLock::new();

/// The process-wide Zobrist tables, generated on first use.
pub fn zobrist() -> &'static ZobristTables {
    ZOBRIST.get_or_init(ZobristTables::generate)
}
