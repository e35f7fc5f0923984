//! Board geometry limits and engine-wide defaults.
//!
//! Boards are stored as a 1D array with a one-cell wall border so that any
//! neighbor lookup from an on-board cell stays inside the array.
//!
//! # Board Size Configuration
//!
//! The largest supported edge length is chosen with Cargo features:
//! - `max19` (default): boards up to 19x19
//! - `max29`: boards up to 29x29
//!
//! ```sh
//! cargo build                                        # up to 19x19
//! cargo build --no-default-features --features max29 # up to 29x29
//! ```

/// A location on the padded board array.
pub type Loc = usize;

// =============================================================================
// Board Geometry
// =============================================================================

/// Maximum edge length of a board.
#[cfg(feature = "max19")]
pub const MAX_LEN: usize = 19;

#[cfg(feature = "max29")]
pub const MAX_LEN: usize = 29;

#[cfg(all(feature = "max19", feature = "max29"))]
compile_error!("Cannot enable both 'max19' and 'max29' features at the same time");

#[cfg(not(any(feature = "max19", feature = "max29")))]
compile_error!("Must enable exactly one board size feature: 'max19' or 'max29'");

/// Maximum number of playable points.
pub const MAX_PLAY_SIZE: usize = MAX_LEN * MAX_LEN;

/// Size of every per-location array, including the wall border.
pub const MAX_ARR_SIZE: usize = (MAX_LEN + 1) * (MAX_LEN + 2) + 1;

// =============================================================================
// Special Locations
// =============================================================================

/// Marks "no location" (no ko, no hint, unset).
pub const NULL_LOC: Loc = 0;

/// The pass move.
pub const PASS_LOC: Loc = 1;

// =============================================================================
// Game Defaults
// =============================================================================

/// Default edge length for new games.
pub const DEFAULT_SIZE: usize = if MAX_LEN < 19 { MAX_LEN } else { 19 };

/// Default komi.
pub const DEFAULT_KOMI: f32 = 7.5;

/// Number of times a position may occur before the game is declared a no-result.
pub const NO_RESULT_REPETITIONS: usize = 3;

/// Number of buckets in a [`crate::kohash::KoHashTable`].
pub const KO_TABLE_SIZE: usize = 1 << 10;

/// Mask selecting the bucket bits of a hash.
pub const KO_TABLE_MASK: u64 = (KO_TABLE_SIZE as u64) - 1;
