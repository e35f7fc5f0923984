//! Bucketed snapshot of a history's ko hashes for fast repetition lookups.
//!
//! A search anchored at a root position shares one table across all its
//! workers. Each worker's [`BoardHistory`] only scans the hashes appended
//! after the snapshot, so deep search nodes never rescan the whole game.

use crate::constants::{KO_TABLE_MASK, KO_TABLE_SIZE};
use crate::hash::Hash128;
use crate::history::BoardHistory;

#[derive(Debug, Clone)]
pub struct KoHashTable {
    /// Active ko hashes ordered by `(hash0 & KO_TABLE_MASK, hash)`.
    sorted: Vec<Hash128>,
    /// `idx_table[b]` is the first index in `sorted` whose low bits are `>= b`.
    idx_table: Vec<u32>,
    /// Start of the history window this snapshot was built from.
    pub first_turn_idx_with_ko_history: usize,
}

impl Default for KoHashTable {
    fn default() -> Self {
        KoHashTable {
            sorted: Vec::new(),
            idx_table: vec![0; KO_TABLE_SIZE],
            first_turn_idx_with_ko_history: 0,
        }
    }
}

#[inline]
fn low_bits(hash: Hash128) -> u64 {
    hash.hash0 & KO_TABLE_MASK
}

impl KoHashTable {
    pub fn new(history: &BoardHistory) -> Self {
        let mut table = KoHashTable::default();
        table.recompute(history);
        table
    }

    /// Number of hashes in the snapshot.
    pub fn size(&self) -> usize {
        self.sorted.len()
    }

    /// Rebuild from the active window of `history`. Must not be called while
    /// other threads hold a reference to this table.
    pub fn recompute(&mut self, history: &BoardHistory) {
        self.first_turn_idx_with_ko_history = history.first_turn_idx_with_ko_history;
        self.sorted.clear();
        self.sorted
            .extend_from_slice(&history.ko_hash_history[history.first_turn_idx_with_ko_history..]);
        self.sorted.sort_unstable_by_key(|&h| (low_bits(h), h));

        let mut idx = 0;
        for (bits, slot) in self.idx_table.iter_mut().enumerate() {
            while idx < self.sorted.len() && low_bits(self.sorted[idx]) < bits as u64 {
                idx += 1;
            }
            *slot = idx as u32;
        }
    }

    fn bucket(&self, hash: Hash128) -> impl Iterator<Item = &Hash128> {
        let bits = low_bits(hash);
        let start = self.idx_table[bits as usize] as usize;
        self.sorted[start..]
            .iter()
            .take_while(move |&&h| low_bits(h) == bits)
    }

    pub fn contains_hash(&self, hash: Hash128) -> bool {
        self.bucket(hash).any(|&h| h == hash)
    }

    pub fn number_of_occurrences_of_hash(&self, hash: Hash128) -> usize {
        self.bucket(hash).filter(|&&h| h == hash).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::color::Color;
    use crate::constants::PASS_LOC;
    use crate::rules::Rules;

    fn played_history() -> (Board, BoardHistory) {
        let mut board = Board::new(9, 9).unwrap();
        let mut hist = BoardHistory::new(&board, Color::Black, Rules::tromp_taylor(), 0);
        for (x, y, pla) in [(2, 2, Color::Black), (6, 6, Color::White), (2, 6, Color::Black)] {
            let loc = board.loc(x, y);
            hist.make_board_move_assume_legal(&mut board, loc, pla, None);
        }
        (board, hist)
    }

    #[test]
    fn test_contains_all_history_hashes() {
        let (_, hist) = played_history();
        let table = KoHashTable::new(&hist);
        assert_eq!(table.size(), 4);
        for &h in &hist.ko_hash_history {
            assert!(table.contains_hash(h));
            assert_eq!(table.number_of_occurrences_of_hash(h), 1);
        }
        assert!(!table.contains_hash(Hash128::new(12345, 678)));
    }

    #[test]
    fn test_matches_linear_count() {
        let (mut board, mut hist) = played_history();
        hist.make_board_move_assume_legal(&mut board, PASS_LOC, Color::White, None);
        let table = KoHashTable::new(&hist);
        for &h in &hist.ko_hash_history {
            let linear = hist.ko_hash_history.iter().filter(|&&g| g == h).count();
            assert_eq!(table.number_of_occurrences_of_hash(h), linear);
        }
        assert_eq!(table.first_turn_idx_with_ko_history, hist.first_turn_idx_with_ko_history);
    }

    #[test]
    fn test_shared_across_threads() {
        let (_, hist) = played_history();
        let table = std::sync::Arc::new(KoHashTable::new(&hist));
        let target = hist.ko_hash_history[2];
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let table = std::sync::Arc::clone(&table);
                std::thread::spawn(move || table.contains_hash(target))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
