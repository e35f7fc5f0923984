//! Property-based tests for board and history invariants.

use std::collections::HashSet;

use proptest::prelude::*;
use tengen::board::Board;
use tengen::color::Color;
use tengen::constants::{Loc, PASS_LOC};
use tengen::history::BoardHistory;
use tengen::kohash::KoHashTable;
use tengen::rules::Rules;

const SIZE: usize = 7;

fn rules_strategy() -> impl Strategy<Value = Rules> {
    prop::sample::select(vec![
        "tromp-taylor",
        "chinese",
        "japanese",
        "aga",
        "aga-button",
        "new-zealand",
        "stone-scoring",
    ])
    .prop_map(|name| Rules::preset(name).unwrap())
}

/// Play each index as a move for the side to move, passing when it is
/// illegal, until the game ends.
fn play_sequence(rules: Rules, moves: &[usize]) -> (Board, BoardHistory) {
    let mut board = Board::new(SIZE, SIZE).unwrap();
    let mut hist = BoardHistory::new(&board, Color::Black, rules, 0);
    for &idx in moves {
        if hist.is_game_finished {
            break;
        }
        let pla = hist.presumed_next_move_pla;
        let loc = board.loc(idx % SIZE, idx / SIZE);
        let loc = if hist.is_legal(&board, loc, pla) { loc } else { PASS_LOC };
        let mv = hist.verify_move(&board, loc, pla).unwrap();
        hist.make_verified_move(&mut board, mv, None);
    }
    (board, hist)
}

fn brute_force_liberties(board: &Board, loc: Loc) -> usize {
    let color = board.colors[loc];
    let mut seen = HashSet::from([loc]);
    let mut stack = vec![loc];
    let mut libs = HashSet::new();
    while let Some(cur) = stack.pop() {
        for &off in &board.adj_offsets[..4] {
            let adj = cur.wrapping_add_signed(off);
            if board.colors[adj] == Color::Empty {
                libs.insert(adj);
            } else if board.colors[adj] == color && seen.insert(adj) {
                stack.push(adj);
            }
        }
    }
    libs.len()
}

proptest! {
    #[test]
    fn test_random_games_stay_consistent(
        rules in rules_strategy(),
        moves in prop::collection::vec(0usize..SIZE * SIZE, 0..120),
    ) {
        let (board, hist) = play_sequence(rules, &moves);
        prop_assert!(board.check_consistency().is_ok());
        prop_assert_eq!(hist.ko_hash_history.len(), hist.move_history.len() + 1);
        prop_assert!(hist.first_turn_idx_with_ko_history <= hist.move_history.len());
        prop_assert!(hist.encore_phase <= 2);
    }

    #[test]
    fn test_liberties_match_flood_fill(moves in prop::collection::vec(0usize..SIZE * SIZE, 0..100)) {
        let (board, _) = play_sequence(Rules::tromp_taylor(), &moves);
        for loc in board.locs() {
            if board.colors[loc].is_player() {
                prop_assert_eq!(board.get_num_liberties(loc), brute_force_liberties(&board, loc));
                prop_assert!(board.get_num_liberties(loc) > 0);
            }
        }
    }

    #[test]
    fn test_ko_table_agrees_with_linear_scan(
        rules in rules_strategy(),
        prefix in prop::collection::vec(0usize..SIZE * SIZE, 0..60),
        suffix in prop::collection::vec(0usize..SIZE * SIZE, 0..30),
    ) {
        let (mut board, mut hist) = play_sequence(rules, &prefix);
        let table = KoHashTable::new(&hist);
        for &idx in &suffix {
            if hist.is_game_finished {
                break;
            }
            let pla = hist.presumed_next_move_pla;
            let loc = board.loc(idx % SIZE, idx / SIZE);
            let loc = if hist.is_legal(&board, loc, pla) { loc } else { PASS_LOC };
            hist.make_board_move_assume_legal(&mut board, loc, pla, Some(&table));
        }
        for &h in &hist.ko_hash_history {
            prop_assert_eq!(
                hist.number_of_ko_hash_occurrences_in_history(h, Some(&table)),
                hist.number_of_ko_hash_occurrences_in_history(h, None)
            );
            prop_assert_eq!(
                hist.ko_hash_occurs_in_history(h, Some(&table)),
                hist.ko_hash_occurs_in_history(h, None)
            );
        }
    }

    #[test]
    fn test_recorded_move_undo_restores_board(
        moves in prop::collection::vec(0usize..SIZE * SIZE, 0..60),
        extra in 0usize..SIZE * SIZE,
    ) {
        let (mut board, hist) = play_sequence(Rules::tromp_taylor(), &moves);
        let pla = hist.presumed_next_move_pla;
        let loc = board.loc(extra % SIZE, extra / SIZE);
        prop_assume!(board.is_legal(loc, pla, true));
        let before = board.clone();
        let record = board.play_move_recorded(loc, pla);
        board.undo(record);
        prop_assert!(board.is_equal_for_testing(&before, true, true).unwrap());
        prop_assert!(board.check_consistency().is_ok());
    }
}
