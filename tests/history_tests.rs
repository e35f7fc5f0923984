//! Integration tests for game history: ko handling across rule sets,
//! game end, scoring, search-side ko tables and position samples.

use tengen::board::Board;
use tengen::color::{Color, Player};
use tengen::constants::Loc;
use tengen::error::MoveError;
use tengen::history::BoardHistory;
use tengen::kohash::KoHashTable;
use tengen::location;
use tengen::rules::{KoRule, Rules, ScoringRule};
use tengen::sample::PositionSample;

// =============================================================================
// Helper functions
// =============================================================================

/// White stone at B4 can be captured by black at C4, opening a ko.
const KO_SHAPE: &str = "
. X O . .
X O . O .
. X O . .
. . . . .
. . . . .";

fn game(board_str: &str, size: usize, rules: Rules) -> (Board, BoardHistory) {
    let board = Board::parse_board(size, size, board_str).unwrap();
    let hist = BoardHistory::new(&board, Color::Black, rules, 0);
    (board, hist)
}

fn loc(board: &Board, s: &str) -> Loc {
    location::of_string(s, board.x_size, board.y_size).unwrap()
}

fn try_play(board: &mut Board, hist: &mut BoardHistory, s: &str, pla: Player) -> Result<(), MoveError> {
    let mv = hist.verify_move(board, loc(board, s), pla)?;
    hist.make_verified_move(board, mv, None);
    Ok(())
}

fn play_all(board: &mut Board, hist: &mut BoardHistory, moves: &[&str]) {
    for s in moves {
        let pla = hist.presumed_next_move_pla;
        try_play(board, hist, s, pla).unwrap_or_else(|e| panic!("{s}: {e}"));
        board.check_consistency().unwrap();
    }
}

// =============================================================================
// Ko
// =============================================================================

#[test]
fn test_simple_ko_needs_a_threat() {
    let (mut board, mut hist) = game(KO_SHAPE, 5, Rules::chinese());
    play_all(&mut board, &mut hist, &["C4"]);
    assert_eq!(board.colors[loc(&board, "B4")], Color::Empty);
    assert_eq!(
        try_play(&mut board, &mut hist, "B4", Color::White),
        Err(MoveError::Ko)
    );
    assert!(!hist.is_legal(&board, loc(&board, "B4"), Color::White));

    play_all(&mut board, &mut hist, &["E1", "E2", "B4"]);
    assert_eq!(board.colors[loc(&board, "C4")], Color::Empty);
    assert_eq!(board.num_black_captures, 1);
    assert_eq!(board.num_white_captures, 1);
}

#[test]
fn test_ko_rules_agree_on_fresh_positions() {
    for rules in [Rules::chinese(), Rules::tromp_taylor(), Rules::aga()] {
        let (mut board, mut hist) = game(KO_SHAPE, 5, rules);
        play_all(&mut board, &mut hist, &["C4", "E1", "E2", "B4", "D1"]);
        assert!(!hist.is_game_finished, "{:?}", rules.ko);
        assert_eq!(hist.ko_hash_history.len(), hist.move_history.len() + 1);
    }
}

#[test]
fn test_two_passes_end_tromp_taylor_game() {
    let (mut board, mut hist) = game(KO_SHAPE, 5, Rules::tromp_taylor());
    play_all(&mut board, &mut hist, &["C4"]);
    play_all(&mut board, &mut hist, &["pass", "pass"]);
    assert!(hist.is_game_finished);
    assert_eq!(
        try_play(&mut board, &mut hist, "B4", Color::White),
        Err(MoveError::GameOver)
    );
}

#[test]
fn test_root_table_matches_linear_scan() {
    let (mut board, mut hist) = game(KO_SHAPE, 5, Rules::aga());
    play_all(&mut board, &mut hist, &["C4", "E1", "E2", "B4", "D1", "C4"]);
    let table = KoHashTable::new(&hist);

    let mut search_hist = hist.clone();
    let mut search_board = board.clone();
    for s in ["A1", "A2", "B1"] {
        let pla = search_hist.presumed_next_move_pla;
        let l = loc(&search_board, s);
        search_hist.make_board_move_assume_legal(&mut search_board, l, pla, Some(&table));
    }
    for &h in &search_hist.ko_hash_history {
        assert_eq!(
            search_hist.number_of_ko_hash_occurrences_in_history(h, Some(&table)),
            search_hist.number_of_ko_hash_occurrences_in_history(h, None)
        );
    }
}

// =============================================================================
// Game end and scoring
// =============================================================================

#[test]
fn test_scoring_varies_with_rules() {
    let rows = ". X O . .\n".repeat(5);
    let mut scores = Vec::new();
    for rules in [Rules::chinese(), Rules::stone_scoring()] {
        let (mut board, mut hist) = game(&rows, 5, rules.with_komi(0.5).unwrap());
        play_all(&mut board, &mut hist, &["pass", "pass"]);
        assert!(hist.is_scored);
        scores.push(hist.final_white_minus_black_score);
    }
    // Area: 15 - 10. Group tax: one region each, so the same difference.
    assert_eq!(scores, vec![5.5, 5.5]);
}

#[test]
fn test_territory_game_needs_encore() {
    let (mut board, mut hist) = game(&".....\n".repeat(5), 5, Rules::japanese());
    assert_eq!(hist.rules.scoring, ScoringRule::Territory);
    play_all(&mut board, &mut hist, &["pass", "pass"]);
    assert!(!hist.is_game_finished);
    assert_eq!(hist.encore_phase, 1);
    play_all(&mut board, &mut hist, &["pass", "pass", "pass", "pass"]);
    assert!(hist.is_game_finished);
    assert_eq!(hist.final_white_minus_black_score, 6.5);
}

#[test]
fn test_resignation_and_no_moves_after() {
    let (mut board, mut hist) = game(&".....\n".repeat(5), 5, Rules::default());
    play_all(&mut board, &mut hist, &["C3"]);
    hist.set_winner_by_resignation(Color::Black);
    assert!(hist.is_resignation);
    assert_eq!(hist.winner, Color::Black);
    assert_eq!(try_play(&mut board, &mut hist, "D3", Color::White), Err(MoveError::GameOver));
}

#[test]
fn test_handicap_bonus_from_placed_stones() {
    let rows = "
. . . . . . . . .
. . . . . . . . .
. . X . . . X . .
. . . . . . . . .
. . . . . . . . .
. . . . . . . . .
. . X . . . X . .
. . . . . . . . .
. . . . . . . . .";
    let board = Board::parse_board(9, 9, rows).unwrap();
    let chinese = BoardHistory::new(&board, Color::White, Rules::chinese(), 0);
    assert_eq!(chinese.compute_num_handicap_stones(), 4);
    assert_eq!(chinese.white_handicap_bonus_score, 4.0);
    let aga = BoardHistory::new(&board, Color::White, Rules::aga(), 0);
    assert_eq!(aga.white_handicap_bonus_score, 3.0);
    let tt = BoardHistory::new(&board, Color::White, Rules::tromp_taylor(), 0);
    assert_eq!(tt.white_handicap_bonus_score, 0.0);
}

// =============================================================================
// Situation hashes
// =============================================================================

#[test]
fn test_transpositions_share_situation_hash() {
    let empty = ".........\n".repeat(9);
    let (mut b1, mut h1) = game(&empty, 9, Rules::tromp_taylor());
    let (mut b2, mut h2) = game(&empty, 9, Rules::tromp_taylor());
    play_all(&mut b1, &mut h1, &["D4", "E5", "C3"]);
    play_all(&mut b2, &mut h2, &["C3", "E5", "D4"]);
    let s1 = BoardHistory::get_situation_rules_and_ko_hash(&b1, &h1, Color::White, 0.5);
    let s2 = BoardHistory::get_situation_rules_and_ko_hash(&b2, &h2, Color::White, 0.5);
    assert_eq!(s1, s2);

    let other_rules = BoardHistory::new(&b2, Color::White, Rules { ko: KoRule::Simple, ..Rules::tromp_taylor() }, 0);
    assert_ne!(s1, BoardHistory::get_situation_rules_and_ko_hash(&b2, &other_rules, Color::White, 0.5));
}

// =============================================================================
// Position samples
// =============================================================================

#[test]
fn test_sample_replays_into_history() {
    let line = r#"{"board":"...../...../..X../...../.....","hintLoc":"D3","initialTurnNumber":10,"moveLocs":["C4","C2"],"movePlas":["W","B"],"nextPla":"W","weight":2.0,"xSize":5,"ySize":5}"#;
    let sample = PositionSample::of_json_line(line).unwrap();
    let mut board = sample.board.clone();
    let mut hist = BoardHistory::new(&board, sample.moves[0].pla, Rules::default(), 0);
    hist.set_initial_turn_number(sample.initial_turn_number as usize);
    for mv in &sample.moves {
        let verified = hist.verify_move(&board, mv.loc, mv.pla).unwrap();
        hist.make_verified_move(&mut board, verified, None);
    }
    assert_eq!(hist.presumed_next_move_pla, sample.next_pla);
    assert_eq!(hist.get_current_turn_number() as i64, sample.current_turn_number());
    assert!(hist.is_legal(&board, sample.hint_loc, sample.next_pla));
    assert_eq!(sample.to_json_line(), line);
}
