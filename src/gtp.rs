//! Go Text Protocol (GTP) front end.
//!
//! Implements the GTP version 2 subset needed by graphical clients such as
//! Sabaki or GoGui. Moves are checked against the full rules through
//! [`BoardHistory`], and `genmove` samples from an evaluator's policy.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`
//! - `list_commands`, `known_command <cmd>`, `quit`
//! - `boardsize <size>`, `clear_board`, `komi <value>`
//! - `play <color> <vertex>`, `genmove <color>`, `undo`
//! - `showboard`, `final_score`
//!
//! ## Example
//!
//! ```ignore
//! use tengen::gtp::GtpEngine;
//! let mut engine = GtpEngine::new(tengen::rules::Rules::default());
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};

use log::{debug, error, info};

use crate::board::Board;
use crate::color::{Color, Player};
use crate::constants::{Loc, MAX_LEN, PASS_LOC};
use crate::history::BoardHistory;
use crate::location;
use crate::nn::{AreaEvaluator, MiscNNInputParams, NNEvaluator};
use crate::playutils;
use crate::rules::Rules;

const KNOWN_COMMANDS: &[&str] = &[
    "boardsize",
    "clear_board",
    "final_score",
    "genmove",
    "known_command",
    "komi",
    "list_commands",
    "name",
    "play",
    "protocol_version",
    "quit",
    "showboard",
    "undo",
    "version",
];

pub struct GtpEngine {
    board: Board,
    hist: BoardHistory,
    rules: Rules,
    evaluator: Box<dyn NNEvaluator>,
    rng: fastrand::Rng,
    /// Policy temperature for `genmove`.
    temperature: f64,
}

impl Default for GtpEngine {
    fn default() -> Self {
        Self::new(Rules::default())
    }
}

impl GtpEngine {
    pub fn new(rules: Rules) -> Self {
        Self::with_evaluator(rules, Box::new(AreaEvaluator::new(MAX_LEN, MAX_LEN)), fastrand::Rng::new())
    }

    /// Build an engine around any evaluator whose grid fits the boards it will see.
    pub fn with_evaluator(rules: Rules, evaluator: Box<dyn NNEvaluator>, rng: fastrand::Rng) -> Self {
        let board = Board::default();
        let hist = BoardHistory::new(&board, Color::Black, rules, 0);
        Self {
            board,
            hist,
            rules,
            evaluator,
            rng,
            temperature: 1.0,
        }
    }

    /// Engine with the default evaluator and a fixed seed.
    pub fn seeded(rules: Rules, seed: u64) -> Self {
        Self::with_evaluator(
            rules,
            Box::new(AreaEvaluator::new(MAX_LEN, MAX_LEN)),
            fastrand::Rng::with_seed(seed),
        )
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = temperature;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &BoardHistory {
        &self.hist
    }

    /// Run the GTP command loop, reading from stdin and writing to stdout.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        info!("GTP engine ready on a {}x{} board", self.board.x_size, self.board.y_size);

        for line in stdin.lock().lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            let command = parts[0].to_lowercase();
            let args = &parts[1..];
            debug!("gtp < {command_line}");

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            write!(stdout, "{prefix}{id_str} {message}\n\n")?;
            stdout.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    fn reset(&mut self, board: Board) {
        self.hist = BoardHistory::new(&board, Color::Black, self.rules, 0);
        self.board = board;
    }

    fn parse_player(arg: Option<&&str>) -> Result<Player, String> {
        let arg = arg.ok_or_else(|| "missing argument".to_string())?;
        Color::try_parse_player(arg).ok_or_else(|| format!("invalid color: {arg}"))
    }

    /// Execute a GTP command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match self.dispatch(command, args) {
            Ok(response) => (true, response),
            Err(message) => (false, message),
        }
    }

    fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<String, String> {
        match command {
            "name" => Ok(env!("CARGO_PKG_NAME").to_string()),

            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => Ok("2".to_string()),

            "list_commands" => Ok(KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let cmd = args.first().ok_or("missing argument")?;
                let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                Ok(known.to_string())
            }

            "quit" => Ok(String::new()),

            "boardsize" => {
                let arg = args.first().ok_or("missing argument")?;
                let size: usize = arg.parse().map_err(|_| "invalid size".to_string())?;
                if size == 0 {
                    return Err("unacceptable size".to_string());
                }
                let board = Board::new(size, size).map_err(|_| "unacceptable size".to_string())?;
                self.reset(board);
                Ok(String::new())
            }

            "clear_board" => {
                let board = Board::new(self.board.x_size, self.board.y_size)
                    .map_err(|e| e.to_string())?;
                self.reset(board);
                Ok(String::new())
            }

            "komi" => {
                let arg = args.first().ok_or("missing argument")?;
                let komi: f32 = arg.parse().map_err(|_| "invalid komi".to_string())?;
                if !Rules::is_valid_komi(komi) {
                    return Err(format!("komi must be a multiple of 0.5: {komi}"));
                }
                self.rules.komi = komi;
                self.hist.set_komi(komi);
                Ok(String::new())
            }

            "play" => {
                let pla = Self::parse_player(args.first())?;
                let vertex = args.get(1).ok_or("missing arguments")?;
                let loc = location::try_of_string(vertex, self.board.x_size, self.board.y_size)
                    .ok_or_else(|| format!("invalid vertex: {vertex}"))?;
                self.hist
                    .make_board_move_tolerant(&mut self.board, loc, pla, None)
                    .map_err(|e| e.to_string())?;
                Ok(String::new())
            }

            "genmove" => {
                let pla = Self::parse_player(args.first())?;
                if self.hist.is_game_finished {
                    return Err("game is over".to_string());
                }
                let loc = self.choose_move(pla).map_err(|e| e.to_string())?;
                let mv = match self.hist.verify_move(&self.board, loc, pla) {
                    Ok(mv) => mv,
                    Err(e) => {
                        error!(
                            "evaluator chose illegal move {}: {e}",
                            location::to_string(loc, self.board.x_size, self.board.y_size)
                        );
                        return Err(e.to_string());
                    }
                };
                self.hist.make_verified_move(&mut self.board, mv, None);
                Ok(location::to_string(loc, self.board.x_size, self.board.y_size))
            }

            "undo" => {
                if self.hist.move_history.is_empty() {
                    return Err("cannot undo".to_string());
                }
                let mut moves = self.hist.move_history.clone();
                moves.pop();
                let mut board = self.hist.initial_board.clone();
                let mut hist = BoardHistory::new(
                    &board,
                    self.hist.initial_pla,
                    self.hist.rules,
                    self.hist.initial_encore_phase,
                );
                for mv in moves {
                    hist.make_board_move_assume_legal(&mut board, mv.loc, mv.pla, None);
                }
                self.board = board;
                self.hist = hist;
                Ok(String::new())
            }

            "showboard" => {
                let mut out = String::from("\n");
                self.hist
                    .print_basic_info(&mut out, &self.board)
                    .map_err(|e| e.to_string())?;
                Ok(out.trim_end().to_string())
            }

            "final_score" => Ok(self.final_score()),

            _ => Err(format!("unknown command: {command}")),
        }
    }

    /// Pass after an opponent pass past the opening, otherwise sample a board
    /// move from the policy and pass only when none is available.
    fn choose_move(&mut self, pla: Player) -> anyhow::Result<Loc> {
        let opponent_passed = self.hist.move_history.last().is_some_and(|m| m.loc == PASS_LOC);
        if opponent_passed && self.hist.move_history.len() > 2 {
            return Ok(PASS_LOC);
        }
        let params = MiscNNInputParams::default();
        let nn_output = self.evaluator.evaluate(&self.board, &self.hist, pla, &params)?;
        let loc = playutils::choose_random_policy_move(
            &nn_output,
            &self.board,
            &self.hist,
            pla,
            &mut self.rng,
            self.temperature,
            false,
            None,
        );
        Ok(loc.unwrap_or(PASS_LOC))
    }

    /// Score in GTP form: `W+7.5`, `B+R`, `0` or `Void`.
    fn final_score(&self) -> String {
        let mut hist = self.hist.clone();
        if !hist.is_game_finished {
            hist.end_and_score_game_now(&self.board);
        }
        if hist.is_no_result {
            return "Void".to_string();
        }
        let winner = match hist.winner {
            Color::Black => "B",
            Color::White => "W",
            _ => return "0".to_string(),
        };
        if hist.is_resignation {
            format!("{winner}+R")
        } else {
            format!("{winner}+{}", hist.final_white_minus_black_score.abs())
        }
    }
}
