//! Tengen: Go rules engine.
//!
//! ## Usage
//!
//! - `tengen` - Play a demo game
//! - `tengen gtp` - Start a GTP server for GUI integration
//! - `tengen demo` - Play one policy-sampled game and print the result

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use tengen::board::Board;
use tengen::color::Color;
use tengen::constants::{DEFAULT_SIZE, MAX_LEN, NULL_LOC, PASS_LOC};
use tengen::gtp::GtpEngine;
use tengen::history::BoardHistory;
use tengen::nn::{AreaEvaluator, MiscNNInputParams, NNEvaluator};
use tengen::playutils::{self, KomiBots};
use tengen::rules::Rules;
use tengen::sample::PositionSample;

/// Tengen: Go rules engine with superko, encore and scoring support
#[derive(Parser)]
#[command(name = "tengen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Board size
    #[arg(long, global = true, default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// Rules preset such as `tromp-taylor`, `japanese` or `aga`, or a JSON object
    #[arg(long, global = true, default_value = "tromp-taylor")]
    rules: String,

    /// Override the komi of the rules
    #[arg(long, global = true, allow_negative_numbers = true)]
    komi: Option<f32>,

    /// Random seed for move sampling
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the GTP (Go Text Protocol) server for use with GUI applications
    Gtp,
    /// Play one game by sampling from a rule-based policy
    Demo,
}

impl Cli {
    fn rules(&self) -> Result<Rules> {
        let rules: Rules = self
            .rules
            .parse()
            .with_context(|| format!("bad --rules {:?}", self.rules))?;
        match self.komi {
            Some(komi) => Ok(rules.with_komi(komi)?),
            None => Ok(rules),
        }
    }

    fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let rules = cli.rules()?;

    match cli.command {
        Some(Commands::Gtp) => {
            let evaluator = Box::new(AreaEvaluator::new(MAX_LEN, MAX_LEN));
            let mut engine = GtpEngine::with_evaluator(rules, evaluator, cli.rng());
            engine.run()?;
        }
        Some(Commands::Demo) | None => run_demo(&cli, rules)?,
    }
    Ok(())
}

fn run_demo(cli: &Cli, rules: Rules) -> Result<()> {
    let mut rng = cli.rng();
    let mut board = Board::new(cli.size, cli.size)?;
    let initial_board = board.clone();
    let mut hist = BoardHistory::new(&board, Color::Black, rules, 0);
    let evaluator = AreaEvaluator::new(cli.size, cli.size);
    let params = MiscNNInputParams::default();
    info!("demo game on {}x{} with {}", cli.size, cli.size, rules);

    let max_moves = 3 * cli.size * cli.size;
    let mut pla = Color::Black;
    while !hist.is_game_finished && hist.move_history.len() < max_moves {
        let nn_output = evaluator.evaluate(&board, &hist, pla, &params)?;
        let loc = playutils::choose_random_policy_move(&nn_output, &board, &hist, pla, &mut rng, 1.0, false, None)
            .unwrap_or(PASS_LOC);
        let mv = hist.verify_move(&board, loc, pla)?;
        hist.make_verified_move(&mut board, mv, None);
        if !hist.is_game_finished {
            hist.end_game_if_all_pass_alive(&board);
        }
        pla = pla.opp();
    }

    let lead = playutils::compute_lead(KomiBots::single(&evaluator), &board, &mut hist.clone(), pla, &params)?;
    if !hist.is_game_finished {
        hist.end_and_score_game_now(&board);
    }

    let mut out = String::new();
    hist.print_basic_info(&mut out, &board)?;
    print!("{out}");
    match hist.winner {
        Color::Black | Color::White => println!(
            "Result: {} by {} (white lead estimate {lead:+.1})",
            hist.winner,
            hist.final_white_minus_black_score.abs()
        ),
        _ => println!("Result: draw (white lead estimate {lead:+.1})"),
    }

    let sample = PositionSample {
        board: initial_board,
        next_pla: pla,
        moves: hist.move_history.clone(),
        initial_turn_number: 0,
        hint_loc: NULL_LOC,
        weight: 1.0,
    };
    println!("{}", sample.to_json_line());
    Ok(())
}
