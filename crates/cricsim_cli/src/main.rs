//! cricsim CLI
//!
//! Simulate a test match, print the result and scorecards, save the match
//! for later, and rewind a saved match to any (innings, over, ball) point -
//! replaying it exactly or forking a fresh simulation from there.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cricsim_cli::{load_freqs, load_report, load_squads, save_report, MatchReport};
use cricsim_core::engine::{InningCursor, MatchCursor, MatchEngine, MatchPlan};
use cricsim_core::{demo_squads, FreqModel, Inning, TestMatch};

#[derive(Parser)]
#[command(name = "cricsim")]
#[command(about = "Simulate and replay test cricket matches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a full match
    Simulate {
        /// Random seed for the run
        #[arg(long, default_value = "0")]
        seed: u64,

        /// JSON file with the two squads (defaults to the embedded pair)
        #[arg(long)]
        squads: Option<PathBuf>,

        /// JSON frequency model (defaults to the built-in baseline)
        #[arg(long)]
        freqs: Option<PathBuf>,

        /// Write the full match (with metadata) to this file
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print innings scorecards
        #[arg(long)]
        scorecard: bool,
    },

    /// Rewind a saved match to a point and replay or fork it
    Rewind {
        /// Saved match JSON (as written by `simulate --out`)
        #[arg(long)]
        input: PathBuf,

        /// JSON file with the two squads (defaults to the embedded pair)
        #[arg(long)]
        squads: Option<PathBuf>,

        /// JSON frequency model (defaults to the built-in baseline)
        #[arg(long)]
        freqs: Option<PathBuf>,

        /// Number of innings to replay in full
        #[arg(long)]
        innings: usize,

        /// Overs of the next innings to replay in full
        #[arg(long)]
        over: Option<usize>,

        /// Balls of that over to replay
        #[arg(long)]
        ball: Option<usize>,

        /// Continue with fresh randomness after the stopping point
        #[arg(long)]
        resume: bool,

        /// Seed for the fresh randomness beyond the fork
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Write the rewound match to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate { seed, squads, freqs, out, scorecard } => {
            let teams = match squads {
                Some(path) => load_squads(&path)?,
                None => {
                    let (home, away) = demo_squads();
                    [home, away]
                }
            };
            let freqs = match freqs {
                Some(path) => load_freqs(&path)?,
                None => Arc::new(FreqModel::baseline()),
            };

            println!("Simulating {} vs {} (seed {})", teams[0].team, teams[1].team, seed);
            let mut engine = MatchEngine::new(MatchPlan { teams, seed, freqs })
                .context("Failed to set up the match")?;
            engine.simulate().context("Simulation failed")?;
            print_match(engine.state(), scorecard)?;

            if let Some(path) = out {
                let result = engine.state().outcome()?.to_string();
                let report = MatchReport::new(seed, result, engine.state().clone());
                save_report(&path, &report)?;
                println!("Saved match to {}", path.display());
            }
        }

        Commands::Rewind { input, squads, freqs, innings, over, ball, resume, seed, out } => {
            let report = load_report(&input)?;
            let teams = match squads {
                Some(path) => load_squads(&path)?,
                None => {
                    let (home, away) = demo_squads();
                    [home, away]
                }
            };
            let freqs = match freqs {
                Some(path) => load_freqs(&path)?,
                None => Arc::new(FreqModel::baseline()),
            };

            let engine = MatchEngine::from_state(report.state, teams, freqs, seed)
                .context("Failed to rebuild the saved match")?;
            let cursor = MatchCursor {
                innings,
                within: over.map(|o| InningCursor { over: o, balls: ball }),
            };
            println!(
                "Rewinding to innings {}, over {:?}, ball {:?} ({})",
                innings,
                over,
                ball,
                if resume { "forking fresh" } else { "replay only" }
            );
            let rewound = engine.rewind(cursor, seed, resume).context("Rewind failed")?;
            print_match(rewound.state(), false)?;

            if let Some(path) = out {
                let result = rewound.state().outcome()?.to_string();
                let report = MatchReport::new(seed, result, rewound.state().clone());
                save_report(&path, &report)?;
                println!("Saved rewound match to {}", path.display());
            }
        }
    }

    Ok(())
}

fn print_match(state: &TestMatch, scorecard: bool) -> Result<()> {
    for inn in &state.innings {
        println!(
            "Innings {}: {} {} ({} ov){}",
            inn.index + 1,
            inn.batting_team,
            inn.score,
            inn.overs_label(),
            if inn.declared { " dec" } else { "" }
        );
        if scorecard {
            print_scorecard(inn);
        }
    }
    let clock = state.sessions();
    println!("Time: {} days, {} sessions, {} overs", clock.days, clock.sessions, clock.overs);
    println!("Result: {}", state.outcome()?);
    Ok(())
}

fn print_scorecard(inn: &Inning) {
    let card = inn.batting_card();
    for line in &card.lines {
        println!(
            "  {:<16} {:<28} {:>4} {:>4} {:>3} {:>3} {:>7.2}",
            line.name, line.dismissal, line.runs, line.balls, line.fours, line.sixes,
            line.strike_rate
        );
    }
    println!("  Extras: {}  Total: {} ({} ov, RR {:.2})", card.extras, card.total, card.overs, card.run_rate);
    for line in inn.bowling_card() {
        println!(
            "  {:<16} {:>5.1} {:>2} {:>4} {:>2}  econ {:.2}",
            line.name, line.overs, line.maidens, line.runs, line.wickets, line.economy
        );
    }
    let fow: Vec<String> = inn
        .fall_of_wickets()
        .iter()
        .map(|f| format!("{} ({}, {} ov)", f.score, f.batter, f.over))
        .collect();
    if !fow.is_empty() {
        println!("  Fall: {}", fow.join(", "));
    }
}
