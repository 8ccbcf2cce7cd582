//! # cricsim_core - Deterministic Test Cricket Match Simulation Engine
//!
//! Ball-by-ball simulation of multi-day test matches, drawing each delivery
//! from probability distributions learned from historical match data, with
//! exact deterministic replay of any recorded match up to an arbitrary point
//! and the option to fork a fresh simulation from there.
//!
//! ## Features
//! - 100% deterministic simulation (same seed + same inputs = same match)
//! - Realistic scorecards: batting/bowling cards, fall of wickets,
//!   partnerships, spells, sessions
//! - Rewind any match to (innings, over, ball) and replay or fork
//! - Read-only frequency model shared across concurrent simulations

use std::sync::Arc;

pub mod data;
pub mod engine;
pub mod error;
pub mod models;

pub use data::{demo_squads, FreqModel};
pub use engine::{
    Inning, InningCursor, MatchCursor, MatchEngine, MatchOutcome, MatchPlan, SessionClock,
    TestMatch, Toss, TossDecision,
};
pub use error::{Result, SimError};
pub use models::{BallOutcome, Dismissal, DismissalKind, Player, Score, Squad, StyleClass};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenience entry point: simulate one match with the embedded demo
/// squads and the baseline frequency model.
pub fn simulate_demo_match(seed: u64) -> Result<TestMatch> {
    let (home, away) = demo_squads();
    let plan = MatchPlan { teams: [home, away], seed, freqs: Arc::new(FreqModel::baseline()) };
    let mut engine = MatchEngine::new(plan)?;
    engine.simulate()?;
    Ok(engine.state().clone())
}


#[cfg(test)]
mod invariants {
    //! Property sweep: the structural invariants hold for any seed.

    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn structural_invariants_hold(seed in any::<u64>()) {
            let state = simulate_demo_match(seed).unwrap();
            for inn in &state.innings {
                // Wickets bounded; score reconciles with ball contributions.
                prop_assert!(inn.score.wickets <= 10);
                let ball_runs: u32 = inn
                    .overs
                    .iter()
                    .flat_map(|o| &o.balls)
                    .map(|b| b.outcome.total_runs() as u32)
                    .sum();
                prop_assert_eq!(inn.score.runs, ball_runs);

                // Every over before the live one closed on six legal balls.
                for over in &inn.overs[..inn.overs.len().saturating_sub(1)] {
                    prop_assert_eq!(over.legal_balls(), 6);
                }

                // Partnership snapshots agree with the not-out pair's shares.
                for ball in inn.overs.iter().flat_map(|o| &o.balls) {
                    let p = &ball.partnership;
                    prop_assert!(
                        p.runs >= p.sides[0].runs + p.sides[1].runs,
                        "stand total below the batters' shares"
                    );
                }
            }
        }
    }
}
