//! Match Simulation Engine
//!
//! Core simulation module: the match -> innings -> over -> ball state
//! machine, the bowler-rotation policy, the partnership tracker, the
//! weighted-random outcome generator and the dismissal resolver.
//!
//! ## Architecture
//!
//! - `rng` - the single injectable random source per run (ChaCha8, seeded)
//! - `outcome_gen` - blended conditional distributions -> one ball outcome
//! - `dismissal` - who is out, how, and off whose hand
//! - `participants` / `partnership` / `ball` - live accumulators and the
//!   immutable records snapshotted from them
//! - `inning` - over/ball progression, rotation, queueing, rewind-to-index
//! - `match_sim` - toss, innings sequencing, follow-on, target, result
//! - `scorecard` - read-only views for report consumers
//!
//! Every stochastic decision is recorded on the ball/over that carries it,
//! and every operation that consumes randomness accepts the recorded value
//! instead, which is what makes exact replay and forking possible.

pub mod ball;
pub mod dismissal;
pub mod inning;
pub mod match_sim;
pub mod outcome_gen;
pub mod participants;
pub mod partnership;
pub mod rng;
pub mod scorecard;

pub use ball::{Ball, DismissalRecord, Over};
pub use inning::{
    Inning, InningCtx, InningCursor, InningFreqs, PenaltyPhase, PenaltyRuns, MATCH_DAYS,
    OVERS_PER_DAY, OVERS_PER_SESSION,
};
pub use match_sim::{
    compute_target, follow_on_forced, MatchCursor, MatchEngine, MatchOutcome, MatchPlan,
    SessionClock, TestMatch, Toss, TossDecision,
};
pub use outcome_gen::{OutcomeGenerator, FACTOR_WEIGHTS, HORIZON_WEIGHTS};
pub use participants::{Batter, BatterSnapshot, Bowler, BowlerSnapshot, FieldingTally, Spell};
pub use partnership::{PairTally, Partnership, PartnershipSnapshot};
pub use rng::SimRng;
pub use scorecard::{BattingCard, BattingLine, BowlingLine, FallOfWicket, OverSummary};
