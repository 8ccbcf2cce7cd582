//! Immutable delivery and over records.
//!
//! A `Ball` is created exactly once per delivery and never mutated after the
//! innings moves on, except that the dismissal resolver attaches its record
//! before the ball is sealed. Balls carry every random decision made around
//! them, which makes the over list a complete replay script.

use serde::{Deserialize, Serialize};

use crate::engine::participants::{BatterSnapshot, BowlerSnapshot};
use crate::engine::partnership::PartnershipSnapshot;
use crate::models::outcome::{BallOutcome, DismissalKind};
use crate::models::score::Score;

/// The recorded dismissal decisions of one wicket ball: enough to replay the
/// resolver verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissalRecord {
    pub kind: DismissalKind,
    pub fielder: Option<String>,
    /// Which of the pair was out (run outs can claim the non-striker).
    pub out_is_striker: bool,
}

/// One delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub outcome: BallOutcome,
    /// 0-based over this ball belongs to.
    pub over_index: usize,
    /// 1-based legal-ball slot at the moment of delivery; repeats after an
    /// illegal delivery.
    pub ball_in_over: u8,
    /// Team score immediately after this ball.
    pub score: Score,
    /// Stand at the crease including this ball (pre-reset on a wicket).
    pub partnership: PartnershipSnapshot,
    pub striker: BatterSnapshot,
    pub non_striker: BatterSnapshot,
    pub bowler: BowlerSnapshot,
    /// Recorded crease side on strike for the next delivery.
    pub next_striker: u8,
    pub dismissal: Option<DismissalRecord>,
    /// Set when the captain declared the innings closed on this ball.
    #[serde(default)]
    pub declared: bool,
}

impl Ball {
    /// Continuous over position, over number plus legal balls / 10.
    pub fn position(&self) -> f32 {
        self.over_index as f32 + self.ball_in_over as f32 / 10.0
    }

    /// Scorebook position, e.g. `45.3`.
    pub fn position_label(&self) -> String {
        format!("{}.{}", self.over_index, self.ball_in_over)
    }
}

/// Six legal deliveries from one end by one bowler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Over {
    /// 0-based over number within the innings.
    pub index: usize,
    /// Team score when the over began.
    pub opening_score: Score,
    /// Bowler snapshot; identity fixed at over start, figures refreshed as
    /// the over progresses so the sealed over carries final numbers.
    pub bowler: BowlerSnapshot,
    pub balls: Vec<Ball>,
}

impl Over {
    pub fn new(index: usize, opening_score: Score, bowler: BowlerSnapshot) -> Self {
        Self { index, opening_score, bowler, balls: Vec::with_capacity(6) }
    }

    /// Legal deliveries bowled so far (no-balls and wides excluded).
    pub fn legal_balls(&self) -> u8 {
        self.balls.iter().filter(|b| b.outcome.is_legal()).count() as u8
    }

    pub fn is_complete(&self) -> bool {
        self.legal_balls() >= 6
    }

    /// Runs charged to the bowler across the over (byes and leg-byes are
    /// the only exemptions; a wide spoils a maiden).
    pub fn conceded(&self) -> u32 {
        self.balls
            .iter()
            .filter(|b| !matches!(b.outcome, BallOutcome::LegBye(_) | BallOutcome::Bye(_)))
            .map(|b| b.outcome.total_runs() as u32)
            .sum()
    }

    pub fn is_maiden(&self) -> bool {
        self.is_complete() && self.conceded() == 0
    }

    /// Score at the end of the over so far; the baseline before any ball.
    pub fn score(&self) -> Score {
        self.balls.last().map(|b| b.score).unwrap_or(self.opening_score)
    }

    /// Legacy ball codes in delivery order, e.g. `["0", "4", "1nb", "W"]`.
    pub fn ball_codes(&self) -> Vec<String> {
        self.balls.iter().map(|b| b.outcome.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::partnership::Partnership;

    fn snapshot_pair() -> (BatterSnapshot, BatterSnapshot) {
        (
            BatterSnapshot { name: "A".into(), runs: 0, balls: 1, out: false },
            BatterSnapshot { name: "B".into(), runs: 0, balls: 0, out: false },
        )
    }

    fn ball(outcome: BallOutcome, over_index: usize, ball_in_over: u8) -> Ball {
        let (striker, non_striker) = snapshot_pair();
        Ball {
            outcome,
            over_index,
            ball_in_over,
            score: Score::default(),
            partnership: Partnership::default().snapshot(["A", "B"], true),
            striker,
            non_striker,
            bowler: BowlerSnapshot {
                name: "X".into(),
                balls: 0,
                runs: 0,
                wickets: 0,
                spell_remaining: 5,
            },
            next_striker: 0,
            dismissal: None,
            declared: false,
        }
    }

    fn over_with(outcomes: &[BallOutcome]) -> Over {
        let mut over = Over::new(
            3,
            Score::default(),
            BowlerSnapshot { name: "X".into(), balls: 0, runs: 0, wickets: 0, spell_remaining: 5 },
        );
        let mut legal = 0u8;
        for outcome in outcomes {
            over.balls.push(ball(*outcome, 3, legal + 1));
            legal += outcome.is_legal() as u8;
        }
        over
    }

    #[test]
    fn over_closes_on_six_legal_balls_only() {
        let over = over_with(&[
            BallOutcome::Runs(0),
            BallOutcome::NoBall(2),
            BallOutcome::Runs(1),
            BallOutcome::Wide(0),
            BallOutcome::Runs(0),
            BallOutcome::Runs(0),
            BallOutcome::Runs(4),
        ]);
        assert_eq!(over.legal_balls(), 5);
        assert!(!over.is_complete());

        let complete = over_with(&[BallOutcome::Runs(0); 6]);
        assert!(complete.is_complete());
    }

    #[test]
    fn maiden_ignores_byes_but_not_wides() {
        let with_byes = over_with(&[
            BallOutcome::Runs(0),
            BallOutcome::LegBye(2),
            BallOutcome::Bye(1),
            BallOutcome::Runs(0),
            BallOutcome::Runs(0),
            BallOutcome::Runs(0),
        ]);
        assert!(with_byes.is_maiden());

        let with_wide = over_with(&[
            BallOutcome::Runs(0),
            BallOutcome::Wide(0),
            BallOutcome::Runs(0),
            BallOutcome::Runs(0),
            BallOutcome::Runs(0),
            BallOutcome::Runs(0),
            BallOutcome::Runs(0),
        ]);
        assert!(!with_wide.is_maiden());
    }

    #[test]
    fn position_is_over_plus_tenths() {
        let b = ball(BallOutcome::Runs(1), 45, 3);
        assert!((b.position() - 45.3).abs() < 1e-6);
        assert_eq!(b.position_label(), "45.3");
    }
}
