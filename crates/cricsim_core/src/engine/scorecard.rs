//! Read-only scorecard views for external report rendering.
//!
//! The engine exposes serializable view structs - batting and bowling cards,
//! fall of wickets, partnerships, per-over summaries - and leaves layout and
//! formatting to the consumer.

use serde::{Deserialize, Serialize};

use crate::engine::inning::Inning;
use crate::engine::partnership::PartnershipSnapshot;
use crate::models::score::Score;

/// One batting-card row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattingLine {
    pub name: String,
    /// Dismissal description ("Not Out" while unbeaten).
    pub dismissal: String,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub strike_rate: f64,
}

/// The batting card with its footer totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattingCard {
    pub team: String,
    pub lines: Vec<BattingLine>,
    pub total: Score,
    pub overs: String,
    pub run_rate: f64,
    /// Team runs not credited to any batter (extras and penalties).
    pub extras: u32,
    pub declared: bool,
}

/// One bowling-analysis row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowlingLine {
    pub name: String,
    pub overs: f64,
    pub maidens: u32,
    pub runs: u32,
    pub wickets: u32,
    pub extras: u32,
    pub economy: f64,
}

/// A fall-of-wicket entry: the score it fell at, who fell, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallOfWicket {
    pub score: Score,
    pub batter: String,
    pub over: String,
}

/// One over's summary row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverSummary {
    pub index: usize,
    pub bowler: String,
    pub balls: Vec<String>,
    pub score: Score,
}

impl Inning {
    pub fn batting_card(&self) -> BattingCard {
        let lines: Vec<BattingLine> = self
            .batters
            .iter()
            .map(|b| BattingLine {
                name: b.name.clone(),
                dismissal: b.status.to_string(),
                runs: b.runs,
                balls: b.balls,
                fours: b.fours,
                sixes: b.sixes,
                strike_rate: b.strike_rate(),
            })
            .collect();
        let bat_runs: u32 = self.batters.iter().map(|b| b.runs).sum();
        let overs_decimal = self.overs_decimal();
        BattingCard {
            team: self.batting_team.clone(),
            lines,
            total: self.score,
            overs: self.overs_label(),
            run_rate: if overs_decimal > 0.0 { self.score.runs as f64 / overs_decimal } else { 0.0 },
            extras: self.score.runs - bat_runs,
            declared: self.declared,
        }
    }

    pub fn bowling_card(&self) -> Vec<BowlingLine> {
        self.bowlers
            .iter()
            .map(|b| BowlingLine {
                name: b.name.clone(),
                overs: b.overs(),
                maidens: b.maidens,
                runs: b.runs,
                wickets: b.wickets,
                extras: b.extras,
                economy: b.economy(),
            })
            .collect()
    }

    /// Wickets in the order they fell. A run out can take the non-striker,
    /// so the name comes off whichever snapshot is marked out.
    pub fn fall_of_wickets(&self) -> Vec<FallOfWicket> {
        self.overs
            .iter()
            .flat_map(|over| &over.balls)
            .filter(|ball| ball.dismissal.is_some())
            .map(|ball| FallOfWicket {
                score: ball.score,
                batter: if ball.striker.out {
                    ball.striker.name.clone()
                } else {
                    ball.non_striker.name.clone()
                },
                over: ball.position_label(),
            })
            .collect()
    }

    /// Every completed stand plus the unbroken one at the crease (if any).
    pub fn partnerships(&self) -> Vec<PartnershipSnapshot> {
        let mut stands: Vec<PartnershipSnapshot> = self
            .overs
            .iter()
            .flat_map(|over| &over.balls)
            .filter(|ball| ball.dismissal.is_some())
            .map(|ball| ball.partnership.clone())
            .collect();
        if let Some(last) = self.last_ball() {
            if last.dismissal.is_none() {
                stands.push(last.partnership.clone());
            }
        }
        stands
    }

    pub fn over_summaries(&self) -> Vec<OverSummary> {
        self.overs
            .iter()
            .map(|over| OverSummary {
                index: over.index,
                bowler: over.bowler.name.clone(),
                balls: over.ball_codes(),
                score: over.score(),
            })
            .collect()
    }
}
