//! Running partnership tracker for the current unbroken pair.

use serde::{Deserialize, Serialize};

use crate::models::outcome::BallOutcome;

/// A (runs, balls) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairTally {
    pub runs: u32,
    pub balls: u32,
}

/// Live counters for the pair at the crease: one tally per crease side plus
/// the combined stand. Reset to zero the instant a wicket falls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Partnership {
    pub sides: [PairTally; 2],
    pub combined: PairTally,
}

impl Partnership {
    /// Fold one delivery in. The striker's tally takes the runs off the bat;
    /// the combined stand takes the full team contribution. Wides do not
    /// count as balls faced.
    pub fn add(&mut self, striker: usize, outcome: &BallOutcome) {
        let faced = outcome.faces_ball() as u32;
        self.sides[striker].runs += outcome.bat_runs() as u32;
        self.sides[striker].balls += faced;
        self.combined.runs += outcome.total_runs() as u32;
        self.combined.balls += faced;
    }

    pub fn reset(&mut self) {
        *self = Partnership::default();
    }

    pub fn snapshot(&self, names: [&str; 2], unbroken: bool) -> PartnershipSnapshot {
        PartnershipSnapshot {
            runs: self.combined.runs,
            balls: self.combined.balls,
            unbroken,
            sides: [
                PartnershipSide {
                    name: names[0].to_string(),
                    runs: self.sides[0].runs,
                    balls: self.sides[0].balls,
                },
                PartnershipSide {
                    name: names[1].to_string(),
                    runs: self.sides[1].runs,
                    balls: self.sides[1].balls,
                },
            ],
        }
    }
}

/// One batter's share of a stand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnershipSide {
    pub name: String,
    pub runs: u32,
    pub balls: u32,
}

/// Immutable view of a stand as recorded on a ball (and in the partnership
/// list). An unbroken stand renders with the trailing `*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnershipSnapshot {
    pub runs: u32,
    pub balls: u32,
    pub unbroken: bool,
    pub sides: [PartnershipSide; 2],
}

impl std::fmt::Display for PartnershipSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} ({}) ({} {} ({}), {} {} ({}))",
            self.runs,
            if self.unbroken { "*" } else { "" },
            self.balls,
            self.sides[0].name,
            self.sides[0].runs,
            self.sides[0].balls,
            self.sides[1].name,
            self.sides[1].runs,
            self.sides[1].balls,
        )
    }
}
