//! Live per-innings accumulators for batters and bowlers, plus the immutable
//! value snapshots copied into balls and overs.
//!
//! The live accumulator is owned by the innings and mutated once per ball;
//! snapshots are explicit copies taken at recording time, never aliases.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::freq::CountVec;
use crate::models::outcome::{BallOutcome, BatterStatus};
use crate::models::player::{Player, StyleClass};

/// Ball-count bucket for frequency conditioning: `(balls - 1) / per`.
/// A participant yet to face (or bowl) a ball has no bucket at all.
pub fn ball_bucket(balls: u32, per: u32) -> Option<u32> {
    balls.checked_sub(1).map(|b| b / per)
}

/// Write-only outcome counters a role accumulates for the external
/// frequency-table builder. Never read during simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleFreqs {
    /// Keyed by own ball-count bucket at the time of recording.
    pub by_balls: BTreeMap<u32, CountVec>,
    /// Keyed by the opposing player's style description.
    pub by_style: BTreeMap<String, CountVec>,
    /// Keyed by the opposing player's name.
    pub by_opponent: BTreeMap<String, CountVec>,
}

impl RoleFreqs {
    pub fn record(&mut self, bucket: Option<u32>, style: &str, opponent: &str, category: usize) {
        if let Some(bucket) = bucket {
            self.by_balls.entry(bucket).or_default()[category] += 1;
        }
        self.by_style.entry(style.to_string()).or_default()[category] += 1;
        self.by_opponent.entry(opponent.to_string()).or_default()[category] += 1;
    }
}

/// A batter's innings, live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batter {
    pub name: String,
    pub batting_style: String,
    /// Arrival order in this innings.
    pub order: usize,
    /// True position in the declared batting order (frequency key).
    pub position: usize,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub status: BatterStatus,
    #[serde(default, skip_serializing_if = "is_default_freqs")]
    pub freqs: RoleFreqs,
}

fn is_default_freqs(f: &RoleFreqs) -> bool {
    *f == RoleFreqs::default()
}

impl Batter {
    pub fn new(player: &Player, order: usize, position: usize) -> Self {
        Self {
            name: player.name.clone(),
            batting_style: player.batting_style.clone(),
            order,
            position,
            runs: 0,
            balls: 0,
            fours: 0,
            sixes: 0,
            status: BatterStatus::NotOut,
            freqs: RoleFreqs::default(),
        }
    }

    pub fn is_out(&self) -> bool {
        self.status.is_out()
    }

    pub fn ball_bucket(&self) -> Option<u32> {
        ball_bucket(self.balls, 20)
    }

    pub fn strike_rate(&self) -> f64 {
        if self.balls == 0 {
            0.0
        } else {
            self.runs as f64 / self.balls as f64 * 100.0
        }
    }

    /// Scorebook line, e.g. `34* (58)`.
    pub fn score_line(&self) -> String {
        format!("{}{} ({})", self.runs, if self.is_out() { "" } else { "*" }, self.balls)
    }

    pub fn apply(&mut self, outcome: &BallOutcome) {
        let bat = outcome.bat_runs() as u32;
        self.runs += bat;
        self.balls += outcome.faces_ball() as u32;
        self.fours += (bat == 4) as u32;
        self.sixes += (bat == 6) as u32;
    }

    pub fn snapshot(&self) -> BatterSnapshot {
        BatterSnapshot {
            name: self.name.clone(),
            runs: self.runs,
            balls: self.balls,
            out: self.is_out(),
        }
    }
}

/// One bowling spell's share of the analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub balls: u32,
    pub maidens: u32,
    pub runs: u32,
    pub wickets: u32,
}

impl Spell {
    pub fn overs(&self) -> f64 {
        self.balls as f64 / 6.0
    }
}

/// A bowler's innings, live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bowler {
    pub name: String,
    pub bowling_style: String,
    pub class: StyleClass,
    pub balls: u32,
    pub maidens: u32,
    pub runs: u32,
    pub wickets: u32,
    pub extras: u32,
    pub spells: Vec<Spell>,
    /// Overs left in the current spell; decremented once per over bowled.
    pub spell_remaining: u8,
    #[serde(default, skip_serializing_if = "is_default_freqs")]
    pub freqs: RoleFreqs,
}

impl Bowler {
    pub fn new(player: &Player, bowling_style: String, class: StyleClass) -> Self {
        Self {
            name: player.name.clone(),
            bowling_style,
            class,
            balls: 0,
            maidens: 0,
            runs: 0,
            wickets: 0,
            extras: 0,
            spells: Vec::new(),
            spell_remaining: 0,
            freqs: RoleFreqs::default(),
        }
    }

    pub fn ball_bucket(&self) -> Option<u32> {
        ball_bucket(self.balls, 30)
    }

    /// Cricket overs notation: complete overs, then balls of the next as the
    /// decimal digit (`14.3` after 87 legal balls).
    pub fn overs(&self) -> f64 {
        (self.balls / 6) as f64 + (self.balls % 6) as f64 / 10.0
    }

    pub fn economy(&self) -> f64 {
        if self.balls == 0 {
            0.0
        } else {
            self.runs as f64 / (self.balls as f64 / 6.0)
        }
    }

    /// Analysis line, e.g. `3 - 41 (12.4)`.
    pub fn score_line(&self) -> String {
        format!("{} - {} ({})", self.wickets, self.runs, self.overs())
    }

    /// Fold one delivery into the analysis and the current spell.
    pub fn apply(&mut self, outcome: &BallOutcome) {
        let legal = outcome.is_legal() as u32;
        let runs = outcome.bowler_runs() as u32;
        let wicket = outcome.bowler_wicket() as u32;
        self.balls += legal;
        self.runs += runs;
        self.wickets += wicket;
        self.extras += outcome.bowler_extras() as u32;
        if let Some(spell) = self.spells.last_mut() {
            spell.balls += legal;
            spell.runs += runs;
            spell.wickets += wicket;
        }
    }

    /// Credit a maiden (called when an over closes scoreless).
    pub fn credit_maiden(&mut self) {
        self.maidens += 1;
        if let Some(spell) = self.spells.last_mut() {
            spell.maidens += 1;
        }
    }

    pub fn begin_spell(&mut self) {
        self.spells.push(Spell::default());
    }

    pub fn snapshot(&self) -> BowlerSnapshot {
        BowlerSnapshot {
            name: self.name.clone(),
            balls: self.balls,
            runs: self.runs,
            wickets: self.wickets,
            spell_remaining: self.spell_remaining,
        }
    }
}

/// Immutable batter view frozen into a ball record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatterSnapshot {
    pub name: String,
    pub runs: u32,
    pub balls: u32,
    pub out: bool,
}

/// Immutable bowler view frozen into an over record. Carries the remaining
/// spell so a replay can restore rotation state exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowlerSnapshot {
    pub name: String,
    pub balls: u32,
    pub runs: u32,
    pub wickets: u32,
    pub spell_remaining: u8,
}

/// Per-fielder credit tally for one innings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldingTally {
    pub catches: u32,
    pub stumpings: u32,
    pub run_outs: u32,
}
