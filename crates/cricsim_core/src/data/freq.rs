//! Historical frequency tables consumed by the outcome generator and the
//! dismissal resolver.
//!
//! The model is read-only for the lifetime of every simulation that shares
//! it; load (or build) it once, wrap it in an `Arc`, and hand it to each
//! `MatchPlan`. Tables are nested count vectors: 8 slots where indices 0-6
//! are runs off the bat and index 7 is a clean wicket, each alongside a
//! precomputed total so empty denominators are visible without summing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::models::outcome::DismissalKind;
use crate::models::player::StyleClass;

/// Outcome count vector: slots 0-6 are runs off the bat, slot 7 a wicket.
pub type CountVec = [u64; 8];

/// Index of the wicket slot in a [`CountVec`].
pub const WICKET_SLOT: usize = 7;

/// Number of per-innings table slots; slot 4 is the all-matches aggregate.
pub const INNINGS_SLOTS: usize = 4;

/// Counts bucketed by a participant's ball count (or an innings' over phase).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketDist {
    #[serde(default)]
    pub buckets: BTreeMap<u32, CountVec>,
    /// Sum over all buckets, kept precomputed by the provider.
    #[serde(default)]
    pub total: CountVec,
}

impl BucketDist {
    pub fn bucket(&self, key: Option<u32>) -> Option<&CountVec> {
        key.and_then(|k| self.buckets.get(&k))
    }
}

/// Size distribution for one extras type (how many runs a wide/bye ran for).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeDist {
    #[serde(default)]
    pub sizes: BTreeMap<u8, u64>,
    #[serde(default)]
    pub total: u64,
}

/// Per style-class extras frequencies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtrasFreqs {
    #[serde(default)]
    pub no_balls: SizeDist,
    #[serde(default)]
    pub wides: SizeDist,
    #[serde(default)]
    pub leg_byes: SizeDist,
    #[serde(default)]
    pub byes: SizeDist,
}

/// Every conditional table for one innings slot (or the aggregate horizon).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseFreqs {
    /// Keyed by true batting position (0-10), then by the batter's
    /// ball-count bucket (`(balls - 1) / 20`).
    #[serde(default)]
    pub batting: BTreeMap<u8, BucketDist>,
    /// Keyed by bowling style class, then by the bowler's ball-count bucket
    /// (`(balls - 1) / 30`).
    #[serde(default)]
    pub bowling: BTreeMap<StyleClass, BucketDist>,
    /// Batting style description x bowling style description. Sparse.
    #[serde(default)]
    pub matchups: BTreeMap<String, BTreeMap<String, CountVec>>,
    /// Keyed by the innings over-phase bucket (legal balls bowled / 60).
    #[serde(default)]
    pub overs: BucketDist,
    #[serde(default)]
    pub extras: BTreeMap<StyleClass, ExtrasFreqs>,
    #[serde(default)]
    pub dismissals: BTreeMap<StyleClass, BTreeMap<DismissalKind, u64>>,
    /// Which fielder (by position in the keeper-less, bowler-less field
    /// order) took a catch. Indices are capped at 8 by the provider.
    #[serde(default)]
    pub catches: BTreeMap<u8, u64>,
    /// Completed runs (0 or 1) on deliveries that ended in a run out.
    #[serde(default)]
    pub run_outs: BTreeMap<u8, u64>,
}

impl PhaseFreqs {
    pub fn matchup(&self, batting_style: &str, bowling_style: &str) -> Option<&CountVec> {
        self.matchups.get(batting_style).and_then(|m| m.get(bowling_style))
    }
}

/// The full frequency contract: four innings slots, an aggregate slot, and
/// the historical toss-decision counts (keys `"bat"` / `"field"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FreqModel {
    pub innings: [PhaseFreqs; INNINGS_SLOTS],
    pub aggregate: PhaseFreqs,
    #[serde(default)]
    pub toss: BTreeMap<String, u64>,
}

impl FreqModel {
    pub fn from_json(json: &str) -> Result<Self> {
        let model: FreqModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        for key in self.toss.keys() {
            if key != "bat" && key != "field" {
                return Err(SimError::InvariantViolation(format!(
                    "toss table has unknown decision '{}'",
                    key
                )));
            }
        }
        for phase in self.innings.iter().chain(std::iter::once(&self.aggregate)) {
            if let Some(pos) = phase.batting.keys().find(|p| **p > 10) {
                return Err(SimError::InvariantViolation(format!(
                    "batting table has position {} outside the XI",
                    pos
                )));
            }
        }
        Ok(())
    }

    /// Innings-phase tables for a 0-based innings index.
    pub fn phase(&self, innings_index: usize) -> &PhaseFreqs {
        &self.innings[innings_index.min(INNINGS_SLOTS - 1)]
    }

    /// The two blending horizons: innings-specific first, aggregate second.
    pub fn horizons(&self, innings_index: usize) -> [&PhaseFreqs; 2] {
        [self.phase(innings_index), &self.aggregate]
    }

    /// A synthetic model with plausible test-cricket tendencies, for demos
    /// and tests. Real deployments load ingested tables instead.
    pub fn baseline() -> Self {
        let mut innings: [PhaseFreqs; INNINGS_SLOTS] = Default::default();
        // Wickets come a touch cheaper as the pitch wears.
        let wicket_scale = [100u64, 100, 112, 128];
        for (idx, phase) in innings.iter_mut().enumerate() {
            *phase = baseline_phase(wicket_scale[idx]);
        }
        let aggregate = baseline_phase(108);

        let mut toss = BTreeMap::new();
        toss.insert("bat".to_string(), 96);
        toss.insert("field".to_string(), 49);

        FreqModel { innings, aggregate, toss }
    }
}

/// Per-10000-ball outcome shape of a typical test innings.
const BASE_OUTCOMES: CountVec = [6490, 2050, 480, 90, 620, 10, 100, 160];

fn scale_vec(base: &CountVec, num: u64) -> CountVec {
    let mut out = [0u64; 8];
    for (slot, value) in base.iter().enumerate() {
        out[slot] = value * num / 100;
    }
    out
}

fn with_wicket_scale(base: &CountVec, wicket_pct: u64) -> CountVec {
    let mut out = *base;
    out[WICKET_SLOT] = base[WICKET_SLOT] * wicket_pct / 100;
    out
}

fn sum_into_total(buckets: &BTreeMap<u32, CountVec>) -> CountVec {
    let mut total = [0u64; 8];
    for vec in buckets.values() {
        for (slot, value) in vec.iter().enumerate() {
            total[slot] += value;
        }
    }
    total
}

fn bucket_dist(vecs: Vec<CountVec>) -> BucketDist {
    let buckets: BTreeMap<u32, CountVec> =
        vecs.into_iter().enumerate().map(|(i, v)| (i as u32, v)).collect();
    let total = sum_into_total(&buckets);
    BucketDist { buckets, total }
}

fn size_dist(pairs: &[(u8, u64)]) -> SizeDist {
    let sizes: BTreeMap<u8, u64> = pairs.iter().copied().collect();
    let total = sizes.values().sum();
    SizeDist { sizes, total }
}

fn baseline_phase(wicket_pct: u64) -> PhaseFreqs {
    // Batting positions: settled top order, jumpier tail. The first ball
    // bucket is the most dangerous everywhere.
    let mut batting = BTreeMap::new();
    for position in 0u8..=10 {
        let risk = match position {
            0..=2 => 100,
            3..=5 => 110,
            6..=7 => 160,
            _ => 260,
        };
        let shape = with_wicket_scale(&BASE_OUTCOMES, risk * wicket_pct / 100);
        let mut vecs = Vec::new();
        for bucket in 0u64..8 {
            let early = if bucket == 0 { 140 } else { 100 };
            vecs.push(scale_vec(&with_wicket_scale(&shape, early), 6));
        }
        batting.insert(position, bucket_dist(vecs));
    }

    // Pace buys more edges behind the wicket; spin trades boundaries for
    // singles and brings the stumps into play.
    let fast_shape = with_wicket_scale(&BASE_OUTCOMES, wicket_pct);
    let mut spin_shape = with_wicket_scale(&BASE_OUTCOMES, wicket_pct * 92 / 100);
    spin_shape[1] += 40;
    spin_shape[4] = spin_shape[4] * 70 / 100;
    let mut bowling = BTreeMap::new();
    for (class, shape) in [(StyleClass::Fast, fast_shape), (StyleClass::Spin, spin_shape)] {
        let vecs = (0u64..10).map(|_| scale_vec(&shape, 9)).collect();
        bowling.insert(class, bucket_dist(vecs));
    }

    // Over phases: two new-ball buckets, a long becalmed middle, a late
    // charge once the field spreads.
    let mut over_vecs = Vec::new();
    for bucket in 0u64..18 {
        let shape = match bucket {
            0 | 1 => with_wicket_scale(&BASE_OUTCOMES, 125 * wicket_pct / 100),
            2..=7 => with_wicket_scale(&BASE_OUTCOMES, wicket_pct),
            _ => {
                let mut v = with_wicket_scale(&BASE_OUTCOMES, 110 * wicket_pct / 100);
                v[4] += 14;
                v[6] += 4;
                v
            }
        };
        over_vecs.push(scale_vec(&shape, 60));
    }
    let overs = bucket_dist(over_vecs);

    // Totals are read against the over-phase ball counts above (~108,000
    // balls, ~70,000 of them dots), so these counts land near real-world
    // per-ball rates for each extra.
    let mut extras = BTreeMap::new();
    extras.insert(
        StyleClass::Fast,
        ExtrasFreqs {
            no_balls: size_dist(&[(1, 380), (2, 40), (5, 14)]),
            wides: size_dist(&[(1, 250), (2, 30), (5, 10)]),
            leg_byes: size_dist(&[(1, 900), (2, 160), (4, 200)]),
            byes: size_dist(&[(1, 120), (2, 40), (4, 200)]),
        },
    );
    extras.insert(
        StyleClass::Spin,
        ExtrasFreqs {
            no_balls: size_dist(&[(1, 40)]),
            wides: size_dist(&[(1, 60), (2, 8)]),
            leg_byes: size_dist(&[(1, 300), (2, 50), (4, 40)]),
            byes: size_dist(&[(1, 120), (2, 30), (4, 140)]),
        },
    );

    let mut dismissals = BTreeMap::new();
    dismissals.insert(
        StyleClass::Fast,
        BTreeMap::from([
            (DismissalKind::Caught, 440u64),
            (DismissalKind::CaughtBehind, 180),
            (DismissalKind::Bowled, 185),
            (DismissalKind::Lbw, 175),
            (DismissalKind::CaughtAndBowled, 12),
            (DismissalKind::HitWicket, 4),
        ]),
    );
    dismissals.insert(
        StyleClass::Spin,
        BTreeMap::from([
            (DismissalKind::Caught, 360u64),
            (DismissalKind::CaughtBehind, 60),
            (DismissalKind::Bowled, 150),
            (DismissalKind::Lbw, 190),
            (DismissalKind::Stumped, 70),
            (DismissalKind::CaughtAndBowled, 25),
            (DismissalKind::HitWicket, 2),
        ]),
    );

    let catches = BTreeMap::from([
        (0u8, 230u64),
        (1, 180),
        (2, 150),
        (3, 120),
        (4, 100),
        (5, 80),
        (6, 60),
        (7, 45),
        (8, 35),
    ]);
    let run_outs = BTreeMap::from([(0u8, 90u64), (1, 155)]);

    PhaseFreqs {
        batting,
        bowling,
        matchups: BTreeMap::new(),
        overs,
        extras,
        dismissals,
        catches,
        run_outs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_validates_and_round_trips() {
        let model = FreqModel::baseline();
        model.validate().unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let back = FreqModel::from_json(&json).unwrap();
        assert_eq!(model, back);
    }

    #[test]
    fn totals_are_bucket_sums() {
        let model = FreqModel::baseline();
        for phase in model.innings.iter().chain(std::iter::once(&model.aggregate)) {
            let recomputed = sum_into_total(&phase.overs.buckets);
            assert_eq!(phase.overs.total, recomputed);
            for dist in phase.batting.values() {
                assert_eq!(dist.total, sum_into_total(&dist.buckets));
            }
        }
    }

    #[test]
    fn unknown_toss_key_is_rejected() {
        let mut model = FreqModel::baseline();
        model.toss.insert("bowl first".into(), 3);
        assert!(model.validate().is_err());
    }

    #[test]
    fn fourth_innings_is_the_most_wicket_prone() {
        let model = FreqModel::baseline();
        let w = |phase: &PhaseFreqs| phase.overs.total[WICKET_SLOT];
        assert!(w(&model.innings[3]) > w(&model.innings[0]));
    }
}
