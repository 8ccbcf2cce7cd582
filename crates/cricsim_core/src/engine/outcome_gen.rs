//! Weighted-random ball outcome generation.
//!
//! Two horizons (this innings slot, all-matches aggregate) each blend up to
//! seven conditional count vectors with fixed factor weights; the horizons
//! then combine 70/30. Absent or zero-sum vectors contribute nothing and the
//! remaining weights are deliberately NOT renormalized - the under-summing
//! blend is observed behavior the weighted draw tolerates. Extras are then
//! overlaid as independent threshold draws against the innings-phase totals.

use crate::data::freq::{CountVec, FreqModel, PhaseFreqs};
use crate::engine::participants::{Batter, Bowler};
use crate::engine::rng::SimRng;
use crate::error::{Result, SimError};
use crate::models::outcome::BallOutcome;

/// Innings-phase horizon first, aggregate horizon second.
pub const HORIZON_WEIGHTS: [f64; 2] = [0.7, 0.3];

/// Factor weights: batter bucket, batter total, bowler bucket, bowler total,
/// style matchup, over phase, over-phase total.
pub const FACTOR_WEIGHTS: [f64; 7] = [0.15, 0.5, 0.05, 0.1, 0.05, 0.1, 0.05];

pub struct OutcomeGenerator<'a> {
    freqs: &'a FreqModel,
    innings_index: usize,
}

impl<'a> OutcomeGenerator<'a> {
    pub fn new(freqs: &'a FreqModel, innings_index: usize) -> Self {
        Self { freqs, innings_index }
    }

    /// Blend the conditional distributions into one 8-category weight vector
    /// over {0..6 runs, wicket}.
    pub fn blend(&self, batter: &Batter, bowler: &Bowler, phase_bucket: u32) -> [f64; 8] {
        let mut weights = [0.0f64; 8];
        for (phase, w1) in self.freqs.horizons(self.innings_index).into_iter().zip(HORIZON_WEIGHTS)
        {
            let batting = phase.batting.get(&(batter.position as u8));
            let bowling = phase.bowling.get(&bowler.class);
            let factors: [Option<&CountVec>; 7] = [
                batting.and_then(|d| d.bucket(batter.ball_bucket())),
                batting.map(|d| &d.total),
                bowling.and_then(|d| d.bucket(bowler.ball_bucket())),
                bowling.map(|d| &d.total),
                phase.matchup(&batter.batting_style, &bowler.bowling_style),
                phase.overs.bucket(Some(phase_bucket)),
                Some(&phase.overs.total),
            ];
            for (factor, w2) in factors.into_iter().zip(FACTOR_WEIGHTS) {
                let Some(vec) = factor else { continue };
                let sum: u64 = vec.iter().sum();
                if sum == 0 {
                    continue;
                }
                for (slot, count) in vec.iter().enumerate() {
                    weights[slot] += w1 * w2 * *count as f64 / sum as f64;
                }
            }
        }
        weights
    }

    /// Draw one outcome for the delivery about to be bowled.
    pub fn draw(
        &self,
        rng: &mut SimRng,
        batter: &Batter,
        bowler: &Bowler,
        phase_bucket: u32,
    ) -> Result<BallOutcome> {
        let weights = self.blend(batter, bowler, phase_bucket);
        let category = rng
            .weighted(&weights)
            .ok_or(SimError::EmptyDistribution { innings: self.innings_index })?;

        Ok(self.overlay_extras(rng, category, bowler, self.freqs.phase(self.innings_index)))
    }

    /// Reclassify the drawn category as an extra or a run out, by threshold
    /// draws against the innings-phase ball counts. A zero denominator
    /// disables its branch; an empty size table skips reclassification.
    fn overlay_extras(
        &self,
        rng: &mut SimRng,
        category: usize,
        bowler: &Bowler,
        phase: &PhaseFreqs,
    ) -> BallOutcome {
        let total = &phase.overs.total;
        let all_balls: u64 = total.iter().sum();
        let extras = phase.extras.get(&bowler.class).cloned().unwrap_or_default();

        let wicket = category == 7;
        let runs = if wicket { 0u8 } else { category as u8 };

        if threshold_hit(rng, extras.no_balls.total, all_balls) {
            return BallOutcome::NoBall(runs);
        }
        if threshold_hit(rng, extras.wides.total, all_balls) {
            if let Some(size) = rng.weighted_count(extras.wides.sizes.iter()) {
                return BallOutcome::Wide(size.saturating_sub(1));
            }
        }
        if !wicket && runs == 0 && threshold_hit(rng, extras.leg_byes.total, total[0]) {
            if let Some(size) = rng.weighted_count(extras.leg_byes.sizes.iter()) {
                if *size >= 1 {
                    return BallOutcome::LegBye(*size);
                }
            }
        }
        if !wicket && runs == 0 && threshold_hit(rng, extras.byes.total, total[0]) {
            if let Some(size) = rng.weighted_count(extras.byes.sizes.iter()) {
                if *size >= 1 {
                    return BallOutcome::Bye(*size);
                }
            }
        }
        if !wicket && runs <= 1 {
            // A missing run-out count defaults to 1: vanishingly rare rather
            // than impossible.
            let count = phase.run_outs.get(&runs).copied().unwrap_or(1);
            if threshold_hit(rng, count, total[category]) {
                return BallOutcome::RunOut(runs);
            }
        }

        if wicket {
            BallOutcome::Wicket
        } else {
            BallOutcome::Runs(runs)
        }
    }
}

/// `count > U(0, denominator)`, with a zero denominator reading as zero
/// probability (never a division error, never a certain hit).
fn threshold_hit(rng: &mut SimRng, count: u64, denominator: u64) -> bool {
    if denominator == 0 {
        return false;
    }
    count as f64 > rng.uniform(denominator as f64)
}
