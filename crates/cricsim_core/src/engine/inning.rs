//! The innings state machine.
//!
//! Drives over/ball progression, bowler rotation, batter queueing, strike
//! rotation and end-of-innings detection, and owns rewind-to-index. Every
//! stochastic step accepts an optional recorded value (the ball and over
//! records themselves) so a replay re-drives history without touching the
//! random stream.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::freq::{CountVec, FreqModel};
use crate::engine::ball::{Ball, Over};
use crate::engine::dismissal;
use crate::engine::outcome_gen::OutcomeGenerator;
use crate::engine::participants::{Batter, Bowler, FieldingTally};
use crate::engine::partnership::Partnership;
use crate::engine::rng::SimRng;
use crate::error::{Result, SimError};
use crate::models::outcome::{BallOutcome, BatterStatus, DismissalKind};
use crate::models::player::StyleClass;
use crate::models::score::Score;
use crate::models::team::Squad;

/// Legal overs available per playing day (3 sessions of 30).
pub const OVERS_PER_DAY: u32 = 90;
pub const OVERS_PER_SESSION: u32 = 30;
pub const MATCH_DAYS: u32 = 5;

/// Everything an innings needs from its surroundings while being driven:
/// the shared read-only model, the run's random stream, the two rosters and
/// the overs already used up by earlier innings.
pub struct InningCtx<'a> {
    pub rng: &'a mut SimRng,
    pub model: &'a FreqModel,
    pub batting: &'a Squad,
    pub bowling: &'a Squad,
    pub prior_overs: u32,
}

/// Stopping point inside an innings: `over` full overs replayed, then
/// optionally the first `balls` deliveries of the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InningCursor {
    pub over: usize,
    pub balls: Option<usize>,
}

impl InningCursor {
    /// Cursor covering a completed innings in full.
    pub fn whole(inning: &Inning) -> Self {
        Self { over: inning.overs.len(), balls: None }
    }
}

/// Write-only frequency counters accumulated for the external table builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InningFreqs {
    /// Outcome counts per over-phase bucket.
    pub overs: BTreeMap<u32, CountVec>,
    /// Extras size counts (keyed by total runs) per bowling style class.
    pub extras: BTreeMap<StyleClass, ExtrasCounters>,
    pub dismissals: BTreeMap<StyleClass, BTreeMap<DismissalKind, u64>>,
    /// Catch counts by fielder position (capped at 8).
    pub catches: BTreeMap<u8, u64>,
    /// Run-out counts by completed runs.
    pub run_outs: BTreeMap<u8, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtrasCounters {
    pub no_balls: BTreeMap<u8, u64>,
    pub wides: BTreeMap<u8, u64>,
    pub leg_byes: BTreeMap<u8, u64>,
    pub byes: BTreeMap<u8, u64>,
}

/// Pre/post-innings penalty runs awarded against the fielding side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyRuns {
    pub pre: u32,
    pub post: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenaltyPhase {
    Pre,
    Post,
}

/// One innings: live while being driven, immutable once ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inning {
    /// 0-based innings number within the match.
    pub index: usize,
    pub batting_team: String,
    pub bowling_team: String,
    pub overs: Vec<Over>,
    pub batters: Vec<Batter>,
    pub bowlers: Vec<Bowler>,
    pub score: Score,
    #[serde(default)]
    pub penalties: PenaltyRuns,
    /// Chase target; set for the 4th innings only.
    pub target: Option<u32>,
    /// Names yet to bat, next in first.
    pub to_bat: Vec<String>,
    /// Frontline attack in declared order (keeper excluded).
    pub attack: Vec<String>,
    pub seamers: Vec<String>,
    pub spinners: Vec<String>,
    /// Occasional bowlers outside the frontline order.
    pub part_time: Vec<String>,
    /// Fielding side minus the keeper, in fielding order.
    pub fielders: Vec<String>,
    pub keeper: Option<String>,
    /// Per-fielder credit book, all eleven.
    pub fielding: BTreeMap<String, FieldingTally>,
    pub freqs: InningFreqs,
    #[serde(default)]
    pub declared: bool,
    #[serde(skip)]
    partnership: Partnership,
    #[serde(default)]
    ended: bool,
}

impl Inning {
    pub fn new(
        index: usize,
        batting: &Squad,
        bowling: &Squad,
        target: Option<u32>,
    ) -> Result<Self> {
        let keeper = bowling.keeper().map(|p| p.name.clone());
        let fielding: BTreeMap<String, FieldingTally> =
            bowling.players.iter().map(|p| (p.name.clone(), FieldingTally::default())).collect();
        let fielders: Vec<String> = bowling
            .players
            .iter()
            .map(|p| p.name.clone())
            .filter(|n| Some(n) != keeper.as_ref())
            .collect();

        let attack: Vec<String> =
            bowling.bowling_order.iter().filter(|n| fielders.contains(n)).cloned().collect();
        let class_of = |name: &String| bowling.player(name).and_then(|p| p.bowling_class());
        let seamers: Vec<String> =
            attack.iter().filter(|n| class_of(n) == Some(StyleClass::Fast)).cloned().collect();
        let spinners: Vec<String> =
            attack.iter().filter(|n| class_of(n) == Some(StyleClass::Spin)).cloned().collect();
        let part_time: Vec<String> = fielders
            .iter()
            .filter(|n| !attack.contains(n))
            .filter(|n| bowling.player(n).map(|p| p.can_bowl()).unwrap_or(false))
            .cloned()
            .collect();

        let mut inning = Inning {
            index,
            batting_team: batting.team.clone(),
            bowling_team: bowling.team.clone(),
            overs: Vec::new(),
            batters: Vec::new(),
            bowlers: Vec::new(),
            score: Score::default(),
            penalties: PenaltyRuns::default(),
            target,
            to_bat: batting.players.iter().map(|p| p.name.clone()).collect(),
            attack,
            seamers,
            spinners,
            part_time,
            fielders,
            keeper,
            fielding,
            freqs: InningFreqs::default(),
            declared: false,
            partnership: Partnership::default(),
            ended: false,
        };

        // Openers take the crease immediately.
        for _ in 0..2 {
            let name = inning.to_bat.remove(0);
            inning.new_batter(batting, &name)?;
        }
        Ok(inning)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All out, target reached (4th innings) or declared.
    pub fn end_reached(&self) -> bool {
        self.all_out()
            || self.target.map(|t| self.score.runs >= t).unwrap_or(false)
            || self.declared
    }

    /// Fewer than two batters remain available: the side is bowled out (or
    /// out of fit batters). Checked before drawing a ball, never after.
    pub fn all_out(&self) -> bool {
        let at_crease =
            self.batters.iter().filter(|b| matches!(b.status, BatterStatus::NotOut)).count();
        at_crease + self.to_bat.len() < 2
    }

    pub fn is_complete(&self) -> bool {
        self.ended
    }

    /// Overs that count toward the session clock: all of them once the last
    /// is complete (or the innings is over), otherwise all but the live one.
    pub fn complete_overs(&self) -> u32 {
        match self.overs.last() {
            None => 0,
            Some(over) if over.is_complete() || self.end_reached() => self.overs.len() as u32,
            Some(_) => self.overs.len() as u32 - 1,
        }
    }

    /// Over-phase bucket fed to the outcome generator: legal balls bowled so
    /// far, in ten-over chunks.
    pub fn phase_bucket(&self) -> u32 {
        match self.overs.last() {
            None => 0,
            Some(over) => {
                let prior = 6 * (self.overs.len() as u32 - 1);
                (prior + (over.legal_balls() as u32).saturating_sub(1)) / 60
            }
        }
    }

    /// Scorebook overs label: `"47"` after a completed over, else `"46.3"`.
    pub fn overs_label(&self) -> String {
        match self.overs.last() {
            None => "0".to_string(),
            Some(over) if over.is_complete() => format!("{}", self.overs.len()),
            Some(over) => format!("{}.{}", self.overs.len() - 1, over.legal_balls()),
        }
    }

    /// Overs as a fraction of six-ball units, for run rates.
    pub fn overs_decimal(&self) -> f64 {
        match self.overs.last() {
            None => 0.0,
            Some(over) if over.is_complete() => self.overs.len() as f64,
            Some(over) => (self.overs.len() - 1) as f64 + over.legal_balls() as f64 / 6.0,
        }
    }

    pub fn last_ball(&self) -> Option<&Ball> {
        self.overs.iter().rev().find_map(|over| over.balls.last())
    }

    fn bowler_index(&self, name: &str) -> Option<usize> {
        self.bowlers.iter().position(|b| b.name == name)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    fn new_batter(&mut self, batting: &Squad, name: &str) -> Result<usize> {
        let player = batting.player(name).ok_or_else(|| SimError::UnknownPlayer {
            name: name.to_string(),
            team: batting.team.clone(),
        })?;
        let position = batting.position(name).unwrap_or(self.batters.len());
        self.batters.push(Batter::new(player, self.batters.len(), position));
        Ok(self.batters.len() - 1)
    }

    fn ensure_bowler(&mut self, bowling: &Squad, name: &str) -> Result<usize> {
        if let Some(idx) = self.bowler_index(name) {
            return Ok(idx);
        }
        let player = bowling.player(name).ok_or_else(|| SimError::UnknownPlayer {
            name: name.to_string(),
            team: bowling.team.clone(),
        })?;
        let style = player.bowling_style.clone().ok_or_else(|| {
            SimError::InvariantViolation(format!("'{}' put on to bowl without a style", name))
        })?;
        let class = player.bowling_class().ok_or_else(|| {
            SimError::InvariantViolation(format!("'{}' has an unclassified bowling style", name))
        })?;
        self.bowlers.push(Bowler::new(player, style, class));
        Ok(self.bowlers.len() - 1)
    }

    // ========================================================================
    // Driving
    // ========================================================================

    /// Run the innings to its end (or until the match runs out of days).
    pub fn run(&mut self, ctx: &mut InningCtx<'_>) -> Result<()> {
        while !self.end_reached() && self.days_elapsed(ctx) < MATCH_DAYS {
            self.step(ctx)?;
        }
        self.seal_if_ended()
    }

    /// Bowl one delivery (opening a fresh over first when due).
    pub fn step(&mut self, ctx: &mut InningCtx<'_>) -> Result<()> {
        if self.ended {
            return Err(SimError::InvariantViolation(
                "step on an innings that already ended".to_string(),
            ));
        }
        if self.overs.last().map_or(true, |over| over.is_complete()) {
            self.next_over(ctx, None)?;
        }
        self.next_ball(ctx, None)
    }

    fn days_elapsed(&self, ctx: &InningCtx<'_>) -> u32 {
        (ctx.prior_overs + self.complete_overs()) / OVERS_PER_DAY
    }

    /// Mark the innings finished; the end condition fires exactly once.
    fn seal(&mut self) -> Result<()> {
        if self.ended {
            return Err(SimError::InvariantViolation(
                "innings end condition re-triggered".to_string(),
            ));
        }
        self.ended = true;
        Ok(())
    }

    fn seal_if_ended(&mut self) -> Result<()> {
        if self.end_reached() && !self.ended {
            self.seal()?;
        }
        Ok(())
    }

    /// The captain calls the batters in. Ends the innings immediately and
    /// annotates the final ball.
    pub fn declare(&mut self) -> Result<()> {
        if self.ended || self.end_reached() {
            return Err(SimError::InvariantViolation(
                "declaration after the innings already ended".to_string(),
            ));
        }
        self.declared = true;
        if let Some(ball) = self.overs.last_mut().and_then(|over| over.balls.last_mut()) {
            ball.declared = true;
        }
        self.seal()
    }

    /// Record a listed batter as unable to bat.
    pub fn mark_absent_hurt(&mut self, batting: &Squad, name: &str) -> Result<()> {
        let queued = self.to_bat.iter().position(|n| n == name).ok_or_else(|| {
            SimError::InvariantViolation(format!(
                "'{}' cannot be absent hurt: already batting or unknown",
                name
            ))
        })?;
        self.to_bat.remove(queued);
        let idx = self.new_batter(batting, name)?;
        self.batters[idx].status = BatterStatus::AbsentHurt;
        Ok(())
    }

    /// Award penalty runs to the batting side.
    pub fn apply_penalty(&mut self, phase: PenaltyPhase, runs: u32) {
        match phase {
            PenaltyPhase::Pre => self.penalties.pre += runs,
            PenaltyPhase::Post => self.penalties.post += runs,
        }
        self.score.runs += runs;
    }

    /// Open the next over: alternate ends, decrement the finished bowler's
    /// spell, replace an exhausted end from the rest of the frontline pool.
    /// With a recorded over the bowler and spell come from the snapshot.
    fn next_over(&mut self, ctx: &mut InningCtx<'_>, script: Option<&Over>) -> Result<()> {
        // The two live ends, oldest first; the most recent bowler has just
        // finished an over and spends one unit of his spell, replay or not.
        let ends: Vec<usize> = self
            .overs
            .iter()
            .rev()
            .take(2)
            .rev()
            .map(|over| {
                self.bowler_index(&over.bowler.name).ok_or_else(|| {
                    SimError::InvariantViolation(format!(
                        "over {} bowled by unregistered '{}'",
                        over.index, over.bowler.name
                    ))
                })
            })
            .collect::<Result<_>>()?;
        if let Some(&just_finished) = ends.last() {
            let spell = self.bowlers[just_finished].spell_remaining;
            self.bowlers[just_finished].spell_remaining =
                spell.checked_sub(1).ok_or_else(|| {
                    SimError::InvariantViolation(format!(
                        "spell counter for '{}' went negative",
                        self.bowlers[just_finished].name
                    ))
                })?;
        }

        let bowler_idx = match script {
            None => {
                if ends.len() < 2 {
                    // Opening overs go to the top of the attack.
                    let name = self.attack.get(ends.len()).cloned().ok_or_else(|| {
                        SimError::InvariantViolation("frontline attack too small".to_string())
                    })?;
                    let idx = self.ensure_bowler(ctx.bowling, &name)?;
                    self.bowlers[idx].spell_remaining = ctx.rng.gen_range_inclusive(5, 7);
                    idx
                } else {
                    let due = ends[0];
                    if self.bowlers[due].spell_remaining == 0 {
                        let on_the_field: Vec<&str> =
                            ends.iter().map(|&i| self.bowlers[i].name.as_str()).collect();
                        let candidates: Vec<String> = self
                            .attack
                            .iter()
                            .filter(|n| !on_the_field.contains(&n.as_str()))
                            .cloned()
                            .collect();
                        if candidates.is_empty() {
                            return Err(SimError::InvariantViolation(
                                "no frontline bowler available for a fresh spell".to_string(),
                            ));
                        }
                        let name = candidates[ctx.rng.pick_index(candidates.len())].clone();
                        let idx = self.ensure_bowler(ctx.bowling, &name)?;
                        self.bowlers[idx].spell_remaining = ctx.rng.gen_range_inclusive(4, 7);
                        idx
                    } else {
                        due
                    }
                }
            }
            Some(recorded) => {
                let idx = self.ensure_bowler(ctx.bowling, &recorded.bowler.name)?;
                self.bowlers[idx].spell_remaining = recorded.bowler.spell_remaining;
                idx
            }
        };

        // A fresh spell record opens whenever this end changes hands.
        let same_end_predecessor = self
            .overs
            .len()
            .checked_sub(2)
            .map(|i| self.overs[i].bowler.name.clone());
        if same_end_predecessor.as_deref() != Some(self.bowlers[bowler_idx].name.as_str()) {
            self.bowlers[bowler_idx].begin_spell();
        }

        let over = Over::new(self.overs.len(), self.score, self.bowlers[bowler_idx].snapshot());
        log::trace!(
            "over {} to {} (spell {})",
            over.index + 1,
            over.bowler.name,
            over.bowler.spell_remaining
        );
        self.overs.push(over);
        Ok(())
    }

    /// Bowl one ball, either generated or replayed from a record.
    fn next_ball(&mut self, ctx: &mut InningCtx<'_>, script: Option<&Ball>) -> Result<()> {
        // Crease side on strike comes off the previous ball's record.
        let striker = self.last_ball().map(|b| b.next_striker as usize).unwrap_or(0);

        // Refill the crease from the queue; an empty queue here means the
        // caller missed the all-out end condition.
        let mut at_crease: Vec<usize> = self
            .batters
            .iter()
            .enumerate()
            .filter(|(_, b)| matches!(b.status, BatterStatus::NotOut))
            .map(|(i, _)| i)
            .collect();
        while at_crease.len() < 2 {
            if self.to_bat.is_empty() {
                return Err(SimError::BattingExhausted { at_crease: at_crease.len() });
            }
            let name = self.to_bat.remove(0);
            at_crease.push(self.new_batter(ctx.batting, &name)?);
        }
        let at_crease = [at_crease[0], at_crease[1]];

        let over_idx = self.overs.len().checked_sub(1).ok_or_else(|| {
            SimError::InvariantViolation("ball bowled before any over opened".to_string())
        })?;
        let bowler_idx =
            self.bowler_index(&self.overs[over_idx].bowler.name).ok_or_else(|| {
                SimError::InvariantViolation("current over has an unregistered bowler".to_string())
            })?;
        let bowler_name = self.bowlers[bowler_idx].name.clone();
        let bowler_class = self.bowlers[bowler_idx].class;

        let outcome = match script {
            Some(recorded) => recorded.outcome,
            None => {
                let generator = OutcomeGenerator::new(ctx.model, self.index);
                generator.draw(
                    ctx.rng,
                    &self.batters[at_crease[striker]],
                    &self.bowlers[bowler_idx],
                    self.phase_bucket(),
                )?
            }
        };

        // Score, partnership, accumulators.
        self.score.runs += outcome.total_runs() as u32;
        self.score.wickets += outcome.wicket_falls() as u8;
        if self.score.wickets > 10 {
            return Err(SimError::InvariantViolation(format!(
                "{} wickets recorded",
                self.score.wickets
            )));
        }
        self.partnership.add(striker, &outcome);
        let partnership_snapshot = self.partnership.snapshot(
            [
                self.batters[at_crease[0]].name.as_str(),
                self.batters[at_crease[1]].name.as_str(),
            ],
            !outcome.wicket_falls(),
        );

        self.batters[at_crease[striker]].apply(&outcome);
        self.bowlers[bowler_idx].apply(&outcome);

        let prior_legal = self.overs[over_idx].legal_balls();
        let ball_in_over = prior_legal + 1;
        let over_completes = prior_legal as u32 + outcome.is_legal() as u32 == 6;
        if over_completes {
            let conceded_before: u32 = self.overs[over_idx].conceded();
            let conceded = conceded_before
                + if matches!(outcome, BallOutcome::LegBye(_) | BallOutcome::Bye(_)) {
                    0
                } else {
                    outcome.total_runs() as u32
                };
            if conceded == 0 {
                self.bowlers[bowler_idx].credit_maiden();
            }
        }

        // Wicket resolution (recorded or fresh), then partnership reset.
        let mut dismissal_record = None;
        if outcome.wicket_falls() {
            let scripted = match script {
                Some(recorded) => Some(recorded.dismissal.as_ref().ok_or_else(|| {
                    SimError::InvariantViolation(
                        "recorded wicket ball carries no dismissal".to_string(),
                    )
                })?),
                None => None,
            };
            let resolved = dismissal::resolve(
                ctx.rng,
                scripted,
                &outcome,
                striker,
                ctx.model.phase(self.index),
                &self.fielders,
                self.keeper.as_deref(),
                &bowler_name,
                bowler_class,
            )?;
            self.apply_dismissal(&resolved, at_crease, &outcome, &bowler_name, bowler_class)?;
            dismissal_record = Some(resolved.record);
            self.partnership.reset();
        }

        // Strike for the next ball: odd runs swap, the incoming batter takes
        // strike after a clean wicket, a run out leaves it to a coin; the
        // over's final ball always forces a swap on top.
        let next_striker = match script {
            Some(recorded) => recorded.next_striker,
            None => {
                let side = match outcome {
                    BallOutcome::Wicket => 1,
                    BallOutcome::RunOut(_) => ctx.rng.coin_side(),
                    _ => (striker as u8 + outcome.rotation_runs()) % 2,
                };
                if over_completes {
                    1 - side
                } else {
                    side
                }
            }
        };

        let declared = script.map(|b| b.declared).unwrap_or(false);
        let ball = Ball {
            outcome,
            over_index: over_idx,
            ball_in_over,
            score: self.score,
            partnership: partnership_snapshot,
            striker: self.batters[at_crease[striker]].snapshot(),
            non_striker: self.batters[at_crease[1 - striker]].snapshot(),
            bowler: self.bowlers[bowler_idx].snapshot(),
            next_striker,
            dismissal: dismissal_record,
            declared,
        };
        self.overs[over_idx].balls.push(ball);
        self.overs[over_idx].bowler = self.bowlers[bowler_idx].snapshot();

        self.record_frequencies(at_crease[striker], bowler_idx, &outcome);

        if declared && !self.declared {
            self.declared = true;
        }
        Ok(())
    }

    fn apply_dismissal(
        &mut self,
        resolved: &dismissal::Resolved,
        at_crease: [usize; 2],
        outcome: &BallOutcome,
        bowler_name: &str,
        bowler_class: StyleClass,
    ) -> Result<()> {
        let record = &resolved.record;
        let description =
            dismissal::describe(record.kind, bowler_name, record.fielder.as_deref());

        if record.kind.is_bowler_mode() {
            *self
                .freqs
                .dismissals
                .entry(bowler_class)
                .or_default()
                .entry(record.kind)
                .or_default() += 1;
        }
        match record.kind {
            DismissalKind::Caught => {
                if let Some(fielder) = record.fielder.as_deref() {
                    let pool: Vec<&String> =
                        self.fielders.iter().filter(|f| f.as_str() != bowler_name).collect();
                    if let Some(position) = pool.iter().position(|f| f.as_str() == fielder) {
                        *self.freqs.catches.entry((position as u8).min(8)).or_default() += 1;
                    }
                }
            }
            DismissalKind::RunOut => {
                *self.freqs.run_outs.entry(outcome.total_runs()).or_default() += 1;
            }
            _ => {}
        }

        dismissal::apply_credit(
            record.kind,
            &description.fielders,
            self.keeper.as_deref(),
            bowler_name,
            &mut self.fielding,
        );
        // Caught-and-bowled credit goes through the bowler, whose name is
        // not in the description's fielder list.
        self.batters[at_crease[resolved.out_side]].status = BatterStatus::Out(description);
        log::debug!(
            "wicket: {} {} ({})",
            self.batters[at_crease[resolved.out_side]].name,
            self.batters[at_crease[resolved.out_side]].status,
            self.score
        );
        Ok(())
    }

    /// Write-only counters for the external frequency-table builder.
    fn record_frequencies(&mut self, striker_idx: usize, bowler_idx: usize, outcome: &BallOutcome) {
        if let Some(category) = outcome.category() {
            let phase = self.phase_bucket();
            self.freqs.overs.entry(phase).or_default()[category] += 1;

            let (batter_style, batter_name, batter_bucket) = {
                let b = &self.batters[striker_idx];
                (b.batting_style.clone(), b.name.clone(), b.ball_bucket())
            };
            let (bowler_style, bowler_name, bowler_bucket) = {
                let b = &self.bowlers[bowler_idx];
                (b.bowling_style.clone(), b.name.clone(), b.ball_bucket())
            };
            self.batters[striker_idx].freqs.record(
                batter_bucket,
                &bowler_style,
                &bowler_name,
                category,
            );
            self.bowlers[bowler_idx].freqs.record(
                bowler_bucket,
                &batter_style,
                &batter_name,
                category,
            );
        }

        let class = self.bowlers[bowler_idx].class;
        let counters = match outcome {
            BallOutcome::NoBall(_) => {
                Some(&mut self.freqs.extras.entry(class).or_default().no_balls)
            }
            BallOutcome::Wide(_) => Some(&mut self.freqs.extras.entry(class).or_default().wides),
            BallOutcome::LegBye(_) => {
                Some(&mut self.freqs.extras.entry(class).or_default().leg_byes)
            }
            BallOutcome::Bye(_) => Some(&mut self.freqs.extras.entry(class).or_default().byes),
            _ => None,
        };
        if let Some(counter) = counters {
            *counter.entry(outcome.total_runs()).or_default() += 1;
        }
    }

    // ========================================================================
    // Rewind
    // ========================================================================

    /// Rebuild a fresh innings and re-drive every recorded decision up to
    /// `cursor`; optionally continue with fresh randomness from there.
    pub fn rewind(
        &self,
        ctx: &mut InningCtx<'_>,
        cursor: InningCursor,
        resume: bool,
    ) -> Result<Inning> {
        if cursor.over > self.overs.len() {
            return Err(SimError::CursorOutOfRange(format!(
                "over {} of {}",
                cursor.over,
                self.overs.len()
            )));
        }
        if let Some(balls) = cursor.balls {
            let over = self.overs.get(cursor.over).ok_or_else(|| {
                SimError::CursorOutOfRange(format!("partial over {} does not exist", cursor.over))
            })?;
            if balls > over.balls.len() {
                return Err(SimError::CursorOutOfRange(format!(
                    "ball {} of {} in over {}",
                    balls,
                    over.balls.len(),
                    cursor.over
                )));
            }
        }

        let mut fresh = Inning::new(self.index, ctx.batting, ctx.bowling, self.target)?;
        if self.penalties.pre > 0 {
            fresh.apply_penalty(PenaltyPhase::Pre, self.penalties.pre);
        }
        for over in &self.overs[..cursor.over] {
            fresh.replay_over(ctx, over, None)?;
        }
        if let Some(balls) = cursor.balls {
            fresh.replay_over(ctx, &self.overs[cursor.over], Some(balls))?;
        }
        if resume {
            fresh.run(ctx)?;
        } else {
            fresh.seal_if_ended()?;
        }
        Ok(fresh)
    }

    fn replay_over(
        &mut self,
        ctx: &mut InningCtx<'_>,
        recorded: &Over,
        upto: Option<usize>,
    ) -> Result<()> {
        self.next_over(ctx, Some(recorded))?;
        let count = upto.unwrap_or(recorded.balls.len());
        for ball in &recorded.balls[..count] {
            self.next_ball(ctx, Some(ball))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::embedded::demo_squads;

    fn drive_innings(seed: u64, prior_overs: u32) -> (Inning, Squad, Squad, FreqModel) {
        let (batting, bowling) = demo_squads();
        let model = FreqModel::baseline();
        let mut rng = SimRng::seeded(seed);
        let mut inning = Inning::new(0, &batting, &bowling, None).unwrap();
        let mut ctx = InningCtx {
            rng: &mut rng,
            model: &model,
            batting: &batting,
            bowling: &bowling,
            prior_overs,
        };
        inning.run(&mut ctx).unwrap();
        (inning, batting, bowling, model)
    }

    #[test]
    fn innings_runs_to_a_wellformed_end() {
        let (inning, ..) = drive_innings(20260807, 0);
        assert!(inning.is_complete());
        assert!(inning.score.wickets <= 10);
        assert!(inning.all_out());
        assert_eq!(inning.batters.len(), 11);

        // Batter runs + extras must equal the team total exactly.
        let bat_runs: u32 = inning.batters.iter().map(|b| b.runs).sum();
        let extras: u32 = inning
            .overs
            .iter()
            .flat_map(|o| &o.balls)
            .map(|b| (b.outcome.total_runs() - b.outcome.bat_runs()) as u32)
            .sum();
        assert_eq!(inning.score.runs, bat_runs + extras);

        // Every sealed over holds exactly six legal balls.
        for over in &inning.overs[..inning.overs.len().saturating_sub(1)] {
            assert_eq!(over.legal_balls(), 6, "over {}", over.index);
        }
    }

    #[test]
    fn bowler_analyses_reconcile_with_the_overs() {
        let (inning, ..) = drive_innings(7, 0);
        let bowled: u32 = inning.bowlers.iter().map(|b| b.balls).sum();
        let legal: u32 = inning.overs.iter().map(|o| o.legal_balls() as u32).sum();
        assert_eq!(bowled, legal);

        let bowler_wickets: u32 = inning.bowlers.iter().map(|b| b.wickets).sum();
        let clean_wickets = inning
            .overs
            .iter()
            .flat_map(|o| &o.balls)
            .filter(|b| b.outcome.bowler_wicket())
            .count() as u32;
        assert_eq!(bowler_wickets, clean_wickets);

        for bowler in &inning.bowlers {
            let spell_balls: u32 = bowler.spells.iter().map(|s| s.balls).sum();
            assert_eq!(spell_balls, bowler.balls, "{} spells disagree", bowler.name);
        }
    }

    #[test]
    fn opening_overs_go_to_the_top_of_the_attack() {
        let (inning, _, bowling, _) = drive_innings(3, 0);
        assert_eq!(inning.overs[0].bowler.name, bowling.bowling_order[0]);
        assert_eq!(inning.overs[1].bowler.name, bowling.bowling_order[1]);
        // Ends alternate: consecutive overs never share a bowler.
        for pair in inning.overs.windows(2) {
            assert_ne!(pair[0].bowler.name, pair[1].bowler.name);
        }
    }

    #[test]
    fn partnership_resets_on_the_ball_after_a_wicket() {
        let (inning, ..) = drive_innings(11, 0);
        let balls: Vec<&Ball> = inning.overs.iter().flat_map(|o| &o.balls).collect();
        let mut saw_wicket = false;
        for pair in balls.windows(2) {
            if pair[0].dismissal.is_some() {
                saw_wicket = true;
                let after = &pair[1].partnership;
                // The next ball starts a fresh stand: at most that ball's own
                // contribution is on the board.
                assert!(
                    after.balls <= 1,
                    "stand not reset after wicket: {} balls",
                    after.balls
                );
            } else {
                // And never the ball before a wicket.
                assert!(pair[0].partnership.unbroken);
            }
        }
        assert!(saw_wicket, "seed produced no wickets to test against");
    }

    #[test]
    fn keeper_is_excluded_from_the_outfield() {
        let (inning, _, bowling, _) = drive_innings(5, 0);
        let keeper = bowling.keeper().unwrap().name.clone();
        assert_eq!(inning.keeper.as_deref(), Some(keeper.as_str()));
        assert!(!inning.fielders.contains(&keeper));
        assert_eq!(inning.fielders.len(), 10);
        // But the keeper still has a credit-book entry.
        assert!(inning.fielding.contains_key(&keeper));
    }

    #[test]
    fn fall_of_wicket_snapshots_alias_nothing() {
        let (inning, ..) = drive_innings(13, 0);
        // A dismissed batter's final snapshot on the wicket ball must agree
        // with the sealed accumulator, proving copy-on-snapshot.
        for ball in inning.overs.iter().flat_map(|o| &o.balls) {
            if ball.dismissal.is_some() && ball.striker.out {
                let batter = inning
                    .batters
                    .iter()
                    .find(|b| b.name == ball.striker.name)
                    .expect("snapshot names a batter");
                // The accumulator never moved again after the dismissal.
                assert_eq!(batter.runs, ball.striker.runs);
                assert_eq!(batter.balls, ball.striker.balls);
            }
        }
    }

    #[test]
    fn rewind_replays_history_exactly_then_forks() {
        let (original, batting, bowling, model) = drive_innings(42, 0);
        assert!(original.overs.len() > 10, "need a real innings to rewind");

        let cursor = InningCursor { over: 8, balls: Some(3) };
        let mut rng = SimRng::seeded(999); // replay must not consume from it
        let mut ctx = InningCtx {
            rng: &mut rng,
            model: &model,
            batting: &batting,
            bowling: &bowling,
            prior_overs: 0,
        };
        let replayed = original.rewind(&mut ctx, cursor, false).unwrap();

        assert_eq!(replayed.overs.len(), 9);
        assert_eq!(replayed.overs[8].balls.len(), 3);
        for (over, recorded) in replayed.overs.iter().zip(&original.overs) {
            assert_eq!(over.bowler.name, recorded.bowler.name);
            for (ball, expected) in over.balls.iter().zip(&recorded.balls) {
                assert_eq!(ball, expected);
            }
        }
        // The replay consumed no randomness at all.
        let mut untouched = SimRng::seeded(999);
        assert_eq!(ctx.rng.uniform(1.0).to_bits(), untouched.uniform(1.0).to_bits());
    }

    #[test]
    fn full_rewind_reproduces_the_whole_innings() {
        let (original, batting, bowling, model) = drive_innings(42, 0);
        let mut rng = SimRng::seeded(0);
        let mut ctx = InningCtx {
            rng: &mut rng,
            model: &model,
            batting: &batting,
            bowling: &bowling,
            prior_overs: 0,
        };
        let replayed =
            original.rewind(&mut ctx, InningCursor::whole(&original), false).unwrap();
        assert_eq!(replayed.score, original.score);
        assert_eq!(replayed.overs, original.overs);
        assert_eq!(replayed.batters, original.batters);
        assert_eq!(replayed.bowlers, original.bowlers);
        assert!(replayed.is_complete());
    }

    #[test]
    fn declaration_ends_the_innings_and_annotates_the_ball() {
        let (batting, bowling) = demo_squads();
        let model = FreqModel::baseline();
        let mut rng = SimRng::seeded(77);
        let mut inning = Inning::new(0, &batting, &bowling, None).unwrap();
        let mut ctx = InningCtx {
            rng: &mut rng,
            model: &model,
            batting: &batting,
            bowling: &bowling,
            prior_overs: 0,
        };
        for _ in 0..60 {
            inning.step(&mut ctx).unwrap();
        }
        inning.declare().unwrap();
        assert!(inning.is_complete());
        assert!(inning.end_reached());
        assert!(inning.last_ball().unwrap().declared);
        assert!(inning.step(&mut ctx).is_err());
        assert!(inning.declare().is_err());
    }

    #[test]
    fn absent_hurt_batter_never_bats_and_costs_no_wicket() {
        let (batting, bowling) = demo_squads();
        let model = FreqModel::baseline();
        let mut rng = SimRng::seeded(8);
        let mut inning = Inning::new(0, &batting, &bowling, None).unwrap();
        let eleventh = batting.players[10].name.clone();
        inning.mark_absent_hurt(&batting, &eleventh).unwrap();
        let mut ctx = InningCtx {
            rng: &mut rng,
            model: &model,
            batting: &batting,
            bowling: &bowling,
            prior_overs: 0,
        };
        inning.run(&mut ctx).unwrap();
        assert!(inning.is_complete());
        assert!(inning.score.wickets <= 9, "only nine partners available");
        let absent = inning.batters.iter().find(|b| b.name == eleventh).unwrap();
        assert_eq!(absent.status, BatterStatus::AbsentHurt);
        assert_eq!(absent.balls, 0);
    }

    #[test]
    fn fourth_innings_stops_at_the_target() {
        let (batting, bowling) = demo_squads();
        let model = FreqModel::baseline();
        let mut rng = SimRng::seeded(4);
        let mut inning = Inning::new(3, &batting, &bowling, Some(40)).unwrap();
        let mut ctx = InningCtx {
            rng: &mut rng,
            model: &model,
            batting: &batting,
            bowling: &bowling,
            prior_overs: 0,
        };
        inning.run(&mut ctx).unwrap();
        assert!(inning.is_complete());
        if inning.score.wickets < 10 && !inning.all_out() {
            assert!(inning.score.runs >= 40);
            // Reached, not overshot by a whole stroke of play.
            assert!(inning.score.runs < 40 + 7);
        }
    }

    #[test]
    fn day_allowance_halts_a_marathon_innings() {
        let (batting, bowling) = demo_squads();
        let model = FreqModel::baseline();
        let mut rng = SimRng::seeded(21);
        let mut inning = Inning::new(0, &batting, &bowling, None).unwrap();
        // 449 overs already gone: one over of play remains in the match.
        let mut ctx = InningCtx {
            rng: &mut rng,
            model: &model,
            batting: &batting,
            bowling: &bowling,
            prior_overs: MATCH_DAYS * OVERS_PER_DAY - 1,
        };
        inning.run(&mut ctx).unwrap();
        assert!(inning.complete_overs() <= 1);
        assert!(!inning.is_complete() || inning.end_reached());
    }
}
