//! Dismissal resolution: which batter, which mode, which fielder.
//!
//! A clean wicket takes the striker and draws the mode from the bowler's
//! style-bucket distribution; a run out may take either batter and picks the
//! fielder uniformly (field placement at the moment of a run out carries far
//! more entropy than a catch does). Every decision is recorded so a replay
//! can force the identical resolution.

use std::collections::BTreeMap;

use crate::data::freq::PhaseFreqs;
use crate::engine::ball::DismissalRecord;
use crate::engine::participants::FieldingTally;
use crate::engine::rng::SimRng;
use crate::error::{Result, SimError};
use crate::models::outcome::{BallOutcome, Dismissal, DismissalKind, FielderRef};
use crate::models::player::StyleClass;

/// A fully resolved dismissal, before it is written onto the batter and the
/// ball record.
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    /// Crease side (0/1) of the batter given out.
    pub out_side: usize,
    pub record: DismissalRecord,
}

/// Resolve the wicket on the current ball, either from the recorded script
/// or with fresh draws (batter first, then fielder, matching record order).
pub(crate) fn resolve(
    rng: &mut SimRng,
    script: Option<&DismissalRecord>,
    outcome: &BallOutcome,
    striker: usize,
    phase: &PhaseFreqs,
    fielders: &[String],
    keeper: Option<&str>,
    bowler_name: &str,
    bowler_class: StyleClass,
) -> Result<Resolved> {
    if let Some(record) = script {
        let out_side = if record.out_is_striker { striker } else { 1 - striker };
        return Ok(Resolved { out_side, record: record.clone() });
    }

    let (out_side, kind, fielder) = match outcome {
        BallOutcome::Wicket => {
            let modes = phase.dismissals.get(&bowler_class).ok_or_else(|| {
                SimError::InvariantViolation(format!(
                    "no dismissal modes recorded for style class {}",
                    bowler_class
                ))
            })?;
            let kind = *rng.weighted_count(modes.iter()).ok_or_else(|| {
                SimError::InvariantViolation(format!(
                    "dismissal-mode table for style class {} is empty",
                    bowler_class
                ))
            })?;
            let fielder = match kind {
                DismissalKind::Caught => Some(draw_catcher(rng, phase, fielders, bowler_name)?),
                DismissalKind::CaughtBehind | DismissalKind::Stumped => {
                    let keeper = keeper.ok_or_else(|| {
                        SimError::InvariantViolation(format!(
                            "{} resolved with no designated keeper",
                            kind
                        ))
                    })?;
                    Some(keeper.to_string())
                }
                _ => None,
            };
            (striker, kind, fielder)
        }
        BallOutcome::RunOut(_) => {
            let out_side = rng.pick_index(2);
            let fielder = fielders[rng.pick_index(fielders.len())].clone();
            (out_side, DismissalKind::RunOut, Some(fielder))
        }
        other => {
            return Err(SimError::InvariantViolation(format!(
                "dismissal resolver invoked for non-wicket outcome {}",
                other
            )))
        }
    };

    Ok(Resolved {
        out_side,
        record: DismissalRecord { kind, fielder, out_is_striker: out_side == striker },
    })
}

/// Weighted catcher draw over the historical "which fielder takes it"
/// distribution, indexed into the keeper-less field with the bowler removed.
/// Indices are capped at 8, mirroring the ingestion cap.
fn draw_catcher(
    rng: &mut SimRng,
    phase: &PhaseFreqs,
    fielders: &[String],
    bowler_name: &str,
) -> Result<String> {
    let pool: Vec<&String> = fielders.iter().filter(|f| f.as_str() != bowler_name).collect();
    let index = rng
        .weighted_count(phase.catches.iter())
        .copied()
        .ok_or_else(|| {
            SimError::InvariantViolation("catch-position table is empty".to_string())
        })?
        .min(8) as usize;
    pool.get(index).map(|s| (*s).clone()).ok_or_else(|| {
        SimError::InvariantViolation(format!(
            "catch position {} outside the {}-man pool",
            index,
            pool.len()
        ))
    })
}

/// Build the batting-card description for a resolved dismissal.
pub(crate) fn describe(
    kind: DismissalKind,
    bowler_name: &str,
    fielder: Option<&str>,
) -> Dismissal {
    let bowler = Some(bowler_name.to_string());
    match kind {
        DismissalKind::Bowled | DismissalKind::Lbw | DismissalKind::HitWicket => {
            Dismissal { kind, bowler, fielders: Vec::new() }
        }
        DismissalKind::Caught | DismissalKind::CaughtBehind | DismissalKind::Stumped => Dismissal {
            kind,
            bowler,
            fielders: fielder.map(FielderRef::new).into_iter().collect(),
        },
        DismissalKind::CaughtAndBowled => Dismissal { kind, bowler, fielders: Vec::new() },
        DismissalKind::RunOut => Dismissal {
            kind,
            bowler: None,
            fielders: fielder.map(FielderRef::new).into_iter().collect(),
        },
        DismissalKind::Retired => Dismissal { kind, bowler: None, fielders: Vec::new() },
    }
}

/// Update the responsible fielders' tallies. Substitutes never earn credit;
/// a run out involving two or more fielders credits every non-keeper.
pub(crate) fn apply_credit(
    kind: DismissalKind,
    fielders: &[FielderRef],
    keeper: Option<&str>,
    bowler_name: &str,
    tallies: &mut BTreeMap<String, FieldingTally>,
) {
    let mut credit = |name: &str, pick: fn(&mut FieldingTally) -> &mut u32| {
        if let Some(tally) = tallies.get_mut(name) {
            *pick(tally) += 1;
        }
    };

    match kind {
        DismissalKind::Caught | DismissalKind::CaughtBehind => {
            if let Some(f) = fielders.first().filter(|f| !f.substitute) {
                credit(&f.name, |t| &mut t.catches);
            }
        }
        DismissalKind::CaughtAndBowled => credit(bowler_name, |t| &mut t.catches),
        DismissalKind::Stumped => {
            if let Some(f) = fielders.first().filter(|f| !f.substitute) {
                credit(&f.name, |t| &mut t.stumpings);
            }
        }
        DismissalKind::RunOut => {
            let real: Vec<&FielderRef> = fielders.iter().filter(|f| !f.substitute).collect();
            if real.len() == 1 {
                credit(&real[0].name, |t| &mut t.run_outs);
            } else {
                for f in real {
                    if keeper != Some(f.name.as_str()) {
                        credit(&f.name, |t| &mut t.run_outs);
                    }
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::freq::FreqModel;

    fn field() -> Vec<String> {
        (0..10).map(|i| format!("F{}", i)).collect()
    }

    fn tallies(fielders: &[String], keeper: &str) -> BTreeMap<String, FieldingTally> {
        let mut map: BTreeMap<String, FieldingTally> =
            fielders.iter().map(|f| (f.clone(), FieldingTally::default())).collect();
        map.insert(keeper.to_string(), FieldingTally::default());
        map
    }

    #[test]
    fn clean_wicket_takes_the_striker() {
        let model = FreqModel::baseline();
        let mut rng = SimRng::seeded(11);
        let fielders = field();
        let resolved = resolve(
            &mut rng,
            None,
            &BallOutcome::Wicket,
            1,
            &model.innings[0],
            &fielders,
            Some("K"),
            "F0",
            StyleClass::Fast,
        )
        .unwrap();
        assert_eq!(resolved.out_side, 1);
        assert!(resolved.record.out_is_striker);
        assert_ne!(resolved.record.kind, DismissalKind::RunOut);
        if resolved.record.kind == DismissalKind::Caught {
            assert_ne!(resolved.record.fielder.as_deref(), Some("F0"), "bowler cannot catch");
        }
    }

    #[test]
    fn scripted_resolution_bypasses_randomness() {
        let model = FreqModel::baseline();
        let mut rng = SimRng::seeded(0);
        let record = DismissalRecord {
            kind: DismissalKind::Stumped,
            fielder: Some("K".into()),
            out_is_striker: false,
        };
        let resolved = resolve(
            &mut rng,
            Some(&record),
            &BallOutcome::Wicket,
            0,
            &model.innings[0],
            &field(),
            Some("K"),
            "F0",
            StyleClass::Spin,
        )
        .unwrap();
        assert_eq!(resolved.out_side, 1);
        assert_eq!(resolved.record, record);
        // A second resolve from the same seed must see an untouched stream.
        let mut fresh = SimRng::seeded(0);
        assert_eq!(rng.uniform(1.0).to_bits(), fresh.uniform(1.0).to_bits());
    }

    #[test]
    fn run_out_split_credit_excludes_the_keeper() {
        let fielders = field();
        let mut book = tallies(&fielders, "K");
        let named = vec![
            FielderRef::new("F1"),
            FielderRef::new("K"),
            FielderRef::new("F4"),
        ];
        apply_credit(DismissalKind::RunOut, &named, Some("K"), "F0", &mut book);
        assert_eq!(book["F1"].run_outs, 1);
        assert_eq!(book["F4"].run_outs, 1);
        assert_eq!(book["K"].run_outs, 0);

        // A lone fielder keeps the credit even if it is the keeper.
        let mut book = tallies(&fielders, "K");
        apply_credit(
            DismissalKind::RunOut,
            &[FielderRef::new("K")],
            Some("K"),
            "F0",
            &mut book,
        );
        assert_eq!(book["K"].run_outs, 1);
    }

    #[test]
    fn substitutes_earn_no_credit() {
        let fielders = field();
        let mut book = tallies(&fielders, "K");
        apply_credit(
            DismissalKind::Caught,
            &[FielderRef::substitute("Visitor")],
            Some("K"),
            "F0",
            &mut book,
        );
        assert!(book.values().all(|t| t.catches == 0));
    }

    #[test]
    fn caught_and_bowled_credits_the_bowler() {
        let fielders = field();
        let mut book = tallies(&fielders, "K");
        apply_credit(DismissalKind::CaughtAndBowled, &[], Some("K"), "F3", &mut book);
        assert_eq!(book["F3"].catches, 1);
    }
}
