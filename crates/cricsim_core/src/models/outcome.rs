//! Ball outcomes and dismissals as closed tagged variants.
//!
//! The legacy scorebook encodes a delivery as either a bare run count or a
//! run count glued to a two-letter code (`"3"`, `"1nb"`, `"0wd"`, `"2lb"`,
//! `"4b"`, `"W"`, `"1+W"`). Every such pattern maps onto exactly one variant
//! below; anything else is rejected as a hard error rather than defaulted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

/// The typed outcome of one delivery.
///
/// Run counts are off the bat except where noted. `Wide` carries the extra
/// runs beyond the one mandatory wide run; `RunOut` carries the runs
/// completed before the wicket fell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "runs", rename_all = "snake_case")]
pub enum BallOutcome {
    Runs(u8),
    NoBall(u8),
    Wide(u8),
    LegBye(u8),
    Bye(u8),
    Wicket,
    RunOut(u8),
}

impl BallOutcome {
    /// Total runs added to the team score, extras included.
    pub fn total_runs(&self) -> u8 {
        match *self {
            BallOutcome::Runs(r) => r,
            BallOutcome::NoBall(r) => r + 1,
            BallOutcome::Wide(e) => e + 1,
            BallOutcome::LegBye(r) => r,
            BallOutcome::Bye(r) => r,
            BallOutcome::Wicket => 0,
            BallOutcome::RunOut(r) => r,
        }
    }

    /// Runs credited to the striker.
    pub fn bat_runs(&self) -> u8 {
        match *self {
            BallOutcome::Runs(r) | BallOutcome::NoBall(r) | BallOutcome::RunOut(r) => r,
            _ => 0,
        }
    }

    /// Legal deliveries count toward the over's six.
    pub fn is_legal(&self) -> bool {
        !matches!(self, BallOutcome::NoBall(_) | BallOutcome::Wide(_))
    }

    /// Whether a wicket falls on this ball (bowler-credited or run out).
    pub fn wicket_falls(&self) -> bool {
        matches!(self, BallOutcome::Wicket | BallOutcome::RunOut(_))
    }

    /// The striker faces the delivery (everything except a wide).
    pub fn faces_ball(&self) -> bool {
        !matches!(self, BallOutcome::Wide(_))
    }

    /// Runs charged against the bowler: everything except byes and leg-byes.
    pub fn bowler_runs(&self) -> u8 {
        match *self {
            BallOutcome::LegBye(_) | BallOutcome::Bye(_) => 0,
            _ => self.total_runs(),
        }
    }

    /// Extras attributed to the bowler's analysis: one per no-ball, the full
    /// count of a wide.
    pub fn bowler_extras(&self) -> u8 {
        match *self {
            BallOutcome::NoBall(_) => 1,
            BallOutcome::Wide(e) => e + 1,
            _ => 0,
        }
    }

    /// Only a clean wicket goes into the bowler's column; run-outs do not.
    pub fn bowler_wicket(&self) -> bool {
        matches!(self, BallOutcome::Wicket)
    }

    /// Run value driving strike rotation (odd swaps). For a wide this is the
    /// extra-run count, mirroring the scorebook's leading digit.
    pub fn rotation_runs(&self) -> u8 {
        match *self {
            BallOutcome::Runs(r)
            | BallOutcome::NoBall(r)
            | BallOutcome::Wide(r)
            | BallOutcome::LegBye(r)
            | BallOutcome::Bye(r) => r,
            BallOutcome::Wicket | BallOutcome::RunOut(_) => 0,
        }
    }

    /// Frequency-table category for this ball: indices 0-6 are runs off the
    /// bat (counts above six fold down by four, as at ingestion), 7 is a
    /// clean wicket. Wides are not recorded.
    pub fn category(&self) -> Option<usize> {
        match *self {
            BallOutcome::Wicket => Some(7),
            BallOutcome::Wide(_) => None,
            _ => {
                let r = self.bat_runs() as usize;
                Some(if r > 6 { r - 4 } else { r })
            }
        }
    }
}

impl fmt::Display for BallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BallOutcome::Runs(r) => write!(f, "{}", r),
            BallOutcome::NoBall(r) => write!(f, "{}nb", r),
            BallOutcome::Wide(e) => write!(f, "{}wd", e),
            BallOutcome::LegBye(r) => write!(f, "{}lb", r),
            BallOutcome::Bye(r) => write!(f, "{}b", r),
            BallOutcome::Wicket => write!(f, "W"),
            BallOutcome::RunOut(r) => write!(f, "{}+W", r),
        }
    }
}

impl FromStr for BallOutcome {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = || SimError::UnknownOutcomeCode(s.to_string());

        if s == "W" {
            return Ok(BallOutcome::Wicket);
        }
        if let Ok(r) = s.parse::<u8>() {
            if r <= 6 {
                return Ok(BallOutcome::Runs(r));
            }
            return Err(reject());
        }

        let (digits, code) = s.split_at(s.find(|c: char| !c.is_ascii_digit()).ok_or_else(reject)?);
        let runs: u8 = digits.parse().map_err(|_| reject())?;
        match code {
            "nb" if runs <= 6 => Ok(BallOutcome::NoBall(runs)),
            "wd" => Ok(BallOutcome::Wide(runs)),
            "lb" if runs >= 1 => Ok(BallOutcome::LegBye(runs)),
            "b" if runs >= 1 => Ok(BallOutcome::Bye(runs)),
            "+W" if runs <= 1 => Ok(BallOutcome::RunOut(runs)),
            _ => Err(reject()),
        }
    }
}

/// The closed set of dismissal modes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DismissalKind {
    #[serde(rename = "bowled")]
    Bowled,
    #[serde(rename = "lbw")]
    Lbw,
    #[serde(rename = "caught")]
    Caught,
    #[serde(rename = "caught behind")]
    CaughtBehind,
    #[serde(rename = "caught and bowled")]
    CaughtAndBowled,
    #[serde(rename = "stumped")]
    Stumped,
    #[serde(rename = "run out")]
    RunOut,
    #[serde(rename = "hit wicket")]
    HitWicket,
    #[serde(rename = "retired hurt")]
    Retired,
}

impl DismissalKind {
    /// Modes recorded into the historical dismissal-mode table (run outs and
    /// retirements are excluded at ingestion).
    pub fn is_bowler_mode(&self) -> bool {
        !matches!(self, DismissalKind::RunOut | DismissalKind::Retired)
    }
}

impl FromStr for DismissalKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bowled" => Ok(DismissalKind::Bowled),
            "lbw" => Ok(DismissalKind::Lbw),
            "caught" => Ok(DismissalKind::Caught),
            "caught behind" => Ok(DismissalKind::CaughtBehind),
            "caught and bowled" => Ok(DismissalKind::CaughtAndBowled),
            "stumped" => Ok(DismissalKind::Stumped),
            "run out" => Ok(DismissalKind::RunOut),
            "hit wicket" => Ok(DismissalKind::HitWicket),
            s if s.contains("retired") => Ok(DismissalKind::Retired),
            _ => Err(SimError::UnknownDismissalMode(s.to_string())),
        }
    }
}

impl fmt::Display for DismissalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DismissalKind::Bowled => "bowled",
            DismissalKind::Lbw => "lbw",
            DismissalKind::Caught => "caught",
            DismissalKind::CaughtBehind => "caught behind",
            DismissalKind::CaughtAndBowled => "caught and bowled",
            DismissalKind::Stumped => "stumped",
            DismissalKind::RunOut => "run out",
            DismissalKind::HitWicket => "hit wicket",
            DismissalKind::Retired => "retired hurt",
        };
        write!(f, "{}", s)
    }
}

/// A fielder named in a dismissal. Substitutes appear in real match records
/// only; the simulation never fields one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FielderRef {
    pub name: String,
    #[serde(default)]
    pub substitute: bool,
}

impl FielderRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), substitute: false }
    }

    pub fn substitute(name: impl Into<String>) -> Self {
        Self { name: name.into(), substitute: true }
    }
}

/// A resolved dismissal as it appears on the batting card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dismissal {
    pub kind: DismissalKind,
    /// Bowler of the delivery; absent for run outs and retirements.
    pub bowler: Option<String>,
    pub fielders: Vec<FielderRef>,
}

impl Dismissal {
    fn fielder_display(&self) -> String {
        match self.fielders.first() {
            Some(f) if f.substitute => format!("sub ({})", f.name),
            Some(f) => f.name.clone(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Dismissal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bowler = self.bowler.as_deref().unwrap_or("");
        match self.kind {
            DismissalKind::Bowled => write!(f, "b {}", bowler),
            DismissalKind::Lbw => write!(f, "lbw b {}", bowler),
            DismissalKind::Caught | DismissalKind::CaughtBehind => {
                write!(f, "c {} b {}", self.fielder_display(), bowler)
            }
            DismissalKind::CaughtAndBowled => write!(f, "c & b {}", bowler),
            DismissalKind::Stumped => write!(f, "st {} b {}", self.fielder_display(), bowler),
            DismissalKind::RunOut => {
                if self.fielders.is_empty() {
                    write!(f, "run out")
                } else {
                    let names: Vec<String> = self
                        .fielders
                        .iter()
                        .map(|fl| {
                            if fl.substitute {
                                format!("sub ({})", fl.name)
                            } else {
                                fl.name.clone()
                            }
                        })
                        .collect();
                    write!(f, "run out ({})", names.join("/"))
                }
            }
            DismissalKind::HitWicket => write!(f, "hit wicket b {}", bowler),
            DismissalKind::Retired => write!(f, "retired hurt"),
        }
    }
}

/// Batting-card status of a batter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatterStatus {
    #[default]
    NotOut,
    Out(Dismissal),
    /// Listed in the XI but unable to bat.
    AbsentHurt,
}

impl BatterStatus {
    pub fn is_out(&self) -> bool {
        matches!(self, BatterStatus::Out(_))
    }
}

impl fmt::Display for BatterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatterStatus::NotOut => write!(f, "Not Out"),
            BatterStatus::Out(d) => write!(f, "{}", d),
            BatterStatus::AbsentHurt => write!(f, "absent hurt"),
        }
    }
}
