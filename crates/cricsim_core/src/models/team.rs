//! Squad roster contract.
//!
//! A `Squad` is the in-process roster interface the engine consumes: an
//! ordered starting XI (batting order) and a frontline bowling order. Rosters
//! come from JSON files, the embedded demo pair, or caller construction.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::models::player::Player;

/// Minimum frontline bowlers required so an exhausted spell can always be
/// refilled from outside the two current end-holders.
pub const MIN_FRONTLINE_BOWLERS: usize = 3;

/// A team's starting XI plus its frontline bowling order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Squad {
    pub team: String,
    /// Starting XI in declared batting order. Exactly 11 players.
    pub players: Vec<Player>,
    /// Frontline attack, best-first, by player name. Must resolve into the XI.
    pub bowling_order: Vec<String>,
}

impl Squad {
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Roster index of a player in the declared batting order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p.name == name)
    }

    /// The designated keeper: the LAST player whose role mentions "keeper".
    pub fn keeper(&self) -> Option<&Player> {
        self.players.iter().rev().find(|p| p.is_keeper())
    }

    pub fn validate(&self) -> Result<()> {
        if self.players.len() != 11 {
            return Err(SimError::InvalidSquad {
                team: self.team.clone(),
                reason: format!("starting XI has {} players, expected 11", self.players.len()),
            });
        }
        for name in &self.bowling_order {
            let player = self.player(name).ok_or_else(|| SimError::UnknownPlayer {
                name: name.clone(),
                team: self.team.clone(),
            })?;
            if player.bowling_class().is_none() {
                return Err(SimError::InvalidSquad {
                    team: self.team.clone(),
                    reason: format!("frontline bowler '{}' has no classified bowling style", name),
                });
            }
        }
        if self.bowling_order.len() < MIN_FRONTLINE_BOWLERS {
            return Err(SimError::InvalidSquad {
                team: self.team.clone(),
                reason: format!(
                    "{} frontline bowlers listed, need at least {}",
                    self.bowling_order.len(),
                    MIN_FRONTLINE_BOWLERS
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::embedded::demo_squads;

    #[test]
    fn demo_squads_validate() {
        let (a, b) = demo_squads();
        a.validate().unwrap();
        b.validate().unwrap();
        assert_eq!(a.players.len(), 11);
        assert!(a.keeper().is_some());
        assert!(b.keeper().is_some());
    }

    #[test]
    fn keeper_is_last_matching_role() {
        let (a, _) = demo_squads();
        let keeper = a.keeper().unwrap();
        let last_idx = a
            .players
            .iter()
            .rposition(|p| p.is_keeper())
            .unwrap();
        assert_eq!(a.players[last_idx].name, keeper.name);
    }

    #[test]
    fn short_attack_is_rejected() {
        let (mut a, _) = demo_squads();
        a.bowling_order.truncate(2);
        assert!(matches!(a.validate(), Err(SimError::InvalidSquad { .. })));
    }
}
