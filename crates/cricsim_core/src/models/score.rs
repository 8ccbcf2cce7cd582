use serde::{Deserialize, Serialize};
use std::fmt;

/// Running team score: runs and wickets down.
///
/// Displays in the scorecard's "runs - wickets" form, e.g. `247 - 4`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub runs: u32,
    pub wickets: u8,
}

impl Score {
    pub fn new(runs: u32, wickets: u8) -> Self {
        Self { runs, wickets }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.runs, self.wickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_scorecard_form() {
        assert_eq!(Score::new(247, 4).to_string(), "247 - 4");
        assert_eq!(Score::default().to_string(), "0 - 0");
    }
}
