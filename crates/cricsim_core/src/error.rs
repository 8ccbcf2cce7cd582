use thiserror::Error;

/// Engine error taxonomy.
///
/// Data-insufficiency (an empty conditional distribution) is handled locally
/// by the outcome generator and never surfaces here; everything below either
/// aborts the run or rejects bad input up front.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid squad for {team}: {reason}")]
    InvalidSquad { team: String, reason: String },

    #[error("unknown player '{name}' in {team}")]
    UnknownPlayer { name: String, team: String },

    #[error("outcome distribution is empty for innings {innings}")]
    EmptyDistribution { innings: usize },

    #[error("batting order exhausted with {at_crease} batter(s) at the crease")]
    BattingExhausted { at_crease: usize },

    #[error("unrecognized dismissal mode: '{0}'")]
    UnknownDismissalMode(String),

    #[error("unrecognized ball outcome code: '{0}'")]
    UnknownOutcomeCode(String),

    #[error("rewind cursor out of range: {0}")]
    CursorOutOfRange(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("model load error: {0}")]
    ModelLoad(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
