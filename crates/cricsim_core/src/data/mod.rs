//! Read-only data contracts: frequency tables and embedded demo rosters.

pub mod embedded;
pub mod freq;

pub use embedded::demo_squads;
pub use freq::{BucketDist, CountVec, ExtrasFreqs, FreqModel, PhaseFreqs, SizeDist, WICKET_SLOT};
