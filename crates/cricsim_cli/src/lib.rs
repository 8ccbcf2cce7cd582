//! CLI support library: file plumbing around the simulation engine.
//!
//! JSON in (squads, frequency model) -> simulate or rewind -> JSON out
//! (match state plus a small metadata header).

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use cricsim_core::{FreqModel, Squad, TestMatch};

/// Saved-match envelope: the match state plus provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    /// Seed the run was started from.
    pub seed: u64,
    /// Result line, e.g. "Northshire won by 84 runs".
    pub result: String,
    /// Generation time (RFC3339).
    pub generated_at: String,
    #[serde(rename = "match")]
    pub state: TestMatch,
}

impl MatchReport {
    pub fn new(seed: u64, result: String, state: TestMatch) -> Self {
        Self { seed, result, generated_at: chrono::Utc::now().to_rfc3339(), state }
    }
}

/// Load a squad pair from a JSON file holding an array of two squads.
pub fn load_squads(path: &Path) -> Result<[Squad; 2]> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read squads file: {}", path.display()))?;
    let mut squads: Vec<Squad> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse squads file: {}", path.display()))?;
    if squads.len() != 2 {
        bail!("squads file must hold exactly two squads, found {}", squads.len());
    }
    let away = squads.pop().expect("two squads");
    let home = squads.pop().expect("two squads");
    Ok([home, away])
}

/// Load a frequency model from JSON, validating as the engine requires.
pub fn load_freqs(path: &Path) -> Result<Arc<FreqModel>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read frequency model: {}", path.display()))?;
    let model = FreqModel::from_json(&json)
        .with_context(|| format!("Failed to parse frequency model: {}", path.display()))?;
    Ok(Arc::new(model))
}

pub fn save_report(path: &Path, report: &MatchReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

pub fn load_report(path: &Path) -> Result<MatchReport> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read report: {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse report: {}", path.display()))
}
