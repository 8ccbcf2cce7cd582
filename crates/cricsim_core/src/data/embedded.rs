//! Embedded demo data.
//!
//! `include_str!` bakes a pair of demo squads into the binary so the CLI and
//! tests can run a match with zero file I/O.

use once_cell::sync::OnceCell;

use crate::models::team::Squad;

/// Two demo starting XIs (JSON, ~2KB).
pub const DEMO_SQUADS_JSON: &str = include_str!("demo_squads.json");

static DEMO_SQUADS: OnceCell<(Squad, Squad)> = OnceCell::new();

/// The embedded demo squad pair. Parsed once, then cloned out.
pub fn demo_squads() -> (Squad, Squad) {
    DEMO_SQUADS
        .get_or_init(|| {
            let mut squads: Vec<Squad> = serde_json::from_str(DEMO_SQUADS_JSON)
                .expect("embedded demo squads are valid JSON");
            assert_eq!(squads.len(), 2, "embedded demo squads must be a pair");
            let second = squads.pop().expect("two squads");
            let first = squads.pop().expect("two squads");
            (first, second)
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_squads_parse() {
        let (a, b) = demo_squads();
        assert_eq!(a.team, "Northshire");
        assert_eq!(b.team, "Westport");
        assert_ne!(a.team, b.team);
    }
}
