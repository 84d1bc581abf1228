//! Secondary candidates for a primary label.

use super::types::Alternative;
use crate::knowledge::Label;

/// Alternatives for `label`, each `primary_confidence - offset` floored at 0,
/// ordered by descending confidence.
///
/// Every result is strictly below `primary_confidence` whenever the primary is
/// positive. A zero primary yields nothing, since no alternative can rank
/// strictly below it.
pub fn rank_alternatives(label: Label, primary_confidence: f32) -> Vec<Alternative> {
    if primary_confidence <= 0.0 {
        return Vec::new();
    }

    let mut ranked: Vec<Alternative> = label
        .entry()
        .alternatives
        .iter()
        .map(|alt| Alternative {
            name: alt.name.to_string(),
            label: alt.label,
            confidence: (primary_confidence - alt.offset).max(0.0),
        })
        .collect();

    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked
}
