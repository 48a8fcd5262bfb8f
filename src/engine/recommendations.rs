//! Recommendation generation from family and overall scores

use super::tables::{FamilyRegistry, RecommendationNarrative, ScoreBand};
use crate::FamilyScoreMap;

/// Families scoring below this are listed as priority focus areas
pub const LOW_SCORE_THRESHOLD: f64 = 60.0;

pub const PRIORITY_HEADER: &str = "Priority focus areas identified:";

/// Build the ordered recommendation list.
///
/// Low-scoring families come first, worst first, followed by the narrative
/// block for the overall-score band. Families missing from the registry are
/// not listed.
pub fn generate(
    registry: &FamilyRegistry,
    narrative: &RecommendationNarrative,
    family_scores: &FamilyScoreMap,
    overall_score: f64,
) -> Vec<String> {
    let mut recs = Vec::new();

    let mut low_scoring: Vec<(&str, &str, f64)> = family_scores
        .iter()
        .filter(|(_, score)| **score < LOW_SCORE_THRESHOLD)
        .filter_map(|(id, score)| {
            registry
                .get(id)
                .map(|family| (id.as_str(), family.name.as_str(), *score))
        })
        .collect();

    if !low_scoring.is_empty() {
        // Stable sort: ties keep evidence order
        low_scoring.sort_by(|a, b| a.2.total_cmp(&b.2));

        recs.push(PRIORITY_HEADER.to_string());
        for (id, name, score) in low_scoring {
            recs.push(format!(
                "- {} ({}): {:.1}% - Requires immediate attention",
                name, id, score
            ));
        }
    }

    let band = ScoreBand::from_score(overall_score);
    recs.extend(narrative.for_band(band).iter().cloned());

    recs
}
