//! Weighted scoring: controls -> families -> overall maturity

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use super::recommendations;
use super::tables::ScoringTables;
use crate::{
    AssessmentReport, ControlEvidence, ControlScore, EvidenceByFamily, FamilyScoreMap,
    MaturityLevel,
};

/// Upper cap for any control score
pub const MAX_SCORE: f64 = 100.0;

/// Round to 2 decimal places for the report.
///
/// Exact ties on the binary value go to the even digit (70.125 -> 70.12),
/// which precision formatting already does.
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Stateless scoring engine over a fixed set of tables.
///
/// Every method is a pure function of its arguments and the tables, so a
/// single engine can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    tables: ScoringTables,
}

impl ScoringEngine {
    /// Create an engine with the default tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with substitute tables (not validated)
    pub fn with_tables(tables: ScoringTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &ScoringTables {
        &self.tables
    }

    /// Enhanced control score: `min(base_score * multiplier, 100)`.
    ///
    /// Unknown tiers use a multiplier of 1.0. Negative base scores are not
    /// clamped.
    pub fn control_score(&self, base_score: f64, enhancement: &str) -> f64 {
        let multiplier = self.multiplier(enhancement);
        (base_score * multiplier).min(MAX_SCORE)
    }

    /// Control score together with the multiplier that produced it
    pub fn score_control(&self, base_score: f64, enhancement: &str) -> ControlScore {
        ControlScore {
            base_score,
            enhancement: enhancement.to_string(),
            multiplier: self.multiplier(enhancement),
            final_score: self.control_score(base_score, enhancement),
        }
    }

    fn multiplier(&self, enhancement: &str) -> f64 {
        match self.tables.multipliers.get(enhancement) {
            Some(m) => m,
            None => {
                debug!(enhancement, "unknown enhancement tier, using multiplier 1.0");
                1.0
            }
        }
    }

    /// Unweighted mean of the control scores; 0 for an empty family
    pub fn family_score(&self, controls: &[ControlEvidence]) -> f64 {
        if controls.is_empty() {
            return 0.0;
        }
        let total: f64 = controls
            .iter()
            .map(|c| self.control_score(c.base_score, &c.enhancement))
            .sum();
        total / controls.len() as f64
    }

    /// Family scores for every registered family in the evidence
    pub fn family_scores(&self, evidence: &EvidenceByFamily) -> FamilyScoreMap {
        evidence
            .iter()
            .filter(|(id, _)| {
                let known = self.tables.families.contains(id);
                if !known {
                    debug!(family = id.as_str(), "skipping unregistered family");
                }
                known
            })
            .map(|(id, controls)| (id.clone(), self.family_score(controls)))
            .collect()
    }

    /// Weighted sum over registered families. Missing families contribute
    /// nothing and the result is not renormalized.
    pub fn overall_score(&self, family_scores: &FamilyScoreMap) -> f64 {
        family_scores
            .iter()
            .filter_map(|(id, score)| {
                self.tables
                    .families
                    .get(id)
                    .map(|family| score * family.weight)
            })
            .sum()
    }

    pub fn classify_maturity(&self, overall_score: f64) -> MaturityLevel {
        self.tables.maturity.classify(overall_score)
    }

    pub fn recommendations(
        &self,
        family_scores: &FamilyScoreMap,
        overall_score: f64,
    ) -> Vec<String> {
        recommendations::generate(
            &self.tables.families,
            &self.tables.narrative,
            family_scores,
            overall_score,
        )
    }

    /// Generate a report stamped with the current time
    pub fn assess(&self, evidence: &EvidenceByFamily) -> AssessmentReport {
        self.assess_at(evidence, Utc::now())
    }

    /// Generate a report stamped with `assessed_at`.
    ///
    /// Classification and recommendations use unrounded scores; only the
    /// reported numbers are rounded.
    pub fn assess_at(
        &self,
        evidence: &EvidenceByFamily,
        assessed_at: DateTime<Utc>,
    ) -> AssessmentReport {
        let family_scores = self.family_scores(evidence);
        let overall_score = self.overall_score(&family_scores);
        let maturity_level = self.classify_maturity(overall_score);
        let recommendations = self.recommendations(&family_scores, overall_score);

        debug!(
            families = family_scores.len(),
            overall_score,
            maturity = %maturity_level,
            "assessment complete"
        );

        AssessmentReport {
            assessment_date: assessed_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            overall_score: round2(overall_score),
            maturity_level,
            family_scores: family_scores
                .into_iter()
                .map(|(id, score)| (id, round2(score)))
                .collect(),
            recommendations,
        }
    }

    /// Get a description of the maturity level
    pub fn maturity_description(level: MaturityLevel) -> &'static str {
        match level {
            MaturityLevel::Basic => "Basic - Foundational controls are missing or ad hoc",
            MaturityLevel::Developing => "Developing - Core controls exist but coverage is uneven",
            MaturityLevel::Mature => "Mature - Controls are established and consistently applied",
            MaturityLevel::Advanced => "Advanced - Controls are optimized and continuously improved",
            MaturityLevel::Unknown => "Unknown - Score falls outside the configured maturity bands",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tables::{MaturityBand, MaturityThresholds};
    use chrono::TimeZone;

    fn evidence(entries: &[(&str, &[(f64, &str)])]) -> EvidenceByFamily {
        entries
            .iter()
            .map(|(id, controls)| {
                (
                    id.to_string(),
                    controls
                        .iter()
                        .map(|(score, tier)| ControlEvidence::new(*score, *tier))
                        .collect(),
                )
            })
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_control_score_multipliers() {
        let engine = ScoringEngine::new();
        assert!(approx(engine.control_score(70.0, "moderate"), 77.0));
        assert!(approx(engine.control_score(60.0, "significant"), 75.0));
        assert!(approx(engine.control_score(50.0, "transformational"), 75.0));
        assert_eq!(engine.control_score(42.0, "none"), 42.0);
    }

    #[test]
    fn test_control_score_capped_at_100() {
        let engine = ScoringEngine::new();
        assert_eq!(engine.control_score(90.0, "transformational"), 100.0);
        assert_eq!(engine.control_score(100.0, "moderate"), 100.0);
    }

    #[test]
    fn test_control_score_unknown_tier_is_identity() {
        let engine = ScoringEngine::new();
        assert_eq!(engine.control_score(65.0, "heroic"), 65.0);
        assert_eq!(engine.control_score(65.0, "MODERATE"), 65.0);
    }

    #[test]
    fn test_control_score_negative_not_clamped() {
        let engine = ScoringEngine::new();
        assert!(approx(engine.control_score(-10.0, "moderate"), -11.0));
        assert_eq!(engine.control_score(250.0, "none"), 100.0);
    }

    #[test]
    fn test_score_control_breakdown() {
        let engine = ScoringEngine::new();
        let result = engine.score_control(80.0, "significant");
        assert_eq!(result.multiplier, 1.25);
        assert_eq!(result.final_score, 100.0);
        assert_eq!(result.enhancement, "significant");

        let unknown = engine.score_control(80.0, "bogus");
        assert_eq!(unknown.multiplier, 1.0);
        assert_eq!(unknown.final_score, 80.0);
    }

    #[test]
    fn test_family_score_mean() {
        let engine = ScoringEngine::new();
        let controls = vec![
            ControlEvidence::new(80.0, "none"),
            ControlEvidence::new(60.0, "none"),
        ];
        assert_eq!(engine.family_score(&controls), 70.0);
    }

    #[test]
    fn test_family_score_empty_is_zero() {
        let engine = ScoringEngine::new();
        assert_eq!(engine.family_score(&[]), 0.0);
    }

    #[test]
    fn test_overall_score_weighted_sum() {
        let engine = ScoringEngine::new();
        let scores: FamilyScoreMap = [("AC".to_string(), 50.0), ("SC".to_string(), 100.0)]
            .into_iter()
            .collect();
        // 50 * 0.08 + 100 * 0.09
        assert!(approx(engine.overall_score(&scores), 13.0));
    }

    #[test]
    fn test_overall_score_ignores_unregistered() {
        let engine = ScoringEngine::new();
        let scores: FamilyScoreMap = [("AC".to_string(), 50.0), ("XX".to_string(), 100.0)]
            .into_iter()
            .collect();
        assert!(approx(engine.overall_score(&scores), 4.0));
        assert_eq!(engine.overall_score(&FamilyScoreMap::new()), 0.0);
    }

    #[test]
    fn test_assess_single_family() {
        let engine = ScoringEngine::new();
        let report = engine.assess(&evidence(&[("AC", &[(70.0, "moderate")])]));

        assert_eq!(report.family_scores.get("AC"), Some(&77.0));
        assert_eq!(report.overall_score, 6.16);
        assert_eq!(report.maturity_level, MaturityLevel::Basic);
        assert_eq!(
            report.recommendations,
            vec![
                "Priority focus areas identified:",
                "- Access Control (AC): 77.0% - Requires immediate attention",
                "Critical: Implement foundational security controls immediately",
                "Focus on quantum-resistant cryptography deployment",
                "Establish basic explainable AI capabilities",
            ]
        );
    }

    #[test]
    fn test_assess_skips_unregistered_families() {
        let engine = ScoringEngine::new();
        let report = engine.assess(&evidence(&[
            ("AC", &[(100.0, "none")]),
            ("ZZ", &[(10.0, "none")]),
        ]));
        assert_eq!(report.family_scores.len(), 1);
        assert!(!report.family_scores.contains_key("ZZ"));
        assert_eq!(report.overall_score, 8.0);
    }

    #[test]
    fn test_assess_rounds_to_two_decimals() {
        let engine = ScoringEngine::new();
        let report = engine.assess(&evidence(&[(
            "AC",
            &[(33.0, "none"), (33.0, "none"), (34.0, "none")],
        )]));
        // mean = 33.333...
        assert_eq!(report.family_scores["AC"], 33.33);
        // 33.333... * 0.08 = 2.6666...
        assert_eq!(report.overall_score, 2.67);
    }

    #[test]
    fn test_assess_empty_family_scores_zero() {
        let engine = ScoringEngine::new();
        let report = engine.assess(&evidence(&[("IR", &[])]));
        assert_eq!(report.family_scores["IR"], 0.0);
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(
            report.recommendations[1],
            "- Incident Response (IR): 0.0% - Requires immediate attention"
        );
    }

    #[test]
    fn test_assess_at_timestamp() {
        let engine = ScoringEngine::new();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let report = engine.assess_at(&EvidenceByFamily::new(), at);
        assert_eq!(report.assessment_date, "2024-03-01T12:30:00.000000Z");
    }

    #[test]
    fn test_full_submission_reaches_advanced() {
        let engine = ScoringEngine::new();
        let ids: Vec<String> = engine.tables().families.iter().map(|f| f.id.clone()).collect();
        let all: EvidenceByFamily = ids
            .into_iter()
            .map(|id| (id, vec![ControlEvidence::new(95.0, "significant")]))
            .collect();
        let report = engine.assess(&all);
        // Every family at 100, total weight 0.91
        assert_eq!(report.overall_score, 91.0);
        assert_eq!(report.maturity_level, MaturityLevel::Advanced);
        assert_eq!(report.recommendations.len(), 3);
    }

    #[test]
    fn test_substitute_tables_unknown_maturity() {
        let mut tables = ScoringTables::default();
        tables.maturity = MaturityThresholds::new(vec![MaturityBand::new(
            MaturityLevel::Advanced,
            50.0,
            100.0,
        )]);
        let engine = ScoringEngine::with_tables(tables);
        let report = engine.assess(&evidence(&[("AC", &[(70.0, "none")])]));
        assert_eq!(report.maturity_level, MaturityLevel::Unknown);
    }

    #[test]
    fn test_maturity_description_all_levels() {
        assert!(ScoringEngine::maturity_description(MaturityLevel::Basic).contains("Basic"));
        assert!(ScoringEngine::maturity_description(MaturityLevel::Developing).contains("Developing"));
        assert!(ScoringEngine::maturity_description(MaturityLevel::Mature).contains("Mature"));
        assert!(ScoringEngine::maturity_description(MaturityLevel::Advanced).contains("Advanced"));
        assert!(ScoringEngine::maturity_description(MaturityLevel::Unknown).contains("Unknown"));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(6.160000000000001), 6.16);
        assert_eq!(round2(2.666666), 2.67);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(70.125), 70.12);
        assert_eq!(round2(70.375), 70.38);
        assert_eq!(round2(-0.125), -0.12);
        assert_eq!(round2(51.375), 51.38);
    }

    #[test]
    fn test_assess_family_mean_tie_rounds_to_even() {
        let engine = ScoringEngine::new();
        let mut controls = vec![(70.0, "none"); 7];
        controls.push((71.0, "none"));
        let report = engine.assess(&evidence(&[("AC", controls.as_slice())]));
        // mean is exactly 70.125
        assert_eq!(report.family_scores["AC"], 70.12);
    }
}
