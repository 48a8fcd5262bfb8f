//! Scoring tables: family registry, enhancement multipliers, maturity bands
//! and recommendation narrative

use crate::{EnhancementTier, Error, MaturityLevel, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Tolerance used when comparing configured weights and band edges
const EPSILON: f64 = 1e-3;

/// A named grouping of controls with a fixed weight toward the overall score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlFamily {
    /// Short code, e.g. "AC"
    pub id: String,
    /// Display name
    pub name: String,
    /// Fraction of the overall score (0-1)
    pub weight: f64,
}

impl ControlFamily {
    pub fn new(id: impl Into<String>, name: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weight,
        }
    }
}

/// Ordered registry of known control families
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyRegistry {
    families: Vec<ControlFamily>,
}

impl FamilyRegistry {
    pub fn new(families: Vec<ControlFamily>) -> Self {
        Self { families }
    }

    pub fn get(&self, id: &str) -> Option<&ControlFamily> {
        self.families.iter().find(|f| f.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ControlFamily> {
        self.families.iter()
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.families.iter().map(|f| f.weight).sum()
    }
}

impl Default for FamilyRegistry {
    fn default() -> Self {
        let families = [
            ("AC", "Access Control", 0.08),
            ("AU", "Audit and Accountability", 0.07),
            ("AT", "Awareness and Training", 0.03),
            ("CA", "Assessment, Authorization, and Monitoring", 0.06),
            ("CM", "Configuration Management", 0.05),
            ("CP", "Contingency Planning", 0.04),
            ("IA", "Identification and Authentication", 0.08),
            ("IR", "Incident Response", 0.06),
            ("MA", "Maintenance", 0.03),
            ("MP", "Media Protection", 0.04),
            ("PE", "Physical and Environmental Protection", 0.03),
            ("PL", "Planning", 0.04),
            ("PS", "Personnel Security", 0.04),
            ("RA", "Risk Assessment", 0.06),
            ("SA", "System and Services Acquisition", 0.04),
            ("SC", "System and Communications Protection", 0.09),
            ("SI", "System and Information Integrity", 0.07),
        ];
        Self::new(
            families
                .into_iter()
                .map(|(id, name, weight)| ControlFamily::new(id, name, weight))
                .collect(),
        )
    }
}

/// Multiplicative factor per enhancement tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnhancementMultipliers {
    values: BTreeMap<EnhancementTier, f64>,
}

impl EnhancementMultipliers {
    pub fn new(values: BTreeMap<EnhancementTier, f64>) -> Self {
        Self { values }
    }

    /// Multiplier for a tier key, if the key names a configured tier
    pub fn get(&self, key: &str) -> Option<f64> {
        EnhancementTier::from_key(key).and_then(|tier| self.values.get(&tier).copied())
    }

    pub fn set(&mut self, tier: EnhancementTier, multiplier: f64) {
        self.values.insert(tier, multiplier);
    }

    pub fn iter(&self) -> impl Iterator<Item = (EnhancementTier, f64)> + '_ {
        self.values.iter().map(|(t, m)| (*t, *m))
    }
}

impl Default for EnhancementMultipliers {
    fn default() -> Self {
        Self::new(BTreeMap::from([
            (EnhancementTier::None, 1.0),
            (EnhancementTier::Moderate, 1.1),
            (EnhancementTier::Significant, 1.25),
            (EnhancementTier::Transformational, 1.5),
        ]))
    }
}

/// Closed score interval bound to a maturity level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaturityBand {
    pub level: MaturityLevel,
    pub min: f64,
    pub max: f64,
}

impl MaturityBand {
    pub fn new(level: MaturityLevel, min: f64, max: f64) -> Self {
        Self { level, min, max }
    }

    /// Inclusive at both ends
    pub fn contains(&self, score: f64) -> bool {
        self.min <= score && score <= self.max
    }
}

/// Maturity bands, matched in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaturityThresholds {
    bands: Vec<MaturityBand>,
}

impl MaturityThresholds {
    pub fn new(bands: Vec<MaturityBand>) -> Self {
        Self { bands }
    }

    /// First band containing the score wins; no match yields `Unknown`
    pub fn classify(&self, score: f64) -> MaturityLevel {
        self.bands
            .iter()
            .find(|band| band.contains(score))
            .map(|band| band.level)
            .unwrap_or(MaturityLevel::Unknown)
    }

    pub fn bands(&self) -> &[MaturityBand] {
        &self.bands
    }
}

impl Default for MaturityThresholds {
    fn default() -> Self {
        // Shared edges resolve to the lower band (first match).
        Self::new(vec![
            MaturityBand::new(MaturityLevel::Basic, 0.0, 40.0),
            MaturityBand::new(MaturityLevel::Developing, 40.0, 60.0),
            MaturityBand::new(MaturityLevel::Mature, 60.0, 80.0),
            MaturityBand::new(MaturityLevel::Advanced, 80.0, 100.0),
        ])
    }
}

/// Overall-score band selecting a narrative block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// Below 40
    Foundational,
    /// 40 to below 60
    Optimizing,
    /// 60 to below 80
    Improving,
    /// 80 and above
    Leading,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            ScoreBand::Foundational
        } else if score < 60.0 {
            ScoreBand::Optimizing
        } else if score < 80.0 {
            ScoreBand::Improving
        } else {
            ScoreBand::Leading
        }
    }
}

/// Fixed recommendation strings per overall-score band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationNarrative {
    pub foundational: Vec<String>,
    pub optimizing: Vec<String>,
    pub improving: Vec<String>,
    pub leading: Vec<String>,
}

impl RecommendationNarrative {
    pub fn for_band(&self, band: ScoreBand) -> &[String] {
        match band {
            ScoreBand::Foundational => &self.foundational,
            ScoreBand::Optimizing => &self.optimizing,
            ScoreBand::Improving => &self.improving,
            ScoreBand::Leading => &self.leading,
        }
    }

    fn blocks(&self) -> [(&'static str, &[String]); 4] {
        [
            ("foundational", self.foundational.as_slice()),
            ("optimizing", self.optimizing.as_slice()),
            ("improving", self.improving.as_slice()),
            ("leading", self.leading.as_slice()),
        ]
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for RecommendationNarrative {
    fn default() -> Self {
        Self {
            foundational: strings(&[
                "Critical: Implement foundational security controls immediately",
                "Focus on quantum-resistant cryptography deployment",
                "Establish basic explainable AI capabilities",
            ]),
            optimizing: strings(&[
                "Optimize existing controls and enhance AI agent capabilities",
                "Implement homomorphic encryption for privacy protection",
                "Activate self-healing policy synthesis engine",
            ]),
            improving: strings(&[
                "Focus on continuous improvement and optimization",
                "Enhance automated monitoring and response capabilities",
                "Implement advanced threat detection and analysis",
            ]),
            leading: strings(&[
                "Maintain leadership position through innovation",
                "Contribute to industry best practices and standards",
                "Prepare for next-generation regulatory requirements",
            ]),
        }
    }
}

/// All static configuration the scoring engine needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringTables {
    pub families: FamilyRegistry,
    pub multipliers: EnhancementMultipliers,
    pub maturity: MaturityThresholds,
    pub narrative: RecommendationNarrative,
}

impl ScoringTables {
    /// Check table invariants. The engine accepts any tables; this is run on
    /// configured tables before they are used.
    pub fn validate(&self) -> Result<()> {
        self.validate_families()?;
        self.validate_multipliers()?;
        self.validate_maturity()?;
        self.validate_narrative()
    }

    fn validate_families(&self) -> Result<()> {
        if self.families.is_empty() {
            return Err(Error::invalid_tables("family registry is empty"));
        }
        let mut seen = HashSet::new();
        for family in self.families.iter() {
            if family.id.trim().is_empty() {
                return Err(Error::invalid_tables("family id must not be empty"));
            }
            if !seen.insert(family.id.as_str()) {
                return Err(Error::invalid_tables(format!(
                    "duplicate family id: {}",
                    family.id
                )));
            }
            if !(0.0..=1.0).contains(&family.weight) {
                return Err(Error::invalid_tables(format!(
                    "weight for {} must be between 0 and 1, got {}",
                    family.id, family.weight
                )));
            }
        }
        let total = self.families.total_weight();
        if total > 1.0 + EPSILON {
            return Err(Error::invalid_tables(format!(
                "family weights sum to {:.3}, which exceeds 1.0",
                total
            )));
        }
        if (total - 1.0).abs() > EPSILON {
            tracing::info!(
                total_weight = total,
                "family weights do not sum to 1.0; a complete submission tops out at {:.1}",
                total * 100.0
            );
        }
        Ok(())
    }

    fn validate_multipliers(&self) -> Result<()> {
        let mut previous = 1.0;
        for tier in EnhancementTier::ALL {
            let Some(multiplier) = self.multipliers.get(tier.as_str()) else {
                return Err(Error::invalid_tables(format!(
                    "missing multiplier for tier '{}'",
                    tier
                )));
            };
            if multiplier < previous {
                return Err(Error::invalid_tables(format!(
                    "multiplier for '{}' ({}) must be >= 1.0 and not below the weaker tier",
                    tier, multiplier
                )));
            }
            previous = multiplier;
        }
        Ok(())
    }

    fn validate_maturity(&self) -> Result<()> {
        let bands = self.maturity.bands();
        let (Some(first), Some(last)) = (bands.first(), bands.last()) else {
            return Err(Error::invalid_tables("no maturity bands configured"));
        };
        if first.min.abs() > EPSILON || (last.max - 100.0).abs() > EPSILON {
            return Err(Error::invalid_tables(
                "maturity bands must start at 0 and end at 100",
            ));
        }
        for band in bands {
            if band.level == MaturityLevel::Unknown {
                return Err(Error::invalid_tables(
                    "'unknown' is reserved for unclassified scores",
                ));
            }
            if band.min > band.max {
                return Err(Error::invalid_tables(format!(
                    "band '{}' has min {} above max {}",
                    band.level, band.min, band.max
                )));
            }
        }
        for pair in bands.windows(2) {
            if (pair[1].min - pair[0].max).abs() > EPSILON {
                return Err(Error::invalid_tables(format!(
                    "band '{}' must start where '{}' ends ({} vs {})",
                    pair[1].level, pair[0].level, pair[1].min, pair[0].max
                )));
            }
        }
        Ok(())
    }

    fn validate_narrative(&self) -> Result<()> {
        for (name, block) in self.narrative.blocks() {
            if block.len() != 3 {
                return Err(Error::invalid_tables(format!(
                    "recommendation band '{}' needs exactly 3 entries, got {}",
                    name,
                    block.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_are_valid() {
        assert!(ScoringTables::default().validate().is_ok());
    }

    #[test]
    fn test_default_registry_lookup() {
        let registry = FamilyRegistry::default();
        assert_eq!(registry.len(), 17);
        let ac = registry.get("AC").unwrap();
        assert_eq!(ac.name, "Access Control");
        assert_eq!(ac.weight, 0.08);
        assert!(registry.get("ac").is_none());
        assert!(!registry.contains("ZZ"));
    }

    #[test]
    fn test_default_registry_weights() {
        // Reference weights stop short of 1.0
        let total = FamilyRegistry::default().total_weight();
        assert!((total - 0.91).abs() < 1e-9, "total = {}", total);
    }

    #[test]
    fn test_multiplier_lookup() {
        let m = EnhancementMultipliers::default();
        assert_eq!(m.get("none"), Some(1.0));
        assert_eq!(m.get("moderate"), Some(1.1));
        assert_eq!(m.get("significant"), Some(1.25));
        assert_eq!(m.get("transformational"), Some(1.5));
        assert_eq!(m.get("Moderate"), None);
        assert_eq!(m.get(""), None);
        assert_eq!(m.get("legendary"), None);
    }

    #[test]
    fn test_classify_band_edges() {
        let t = MaturityThresholds::default();
        assert_eq!(t.classify(0.0), MaturityLevel::Basic);
        assert_eq!(t.classify(40.0), MaturityLevel::Basic);
        assert_eq!(t.classify(40.5), MaturityLevel::Developing);
        assert_eq!(t.classify(60.0), MaturityLevel::Developing);
        assert_eq!(t.classify(61.0), MaturityLevel::Mature);
        assert_eq!(t.classify(80.0), MaturityLevel::Mature);
        assert_eq!(t.classify(80.01), MaturityLevel::Advanced);
        assert_eq!(t.classify(100.0), MaturityLevel::Advanced);
    }

    #[test]
    fn test_classify_out_of_range_is_unknown() {
        let t = MaturityThresholds::default();
        assert_eq!(t.classify(-0.5), MaturityLevel::Unknown);
        assert_eq!(t.classify(100.5), MaturityLevel::Unknown);
    }

    #[test]
    fn test_classify_gap_is_unknown() {
        let t = MaturityThresholds::new(vec![
            MaturityBand::new(MaturityLevel::Basic, 0.0, 40.0),
            MaturityBand::new(MaturityLevel::Advanced, 41.0, 100.0),
        ]);
        assert_eq!(t.classify(40.5), MaturityLevel::Unknown);
        assert_eq!(t.classify(41.0), MaturityLevel::Advanced);
    }

    #[test]
    fn test_score_band_edges() {
        assert_eq!(ScoreBand::from_score(39.99), ScoreBand::Foundational);
        assert_eq!(ScoreBand::from_score(40.0), ScoreBand::Optimizing);
        assert_eq!(ScoreBand::from_score(59.99), ScoreBand::Optimizing);
        assert_eq!(ScoreBand::from_score(60.0), ScoreBand::Improving);
        assert_eq!(ScoreBand::from_score(80.0), ScoreBand::Leading);
        assert_eq!(ScoreBand::from_score(-5.0), ScoreBand::Foundational);
    }

    #[test]
    fn test_validate_rejects_duplicate_family() {
        let mut tables = ScoringTables::default();
        tables.families = FamilyRegistry::new(vec![
            ControlFamily::new("AC", "Access Control", 0.5),
            ControlFamily::new("AC", "Access Control Again", 0.5),
        ]);
        let err = tables.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate family id: AC"));
    }

    #[test]
    fn test_validate_rejects_overweight_registry() {
        let mut tables = ScoringTables::default();
        tables.families = FamilyRegistry::new(vec![
            ControlFamily::new("AC", "Access Control", 0.7),
            ControlFamily::new("AU", "Audit", 0.7),
        ]);
        let err = tables.validate().unwrap_err();
        assert!(err.to_string().contains("exceeds 1.0"));
    }

    #[test]
    fn test_validate_rejects_decreasing_multipliers() {
        let mut tables = ScoringTables::default();
        tables.multipliers.set(EnhancementTier::Significant, 1.05);
        assert!(tables.validate().is_err());

        let mut tables = ScoringTables::default();
        tables.multipliers.set(EnhancementTier::None, 0.9);
        assert!(tables.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_gapped_bands() {
        let mut tables = ScoringTables::default();
        tables.maturity = MaturityThresholds::new(vec![
            MaturityBand::new(MaturityLevel::Basic, 0.0, 40.0),
            MaturityBand::new(MaturityLevel::Developing, 41.0, 100.0),
        ]);
        let err = tables.validate().unwrap_err();
        assert!(err.to_string().contains("must start where"));
    }

    #[test]
    fn test_validate_rejects_short_narrative() {
        let mut tables = ScoringTables::default();
        tables.narrative.leading.pop();
        let err = tables.validate().unwrap_err();
        assert!(err.to_string().contains("leading"));
    }

    #[test]
    fn test_tables_serialize_shape() {
        let json = serde_json::to_value(ScoringTables::default()).unwrap();
        assert_eq!(json["families"][0]["id"], "AC");
        assert_eq!(json["multipliers"]["moderate"], 1.1);
        assert_eq!(json["maturity"][3]["level"], "advanced");
        assert_eq!(json["narrative"]["leading"].as_array().unwrap().len(), 3);
    }
}
