//! Config schema and deserialization

use crate::engine::{ControlFamily, FamilyRegistry, MaturityBand, MaturityThresholds, ScoringTables};
use crate::EnhancementTier;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Per-band narrative overrides; unset bands keep the defaults
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeOverride {
    #[serde(default)]
    pub foundational: Option<Vec<String>>,
    #[serde(default)]
    pub optimizing: Option<Vec<String>>,
    #[serde(default)]
    pub improving: Option<Vec<String>>,
    #[serde(default)]
    pub leading: Option<Vec<String>>,
}

impl NarrativeOverride {
    fn merge_from(&mut self, base: NarrativeOverride) {
        if self.foundational.is_none() {
            self.foundational = base.foundational;
        }
        if self.optimizing.is_none() {
            self.optimizing = base.optimizing;
        }
        if self.improving.is_none() {
            self.improving = base.improving;
        }
        if self.leading.is_none() {
            self.leading = base.leading;
        }
    }
}

/// Root config structure for .auditpilotrc.json
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default)]
    pub extends: Option<String>,

    /// Minimum overall score (exit 1 if below). Default: none
    #[serde(default)]
    pub threshold: Option<f64>,

    /// Glob patterns for evidence files to exclude from directory scans
    #[serde(default)]
    pub ignore: Vec<String>,

    /// File name suffixes treated as evidence in directory scans
    #[serde(default)]
    pub evidence_patterns: Vec<String>,

    /// Replacement family registry (replaces the whole default registry)
    #[serde(default)]
    pub families: Option<Vec<ControlFamily>>,

    /// Per-tier multiplier overrides
    #[serde(default)]
    pub multipliers: BTreeMap<EnhancementTier, f64>,

    /// Replacement maturity bands, matched in order
    #[serde(default)]
    pub maturity_levels: Option<Vec<MaturityBand>>,

    /// Per-band recommendation narrative overrides
    #[serde(default)]
    pub recommendations: NarrativeOverride,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(mut self, cli_threshold: Option<f64>) -> Self {
        if cli_threshold.is_some() {
            self.threshold = cli_threshold;
        }
        self
    }

    /// Merge another config into this one (for extends)
    pub fn merge_from(&mut self, base: Config) {
        // Base values are overridden by this config's values
        if self.threshold.is_none() {
            self.threshold = base.threshold;
        }
        if self.extends.is_none() {
            self.extends = base.extends;
        }

        let mut all_ignores = base.ignore;
        all_ignores.append(&mut self.ignore);
        self.ignore = all_ignores;

        if self.evidence_patterns.is_empty() {
            self.evidence_patterns = base.evidence_patterns;
        }
        if self.families.is_none() {
            self.families = base.families;
        }
        for (tier, multiplier) in base.multipliers {
            self.multipliers.entry(tier).or_insert(multiplier);
        }
        if self.maturity_levels.is_none() {
            self.maturity_levels = base.maturity_levels;
        }
        self.recommendations.merge_from(base.recommendations);
    }

    /// Get evidence file name patterns
    pub fn get_evidence_patterns(&self) -> Vec<&str> {
        if self.evidence_patterns.is_empty() {
            vec![".json"]
        } else {
            self.evidence_patterns.iter().map(|s| s.as_str()).collect()
        }
    }

    /// Build the scoring tables: defaults with this config's overrides applied.
    /// The result is not validated here.
    pub fn scoring_tables(&self) -> ScoringTables {
        let mut tables = ScoringTables::default();

        if let Some(ref families) = self.families {
            tables.families = FamilyRegistry::new(families.clone());
        }
        for (tier, multiplier) in &self.multipliers {
            tables.multipliers.set(*tier, *multiplier);
        }
        if let Some(ref bands) = self.maturity_levels {
            tables.maturity = MaturityThresholds::new(bands.clone());
        }

        let overrides = &self.recommendations;
        let narrative = &mut tables.narrative;
        if let Some(ref block) = overrides.foundational {
            narrative.foundational = block.clone();
        }
        if let Some(ref block) = overrides.optimizing {
            narrative.optimizing = block.clone();
        }
        if let Some(ref block) = overrides.improving {
            narrative.improving = block.clone();
        }
        if let Some(ref block) = overrides.leading {
            narrative.leading = block.clone();
        }

        tables
    }
}
