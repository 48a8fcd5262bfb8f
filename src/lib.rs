//! AuditPilot: compliance maturity scorecard
//!
//! This library turns per-control evidence scores into weighted family
//! scores, an overall maturity score and level, and a prioritized list of
//! recommendations.

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod reporter;
pub mod server;

pub use engine::{ScoringEngine, ScoringTables};
pub use error::{Error, Result};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Evidence for each control family, keyed by family id (e.g. "AC"), in
/// document order
pub type EvidenceByFamily = IndexMap<String, Vec<ControlEvidence>>;

/// Computed score per family id, in evidence order
pub type FamilyScoreMap = IndexMap<String, f64>;

/// Evidence for a single control, as supplied by the evidence analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlEvidence {
    /// Unscaled score, expected in 0-100 (not validated)
    pub base_score: f64,
    /// Enhancement tier key; unknown keys score with multiplier 1.0
    pub enhancement: String,
}

impl ControlEvidence {
    pub fn new(base_score: f64, enhancement: impl Into<String>) -> Self {
        Self {
            base_score,
            enhancement: enhancement.into(),
        }
    }
}

/// How much AI-driven automation strengthens a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementTier {
    None,
    Moderate,
    Significant,
    Transformational,
}

impl EnhancementTier {
    /// All tiers, weakest first
    pub const ALL: [EnhancementTier; 4] = [
        EnhancementTier::None,
        EnhancementTier::Moderate,
        EnhancementTier::Significant,
        EnhancementTier::Transformational,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EnhancementTier::None => "none",
            EnhancementTier::Moderate => "moderate",
            EnhancementTier::Significant => "significant",
            EnhancementTier::Transformational => "transformational",
        }
    }

    /// Exact (case-sensitive) key lookup
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == key)
    }
}

impl std::fmt::Display for EnhancementTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Banded classification of the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaturityLevel {
    Basic,
    Developing,
    Mature,
    Advanced,
    /// No configured band contains the score
    Unknown,
}

impl MaturityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            MaturityLevel::Basic => "basic",
            MaturityLevel::Developing => "developing",
            MaturityLevel::Mature => "mature",
            MaturityLevel::Advanced => "advanced",
            MaturityLevel::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MaturityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The assessment report returned to the caller.
///
/// Field names are the wire contract with the reporting frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// ISO-8601 timestamp of when the report was generated
    pub assessment_date: String,
    /// Weighted overall score, rounded to 2 decimals
    pub overall_score: f64,
    pub maturity_level: MaturityLevel,
    /// Per-family scores for registered families, rounded to 2 decimals
    pub family_scores: FamilyScoreMap,
    /// Low-scoring families first, then the narrative block for the score band
    pub recommendations: Vec<String>,
}

/// Transparent result of scoring a single control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlScore {
    pub base_score: f64,
    pub enhancement: String,
    /// Multiplier actually applied (1.0 for unknown tiers)
    pub multiplier: f64,
    /// `min(base_score * multiplier, 100)`
    pub final_score: f64,
}
