//! Scoring engine - tables, weighted scoring, and recommendations

pub mod recommendations;
pub mod scoring;
pub mod tables;

pub use scoring::{round2, ScoringEngine};
pub use tables::{
    ControlFamily, EnhancementMultipliers, FamilyRegistry, MaturityBand, MaturityThresholds,
    RecommendationNarrative, ScoreBand, ScoringTables,
};
