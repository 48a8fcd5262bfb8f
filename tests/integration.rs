//! End-to-end tests through the public library API: evidence files, config
//! discovery, batch assessment.

use auditpilot::batch::{
    aggregate_stats, assess_files_parallel, assess_files_sequential, collect_evidence_files,
};
use auditpilot::config::{build_ignore_set, load_config, scoring_tables};
use auditpilot::evidence::load_evidence;
use auditpilot::{MaturityLevel, ScoringEngine};
use chrono::{TimeZone, Utc};
use std::fs;
use std::path::Path;

const WEAK: &str = "test-data/evidence/weak.json";
const STRONG: &str = "test-data/evidence/strong.json";

#[test]
fn weak_fixture_report() {
    let evidence = load_evidence(Path::new(WEAK)).unwrap();
    assert_eq!(evidence.len(), 3);
    assert_eq!(evidence["AC"].len(), 2);

    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    let report = ScoringEngine::new().assess_at(&evidence, at);

    assert_eq!(report.assessment_date, "2024-03-01T12:30:00.000000Z");
    assert_eq!(report.overall_score, 11.75);
    assert_eq!(report.maturity_level, MaturityLevel::Basic);
    assert_eq!(report.recommendations.len(), 7);
    assert!(report.recommendations[1].contains("(IA): 37.5%"));
}

#[test]
fn strong_fixture_report() {
    let evidence = load_evidence(Path::new(STRONG)).unwrap();
    let report = ScoringEngine::new().assess(&evidence);
    assert_eq!(report.overall_score, 91.0);
    assert_eq!(report.maturity_level, MaturityLevel::Advanced);
    assert!(report.family_scores.values().all(|s| *s == 100.0));
}

#[test]
fn config_in_parent_directory_is_found() {
    let root = tempfile::TempDir::new().unwrap();
    let nested = root.path().join("audits").join("2024");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        root.path().join(".auditpilotrc.json"),
        r#"{ "threshold": 70, "multipliers": { "moderate": 1.2 } }"#,
    )
    .unwrap();

    let config = load_config(&nested, None).unwrap();
    assert_eq!(config.threshold, Some(70.0));

    let engine = ScoringEngine::with_tables(scoring_tables(&config).unwrap());
    assert_eq!(engine.control_score(50.0, "moderate"), 60.0);
    assert_eq!(engine.control_score(50.0, "significant"), 62.5);
}

#[test]
fn config_extends_chain_merges() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(
        dir.path().join("base.json"),
        r#"{
            "threshold": 40,
            "ignore": ["**/archive/**"],
            "recommendations": { "leading": ["Keep going", "Share lessons", "Plan ahead"] }
        }"#,
    )
    .unwrap();
    fs::write(
        dir.path().join(".auditpilotrc.json"),
        r#"{ "extends": "base", "ignore": ["**/drafts/**"] }"#,
    )
    .unwrap();

    let config = load_config(dir.path(), None).unwrap();
    assert_eq!(config.threshold, Some(40.0));
    assert_eq!(config.ignore, vec!["**/archive/**", "**/drafts/**"]);

    let tables = scoring_tables(&config).unwrap();
    assert_eq!(tables.narrative.leading[0], "Keep going");
    assert_eq!(
        tables.narrative.foundational[0],
        "Critical: Implement foundational security controls immediately"
    );
}

#[test]
fn config_with_bad_bands_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(
        dir.path().join(".auditpilotrc.json"),
        r#"{ "maturityLevels": [
            { "level": "basic", "min": 0, "max": 40 },
            { "level": "advanced", "min": 50, "max": 100 }
        ] }"#,
    )
    .unwrap();

    let config = load_config(dir.path(), None).unwrap();
    let err = scoring_tables(&config).unwrap_err();
    assert!(
        format!("{:#}", err).contains("invalid scoring tables"),
        "got: {:#}",
        err
    );
}

#[test]
fn batch_over_directory_with_ignore() {
    let dir = tempfile::TempDir::new().unwrap();
    let drafts = dir.path().join("drafts");
    fs::create_dir_all(&drafts).unwrap();
    fs::copy(WEAK, dir.path().join("q1.json")).unwrap();
    fs::copy(STRONG, dir.path().join("q2.json")).unwrap();
    fs::copy(STRONG, drafts.join("q3.json")).unwrap();
    fs::write(dir.path().join("notes.txt"), "not evidence").unwrap();

    let ignore = build_ignore_set(&["**/drafts/**".to_string()]).unwrap();
    let files = collect_evidence_files(dir.path(), Some(&ignore), &[".json"]).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("q1.json"));
    assert!(files[1].ends_with("q2.json"));

    let engine = ScoringEngine::new();
    let (reports, failures) = assess_files_sequential(&engine, &files);
    assert!(failures.is_empty());

    let stats = aggregate_stats(&reports);
    assert_eq!(stats.files_assessed, 2);
    // (11.75 + 91.0) / 2
    assert_eq!(stats.average_score, 51.38);
    assert_eq!(stats.maturity_counts[&MaturityLevel::Basic], 1);
    assert_eq!(stats.maturity_counts[&MaturityLevel::Advanced], 1);
    assert!(stats.lowest.unwrap().file.ends_with("q1.json"));
}

#[test]
fn batch_keeps_failures_separate() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::copy(WEAK, dir.path().join("a.json")).unwrap();
    fs::write(dir.path().join("b.json"), "{}").unwrap();
    fs::write(dir.path().join("c.json"), "[1, 2]").unwrap();

    let files = collect_evidence_files(dir.path(), None, &[".json"]).unwrap();
    let engine = ScoringEngine::new();
    let (reports, failures) = assess_files_parallel(&engine, &files);

    assert_eq!(reports.len(), 1);
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|f| f.error.is_bad_input()));
    assert!(failures[1].error.to_string().contains("an array"));
}
