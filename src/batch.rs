//! Batch assessment of evidence files

use crate::config::is_ignored;
use crate::evidence::{load_evidence, STDIN_PATH};
use crate::{AssessmentReport, MaturityLevel, ScoringEngine};
use anyhow::{Context, Result};
use globset::GlobSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Batches larger than this are assessed in parallel by default
pub const PARALLEL_THRESHOLD: usize = 10;

/// Report for one evidence file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub report: AssessmentReport,
}

/// A file that could not be assessed
#[derive(Debug)]
pub struct FileFailure {
    pub file: PathBuf,
    pub error: crate::Error,
}

/// Summary over a batch of reports
#[derive(Debug, Clone, Serialize)]
pub struct AggregateStats {
    pub files_assessed: usize,
    pub average_score: f64,
    pub maturity_counts: BTreeMap<MaturityLevel, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest: Option<LowestFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LowestFile {
    pub file: PathBuf,
    pub overall_score: f64,
}

/// Collect evidence files under a path. A file path (or `-`) is returned as is.
pub fn collect_evidence_files(
    path: &Path,
    ignore_set: Option<&GlobSet>,
    patterns: &[&str],
) -> Result<Vec<PathBuf>> {
    if path.as_os_str() == STDIN_PATH {
        return Ok(vec![path.to_path_buf()]);
    }

    if path.is_file() {
        if let Some(set) = ignore_set {
            if is_ignored(path, set) {
                return Ok(vec![]);
            }
        }
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let file_path = entry.path();
        if !entry.file_type().is_file() || !is_evidence_file(file_path, patterns) {
            continue;
        }
        if let Some(set) = ignore_set {
            if is_ignored(file_path, set) {
                continue;
            }
        }
        files.push(file_path.to_path_buf());
    }

    // Sort for consistent output
    files.sort();

    Ok(files)
}

/// Whether a file name matches one of the evidence suffixes. Config files
/// and dotfiles are never evidence.
pub fn is_evidence_file(path: &Path, patterns: &[&str]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    patterns.iter().any(|p| name.ends_with(p))
}

/// Assess a single evidence file
pub fn assess_file(engine: &ScoringEngine, file: &Path) -> crate::Result<FileReport> {
    let evidence = load_evidence(file)?;
    Ok(FileReport {
        file: file.to_path_buf(),
        report: engine.assess(&evidence),
    })
}

/// Assess files in order, collecting failures instead of stopping
pub fn assess_files_sequential(
    engine: &ScoringEngine,
    files: &[PathBuf],
) -> (Vec<FileReport>, Vec<FileFailure>) {
    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for file in files {
        match assess_file(engine, file) {
            Ok(report) => reports.push(report),
            Err(error) => {
                tracing::debug!(file = %file.display(), %error, "failed to assess evidence");
                failures.push(FileFailure {
                    file: file.clone(),
                    error,
                });
            }
        }
    }
    (reports, failures)
}

/// Assess files in parallel; output keeps input order
pub fn assess_files_parallel(
    engine: &ScoringEngine,
    files: &[PathBuf],
) -> (Vec<FileReport>, Vec<FileFailure>) {
    use rayon::prelude::*;

    let outcomes: Vec<_> = files
        .par_iter()
        .map(|file| (file, assess_file(engine, file)))
        .collect();

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for (file, outcome) in outcomes {
        match outcome {
            Ok(report) => reports.push(report),
            Err(error) => {
                tracing::debug!(file = %file.display(), %error, "failed to assess evidence");
                failures.push(FileFailure {
                    file: file.clone(),
                    error,
                });
            }
        }
    }
    (reports, failures)
}

/// Configure the global rayon pool size
pub fn configure_threads(jobs: usize) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build_global()
        .context("Failed to configure thread pool")
}

/// Summarize a batch of reports
pub fn aggregate_stats(reports: &[FileReport]) -> AggregateStats {
    let files_assessed = reports.len();
    let average_score = if files_assessed == 0 {
        0.0
    } else {
        let total: f64 = reports.iter().map(|r| r.report.overall_score).sum();
        crate::engine::round2(total / files_assessed as f64)
    };

    let mut maturity_counts = BTreeMap::new();
    for r in reports {
        *maturity_counts.entry(r.report.maturity_level).or_insert(0) += 1;
    }

    let lowest = reports
        .iter()
        .min_by(|a, b| a.report.overall_score.total_cmp(&b.report.overall_score))
        .map(|r| LowestFile {
            file: r.file.clone(),
            overall_score: r.report.overall_score,
        });

    AggregateStats {
        files_assessed,
        average_score,
        maturity_counts,
        lowest,
    }
}
