//! JSON reporter for machine-readable output

use crate::batch::{AggregateStats, FileReport};
use crate::AssessmentReport;
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Report a single assessment in the wire shape
    pub fn report(&self, report: &AssessmentReport) -> String {
        self.render(report, "{}")
    }

    /// Report a batch of assessments with a summary
    pub fn report_with_summary(&self, results: &[FileReport], stats: &AggregateStats) -> String {
        let output = JsonOutput {
            results,
            summary: stats,
        };
        self.render(&output, "{}")
    }

    /// Render any serializable value (e.g. a control score or the tables)
    pub fn render<T: Serialize + ?Sized>(&self, value: &T, fallback: &str) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|_| fallback.to_string())
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    results: &'a [FileReport],
    summary: &'a AggregateStats,
}
