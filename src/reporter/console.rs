//! Console reporter with colored output

use crate::batch::{AggregateStats, FileReport};
use crate::engine::recommendations::PRIORITY_HEADER;
use crate::{AssessmentReport, MaturityLevel, ScoringEngine, ScoringTables};
use colored::Colorize;
use std::fmt::Write;
use std::path::Path;

/// Reporter for terminal output
pub struct ConsoleReporter<'a> {
    /// Tables used for family names and weights
    tables: &'a ScoringTables,
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
}

impl<'a> ConsoleReporter<'a> {
    /// Create a new console reporter
    pub fn new(tables: &'a ScoringTables) -> Self {
        Self {
            tables,
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Report a single assessment
    pub fn report(&self, report: &AssessmentReport, source: Option<&Path>) {
        print!("{}", self.render(report, source));
    }

    /// Report multiple assessments with summary
    pub fn report_many(&self, results: &[FileReport], stats: &AggregateStats) {
        for result in results {
            self.report(&result.report, Some(&result.file));
            println!("{}", "─".repeat(60));
        }
        print!("{}", self.render_summary(stats));
    }

    /// Report in quiet mode (just score and level)
    pub fn report_quiet(&self, report: &AssessmentReport, source: Option<&Path>) {
        println!("{}", self.render_quiet(report, source));
    }

    pub fn render_quiet(&self, report: &AssessmentReport, source: Option<&Path>) -> String {
        let label = source
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "assessment".to_string());
        format!(
            "{}: {:.2} ({})",
            label,
            report.overall_score,
            self.colorize_level(report.maturity_level)
        )
    }

    /// Render the full report as text
    pub fn render(&self, report: &AssessmentReport, source: Option<&Path>) -> String {
        let mut out = String::new();
        self.write_header(&mut out, report, source);
        self.write_score(&mut out, report);
        self.write_families(&mut out, report);
        self.write_recommendations(&mut out, report);
        out.push('\n');
        out
    }

    fn write_header(&self, out: &mut String, report: &AssessmentReport, source: Option<&Path>) {
        let title = match source {
            Some(path) => format!("📋 Compliance Maturity Assessment: {}", path.display()),
            None => "📋 Compliance Maturity Assessment".to_string(),
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", title.bold());
        let _ = writeln!(
            out,
            "   Assessed: {} | Families scored: {}/{}",
            report.assessment_date,
            report.family_scores.len(),
            self.tables.families.len()
        );
        let _ = writeln!(out);
    }

    fn write_score(&self, out: &mut String, report: &AssessmentReport) {
        let level = self.colorize_level(report.maturity_level);
        let bar = self.create_score_bar(report.overall_score);
        let _ = writeln!(out, "   Score: {} {}", bar, level.bold());
        let _ = writeln!(
            out,
            "   {}",
            ScoringEngine::maturity_description(report.maturity_level).dimmed()
        );
        let _ = writeln!(out);
    }

    fn write_families(&self, out: &mut String, report: &AssessmentReport) {
        if report.family_scores.is_empty() {
            return;
        }
        let _ = writeln!(out, "   {}", "Family Scores:".bold());

        // Registry order, so related families stay together
        for family in self.tables.families.iter() {
            let Some(score) = report.family_scores.get(&family.id) else {
                continue;
            };
            let score = *score;
            let bar = self.create_mini_bar(score);
            let score_str = format!("{:>6.2}", score);
            let colored_score = if score >= 80.0 {
                score_str.green()
            } else if score >= 60.0 {
                score_str.yellow()
            } else {
                score_str.red()
            };
            if self.verbose {
                let _ = writeln!(
                    out,
                    "   {} {} {} {} (weight {:.0}%, contributes {:.2})",
                    bar,
                    colored_score,
                    format!("{:<3}", family.id).dimmed(),
                    family.name,
                    family.weight * 100.0,
                    score * family.weight
                );
            } else {
                let _ = writeln!(
                    out,
                    "   {} {} {} {} ({:.0}%)",
                    bar,
                    colored_score,
                    format!("{:<3}", family.id).dimmed(),
                    family.name,
                    family.weight * 100.0
                );
            }
        }

        if self.verbose {
            let missing: Vec<&str> = self
                .tables
                .families
                .iter()
                .filter(|f| !report.family_scores.contains_key(&f.id))
                .map(|f| f.id.as_str())
                .collect();
            if !missing.is_empty() {
                let _ = writeln!(
                    out,
                    "   {} {}",
                    "Not submitted (no weight contributed):".dimmed(),
                    missing.join(", ")
                );
            }
        }
        let _ = writeln!(out);
    }

    fn write_recommendations(&self, out: &mut String, report: &AssessmentReport) {
        if report.recommendations.is_empty() {
            return;
        }
        let _ = writeln!(out, "   {}", "Recommendations:".bold());
        for rec in &report.recommendations {
            if rec == PRIORITY_HEADER {
                let _ = writeln!(out, "   {}", rec.yellow());
            } else if let Some(line) = rec.strip_prefix("- ") {
                let _ = writeln!(out, "     {} {}", "✗".red(), line);
            } else {
                let _ = writeln!(out, "   {} {}", "→".cyan(), rec);
            }
        }
    }

    /// Render the batch summary
    pub fn render_summary(&self, stats: &AggregateStats) -> String {
        let mut out = String::new();
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "═".repeat(60));
        let _ = writeln!(out, "{}", "Summary".bold());
        let _ = writeln!(out, "{}", "═".repeat(60));
        let _ = writeln!(
            out,
            "   Files assessed: {}",
            stats.files_assessed.to_string().bold()
        );
        let _ = writeln!(
            out,
            "   Average score:  {}",
            format!("{:.2}", stats.average_score).bold()
        );
        for (level, count) in &stats.maturity_counts {
            let _ = writeln!(out, "   {:<15} {}", format!("{}:", level), count);
        }
        if let Some(ref lowest) = stats.lowest {
            let _ = writeln!(
                out,
                "   Lowest:         {} ({:.2})",
                lowest.file.display(),
                lowest.overall_score
            );
        }
        let _ = writeln!(out);
        out
    }

    fn colorize_level(&self, level: MaturityLevel) -> colored::ColoredString {
        let s = level.to_string();
        match level {
            MaturityLevel::Advanced => s.green().bold(),
            MaturityLevel::Mature => s.green(),
            MaturityLevel::Developing => s.yellow(),
            MaturityLevel::Basic => s.red(),
            MaturityLevel::Unknown => s.magenta(),
        }
    }

    fn create_score_bar(&self, score: f64) -> String {
        let filled = bar_cells(score, 20);
        let empty = 20 - filled;

        let bar = format!(
            "[{}{}] {:>6.2}",
            "█".repeat(filled),
            "░".repeat(empty),
            score
        );

        if self.use_colors {
            if score >= 80.0 {
                bar.green().to_string()
            } else if score >= 60.0 {
                bar.yellow().to_string()
            } else {
                bar.red().to_string()
            }
        } else {
            bar
        }
    }

    fn create_mini_bar(&self, score: f64) -> String {
        let filled = bar_cells(score, 10);
        format!("[{}{}]", "▓".repeat(filled), "░".repeat(10 - filled))
    }
}

/// Number of filled cells for a 0-100 score; out-of-range scores clamp
fn bar_cells(score: f64, width: usize) -> usize {
    let fraction = (score / 100.0).clamp(0.0, 1.0);
    ((fraction * width as f64).floor() as usize).min(width)
}
