//! AuditPilot: compliance maturity scorecard CLI

use anyhow::{Context, Result};
use auditpilot::batch::{
    aggregate_stats, assess_files_parallel, assess_files_sequential, collect_evidence_files,
    configure_threads, PARALLEL_THRESHOLD,
};
use auditpilot::config::{self, build_ignore_set, load_config, CONFIG_FILENAME};
use auditpilot::reporter::{ConsoleReporter, JsonReporter};
use auditpilot::{server, ScoringEngine};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// AuditPilot: compliance maturity scorecard
#[derive(Parser, Debug)]
#[command(name = "auditpilot")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Evidence file or directory to assess, or - for stdin
    path: Option<PathBuf>,

    /// Output format as JSON
    #[arg(long, short, global = true)]
    json: bool,

    /// Minimum overall score (exit 1 if below)
    #[arg(long, short)]
    threshold: Option<f64>,

    /// Quiet mode (one line per file)
    #[arg(long, short)]
    quiet: bool,

    /// Verbose output and debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Path to config file (default: search .auditpilotrc.json in current dir and parents)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Assess files in parallel (default for directories with many files)
    #[arg(long)]
    parallel: bool,

    /// Number of parallel threads (default: number of CPU cores)
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a single control from its base score and enhancement tier
    Score {
        /// Base score (0-100)
        #[arg(allow_negative_numbers = true)]
        base_score: f64,

        /// Enhancement tier: none, moderate, significant, transformational
        enhancement: String,
    },

    /// Run a JSON-RPC server on stdin/stdout
    Serve,

    /// List control families, multipliers and maturity bands
    Families,

    /// Create .auditpilotrc.json with the default tables
    Init {
        /// Minimum overall score (e.g. 60)
        #[arg(long)]
        threshold: Option<f64>,

        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(args: Args) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    if let Some(Commands::Init { threshold, dir }) = &args.command {
        return run_init(*threshold, dir.as_deref().unwrap_or(&cwd));
    }

    // Resolve work directory for config search
    let work_dir = match args.path.as_deref() {
        Some(p) if p.is_dir() => p.to_path_buf(),
        Some(p) => p
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone()),
        None => cwd.clone(),
    };

    // Load config (CLI flags override config file)
    let custom_config = args.config.as_ref().map(|p| cwd.join(p));
    let config =
        load_config(&work_dir, custom_config.as_deref())?.merge_with_cli(args.threshold);
    let tables = config::scoring_tables(&config)?;
    let engine = ScoringEngine::with_tables(tables);

    match &args.command {
        Some(Commands::Score {
            base_score,
            enhancement,
        }) => return run_score(&engine, *base_score, enhancement, args.json),
        Some(Commands::Serve) => {
            server::run_server(&engine)?;
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::Families) => return run_families(&engine, args.json),
        Some(Commands::Init { .. }) | None => {}
    }

    let path = args
        .path
        .clone()
        .context("An evidence path is required when not using a subcommand")?;

    let ignore_set = if config.ignore.is_empty() {
        None
    } else {
        Some(build_ignore_set(&config.ignore)?)
    };
    let patterns = config.get_evidence_patterns();
    let files = collect_evidence_files(&path, ignore_set.as_ref(), &patterns)?;

    if files.is_empty() {
        eprintln!("{}: No evidence files found", "Warning".yellow());
        return Ok(ExitCode::from(2));
    }

    if let Some(jobs) = args.jobs {
        configure_threads(jobs)?;
    }

    let use_parallel = args.parallel || files.len() > PARALLEL_THRESHOLD;
    let (results, failures) = if use_parallel {
        assess_files_parallel(&engine, &files)
    } else {
        assess_files_sequential(&engine, &files)
    };

    for failure in &failures {
        if !args.quiet {
            eprintln!(
                "{}: Failed to assess {}: {}",
                "Error".red(),
                failure.file.display(),
                failure.error
            );
        }
    }

    if results.is_empty() {
        if failures.len() == 1 && args.quiet {
            eprintln!("{}: {}", "Error".red(), failures[0].error);
        }
        return Ok(ExitCode::from(2));
    }

    let stats = aggregate_stats(&results);
    let single = results.len() == 1 && failures.is_empty();

    if args.json {
        let reporter = JsonReporter::new().pretty();
        if single {
            println!("{}", reporter.report(&results[0].report));
        } else {
            println!("{}", reporter.report_with_summary(&results, &stats));
        }
    } else {
        let mut reporter = ConsoleReporter::new(engine.tables());
        if args.verbose {
            reporter = reporter.verbose();
        }
        if args.quiet {
            for result in &results {
                reporter.report_quiet(&result.report, Some(&result.file));
            }
        } else if single {
            reporter.report(&results[0].report, Some(&results[0].file));
        } else {
            reporter.report_many(&results, &stats);
        }
    }

    if let Some(threshold) = config.threshold {
        let below: Vec<_> = results
            .iter()
            .filter(|r| r.report.overall_score < threshold)
            .collect();
        if !below.is_empty() {
            if !args.quiet {
                for r in &below {
                    eprintln!(
                        "{}: {} scored {:.2}, below threshold {:.2}",
                        "Threshold".red().bold(),
                        r.file.display(),
                        r.report.overall_score,
                        threshold
                    );
                }
            }
            return Ok(ExitCode::from(1));
        }
    }

    if !failures.is_empty() {
        return Ok(ExitCode::from(2));
    }

    Ok(ExitCode::SUCCESS)
}

fn run_score(
    engine: &ScoringEngine,
    base_score: f64,
    enhancement: &str,
    json: bool,
) -> Result<ExitCode> {
    let result = engine.score_control(base_score, enhancement);

    if json {
        println!("{}", JsonReporter::new().pretty().render(&result, "{}"));
    } else {
        if engine.tables().multipliers.get(enhancement).is_none() {
            eprintln!(
                "{}: unknown enhancement tier '{}', using multiplier 1.0",
                "Warning".yellow(),
                enhancement
            );
        }
        println!(
            "{} x {} ({}) = {}",
            result.base_score,
            result.multiplier,
            result.enhancement,
            format!("{:.2}", result.final_score).bold()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn run_families(engine: &ScoringEngine, json: bool) -> Result<ExitCode> {
    let tables = engine.tables();

    if json {
        println!("{}", JsonReporter::new().pretty().render(tables, "{}"));
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Control Families:".bold());
    for family in tables.families.iter() {
        println!(
            "   {:<3} {:>5.1}%  {}",
            family.id,
            family.weight * 100.0,
            family.name
        );
    }
    println!(
        "   {}",
        format!("Total weight: {:.2}", tables.families.total_weight()).dimmed()
    );
    println!();

    println!("{}", "Enhancement Multipliers:".bold());
    for (tier, multiplier) in tables.multipliers.iter() {
        println!("   {:<17} x{}", tier.as_str(), multiplier);
    }
    println!();

    println!("{}", "Maturity Levels:".bold());
    for band in tables.maturity.bands() {
        println!("   {:<11} {} - {}", band.level.as_str(), band.min, band.max);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_init(threshold: Option<f64>, dir: &Path) -> Result<ExitCode> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let threshold_value = threshold.unwrap_or(60.0);
    let tables = auditpilot::ScoringTables::default();

    let json = serde_json::json!({
        "threshold": threshold_value,
        "ignore": ["**/drafts/**"],
        "evidencePatterns": [".json"],
        "families": tables.families,
        "multipliers": tables.multipliers,
        "maturityLevels": tables.maturity,
        "recommendations": tables.narrative,
    });
    let content = serde_json::to_string_pretty(&json).context("Failed to render config")?;

    std::fs::write(&config_path, content + "\n")
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!(
        "{}: Created {} with threshold={}",
        "Done".green().bold(),
        config_path.display(),
        threshold_value
    );
    Ok(ExitCode::SUCCESS)
}
