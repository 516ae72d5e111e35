//! CLI entry point for the COMPAS fairness audit.

use anyhow::{Context, Result};
use clap::Parser;
use compas_audit::{
    AuditConfig, AuditConfigBuilder, AuditError, AuditOutcome, AuditPipeline, AuditStage,
    ReportGenerator, ReportParams, TextReport, remediation_recommendations,
};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "COMPAS recidivism dataset bias audit",
    long_about = "Measures racial disparities in COMPAS risk scores: high-risk rates, \
                  false positive and false negative rates, and the disparate impact ratio.\n\n\
                  EXAMPLES:\n  \
                  # Audit the default spreadsheet next to the binary\n  \
                  compas-audit\n\n  \
                  # Audit a CSV export and write the JSON report\n  \
                  compas-audit -i compas-scores-two-years.csv -o results/ -r\n\n  \
                  # Compare different groups without rendering charts\n  \
                  compas-audit --group-a Hispanic --no-charts --all-groups"
)]
struct Args {
    /// Spreadsheet or CSV file to audit [default: DocRedacted.xlsx]
    ///
    /// Relative paths not found in the working directory are looked up
    /// next to the executable.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for the chart and report [default: .]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// File name of the chart image [default: compas_bias_analysis.png]
    #[arg(long)]
    chart_name: Option<String>,

    /// Skip rendering the chart image
    #[arg(long)]
    no_charts: bool,

    /// Label of the first compared group [default: African-American]
    #[arg(long)]
    group_a: Option<String>,

    /// Label of the reference group [default: Caucasian]
    #[arg(long)]
    group_b: Option<String>,

    /// Prefix of the first group's flat metric names
    ///
    /// Defaults to "aa", or to a key derived from --group-a (e.g. "hispanic").
    #[arg(long)]
    group_a_key: Option<String>,

    /// Prefix of the reference group's flat metric names
    ///
    /// Defaults to "cauc", or to a key derived from --group-b.
    #[arg(long)]
    group_b_key: Option<String>,

    /// JSON configuration file; command line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output the JSON report to stdout instead of the text report
    ///
    /// Disables all progress logs.
    #[arg(long)]
    json: bool,

    /// Write the JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_audit.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Append a table with the rates of every group
    #[arg(long)]
    all_groups: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Relative inputs missing from the working directory fall back to the
/// directory of the executable.
fn resolve_input(path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(path)))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

fn build_config(args: &Args) -> Result<AuditConfig> {
    let base = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Reading config file {}", path.display()))?;
            serde_json::from_str::<AuditConfig>(&text)
                .with_context(|| format!("Parsing config file {}", path.display()))?
        }
        None => AuditConfig::default(),
    };

    let input = args.input.clone().unwrap_or_else(|| base.input_path.clone());
    let mut builder = AuditConfigBuilder::from_config(base)
        .input_path(resolve_input(&input));

    if args.no_charts {
        builder = builder.charts_enabled(false);
    }

    if let Some(ref output) = args.output {
        builder = builder.output_dir(output);
    }
    if let Some(ref name) = args.chart_name {
        builder = builder.chart_file_name(name);
    }
    if let Some(ref label) = args.group_a {
        builder = builder.group_a_label(label);
    }
    if let Some(ref label) = args.group_b {
        builder = builder.group_b_label(label);
    }
    if let Some(ref key) = args.group_a_key {
        builder = builder.group_a_key(key);
    }
    if let Some(ref key) = args.group_b_key {
        builder = builder.group_b_key(key);
    }

    Ok(builder.build()?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;
    debug!("Configuration: {:?}", config);

    let show_progress = !args.json && !args.quiet;
    if show_progress {
        println!("COMPAS RECIDIVISM DATASET BIAS AUDIT");
        println!("{}", "=".repeat(70));
    }

    let mut pipeline = AuditPipeline::new(config.clone());
    if show_progress {
        pipeline = pipeline.on_progress(|update| {
            if update.stage != AuditStage::Complete {
                println!("\n{}. {}...", update.stage.step(), update.stage.display_name());
            }
        });
    }

    let analysed = match pipeline.analyze() {
        Ok(outcome) => outcome,
        Err(e) if e.is_load_failure() => {
            report_load_failure(&e, args.json)?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // findings come before the charts step on the console
    if !args.json {
        print_findings(&analysed, args.all_groups);
    }
    let outcome = pipeline.finish(analysed);

    let report = ReportGenerator::build_report(ReportParams {
        input_file: &config.input_path.display().to_string(),
        chart_file: outcome.chart_path.as_deref().and_then(|p| p.to_str()),
        filter_summary: &outcome.summary,
        metrics: &outcome.metrics,
        all_groups: &outcome.per_group,
    });

    if args.emit_report {
        let base_name = config
            .input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("compas");
        let generator = ReportGenerator::new(config.output_dir.clone());
        generator.write_report_to_file(&report, base_name)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_recommendations();
    Ok(())
}

/// Print the load error and leave without a report.
fn report_load_failure(err: &AuditError, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(err)?);
    } else {
        error!("{}", err);
        eprintln!("Failed to load data. Exiting.");
    }
    Ok(())
}

/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn print_findings(outcome: &AuditOutcome, all_groups: bool) {
    let text = TextReport::new(&outcome.metrics);
    let text = if all_groups {
        text.with_all_groups(&outcome.per_group)
    } else {
        text
    };

    println!("\n{}", text);
}

fn print_recommendations() {
    println!("\n{}. Remediation Recommendations:", AuditStage::Complete.step());
    println!("{}", remediation_recommendations());
    println!("Analysis complete!");
}
