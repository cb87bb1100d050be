//! PurchasePulse: batch customer-behavior analytics over a purchases table.
//!
//! Loads the transaction CSV, runs the requested reports, and writes them
//! to stdout. Logs go to stderr so report output stays pipeable.

use chrono::NaiveDate;
use clap::Parser;
use pulse_analytics::source::{CsvSource, TransactionSource};
use pulse_core::config::AppConfig;
use pulse_reporting::{ReportEngine, ReportType};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "purchase-pulse")]
#[command(about = "Customer behavior aggregation and segmentation reports")]
#[command(version)]
struct Cli {
    /// Transactions CSV path (overrides config)
    #[arg(long, env = "PURCHASE_PULSE__DATA__PATH")]
    input: Option<String>,

    /// Reports to run, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    reports: Vec<ReportType>,

    /// Analysis reference date, YYYY-MM-DD (overrides config)
    #[arg(long, env = "PURCHASE_PULSE__ANALYSIS__REFERENCE_DATE")]
    reference_date: Option<NaiveDate>,

    /// Days of inactivity before a customer counts as at-risk
    #[arg(long)]
    inactivity_days: Option<i64>,

    /// Cap on the declining-activity report
    #[arg(long)]
    top_n_declining: Option<usize>,

    /// Output format
    #[arg(long, default_value = "csv", value_parser = ["csv", "json"])]
    format: String,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "purchase_pulse=info,pulse_analytics=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(input) = cli.input {
        config.data.path = input;
    }
    if let Some(date) = cli.reference_date {
        config.analysis.reference_date = Some(date);
    }
    if let Some(days) = cli.inactivity_days {
        config.analysis.inactivity_threshold_days = days;
    }
    if let Some(n) = cli.top_n_declining {
        config.analysis.top_n_declining = n;
    }
    config.analysis.validate()?;

    info!(
        input = %config.data.path,
        reference_date = %config.analysis.resolved_reference_date(),
        inactivity_days = config.analysis.inactivity_threshold_days,
        "Configuration loaded"
    );

    let source = CsvSource::new(config.data.path.clone());
    let transactions = source.fetch()?;
    let engine = ReportEngine::new(config.analysis, transactions)?;

    let selected: Vec<ReportType> = if cli.reports.is_empty() {
        ReportType::all().to_vec()
    } else {
        cli.reports
    };

    let mut failures = 0usize;
    for report_type in selected {
        match engine.generate(report_type) {
            Ok(output) => {
                info!(report = %report_type, rows = output.row_count, "Report ready");
                let rendered = if cli.format == "json" {
                    engine.export_json(report_type)
                } else {
                    engine.export_csv(report_type)
                };
                if let Some(text) = rendered {
                    println!("# {}", report_type);
                    println!("{}", text);
                }
            }
            Err(e) => {
                // One bad report never takes down the rest of the run.
                failures += 1;
                error!(report = %report_type, error = %e, "Report failed, continuing");
            }
        }
    }

    if failures > 0 {
        info!(failures, "Run finished with skipped reports");
    }
    Ok(())
}
