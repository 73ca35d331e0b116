//! Sales Insights - Retail sales analysis reports
//!
//! Loads a product catalog and a point-of-sale log, then writes outlet
//! coverage, Pareto volume, best outlet, period variation and product
//! diagnosis reports.

mod charts;
mod config;
mod data;
mod pipeline;
mod report;
mod stats;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use config::AnalysisConfig;
use pipeline::Pipeline;
use stats::VolumeMeasure;
use std::path::PathBuf;
use tracing::info;

/// CLI-compatible volume measure enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliVolumeMeasure {
    /// Sum of catalog content over sale rows
    Content,
    /// Quantity times content, in liters
    Liters,
}

impl From<CliVolumeMeasure> for VolumeMeasure {
    fn from(cli: CliVolumeMeasure) -> Self {
        match cli {
            CliVolumeMeasure::Content => VolumeMeasure::Content,
            CliVolumeMeasure::Liters => VolumeMeasure::Liters,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Retail sales analysis reports",
    long_about = "Loads a product catalog and a sales log and writes five reports:\n\
                  outlet coverage, Pareto volume, best outlet per product,\n\
                  period-over-period variation and a single-product diagnosis.\n\n\
                  Flags override values from --config, which override defaults."
)]
struct Args {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Raw product catalog CSV
    #[arg(long)]
    products: Option<PathBuf>,

    /// Raw sales log CSV
    #[arg(long)]
    sales: Option<PathBuf>,

    /// Where to write the cleaned product catalog
    #[arg(long)]
    processed: Option<PathBuf>,

    /// Output directory for reports and charts
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Description fragment of the product to diagnose
    #[arg(short, long)]
    product: Option<String>,

    /// How product volume is measured for the Pareto analysis
    #[arg(long, value_enum)]
    volume_measure: Option<CliVolumeMeasure>,

    /// Skip PNG chart rendering
    #[arg(long)]
    no_charts: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(path) = self.products {
            config.raw_products = path;
        }
        if let Some(path) = self.sales {
            config.raw_sales = path;
        }
        if let Some(path) = self.processed {
            config.processed_products = path;
        }
        if let Some(dir) = self.output {
            config.output_dir = dir;
        }
        if let Some(product) = self.product {
            config.diagnosis_product = Some(product);
        }
        if let Some(measure) = self.volume_measure {
            config.volume_measure = measure.into();
        }
        if self.no_charts {
            config.render_charts = false;
        }
        Ok(config)
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence.
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = args.into_config().context("building configuration")?;
    info!(
        products = %config.raw_products.display(),
        sales = %config.raw_sales.display(),
        output = %config.output_dir.display(),
        "starting analysis"
    );

    let summary = Pipeline::new(config).run()?;

    println!();
    println!("Products: {}  Sales rows: {}", summary.products, summary.sales);
    println!(
        "Coverage: {} of {} products in >= {:.0}% of {} outlets",
        summary.coverage.products.len(),
        summary.coverage.evaluated_products,
        summary.coverage.threshold * 100.0,
        summary.coverage.total_outlets
    );
    println!(
        "Pareto: {} of {} products reach {}% of volume",
        summary.pareto.kept().len(),
        summary.pareto.rows.len(),
        summary.pareto.threshold
    );
    println!("Best outlet chosen for {} products", summary.best_outlets.choices.len());
    match summary.period.variation_pct {
        Some(pct) => println!("Period variation: {:+.2}%", pct),
        None => println!("Period variation: undefined"),
    }
    if let Some(diagnosis) = &summary.diagnosis {
        println!(
            "Diagnosis: {} - {} of {} months after the cutoff below the average reach",
            diagnosis.product.description,
            diagnosis.months_below_reference(),
            diagnosis.after_cutoff.len()
        );
    }
    println!("Artifacts written: {}", summary.artifacts.len());

    Ok(())
}
