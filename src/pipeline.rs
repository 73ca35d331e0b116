//! Analysis pipeline: load, clean, run the five analyses, write artifacts.

use crate::charts::StaticChartRenderer;
use crate::config::AnalysisConfig;
use crate::data::{DataLoader, DataProcessor, SalesDataset};
use crate::report::{self, ReportWriter};
use crate::stats::{
    compare_periods, compute_coverage, compute_pareto, diagnose_product, select_best_outlets,
    BestOutletReport, CoverageReport, FrequencyRatio, ParetoReport, PeriodComparison,
    ProductDiagnosis,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};

/// Everything one run produced, serialised to the JSON summary.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub products: usize,
    pub sales: usize,
    pub replaced_content_values: usize,
    pub coverage: CoverageReport,
    pub pareto: ParetoReport,
    pub best_outlets: BestOutletReport,
    pub period: PeriodComparison,
    pub diagnosis: Option<ProductDiagnosis>,
    pub artifacts: Vec<PathBuf>,
}

pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<RunSummary> {
        let config = &self.config;
        config.validate().context("invalid configuration")?;
        let columns = &config.columns;

        // Load and clean
        let loader = DataLoader::new(columns.clone());
        let raw_products = loader
            .load_products(&config.raw_products)
            .context("loading product catalog")?;
        let sales_df = loader
            .load_sales(&config.raw_sales)
            .context("loading sales log")?;

        let (mut products_df, replaced) =
            DataProcessor::clean_products(&raw_products, columns, config.content_fill)
                .context("cleaning product catalog")?;
        DataProcessor::write_csv(&mut products_df, &config.processed_products)
            .context("writing processed catalog")?;

        let merged = DataProcessor::merge_sales(&sales_df, &products_df, columns)
            .context("merging sales with catalog")?;
        let dataset = SalesDataset::from_frames(&products_df, &merged, columns)
            .context("reading sales rows")?;

        let writer = ReportWriter::new(&config.output_dir, columns.clone())
            .context("preparing output directory")?;
        let renderer = StaticChartRenderer::new(config.chart_width, config.chart_height);
        let mut artifacts = vec![config.processed_products.clone()];

        // 1. Outlet coverage
        let coverage = compute_coverage(&dataset.sales, config.coverage_threshold);
        info!(
            total_outlets = coverage.total_outlets,
            kept = coverage.products.len(),
            "coverage filter"
        );
        artifacts.push(writer.write_coverage(&coverage)?);

        // 2. Pareto volume
        let pareto = compute_pareto(&dataset.sales, config.volume_measure, config.pareto_threshold);
        if !pareto.reached_threshold {
            warn!(
                threshold = config.pareto_threshold,
                "no product reaches the cumulative threshold, keeping all rows"
            );
        }
        println!("--- Full Pareto analysis ---");
        println!("{}", report::format_pareto_table(&pareto.rows));
        println!("\n{}\n", "=".repeat(50));
        println!(
            "--- Products accumulating {}% of volume (total: {}) ---",
            config.pareto_threshold,
            pareto.kept().len()
        );
        println!("{}", report::format_pareto_table(pareto.kept()));
        artifacts.push(writer.write_pareto_csv(&pareto)?);
        if config.render_charts {
            let path = writer.path(report::PARETO_CHART_FILE);
            renderer.render_pareto(&pareto, &path)?;
            artifacts.push(path);
        }

        // 3. Best outlet for products in both filters
        let in_pareto: BTreeSet<&str> = pareto.kept().iter().map(|r| r.barcode.as_str()).collect();
        let candidates: BTreeSet<String> = coverage
            .barcodes()
            .filter(|b| in_pareto.contains(b))
            .map(str::to_string)
            .collect();
        info!(candidates = candidates.len(), ratio = ?config.frequency_ratio, "best outlet selection");
        if config.frequency_ratio == FrequencyRatio::OpenDaysPerSaleDay {
            warn!("open/sale day ratio favours the outlet where each product sells least often");
        }
        let best_outlets = select_best_outlets(&dataset.sales, &candidates, config.frequency_ratio);
        artifacts.push(writer.write_best_outlets(&best_outlets)?);

        // 4. Period comparison
        let period = compare_periods(
            &dataset.sales,
            &config.base_months,
            &config.comparison_months,
        );
        match period.variation_pct {
            Some(pct) => info!(
                base = period.base_quantity,
                comparison = period.comparison_quantity,
                variation_pct = pct,
                "period comparison"
            ),
            None => warn!("base period has no sales, variation is undefined"),
        }
        artifacts.push(writer.write_period(&period)?);
        if config.render_charts {
            let path = writer.path(report::PERIOD_CHART_FILE);
            renderer.render_period_comparison(&period, &path)?;
            artifacts.push(path);
        }

        // 5. Single product diagnosis
        let diagnosis = match config.diagnosis_product.as_deref() {
            Some(query) => {
                let diagnosis = diagnose_product(&dataset, query, config.diagnosis_cutoff_month)?;
                info!(
                    barcode = %diagnosis.product.barcode,
                    months = diagnosis.monthly.len(),
                    below_reference = diagnosis.months_below_reference(),
                    "product diagnosis"
                );
                artifacts.push(writer.write_diagnosis(&diagnosis)?);
                artifacts.push(writer.path(report::DIAGNOSIS_CSV_FILE));
                if config.render_charts {
                    let path = writer.path(report::DIAGNOSIS_CHART_FILE);
                    renderer.render_diagnosis(&diagnosis, &path)?;
                    artifacts.push(path);
                }
                Some(diagnosis)
            }
            None => {
                info!("no diagnosis product configured, skipping diagnosis");
                None
            }
        };

        artifacts.push(writer.path(report::SUMMARY_FILE));
        let summary = RunSummary {
            products: dataset.products.len(),
            sales: dataset.sales.len(),
            replaced_content_values: replaced,
            coverage,
            pareto,
            best_outlets,
            period,
            diagnosis,
            artifacts,
        };
        writer.write_summary(&summary)?;

        Ok(summary)
    }
}
