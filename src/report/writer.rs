//! Report Writer
//! Text, CSV and JSON artifacts of the analyses.

use crate::config::ColumnNames;
use crate::data::{DataProcessor, ProcessorError, LITERS_COL};
use crate::stats::{
    BestOutletReport, CoverageReport, ParetoReport, ParetoRow, PeriodComparison,
    ProductDiagnosis, VolumeMeasure,
};
use polars::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const COVERAGE_FILE: &str = "productos_80_pdv.txt";
pub const PARETO_CSV_FILE: &str = "pareto_analysis_volume.csv";
pub const PARETO_CHART_FILE: &str = "analisis_pareto_volumen.png";
pub const BEST_OUTLET_FILE: &str = "mejor_pdv_por_producto.txt";
pub const PERIOD_FILE: &str = "variacion_ventas.txt";
pub const PERIOD_CHART_FILE: &str = "variacion_ventas.png";
pub const DIAGNOSIS_FILE: &str = "diagnostico_producto.txt";
pub const DIAGNOSIS_CSV_FILE: &str = "diagnostico_producto_mensual.csv";
pub const DIAGNOSIS_CHART_FILE: &str = "diagnostico_producto.png";
pub const SUMMARY_FILE: &str = "resumen.json";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("CSV output failed: {0}")]
    Csv(#[from] ProcessorError),
    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes every artifact under one output directory.
pub struct ReportWriter {
    output_dir: PathBuf,
    columns: ColumnNames,
}

impl ReportWriter {
    /// Create the writer, making sure the output directory exists.
    pub fn new(output_dir: &Path, columns: ColumnNames) -> Result<Self, ReportError> {
        fs::create_dir_all(output_dir)?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            columns,
        })
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }

    fn write_text(&self, file: &str, text: &str) -> Result<PathBuf, ReportError> {
        let path = self.path(file);
        fs::write(&path, text)?;
        info!(path = %path.display(), "wrote report");
        Ok(path)
    }

    pub fn write_coverage(&self, report: &CoverageReport) -> Result<PathBuf, ReportError> {
        self.write_text(COVERAGE_FILE, &format_coverage(report))
    }

    /// Kept Pareto prefix as CSV.
    pub fn write_pareto_csv(&self, report: &ParetoReport) -> Result<PathBuf, ReportError> {
        let rows = report.kept();
        let mut df = DataFrame::new(vec![
            Column::new(
                self.columns.barcode.as_str().into(),
                rows.iter().map(|r| r.barcode.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                self.columns.description.as_str().into(),
                rows.iter().map(|r| r.description.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                volume_column(report.measure, &self.columns).into(),
                rows.iter().map(|r| r.volume).collect::<Vec<_>>(),
            ),
            Column::new(
                "cumulative_sum".into(),
                rows.iter().map(|r| r.cumulative_sum).collect::<Vec<_>>(),
            ),
            Column::new(
                "cumulative_perc".into(),
                rows.iter().map(|r| r.cumulative_perc).collect::<Vec<_>>(),
            ),
        ])?;

        let path = self.path(PARETO_CSV_FILE);
        DataProcessor::write_csv(&mut df, &path)?;
        Ok(path)
    }

    pub fn write_best_outlets(&self, report: &BestOutletReport) -> Result<PathBuf, ReportError> {
        self.write_text(BEST_OUTLET_FILE, &format_best_outlets(report, &self.columns.barcode))
    }

    pub fn write_period(&self, report: &PeriodComparison) -> Result<PathBuf, ReportError> {
        self.write_text(PERIOD_FILE, &format_period(report))
    }

    /// Diagnosis text report plus the monthly series as CSV.
    pub fn write_diagnosis(&self, diagnosis: &ProductDiagnosis) -> Result<PathBuf, ReportError> {
        let monthly = &diagnosis.monthly;
        let mut df = DataFrame::new(vec![
            Column::new("year".into(), monthly.iter().map(|m| m.year).collect::<Vec<_>>()),
            Column::new("month".into(), monthly.iter().map(|m| m.month).collect::<Vec<_>>()),
            Column::new("quantity".into(), monthly.iter().map(|m| m.quantity).collect::<Vec<_>>()),
            Column::new("amount".into(), monthly.iter().map(|m| m.amount).collect::<Vec<_>>()),
            Column::new(
                "unit_price".into(),
                monthly.iter().map(|m| m.unit_price).collect::<Vec<_>>(),
            ),
            Column::new(
                "outlets".into(),
                monthly.iter().map(|m| m.outlets as u64).collect::<Vec<_>>(),
            ),
        ])?;
        DataProcessor::write_csv(&mut df, &self.path(DIAGNOSIS_CSV_FILE))?;

        self.write_text(DIAGNOSIS_FILE, &format_diagnosis(diagnosis))
    }

    pub fn write_summary<T: Serialize>(&self, summary: &T) -> Result<PathBuf, ReportError> {
        let json = serde_json::to_string_pretty(summary)?;
        self.write_text(SUMMARY_FILE, &json)
    }
}

fn volume_column(measure: VolumeMeasure, columns: &ColumnNames) -> &str {
    match measure {
        VolumeMeasure::Content => columns.content.as_str(),
        VolumeMeasure::Liters => LITERS_COL,
    }
}

/// Barcodes as a bracketed list: `[779001, 779002]`.
pub fn format_coverage(report: &CoverageReport) -> String {
    format!("[{}]", report.barcodes().collect::<Vec<_>>().join(", "))
}

/// Two aligned columns under the barcode header, one product per line.
pub fn format_best_outlets(report: &BestOutletReport, header: &str) -> String {
    let key_width = report
        .choices
        .iter()
        .map(|c| c.barcode.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.chars().count());
    let value_width = report
        .choices
        .iter()
        .map(|c| c.outlet.chars().count())
        .max()
        .unwrap_or(0);

    std::iter::once(header.to_string())
        .chain(report.choices.iter().map(|choice| {
            format!(
                "{:<kw$}    {:>vw$}",
                choice.barcode,
                choice.outlet,
                kw = key_width,
                vw = value_width
            )
        }))
        .collect::<Vec<_>>()
        .join("\n")
}

fn month_list(months: &[u32]) -> String {
    months
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_period(report: &PeriodComparison) -> String {
    let variation = report
        .variation_pct
        .map_or_else(|| "undefined (no base sales)".to_string(), |v| format!("{:.2}%", v));
    format!(
        "Quantity sold, months [{}]: {:.2}\nQuantity sold, months [{}]: {:.2}\nVariation: {}\n",
        month_list(&report.base_months),
        report.base_quantity,
        month_list(&report.comparison_months),
        report.comparison_quantity,
        variation
    )
}

fn opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

pub fn format_diagnosis(d: &ProductDiagnosis) -> String {
    let mut lines = vec![
        format!(
            "Product: {} ({}) matched by '{}'",
            d.product.description, d.product.barcode, d.query
        ),
        String::new(),
        format!(
            "{:<8} {:>12} {:>14} {:>12} {:>8}",
            "month", "quantity", "amount", "unit_price", "outlets"
        ),
    ];
    lines.extend(d.monthly.iter().map(|m| {
        format!(
            "{:<8} {:>12.2} {:>14.2} {:>12} {:>8}",
            m.label(),
            m.quantity,
            m.amount,
            opt(m.unit_price),
            m.outlets
        )
    }));
    lines.push(String::new());
    lines.push(format!(
        "Average outlets per month before month {}: {}",
        d.cutoff_month,
        opt(d.reference_outlets)
    ));
    lines.extend(d.after_cutoff.iter().map(|m| {
        let pct = m
            .delta_pct
            .map_or_else(|| "-".to_string(), |p| format!("{:+.2}%", p));
        format!(
            "{}-{:02}: {} outlets ({:+.2}, {})",
            m.year, m.month, m.outlets, m.delta, pct
        )
    }));
    lines.push(format!(
        "Months at or after the cutoff below the average: {} of {}",
        d.months_below_reference(),
        d.after_cutoff.len()
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Console table of Pareto rows (description, volume, cumulative %).
pub fn format_pareto_table(rows: &[ParetoRow]) -> String {
    let width = rows
        .iter()
        .map(|r| r.description.chars().count())
        .max()
        .unwrap_or(0)
        .max("description".len());
    let header = format!(
        "{:<w$} {:>14} {:>16}",
        "description",
        "volume",
        "cumulative_perc",
        w = width
    );
    std::iter::once(header)
        .chain(rows.iter().map(|r| {
            format!(
                "{:<w$} {:>14.2} {:>16.4}",
                r.description,
                r.volume,
                r.cumulative_perc,
                w = width
            )
        }))
        .collect::<Vec<_>>()
        .join("\n")
}
