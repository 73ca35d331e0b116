//! Static Chart Renderer
//! Writes the report charts as PNG files with plotters.
//!
//! Charts:
//! 1. Pareto: volume bars per product, cumulative % line on a secondary
//!    axis and the threshold line
//! 2. Period comparison: quantity per month, coloured by period
//! 3. Product diagnosis: monthly quantity (top) and monthly outlet reach
//!    against the pre-cutoff average (bottom)

use crate::stats::{ParetoReport, PeriodComparison, ProductDiagnosis, VolumeMeasure};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

// Colors
const DODGER_BLUE: RGBColor = RGBColor(30, 144, 255); // Volume bars
const ORANGE: RGBColor = RGBColor(237, 125, 49); // Comparison period
const LIGHT_BLUE: RGBColor = RGBColor(91, 155, 213); // Base period
const GRAY: RGBColor = RGBColor(128, 128, 128); // Reference lines

const LABEL_CHARS: usize = 14;
const MAX_X_LABELS: usize = 40;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to render {}: {reason}", .path.display())]
    Render { path: PathBuf, reason: String },
}

type DrawResult = Result<(), Box<dyn std::error::Error>>;

pub struct StaticChartRenderer {
    width: u32,
    height: u32,
}

impl StaticChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn render_pareto(&self, report: &ParetoReport, path: &Path) -> Result<(), ChartError> {
        Self::finish(self.draw_pareto(report, path), path)
    }

    pub fn render_period_comparison(
        &self,
        report: &PeriodComparison,
        path: &Path,
    ) -> Result<(), ChartError> {
        Self::finish(self.draw_period_comparison(report, path), path)
    }

    pub fn render_diagnosis(&self, report: &ProductDiagnosis, path: &Path) -> Result<(), ChartError> {
        Self::finish(self.draw_diagnosis(report, path), path)
    }

    fn finish(result: DrawResult, path: &Path) -> Result<(), ChartError> {
        result.map_err(|e| ChartError::Render {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!(path = %path.display(), "rendered chart");
        Ok(())
    }

    fn draw_pareto(&self, report: &ParetoReport, path: &Path) -> DrawResult {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let n = report.rows.len().max(1);
        let y_max = report.rows.first().map_or(1.0, |r| r.volume).max(1.0) * 1.1;
        let labels: Vec<String> = report
            .rows
            .iter()
            .map(|r| truncate_label(&r.description, LABEL_CHARS))
            .collect();
        let volume_desc = match report.measure {
            VolumeMeasure::Content => "Sales volume (content)",
            VolumeMeasure::Liters => "Sales volume (liters)",
        };

        let mut chart = ChartBuilder::on(&root)
            .caption("Pareto Analysis of Sales by Volume", ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .right_y_label_area_size(70)
            .build_cartesian_2d((0..n as i32).into_segmented(), 0f64..y_max)?
            .set_secondary_coord(0f64..n as f64, 0f64..105f64);

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n.min(MAX_X_LABELS))
            .x_label_formatter(&|v| segment_label(v, &labels))
            .y_desc(volume_desc)
            .y_label_formatter(&|v| format_thousands(*v))
            .draw()?;

        chart
            .configure_secondary_axes()
            .y_desc("Cumulative %")
            .y_label_formatter(&|v| format!("{:.0}%", v))
            .draw()?;

        // Built before draw_series, the dual-axis context cannot be borrowed twice
        let bars = Histogram::vertical(&chart)
            .style(DODGER_BLUE.filled())
            .margin(3)
            .data(
                report
                    .rows
                    .iter()
                    .enumerate()
                    .map(|(i, r)| (i as i32, r.volume)),
            );
        chart
            .draw_series(bars)?
            .label(volume_desc)
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], DODGER_BLUE.filled()));

        let cumulative: Vec<(f64, f64)> = report
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| (i as f64 + 0.5, r.cumulative_perc))
            .collect();

        chart
            .draw_secondary_series(LineSeries::new(cumulative.clone(), RED.stroke_width(2)))?
            .label("% Cumulative")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
        chart.draw_secondary_series(
            cumulative
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, RED.filled())),
        )?;

        let threshold = report.threshold;
        chart
            .draw_secondary_series(LineSeries::new(
                vec![(0.0, threshold), (n as f64, threshold)],
                GRAY.stroke_width(2),
            ))?
            .label(format!("{}% threshold", threshold))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GRAY));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::MiddleRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_period_comparison(&self, report: &PeriodComparison, path: &Path) -> DrawResult {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let n = report.monthly.len().max(1);
        let y_max = report
            .monthly
            .iter()
            .map(|m| m.quantity)
            .fold(1.0, f64::max)
            * 1.15;
        let labels: Vec<String> = report
            .monthly
            .iter()
            .map(|m| month_name(m.month).to_string())
            .collect();
        let caption = match report.variation_pct {
            Some(pct) => format!("Quantity sold by month (variation {:+.2}%)", pct),
            None => "Quantity sold by month".to_string(),
        };

        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d((0..n as i32).into_segmented(), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|v| segment_label(v, &labels))
            .y_desc("Units sold")
            .y_label_formatter(&|v| format_thousands(*v))
            .draw()?;

        for (months, color, name) in [
            (&report.base_months, LIGHT_BLUE, "Base period"),
            (&report.comparison_months, ORANGE, "Comparison period"),
        ] {
            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(color.filled())
                        .margin(10)
                        .data(
                            report
                                .monthly
                                .iter()
                                .enumerate()
                                .filter(|(_, m)| months.contains(&m.month))
                                .map(|(i, m)| (i as i32, m.quantity)),
                        ),
                )?
                .label(name)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_diagnosis(&self, report: &ProductDiagnosis, path: &Path) -> DrawResult {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;
        let areas = root.split_evenly((2, 1));

        let n = report.monthly.len().max(1);
        let labels: Vec<String> = report.monthly.iter().map(|m| m.label()).collect();

        // Top: quantity per month
        let q_max = report
            .monthly
            .iter()
            .map(|m| m.quantity)
            .fold(1.0, f64::max)
            * 1.15;
        let mut upper = ChartBuilder::on(&areas[0])
            .caption(
                format!("{}: units sold per month", report.product.description),
                ("sans-serif", 24),
            )
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d((0..n as i32).into_segmented(), 0f64..q_max)?;
        upper
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n.min(MAX_X_LABELS))
            .x_label_formatter(&|v| segment_label(v, &labels))
            .y_desc("Units sold")
            .draw()?;
        upper.draw_series(
            Histogram::vertical(&upper)
                .style(DODGER_BLUE.filled())
                .margin(8)
                .data(
                    report
                        .monthly
                        .iter()
                        .enumerate()
                        .map(|(i, m)| (i as i32, m.quantity)),
                ),
        )?;

        // Bottom: outlet reach against the pre-cutoff average
        let o_max = report
            .monthly
            .iter()
            .map(|m| m.outlets as f64)
            .fold(1.0, f64::max)
            * 1.2;
        let mut lower = ChartBuilder::on(&areas[1])
            .caption("Outlets selling per month", ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(0f64..n as f64, 0f64..o_max)?;
        lower
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(0)
            .y_desc("Outlets")
            .draw()?;

        let reach: Vec<(f64, f64)> = report
            .monthly
            .iter()
            .enumerate()
            .map(|(i, m)| (i as f64 + 0.5, m.outlets as f64))
            .collect();
        lower
            .draw_series(LineSeries::new(reach.clone(), ORANGE.stroke_width(2)))?
            .label("Outlets")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ORANGE));
        lower.draw_series(reach.iter().map(|&(x, y)| Circle::new((x, y), 4, ORANGE.filled())))?;
        lower.draw_series(reach.iter().zip(&labels).map(|(&(x, y), label)| {
            Text::new(label.clone(), (x, y), ("sans-serif", 14).into_font())
        }))?;

        if let Some(reference) = report.reference_outlets {
            lower
                .draw_series(LineSeries::new(
                    vec![(0.0, reference), (n as f64, reference)],
                    GRAY.stroke_width(2),
                ))?
                .label(format!("Average before month {}", report.cutoff_month))
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GRAY));
        }

        lower
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

fn segment_label(value: &SegmentValue<i32>, labels: &[String]) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| labels.get(i))
            .cloned()
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

/// Shorten a label to `max` characters, marking the cut with "..".
pub fn truncate_label(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(2)).collect();
    format!("{}..", kept.trim_end())
}

/// Integer part with thousands separators, e.g. `1234567.8` -> `1,234,567`.
pub fn format_thousands(value: f64) -> String {
    let digits = (value.trunc().abs() as u64).to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value <= -1.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    month
        .checked_sub(1)
        .and_then(|i| NAMES.get(i as usize))
        .copied()
        .unwrap_or("?")
}
