//! Pareto volume concentration.
//!
//! Products are ranked by total volume; the report keeps the shortest prefix
//! whose cumulative share reaches the threshold.

use super::code::CodeKey;
use crate::data::SaleRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a sale row contributes to a product's volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeMeasure {
    /// Sum of the catalog content over the product's sale rows.
    #[default]
    Content,
    /// Liters sold: `quantity * content / 1000`.
    Liters,
}

impl VolumeMeasure {
    fn of(self, sale: &SaleRecord) -> f64 {
        let content = sale.content.unwrap_or(0.0);
        match self {
            VolumeMeasure::Content => content,
            VolumeMeasure::Liters => sale.quantity * content / 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoRow {
    pub barcode: String,
    pub description: String,
    pub volume: f64,
    pub cumulative_sum: f64,
    pub cumulative_perc: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParetoReport {
    pub measure: VolumeMeasure,
    pub threshold: f64,
    pub total_volume: f64,
    /// All products, volume descending.
    pub rows: Vec<ParetoRow>,
    /// Length of the kept prefix.
    pub cutoff: usize,
    /// False when no row reached the threshold and every row was kept.
    pub reached_threshold: bool,
}

impl ParetoReport {
    pub fn kept(&self) -> &[ParetoRow] {
        &self.rows[..self.cutoff]
    }
}

/// Length of the prefix up to and including the first entry `>= threshold`,
/// or the whole slice when none reaches it.
pub fn pareto_cutoff(cumulative_perc: &[f64], threshold: f64) -> (usize, bool) {
    match cumulative_perc.iter().position(|p| *p >= threshold) {
        Some(idx) => (idx + 1, true),
        None => (cumulative_perc.len(), false),
    }
}

/// Rank products by volume and cut at `threshold` percent.
///
/// Sales without a catalog description are left out, they have no product
/// to be grouped under.
pub fn compute_pareto(sales: &[SaleRecord], measure: VolumeMeasure, threshold: f64) -> ParetoReport {
    let mut volumes: BTreeMap<(CodeKey, &str), f64> = BTreeMap::new();
    for sale in sales {
        let Some(description) = sale.description.as_deref() else {
            continue;
        };
        *volumes
            .entry((CodeKey(&sale.barcode), description))
            .or_insert(0.0) += measure.of(sale);
    }

    let mut ranked: Vec<((CodeKey, &str), f64)> = volumes.into_iter().collect();
    // BTreeMap order already sorts by barcode; a stable sort keeps it for ties
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total_volume: f64 = ranked.iter().map(|(_, v)| v).sum();
    let mut cumulative_sum = 0.0;
    let rows: Vec<ParetoRow> = ranked
        .into_iter()
        .map(|((barcode, description), volume)| {
            cumulative_sum += volume;
            let cumulative_perc = if total_volume > 0.0 {
                cumulative_sum / total_volume * 100.0
            } else {
                0.0
            };
            ParetoRow {
                barcode: barcode.as_str().to_string(),
                description: description.to_string(),
                volume,
                cumulative_sum,
                cumulative_perc,
            }
        })
        .collect();

    let perc: Vec<f64> = rows.iter().map(|r| r.cumulative_perc).collect();
    let (cutoff, reached_threshold) = pareto_cutoff(&perc, threshold);

    ParetoReport {
        measure,
        threshold,
        total_volume,
        rows,
        cutoff,
        reached_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::test_support::{sale, sale_with_content};

    #[test]
    fn equal_volumes_keep_all_three() {
        let sales = vec![
            sale_with_content("A", 100.0),
            sale_with_content("B", 100.0),
            sale_with_content("C", 100.0),
        ];

        let report = compute_pareto(&sales, VolumeMeasure::Content, 80.0);

        let perc: Vec<f64> = report.rows.iter().map(|r| r.cumulative_perc).collect();
        assert!((perc[0] - 33.333).abs() < 0.01);
        assert!((perc[1] - 66.667).abs() < 0.01);
        assert!((perc[2] - 100.0).abs() < 1e-9);
        assert_eq!(report.cutoff, 3);
        assert!(report.reached_threshold);
    }

    #[test]
    fn cuts_after_first_row_reaching_threshold() {
        let sales = vec![
            sale_with_content("A", 700.0),
            sale_with_content("B", 150.0),
            sale_with_content("C", 100.0),
            sale_with_content("D", 50.0),
        ];

        let report = compute_pareto(&sales, VolumeMeasure::Content, 80.0);

        let kept: Vec<&str> = report.kept().iter().map(|r| r.barcode.as_str()).collect();
        assert_eq!(kept, vec!["A", "B"]);
        assert!(report.kept().last().unwrap().cumulative_perc >= 80.0);
        assert!(report
            .rows
            .windows(2)
            .all(|w| w[0].cumulative_perc <= w[1].cumulative_perc));
    }

    #[test]
    fn content_measure_sums_content_per_sale_row() {
        // Two rows of a 500 content product outrank one row of 800
        let sales = vec![
            sale_with_content("A", 500.0),
            sale_with_content("A", 500.0),
            sale_with_content("B", 800.0),
        ];

        let report = compute_pareto(&sales, VolumeMeasure::Content, 80.0);
        assert_eq!(report.rows[0].barcode, "A");
        assert_eq!(report.rows[0].volume, 1000.0);
    }

    #[test]
    fn liters_measure_weights_by_quantity() {
        let mut a = sale_with_content("A", 500.0);
        a.quantity = 1.0;
        let mut b = sale_with_content("B", 1000.0);
        b.quantity = 6.0;

        let report = compute_pareto(&[a, b], VolumeMeasure::Liters, 80.0);
        assert_eq!(report.rows[0].barcode, "B");
        assert_eq!(report.rows[0].volume, 6.0);
        assert_eq!(report.rows[1].volume, 0.5);
    }

    #[test]
    fn falls_back_to_all_rows_when_threshold_unreached() {
        let (cutoff, reached) = pareto_cutoff(&[40.0, 70.0, 79.9], 80.0);
        assert_eq!(cutoff, 3);
        assert!(!reached);

        let sales = vec![sale_with_content("A", 0.0), sale_with_content("B", 0.0)];
        let report = compute_pareto(&sales, VolumeMeasure::Content, 80.0);
        assert_eq!(report.kept().len(), 2);
        assert!(!report.reached_threshold);
    }

    #[test]
    fn uncatalogued_sales_are_excluded() {
        let mut orphan = sale("X", "1", "2023-06-01", 1.0);
        orphan.description = None;
        orphan.content = None;

        let report = compute_pareto(&[orphan, sale_with_content("A", 10.0)], VolumeMeasure::Content, 80.0);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].barcode, "A");
    }

    #[test]
    fn ties_are_ordered_by_barcode() {
        let sales = vec![sale_with_content("B", 10.0), sale_with_content("A", 10.0)];
        let report = compute_pareto(&sales, VolumeMeasure::Content, 80.0);
        assert_eq!(report.rows[0].barcode, "A");
        assert_eq!(report.rows[1].barcode, "B");

        let sales = vec![sale_with_content("100", 10.0), sale_with_content("99", 10.0)];
        let report = compute_pareto(&sales, VolumeMeasure::Content, 80.0);
        assert_eq!(report.rows[0].barcode, "99");
    }
}
