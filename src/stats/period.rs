//! Period-over-period quantity variation.

use crate::data::SaleRecord;
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub month: u32,
    pub quantity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodComparison {
    pub base_months: Vec<u32>,
    pub comparison_months: Vec<u32>,
    pub base_quantity: f64,
    pub comparison_quantity: f64,
    /// `None` when the base period sold nothing.
    pub variation_pct: Option<f64>,
    /// Quantity per month-of-year for every month of both periods.
    pub monthly: Vec<MonthTotal>,
}

/// `(new - old) / old * 100`, undefined for a zero base.
pub fn variation_pct(old: f64, new: f64) -> Option<f64> {
    (old != 0.0).then(|| (new - old) / old * 100.0)
}

/// Compare total quantity of two sets of months (month-of-year, any year).
pub fn compare_periods(sales: &[SaleRecord], base: &[u32], comparison: &[u32]) -> PeriodComparison {
    let mut by_month: BTreeMap<u32, f64> = base
        .iter()
        .chain(comparison)
        .map(|m| (*m, 0.0))
        .collect();
    for sale in sales {
        if let Some(total) = by_month.get_mut(&sale.date.month()) {
            *total += sale.quantity;
        }
    }

    let sum_of = |months: &[u32]| -> f64 {
        months
            .iter()
            .filter_map(|m| by_month.get(m))
            .sum()
    };
    let base_quantity = sum_of(base);
    let comparison_quantity = sum_of(comparison);

    PeriodComparison {
        base_months: base.to_vec(),
        comparison_months: comparison.to_vec(),
        base_quantity,
        comparison_quantity,
        variation_pct: variation_pct(base_quantity, comparison_quantity),
        monthly: by_month
            .into_iter()
            .map(|(month, quantity)| MonthTotal { month, quantity })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::test_support::sale;

    #[test]
    fn variation_is_exact() {
        assert_eq!(variation_pct(200.0, 250.0), Some(25.0));
        assert_eq!(variation_pct(200.0, 150.0), Some(-25.0));
        assert_eq!(variation_pct(0.0, 10.0), None);
    }

    #[test]
    fn sums_each_period_across_years() {
        let sales = vec![
            sale("A", "1", "2023-06-10", 10.0),
            sale("A", "1", "2022-07-10", 20.0),
            sale("B", "2", "2023-08-31", 10.0),
            sale("A", "1", "2023-09-01", 15.0),
            sale("B", "1", "2023-11-30", 15.0),
            sale("A", "1", "2023-12-01", 99.0),
            sale("A", "1", "2023-05-31", 99.0),
        ];

        let report = compare_periods(&sales, &[6, 7, 8], &[9, 10, 11]);

        assert_eq!(report.base_quantity, 40.0);
        assert_eq!(report.comparison_quantity, 30.0);
        assert_eq!(report.variation_pct, Some(-25.0));
        assert_eq!(report.monthly.len(), 6);
        assert_eq!(report.monthly[4], MonthTotal { month: 10, quantity: 0.0 });
    }

    #[test]
    fn empty_base_period_has_no_variation() {
        let sales = vec![sale("A", "1", "2023-09-10", 5.0)];
        let report = compare_periods(&sales, &[6, 7, 8], &[9, 10, 11]);
        assert_eq!(report.base_quantity, 0.0);
        assert_eq!(report.variation_pct, None);
    }
}
