//! Best outlet per product by relative sale frequency.

use super::code::CodeKey;
use crate::data::SaleRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Orientation of the frequency ratio.
///
/// `OpenDaysPerSaleDay` is the historical report ratio
/// (outlet open days / product sale days). It ranks highest the outlet where
/// the product sells on the *smallest* share of open days, which is the
/// opposite of "highest relative frequency". It stays the default until the
/// intended reading is confirmed; `SaleDaysPerOpenDay` is the corrected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyRatio {
    #[default]
    OpenDaysPerSaleDay,
    SaleDaysPerOpenDay,
}

impl FrequencyRatio {
    fn apply(self, sale_days: usize, open_days: usize) -> f64 {
        match self {
            FrequencyRatio::OpenDaysPerSaleDay => open_days as f64 / sale_days as f64,
            FrequencyRatio::SaleDaysPerOpenDay => sale_days as f64 / open_days as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletChoice {
    pub barcode: String,
    pub outlet: String,
    /// Distinct dates the product sold at this outlet.
    pub sale_days: usize,
    /// Distinct dates the outlet sold any candidate product.
    pub open_days: usize,
    pub ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestOutletReport {
    pub ratio: FrequencyRatio,
    pub candidates: usize,
    /// One entry per candidate product with sales, ordered by barcode.
    pub choices: Vec<OutletChoice>,
}

/// Pick, for every candidate product, the outlet with the highest ratio.
///
/// Open days are counted over the candidate products' sales only. Ties go
/// to the smallest outlet code.
pub fn select_best_outlets(
    sales: &[SaleRecord],
    candidates: &BTreeSet<String>,
    ratio: FrequencyRatio,
) -> BestOutletReport {
    let mut sale_days: BTreeMap<(CodeKey, CodeKey), BTreeSet<NaiveDate>> = BTreeMap::new();
    let mut open_days: BTreeMap<CodeKey, BTreeSet<NaiveDate>> = BTreeMap::new();

    for sale in sales.iter().filter(|s| candidates.contains(&s.barcode)) {
        sale_days
            .entry((CodeKey(&sale.barcode), CodeKey(&sale.outlet)))
            .or_default()
            .insert(sale.date);
        open_days
            .entry(CodeKey(&sale.outlet))
            .or_default()
            .insert(sale.date);
    }

    let mut best: BTreeMap<CodeKey, OutletChoice> = BTreeMap::new();
    for ((barcode, outlet), days) in &sale_days {
        let open = open_days.get(outlet).map_or(0, BTreeSet::len);
        let value = ratio.apply(days.len(), open);
        debug!(
            barcode = barcode.as_str(),
            outlet = outlet.as_str(),
            sale_days = days.len(),
            open_days = open,
            value,
            "frequency ratio"
        );

        let replace = best.get(barcode).map_or(true, |current| value > current.ratio);
        if replace {
            best.insert(
                *barcode,
                OutletChoice {
                    barcode: barcode.as_str().to_string(),
                    outlet: outlet.as_str().to_string(),
                    sale_days: days.len(),
                    open_days: open,
                    ratio: value,
                },
            );
        }
    }

    BestOutletReport {
        ratio,
        candidates: candidates.len(),
        choices: best.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::test_support::sale;

    fn candidates(codes: &[&str]) -> BTreeSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    /// Outlet 1 opens 4 days and sells A on all of them; outlet 2 opens 4
    /// days and sells A on one.
    fn fixture() -> Vec<SaleRecord> {
        let mut sales = Vec::new();
        for day in ["2023-06-01", "2023-06-02", "2023-06-03", "2023-06-04"] {
            sales.push(sale("A", "1", day, 1.0));
            sales.push(sale("B", "2", day, 1.0));
        }
        sales.push(sale("A", "2", "2023-06-01", 1.0));
        sales
    }

    #[test]
    fn coded_ratio_prefers_the_least_frequent_outlet() {
        let report = select_best_outlets(&fixture(), &candidates(&["A", "B"]), FrequencyRatio::OpenDaysPerSaleDay);

        let a = &report.choices[0];
        assert_eq!(a.barcode, "A");
        assert_eq!(a.outlet, "2");
        assert_eq!(a.sale_days, 1);
        assert_eq!(a.open_days, 4);
        assert_eq!(a.ratio, 4.0);
    }

    #[test]
    fn corrected_ratio_prefers_the_most_frequent_outlet() {
        let report = select_best_outlets(&fixture(), &candidates(&["A", "B"]), FrequencyRatio::SaleDaysPerOpenDay);

        assert_eq!(report.choices.len(), 2);
        assert_eq!(report.choices[0].outlet, "1");
        assert_eq!(report.choices[0].ratio, 1.0);
    }

    #[test]
    fn open_days_only_count_candidate_sales() {
        // B is not a candidate, so outlet 2 is open a single day
        let report = select_best_outlets(&fixture(), &candidates(&["A"]), FrequencyRatio::OpenDaysPerSaleDay);

        let a = &report.choices[0];
        assert_eq!(a.outlet, "1");
        assert_eq!(a.ratio, 1.0);
    }

    #[test]
    fn ties_go_to_numerically_smallest_outlet_code() {
        let sales = vec![
            sale("A", "10", "2023-06-01", 1.0),
            sale("A", "9", "2023-06-01", 1.0),
            sale("A", "100", "2023-06-01", 1.0),
        ];
        let report = select_best_outlets(&sales, &candidates(&["A"]), FrequencyRatio::OpenDaysPerSaleDay);
        assert_eq!(report.choices[0].ratio, 1.0);
        assert_eq!(report.choices[0].outlet, "9");
    }

    #[test]
    fn choices_are_ordered_by_numeric_barcode() {
        let sales = vec![
            sale("100", "1", "2023-06-01", 1.0),
            sale("99", "1", "2023-06-01", 1.0),
        ];
        let report = select_best_outlets(&sales, &candidates(&["100", "99"]), FrequencyRatio::OpenDaysPerSaleDay);
        let barcodes: Vec<&str> = report.choices.iter().map(|c| c.barcode.as_str()).collect();
        assert_eq!(barcodes, vec!["99", "100"]);
    }

    #[test]
    fn no_candidates_no_choices() {
        let report = select_best_outlets(&fixture(), &BTreeSet::new(), FrequencyRatio::OpenDaysPerSaleDay);
        assert!(report.choices.is_empty());
    }
}
