//! Distribution breadth: products sold in a minimum share of all outlets.

use super::code::CodeKey;
use crate::data::SaleRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCoverage {
    pub barcode: String,
    pub outlets: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub total_outlets: usize,
    pub threshold: f64,
    /// Distinct outlets a product needs (`threshold * total_outlets`).
    pub min_outlets: f64,
    pub evaluated_products: usize,
    /// Products at or above the threshold, ordered by barcode (numeric codes
    /// by value).
    pub products: Vec<ProductCoverage>,
}

impl CoverageReport {
    pub fn barcodes(&self) -> impl Iterator<Item = &str> {
        self.products.iter().map(|p| p.barcode.as_str())
    }
}

/// Keep products present in at least `threshold` of all distinct outlets.
pub fn compute_coverage(sales: &[SaleRecord], threshold: f64) -> CoverageReport {
    let all_outlets: HashSet<&str> = sales.iter().map(|s| s.outlet.as_str()).collect();

    let mut by_product: BTreeMap<CodeKey, HashSet<&str>> = BTreeMap::new();
    for sale in sales {
        by_product
            .entry(CodeKey(&sale.barcode))
            .or_default()
            .insert(sale.outlet.as_str());
    }

    let min_outlets = threshold * all_outlets.len() as f64;
    let products = by_product
        .iter()
        .filter(|(_, outlets)| outlets.len() as f64 >= min_outlets)
        .map(|(barcode, outlets)| ProductCoverage {
            barcode: barcode.as_str().to_string(),
            outlets: outlets.len(),
        })
        .collect();

    CoverageReport {
        total_outlets: all_outlets.len(),
        threshold,
        min_outlets,
        evaluated_products: by_product.len(),
        products,
    }
}
