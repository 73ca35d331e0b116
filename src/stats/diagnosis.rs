//! Single-product trend diagnosis.
//!
//! Monthly quantity, amount and unit price of one product, plus how its
//! monthly outlet reach after the cutoff month compares with the average
//! reach before it.

use crate::data::{Product, SaleRecord, SalesDataset};
use chrono::Datelike;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No product description contains '{0}'")]
    ProductNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    pub quantity: f64,
    pub amount: f64,
    /// `amount / quantity`; `None` for months with zero quantity.
    pub unit_price: Option<f64>,
    pub outlets: usize,
}

impl MonthlyPoint {
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachComparison {
    pub year: i32,
    pub month: u32,
    pub outlets: usize,
    pub delta: f64,
    pub delta_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDiagnosis {
    pub query: String,
    pub product: Product,
    pub cutoff_month: u32,
    pub monthly: Vec<MonthlyPoint>,
    /// Mean monthly outlet count of the months before the cutoff month of
    /// the first year with sales.
    pub reference_outlets: Option<f64>,
    pub after_cutoff: Vec<ReachComparison>,
}

impl ProductDiagnosis {
    /// Months after the cutoff whose reach fell below the reference.
    pub fn months_below_reference(&self) -> usize {
        self.after_cutoff.iter().filter(|m| m.delta < 0.0).count()
    }
}

/// First catalog product whose description contains `query`, ignoring case.
pub fn find_product<'a>(products: &'a [Product], query: &str) -> Option<&'a Product> {
    let needle = query.to_lowercase();
    products
        .iter()
        .find(|p| p.description.to_lowercase().contains(&needle))
}

fn monthly_points(sales: &[&SaleRecord]) -> Vec<MonthlyPoint> {
    #[derive(Default)]
    struct Acc<'a> {
        quantity: f64,
        amount: f64,
        outlets: HashSet<&'a str>,
    }

    let mut months: BTreeMap<(i32, u32), Acc> = BTreeMap::new();
    for sale in sales {
        let acc = months
            .entry((sale.date.year(), sale.date.month()))
            .or_default();
        acc.quantity += sale.quantity;
        acc.amount += sale.amount;
        acc.outlets.insert(sale.outlet.as_str());
    }

    months
        .into_iter()
        .map(|((year, month), acc)| MonthlyPoint {
            year,
            month,
            quantity: acc.quantity,
            amount: acc.amount,
            unit_price: (acc.quantity != 0.0).then(|| acc.amount / acc.quantity),
            outlets: acc.outlets.len(),
        })
        .collect()
}

/// Diagnose the first product matching `query`.
pub fn diagnose_product(
    dataset: &SalesDataset,
    query: &str,
    cutoff_month: u32,
) -> Result<ProductDiagnosis, AnalysisError> {
    let product = find_product(&dataset.products, query)
        .ok_or_else(|| AnalysisError::ProductNotFound(query.to_string()))?;

    let sales: Vec<&SaleRecord> = dataset
        .sales
        .iter()
        .filter(|s| s.barcode == product.barcode)
        .collect();
    let monthly = monthly_points(&sales);

    // The cutoff falls in the first year of the series; later years are all after it
    let cutoff = monthly.first().map(|m| (m.year, cutoff_month));
    let is_before = |m: &MonthlyPoint| cutoff.is_some_and(|c| (m.year, m.month) < c);

    let before: Vec<f64> = monthly
        .iter()
        .filter(|m| is_before(*m))
        .map(|m| m.outlets as f64)
        .collect();
    let reference_outlets = (!before.is_empty()).then(|| before.iter().mean());

    let after_cutoff = monthly
        .iter()
        .filter(|m| !is_before(*m))
        .map(|m| {
            let outlets = m.outlets as f64;
            let delta = reference_outlets.map_or(0.0, |r| outlets - r);
            ReachComparison {
                year: m.year,
                month: m.month,
                outlets: m.outlets,
                delta,
                delta_pct: reference_outlets
                    .filter(|r| *r != 0.0)
                    .map(|r| delta / r * 100.0),
            }
        })
        .collect();

    Ok(ProductDiagnosis {
        query: query.to_string(),
        product: product.clone(),
        cutoff_month,
        monthly,
        reference_outlets,
        after_cutoff,
    })
}
