//! Typed view of the cleaned catalog and the merged sales table.

use crate::config::ColumnNames;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Row {row}: missing value in column '{column}'")]
    MissingValue { row: usize, column: String },
    #[error("Row {row}: unparseable date '{value}'")]
    BadDate { row: usize, value: String },
}

/// Catalog entry after cleaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub barcode: String,
    pub description: String,
    pub content: Option<f64>,
}

/// One sale joined to its catalog entry (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub barcode: String,
    pub outlet: String,
    pub date: NaiveDate,
    pub quantity: f64,
    pub amount: f64,
    pub description: Option<String>,
    pub content: Option<f64>,
}

/// The in-memory tables every analysis reads from.
#[derive(Debug, Clone, Default)]
pub struct SalesDataset {
    pub products: Vec<Product>,
    pub sales: Vec<SaleRecord>,
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a commercial date in any of the accepted textual forms.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
                .map(|dt| dt.date())
        })
}

impl SalesDataset {
    /// Build the typed tables from the cleaned catalog and the merged sales frame.
    pub fn from_frames(
        products: &DataFrame,
        merged_sales: &DataFrame,
        columns: &ColumnNames,
    ) -> Result<Self, DatasetError> {
        let products = Self::extract_products(products, columns)?;
        let sales = Self::extract_sales(merged_sales, columns)?;
        debug!(products = products.len(), sales = sales.len(), "built typed dataset");
        Ok(Self { products, sales })
    }

    fn extract_products(df: &DataFrame, c: &ColumnNames) -> Result<Vec<Product>, DatasetError> {
        let barcodes = df.column(c.barcode.as_str())?.str()?;
        let descriptions = df.column(c.description.as_str())?.str()?;
        let content = df.column(c.content.as_str())?.f64()?;

        barcodes
            .into_iter()
            .zip(descriptions.into_iter())
            .zip(content.into_iter())
            .enumerate()
            .map(|(row, ((barcode, description), content))| {
                Ok(Product {
                    barcode: required(barcode, row, &c.barcode)?.to_string(),
                    description: description.unwrap_or_default().to_string(),
                    content,
                })
            })
            .collect()
    }

    fn extract_sales(df: &DataFrame, c: &ColumnNames) -> Result<Vec<SaleRecord>, DatasetError> {
        let barcodes = df.column(c.barcode.as_str())?.str()?;
        let outlets = df.column(c.outlet.as_str())?.str()?;
        let dates = df.column(c.date.as_str())?.str()?;
        let quantities = df.column(c.quantity.as_str())?.f64()?;
        let amounts = df.column(c.amount.as_str())?.f64()?;
        let descriptions = df.column(c.description.as_str())?.str()?;
        let content = df.column(c.content.as_str())?.f64()?;

        let mut sales = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let raw_date = required(dates.get(row), row, &c.date)?;
            let date = parse_date(raw_date).ok_or_else(|| DatasetError::BadDate {
                row,
                value: raw_date.to_string(),
            })?;

            sales.push(SaleRecord {
                barcode: required(barcodes.get(row), row, &c.barcode)?.to_string(),
                outlet: required(outlets.get(row), row, &c.outlet)?.to_string(),
                date,
                quantity: quantities.get(row).unwrap_or(0.0),
                amount: amounts.get(row).unwrap_or(0.0),
                description: descriptions.get(row).map(str::to_string),
                content: content.get(row),
            });
        }
        Ok(sales)
    }
}

fn required<'a>(value: Option<&'a str>, row: usize, column: &str) -> Result<&'a str, DatasetError> {
    value.ok_or_else(|| DatasetError::MissingValue {
        row,
        column: column.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_accepted_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2023, 9, 14);
        assert_eq!(parse_date("2023-09-14"), expected);
        assert_eq!(parse_date("14/09/2023"), expected);
        assert_eq!(parse_date("2023/09/14"), expected);
        assert_eq!(parse_date(" 2023-09-14 08:30:00 "), expected);
        assert_eq!(parse_date("Sept 14"), None);
    }

    fn merged(dates: &[&str]) -> DataFrame {
        let n = dates.len();
        DataFrame::new(vec![
            Column::new("codigo_barras".into(), vec!["1"; n]),
            Column::new("pdv_codigo".into(), vec!["10"; n]),
            Column::new("fecha_comercial".into(), dates.to_vec()),
            Column::new("cant_vta".into(), vec![2.0; n]),
            Column::new("imp_vta".into(), vec![30.0; n]),
            Column::new("descripcion".into(), vec![Some("AGUA"); n]),
            Column::new("contenido".into(), vec![Some(500.0); n]),
        ])
        .unwrap()
    }

    fn catalog() -> DataFrame {
        DataFrame::new(vec![
            Column::new("codigo_barras".into(), &["1"]),
            Column::new("descripcion".into(), &["AGUA"]),
            Column::new("contenido".into(), &[500.0]),
        ])
        .unwrap()
    }

    #[test]
    fn builds_typed_rows() {
        let dataset = SalesDataset::from_frames(
            &catalog(),
            &merged(&["2023-06-01", "2023-07-02"]),
            &ColumnNames::default(),
        )
        .unwrap();

        assert_eq!(dataset.products.len(), 1);
        assert_eq!(dataset.products[0].content, Some(500.0));
        assert_eq!(dataset.sales.len(), 2);
        assert_eq!(dataset.sales[1].date, NaiveDate::from_ymd_opt(2023, 7, 2).unwrap());
        assert_eq!(dataset.sales[0].description.as_deref(), Some("AGUA"));
    }

    #[test]
    fn bad_date_names_the_row() {
        let err = SalesDataset::from_frames(
            &catalog(),
            &merged(&["2023-06-01", "junio"]),
            &ColumnNames::default(),
        )
        .unwrap_err();

        assert!(matches!(err, DatasetError::BadDate { row: 1, ref value } if value == "junio"));
    }
}
