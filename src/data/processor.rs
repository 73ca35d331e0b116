//! Data Processor Module
//! Handles catalog cleaning, the sales/catalog merge and CSV persistence.

use crate::config::ColumnNames;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Name of the derived liters column added by [`DataProcessor::merge_sales`].
pub const LITERS_COL: &str = "litros";

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Replace zero content values with `fill`.
    ///
    /// Returns the cleaned frame and the number of replaced cells.
    pub fn clean_products(
        df: &DataFrame,
        columns: &ColumnNames,
        fill: f64,
    ) -> Result<(DataFrame, usize), ProcessorError> {
        let content = columns.content.as_str();
        let replaced = df
            .column(content)?
            .f64()?
            .into_iter()
            .filter(|v| *v == Some(0.0))
            .count();

        let cleaned = df
            .clone()
            .lazy()
            .with_column(
                when(col(content).eq(lit(0.0)))
                    .then(lit(fill))
                    .otherwise(col(content))
                    .alias(content),
            )
            .collect()?;

        info!(replaced, fill, "cleaned product content column");
        Ok((cleaned, replaced))
    }

    /// Left join sales to the catalog on barcode, bringing description and
    /// content, and derive liters sold (`quantity * content / 1000`).
    pub fn merge_sales(
        sales: &DataFrame,
        products: &DataFrame,
        columns: &ColumnNames,
    ) -> Result<DataFrame, ProcessorError> {
        let c = columns;
        let catalog = products.clone().lazy().select([
            col(c.barcode.as_str()),
            col(c.description.as_str()),
            col(c.content.as_str()),
        ]);

        let merged = sales
            .clone()
            .lazy()
            .join(
                catalog,
                [col(c.barcode.as_str())],
                [col(c.barcode.as_str())],
                JoinArgs::new(JoinType::Left),
            )
            .with_column(
                (col(c.quantity.as_str()) * col(c.content.as_str()) / lit(1000.0))
                    .alias(LITERS_COL),
            )
            .collect()?;

        let unmatched = merged.column(c.description.as_str())?.null_count();
        if unmatched > 0 {
            warn!(unmatched, "sales rows reference barcodes missing from the catalog");
        }

        Ok(merged)
    }

    /// Write a frame as CSV with header, creating parent directories.
    pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), ProcessorError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)?;

        info!(path = %path.display(), rows = df.height(), "wrote csv");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn products() -> DataFrame {
        DataFrame::new(vec![
            Column::new("codigo_barras".into(), &["1", "2", "3"]),
            Column::new("descripcion".into(), &["AGUA", "GASEOSA", "JUGO"]),
            Column::new("contenido".into(), &[500.0, 0.0, 1000.0]),
        ])
        .unwrap()
    }

    fn sales() -> DataFrame {
        DataFrame::new(vec![
            Column::new("codigo_barras".into(), &["1", "3", "9"]),
            Column::new("pdv_codigo".into(), &["10", "11", "10"]),
            Column::new("fecha_comercial".into(), &["2023-06-01", "2023-06-02", "2023-06-03"]),
            Column::new("cant_vta".into(), &[2.0, 4.0, 1.0]),
            Column::new("imp_vta".into(), &[100.0, 300.0, 50.0]),
        ])
        .unwrap()
    }

    #[test]
    fn clean_replaces_only_zero_content() {
        let (cleaned, replaced) =
            DataProcessor::clean_products(&products(), &ColumnNames::default(), 2250.0).unwrap();

        assert_eq!(replaced, 1);
        let content: Vec<_> = cleaned
            .column("contenido")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(content, vec![Some(500.0), Some(2250.0), Some(1000.0)]);
    }

    #[test]
    fn merge_keeps_every_sale_and_derives_liters() {
        let merged =
            DataProcessor::merge_sales(&sales(), &products(), &ColumnNames::default()).unwrap();

        assert_eq!(merged.height(), 3);
        let liters = merged.column(LITERS_COL).unwrap().f64().unwrap();
        assert_eq!(liters.null_count(), 1);
        assert_eq!(liters.sum(), Some(5.0));
        assert_eq!(merged.column("descripcion").unwrap().null_count(), 1);
    }

    #[test]
    fn write_csv_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed").join("productos_processed.csv");
        let mut df = products();

        DataProcessor::write_csv(&mut df, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("codigo_barras,descripcion,contenido"));
        assert_eq!(text.lines().count(), 4);
    }
}
