//! CSV Data Loader Module
//! Reads the raw product catalog and sales log using Polars.

use crate::config::ColumnNames;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Column '{column}' missing from {}", .path.display())]
    MissingColumn { column: String, path: PathBuf },
}

/// Loads the two input tables with the configured column layout.
///
/// Every column is read as text first; identifier columns stay text and
/// numeric columns are cast to `Float64`, so barcodes keep leading zeros.
pub struct DataLoader {
    columns: ColumnNames,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(ColumnNames::default())
    }
}

impl DataLoader {
    pub fn new(columns: ColumnNames) -> Self {
        Self { columns }
    }

    /// Load the product catalog (barcode, description, content).
    pub fn load_products(&self, path: &Path) -> Result<DataFrame, LoaderError> {
        let c = &self.columns;
        let raw = Self::read_text_csv(path)?;
        Self::require_columns(&raw, path, &[&c.barcode, &c.description, &c.content])?;

        let df = raw
            .lazy()
            .with_column(col(c.content.as_str()).cast(DataType::Float64))
            .collect()?;

        info!(rows = df.height(), path = %path.display(), "loaded product catalog");
        Ok(df)
    }

    /// Load the sales log. The date column is kept as text and parsed
    /// when the typed dataset is built.
    pub fn load_sales(&self, path: &Path) -> Result<DataFrame, LoaderError> {
        let c = &self.columns;
        let raw = Self::read_text_csv(path)?;
        Self::require_columns(
            &raw,
            path,
            &[&c.barcode, &c.outlet, &c.date, &c.quantity, &c.amount],
        )?;

        let df = raw
            .lazy()
            .with_columns([
                col(c.quantity.as_str()).cast(DataType::Float64),
                col(c.amount.as_str()).cast(DataType::Float64),
            ])
            .collect()?;

        info!(rows = df.height(), path = %path.display(), "loaded sales log");
        Ok(df)
    }

    fn read_text_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        // Schema inference length 0 reads every column as String
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        debug!(columns = ?df.get_column_names(), "read csv header");
        Ok(df)
    }

    fn require_columns(df: &DataFrame, path: &Path, names: &[&String]) -> Result<(), LoaderError> {
        for name in names {
            if df.column(name.as_str()).is_err() {
                return Err(LoaderError::MissingColumn {
                    column: name.to_string(),
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}
