//! Analysis Configuration
//! Input/output locations, column names and analysis thresholds.
//!
//! Values come from built-in defaults, optionally overlaid by a JSON file;
//! command line flags are applied on top by `main`.

use crate::stats::{FrequencyRatio, VolumeMeasure};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Column names of the raw product and sales tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub barcode: String,
    pub description: String,
    pub content: String,
    pub outlet: String,
    pub date: String,
    pub quantity: String,
    pub amount: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            barcode: "codigo_barras".to_string(),
            description: "descripcion".to_string(),
            content: "contenido".to_string(),
            outlet: "pdv_codigo".to_string(),
            date: "fecha_comercial".to_string(),
            quantity: "cant_vta".to_string(),
            amount: "imp_vta".to_string(),
        }
    }
}

/// Complete configuration of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub raw_products: PathBuf,
    pub raw_sales: PathBuf,
    pub processed_products: PathBuf,
    pub output_dir: PathBuf,
    pub columns: ColumnNames,

    /// Replacement for zero values in the content column.
    pub content_fill: f64,
    /// Minimum share (0, 1] of all outlets a product must reach.
    pub coverage_threshold: f64,
    /// Cumulative percentage (0, 100] that closes the Pareto prefix.
    pub pareto_threshold: f64,
    pub volume_measure: VolumeMeasure,
    pub frequency_ratio: FrequencyRatio,

    pub base_months: Vec<u32>,
    pub comparison_months: Vec<u32>,

    /// Description fragment of the product to diagnose. `None` skips the step.
    pub diagnosis_product: Option<String>,
    pub diagnosis_cutoff_month: u32,

    pub render_charts: bool,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            raw_products: PathBuf::from("data/raw/productos.csv"),
            raw_sales: PathBuf::from("data/raw/ventas.csv"),
            processed_products: PathBuf::from("data/processed/productos_processed.csv"),
            output_dir: PathBuf::from("outputs"),
            columns: ColumnNames::default(),
            content_fill: 2250.0,
            coverage_threshold: 0.8,
            pareto_threshold: 80.0,
            volume_measure: VolumeMeasure::default(),
            frequency_ratio: FrequencyRatio::default(),
            base_months: vec![6, 7, 8],
            comparison_months: vec![9, 10, 11],
            diagnosis_product: None,
            diagnosis_cutoff_month: 9,
            render_charts: true,
            chart_width: 1400,
            chart_height: 800,
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reject thresholds and month sets the analyses cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.coverage_threshold > 0.0 && self.coverage_threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "coverage_threshold",
                reason: format!("{} is outside (0, 1]", self.coverage_threshold),
            });
        }
        if !(self.pareto_threshold > 0.0 && self.pareto_threshold <= 100.0) {
            return Err(ConfigError::Invalid {
                field: "pareto_threshold",
                reason: format!("{} is outside (0, 100]", self.pareto_threshold),
            });
        }
        Self::check_months("base_months", &self.base_months)?;
        Self::check_months("comparison_months", &self.comparison_months)?;
        if !(1..=12).contains(&self.diagnosis_cutoff_month) {
            return Err(ConfigError::Invalid {
                field: "diagnosis_cutoff_month",
                reason: format!("{} is not a month", self.diagnosis_cutoff_month),
            });
        }
        if self.chart_width == 0 || self.chart_height == 0 {
            return Err(ConfigError::Invalid {
                field: "chart_width/chart_height",
                reason: "chart dimensions must be positive".to_string(),
            });
        }
        Ok(())
    }

    fn check_months(field: &'static str, months: &[u32]) -> Result<(), ConfigError> {
        if months.is_empty() {
            return Err(ConfigError::Invalid {
                field,
                reason: "at least one month is required".to_string(),
            });
        }
        if let Some(bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(ConfigError::Invalid {
                field,
                reason: format!("{} is not a month", bad),
            });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = months.iter().find(|m| !seen.insert(**m)) {
            return Err(ConfigError::Invalid {
                field,
                reason: format!("month {} is listed twice", dup),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_source_layout() {
        let config = AnalysisConfig::default();
        assert_eq!(config.content_fill, 2250.0);
        assert_eq!(config.base_months, vec![6, 7, 8]);
        assert_eq!(config.comparison_months, vec![9, 10, 11]);
        assert_eq!(config.columns.barcode, "codigo_barras");
        assert_eq!(config.volume_measure, VolumeMeasure::Content);
        assert_eq!(config.frequency_ratio, FrequencyRatio::OpenDaysPerSaleDay);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json(
            r#"{
                "output_dir": "reports",
                "volume_measure": "liters",
                "columns": { "amount": "importe" },
                "diagnosis_product": "cola"
            }"#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert_eq!(config.volume_measure, VolumeMeasure::Liters);
        assert_eq!(config.columns.amount, "importe");
        assert_eq!(config.columns.quantity, "cant_vta");
        assert_eq!(config.diagnosis_product.as_deref(), Some("cola"));
        assert_eq!(config.pareto_threshold, 80.0);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = AnalysisConfig::default();
        config.coverage_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "coverage_threshold", .. })
        ));

        let mut config = AnalysisConfig::default();
        config.comparison_months = vec![9, 13];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "comparison_months", .. })
        ));

        let mut config = AnalysisConfig::default();
        config.base_months.clear();
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.base_months = vec![6, 6, 7];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "base_months", ref reason }) if reason.contains("twice")
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = AnalysisConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
