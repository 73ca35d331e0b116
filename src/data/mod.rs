//! Data module - CSV loading, cleaning and typed extraction

mod dataset;
mod loader;
mod processor;

pub use dataset::{Product, SaleRecord, SalesDataset};
pub use loader::DataLoader;
pub use processor::{DataProcessor, ProcessorError, LITERS_COL};
