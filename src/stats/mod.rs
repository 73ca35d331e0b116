//! Stats module - the five sales analyses

mod code;
mod coverage;
mod diagnosis;
mod outlet;
mod pareto;
mod period;

pub use coverage::{compute_coverage, CoverageReport};
pub use diagnosis::{diagnose_product, ProductDiagnosis};
pub use outlet::{select_best_outlets, BestOutletReport, FrequencyRatio};
pub use pareto::{compute_pareto, ParetoReport, ParetoRow, VolumeMeasure};
pub use period::{compare_periods, PeriodComparison};
