//! Execution Module - summary statistics and chart production

pub mod summary;
pub mod chart;
pub mod dispatcher;

pub use summary::{summarize, ColumnStats, FrequentValue, SummaryRow, SummaryTable};
pub use chart::{AxisSpec, Bins, Chart, ChartKind, ChartSpec};
pub use dispatcher::{execute, QueryOutput};
