//! Data Module - Dataset model, CSV loading, schema extraction and coercion

pub mod dataset;
pub mod datetime;
pub mod coerce;
pub mod schema;
pub mod csv_loader;

pub use dataset::{ColumnType, Dataset};
pub use coerce::{to_datetime, to_numeric, CoercionError, CoercionTarget};
pub use schema::{detect_time_columns, extract_schema, ColumnInfo, DatasetSchema};
pub use csv_loader::{load_csv_path, load_csv_reader, load_csv_str, validate_dataset};
