//! Type coercion - best-effort conversion of a column to numeric or datetime
//!
//! Unconvertible values become missing. A coercion fails outright only when
//! the source type has no conversion path, or when the column holds values
//! and not one of them converts.

use crate::data::dataset::ColumnType;
use crate::data::datetime::parse_datetime_millis;
use crate::error::VizError;
use arrow::array::{Array, ArrayRef, Float64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, TimeUnit};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoercionTarget {
    Numeric,
    Datetime,
}

impl CoercionTarget {
    pub fn label(&self) -> &'static str {
        match self {
            CoercionTarget::Numeric => "numeric",
            CoercionTarget::Datetime => "datetime",
        }
    }
}

impl fmt::Display for CoercionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Column '{column}' could not be converted to {target}: {reason}")]
pub struct CoercionError {
    pub column: String,
    pub target: CoercionTarget,
    pub reason: String,
}

impl CoercionError {
    fn new(column: &str, target: CoercionTarget, reason: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            target,
            reason: reason.into(),
        }
    }
}

impl From<CoercionError> for VizError {
    fn from(err: CoercionError) -> Self {
        VizError::Coercion {
            column: err.column,
            expected: err.target.label().to_string(),
            axis: None,
        }
    }
}

/// Convert to a numeric array. Numeric columns pass through unchanged.
pub fn to_numeric(column: &str, array: &ArrayRef) -> Result<ArrayRef, CoercionError> {
    match ColumnType::from_data_type(array.data_type()) {
        ColumnType::Integer | ColumnType::Float => Ok(Arc::clone(array)),
        ColumnType::Boolean => arrow::compute::cast(array.as_ref(), &DataType::Float64)
            .map_err(|e| CoercionError::new(column, CoercionTarget::Numeric, e.to_string())),
        ColumnType::Text => {
            let strings = downcast_text(column, array, CoercionTarget::Numeric)?;
            let parsed: Float64Array = strings
                .iter()
                .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
                .collect();
            check_some_converted(column, CoercionTarget::Numeric, array.as_ref(), &parsed)?;
            Ok(Arc::new(parsed))
        }
        other => Err(CoercionError::new(
            column,
            CoercionTarget::Numeric,
            format!("{} values have no numeric interpretation", other),
        )),
    }
}

/// Convert to a millisecond timestamp array
pub fn to_datetime(column: &str, array: &ArrayRef) -> Result<ArrayRef, CoercionError> {
    let target_type = DataType::Timestamp(TimeUnit::Millisecond, None);
    match ColumnType::from_data_type(array.data_type()) {
        ColumnType::Datetime if array.data_type() == &target_type => Ok(Arc::clone(array)),
        ColumnType::Datetime => arrow::compute::cast(array.as_ref(), &target_type)
            .map_err(|e| CoercionError::new(column, CoercionTarget::Datetime, e.to_string())),
        ColumnType::Text => {
            let strings = downcast_text(column, array, CoercionTarget::Datetime)?;
            let parsed: TimestampMillisecondArray = strings
                .iter()
                .map(|v| v.and_then(parse_datetime_millis))
                .collect();
            check_some_converted(column, CoercionTarget::Datetime, array.as_ref(), &parsed)?;
            Ok(Arc::new(parsed))
        }
        other => Err(CoercionError::new(
            column,
            CoercionTarget::Datetime,
            format!("{} values cannot be read as dates", other),
        )),
    }
}

fn downcast_text<'a>(
    column: &str,
    array: &'a ArrayRef,
    target: CoercionTarget,
) -> Result<&'a StringArray, CoercionError> {
    array
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| CoercionError::new(column, target, "unsupported text encoding"))
}

fn check_some_converted(
    column: &str,
    target: CoercionTarget,
    source: &dyn Array,
    converted: &dyn Array,
) -> Result<(), CoercionError> {
    let present = source.len() - source.null_count();
    let converted_count = converted.len() - converted.null_count();
    if present > 0 && converted_count == 0 {
        return Err(CoercionError::new(
            column,
            target,
            format!("none of {} values could be parsed", present),
        ));
    }
    Ok(())
}
