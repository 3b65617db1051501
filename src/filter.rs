/// Filter Engine: narrows a dataset by conjunctive column conditions
///
/// Conditions are applied one after another on a working copy, so the result
/// is the intersection of the rows each condition keeps. Per condition a
/// selection bitmap is built from the column values; missing cells are never
/// selected.
use crate::action::model::{FilterCondition, FilterOp};
use crate::data::coerce::to_datetime;
use crate::data::dataset::{ColumnType, Dataset};
use crate::data::datetime::parse_datetime_millis;
use crate::error::{VizError, VizResult};
use arrow::array::*;
use arrow::datatypes::DataType;
use bitvec::prelude::*;
use serde_json::Value;
use std::cmp::Ordering;
use tracing::{debug, info};

/// Apply `filters` in order. A condition on an unknown column stops the chain;
/// conditions after it are not evaluated.
pub fn apply_filters(dataset: &Dataset, filters: &[FilterCondition]) -> VizResult<Dataset> {
    let mut working = dataset.clone();
    for condition in filters {
        let rows_before = working.num_rows();
        let column = working
            .column(&condition.column)
            .ok_or_else(|| VizError::FilterColumnNotFound {
                column: condition.column.clone(),
            })?;

        let selection = select_rows(&condition.column, column, condition)?;
        let mask = BooleanArray::from(selection.iter().by_vals().collect::<Vec<bool>>());
        working = working.filter_rows(&mask)?;

        info!(
            filter = %condition,
            rows_before,
            rows_after = working.num_rows(),
            "Applied filter"
        );
    }
    Ok(working)
}

/// Selection bitmap for one condition
fn select_rows(name: &str, column: &ArrayRef, condition: &FilterCondition) -> VizResult<BitVec> {
    let mut selection = bitvec![0; column.len()];
    let column_type = ColumnType::from_data_type(column.data_type());
    let op = condition.operator;

    match (column_type, &condition.value) {
        (ColumnType::Integer | ColumnType::Float, value) => {
            let target = numeric_operand(value).ok_or_else(|| mismatch(name, column_type, condition))?;
            let values = arrow::compute::cast(column.as_ref(), &DataType::Float64)
                .map_err(|e| VizError::filter_application(e.to_string()))?;
            let values = values
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| VizError::filter_application("Failed to downcast to Float64Array"))?;
            for (i, val) in values.iter().enumerate() {
                if let Some(val) = val {
                    selection.set(i, compare(op, val.partial_cmp(&target)));
                }
            }
        }
        (ColumnType::Text, Value::String(target)) => {
            let values = column
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| VizError::filter_application("Failed to downcast to StringArray"))?;
            for (i, val) in values.iter().enumerate() {
                if let Some(val) = val {
                    selection.set(i, compare(op, Some(val.cmp(target.as_str()))));
                }
            }
        }
        (ColumnType::Boolean, Value::Bool(target)) => {
            if op != FilterOp::Eq {
                return Err(VizError::filter_application(format!(
                    "Operator '{}' is not supported for boolean column '{}'",
                    op, name
                )));
            }
            let values = column
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| VizError::filter_application("Failed to downcast to BooleanArray"))?;
            for (i, val) in values.iter().enumerate() {
                if let Some(val) = val {
                    selection.set(i, val == *target);
                }
            }
        }
        (ColumnType::Datetime, value @ (Value::String(_) | Value::Number(_))) => {
            // a bare number reads as a year
            let text = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            let target = parse_datetime_millis(&text).ok_or_else(|| {
                VizError::filter_application(format!(
                    "'{}' is not a recognizable date for column '{}'",
                    text, name
                ))
            })?;
            let values = to_datetime(name, column)
                .map_err(|e| VizError::filter_application(e.to_string()))?;
            let values = values
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .ok_or_else(|| {
                    VizError::filter_application("Failed to downcast to TimestampMillisecondArray")
                })?;
            for (i, val) in values.iter().enumerate() {
                if let Some(val) = val {
                    selection.set(i, compare(op, Some(val.cmp(&target))));
                }
            }
        }
        _ => return Err(mismatch(name, column_type, condition)),
    }

    debug!(
        column = name,
        selected = selection.count_ones(),
        total_rows = selection.len(),
        "Evaluated filter condition"
    );
    Ok(selection)
}

/// Numbers, or strings that read as numbers
fn numeric_operand(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// `None` (NaN involved) never matches
fn compare(op: FilterOp, ordering: Option<Ordering>) -> bool {
    match ordering {
        Some(ordering) => match op {
            FilterOp::Eq => ordering == Ordering::Equal,
            FilterOp::Gte => ordering != Ordering::Less,
            FilterOp::Lte => ordering != Ordering::Greater,
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Lt => ordering == Ordering::Less,
        },
        None => false,
    }
}

fn mismatch(name: &str, column_type: ColumnType, condition: &FilterCondition) -> VizError {
    VizError::filter_application(format!(
        "Unsupported type combination for '{}': {} column '{}' vs {}",
        condition.operator, column_type, name, condition.value
    ))
}
