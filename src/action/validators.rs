//! Action Validators - Checks an action against the live dataset and
//! coerces the columns it uses into the types its chart needs

use crate::action::model::Action;
use crate::data::coerce::{to_datetime, to_numeric, CoercionError};
use crate::data::dataset::{ColumnType, Dataset};
use crate::error::{VizError, VizResult};

/// Action Preparer - Validates an action and returns the prepared dataset copy
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionPreparer;

impl ActionPreparer {
    pub fn new() -> Self {
        Self
    }

    /// Validate `action` against `dataset`.
    ///
    /// On success the returned dataset has the action's columns coerced
    /// (numeric value axes, datetime line x); the input is left untouched.
    pub fn prepare(&self, dataset: &Dataset, action: &Action) -> VizResult<Dataset> {
        let prepared = match action {
            Action::Histogram { column } => {
                self.require_columns(dataset, &[column])?;
                self.coerce_numeric(dataset, column, None)?
            }
            Action::Bar { x, y } => {
                self.require_columns(dataset, &[x])?;
                match y {
                    Some(y) => {
                        self.require_columns(dataset, &[y])?;
                        self.coerce_numeric(dataset, y, None)?
                    }
                    None => dataset.clone(),
                }
            }
            Action::Scatter { x, y } => {
                self.require_columns(dataset, &[x, y])?;
                let prepared = self.coerce_numeric(dataset, x, Some("X"))?;
                self.coerce_numeric(&prepared, y, Some("Y"))?
            }
            Action::Line { x, y } => {
                self.require_columns(dataset, &[x, y])?;
                let prepared = self.coerce_time_axis(dataset, x)?;
                self.coerce_numeric(&prepared, y, Some("Y"))?
            }
            // Summaries skip unknown columns instead of failing
            Action::Summarize { .. } => dataset.clone(),
        };

        tracing::debug!(action = %action.kind(), "Action validated");
        Ok(prepared)
    }

    /// Every named column must exist; the first missing one is reported
    fn require_columns(&self, dataset: &Dataset, columns: &[&String]) -> VizResult<()> {
        for column in columns {
            if !dataset.has_column(column) {
                return Err(VizError::column_not_found(column.as_str()));
            }
        }
        Ok(())
    }

    fn coerce_numeric(&self, dataset: &Dataset, column: &str, axis: Option<&str>) -> VizResult<Dataset> {
        let array = dataset.require_column(column)?;
        let converted = to_numeric(column, array).map_err(|e| with_axis(e, axis))?;
        dataset.with_column(column, converted)
    }

    /// Line x-axis: datetime and numeric columns are kept as-is, anything
    /// else must read as dates
    fn coerce_time_axis(&self, dataset: &Dataset, column: &str) -> VizResult<Dataset> {
        match dataset.column_type(column) {
            Some(ColumnType::Datetime) | Some(ColumnType::Integer) | Some(ColumnType::Float) => {
                Ok(dataset.clone())
            }
            _ => {
                let array = dataset.require_column(column)?;
                let converted = to_datetime(column, array).map_err(|e| with_axis(e, Some("X")))?;
                dataset.with_column(column, converted)
            }
        }
    }
}

fn with_axis(err: CoercionError, axis: Option<&str>) -> VizError {
    tracing::warn!(column = %err.column, "Coercion failed: {}", err.reason);
    VizError::Coercion {
        column: err.column,
        expected: err.target.label().to_string(),
        axis: axis.map(str::to_string),
    }
}
