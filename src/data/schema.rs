//! Schema extraction - column→type map plus timestamp-looking columns

use crate::data::dataset::{ColumnType, Dataset};
use crate::data::datetime::parse_datetime_millis;
use arrow::array::{Array, StringArray};
use serde::{Deserialize, Serialize};

/// Number of leading non-missing values inspected per text column
pub const TIME_SAMPLE_SIZE: usize = 10;

/// Column information
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: ColumnType,
}

/// Schema of a loaded dataset; recomputed on every load, never persisted
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    /// Columns in dataset order
    pub columns: Vec<ColumnInfo>,

    /// Columns that look like timestamps
    pub time_columns: Vec<String>,
}

impl DatasetSchema {
    pub fn type_of(&self, column: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.column_type)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.type_of(column).is_some()
    }
}

/// Build the schema (types + detected time columns) for a dataset
pub fn extract_schema(dataset: &Dataset) -> DatasetSchema {
    let columns = dataset
        .column_types()
        .into_iter()
        .map(|(name, column_type)| ColumnInfo { name, column_type })
        .collect();

    DatasetSchema {
        columns,
        time_columns: detect_time_columns(dataset),
    }
}

/// Text columns whose first non-missing values all parse as dates.
/// Columns already typed as datetime are included as well.
pub fn detect_time_columns(dataset: &Dataset) -> Vec<String> {
    let mut time_columns = Vec::new();

    for (name, column_type) in dataset.column_types() {
        match column_type {
            ColumnType::Datetime => time_columns.push(name),
            ColumnType::Text => {
                let Some(array) = dataset.column(&name) else {
                    continue;
                };
                let Some(strings) = array.as_any().downcast_ref::<StringArray>() else {
                    continue;
                };
                if sample_is_temporal(strings) {
                    time_columns.push(name);
                }
            }
            _ => {}
        }
    }

    tracing::debug!(?time_columns, "Detected time columns");
    time_columns
}

fn sample_is_temporal(strings: &StringArray) -> bool {
    let sample: Vec<&str> = strings.iter().flatten().take(TIME_SAMPLE_SIZE).collect();
    !sample.is_empty() && sample.iter().all(|v| parse_datetime_millis(v).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array};
    use std::sync::Arc;

    fn text(values: Vec<Option<&str>>) -> ArrayRef {
        Arc::new(StringArray::from(values))
    }

    #[test]
    fn test_extract_schema() {
        let ds = Dataset::from_columns(vec![
            ("sex".to_string(), text(vec![Some("male"), Some("female")])),
            ("age".to_string(), Arc::new(Int64Array::from(vec![30, 40])) as ArrayRef),
            ("joined".to_string(), text(vec![Some("2021-03-01"), None])),
        ])
        .unwrap();

        let schema = extract_schema(&ds);
        assert_eq!(schema.columns.len(), 3);
        assert_eq!(schema.type_of("age"), Some(ColumnType::Integer));
        assert_eq!(schema.type_of("sex"), Some(ColumnType::Text));
        assert_eq!(schema.time_columns, vec!["joined"]);
    }

    #[test]
    fn test_single_bad_value_in_sample_disqualifies() {
        let ds = Dataset::from_columns(vec![(
            "when".to_string(),
            text(vec![Some("2021-03-01"), Some("2021-03-02"), Some("tomorrow")]),
        )])
        .unwrap();
        assert!(detect_time_columns(&ds).is_empty());
    }

    #[test]
    fn test_values_beyond_sample_are_ignored() {
        let mut values: Vec<Option<&str>> = vec![None, None];
        values.extend(std::iter::repeat(Some("2020-01-01")).take(TIME_SAMPLE_SIZE));
        values.push(Some("not a date"));
        let ds = Dataset::from_columns(vec![("when".to_string(), text(values))]).unwrap();
        assert_eq!(detect_time_columns(&ds), vec!["when"]);
    }

    #[test]
    fn test_all_missing_column_is_not_temporal() {
        let ds = Dataset::from_columns(vec![("when".to_string(), text(vec![None, None]))]).unwrap();
        assert!(detect_time_columns(&ds).is_empty());
    }
}
