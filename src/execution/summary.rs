//! Summary producer - per-column descriptive statistics

use crate::data::dataset::{ColumnType, Dataset};
use crate::error::{VizError, VizResult};
use arrow::array::{Array, ArrayRef, Float32Array, Float64Array};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use serde::Serialize;
use std::collections::HashMap;

/// Categorical columns report their mode only below this many distinct values
pub const MODE_DISTINCT_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn row(&self, column: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.column == column)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub column: String,
    pub column_type: ColumnType,
    /// Non-missing values
    pub count: usize,
    pub missing: usize,
    pub stats: ColumnStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnStats {
    /// `None` where the statistic is undefined (no values, or one value for std dev)
    Numeric {
        mean: Option<f64>,
        median: Option<f64>,
        min: Option<f64>,
        max: Option<f64>,
        std_dev: Option<f64>,
    },
    Categorical {
        unique: usize,
        most_frequent: Option<FrequentValue>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequentValue {
    pub value: String,
    pub frequency: usize,
    /// Share of non-missing rows, 0..=100
    pub percentage: f64,
}

/// Summarize the requested columns (all when `None` or empty).
/// Names not present in the dataset are skipped.
pub fn summarize(dataset: &Dataset, columns: Option<&[String]>) -> VizResult<SummaryTable> {
    let names: Vec<String> = match columns {
        Some(columns) if !columns.is_empty() => columns.to_vec(),
        _ => dataset.column_names(),
    };

    let mut rows = Vec::with_capacity(names.len());
    for name in names {
        let Some(array) = dataset.column(&name) else {
            tracing::debug!(column = %name, "Skipping unknown column in summary");
            continue;
        };
        rows.push(summarize_column(&name, array)?);
    }

    tracing::info!(columns = rows.len(), rows = dataset.num_rows(), "Generated summary statistics");
    Ok(SummaryTable { rows })
}

fn summarize_column(name: &str, array: &ArrayRef) -> VizResult<SummaryRow> {
    let column_type = ColumnType::from_data_type(array.data_type());
    let missing = array.null_count() + nan_count(array);
    let count = array.len() - missing;

    let stats = if column_type.is_numeric() {
        numeric_stats(array)?
    } else {
        categorical_stats(array, count)?
    };

    Ok(SummaryRow {
        column: name.to_string(),
        column_type,
        count,
        missing,
        stats,
    })
}

/// Non-null NaN entries, which count as missing alongside nulls
fn nan_count(array: &ArrayRef) -> usize {
    match array.data_type() {
        DataType::Float64 => array
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|floats| floats.iter().flatten().filter(|v| v.is_nan()).count())
            .unwrap_or(0),
        DataType::Float32 => array
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|floats| floats.iter().flatten().filter(|v| v.is_nan()).count())
            .unwrap_or(0),
        _ => 0,
    }
}

fn numeric_stats(array: &ArrayRef) -> VizResult<ColumnStats> {
    let floats = arrow::compute::cast(array.as_ref(), &DataType::Float64)
        .map_err(|e| VizError::execution("summary statistics", e.to_string()))?;
    let floats = floats
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| VizError::execution("summary statistics", "Failed to downcast to Float64Array"))?;

    let mut values: Vec<f64> = floats.iter().flatten().filter(|v| !v.is_nan()).collect();
    if values.is_empty() {
        return Ok(ColumnStats::Numeric {
            mean: None,
            median: None,
            min: None,
            max: None,
            std_dev: None,
        });
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let median = if values.len() % 2 == 1 {
        values[values.len() / 2]
    } else {
        let upper = values.len() / 2;
        (values[upper - 1] + values[upper]) / 2.0
    };
    let std_dev = if values.len() > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    } else {
        None
    };

    Ok(ColumnStats::Numeric {
        mean: Some(mean),
        median: Some(median),
        min: values.first().copied(),
        max: values.last().copied(),
        std_dev,
    })
}

fn categorical_stats(array: &ArrayRef, count: usize) -> VizResult<ColumnStats> {
    // (value, frequency) in first-appearance order
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for i in 0..array.len() {
        if array.is_null(i) {
            continue;
        }
        let value = array_value_to_string(array.as_ref(), i)
            .map_err(|e| VizError::execution("summary statistics", e.to_string()))?;
        match positions.get(&value) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                positions.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }

    let unique = counts.len();
    let most_frequent = if unique > 0 && unique < MODE_DISTINCT_LIMIT {
        let mut best = &counts[0];
        for entry in &counts[1..] {
            if entry.1 > best.1 {
                best = entry;
            }
        }
        Some(FrequentValue {
            value: best.0.clone(),
            frequency: best.1,
            percentage: best.1 as f64 / count as f64 * 100.0,
        })
    } else {
        None
    };

    Ok(ColumnStats::Categorical {
        unique,
        most_frequent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use std::sync::Arc;

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            ("x".to_string(), Arc::new(Int64Array::from(vec![Some(1), Some(2), Some(3), Some(4), None])) as ArrayRef),
            (
                "color".to_string(),
                Arc::new(StringArray::from(vec![Some("red"), Some("blue"), Some("blue"), Some("red"), Some("green")])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_numeric_summary() {
        let table = summarize(&dataset(), Some(&["x".to_string()][..])).unwrap();
        assert_eq!(table.rows.len(), 1);
        let row = table.row("x").unwrap();
        assert_eq!(row.count, 4);
        assert_eq!(row.missing, 1);
        assert_eq!(row.column_type, ColumnType::Integer);
        match &row.stats {
            ColumnStats::Numeric {
                mean,
                median,
                min,
                max,
                std_dev,
            } => {
                assert_eq!(*mean, Some(2.5));
                assert_eq!(*median, Some(2.5));
                assert_eq!(*min, Some(1.0));
                assert_eq!(*max, Some(4.0));
                let std_dev = std_dev.unwrap();
                assert!((std_dev - 1.2909944).abs() < 1e-6);
            }
            other => panic!("expected numeric stats, got {:?}", other),
        }
    }

    #[test]
    fn test_categorical_mode_ties_keep_first_seen() {
        let table = summarize(&dataset(), None).unwrap();
        assert_eq!(table.rows.len(), 2);
        let row = table.row("color").unwrap();
        match &row.stats {
            ColumnStats::Categorical {
                unique,
                most_frequent,
            } => {
                assert_eq!(*unique, 3);
                let mode = most_frequent.as_ref().unwrap();
                assert_eq!(mode.value, "red");
                assert_eq!(mode.frequency, 2);
                assert!((mode.percentage - 40.0).abs() < 1e-9);
            }
            other => panic!("expected categorical stats, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_counts_as_missing() {
        let ds = Dataset::from_columns(vec![(
            "v".to_string(),
            Arc::new(Float64Array::from(vec![Some(1.0), Some(f64::NAN), None, Some(3.0)])) as ArrayRef,
        )])
        .unwrap();
        let table = summarize(&ds, None).unwrap();
        let row = table.row("v").unwrap();
        assert_eq!(row.count, 2);
        assert_eq!(row.missing, 2);
        match &row.stats {
            ColumnStats::Numeric { mean, median, .. } => {
                assert_eq!(*mean, Some(2.0));
                assert_eq!(*median, Some(2.0));
            }
            other => panic!("expected numeric stats, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_columns_are_skipped() {
        let columns = vec!["nope".to_string(), "x".to_string()];
        let table = summarize(&dataset(), Some(columns.as_slice())).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].column, "x");

        let table = summarize(&dataset(), Some(&["nope".to_string()][..])).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_high_cardinality_has_no_mode() {
        let values: Vec<String> = (0..60).map(|i| format!("id-{}", i)).collect();
        let ds = Dataset::from_columns(vec![(
            "id".to_string(),
            Arc::new(StringArray::from(values)) as ArrayRef,
        )])
        .unwrap();
        let table = summarize(&ds, None).unwrap();
        assert_eq!(
            table.rows[0].stats,
            ColumnStats::Categorical {
                unique: 60,
                most_frequent: None
            }
        );
    }
}
