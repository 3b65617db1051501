//! Chart producer - builds a renderer-neutral chart description plus the rows
//! a renderer needs to draw it

use crate::data::dataset::{ColumnType, Dataset};
use crate::error::{VizError, VizResult};
use arrow::array::*;
use arrow::compute::SortOptions;
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use chrono::DateTime;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

const STAGE: &str = "visualization";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Histogram,
    Bar,
    Scatter,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSpec {
    /// Column in `Chart::data` backing this axis
    pub column: String,
    pub label: String,
}

/// Histogram binning: `edges.len() == counts.len() + 1`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bins {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x: AxisSpec,
    pub y: AxisSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bins: Option<Bins>,
}

#[derive(Debug, Clone)]
pub struct Chart {
    pub spec: ChartSpec,
    pub data: Dataset,
}

impl Chart {
    /// `{"spec": {...}, "data": [{column: value, ...}, ...]}`
    pub fn to_json(&self) -> VizResult<Value> {
        let spec = serde_json::to_value(&self.spec)
            .map_err(|e| VizError::execution(STAGE, e.to_string()))?;
        let names = self.data.column_names();
        let mut rows = Vec::with_capacity(self.data.num_rows());
        for i in 0..self.data.num_rows() {
            let mut row = Map::new();
            for (idx, name) in names.iter().enumerate() {
                row.insert(name.clone(), cell_json(self.data.batch().column(idx), i)?);
            }
            rows.push(Value::Object(row));
        }
        let mut doc = Map::new();
        doc.insert("spec".to_string(), spec);
        doc.insert("data".to_string(), Value::Array(rows));
        Ok(Value::Object(doc))
    }
}

pub fn histogram(dataset: &Dataset, column: &str) -> VizResult<Chart> {
    let values = float_values(dataset, column)?;
    let bins = sturges_bins(&values.iter().flatten().collect::<Vec<_>>());
    let spec = ChartSpec {
        kind: ChartKind::Histogram,
        title: format!("Histogram of {}", column),
        x: axis(column),
        y: AxisSpec {
            column: "count".to_string(),
            label: "Count".to_string(),
        },
        bins: Some(bins),
    };
    Ok(Chart {
        spec,
        data: dataset.select(&[column])?,
    })
}

/// Without `y`: category counts, most frequent first. With `y`: the sum of
/// `y` per category in first-seen order.
pub fn bar(dataset: &Dataset, x: &str, y: Option<&str>) -> VizResult<Chart> {
    let categories = dataset.require_column(x)?;
    match y {
        None => {
            let mut counts = group(categories, |_| 1usize, |acc, v| *acc += v)?;
            // stable sort keeps first-seen order among equal counts
            counts.sort_by(|a, b| b.1.cmp(&a.1));
            let (labels, counts): (Vec<String>, Vec<usize>) = counts.into_iter().unzip();
            let data = Dataset::from_columns(vec![
                (x.to_string(), Arc::new(StringArray::from(labels)) as ArrayRef),
                (
                    "count".to_string(),
                    Arc::new(Int64Array::from(counts.into_iter().map(|c| c as i64).collect::<Vec<_>>())) as ArrayRef,
                ),
            ])?;
            Ok(Chart {
                spec: ChartSpec {
                    kind: ChartKind::Bar,
                    title: format!("Count of {}", x),
                    x: axis(x),
                    y: AxisSpec {
                        column: "count".to_string(),
                        label: "Count".to_string(),
                    },
                    bins: None,
                },
                data,
            })
        }
        Some(y) => {
            let values = float_values(dataset, y)?;
            let sums = group(categories, |i| values.value_or_zero(i), |acc, v| *acc += v)?;
            let (labels, sums): (Vec<String>, Vec<f64>) = sums.into_iter().unzip();
            let data = Dataset::from_columns(vec![
                (x.to_string(), Arc::new(StringArray::from(labels)) as ArrayRef),
                (y.to_string(), Arc::new(Float64Array::from(sums)) as ArrayRef),
            ])?;
            Ok(Chart {
                spec: ChartSpec {
                    kind: ChartKind::Bar,
                    title: format!("Bar Chart of {} vs {}", x, y),
                    x: axis(x),
                    y: axis(y),
                    bins: None,
                },
                data,
            })
        }
    }
}

pub fn scatter(dataset: &Dataset, x: &str, y: &str) -> VizResult<Chart> {
    Ok(Chart {
        spec: ChartSpec {
            kind: ChartKind::Scatter,
            title: format!("Scatter Plot of {} vs {}", x, y),
            x: axis(x),
            y: axis(y),
            bins: None,
        },
        data: project(dataset, x, y)?,
    })
}

/// Rows are ordered by `x` when it holds dates; otherwise kept as loaded
pub fn line(dataset: &Dataset, x: &str, y: &str) -> VizResult<Chart> {
    let over_time = dataset.column_type(x) == Some(ColumnType::Datetime);
    let mut data = project(dataset, x, y)?;
    if over_time {
        let options = SortOptions {
            descending: false,
            nulls_first: false,
        };
        let indices = arrow::compute::sort_to_indices(data.batch().column(0), Some(options), None)
            .map_err(|e| VizError::execution(STAGE, e.to_string()))?;
        data = data.take_rows(&indices)?;
    }
    let title = if over_time {
        format!("Line Chart of {} over {}", y, x)
    } else {
        format!("Line Chart of {} vs {}", y, x)
    };
    Ok(Chart {
        spec: ChartSpec {
            kind: ChartKind::Line,
            title,
            x: axis(x),
            y: axis(y),
            bins: None,
        },
        data,
    })
}

fn project(dataset: &Dataset, x: &str, y: &str) -> VizResult<Dataset> {
    if x == y {
        dataset.select(&[x])
    } else {
        dataset.select(&[x, y])
    }
}

fn axis(column: &str) -> AxisSpec {
    AxisSpec {
        column: column.to_string(),
        label: capitalize(column),
    }
}

/// First character upper-cased, the rest lower-cased
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

struct FloatColumn(Float64Array);

impl FloatColumn {
    fn value_or_zero(&self, i: usize) -> f64 {
        if self.0.is_null(i) {
            0.0
        } else {
            self.0.value(i)
        }
    }

    fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.0.iter()
    }
}

fn float_values(dataset: &Dataset, column: &str) -> VizResult<FloatColumn> {
    let array = dataset.require_column(column)?;
    let floats = arrow::compute::cast(array.as_ref(), &DataType::Float64)
        .map_err(|e| VizError::execution(STAGE, format!("column '{}': {}", column, e)))?;
    let floats = floats
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| VizError::execution(STAGE, "Failed to downcast to Float64Array"))?
        .clone();
    Ok(FloatColumn(floats))
}

/// Fold rows per category (missing categories skipped), first-seen order
fn group<T, F, A>(categories: &ArrayRef, value: F, fold: A) -> VizResult<Vec<(String, T)>>
where
    T: Default,
    F: Fn(usize) -> T,
    A: Fn(&mut T, T),
{
    let mut groups: Vec<(String, T)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for i in 0..categories.len() {
        if categories.is_null(i) {
            continue;
        }
        let key = array_value_to_string(categories.as_ref(), i)
            .map_err(|e| VizError::execution(STAGE, e.to_string()))?;
        let pos = match positions.get(&key) {
            Some(&pos) => pos,
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, T::default()));
                groups.len() - 1
            }
        };
        fold(&mut groups[pos].1, value(i));
    }
    Ok(groups)
}

/// Sturges' rule: ceil(log2 n) + 1 equal-width bins over [min, max]
fn sturges_bins(values: &[f64]) -> Bins {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return Bins {
            edges: Vec::new(),
            counts: Vec::new(),
        };
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let count = (values.len() as f64).log2().ceil() as usize + 1;
    let (start, width) = if max > min {
        (min, (max - min) / count as f64)
    } else {
        (min - 0.5, 1.0 / count as f64)
    };

    let edges: Vec<f64> = (0..=count).map(|i| start + width * i as f64).collect();
    let mut counts = vec![0usize; count];
    for v in values {
        let idx = (((v - start) / width) as usize).min(count - 1);
        counts[idx] += 1;
    }
    Bins { edges, counts }
}

/// JSON value of one cell; dates are written as RFC 3339 text
fn cell_json(array: &ArrayRef, i: usize) -> VizResult<Value> {
    if array.is_null(i) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        DataType::Int64 => array
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| Value::from(a.value(i))),
        DataType::Float64 => array
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| serde_json::Number::from_f64(a.value(i)).map_or(Value::Null, Value::Number)),
        DataType::Boolean => array
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|a| Value::Bool(a.value(i))),
        DataType::Utf8 => array
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| Value::String(a.value(i).to_string())),
        DataType::Timestamp(arrow::datatypes::TimeUnit::Millisecond, _) => array
            .as_any()
            .downcast_ref::<TimestampMillisecondArray>()
            .and_then(|a| DateTime::from_timestamp_millis(a.value(i)))
            .map(|dt| Value::String(dt.to_rfc3339())),
        _ => None,
    };
    match value {
        Some(value) => Ok(value),
        None => array_value_to_string(array.as_ref(), i)
            .map(Value::String)
            .map_err(|e| VizError::execution(STAGE, e.to_string())),
    }
}
