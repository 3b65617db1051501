//! Dataset - Immutable columnar table backed by an Arrow RecordBatch
//!
//! Every transformation (column replacement, projection, row selection)
//! returns a new `Dataset`; arrays are shared by `Arc`, so copies are cheap and
//! the caller's original is never touched.

use crate::error::{VizError, VizResult};
use arrow::array::{Array, ArrayRef, BooleanArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Runtime scalar type of a column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Boolean,
    Datetime,
    Other,
}

impl ColumnType {
    pub fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnType::Integer,
            DataType::Float16 | DataType::Float32 | DataType::Float64 => ColumnType::Float,
            DataType::Utf8 | DataType::LargeUtf8 => ColumnType::Text,
            DataType::Boolean => ColumnType::Boolean,
            DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => ColumnType::Datetime,
            _ => ColumnType::Other,
        }
    }

    /// Label shown to the model and in summary tables
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Datetime => "datetime",
            ColumnType::Other => "other",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tabular dataset
#[derive(Clone, Debug)]
pub struct Dataset {
    batch: RecordBatch,
}

impl Dataset {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Build a dataset from named arrays (all nullable)
    pub fn from_columns(columns: Vec<(String, ArrayRef)>) -> VizResult<Self> {
        if columns.is_empty() {
            return Ok(Self::new(RecordBatch::new_empty(Arc::new(Schema::empty()))));
        }
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, array)| Field::new(name.as_str(), array.data_type().clone(), true))
            .collect();
        let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, array)| array).collect();
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
            .map_err(|e| VizError::invalid_data(format!("Invalid dataset: {}", e)))?;
        Ok(Self::new(batch))
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Column names in dataset order
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.batch
            .schema()
            .fields()
            .iter()
            .position(|f| f.name() == name)
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.index_of(name).map(|idx| self.batch.column(idx))
    }

    /// Column lookup that reports a missing column by name
    pub fn require_column(&self, name: &str) -> VizResult<&ArrayRef> {
        self.column(name)
            .ok_or_else(|| VizError::column_not_found(name))
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column(name)
            .map(|array| ColumnType::from_data_type(array.data_type()))
    }

    /// (name, type) pairs in dataset order
    pub fn column_types(&self) -> Vec<(String, ColumnType)> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| (f.name().clone(), ColumnType::from_data_type(f.data_type())))
            .collect()
    }

    pub fn numeric_column_names(&self) -> Vec<String> {
        self.column_types()
            .into_iter()
            .filter(|(_, ty)| ty.is_numeric())
            .map(|(name, _)| name)
            .collect()
    }

    /// Copy with one column replaced (type may change)
    pub fn with_column(&self, name: &str, array: ArrayRef) -> VizResult<Self> {
        let idx = self
            .index_of(name)
            .ok_or_else(|| VizError::column_not_found(name))?;
        let schema = self.batch.schema();
        let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
        fields[idx] = Field::new(name, array.data_type().clone(), true);
        let mut arrays: Vec<ArrayRef> = self.batch.columns().to_vec();
        arrays[idx] = array;
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
            .map_err(|e| VizError::invalid_data(format!("Invalid column '{}': {}", name, e)))?;
        Ok(Self::new(batch))
    }

    /// Projection onto the given columns, in the given order
    pub fn select(&self, names: &[&str]) -> VizResult<Self> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let array = self.require_column(name)?;
            columns.push((name.to_string(), Arc::clone(array)));
        }
        Self::from_columns(columns)
    }

    /// Keep rows where `mask` is true
    pub fn filter_rows(&self, mask: &BooleanArray) -> VizResult<Self> {
        let batch = arrow::compute::filter_record_batch(&self.batch, mask)
            .map_err(|e| VizError::filter_application(e.to_string()))?;
        Ok(Self::new(batch))
    }

    /// Reorder/select rows by index
    pub fn take_rows(&self, indices: &UInt32Array) -> VizResult<Self> {
        let mut arrays = Vec::with_capacity(self.num_columns());
        for array in self.batch.columns() {
            let taken = arrow::compute::take(array.as_ref(), indices, None)
                .map_err(|e| VizError::execution("visualization", e.to_string()))?;
            arrays.push(taken);
        }
        let batch = RecordBatch::try_new(self.batch.schema(), arrays)
            .map_err(|e| VizError::execution("visualization", e.to_string()))?;
        Ok(Self::new(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray};

    fn people() -> Dataset {
        Dataset::from_columns(vec![
            ("name".to_string(), Arc::new(StringArray::from(vec!["ann", "bob", "cy"])) as ArrayRef),
            ("age".to_string(), Arc::new(Int64Array::from(vec![Some(31), None, Some(12)])) as ArrayRef),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_types() {
        let ds = people();
        assert_eq!(ds.column_names(), vec!["name", "age"]);
        assert_eq!(ds.column_type("age"), Some(ColumnType::Integer));
        assert_eq!(ds.column_type("name"), Some(ColumnType::Text));
        assert_eq!(ds.column_type("missing"), None);
        assert_eq!(ds.numeric_column_names(), vec!["age"]);
    }

    #[test]
    fn test_with_column_leaves_original() {
        let ds = people();
        let replaced = ds
            .with_column("age", Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0])))
            .unwrap();
        assert_eq!(replaced.column_type("age"), Some(ColumnType::Float));
        assert_eq!(ds.column_type("age"), Some(ColumnType::Integer));
    }

    #[test]
    fn test_filter_and_take() {
        let ds = people();
        let kept = ds
            .filter_rows(&BooleanArray::from(vec![true, false, true]))
            .unwrap();
        assert_eq!(kept.num_rows(), 2);
        assert_eq!(ds.num_rows(), 3);

        let reversed = ds.take_rows(&UInt32Array::from(vec![2, 1, 0])).unwrap();
        let names = reversed.column("name").unwrap();
        let names = names.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(names.value(0), "cy");
    }

    #[test]
    fn test_select_unknown_column() {
        let err = people().select(&["age", "height"]).unwrap_err();
        assert_eq!(err, VizError::column_not_found("height"));
    }
}
