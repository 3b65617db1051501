use crate::data::dataset::Dataset;
use crate::error::{VizError, VizResult};
use arrow::array::*;
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Load a CSV file (header row required) into a dataset
pub fn load_csv_path(path: impl AsRef<Path>) -> VizResult<Dataset> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| VizError::data_load_with_path(e.to_string(), path.display().to_string()))?;
    let dataset = load_csv_reader(file)?;
    tracing::info!(
        path = %path.display(),
        rows = dataset.num_rows(),
        columns = dataset.num_columns(),
        "Loaded CSV"
    );
    Ok(dataset)
}

pub fn load_csv_str(text: &str) -> VizResult<Dataset> {
    load_csv_reader(text.as_bytes())
}

/// Cell texts read as missing, alongside empty cells
const MISSING_MARKERS: &[&str] = &["NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A"];

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || MISSING_MARKERS.contains(&cell)
}

/// Repeated header names get a `.1`, `.2`, ... suffix so every column stays
/// addressable by name
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", header, suffix);
            suffix += 1;
        }
        if name != header {
            tracing::warn!(header = %header, renamed = %name, "Renamed duplicate CSV header");
        }
        seen.insert(name.clone());
        names.push(name);
    }
    names
}

/// Parse CSV from any reader. Column types are inferred from non-missing cells:
/// all i64 → integer, all f64 → float, all true/false → boolean, else text.
/// Empty cells and markers such as `NA` or `null` are missing.
pub fn load_csv_reader<R: Read>(input: R) -> VizResult<Dataset> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(input);
    let headers = dedupe_headers(reader.headers()?.iter().map(|s| s.to_string()).collect());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    let mut columns = Vec::with_capacity(headers.len());
    for (col_idx, header) in headers.iter().enumerate() {
        let cells: Vec<Option<&str>> = rows
            .iter()
            .map(|row| row.get(col_idx).map(|s| s.as_str()).filter(|s| !is_missing(s)))
            .collect();
        columns.push((header.clone(), infer_column(&cells)));
    }

    Dataset::from_columns(columns)
}

fn infer_column(cells: &[Option<&str>]) -> ArrayRef {
    let mut is_int = true;
    let mut is_float = true;
    let mut is_bool = true;
    let mut any_value = false;

    for cell in cells.iter().flatten() {
        any_value = true;
        let value = cell.trim();
        if value.parse::<i64>().is_err() {
            is_int = false;
        }
        if value.parse::<f64>().is_err() {
            is_float = false;
        }
        if parse_bool(value).is_none() {
            is_bool = false;
        }
        if !is_int && !is_float && !is_bool {
            break;
        }
    }

    if !any_value {
        return Arc::new(StringArray::from(cells.to_vec()));
    }

    if is_int {
        let ints: Int64Array = cells
            .iter()
            .map(|c| c.and_then(|v| v.trim().parse::<i64>().ok()))
            .collect();
        Arc::new(ints)
    } else if is_float {
        let floats: Float64Array = cells
            .iter()
            .map(|c| c.and_then(|v| v.trim().parse::<f64>().ok()))
            .collect();
        Arc::new(floats)
    } else if is_bool {
        let bools: BooleanArray = cells
            .iter()
            .map(|c| c.and_then(|v| parse_bool(v.trim())))
            .collect();
        Arc::new(bools)
    } else {
        Arc::new(StringArray::from(cells.to_vec()))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Minimal validity checks run before anything else touches the data
pub fn validate_dataset(dataset: &Dataset) -> VizResult<()> {
    if dataset.num_columns() < 1 {
        return Err(VizError::invalid_data("The uploaded file contains no columns."));
    }
    if dataset.is_empty() {
        return Err(VizError::invalid_data("The uploaded file contains no data."));
    }
    Ok(())
}
