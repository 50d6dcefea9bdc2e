use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::DashboardError;
use super::model::{CellValue, TrialTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the analysis snapshot from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – the snapshot written by the processing notebooks (recommended)
/// * `.csv`     – header row, one trial per line
/// * `.json`    – `[{ "phase": "Phase 2", ... }, ...]`
///
/// A missing file is reported as [`DashboardError::MissingDataset`] so callers
/// can tell it apart from a malformed one.
pub fn load_file(path: &Path) -> Result<TrialTable> {
    if !path.exists() {
        return Err(DashboardError::MissingDataset {
            path: path.to_path_buf(),
        }
        .into());
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (columns, rows) = match ext.as_str() {
        "parquet" | "pq" => read_parquet(path)?,
        "json" => read_json(path)?,
        "csv" => read_csv(path)?,
        other => return Err(DashboardError::UnsupportedFormat(other.to_string()).into()),
    };

    let table = TrialTable::from_rows(columns, rows)
        .with_context(|| format!("decoding trials from {}", path.display()))?;
    log::info!(
        "Loaded {} trials with {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

type RawRows = (Vec<String>, Vec<Vec<CellValue>>);

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`).
/// Columns are ordered by first appearance; keys missing from a record are null.
fn read_json(path: &Path) -> Result<RawRows> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok((columns, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, empty fields are absent values.
fn read_csv(path: &Path) -> Result<RawRows> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok((columns, rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_nan() {
            return CellValue::Null;
        }
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" || s == "True" || s == "False" {
        return CellValue::Bool(s.eq_ignore_ascii_case("true"));
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load the Parquet snapshot.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`): categorical (dictionary) columns, narrow
/// integer/float widths and nullable integers stored as float64 are all
/// accepted.
fn read_parquet(path: &Path) -> Result<RawRows> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let n_rows = batch.num_rows();

        let normalized: Vec<ArrayRef> = batch
            .columns()
            .iter()
            .zip(&columns)
            .map(|(col, name)| {
                normalize_column(col).with_context(|| format!("reading column '{name}'"))
            })
            .collect::<Result<_>>()?;

        for row in 0..n_rows {
            let cells = normalized
                .iter()
                .map(|col| extract_cell(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row}"))?;
            rows.push(cells);
        }
    }

    Ok((columns, rows))
}

// -- Parquet / Arrow helpers --

/// Cast an Arrow column to one of the widths [`extract_cell`] understands.
fn normalize_column(col: &ArrayRef) -> Result<ArrayRef> {
    let target = match col.data_type() {
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Int64
        | DataType::Float64
        | DataType::Boolean
        | DataType::Null => return Ok(col.clone()),
        DataType::Dictionary(_, _) | DataType::Utf8View => DataType::Utf8,
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => DataType::Int64,
        DataType::Float16 | DataType::Float32 => DataType::Float64,
        // Dates, timestamps and anything exotic are rendered as text.
        _ => return Ok(col.clone()),
    };
    cast(col, &target).context("casting column")
}

/// Extract a single cell from a normalized Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float64 => {
            let v = col.as_primitive::<Float64Type>().value(row);
            if v.is_nan() {
                CellValue::Null
            } else {
                CellValue::Float(v)
            }
        }
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Null => CellValue::Null,
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            CellValue::Date(format_cell(col, row)?)
        }
        // Lists, decimals, durations, binary and the like.
        _ => CellValue::String(format_cell(col, row)?),
    };
    Ok(cell)
}

fn format_cell(col: &ArrayRef, row: usize) -> Result<String> {
    let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())
        .context("formatting cell")?;
    Ok(formatter.value(row).to_string())
}
