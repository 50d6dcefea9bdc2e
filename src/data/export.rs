use std::io::Write;

use anyhow::{Context, Result};

use super::model::{CellValue, TrialRecord};

/// Default file name offered when saving the filtered subset.
pub const FILTERED_EXPORT_NAME: &str = "trialpulse_filtered.csv";

/// Write trials as CSV: header row in source column order, one line per trial,
/// absent values as empty fields.
pub fn write_csv<'a, W, I>(writer: W, columns: &[String], records: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a TrialRecord>,
{
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(columns).context("writing CSV header")?;
    for (row, rec) in records.into_iter().enumerate() {
        out.write_record(rec.cells.iter().map(cell_to_field))
            .with_context(|| format!("writing CSV row {row}"))?;
    }
    out.flush().context("flushing CSV output")?;
    Ok(())
}

/// Render trials to an in-memory CSV buffer.
pub fn to_csv_bytes<'a, I>(columns: &[String], records: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a TrialRecord>,
{
    let mut buf = Vec::new();
    write_csv(&mut buf, columns, records)?;
    Ok(buf)
}

/// Floats keep a decimal point even when whole (`400.0`), matching how the
/// snapshot's float columns read in a spreadsheet.
fn cell_to_field(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => String::new(),
        CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => format!("{v:.1}"),
        CellValue::Float(v) if v.is_nan() => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{FilterSelection, filter};
    use crate::data::model::TrialTable;

    fn table() -> TrialTable {
        let columns = [
            "nct_id",
            "phase",
            "sponsor_type",
            "condition_area",
            "status_group",
            "start_year",
            "duration_start_to_completion_days",
            "enrollment_count",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        TrialTable::from_rows(
            columns,
            vec![
                vec![
                    CellValue::String("NCT1".into()),
                    CellValue::String("Phase 2".into()),
                    CellValue::String("Industry, Inc.".into()),
                    CellValue::Null,
                    CellValue::String("Completed".into()),
                    CellValue::Float(2019.0),
                    CellValue::Float(400.5),
                    CellValue::Integer(120),
                ],
                vec![
                    CellValue::String("NCT2".into()),
                    CellValue::String("Phase 3".into()),
                    CellValue::Null,
                    CellValue::Null,
                    CellValue::Null,
                    CellValue::Null,
                    CellValue::Null,
                    CellValue::Null,
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn writes_header_and_blank_absent_values() {
        let table = table();
        let bytes = to_csv_bytes(&table.columns, &table.records).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "nct_id,phase,sponsor_type,condition_area,status_group,start_year,\
             duration_start_to_completion_days,enrollment_count"
        );
        assert_eq!(lines[1], "NCT1,Phase 2,\"Industry, Inc.\",,Completed,2019.0,400.5,120");
        assert_eq!(lines[2], "NCT2,Phase 3,,,,,,");
    }

    #[test]
    fn exports_only_the_filtered_rows() {
        let table = table();
        let sel = FilterSelection {
            phases: ["Phase 3".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let subset = filter(&table, &sel);
        let text = String::from_utf8(to_csv_bytes(&subset.columns, &subset.records).unwrap())
            .unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).unwrap().starts_with("NCT2,"));
    }

    #[test]
    fn empty_subset_still_has_a_header() {
        let table = table();
        let text =
            String::from_utf8(to_csv_bytes(&table.columns, std::iter::empty()).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
