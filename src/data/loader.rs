use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};

use super::model::{MeasurementRow, MeasurementTable};
use super::store;
use crate::error::ParseError;

/// Column count of the canonical layout: mass, particle type, combination.
const LAYOUT_COLUMNS: usize = 3;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a measurement table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` / `.tsv` – delimited text, see [`parse_table`]
/// * `.parquet` / `.pq`      – persisted table, optionally scoped to `group`
///
/// `group` is ignored for delimited text, which carries no group column.
pub fn load_file(path: &Path, group: Option<&str>) -> Result<MeasurementTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" | "tsv" => {
            let raw = std::fs::read(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let table = parse_table(&raw)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(table)
        }
        "parquet" | "pq" => store::read_parquet(path, group),
        _ => bail!("Only CSV, TXT, TSV and Parquet files are supported"),
    }
}

/// Parse raw bytes into a measurement table.
///
/// The text is read as comma-delimited first; when that reading does not fit
/// the three-column layout the tab-delimited reading is used instead. Rows
/// with a missing or non-numeric mass or particle type, or more than three
/// fields, are dropped. Only undecodable input is an error; an empty result
/// is left to the caller.
pub fn parse_table(raw: &[u8]) -> Result<MeasurementTable, ParseError> {
    let text = std::str::from_utf8(raw)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let comma = read_records(text, b',');
    let records = match comma.misfit {
        None => comma.records,
        Some(reason) => {
            log::info!("comma layout rejected ({reason}), reading as tab-delimited");
            let tab = read_records(text, b'\t');
            if let Some(reason) = tab.misfit {
                log::debug!("tab layout does not fit either ({reason}); rows will be dropped");
            }
            tab.records
        }
    };

    let total = records.len();
    let rows: Vec<MeasurementRow> = records.iter().filter_map(coerce_record).collect();
    let dropped = total - rows.len();
    if dropped > 0 {
        log::debug!("dropped {dropped} malformed row(s) out of {total}");
    }
    log::info!("parsed {} measurement row(s)", rows.len());

    Ok(MeasurementTable::from_rows(rows))
}

// ---------------------------------------------------------------------------
// Delimited reading
// ---------------------------------------------------------------------------

/// Non-blank records of one delimiter reading, plus why the reading does not
/// fit the layout, if it doesn't.
struct Reading {
    records: Vec<StringRecord>,
    misfit: Option<String>,
}

/// Read all non-blank records with `delimiter`. The reading is a misfit on a
/// reader error, a record wider than three fields, or when no record splits
/// into at least two fields. Unreadable records are skipped.
fn read_records(text: &str, delimiter: u8) -> Reading {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    let mut misfit = None;
    let mut widest = 0;
    for (line_no, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                misfit.get_or_insert_with(|| format!("record {line_no}: {e}"));
                continue;
            }
        };
        if is_blank(&record) {
            continue;
        }
        if record.len() > LAYOUT_COLUMNS {
            misfit.get_or_insert_with(|| {
                format!("record {line_no} has {} fields, expected at most {LAYOUT_COLUMNS}", record.len())
            });
        }
        widest = widest.max(record.len());
        records.push(record);
    }

    if misfit.is_none() && !records.is_empty() && widest < 2 {
        misfit = Some("no record has more than one field".to_string());
    }
    Reading { records, misfit }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

// ---------------------------------------------------------------------------
// Row coercion
// ---------------------------------------------------------------------------

fn coerce_record(record: &StringRecord) -> Option<MeasurementRow> {
    if record.len() > LAYOUT_COLUMNS {
        return None;
    }
    let invariant_mass = parse_finite(record.get(0)?)?;
    let particle_type = parse_finite(record.get(1)?)?.trunc() as i64;
    let combination = record.get(2).unwrap_or("").trim().to_string();

    Some(MeasurementRow {
        invariant_mass,
        particle_type,
        combination,
    })
}

fn parse_finite(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_rows_with_optional_combination() {
        let table = parse_table(b"3.0,1,\n91.2,2\n125.1,4, 4ee \n").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0], MeasurementRow::new(3.0, 1, ""));
        assert_eq!(table.rows()[1], MeasurementRow::new(91.2, 2, ""));
        assert_eq!(table.rows()[2].combination, "4ee");
    }

    #[test]
    fn malformed_rows_are_dropped() {
        let input = b"invariant_mass,particle_type,combination\n\
                      3.0,1,\n\
                      abc,1,\n\
                      5.0,,\n\
                      ,2,\n\
                      7.5,x,\n\
                      nan,1,\n\
                      9.0,2.0,\n";
        let table = parse_table(input).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1], MeasurementRow::new(9.0, 2, ""));
    }

    #[test]
    fn tab_fallback() {
        let table = parse_table(b"3.0\t1\t\n1000.0\t2\t4mm\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1], MeasurementRow::new(1000.0, 2, "4mm"));
    }

    #[test]
    fn single_column_input_has_no_rows() {
        let table = parse_table(b"3.0\n4.0\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn too_wide_comma_row_switches_to_tab_reading() {
        // One four-field row rejects the comma reading; as tab-delimited every
        // line is a single field, so nothing survives.
        let table = parse_table(b"3.0,1,4ee,extra\n4.0,1,\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn too_wide_tab_rows_are_dropped() {
        let table = parse_table(b"1,2,3,4\n3.0\t1\t\n5.0\t2\t4mm\textra\n").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0], MeasurementRow::new(3.0, 1, ""));
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let err = parse_table(&[0xff, 0xfe, b',', b'1']).unwrap_err();
        assert!(matches!(err, ParseError::Decode(_)));
    }

    #[test]
    fn empty_input_gives_empty_table() {
        assert!(parse_table(b"").unwrap().is_empty());
        assert!(parse_table(b"\n\n").unwrap().is_empty());
    }

    #[test]
    fn byte_order_mark_and_blank_lines() {
        let table = parse_table("\u{feff}3.0,1,\n\n4.0,1,\n".as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].invariant_mass, 3.0);
    }

    #[test]
    fn particle_type_is_truncated() {
        let table = parse_table(b"10.0,2.9,\n").unwrap();
        assert_eq!(table.rows()[0].particle_type, 2);
    }

    #[test]
    fn malformed_count_matches_dropped_rows() {
        let lines = ["1.0,1,", "bad,1,", "2.0,2,4ee", "3.0,,", "4.0,3,", "x,y,z"];
        let input = lines.join("\n");
        let table = parse_table(input.as_bytes()).unwrap();
        let malformed = 3;
        assert_eq!(table.len(), lines.len() - malformed);
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("data.xlsx"), None).unwrap_err();
        assert!(err.to_string().contains("Only CSV"));
    }
}
