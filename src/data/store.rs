use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use super::model::{MeasurementRow, MeasurementTable};

pub const COL_MASS: &str = "invariant_mass";
pub const COL_TYPE: &str = "particle_type";
pub const COL_COMBINATION: &str = "combination";
pub const COL_GROUP: &str = "group_id";

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Persist one or more tables into a single Parquet file, each row tagged with
/// the group id of the table it came from.
pub fn write_parquet(path: &Path, groups: &[(Option<&str>, &MeasurementTable)]) -> Result<()> {
    let capacity: usize = groups.iter().map(|(_, t)| t.len()).sum();
    let mut masses = Vec::with_capacity(capacity);
    let mut types = Vec::with_capacity(capacity);
    let mut combinations = Vec::with_capacity(capacity);
    let mut group_ids = Vec::with_capacity(capacity);

    for (group, table) in groups {
        for row in table.rows() {
            masses.push(row.invariant_mass);
            types.push(row.particle_type);
            combinations.push(row.combination.as_str());
            group_ids.push(*group);
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new(COL_MASS, DataType::Float64, false),
        Field::new(COL_TYPE, DataType::Int64, false),
        Field::new(COL_COMBINATION, DataType::Utf8, false),
        Field::new(COL_GROUP, DataType::Utf8, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(masses)),
        Arc::new(Int64Array::from(types)),
        Arc::new(StringArray::from(combinations)),
        Arc::new(StringArray::from(group_ids)),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    log::info!("wrote {capacity} measurement row(s) to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Rebuild a measurement table from a Parquet file.
///
/// Columns are cast to the canonical types, so files written by Pandas or
/// Polars with `int32`/`float32` columns load as well. With `scope` set, only
/// rows of that group are kept; a file without a `group_id` column has no
/// rows in any group.
pub fn read_parquet(path: &Path, scope: Option<&str>) -> Result<MeasurementTable> {
    let mut rows = Vec::new();

    for batch in open_batches(path)? {
        let batch = batch.context("reading parquet record batch")?;
        let n_rows = batch.num_rows();

        let masses = column_as::<Float64Array>(&batch, COL_MASS, &DataType::Float64)?;
        let types = column_as::<Int64Array>(&batch, COL_TYPE, &DataType::Int64)?;
        let combinations = optional_strings(&batch, COL_COMBINATION)?;
        let groups = optional_strings(&batch, COL_GROUP)?;

        for row in 0..n_rows {
            if let Some(scope) = scope {
                let in_scope = groups
                    .as_ref()
                    .is_some_and(|g| !g.is_null(row) && g.value(row) == scope);
                if !in_scope {
                    continue;
                }
            }
            if masses.is_null(row) || types.is_null(row) {
                continue;
            }
            let invariant_mass = masses.value(row);
            if !invariant_mass.is_finite() {
                continue;
            }
            let combination = combinations
                .as_ref()
                .filter(|c| !c.is_null(row))
                .map(|c| c.value(row).trim().to_string())
                .unwrap_or_default();

            rows.push(MeasurementRow {
                invariant_mass,
                particle_type: types.value(row),
                combination,
            });
        }
    }

    log::info!(
        "loaded {} measurement row(s) from {}{}",
        rows.len(),
        path.display(),
        scope.map(|g| format!(" (group {g})")).unwrap_or_default()
    );
    Ok(MeasurementTable::from_rows(rows))
}

/// Distinct group ids stored in a Parquet file, sorted.
pub fn group_ids(path: &Path) -> Result<Vec<String>> {
    let mut ids = BTreeSet::new();
    for batch in open_batches(path)? {
        let batch = batch.context("reading parquet record batch")?;
        if let Some(groups) = optional_strings(&batch, COL_GROUP)? {
            for row in 0..groups.len() {
                if !groups.is_null(row) {
                    ids.insert(groups.value(row).to_string());
                }
            }
        }
    }
    Ok(ids.into_iter().collect())
}

// -- Parquet / Arrow helpers --

fn open_batches(path: &Path) -> Result<parquet::arrow::arrow_reader::ParquetRecordBatchReader> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening parquet file {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    builder.build().context("building parquet reader")
}

/// Cast a required column to `to_type` and downcast it to `A`.
fn column_as<A: Array + Clone + 'static>(batch: &RecordBatch, name: &str, to_type: &DataType) -> Result<A> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
    let casted = cast(batch.column(idx).as_ref(), to_type)
        .with_context(|| format!("column '{name}' cannot be read as {to_type:?}"))?;
    casted
        .as_any()
        .downcast_ref::<A>()
        .cloned()
        .with_context(|| format!("column '{name}' has unexpected type"))
}

fn optional_strings(batch: &RecordBatch, name: &str) -> Result<Option<StringArray>> {
    if batch.schema().index_of(name).is_err() {
        return Ok(None);
    }
    column_as::<StringArray>(batch, name, &DataType::Utf8).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "rusty_mass_store_test_{}_{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos(),
            name
        ));
        p
    }

    fn table(rows: &[(f64, i64, &str)]) -> MeasurementTable {
        rows.iter()
            .map(|&(m, t, c)| MeasurementRow::new(m, t, c))
            .collect()
    }

    #[test]
    fn persisted_table_reads_back_whole_and_scoped() {
        let path = unique_path("groups.parquet");
        let a = table(&[(3.0, 1, ""), (91.0, 2, "")]);
        let b = table(&[(125.0, 4, "4ee")]);
        write_parquet(&path, &[(Some("group-a"), &a), (Some("group-b"), &b)]).unwrap();

        let all = read_parquet(&path, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.rows()[2], MeasurementRow::new(125.0, 4, "4ee"));

        let scoped = read_parquet(&path, Some("group-a")).unwrap();
        assert_eq!(scoped, a);

        assert!(read_parquet(&path, Some("missing")).unwrap().is_empty());
        assert_eq!(group_ids(&path).unwrap(), vec!["group-a", "group-b"]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn ungrouped_rows_have_no_scope() {
        let path = unique_path("ungrouped.parquet");
        let t = table(&[(10.0, 1, "")]);
        write_parquet(&path, &[(None, &t)]).unwrap();

        assert_eq!(read_parquet(&path, None).unwrap().len(), 1);
        assert!(read_parquet(&path, Some("any")).unwrap().is_empty());
        assert!(group_ids(&path).unwrap().is_empty());

        let _ = std::fs::remove_file(&path);
    }
}
