use super::model::{Category, MeasurementRow, MeasurementTable};

// ---------------------------------------------------------------------------
// Category filter
// ---------------------------------------------------------------------------

/// Rows matching `category`, in table order.
pub fn filter_category<'a>(table: &'a MeasurementTable, category: &Category) -> Vec<&'a MeasurementRow> {
    table.rows().iter().filter(|row| category.matches(row)).collect()
}

/// Rows whose particle type is one of `codes`.
pub fn filter_particle_types<'a>(table: &'a MeasurementTable, codes: &[i64]) -> Vec<&'a MeasurementRow> {
    table
        .rows()
        .iter()
        .filter(|row| codes.contains(&row.particle_type))
        .collect()
}
