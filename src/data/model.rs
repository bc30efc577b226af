use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MeasurementRow – one line of the source file
// ---------------------------------------------------------------------------

/// A single well-typed measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    /// Invariant mass in GeV; always finite.
    pub invariant_mass: f64,
    /// Particle-type code (1 = electron, 2 = muon, 3 = photon, ...).
    pub particle_type: i64,
    /// Four-lepton sub-channel label, trimmed; empty when absent.
    pub combination: String,
}

impl MeasurementRow {
    pub fn new(invariant_mass: f64, particle_type: i64, combination: impl Into<String>) -> Self {
        MeasurementRow {
            invariant_mass,
            particle_type,
            combination: combination.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// MeasurementTable – the complete parsed table
// ---------------------------------------------------------------------------

/// Immutable collection of measurement rows. Only the parser and the
/// persisted-table reader construct it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementTable {
    rows: Vec<MeasurementRow>,
}

impl MeasurementTable {
    pub fn from_rows(rows: Vec<MeasurementRow>) -> Self {
        MeasurementTable { rows }
    }

    pub fn rows(&self) -> &[MeasurementRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose mass cannot be drawn on a logarithmic axis.
    pub fn non_positive_count(&self) -> usize {
        self.rows.iter().filter(|r| r.invariant_mass <= 0.0).count()
    }
}

impl FromIterator<MeasurementRow> for MeasurementTable {
    fn from_iter<I: IntoIterator<Item = MeasurementRow>>(iter: I) -> Self {
        MeasurementTable {
            rows: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Category – what a filter or a histogram trace selects
// ---------------------------------------------------------------------------

/// A category is either a numeric particle-type code or a combination label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Matches `particle_type` exactly.
    Numeric(i64),
    /// Matches `combination` case-insensitively (whole string).
    Label(String),
}

impl Category {
    pub fn label(text: &str) -> Self {
        Category::Label(text.to_string())
    }

    /// Whether `row` belongs to this category.
    pub fn matches(&self, row: &MeasurementRow) -> bool {
        match self {
            Category::Numeric(code) => row.particle_type == *code,
            Category::Label(label) => row.combination.to_lowercase() == label.to_lowercase(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Numeric(code) => write!(f, "{code}"),
            Category::Label(label) => write!(f, "{label}"),
        }
    }
}
