use serde::ser::{Serialize, Serializer};

use crate::data::filter::filter_particle_types;
use crate::data::model::{MeasurementRow, MeasurementTable};

// ---------------------------------------------------------------------------
// Energy ranges
// ---------------------------------------------------------------------------

/// A named mass window in GeV, inclusive on both bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyRange {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

impl EnergyRange {
    pub fn contains(&self, mass: f64) -> bool {
        mass >= self.min && mass <= self.max
    }

    /// Display label, e.g. `R1 (2-4 GeV)`.
    pub fn label(&self) -> String {
        format!("{} ({}-{} GeV)", self.name, self.min, self.max)
    }
}

/// The five fixed windows, in reporting order.
pub const ENERGY_RANGES: [EnergyRange; 5] = [
    EnergyRange { name: "R1", min: 2.0, max: 4.0 },
    EnergyRange { name: "R2", min: 7.0, max: 13.0 },
    EnergyRange { name: "R3", min: 80.0, max: 100.0 },
    EnergyRange { name: "R4", min: 900.0, max: 1100.0 },
    EnergyRange { name: "R5", min: 1400.0, max: 1600.0 },
];

pub const TOTAL_LABEL: &str = "Total";

// ---------------------------------------------------------------------------
// Range statistic
// ---------------------------------------------------------------------------

/// Mean mass of a window; undefined when the window has no events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeanMass {
    Value(f64),
    NotAvailable,
}

impl Serialize for MeanMass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MeanMass::Value(v) => serializer.serialize_f64(*v),
            MeanMass::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

impl std::fmt::Display for MeanMass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeanMass::Value(v) => write!(f, "{v:.2}"),
            MeanMass::NotAvailable => write!(f, "N/A"),
        }
    }
}

/// One row of a statistics table.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RangeStatistic {
    #[serde(rename = "range")]
    pub range_label: String,
    #[serde(rename = "events")]
    pub event_count: usize,
    #[serde(rename = "mean")]
    pub mean_mass: MeanMass,
}

impl RangeStatistic {
    fn summarize<'a>(range_label: String, rows: impl Iterator<Item = &'a MeasurementRow>) -> Self {
        let (count, sum) = rows.fold((0usize, 0.0f64), |(n, s), row| (n + 1, s + row.invariant_mass));
        let mean_mass = if count == 0 {
            MeanMass::NotAvailable
        } else {
            MeanMass::Value(round2(sum / count as f64))
        };
        RangeStatistic {
            range_label,
            event_count: count,
            mean_mass,
        }
    }
}

/// Two decimals, exact ties to even (2.125 gives 2.12).
fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

// ---------------------------------------------------------------------------
// Statistics engine
// ---------------------------------------------------------------------------

/// Event counts and mean masses per energy window for rows whose particle
/// type is in `particle_types`: R1..R5 followed by a `Total` row.
///
/// `Total` covers every selected row, including those outside all windows.
pub fn compute_statistics(table: &MeasurementTable, particle_types: &[i64]) -> Vec<RangeStatistic> {
    let selected = filter_particle_types(table, particle_types);

    let mut stats: Vec<RangeStatistic> = ENERGY_RANGES
        .iter()
        .map(|range| {
            RangeStatistic::summarize(
                range.label(),
                selected
                    .iter()
                    .copied()
                    .filter(|row| range.contains(row.invariant_mass)),
            )
        })
        .collect();

    stats.push(RangeStatistic::summarize(
        TOTAL_LABEL.to_string(),
        selected.iter().copied(),
    ));
    stats
}
