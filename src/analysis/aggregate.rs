use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::histogram::{build_histogram, BarMode, ChartSpec};
use super::ranges::{compute_statistics, RangeStatistic};
use crate::data::model::{Category, MeasurementTable};
use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// Plot groups
// ---------------------------------------------------------------------------

/// The three fixed chart groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlotGroup {
    Dilepton,
    FourLepton,
    Diphoton,
}

impl PlotGroup {
    pub const ALL: [PlotGroup; 3] = [PlotGroup::Dilepton, PlotGroup::FourLepton, PlotGroup::Diphoton];

    /// Key in the `plots` mapping.
    pub fn key(self) -> &'static str {
        match self {
            PlotGroup::Dilepton => "dilepton",
            PlotGroup::FourLepton => "fourlepton",
            PlotGroup::Diphoton => "diphoton",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PlotGroup::Dilepton => "Dilepton Invariant Mass Distribution",
            PlotGroup::FourLepton => "Four Lepton Invariant Mass Distribution",
            PlotGroup::Diphoton => "Diphoton Invariant Mass Distribution",
        }
    }

    pub fn categories(self) -> Vec<Category> {
        match self {
            PlotGroup::Dilepton => vec![
                Category::Numeric(SingleParticle::Electron.code()),
                Category::Numeric(SingleParticle::Muon.code()),
            ],
            PlotGroup::FourLepton => ["4ee", "4mm", "4me"].into_iter().map(Category::label).collect(),
            PlotGroup::Diphoton => vec![Category::Numeric(SingleParticle::Photon.code())],
        }
    }

    pub fn bar_mode(self) -> BarMode {
        match self {
            PlotGroup::Dilepton => BarMode::Stack,
            PlotGroup::FourLepton | PlotGroup::Diphoton => BarMode::Overlay,
        }
    }
}

/// Single-particle categories that always get a statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleParticle {
    Electron,
    Muon,
    Photon,
}

impl SingleParticle {
    pub const ALL: [SingleParticle; 3] = [SingleParticle::Electron, SingleParticle::Muon, SingleParticle::Photon];

    pub fn code(self) -> i64 {
        match self {
            SingleParticle::Electron => 1,
            SingleParticle::Muon => 2,
            SingleParticle::Photon => 3,
        }
    }

    /// Key in the `statistics` mapping.
    pub fn key(self) -> &'static str {
        match self {
            SingleParticle::Electron => "electrons",
            SingleParticle::Muon => "muons",
            SingleParticle::Photon => "photons",
        }
    }
}

// ---------------------------------------------------------------------------
// View mode
// ---------------------------------------------------------------------------

/// Which plot groups a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    All,
    Dilepton,
    FourLepton,
    Diphoton,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [ViewMode::All, ViewMode::Dilepton, ViewMode::FourLepton, ViewMode::Diphoton];

    pub fn includes(self, group: PlotGroup) -> bool {
        matches!(
            (self, group),
            (ViewMode::All, _)
                | (ViewMode::Dilepton, PlotGroup::Dilepton)
                | (ViewMode::FourLepton, PlotGroup::FourLepton)
                | (ViewMode::Diphoton, PlotGroup::Diphoton)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::All => "all",
            ViewMode::Dilepton => "dilepton",
            ViewMode::FourLepton => "fourlepton",
            ViewMode::Diphoton => "diphoton",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown view mode '{0}' (expected all, dilepton, fourlepton or diphoton)")]
pub struct UnknownViewMode(pub String);

impl FromStr for ViewMode {
    type Err = UnknownViewMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ViewMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| UnknownViewMode(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// The combined response: charts per plot group, statistics per particle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub plots: BTreeMap<String, ChartSpec>,
    pub statistics: BTreeMap<String, Vec<RangeStatistic>>,
}

/// Build the charts selected by `view_mode` and the statistics of every
/// single-particle category.
pub fn aggregate(
    table: &MeasurementTable,
    view_mode: ViewMode,
    bin_count: Option<i64>,
    log_scale: bool,
) -> Result<AggregateResult, AnalysisError> {
    if table.is_empty() {
        return Err(AnalysisError::NoData("No valid data found".to_string()));
    }

    let plots = PlotGroup::ALL
        .into_iter()
        .filter(|group| view_mode.includes(*group))
        .map(|group| {
            let chart = build_histogram(
                table,
                &group.categories(),
                group.title(),
                bin_count,
                log_scale,
                group.bar_mode(),
            );
            (group.key().to_string(), chart)
        })
        .collect();

    let statistics = SingleParticle::ALL
        .into_iter()
        .map(|particle| {
            (
                particle.key().to_string(),
                compute_statistics(table, &[particle.code()]),
            )
        })
        .collect();

    log::debug!(
        "aggregated {} row(s), view={view_mode}, bins={bin_count:?}, log_scale={log_scale}",
        table.len()
    );
    Ok(AggregateResult { plots, statistics })
}
