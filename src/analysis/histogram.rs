use serde::Serialize;

use crate::data::filter::filter_category;
use crate::data::model::{Category, MeasurementTable};

/// Bin count used when the request carries none, or a non-positive one.
pub const DEFAULT_BIN_COUNT: usize = 20;

pub const TRACE_OPACITY: f32 = 0.7;
pub const CHART_HEIGHT: u32 = 500;
pub const FALLBACK_COLOR: &str = "gray";

pub const X_AXIS_TITLE: &str = "Invariant Mass (GeV)";
pub const Y_AXIS_TITLE: &str = "Events";

// ---------------------------------------------------------------------------
// Category styles
// ---------------------------------------------------------------------------

/// Particle code → (display label, CSS colour).
const PARTICLE_STYLES: &[(i64, &str, &str)] = &[
    (1, "Electrons", "blue"),
    (2, "Muons", "red"),
    (3, "Photons", "green"),
];

/// Combination label (lower case) → CSS colour. Displayed upper case.
const COMBINATION_STYLES: &[(&str, &str)] = &[
    ("4ee", "darkblue"),
    ("4mm", "darkred"),
    ("4me", "purple"),
];

/// Display label and colour of a category; unknown categories are gray.
pub fn category_style(category: &Category) -> (String, &'static str) {
    match category {
        Category::Numeric(code) => PARTICLE_STYLES
            .iter()
            .find(|(c, _, _)| c == code)
            .map(|(_, label, color)| (label.to_string(), *color))
            .unwrap_or_else(|| (code.to_string(), FALLBACK_COLOR)),
        Category::Label(label) => {
            let key = label.to_lowercase();
            let color = COMBINATION_STYLES
                .iter()
                .find(|(l, _)| *l == key)
                .map(|(_, color)| *color)
                .unwrap_or(FALLBACK_COLOR);
            (label.to_uppercase(), color)
        }
    }
}

/// Requested bin count, or [`DEFAULT_BIN_COUNT`] when absent or non-positive.
pub fn effective_bin_count(requested: Option<i64>) -> usize {
    match requested {
        Some(n) if n > 0 => n as usize,
        _ => DEFAULT_BIN_COUNT,
    }
}

// ---------------------------------------------------------------------------
// Chart description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    /// Category bars are summed per bin.
    Stack,
    /// Translucent independent bars drawn on top of each other.
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    Linear,
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    #[serde(rename = "type")]
    pub scale: AxisScale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub title: String,
    pub barmode: BarMode,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub height: u32,
}

/// One histogram trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    #[serde(rename = "name")]
    pub category_label: String,
    pub color: String,
    pub opacity: f32,
    /// Masses that went into the bins.
    pub values: Vec<f64>,
    /// `counts.len() + 1` edges, shared by every series of the chart.
    pub bin_edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl ChartSeries {
    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }
}

/// Renderable chart: traces plus layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub traces: Vec<ChartSeries>,
    pub layout: ChartLayout,
}

// ---------------------------------------------------------------------------
// Binning
// ---------------------------------------------------------------------------

/// Uniform bins over `[lo, hi]`, in log10 space when `log` is set.
#[derive(Debug, Clone, Copy)]
struct Binning {
    lo: f64,
    hi: f64,
    bins: usize,
    log: bool,
}

impl Binning {
    /// Bins spanning all `values`; `None` when there are no values.
    fn spanning(values: impl Iterator<Item = f64>, bins: usize, log: bool) -> Option<Self> {
        let to_axis = |v: f64| if log { v.log10() } else { v };
        let (lo, hi) = values.map(to_axis).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })?;

        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
        Some(Binning { lo, hi, bins, log })
    }

    fn width(&self) -> f64 {
        (self.hi - self.lo) / self.bins as f64
    }

    fn edges(&self) -> Vec<f64> {
        let from_axis = |v: f64| if self.log { 10f64.powf(v) } else { v };
        (0..=self.bins)
            .map(|i| {
                if i == self.bins {
                    self.hi
                } else {
                    self.lo + i as f64 * self.width()
                }
            })
            .map(from_axis)
            .collect()
    }

    /// Bin index of `value`; the upper edge belongs to the last bin.
    fn index(&self, value: f64) -> usize {
        let v = if self.log { value.log10() } else { value };
        let idx = ((v - self.lo) / self.width()).floor().max(0.0) as usize;
        idx.min(self.bins - 1)
    }

    fn counts(&self, values: &[f64]) -> Vec<u64> {
        let mut counts = vec![0u64; self.bins];
        for &v in values {
            counts[self.index(v)] += 1;
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Histogram builder
// ---------------------------------------------------------------------------

/// Build one chart with a trace per non-empty category.
///
/// With `log_scale`, non-positive masses are left out of every trace and the
/// title notes how many such rows the table holds.
pub fn build_histogram(
    table: &MeasurementTable,
    categories: &[Category],
    title: &str,
    bin_count: Option<i64>,
    log_scale: bool,
    mode: BarMode,
) -> ChartSpec {
    let bins = effective_bin_count(bin_count);

    let selected: Vec<(&Category, Vec<f64>)> = categories
        .iter()
        .map(|category| {
            let values: Vec<f64> = filter_category(table, category)
                .into_iter()
                .map(|row| row.invariant_mass)
                .filter(|&m| !log_scale || m > 0.0)
                .collect();
            (category, values)
        })
        .filter(|(_, values)| !values.is_empty())
        .collect();

    let binning = Binning::spanning(
        selected.iter().flat_map(|(_, values)| values.iter().copied()),
        bins,
        log_scale,
    );
    let edges = binning.map(|b| b.edges()).unwrap_or_default();

    let traces = selected
        .into_iter()
        .map(|(category, values)| {
            let (label, color) = category_style(category);
            let counts = binning.map(|b| b.counts(&values)).unwrap_or_default();
            ChartSeries {
                category_label: label,
                color: color.to_string(),
                opacity: TRACE_OPACITY,
                values,
                bin_edges: edges.clone(),
                counts,
            }
        })
        .collect();

    let excluded = if log_scale { table.non_positive_count() } else { 0 };
    let title = if excluded > 0 {
        log::debug!("{title}: {excluded} non-positive mass row(s) excluded for log scale");
        format!("{title} (log scale: {excluded} events with non-positive mass excluded)")
    } else {
        title.to_string()
    };

    ChartSpec {
        traces,
        layout: ChartLayout {
            title,
            barmode: mode,
            xaxis: Axis {
                title: X_AXIS_TITLE.to_string(),
                scale: if log_scale { AxisScale::Log } else { AxisScale::Linear },
            },
            yaxis: Axis {
                title: Y_AXIS_TITLE.to_string(),
                scale: AxisScale::Linear,
            },
            height: CHART_HEIGHT,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::MeasurementRow;

    fn table(rows: &[(f64, i64, &str)]) -> MeasurementTable {
        rows.iter()
            .map(|&(m, t, c)| MeasurementRow::new(m, t, c))
            .collect()
    }

    #[test]
    fn bin_count_fallback() {
        assert_eq!(effective_bin_count(None), DEFAULT_BIN_COUNT);
        assert_eq!(effective_bin_count(Some(0)), DEFAULT_BIN_COUNT);
        assert_eq!(effective_bin_count(Some(-5)), DEFAULT_BIN_COUNT);
        assert_eq!(effective_bin_count(Some(7)), 7);
        assert_eq!(effective_bin_count(Some(5000)), 5000);
    }

    #[test]
    fn styles_from_lookup_and_fallback() {
        assert_eq!(category_style(&Category::Numeric(1)), ("Electrons".to_string(), "blue"));
        assert_eq!(category_style(&Category::label("4Me")), ("4ME".to_string(), "purple"));
        assert_eq!(category_style(&Category::Numeric(9)), ("9".to_string(), "gray"));
        assert_eq!(category_style(&Category::label("2e2m")), ("2E2M".to_string(), "gray"));
    }

    #[test]
    fn stacked_traces_share_edges() {
        let t = table(&[(0.0, 1, ""), (10.0, 1, ""), (5.0, 2, ""), (10.0, 2, "")]);
        let chart = build_histogram(
            &t,
            &[Category::Numeric(1), Category::Numeric(2)],
            "Dilepton",
            Some(2),
            false,
            BarMode::Stack,
        );
        assert_eq!(chart.layout.barmode, BarMode::Stack);
        assert_eq!(chart.traces.len(), 2);
        assert_eq!(chart.traces[0].bin_edges, vec![0.0, 5.0, 10.0]);
        assert_eq!(chart.traces[0].bin_edges, chart.traces[1].bin_edges);
        assert_eq!(chart.traces[0].counts, vec![1, 1]);
        assert_eq!(chart.traces[1].counts, vec![0, 2]);
        assert_eq!(chart.traces[0].category_label, "Electrons");
        assert_eq!(chart.traces[1].color, "red");
    }

    #[test]
    fn empty_categories_are_omitted() {
        let t = table(&[(125.0, 4, "4ee"), (124.0, 4, "4EE")]);
        let chart = build_histogram(
            &t,
            &[Category::label("4ee"), Category::label("4mm"), Category::label("4me")],
            "Four Lepton",
            None,
            false,
            BarMode::Overlay,
        );
        assert_eq!(chart.traces.len(), 1);
        assert_eq!(chart.traces[0].category_label, "4EE");
        assert_eq!(chart.traces[0].bin_count(), DEFAULT_BIN_COUNT);
        assert_eq!(chart.traces[0].counts.iter().sum::<u64>(), 2);
    }

    #[test]
    fn no_rows_gives_no_traces() {
        let t = table(&[(91.0, 1, "")]);
        let chart = build_histogram(&t, &[Category::Numeric(3)], "Diphoton", None, false, BarMode::Overlay);
        assert!(chart.traces.is_empty());
        assert_eq!(chart.layout.title, "Diphoton");
    }

    #[test]
    fn single_value_gets_unit_span() {
        let t = table(&[(91.0, 3, ""), (91.0, 3, "")]);
        let chart = build_histogram(&t, &[Category::Numeric(3)], "Diphoton", Some(1), false, BarMode::Overlay);
        assert_eq!(chart.traces[0].bin_edges, vec![90.5, 91.5]);
        assert_eq!(chart.traces[0].counts, vec![2]);
    }

    #[test]
    fn log_scale_excludes_non_positive_and_annotates() {
        let t = table(&[(-1.0, 1, ""), (0.0, 2, ""), (1.0, 1, ""), (100.0, 1, "")]);
        let linear = build_histogram(&t, &[Category::Numeric(1)], "Dilepton", Some(2), false, BarMode::Stack);
        let log = build_histogram(&t, &[Category::Numeric(1)], "Dilepton", Some(2), true, BarMode::Stack);

        assert_eq!(linear.traces[0].values.len(), 3);
        assert_eq!(log.traces[0].values, vec![1.0, 100.0]);
        assert_eq!(log.traces[0].counts, vec![1, 1]);
        assert!((log.traces[0].bin_edges[1] - 10.0).abs() < 1e-9);

        assert_eq!(log.layout.xaxis.scale, AxisScale::Log);
        assert_eq!(log.layout.yaxis.scale, AxisScale::Linear);
        assert!(log.layout.title.starts_with("Dilepton (log scale: 2 events"));
        assert_eq!(linear.layout.title, "Dilepton");
    }

    #[test]
    fn log_scale_without_non_positive_rows_keeps_title() {
        let t = table(&[(3.0, 3, ""), (30.0, 3, "")]);
        let chart = build_histogram(&t, &[Category::Numeric(3)], "Diphoton", None, true, BarMode::Overlay);
        assert_eq!(chart.layout.title, "Diphoton");
        assert_eq!(chart.traces[0].values.len(), 2);
    }

    #[test]
    fn spec_serializes_layout_and_traces() {
        let t = table(&[(3.0, 3, "")]);
        let chart = build_histogram(&t, &[Category::Numeric(3)], "Diphoton", None, true, BarMode::Overlay);
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["layout"]["barmode"], "overlay");
        assert_eq!(json["layout"]["xaxis"]["type"], "log");
        assert_eq!(json["layout"]["xaxis"]["title"], X_AXIS_TITLE);
        assert_eq!(json["traces"][0]["name"], "Photons");
        assert_eq!(json["traces"][0]["color"], "green");
    }
}
