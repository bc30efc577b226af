use eframe::egui::{ScrollArea, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot};

use rusty_mass::analysis::histogram::{AxisScale, BarMode, ChartSeries, ChartSpec};
use rusty_mass::analysis::PlotGroup;

use crate::color::trace_color;
use crate::state::AppState;

const PLOT_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Histogram plots (central panel)
// ---------------------------------------------------------------------------

/// Render one bar chart per plot group in the current result.
pub fn histogram_plots(ui: &mut Ui, state: &AppState) {
    let Some(result) = &state.result else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view invariant-mass histograms  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for group in PlotGroup::ALL {
                if let Some(chart) = result.plots.get(group.key()) {
                    ui.heading(&chart.layout.title);
                    if chart.traces.is_empty() {
                        ui.label("No events in this category.");
                    } else {
                        chart_plot(ui, group.key(), chart);
                    }
                    ui.separator();
                }
            }
        });
}

fn chart_plot(ui: &mut Ui, id: &str, chart: &ChartSpec) {
    let log_x = chart.layout.xaxis.scale == AxisScale::Log;

    let mut bar_charts: Vec<BarChart> = Vec::with_capacity(chart.traces.len());
    for trace in &chart.traces {
        let mut bars = BarChart::new(series_bars(trace, log_x))
            .name(&trace.category_label)
            .color(trace_color(&trace.color, trace.opacity));
        if chart.layout.barmode == BarMode::Stack {
            let below: Vec<&BarChart> = bar_charts.iter().collect();
            bars = bars.stack_on(&below);
        }
        bar_charts.push(bars);
    }

    let mut plot = Plot::new(id)
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label(chart.layout.xaxis.title.clone())
        .y_axis_label(chart.layout.yaxis.title.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true);

    if log_x {
        // Bars are placed at log10(mass); label ticks in GeV.
        plot = plot.x_axis_formatter(|mark, _range| format_gev(10f64.powf(mark.value)));
    }

    plot.show(ui, |plot_ui| {
        for bars in bar_charts {
            plot_ui.bar_chart(bars);
        }
    });
}

/// Bars of one trace; on a log axis positions and widths are in log10 space.
fn series_bars(trace: &ChartSeries, log_x: bool) -> Vec<Bar> {
    let color = trace_color(&trace.color, trace.opacity);
    let to_axis = |v: f64| if log_x { v.log10() } else { v };

    trace
        .counts
        .iter()
        .zip(trace.bin_edges.windows(2))
        .map(|(&count, edge)| {
            let lo = to_axis(edge[0]);
            let hi = to_axis(edge[1]);
            Bar::new((lo + hi) / 2.0, count as f64)
                .width(hi - lo)
                .fill(color)
        })
        .collect()
}

fn format_gev(v: f64) -> String {
    if v >= 100.0 {
        format!("{v:.0}")
    } else if v >= 1.0 {
        format!("{v:.1}")
    } else {
        format!("{v:.3}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace() -> ChartSeries {
        ChartSeries {
            category_label: "Electrons".to_string(),
            color: "blue".to_string(),
            opacity: 0.7,
            values: vec![1.0, 10.0, 100.0],
            bin_edges: vec![1.0, 10.0, 100.0],
            counts: vec![1, 2],
        }
    }

    #[test]
    fn linear_bars_follow_edges() {
        let bars = series_bars(&trace(), false);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].argument, 5.5);
        assert_eq!(bars[1].value, 2.0);
        assert_eq!(bars[1].bar_width, 90.0);
    }

    #[test]
    fn log_bars_are_in_decades() {
        let bars = series_bars(&trace(), true);
        assert!((bars[0].argument - 0.5).abs() < 1e-12);
        assert!((bars[1].bar_width - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tick_labels() {
        assert_eq!(format_gev(1000.0), "1000");
        assert_eq!(format_gev(3.16), "3.2");
        assert_eq!(format_gev(0.5), "0.500");
    }
}
