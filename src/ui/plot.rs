use std::ops::RangeInclusive;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints};

use flight_delays::dashboard::{Chart, ChartKind};

use crate::color::{generate_palette, ColorMap};

const CHART_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// Chart rendering
// ---------------------------------------------------------------------------

/// Render one dashboard chart: title, then the plot.
pub fn chart(ui: &mut Ui, chart: &Chart, id: impl std::hash::Hash) {
    ui.strong(chart.title.as_str());
    if chart.is_empty() {
        ui.label("No data for this selection.");
        return;
    }

    let plot = Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label(chart.x_label.as_str())
        .y_axis_label(chart.y_label.as_str())
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false);

    match chart.kind {
        ChartKind::Bar => bar_plot(ui, plot, chart, false),
        ChartKind::HorizontalBar => bar_plot(ui, plot, chart, true),
        ChartKind::Line => line_plot(ui, plot, chart),
        ChartKind::Histogram => histogram_plot(ui, plot, chart),
    }
}

/// Axis formatter that prints category labels at integer positions.
fn category_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let v = mark.value;
        if v < 0.0 || (v - v.round()).abs() > 1e-6 {
            return String::new();
        }
        labels.get(v.round() as usize).cloned().unwrap_or_default()
    }
}

fn bar_plot(ui: &mut Ui, plot: Plot, chart: &Chart, horizontal: bool) {
    let n_series = chart.series.len().max(1);
    let width = 0.8 / n_series as f64;
    let single = n_series == 1;
    let colors = ColorMap::new(&chart.labels);
    let series_colors = generate_palette(n_series);

    let plot = if horizontal {
        plot.y_axis_formatter(category_formatter(chart.labels.clone()))
    } else {
        plot.x_axis_formatter(category_formatter(chart.labels.clone()))
    };
    let plot = if single { plot } else { plot.legend(Legend::default()) };

    plot.show(ui, |plot_ui| {
        for (si, series) in chart.series.iter().enumerate() {
            let offset = (si as f64 - (n_series as f64 - 1.0) / 2.0) * width;
            let bars: Vec<Bar> = chart
                .labels
                .iter()
                .zip(&series.values)
                .enumerate()
                .filter(|(_, (_, v))| v.is_finite())
                .map(|(i, (label, &v))| {
                    let fill = if single {
                        colors.color_for(label)
                    } else {
                        series_colors[si]
                    };
                    Bar::new(i as f64 + offset, v).width(width).name(label).fill(fill)
                })
                .collect();
            let mut bar_chart = BarChart::new(bars).name(&series.name);
            if horizontal {
                bar_chart = bar_chart.horizontal();
            }
            plot_ui.bar_chart(bar_chart);
        }
    });
}

fn line_plot(ui: &mut Ui, plot: Plot, chart: &Chart) {
    plot.x_axis_formatter(category_formatter(chart.labels.clone()))
        .show(ui, |plot_ui| {
            for series in &chart.series {
                let points: PlotPoints = series
                    .values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.is_finite())
                    .map(|(i, &v)| [i as f64, v])
                    .collect();
                plot_ui.line(
                    Line::new(points)
                        .name(&series.name)
                        .color(Color32::LIGHT_BLUE)
                        .width(1.5),
                );
            }
        });
}

fn histogram_plot(ui: &mut Ui, plot: Plot, chart: &Chart) {
    let samples = chart.series.first().map(|s| s.values.as_slice()).unwrap_or(&[]);
    let Some(hist) = histogram_bins(samples) else {
        ui.label("No finite values in this column.");
        return;
    };
    let bars: Vec<Bar> = hist
        .counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let center = hist.start + (i as f64 + 0.5) * hist.bin_width;
            Bar::new(center, count as f64).width(hist.bin_width)
        })
        .collect();
    plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE));
    });
}

// ---------------------------------------------------------------------------
// Histogram binning
// ---------------------------------------------------------------------------

/// Equal-width bins over the finite samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub start: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

/// Bin `samples`, ignoring `NaN`/infinite values.
///
/// Uses √n bins (at most 50). Returns `None` when nothing is finite.
pub fn histogram_bins(samples: &[f64]) -> Option<Histogram> {
    let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let n_bins = ((finite.len() as f64).sqrt().ceil() as usize).clamp(1, 50);
    let range = max - min;
    if range <= f64::EPSILON {
        return Some(Histogram {
            start: min - 0.5,
            bin_width: 1.0,
            counts: vec![finite.len()],
        });
    }
    let bin_width = range / n_bins as f64;
    let mut counts = vec![0usize; n_bins];
    for v in finite {
        let idx = (((v - min) / bin_width) as usize).min(n_bins - 1);
        counts[idx] += 1;
    }
    Some(Histogram {
        start: min,
        bin_width,
        counts,
    })
}
