//! The fixed set of dashboard panels.
//!
//! Every panel is one named aggregation turned into a [`Chart`]: category
//! labels plus one or more value series, with titles and axis labels. Nothing
//! here knows how charts are drawn.

use serde::Serialize;

use crate::data::aggregate::{
    aggregate, column_values, summarize, AggregateQuery, AggregationResult, ColumnSummary, Reducer,
};
use crate::data::filter::{Dimension, FilterSelection, FilterSet};
use crate::data::model::{Column, FlightDelayTable, View};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Chart description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Line,
    Histogram,
}

/// A dropdown that drives which column a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartControl {
    DelayCause,
    HistogramColumn,
}

/// One named sequence of values, aligned with [`Chart::labels`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Category labels in display order. Empty for histograms.
    pub labels: Vec<String>,
    /// For histograms: a single series of raw samples.
    pub series: Vec<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<ChartControl>,
}

impl Chart {
    fn from_result(
        kind: ChartKind,
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        result: &AggregationResult,
    ) -> Self {
        let series = result
            .value_columns
            .iter()
            .enumerate()
            .map(|(i, col)| Series {
                name: col.header().to_string(),
                values: result.rows.iter().map(|r| r.values[i]).collect(),
            })
            .collect();
        Chart {
            kind,
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            labels: result.keys().map(|k| k.to_string()).collect(),
            series,
            control: None,
        }
    }

    fn from_summary(
        kind: ChartKind,
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        summary: &[ColumnSummary],
    ) -> Self {
        Chart {
            kind,
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            labels: summary.iter().map(|s| s.column.header().to_string()).collect(),
            series: vec![Series {
                name: "value".to_string(),
                values: summary.iter().map(|s| s.value).collect(),
            }],
            control: None,
        }
    }

    fn histogram(column: Column, samples: Vec<f64>) -> Self {
        Chart {
            kind: ChartKind::Histogram,
            title: format!("Distribution of {}", column.header()),
            x_label: column.header().to_string(),
            y_label: "count".to_string(),
            labels: Vec::new(),
            series: vec![Series {
                name: column.header().to_string(),
                values: samples,
            }],
            control: Some(ChartControl::HistogramColumn),
        }
    }

    /// `(label, value)` pairs of the first series, in display order.
    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        let values = self.series.first().map(|s| s.values.as_slice()).unwrap_or(&[]);
        self.labels.iter().map(String::as_str).zip(values.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.values.is_empty())
    }
}

/// A titled tab holding rows of one to three charts side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tab {
    pub title: String,
    pub rows: Vec<Vec<Chart>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub selection: FilterSelection,
    pub options: DashboardOptions,
    pub tabs: Vec<Tab>,
}

impl Dashboard {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn charts(&self) -> impl Iterator<Item = &Chart> {
        self.tabs.iter().flat_map(|t| t.rows.iter().flatten())
    }
}

/// Panel-local choices that are not filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardOptions {
    /// Delay-cause minute column ranked in "Top 10 Airports with Highest Delays".
    pub delay_cause: Column,
    /// Numeric column shown in the histogram.
    pub histogram_column: Column,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            delay_cause: Column::DELAY_CAUSE_MINUTES[0],
            histogram_column: Column::Year,
        }
    }
}

// ---------------------------------------------------------------------------
// Panel construction
// ---------------------------------------------------------------------------

const AVG_DELAY: &str = "Average Delay (minutes)";

fn selected_label(filters: &FilterSet, dim: Dimension) -> String {
    filters
        .selected(dim)
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn dimension_view<'a>(table: &'a FlightDelayTable, filters: &'a FilterSet, dim: Dimension) -> View<'a> {
    match filters.filtered(dim) {
        Some(filtered) => filtered.view(table),
        None => View::subset(table, &[]),
    }
}

fn top_by_arr_delay(
    table: &FlightDelayTable,
    group_by: Column,
    limit: Option<usize>,
    title: &str,
) -> Result<Chart> {
    let mut query = AggregateQuery::mean(group_by, &[Column::ArrDelay]).sort_descending_by(Column::ArrDelay);
    if let Some(n) = limit {
        query = query.limit(n);
    }
    let result = aggregate(table.view(), &query)?;
    Ok(Chart::from_result(ChartKind::Bar, title, group_by.label(), AVG_DELAY, &result))
}

fn top_causes(table: &FlightDelayTable, options: &DashboardOptions) -> Result<Tab> {
    let causes = summarize(table.view(), &Column::DELAY_CAUSE_MINUTES, Reducer::Mean)?;
    let causes = Chart::from_summary(
        ChartKind::Bar,
        "Flight Delay Causes",
        "Delay Cause",
        "Average Delays (minutes)",
        &causes,
    );

    let by_cause = aggregate(
        table.view(),
        &AggregateQuery::mean(Column::AirportName, &[options.delay_cause])
            .sort_descending_by(options.delay_cause)
            .limit(10),
    )?;
    let mut by_cause = Chart::from_result(
        ChartKind::Bar,
        "Top 10 Airports with Highest Delays",
        "Airport",
        options.delay_cause.header(),
        &by_cause,
    );
    by_cause.control = Some(ChartControl::DelayCause);

    Ok(Tab {
        title: "Top Causes".to_string(),
        rows: vec![
            vec![causes],
            vec![
                top_by_arr_delay(table, Column::Year, Some(10), "Top 10 years with Flight Delays")?,
                top_by_arr_delay(table, Column::CarrierName, Some(5), "Top 5 Carriers with Flight Delays")?,
            ],
            vec![
                top_by_arr_delay(table, Column::MonthName, Some(5), "Top 5 Months with Flight Delays")?,
                top_by_arr_delay(table, Column::Season, None, "Top Season with Flight Delays")?,
            ],
            vec![top_by_arr_delay(
                table,
                Column::AirportName,
                Some(10),
                "Top 10 Airports with Flight Delays",
            )?],
            vec![by_cause],
        ],
    })
}

fn delay_patterns(table: &FlightDelayTable, filters: &FilterSet) -> Result<Tab> {
    let year = selected_label(filters, Dimension::Year);
    let month = selected_label(filters, Dimension::Month);
    let carrier = selected_label(filters, Dimension::Carrier);

    let year_view = dimension_view(table, filters, Dimension::Year);

    // Encounter order follows the file, i.e. calendar order.
    let by_month = aggregate(year_view, &AggregateQuery::mean(Column::MonthName, &[Column::ArrDelay]))?;
    let by_month = Chart::from_result(
        ChartKind::Bar,
        format!("Flight Delays in {year}"),
        format!("Average Arrival Delay in {year}"),
        "Average Delay (minute)",
        &by_month,
    );

    let over_time = aggregate(
        dimension_view(table, filters, Dimension::Month),
        &AggregateQuery::sum(Column::Date, &[Column::ArrDelay]),
    )?
    .sorted_by_key();
    let over_time = Chart::from_result(
        ChartKind::Line,
        format!("Delay over the years in {month}"),
        "Date",
        "Delay (minute)",
        &over_time,
    );

    let by_carrier = aggregate(
        dimension_view(table, filters, Dimension::Carrier),
        &AggregateQuery::mean(Column::CarrierName, &[Column::ArrDelay, Column::CarrierDelay])
            .sort_descending_by(Column::ArrDelay),
    )?;
    let by_carrier = Chart::from_result(
        ChartKind::Bar,
        format!("Average Delays by {carrier}"),
        "Carrier",
        AVG_DELAY,
        &by_carrier,
    );

    let weather = aggregate(
        year_view,
        &AggregateQuery::mean(Column::AirportName, &[Column::ArrDelay, Column::WeatherDelay])
            .sort_descending_by(Column::ArrDelay)
            .limit(15),
    )?;
    let weather = Chart::from_result(
        ChartKind::Bar,
        format!("Airports Weather-Related Delays in {year}"),
        "Airport",
        AVG_DELAY,
        &weather,
    );

    Ok(Tab {
        title: "Delay Patterns".to_string(),
        rows: vec![vec![by_month, over_time], vec![by_carrier, weather]],
    })
}

/// Per-dimension sums of `columns`, two panels per row.
fn filtered_sums(
    table: &FlightDelayTable,
    filters: &FilterSet,
    columns: &[Column],
    titles: [&str; 4],
    y_label: &str,
) -> Result<Vec<Vec<Chart>>> {
    let mut charts = Vec::with_capacity(4);
    for (dim, title) in Dimension::ALL.into_iter().zip(titles) {
        let summary = summarize(dimension_view(table, filters, dim), columns, Reducer::Sum)?;
        let prefix = if dim == Dimension::Year { "in" } else { "for" };
        charts.push(Chart::from_summary(
            ChartKind::Bar,
            title,
            format!("{prefix} {}", selected_label(filters, dim)),
            y_label,
            &summary,
        ));
    }
    Ok(charts.chunks(2).map(<[Chart]>::to_vec).collect())
}

fn distributions(table: &FlightDelayTable, filters: &FilterSet, options: &DashboardOptions) -> Result<Tab> {
    let mut rows = Vec::new();

    let flights = summarize(table.view(), &Column::FLIGHT_COUNTS, Reducer::Sum)?;
    rows.push(vec![Chart::from_summary(
        ChartKind::HorizontalBar,
        "Flight Distribution",
        "Number of Flights",
        "Delay type",
        &flights,
    )]);
    rows.extend(filtered_sums(
        table,
        filters,
        &Column::FLIGHT_COUNTS,
        ["Yearly Flights", "Flights by Carrier", "Flights in Airport", "Monthly Flights"],
        "Number of Flights",
    )?);

    let causes = summarize(table.view(), &Column::DELAY_CAUSE_COUNTS, Reducer::Sum)?;
    rows.push(vec![Chart::from_summary(
        ChartKind::HorizontalBar,
        "Contribution of Each Cause to Total Delays",
        "Number of Delays",
        "Delay type",
        &causes,
    )]);
    rows.extend(filtered_sums(
        table,
        filters,
        &Column::DELAY_CAUSE_COUNTS,
        [
            "Yearly Delay Causes",
            "Delay Causes by Carrier",
            "Delay Causes For Airports",
            "Monthly Delay Causes",
        ],
        "Number of Delays",
    )?);

    let samples = column_values(table.view(), options.histogram_column)?;
    rows.push(vec![Chart::histogram(options.histogram_column, samples)]);

    Ok(Tab {
        title: "Distributions".to_string(),
        rows,
    })
}

/// Run every panel's aggregation against the table and current filters.
pub fn build(table: &FlightDelayTable, filters: &FilterSet, options: &DashboardOptions) -> Result<Dashboard> {
    Ok(Dashboard {
        selection: filters.selection().clone(),
        options: *options,
        tabs: vec![
            top_causes(table, options)?,
            delay_patterns(table, filters)?,
            distributions(table, filters, options)?,
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{FlightDelayRecord, GroupKey};

    fn rec(year: i64, month: &str, carrier: &str, airport: &str, arr_delay: f64) -> FlightDelayRecord {
        FlightDelayRecord {
            year: Some(year),
            month_name: Some(month.to_string()),
            carrier_name: Some(carrier.to_string()),
            airport_name: Some(airport.to_string()),
            season: Some("Winter".to_string()),
            date: chrono::NaiveDate::from_ymd_opt(year as i32, 1, 1),
            arr_flights: 10.0,
            arr_del15: 2.0,
            arr_cancelled: 0.0,
            arr_diverted: 1.0,
            carrier_delay: 5.0,
            weather_delay: 1.0,
            nas_delay: 2.0,
            security_delay: 0.0,
            late_aircraft_delay: 3.0,
            carrier_ct: 1.0,
            weather_ct: 0.5,
            nas_ct: 0.5,
            security_ct: 0.0,
            late_aircraft_ct: 1.0,
            arr_delay,
        }
    }

    fn sample() -> (FlightDelayTable, FilterSet) {
        let table = FlightDelayTable::from_records(vec![
            rec(2019, "January", "Delta", "ATL", 10.0),
            rec(2020, "January", "United", "ORD", 30.0),
            rec(2020, "February", "Delta", "ORD", 50.0),
        ]);
        let filters = FilterSet::new(&table).unwrap();
        (table, filters)
    }

    fn find<'a>(dash: &'a Dashboard, title: &str) -> &'a Chart {
        dash.charts()
            .find(|c| c.title == title)
            .unwrap_or_else(|| panic!("no chart titled {title}"))
    }

    #[test]
    fn test_build_has_three_tabs() {
        let (table, filters) = sample();
        let dash = build(&table, &filters, &DashboardOptions::default()).unwrap();
        let titles: Vec<&str> = dash.tabs.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Top Causes", "Delay Patterns", "Distributions"]);
        assert!(dash.tabs.iter().flat_map(|t| &t.rows).all(|r| (1..=3).contains(&r.len())));
    }

    #[test]
    fn test_top_carriers_sorted_descending() {
        let (table, filters) = sample();
        let dash = build(&table, &filters, &DashboardOptions::default()).unwrap();
        let chart = find(&dash, "Top 5 Carriers with Flight Delays");
        let points: Vec<(&str, f64)> = chart.points().collect();
        assert_eq!(points, vec![("Delta", 30.0), ("United", 30.0)]);
    }

    #[test]
    fn test_year_panel_uses_year_view() {
        let (table, mut filters) = sample();
        filters.update(&table, Dimension::Year, GroupKey::Integer(2020));
        let dash = build(&table, &filters, &DashboardOptions::default()).unwrap();
        let chart = find(&dash, "Flight Delays in 2020");
        let points: Vec<(&str, f64)> = chart.points().collect();
        assert_eq!(points, vec![("January", 30.0), ("February", 50.0)]);

        let flights = find(&dash, "Yearly Flights");
        assert_eq!(flights.x_label, "in 2020");
        assert_eq!(flights.series[0].values, vec![20.0, 4.0, 0.0, 2.0]);
    }

    #[test]
    fn test_carrier_panel_reports_arrival_and_carrier_delay() {
        let (table, filters) = sample();
        let dash = build(&table, &filters, &DashboardOptions::default()).unwrap();
        let chart = find(&dash, "Average Delays by Delta");
        assert_eq!(chart.labels, vec!["Delta"]);
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].values, vec![30.0]);
        assert_eq!(chart.series[1].values, vec![5.0]);
    }

    #[test]
    fn test_histogram_follows_option() {
        let (table, filters) = sample();
        let options = DashboardOptions {
            histogram_column: Column::ArrDelay,
            ..Default::default()
        };
        let dash = build(&table, &filters, &options).unwrap();
        let chart = find(&dash, "Distribution of arr_delay");
        assert_eq!(chart.kind, ChartKind::Histogram);
        assert_eq!(chart.series[0].values, vec![10.0, 30.0, 50.0]);
    }

    #[test]
    fn test_empty_table_builds_empty_charts() {
        let table = FlightDelayTable::default();
        let filters = FilterSet::new(&table).unwrap();
        let dash = build(&table, &filters, &DashboardOptions::default()).unwrap();
        assert!(find(&dash, "Top 10 Airports with Flight Delays").is_empty());
    }

    #[test]
    fn test_json_export_contains_titles() {
        let (table, filters) = sample();
        let dash = build(&table, &filters, &DashboardOptions::default()).unwrap();
        let json = dash.to_json().unwrap();
        for chart in dash.charts() {
            assert!(json.contains(&chart.title), "missing {}", chart.title);
        }
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["options"]["delay_cause"], "carrier_delay");
    }
}
