use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// GroupKey – a single categorical cell
// ---------------------------------------------------------------------------

/// The value of a categorical cell, usable as a group key or filter value.
///
/// Derived `Ord` compares variants first, then values: integers numerically,
/// text lexically, dates chronologically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Integer(i64),
    Text(String),
    Date(NaiveDate),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Integer(i) => write!(f, "{i}"),
            GroupKey::Text(s) => write!(f, "{s}"),
            GroupKey::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey::Text(s.to_string())
    }
}

impl From<i64> for GroupKey {
    fn from(i: i64) -> Self {
        GroupKey::Integer(i)
    }
}

// ---------------------------------------------------------------------------
// Column – the closed set of dataset columns
// ---------------------------------------------------------------------------

/// Every column the dashboard reads from the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "&'static str")]
pub enum Column {
    Year,
    MonthName,
    Date,
    CarrierName,
    AirportName,
    Season,
    ArrFlights,
    ArrDel15,
    ArrCancelled,
    ArrDiverted,
    CarrierDelay,
    WeatherDelay,
    NasDelay,
    SecurityDelay,
    LateAircraftDelay,
    CarrierCt,
    WeatherCt,
    NasCt,
    SecurityCt,
    LateAircraftCt,
    ArrDelay,
}

impl Column {
    /// All required columns, in the order they are checked against the header.
    pub const ALL: [Column; 21] = [
        Column::Year,
        Column::MonthName,
        Column::Date,
        Column::CarrierName,
        Column::AirportName,
        Column::Season,
        Column::ArrFlights,
        Column::ArrDel15,
        Column::ArrCancelled,
        Column::ArrDiverted,
        Column::CarrierDelay,
        Column::WeatherDelay,
        Column::NasDelay,
        Column::SecurityDelay,
        Column::LateAircraftDelay,
        Column::CarrierCt,
        Column::WeatherCt,
        Column::NasCt,
        Column::SecurityCt,
        Column::LateAircraftCt,
        Column::ArrDelay,
    ];

    /// Delay minutes attributed to each cause.
    pub const DELAY_CAUSE_MINUTES: [Column; 5] = [
        Column::CarrierDelay,
        Column::WeatherDelay,
        Column::NasDelay,
        Column::SecurityDelay,
        Column::LateAircraftDelay,
    ];

    /// Number of delays attributed to each cause.
    pub const DELAY_CAUSE_COUNTS: [Column; 5] = [
        Column::CarrierCt,
        Column::WeatherCt,
        Column::NasCt,
        Column::SecurityCt,
        Column::LateAircraftCt,
    ];

    /// Arrival flight counters.
    pub const FLIGHT_COUNTS: [Column; 4] = [
        Column::ArrFlights,
        Column::ArrDel15,
        Column::ArrCancelled,
        Column::ArrDiverted,
    ];

    /// Header name as it appears in the CSV file.
    pub fn header(self) -> &'static str {
        match self {
            Column::Year => "year",
            Column::MonthName => "month name",
            Column::Date => "date",
            Column::CarrierName => "carrier_name",
            Column::AirportName => "airport_name",
            Column::Season => "season",
            Column::ArrFlights => "arr_flights",
            Column::ArrDel15 => "arr_del15",
            Column::ArrCancelled => "arr_cancelled",
            Column::ArrDiverted => "arr_diverted",
            Column::CarrierDelay => "carrier_delay",
            Column::WeatherDelay => "weather_delay",
            Column::NasDelay => "nas_delay",
            Column::SecurityDelay => "security_delay",
            Column::LateAircraftDelay => "late_aircraft_delay",
            Column::CarrierCt => "carrier_ct",
            Column::WeatherCt => "weather_ct",
            Column::NasCt => "nas_ct",
            Column::SecurityCt => "security_ct",
            Column::LateAircraftCt => "late_aircraft_ct",
            Column::ArrDelay => "arr_delay",
        }
    }

    /// Human-readable name for chart axes and dropdowns.
    pub fn label(self) -> &'static str {
        match self {
            Column::Year => "Year",
            Column::MonthName => "Month",
            Column::Date => "Date",
            Column::CarrierName => "Carrier",
            Column::AirportName => "Airport",
            Column::Season => "Season",
            Column::ArrFlights => "Arriving flights",
            Column::ArrDel15 => "Delayed 15+ min",
            Column::ArrCancelled => "Cancelled",
            Column::ArrDiverted => "Diverted",
            Column::CarrierDelay => "Carrier delay",
            Column::WeatherDelay => "Weather delay",
            Column::NasDelay => "NAS delay",
            Column::SecurityDelay => "Security delay",
            Column::LateAircraftDelay => "Late aircraft delay",
            Column::CarrierCt => "Carrier delays",
            Column::WeatherCt => "Weather delays",
            Column::NasCt => "NAS delays",
            Column::SecurityCt => "Security delays",
            Column::LateAircraftCt => "Late aircraft delays",
            Column::ArrDelay => "Arrival delay",
        }
    }

    /// Resolve a header name.
    pub fn from_header(name: &str) -> Result<Column> {
        Column::ALL
            .into_iter()
            .find(|c| c.header() == name)
            .ok_or_else(|| DashboardError::UnknownColumn(name.to_string()))
    }

    /// Whether the column can partition rows (used as a group key / filter).
    pub fn is_categorical(self) -> bool {
        matches!(
            self,
            Column::Year
                | Column::MonthName
                | Column::Date
                | Column::CarrierName
                | Column::AirportName
                | Column::Season
        )
    }

    /// Whether the column can be reduced with mean/sum.
    pub fn is_numeric(self) -> bool {
        self == Column::Year || !self.is_categorical()
    }

    /// Numeric columns in header order (histogram choices).
    pub fn numeric() -> impl Iterator<Item = Column> {
        Column::ALL.into_iter().filter(|c| c.is_numeric())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl From<Column> for &'static str {
    fn from(c: Column) -> Self {
        c.header()
    }
}

// ---------------------------------------------------------------------------
// FlightDelayRecord – one row of the CSV
// ---------------------------------------------------------------------------

/// Delay statistics for one (airport, carrier, year, month).
///
/// Numeric measures are `f64`; a missing cell is `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightDelayRecord {
    pub year: Option<i64>,
    pub month_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub carrier_name: Option<String>,
    pub airport_name: Option<String>,
    pub season: Option<String>,

    pub arr_flights: f64,
    pub arr_del15: f64,
    pub arr_cancelled: f64,
    pub arr_diverted: f64,

    pub carrier_delay: f64,
    pub weather_delay: f64,
    pub nas_delay: f64,
    pub security_delay: f64,
    pub late_aircraft_delay: f64,

    pub carrier_ct: f64,
    pub weather_ct: f64,
    pub nas_ct: f64,
    pub security_ct: f64,
    pub late_aircraft_ct: f64,

    pub arr_delay: f64,
}

impl Default for FlightDelayRecord {
    fn default() -> Self {
        Self {
            year: None,
            month_name: None,
            date: None,
            carrier_name: None,
            airport_name: None,
            season: None,
            arr_flights: f64::NAN,
            arr_del15: f64::NAN,
            arr_cancelled: f64::NAN,
            arr_diverted: f64::NAN,
            carrier_delay: f64::NAN,
            weather_delay: f64::NAN,
            nas_delay: f64::NAN,
            security_delay: f64::NAN,
            late_aircraft_delay: f64::NAN,
            carrier_ct: f64::NAN,
            weather_ct: f64::NAN,
            nas_ct: f64::NAN,
            security_ct: f64::NAN,
            late_aircraft_ct: f64::NAN,
            arr_delay: f64::NAN,
        }
    }
}

impl FlightDelayRecord {
    /// Categorical value of `column`; `None` when missing or not categorical.
    pub fn key(&self, column: Column) -> Option<GroupKey> {
        match column {
            Column::Year => self.year.map(GroupKey::Integer),
            Column::MonthName => self.month_name.as_deref().map(GroupKey::from),
            Column::Date => self.date.map(GroupKey::Date),
            Column::CarrierName => self.carrier_name.as_deref().map(GroupKey::from),
            Column::AirportName => self.airport_name.as_deref().map(GroupKey::from),
            Column::Season => self.season.as_deref().map(GroupKey::from),
            _ => None,
        }
    }

    /// Whether the categorical cell in `column` equals `value`.
    pub fn matches(&self, column: Column, value: &GroupKey) -> bool {
        match (column, value) {
            (Column::Year, GroupKey::Integer(y)) => self.year == Some(*y),
            (Column::Date, GroupKey::Date(d)) => self.date == Some(*d),
            (Column::MonthName, GroupKey::Text(s)) => self.month_name.as_deref() == Some(s),
            (Column::CarrierName, GroupKey::Text(s)) => self.carrier_name.as_deref() == Some(s),
            (Column::AirportName, GroupKey::Text(s)) => self.airport_name.as_deref() == Some(s),
            (Column::Season, GroupKey::Text(s)) => self.season.as_deref() == Some(s),
            _ => false,
        }
    }

    /// Numeric value of `column`; `NaN` when missing or not numeric.
    pub fn number(&self, column: Column) -> f64 {
        match column {
            Column::Year => self.year.map_or(f64::NAN, |y| y as f64),
            Column::ArrFlights => self.arr_flights,
            Column::ArrDel15 => self.arr_del15,
            Column::ArrCancelled => self.arr_cancelled,
            Column::ArrDiverted => self.arr_diverted,
            Column::CarrierDelay => self.carrier_delay,
            Column::WeatherDelay => self.weather_delay,
            Column::NasDelay => self.nas_delay,
            Column::SecurityDelay => self.security_delay,
            Column::LateAircraftDelay => self.late_aircraft_delay,
            Column::CarrierCt => self.carrier_ct,
            Column::WeatherCt => self.weather_ct,
            Column::NasCt => self.nas_ct,
            Column::SecurityCt => self.security_ct,
            Column::LateAircraftCt => self.late_aircraft_ct,
            Column::ArrDelay => self.arr_delay,
            Column::MonthName
            | Column::Date
            | Column::CarrierName
            | Column::AirportName
            | Column::Season => f64::NAN,
        }
    }

    /// Text shown for `column` in the raw data preview.
    pub fn display_cell(&self, column: Column) -> String {
        if column.is_categorical() {
            return self
                .key(column)
                .map(|k| k.to_string())
                .unwrap_or_default();
        }
        let v = self.number(column);
        if v.is_nan() {
            "NaN".to_string()
        } else {
            format!("{v}")
        }
    }
}

// ---------------------------------------------------------------------------
// FlightDelayTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All records in file order. Never mutated after load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightDelayTable {
    records: Vec<FlightDelayRecord>,
}

impl FlightDelayTable {
    pub fn from_records(records: Vec<FlightDelayRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[FlightDelayRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first `n` records (raw data preview).
    pub fn head(&self, n: usize) -> &[FlightDelayRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// A view over every record.
    pub fn view(&self) -> View<'_> {
        View {
            table: self,
            indices: None,
        }
    }
}

// ---------------------------------------------------------------------------
// View – borrowed row subset
// ---------------------------------------------------------------------------

/// Read-only window onto a table: either all rows or a subset of indices.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    table: &'a FlightDelayTable,
    indices: Option<&'a [usize]>,
}

impl<'a> View<'a> {
    pub(crate) fn subset(table: &'a FlightDelayTable, indices: &'a [usize]) -> Self {
        Self {
            table,
            indices: Some(indices),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.map_or(self.table.len(), <[usize]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records in table order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &'a FlightDelayRecord> + 'a> {
        let table: &'a FlightDelayTable = self.table;
        match self.indices {
            None => Box::new(table.records.iter()),
            Some(indices) => Box::new(indices.iter().map(move |&i| &table.records[i])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_header_round_trip() {
        for col in Column::ALL {
            assert_eq!(Column::from_header(col.header()).unwrap(), col);
        }
    }

    #[test]
    fn test_unknown_header() {
        let err = Column::from_header("gate").unwrap_err();
        assert!(matches!(err, DashboardError::UnknownColumn(name) if name == "gate"));
    }

    #[test]
    fn test_year_is_both_categorical_and_numeric() {
        assert!(Column::Year.is_categorical());
        assert!(Column::Year.is_numeric());
        assert!(!Column::CarrierName.is_numeric());
        assert!(!Column::ArrDelay.is_categorical());
        assert_eq!(Column::numeric().count(), 16);
    }

    #[test]
    fn test_group_key_ordering() {
        let jan = GroupKey::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        let feb = GroupKey::Date(NaiveDate::from_ymd_opt(2020, 2, 1).unwrap());
        assert!(jan < feb);
        assert!(GroupKey::Integer(2019) < GroupKey::Integer(2020));
        assert_eq!(feb.to_string(), "2020-02-01");
    }

    #[test]
    fn test_record_missing_values() {
        let rec = FlightDelayRecord {
            year: Some(2020),
            ..Default::default()
        };
        assert_eq!(rec.number(Column::Year), 2020.0);
        assert!(rec.number(Column::ArrDelay).is_nan());
        assert_eq!(rec.key(Column::CarrierName), None);
        assert_eq!(rec.display_cell(Column::ArrDelay), "NaN");
        assert!(rec.matches(Column::Year, &GroupKey::Integer(2020)));
        assert!(!rec.matches(Column::Year, &GroupKey::from("2020")));
    }

    #[test]
    fn test_view_subset_iterates_in_index_order() {
        let table = FlightDelayTable::from_records(
            (0..4)
                .map(|i| FlightDelayRecord {
                    year: Some(2000 + i),
                    ..Default::default()
                })
                .collect(),
        );
        let indices = vec![1, 3];
        let view = View::subset(&table, &indices);
        let years: Vec<_> = view.iter().map(|r| r.year.unwrap()).collect();
        assert_eq!(years, vec![2001, 2003]);
        assert_eq!(view.len(), 2);
        assert_eq!(table.view().len(), 4);
        assert_eq!(table.head(10).len(), 4);
    }
}
