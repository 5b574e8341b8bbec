use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use super::model::{Column, FlightDelayRecord, FlightDelayTable};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the flight delay table from a CSV file.
///
/// The header row must contain every column in [`Column::ALL`] (extra columns
/// are ignored). Empty numeric cells become `NaN`, empty categorical cells
/// become `None`; nothing is imputed or deduplicated.
pub fn load_file(path: &Path) -> Result<FlightDelayTable> {
    let file = File::open(path).map_err(|source| DashboardError::DataUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let table = load_reader(file).map_err(|e| match e {
        // Read failures mid-file surface through csv; keep the path attached.
        DashboardError::Csv(err) if err.is_io_error() => DashboardError::DataUnavailable {
            path: path.to_path_buf(),
            source: std::io::Error::other(err),
        },
        other => other,
    })?;
    log::info!("Loaded {} records from {}", table.len(), path.display());
    Ok(table)
}

/// Load the flight delay table from any CSV byte stream.
pub fn load_reader<R: Read>(source: R) -> Result<FlightDelayTable> {
    let mut reader = csv::Reader::from_reader(source);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let positions = ColumnPositions::resolve(&headers)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let raw = result?;
        records.push(positions.parse_row(&raw, row_no));
    }

    log::debug!("Parsed {} CSV rows", records.len());
    Ok(FlightDelayTable::from_records(records))
}

// ---------------------------------------------------------------------------
// Header resolution
// ---------------------------------------------------------------------------

/// Index of every required column within the CSV header.
struct ColumnPositions {
    index: Vec<(Column, usize)>,
}

impl ColumnPositions {
    fn resolve(headers: &[String]) -> Result<Self> {
        let index = Column::ALL
            .into_iter()
            .map(|col| {
                headers
                    .iter()
                    .position(|h| h == col.header())
                    .map(|i| (col, i))
                    .ok_or_else(|| DashboardError::SchemaError(col.header().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { index })
    }

    /// Build one record. A cell that cannot be read as its column's type is
    /// treated as missing and logged; it never rejects the row.
    fn parse_row(&self, raw: &csv::StringRecord, row: usize) -> FlightDelayRecord {
        let mut rec = FlightDelayRecord::default();
        for &(col, idx) in &self.index {
            let cell = raw.get(idx).unwrap_or("").trim();
            let unreadable = || {
                log::warn!(
                    "Row {row}, column '{}': cannot interpret '{cell}', treating as missing",
                    col.header()
                );
            };
            match col {
                Column::Year => rec.year = parse_integer(cell).unwrap_or_else(|| {
                    unreadable();
                    None
                }),
                Column::Date => rec.date = parse_date(cell).unwrap_or_else(|| {
                    unreadable();
                    None
                }),
                Column::MonthName => rec.month_name = parse_text(cell),
                Column::CarrierName => rec.carrier_name = parse_text(cell),
                Column::AirportName => rec.airport_name = parse_text(cell),
                Column::Season => rec.season = parse_text(cell),
                measure => {
                    let value = parse_number(cell).unwrap_or_else(|| {
                        unreadable();
                        f64::NAN
                    });
                    if let Some(slot) = measure_mut(&mut rec, measure) {
                        *slot = value;
                    }
                }
            }
        }
        rec
    }
}

/// Storage slot of a measure column; `None` for the categorical ones.
fn measure_mut(rec: &mut FlightDelayRecord, column: Column) -> Option<&mut f64> {
    let slot = match column {
        Column::ArrFlights => &mut rec.arr_flights,
        Column::ArrDel15 => &mut rec.arr_del15,
        Column::ArrCancelled => &mut rec.arr_cancelled,
        Column::ArrDiverted => &mut rec.arr_diverted,
        Column::CarrierDelay => &mut rec.carrier_delay,
        Column::WeatherDelay => &mut rec.weather_delay,
        Column::NasDelay => &mut rec.nas_delay,
        Column::SecurityDelay => &mut rec.security_delay,
        Column::LateAircraftDelay => &mut rec.late_aircraft_delay,
        Column::CarrierCt => &mut rec.carrier_ct,
        Column::WeatherCt => &mut rec.weather_ct,
        Column::NasCt => &mut rec.nas_ct,
        Column::SecurityCt => &mut rec.security_ct,
        Column::LateAircraftCt => &mut rec.late_aircraft_ct,
        Column::ArrDelay => &mut rec.arr_delay,
        Column::Year
        | Column::MonthName
        | Column::Date
        | Column::CarrierName
        | Column::AirportName
        | Column::Season => return None,
    };
    Some(slot)
}

// ---------------------------------------------------------------------------
// Cell parsers
//
// Outer `Option` = parse success, inner `Option` = present vs. missing.
// ---------------------------------------------------------------------------

fn is_missing(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("nan") || s == "NA"
}

fn parse_text(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn parse_number(s: &str) -> Option<f64> {
    if is_missing(s) {
        return Some(f64::NAN);
    }
    s.parse::<f64>().ok()
}

fn parse_integer(s: &str) -> Option<Option<i64>> {
    if is_missing(s) {
        return Some(None);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Some(i));
    }
    // Integer columns that held a NaN are often exported as floats ("2019.0").
    match s.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 => Some(Some(f as i64)),
        _ => None,
    }
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

fn parse_date(s: &str) -> Option<Option<NaiveDate>> {
    if s.is_empty() {
        return Some(None);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .map(Some)
}
