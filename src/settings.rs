use std::path::PathBuf;

use clap::Parser;

use crate::data::filter::Dimension;
use crate::data::model::Column;

/// Airline delay cause analysis dashboard
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flight-delays",
    about = "Airline delay cause analysis dashboard",
    version
)]
pub struct Settings {
    /// CSV file with one row per airport, carrier and month
    #[arg(env = "FLIGHT_DELAY_DATA", default_value = "Flight_Delay.csv")]
    pub data: PathBuf,

    /// Write the dashboard as JSON to this file and exit without a window
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Initial year selection
    #[arg(long)]
    pub year: Option<String>,

    /// Initial carrier selection
    #[arg(long)]
    pub carrier: Option<String>,

    /// Initial airport selection
    #[arg(long)]
    pub airport: Option<String>,

    /// Initial month selection
    #[arg(long)]
    pub month: Option<String>,

    /// Delay cause ranked in the airport chart
    #[arg(long, default_value = "carrier_delay", value_parser = parse_delay_cause)]
    pub delay_cause: Column,

    /// Numeric column shown in the histogram
    #[arg(long, default_value = "year", value_parser = parse_numeric_column)]
    pub histogram: Column,

    /// Raw rows shown by "Show data"
    #[arg(long, default_value = "10")]
    pub preview_rows: usize,
}

impl Settings {
    /// Initial selections given on the command line, by dimension.
    pub fn selections(&self) -> impl Iterator<Item = (Dimension, &str)> + '_ {
        [
            (Dimension::Year, self.year.as_deref()),
            (Dimension::Carrier, self.carrier.as_deref()),
            (Dimension::Airport, self.airport.as_deref()),
            (Dimension::Month, self.month.as_deref()),
        ]
        .into_iter()
        .filter_map(|(dim, label)| label.map(|l| (dim, l)))
    }
}

fn parse_delay_cause(s: &str) -> Result<Column, String> {
    let col = Column::from_header(s).map_err(|e| e.to_string())?;
    if Column::DELAY_CAUSE_MINUTES.contains(&col) {
        Ok(col)
    } else {
        Err(format!("'{s}' is not a delay cause column"))
    }
}

fn parse_numeric_column(s: &str) -> Result<Column, String> {
    let col = Column::from_header(s).map_err(|e| e.to_string())?;
    if col.is_numeric() {
        Ok(col)
    } else {
        Err(format!("'{s}' is not a numeric column"))
    }
}
