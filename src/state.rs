use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dashboard::{self, Dashboard, DashboardOptions};
use crate::data::filter::{Dimension, FilterSet};
use crate::data::loader;
use crate::data::model::{Column, FlightDelayTable, GroupKey};
use crate::error::{DashboardError, Result};
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// One session's UI state, independent of rendering.
///
/// The table is shared read-only; everything else belongs to this session.
pub struct AppState {
    /// Loaded table (None until a file loads successfully).
    pub table: Option<Arc<FlightDelayTable>>,

    /// Where the table came from.
    pub source: Option<PathBuf>,

    /// Selections and their filtered views.
    pub filters: Option<FilterSet>,

    /// Delay cause / histogram column dropdowns.
    pub options: DashboardOptions,

    /// Every panel, rebuilt after each change.
    pub dashboard: Option<Dashboard>,

    /// Index of the visible tab.
    pub active_tab: usize,

    /// "Show data" checkbox.
    pub show_data: bool,

    /// How many raw rows "Show data" reveals.
    pub preview_rows: usize,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            table: None,
            source: None,
            filters: None,
            options: DashboardOptions::default(),
            dashboard: None,
            active_tab: 0,
            show_data: false,
            preview_rows: 10,
            status_message: None,
        }
    }
}

impl AppState {
    /// State configured from the command line, with the data file loaded.
    ///
    /// A load failure is kept as the status message rather than returned, so
    /// the window can still open and offer File → Open….
    pub fn from_settings(settings: &Settings) -> Self {
        let mut state = AppState {
            options: DashboardOptions {
                delay_cause: settings.delay_cause,
                histogram_column: settings.histogram,
            },
            preview_rows: settings.preview_rows,
            ..Default::default()
        };
        if state.load(&settings.data).is_ok() {
            state.apply_selections(settings);
        }
        state
    }

    /// Load a CSV file and make it the current table.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        match loader::load_file(path) {
            Ok(table) => {
                self.set_table(Arc::new(table), Some(path.to_path_buf()))?;
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Ingest a table, reset the filters to their first options and rebuild.
    pub fn set_table(&mut self, table: Arc<FlightDelayTable>, source: Option<PathBuf>) -> Result<()> {
        let filters = FilterSet::new(&table)?;
        self.table = Some(table);
        self.filters = Some(filters);
        self.source = source;
        self.status_message = None;
        self.refresh();
        Ok(())
    }

    /// Apply `--year`/`--carrier`/`--airport`/`--month`.
    pub fn apply_selections(&mut self, settings: &Settings) {
        let (Some(table), Some(filters)) = (&self.table, &mut self.filters) else {
            return;
        };
        for (dim, label) in settings.selections() {
            if !filters.update_by_label(table, dim, label) {
                log::warn!("No {dim} named '{label}'; keeping the first option");
            }
        }
        self.refresh();
    }

    /// Change one filter dimension.
    pub fn select(&mut self, dim: Dimension, value: GroupKey) {
        let (Some(table), Some(filters)) = (&self.table, &mut self.filters) else {
            return;
        };
        log::info!("Selected {dim}: {value}");
        filters.update(table, dim, value);
        self.refresh();
    }

    pub fn set_delay_cause(&mut self, column: Column) {
        self.options.delay_cause = column;
        self.refresh();
    }

    pub fn set_histogram_column(&mut self, column: Column) {
        self.options.histogram_column = column;
        self.refresh();
    }

    /// Write the current dashboard as pretty JSON.
    pub fn export(&self, path: &Path) -> Result<()> {
        let dash = self.dashboard.as_ref().ok_or(DashboardError::NoDashboard)?;
        let json = dash.to_json()?;
        std::fs::write(path, json).map_err(|source| DashboardError::ExportWrite {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Exported dashboard to {}", path.display());
        Ok(())
    }

    /// Re-run every panel's aggregation.
    ///
    /// Failures are surfaced in the status bar; the previous dashboard is
    /// dropped so stale charts are never shown.
    pub fn refresh(&mut self) {
        let (Some(table), Some(filters)) = (&self.table, &self.filters) else {
            self.dashboard = None;
            return;
        };
        match dashboard::build(table, filters, &self.options) {
            Ok(dash) => {
                self.dashboard = Some(dash);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to build dashboard: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.dashboard = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;
    use crate::data::filter::FilterSelection;

    const CSV: &str = "\
year,month name,date,carrier_name,airport_name,season,arr_flights,arr_del15,carrier_ct,weather_ct,nas_ct,security_ct,late_aircraft_ct,arr_cancelled,arr_diverted,arr_delay,carrier_delay,weather_delay,nas_delay,security_delay,late_aircraft_delay
2019,January,2019-01-01,Delta,ATL,Winter,10,2,1,0,1,0,0,0,0,40,20,0,10,0,10
2020,January,2020-01-01,United,ORD,Winter,20,4,2,1,1,0,0,1,0,80,30,10,20,0,20
2020,February,2020-02-01,Delta,ORD,Winter,30,6,3,1,2,0,0,0,1,90,40,10,20,0,20
";

    fn write_csv() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_builds_dashboard() {
        let file = write_csv();
        let mut state = AppState::default();
        state.load(file.path()).unwrap();
        assert_eq!(state.table.as_ref().unwrap().len(), 3);
        assert!(state.dashboard.is_some());
        assert!(state.status_message.is_none());
        assert_eq!(
            state.filters.as_ref().unwrap().selected(Dimension::Year),
            Some(&GroupKey::Integer(2019))
        );
    }

    #[test]
    fn test_load_failure_sets_status() {
        let mut state = AppState::default();
        assert!(state.load(Path::new("/nope/Flight_Delay.csv")).is_err());
        assert!(state.status_message.unwrap().contains("Data unavailable"));
        assert!(state.dashboard.is_none());
    }

    #[test]
    fn test_select_rebuilds_dashboard() {
        let file = write_csv();
        let mut state = AppState::default();
        state.load(file.path()).unwrap();
        state.select(Dimension::Year, GroupKey::Integer(2020));
        let dash = state.dashboard.as_ref().unwrap();
        assert_eq!(dash.selection.year, Some(GroupKey::Integer(2020)));
        assert!(dash.charts().any(|c| c.title == "Flight Delays in 2020"));
    }

    #[test]
    fn test_from_settings_applies_selections() {
        let file = write_csv();
        let path = file.path().to_string_lossy().to_string();
        let settings = Settings::try_parse_from([
            "flight-delays",
            path.as_str(),
            "--carrier",
            "United",
            "--airport",
            "JFK",
            "--preview-rows",
            "2",
        ])
        .unwrap();
        let state = AppState::from_settings(&settings);
        let selection: &FilterSelection = state.filters.as_ref().unwrap().selection();
        assert_eq!(selection.carrier, Some(GroupKey::from("United")));
        // Unknown airport falls back to the first option.
        assert_eq!(selection.airport, Some(GroupKey::from("ATL")));
        assert_eq!(state.preview_rows, 2);
    }

    #[test]
    fn test_export_writes_json() {
        let file = write_csv();
        let mut state = AppState::default();
        state.load(file.path()).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("dashboard.json");
        state.export(&out).unwrap();
        let json = std::fs::read_to_string(&out).unwrap();
        assert!(json.contains("Flight Delay Causes"));
    }

    #[test]
    fn test_export_without_data_fails() {
        let state = AppState::default();
        let err = state.export(Path::new("/tmp/never.json")).unwrap_err();
        assert!(matches!(err, DashboardError::NoDashboard));
    }

    #[test]
    fn test_option_changes_rebuild() {
        let file = write_csv();
        let mut state = AppState::default();
        state.load(file.path()).unwrap();
        state.set_histogram_column(Column::ArrDelay);
        state.set_delay_cause(Column::NasDelay);
        let dash = state.dashboard.as_ref().unwrap();
        assert!(dash.charts().any(|c| c.title == "Distribution of arr_delay"));
        assert!(dash.charts().any(|c| c.y_label == "nas_delay"));
    }

    #[test]
    fn test_successful_refresh_clears_stale_error() {
        let file = write_csv();
        let mut state = AppState::default();
        state.load(file.path()).unwrap();
        state.status_message = Some("Error: export failed".to_string());
        state.select(Dimension::Carrier, GroupKey::from("United"));
        assert!(state.dashboard.is_some());
        assert!(state.status_message.is_none());
    }
}
