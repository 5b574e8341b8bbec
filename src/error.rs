use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between reading the CSV and producing a chart.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// The data file could not be opened or read.
    #[error("Data unavailable at {path}: {source}")]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required column is missing from the header row.
    #[error("Schema error: required column '{0}' is missing")]
    SchemaError(String),

    /// Malformed CSV (bad quoting, ragged rows, invalid UTF-8).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A column name that is not part of the dataset.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Grouping was requested on a purely numeric column.
    #[error("Column '{0}' cannot be used as a group key")]
    NotCategorical(String),

    /// A reduction was requested on a non-numeric column.
    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    /// The sort column must be one of the aggregated value columns.
    #[error("Cannot sort by '{0}': it is not one of the aggregated columns")]
    SortColumnNotAggregated(String),

    /// Serializing the dashboard failed.
    #[error("Export failed: {0}")]
    Export(#[from] serde_json::Error),

    /// The exported summary could not be written.
    #[error("Failed to write {path}: {source}")]
    ExportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Export was requested before any data loaded.
    #[error("Nothing to export: no data loaded")]
    NoDashboard,
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_data_unavailable() {
        let err = DashboardError::DataUnavailable {
            path: PathBuf::from("/data/Flight_Delay.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/Flight_Delay.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_schema() {
        let err = DashboardError::SchemaError("arr_delay".to_string());
        assert_eq!(
            err.to_string(),
            "Schema error: required column 'arr_delay' is missing"
        );
    }

    #[test]
    fn test_error_display_unknown_column() {
        let err = DashboardError::UnknownColumn("gate".to_string());
        assert_eq!(err.to_string(), "Unknown column: gate");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops}").unwrap_err();
        let err: DashboardError = json_err.into();
        assert!(err.to_string().starts_with("Export failed"));
    }
}
