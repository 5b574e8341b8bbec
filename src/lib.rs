//! Airline delay cause analysis.
//!
//! The library holds everything that does not draw: CSV loading, the four
//! single-column filters, the aggregation engine and the fixed dashboard
//! panels. The `flight-delays` binary renders them with egui.

pub mod dashboard;
pub mod data;
pub mod error;
pub mod settings;
pub mod state;

pub use error::{DashboardError, Result};
