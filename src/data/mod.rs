/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///   Flight_Delay.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse CSV → FlightDelayTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ FlightDelayTable  │  Vec<FlightDelayRecord>, immutable
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  one equality predicate per dimension → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group / mean|sum / sort / top-N → AggregationResult
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
