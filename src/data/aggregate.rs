use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use super::model::{Column, GroupKey, View};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Reducers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reducer {
    Mean,
    Sum,
}

/// Running sum/count that ignores `NaN`.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        if !value.is_nan() {
            self.sum += value;
            self.count += 1;
        }
    }

    /// `NaN` when no non-`NaN` value was seen, for either reducer.
    fn finish(&self, reducer: Reducer) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        match reducer {
            Reducer::Sum => self.sum,
            Reducer::Mean => self.sum / self.count as f64,
        }
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A grouped reduction: group by one column, reduce one or more others,
/// optionally keep only the top-N by one of the reduced columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    pub group_by: Column,
    pub values: Vec<Column>,
    pub reducer: Reducer,
    pub sort_descending_by: Option<Column>,
    pub limit: Option<usize>,
}

impl AggregateQuery {
    pub fn new(group_by: Column, values: &[Column], reducer: Reducer) -> Self {
        Self {
            group_by,
            values: values.to_vec(),
            reducer,
            sort_descending_by: None,
            limit: None,
        }
    }

    pub fn mean(group_by: Column, values: &[Column]) -> Self {
        Self::new(group_by, values, Reducer::Mean)
    }

    pub fn sum(group_by: Column, values: &[Column]) -> Self {
        Self::new(group_by, values, Reducer::Sum)
    }

    pub fn sort_descending_by(mut self, column: Column) -> Self {
        self.sort_descending_by = Some(column);
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    fn validate(&self) -> Result<Option<usize>> {
        if !self.group_by.is_categorical() {
            return Err(DashboardError::NotCategorical(self.group_by.header().to_string()));
        }
        if let Some(col) = self.values.iter().find(|c| !c.is_numeric()) {
            return Err(DashboardError::NotNumeric(col.header().to_string()));
        }
        self.sort_descending_by
            .map(|sort| {
                self.values
                    .iter()
                    .position(|&c| c == sort)
                    .ok_or_else(|| DashboardError::SortColumnNotAggregated(sort.header().to_string()))
            })
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// One group: its key and one reduced value per query value column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: GroupKey,
    pub values: Vec<f64>,
}

/// Ordered groups produced by [`aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub group_by: Column,
    pub value_columns: Vec<Column>,
    pub rows: Vec<GroupRow>,
}

impl AggregationResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.rows.iter().map(|r| &r.key)
    }

    /// The reduced values of `column`, in row order.
    pub fn values_of(&self, column: Column) -> Option<Vec<f64>> {
        let idx = self.value_columns.iter().position(|&c| c == column)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Rows reordered by ascending key (chronological for dates).
    pub fn sorted_by_key(mut self) -> Self {
        self.rows.sort_by(|a, b| a.key.cmp(&b.key));
        self
    }
}

/// Descending order with `NaN` last.
fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Group `view` by `query.group_by` and reduce each value column per group.
///
/// Groups keep first-encounter order unless a sort column is given; the sort
/// is stable, so ties keep encounter order. Rows with a missing group key are
/// skipped. An empty view gives an empty result.
pub fn aggregate(view: View<'_>, query: &AggregateQuery) -> Result<AggregationResult> {
    let sort_idx = query.validate()?;

    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(GroupKey, Vec<Accumulator>)> = Vec::new();

    for rec in view.iter() {
        let Some(key) = rec.key(query.group_by) else {
            continue;
        };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, vec![Accumulator::default(); query.values.len()]));
            groups.len() - 1
        });
        let accs = &mut groups[slot].1;
        for (acc, &col) in accs.iter_mut().zip(&query.values) {
            acc.push(rec.number(col));
        }
    }

    let mut rows: Vec<GroupRow> = groups
        .into_iter()
        .map(|(key, accs)| GroupRow {
            key,
            values: accs.iter().map(|a| a.finish(query.reducer)).collect(),
        })
        .collect();

    if let Some(i) = sort_idx {
        rows.sort_by(|a, b| descending_nan_last(a.values[i], b.values[i]));
    }
    if let Some(n) = query.limit {
        rows.truncate(n);
    }

    Ok(AggregationResult {
        group_by: query.group_by,
        value_columns: query.values.clone(),
        rows,
    })
}

/// A single reduced value for one column (no grouping).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: Column,
    pub value: f64,
}

/// Reduce each of `columns` over the whole view.
pub fn summarize(view: View<'_>, columns: &[Column], reducer: Reducer) -> Result<Vec<ColumnSummary>> {
    if let Some(col) = columns.iter().find(|c| !c.is_numeric()) {
        return Err(DashboardError::NotNumeric(col.header().to_string()));
    }
    let mut accs = vec![Accumulator::default(); columns.len()];
    for rec in view.iter() {
        for (acc, &col) in accs.iter_mut().zip(columns) {
            acc.push(rec.number(col));
        }
    }
    Ok(columns
        .iter()
        .zip(&accs)
        .map(|(&column, acc)| ColumnSummary {
            column,
            value: acc.finish(reducer),
        })
        .collect())
}

/// Every value of a numeric column in view order, `NaN` included.
pub fn column_values(view: View<'_>, column: Column) -> Result<Vec<f64>> {
    if !column.is_numeric() {
        return Err(DashboardError::NotNumeric(column.header().to_string()));
    }
    Ok(view.iter().map(|rec| rec.number(column)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::select;
    use crate::data::model::{FlightDelayRecord, FlightDelayTable};

    fn airport_row(airport: &str, arr_delay: f64, carrier_delay: f64) -> FlightDelayRecord {
        FlightDelayRecord {
            airport_name: Some(airport.to_string()),
            arr_delay,
            carrier_delay,
            ..Default::default()
        }
    }

    #[test]
    fn test_mean_skips_nan() {
        let table = FlightDelayTable::from_records(vec![
            airport_row("ATL", 0.0, 10.0),
            airport_row("ATL", 0.0, f64::NAN),
            airport_row("ATL", 0.0, 20.0),
        ]);
        let query = AggregateQuery::mean(Column::AirportName, &[Column::CarrierDelay]);
        let result = aggregate(table.view(), &query).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows[0].values, vec![15.0]);
    }

    #[test]
    fn test_all_nan_group_is_nan_and_sorts_last() {
        let table = FlightDelayTable::from_records(vec![
            airport_row("NaNville", f64::NAN, 0.0),
            airport_row("ATL", 3.0, 0.0),
            airport_row("ORD", 7.0, 0.0),
        ]);
        for reducer in [Reducer::Mean, Reducer::Sum] {
            let query = AggregateQuery::new(Column::AirportName, &[Column::ArrDelay], reducer)
                .sort_descending_by(Column::ArrDelay);
            let result = aggregate(table.view(), &query).unwrap();
            let keys: Vec<String> = result.keys().map(|k| k.to_string()).collect();
            assert_eq!(keys, vec!["ORD", "ATL", "NaNville"]);
            assert!(result.rows[2].values[0].is_nan());
        }
    }

    #[test]
    fn test_sort_and_limit_are_stable_for_ties() {
        let table = FlightDelayTable::from_records(vec![
            airport_row("A", 5.0, 0.0),
            airport_row("B", 20.0, 0.0),
            airport_row("C", 20.0, 0.0),
            airport_row("D", 1.0, 0.0),
        ]);
        let query = AggregateQuery::mean(Column::AirportName, &[Column::ArrDelay])
            .sort_descending_by(Column::ArrDelay)
            .limit(2);
        let result = aggregate(table.view(), &query).unwrap();
        let keys: Vec<String> = result.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["B", "C"]);
    }

    #[test]
    fn test_limit_without_sort_keeps_encounter_order() {
        let table = FlightDelayTable::from_records(vec![
            airport_row("Z", 1.0, 0.0),
            airport_row("A", 9.0, 0.0),
            airport_row("M", 5.0, 0.0),
        ]);
        let query = AggregateQuery::sum(Column::AirportName, &[Column::ArrDelay]).limit(2);
        let result = aggregate(table.view(), &query).unwrap();
        let keys: Vec<String> = result.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["Z", "A"]);
    }

    #[test]
    fn test_multiple_value_columns() {
        let table = FlightDelayTable::from_records(vec![
            airport_row("ATL", 10.0, 4.0),
            airport_row("ATL", 20.0, 6.0),
        ]);
        let query = AggregateQuery::mean(Column::AirportName, &[Column::ArrDelay, Column::CarrierDelay]);
        let result = aggregate(table.view(), &query).unwrap();
        assert_eq!(result.values_of(Column::ArrDelay), Some(vec![15.0]));
        assert_eq!(result.values_of(Column::CarrierDelay), Some(vec![5.0]));
        assert_eq!(result.values_of(Column::WeatherDelay), None);
    }

    #[test]
    fn test_empty_view_gives_empty_result() {
        let table = FlightDelayTable::from_records(vec![airport_row("ATL", 1.0, 1.0)]);
        let empty = select(&table, Column::AirportName, &GroupKey::from("JFK"));
        for reducer in [Reducer::Mean, Reducer::Sum] {
            let query = AggregateQuery::new(Column::AirportName, &[Column::ArrDelay], reducer);
            let result = aggregate(empty.view(&table), &query).unwrap();
            assert!(result.is_empty());
        }
    }

    #[test]
    fn test_missing_group_key_is_skipped() {
        let mut orphan = airport_row("x", 100.0, 0.0);
        orphan.airport_name = None;
        let table = FlightDelayTable::from_records(vec![orphan, airport_row("ATL", 1.0, 0.0)]);
        let query = AggregateQuery::sum(Column::AirportName, &[Column::ArrDelay]);
        let result = aggregate(table.view(), &query).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows[0].values, vec![1.0]);
    }

    #[test]
    fn test_query_validation_errors() {
        let table = FlightDelayTable::default();
        let err = aggregate(
            table.view(),
            &AggregateQuery::mean(Column::ArrDelay, &[Column::CarrierDelay]),
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::NotCategorical(_)));

        let err = aggregate(
            table.view(),
            &AggregateQuery::mean(Column::Season, &[Column::CarrierName]),
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::NotNumeric(_)));

        let err = aggregate(
            table.view(),
            &AggregateQuery::mean(Column::Season, &[Column::ArrDelay])
                .sort_descending_by(Column::WeatherDelay),
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::SortColumnNotAggregated(_)));
    }

    #[test]
    fn test_summarize_and_column_values() {
        let table = FlightDelayTable::from_records(vec![
            airport_row("ATL", 10.0, 1.0),
            airport_row("ORD", f64::NAN, 3.0),
        ]);
        let sums = summarize(table.view(), &[Column::ArrDelay, Column::CarrierDelay], Reducer::Sum)
            .unwrap();
        assert_eq!(sums[0].column, Column::ArrDelay);
        assert_eq!(sums[0].value, 10.0);
        assert_eq!(sums[1].value, 4.0);

        let means = summarize(table.view(), &[Column::CarrierDelay], Reducer::Mean).unwrap();
        assert_eq!(means[0].value, 2.0);

        let raw = column_values(table.view(), Column::ArrDelay).unwrap();
        assert_eq!(raw.len(), 2);
        assert!(raw[1].is_nan());
        assert!(column_values(table.view(), Column::Season).is_err());
    }

    #[test]
    fn test_sorted_by_key() {
        let table = FlightDelayTable::from_records(vec![
            airport_row("ORD", 1.0, 0.0),
            airport_row("ATL", 2.0, 0.0),
        ]);
        let result = aggregate(
            table.view(),
            &AggregateQuery::sum(Column::AirportName, &[Column::ArrDelay]),
        )
        .unwrap()
        .sorted_by_key();
        let keys: Vec<String> = result.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["ATL", "ORD"]);
    }
}
