use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::model::{Column, FlightDelayTable, GroupKey, View};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Distinct values and single-column selection
// ---------------------------------------------------------------------------

/// Unique values of a categorical column in first-seen order.
///
/// Missing cells are skipped. These are the only values offered to the user,
/// so every selection made through them matches at least one row.
pub fn distinct_values(table: &FlightDelayTable, column: Column) -> Result<Vec<GroupKey>> {
    if !column.is_categorical() {
        return Err(DashboardError::NotCategorical(column.header().to_string()));
    }
    let mut seen = HashSet::new();
    Ok(table
        .records()
        .iter()
        .filter_map(|rec| rec.key(column))
        .filter(|key| seen.insert(key.clone()))
        .collect())
}

/// Rows matching one equality predicate, stored as indices into the table.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    indices: Vec<usize>,
}

impl FilteredView {
    /// Borrow the matching rows of `table`.
    ///
    /// `table` must be the table this view was selected from.
    pub fn view<'a>(&'a self, table: &'a FlightDelayTable) -> View<'a> {
        View::subset(table, &self.indices)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Select every row whose `column` equals `value`.
///
/// A value absent from the table yields an empty view, not an error.
pub fn select(table: &FlightDelayTable, column: Column, value: &GroupKey) -> FilteredView {
    let indices = table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| rec.matches(column, value))
        .map(|(i, _)| i)
        .collect();
    FilteredView { indices }
}

// ---------------------------------------------------------------------------
// The four filter dimensions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dimension {
    Year,
    Carrier,
    Airport,
    Month,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Year,
        Dimension::Carrier,
        Dimension::Airport,
        Dimension::Month,
    ];

    pub fn column(self) -> Column {
        match self {
            Dimension::Year => Column::Year,
            Dimension::Carrier => Column::CarrierName,
            Dimension::Airport => Column::AirportName,
            Dimension::Month => Column::MonthName,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column().label())
    }
}

/// The user's current choice for each dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSelection {
    pub year: Option<GroupKey>,
    pub carrier: Option<GroupKey>,
    pub airport: Option<GroupKey>,
    pub month: Option<GroupKey>,
}

impl FilterSelection {
    pub fn get(&self, dim: Dimension) -> Option<&GroupKey> {
        match dim {
            Dimension::Year => self.year.as_ref(),
            Dimension::Carrier => self.carrier.as_ref(),
            Dimension::Airport => self.airport.as_ref(),
            Dimension::Month => self.month.as_ref(),
        }
    }

    fn slot(&mut self, dim: Dimension) -> &mut Option<GroupKey> {
        match dim {
            Dimension::Year => &mut self.year,
            Dimension::Carrier => &mut self.carrier,
            Dimension::Airport => &mut self.airport,
            Dimension::Month => &mut self.month,
        }
    }
}

/// Options, current selection and filtered view for all four dimensions.
///
/// Views are independent: each reflects exactly one predicate, and changing
/// one dimension never recomputes the other three.
#[derive(Debug, Clone)]
pub struct FilterSet {
    options: [Vec<GroupKey>; 4],
    selection: FilterSelection,
    views: [Option<FilteredView>; 4],
}

fn slot_index(dim: Dimension) -> usize {
    match dim {
        Dimension::Year => 0,
        Dimension::Carrier => 1,
        Dimension::Airport => 2,
        Dimension::Month => 3,
    }
}

impl FilterSet {
    /// Populate options from the table and select the first option of each.
    pub fn new(table: &FlightDelayTable) -> Result<Self> {
        let mut set = FilterSet {
            options: Default::default(),
            selection: FilterSelection::default(),
            views: Default::default(),
        };
        for dim in Dimension::ALL {
            let options = distinct_values(table, dim.column())?;
            let first = options.first().cloned();
            set.options[slot_index(dim)] = options;
            if let Some(value) = first {
                set.update(table, dim, value);
            }
        }
        Ok(set)
    }

    pub fn options(&self, dim: Dimension) -> &[GroupKey] {
        &self.options[slot_index(dim)]
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn selected(&self, dim: Dimension) -> Option<&GroupKey> {
        self.selection.get(dim)
    }

    /// The filtered view for `dim`, if a value has been selected.
    pub fn filtered(&self, dim: Dimension) -> Option<&FilteredView> {
        self.views[slot_index(dim)].as_ref()
    }

    /// Change one dimension's selection and re-evaluate only its view.
    pub fn update(&mut self, table: &FlightDelayTable, dim: Dimension, value: GroupKey) {
        let view = select(table, dim.column(), &value);
        log::debug!("{dim} = {value}: {} matching rows", view.len());
        self.views[slot_index(dim)] = Some(view);
        *self.selection.slot(dim) = Some(value);
    }

    /// Select by display text, as typed on the command line.
    ///
    /// Returns `false` (and leaves the selection alone) when no option matches.
    pub fn update_by_label(&mut self, table: &FlightDelayTable, dim: Dimension, label: &str) -> bool {
        let found = self
            .options(dim)
            .iter()
            .find(|v| v.to_string() == label)
            .cloned();
        match found {
            Some(value) => {
                self.update(table, dim, value);
                true
            }
            None => false,
        }
    }
}
