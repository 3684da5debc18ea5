use crate::consolidate::error::ConsolidateError;
use crate::consolidate::flatten::{CellValue, FlatRecord};
use polars::prelude::*;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Heuristic: any column whose name ends in `time` or `Time` (e.g. `time`,
/// `sunriseTime`) holds epoch seconds. A non-timestamp column that happens
/// to share the suffix would be misclassified; kept uniform rather than
/// special-cased.
pub fn is_timestamp_column(name: &str) -> bool {
    name.ends_with("time") || name.ends_with("Time")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Str,
    Bool,
}

impl ColumnKind {
    fn name(self) -> &'static str {
        match self {
            ColumnKind::Int => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Str => "string",
            ColumnKind::Bool => "boolean",
        }
    }

    fn of(cell: &CellValue) -> Self {
        match cell {
            CellValue::Int(_) => ColumnKind::Int,
            CellValue::Float(_) => ColumnKind::Float,
            CellValue::Str(_) => ColumnKind::Str,
            CellValue::Bool(_) => ColumnKind::Bool,
        }
    }

    /// Widens integers to floats; any other mix is a schema conflict.
    fn promote(self, other: Self) -> Option<Self> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (ColumnKind::Int, ColumnKind::Float) | (ColumnKind::Float, ColumnKind::Int) => {
                Some(ColumnKind::Float)
            }
            _ => None,
        }
    }
}

/// Builds one DataFrame from the union of all row fields. Payload schemas
/// drift across days, so rows missing a column contribute nulls.
pub fn rows_to_dataframe(rows: &[FlatRecord]) -> Result<DataFrame, ConsolidateError> {
    let mut kinds: BTreeMap<&str, ColumnKind> = BTreeMap::new();
    for row in rows {
        for (name, cell) in &row.fields {
            let found = ColumnKind::of(cell);
            match kinds.entry(name.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(found);
                }
                Entry::Occupied(mut slot) => {
                    let existing = *slot.get();
                    match existing.promote(found) {
                        Some(kind) => {
                            slot.insert(kind);
                        }
                        None => {
                            return Err(ConsolidateError::MixedColumnTypes {
                                column: name.clone(),
                                existing: existing.name(),
                                found: found.name(),
                            })
                        }
                    }
                }
            }
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(kinds.len());
    for (&name, &kind) in &kinds {
        let column = match kind {
            ColumnKind::Int => {
                let values: Vec<Option<i64>> = rows
                    .iter()
                    .map(|row| match row.fields.get(name) {
                        Some(CellValue::Int(v)) => Some(*v),
                        _ => None,
                    })
                    .collect();
                Series::new(name.into(), values).into_column()
            }
            ColumnKind::Float => {
                let values: Vec<Option<f64>> = rows
                    .iter()
                    .map(|row| match row.fields.get(name) {
                        Some(CellValue::Float(v)) => Some(*v),
                        Some(CellValue::Int(v)) => Some(*v as f64),
                        _ => None,
                    })
                    .collect();
                Series::new(name.into(), values).into_column()
            }
            ColumnKind::Str => {
                let values: Vec<Option<String>> = rows
                    .iter()
                    .map(|row| match row.fields.get(name) {
                        Some(CellValue::Str(v)) => Some(v.clone()),
                        _ => None,
                    })
                    .collect();
                Series::new(name.into(), values).into_column()
            }
            ColumnKind::Bool => {
                let values: Vec<Option<bool>> = rows
                    .iter()
                    .map(|row| match row.fields.get(name) {
                        Some(CellValue::Bool(v)) => Some(*v),
                        _ => None,
                    })
                    .collect();
                Series::new(name.into(), values).into_column()
            }
        };
        columns.push(column);
    }

    DataFrame::new(columns).map_err(ConsolidateError::from)
}

/// Converts every timestamp column from epoch seconds to a timezone-aware
/// datetime in the location's zone, puts `time` first, and sorts ascending
/// by it. Duplicate timestamps are preserved in their incoming order.
pub fn localize_and_sort(
    df: DataFrame,
    time_zone: &str,
    location: &str,
) -> Result<DataFrame, ConsolidateError> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    if !names.iter().any(|n| n == "time") {
        return Err(ConsolidateError::MissingTimeColumn(location.to_string()));
    }

    let localized: Vec<Expr> = names
        .iter()
        .filter(|n| is_timestamp_column(n))
        .map(|n| epoch_to_local(n, time_zone))
        .collect();

    // `time` is the index column and leads the output.
    let mut ordered: Vec<Expr> = vec![col("time")];
    ordered.extend(names.iter().filter(|n| *n != "time").map(|n| col(n.as_str())));

    df.lazy()
        .with_columns(localized)
        .select(ordered)
        .sort(
            ["time"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()
        .map_err(ConsolidateError::from)
}

/// Epoch seconds -> UTC datetime -> localized to `time_zone`.
fn epoch_to_local(name: &str, time_zone: &str) -> Expr {
    (col(name) * lit(1_000i64))
        .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
        .dt()
        .replace_time_zone(Some("UTC".into()), lit("raise"), NonExistent::Raise)
        .dt()
        .convert_time_zone(time_zone.into())
        .alias(name)
}
