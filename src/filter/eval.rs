//! Filter evaluation.

use super::field::{FieldTable, FieldValue, Filterable, Tabled};
use super::parse::{FilterCondition, FilterGroup, FilterOperator, LogicalOperator};
use crate::error::{GatewayError, Result};
use serde_json::Value;
use std::cmp::Ordering;

impl FilterGroup {
    /// Evaluate the group against one record
    pub fn matches<R: Filterable + ?Sized>(&self, record: &R) -> bool {
        if self.is_empty() {
            return true;
        }
        let mut results = self
            .conditions
            .iter()
            .map(|c| c.matches(record))
            .chain(self.groups.iter().map(|g| g.matches(record)));
        match self.logic {
            LogicalOperator::And => results.all(|r| r),
            LogicalOperator::Or => results.any(|r| r),
        }
    }
}

impl FilterCondition {
    /// Evaluate the condition against one record; missing fields are `false`
    pub fn matches<R: Filterable + ?Sized>(&self, record: &R) -> bool {
        match record.field_value(&self.field) {
            Some(field) => evaluate(self.operator, &field, &self.value),
            None => false,
        }
    }
}

fn evaluate(op: FilterOperator, field: &FieldValue, raw: &str) -> bool {
    match field {
        FieldValue::List(items) => evaluate_list(op, items, raw),
        FieldValue::Null => match op {
            FilterOperator::Eq => raw.eq_ignore_ascii_case("null"),
            FilterOperator::Ne => !raw.eq_ignore_ascii_case("null"),
            _ => false,
        },
        scalar => match op {
            FilterOperator::In | FilterOperator::NotIn => {
                let mut found = false;
                for candidate in split_list(raw) {
                    match compare(scalar, candidate) {
                        Some(Ordering::Equal) => found = true,
                        Some(_) => {}
                        None => return false,
                    }
                }
                (op == FilterOperator::In) == found
            }
            FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith => {
                let Some(text) = scalar.as_text() else {
                    return false;
                };
                match op {
                    FilterOperator::Contains => text.contains(raw),
                    FilterOperator::StartsWith => text.starts_with(raw),
                    _ => text.ends_with(raw),
                }
            }
            _ => match compare(scalar, raw) {
                Some(ordering) => ordering_satisfies(op, ordering),
                None => false,
            },
        },
    }
}

fn evaluate_list(op: FilterOperator, items: &[FieldValue], raw: &str) -> bool {
    let contains = |needle: &str| {
        items
            .iter()
            .any(|item| compare(item, needle) == Some(Ordering::Equal))
    };
    match op {
        FilterOperator::Eq | FilterOperator::Contains => contains(raw),
        FilterOperator::Ne => !contains(raw),
        FilterOperator::In => split_list(raw).any(contains),
        FilterOperator::NotIn => !split_list(raw).any(contains),
        _ => false,
    }
}

fn ordering_satisfies(op: FilterOperator, ordering: Ordering) -> bool {
    match op {
        FilterOperator::Eq => ordering == Ordering::Equal,
        FilterOperator::Ne => ordering != Ordering::Equal,
        FilterOperator::Gt => ordering == Ordering::Greater,
        FilterOperator::Gte => ordering != Ordering::Less,
        FilterOperator::Lt => ordering == Ordering::Less,
        FilterOperator::Lte => ordering != Ordering::Greater,
        _ => false,
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Compare a field value with a textual value coerced to the field's type.
/// `None` when the value cannot be coerced.
fn compare(field: &FieldValue, raw: &str) -> Option<Ordering> {
    let raw = raw.trim();
    match field {
        FieldValue::Int(a) => match raw.parse::<i64>() {
            Ok(b) => Some(a.cmp(&b)),
            Err(_) => raw.parse::<f64>().ok().and_then(|b| (*a as f64).partial_cmp(&b)),
        },
        FieldValue::Float(a) => raw.parse::<f64>().ok().and_then(|b| a.partial_cmp(&b)),
        FieldValue::Bool(a) => parse_bool(raw).map(|b| a.cmp(&b)),
        FieldValue::Str(a) => Some(a.as_str().cmp(raw)),
        FieldValue::Null => raw.eq_ignore_ascii_case("null").then_some(Ordering::Equal),
        FieldValue::List(_) => None,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Keep the records that satisfy `filter`
///
/// Filtering is a projection: applying the same filter twice yields the same result
/// as applying it once.
pub fn apply_filters<T: Filterable + Clone>(collection: &[T], filter: &FilterGroup) -> Vec<T> {
    if filter.is_empty() {
        return collection.to_vec();
    }
    collection
        .iter()
        .filter(|record| filter.matches(*record))
        .cloned()
        .collect()
}

/// [`apply_filters`] for typed records resolved through a [`FieldTable`]
pub fn apply_filters_with<T: Clone>(
    collection: &[T],
    table: &FieldTable<T>,
    filter: &FilterGroup,
) -> Vec<T> {
    collection
        .iter()
        .filter(|record| filter.matches(&Tabled { table, record: *record }))
        .cloned()
        .collect()
}

/// Filter a JSON collection (an array of objects)
///
/// # Errors
///
/// Returns a validation error when `collection` is not an array of objects.
pub fn filter_json_collection(collection: &Value, filter: &FilterGroup) -> Result<Value> {
    let items = collection.as_array().ok_or_else(|| {
        GatewayError::invalid_field("filter", "filtering requires a collection result", "type")
    })?;
    if items.iter().any(|item| !item.is_object()) {
        return Err(GatewayError::invalid_field(
            "filter",
            "filtering requires a collection of records",
            "type",
        ));
    }
    Ok(Value::Array(apply_filters(items, filter)))
}
