//! Firestore Query type
//!
//! Queries are immutable: every builder method consumes the query and returns
//! a new one with the extra constraint, similar to how Iterator adapters work.
//! Field values are plain `serde_json::Value`s.

use super::collection_reference::CollectionReference;
use super::document_snapshot::DocumentSnapshot;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Sort direction for query ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest value first
    #[default]
    Ascending,
    /// Largest value first
    Descending,
}

/// Filter operators for Firestore queries
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// field == value
    Equal(String, Value),

    /// field < value
    LessThan(String, Value),

    /// field <= value
    LessThanOrEqual(String, Value),

    /// field > value
    GreaterThan(String, Value),

    /// field >= value
    GreaterThanOrEqual(String, Value),

    /// field array contains value
    ArrayContains(String, Value),

    /// field array contains any value from list
    ArrayContainsAny(String, Vec<Value>),

    /// field value is in list
    In(String, Vec<Value>),

    /// field != value
    NotEqual(String, Value),

    /// field not in list
    NotIn(String, Vec<Value>),

    /// Conjunction of multiple filters (all must match)
    ///
    /// An empty list matches every document.
    And(Vec<FilterCondition>),

    /// Disjunction of multiple filters (any must match)
    ///
    /// An empty list matches every document.
    Or(Vec<FilterCondition>),
}

impl FilterCondition {
    /// Get the field path for this filter
    ///
    /// For compound filters (And/Or), returns empty string as they don't have a single field path
    pub fn field_path(&self) -> &str {
        match self {
            FilterCondition::Equal(field, _)
            | FilterCondition::LessThan(field, _)
            | FilterCondition::LessThanOrEqual(field, _)
            | FilterCondition::GreaterThan(field, _)
            | FilterCondition::GreaterThanOrEqual(field, _)
            | FilterCondition::ArrayContains(field, _)
            | FilterCondition::ArrayContainsAny(field, _)
            | FilterCondition::In(field, _)
            | FilterCondition::NotEqual(field, _)
            | FilterCondition::NotIn(field, _) => field,
            FilterCondition::And(_) | FilterCondition::Or(_) => "",
        }
    }

    /// Evaluate the filter against a document's fields
    ///
    /// Documents missing the filtered field never match, including for the
    /// negative operators.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        match self {
            FilterCondition::And(filters) => filters.iter().all(|f| f.matches(fields)),
            FilterCondition::Or(filters) => {
                filters.is_empty() || filters.iter().any(|f| f.matches(fields))
            }
            _ => {
                let Some(actual) = lookup(fields, self.field_path()) else {
                    return false;
                };
                self.matches_value(actual)
            }
        }
    }

    fn matches_value(&self, actual: &Value) -> bool {
        match self {
            FilterCondition::Equal(_, expected) => values_equal(actual, expected),
            FilterCondition::NotEqual(_, expected) => {
                !actual.is_null() && !values_equal(actual, expected)
            }
            FilterCondition::LessThan(_, bound) => {
                compare_same_type(actual, bound) == Some(Ordering::Less)
            }
            FilterCondition::LessThanOrEqual(_, bound) => matches!(
                compare_same_type(actual, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterCondition::GreaterThan(_, bound) => {
                compare_same_type(actual, bound) == Some(Ordering::Greater)
            }
            FilterCondition::GreaterThanOrEqual(_, bound) => matches!(
                compare_same_type(actual, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterCondition::ArrayContains(_, expected) => actual
                .as_array()
                .is_some_and(|items| items.iter().any(|item| values_equal(item, expected))),
            FilterCondition::ArrayContainsAny(_, candidates) => {
                actual.as_array().is_some_and(|items| {
                    items
                        .iter()
                        .any(|item| candidates.iter().any(|c| values_equal(item, c)))
                })
            }
            FilterCondition::In(_, candidates) => {
                candidates.iter().any(|c| values_equal(actual, c))
            }
            FilterCondition::NotIn(_, candidates) => {
                !actual.is_null() && !candidates.iter().any(|c| values_equal(actual, c))
            }
            FilterCondition::And(_) | FilterCondition::Or(_) => unreachable!("handled in matches"),
        }
    }
}

/// Query over a single collection
///
/// # Example
/// ```
/// use reactive_firestore::firestore::{CollectionReference, Direction};
/// use serde_json::json;
///
/// let posts = CollectionReference::new("posts").unwrap()
///     .query()
///     .where_equal_to("published", json!(true))
///     .order_by("created", Direction::Descending);
/// assert_eq!(posts.collection().path(), "posts");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    collection: CollectionReference,
    filters: Vec<FilterCondition>,
    orders: Vec<(String, Direction)>,
}

impl Query {
    /// Unfiltered query over `collection`
    pub fn new(collection: CollectionReference) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            orders: Vec::new(),
        }
    }

    /// Collection this query reads from
    pub fn collection(&self) -> &CollectionReference {
        &self.collection
    }

    /// Filters applied by this query
    pub fn filters(&self) -> &[FilterCondition] {
        &self.filters
    }

    /// Whether the query has no constraints at all
    pub fn is_unfiltered(&self) -> bool {
        self.filters.is_empty() && self.orders.is_empty()
    }

    /// Add an arbitrary filter
    pub fn where_filter(mut self, filter: FilterCondition) -> Self {
        self.filters.push(filter);
        self
    }

    /// Filter documents where field equals value
    pub fn where_equal_to(self, field: impl Into<String>, value: Value) -> Self {
        self.where_filter(FilterCondition::Equal(field.into(), value))
    }

    /// Filter documents where field does not equal value
    pub fn where_not_equal_to(self, field: impl Into<String>, value: Value) -> Self {
        self.where_filter(FilterCondition::NotEqual(field.into(), value))
    }

    /// Filter documents where field is less than value
    pub fn where_less_than(self, field: impl Into<String>, value: Value) -> Self {
        self.where_filter(FilterCondition::LessThan(field.into(), value))
    }

    /// Filter documents where field is less than or equal to value
    pub fn where_less_than_or_equal_to(self, field: impl Into<String>, value: Value) -> Self {
        self.where_filter(FilterCondition::LessThanOrEqual(field.into(), value))
    }

    /// Filter documents where field is greater than value
    pub fn where_greater_than(self, field: impl Into<String>, value: Value) -> Self {
        self.where_filter(FilterCondition::GreaterThan(field.into(), value))
    }

    /// Filter documents where field is greater than or equal to value
    pub fn where_greater_than_or_equal_to(self, field: impl Into<String>, value: Value) -> Self {
        self.where_filter(FilterCondition::GreaterThanOrEqual(field.into(), value))
    }

    /// Filter documents where array field contains value
    pub fn where_array_contains(self, field: impl Into<String>, value: Value) -> Self {
        self.where_filter(FilterCondition::ArrayContains(field.into(), value))
    }

    /// Filter documents where array field contains any of the values
    pub fn where_array_contains_any(self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.where_filter(FilterCondition::ArrayContainsAny(field.into(), values))
    }

    /// Filter documents where field equals any of the values
    pub fn where_in(self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.where_filter(FilterCondition::In(field.into(), values))
    }

    /// Filter documents where field does not equal any of the values
    pub fn where_not_in(self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.where_filter(FilterCondition::NotIn(field.into(), values))
    }

    /// Order query results by field
    ///
    /// Documents missing an ordered field are excluded from the results.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.orders.push((field.into(), direction));
        self
    }

    /// Check whether a document belongs to the queried collection
    pub fn contains_path(&self, document_path: &str) -> bool {
        super::path::parent(document_path) == Some(self.collection.path())
    }

    /// Apply filters and ordering to candidate documents
    ///
    /// Candidates are expected in document-id order, which is also the final
    /// tie-breaker.
    pub fn apply(&self, candidates: Vec<DocumentSnapshot>) -> Vec<DocumentSnapshot> {
        let mut documents: Vec<DocumentSnapshot> = candidates
            .into_iter()
            .filter(|doc| self.contains_path(doc.reference.path()))
            .filter(|doc| {
                let Some(fields) = doc.data.as_ref() else {
                    return false;
                };
                self.filters.iter().all(|f| f.matches(fields))
                    && self.orders.iter().all(|(field, _)| lookup(fields, field).is_some())
            })
            .collect();

        if !self.orders.is_empty() {
            documents.sort_by(|a, b| self.compare_documents(a, b));
        }
        documents
    }

    fn compare_documents(&self, a: &DocumentSnapshot, b: &DocumentSnapshot) -> Ordering {
        for (field, direction) in &self.orders {
            let left = a.get(field).unwrap_or(&Value::Null);
            let right = b.get(field).unwrap_or(&Value::Null);
            let ordering = compare_values(left, right);
            let ordering = match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.reference.path().cmp(b.reference.path())
    }
}

/// Resolve a dotted field path (`"address.city"`) inside a field map
pub(crate) fn lookup<'a>(fields: &'a Map<String, Value>, field_path: &str) -> Option<&'a Value> {
    let mut segments = field_path.split('.');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn type_order(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Comparison used by range filters: values of different types never compare
fn compare_same_type(a: &Value, b: &Value) -> Option<Ordering> {
    if type_order(a) != type_order(b) {
        return None;
    }
    Some(compare_values(a, b))
}

/// Total ordering across value types: null < bool < number < string < array < map
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(l, r)| compare_values(l, r))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()),
        _ => type_order(a).cmp(&type_order(b)),
    }
}
