//! Collection queries

use std::cmp::Ordering;

use serde_json::Value;
use smallvec::SmallVec;

use super::Collection;

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Condition {
    pub(crate) const fn sql_operator(self) -> &'static str {
        match self {
            Self::Eq => " = ",
            Self::Gt => " > ",
            Self::Gte => " >= ",
            Self::Lt => " < ",
            Self::Lte => " <= ",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Gte => ordering != Ordering::Less,
            Self::Lt => ordering == Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A condition on one top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub condition: Condition,
    pub value: Value,
}

/// Query over a single collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: Collection,
    pub filters: SmallVec<[Filter; 2]>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            filters: SmallVec::new(),
            order_by: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, field: &str, condition: Condition, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            condition,
            value: value.into(),
        });

        self
    }

    #[must_use]
    pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, Condition::Eq, value)
    }

    #[must_use]
    pub fn where_gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, Condition::Gte, value)
    }

    #[must_use]
    pub fn where_lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, Condition::Lte, value)
    }

    #[must_use]
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document body satisfies every filter.
    #[must_use]
    pub fn matches(&self, body: &Value) -> bool {
        self.filters.iter().all(|filter| {
            body.get(&filter.field)
                .and_then(|actual| compare_values(actual, &filter.value))
                .is_some_and(|ordering| filter.condition.holds(ordering))
        })
    }

    /// Order two bodies by the query's sort field; documents lacking the field sort last.
    #[must_use]
    pub fn compare(&self, left: &Value, right: &Value) -> Ordering {
        let Some((field, direction)) = &self.order_by else {
            return Ordering::Equal;
        };

        match (left.get(field), right.get(field)) {
            (Some(a), Some(b)) => {
                let ordering = compare_values(a, b).unwrap_or(Ordering::Equal);

                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Compare two JSON scalars of the same kind; `None` when they are not comparable.
pub(crate) fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                Some(a.cmp(&b))
            } else if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                Some(a.cmp(&b))
            } else {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => (left == right).then_some(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn equality_and_range_filters_combine() {
        let query = Query::new(Collection::Products)
            .where_eq("category", "dog")
            .where_gte("price", 100)
            .where_lte("price", 500);

        assert!(query.matches(&json!({ "category": "dog", "price": 250 })));
        assert!(!query.matches(&json!({ "category": "cat", "price": 250 })));
        assert!(!query.matches(&json!({ "category": "dog", "price": 501 })));
        assert!(!query.matches(&json!({ "category": "dog" })));
    }

    #[test]
    fn descending_order_puts_missing_fields_last() {
        let query = Query::new(Collection::Orders).order_by("sequenceIndex", Direction::Descending);

        let mut bodies = [
            json!({ "sequenceIndex": 1 }),
            json!({}),
            json!({ "sequenceIndex": 3 }),
        ];

        bodies.sort_by(|a, b| query.compare(a, b));

        assert_eq!(
            bodies,
            [json!({ "sequenceIndex": 3 }), json!({ "sequenceIndex": 1 }), json!({})]
        );
    }

    #[test]
    fn mixed_kinds_do_not_compare() {
        assert_eq!(compare_values(&json!(1), &json!("1")), None);
        assert_eq!(compare_values(&json!(-1), &json!(2)), Some(Ordering::Less));
    }
}
