//! Compound collection queries and opaque pagination cursors.

use super::{DocumentSnapshot, FieldPath};
use serde_json::Value;

/// Comparison applied by one filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl FilterOp {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Self::Eq => "IS",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: FieldPath,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: FieldPath,
    pub direction: Direction,
}

/// Opaque start-after position inside an ordered result set.
///
/// Built from a document snapshot; carries the snapshot's order-field value
/// and its id (the id breaks ties between equal order values).
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    pub(crate) order_value: Option<Value>,
    pub(crate) doc_id: String,
}

impl PageCursor {
    /// Positions a cursor right after `snapshot` for the given order field.
    pub fn after(snapshot: &DocumentSnapshot, order_field: Option<&FieldPath>) -> Self {
        let order_value = order_field.map(|field| snapshot.field(field).cloned().unwrap_or(Value::Null));
        Self {
            order_value,
            doc_id: snapshot.reference.id().to_string(),
        }
    }
}

/// Query over one collection: filters are AND-ed; results are ordered by the
/// order field (when set) and then by document id.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub start_after: Option<PageCursor>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            start_after: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, field: FieldPath, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field,
            op,
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: FieldPath, direction: Direction) -> Self {
        self.order_by = Some(OrderBy { field, direction });
        self
    }

    #[must_use]
    pub fn start_after(mut self, cursor: PageCursor) -> Self {
        self.start_after = Some(cursor);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
