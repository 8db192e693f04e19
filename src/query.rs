// SPDX-FileCopyrightText: 2026 tzquery contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Immutable query specifications for table endpoints.
//!
//! A [`QuerySpec`] is a value: every `with_*` call returns a new spec and
//! never mutates the receiver, so a spec can be shared across concurrent
//! pagination start points. Rendering is canonical, with filters sorted by
//! (field, operator, value), so two logically equal specs always serialize
//! identically and can serve as retry or cache keys.

use url::form_urlencoded;

/// Comparison operator of a table filter.
///
/// `as_str` gives the wire form used in `field.op=value` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
    Contains,
    IsNull,
    NotNull,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::In => "in",
            FilterOp::NotIn => "nin",
            FilterOp::Contains => "cn",
            FilterOp::IsNull => "null",
            FilterOp::NotNull => "nonull",
        }
    }
}

/// One `(field, operator, value)` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

/// Sort direction of a table query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// Immutable configuration of filters, columns, ordering, limit, and cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    filters: Vec<Filter>,
    columns: Vec<String>,
    order: Order,
    limit: Option<u32>,
    cursor: u64,
    max_page_size: u32,
}

impl QuerySpec {
    /// Page-size ceiling used when the server has not declared one.
    pub const DEFAULT_MAX_PAGE_SIZE: u32 = 500;

    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            columns: Vec::new(),
            order: Order::default(),
            limit: None,
            cursor: 0,
            max_page_size: Self::DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Overrides the server-declared page-size ceiling. Re-clamps an already
    /// set limit so the invariant `limit <= max_page_size` holds.
    pub fn with_max_page_size(mut self, max: u32) -> Self {
        self.max_page_size = max.max(1);
        if let Some(limit) = self.limit {
            self.limit = Some(limit.clamp(1, self.max_page_size));
        }
        self
    }

    /// Appends a filter condition. For [`FilterOp::In`] and
    /// [`FilterOp::NotIn`] the value is a comma-joined list.
    pub fn with_filter(
        mut self,
        field: impl Into<String>,
        op: FilterOp,
        value: impl ToString,
    ) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.to_string(),
        });
        self
    }

    /// Restricts the response to the named columns, preserving order and
    /// dropping duplicates. An empty selection means all columns.
    pub fn with_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.columns.contains(&name) {
                self.columns.push(name);
            }
        }
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Sets the page limit, clamped into `[1, max_page_size]`.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit.clamp(1, self.max_page_size));
        self
    }

    /// Sets the pagination cursor; 0 starts from the beginning.
    pub fn with_cursor(mut self, cursor: u64) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    /// Canonical query parameters: filters sorted by (field, operator,
    /// value), then `columns`, `order`, `limit`, and `cursor` in fixed
    /// positions.
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut filters: Vec<&Filter> = self.filters.iter().collect();
        filters.sort_by(|a, b| {
            (a.field.as_str(), a.op.as_str(), a.value.as_str())
                .cmp(&(b.field.as_str(), b.op.as_str(), b.value.as_str()))
        });

        let mut params = Vec::with_capacity(filters.len() + 4);
        for f in filters {
            let value = match f.op {
                // Null checks carry no meaningful operand.
                FilterOp::IsNull | FilterOp::NotNull => "1".to_string(),
                _ => f.value.clone(),
            };
            params.push((format!("{}.{}", f.field, f.op.as_str()), value));
        }
        if !self.columns.is_empty() {
            params.push(("columns".to_string(), self.columns.join(",")));
        }
        params.push(("order".to_string(), self.order.as_str().to_string()));
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if self.cursor > 0 {
            params.push(("cursor".to_string(), self.cursor.to_string()));
        }
        params
    }

    /// Percent-encoded canonical query string.
    pub fn render(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_params())
            .finish()
    }
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self::new()
    }
}
