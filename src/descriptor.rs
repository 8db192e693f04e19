//! Static column-to-field registries for table entities.
//!
//! Table endpoints return rows as compact arrays whose element order follows a
//! column-name header. Each entity type registers a [`TypeDescriptor`] once
//! (behind a `LazyLock`), mapping every column name to a semantic kind and a
//! setter; the decoder resolves header names through it in O(1).

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::DecodeError;

/// Semantic kind of a table column.
///
/// The kind decides the canonical parse rule applied to the wire value, not
/// the destination Rust type. [`FieldKind::Decimal`] marks values that must be
/// parsed from their string representation to avoid precision loss beyond the
/// 53-bit safe-integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// UTF-8 string.
    Str,
    /// Signed 64-bit integer, accepted as JSON number or numeric string.
    I64,
    /// Unsigned 64-bit integer, accepted as JSON number or numeric string.
    U64,
    /// Arbitrary-precision decimal carried as a string on the wire.
    Decimal,
    /// IEEE double.
    F64,
    /// JSON boolean.
    Bool,
    /// ISO-8601 string or Unix-epoch number.
    Time,
    /// Lowercase, even-length hex without `0x` prefix.
    Hex,
    /// Nested object or array, deserialized structurally.
    Nested,
}

impl FieldKind {
    /// Human-readable name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Str => "string",
            FieldKind::I64 => "int64",
            FieldKind::U64 => "uint64",
            FieldKind::Decimal => "decimal",
            FieldKind::F64 => "float",
            FieldKind::Bool => "bool",
            FieldKind::Time => "timestamp",
            FieldKind::Hex => "hex bytes",
            FieldKind::Nested => "nested value",
        }
    }
}

/// A wire value converted according to its column's [`FieldKind`], ready for
/// assignment into an entity field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    I64(i64),
    U64(u64),
    Decimal(BigDecimal),
    F64(f64),
    Bool(bool),
    Time(DateTime<Utc>),
    Hex(Vec<u8>),
    Nested(Value),
}

macro_rules! field_value_accessor {
    ($fn_name:ident, $variant:ident, $ty:ty, $kind:expr) => {
        /// Extracts the converted value, or reports a kind mismatch for
        /// `column`. The decoder always supplies the variant matching the
        /// declared kind, so the error arm only fires on a misregistered
        /// descriptor.
        pub fn $fn_name(self, column: &'static str) -> Result<$ty, DecodeError> {
            match self {
                FieldValue::$variant(v) => Ok(v),
                other => Err(DecodeError::TypeMismatch {
                    column: column.to_string(),
                    expected: $kind.name(),
                    found: other.kind().name(),
                }),
            }
        }
    };
}

impl FieldValue {
    /// The kind this value was converted as.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Str(_) => FieldKind::Str,
            FieldValue::I64(_) => FieldKind::I64,
            FieldValue::U64(_) => FieldKind::U64,
            FieldValue::Decimal(_) => FieldKind::Decimal,
            FieldValue::F64(_) => FieldKind::F64,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Time(_) => FieldKind::Time,
            FieldValue::Hex(_) => FieldKind::Hex,
            FieldValue::Nested(_) => FieldKind::Nested,
        }
    }

    field_value_accessor!(into_str, Str, String, FieldKind::Str);
    field_value_accessor!(into_i64, I64, i64, FieldKind::I64);
    field_value_accessor!(into_u64, U64, u64, FieldKind::U64);
    field_value_accessor!(into_decimal, Decimal, BigDecimal, FieldKind::Decimal);
    field_value_accessor!(into_f64, F64, f64, FieldKind::F64);
    field_value_accessor!(into_bool, Bool, bool, FieldKind::Bool);
    field_value_accessor!(into_time, Time, DateTime<Utc>, FieldKind::Time);
    field_value_accessor!(into_hex, Hex, Vec<u8>, FieldKind::Hex);

    /// Deserializes a nested object or array into `D`.
    pub fn into_nested<D: DeserializeOwned>(
        self,
        column: &'static str,
    ) -> Result<D, DecodeError> {
        match self {
            FieldValue::Nested(v) => {
                serde_json::from_value(v).map_err(|source| DecodeError::InvalidNested {
                    column: column.to_string(),
                    source,
                })
            }
            other => Err(DecodeError::TypeMismatch {
                column: column.to_string(),
                expected: FieldKind::Nested.name(),
                found: other.kind().name(),
            }),
        }
    }
}

/// Setter assigning a converted value into an entity field.
pub type Setter<T> = fn(&mut T, FieldValue) -> Result<(), DecodeError>;

/// One column of a table entity: name, semantic kind, and setter.
pub struct FieldDescriptor<T> {
    name: &'static str,
    kind: FieldKind,
    setter: Setter<T>,
}

impl<T> FieldDescriptor<T> {
    pub fn new(name: &'static str, kind: FieldKind, setter: Setter<T>) -> Self {
        Self { name, kind, setter }
    }

    /// Column name as it appears in the table header.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Assigns a converted value into `row`.
    pub fn apply(&self, row: &mut T, value: FieldValue) -> Result<(), DecodeError> {
        (self.setter)(row, value)
    }
}

impl<T> std::fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Ordered column registry for one entity type.
///
/// Built once per type and never mutated afterwards; entities hold theirs in
/// a `std::sync::LazyLock` so all decodes share a single immutable instance.
///
/// # Panics
///
/// [`TypeDescriptor::new`] panics on duplicate column names. Descriptors are
/// static registrations, so a duplicate is a programming error caught by the
/// first test touching the entity.
#[derive(Debug)]
pub struct TypeDescriptor<T> {
    fields: Vec<FieldDescriptor<T>>,
    index: HashMap<&'static str, usize>,
}

impl<T> TypeDescriptor<T> {
    pub fn new(fields: Vec<FieldDescriptor<T>>) -> Self {
        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            let previous = index.insert(field.name, i);
            assert!(
                previous.is_none(),
                "duplicate column {:?} in type descriptor",
                field.name
            );
        }
        Self { fields, index }
    }

    /// Resolves a header column name to its descriptor in O(1).
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Column names in registration order.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Field descriptors in registration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor<T>> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A row type decodable from a table endpoint.
///
/// Implementations register their column layout once and expose the row
/// identifier that doubles as the pagination cursor.
pub trait TableEntity: Default + Send + Sized + 'static {
    /// Table name in the service URL, e.g. `"contract"`.
    const TABLE: &'static str;

    /// The column registry for this entity, built once and cached.
    fn descriptor() -> &'static TypeDescriptor<Self>;

    /// Row identifier used as the pagination cursor.
    fn row_id(&self) -> u64;
}
