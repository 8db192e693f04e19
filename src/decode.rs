// SPDX-FileCopyrightText: 2026 tzquery contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Columnar decoder for table and explorer payloads.
//!
//! Two wire shapes are supported: arrays of self-describing JSON objects, and
//! column-compact arrays-of-arrays paired with a column-name header. Both are
//! decoded through the entity's [`TypeDescriptor`]; decoding is pure,
//! synchronous, and performs no I/O.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::descriptor::{FieldKind, FieldValue, TableEntity, TypeDescriptor};
use crate::errors::DecodeError;

/// How to treat header columns absent from the entity's descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Skip unknown columns. Default; keeps old clients working when the
    /// service grows new columns.
    #[default]
    IgnoreUnknown,
    /// Fail with [`DecodeError::UnknownColumn`] on the first unknown column.
    Strict,
}

/// One decoded page of rows plus the column list used to decode it.
#[derive(Debug, Clone)]
pub struct ResultPage<T> {
    rows: Vec<T>,
    columns: Vec<String>,
}

impl<T: TableEntity> ResultPage<T> {
    /// Identifier of the last row, or 0 for an empty page. Feeding this back
    /// through [`crate::QuerySpec::with_cursor`] advances pagination.
    pub fn cursor(&self) -> u64 {
        self.rows.last().map(|row| row.row_id()).unwrap_or(0)
    }
}

impl<T> ResultPage<T> {
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    /// Columns the page was decoded with, in wire order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a ResultPage<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Decodes a table payload into typed rows.
///
/// `columns` is the sidecar header for compact rows: the columns requested by
/// the query, or empty for "all columns in descriptor order". The shape is
/// detected from the first element; object rows ignore the header entirely.
pub fn decode_rows<T: TableEntity>(
    payload: &[u8],
    columns: &[String],
    policy: DecodePolicy,
) -> Result<ResultPage<T>, DecodeError> {
    let value: Value = serde_json::from_slice(payload)?;
    let Value::Array(items) = value else {
        return Err(DecodeError::UnexpectedShape {
            found: json_type_name(&value),
        });
    };

    let header: Vec<String> = if columns.is_empty() {
        T::descriptor().columns().map(str::to_string).collect()
    } else {
        columns.to_vec()
    };

    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let row = match item {
            Value::Array(cells) => decode_compact_row(&cells, &header, i, policy)?,
            Value::Object(_) => decode_object::<T>(&item)?,
            other => {
                return Err(DecodeError::UnexpectedShape {
                    found: json_type_name(&other),
                })
            }
        };
        rows.push(row);
    }

    Ok(ResultPage {
        rows,
        columns: header,
    })
}

/// Decodes one self-describing JSON object into an entity.
///
/// Only columns registered in the descriptor are read; unknown keys are
/// ignored regardless of policy, as object payloads are self-describing and
/// carry no header to validate.
pub fn decode_object<T: TableEntity>(value: &Value) -> Result<T, DecodeError> {
    let Value::Object(map) = value else {
        return Err(DecodeError::UnexpectedShape {
            found: json_type_name(value),
        });
    };

    let descriptor = T::descriptor();
    let mut row = T::default();
    for field in descriptor.fields() {
        let Some(raw) = map.get(field.name()) else { continue };
        if raw.is_null() {
            continue;
        }
        let converted = convert(raw, field.kind(), field.name())?;
        field.apply(&mut row, converted)?;
    }
    Ok(row)
}

fn decode_compact_row<T: TableEntity>(
    cells: &[Value],
    header: &[String],
    row_index: usize,
    policy: DecodePolicy,
) -> Result<T, DecodeError> {
    if cells.len() != header.len() {
        return Err(DecodeError::RowWidth {
            row: row_index,
            expected: header.len(),
            found: cells.len(),
        });
    }

    let descriptor: &TypeDescriptor<T> = T::descriptor();
    let mut row = T::default();
    for (cell, column) in cells.iter().zip(header) {
        let Some(field) = descriptor.field(column) else {
            match policy {
                DecodePolicy::IgnoreUnknown => continue,
                DecodePolicy::Strict => {
                    return Err(DecodeError::UnknownColumn {
                        table: T::TABLE,
                        column: column.clone(),
                    })
                }
            }
        };
        if cell.is_null() {
            continue;
        }
        let converted = convert(cell, field.kind(), field.name())?;
        field.apply(&mut row, converted)?;
    }
    Ok(row)
}

/// Converts a raw JSON value according to the column's semantic kind.
///
/// Each kind has a single canonical parse rule. Integers are accepted as JSON
/// numbers or numeric strings; decimals must come from the string form when
/// the wire uses one, preserving precision past the 53-bit safe range.
fn convert(raw: &Value, kind: FieldKind, column: &str) -> Result<FieldValue, DecodeError> {
    let mismatch = || DecodeError::TypeMismatch {
        column: column.to_string(),
        expected: kind.name(),
        found: json_type_name(raw),
    };

    match kind {
        FieldKind::Str => match raw {
            Value::String(s) => Ok(FieldValue::Str(s.clone())),
            _ => Err(mismatch()),
        },
        FieldKind::I64 => match raw {
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::I64)
                .ok_or_else(|| int_out_of_range(column, &n.to_string())),
            Value::String(s) => s
                .parse::<i64>()
                .map(FieldValue::I64)
                .map_err(|_| int_out_of_range(column, s)),
            _ => Err(mismatch()),
        },
        FieldKind::U64 => match raw {
            Value::Number(n) => n
                .as_u64()
                .map(FieldValue::U64)
                .ok_or_else(|| int_out_of_range(column, &n.to_string())),
            Value::String(s) => s
                .parse::<u64>()
                .map(FieldValue::U64)
                .map_err(|_| int_out_of_range(column, s)),
            _ => Err(mismatch()),
        },
        FieldKind::Decimal => match raw {
            Value::String(s) => BigDecimal::from_str(s).map(FieldValue::Decimal).map_err(
                |_| DecodeError::InvalidDecimal {
                    column: column.to_string(),
                    value: s.clone(),
                },
            ),
            Value::Number(n) => BigDecimal::from_str(&n.to_string())
                .map(FieldValue::Decimal)
                .map_err(|_| DecodeError::InvalidDecimal {
                    column: column.to_string(),
                    value: n.to_string(),
                }),
            _ => Err(mismatch()),
        },
        FieldKind::F64 => match raw {
            Value::Number(n) => n.as_f64().map(FieldValue::F64).ok_or_else(mismatch),
            Value::String(s) => s.parse::<f64>().map(FieldValue::F64).map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        FieldKind::Bool => match raw {
            Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            _ => Err(mismatch()),
        },
        FieldKind::Time => match raw {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| FieldValue::Time(dt.with_timezone(&Utc)))
                .map_err(|_| DecodeError::InvalidTimestamp {
                    column: column.to_string(),
                    value: s.clone(),
                }),
            Value::Number(n) => n
                .as_i64()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(FieldValue::Time)
                .ok_or_else(|| DecodeError::InvalidTimestamp {
                    column: column.to_string(),
                    value: n.to_string(),
                }),
            _ => Err(mismatch()),
        },
        FieldKind::Hex => match raw {
            Value::String(s) => decode_hex(s, column),
            _ => Err(mismatch()),
        },
        FieldKind::Nested => match raw {
            Value::Object(_) | Value::Array(_) => Ok(FieldValue::Nested(raw.clone())),
            _ => Err(mismatch()),
        },
    }
}

fn decode_hex(s: &str, column: &str) -> Result<FieldValue, DecodeError> {
    let invalid = || DecodeError::InvalidHex {
        column: column.to_string(),
        value: s.to_string(),
    };
    // Canonical form only: lowercase, even-length, no 0x prefix.
    let canonical = s.len() % 2 == 0
        && !s.starts_with("0x")
        && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !canonical {
        return Err(invalid());
    }
    hex::decode(s).map(FieldValue::Hex).map_err(|_| invalid())
}

fn int_out_of_range(column: &str, value: &str) -> DecodeError {
    DecodeError::IntOutOfRange {
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::descriptor::FieldDescriptor;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct BigmapValue {
        row_id: u64,
        key_hash: String,
        bigmap_id: i64,
        amount: BigDecimal,
        fee: f64,
        active: bool,
        time: Option<DateTime<Utc>>,
        key_bytes: Vec<u8>,
        flags: Vec<String>,
    }

    static BIGMAP_VALUE_DESCRIPTOR: LazyLock<TypeDescriptor<BigmapValue>> =
        LazyLock::new(|| {
            TypeDescriptor::new(vec![
                FieldDescriptor::new("row_id", FieldKind::U64, |r, v| {
                    r.row_id = v.into_u64("row_id")?;
                    Ok(())
                }),
                FieldDescriptor::new("key_hash", FieldKind::Str, |r, v| {
                    r.key_hash = v.into_str("key_hash")?;
                    Ok(())
                }),
                FieldDescriptor::new("bigmap_id", FieldKind::I64, |r, v| {
                    r.bigmap_id = v.into_i64("bigmap_id")?;
                    Ok(())
                }),
                FieldDescriptor::new("amount", FieldKind::Decimal, |r, v| {
                    r.amount = v.into_decimal("amount")?;
                    Ok(())
                }),
                FieldDescriptor::new("fee", FieldKind::F64, |r, v| {
                    r.fee = v.into_f64("fee")?;
                    Ok(())
                }),
                FieldDescriptor::new("active", FieldKind::Bool, |r, v| {
                    r.active = v.into_bool("active")?;
                    Ok(())
                }),
                FieldDescriptor::new("time", FieldKind::Time, |r, v| {
                    r.time = Some(v.into_time("time")?);
                    Ok(())
                }),
                FieldDescriptor::new("key_bytes", FieldKind::Hex, |r, v| {
                    r.key_bytes = v.into_hex("key_bytes")?;
                    Ok(())
                }),
                FieldDescriptor::new("flags", FieldKind::Nested, |r, v| {
                    r.flags = v.into_nested("flags")?;
                    Ok(())
                }),
            ])
        });

    impl TableEntity for BigmapValue {
        const TABLE: &'static str = "bigmap_values";

        fn descriptor() -> &'static TypeDescriptor<Self> {
            &BIGMAP_VALUE_DESCRIPTOR
        }

        fn row_id(&self) -> u64 {
            self.row_id
        }
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn compact_rows_decode_with_header() {
        let payload = br#"[[1,"abc"],[2,"def"]]"#;
        let page: ResultPage<BigmapValue> =
            decode_rows(payload, &cols(&["row_id", "key_hash"]), DecodePolicy::default())
                .unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page.rows()[0].row_id, 1);
        assert_eq!(page.rows()[0].key_hash, "abc");
        assert_eq!(page.rows()[1].row_id, 2);
        assert_eq!(page.rows()[1].key_hash, "def");
        assert_eq!(page.cursor(), 2);

        // Unrequested fields stay at their zero value.
        assert_eq!(page.rows()[0].bigmap_id, 0);
        assert_eq!(page.rows()[0].amount, BigDecimal::default());
        assert!(page.rows()[0].time.is_none());
        assert!(page.rows()[0].key_bytes.is_empty());
    }

    #[test]
    fn empty_page_has_zero_cursor() {
        let page: ResultPage<BigmapValue> =
            decode_rows(b"[]", &cols(&["row_id"]), DecodePolicy::default()).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.cursor(), 0);
    }

    #[test]
    fn object_rows_decode_without_header() {
        let payload = br#"[{"row_id":7,"key_hash":"xyz","unknown_field":true}]"#;
        let page: ResultPage<BigmapValue> =
            decode_rows(payload, &[], DecodePolicy::default()).unwrap();
        assert_eq!(page.rows()[0].row_id, 7);
        assert_eq!(page.rows()[0].key_hash, "xyz");
    }

    #[test]
    fn big_decimal_string_keeps_precision() {
        let payload = br#"[["123456789012345678901234567890"]]"#;
        let page: ResultPage<BigmapValue> =
            decode_rows(payload, &cols(&["amount"]), DecodePolicy::default()).unwrap();
        assert_eq!(
            page.rows()[0].amount,
            BigDecimal::from_str("123456789012345678901234567890").unwrap()
        );
    }

    #[test]
    fn big_string_into_i64_fails() {
        let payload = br#"[["123456789012345678901234567890"]]"#;
        let err = decode_rows::<BigmapValue>(payload, &cols(&["bigmap_id"]), DecodePolicy::default())
            .unwrap_err();
        assert!(matches!(err, DecodeError::IntOutOfRange { .. }));
    }

    #[test]
    fn integers_accept_numbers_and_numeric_strings() {
        let payload = br#"[[1,"-5"],["2",7]]"#;
        let page: ResultPage<BigmapValue> =
            decode_rows(payload, &cols(&["row_id", "bigmap_id"]), DecodePolicy::default())
                .unwrap();
        assert_eq!(page.rows()[0].row_id, 1);
        assert_eq!(page.rows()[0].bigmap_id, -5);
        assert_eq!(page.rows()[1].row_id, 2);
        assert_eq!(page.rows()[1].bigmap_id, 7);
    }

    #[test]
    fn unknown_column_skipped_by_default() {
        let payload = br#"[[1,"whatever"]]"#;
        let page: ResultPage<BigmapValue> = decode_rows(
            payload,
            &cols(&["row_id", "brand_new_column"]),
            DecodePolicy::IgnoreUnknown,
        )
        .unwrap();
        assert_eq!(page.rows()[0].row_id, 1);
    }

    #[test]
    fn unknown_column_fails_under_strict_policy() {
        let payload = br#"[[1,"whatever"]]"#;
        let err = decode_rows::<BigmapValue>(
            payload,
            &cols(&["row_id", "brand_new_column"]),
            DecodePolicy::Strict,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnknownColumn { table: "bigmap_values", .. }
        ));
    }

    #[test]
    fn structural_mismatch_is_never_coerced() {
        let payload = br#"[[{"nested":true}]]"#;
        let err = decode_rows::<BigmapValue>(payload, &cols(&["row_id"]), DecodePolicy::default())
            .unwrap_err();
        assert!(matches!(err, DecodeError::TypeMismatch { .. }));
    }

    #[test]
    fn timestamps_accept_iso8601_and_epoch() {
        let payload = br#"[["2023-04-01T12:00:00Z"],[1680350400]]"#;
        let page: ResultPage<BigmapValue> =
            decode_rows(payload, &cols(&["time"]), DecodePolicy::default()).unwrap();
        assert_eq!(
            page.rows()[0].time.unwrap(),
            DateTime::parse_from_rfc3339("2023-04-01T12:00:00Z").unwrap()
        );
        assert_eq!(page.rows()[1].time.unwrap().timestamp(), 1680350400);
    }

    #[test]
    fn hex_requires_canonical_form() {
        let ok = br#"[["deadbeef"]]"#;
        let page: ResultPage<BigmapValue> =
            decode_rows(ok, &cols(&["key_bytes"]), DecodePolicy::default()).unwrap();
        assert_eq!(page.rows()[0].key_bytes, vec![0xde, 0xad, 0xbe, 0xef]);

        for bad in [br#"[["0xdead"]]"#.as_slice(), br#"[["DEAD"]]"#, br#"[["abc"]]"#] {
            let err = decode_rows::<BigmapValue>(bad, &cols(&["key_bytes"]), DecodePolicy::default())
                .unwrap_err();
            assert!(matches!(err, DecodeError::InvalidHex { .. }), "{bad:?}");
        }
    }

    #[test]
    fn nested_values_deserialize_structurally() {
        let payload = br#"[[["fa2","ledger"]]]"#;
        let page: ResultPage<BigmapValue> =
            decode_rows(payload, &cols(&["flags"]), DecodePolicy::default()).unwrap();
        assert_eq!(page.rows()[0].flags, vec!["fa2", "ledger"]);
    }

    #[test]
    fn null_cells_leave_fields_at_default() {
        let payload = br#"[[1,null]]"#;
        let page: ResultPage<BigmapValue> =
            decode_rows(payload, &cols(&["row_id", "key_hash"]), DecodePolicy::default())
                .unwrap();
        assert_eq!(page.rows()[0].key_hash, "");
    }

    #[test]
    fn row_width_mismatch_fails() {
        let payload = br#"[[1,"abc",true]]"#;
        let err = decode_rows::<BigmapValue>(
            payload,
            &cols(&["row_id", "key_hash"]),
            DecodePolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::RowWidth { row: 0, expected: 2, found: 3 }
        ));
    }

    #[test]
    fn non_array_top_level_fails() {
        let err = decode_rows::<BigmapValue>(br#"{"rows":[]}"#, &[], DecodePolicy::default())
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedShape { found: "object" }));
    }

    #[test]
    fn empty_header_defaults_to_descriptor_order() {
        let page: ResultPage<BigmapValue> =
            decode_rows(b"[]", &[], DecodePolicy::default()).unwrap();
        assert_eq!(page.columns()[0], "row_id");
        assert_eq!(page.columns().len(), BigmapValue::descriptor().len());
    }
}
