//! Decode errors for table and explorer payloads.

/// Errors produced while turning a JSON payload into typed rows.
///
/// Decoding never coerces structurally incompatible values; the only
/// permitted leniency is accepting 64-bit integers in either JSON number or
/// numeric-string form, and that is part of the canonical parse rules rather
/// than a recovery path.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload was not valid JSON.
    #[error("payload is not valid JSON")]
    Json(#[from] serde_json::Error),

    /// The top-level JSON value had the wrong shape for the endpoint.
    #[error("expected a JSON array at the top level, found {found}")]
    UnexpectedShape {
        /// JSON type name of the value actually found.
        found: &'static str,
    },

    /// A compact row did not match the width of the column header.
    #[error("row {row}: expected {expected} columns, found {found}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A header column has no field registered in the entity's descriptor.
    ///
    /// Only raised under [`crate::DecodePolicy::Strict`]; the default policy
    /// skips unknown columns for forward compatibility.
    #[error("unknown column {column:?} for table {table:?}")]
    UnknownColumn {
        table: &'static str,
        column: String,
    },

    /// A value's JSON type is structurally incompatible with the field kind.
    #[error("column {column:?}: expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A numeric value does not fit the destination 64-bit integer.
    #[error("column {column:?}: {value:?} does not fit in a 64-bit integer")]
    IntOutOfRange { column: String, value: String },

    /// A string could not be parsed as an arbitrary-precision decimal.
    #[error("column {column:?}: invalid decimal {value:?}")]
    InvalidDecimal { column: String, value: String },

    /// A timestamp was neither ISO-8601 nor a Unix epoch number.
    #[error("column {column:?}: invalid timestamp {value:?}")]
    InvalidTimestamp { column: String, value: String },

    /// A byte string was not lowercase, even-length, unprefixed hex.
    #[error("column {column:?}: invalid hex {value:?}")]
    InvalidHex { column: String, value: String },

    /// A nested value did not deserialize into the destination structure.
    #[error("column {column:?}: incompatible nested value")]
    InvalidNested {
        column: String,
        #[source]
        source: serde_json::Error,
    },
}
