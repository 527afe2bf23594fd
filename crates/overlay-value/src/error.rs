use thiserror::Error;

use crate::ty::{Kind, Type};

/// Errors produced while building, casting or reading back values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    /// The payload does not fit the declared type.
    #[error("value of type {found} does not fit a slot of type {expected}")]
    ShapeMismatch { expected: Type, found: Type },

    /// The payload variant does not belong to the declared kind.
    #[error("payload of kind {payload} cannot carry type {ty}")]
    PayloadMismatch { ty: Type, payload: Kind },

    /// A struct was built with the wrong number of fields.
    #[error("struct {ty} has {expected} fields, got {actual}")]
    FieldCount {
        ty: Type,
        expected: usize,
        actual: usize,
    },

    /// Map keys must be booleans, numbers, strings or handles.
    #[error("type {0} cannot be used as a map key")]
    InvalidMapKey(Type),

    /// A nil value was found where a concrete one is required.
    #[error("unexpected nil value of type {0}")]
    UnexpectedNil(Type),

    /// No native conversion exists between the two types.
    #[error("cannot cast {from} to {to}")]
    UnsupportedCast { from: Type, to: Type },

    /// A numeric value does not fit the Rust type it is read into.
    #[error("value {value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    /// A value could not be read back into a Rust type.
    #[error("expected a value of type {expected}, got {found}")]
    Reflect { expected: Type, found: Type },

    /// A JSON document could not be parsed.
    #[error("json error: {0}")]
    Json(String),
}

/// Convenience alias for value results.
pub type ValueResult<T> = Result<T, ValueError>;
