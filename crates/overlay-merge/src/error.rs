//! Error types for the merge engine.

use overlay_value::{Type, ValueError};

/// Errors raised while registering custom functions.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The function's result cannot be stored back into its destination.
    #[error("expected 'in' param 0 and 'out' param 0 to be the same type, got <{param}, {result}>")]
    ResultTypeMismatch {
        /// Declared destination (parameter 0) type.
        param: Type,
        /// Declared result type.
        result: Type,
    },
}

/// Errors that can occur during a merge.
///
/// Usage errors describe a malformed top-level call, type-mismatch errors a
/// missing conversion path, and structural errors an assignment into a slot
/// that cannot hold a value.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The target is a nil dynamic value.
    #[error("target is nil")]
    TargetNil,

    /// The target is not reached through a pointer.
    #[error("target must be addressed indirectly, got {0}")]
    TargetNotIndirect(Type),

    /// Dereferencing the target reached nil.
    #[error("target resolves to no value")]
    TargetResolvesToNothing,

    /// Dereferencing the source reached nil.
    #[error("source resolves to no value")]
    SourceResolvesToNothing,

    /// No conversion function or native cast exists.
    #[error("cannot convert {src} to {dst}")]
    CannotConvert {
        src: Type,
        dst: Type,
    },

    /// Still no conversion after dereferencing pointers on both sides.
    #[error(
        "cannot convert element type: after dereferencing <src {src}, dst {dst}>, \
         {src_elem} is still not convertible to {dst_elem}"
    )]
    CannotConvertElement {
        src: Type,
        dst: Type,
        src_elem: Type,
        dst_elem: Type,
    },

    /// Scalar assignment between two different concrete types.
    #[error("src {src} and dst {dst} must be of the same type")]
    TypeMismatch {
        src: Type,
        dst: Type,
    },

    /// The destination slot holds no value that could be assigned.
    #[error("invalid destination of type {0}")]
    InvalidDestination(Type),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Value(#[from] ValueError),

    /// A custom merge or conversion function failed.
    #[error("custom function failed: {0}")]
    Custom(String),
}

impl MergeError {
    /// Create an error from inside a custom merge or conversion function.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
