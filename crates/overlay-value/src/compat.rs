//! Type-level predicates consulted by the merge engine.

use crate::ty::{Kind, Type};

/// Returns `true` if a value of type `src` may be natively cast to `dst`.
///
/// Any signed, unsigned or floating source may target any signed, unsigned
/// or floating destination. Complex sources only target complex
/// destinations, text only targets text. Everything else needs an explicit
/// conversion function.
pub fn convertible(dst: &Type, src: &Type) -> bool {
    let (dst, src) = (dst.kind(), src.kind());
    match src {
        Kind::Int | Kind::Uint | Kind::Float => dst.is_numeric(),
        Kind::Complex => dst == Kind::Complex,
        Kind::String => dst == Kind::String,
        _ => false,
    }
}

/// Returns `true` if elements of `ty` can be members of a set.
///
/// Booleans are hashable here; callers that find set semantics meaningless
/// for them must exclude them explicitly.
pub fn hashable(ty: &Type) -> bool {
    matches!(
        ty.kind(),
        Kind::Int
            | Kind::Uint
            | Kind::Float
            | Kind::Bool
            | Kind::String
            | Kind::Pointer
            | Kind::Handle
    )
}
