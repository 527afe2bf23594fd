use std::fmt;

use crate::error::{ValueError, ValueResult};
use crate::ty::{Kind, Type};
use crate::value::{Data, PtrId, Value};

/// A hashable-equivalent projection of a value.
///
/// Map entries are keyed by `Key`, and the unite slice mode uses it to
/// detect elements already present in the destination. Floats are keyed by
/// bit pattern with `-0.0` folded into `0.0`. `Pointer` keys compare pointer
/// identity and never appear in maps.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(u64),
    Str(String),
    Handle(u64),
    Pointer(Option<PtrId>),
}

/// Returns `true` if values of `ty` may key a map.
pub fn is_key_type(ty: &Type) -> bool {
    matches!(
        ty.kind(),
        Kind::Bool | Kind::Int | Kind::Uint | Kind::Float | Kind::String | Kind::Handle
    )
}

impl Key {
    pub fn float(v: f64) -> Self {
        let v = if v == 0.0 { 0.0 } else { v };
        Self::Float(v.to_bits())
    }

    /// Project a value onto its identity, if its kind is hashable-equivalent.
    ///
    /// Dynamic values are not projected: their concrete type may vary per
    /// element, so they never take part in set-based combination.
    pub fn of(value: &Value) -> Option<Self> {
        let key = match value.data() {
            Data::Bool(b) => Self::Bool(*b),
            Data::Int(v) => Self::Int(*v),
            Data::Uint(v) => Self::Uint(*v),
            Data::Float(v) => Self::float(*v),
            Data::Str(s) => Self::Str(s.clone()),
            Data::Handle(h) => Self::Handle(*h),
            Data::Pointer(p) => Self::Pointer(p.as_ref().map(|p| p.id())),
            _ => return None,
        };
        Some(key)
    }

    /// Project a value into a map key.
    pub fn from_value(value: &Value) -> ValueResult<Self> {
        if !is_key_type(value.ty()) {
            return Err(ValueError::InvalidMapKey(value.ty().clone()));
        }
        Self::of(value).ok_or_else(|| ValueError::InvalidMapKey(value.ty().clone()))
    }

    /// Rebuild the value this key was projected from.
    pub fn to_value(&self, ty: &Type) -> ValueResult<Value> {
        if !self.fits(ty) {
            return Err(ValueError::InvalidMapKey(ty.clone()));
        }
        let data = match self {
            Self::Bool(b) => Data::Bool(*b),
            Self::Int(v) => Data::Int(*v),
            Self::Uint(v) => Data::Uint(*v),
            Self::Float(bits) => Data::Float(f64::from_bits(*bits)),
            Self::Str(s) => Data::Str(s.clone()),
            Self::Handle(h) => Data::Handle(*h),
            Self::Pointer(_) => return Err(ValueError::InvalidMapKey(ty.clone())),
        };
        Ok(Value::from_parts(ty.clone(), data))
    }

    /// Returns `true` for a NaN float key. NaN never equals itself, so
    /// set lookups must not match it.
    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Float(bits) if f64::from_bits(*bits).is_nan())
    }

    /// Returns `true` if this key can belong to a map keyed by `ty`.
    pub fn fits(&self, ty: &Type) -> bool {
        matches!(
            (self, ty.kind()),
            (Self::Bool(_), Kind::Bool)
                | (Self::Int(_), Kind::Int)
                | (Self::Uint(_), Kind::Uint)
                | (Self::Float(_), Kind::Float)
                | (Self::Str(_), Kind::String)
                | (Self::Handle(_), Kind::Handle)
        )
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Str(s) => f.write_str(s),
            Self::Handle(h) => write!(f, "{h:#x}"),
            Self::Pointer(Some(id)) => write!(f, "{id}"),
            Self::Pointer(None) => f.write_str("nil"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Key {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
