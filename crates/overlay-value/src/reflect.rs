//! Bridge between Rust types and [`Value`].
//!
//! [`Reflect`] describes a Rust type as a [`Type`] and moves values across
//! the boundary. Implementations cover primitives, `String`, `Vec`, `Option`
//! and `Box` (as pointers), `BTreeMap`/`HashMap`, and [`Value`] itself (as the
//! dynamic type). Structs opt in through [`reflect_struct!`](crate::reflect_struct).

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::error::{ValueError, ValueResult};
use crate::key::Key;
use crate::ty::{Kind, Type};
use crate::value::{Data, Value};

/// A Rust type with a runtime [`Type`] description.
pub trait Reflect: Sized {
    fn reflect_type() -> Type;

    fn to_value(&self) -> Value;

    /// Read a value back. The value must carry exactly [`Self::reflect_type`].
    fn from_value(value: Value) -> ValueResult<Self>;
}

/// A [`Reflect`] type usable as a map key.
pub trait ReflectKey: Reflect {
    fn to_key(&self) -> Key;

    fn from_key(key: &Key) -> ValueResult<Self> {
        Self::from_value(key.to_value(&Self::reflect_type())?)
    }
}

fn expect(value: &Value, expected: &Type) -> ValueResult<()> {
    if value.ty() == expected {
        Ok(())
    } else {
        Err(ValueError::Reflect {
            expected: expected.clone(),
            found: value.ty().clone(),
        })
    }
}

fn mismatch(value: &Value, expected: Type) -> ValueError {
    ValueError::Reflect {
        expected,
        found: value.ty().clone(),
    }
}

/// Fields of a struct value, after checking its type.
#[doc(hidden)]
pub fn struct_fields(value: Value, expected: &Type) -> ValueResult<std::vec::IntoIter<Value>> {
    expect(&value, expected)?;
    match value.into_data() {
        Data::Struct(fields) => Ok(fields.into_iter()),
        other => Err(ValueError::PayloadMismatch {
            ty: expected.clone(),
            payload: other.kind(),
        }),
    }
}

/// Read the next field of a struct being rebuilt.
#[doc(hidden)]
pub fn next_field<T: Reflect>(
    fields: &mut impl Iterator<Item = Value>,
    ty: &Type,
) -> ValueResult<T> {
    let value = fields.next().ok_or_else(|| ValueError::FieldCount {
        ty: ty.clone(),
        expected: ty.fields().len(),
        actual: ty.fields().len() - 1,
    })?;
    T::from_value(value)
}

macro_rules! reflect_integer {
    ($($t:ty => $ty:expr, $variant:ident, $wide:ty;)*) => {$(
        impl Reflect for $t {
            fn reflect_type() -> Type {
                $ty
            }

            fn to_value(&self) -> Value {
                Value::from_parts(Self::reflect_type(), Data::$variant(*self as $wide))
            }

            fn from_value(value: Value) -> ValueResult<Self> {
                expect(&value, &Self::reflect_type())?;
                match value.data() {
                    Data::$variant(v) => <$t>::try_from(*v).map_err(|_| ValueError::OutOfRange {
                        value: v.to_string(),
                        target: stringify!($t),
                    }),
                    _ => Err(mismatch(&value, Self::reflect_type())),
                }
            }
        }

        impl ReflectKey for $t {
            fn to_key(&self) -> Key {
                Key::$variant(*self as $wide)
            }
        }
    )*};
}

reflect_integer! {
    i8 => Type::i8(), Int, i64;
    i16 => Type::i16(), Int, i64;
    i32 => Type::i32(), Int, i64;
    i64 => Type::i64(), Int, i64;
    isize => Type::i64(), Int, i64;
    u8 => Type::u8(), Uint, u64;
    u16 => Type::u16(), Uint, u64;
    u32 => Type::u32(), Uint, u64;
    u64 => Type::u64(), Uint, u64;
    usize => Type::u64(), Uint, u64;
}

impl Reflect for bool {
    fn reflect_type() -> Type {
        Type::bool()
    }

    fn to_value(&self) -> Value {
        Value::bool(*self)
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        expect(&value, &Type::bool())?;
        value.as_bool().ok_or_else(|| mismatch(&value, Type::bool()))
    }
}

impl ReflectKey for bool {
    fn to_key(&self) -> Key {
        Key::Bool(*self)
    }
}

impl Reflect for f32 {
    fn reflect_type() -> Type {
        Type::f32()
    }

    fn to_value(&self) -> Value {
        Value::f32(*self)
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        expect(&value, &Type::f32())?;
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| mismatch(&value, Type::f32()))
    }
}

impl Reflect for f64 {
    fn reflect_type() -> Type {
        Type::f64()
    }

    fn to_value(&self) -> Value {
        Value::f64(*self)
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        expect(&value, &Type::f64())?;
        value.as_f64().ok_or_else(|| mismatch(&value, Type::f64()))
    }
}

impl Reflect for String {
    fn reflect_type() -> Type {
        Type::string()
    }

    fn to_value(&self) -> Value {
        Value::string(self.clone())
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        expect(&value, &Type::string())?;
        match value.into_data() {
            Data::Str(s) => Ok(s),
            other => Err(ValueError::PayloadMismatch {
                ty: Type::string(),
                payload: other.kind(),
            }),
        }
    }
}

impl ReflectKey for String {
    fn to_key(&self) -> Key {
        Key::Str(self.clone())
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect_type() -> Type {
        Type::slice(T::reflect_type())
    }

    fn to_value(&self) -> Value {
        let items = self.iter().map(Reflect::to_value).collect();
        Value::from_parts(Self::reflect_type(), Data::Slice(Some(items)))
    }

    /// A nil slice reads back as an empty `Vec`.
    fn from_value(value: Value) -> ValueResult<Self> {
        expect(&value, &Self::reflect_type())?;
        match value.into_data() {
            Data::Slice(items) => items
                .unwrap_or_default()
                .into_iter()
                .map(T::from_value)
                .collect(),
            other => Err(ValueError::PayloadMismatch {
                ty: Self::reflect_type(),
                payload: other.kind(),
            }),
        }
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn reflect_type() -> Type {
        Type::pointer(T::reflect_type())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => Value::pointer(inner.to_value()),
            None => Value::zero(&Self::reflect_type()),
        }
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        expect(&value, &Self::reflect_type())?;
        value.into_pointee().map(T::from_value).transpose()
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn reflect_type() -> Type {
        Type::pointer(T::reflect_type())
    }

    fn to_value(&self) -> Value {
        Value::pointer(self.as_ref().to_value())
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        expect(&value, &Self::reflect_type())?;
        let inner = value
            .into_pointee()
            .ok_or_else(|| ValueError::UnexpectedNil(Self::reflect_type()))?;
        T::from_value(inner).map(Box::new)
    }
}

impl<K: ReflectKey + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn reflect_type() -> Type {
        Type::map(K::reflect_type(), V::reflect_type())
    }

    fn to_value(&self) -> Value {
        let entries = self.iter().map(|(k, v)| (k.to_key(), v.to_value())).collect();
        Value::from_parts(Self::reflect_type(), Data::Map(Some(entries)))
    }

    /// A nil map reads back as an empty map.
    fn from_value(value: Value) -> ValueResult<Self> {
        expect(&value, &Self::reflect_type())?;
        match value.into_data() {
            Data::Map(entries) => entries
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| Ok((K::from_key(&k)?, V::from_value(v)?)))
                .collect(),
            other => Err(ValueError::PayloadMismatch {
                ty: Self::reflect_type(),
                payload: other.kind(),
            }),
        }
    }
}

impl<K: ReflectKey + Eq + Hash, V: Reflect> Reflect for HashMap<K, V> {
    fn reflect_type() -> Type {
        Type::map(K::reflect_type(), V::reflect_type())
    }

    fn to_value(&self) -> Value {
        let entries = self.iter().map(|(k, v)| (k.to_key(), v.to_value())).collect();
        Value::from_parts(Self::reflect_type(), Data::Map(Some(entries)))
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        expect(&value, &Self::reflect_type())?;
        match value.into_data() {
            Data::Map(entries) => entries
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| Ok((K::from_key(&k)?, V::from_value(v)?)))
                .collect(),
            other => Err(ValueError::PayloadMismatch {
                ty: Self::reflect_type(),
                payload: other.kind(),
            }),
        }
    }
}

/// `Value` reflects as the dynamic type: it is stored wrapped and read back
/// as its concrete value (or the nil dynamic value).
impl Reflect for Value {
    fn reflect_type() -> Type {
        Type::any()
    }

    fn to_value(&self) -> Value {
        Value::dynamic(self.clone())
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        if value.kind() != Kind::Dynamic {
            return Ok(value);
        }
        match value.into_data() {
            Data::Dynamic(Some(inner)) => Ok(*inner),
            _ => Ok(Value::nil()),
        }
    }
}

/// Declare a struct and implement [`Reflect`] for it.
///
/// A field is visible to the merge engine iff it is declared with a
/// visibility qualifier. Any private field makes the whole struct opaque,
/// so it is merged as a single unit.
///
/// ```
/// use overlay_value::{reflect_struct, Reflect};
///
/// reflect_struct! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Listener {
///         pub host: String,
///         pub port: u16,
///     }
/// }
///
/// let ty = Listener::reflect_type();
/// assert!(!ty.has_hidden_fields());
/// assert_eq!(ty.to_string(), "Listener");
/// ```
#[macro_export]
macro_rules! reflect_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field : $fty ),*
        }

        impl $crate::Reflect for $name {
            fn reflect_type() -> $crate::Type {
                $crate::Type::named(
                    stringify!($name),
                    $crate::Type::structure(vec![
                        $( $crate::Field {
                            name: stringify!($field).to_owned(),
                            ty: <$fty as $crate::Reflect>::reflect_type(),
                            exported: !stringify!($fvis).is_empty(),
                        } ),*
                    ]),
                )
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::from_parts(
                    <Self as $crate::Reflect>::reflect_type(),
                    $crate::Data::Struct(vec![ $( $crate::Reflect::to_value(&self.$field) ),* ]),
                )
            }

            fn from_value(value: $crate::Value) -> $crate::ValueResult<Self> {
                let ty = <Self as $crate::Reflect>::reflect_type();
                #[allow(unused_mut)]
                let mut fields = $crate::reflect::struct_fields(value, &ty)?;
                Ok(Self {
                    $( $field: $crate::reflect::next_field(&mut fields, &ty)? ),*
                })
            }
        }
    };
}
