//! The [`Value`] handle and its tagged payload.
//!
//! Every value carries its declared [`Type`] next to a [`Data`] payload whose
//! variant matches the type's kind. Container payloads use `None` for nil.
//! Elements stored in a container always carry exactly the container's
//! element type; a concrete value stored into a dynamic slot is wrapped on
//! the way in.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ValueError, ValueResult};
use crate::key::{is_key_type, Key};
use crate::ty::{Kind, Shape, Type};

static NEXT_PTR_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a pointer allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PtrId(u64);

impl PtrId {
    fn fresh() -> Self {
        Self(NEXT_PTR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PtrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ptr#{}", self.0)
    }
}

/// An owned pointee with a stable identity.
///
/// Cloning a `Ptr` keeps its identity, which is how aliasing is expressed:
/// two clones are "the same pointer" even though each owns its own copy of
/// the pointee. Equality compares pointees; use [`Ptr::same`] for identity.
#[derive(Clone, Debug)]
pub struct Ptr {
    id: PtrId,
    target: Box<Value>,
}

impl Ptr {
    /// Allocate a new pointer with a fresh identity.
    pub fn new(target: Value) -> Self {
        Self {
            id: PtrId::fresh(),
            target: Box::new(target),
        }
    }

    pub fn id(&self) -> PtrId {
        self.id
    }

    pub fn get(&self) -> &Value {
        &self.target
    }

    pub fn get_mut(&mut self) -> &mut Value {
        &mut self.target
    }

    pub fn into_inner(self) -> Value {
        *self.target
    }

    /// Returns `true` if both pointers share one identity.
    pub fn same(a: &Ptr, b: &Ptr) -> bool {
        a.id == b.id
    }
}

impl PartialEq for Ptr {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}

/// Tagged payload of a [`Value`].
#[derive(Clone, Debug, PartialEq)]
pub enum Data {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(f64, f64),
    Str(String),
    Struct(Vec<Value>),
    Map(Option<BTreeMap<Key, Value>>),
    Slice(Option<Vec<Value>>),
    Pointer(Option<Ptr>),
    Dynamic(Option<Box<Value>>),
    Handle(u64),
}

impl Data {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Bool(_) => Kind::Bool,
            Self::Int(_) => Kind::Int,
            Self::Uint(_) => Kind::Uint,
            Self::Float(_) => Kind::Float,
            Self::Complex(..) => Kind::Complex,
            Self::Str(_) => Kind::String,
            Self::Struct(_) => Kind::Struct,
            Self::Map(_) => Kind::Map,
            Self::Slice(_) => Kind::Slice,
            Self::Pointer(_) => Kind::Pointer,
            Self::Dynamic(_) => Kind::Dynamic,
            Self::Handle(_) => Kind::Handle,
        }
    }
}

/// A runtime value together with its declared type.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    ty: Type,
    data: Data,
}

/// Make `value` fit a slot of type `slot`, wrapping it when the slot is dynamic.
fn fit(slot: &Type, value: Value) -> ValueResult<Value> {
    if value.ty == *slot {
        return Ok(value);
    }
    if slot.kind() == Kind::Dynamic {
        return Ok(Value::dynamic(value));
    }
    Err(ValueError::ShapeMismatch {
        expected: slot.clone(),
        found: value.ty,
    })
}

fn expect_type(expected: &Type, value: &Value) -> ValueResult<()> {
    if value.ty == *expected {
        Ok(())
    } else {
        Err(ValueError::ShapeMismatch {
            expected: expected.clone(),
            found: value.ty.clone(),
        })
    }
}

fn check(ty: &Type, data: &Data) -> ValueResult<()> {
    match (ty.shape(), data) {
        (Shape::Bool, Data::Bool(_))
        | (Shape::Int(_), Data::Int(_))
        | (Shape::Uint(_), Data::Uint(_))
        | (Shape::Float(_), Data::Float(_))
        | (Shape::Complex(_), Data::Complex(..))
        | (Shape::String, Data::Str(_))
        | (Shape::Handle, Data::Handle(_)) => Ok(()),
        (Shape::Struct(fields), Data::Struct(values)) => {
            if fields.len() != values.len() {
                return Err(ValueError::FieldCount {
                    ty: ty.clone(),
                    expected: fields.len(),
                    actual: values.len(),
                });
            }
            fields
                .iter()
                .zip(values)
                .try_for_each(|(field, value)| expect_type(&field.ty, value))
        }
        (Shape::Map { key, value }, Data::Map(entries)) => {
            if !is_key_type(key) {
                return Err(ValueError::InvalidMapKey(key.clone()));
            }
            for (k, v) in entries.iter().flatten() {
                if !k.fits(key) {
                    return Err(ValueError::InvalidMapKey(key.clone()));
                }
                expect_type(value, v)?;
            }
            Ok(())
        }
        (Shape::Slice(elem), Data::Slice(items)) => {
            items.iter().flatten().try_for_each(|v| expect_type(elem, v))
        }
        (Shape::Pointer(elem), Data::Pointer(ptr)) => match ptr {
            Some(ptr) => expect_type(elem, ptr.get()),
            None => Ok(()),
        },
        (Shape::Dynamic, Data::Dynamic(inner)) => match inner {
            Some(inner) if inner.kind() == Kind::Dynamic => Err(ValueError::ShapeMismatch {
                expected: Type::any(),
                found: inner.ty.clone(),
            }),
            _ => Ok(()),
        },
        _ => Err(ValueError::PayloadMismatch {
            ty: ty.clone(),
            payload: data.kind(),
        }),
    }
}

impl Value {
    // ---------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------

    /// Build a value, checking that the payload fits the declared type.
    ///
    /// Only the outermost layer is checked; nested values are assumed to be
    /// well formed, which holds for anything built through this API.
    pub fn new(ty: Type, data: Data) -> ValueResult<Self> {
        check(&ty, &data)?;
        Ok(Self { ty, data })
    }

    /// Build a value without checking the payload.
    #[doc(hidden)]
    pub fn from_parts(ty: Type, data: Data) -> Self {
        debug_assert!(check(&ty, &data).is_ok(), "payload does not fit {ty}");
        Self { ty, data }
    }

    /// The zero value of a type: nil for containers, pointers and dynamic
    /// slots, zeroed fields for structs.
    pub fn zero(ty: &Type) -> Self {
        let data = match ty.shape() {
            Shape::Bool => Data::Bool(false),
            Shape::Int(_) => Data::Int(0),
            Shape::Uint(_) => Data::Uint(0),
            Shape::Float(_) => Data::Float(0.0),
            Shape::Complex(_) => Data::Complex(0.0, 0.0),
            Shape::String => Data::Str(String::new()),
            Shape::Struct(fields) => {
                Data::Struct(fields.iter().map(|f| Value::zero(&f.ty)).collect())
            }
            Shape::Map { .. } => Data::Map(None),
            Shape::Slice(_) => Data::Slice(None),
            Shape::Pointer(_) => Data::Pointer(None),
            Shape::Dynamic => Data::Dynamic(None),
            Shape::Handle => Data::Handle(0),
        };
        Self {
            ty: ty.clone(),
            data,
        }
    }

    pub fn bool(b: bool) -> Self {
        Self::from_parts(Type::bool(), Data::Bool(b))
    }

    pub fn i8(v: i8) -> Self {
        Self::from_parts(Type::i8(), Data::Int(v.into()))
    }

    pub fn i16(v: i16) -> Self {
        Self::from_parts(Type::i16(), Data::Int(v.into()))
    }

    pub fn i32(v: i32) -> Self {
        Self::from_parts(Type::i32(), Data::Int(v.into()))
    }

    pub fn i64(v: i64) -> Self {
        Self::from_parts(Type::i64(), Data::Int(v))
    }

    pub fn u8(v: u8) -> Self {
        Self::from_parts(Type::u8(), Data::Uint(v.into()))
    }

    pub fn u16(v: u16) -> Self {
        Self::from_parts(Type::u16(), Data::Uint(v.into()))
    }

    pub fn u32(v: u32) -> Self {
        Self::from_parts(Type::u32(), Data::Uint(v.into()))
    }

    pub fn u64(v: u64) -> Self {
        Self::from_parts(Type::u64(), Data::Uint(v))
    }

    pub fn f32(v: f32) -> Self {
        Self::from_parts(Type::f32(), Data::Float(v.into()))
    }

    pub fn f64(v: f64) -> Self {
        Self::from_parts(Type::f64(), Data::Float(v))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::from_parts(Type::string(), Data::Str(s.into()))
    }

    pub fn handle(h: u64) -> Self {
        Self::from_parts(Type::handle(), Data::Handle(h))
    }

    /// A non-nil slice of `elem`. Concrete items are wrapped when `elem`
    /// is the dynamic type.
    pub fn slice(elem: Type, items: impl IntoIterator<Item = Value>) -> ValueResult<Self> {
        let items = items
            .into_iter()
            .map(|item| fit(&elem, item))
            .collect::<ValueResult<Vec<_>>>()?;
        Ok(Self::from_parts(Type::slice(elem), Data::Slice(Some(items))))
    }

    /// A non-nil map from `key` to `value`.
    pub fn map(
        key: Type,
        value: Type,
        entries: impl IntoIterator<Item = (Value, Value)>,
    ) -> ValueResult<Self> {
        if !is_key_type(&key) {
            return Err(ValueError::InvalidMapKey(key));
        }
        let mut map = BTreeMap::new();
        for (k, v) in entries {
            expect_type(&key, &k)?;
            map.insert(Key::from_value(&k)?, fit(&value, v)?);
        }
        Ok(Self::from_parts(Type::map(key, value), Data::Map(Some(map))))
    }

    /// A struct value; `fields` are given in declaration order.
    pub fn structure(ty: Type, fields: Vec<Value>) -> ValueResult<Self> {
        let declared = ty.fields();
        if declared.len() != fields.len() {
            return Err(ValueError::FieldCount {
                expected: declared.len(),
                actual: fields.len(),
                ty,
            });
        }
        let fields = declared
            .iter()
            .zip(fields)
            .map(|(field, value)| fit(&field.ty, value))
            .collect::<ValueResult<Vec<_>>>()?;
        Self::new(ty, Data::Struct(fields))
    }

    /// A pointer to `target` with a fresh identity.
    pub fn pointer(target: Value) -> Self {
        Self::from_parts(
            Type::pointer(target.ty.clone()),
            Data::Pointer(Some(Ptr::new(target))),
        )
    }

    /// Wrap a concrete value in a dynamic slot. Dynamic values are returned
    /// unchanged, so dynamic slots never nest.
    pub fn dynamic(value: Value) -> Self {
        if value.kind() == Kind::Dynamic {
            return value;
        }
        Self::from_parts(Type::any(), Data::Dynamic(Some(Box::new(value))))
    }

    /// The nil dynamic value.
    pub fn nil() -> Self {
        Self::zero(&Type::any())
    }

    // ---------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn kind(&self) -> Kind {
        self.data.kind()
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn into_data(self) -> Data {
        self.data
    }

    /// Returns `true` for nil maps, slices, pointers and dynamic slots.
    pub fn is_nil(&self) -> bool {
        matches!(
            self.data,
            Data::Map(None) | Data::Slice(None) | Data::Pointer(None) | Data::Dynamic(None)
        )
    }

    /// Returns `true` if the value is "empty" for its kind.
    ///
    /// Containers and text are empty at length zero, booleans when `false`,
    /// numbers at zero, pointers and dynamic slots when nil. Structs, complex
    /// numbers and handles are never empty.
    pub fn is_empty(&self) -> bool {
        match &self.data {
            Data::Map(m) => m.as_ref().map_or(true, BTreeMap::is_empty),
            Data::Slice(s) => s.as_ref().map_or(true, Vec::is_empty),
            Data::Str(s) => s.is_empty(),
            Data::Bool(b) => !b,
            Data::Int(v) => *v == 0,
            Data::Uint(v) => *v == 0,
            Data::Float(v) => *v == 0.0,
            Data::Pointer(p) => p.is_none(),
            Data::Dynamic(d) => d.is_none(),
            Data::Complex(..) | Data::Struct(_) | Data::Handle(_) => false,
        }
    }

    /// The concrete value behind a dynamic slot, or `self` for any other
    /// kind. `None` for a nil dynamic slot.
    pub fn concrete(&self) -> Option<&Value> {
        match &self.data {
            Data::Dynamic(inner) => inner.as_deref(),
            _ => Some(self),
        }
    }

    /// Mutable counterpart of [`Value::concrete`].
    pub fn concrete_mut(&mut self) -> Option<&mut Value> {
        if !matches!(self.data, Data::Dynamic(_)) {
            return Some(self);
        }
        match &mut self.data {
            Data::Dynamic(inner) => inner.as_deref_mut(),
            _ => None,
        }
    }

    /// Type of the concrete value; `any` for a nil dynamic slot.
    pub fn concrete_type(&self) -> &Type {
        self.concrete().map_or(&self.ty, |c| &c.ty)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            Data::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.data {
            Data::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.data {
            Data::Uint(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.data {
            Data::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<(f64, f64)> {
        match self.data {
            Data::Complex(re, im) => Some((re, im)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            Data::Str(s) => Some(s),
            _ => None,
        }
    }

    // ---------------------------------------------------------------
    // Structs
    // ---------------------------------------------------------------

    pub fn fields(&self) -> Option<&[Value]> {
        match &self.data {
            Data::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Mutable field slots. Replacements must keep each field's type.
    pub fn fields_mut(&mut self) -> Option<&mut [Value]> {
        match &mut self.data {
            Data::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a struct field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        let index = self.ty.fields().iter().position(|f| f.name == name)?;
        self.fields()?.get(index)
    }

    // ---------------------------------------------------------------
    // Maps
    // ---------------------------------------------------------------

    /// Entries of a non-nil map.
    pub fn entries(&self) -> Option<&BTreeMap<Key, Value>> {
        match &self.data {
            Data::Map(entries) => entries.as_ref(),
            _ => None,
        }
    }

    /// Entries of a map, allocating an empty one if the map is nil.
    ///
    /// Inserted values must carry the map's value type.
    pub fn entries_mut(&mut self) -> Option<&mut BTreeMap<Key, Value>> {
        match &mut self.data {
            Data::Map(entries) => Some(entries.get_or_insert_with(BTreeMap::new)),
            _ => None,
        }
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries()?.get(key)
    }

    /// Insert into a map, allocating it if nil.
    pub fn insert(&mut self, key: Value, value: Value) -> ValueResult<Option<Value>> {
        let not_a_map = ValueError::PayloadMismatch {
            ty: self.ty.clone(),
            payload: self.kind(),
        };
        let (Some(key_ty), Some(value_ty)) = (self.ty.key().cloned(), self.ty.elem().cloned())
        else {
            return Err(not_a_map);
        };
        expect_type(&key_ty, &key)?;
        let key = Key::from_value(&key)?;
        let value = fit(&value_ty, value)?;
        let Some(entries) = self.entries_mut() else {
            return Err(not_a_map);
        };
        Ok(entries.insert(key, value))
    }

    // ---------------------------------------------------------------
    // Slices
    // ---------------------------------------------------------------

    /// Elements of a non-nil slice.
    pub fn elements(&self) -> Option<&[Value]> {
        match &self.data {
            Data::Slice(items) => items.as_deref(),
            _ => None,
        }
    }

    /// Append to a slice, allocating it if nil.
    pub fn extend(&mut self, items: impl IntoIterator<Item = Value>) -> ValueResult<()> {
        let Some(elem) = self.ty.elem().filter(|_| self.kind() == Kind::Slice).cloned() else {
            return Err(ValueError::PayloadMismatch {
                ty: self.ty.clone(),
                payload: self.kind(),
            });
        };
        let items = items
            .into_iter()
            .map(|item| fit(&elem, item))
            .collect::<ValueResult<Vec<_>>>()?;
        if let Data::Slice(slot) = &mut self.data {
            slot.get_or_insert_with(Vec::new).extend(items);
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Pointers
    // ---------------------------------------------------------------

    pub fn ptr(&self) -> Option<&Ptr> {
        match &self.data {
            Data::Pointer(ptr) => ptr.as_ref(),
            _ => None,
        }
    }

    pub fn pointee(&self) -> Option<&Value> {
        self.ptr().map(Ptr::get)
    }

    pub fn pointee_mut(&mut self) -> Option<&mut Value> {
        match &mut self.data {
            Data::Pointer(ptr) => ptr.as_mut().map(Ptr::get_mut),
            _ => None,
        }
    }

    /// The pointee, allocating a zero pointee with a fresh identity if the
    /// pointer is nil. `None` if the value is not a pointer.
    pub fn ensure_pointee(&mut self) -> Option<&mut Value> {
        match &mut self.data {
            Data::Pointer(slot) => {
                if slot.is_none() {
                    let elem = self.ty.elem()?;
                    *slot = Some(Ptr::new(Value::zero(elem)));
                }
                slot.as_mut().map(Ptr::get_mut)
            }
            _ => None,
        }
    }

    pub fn into_pointee(self) -> Option<Value> {
        match self.data {
            Data::Pointer(ptr) => ptr.map(Ptr::into_inner),
            _ => None,
        }
    }
}
