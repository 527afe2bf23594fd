use std::fmt;
use std::sync::Arc;

/// Bit width of an integer family type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    /// Number of bits in this width.
    pub fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }
}

/// Precision of a floating or complex family type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    W32,
    W64,
}

impl FloatWidth {
    /// Number of bits in one floating component.
    pub fn bits(self) -> u32 {
        match self {
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }
}

/// A named member of a struct type.
///
/// Fields that are not `exported` are invisible to the merge engine: a struct
/// carrying any such field is merged as a single opaque unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub exported: bool,
}

impl Field {
    /// A field visible to the merge engine.
    pub fn exported(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            exported: true,
        }
    }

    /// A field hidden from the merge engine.
    pub fn hidden(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            exported: false,
        }
    }
}

/// The structure of a type, independent of its name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Bool,
    Int(IntWidth),
    Uint(IntWidth),
    Float(FloatWidth),
    Complex(FloatWidth),
    String,
    Struct(Vec<Field>),
    Map { key: Type, value: Type },
    Slice(Type),
    Pointer(Type),
    /// A slot that may hold a value of any concrete type.
    Dynamic,
    /// An opaque, raw-pointer-like token compared by identity.
    Handle,
}

/// Flat classification of a [`Shape`], used for dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    Complex,
    String,
    Struct,
    Map,
    Slice,
    Pointer,
    Dynamic,
    Handle,
}

impl Kind {
    /// Returns `true` for kinds without sub-values.
    pub fn is_scalar(self) -> bool {
        !matches!(
            self,
            Self::Struct | Self::Map | Self::Slice | Self::Pointer | Self::Dynamic
        )
    }

    /// Returns `true` for the signed, unsigned and floating families.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Uint | Self::Float)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Complex => "complex",
            Self::String => "string",
            Self::Struct => "struct",
            Self::Map => "map",
            Self::Slice => "slice",
            Self::Pointer => "pointer",
            Self::Dynamic => "dynamic",
            Self::Handle => "handle",
        };
        f.write_str(name)
    }
}

#[derive(PartialEq, Eq, Hash)]
struct TypeDef {
    name: Option<String>,
    shape: Shape,
}

/// A runtime type descriptor.
///
/// `Type` is a cheap-to-clone handle. Two types are equal when both their
/// names and shapes are equal, so a named type is distinct from its
/// underlying type and from any other name over the same shape.
#[derive(Clone, Eq, Hash)]
pub struct Type(Arc<TypeDef>);

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Type {
    fn unnamed(shape: Shape) -> Self {
        Self(Arc::new(TypeDef { name: None, shape }))
    }

    /// Build an unnamed type from a shape.
    pub fn from_shape(shape: Shape) -> Self {
        Self::unnamed(shape)
    }

    /// A named type over the shape of `underlying`.
    ///
    /// Naming an already-named type replaces the name.
    pub fn named(name: impl Into<String>, underlying: Type) -> Self {
        Self(Arc::new(TypeDef {
            name: Some(name.into()),
            shape: underlying.0.shape.clone(),
        }))
    }

    pub fn bool() -> Self {
        Self::unnamed(Shape::Bool)
    }

    pub fn int(width: IntWidth) -> Self {
        Self::unnamed(Shape::Int(width))
    }

    pub fn uint(width: IntWidth) -> Self {
        Self::unnamed(Shape::Uint(width))
    }

    pub fn float(width: FloatWidth) -> Self {
        Self::unnamed(Shape::Float(width))
    }

    pub fn complex(width: FloatWidth) -> Self {
        Self::unnamed(Shape::Complex(width))
    }

    pub fn i8() -> Self {
        Self::int(IntWidth::W8)
    }

    pub fn i16() -> Self {
        Self::int(IntWidth::W16)
    }

    pub fn i32() -> Self {
        Self::int(IntWidth::W32)
    }

    pub fn i64() -> Self {
        Self::int(IntWidth::W64)
    }

    pub fn u8() -> Self {
        Self::uint(IntWidth::W8)
    }

    pub fn u16() -> Self {
        Self::uint(IntWidth::W16)
    }

    pub fn u32() -> Self {
        Self::uint(IntWidth::W32)
    }

    pub fn u64() -> Self {
        Self::uint(IntWidth::W64)
    }

    pub fn f32() -> Self {
        Self::float(FloatWidth::W32)
    }

    pub fn f64() -> Self {
        Self::float(FloatWidth::W64)
    }

    pub fn string() -> Self {
        Self::unnamed(Shape::String)
    }

    /// The dynamic "any value" type.
    pub fn any() -> Self {
        Self::unnamed(Shape::Dynamic)
    }

    pub fn handle() -> Self {
        Self::unnamed(Shape::Handle)
    }

    pub fn slice(elem: Type) -> Self {
        Self::unnamed(Shape::Slice(elem))
    }

    pub fn map(key: Type, value: Type) -> Self {
        Self::unnamed(Shape::Map { key, value })
    }

    pub fn pointer(elem: Type) -> Self {
        Self::unnamed(Shape::Pointer(elem))
    }

    pub fn structure(fields: Vec<Field>) -> Self {
        Self::unnamed(Shape::Struct(fields))
    }

    /// The declared name, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn shape(&self) -> &Shape {
        &self.0.shape
    }

    pub fn kind(&self) -> Kind {
        match &self.0.shape {
            Shape::Bool => Kind::Bool,
            Shape::Int(_) => Kind::Int,
            Shape::Uint(_) => Kind::Uint,
            Shape::Float(_) => Kind::Float,
            Shape::Complex(_) => Kind::Complex,
            Shape::String => Kind::String,
            Shape::Struct(_) => Kind::Struct,
            Shape::Map { .. } => Kind::Map,
            Shape::Slice(_) => Kind::Slice,
            Shape::Pointer(_) => Kind::Pointer,
            Shape::Dynamic => Kind::Dynamic,
            Shape::Handle => Kind::Handle,
        }
    }

    /// Element type of a slice or pointer, value type of a map.
    pub fn elem(&self) -> Option<&Type> {
        match &self.0.shape {
            Shape::Slice(elem) | Shape::Pointer(elem) => Some(elem),
            Shape::Map { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Key type of a map.
    pub fn key(&self) -> Option<&Type> {
        match &self.0.shape {
            Shape::Map { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Fields of a struct type; empty for every other shape.
    pub fn fields(&self) -> &[Field] {
        match &self.0.shape {
            Shape::Struct(fields) => fields,
            _ => &[],
        }
    }

    /// Returns `true` if any struct field is invisible to the merge engine.
    pub fn has_hidden_fields(&self) -> bool {
        self.fields().iter().any(|f| !f.exported)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.0.name {
            return f.write_str(name);
        }
        match &self.0.shape {
            Shape::Bool => f.write_str("bool"),
            Shape::Int(w) => write!(f, "i{}", w.bits()),
            Shape::Uint(w) => write!(f, "u{}", w.bits()),
            Shape::Float(w) => write!(f, "f{}", w.bits()),
            Shape::Complex(w) => write!(f, "c{}", w.bits() * 2),
            Shape::String => f.write_str("string"),
            Shape::Struct(fields) => {
                f.write_str("struct {")?;
                for (i, field) in fields.iter().enumerate() {
                    let sep = if i == 0 { " " } else { "; " };
                    write!(f, "{sep}{} {}", field.name, field.ty)?;
                }
                f.write_str(" }")
            }
            Shape::Map { key, value } => write!(f, "map[{key}]{value}"),
            Shape::Slice(elem) => write!(f, "[]{elem}"),
            Shape::Pointer(elem) => write!(f, "*{elem}"),
            Shape::Dynamic => f.write_str("any"),
            Shape::Handle => f.write_str("handle"),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({self})")
    }
}
