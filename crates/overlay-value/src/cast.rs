//! Native value conversion between compatible primitive types.

use crate::compat::convertible;
use crate::error::{ValueError, ValueResult};
use crate::ty::{FloatWidth, IntWidth, Shape, Type};
use crate::value::{Data, Value};

fn wrap_signed(v: i64, width: IntWidth) -> i64 {
    match width {
        IntWidth::W8 => i64::from(v as i8),
        IntWidth::W16 => i64::from(v as i16),
        IntWidth::W32 => i64::from(v as i32),
        IntWidth::W64 => v,
    }
}

fn wrap_unsigned(v: u64, width: IntWidth) -> u64 {
    match width {
        IntWidth::W8 => u64::from(v as u8),
        IntWidth::W16 => u64::from(v as u16),
        IntWidth::W32 => u64::from(v as u32),
        IntWidth::W64 => v,
    }
}

fn round_float(v: f64, width: FloatWidth) -> f64 {
    match width {
        FloatWidth::W32 => f64::from(v as f32),
        FloatWidth::W64 => v,
    }
}

impl Value {
    /// Convert this value to `to`, the way a native numeric or text cast
    /// would.
    ///
    /// Integer targets wrap to their width, floats truncate toward zero
    /// (saturating) when cast to integers, and 32-bit float targets round to
    /// single precision. A dynamic value is cast through its concrete value.
    pub fn cast(&self, to: &Type) -> ValueResult<Value> {
        let from = self
            .concrete()
            .ok_or_else(|| ValueError::UnexpectedNil(self.ty().clone()))?;
        let unsupported = || ValueError::UnsupportedCast {
            from: from.ty().clone(),
            to: to.clone(),
        };
        if !convertible(to, from.ty()) {
            return Err(unsupported());
        }

        let data = match (from.data(), to.shape()) {
            (Data::Int(v), Shape::Int(w)) => Data::Int(wrap_signed(*v, *w)),
            (Data::Uint(v), Shape::Int(w)) => Data::Int(wrap_signed(*v as i64, *w)),
            (Data::Float(v), Shape::Int(w)) => Data::Int(wrap_signed(*v as i64, *w)),
            (Data::Int(v), Shape::Uint(w)) => Data::Uint(wrap_unsigned(*v as u64, *w)),
            (Data::Uint(v), Shape::Uint(w)) => Data::Uint(wrap_unsigned(*v, *w)),
            (Data::Float(v), Shape::Uint(w)) => Data::Uint(wrap_unsigned(*v as u64, *w)),
            (Data::Int(v), Shape::Float(w)) => Data::Float(round_float(*v as f64, *w)),
            (Data::Uint(v), Shape::Float(w)) => Data::Float(round_float(*v as f64, *w)),
            (Data::Float(v), Shape::Float(w)) => Data::Float(round_float(*v, *w)),
            (Data::Complex(re, im), Shape::Complex(w)) => {
                Data::Complex(round_float(*re, *w), round_float(*im, *w))
            }
            (Data::Str(s), Shape::String) => Data::Str(s.clone()),
            _ => return Err(unsupported()),
        };
        Ok(Value::from_parts(to.clone(), data))
    }
}
