//! Merging between values of different types.

use overlay_value::{convertible, Kind, Type, Value};
use tracing::debug;

use crate::assign::{assign, is_nil_dynamic};
use crate::engine::Engine;
use crate::error::{MergeError, MergeResult};
use crate::registry::CustomFunc;

/// How a source is turned into a value of the destination type.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Converter<'a> {
    /// A registered conversion function.
    Custom(&'a CustomFunc),
    /// The native numeric or text cast.
    Builtin,
}

/// Follow pointers and dynamic slots down to a concrete source value.
/// `None` if the chain ends in nil.
pub(crate) fn deref_src(mut value: &Value) -> Option<&Value> {
    loop {
        value = match value.kind() {
            Kind::Pointer => value.pointee()?,
            Kind::Dynamic => value.concrete()?,
            _ => return Some(value),
        };
    }
}

/// Follow pointers and dynamic slots down to a concrete destination slot,
/// allocating nil pointers on the way. Stops at a nil dynamic slot.
pub(crate) fn deref_dst(value: &mut Value) -> MergeResult<&mut Value> {
    let ty = value.ty().clone();
    let next = match value.kind() {
        Kind::Pointer => value.ensure_pointee(),
        Kind::Dynamic if !is_nil_dynamic(value) => value.concrete_mut(),
        _ => return Ok(value),
    };
    match next {
        Some(next) => deref_dst(next),
        None => Err(MergeError::InvalidDestination(ty)),
    }
}

impl<'a> Engine<'a> {
    /// Find a converter for `src -> dst`: a registered function first, then
    /// the native cast if allowed.
    pub(crate) fn converter(&self, dst: &Type, src: &Type) -> Option<Converter<'a>> {
        if let Some(func) = self.config.registry().convert_fn(dst, src) {
            return Some(Converter::Custom(func));
        }
        if self.config.allow_builtin_conversion && convertible(dst, src) {
            return Some(Converter::Builtin);
        }
        None
    }

    /// Produce the value to assign into a slot currently holding `current`.
    pub(crate) fn run(
        &self,
        converter: Converter<'a>,
        current: Value,
        src: Value,
    ) -> MergeResult<Value> {
        match converter {
            Converter::Custom(func) => {
                debug!(dst = %current.ty(), src = %src.ty(), "applying custom conversion");
                func.call(current, src, self.config)
            }
            Converter::Builtin => {
                if self.config.overwrite || current.is_empty() {
                    debug!(dst = %current.ty(), src = %src.ty(), "applying native cast");
                    Ok(src.cast(current.ty())?)
                } else {
                    Ok(current)
                }
            }
        }
    }

    /// Merge `src` into `dst` when their types differ.
    ///
    /// Dynamic slots on both sides are looked through. A registered or native
    /// converter for the concrete pair is used if there is one; otherwise, if
    /// either side is a pointer, both sides are dereferenced and the
    /// elements are converted or merged.
    pub(crate) fn convert(&self, dst: &mut Value, src: &Value) -> MergeResult<()> {
        let Some(src) = src.concrete() else {
            return Ok(());
        };
        if is_nil_dynamic(dst) {
            *dst = Value::dynamic(src.clone());
            return Ok(());
        }

        let dst_ty = dst.concrete_type().clone();
        let src_ty = src.ty().clone();
        if dst_ty == src_ty {
            return assign(dst, src, self.config);
        }

        if let Some(converter) = self.converter(&dst_ty, &src_ty) {
            let current = dst.concrete().cloned().unwrap_or_else(|| Value::zero(&dst_ty));
            let converted = self.run(converter, current, src.clone())?;
            return assign(dst, &converted, self.config);
        }

        if dst_ty.kind() == Kind::Pointer || src_ty.kind() == Kind::Pointer {
            return self.convert_elements(dst, src, dst_ty, src_ty);
        }

        Err(MergeError::CannotConvert {
            src: src_ty,
            dst: dst_ty,
        })
    }

    fn convert_elements(
        &self,
        dst: &mut Value,
        src: &Value,
        dst_ty: Type,
        src_ty: Type,
    ) -> MergeResult<()> {
        let Some(src_elem) = deref_src(src) else {
            return Ok(());
        };
        let dst_elem = deref_dst(dst)?;
        if is_nil_dynamic(dst_elem) {
            *dst_elem = Value::dynamic(src_elem.clone());
            return Ok(());
        }

        let dst_elem_ty = dst_elem.ty().clone();
        let src_elem_ty = src_elem.ty().clone();
        if dst_elem_ty == src_elem_ty {
            return self.deep_merge(dst_elem, src_elem);
        }

        match self.converter(&dst_elem_ty, &src_elem_ty) {
            Some(converter) => {
                let converted = self.run(converter, dst_elem.clone(), src_elem.clone())?;
                assign(dst_elem, &converted, self.config)
            }
            None => Err(MergeError::CannotConvertElement {
                src: src_ty,
                dst: dst_ty,
                src_elem: src_elem_ty,
                dst_elem: dst_elem_ty,
            }),
        }
    }
}
