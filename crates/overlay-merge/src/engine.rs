//! Type-directed recursive merge.
//!
//! [`Engine::deep_merge`] dispatches on the destination's kind: structs
//! merge field by field, maps key by key, slices by the configured
//! [`SliceMode`], pointers through their pointees, and everything else
//! through scalar assignment. A registered merge function for the exact
//! type takes precedence over all of these.

use std::collections::HashSet;

use overlay_value::{hashable, Key, Kind, Value};
use tracing::{debug, trace};

use crate::assign::{assign, is_nil_dynamic};
use crate::config::{MergeConfig, SliceMode};
use crate::error::{MergeError, MergeResult};

/// A merge run bound to one configuration.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Engine<'a> {
    pub(crate) config: &'a MergeConfig,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(config: &'a MergeConfig) -> Self {
        Self { config }
    }

    /// Merge values of any two types, converting when they differ.
    pub(crate) fn merge(&self, dst: &mut Value, src: &Value) -> MergeResult<()> {
        if dst.ty() != src.ty() {
            return self.convert(dst, src);
        }
        self.deep_merge(dst, src)
    }

    /// Merge two values of the same type.
    pub(crate) fn deep_merge(&self, dst: &mut Value, src: &Value) -> MergeResult<()> {
        if dst.ty() != src.ty() {
            return Err(MergeError::TypeMismatch {
                src: src.ty().clone(),
                dst: dst.ty().clone(),
            });
        }

        if let Some(func) = self.config.registry().merge_fn(dst.ty()) {
            debug!(ty = %dst.ty(), "applying custom merge function");
            let merged = func.call(dst.clone(), src.clone(), self.config)?;
            return assign(dst, &merged, self.config);
        }

        let kind = dst.ty().kind();
        trace!(%kind, ty = %dst.ty(), "deep merge");
        match kind {
            Kind::Struct => self.merge_struct(dst, src),
            Kind::Map => self.merge_map(dst, src),
            Kind::Slice => self.merge_slice(dst, src),
            Kind::Pointer => self.merge_pointer(dst, src),
            Kind::Dynamic => self.merge_dynamic(dst, src),
            _ => assign(dst, src, self.config),
        }
    }

    fn merge_struct(&self, dst: &mut Value, src: &Value) -> MergeResult<()> {
        // Hidden fields cannot be reached one by one.
        if dst.ty().has_hidden_fields() {
            return assign(dst, src, self.config);
        }
        let dst_ty = dst.ty().clone();
        let src_fields = src.fields().unwrap_or_default();
        let Some(dst_fields) = dst.fields_mut() else {
            return Err(MergeError::InvalidDestination(dst_ty));
        };
        for (dst_field, src_field) in dst_fields.iter_mut().zip(src_fields) {
            self.deep_merge(dst_field, src_field)?;
        }
        Ok(())
    }

    fn merge_map(&self, dst: &mut Value, src: &Value) -> MergeResult<()> {
        let Some(src_entries) = src.entries() else {
            return Ok(());
        };
        let dst_ty = dst.ty().clone();
        let dynamic_values = dst_ty.elem().is_some_and(|v| v.kind() == Kind::Dynamic);
        let Some(dst_entries) = dst.entries_mut() else {
            return Err(MergeError::InvalidDestination(dst_ty));
        };

        for (key, src_entry) in src_entries {
            let Some(src_value) = src_entry.concrete() else {
                continue;
            };
            let Some(dst_entry) = dst_entries.get_mut(key) else {
                dst_entries.insert(key.clone(), src_entry.clone());
                continue;
            };
            if is_nil_dynamic(dst_entry) {
                *dst_entry = src_entry.clone();
                continue;
            }

            let elem_ty = dst_entry.concrete_type().clone();
            if matches!(elem_ty.kind(), Kind::Struct | Kind::Pointer | Kind::Map) {
                let Some(slot) = dst_entry.concrete_mut() else {
                    return Err(MergeError::InvalidDestination(elem_ty));
                };
                self.merge(slot, src_value)?;
                continue;
            }

            // Leaf entries are merged into a fresh value and written back.
            let was_empty = dst_entry.concrete().map_or(true, Value::is_empty);
            let mut scratch = Value::zero(&elem_ty);
            self.merge(&mut scratch, src_value)?;
            if self.config.overwrite || was_empty {
                *dst_entry = if dynamic_values {
                    Value::dynamic(scratch)
                } else {
                    scratch
                };
            }
        }
        Ok(())
    }

    fn merge_slice(&self, dst: &mut Value, src: &Value) -> MergeResult<()> {
        let Some(src_items) = src.elements() else {
            return Ok(());
        };
        match self.config.slice_mode {
            SliceMode::Replace => assign(dst, src, self.config),
            SliceMode::Append => Ok(dst.extend(src_items.iter().cloned())?),
            SliceMode::Unite => {
                let elem = dst.ty().elem().cloned();
                let unitable = elem
                    .as_ref()
                    .is_some_and(|e| hashable(e) && e.kind() != Kind::Bool);
                if !unitable {
                    return Ok(dst.extend(src_items.iter().cloned())?);
                }

                let existing: HashSet<Key> = dst
                    .elements()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(Key::of)
                    .collect();
                // NaN matches nothing, so it is always appended.
                let fresh: Vec<Value> = src_items
                    .iter()
                    .filter(|item| {
                        Key::of(item)
                            .filter(|key| !key.is_nan())
                            .map_or(true, |key| !existing.contains(&key))
                    })
                    .cloned()
                    .collect();
                if !fresh.is_empty() {
                    dst.extend(fresh)?;
                }
                Ok(())
            }
        }
    }

    fn merge_pointer(&self, dst: &mut Value, src: &Value) -> MergeResult<()> {
        let Some(src_target) = src.pointee() else {
            return Ok(());
        };
        let dst_ty = dst.ty().clone();
        let Some(dst_target) = dst.ensure_pointee() else {
            return Err(MergeError::InvalidDestination(dst_ty));
        };
        self.merge(dst_target, src_target)
    }

    fn merge_dynamic(&self, dst: &mut Value, src: &Value) -> MergeResult<()> {
        let Some(src_value) = src.concrete() else {
            return Ok(());
        };
        if is_nil_dynamic(dst) {
            *dst = src.clone();
            return Ok(());
        }
        if dst.concrete_type() != src_value.ty() {
            return self.convert(dst, src);
        }
        assign(dst, src, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergeOption;
    use crate::registry::CustomFunc;
    use overlay_value::{Data, Field, FloatWidth, Ptr, Type};

    fn deep_merge(dst: &mut Value, src: &Value, config: &MergeConfig) -> MergeResult<()> {
        Engine::new(config).deep_merge(dst, src)
    }

    fn keep() -> MergeConfig {
        MergeConfig::from_options([MergeOption::WithoutOverwrite])
    }

    fn mode(mode: SliceMode, overwrite: bool) -> MergeConfig {
        let mut config = MergeConfig::default();
        config.overwrite = overwrite;
        config.slice_mode = mode;
        config
    }

    fn ints(items: &[i64]) -> Value {
        Value::slice(Type::i64(), items.iter().copied().map(Value::i64)).unwrap()
    }

    fn bools(items: &[bool]) -> Value {
        Value::slice(Type::bool(), items.iter().copied().map(Value::bool)).unwrap()
    }

    fn nil_ints() -> Value {
        Value::zero(&Type::slice(Type::i64()))
    }

    fn string_map(entries: &[(&str, &str)]) -> Value {
        Value::map(
            Type::string(),
            Type::string(),
            entries
                .iter()
                .map(|(k, v)| (Value::string(*k), Value::string(*v))),
        )
        .unwrap()
    }

    fn any_map(entries: Vec<(&str, Value)>) -> Value {
        Value::map(
            Type::string(),
            Type::any(),
            entries.into_iter().map(|(k, v)| (Value::string(k), v)),
        )
        .unwrap()
    }

    fn entry<'v>(map: &'v Value, key: &str) -> Option<&'v Value> {
        map.get(&Key::from(key)).and_then(Value::concrete)
    }

    // -----------------------------------------------------------------------
    // Scalars
    // -----------------------------------------------------------------------

    #[test]
    fn scalars_with_overwrite() {
        let config = MergeConfig::default();
        for (dst, src) in [
            (Value::string("1"), Value::string("2")),
            (Value::i64(1), Value::i64(2)),
            (Value::bool(true), Value::bool(false)),
            (Value::f64(1.1), Value::f64(1.2)),
        ] {
            let mut merged = dst.clone();
            deep_merge(&mut merged, &src, &config).unwrap();
            assert_eq!(merged, src);
        }
    }

    #[test]
    fn scalars_without_overwrite_fill_only_empty() {
        let config = keep();
        let mut dst = Value::string("1");
        deep_merge(&mut dst, &Value::string("2"), &config).unwrap();
        assert_eq!(dst, Value::string("1"));
        let mut dst = Value::string("");
        deep_merge(&mut dst, &Value::string("2"), &config).unwrap();
        assert_eq!(dst, Value::string("2"));

        let mut dst = Value::bool(true);
        deep_merge(&mut dst, &Value::bool(false), &config).unwrap();
        assert_eq!(dst, Value::bool(true));
        let mut dst = Value::bool(false);
        deep_merge(&mut dst, &Value::bool(true), &config).unwrap();
        assert_eq!(dst, Value::bool(true));

        let mut dst = Value::f64(1.1);
        deep_merge(&mut dst, &Value::f64(1.2), &config).unwrap();
        assert_eq!(dst, Value::f64(1.1));
        let mut dst = Value::f64(0.0);
        deep_merge(&mut dst, &Value::f64(1.2), &config).unwrap();
        assert_eq!(dst, Value::f64(1.2));
    }

    #[test]
    fn differing_types_are_rejected() {
        let mut dst = Value::i64(1);
        let err = deep_merge(&mut dst, &Value::i32(1), &MergeConfig::default()).unwrap_err();
        assert!(matches!(err, MergeError::TypeMismatch { .. }));
    }

    // -----------------------------------------------------------------------
    // Custom merge functions
    // -----------------------------------------------------------------------

    fn adding() -> Vec<CustomFunc> {
        vec![CustomFunc::merge(|dst: i64, src: i64, _: &MergeConfig| Ok(dst + src))]
    }

    #[test]
    fn custom_merge_function_applies() {
        let config = MergeConfig::from_options([MergeOption::Funcs(adding())]);
        let mut dst = Value::i64(1);
        deep_merge(&mut dst, &Value::i64(2), &config).unwrap();
        assert_eq!(dst, Value::i64(3));
    }

    #[test]
    fn custom_merge_function_is_nominal() {
        let config = MergeConfig::from_options([MergeOption::Funcs(adding())]);
        let temp = Type::named("TempInt", Type::i64());
        let mut dst = Value::i64(1).cast(&temp).unwrap();
        let src = Value::i64(2).cast(&temp).unwrap();
        deep_merge(&mut dst, &src, &config).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn custom_merge_result_honours_overwrite() {
        let config = MergeConfig::from_options([
            MergeOption::Funcs(adding()),
            MergeOption::WithoutOverwrite,
        ]);
        let mut dst = Value::i64(1);
        deep_merge(&mut dst, &Value::i64(2), &config).unwrap();
        assert_eq!(dst, Value::i64(1));
    }

    #[test]
    fn custom_merge_function_reaches_nested_fields() {
        let config = MergeConfig::from_options([MergeOption::Funcs(adding())]);
        let ty = Type::structure(vec![Field::exported("N", Type::i64())]);
        let mut dst = Value::structure(ty.clone(), vec![Value::i64(1)]).unwrap();
        let src = Value::structure(ty, vec![Value::i64(2)]).unwrap();
        deep_merge(&mut dst, &src, &config).unwrap();
        assert_eq!(dst.field("N"), Some(&Value::i64(3)));
    }

    // -----------------------------------------------------------------------
    // Structs
    // -----------------------------------------------------------------------

    fn open() -> Type {
        Type::named("Open", Type::structure(vec![Field::exported("A", Type::string())]))
    }

    fn sealed() -> Type {
        Type::named(
            "Sealed",
            Type::structure(vec![
                Field::exported("A", Type::string()),
                Field::hidden("b", Type::i64()),
            ]),
        )
    }

    fn sealed_value(a: &str, b: i64) -> Value {
        Value::structure(sealed(), vec![Value::string(a), Value::i64(b)]).unwrap()
    }

    #[test]
    fn exported_struct_merges_per_field() {
        let mut dst = Value::structure(open(), vec![Value::string("1")]).unwrap();
        let src = Value::structure(open(), vec![Value::string("2")]).unwrap();
        deep_merge(&mut dst, &src, &MergeConfig::default()).unwrap();
        assert_eq!(dst.field("A"), Some(&Value::string("2")));

        let mut dst = Value::structure(open(), vec![Value::string("1")]).unwrap();
        deep_merge(&mut dst, &src, &keep()).unwrap();
        assert_eq!(dst.field("A"), Some(&Value::string("1")));
    }

    #[test]
    fn struct_with_hidden_fields_is_one_unit() {
        let mut dst = sealed_value("1", 1);
        deep_merge(&mut dst, &sealed_value("2", 2), &MergeConfig::default()).unwrap();
        assert_eq!(dst, sealed_value("2", 2));

        // Structs are never empty, so without overwrite nothing changes.
        let mut dst = sealed_value("1", 1);
        deep_merge(&mut dst, &sealed_value("2", 2), &keep()).unwrap();
        assert_eq!(dst, sealed_value("1", 1));

        let mut dst = sealed_value("", 0);
        deep_merge(&mut dst, &sealed_value("2", 2), &keep()).unwrap();
        assert_eq!(dst, sealed_value("", 0));
    }

    // -----------------------------------------------------------------------
    // Maps
    // -----------------------------------------------------------------------

    #[test]
    fn string_map_with_overwrite() {
        let mut dst = string_map(&[("1", "1"), ("2", "2")]);
        let src = string_map(&[("1", "2"), ("3", "3")]);
        deep_merge(&mut dst, &src, &MergeConfig::default()).unwrap();
        assert_eq!(dst, string_map(&[("1", "2"), ("2", "2"), ("3", "3")]));
    }

    #[test]
    fn string_map_without_overwrite() {
        let mut dst = string_map(&[("1", "1"), ("2", "")]);
        let src = string_map(&[("1", "2"), ("2", "2"), ("3", "3")]);
        deep_merge(&mut dst, &src, &keep()).unwrap();
        assert_eq!(dst, string_map(&[("1", "1"), ("2", "2"), ("3", "3")]));
    }

    #[test]
    fn nil_maps() {
        let ty = Type::map(Type::string(), Type::string());
        let mut dst = Value::zero(&ty);
        deep_merge(&mut dst, &string_map(&[("a", "b")]), &MergeConfig::default()).unwrap();
        assert_eq!(dst, string_map(&[("a", "b")]));

        let mut dst = string_map(&[("a", "b")]);
        deep_merge(&mut dst, &Value::zero(&ty), &MergeConfig::default()).unwrap();
        assert_eq!(dst, string_map(&[("a", "b")]));
    }

    #[test]
    fn dynamic_map_values() {
        let mut dst = any_map(vec![
            ("int", Value::dynamic(Value::i64(1))),
            ("text", Value::dynamic(Value::string("a"))),
            ("nil", Value::nil()),
        ]);
        let src = any_map(vec![
            ("int", Value::dynamic(Value::i32(2))),
            ("text", Value::dynamic(Value::string("b"))),
            ("nil", Value::dynamic(Value::bool(true))),
            ("new", Value::dynamic(Value::u8(7))),
        ]);
        deep_merge(&mut dst, &src, &MergeConfig::default()).unwrap();
        assert_eq!(entry(&dst, "int"), Some(&Value::i64(2)));
        assert_eq!(entry(&dst, "text"), Some(&Value::string("b")));
        assert_eq!(entry(&dst, "nil"), Some(&Value::bool(true)));
        assert_eq!(entry(&dst, "new"), Some(&Value::u8(7)));
    }

    #[test]
    fn dynamic_map_values_without_overwrite() {
        let mut dst = any_map(vec![
            ("kept", Value::dynamic(Value::string("a"))),
            ("filled", Value::dynamic(Value::string(""))),
        ]);
        let src = any_map(vec![
            ("kept", Value::dynamic(Value::string("b"))),
            ("filled", Value::dynamic(Value::string("b"))),
        ]);
        deep_merge(&mut dst, &src, &keep()).unwrap();
        assert_eq!(entry(&dst, "kept"), Some(&Value::string("a")));
        assert_eq!(entry(&dst, "filled"), Some(&Value::string("b")));
    }

    #[test]
    fn nil_source_entries_are_skipped() {
        let mut dst = any_map(vec![("a", Value::dynamic(Value::i64(1)))]);
        let src = any_map(vec![("a", Value::nil()), ("b", Value::nil())]);
        deep_merge(&mut dst, &src, &MergeConfig::default()).unwrap();
        assert_eq!(entry(&dst, "a"), Some(&Value::i64(1)));
        assert!(dst.get(&Key::from("b")).is_none());
    }

    #[test]
    fn nested_maps_merge_in_place() {
        let mut dst = any_map(vec![(
            "inner",
            Value::dynamic(any_map(vec![("a", Value::dynamic(Value::i64(1)))])),
        )]);
        let src = any_map(vec![(
            "inner",
            Value::dynamic(any_map(vec![("b", Value::dynamic(Value::i64(2)))])),
        )]);
        deep_merge(&mut dst, &src, &MergeConfig::default()).unwrap();
        let inner = entry(&dst, "inner").unwrap();
        assert_eq!(entry(inner, "a"), Some(&Value::i64(1)));
        assert_eq!(entry(inner, "b"), Some(&Value::i64(2)));
    }

    #[test]
    fn slice_map_entries_are_replaced_through_scratch() {
        let config = mode(SliceMode::Append, true);
        let mut dst = any_map(vec![("xs", Value::dynamic(ints(&[1])))]);
        let src = any_map(vec![("xs", Value::dynamic(ints(&[2])))]);
        deep_merge(&mut dst, &src, &config).unwrap();
        assert_eq!(entry(&dst, "xs"), Some(&ints(&[2])));
    }

    #[test]
    fn map_entry_type_conflict_fails() {
        let mut dst = any_map(vec![("a", Value::dynamic(Value::string("x")))]);
        let src = any_map(vec![("a", Value::dynamic(Value::i64(1)))]);
        let err = deep_merge(&mut dst, &src, &MergeConfig::default()).unwrap_err();
        assert!(matches!(err, MergeError::CannotConvert { .. }));
    }

    // -----------------------------------------------------------------------
    // Slices
    // -----------------------------------------------------------------------

    fn slice_case(config: &MergeConfig, dst: Value, src: Value) -> Value {
        let mut dst = dst;
        deep_merge(&mut dst, &src, config).unwrap();
        dst
    }

    #[test]
    fn replace_mode() {
        let config = mode(SliceMode::Replace, true);
        assert_eq!(slice_case(&config, ints(&[1, 2]), ints(&[2, 3])), ints(&[2, 3]));
        assert_eq!(slice_case(&config, nil_ints(), ints(&[2, 3])), ints(&[2, 3]));
        assert_eq!(slice_case(&config, ints(&[1, 2]), nil_ints()), ints(&[1, 2]));
        assert_eq!(slice_case(&config, ints(&[1, 2]), ints(&[])), ints(&[]));

        let config = mode(SliceMode::Replace, false);
        assert_eq!(slice_case(&config, ints(&[1, 2]), ints(&[2, 3])), ints(&[1, 2]));
        assert_eq!(slice_case(&config, ints(&[]), ints(&[2, 3])), ints(&[2, 3]));
    }

    #[test]
    fn append_mode() {
        for overwrite in [true, false] {
            let config = mode(SliceMode::Append, overwrite);
            assert_eq!(
                slice_case(&config, ints(&[1, 2]), ints(&[2, 3])),
                ints(&[1, 2, 2, 3])
            );
            assert_eq!(slice_case(&config, nil_ints(), ints(&[2, 3])), ints(&[2, 3]));
            assert_eq!(slice_case(&config, ints(&[]), ints(&[2, 3])), ints(&[2, 3]));
            assert_eq!(slice_case(&config, ints(&[1, 2]), nil_ints()), ints(&[1, 2]));
            assert_eq!(slice_case(&config, ints(&[1, 2]), ints(&[])), ints(&[1, 2]));
        }
    }

    #[test]
    fn unite_mode() {
        for overwrite in [true, false] {
            let config = mode(SliceMode::Unite, overwrite);
            assert_eq!(slice_case(&config, ints(&[1, 2]), ints(&[2, 3])), ints(&[1, 2, 3]));
            assert_eq!(slice_case(&config, nil_ints(), ints(&[2, 3])), ints(&[2, 3]));
            assert_eq!(slice_case(&config, ints(&[]), ints(&[2, 3])), ints(&[2, 3]));
            assert_eq!(slice_case(&config, ints(&[1, 2]), nil_ints()), ints(&[1, 2]));
            assert_eq!(slice_case(&config, ints(&[1, 2]), ints(&[])), ints(&[1, 2]));
        }
    }

    #[test]
    fn unite_keeps_destination_order_first() {
        let config = mode(SliceMode::Unite, true);
        assert_eq!(
            slice_case(&config, ints(&[3, 1]), ints(&[2, 1, 4])),
            ints(&[3, 1, 2, 4])
        );
    }

    #[test]
    fn unite_of_booleans_appends() {
        let config = mode(SliceMode::Unite, true);
        assert_eq!(
            slice_case(&config, bools(&[true, false]), bools(&[true, false])),
            bools(&[true, false, true, false])
        );
    }

    #[test]
    fn unite_of_structs_appends() {
        let config = mode(SliceMode::Unite, true);
        let item = Value::structure(open(), vec![Value::string("a")]).unwrap();
        let dst = Value::slice(open(), [item.clone()]).unwrap();
        let src = Value::slice(open(), [item.clone()]).unwrap();
        let merged = slice_case(&config, dst, src);
        assert_eq!(merged.elements().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn unite_of_pointers_uses_identity() {
        let config = mode(SliceMode::Unite, true);
        let shared = Value::pointer(Value::i64(1));
        let twin = Value::pointer(Value::i64(1));
        let dst = Value::slice(Type::pointer(Type::i64()), [shared.clone()]).unwrap();
        let src = Value::slice(Type::pointer(Type::i64()), [shared.clone(), twin.clone()]).unwrap();
        let merged = slice_case(&config, dst, src);
        let items = merged.elements().unwrap();
        assert_eq!(items.len(), 2);
        assert!(Ptr::same(items[1].ptr().unwrap(), twin.ptr().unwrap()));
    }

    #[test]
    fn unite_of_floats_treats_signed_zero_as_equal() {
        let config = mode(SliceMode::Unite, true);
        let floats = |xs: &[f64]| Value::slice(Type::f64(), xs.iter().copied().map(Value::f64)).unwrap();
        assert_eq!(
            slice_case(&config, floats(&[0.0, 1.5]), floats(&[-0.0, 2.5])),
            floats(&[0.0, 1.5, 2.5])
        );
    }

    #[test]
    fn unite_never_matches_nan() {
        let config = mode(SliceMode::Unite, true);
        let floats = |xs: &[f64]| Value::slice(Type::f64(), xs.iter().copied().map(Value::f64)).unwrap();
        let merged = slice_case(&config, floats(&[f64::NAN, 1.0]), floats(&[f64::NAN, 1.0]));
        let items = merged.elements().unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[2].as_f64().unwrap().is_nan());
    }

    #[test]
    fn unite_of_handles_uses_handle_value() {
        let config = mode(SliceMode::Unite, true);
        let handles = |hs: &[u64]| Value::slice(Type::handle(), hs.iter().copied().map(Value::handle)).unwrap();
        assert_eq!(
            slice_case(&config, handles(&[0x10, 0x20]), handles(&[0x20, 0x30])),
            handles(&[0x10, 0x20, 0x30])
        );
    }

    // -----------------------------------------------------------------------
    // Complex numbers
    // -----------------------------------------------------------------------

    fn complex(re: f64, im: f64) -> Value {
        Value::from_parts(Type::complex(FloatWidth::W64), Data::Complex(re, im))
    }

    #[test]
    fn complex_values_merge_as_leaves() {
        let mut dst = complex(1.0, 2.0);
        deep_merge(&mut dst, &complex(3.0, 4.0), &MergeConfig::default()).unwrap();
        assert_eq!(dst.as_complex(), Some((3.0, 4.0)));
    }

    #[test]
    fn zero_complex_is_not_empty() {
        let mut dst = complex(0.0, 0.0);
        deep_merge(&mut dst, &complex(3.0, 4.0), &keep()).unwrap();
        assert_eq!(dst.as_complex(), Some((0.0, 0.0)));
    }

    // -----------------------------------------------------------------------
    // Pointers
    // -----------------------------------------------------------------------

    #[test]
    fn pointers_merge_through_pointees() {
        for config in [MergeConfig::default(), keep()] {
            let src = Value::pointer(Value::i64(1));
            let mut dst = Value::pointer(Value::i64(0));
            deep_merge(&mut dst, &src, &config).unwrap();
            assert_eq!(dst.pointee(), Some(&Value::i64(1)));
            assert!(!Ptr::same(dst.ptr().unwrap(), src.ptr().unwrap()));
        }
    }

    #[test]
    fn pointer_without_overwrite_keeps_non_empty_pointee() {
        let mut dst = Value::pointer(Value::i64(1));
        deep_merge(&mut dst, &Value::pointer(Value::i64(2)), &keep()).unwrap();
        assert_eq!(dst.pointee(), Some(&Value::i64(1)));
    }

    #[test]
    fn nil_destination_pointer_gets_fresh_allocation() {
        let ty = Type::pointer(Type::i64());
        for config in [MergeConfig::default(), keep()] {
            let src = Value::pointer(Value::i64(1));
            let mut dst = Value::zero(&ty);
            deep_merge(&mut dst, &src, &config).unwrap();
            assert_eq!(dst.pointee(), Some(&Value::i64(1)));
            assert!(!Ptr::same(dst.ptr().unwrap(), src.ptr().unwrap()));
        }
    }

    #[test]
    fn nil_source_pointer_leaves_destination() {
        let ty = Type::pointer(Type::i64());
        let mut dst = Value::pointer(Value::i64(0));
        deep_merge(&mut dst, &Value::zero(&ty), &MergeConfig::default()).unwrap();
        assert_eq!(dst.pointee(), Some(&Value::i64(0)));

        let mut dst = Value::zero(&ty);
        deep_merge(&mut dst, &Value::zero(&ty), &MergeConfig::default()).unwrap();
        assert!(dst.is_nil());
    }

    // -----------------------------------------------------------------------
    // Dynamic slots
    // -----------------------------------------------------------------------

    #[test]
    fn dynamic_slots_with_overwrite() {
        let config = MergeConfig::default();
        let cases = [
            (Value::dynamic(Value::i64(1)), Value::dynamic(Value::i64(2)), Value::dynamic(Value::i64(2))),
            (
                Value::dynamic(string_map(&[("1", "1")])),
                Value::dynamic(string_map(&[("2", "2")])),
                Value::dynamic(string_map(&[("2", "2")])),
            ),
            (
                Value::dynamic(Value::slice(Type::string(), [Value::string("1")]).unwrap()),
                Value::dynamic(Value::slice(Type::string(), [Value::string("2")]).unwrap()),
                Value::dynamic(Value::slice(Type::string(), [Value::string("2")]).unwrap()),
            ),
            (Value::dynamic(Value::i64(1)), Value::dynamic(Value::i32(2)), Value::dynamic(Value::i64(2))),
            (Value::nil(), Value::dynamic(Value::i64(2)), Value::dynamic(Value::i64(2))),
            (Value::dynamic(Value::i64(1)), Value::nil(), Value::dynamic(Value::i64(1))),
        ];
        for (dst, src, expected) in cases {
            let mut merged = dst;
            deep_merge(&mut merged, &src, &config).unwrap();
            assert_eq!(merged, expected);
        }
    }

    #[test]
    fn nil_dynamic_slot_ignores_overwrite() {
        let mut dst = Value::nil();
        deep_merge(&mut dst, &Value::dynamic(Value::i64(2)), &keep()).unwrap();
        assert_eq!(dst, Value::dynamic(Value::i64(2)));
    }
}
