//! Custom merge and conversion functions.
//!
//! A [`CustomFunc`] takes `(destination, source, config)` and returns the
//! value to store in the destination. Its classification follows from its
//! declared parameter types: equal destination and source types make it a
//! merge function for that type, differing types a conversion function for
//! that ordered pair. Arity, the config parameter and the error result are
//! fixed by the Rust signature; the remaining shape rules are checked by
//! [`validate`] when the function is registered.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use overlay_value::{Reflect, Type, Value};
use tracing::debug;

use crate::config::MergeConfig;
use crate::error::{MergeResult, RegistryError};

type Callback = Arc<dyn Fn(Value, Value, &MergeConfig) -> MergeResult<Value> + Send + Sync>;

/// Classification of a registered function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuncKind {
    /// Combines two values of the same type.
    Merge,
    /// Turns a source of one type into a value of the destination type.
    Convert,
}

/// A custom merge or conversion function with its declared signature.
#[derive(Clone)]
pub struct CustomFunc {
    dst: Type,
    src: Type,
    output: Type,
    callback: Callback,
}

impl CustomFunc {
    /// Wrap a function working on raw values.
    ///
    /// `dst` and `src` are the declared parameter types, `output` the
    /// declared result type. The function receives the concrete destination
    /// and source values.
    pub fn dynamic<F>(dst: Type, src: Type, output: Type, f: F) -> Self
    where
        F: Fn(Value, Value, &MergeConfig) -> MergeResult<Value> + Send + Sync + 'static,
    {
        Self {
            dst,
            src,
            output,
            callback: Arc::new(f),
        }
    }

    /// A merge function for values of `T`.
    pub fn merge<T, F>(f: F) -> Self
    where
        T: Reflect + 'static,
        F: Fn(T, T, &MergeConfig) -> MergeResult<T> + Send + Sync + 'static,
    {
        let ty = T::reflect_type();
        Self::dynamic(ty.clone(), ty.clone(), ty, move |dst, src, config| {
            let merged = f(T::from_value(dst)?, T::from_value(src)?, config)?;
            Ok(merged.to_value())
        })
    }

    /// A conversion function from `S` into `D`.
    pub fn convert<D, S, F>(f: F) -> Self
    where
        D: Reflect + 'static,
        S: Reflect + 'static,
        F: Fn(D, S, &MergeConfig) -> MergeResult<D> + Send + Sync + 'static,
    {
        let dst = D::reflect_type();
        Self::dynamic(dst.clone(), S::reflect_type(), dst, move |dst, src, config| {
            let converted = f(D::from_value(dst)?, S::from_value(src)?, config)?;
            Ok(converted.to_value())
        })
    }

    pub fn dst(&self) -> &Type {
        &self.dst
    }

    pub fn src(&self) -> &Type {
        &self.src
    }

    pub fn output(&self) -> &Type {
        &self.output
    }

    pub fn kind(&self) -> FuncKind {
        if self.dst == self.src {
            FuncKind::Merge
        } else {
            FuncKind::Convert
        }
    }

    pub(crate) fn call(&self, dst: Value, src: Value, config: &MergeConfig) -> MergeResult<Value> {
        (self.callback)(dst, src, config)
    }
}

impl fmt::Debug for CustomFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFunc")
            .field("dst", &self.dst)
            .field("src", &self.src)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// Check a function's declared signature and classify it.
pub fn validate(func: &CustomFunc) -> Result<FuncKind, RegistryError> {
    if func.output != func.dst {
        return Err(RegistryError::ResultTypeMismatch {
            param: func.dst.clone(),
            result: func.output.clone(),
        });
    }
    Ok(func.kind())
}

/// Lookup tables for custom functions.
///
/// Merge functions are keyed by their exact type, conversion functions by
/// the ordered `(destination, source)` pair. The registry is read-only while
/// merges run; register everything before sharing a config across threads.
#[derive(Clone, Default)]
pub struct Registry {
    merge_fns: HashMap<Type, CustomFunc>,
    convert_fns: HashMap<(Type, Type), CustomFunc>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch of functions.
    ///
    /// Every function is validated before any is inserted, so a malformed
    /// function anywhere in the batch leaves the registry unchanged. A later
    /// registration for the same key replaces the earlier one.
    pub fn register(
        &mut self,
        funcs: impl IntoIterator<Item = CustomFunc>,
    ) -> Result<(), RegistryError> {
        let funcs = funcs
            .into_iter()
            .map(|func| validate(&func).map(|kind| (kind, func)))
            .collect::<Result<Vec<_>, _>>()?;

        for (kind, func) in funcs {
            debug!(dst = %func.dst, src = %func.src, ?kind, "registered custom function");
            match kind {
                FuncKind::Merge => {
                    self.merge_fns.insert(func.dst.clone(), func);
                }
                FuncKind::Convert => {
                    self.convert_fns
                        .insert((func.dst.clone(), func.src.clone()), func);
                }
            }
        }
        Ok(())
    }

    /// The merge function registered for exactly `ty`.
    pub fn merge_fn(&self, ty: &Type) -> Option<&CustomFunc> {
        self.merge_fns.get(ty)
    }

    /// The conversion function registered for `src -> dst`.
    pub fn convert_fn(&self, dst: &Type, src: &Type) -> Option<&CustomFunc> {
        self.convert_fns.get(&(dst.clone(), src.clone()))
    }

    pub fn merge_fn_count(&self) -> usize {
        self.merge_fns.len()
    }

    pub fn convert_fn_count(&self) -> usize {
        self.convert_fns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merge_fns.is_empty() && self.convert_fns.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("merge_fns", &self.merge_fns.keys().collect::<Vec<_>>())
            .field("convert_fns", &self.convert_fns.keys().collect::<Vec<_>>())
            .finish()
    }
}
