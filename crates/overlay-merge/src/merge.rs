//! Top-level merge entry points.

use std::iter;

use overlay_value::{Kind, Reflect, Value};
use tracing::debug;

use crate::assign::is_nil_dynamic;
use crate::config::{MergeConfig, MergeOption};
use crate::convert::deref_src;
use crate::engine::Engine;
use crate::error::{MergeError, MergeResult};

/// Merge `source` onto the value `target` points at.
///
/// `target` must be a pointer (possibly held in a dynamic slot); pointers
/// and dynamic slots on both sides are followed down to the values being
/// merged. The options are applied in order to a default [`MergeConfig`].
/// If the merge fails the target is left exactly as it was.
///
/// # Panics
///
/// Panics if an option registers a custom function with a malformed
/// signature. See [`MergeConfig::from_options`].
pub fn merge(
    target: &mut Value,
    source: &Value,
    options: impl IntoIterator<Item = MergeOption>,
) -> MergeResult<()> {
    let config = MergeConfig::from_options(options);
    merge_with(target, source, &config)
}

/// Like [`merge`], with a prebuilt configuration.
pub fn merge_with(target: &mut Value, source: &Value, config: &MergeConfig) -> MergeResult<()> {
    merge_layers(target, iter::once(source), config)
}

/// Merge several sources onto `target`, in order.
///
/// All layers are merged into one staging copy of the target, which is
/// committed only if every layer succeeds. Nil sources are skipped, so a
/// call with only nil sources succeeds whatever the target is.
pub fn merge_layers<'s>(
    target: &mut Value,
    sources: impl IntoIterator<Item = &'s Value>,
    config: &MergeConfig,
) -> MergeResult<()> {
    let sources: Vec<&Value> = sources
        .into_iter()
        .filter(|source| !is_nil_dynamic(source))
        .collect();
    if sources.is_empty() {
        return Ok(());
    }
    check_target(target)?;

    let mut staged = target.clone();
    let engine = Engine::new(config);
    let slot = resolve_target(&mut staged)?;
    let mut layers = 0usize;
    for source in sources {
        let source = resolve_source(source)?;
        if let Err(err) = engine.merge(slot, source) {
            debug!(layer = layers, error = %err, "merge failed, discarding staged target");
            return Err(err);
        }
        layers += 1;
    }

    *target = staged;
    debug!(layers, "merge committed");
    Ok(())
}

/// Merge `src` onto `dst` through their [`Reflect`] representations.
///
/// `dst` is only written back if the merge succeeds.
pub fn merge_into<T, S>(
    dst: &mut T,
    src: &S,
    options: impl IntoIterator<Item = MergeOption>,
) -> MergeResult<()>
where
    T: Reflect,
    S: Reflect,
{
    let config = MergeConfig::from_options(options);
    merge_into_with(dst, src, &config)
}

/// Like [`merge_into`], with a prebuilt configuration.
pub fn merge_into_with<T, S>(dst: &mut T, src: &S, config: &MergeConfig) -> MergeResult<()>
where
    T: Reflect,
    S: Reflect,
{
    let mut target = Value::pointer(dst.to_value());
    merge_with(&mut target, &src.to_value(), config)?;
    let merged = target
        .into_pointee()
        .ok_or(MergeError::TargetResolvesToNothing)?;
    *dst = T::from_value(merged)?;
    Ok(())
}

fn check_target(target: &Value) -> MergeResult<()> {
    let Some(concrete) = target.concrete() else {
        return Err(MergeError::TargetNil);
    };
    if concrete.kind() != Kind::Pointer {
        return Err(MergeError::TargetNotIndirect(concrete.ty().clone()));
    }
    Ok(())
}

/// Follow the target down to the slot being merged into, without
/// allocating. Every pointer on the way must be non-nil.
fn resolve_target(target: &mut Value) -> MergeResult<&mut Value> {
    let next = match target.kind() {
        Kind::Pointer => target.pointee_mut(),
        Kind::Dynamic => target.concrete_mut(),
        _ => return Ok(target),
    };
    match next {
        Some(next) => resolve_target(next),
        None => Err(MergeError::TargetResolvesToNothing),
    }
}

fn resolve_source(source: &Value) -> MergeResult<&Value> {
    deref_src(source).ok_or(MergeError::SourceResolvesToNothing)
}
