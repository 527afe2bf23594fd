//! Scalar assignment, the base case every merge path bottoms out in.

use overlay_value::{Data, Value};

use crate::config::MergeConfig;
use crate::error::{MergeError, MergeResult};

/// Returns `true` for a dynamic slot that holds nothing.
pub(crate) fn is_nil_dynamic(value: &Value) -> bool {
    matches!(value.data(), Data::Dynamic(None))
}

/// Assign `src` onto `dst` as a single unit.
///
/// Dynamic slots are unwrapped on both sides. A nil source is a no-op; a
/// nil destination slot is an error, as is any difference between the two
/// concrete types. The destination is replaced when overwriting is enabled
/// or its current value is empty.
pub(crate) fn assign(dst: &mut Value, src: &Value, config: &MergeConfig) -> MergeResult<()> {
    let dst_ty = dst.ty().clone();
    let Some(slot) = dst.concrete_mut() else {
        return Err(MergeError::InvalidDestination(dst_ty));
    };
    let Some(src) = src.concrete() else {
        return Ok(());
    };
    if slot.ty() != src.ty() {
        return Err(MergeError::TypeMismatch {
            src: src.ty().clone(),
            dst: slot.ty().clone(),
        });
    }
    if config.overwrite || slot.is_empty() {
        *slot = src.clone();
    }
    Ok(())
}
