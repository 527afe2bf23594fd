use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::registry::{CustomFunc, Registry};

/// How a source slice is combined with a destination slice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SliceMode {
    /// Scalar assignment of the whole slice, subject to the overwrite flag.
    #[default]
    Replace,
    /// Concatenate destination then source.
    Append,
    /// Append only source elements not already in the destination.
    Unite,
}

/// Policy for a merge call.
///
/// Built once from [`MergeOption`]s and read-only afterwards; a config may be
/// reused across any number of merges and shared between threads.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Whether non-empty destination values may be replaced.
    pub overwrite: bool,
    /// Whether native numeric and text casts are used when no conversion
    /// function is registered.
    pub allow_builtin_conversion: bool,
    /// Slice combination strategy.
    pub slice_mode: SliceMode,
    #[serde(skip)]
    registry: Arc<Registry>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            overwrite: true,
            allow_builtin_conversion: true,
            slice_mode: SliceMode::Replace,
            registry: Arc::default(),
        }
    }
}

impl MergeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from options, applied in order.
    pub fn try_from_options(
        options: impl IntoIterator<Item = MergeOption>,
    ) -> Result<Self, RegistryError> {
        let mut config = Self::default();
        for option in options {
            config.apply(option)?;
        }
        Ok(config)
    }

    /// Build a config from options, applied in order.
    ///
    /// # Panics
    ///
    /// Panics if a custom function has a malformed signature. Registering
    /// such a function is a programming error, not a runtime condition; use
    /// [`MergeConfig::try_from_options`] to handle it instead.
    pub fn from_options(options: impl IntoIterator<Item = MergeOption>) -> Self {
        match Self::try_from_options(options) {
            Ok(config) => config,
            Err(err) => panic!("invalid merge configuration: {err}"),
        }
    }

    /// Apply a single option.
    pub fn apply(&mut self, option: MergeOption) -> Result<(), RegistryError> {
        match option {
            MergeOption::WithoutOverwrite => self.overwrite = false,
            MergeOption::WithoutBuiltinConversion => self.allow_builtin_conversion = false,
            MergeOption::SliceMode(mode) => self.slice_mode = mode,
            MergeOption::Funcs(funcs) => self.register(funcs)?,
        }
        Ok(())
    }

    /// Register custom functions. Nothing is registered if any is malformed.
    pub fn register(
        &mut self,
        funcs: impl IntoIterator<Item = CustomFunc>,
    ) -> Result<(), RegistryError> {
        Arc::make_mut(&mut self.registry).register(funcs)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Share an already populated registry.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }
}

/// A single configuration option for [`crate::merge`].
#[derive(Clone, Debug)]
pub enum MergeOption {
    /// Keep non-empty destination values.
    WithoutOverwrite,
    /// Disable native casts; only registered conversions apply.
    WithoutBuiltinConversion,
    /// Choose the slice combination strategy.
    SliceMode(SliceMode),
    /// Register custom merge and conversion functions.
    Funcs(Vec<CustomFunc>),
}

impl MergeOption {
    pub fn funcs(funcs: impl IntoIterator<Item = CustomFunc>) -> Self {
        Self::Funcs(funcs.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_value::Type;

    #[test]
    fn defaults() {
        let config = MergeConfig::default();
        assert!(config.overwrite);
        assert!(config.allow_builtin_conversion);
        assert_eq!(config.slice_mode, SliceMode::Replace);
        assert!(config.registry().is_empty());
    }

    #[test]
    fn options_apply_in_order() {
        let config = MergeConfig::from_options([
            MergeOption::WithoutOverwrite,
            MergeOption::SliceMode(SliceMode::Append),
            MergeOption::SliceMode(SliceMode::Unite),
            MergeOption::WithoutBuiltinConversion,
        ]);
        assert!(!config.overwrite);
        assert!(!config.allow_builtin_conversion);
        assert_eq!(config.slice_mode, SliceMode::Unite);
    }

    #[test]
    fn funcs_option_registers() {
        let add = CustomFunc::merge(|dst: i64, src: i64, _: &MergeConfig| Ok(dst + src));
        let config = MergeConfig::from_options([MergeOption::funcs([add])]);
        assert!(config.registry().merge_fn(&Type::i64()).is_some());
    }

    #[test]
    fn malformed_funcs_are_reported() {
        let bad = CustomFunc::dynamic(Type::string(), Type::i64(), Type::i64(), |_, src, _| Ok(src));
        let err = MergeConfig::try_from_options([MergeOption::Funcs(vec![bad])]).unwrap_err();
        assert!(matches!(err, RegistryError::ResultTypeMismatch { .. }));
    }

    #[test]
    #[should_panic(expected = "invalid merge configuration")]
    fn from_options_panics_on_malformed_funcs() {
        let bad = CustomFunc::dynamic(Type::string(), Type::i64(), Type::i64(), |_, src, _| Ok(src));
        let _ = MergeConfig::from_options([MergeOption::Funcs(vec![bad])]);
    }

    #[test]
    fn cloned_configs_do_not_share_later_registrations() {
        let base = MergeConfig::default();
        let mut extended = base.clone();
        extended
            .register([CustomFunc::merge(|_: i64, src: i64, _: &MergeConfig| Ok(src))])
            .unwrap();
        assert!(base.registry().is_empty());
        assert_eq!(extended.registry().merge_fn_count(), 1);
    }

    #[test]
    fn configs_can_share_one_registry() {
        let mut registry = Registry::new();
        registry
            .register([CustomFunc::merge(|dst: i64, src: i64, _: &MergeConfig| Ok(dst + src))])
            .unwrap();
        let shared = Arc::new(registry);

        let replace = MergeConfig::default().with_registry(Arc::clone(&shared));
        let append = MergeConfig::from_options([MergeOption::SliceMode(SliceMode::Append)])
            .with_registry(Arc::clone(&shared));
        assert!(Arc::ptr_eq(&replace.registry, &append.registry));
        assert!(append.registry().merge_fn(&Type::i64()).is_some());
        assert_eq!(append.slice_mode, SliceMode::Append);
        assert_eq!(Arc::strong_count(&shared), 3);
    }

    #[test]
    fn serde_round_trip() {
        let config = MergeConfig {
            overwrite: false,
            slice_mode: SliceMode::Unite,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"Unite\""));
        let back: MergeConfig = serde_json::from_str(&json).unwrap();
        assert!(!back.overwrite);
        assert!(back.allow_builtin_conversion);
        assert_eq!(back.slice_mode, SliceMode::Unite);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: MergeConfig = serde_json::from_str(r#"{"slice_mode":"Append"}"#).unwrap();
        assert!(config.overwrite);
        assert_eq!(config.slice_mode, SliceMode::Append);
    }
}
