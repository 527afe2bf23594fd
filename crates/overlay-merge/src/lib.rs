//! Type-driven deep merge for [`overlay_value`] values.
//!
//! A source value is merged onto a destination reached through a pointer.
//! The destination's type decides how: structs merge field by field, maps
//! key by key, slices by the configured [`SliceMode`], pointers through
//! their pointees, and leaves through scalar assignment under the overwrite
//! policy. Values of different types are reconciled by registered
//! conversion functions or native numeric and text casts. A failed merge
//! leaves the destination untouched.
//!
//! # Key Types
//!
//! - [`MergeConfig`] — Overwrite, conversion and slice policy plus the
//!   function registry
//! - [`MergeOption`] — Ordered configuration mutators accepted by [`merge`]
//! - [`CustomFunc`] — A user merge or conversion function
//! - [`MergeError`] — Everything a merge can fail with
//!
//! # Quick Start
//!
//! ```rust
//! use overlay_merge::{merge_into, MergeOption, SliceMode};
//! use overlay_value::reflect_struct;
//!
//! reflect_struct! {
//!     #[derive(Clone, Debug, PartialEq)]
//!     pub struct Service {
//!         pub name: String,
//!         pub port: i64,
//!         pub tags: Vec<String>,
//!     }
//! }
//!
//! let mut service = Service { name: "api".into(), port: 0, tags: vec!["a".into()] };
//! let overrides = Service { name: "web".into(), port: 8080, tags: vec!["b".into()] };
//! merge_into(
//!     &mut service,
//!     &overrides,
//!     [MergeOption::WithoutOverwrite, MergeOption::SliceMode(SliceMode::Append)],
//! )
//! .unwrap();
//! assert_eq!(service.name, "api");
//! assert_eq!(service.port, 8080);
//! assert_eq!(service.tags, vec!["a", "b"]);
//! ```

mod assign;
pub mod config;
mod convert;
mod engine;
pub mod error;
pub mod merge;
pub mod registry;

// Re-exports for convenience.
pub use config::{MergeConfig, MergeOption, SliceMode};
pub use error::{MergeError, MergeResult, RegistryError};
pub use merge::{merge, merge_into, merge_into_with, merge_layers, merge_with};
pub use registry::{validate, CustomFunc, FuncKind, Registry};
