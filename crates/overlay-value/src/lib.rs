//! Typed value model for the overlay merge engine.
//!
//! The merge engine never touches Rust values directly. It works on
//! [`Value`] handles that carry their declared [`Type`] next to a tagged
//! [`Data`] payload, so merge policy can be decided by an explicit switch
//! over [`Kind`] instead of host-language reflection.
//!
//! # Key Types
//!
//! - [`Type`] — Cheap-clone type descriptor (name + [`Shape`])
//! - [`Value`] — Typed value handle; containers use `None` for nil
//! - [`Ptr`] — Owned pointee with a stable identity
//! - [`Key`] — Hashable-equivalent projection used for map keys and sets
//! - [`Reflect`] — Bridge from Rust types, with [`reflect_struct!`] for structs
//!
//! # Quick Start
//!
//! ```rust
//! use overlay_value::{Key, Type, Value};
//!
//! let defaults = Value::map(
//!     Type::string(),
//!     Type::any(),
//!     [(Value::string("port"), Value::i64(8080))],
//! )
//! .unwrap();
//! let port = defaults.get(&Key::from("port")).and_then(Value::concrete);
//! assert_eq!(port, Some(&Value::i64(8080)));
//! ```

pub mod cast;
pub mod compat;
pub mod error;
pub mod json;
pub mod key;
pub mod reflect;
pub mod ty;
pub mod value;

pub use compat::{convertible, hashable};
pub use error::{ValueError, ValueResult};
pub use json::{from_json, from_json_str, to_json};
pub use key::{is_key_type, Key};
pub use reflect::{Reflect, ReflectKey};
pub use ty::{Field, FloatWidth, IntWidth, Kind, Shape, Type};
pub use value::{Data, Ptr, PtrId, Value};
