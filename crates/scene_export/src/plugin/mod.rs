//! # Plugin Layer
//!
//! Renderer plugin instances as the exporters build them: typed attribute
//! values, descriptors, per-type schemas and per-type export hooks.
//!
//! ## Organization
//!
//! - **Value**: `AttrValue` and the `AttrPlugin` reference
//! - **Descriptor**: `PluginDesc`, one plugin instance under construction
//! - **Schema**: declared attributes and defaults, plus the skip registry
//! - **Hooks**: optional per-type callbacks resolved once at startup
//! - **Builtin**: the shipped plugin set

pub mod builtin;
pub mod descriptor;
pub mod hooks;
pub mod schema;
pub mod value;

pub use descriptor::PluginDesc;
pub use hooks::{HookRegistry, PluginHooks};
pub use schema::{AttrDef, PluginCategory, PluginSchema, SchemaRegistry};
pub use value::{AttrKind, AttrPlugin, AttrValue};
