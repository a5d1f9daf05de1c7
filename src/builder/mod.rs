//! Form tree builder
//!
//! Compiles a nested data value into a control tree in one pass, attaching
//! validators, async validators and messages found in the spec trees.
//!
//! # Guarantees
//!
//! - The tree mirrors the data shape at every path, in input order
//! - Building is deterministic: same inputs, structurally equal trees
//! - Configuration errors abort the build; no partial form is returned
//! - Messages live in the form's side-table, never on the controls

mod builder;
mod data;
mod form;

pub use builder::{build, FormBuilder};
pub use data::DataNode;
pub use form::{Form, MessageTable};
