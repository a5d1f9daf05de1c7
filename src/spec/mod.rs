//! Form specs
//!
//! Validator, async validator and message trees that mirror the shape of the
//! data a form is built from. A spec node either applies to the node at its
//! path, to the node's children, or to both through a [`ContainerSpec`].
//!
//! # Resolution
//!
//! | Data shape | Accepted spec                                       |
//! |------------|-----------------------------------------------------|
//! | primitive  | `Leaf`, scalar `Container` without `fields`         |
//! | mapping    | `Fields`, `Container` whose `fields` is `Fields`    |
//! | sequence   | `Fields`, `Elements`, any `Container`               |
//!
//! Anything else is a [`ConfigurationError`].

pub mod document;
mod errors;
mod resolver;
mod types;

pub use document::{parse_message_spec, parse_validator_spec, RuleDoc};
pub use errors::{ConfigurationError, ContainerShape, SpecResult, SpecTree};
pub use resolver::{Resolver, Split};
pub use types::{
    messages, AsyncValidatorSpec, ContainerSpec, MessageMap, MessageSpec, SpecNode, ValidatorSpec,
};
