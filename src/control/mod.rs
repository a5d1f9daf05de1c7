//! Reactive form controls
//!
//! The host model every other module works against: controls and containers
//! exposing a value, overall validity, own errors, pristine/dirty state and
//! two change-notification streams.
//!
//! # Design Principles
//!
//! - Single-threaded: handles are `Rc`-based and cheap to clone
//! - Validators are plain functions over a control
//! - Change notifications are delivered in the order state changed
//! - Subscriptions are RAII guards

mod node;
mod path;
mod signal;
pub mod validators;

pub use node::{Control, ControlError, ControlKind, ControlResult, Status};
pub use path::{ControlPath, PathSegment};
pub use signal::{Signal, Subscription};
pub use validators::{AsyncValidatorFn, ErrorMap, ValidatorFn};
