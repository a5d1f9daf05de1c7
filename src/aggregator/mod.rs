//! # Error Aggregation
//!
//! Observes one control (or container) and surfaces its first own error as
//! a stream of [`ErrorEvent`]s, telling a container's own-validator errors
//! apart from errors that only propagate up from its children.
//!
//! The transition logic lives in [`BindingRecord`] and has no knowledge of
//! controls; [`ErrorAggregator`] feeds it observations on every status
//! change of the bound node.

mod aggregator;
mod state;

pub use aggregator::{AggregatorId, ErrorAggregator, WeakAggregator};
pub use state::{
    first_error, resolve_message, AggregatorState, BindingRecord, ErrorEvent, Observation,
    ValidationMessage,
};
