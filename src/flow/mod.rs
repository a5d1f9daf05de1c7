//! # Search Flow
//!
//! Shareable, bookmarkable search forms without server-side sessions: the
//! search criteria travel in a query parameter as a signed token.
//!
//! ## Components
//! - [`TokenCodec`]: HS256 token encoding of arbitrary JSON criteria
//! - [`FlowConfig`]: token key, parameter name, navigation behaviour
//! - [`SearchFlow`]: the ready / submit / navigate state machine

mod config;
mod errors;
mod flow;
pub mod token;

pub use config::FlowConfig;
pub use errors::{FlowError, FlowResult, TokenError, TokenResult};
pub use flow::{FormFactory, NavigationRequest, QueryParams, SearchFlow, SubmitEvent, SubmitOrigin};
pub use token::TokenCodec;
