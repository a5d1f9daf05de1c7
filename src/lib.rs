//! formflow - declarative reactive form trees
//!
//! - `control`: single-threaded reactive form controls
//! - `spec`: validator and message spec trees, and their JSON documents
//! - `builder`: compiles data plus specs into a control tree
//! - `aggregator`: surfaces the first own error of a control as events
//! - `coordinator`: rebinds aggregators when a form is replaced
//! - `flow`: query-parameter driven search forms with signed tokens
//! - `observability`: structured JSON logging
//! - `cli`: the `formflow` command line tool

pub mod aggregator;
pub mod builder;
pub mod cli;
pub mod control;
pub mod coordinator;
pub mod flow;
pub mod observability;
pub mod spec;

pub use aggregator::{ErrorAggregator, ErrorEvent, ValidationMessage};
pub use builder::{build, Form, FormBuilder};
pub use control::{Control, ControlPath, Status};
pub use coordinator::{FormCoordinator, RebindReport};
pub use flow::{FlowConfig, SearchFlow, TokenCodec};
pub use spec::{ConfigurationError, ContainerSpec, SpecNode};
