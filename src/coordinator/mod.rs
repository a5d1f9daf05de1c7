//! Form replacement handling
//!
//! Forms are often rebuilt wholesale (new search criteria, a reset). The
//! coordinator keeps every registered aggregator pointed at the node with
//! the same path in the newest tree.

mod coordinator;

pub use coordinator::{FormCoordinator, RebindReport};
