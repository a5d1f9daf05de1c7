//! Observable events for formflow
//!
//! Events are explicit and typed; each maps to one stable name and a default
//! severity.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Building
    /// A control tree was built
    FormBuilt,
    /// A spec tree was rejected at build time
    ConfigurationRejected,

    // Error aggregation
    /// An aggregator was bound to a control
    AggregatorBound,
    /// An aggregator moved to a node of a replacement form
    AggregatorRebound,
    /// No node exists at an aggregator's path in a replacement form
    BindingMiss,
    /// An aggregator stopped observing
    AggregatorDeactivated,
    /// An aggregator surfaced or cleared an error
    ErrorSurfaced,

    // Search flow
    /// A search token could not be decoded
    TokenRejected,
    /// A search was submitted
    SearchSubmitted,
    /// A navigation carrying a search token was requested
    NavigationRequested,
    /// Initial form setup completed
    FlowReady,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::FormBuilt => "FORM_BUILT",
            Event::ConfigurationRejected => "FORM_CONFIGURATION_REJECTED",
            Event::AggregatorBound => "AGGREGATOR_BOUND",
            Event::AggregatorRebound => "AGGREGATOR_REBOUND",
            Event::BindingMiss => "AGGREGATOR_BINDING_MISS",
            Event::AggregatorDeactivated => "AGGREGATOR_DEACTIVATED",
            Event::ErrorSurfaced => "AGGREGATOR_ERROR_SURFACED",
            Event::TokenRejected => "SEARCH_TOKEN_REJECTED",
            Event::SearchSubmitted => "SEARCH_SUBMITTED",
            Event::NavigationRequested => "SEARCH_NAVIGATION_REQUESTED",
            Event::FlowReady => "SEARCH_FLOW_READY",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::ConfigurationRejected => Severity::Error,
            Event::TokenRejected => Severity::Warn,
            Event::FormBuilt
            | Event::SearchSubmitted
            | Event::NavigationRequested
            | Event::FlowReady => Severity::Info,
            Event::AggregatorBound
            | Event::AggregatorRebound
            | Event::BindingMiss
            | Event::AggregatorDeactivated
            | Event::ErrorSurfaced => Severity::Trace,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
