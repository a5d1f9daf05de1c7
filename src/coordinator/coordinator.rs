//! # Form Rebind Coordinator
//!
//! Registry of live aggregators. When a form is replaced wholesale every
//! registered aggregator is moved to the node at its path in the new tree.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::aggregator::{AggregatorId, ErrorAggregator, WeakAggregator};
use crate::builder::Form;
use crate::control::ControlPath;

/// Outcome of one [`FormCoordinator::notify`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebindReport {
    /// Aggregators bound to a node of the new form
    pub rebound: usize,
    /// Aggregators whose path does not exist in the new form
    pub unbound: usize,
    /// Registry entries whose aggregator was already dropped
    pub purged: usize,
}

/// Tracks aggregators and the form they observe
#[derive(Default)]
pub struct FormCoordinator {
    registry: RefCell<HashMap<AggregatorId, WeakAggregator>>,
    form: RefCell<Option<Form>>,
}

impl FormCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A coordinator that already knows the current form
    pub fn with_form(form: Form) -> Self {
        Self {
            registry: RefCell::new(HashMap::new()),
            form: RefCell::new(Some(form)),
        }
    }

    /// Current form, if one was set
    pub fn form(&self) -> Option<Form> {
        self.form.borrow().clone()
    }

    /// Track an aggregator. The registry holds it weakly.
    pub fn register(&self, aggregator: &ErrorAggregator) {
        self.registry
            .borrow_mut()
            .insert(aggregator.id(), aggregator.downgrade());
    }

    /// Stop tracking an aggregator; returns whether it was registered
    pub fn unregister(&self, aggregator: &ErrorAggregator) -> bool {
        self.registry.borrow_mut().remove(&aggregator.id()).is_some()
    }

    /// Bind an aggregator to `path` in the current form and register it
    pub fn attach(&self, path: ControlPath) -> ErrorAggregator {
        let aggregator = match self.form() {
            Some(form) => ErrorAggregator::bind(&form, path),
            None => ErrorAggregator::new(path),
        };
        self.register(&aggregator);
        aggregator
    }

    /// Unregister and deactivate
    pub fn detach(&self, aggregator: &ErrorAggregator) {
        self.unregister(aggregator);
        aggregator.deactivate();
    }

    /// The form was replaced: rebind every registered aggregator to it
    pub fn notify(&self, form: &Form) -> RebindReport {
        *self.form.borrow_mut() = Some(form.clone());

        let entries: Vec<(AggregatorId, WeakAggregator)> = self
            .registry
            .borrow()
            .iter()
            .map(|(id, weak)| (*id, weak.clone()))
            .collect();

        let mut report = RebindReport::default();
        let mut dead = Vec::new();

        for (id, weak) in entries {
            match weak.upgrade().filter(ErrorAggregator::is_active) {
                Some(aggregator) => {
                    if aggregator.rebind(form) {
                        report.rebound += 1;
                    } else {
                        report.unbound += 1;
                    }
                }
                None => dead.push(id),
            }
        }

        if !dead.is_empty() {
            let mut registry = self.registry.borrow_mut();
            for id in &dead {
                registry.remove(id);
            }
            report.purged = dead.len();
        }

        report
    }

    /// Number of registered aggregators, including ones not yet purged
    pub fn len(&self) -> usize {
        self.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.borrow().is_empty()
    }
}
