//! Error aggregator bound to one control

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use uuid::Uuid;

use crate::builder::{Form, MessageTable};
use crate::control::{Control, ControlPath, Signal, Subscription};
use crate::observability::{log_event_with_fields, Event};

use super::state::{AggregatorState, BindingRecord, ErrorEvent, Observation, ValidationMessage};

/// Unique aggregator identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AggregatorId(Uuid);

impl AggregatorId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AggregatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Binding {
    control: Control,
    messages: Rc<MessageTable>,
    // Dropping the binding drops the host subscription
    _subscription: Subscription,
}

struct AggregatorInner {
    id: AggregatorId,
    path: ControlPath,
    binding: RefCell<Option<Binding>>,
    record: RefCell<BindingRecord>,
    events: Signal<ErrorEvent>,
    active: Cell<bool>,
}

/// Surfaces the first own error of a control as [`ErrorEvent`]s.
///
/// Handles are cheap to clone; the binding lives until the last handle is
/// dropped or [`ErrorAggregator::deactivate`] is called.
#[derive(Clone)]
pub struct ErrorAggregator {
    inner: Rc<AggregatorInner>,
}

/// Non-owning aggregator handle, held by coordinators
#[derive(Clone)]
pub struct WeakAggregator {
    inner: Weak<AggregatorInner>,
}

impl WeakAggregator {
    pub fn upgrade(&self) -> Option<ErrorAggregator> {
        self.inner.upgrade().map(|inner| ErrorAggregator { inner })
    }
}

impl ErrorAggregator {
    /// An aggregator for `path` that is not bound to any form yet
    pub fn new(path: ControlPath) -> Self {
        Self {
            inner: Rc::new(AggregatorInner {
                id: AggregatorId::new(),
                path,
                binding: RefCell::new(None),
                record: RefCell::new(BindingRecord::new()),
                events: Signal::new(),
                active: Cell::new(true),
            }),
        }
    }

    /// Create an aggregator and bind it to the node at `path` in `form`.
    ///
    /// When the form has no such node the aggregator stays unbound.
    pub fn bind(form: &Form, path: ControlPath) -> Self {
        let aggregator = Self::new(path);
        aggregator.attach_to(form, Event::AggregatorBound);
        aggregator
    }

    pub fn id(&self) -> AggregatorId {
        self.inner.id
    }

    pub fn path(&self) -> &ControlPath {
        &self.inner.path
    }

    pub fn state(&self) -> AggregatorState {
        self.inner.record.borrow().state()
    }

    /// Message currently surfaced, if any
    pub fn last_error(&self) -> Option<ValidationMessage> {
        self.inner.record.borrow().last_error().cloned()
    }

    pub fn control(&self) -> Option<Control> {
        self.inner
            .binding
            .borrow()
            .as_ref()
            .map(|binding| binding.control.clone())
    }

    pub fn is_bound(&self) -> bool {
        self.inner.binding.borrow().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    pub fn downgrade(&self) -> WeakAggregator {
        WeakAggregator {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Listen for error events
    pub fn subscribe(&self, listener: impl Fn(&ErrorEvent) + 'static) -> Subscription {
        self.inner.events.subscribe(listener)
    }

    /// Move to the node at the same path in `form`.
    ///
    /// Returns false when the new form has no node there; the aggregator is
    /// then unbound until the next successful rebind.
    pub fn rebind(&self, form: &Form) -> bool {
        if !self.is_active() {
            return false;
        }
        self.inner.binding.borrow_mut().take();
        self.inner.record.borrow_mut().reset();
        self.attach_to(form, Event::AggregatorRebound)
    }

    /// Re-evaluate the bound node and emit if the state machine says so
    pub fn recheck(&self) {
        if !self.is_active() {
            return;
        }

        let event = {
            let binding = self.inner.binding.borrow();
            let binding = match binding.as_ref() {
                Some(binding) => binding,
                None => return,
            };
            let own_errors = binding.control.errors();
            let observation = Observation {
                status: binding.control.status(),
                own_errors: own_errors.as_ref(),
                messages: binding.messages.get(&self.inner.path),
            };
            self.inner.record.borrow_mut().observe(&observation)
        };

        if let Some(event) = event {
            let path = self.inner.path.to_string();
            let code = match &event {
                ErrorEvent::Raised(message) => message.code.as_str(),
                ErrorEvent::Cleared => "",
            };
            log_event_with_fields(Event::ErrorSurfaced, &[("path", &path), ("code", code)]);
            self.inner.events.emit(&event);
        }
    }

    /// Focus left the bound control. A pristine control gets one recheck so
    /// required-but-untouched fields can surface their error.
    pub fn blur(&self) {
        let pristine = self
            .inner
            .binding
            .borrow()
            .as_ref()
            .map(|binding| binding.control.pristine());
        if pristine == Some(true) {
            self.recheck();
        }
    }

    /// Stop observing. No events are emitted afterwards.
    pub fn deactivate(&self) {
        if !self.inner.active.replace(false) {
            return;
        }
        self.inner.binding.borrow_mut().take();
        let path = self.inner.path.to_string();
        log_event_with_fields(Event::AggregatorDeactivated, &[("path", &path)]);
    }

    fn attach_to(&self, form: &Form, event: Event) -> bool {
        let path = self.inner.path.to_string();
        let control = match form.get(&self.inner.path) {
            Some(control) => control,
            None => {
                log_event_with_fields(Event::BindingMiss, &[("path", &path)]);
                return false;
            }
        };

        let weak = Rc::downgrade(&self.inner);
        let subscription = control.status_changes().subscribe(move |_| {
            if let Some(inner) = weak.upgrade() {
                ErrorAggregator { inner }.recheck();
            }
        });

        *self.inner.binding.borrow_mut() = Some(Binding {
            control,
            messages: form.message_table(),
            _subscription: subscription,
        });

        let id = self.inner.id.to_string();
        log_event_with_fields(event, &[("aggregator", &id), ("path", &path)]);
        true
    }
}

impl fmt::Debug for ErrorAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorAggregator")
            .field("id", &self.inner.id)
            .field("path", &self.inner.path)
            .field("state", &self.state())
            .field("bound", &self.is_bound())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::control::validators::required;
    use crate::spec::{messages, MessageSpec, SpecNode, ValidatorSpec};
    use serde_json::json;

    fn collect(aggregator: &ErrorAggregator) -> (Rc<RefCell<Vec<ErrorEvent>>>, Subscription) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let subscription = aggregator.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        (events, subscription)
    }

    fn name_form(name: &str) -> Form {
        let rules: ValidatorSpec = SpecNode::fields([("name", SpecNode::leaf(vec![required()]))]);
        let msgs: MessageSpec = SpecNode::fields([(
            "name",
            SpecNode::leaf(messages([("required", "Name is required")])),
        )]);
        build(&json!({ "name": name }), Some(&rules), None, Some(&msgs)).unwrap()
    }

    #[test]
    fn test_raise_and_clear_on_input() {
        let form = name_form("Ada");
        let aggregator = ErrorAggregator::bind(&form, ControlPath::parse("name"));
        let (events, _sub) = collect(&aggregator);
        let name = aggregator.control().unwrap();

        name.input(json!(""));
        name.input(json!("Grace"));

        assert_eq!(
            *events.borrow(),
            vec![
                ErrorEvent::Raised(ValidationMessage {
                    code: "required".to_string(),
                    message: "Name is required".to_string(),
                }),
                ErrorEvent::Cleared,
            ]
        );
        assert_eq!(aggregator.state(), AggregatorState::OwnValid);
    }

    #[test]
    fn test_blur_surfaces_pristine_error() {
        let form = name_form("");
        let aggregator = ErrorAggregator::bind(&form, ControlPath::parse("name"));
        let (events, _sub) = collect(&aggregator);

        aggregator.blur();
        assert_eq!(events.borrow().len(), 1);
        assert_eq!(aggregator.last_error().unwrap().message, "Name is required");

        // Once dirty, blur no longer forces a recheck
        aggregator.control().unwrap().mark_as_dirty();
        aggregator.blur();
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn test_missing_path_leaves_aggregator_unbound() {
        let form = name_form("Ada");
        let aggregator = ErrorAggregator::bind(&form, ControlPath::parse("email"));
        assert!(!aggregator.is_bound());
        aggregator.recheck();
        aggregator.blur();
        assert_eq!(aggregator.state(), AggregatorState::Unobserved);
    }

    #[test]
    fn test_deactivate_stops_emissions() {
        let form = name_form("Ada");
        let aggregator = ErrorAggregator::bind(&form, ControlPath::parse("name"));
        let (events, _sub) = collect(&aggregator);
        let name = aggregator.control().unwrap();

        aggregator.deactivate();
        name.input(json!(""));

        assert!(events.borrow().is_empty());
        assert!(!aggregator.is_active());
        assert!(!aggregator.is_bound());
        assert_eq!(name.status_changes().listener_count(), 0);
        assert!(!aggregator.rebind(&name_form("")));
    }

    #[test]
    fn test_dropping_aggregator_releases_subscription() {
        let form = name_form("Ada");
        let name = form.get(&ControlPath::parse("name")).unwrap();
        {
            let _aggregator = ErrorAggregator::bind(&form, ControlPath::parse("name"));
            assert_eq!(name.status_changes().listener_count(), 1);
        }
        assert_eq!(name.status_changes().listener_count(), 0);
    }

    #[test]
    fn test_rebind_moves_to_new_form() {
        let first = name_form("");
        let aggregator = ErrorAggregator::bind(&first, ControlPath::parse("name"));
        let (events, _sub) = collect(&aggregator);
        aggregator.recheck();
        assert_eq!(events.borrow().len(), 1);

        let second = name_form("Ada");
        assert!(aggregator.rebind(&second));
        assert_eq!(aggregator.state(), AggregatorState::Unobserved);

        // Old form no longer drives the aggregator
        first.get(&ControlPath::parse("name")).unwrap().input(json!("x"));
        assert_eq!(events.borrow().len(), 1);

        // The surfaced error from the old form is cleared by the new one
        second.get(&ControlPath::parse("name")).unwrap().input(json!("Grace"));
        assert_eq!(events.borrow().last(), Some(&ErrorEvent::Cleared));
    }
}
