//! Error Aggregator Scenario Tests
//!
//! End-to-end tests for error surfacing on built forms:
//! - Group-level errors raise and clear exactly once
//! - Groups invalid only through their children emit Cleared
//! - Rebinding to a form without the path leaves the aggregator silent
//! - Async validators surface their errors once they resolve

use std::cell::RefCell;
use std::rc::Rc;

use formflow::aggregator::{AggregatorState, ErrorAggregator, ErrorEvent, ValidationMessage};
use formflow::builder::{build, Form, FormBuilder};
use formflow::control::validators::{async_validator, error, required};
use formflow::control::{ControlPath, Status, Subscription};
use formflow::coordinator::FormCoordinator;
use formflow::spec::{
    messages, AsyncValidatorSpec, ContainerSpec, MessageSpec, SpecNode, ValidatorSpec,
};
use futures_util::FutureExt;
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

type Events = Rc<RefCell<Vec<ErrorEvent>>>;

fn collect(aggregator: &ErrorAggregator) -> (Events, Subscription) {
    let events: Events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let subscription = aggregator.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    (events, subscription)
}

/// Group with its own `required` rule and a required child `a`
fn required_group(data: serde_json::Value) -> Form {
    let rules: ValidatorSpec = ContainerSpec::new()
        .with_own(vec![required()])
        .with_fields(SpecNode::fields([("a", SpecNode::leaf(vec![required()]))]))
        .into();
    let msgs: MessageSpec = ContainerSpec::new()
        .with_own(messages([("required", "Fill in at least one field")]))
        .into();
    build(&data, Some(&rules), None, Some(&msgs)).unwrap()
}

fn address_form(data: serde_json::Value) -> Form {
    let rules: ValidatorSpec = SpecNode::fields([(
        "address",
        SpecNode::fields([("zip", SpecNode::leaf(vec![required()]))]),
    )]);
    build(&data, Some(&rules), None, None).unwrap()
}

// =============================================================================
// Group Scenario Tests
// =============================================================================

/// Own group error raises, then clears exactly once.
#[test]
fn test_group_error_raises_then_clears_once() {
    let form = required_group(json!({ "a": null }));
    let aggregator = ErrorAggregator::bind(&form, ControlPath::root());
    let (events, _sub) = collect(&aggregator);

    aggregator.blur();
    assert_eq!(
        *events.borrow(),
        vec![ErrorEvent::Raised(ValidationMessage {
            code: "required".to_string(),
            message: "Fill in at least one field".to_string(),
        })]
    );

    let a = form.get(&ControlPath::parse("a")).unwrap();
    a.input(json!("x"));
    a.input(json!("xy"));
    a.input(json!("xyz"));

    assert_eq!(events.borrow().len(), 2);
    assert_eq!(events.borrow()[1], ErrorEvent::Cleared);
    assert_eq!(aggregator.state(), AggregatorState::OwnValid);
    assert!(aggregator.last_error().is_none());
}

/// A group valid on its own but holding an invalid child emits Cleared.
#[test]
fn test_group_invalid_through_child_emits_cleared() {
    let form = required_group(json!({ "a": null, "b": "x" }));
    let aggregator = ErrorAggregator::bind(&form, ControlPath::root());
    let (events, _sub) = collect(&aggregator);

    aggregator.recheck();
    assert_eq!(form.status(), Status::Invalid);
    assert!(form.root().errors().is_none());
    assert_eq!(*events.borrow(), vec![ErrorEvent::Cleared]);
    assert_eq!(aggregator.state(), AggregatorState::OwnInvalidOrPropagated);

    // Still invalid through `a`: nothing new to say
    form.get(&ControlPath::parse("b")).unwrap().input(json!("y"));
    assert_eq!(events.borrow().len(), 1);
}

/// Identical errors are not re-emitted on repeated status signals.
#[test]
fn test_repeated_error_is_not_re_emitted() {
    let form = address_form(json!({ "address": { "zip": "1" } }));
    let aggregator = ErrorAggregator::bind(&form, ControlPath::parse("address.zip"));
    let (events, _sub) = collect(&aggregator);
    let zip = aggregator.control().unwrap();

    zip.input(json!(""));
    zip.input(json!(null));
    zip.update_value_and_validity();

    assert_eq!(events.borrow().len(), 1);
    assert!(matches!(events.borrow()[0], ErrorEvent::Raised(_)));
}

// =============================================================================
// Rebind Scenario Tests
// =============================================================================

/// Rebinding to a form without the path leaves the aggregator silent.
#[test]
fn test_rebind_miss_stays_silent() {
    let first = address_form(json!({ "address": { "zip": "" } }));
    let coordinator = FormCoordinator::with_form(first.clone());
    let aggregator = coordinator.attach(ControlPath::parse("address.zip"));
    let (events, _sub) = collect(&aggregator);
    assert!(aggregator.is_bound());

    let second = build(&json!({ "name": "x" }), None, None, None).unwrap();
    let report = coordinator.notify(&second);

    assert_eq!(report.rebound, 0);
    assert_eq!(report.unbound, 1);
    assert!(!aggregator.is_bound());

    // The old form no longer reaches the aggregator
    first
        .get(&ControlPath::parse("address.zip"))
        .unwrap()
        .input(json!(""));
    aggregator.blur();

    assert!(events.borrow().is_empty());
    assert!(aggregator.last_error().is_none());
}

/// A later form with the path picks the aggregator back up.
#[test]
fn test_rebind_after_miss_reattaches() {
    let coordinator =
        FormCoordinator::with_form(address_form(json!({ "address": { "zip": "1" } })));
    let aggregator = coordinator.attach(ControlPath::parse("address.zip"));
    let (events, _sub) = collect(&aggregator);

    coordinator.notify(&build(&json!({}), None, None, None).unwrap());
    let third = address_form(json!({ "address": { "zip": "" } }));
    let report = coordinator.notify(&third);

    assert_eq!(report.rebound, 1);
    aggregator.blur();
    assert_eq!(events.borrow().len(), 1);
    assert!(aggregator
        .control()
        .unwrap()
        .ptr_eq(&third.get(&ControlPath::parse("address.zip")).unwrap()));
}

/// Dropped aggregators are purged on the next notify.
#[test]
fn test_dropped_aggregators_are_purged() {
    let form = address_form(json!({ "address": { "zip": "1" } }));
    let coordinator = FormCoordinator::with_form(form.clone());
    let kept = coordinator.attach(ControlPath::parse("address.zip"));
    drop(coordinator.attach(ControlPath::parse("address")));
    assert_eq!(coordinator.len(), 2);

    let report = coordinator.notify(&form);
    assert_eq!(report.rebound, 1);
    assert_eq!(report.purged, 1);
    assert_eq!(coordinator.len(), 1);
    assert!(kept.is_bound());
}

// =============================================================================
// Async Scenario Tests
// =============================================================================

/// Async errors surface once the validator resolves.
#[tokio::test]
async fn test_async_error_surfaces_after_resolution() {
    let checks: AsyncValidatorSpec = SpecNode::fields([(
        "username",
        SpecNode::leaf(vec![async_validator(|control| {
            let taken = control.value() == json!("admin");
            async move { taken.then(|| error("taken", json!(true))) }.boxed_local()
        })]),
    )]);
    let msgs: MessageSpec = SpecNode::fields([(
        "username",
        SpecNode::leaf(messages([("taken", "That name is taken")])),
    )]);
    let form = FormBuilder::new(&json!({ "username": "admin" }))
        .async_validators(&checks)
        .messages(&msgs)
        .build()
        .unwrap();

    let aggregator = ErrorAggregator::bind(&form, ControlPath::parse("username"));
    let (events, _sub) = collect(&aggregator);

    aggregator.recheck();
    assert_eq!(form.status(), Status::Pending);
    assert!(events.borrow().is_empty());

    form.root().validate_async_tree().await;

    assert_eq!(form.status(), Status::Invalid);
    assert_eq!(
        *events.borrow(),
        vec![ErrorEvent::Raised(ValidationMessage {
            code: "taken".to_string(),
            message: "That name is taken".to_string(),
        })]
    );
}
