//! # Controls
//!
//! The reactive form model the rest of the crate is built on. A `Control` is a
//! cheap, clonable handle to one node of a form tree: a field holding a single
//! value, a group of named children, or an array of children.
//!
//! ## Invariants
//! - A container's value is always the aggregate of its children's values,
//!   in child order.
//! - Own errors come only from the node's own validators; a container whose
//!   own validators pass is still `Invalid` when a child is.
//! - Every recomputation emits exactly one `value_changes` and then one
//!   `status_changes` signal per affected node, children before parents.
//! - No borrow is held while validators or listeners run.

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use futures_util::future::{join_all, FutureExt, LocalBoxFuture};
use serde_json::{Map, Value};
use thiserror::Error;

use super::path::{ControlPath, PathSegment};
use super::signal::Signal;
use super::validators::{merge_errors, AsyncValidatorFn, ErrorMap, ValidatorFn};

/// Overall validity of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Valid,
    Invalid,
    /// Sync validation passed and async validators have not resolved yet
    Pending,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Valid => "VALID",
            Status::Invalid => "INVALID",
            Status::Pending => "PENDING",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shape of a control node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Field,
    Group,
    Array,
}

impl ControlKind {
    pub fn is_container(&self) -> bool {
        !matches!(self, ControlKind::Field)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::Field => "field",
            ControlKind::Group => "group",
            ControlKind::Array => "array",
        }
    }
}

/// Shape mutation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("Expected a {expected} control, found a {found}")]
    KindMismatch {
        expected: ControlKind,
        found: ControlKind,
    },

    #[error("No child named '{0}'")]
    UnknownChild(String),

    #[error("Index {index} out of range (len: {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result type for control shape mutations
pub type ControlResult<T> = Result<T, ControlError>;

enum Children {
    Field,
    Group(Vec<(String, Control)>),
    Array(Vec<Control>),
}

impl Children {
    fn kind(&self) -> ControlKind {
        match self {
            Children::Field => ControlKind::Field,
            Children::Group(_) => ControlKind::Group,
            Children::Array(_) => ControlKind::Array,
        }
    }
}

struct NodeState {
    children: Children,
    value: Value,
    validators: Vec<ValidatorFn>,
    async_validators: Vec<AsyncValidatorFn>,
    errors: Option<ErrorMap>,
    status: Status,
    async_pending: bool,
    /// Bumped on every recomputation so stale async results can be dropped
    generation: u64,
    pristine: bool,
    touched: bool,
}

struct ControlCell {
    state: RefCell<NodeState>,
    parent: RefCell<Weak<ControlCell>>,
    value_changes: Signal<Value>,
    status_changes: Signal<Status>,
}

/// Handle to a node of a form tree
#[derive(Clone)]
pub struct Control {
    cell: Rc<ControlCell>,
}

impl Control {
    // ==================
    // Construction
    // ==================

    fn from_parts(
        children: Children,
        value: Value,
        validators: Vec<ValidatorFn>,
        async_validators: Vec<AsyncValidatorFn>,
    ) -> Self {
        let control = Self {
            cell: Rc::new(ControlCell {
                state: RefCell::new(NodeState {
                    children,
                    value,
                    validators,
                    async_validators,
                    errors: None,
                    status: Status::Valid,
                    async_pending: false,
                    generation: 0,
                    pristine: true,
                    touched: false,
                }),
                parent: RefCell::new(Weak::new()),
                value_changes: Signal::new(),
                status_changes: Signal::new(),
            }),
        };

        for (_, child) in control.children() {
            child.set_parent(&control);
        }
        control.update(true, false);
        control
    }

    /// A field without validators
    pub fn field(value: Value) -> Self {
        Self::field_with(value, Vec::new(), Vec::new())
    }

    pub fn field_with(
        value: Value,
        validators: Vec<ValidatorFn>,
        async_validators: Vec<AsyncValidatorFn>,
    ) -> Self {
        Self::from_parts(Children::Field, value, validators, async_validators)
    }

    /// A group without own validators
    pub fn group(children: Vec<(String, Control)>) -> Self {
        Self::group_with(children, Vec::new(), Vec::new())
    }

    pub fn group_with(
        children: Vec<(String, Control)>,
        validators: Vec<ValidatorFn>,
        async_validators: Vec<AsyncValidatorFn>,
    ) -> Self {
        Self::from_parts(
            Children::Group(children),
            Value::Object(Map::new()),
            validators,
            async_validators,
        )
    }

    /// An array without own validators
    pub fn array(children: Vec<Control>) -> Self {
        Self::array_with(children, Vec::new(), Vec::new())
    }

    pub fn array_with(
        children: Vec<Control>,
        validators: Vec<ValidatorFn>,
        async_validators: Vec<AsyncValidatorFn>,
    ) -> Self {
        Self::from_parts(
            Children::Array(children),
            Value::Array(Vec::new()),
            validators,
            async_validators,
        )
    }

    // ==================
    // Reading
    // ==================

    pub fn kind(&self) -> ControlKind {
        self.cell.state.borrow().children.kind()
    }

    pub fn value(&self) -> Value {
        self.cell.state.borrow().value.clone()
    }

    pub fn status(&self) -> Status {
        self.cell.state.borrow().status
    }

    pub fn is_valid(&self) -> bool {
        self.status() == Status::Valid
    }

    pub fn is_invalid(&self) -> bool {
        self.status() == Status::Invalid
    }

    pub fn is_pending(&self) -> bool {
        self.status() == Status::Pending
    }

    /// Errors reported by this node's own validators
    pub fn errors(&self) -> Option<ErrorMap> {
        self.cell.state.borrow().errors.clone()
    }

    pub fn has_error(&self, code: &str) -> bool {
        self.cell
            .state
            .borrow()
            .errors
            .as_ref()
            .is_some_and(|e| e.contains_key(code))
    }

    pub fn pristine(&self) -> bool {
        self.cell.state.borrow().pristine
    }

    pub fn dirty(&self) -> bool {
        !self.pristine()
    }

    pub fn touched(&self) -> bool {
        self.cell.state.borrow().touched
    }

    pub fn validators(&self) -> Vec<ValidatorFn> {
        self.cell.state.borrow().validators.clone()
    }

    pub fn async_validators(&self) -> Vec<AsyncValidatorFn> {
        self.cell.state.borrow().async_validators.clone()
    }

    /// Fires after every value recomputation of this node
    pub fn value_changes(&self) -> &Signal<Value> {
        &self.cell.value_changes
    }

    /// Fires after every validity recomputation of this node
    pub fn status_changes(&self) -> &Signal<Status> {
        &self.cell.status_changes
    }

    /// Direct children, in order, with the segment addressing each
    pub fn children(&self) -> Vec<(PathSegment, Control)> {
        match &self.cell.state.borrow().children {
            Children::Field => Vec::new(),
            Children::Group(children) => children
                .iter()
                .map(|(k, c)| (PathSegment::Key(k.clone()), c.clone()))
                .collect(),
            Children::Array(children) => children
                .iter()
                .enumerate()
                .map(|(i, c)| (PathSegment::Index(i), c.clone()))
                .collect(),
        }
    }

    /// Direct child addressed by one segment
    pub fn child(&self, segment: &PathSegment) -> Option<Control> {
        match (&self.cell.state.borrow().children, segment) {
            (Children::Group(children), PathSegment::Key(key)) => children
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, c)| c.clone()),
            (Children::Array(children), PathSegment::Index(index)) => children.get(*index).cloned(),
            _ => None,
        }
    }

    /// Descendant at a relative path; the empty path is this control
    pub fn get(&self, path: &ControlPath) -> Option<Control> {
        path.segments()
            .iter()
            .try_fold(self.clone(), |control, segment| control.child(segment))
    }

    pub fn parent(&self) -> Option<Control> {
        self.cell
            .parent
            .borrow()
            .upgrade()
            .map(|cell| Control { cell })
    }

    pub fn root(&self) -> Control {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Whether both handles point at the same node
    pub fn ptr_eq(&self, other: &Control) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    // ==================
    // Writing
    // ==================

    /// Replace the value (fields) or patch the children present in `value`
    /// (containers), then recompute this node and its ancestors.
    pub fn set_value(&self, value: Value) {
        self.apply_value(value);
        self.update(false, true);
    }

    /// A user edit: marks the control dirty, then sets the value
    pub fn input(&self, value: Value) {
        self.mark_as_dirty();
        self.set_value(value);
    }

    fn apply_value(&self, value: Value) {
        match self.kind() {
            ControlKind::Field => {
                self.cell.state.borrow_mut().value = value;
            }
            ControlKind::Group => {
                let Value::Object(map) = value else {
                    return;
                };
                for (segment, child) in self.children() {
                    if let PathSegment::Key(key) = segment {
                        if let Some(v) = map.get(&key) {
                            child.apply_value(v.clone());
                            child.update(true, true);
                        }
                    }
                }
            }
            ControlKind::Array => {
                let Value::Array(items) = value else {
                    return;
                };
                for (child, v) in self.children().into_iter().map(|(_, c)| c).zip(items) {
                    child.apply_value(v);
                    child.update(true, true);
                }
            }
        }
    }

    pub fn set_validators(&self, validators: Vec<ValidatorFn>) {
        self.cell.state.borrow_mut().validators = validators;
    }

    pub fn set_async_validators(&self, validators: Vec<AsyncValidatorFn>) {
        self.cell.state.borrow_mut().async_validators = validators;
    }

    /// Recompute value and validity here and on every ancestor, emitting
    /// change signals
    pub fn update_value_and_validity(&self) {
        self.update(false, true);
    }

    /// Mark this control and its ancestors dirty
    pub fn mark_as_dirty(&self) {
        self.cell.state.borrow_mut().pristine = false;
        if let Some(parent) = self.parent() {
            parent.mark_as_dirty();
        }
    }

    /// Mark this control and its descendants pristine; ancestors become
    /// pristine once all of their children are
    pub fn mark_as_pristine(&self) {
        self.mark_subtree_pristine();
        let mut current = self.parent();
        while let Some(parent) = current {
            let all_pristine = parent.children().iter().all(|(_, c)| c.pristine());
            parent.cell.state.borrow_mut().pristine = all_pristine;
            current = parent.parent();
        }
    }

    fn mark_subtree_pristine(&self) {
        self.cell.state.borrow_mut().pristine = true;
        for (_, child) in self.children() {
            child.mark_subtree_pristine();
        }
    }

    pub fn mark_as_touched(&self) {
        self.cell.state.borrow_mut().touched = true;
        if let Some(parent) = self.parent() {
            parent.mark_as_touched();
        }
    }

    fn mark_subtree_untouched(&self) {
        self.cell.state.borrow_mut().touched = false;
        for (_, child) in self.children() {
            child.mark_subtree_untouched();
        }
    }

    /// Restore pristine, untouched state, optionally with a new value
    pub fn reset(&self, value: Option<Value>) {
        if let Some(value) = value {
            self.apply_value(value);
        }
        self.mark_subtree_untouched();
        self.mark_as_pristine();
        self.update(false, true);
    }

    // ==================
    // Shape changes
    // ==================

    /// Insert or replace a named child of a group
    pub fn add_control(&self, name: impl Into<String>, control: Control) -> ControlResult<()> {
        let name = name.into();
        let replaced = self.with_group(|children| {
            Ok(match children.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => Some(mem::replace(&mut slot.1, control.clone())),
                None => {
                    children.push((name, control.clone()));
                    None
                }
            })
        })?;
        if let Some(old) = replaced.filter(|old| !old.ptr_eq(&control)) {
            old.clear_parent();
        }
        control.set_parent(self);
        self.update(false, true);
        Ok(())
    }

    pub fn remove_control(&self, name: &str) -> ControlResult<Control> {
        let removed = self.with_group(|children| {
            let pos = children
                .iter()
                .position(|(k, _)| k == name)
                .ok_or_else(|| ControlError::UnknownChild(name.to_string()))?;
            Ok(children.remove(pos).1)
        })?;
        removed.clear_parent();
        self.update(false, true);
        Ok(removed)
    }

    /// Append an element to an array
    pub fn push(&self, control: Control) -> ControlResult<()> {
        self.with_array(|children| {
            children.push(control.clone());
            Ok(())
        })?;
        control.set_parent(self);
        self.update(false, true);
        Ok(())
    }

    pub fn remove_at(&self, index: usize) -> ControlResult<Control> {
        let removed = self.with_array(|children| {
            if index >= children.len() {
                return Err(ControlError::IndexOutOfRange {
                    index,
                    len: children.len(),
                });
            }
            Ok(children.remove(index))
        })?;
        removed.clear_parent();
        self.update(false, true);
        Ok(removed)
    }

    fn with_group<R>(
        &self,
        f: impl FnOnce(&mut Vec<(String, Control)>) -> ControlResult<R>,
    ) -> ControlResult<R> {
        let mut state = self.cell.state.borrow_mut();
        match &mut state.children {
            Children::Group(children) => f(children),
            other => Err(ControlError::KindMismatch {
                expected: ControlKind::Group,
                found: other.kind(),
            }),
        }
    }

    fn with_array<R>(
        &self,
        f: impl FnOnce(&mut Vec<Control>) -> ControlResult<R>,
    ) -> ControlResult<R> {
        let mut state = self.cell.state.borrow_mut();
        match &mut state.children {
            Children::Array(children) => f(children),
            other => Err(ControlError::KindMismatch {
                expected: ControlKind::Array,
                found: other.kind(),
            }),
        }
    }

    fn set_parent(&self, parent: &Control) {
        *self.cell.parent.borrow_mut() = Rc::downgrade(&parent.cell);
    }

    fn clear_parent(&self) {
        *self.cell.parent.borrow_mut() = Weak::new();
    }

    // ==================
    // Validation
    // ==================

    fn child_statuses(&self) -> Vec<Status> {
        self.children().iter().map(|(_, c)| c.status()).collect()
    }

    fn calculate_status(state: &NodeState, child_statuses: &[Status]) -> Status {
        if state.errors.is_some() || child_statuses.contains(&Status::Invalid) {
            Status::Invalid
        } else if state.async_pending || child_statuses.contains(&Status::Pending) {
            Status::Pending
        } else {
            Status::Valid
        }
    }

    fn aggregate_value(&self) -> Option<Value> {
        match &self.cell.state.borrow().children {
            Children::Field => None,
            Children::Group(children) => Some(Value::Object(
                children
                    .iter()
                    .map(|(k, c)| (k.clone(), c.value()))
                    .collect(),
            )),
            Children::Array(children) => {
                Some(Value::Array(children.iter().map(Control::value).collect()))
            }
        }
    }

    fn update(&self, only_self: bool, emit: bool) {
        if let Some(aggregate) = self.aggregate_value() {
            self.cell.state.borrow_mut().value = aggregate;
        }

        let validators = self.validators();
        let errors = merge_errors(validators.iter().filter_map(|v| v(self)));
        let child_statuses = self.child_statuses();

        {
            let mut state = self.cell.state.borrow_mut();
            state.generation += 1;
            state.async_pending = errors.is_none() && !state.async_validators.is_empty();
            state.errors = errors;
            state.status = Self::calculate_status(&state, &child_statuses);
        }

        if emit {
            self.cell.value_changes.emit(&self.value());
            self.cell.status_changes.emit(&self.status());
        }

        if !only_self {
            if let Some(parent) = self.parent() {
                parent.update(false, emit);
            }
        }
    }

    fn refresh_status(&self) {
        let child_statuses = self.child_statuses();
        {
            let mut state = self.cell.state.borrow_mut();
            state.status = Self::calculate_status(&state, &child_statuses);
        }
        self.cell.status_changes.emit(&self.status());

        if let Some(parent) = self.parent() {
            parent.refresh_status();
        }
    }

    /// Run this node's async validators if sync validation left it pending.
    ///
    /// Results are dropped when the control was recomputed while the
    /// validators were running.
    pub async fn validate_async(&self) {
        let (generation, validators) = {
            let state = self.cell.state.borrow();
            if !state.async_pending {
                return;
            }
            (state.generation, state.async_validators.clone())
        };

        let results = join_all(validators.iter().map(|v| v(self))).await;

        {
            let mut state = self.cell.state.borrow_mut();
            if state.generation != generation {
                return;
            }
            state.async_pending = false;
            state.errors = merge_errors(results.into_iter().flatten());
        }
        self.refresh_status();
    }

    /// Resolve pending async validation across the whole subtree, children
    /// first
    pub fn validate_async_tree(&self) -> LocalBoxFuture<'_, ()> {
        async move {
            for (_, child) in self.children() {
                child.validate_async_tree().await;
            }
            self.validate_async().await;
        }
        .boxed_local()
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.cell.state.borrow();
        f.debug_struct("Control")
            .field("value", &state.value)
            .field("status", &state.status)
            .field("errors", &state.errors)
            .field("pristine", &state.pristine)
            .finish()
    }
}
