//! Built forms and their message side-table

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::control::{Control, ControlPath, Status};
use crate::spec::MessageMap;

/// Messages attached at build time, keyed by control path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageTable {
    entries: HashMap<ControlPath, MessageMap>,
}

impl MessageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: ControlPath, messages: MessageMap) {
        self.entries.insert(path, messages);
    }

    pub fn get(&self, path: &ControlPath) -> Option<&MessageMap> {
        self.entries.get(path)
    }

    /// Message for one error code at a path
    pub fn message(&self, path: &ControlPath, code: &str) -> Option<&str> {
        self.get(path)?.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &ControlPath> {
        self.entries.keys()
    }
}

/// A built control tree together with its messages.
///
/// Cloning a form clones handles: both copies address the same controls.
#[derive(Debug, Clone)]
pub struct Form {
    root: Control,
    messages: Rc<MessageTable>,
}

impl Form {
    pub fn new(root: Control, messages: MessageTable) -> Self {
        Self {
            root,
            messages: Rc::new(messages),
        }
    }

    pub fn root(&self) -> &Control {
        &self.root
    }

    /// Control at a relative path, if the tree has one
    pub fn get(&self, path: &ControlPath) -> Option<Control> {
        self.root.get(path)
    }

    pub fn messages(&self) -> &MessageTable {
        &self.messages
    }

    /// Shared handle to the message table
    pub fn message_table(&self) -> Rc<MessageTable> {
        Rc::clone(&self.messages)
    }

    pub fn messages_for(&self, path: &ControlPath) -> Option<&MessageMap> {
        self.messages.get(path)
    }

    pub fn value(&self) -> Value {
        self.root.value()
    }

    pub fn status(&self) -> Status {
        self.root.status()
    }

    pub fn is_valid(&self) -> bool {
        self.root.is_valid()
    }

    pub fn dirty(&self) -> bool {
        self.root.dirty()
    }

    /// Whether both forms share the same root control
    pub fn ptr_eq(&self, other: &Form) -> bool {
        self.root.ptr_eq(&other.root)
    }

    /// Every control with its path, parents before children
    pub fn controls(&self) -> Vec<(ControlPath, Control)> {
        let mut out = Vec::new();
        let mut stack = vec![(ControlPath::root(), self.root.clone())];
        while let Some((path, control)) = stack.pop() {
            let children = control.children();
            out.push((path.clone(), control));
            for (segment, child) in children.into_iter().rev() {
                stack.push((path.child(segment), child));
            }
        }
        out
    }
}
