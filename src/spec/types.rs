//! Spec tree types
//!
//! One generic tree describes all three kinds of configuration. The leaf
//! payload differs: validator lists, async validator lists, or message maps.

use std::collections::HashMap;

use crate::control::{AsyncValidatorFn, ValidatorFn};

/// Error code → human readable message
pub type MessageMap = HashMap<String, String>;

/// Configuration for one path of a form
#[derive(Debug, Clone, PartialEq)]
pub enum SpecNode<L> {
    /// Entry for the node at this path (validators or messages)
    Leaf(L),
    /// Per-field specs of a mapping
    Fields(HashMap<String, SpecNode<L>>),
    /// Per-index specs of a sequence
    Elements(Vec<SpecNode<L>>),
    /// Container-level spec: own entry, child spec, scalar escape hatch
    Container(ContainerSpec<L>),
}

/// Container-level spec
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec<L> {
    /// Applies to the container node itself
    pub own: Option<L>,
    /// Applies to the children. For sequences, `Elements` is matched by
    /// index and anything else is used for every element.
    pub fields: Option<Box<SpecNode<L>>>,
    /// Build a sequence as one field holding the whole array
    pub treat_as_scalar: bool,
}

impl<L> SpecNode<L> {
    pub fn leaf(entry: L) -> Self {
        SpecNode::Leaf(entry)
    }

    pub fn fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SpecNode<L>)>,
        K: Into<String>,
    {
        SpecNode::Fields(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn elements(elements: Vec<SpecNode<L>>) -> Self {
        SpecNode::Elements(elements)
    }

    /// Name of the variant, used in configuration errors
    pub fn variant_name(&self) -> &'static str {
        match self {
            SpecNode::Leaf(_) => "leaf",
            SpecNode::Fields(_) => "fields",
            SpecNode::Elements(_) => "elements",
            SpecNode::Container(_) => "container",
        }
    }
}

impl<L> ContainerSpec<L> {
    pub fn new() -> Self {
        Self {
            own: None,
            fields: None,
            treat_as_scalar: false,
        }
    }

    pub fn with_own(mut self, own: L) -> Self {
        self.own = Some(own);
        self
    }

    pub fn with_fields(mut self, fields: SpecNode<L>) -> Self {
        self.fields = Some(Box::new(fields));
        self
    }

    pub fn scalar(mut self) -> Self {
        self.treat_as_scalar = true;
        self
    }
}

impl<L> Default for ContainerSpec<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> From<ContainerSpec<L>> for SpecNode<L> {
    fn from(container: ContainerSpec<L>) -> Self {
        SpecNode::Container(container)
    }
}

/// Synchronous validator tree
pub type ValidatorSpec = SpecNode<Vec<ValidatorFn>>;

/// Async validator tree
pub type AsyncValidatorSpec = SpecNode<Vec<AsyncValidatorFn>>;

/// Message tree
pub type MessageSpec = SpecNode<MessageMap>;

/// Build a message map from `(code, message)` pairs
pub fn messages<I, K, V>(entries: I) -> MessageMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
