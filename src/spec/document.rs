//! JSON spec documents
//!
//! Validator and message trees can be written as JSON. A node is either a
//! leaf (a rule list, or a code → message object) or a container object
//! with any of `own`, `fields`, `elements`, `each` and `treat_as_scalar`:
//!
//! ```json
//! {
//!   "fields": {
//!     "name": ["required", {"min_length": 2}],
//!     "phones": {
//!       "own": [{"max_length": 3}],
//!       "each": {"fields": {"number": ["required"]}}
//!     },
//!     "tags": {"own": ["required"], "treat_as_scalar": true}
//!   }
//! }
//! ```
//!
//! Async validators cannot be expressed as documents.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::control::validators;
use crate::control::ValidatorFn;

use super::errors::{ConfigurationError, SpecResult, SpecTree};
use super::types::{ContainerSpec, MessageMap, MessageSpec, SpecNode, ValidatorSpec};

/// One built-in validation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleDoc {
    Required,
    RequiredTrue,
    Email,
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    Pattern(String),
}

impl RuleDoc {
    /// Compile into a validator function
    pub fn compile(&self) -> Result<ValidatorFn, regex::Error> {
        Ok(match self {
            RuleDoc::Required => validators::required(),
            RuleDoc::RequiredTrue => validators::required_true(),
            RuleDoc::Email => validators::email(),
            RuleDoc::MinLength(n) => validators::min_length(*n),
            RuleDoc::MaxLength(n) => validators::max_length(*n),
            RuleDoc::Min(n) => validators::min(*n),
            RuleDoc::Max(n) => validators::max(*n),
            RuleDoc::Pattern(raw) => validators::pattern(Regex::new(raw)?),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NodeDoc<L> {
    Container(ContainerDoc<L>),
    Leaf(L),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ContainerDoc<L> {
    own: Option<L>,
    fields: Option<HashMap<String, NodeDoc<L>>>,
    elements: Option<Vec<NodeDoc<L>>>,
    each: Option<Box<NodeDoc<L>>>,
    #[serde(default)]
    treat_as_scalar: bool,
}

/// Parse a validator document
pub fn parse_validator_spec(json: &str) -> SpecResult<ValidatorSpec> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ConfigurationError::malformed(SpecTree::Validators, e.to_string()))?;
    validator_spec_from_value(value)
}

/// Build a validator tree from an already parsed document
pub fn validator_spec_from_value(value: Value) -> SpecResult<ValidatorSpec> {
    let doc: NodeDoc<Vec<RuleDoc>> = serde_json::from_value(value)
        .map_err(|e| ConfigurationError::malformed(SpecTree::Validators, e.to_string()))?;

    convert(doc, SpecTree::Validators, &|rules: Vec<RuleDoc>| {
        rules
            .iter()
            .map(|rule| {
                rule.compile().map_err(|e| {
                    ConfigurationError::malformed(
                        SpecTree::Validators,
                        format!("invalid pattern: {}", e),
                    )
                })
            })
            .collect()
    })
}

/// Parse a message document
pub fn parse_message_spec(json: &str) -> SpecResult<MessageSpec> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ConfigurationError::malformed(SpecTree::Messages, e.to_string()))?;
    message_spec_from_value(value)
}

/// Build a message tree from an already parsed document
pub fn message_spec_from_value(value: Value) -> SpecResult<MessageSpec> {
    let doc: NodeDoc<MessageMap> = serde_json::from_value(value)
        .map_err(|e| ConfigurationError::malformed(SpecTree::Messages, e.to_string()))?;
    convert(doc, SpecTree::Messages, &|map| Ok(map))
}

fn convert<L, T, F>(doc: NodeDoc<L>, tree: SpecTree, leaf: &F) -> SpecResult<SpecNode<T>>
where
    F: Fn(L) -> SpecResult<T>,
{
    let container = match doc {
        NodeDoc::Leaf(entry) => return Ok(SpecNode::Leaf(leaf(entry)?)),
        NodeDoc::Container(container) => container,
    };

    let child_kinds = [
        container.fields.is_some(),
        container.elements.is_some(),
        container.each.is_some(),
    ]
    .iter()
    .filter(|present| **present)
    .count();
    if child_kinds > 1 {
        return Err(ConfigurationError::malformed(
            tree,
            "only one of `fields`, `elements` and `each` may be given",
        ));
    }

    let children = if let Some(fields) = container.fields {
        let mut converted = HashMap::with_capacity(fields.len());
        for (name, child) in fields {
            converted.insert(name, convert(child, tree, leaf)?);
        }
        Some(SpecNode::Fields(converted))
    } else if let Some(elements) = container.elements {
        let converted = elements
            .into_iter()
            .map(|child| convert(child, tree, leaf))
            .collect::<SpecResult<Vec<_>>>()?;
        Some(SpecNode::Elements(converted))
    } else if let Some(each) = container.each {
        // A bare template is wrapped so it is never mistaken for `fields`
        let template = convert(*each, tree, leaf)?;
        Some(SpecNode::Container(ContainerSpec::new().with_fields(template)))
    } else {
        None
    };

    let own = container.own.map(leaf).transpose()?;

    match (own, children, container.treat_as_scalar) {
        (None, Some(children), false) => Ok(children),
        (own, children, treat_as_scalar) => {
            let mut spec = ContainerSpec::new();
            spec.own = own;
            spec.treat_as_scalar = treat_as_scalar;
            // Unwrap the template wrapper when it sits under a container
            spec.fields = children.map(|node| match node {
                SpecNode::Container(ContainerSpec {
                    own: None,
                    fields: Some(template),
                    treat_as_scalar: false,
                }) => template,
                other => Box::new(other),
            });
            Ok(SpecNode::Container(spec))
        }
    }
}
