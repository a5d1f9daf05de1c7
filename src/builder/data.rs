//! Input data classification

use serde_json::{Map, Value};

/// Shape of a raw input value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataNode<'a> {
    /// null, string, number or boolean
    Primitive(&'a Value),
    Sequence(&'a [Value]),
    Mapping(&'a Map<String, Value>),
}

impl<'a> DataNode<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => DataNode::Sequence(items),
            Value::Object(fields) => DataNode::Mapping(fields),
            other => DataNode::Primitive(other),
        }
    }

    pub fn is_container(&self) -> bool {
        !matches!(self, DataNode::Primitive(_))
    }
}
