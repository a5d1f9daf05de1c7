//! # Spec Errors
//!
//! Configuration errors raised while resolving spec trees. They are fatal at
//! build time: no partial form is ever returned.

use std::fmt;

use thiserror::Error;

use crate::control::ControlPath;

/// Result type for spec resolution and form building
pub type SpecResult<T> = Result<T, ConfigurationError>;

/// Which of the three spec trees an error comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecTree {
    Validators,
    AsyncValidators,
    Messages,
}

impl fmt::Display for SpecTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecTree::Validators => write!(f, "validator"),
            SpecTree::AsyncValidators => write!(f, "async validator"),
            SpecTree::Messages => write!(f, "message"),
        }
    }
}

/// Data shape a container spec is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerShape {
    Mapping,
    Sequence,
}

impl fmt::Display for ContainerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerShape::Mapping => write!(f, "mapping"),
            ContainerShape::Sequence => write!(f, "sequence"),
        }
    }
}

/// Malformed spec shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("{tree} spec at '{path}': rules cannot attach to a {shape} directly, use a container spec with `own`")]
    RulesOnContainer {
        tree: SpecTree,
        path: ControlPath,
        shape: ContainerShape,
    },

    #[error("{tree} spec at '{path}': a {found} spec cannot describe a primitive value")]
    StructuredSpecOnPrimitive {
        tree: SpecTree,
        path: ControlPath,
        found: &'static str,
    },

    #[error("{tree} spec at '{path}': per-element specs only apply to sequences")]
    ElementsOnMapping { tree: SpecTree, path: ControlPath },

    #[error("{tree} spec at '{path}': `treat_as_scalar` only applies to sequences")]
    ScalarOnMapping { tree: SpecTree, path: ControlPath },

    #[error("{tree} spec at '{path}': container `fields` for a mapping must be a field mapping, found a {found} spec")]
    FieldsNotMapping {
        tree: SpecTree,
        path: ControlPath,
        found: &'static str,
    },

    #[error("Malformed {tree} spec document: {reason}")]
    MalformedDocument { tree: SpecTree, reason: String },
}

impl ConfigurationError {
    pub fn malformed(tree: SpecTree, reason: impl Into<String>) -> Self {
        ConfigurationError::MalformedDocument {
            tree,
            reason: reason.into(),
        }
    }

    /// Path of the offending node, when the error comes from a build
    pub fn path(&self) -> Option<&ControlPath> {
        match self {
            ConfigurationError::RulesOnContainer { path, .. }
            | ConfigurationError::StructuredSpecOnPrimitive { path, .. }
            | ConfigurationError::ElementsOnMapping { path, .. }
            | ConfigurationError::ScalarOnMapping { path, .. }
            | ConfigurationError::FieldsNotMapping { path, .. } => Some(path),
            ConfigurationError::MalformedDocument { .. } => None,
        }
    }

    pub fn tree(&self) -> SpecTree {
        match self {
            ConfigurationError::RulesOnContainer { tree, .. }
            | ConfigurationError::StructuredSpecOnPrimitive { tree, .. }
            | ConfigurationError::ElementsOnMapping { tree, .. }
            | ConfigurationError::ScalarOnMapping { tree, .. }
            | ConfigurationError::FieldsNotMapping { tree, .. }
            | ConfigurationError::MalformedDocument { tree, .. } => *tree,
        }
    }
}
