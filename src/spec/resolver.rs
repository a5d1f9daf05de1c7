//! Spec resolution
//!
//! Given the spec at a path and the data shape found there, decide which
//! part configures the node itself and which part is handed to the children.
//! All shape conflicts are reported here so the builder stays mechanical.

use crate::control::{ControlPath, PathSegment};

use super::errors::{ConfigurationError, ContainerShape, SpecResult, SpecTree};
use super::types::SpecNode;

/// Spec for a container, split into its parts
#[derive(Debug)]
pub struct Split<'a, L> {
    /// Entry applied to the container itself
    pub own: Option<&'a L>,
    /// Spec narrowed per child via [`Resolver::narrow`]
    pub children: Option<&'a SpecNode<L>>,
    /// Build the sequence as a single field
    pub treat_as_scalar: bool,
}

impl<'a, L> Split<'a, L> {
    fn empty() -> Self {
        Self {
            own: None,
            children: None,
            treat_as_scalar: false,
        }
    }

    fn children(children: &'a SpecNode<L>) -> Self {
        Self {
            own: None,
            children: Some(children),
            treat_as_scalar: false,
        }
    }
}

/// Stateless spec resolver
pub struct Resolver;

impl Resolver {
    /// Split a container spec into own entry and child spec
    pub fn split<'a, L>(
        spec: Option<&'a SpecNode<L>>,
        shape: ContainerShape,
        tree: SpecTree,
        path: &ControlPath,
    ) -> SpecResult<Split<'a, L>> {
        let spec = match spec {
            Some(spec) => spec,
            None => return Ok(Split::empty()),
        };

        match spec {
            SpecNode::Leaf(_) => Err(ConfigurationError::RulesOnContainer {
                tree,
                path: path.clone(),
                shape,
            }),
            SpecNode::Fields(_) => Ok(Split::children(spec)),
            SpecNode::Elements(_) => match shape {
                ContainerShape::Sequence => Ok(Split::children(spec)),
                ContainerShape::Mapping => Err(ConfigurationError::ElementsOnMapping {
                    tree,
                    path: path.clone(),
                }),
            },
            SpecNode::Container(container) => {
                if shape == ContainerShape::Mapping {
                    if container.treat_as_scalar {
                        return Err(ConfigurationError::ScalarOnMapping {
                            tree,
                            path: path.clone(),
                        });
                    }
                    if let Some(fields) = container.fields.as_deref() {
                        if !matches!(fields, SpecNode::Fields(_)) {
                            return Err(ConfigurationError::FieldsNotMapping {
                                tree,
                                path: path.clone(),
                                found: fields.variant_name(),
                            });
                        }
                    }
                }
                Ok(Split {
                    own: container.own.as_ref(),
                    children: container.fields.as_deref(),
                    treat_as_scalar: container.treat_as_scalar,
                })
            }
        }
    }

    /// Spec for one child of a container.
    ///
    /// Keys look up `Fields`. Indices look up `Elements`; any other child
    /// spec under an index is a template shared by every element.
    pub fn narrow<'a, L>(
        children: Option<&'a SpecNode<L>>,
        segment: &PathSegment,
    ) -> Option<&'a SpecNode<L>> {
        match (children?, segment) {
            (SpecNode::Fields(fields), PathSegment::Key(key)) => fields.get(key),
            (SpecNode::Elements(elements), PathSegment::Index(index)) => elements.get(*index),
            (template, PathSegment::Index(_)) => Some(template),
            (_, PathSegment::Key(_)) => None,
        }
    }

    /// Entry for a primitive node.
    ///
    /// A scalar container spec is accepted so a sequence that starts out as
    /// `null` can carry its array-level rules. An empty container is ignored.
    pub fn leaf<'a, L>(
        spec: Option<&'a SpecNode<L>>,
        tree: SpecTree,
        path: &ControlPath,
    ) -> SpecResult<Option<&'a L>> {
        match spec {
            None => Ok(None),
            Some(SpecNode::Leaf(entry)) => Ok(Some(entry)),
            Some(SpecNode::Container(container))
                if container.fields.is_none()
                    && (container.treat_as_scalar || container.own.is_none()) =>
            {
                Ok(container.own.as_ref())
            }
            Some(other) => Err(ConfigurationError::StructuredSpecOnPrimitive {
                tree,
                path: path.clone(),
                found: other.variant_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::types::ContainerSpec;

    type Spec = SpecNode<&'static str>;

    fn root() -> ControlPath {
        ControlPath::root()
    }

    #[test]
    fn test_split_fields_go_to_children() {
        let spec: Spec = SpecNode::fields([("name", SpecNode::leaf("name-rules"))]);
        let split = Resolver::split(
            Some(&spec),
            ContainerShape::Mapping,
            SpecTree::Validators,
            &root(),
        )
        .unwrap();
        assert!(split.own.is_none());
        assert!(!split.treat_as_scalar);

        let child = Resolver::narrow(split.children, &PathSegment::from("name"));
        assert_eq!(child, Some(&SpecNode::leaf("name-rules")));
        assert!(Resolver::narrow(split.children, &PathSegment::from("other")).is_none());
    }

    #[test]
    fn test_split_container_own_and_fields() {
        let spec: Spec = ContainerSpec::new()
            .with_own("group-rules")
            .with_fields(SpecNode::fields([("a", SpecNode::leaf("a-rules"))]))
            .into();
        let split = Resolver::split(
            Some(&spec),
            ContainerShape::Mapping,
            SpecTree::Validators,
            &root(),
        )
        .unwrap();
        assert_eq!(split.own, Some(&"group-rules"));
        assert_eq!(
            Resolver::narrow(split.children, &PathSegment::from("a")),
            Some(&SpecNode::leaf("a-rules"))
        );
    }

    #[test]
    fn test_leaf_on_container_is_rejected() {
        let spec: Spec = SpecNode::leaf("rules");
        let err = Resolver::split(
            Some(&spec),
            ContainerShape::Sequence,
            SpecTree::Messages,
            &ControlPath::parse("phones"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::RulesOnContainer {
                shape: ContainerShape::Sequence,
                ..
            }
        ));
        assert_eq!(err.path(), Some(&ControlPath::parse("phones")));
    }

    #[test]
    fn test_elements_match_by_index() {
        let spec: Spec =
            SpecNode::elements(vec![SpecNode::leaf("first"), SpecNode::leaf("second")]);
        let split = Resolver::split(
            Some(&spec),
            ContainerShape::Sequence,
            SpecTree::Validators,
            &root(),
        )
        .unwrap();
        assert_eq!(
            Resolver::narrow(split.children, &PathSegment::Index(1)),
            Some(&SpecNode::leaf("second"))
        );
        assert!(Resolver::narrow(split.children, &PathSegment::Index(2)).is_none());
    }

    #[test]
    fn test_template_applies_to_every_element() {
        let template: Spec = SpecNode::fields([("number", SpecNode::leaf("number-rules"))]);
        let spec: Spec = ContainerSpec::new().with_fields(template.clone()).into();
        let split = Resolver::split(
            Some(&spec),
            ContainerShape::Sequence,
            SpecTree::Validators,
            &root(),
        )
        .unwrap();
        assert_eq!(
            Resolver::narrow(split.children, &PathSegment::Index(0)),
            Some(&template)
        );
        assert_eq!(
            Resolver::narrow(split.children, &PathSegment::Index(7)),
            Some(&template)
        );
    }

    #[test]
    fn test_mapping_rejects_sequence_only_specs() {
        let elements: Spec = SpecNode::elements(vec![]);
        assert!(matches!(
            Resolver::split(
                Some(&elements),
                ContainerShape::Mapping,
                SpecTree::Validators,
                &root()
            ),
            Err(ConfigurationError::ElementsOnMapping { .. })
        ));

        let scalar: Spec = SpecNode::Container(ContainerSpec::new().scalar());
        assert!(matches!(
            Resolver::split(
                Some(&scalar),
                ContainerShape::Mapping,
                SpecTree::Validators,
                &root()
            ),
            Err(ConfigurationError::ScalarOnMapping { .. })
        ));

        let bad_fields: Spec = ContainerSpec::new().with_fields(SpecNode::leaf("x")).into();
        assert!(matches!(
            Resolver::split(
                Some(&bad_fields),
                ContainerShape::Mapping,
                SpecTree::Validators,
                &root()
            ),
            Err(ConfigurationError::FieldsNotMapping { found: "leaf", .. })
        ));
    }

    #[test]
    fn test_scalar_flag_on_sequence() {
        let spec: Spec = ContainerSpec::new().with_own("array-rules").scalar().into();
        let split = Resolver::split(
            Some(&spec),
            ContainerShape::Sequence,
            SpecTree::AsyncValidators,
            &root(),
        )
        .unwrap();
        assert!(split.treat_as_scalar);
        assert_eq!(split.own, Some(&"array-rules"));
    }

    #[test]
    fn test_leaf_rules() {
        let path = ControlPath::parse("name");
        let leaf: Spec = SpecNode::leaf("r");
        assert_eq!(
            Resolver::leaf(Some(&leaf), SpecTree::Validators, &path).unwrap(),
            Some(&"r")
        );
        assert_eq!(
            Resolver::leaf::<&str>(None, SpecTree::Validators, &path).unwrap(),
            None
        );

        let fields: Spec = SpecNode::fields([("a", SpecNode::leaf("r"))]);
        assert!(matches!(
            Resolver::leaf(Some(&fields), SpecTree::Messages, &path),
            Err(ConfigurationError::StructuredSpecOnPrimitive { found: "fields", .. })
        ));

        let own_only: Spec = ContainerSpec::new().with_own("r").into();
        assert!(Resolver::leaf(Some(&own_only), SpecTree::Validators, &path).is_err());
    }

    #[test]
    fn test_scalar_spec_on_null_sequence() {
        let path = ControlPath::parse("tags");
        let spec: Spec = ContainerSpec::new().with_own("array-rules").scalar().into();
        assert_eq!(
            Resolver::leaf(Some(&spec), SpecTree::Validators, &path).unwrap(),
            Some(&"array-rules")
        );

        let empty: Spec = ContainerSpec::new().into();
        assert_eq!(
            Resolver::leaf(Some(&empty), SpecTree::Validators, &path).unwrap(),
            None
        );
    }
}
