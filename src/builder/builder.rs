//! Form tree compilation

use serde_json::{Map, Value};

use crate::control::{Control, ControlPath, PathSegment};
use crate::observability::{log_event_with_fields, Event};
use crate::spec::{
    AsyncValidatorSpec, ContainerShape, MessageMap, MessageSpec, Resolver, SpecResult, SpecTree,
    ValidatorSpec,
};

use super::data::DataNode;
use super::form::{Form, MessageTable};

/// Build a form from data and optional spec trees.
///
/// Equivalent to [`FormBuilder`] with the given trees set.
pub fn build(
    data: &Value,
    validators: Option<&ValidatorSpec>,
    async_validators: Option<&AsyncValidatorSpec>,
    messages: Option<&MessageSpec>,
) -> SpecResult<Form> {
    FormBuilder {
        data,
        specs: Specs {
            validators,
            async_validators,
            messages,
        },
    }
    .build()
}

/// Specs applicable at one path
#[derive(Clone, Copy)]
struct Specs<'a> {
    validators: Option<&'a ValidatorSpec>,
    async_validators: Option<&'a AsyncValidatorSpec>,
    messages: Option<&'a MessageSpec>,
}

/// Fluent form builder
///
/// ```ignore
/// let form = FormBuilder::new(&data)
///     .validators(&rules)
///     .messages(&messages)
///     .build()?;
/// ```
pub struct FormBuilder<'a> {
    data: &'a Value,
    specs: Specs<'a>,
}

impl<'a> FormBuilder<'a> {
    pub fn new(data: &'a Value) -> Self {
        Self {
            data,
            specs: Specs {
                validators: None,
                async_validators: None,
                messages: None,
            },
        }
    }

    pub fn validators(mut self, spec: &'a ValidatorSpec) -> Self {
        self.specs.validators = Some(spec);
        self
    }

    pub fn async_validators(mut self, spec: &'a AsyncValidatorSpec) -> Self {
        self.specs.async_validators = Some(spec);
        self
    }

    pub fn messages(mut self, spec: &'a MessageSpec) -> Self {
        self.specs.messages = Some(spec);
        self
    }

    /// Compile the control tree. Any configuration error aborts the build.
    pub fn build(self) -> SpecResult<Form> {
        let mut compiler = Compiler::default();

        match compiler.node(self.data, self.specs, &ControlPath::root()) {
            Ok(root) => {
                let controls = compiler.controls.to_string();
                let messages = compiler.messages.len().to_string();
                log_event_with_fields(
                    Event::FormBuilt,
                    &[("controls", &controls), ("message_paths", &messages)],
                );
                Ok(Form::new(root, compiler.messages))
            }
            Err(err) => {
                let path = err
                    .path()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let tree = err.tree().to_string();
                let reason = err.to_string();
                log_event_with_fields(
                    Event::ConfigurationRejected,
                    &[("path", &path), ("tree", &tree), ("reason", &reason)],
                );
                Err(err)
            }
        }
    }
}

#[derive(Default)]
struct Compiler {
    messages: MessageTable,
    controls: usize,
}

impl Compiler {
    fn node(&mut self, data: &Value, specs: Specs<'_>, path: &ControlPath) -> SpecResult<Control> {
        match DataNode::classify(data) {
            DataNode::Primitive(value) => self.primitive(value, specs, path),
            DataNode::Mapping(fields) => self.mapping(fields, specs, path),
            DataNode::Sequence(items) => self.sequence(data, items, specs, path),
        }
    }

    fn primitive(
        &mut self,
        value: &Value,
        specs: Specs<'_>,
        path: &ControlPath,
    ) -> SpecResult<Control> {
        let validators = Resolver::leaf(specs.validators, SpecTree::Validators, path)?;
        let async_validators =
            Resolver::leaf(specs.async_validators, SpecTree::AsyncValidators, path)?;
        let messages = Resolver::leaf(specs.messages, SpecTree::Messages, path)?;

        self.attach_messages(path, messages);
        self.controls += 1;
        Ok(Control::field_with(
            value.clone(),
            owned(validators),
            owned(async_validators),
        ))
    }

    fn mapping(
        &mut self,
        fields: &Map<String, Value>,
        specs: Specs<'_>,
        path: &ControlPath,
    ) -> SpecResult<Control> {
        let shape = ContainerShape::Mapping;
        let validators = Resolver::split(specs.validators, shape, SpecTree::Validators, path)?;
        let async_validators =
            Resolver::split(specs.async_validators, shape, SpecTree::AsyncValidators, path)?;
        let messages = Resolver::split(specs.messages, shape, SpecTree::Messages, path)?;

        let mut children = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            let segment = PathSegment::Key(key.clone());
            let child_specs = Specs {
                validators: Resolver::narrow(validators.children, &segment),
                async_validators: Resolver::narrow(async_validators.children, &segment),
                messages: Resolver::narrow(messages.children, &segment),
            };
            let child = self.node(value, child_specs, &path.child(segment))?;
            children.push((key.clone(), child));
        }

        self.attach_messages(path, messages.own);
        self.controls += 1;
        Ok(Control::group_with(
            children,
            owned(validators.own),
            owned(async_validators.own),
        ))
    }

    fn sequence(
        &mut self,
        data: &Value,
        items: &[Value],
        specs: Specs<'_>,
        path: &ControlPath,
    ) -> SpecResult<Control> {
        let shape = ContainerShape::Sequence;
        let validators = Resolver::split(specs.validators, shape, SpecTree::Validators, path)?;
        let async_validators =
            Resolver::split(specs.async_validators, shape, SpecTree::AsyncValidators, path)?;
        let messages = Resolver::split(specs.messages, shape, SpecTree::Messages, path)?;

        self.attach_messages(path, messages.own);
        self.controls += 1;

        // One flag in any tree turns the whole array into a single value
        if validators.treat_as_scalar
            || async_validators.treat_as_scalar
            || messages.treat_as_scalar
        {
            return Ok(Control::field_with(
                data.clone(),
                owned(validators.own),
                owned(async_validators.own),
            ));
        }

        let mut children = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let segment = PathSegment::Index(index);
            let child_specs = Specs {
                validators: Resolver::narrow(validators.children, &segment),
                async_validators: Resolver::narrow(async_validators.children, &segment),
                messages: Resolver::narrow(messages.children, &segment),
            };
            children.push(self.node(item, child_specs, &path.child(segment))?);
        }

        Ok(Control::array_with(
            children,
            owned(validators.own),
            owned(async_validators.own),
        ))
    }

    fn attach_messages(&mut self, path: &ControlPath, messages: Option<&MessageMap>) {
        if let Some(messages) = messages.filter(|m| !m.is_empty()) {
            self.messages.insert(path.clone(), messages.clone());
        }
    }
}

fn owned<T: Clone>(entry: Option<&Vec<T>>) -> Vec<T> {
    entry.cloned().unwrap_or_default()
}
