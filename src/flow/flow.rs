//! # Search Flow
//!
//! Round-trips search form state through a query parameter so searches can
//! be bookmarked and shared without server-side sessions.
//!
//! ```text
//! query params ──handle_query_params──▶ criteria? ──yes──▶ build(criteria), submit(Params)
//!                                          │
//!                                          no──▶ build(), ready (or start_search)
//!
//! start_search ──no_navigation──▶ submit(Form)
//!              └─otherwise─────▶ navigate { param_key: token }
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use crate::builder::Form;
use crate::control::{Signal, Subscription};
use crate::coordinator::FormCoordinator;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::spec::SpecResult;

use super::config::FlowConfig;
use super::errors::{FlowError, FlowResult};
use super::token::TokenCodec;

/// Query parameters of the current location
pub type QueryParams = BTreeMap<String, String>;

/// Builds the search form, from criteria when there are some
pub type FormFactory = Box<dyn Fn(Option<&Value>) -> SpecResult<Form>>;

/// What triggered a submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmitOrigin {
    /// Criteria arrived through the query parameters
    Params,
    /// The form was submitted directly
    Form,
}

impl SubmitOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitOrigin::Params => "params",
            SubmitOrigin::Form => "form",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitEvent {
    pub data: Value,
    pub origin: SubmitOrigin,
}

/// Request to navigate to the current location with new query parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationRequest {
    pub params: QueryParams,
    pub actual_data: Value,
}

/// Query-parameter driven search state machine
pub struct SearchFlow {
    config: FlowConfig,
    codec: TokenCodec,
    factory: FormFactory,
    coordinator: Option<Rc<FormCoordinator>>,
    form: RefCell<Option<Form>>,
    criteria: RefCell<Option<Value>>,
    ready: Signal<bool>,
    submit: Signal<SubmitEvent>,
    navigate: Signal<NavigationRequest>,
}

impl SearchFlow {
    /// Fails when the configured token lifetime is out of range
    pub fn new<F>(config: FlowConfig, factory: F) -> FlowResult<Self>
    where
        F: Fn(Option<&Value>) -> SpecResult<Form> + 'static,
    {
        Ok(Self {
            codec: config.codec()?,
            config,
            factory: Box::new(factory),
            coordinator: None,
            form: RefCell::new(None),
            criteria: RefCell::new(None),
            ready: Signal::new(),
            submit: Signal::new(),
            navigate: Signal::new(),
        })
    }

    /// Notify `coordinator` whenever the form is rebuilt
    pub fn with_coordinator(mut self, coordinator: Rc<FormCoordinator>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn form(&self) -> Option<Form> {
        self.form.borrow().clone()
    }

    /// Criteria the current form was built from
    pub fn criteria(&self) -> Option<Value> {
        self.criteria.borrow().clone()
    }

    pub fn on_ready(&self, listener: impl Fn(&bool) + 'static) -> Subscription {
        self.ready.subscribe(listener)
    }

    pub fn on_submit(&self, listener: impl Fn(&SubmitEvent) + 'static) -> Subscription {
        self.submit.subscribe(listener)
    }

    pub fn on_navigate(&self, listener: impl Fn(&NavigationRequest) + 'static) -> Subscription {
        self.navigate.subscribe(listener)
    }

    /// Decode the criteria carried by `params`.
    ///
    /// A missing, empty or unverifiable token means no criteria.
    pub fn criteria_from_params(&self, params: &QueryParams) -> Option<Value> {
        let token = params
            .get(&self.config.param_key)
            .filter(|token| !token.is_empty())?;

        match self.codec.decode(token) {
            Ok(data) => Some(data),
            Err(err) => {
                let reason = err.to_string();
                log_event_with_fields(
                    Event::TokenRejected,
                    &[("param", &self.config.param_key), ("reason", &reason)],
                );
                None
            }
        }
    }

    /// The location's query parameters changed
    pub fn handle_query_params(&self, params: &QueryParams) -> FlowResult<()> {
        let criteria = self.criteria_from_params(params);
        *self.criteria.borrow_mut() = criteria.clone();

        let start_search = match criteria {
            Some(data) => {
                self.install((self.factory)(Some(&data))?);
                self.emit_submit(SubmitEvent {
                    data,
                    origin: SubmitOrigin::Params,
                });
                false
            }
            None => {
                self.install((self.factory)(None)?);
                !self.config.ignore_init
            }
        };

        if start_search {
            self.start_search(None)
        } else {
            log_event(Event::FlowReady);
            self.ready.emit(&true);
            Ok(())
        }
    }

    /// Submit `data`, or the current form value when absent or null
    pub fn start_search(&self, data: Option<Value>) -> FlowResult<()> {
        let raw = match data.filter(|d| !d.is_null()) {
            Some(data) => data,
            None => self.form().ok_or(FlowError::NoForm)?.value(),
        };

        if self.config.no_navigation {
            self.emit_submit(SubmitEvent {
                data: raw,
                origin: SubmitOrigin::Form,
            });
            return Ok(());
        }

        let token = self.codec.encode(&raw)?;
        let mut params = QueryParams::new();
        params.insert(self.config.param_key.clone(), token);

        log_event_with_fields(
            Event::NavigationRequested,
            &[("param", &self.config.param_key)],
        );
        self.navigate.emit(&NavigationRequest {
            params,
            actual_data: raw,
        });
        Ok(())
    }

    /// Dirty and valid
    pub fn can_submit(&self) -> bool {
        self.form()
            .map(|form| form.dirty() && form.is_valid())
            .unwrap_or(false)
    }

    pub fn dirty(&self) -> bool {
        self.form().map(|form| form.dirty()).unwrap_or(false)
    }

    /// Rebuild the form from `new_data`, or from the current criteria
    pub fn reset(&self, new_data: Option<Value>) -> FlowResult<()> {
        if let Some(data) = new_data.filter(|d| !d.is_null()) {
            *self.criteria.borrow_mut() = Some(data);
        }
        let criteria = self.criteria();
        self.install((self.factory)(criteria.as_ref())?);
        Ok(())
    }

    fn install(&self, form: Form) {
        *self.form.borrow_mut() = Some(form.clone());
        if let Some(coordinator) = &self.coordinator {
            coordinator.notify(&form);
        }
    }

    fn emit_submit(&self, event: SubmitEvent) {
        log_event_with_fields(Event::SearchSubmitted, &[("origin", event.origin.as_str())]);
        self.submit.emit(&event);
    }
}
