//! # Aggregator State Machine
//!
//! Pure transition logic, independent of any control or subscription.
//!
//! | State                    | Observation               | Emits                        | Next                     |
//! |--------------------------|---------------------------|------------------------------|--------------------------|
//! | any                      | invalid, own errors       | first error, unless repeated | `OwnInvalidOrPropagated` |
//! | not `OwnInvalid…`        | invalid, no own errors    | `Cleared`                    | `OwnInvalidOrPropagated` |
//! | `OwnInvalid…`, surfaced  | invalid, no own errors    | `Cleared`                    | `OwnInvalidOrPropagated` |
//! | `OwnInvalid…`            | valid                     | `Cleared`                    | `OwnValid`               |
//! | `Unobserved`, surfaced   | valid                     | `Cleared`                    | `OwnValid`               |
//! | other                    | valid                     | nothing                      | `OwnValid`               |
//! | any                      | pending                   | nothing                      | unchanged                |

use serde::Serialize;
use serde_json::Value;

use crate::control::{ErrorMap, Status};
use crate::spec::MessageMap;

/// Where an aggregator stands relative to its bound node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregatorState {
    /// Nothing seen since binding
    #[default]
    Unobserved,
    OwnValid,
    /// Own errors, or invalid only through children
    OwnInvalidOrPropagated,
}

/// A surfaced error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationMessage {
    pub code: String,
    pub message: String,
}

/// Event emitted by an aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorEvent {
    Raised(ValidationMessage),
    Cleared,
}

/// What the aggregator sees on one recheck
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub status: Status,
    pub own_errors: Option<&'a ErrorMap>,
    pub messages: Option<&'a MessageMap>,
}

/// Aggregator state plus the message currently surfaced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingRecord {
    state: AggregatorState,
    last_error: Option<ValidationMessage>,
}

impl BindingRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AggregatorState {
        self.state
    }

    pub fn last_error(&self) -> Option<&ValidationMessage> {
        self.last_error.as_ref()
    }

    /// Back to `Unobserved`. The surfaced message is kept so a later valid
    /// observation can still clear it.
    pub fn reset(&mut self) {
        self.state = AggregatorState::Unobserved;
    }

    /// Apply one observation
    pub fn observe(&mut self, observation: &Observation<'_>) -> Option<ErrorEvent> {
        match observation.status {
            Status::Invalid => {
                let first = observation
                    .own_errors
                    .and_then(|errors| first_error(errors, observation.messages));

                match first {
                    Some(message) => {
                        self.state = AggregatorState::OwnInvalidOrPropagated;
                        if self.last_error.as_ref() == Some(&message) {
                            return None;
                        }
                        self.last_error = Some(message.clone());
                        Some(ErrorEvent::Raised(message))
                    }
                    None => {
                        let emit = self.state != AggregatorState::OwnInvalidOrPropagated
                            || self.last_error.is_some();
                        self.state = AggregatorState::OwnInvalidOrPropagated;
                        self.last_error = None;
                        emit.then_some(ErrorEvent::Cleared)
                    }
                }
            }
            Status::Valid => {
                let emit = match self.state {
                    AggregatorState::OwnInvalidOrPropagated => true,
                    AggregatorState::Unobserved => self.last_error.is_some(),
                    AggregatorState::OwnValid => false,
                };
                self.state = AggregatorState::OwnValid;
                self.last_error = None;
                emit.then_some(ErrorEvent::Cleared)
            }
            Status::Pending => None,
        }
    }
}

/// First error of a map (declaration order) with its resolved message
pub fn first_error(errors: &ErrorMap, messages: Option<&MessageMap>) -> Option<ValidationMessage> {
    let (code, payload) = errors.iter().next()?;
    Some(ValidationMessage {
        code: code.clone(),
        message: resolve_message(code, payload, messages),
    })
}

/// Message for an error code: the message map entry, else a usable payload,
/// else the code itself
pub fn resolve_message(code: &str, payload: &Value, messages: Option<&MessageMap>) -> String {
    if let Some(message) = messages.and_then(|m| m.get(code)) {
        return message.clone();
    }

    match payload {
        Value::String(text) if !text.is_empty() => text.clone(),
        Value::Number(n) => n.to_string(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string(payload).unwrap_or_else(|_| code.to_string())
        }
        _ => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::validators::error;
    use crate::spec::messages;
    use serde_json::json;

    fn invalid<'a>(errors: Option<&'a ErrorMap>) -> Observation<'a> {
        Observation {
            status: Status::Invalid,
            own_errors: errors,
            messages: None,
        }
    }

    fn valid() -> Observation<'static> {
        Observation {
            status: Status::Valid,
            own_errors: None,
            messages: None,
        }
    }

    fn raised(code: &str, message: &str) -> Option<ErrorEvent> {
        Some(ErrorEvent::Raised(ValidationMessage {
            code: code.to_string(),
            message: message.to_string(),
        }))
    }

    #[test]
    fn test_own_error_then_valid() {
        let errors = error("required", json!(true));
        let mut record = BindingRecord::new();

        assert_eq!(record.observe(&invalid(Some(&errors))), raised("required", "required"));
        assert_eq!(record.state(), AggregatorState::OwnInvalidOrPropagated);

        assert_eq!(record.observe(&valid()), Some(ErrorEvent::Cleared));
        assert_eq!(record.state(), AggregatorState::OwnValid);
        assert!(record.last_error().is_none());
    }

    #[test]
    fn test_repeated_error_is_not_reemitted() {
        let errors = error("required", json!(true));
        let mut record = BindingRecord::new();

        assert!(record.observe(&invalid(Some(&errors))).is_some());
        assert_eq!(record.observe(&invalid(Some(&errors))), None);

        let other = error("min_length", json!({"required_length": 3, "actual_length": 1}));
        assert!(matches!(
            record.observe(&invalid(Some(&other))),
            Some(ErrorEvent::Raised(ref m)) if m.code == "min_length"
        ));
    }

    #[test]
    fn test_propagated_invalid_clears_once() {
        let mut record = BindingRecord::new();

        assert_eq!(record.observe(&invalid(None)), Some(ErrorEvent::Cleared));
        assert_eq!(record.observe(&invalid(None)), None);
        assert_eq!(record.state(), AggregatorState::OwnInvalidOrPropagated);
    }

    #[test]
    fn test_own_error_then_propagated_clears() {
        let errors = error("mismatch", json!(true));
        let mut record = BindingRecord::new();

        assert!(record.observe(&invalid(Some(&errors))).is_some());
        // Own validator now passes but a child is still invalid
        assert_eq!(record.observe(&invalid(None)), Some(ErrorEvent::Cleared));
        assert_eq!(record.observe(&invalid(None)), None);
    }

    #[test]
    fn test_valid_from_unobserved_is_silent() {
        let mut record = BindingRecord::new();
        assert_eq!(record.observe(&valid()), None);
        assert_eq!(record.state(), AggregatorState::OwnValid);
        assert_eq!(record.observe(&valid()), None);
    }

    #[test]
    fn test_reset_keeps_surfaced_error_clearable() {
        let errors = error("required", json!(true));
        let mut record = BindingRecord::new();
        record.observe(&invalid(Some(&errors)));

        record.reset();
        assert_eq!(record.state(), AggregatorState::Unobserved);
        assert!(record.last_error().is_some());
        assert_eq!(record.observe(&valid()), Some(ErrorEvent::Cleared));
    }

    #[test]
    fn test_pending_is_ignored() {
        let mut record = BindingRecord::new();
        let pending = Observation {
            status: Status::Pending,
            own_errors: None,
            messages: None,
        };
        assert_eq!(record.observe(&pending), None);
        assert_eq!(record.state(), AggregatorState::Unobserved);
    }

    #[test]
    fn test_first_error_in_declaration_order() {
        let mut errors = error("pattern", json!("Digits only"));
        errors.insert("required".to_string(), json!(true));

        let message = first_error(&errors, None).unwrap();
        assert_eq!(message.code, "pattern");
        assert_eq!(message.message, "Digits only");
    }

    #[test]
    fn test_message_fallback_tiers() {
        let map = messages([("required", "Please fill in")]);

        assert_eq!(
            resolve_message("required", &json!(true), Some(&map)),
            "Please fill in"
        );
        assert_eq!(resolve_message("custom", &json!("Too short"), Some(&map)), "Too short");
        assert_eq!(resolve_message("max", &json!(10), None), "10");
        assert_eq!(
            resolve_message("min_length", &json!({"required_length": 3}), None),
            r#"{"required_length":3}"#
        );
        assert_eq!(resolve_message("required", &json!(true), None), "required");
        assert_eq!(resolve_message("blank", &json!(""), None), "blank");
        assert_eq!(resolve_message("gone", &Value::Null, None), "gone");
    }

    #[test]
    fn test_messages_used_on_raise() {
        let errors = error("required", json!(true));
        let map = messages([("required", "Name is required")]);
        let mut record = BindingRecord::new();

        let observation = Observation {
            status: Status::Invalid,
            own_errors: Some(&errors),
            messages: Some(&map),
        };
        assert_eq!(
            record.observe(&observation),
            raised("required", "Name is required")
        );
    }
}
