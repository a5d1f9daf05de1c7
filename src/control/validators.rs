//! Validator functions
//!
//! A validator inspects a control and returns `None` when it passes, or an
//! error map `code → payload` when it fails. Async validators return the same
//! shape through a future.
//!
//! The built-in validators treat `null`, empty strings, empty arrays and
//! objects whose fields are all empty as "no value": only `required` rejects
//! them, every other rule passes so that optional fields can still carry
//! constraints.

use std::rc::Rc;

use email_address::{EmailAddress, Options};
use futures_util::future::LocalBoxFuture;
use regex::Regex;
use serde_json::{json, Map, Value};

use super::node::Control;

/// Error map produced by validators, in insertion order
pub type ErrorMap = Map<String, Value>;

/// Synchronous validator
pub type ValidatorFn = Rc<dyn Fn(&Control) -> Option<ErrorMap>>;

/// Asynchronous validator, evaluated by [`Control::validate_async`]
pub type AsyncValidatorFn = Rc<dyn Fn(&Control) -> LocalBoxFuture<'static, Option<ErrorMap>>>;

/// Wrap a closure as a validator
pub fn validator<F>(f: F) -> ValidatorFn
where
    F: Fn(&Control) -> Option<ErrorMap> + 'static,
{
    Rc::new(f)
}

/// Wrap a future-returning closure as an async validator
pub fn async_validator<F>(f: F) -> AsyncValidatorFn
where
    F: Fn(&Control) -> LocalBoxFuture<'static, Option<ErrorMap>> + 'static,
{
    Rc::new(f)
}

/// Single-entry error map
pub fn error(code: &str, payload: Value) -> ErrorMap {
    let mut map = Map::new();
    map.insert(code.to_string(), payload);
    map
}

/// Merge error maps in order. The first map declaring a code wins.
pub fn merge_errors<I>(maps: I) -> Option<ErrorMap>
where
    I: IntoIterator<Item = ErrorMap>,
{
    let mut merged = Map::new();
    for map in maps {
        for (code, payload) in map {
            if !merged.contains_key(&code) {
                merged.insert(code, payload);
            }
        }
    }

    if merged.is_empty() {
        None
    } else {
        Some(merged)
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        // A group with nothing filled in
        Value::Object(fields) => fields.values().all(is_empty_value),
        _ => false,
    }
}

fn value_length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Rejects null, empty strings and empty arrays
pub fn required() -> ValidatorFn {
    validator(|control| {
        if is_empty_value(&control.value()) {
            Some(error("required", Value::Bool(true)))
        } else {
            None
        }
    })
}

/// Requires the value to be `true` (checkbox style)
pub fn required_true() -> ValidatorFn {
    validator(|control| {
        if control.value() == Value::Bool(true) {
            None
        } else {
            Some(error("required", Value::Bool(true)))
        }
    })
}

/// Minimum length of a string (in characters) or array
pub fn min_length(min: usize) -> ValidatorFn {
    validator(move |control| {
        let value = control.value();
        if is_empty_value(&value) {
            return None;
        }
        match value_length(&value) {
            Some(actual) if actual < min => Some(error(
                "min_length",
                json!({ "required_length": min, "actual_length": actual }),
            )),
            _ => None,
        }
    })
}

/// Maximum length of a string (in characters) or array
pub fn max_length(max: usize) -> ValidatorFn {
    validator(move |control| {
        let value = control.value();
        match value_length(&value) {
            Some(actual) if actual > max => Some(error(
                "max_length",
                json!({ "required_length": max, "actual_length": actual }),
            )),
            _ => None,
        }
    })
}

/// Minimum numeric value
pub fn min(min: f64) -> ValidatorFn {
    validator(move |control| {
        let actual = control.value().as_f64()?;
        if actual < min {
            Some(error("min", json!({ "min": min, "actual": actual })))
        } else {
            None
        }
    })
}

/// Maximum numeric value
pub fn max(max: f64) -> ValidatorFn {
    validator(move |control| {
        let actual = control.value().as_f64()?;
        if actual > max {
            Some(error("max", json!({ "max": max, "actual": actual })))
        } else {
            None
        }
    })
}

/// String value must match a compiled pattern
pub fn pattern(regex: Regex) -> ValidatorFn {
    validator(move |control| {
        let value = control.value();
        let text = value.as_str()?;
        if text.is_empty() || regex.is_match(text) {
            None
        } else {
            Some(error(
                "pattern",
                json!({ "required_pattern": regex.as_str(), "actual_value": text }),
            ))
        }
    })
}

/// E-mail address check: RFC 5322 address syntax, no display text, and a
/// dotted host name made of letters, digits and hyphens
pub fn email() -> ValidatorFn {
    let options = Options::default()
        .with_minimum_sub_domains(2)
        .without_display_text()
        .without_domain_literal();

    validator(move |control| {
        let value = control.value();
        let text = value.as_str()?;
        if text.is_empty() {
            return None;
        }

        let valid = match EmailAddress::parse_with_options(text, options) {
            Ok(address) => address.domain().split('.').all(is_host_label),
            Err(_) => false,
        };
        if valid {
            None
        } else {
            Some(error("email", Value::Bool(true)))
        }
    })
}

fn is_host_label(label: &str) -> bool {
    !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(v: &ValidatorFn, value: Value) -> Option<ErrorMap> {
        v(&Control::field(value))
    }

    #[test]
    fn test_required() {
        let v = required();
        assert!(check(&v, Value::Null).is_some());
        assert!(check(&v, json!("")).is_some());
        assert!(check(&v, json!([])).is_some());
        assert!(check(&v, json!(0)).is_none());
        assert!(check(&v, json!(false)).is_none());
        assert!(check(&v, json!("x")).is_none());
        assert!(check(&v, json!({"a": null, "b": ""})).is_some());
        assert!(check(&v, json!({"a": null, "b": 1})).is_none());
    }

    #[test]
    fn test_required_true() {
        let v = required_true();
        assert!(check(&v, json!(false)).is_some());
        assert!(check(&v, json!(true)).is_none());
    }

    #[test]
    fn test_min_length_skips_empty() {
        let v = min_length(3);
        assert!(check(&v, Value::Null).is_none());
        assert!(check(&v, json!("")).is_none());
        let errors = check(&v, json!("ab")).unwrap();
        assert_eq!(errors["min_length"]["actual_length"], json!(2));
        assert!(check(&v, json!("abc")).is_none());
    }

    #[test]
    fn test_max_length_counts_chars() {
        let v = max_length(2);
        assert!(check(&v, json!("éé")).is_none());
        assert!(check(&v, json!([1, 2, 3])).is_some());
    }

    #[test]
    fn test_min_max() {
        assert!(check(&min(1.0), json!(0)).is_some());
        assert!(check(&min(1.0), json!(1)).is_none());
        assert!(check(&max(5.0), json!(6.5)).is_some());
        assert!(check(&max(5.0), json!("not a number")).is_none());
    }

    #[test]
    fn test_pattern() {
        let v = pattern(Regex::new("^[0-9]{5}$").unwrap());
        assert!(check(&v, json!("12345")).is_none());
        assert!(check(&v, json!("12a45")).is_some());
        assert!(check(&v, json!("")).is_none());
    }

    #[test]
    fn test_email() {
        let v = email();
        assert!(check(&v, json!("a@example.com")).is_none());
        assert!(check(&v, json!("a@example")).is_some());
        assert!(check(&v, json!("a b@example.com")).is_some());
        assert!(check(&v, json!("@example.com")).is_some());
        assert!(check(&v, json!("a..b@example.com")).is_some());
        assert!(check(&v, json!("a<b>@example.com")).is_some());
        assert!(check(&v, json!(".a@example.com")).is_some());
        assert!(check(&v, json!("a@exa_mple.com")).is_some());
        assert!(check(&v, json!("Ada <a@example.com>")).is_some());
        assert!(check(&v, json!("first.last+tag@mail.example.co")).is_none());
        assert!(check(&v, json!("")).is_none());
    }

    #[test]
    fn test_merge_keeps_first_declared() {
        let merged = merge_errors(vec![
            error("required", json!("first")),
            error("required", json!("second")),
            error("pattern", json!(true)),
        ])
        .unwrap();
        let codes: Vec<_> = merged.keys().cloned().collect();
        assert_eq!(codes, vec!["required", "pattern"]);
        assert_eq!(merged["required"], json!("first"));
        assert!(merge_errors(Vec::new()).is_none());
    }
}
