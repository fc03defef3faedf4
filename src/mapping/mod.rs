//! Request field mapping between the Mini App contract and the panel API.
//!
//! Each table is a list of rules applied in order to a JSON object, so the
//! reshaping can be read and tested without any HTTP plumbing.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAction {
    /// Move a non-null value to another key; the source key is always removed.
    RenameNonNull(&'static str),
    /// Move a truthy value to another key; the source key is always removed.
    RenameTruthy(&'static str),
    /// Move a truthy value to another key, writing `null` otherwise.
    RenameOrNull(&'static str),
    /// Coerce a numeric value to an integer.
    Integer,
    DropIfNull,
    DropIfNullOrEmpty,
    /// Insert `null` when the key is missing.
    DefaultNull,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub key: &'static str,
    pub action: FieldAction,
}

const fn rule(key: &'static str, action: FieldAction) -> FieldRule {
    FieldRule { key, action }
}

/// `POST /users` body → panel create payload.
pub const CREATE_USER_RULES: &[FieldRule] = &[
    rule("data_limit", FieldAction::Integer),
    rule("data_limit", FieldAction::RenameNonNull("trafficLimitBytes")),
    rule("expire", FieldAction::RenameTruthy("expireAt")),
    rule("expireAt", FieldAction::DefaultNull),
    rule("description", FieldAction::DropIfNull),
    rule("telegramId", FieldAction::DropIfNull),
    rule("email", FieldAction::DropIfNull),
    rule("tag", FieldAction::DropIfNull),
    rule("activeInternalSquads", FieldAction::DropIfNullOrEmpty),
];

/// `PATCH /users/:id` body → panel update payload (uuid is added by the client).
pub const UPDATE_USER_RULES: &[FieldRule] = &[
    rule("username", FieldAction::Remove),
    rule("data_limit", FieldAction::Integer),
    rule("data_limit", FieldAction::RenameNonNull("trafficLimitBytes")),
    rule("expire", FieldAction::RenameOrNull("expireAt")),
    rule("description", FieldAction::DropIfNull),
    rule("telegramId", FieldAction::DropIfNull),
    rule("email", FieldAction::DropIfNull),
    rule("tag", FieldAction::DropIfNull),
    rule("activeInternalSquads", FieldAction::DropIfNullOrEmpty),
];

pub fn apply_rules(mut object: Map<String, Value>, rules: &[FieldRule]) -> Map<String, Value> {
    for rule in rules {
        apply_rule(&mut object, rule);
    }
    object
}

fn apply_rule(object: &mut Map<String, Value>, rule: &FieldRule) {
    match rule.action {
        FieldAction::RenameNonNull(to) => {
            if let Some(value) = object.remove(rule.key) {
                if !value.is_null() {
                    object.insert(to.to_string(), value);
                }
            }
        }
        FieldAction::RenameTruthy(to) => {
            if let Some(value) = object.remove(rule.key) {
                if is_truthy(&value) {
                    object.insert(to.to_string(), value);
                }
            }
        }
        FieldAction::RenameOrNull(to) => {
            if let Some(value) = object.remove(rule.key) {
                let value = if is_truthy(&value) { value } else { Value::Null };
                object.insert(to.to_string(), value);
            }
        }
        FieldAction::Integer => {
            if let Some(value) = object.get_mut(rule.key) {
                if let Some(float) = value.as_f64().filter(|_| value.is_f64()) {
                    *value = Value::from(float.trunc() as i64);
                }
            }
        }
        FieldAction::DropIfNull => {
            if object.get(rule.key).is_some_and(Value::is_null) {
                object.remove(rule.key);
            }
        }
        FieldAction::DropIfNullOrEmpty => {
            let drop = match object.get(rule.key) {
                Some(Value::Null) => true,
                Some(Value::Array(items)) => items.is_empty(),
                _ => false,
            };
            if drop {
                object.remove(rule.key);
            }
        }
        FieldAction::DefaultNull => {
            object.entry(rule.key.to_string()).or_insert(Value::Null);
        }
        FieldAction::Remove => {
            object.remove(rule.key);
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
