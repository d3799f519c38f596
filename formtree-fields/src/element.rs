//! Value elements: the editable part of a field.
//!
//! A field owns at most one value element. Its kind follows the field
//! definition with a fixed precedence: translatable, then array, then
//! sub-schema, then a plain value.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};

use crate::error::{FieldError, Result};
use crate::field_schema::FieldSchemaNode;

/// Uniform read/write access to an element's value.
pub trait ValueElement {
    fn value(&self) -> Value;
    fn set_value(&self, value: Value) -> Result<()>;
}

#[derive(Debug)]
pub enum ValueElementKind {
    Translatable(TranslatableElement),
    Array(ArrayElement),
    Schema(Arc<FieldSchemaNode>),
    Plain(PlainValue),
}

impl ValueElementKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ValueElementKind::Translatable(_) => "translatable",
            ValueElementKind::Array(_) => "array",
            ValueElementKind::Schema(_) => "schema",
            ValueElementKind::Plain(_) => "plain",
        }
    }

    pub fn as_schema(&self) -> Option<&Arc<FieldSchemaNode>> {
        match self {
            ValueElementKind::Schema(node) => Some(node),
            _ => None,
        }
    }
}

impl ValueElement for ValueElementKind {
    fn value(&self) -> Value {
        match self {
            ValueElementKind::Translatable(element) => element.value(),
            ValueElementKind::Array(element) => element.value(),
            ValueElementKind::Schema(node) => node.value(),
            ValueElementKind::Plain(element) => element.value(),
        }
    }

    fn set_value(&self, value: Value) -> Result<()> {
        match self {
            ValueElementKind::Translatable(element) => element.set_value(value),
            ValueElementKind::Array(element) => element.set_value(value),
            ValueElementKind::Schema(node) => node.set_value(value),
            ValueElementKind::Plain(element) => element.set_value(value),
        }
    }
}

/// A single editable value.
#[derive(Debug, Default)]
pub struct PlainValue {
    value: Mutex<Value>,
}

impl PlainValue {
    pub fn new(value: Value) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }
}

impl ValueElement for PlainValue {
    fn value(&self) -> Value {
        lock(&self.value).clone()
    }

    fn set_value(&self, value: Value) -> Result<()> {
        *lock(&self.value) = value;
        Ok(())
    }
}

/// An ordered list of entries.
///
/// Accepts an array; `null` clears it and any other value becomes the only entry.
#[derive(Debug)]
pub struct ArrayElement {
    field: String,
    entries: Mutex<Vec<Value>>,
}

impl ArrayElement {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn push(&self, entry: Value) {
        lock(&self.entries).push(entry);
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut entries = lock(&self.entries);
        (index < entries.len()).then(|| entries.remove(index))
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl ValueElement for ArrayElement {
    fn value(&self) -> Value {
        Value::Array(lock(&self.entries).clone())
    }

    fn set_value(&self, value: Value) -> Result<()> {
        let entries = match value {
            Value::Array(entries) => entries,
            Value::Null => Vec::new(),
            single => vec![single],
        };
        *lock(&self.entries) = entries;
        Ok(())
    }
}

/// Per-locale values of a translatable field.
///
/// Reads as an object keyed by locale; accepts an object or `null`.
#[derive(Debug)]
pub struct TranslatableElement {
    field: String,
    translations: Mutex<BTreeMap<String, Value>>,
}

impl TranslatableElement {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            translations: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn translation(&self, locale: &str) -> Option<Value> {
        lock(&self.translations).get(locale).cloned()
    }

    pub fn set_translation(&self, locale: impl Into<String>, value: Value) {
        lock(&self.translations).insert(locale.into(), value);
    }

    pub fn locales(&self) -> Vec<String> {
        lock(&self.translations).keys().cloned().collect()
    }
}

impl ValueElement for TranslatableElement {
    fn value(&self) -> Value {
        let map: Map<String, Value> = lock(&self.translations)
            .iter()
            .map(|(locale, value)| (locale.clone(), value.clone()))
            .collect();
        Value::Object(map)
    }

    fn set_value(&self, value: Value) -> Result<()> {
        let translations = match value {
            Value::Object(map) => map.into_iter().collect(),
            Value::Null => BTreeMap::new(),
            other => {
                return Err(FieldError::invalid_value(
                    &self.field,
                    "an object of translations",
                    &other,
                ))
            }
        };
        *lock(&self.translations) = translations;
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("value element lock was poisoned, recovering");
        poisoned.into_inner()
    })
}
