//! Schemas: the source of field configurations.
//!
//! [`Schema`] is the narrow interface the field tree consumes. [`SchemaDef`]
//! is an in-memory implementation with a name index and per-reference
//! sub-schema tables for dynamic (supplier-driven) sub-schemas.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::json_type_name;
use crate::types::FieldConfig;
use crate::util::value_at_path;

/// Shared handle to a schema
pub type SchemaRef = Arc<dyn Schema>;

/// A collection of field definitions describing one record shape.
pub trait Schema: Send + Sync + fmt::Debug {
    /// Model this schema describes, if any
    fn model_name(&self) -> Option<&str>;

    /// Look up a field definition by name
    fn get_field(&self, name: &str) -> Option<Arc<FieldConfig>>;

    /// All field definitions, in display order
    fn get_sorted(&self) -> Vec<Arc<FieldConfig>>;

    /// Resolve a dynamic sub-schema from a record value and a reference name.
    fn get_subschema(&self, _record: &Value, _reference: &str) -> Option<SchemaValue> {
        None
    }
}

/// What a sub-schema lookup produced.
#[derive(Debug, Clone)]
pub enum SchemaValue {
    Schema(SchemaRef),
    /// A configured value that is not a schema
    Other(Value),
}

impl SchemaValue {
    pub fn as_schema(&self) -> Option<&SchemaRef> {
        match self {
            SchemaValue::Schema(schema) => Some(schema),
            SchemaValue::Other(_) => None,
        }
    }

    pub fn into_schema(self) -> Option<SchemaRef> {
        match self {
            SchemaValue::Schema(schema) => Some(schema),
            SchemaValue::Other(_) => None,
        }
    }

    /// Type name for diagnostics: `object` for schemas, the JSON type otherwise
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaValue::Schema(_) => "object",
            SchemaValue::Other(value) => json_type_name(value),
        }
    }
}

/// In-memory schema definition.
///
/// Fields keep their insertion order; `get_sorted` returns them in that order.
///
/// ```rust
/// use formtree_fields::{FieldConfig, Schema, SchemaDef};
///
/// let schema = SchemaDef::new()
///     .with_model("Project")
///     .field(FieldConfig::new("title").with_type("string"))
///     .field(FieldConfig::new("body").with_type("text"));
///
/// assert_eq!(schema.get_sorted().len(), 2);
/// assert_eq!(schema.get_field("title").unwrap().model_name.as_deref(), Some("Project"));
/// ```
#[derive(Debug, Default)]
pub struct SchemaDef {
    model_name: Option<String>,
    fields: Vec<Arc<FieldConfig>>,
    name_index: HashMap<String, usize>,
    /// reference name → (supplier value → schema)
    subschemas: HashMap<String, HashMap<String, SchemaRef>>,
}

impl SchemaDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model name; fields added afterwards inherit it.
    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Add a field definition. A later field with the same name replaces the earlier one.
    pub fn field(mut self, mut config: FieldConfig) -> Self {
        if config.model_name.is_none() {
            config.model_name = self.model_name.clone();
        }
        let config = Arc::new(config);

        if let Some(&idx) = self.name_index.get(&config.name) {
            self.fields[idx] = config;
        } else {
            let idx = self.fields.len();
            self.name_index.insert(config.name.clone(), idx);
            self.fields.push(config);
        }
        self
    }

    /// Register the schema chosen when the field named `reference` holds `value`.
    pub fn subschema(
        mut self,
        reference: impl Into<String>,
        value: impl Into<String>,
        schema: SchemaRef,
    ) -> Self {
        self.subschemas
            .entry(reference.into())
            .or_default()
            .insert(value.into(), schema);
        self
    }

    /// Wrap in a shared handle.
    pub fn into_ref(self) -> SchemaRef {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Schema for SchemaDef {
    fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    fn get_field(&self, name: &str) -> Option<Arc<FieldConfig>> {
        self.name_index.get(name).map(|&i| self.fields[i].clone())
    }

    fn get_sorted(&self) -> Vec<Arc<FieldConfig>> {
        self.fields.clone()
    }

    fn get_subschema(&self, record: &Value, reference: &str) -> Option<SchemaValue> {
        let table = self.subschemas.get(reference)?;
        let key = match value_at_path(record, reference)? {
            Value::String(s) => s,
            Value::Null => return None,
            other => other.to_string(),
        };

        let found = table.get(&key).cloned();
        debug!(reference, key = %key, found = found.is_some(), "sub-schema lookup");
        found.map(SchemaValue::Schema)
    }
}
