//! Core field types: field configuration, options, violations and documents.
//!
//! A [`FieldConfig`] is the definition a schema produces for one named field.
//! Nodes never own a config; they hold an `Arc` looked up from the schema.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::schema::SchemaRef;
use crate::services::{DataLoader, Rule};

/// Where a sub-schema field gets its schema from.
#[derive(Debug, Clone)]
pub enum SchemaSource {
    /// A literal schema object
    Schema(SchemaRef),
    /// The name of a sibling field whose current value selects the schema
    Supplier(String),
    /// Any other configured value; requesting sub-fields from it fails
    Value(Value),
}

/// Options attached to a field definition.
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    /// Sub-schema of a schema field
    pub schema: Option<SchemaSource>,
    /// Associated model for related-record lookups
    pub model_name: Option<String>,
    /// Anything else the schema author attached
    pub extra: Map<String, Value>,
}

/// A field definition: the schema's description of a single named field.
#[derive(Debug, Clone)]
pub struct FieldConfig {
    pub name: String,
    /// Type name used for template selection, e.g. `string` or `schema`
    pub type_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_array: bool,
    pub is_translatable: bool,
    pub options: FieldOptions,
    /// Validation rules, evaluated in declaration order
    pub rules: Vec<Arc<dyn Rule>>,
    /// Model name of the schema this field belongs to
    pub model_name: Option<String>,
    /// Path of this field within its schema, when it differs from the name
    pub path: Option<String>,
    /// Custom remote data hook
    pub loader: Option<Arc<dyn DataLoader>>,
}

impl FieldConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            title: None,
            description: None,
            is_array: false,
            is_translatable: false,
            options: FieldOptions::default(),
            rules: Vec::new(),
            model_name: None,
            path: None,
            loader: None,
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn translatable(mut self) -> Self {
        self.is_translatable = true;
        self
    }

    pub fn with_options(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }

    /// Make this a schema field with the given sub-schema source.
    pub fn with_schema(mut self, source: SchemaSource) -> Self {
        self.options.schema = Some(source);
        if self.type_name.is_none() {
            self.type_name = Some("schema".to_string());
        }
        self
    }

    pub fn with_rule(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn DataLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Path of this field within its schema.
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }

    /// Does this field hold a nested sub-schema?
    pub fn contains_schema(&self) -> bool {
        self.options.schema.is_some()
    }
}

/// The result of one rule evaluation that found a problem.
///
/// Carries a microcopy key for localized display, a literal message, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microcopy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Violation {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            microcopy: None,
            message: Some(message.into()),
        }
    }

    pub fn microcopy(key: impl Into<String>) -> Self {
        Self {
            microcopy: Some(key.into()),
            message: None,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, &self.microcopy) {
            (Some(message), _) => f.write_str(message),
            (None, Some(key)) => f.write_str(key),
            (None, None) => f.write_str("invalid value"),
        }
    }
}

/// An explicit template choice that can also switch the template off.
///
/// Serialized as `false` for [`TemplateOverride::Suppressed`] and as a plain
/// string otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOverride {
    Suppressed,
    Named(String),
}

impl Serialize for TemplateOverride {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TemplateOverride::Suppressed => serializer.serialize_bool(false),
            TemplateOverride::Named(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for TemplateOverride {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(TemplateOverride::Suppressed),
            Raw::Flag(true) => Err(serde::de::Error::custom(
                "a template override must be a name or false",
            )),
            Raw::Name(name) => Ok(TemplateOverride::Named(name)),
        }
    }
}

/// Rendering options a host applies to a field before first use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub purpose: Option<String>,
    pub mode: Option<String>,
    pub view: Option<String>,
    pub wrapper: Option<TemplateOverride>,
    pub readonly: bool,
    pub widget_settings: Option<Map<String, Value>>,
    pub data_src: Option<String>,
    pub title: Option<String>,
}

/// The record being edited by a form.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub model_name: Option<String>,
    pub primary_key: Option<Value>,
    pub data: Value,
    /// The top-level record when this document is nested inside another
    pub root_document: Option<Arc<Document>>,
}

impl Document {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<Value>) -> Self {
        self.primary_key = Some(primary_key.into());
        self
    }

    pub fn with_root(mut self, root: Arc<Document>) -> Self {
        self.root_document = Some(root);
        self
    }

    /// The root record: the back-reference if present, else this document.
    pub fn root(&self) -> &Document {
        self.root_document.as_deref().unwrap_or(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_path_defaults_to_name() {
        let config = FieldConfig::new("title");
        assert_eq!(config.path(), "title");

        let config = FieldConfig::new("title").with_path("meta.title");
        assert_eq!(config.path(), "meta.title");
    }

    #[test]
    fn with_schema_marks_schema_type() {
        let config = FieldConfig::new("settings").with_schema(SchemaSource::Supplier("type".into()));
        assert!(config.contains_schema());
        assert_eq!(config.type_name.as_deref(), Some("schema"));

        let config = FieldConfig::new("settings")
            .with_type("custom_schema")
            .with_schema(SchemaSource::Value(json!(1)));
        assert_eq!(config.type_name.as_deref(), Some("custom_schema"));
    }

    #[test]
    fn violation_display_prefers_message() {
        let both = Violation {
            microcopy: Some("errors.required".into()),
            message: Some("is required".into()),
        };
        assert_eq!(both.to_string(), "is required");
        assert_eq!(Violation::microcopy("errors.required").to_string(), "errors.required");
    }

    #[test]
    fn template_override_from_json() {
        let suppressed: TemplateOverride = serde_json::from_value(json!(false)).unwrap();
        assert_eq!(suppressed, TemplateOverride::Suppressed);

        let named: TemplateOverride = serde_json::from_value(json!("inline")).unwrap();
        assert_eq!(named, TemplateOverride::Named("inline".into()));

        assert!(serde_json::from_value::<TemplateOverride>(json!(true)).is_err());
        assert_eq!(serde_json::to_value(&suppressed).unwrap(), json!(false));
    }

    #[test]
    fn render_options_partial_json() {
        let options: RenderOptions = serde_json::from_value(json!({
            "purpose": "search",
            "wrapper": false,
            "readonly": true
        }))
        .unwrap();
        assert_eq!(options.purpose.as_deref(), Some("search"));
        assert_eq!(options.wrapper, Some(TemplateOverride::Suppressed));
        assert!(options.readonly);
        assert!(options.view.is_none());
    }

    #[test]
    fn document_root_unwraps_back_reference() {
        let root = Arc::new(Document::new(json!({})).with_model("Project").with_primary_key(7));
        let nested = Document::new(json!({})).with_model("Task").with_root(root.clone());
        assert_eq!(nested.root().model_name.as_deref(), Some("Project"));
        assert_eq!(root.root().primary_key, Some(json!(7)));
    }
}
