//! The root of a field tree.
//!
//! Holds the record being edited, the model name, an optional explicit
//! schema and the shared services. Fields register themselves on retention so
//! they can be found by record path (used for supplier fields).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::{Map, Value};
use tracing::debug;

use crate::node::FieldNode;
use crate::schema::SchemaRef;
use crate::services::FormServices;
use crate::types::Document;

/// Builder for [`Form`]. Created by [`Form::builder`].
pub struct FormBuilder {
    id: String,
    model: Option<String>,
    view_type: Option<String>,
    schema: Option<SchemaRef>,
    document: Option<Document>,
    services: Arc<FormServices>,
}

impl FormBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn view_type(mut self, view_type: impl Into<String>) -> Self {
        self.view_type = Some(view_type.into());
        self
    }

    pub fn schema(mut self, schema: SchemaRef) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    pub fn services(mut self, services: Arc<FormServices>) -> Self {
        self.services = services;
        self
    }

    pub fn build(self) -> Arc<Form> {
        debug!(id = %self.id, model = ?self.model, "form created");
        Arc::new(Form {
            id: self.id,
            model: self.model,
            view_type: self.view_type,
            schema: self.schema,
            document: Mutex::new(self.document.map(Arc::new)),
            services: self.services,
            fields: Mutex::new(BTreeMap::new()),
        })
    }
}

#[derive(Debug)]
pub struct Form {
    id: String,
    model: Option<String>,
    view_type: Option<String>,
    schema: Option<SchemaRef>,
    document: Mutex<Option<Arc<Document>>>,
    services: Arc<FormServices>,
    /// record path → retained field
    fields: Mutex<BTreeMap<String, Weak<FieldNode>>>,
}

impl Form {
    pub fn builder(id: impl Into<String>) -> FormBuilder {
        FormBuilder {
            id: id.into(),
            model: None,
            view_type: None,
            schema: None,
            document: None,
            services: Arc::new(FormServices::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn view_type(&self) -> Option<&str> {
        self.view_type.as_deref()
    }

    /// The explicitly configured schema, if any
    pub fn schema(&self) -> Option<SchemaRef> {
        self.schema.clone()
    }

    pub fn services(&self) -> &Arc<FormServices> {
        &self.services
    }

    pub fn document(&self) -> Option<Arc<Document>> {
        lock(&self.document).clone()
    }

    /// Replace the record. Fields that already read their original value keep it.
    pub fn set_document(&self, document: Document) {
        *lock(&self.document) = Some(Arc::new(document));
    }

    /// Register a field under its record path, replacing any earlier field there.
    pub fn register_field(&self, field: &Arc<FieldNode>) {
        let path = field.path_in_record();
        debug!(form = %self.id, path = %path, "field registered");
        lock(&self.fields).insert(path, Arc::downgrade(field));
    }

    /// Find a retained field by its record path.
    pub fn find_field_by_path(&self, path: &str) -> Option<Arc<FieldNode>> {
        lock(&self.fields).get(path).and_then(Weak::upgrade)
    }

    /// The record as currently edited: the document data with the live values
    /// of retained top-level fields laid over it.
    pub fn value(&self) -> Value {
        let mut record = match self.document().map(|doc| doc.data.clone()) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        let fields: Vec<Arc<FieldNode>> = lock(&self.fields)
            .values()
            .filter_map(Weak::upgrade)
            .collect();

        for field in fields {
            if field.owning_field_schema().is_none() {
                record.insert(field.field_name().to_string(), field.value());
            }
        }

        Value::Object(record)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("form lock was poisoned, recovering");
        poisoned.into_inner()
    })
}
