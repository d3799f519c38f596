//! The explicit ambient context of a node.
//!
//! Nodes are never wired to each other after construction. Instead each node
//! receives a `FieldContext` naming what surrounds it: the form, the nearest
//! enclosing field-schema node, the field that owns it (for sub-schema nodes)
//! and the shared [`FormServices`]. All references are weak; the context
//! never keeps its surroundings alive.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::field_schema::FieldSchemaNode;
use crate::form::Form;
use crate::node::FieldNode;
use crate::services::FormServices;

#[derive(Clone, Default)]
pub struct FieldContext {
    form: Option<Weak<Form>>,
    field_schema: Option<Weak<FieldSchemaNode>>,
    field: Option<Weak<FieldNode>>,
    services: Arc<FormServices>,
}

impl FieldContext {
    /// A context outside of any form.
    pub fn detached(services: Arc<FormServices>) -> Self {
        Self {
            services,
            ..Self::default()
        }
    }

    /// The context of a top-level node of `form`.
    pub fn for_form(form: &Arc<Form>) -> Self {
        Self {
            form: Some(Arc::downgrade(form)),
            field_schema: None,
            field: None,
            services: form.services().clone(),
        }
    }

    /// The context of a node nested inside `node`.
    pub fn within_schema(&self, node: &Arc<FieldSchemaNode>) -> Self {
        Self {
            field_schema: Some(Arc::downgrade(node)),
            field: None,
            ..self.clone()
        }
    }

    /// The context of a value element owned by `field`.
    pub fn within_field(&self, field: &Arc<FieldNode>) -> Self {
        Self {
            field: Some(Arc::downgrade(field)),
            ..self.clone()
        }
    }

    pub fn form(&self) -> Option<Arc<Form>> {
        self.form.as_ref().and_then(Weak::upgrade)
    }

    pub fn field_schema(&self) -> Option<Arc<FieldSchemaNode>> {
        self.field_schema.as_ref().and_then(Weak::upgrade)
    }

    pub fn field(&self) -> Option<Arc<FieldNode>> {
        self.field.as_ref().and_then(Weak::upgrade)
    }

    pub fn services(&self) -> &Arc<FormServices> {
        &self.services
    }
}

impl fmt::Debug for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldContext")
            .field("form", &self.form().map(|form| form.id().to_string()))
            .field("field_schema", &self.field_schema.is_some())
            .field("field", &self.field().map(|field| field.field_name().to_string()))
            .finish()
    }
}
