//! FieldSchemaNode: the value element of a field holding a nested sub-schema.
//!
//! The node renders one child [`FieldNode`] per field of its sub-schema and
//! composes their values into an object. The sub-schema comes from the
//! owning field's definition: either a literal schema, or the name of a
//! supplier field whose current value selects the schema. In the latter case
//! the node re-renders every time the supplier changes.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::context::FieldContext;
use crate::element::ValueElement;
use crate::error::{FieldError, Result};
use crate::form::Form;
use crate::lazy::Lazy;
use crate::node::FieldNode;
use crate::observer::{ChangePublisher, Subscription};
use crate::schema::SchemaValue;
use crate::types::{FieldConfig, SchemaSource};
use crate::util::{join_path, parent_path};

pub struct FieldSchemaNode {
    context: FieldContext,
    owning_form: Lazy<Weak<Form>>,
    children: Mutex<Vec<Arc<FieldNode>>>,
    supplier: Mutex<Option<Subscription>>,
    render_count: AtomicUsize,
}

impl FieldSchemaNode {
    /// Create a node. The context should name the owning field
    /// (see [`FieldContext::within_field`]).
    pub fn new(context: FieldContext) -> Arc<Self> {
        Arc::new(Self {
            context,
            owning_form: Lazy::new(),
            children: Mutex::new(Vec::new()),
            supplier: Mutex::new(None),
            render_count: AtomicUsize::new(0),
        })
    }

    pub fn context(&self) -> &FieldContext {
        &self.context
    }

    /// The field whose value this node is.
    pub fn owning_field(&self) -> Option<Arc<FieldNode>> {
        self.context.field()
    }

    /// The sub-schema node enclosing the owning field, if nested.
    pub fn owning_field_schema(&self) -> Option<Arc<FieldSchemaNode>> {
        self.context.field_schema()
    }

    /// The context's form, else the enclosing sub-schema's, else the owning
    /// field's. Cached once found.
    pub fn owning_form(&self) -> Option<Arc<Form>> {
        self.owning_form
            .get(|| {
                let form = self
                    .context
                    .form()
                    .or_else(|| self.owning_field_schema()?.owning_form())
                    .or_else(|| self.owning_field()?.owning_form());
                form.map(|form| Arc::downgrade(&form))
            })
            .and_then(|form| form.upgrade())
    }

    pub fn set_owning_form(&self, form: Option<&Arc<Form>>) {
        self.owning_form.set(form.map(Arc::downgrade));
    }

    fn schema_source(&self) -> Option<(Arc<FieldNode>, SchemaSource)> {
        let field = self.owning_field()?;
        let source = field.config()?.options.schema.clone()?;
        Some((field, source))
    }

    /// Resolve the sub-schema.
    ///
    /// Recomputed on every call since a supplier field may have changed.
    pub fn schema(&self) -> Option<SchemaValue> {
        let (field, source) = self.schema_source()?;

        match source {
            SchemaSource::Schema(schema) => Some(SchemaValue::Schema(schema)),
            SchemaSource::Value(value) => Some(SchemaValue::Other(value)),
            SchemaSource::Supplier(reference) => {
                let parent = field.schema()?;
                let record = self.enclosing_record();
                let schema = parent.get_subschema(&record, &reference);
                debug!(
                    field = %field.field_name(),
                    reference = %reference,
                    resolved = schema.is_some(),
                    "resolved supplied sub-schema"
                );
                schema
            }
        }
    }

    /// Current value of the scope the owning field lives in.
    fn enclosing_record(&self) -> Value {
        match self.owning_field_schema() {
            Some(node) => node.value(),
            None => self
                .owning_form()
                .map(|form| form.value())
                .unwrap_or(Value::Null),
        }
    }

    /// Field definitions of the sub-schema, in display order.
    ///
    /// Empty when the sub-schema cannot be resolved (yet).
    pub fn sub_fields(&self) -> Result<Vec<Arc<FieldConfig>>> {
        match self.schema() {
            None => Ok(Vec::new()),
            Some(SchemaValue::Schema(schema)) => Ok(schema.get_sorted()),
            Some(other) => Err(FieldError::SchemaTypeMismatch {
                found: other.type_name().to_string(),
            }),
        }
    }

    /// `{ child name: child value }` over the direct children.
    pub fn value(&self) -> Value {
        let children = self.children();
        let map: Map<String, Value> = children
            .iter()
            .map(|child| (child.field_name().to_string(), child.value()))
            .collect();
        Value::Object(map)
    }

    /// Always fails; the value is composed from the children.
    pub fn set_value(&self, _value: Value) -> Result<()> {
        Err(FieldError::UnsupportedWrite {
            field: self
                .owning_field()
                .map(|field| field.field_name().to_string())
                .unwrap_or_default(),
        })
    }

    /// The owning field's original value, else the form's record.
    pub fn original_value(&self) -> Option<Value> {
        if let Some(field) = self.owning_field() {
            return field.original_value();
        }
        if let Some(node) = self.owning_field_schema() {
            return node.original_value();
        }
        self.owning_form()?.document().map(|document| document.data.clone())
    }

    pub fn path_in_record(&self) -> String {
        if let Some(field) = self.owning_field() {
            return field.path_in_record();
        }
        self.owning_field_schema()
            .map(|node| node.path_in_record())
            .unwrap_or_default()
    }

    /// Resolve a sibling reference of the owning field to a record path.
    pub fn resolve_path(&self, reference: &str) -> String {
        join_path(parent_path(&self.path_in_record()), reference)
    }

    /// The retained field whose value selects this node's sub-schema.
    pub fn supplier_field(&self) -> Option<Arc<FieldNode>> {
        let (_, source) = self.schema_source()?;
        let SchemaSource::Supplier(reference) = source else {
            return None;
        };
        let path = self.resolve_path(&reference);
        let found = self.owning_form()?.find_field_by_path(&path);
        if found.is_none() {
            debug!(path = %path, "supplier field not found");
        }
        found
    }

    /// Called once the node is part of the tree.
    ///
    /// Subscribes to the supplier field, if any, then renders. Returns whether
    /// a supplier subscription was made.
    pub fn introduced(self: &Arc<Self>) -> Result<bool> {
        let supplier = self.supplier_field();

        if let Some(supplier) = &supplier {
            let node = Arc::downgrade(self);
            let subscription = supplier.on_change(Arc::new(move |_value: &Value| {
                let Some(node) = node.upgrade() else {
                    return;
                };
                if let Err(err) = node.rerender() {
                    warn!(error = %err, "failed to re-render sub-schema after supplier change");
                }
            }));
            debug!(supplier = %supplier.field_name(), "subscribed to supplier field");
            *lock(&self.supplier) = Some(subscription);
        }

        self.rerender()?;
        Ok(supplier.is_some())
    }

    /// Rebuild the children from the current sub-schema.
    ///
    /// Children are built in order, each one visible in [`value`](Self::value)
    /// once it has its value element, so later siblings can depend on earlier
    /// ones. If a child fails to build, the previous children are restored
    /// and registered with the form again.
    pub fn rerender(self: &Arc<Self>) -> Result<()> {
        let configs = self.sub_fields()?;
        let context = self.context.within_schema(self);
        let previous = std::mem::take(&mut *lock(&self.children));

        for config in configs {
            let child = FieldNode::new(context.clone(), config.name.clone());
            child.set_config(Some(config));
            if let Err(err) = child.instantiate_value_element() {
                for child in &previous {
                    child.retained();
                }
                *lock(&self.children) = previous;
                return Err(err);
            }
            child.retained();
            lock(&self.children).push(child);
        }

        let count = self.render_count.fetch_add(1, Ordering::SeqCst) + 1;
        let built = lock(&self.children).len();
        debug!(
            path = %self.path_in_record(),
            children = built,
            render = count,
            "sub-schema rendered"
        );
        Ok(())
    }

    pub fn children(&self) -> Vec<Arc<FieldNode>> {
        lock(&self.children).clone()
    }

    /// How many times the children were built.
    pub fn render_count(&self) -> usize {
        self.render_count.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.supplier).is_some()
    }

    /// Stop following the supplier field.
    pub fn detach_supplier(&self) {
        lock(&self.supplier).take();
    }
}

impl ValueElement for FieldSchemaNode {
    fn value(&self) -> Value {
        FieldSchemaNode::value(self)
    }

    fn set_value(&self, value: Value) -> Result<()> {
        FieldSchemaNode::set_value(self, value)
    }
}

impl fmt::Debug for FieldSchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children: Vec<String> = self
            .children()
            .iter()
            .map(|child| child.field_name().to_string())
            .collect();
        f.debug_struct("FieldSchemaNode")
            .field("field", &self.owning_field().map(|field| field.field_name().to_string()))
            .field("children", &children)
            .field("render_count", &self.render_count())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("field schema lock was poisoned, recovering");
        poisoned.into_inner()
    })
}
