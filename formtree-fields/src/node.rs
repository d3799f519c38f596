//! FieldNode: one logical field of a form.
//!
//! A node knows only its name and the [`FieldContext`] it was created with.
//! Everything else (owning form, owning sub-schema, field definition,
//! schema, template files) is resolved lazily from that context on first
//! access and cached until the node is reattached or the property is
//! assigned explicitly.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::context::FieldContext;
use crate::element::{
    ArrayElement, PlainValue, TranslatableElement, ValueElement, ValueElementKind,
};
use crate::error::Result;
use crate::field_schema::FieldSchemaNode;
use crate::form::Form;
use crate::lazy::Lazy;
use crate::observer::{ChangeCallback, ChangeNotifier, ChangePublisher, Subscription};
use crate::schema::{SchemaRef, SchemaValue};
use crate::services::FormServices;
use crate::templates::{self, Container, TemplateQuery, WrapperFile};
use crate::types::{FieldConfig, RenderOptions, TemplateOverride};
use crate::util::{is_unset, join_path, slugify, titleize, value_at_path};
use crate::validation::ErrorArea;

/// Host-assigned attributes of a field.
#[derive(Debug, Clone, Default)]
struct FieldAttributes {
    field_type: Option<String>,
    field_view: Option<String>,
    wrapper_view: Option<TemplateOverride>,
    readonly: bool,
    data_src: Option<String>,
    widget_settings: Option<Map<String, Value>>,
    purpose: Option<String>,
    mode: Option<String>,
    title: Option<String>,
    model: Option<String>,
}

pub struct FieldNode {
    field_name: String,
    context: Mutex<FieldContext>,
    attrs: Mutex<FieldAttributes>,
    owning_form: Lazy<Weak<Form>>,
    owning_field_schema: Lazy<Weak<FieldSchemaNode>>,
    config: Lazy<Arc<FieldConfig>>,
    schema: Lazy<SchemaRef>,
    view_file: Lazy<String>,
    wrapper_file: Lazy<WrapperFile>,
    original_value: Mutex<Option<Value>>,
    baseline: Lazy<Value>,
    element: Mutex<Option<Arc<ValueElementKind>>>,
    error_area: ErrorArea,
    changes: ChangeNotifier,
    id: Mutex<Option<String>>,
}

impl FieldNode {
    pub fn new(context: FieldContext, field_name: impl Into<String>) -> Arc<Self> {
        let field_name = field_name.into();
        trace!(field = %field_name, "field node created");
        Arc::new(Self {
            field_name,
            context: Mutex::new(context),
            attrs: Mutex::new(FieldAttributes::default()),
            owning_form: Lazy::new(),
            owning_field_schema: Lazy::new(),
            config: Lazy::new(),
            schema: Lazy::new(),
            view_file: Lazy::new(),
            wrapper_file: Lazy::new(),
            original_value: Mutex::new(None),
            baseline: Lazy::new(),
            element: Mutex::new(None),
            error_area: ErrorArea::new(),
            changes: ChangeNotifier::new(),
            id: Mutex::new(None),
        })
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn context(&self) -> FieldContext {
        lock(&self.context).clone()
    }

    pub fn services(&self) -> Arc<FormServices> {
        lock(&self.context).services().clone()
    }

    /// Move the node under a new context. Every cached ambient property is dropped.
    pub fn reattach(&self, context: FieldContext) {
        debug!(field = %self.field_name, "field reattached");
        *lock(&self.context) = context;
        self.owning_form.invalidate();
        self.owning_field_schema.invalidate();
        self.config.invalidate();
        self.schema.invalidate();
        self.baseline.invalidate();
        self.invalidate_templates();
    }

    // --- Context resolution ---

    pub fn owning_form(&self) -> Option<Arc<Form>> {
        self.owning_form
            .get(|| {
                let form = self
                    .context()
                    .form()
                    .or_else(|| self.owning_field_schema()?.owning_form());
                form.map(|form| Arc::downgrade(&form))
            })
            .and_then(|form| form.upgrade())
    }

    pub fn set_owning_form(&self, form: Option<&Arc<Form>>) {
        self.owning_form.set(form.map(Arc::downgrade));
        self.baseline.invalidate();
        self.schema.invalidate();
        self.config.invalidate();
        self.invalidate_templates();
    }

    pub fn owning_field_schema(&self) -> Option<Arc<FieldSchemaNode>> {
        self.owning_field_schema
            .get(|| self.context().field_schema().map(|node| Arc::downgrade(&node)))
            .and_then(|node| node.upgrade())
    }

    pub fn set_owning_field_schema(&self, node: Option<&Arc<FieldSchemaNode>>) {
        self.owning_field_schema.set(node.map(Arc::downgrade));
        self.baseline.invalidate();
        self.schema.invalidate();
        self.config.invalidate();
    }

    /// The schema this field is defined in.
    ///
    /// The owning sub-schema's schema, else the form's explicit schema, else
    /// the registered schema of [`model`](Self::model).
    pub fn schema(&self) -> Option<SchemaRef> {
        self.schema.get(|| self.resolve_schema())
    }

    fn resolve_schema(&self) -> Option<SchemaRef> {
        let nested = self
            .owning_field_schema()
            .and_then(|node| node.schema())
            .and_then(SchemaValue::into_schema);
        if let Some(schema) = nested {
            return Some(schema);
        }

        if let Some(schema) = self.owning_form().and_then(|form| form.schema()) {
            return Some(schema);
        }

        let model = self.model()?;
        let registry = self.services().models.clone()?;
        let schema = registry.schema_for(&model);
        debug!(field = %self.field_name, model = %model, found = schema.is_some(), "schema from model registry");
        schema
    }

    /// Assign the schema explicitly. The field definition is looked up again.
    pub fn set_schema(&self, schema: Option<SchemaRef>) {
        self.schema.set(schema);
        self.config.invalidate();
        self.invalidate_templates();
    }

    pub fn config(&self) -> Option<Arc<FieldConfig>> {
        self.config.get(|| {
            let config = self.schema()?.get_field(&self.field_name);
            if config.is_none() {
                debug!(field = %self.field_name, "schema has no definition for field");
            }
            config
        })
    }

    pub fn set_config(&self, config: Option<Arc<FieldConfig>>) {
        self.config.set(config);
        self.invalidate_templates();
    }

    pub fn is_array(&self) -> bool {
        self.config().is_some_and(|config| config.is_array)
    }

    pub fn is_translatable(&self) -> bool {
        self.config().is_some_and(|config| config.is_translatable)
    }

    pub fn contains_schema(&self) -> bool {
        self.config().is_some_and(|config| config.contains_schema())
    }

    // --- Attributes ---

    fn attr<T>(&self, read: impl FnOnce(&FieldAttributes) -> T) -> T {
        read(&lock(&self.attrs))
    }

    fn update_attrs(&self, update: impl FnOnce(&mut FieldAttributes)) {
        update(&mut lock(&self.attrs));
    }

    /// The explicit type override, else the type name of the field definition.
    pub fn field_type(&self) -> Option<String> {
        let explicit = self.attr(|a| a.field_type.clone());
        explicit.or_else(|| self.config()?.type_name.clone())
    }

    pub fn set_field_type(&self, field_type: Option<String>) {
        self.update_attrs(|a| a.field_type = field_type);
        self.view_file.invalidate();
    }

    pub fn field_view(&self) -> Option<String> {
        self.attr(|a| a.field_view.clone())
    }

    pub fn set_field_view(&self, field_view: Option<String>) {
        self.update_attrs(|a| a.field_view = field_view);
        self.view_file.invalidate();
    }

    pub fn wrapper_view(&self) -> Option<TemplateOverride> {
        self.attr(|a| a.wrapper_view.clone())
    }

    pub fn set_wrapper_view(&self, wrapper_view: Option<TemplateOverride>) {
        self.update_attrs(|a| a.wrapper_view = wrapper_view);
        self.wrapper_file.invalidate();
    }

    pub fn readonly(&self) -> bool {
        self.attr(|a| a.readonly)
    }

    pub fn set_readonly(&self, readonly: bool) {
        self.update_attrs(|a| a.readonly = readonly);
    }

    /// Endpoint override for remote data
    pub fn data_src(&self) -> Option<String> {
        self.attr(|a| a.data_src.clone())
    }

    pub fn set_data_src(&self, data_src: Option<String>) {
        self.update_attrs(|a| a.data_src = data_src);
    }

    pub fn widget_settings(&self) -> Option<Map<String, Value>> {
        self.attr(|a| a.widget_settings.clone())
    }

    pub fn set_widget_settings(&self, settings: Option<Map<String, Value>>) {
        self.update_attrs(|a| a.widget_settings = settings);
    }

    pub fn purpose(&self) -> Option<String> {
        self.attr(|a| a.purpose.clone())
    }

    pub fn set_purpose(&self, purpose: Option<String>) {
        self.update_attrs(|a| a.purpose = purpose);
    }

    pub fn mode(&self) -> Option<String> {
        self.attr(|a| a.mode.clone())
    }

    pub fn set_mode(&self, mode: Option<String>) {
        self.update_attrs(|a| a.mode = mode);
        self.invalidate_templates();
    }

    /// The model attribute, else the owning form's model.
    pub fn model(&self) -> Option<String> {
        let explicit = self.attr(|a| a.model.clone());
        explicit.or_else(|| self.owning_form()?.model().map(str::to_string))
    }

    pub fn set_model(&self, model: Option<String>) {
        self.update_attrs(|a| a.model = model);
        self.schema.invalidate();
        self.config.invalidate();
        self.invalidate_templates();
    }

    /// Display title: explicit title, widget settings, field definition, then
    /// the titleized field name.
    pub fn title(&self) -> String {
        let (explicit, from_widget) = self.attr(|a| {
            let from_widget = a
                .widget_settings
                .as_ref()
                .and_then(|settings| settings.get("title"))
                .and_then(Value::as_str)
                .map(str::to_string);
            (a.title.clone(), from_widget)
        });

        non_empty(explicit)
            .or_else(|| non_empty(from_widget))
            .or_else(|| non_empty(self.config()?.title.clone()))
            .unwrap_or_else(|| titleize(&self.field_name))
    }

    pub fn set_title(&self, title: Option<String>) {
        self.update_attrs(|a| a.title = title);
    }

    pub fn description(&self) -> Option<String> {
        let from_widget = self.attr(|a| {
            a.widget_settings
                .as_ref()
                .and_then(|settings| settings.get("description"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        from_widget.or_else(|| self.config()?.description.clone())
    }

    /// Apply host rendering options. Unset options leave the current value alone.
    pub fn apply_options(&self, options: &RenderOptions) {
        self.update_attrs(|a| {
            if let Some(purpose) = &options.purpose {
                a.purpose = Some(purpose.clone());
            }
            if let Some(mode) = &options.mode {
                a.mode = Some(mode.clone());
            }
            if let Some(view) = &options.view {
                a.field_view = Some(view.clone());
            }
            if let Some(wrapper) = &options.wrapper {
                a.wrapper_view = Some(wrapper.clone());
            }
            if options.readonly {
                a.readonly = true;
            }
            if let Some(settings) = &options.widget_settings {
                a.widget_settings = Some(settings.clone());
            }
            if let Some(data_src) = &options.data_src {
                a.data_src = Some(data_src.clone());
            }
            if let Some(title) = &options.title {
                a.title = Some(title.clone());
            }
        });
        self.invalidate_templates();
    }

    // --- Paths ---

    /// Name of this field as an entry of a record path.
    pub fn path_entry_name(&self) -> String {
        self.config()
            .map(|config| config.name.clone())
            .unwrap_or_else(|| self.field_name.clone())
    }

    /// Path of this field inside the value of its enclosing scope.
    pub fn path_in_current_schema(&self) -> String {
        self.config()
            .map(|config| config.path().to_string())
            .unwrap_or_else(|| self.field_name.clone())
    }

    /// Full path of this field inside the form's record.
    pub fn path_in_record(&self) -> String {
        let entry = self.path_entry_name();
        match self.owning_field_schema() {
            Some(node) => join_path(&node.path_in_record(), &entry),
            None => entry,
        }
    }

    // --- Templates ---

    /// Mode, else the form's view type, else the configured default.
    pub fn view_type(&self) -> String {
        if let Some(mode) = self.mode() {
            return mode;
        }
        if let Some(view_type) = self
            .owning_form()
            .and_then(|form| form.view_type().map(str::to_string))
        {
            return view_type;
        }
        self.services().settings.default_view_type.clone()
    }

    /// The explicit input template path: assigned, else derived from
    /// `field_view` or the `field_type` override.
    pub fn view_file(&self) -> Option<String> {
        self.view_file.get(|| {
            let name = self.attr(|a| a.field_view.clone().or_else(|| a.field_type.clone()))?;
            Some(templates::template_path(
                Container::Inputs,
                &self.view_type(),
                &name,
            ))
        })
    }

    pub fn set_view_file(&self, view_file: Option<String>) {
        self.view_file.set(view_file);
    }

    pub fn wrapper_file(&self) -> Option<WrapperFile> {
        self.wrapper_file.get(|| {
            let wrapper = self.wrapper_view()?;
            Some(WrapperFile::from_override(&wrapper, &self.view_type()))
        })
    }

    pub fn set_wrapper_file(&self, wrapper_file: Option<WrapperFile>) {
        self.wrapper_file.set(wrapper_file);
    }

    /// Input template candidates; `None` when there are none.
    pub fn view_files(&self) -> Option<Vec<String>> {
        let view_type = self.view_type();
        let field_type = self.field_type();
        let purpose = self.purpose();
        let view_file = self.view_file();
        let query = TemplateQuery {
            view_type: &view_type,
            field_type: field_type.as_deref(),
            purpose: purpose.as_deref(),
        };
        templates::input_candidates(&query, view_file.as_deref(), &self.services().settings)
    }

    /// Wrapper template candidates; `None` when the wrapper is suppressed.
    pub fn wrapper_files(&self) -> Option<Vec<String>> {
        let view_type = self.view_type();
        let field_type = self.field_type();
        let wrapper_file = self.wrapper_file();
        let query = TemplateQuery {
            view_type: &view_type,
            field_type: field_type.as_deref(),
            purpose: None,
        };
        templates::wrapper_candidates(&query, wrapper_file.as_ref(), &self.services().settings)
    }

    fn invalidate_templates(&self) {
        self.view_file.invalidate();
        self.wrapper_file.invalidate();
    }

    // --- Values ---

    pub fn value_element(&self) -> Option<Arc<ValueElementKind>> {
        lock(&self.element).clone()
    }

    /// Attach a value element, replacing any previous one.
    pub fn attach_element(&self, element: ValueElementKind) -> Arc<ValueElementKind> {
        let element = Arc::new(element);
        debug!(field = %self.field_name, kind = element.kind_name(), "value element attached");
        *lock(&self.element) = Some(element.clone());
        element
    }

    pub fn detach_element(&self) -> Option<Arc<ValueElementKind>> {
        lock(&self.element).take()
    }

    /// Create and attach the value element the field definition calls for,
    /// seeded with the original value.
    ///
    /// Translatable beats array, array beats sub-schema, and anything else is
    /// a plain value. A sub-schema element renders its children immediately.
    pub fn instantiate_value_element(self: &Arc<Self>) -> Result<Arc<ValueElementKind>> {
        let seed = self.original_value();

        let element = if self.is_translatable() {
            let element = TranslatableElement::new(self.field_name.as_str());
            if let Some(seed) = seed {
                element.set_value(seed)?;
            }
            ValueElementKind::Translatable(element)
        } else if self.is_array() {
            let element = ArrayElement::new(self.field_name.as_str());
            if let Some(seed) = seed {
                element.set_value(seed)?;
            }
            ValueElementKind::Array(element)
        } else if self.contains_schema() {
            let node = FieldSchemaNode::new(self.context().within_field(self));
            node.introduced()?;
            ValueElementKind::Schema(node)
        } else {
            ValueElementKind::Plain(PlainValue::new(seed.unwrap_or(Value::Null)))
        };

        Ok(self.attach_element(element))
    }

    /// The live value: the value element's, else the original value.
    pub fn value(&self) -> Value {
        match self.value_element() {
            Some(element) => element.value(),
            None => self.original_value().unwrap_or(Value::Null),
        }
    }

    /// Write through the value element and publish the change.
    ///
    /// Without an element only an unset original value is written.
    pub fn set_value(&self, value: Value) -> Result<()> {
        match self.value_element() {
            Some(element) => {
                element.set_value(value)?;
                self.notify_change();
            }
            None => {
                if is_unset(self.original_value().as_ref()) {
                    self.set_original_value(value);
                } else {
                    trace!(field = %self.field_name, "original value already set, write ignored");
                }
            }
        }
        Ok(())
    }

    /// The baseline value: explicitly assigned, else read from the enclosing
    /// sub-schema's original value, else from the form's document.
    ///
    /// A value read from the surroundings is kept from the first read on, so
    /// a later change of the document does not move it. Reattaching reads it
    /// again.
    pub fn original_value(&self) -> Option<Value> {
        let explicit = lock(&self.original_value).clone();
        if !is_unset(explicit.as_ref()) {
            return explicit;
        }

        self.baseline
            .get(|| self.read_baseline().filter(|value| !value.is_null()))
    }

    fn read_baseline(&self) -> Option<Value> {
        let path = self.path_in_current_schema();
        if let Some(node) = self.owning_field_schema() {
            let data = node.original_value()?;
            return value_at_path(&data, &path);
        }

        let document = self.owning_form()?.document()?;
        value_at_path(&document.data, &path)
    }

    pub fn set_original_value(&self, value: Value) {
        *lock(&self.original_value) = Some(value);
    }

    /// Publish the current value to change listeners.
    pub fn notify_change(&self) {
        let value = self.value();
        trace!(field = %self.field_name, listeners = self.changes.listener_count(), "field changed");
        self.changes.notify(&value);
    }

    /// Number of active change listeners
    pub fn listener_count(&self) -> usize {
        self.changes.listener_count()
    }

    // --- Lifecycle ---

    /// Called by the host once the field is part of the rendered tree.
    ///
    /// Assigns the id `field-{form id}-{slug of field name}` when none is set
    /// and registers the field with its form for path lookup.
    pub fn retained(self: &Arc<Self>) {
        let form = self.owning_form();

        {
            let mut id = lock(&self.id);
            if id.is_none() {
                let mut generated = String::from("field-");
                if let Some(form) = &form {
                    generated.push_str(form.id());
                    generated.push('-');
                }
                generated.push_str(&slugify(&self.field_name));
                *id = Some(generated);
            }
        }

        if let Some(form) = form {
            form.register_field(self);
        }
    }

    pub fn id(&self) -> Option<String> {
        lock(&self.id).clone()
    }

    pub fn set_id(&self, id: impl Into<String>) {
        *lock(&self.id) = Some(id.into());
    }

    /// Id for the value element, used to link the field label to it.
    pub fn value_element_id(&self) -> Option<String> {
        let id = self.id()?;
        self.value_element().map(|_| format!("{id}_fv"))
    }

    pub fn error_area(&self) -> &ErrorArea {
        &self.error_area
    }
}

impl ChangePublisher for FieldNode {
    fn on_change(&self, callback: ChangeCallback) -> Subscription {
        self.changes.subscribe(callback)
    }
}

impl fmt::Debug for FieldNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attrs = lock(&self.attrs).clone();
        f.debug_struct("FieldNode")
            .field("field_name", &self.field_name)
            .field("id", &self.id())
            .field("attributes", &attrs)
            .field("element", &self.value_element().map(|e| e.kind_name()))
            .finish()
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.is_empty())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("field node lock was poisoned, recovering");
        poisoned.into_inner()
    })
}
