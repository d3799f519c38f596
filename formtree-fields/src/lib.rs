//! Schema-driven form field tree
//!
//! `formtree-fields` renders one data record as a tree of form fields whose
//! shape comes from a schema rather than from hand-written markup.
//!
//! # Architecture
//!
//! - **Explicit context**: every node is created with a [`FieldContext`]
//!   naming its form, enclosing sub-schema node and shared services
//! - **Lazy ambient properties**: form, sub-schema, field definition and
//!   schema resolve on first access and stay cached until reattachment
//! - **Template candidates**: ordered template names for the host renderer,
//!   most specific first
//! - **Nested values**: reads and writes pass through array, translatable
//!   and sub-schema elements while an original value is kept for diffing
//! - **Collaborators behind traits**: rules, transport, localization and the
//!   model registry are supplied by the host through [`FormServices`]
//!
//! ```rust
//! use formtree_fields::{FieldConfig, FieldContext, FieldNode, Form, SchemaDef};
//!
//! let schema = SchemaDef::new()
//!     .with_model("Project")
//!     .field(FieldConfig::new("title").with_type("string"))
//!     .into_ref();
//! let form = Form::builder("project").schema(schema).build();
//!
//! let field = FieldNode::new(FieldContext::for_form(&form), "title");
//! field.set_purpose(Some("search".into()));
//! assert_eq!(
//!     field.view_files().unwrap(),
//!     vec!["form/inputs/edit/string", "form/inputs/search/string", "form/inputs/edit/string"]
//! );
//! ```

pub mod context;
pub mod element;
pub mod error;
pub mod field_schema;
pub mod form;
pub mod lazy;
pub mod logging;
pub mod node;
pub mod observer;
pub mod remote;
pub mod schema;
pub mod services;
pub mod templates;
pub mod types;
pub mod util;
pub mod validation;

pub use context::FieldContext;
pub use element::{
    ArrayElement, PlainValue, TranslatableElement, ValueElement, ValueElementKind,
};
pub use error::{FieldError, Result};
pub use field_schema::FieldSchemaNode;
pub use form::{Form, FormBuilder};
pub use lazy::Lazy;
pub use logging::Pretty;
pub use node::FieldNode;
pub use observer::{ChangeCallback, ChangeNotifier, ChangePublisher, Subscription};
pub use remote::{is_empty_result, QueryBuilderVariableLoader};
pub use schema::{Schema, SchemaDef, SchemaRef, SchemaValue};
pub use services::{DataLoader, FormServices, Localizer, ModelRegistry, ResourceRequest, Rule, Transport};
pub use templates::{Container, TemplateQuery, WrapperFile};
pub use types::{
    Document, FieldConfig, FieldOptions, RenderOptions, SchemaSource, TemplateOverride, Violation,
};
pub use validation::ErrorArea;

pub use formtree_config::FormSettings;
