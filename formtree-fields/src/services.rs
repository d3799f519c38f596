//! External collaborators the field tree consumes.
//!
//! Rule evaluation, remote transport, localization and the model registry
//! live outside this crate. They are reached through these traits and bundled
//! in [`FormServices`], which every [`FieldContext`](crate::FieldContext)
//! carries.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use formtree_config::FormSettings;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::node::FieldNode;
use crate::schema::SchemaRef;
use crate::types::{FieldConfig, Violation};

/// One validation rule attached to a field definition.
#[async_trait]
pub trait Rule: Send + Sync + fmt::Debug {
    /// Check a value; `Ok(None)` means the value passes.
    async fn validate_field_value(
        &self,
        config: &FieldConfig,
        value: &Value,
    ) -> anyhow::Result<Option<Violation>>;
}

/// A custom per-field remote data hook.
#[async_trait]
pub trait DataLoader: Send + Sync + fmt::Debug {
    async fn load_data(&self, request_config: &Value, field: &FieldNode) -> anyhow::Result<Value>;
}

/// A request for a named remote resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// Endpoint identifier, e.g. `FormApi#related`
    pub name: String,
    pub post: bool,
    pub body: Value,
}

impl ResourceRequest {
    pub fn post(name: impl Into<String>, body: Value) -> Self {
        Self {
            name: name.into(),
            post: true,
            body,
        }
    }
}

/// Fetches remote resources. Must fail on transport errors.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn get_resource(&self, request: ResourceRequest) -> anyhow::Result<Value>;
}

/// Resolves microcopy keys to display text.
pub trait Localizer: Send + Sync + fmt::Debug {
    fn translate(&self, key: &str, substitutions: &Map<String, Value>) -> String;
}

/// Looks up the schema of a model by name.
pub trait ModelRegistry: Send + Sync + fmt::Debug {
    fn schema_for(&self, model_name: &str) -> Option<SchemaRef>;
}

/// Settings and collaborators shared by every node of a form tree.
#[derive(Debug, Clone, Default)]
pub struct FormServices {
    pub settings: FormSettings,
    pub transport: Option<Arc<dyn Transport>>,
    pub localizer: Option<Arc<dyn Localizer>>,
    pub models: Option<Arc<dyn ModelRegistry>>,
}

impl FormServices {
    pub fn new(settings: FormSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = Some(localizer);
        self
    }

    pub fn with_models(mut self, models: Arc<dyn ModelRegistry>) -> Self {
        self.models = Some(models);
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
