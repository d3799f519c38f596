//! Remote data for fields that pick from related records.
//!
//! A field definition may carry a custom [`DataLoader`]. When it fails or
//! comes back with nothing, the field falls back to a generic POST request
//! for related data.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::error::{FieldError, Result};
use crate::logging::Pretty;
use crate::node::FieldNode;
use crate::services::{DataLoader, ResourceRequest};

/// Whether a load hook result should fall through to the default request.
///
/// `null`, `false`, zero and the empty string mean "nothing". Arrays and
/// objects are results even when empty, so a hook can answer with an empty
/// result set.
pub fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

impl FieldNode {
    /// Load remote data for this field.
    ///
    /// Tries the field definition's custom loader first. Its errors are logged
    /// and swallowed. Otherwise POSTs to `data_src` or the related endpoint.
    /// Returns `null` when the field has no definition.
    pub async fn load_data(&self, request_config: Value) -> Result<Value> {
        let Some(config) = self.config() else {
            debug!(field = %self.field_name(), "no field definition, nothing to load");
            return Ok(Value::Null);
        };

        if let Some(loader) = config.loader.clone() {
            match loader.load_data(&request_config, self).await {
                Ok(result) if !is_empty_result(&result) => return Ok(result),
                Ok(_) => {
                    debug!(field = %config.name, "custom loader returned nothing, using default request")
                }
                Err(err) => {
                    error!(field = %config.name, error = %err, "error loading field data");
                }
            }
        }

        let services = self.services();
        let endpoint = self
            .data_src()
            .unwrap_or_else(|| services.settings.related_endpoint.clone());

        let request = ResourceRequest::post(
            endpoint.clone(),
            json!({
                "field": config.name,
                "model": config.model_name,
                "assoc_model": config.options.model_name,
                "config": request_config,
            }),
        );
        debug!("loading related data: {}", Pretty(&request));

        let transport = services
            .transport
            .clone()
            .ok_or_else(|| FieldError::MissingCollaborator {
                name: "transport".to_string(),
            })?;

        transport
            .get_resource(request)
            .await
            .map_err(|source| FieldError::RemoteFetch { endpoint, source })
    }
}

/// Loader for query-builder variables.
///
/// Asks the query-builder endpoint for the variables available on the root
/// record of the form the field belongs to.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryBuilderVariableLoader;

#[async_trait]
impl DataLoader for QueryBuilderVariableLoader {
    async fn load_data(&self, request_config: &Value, field: &FieldNode) -> anyhow::Result<Value> {
        let Some(form) = field.owning_form() else {
            return Ok(Value::Array(Vec::new()));
        };

        let document = form.document();
        let root = document.as_deref().map(|document| document.root());
        let body = json!({
            "model": root.and_then(|document| document.model_name.clone()),
            "$pk": root.and_then(|document| document.primary_key.clone()),
            "config": request_config,
        });

        let services = field.services();
        let request = ResourceRequest::post(services.settings.query_builder_endpoint.clone(), body);
        debug!("loading query builder variables: {}", Pretty(&request));

        let transport = services
            .transport
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no transport configured"))?;
        transport.get_resource(request).await
    }
}
