//! The settings consumed by field rendering and remote data loading

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Endpoint used for related-record lookups when a field has no `data-src`.
pub const DEFAULT_RELATED_ENDPOINT: &str = "FormApi#related";

/// Endpoint used by query-builder variable fields.
pub const DEFAULT_QUERY_BUILDER_ENDPOINT: &str = "FormApi#queryBuilderData";

/// View type used when neither the field nor its form names one.
pub const DEFAULT_VIEW_TYPE: &str = "edit";

/// Field type of the last-resort input template.
pub const DEFAULT_FALLBACK_INPUT_TYPE: &str = "string";

/// Name of the catch-all wrapper template and view type.
pub const DEFAULT_WRAPPER: &str = "default";

/// Settings for a form tree.
///
/// Every field has a default, so a partially filled settings file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// Remote endpoint for related-record data
    pub related_endpoint: String,
    /// Remote endpoint for query-builder variable data
    pub query_builder_endpoint: String,
    /// View type used when nothing more specific is known
    pub default_view_type: String,
    /// Field type of the generic input template fallback
    pub fallback_input_type: String,
    /// Name of the generic wrapper template
    pub default_wrapper: String,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            related_endpoint: DEFAULT_RELATED_ENDPOINT.to_string(),
            query_builder_endpoint: DEFAULT_QUERY_BUILDER_ENDPOINT.to_string(),
            default_view_type: DEFAULT_VIEW_TYPE.to_string(),
            fallback_input_type: DEFAULT_FALLBACK_INPUT_TYPE.to_string(),
            default_wrapper: DEFAULT_WRAPPER.to_string(),
        }
    }
}

impl FormSettings {
    /// Reject settings that would produce unusable template paths or requests.
    pub fn validate(&self) -> ConfigResult<()> {
        let entries = [
            ("related_endpoint", &self.related_endpoint),
            ("query_builder_endpoint", &self.query_builder_endpoint),
            ("default_view_type", &self.default_view_type),
            ("fallback_input_type", &self.fallback_input_type),
            ("default_wrapper", &self.default_wrapper),
        ];

        for (key, value) in entries {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid_value(key, "must not be empty"));
            }
        }

        for (key, value) in &entries[2..] {
            if value.contains('/') {
                return Err(ConfigError::invalid_value(
                    *key,
                    "template path segments cannot contain '/'",
                ));
            }
        }

        Ok(())
    }
}
