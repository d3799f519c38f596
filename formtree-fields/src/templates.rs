//! Template path resolution.
//!
//! Produces the ordered candidate template identifiers a host renderer tries
//! for a field. Nothing here checks whether a template exists; the renderer
//! picks the first candidate it can load.

use formtree_config::FormSettings;
use tracing::trace;

use crate::types::TemplateOverride;

/// Template container kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Inputs,
    Wrappers,
}

impl Container {
    pub fn as_str(self) -> &'static str {
        match self {
            Container::Inputs => "inputs",
            Container::Wrappers => "wrappers",
        }
    }
}

/// `form/{container}/{view_type}/{name}`
pub fn template_path(container: Container, view_type: &str, name: &str) -> String {
    format!("form/{}/{}/{}", container.as_str(), view_type, name)
}

/// What the candidate builders need to know about a field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateQuery<'a> {
    pub view_type: &'a str,
    /// Resolved field type (override or config type)
    pub field_type: Option<&'a str>,
    pub purpose: Option<&'a str>,
}

/// Input template candidates, most specific first.
///
/// `view_file` is the explicit override path, if any. Returns `None` when no
/// candidate could be derived at all; otherwise the generic
/// `fallback_input_type` input under the current view type comes last.
pub fn input_candidates(
    query: &TemplateQuery<'_>,
    view_file: Option<&str>,
    settings: &FormSettings,
) -> Option<Vec<String>> {
    let mut result = Vec::new();

    if let Some(view_file) = view_file {
        result.push(view_file.to_string());
    }

    if let Some(field_type) = query.field_type {
        result.push(template_path(Container::Inputs, query.view_type, field_type));

        if let Some(purpose) = query.purpose {
            result.push(template_path(Container::Inputs, purpose, field_type));
        }
    }

    if result.is_empty() {
        trace!("no input template candidates");
        return None;
    }

    result.push(template_path(
        Container::Inputs,
        query.view_type,
        &settings.fallback_input_type,
    ));
    Some(result)
}

/// Wrapper template candidates, most specific first.
///
/// `None` means the wrapper is switched off. Without a resolvable field type
/// only the explicit override (if any) is returned.
pub fn wrapper_candidates(
    query: &TemplateQuery<'_>,
    wrapper_file: Option<&WrapperFile>,
    settings: &FormSettings,
) -> Option<Vec<String>> {
    let mut result = Vec::new();

    match wrapper_file {
        Some(WrapperFile::Suppressed) => return None,
        Some(WrapperFile::Path(path)) => result.push(path.clone()),
        None => {}
    }

    if let Some(field_type) = query.field_type {
        let default = settings.default_wrapper.as_str();
        result.push(template_path(Container::Wrappers, query.view_type, field_type));
        result.push(template_path(Container::Wrappers, query.view_type, default));
        result.push(template_path(Container::Wrappers, default, field_type));
        result.push(template_path(Container::Wrappers, default, default));
    }

    Some(result)
}

/// A resolved wrapper override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapperFile {
    Suppressed,
    Path(String),
}

impl WrapperFile {
    /// Resolve a wrapper override against the current view type.
    pub fn from_override(wrapper: &TemplateOverride, view_type: &str) -> Self {
        match wrapper {
            TemplateOverride::Suppressed => WrapperFile::Suppressed,
            TemplateOverride::Named(name) => {
                WrapperFile::Path(template_path(Container::Wrappers, view_type, name))
            }
        }
    }
}
