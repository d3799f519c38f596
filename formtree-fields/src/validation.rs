//! Field validation and the per-field error area.

use std::sync::{Mutex, MutexGuard};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{FieldError, Result};
use crate::node::FieldNode;
use crate::types::Violation;

/// The error messages currently displayed for a field.
#[derive(Debug, Default)]
pub struct ErrorArea {
    messages: Mutex<Vec<String>>,
}

impl ErrorArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the whole content in one step.
    pub fn replace(&self, messages: Vec<String>) {
        *self.lock() = messages;
    }

    pub fn append(&self, message: impl Into<String>) {
        self.lock().push(message.into());
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.messages.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("error area lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl FieldNode {
    /// Evaluate every rule of the field definition against the live value.
    ///
    /// Rules run one at a time in declaration order. The first rule that
    /// fails to evaluate aborts the run.
    pub async fn violations(&self) -> Result<Vec<Violation>> {
        let Some(config) = self.config() else {
            return Ok(Vec::new());
        };

        let value = self.value();
        let mut violations = Vec::new();

        for rule in &config.rules {
            let violation = rule
                .validate_field_value(&config, &value)
                .await
                .map_err(|source| FieldError::RuleEvaluation {
                    field: self.field_name().to_string(),
                    source,
                })?;

            if let Some(violation) = violation {
                violations.push(violation);
            }
        }

        Ok(violations)
    }

    /// Validate the field and show the outcome in the error area.
    ///
    /// The error area is only touched once all rules have run, and then
    /// replaced as a whole. Returns `true` when there are no violations.
    pub async fn validate(&self) -> Result<bool> {
        let violations = self.violations().await?;
        let messages: Vec<String> = violations
            .iter()
            .map(|violation| self.render_violation(violation))
            .collect();

        debug!(field = %self.field_name(), violations = messages.len(), "field validated");
        self.error_area().replace(messages);
        Ok(violations.is_empty())
    }

    /// Display text for a violation.
    pub fn render_violation(&self, violation: &Violation) -> String {
        match &violation.microcopy {
            Some(key) => match self.services().localizer.clone() {
                Some(localizer) => {
                    let mut substitutions = Map::new();
                    substitutions.insert("field".to_string(), Value::String(self.title()));
                    localizer.translate(key, &substitutions)
                }
                None => key.clone(),
            },
            None => violation.to_string(),
        }
    }

    /// Append one violation to the error area.
    pub fn show_error(&self, violation: &Violation) {
        let message = self.render_violation(violation);
        self.error_area().append(message);
    }

    pub fn remove_errors(&self) {
        self.error_area().clear();
    }
}
