//! Shared collaborators for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use formtree_fields::{
    DataLoader, FieldConfig, FieldNode, FormServices, Localizer, ResourceRequest, Rule, Transport,
    Violation,
};
use serde_json::{Map, Value};

/// Rule that always reports the same violation
#[derive(Debug)]
pub struct AlwaysViolates(pub Violation);

#[async_trait]
impl Rule for AlwaysViolates {
    async fn validate_field_value(
        &self,
        _config: &FieldConfig,
        _value: &Value,
    ) -> anyhow::Result<Option<Violation>> {
        Ok(Some(self.0.clone()))
    }
}

/// Rule rejecting `null` and empty strings
#[derive(Debug)]
pub struct Required;

#[async_trait]
impl Rule for Required {
    async fn validate_field_value(
        &self,
        _config: &FieldConfig,
        value: &Value,
    ) -> anyhow::Result<Option<Violation>> {
        let missing = match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        Ok(missing.then(|| Violation::microcopy("errors.required")))
    }
}

/// Rule that cannot be evaluated
#[derive(Debug)]
pub struct Broken;

#[async_trait]
impl Rule for Broken {
    async fn validate_field_value(
        &self,
        _config: &FieldConfig,
        _value: &Value,
    ) -> anyhow::Result<Option<Violation>> {
        Err(anyhow::anyhow!("rule backend unavailable"))
    }
}

/// Rule that counts its invocations and never reports anything
#[derive(Debug, Default)]
pub struct Counting {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Rule for Counting {
    async fn validate_field_value(
        &self,
        _config: &FieldConfig,
        _value: &Value,
    ) -> anyhow::Result<Option<Violation>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

/// Rule that records what the field's error area shows while it runs
#[derive(Debug, Default)]
pub struct ErrorAreaProbe {
    pub field: Mutex<Option<Weak<FieldNode>>>,
    pub seen: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl Rule for ErrorAreaProbe {
    async fn validate_field_value(
        &self,
        _config: &FieldConfig,
        _value: &Value,
    ) -> anyhow::Result<Option<Violation>> {
        let field = self.field.lock().unwrap().as_ref().and_then(Weak::upgrade);
        if let Some(field) = field {
            self.seen.lock().unwrap().push(field.error_area().messages());
        }
        Ok(Some(Violation::message("new problem")))
    }
}

/// Transport that records requests and answers with a fixed value
#[derive(Debug)]
pub struct RecordingTransport {
    pub requests: Mutex<Vec<ResourceRequest>>,
    response: Option<Value>,
}

impl RecordingTransport {
    pub fn answering(response: Value) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            response: Some(response),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            response: None,
        })
    }

    pub fn requests(&self) -> Vec<ResourceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get_resource(&self, request: ResourceRequest) -> anyhow::Result<Value> {
        self.requests.lock().unwrap().push(request);
        self.response
            .clone()
            .ok_or_else(|| anyhow::anyhow!("connection refused"))
    }
}

/// Load hook returning a fixed value
#[derive(Debug)]
pub struct FixedLoader(pub Value);

#[async_trait]
impl DataLoader for FixedLoader {
    async fn load_data(&self, _request_config: &Value, _field: &FieldNode) -> anyhow::Result<Value> {
        Ok(self.0.clone())
    }
}

/// Load hook that always fails
#[derive(Debug)]
pub struct FailingLoader;

#[async_trait]
impl DataLoader for FailingLoader {
    async fn load_data(&self, _request_config: &Value, _field: &FieldNode) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("hook crashed"))
    }
}

/// Localizer rendering `key(field)`
#[derive(Debug)]
pub struct BracketLocalizer;

impl Localizer for BracketLocalizer {
    fn translate(&self, key: &str, substitutions: &Map<String, Value>) -> String {
        let field = substitutions
            .get("field")
            .and_then(Value::as_str)
            .unwrap_or_default();
        format!("{key}({field})")
    }
}

pub fn services_with_transport(transport: Arc<RecordingTransport>) -> Arc<FormServices> {
    FormServices::default().with_transport(transport).into_shared()
}
