//! Remote data loading: custom hooks and the default related-data request

mod common;

use std::sync::Arc;

use common::{services_with_transport, FailingLoader, FixedLoader, RecordingTransport};
use formtree_fields::{
    Document, FieldConfig, FieldContext, FieldError, FieldNode, FieldOptions, Form, FormServices,
    QueryBuilderVariableLoader, SchemaDef,
};
use serde_json::{json, Value};

fn owner_config() -> FieldConfig {
    FieldConfig::new("owner")
        .with_type("belongs_to")
        .with_options(FieldOptions {
            model_name: Some("User".into()),
            ..FieldOptions::default()
        })
}

fn field_for(config: FieldConfig, services: Arc<FormServices>) -> (Arc<Form>, Arc<FieldNode>) {
    let schema = SchemaDef::new().with_model("Project").field(config).into_ref();
    let form = Form::builder("project")
        .schema(schema)
        .services(services)
        .build();
    let field = FieldNode::new(FieldContext::for_form(&form), "owner");
    (form, field)
}

#[tokio::test]
async fn default_request_shape() {
    let transport = RecordingTransport::answering(json!([{"id": 1}]));
    let (_form, field) = field_for(owner_config(), services_with_transport(transport.clone()));

    let result = field.load_data(json!({"search": "jel"})).await.unwrap();
    assert_eq!(result, json!([{"id": 1}]));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].name, "FormApi#related");
    assert!(requests[0].post);
    assert_eq!(
        requests[0].body,
        json!({
            "field": "owner",
            "model": "Project",
            "assoc_model": "User",
            "config": {"search": "jel"}
        })
    );
}

#[tokio::test]
async fn data_src_overrides_endpoint() {
    let transport = RecordingTransport::answering(json!([]));
    let (_form, field) = field_for(owner_config(), services_with_transport(transport.clone()));
    field.set_data_src(Some("Users#options".into()));

    field.load_data(Value::Null).await.unwrap();
    assert_eq!(transport.requests()[0].name, "Users#options");
}

#[test_log::test(tokio::test)]
async fn failing_hook_falls_back_to_default_request() {
    let transport = RecordingTransport::answering(json!(["fallback"]));
    let config = owner_config().with_loader(Arc::new(FailingLoader));
    let (_form, field) = field_for(config, services_with_transport(transport.clone()));

    let result = field.load_data(json!({})).await.unwrap();
    assert_eq!(result, json!(["fallback"]));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn non_empty_hook_result_skips_default_request() {
    let transport = RecordingTransport::answering(json!(["fallback"]));
    let config = owner_config().with_loader(Arc::new(FixedLoader(json!(["custom"]))));
    let (_form, field) = field_for(config, services_with_transport(transport.clone()));

    let result = field.load_data(json!({})).await.unwrap();
    assert_eq!(result, json!(["custom"]));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn empty_hook_result_falls_through() {
    for empty in [json!(null), json!(false), json!(0), json!("")] {
        let transport = RecordingTransport::answering(json!(["fallback"]));
        let config = owner_config().with_loader(Arc::new(FixedLoader(empty)));
        let (_form, field) = field_for(config, services_with_transport(transport.clone()));

        assert_eq!(field.load_data(json!({})).await.unwrap(), json!(["fallback"]));
        assert_eq!(transport.requests().len(), 1);
    }
}

#[tokio::test]
async fn empty_result_set_from_hook_is_returned() {
    for result_set in [json!([]), json!({})] {
        let transport = RecordingTransport::answering(json!(["fallback"]));
        let config = owner_config().with_loader(Arc::new(FixedLoader(result_set.clone())));
        let (_form, field) = field_for(config, services_with_transport(transport.clone()));

        assert_eq!(field.load_data(json!({})).await.unwrap(), result_set);
        assert!(transport.requests().is_empty());
    }
}

#[tokio::test]
async fn transport_failure_is_propagated() {
    let transport = RecordingTransport::failing();
    let (_form, field) = field_for(owner_config(), services_with_transport(transport));

    let err = field.load_data(json!({})).await.unwrap_err();
    match err {
        FieldError::RemoteFetch { endpoint, source } => {
            assert_eq!(endpoint, "FormApi#related");
            assert_eq!(source.to_string(), "connection refused");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_transport_is_reported() {
    let (_form, field) = field_for(owner_config(), Arc::new(FormServices::default()));
    let err = field.load_data(json!({})).await.unwrap_err();
    assert!(matches!(err, FieldError::MissingCollaborator { ref name } if name == "transport"));
}

#[tokio::test]
async fn no_definition_loads_null() {
    let transport = RecordingTransport::answering(json!(["x"]));
    let field = FieldNode::new(
        FieldContext::detached(services_with_transport(transport.clone())),
        "owner",
    );
    assert_eq!(field.load_data(json!({})).await.unwrap(), Value::Null);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn query_builder_variables_use_root_record() {
    let transport = RecordingTransport::answering(json!([{"name": "total"}]));
    let config = FieldConfig::new("variable")
        .with_type("query_builder_variable")
        .with_loader(Arc::new(QueryBuilderVariableLoader));
    let schema = SchemaDef::new().with_model("Step").field(config).into_ref();

    let root = Arc::new(
        Document::new(json!({}))
            .with_model("Workflow")
            .with_primary_key("wf-1"),
    );
    let form = Form::builder("step")
        .schema(schema)
        .services(services_with_transport(transport.clone()))
        .document(Document::new(json!({})).with_model("Step").with_root(root))
        .build();
    let field = FieldNode::new(FieldContext::for_form(&form), "variable");

    let result = field.load_data(json!({"type": "number"})).await.unwrap();
    assert_eq!(result, json!([{"name": "total"}]));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].name, "FormApi#queryBuilderData");
    assert_eq!(
        requests[0].body,
        json!({"model": "Workflow", "$pk": "wf-1", "config": {"type": "number"}})
    );
}

#[tokio::test]
async fn query_builder_variables_without_form_are_empty() {
    use formtree_fields::DataLoader;

    let transport = RecordingTransport::answering(json!(["x"]));
    let field = FieldNode::new(
        FieldContext::detached(services_with_transport(transport.clone())),
        "variable",
    );

    let result = QueryBuilderVariableLoader
        .load_data(&json!({}), &field)
        .await
        .unwrap();
    assert_eq!(result, json!([]));
    assert!(transport.requests().is_empty());
}

#[test_log::test(tokio::test)]
async fn query_builder_field_without_form_loads_empty_list() {
    let transport = RecordingTransport::answering(json!(["related"]));
    let field = FieldNode::new(
        FieldContext::detached(services_with_transport(transport.clone())),
        "variable",
    );
    field.set_config(Some(Arc::new(
        FieldConfig::new("variable")
            .with_type("query_builder_variable")
            .with_loader(Arc::new(QueryBuilderVariableLoader)),
    )));

    assert_eq!(field.load_data(json!({})).await.unwrap(), json!([]));
    assert!(transport.requests().is_empty());
}
