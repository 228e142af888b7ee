//! Integration tests
//!
//! Tests the full end-to-end flow: schema directory → type registry →
//! reflective models → parsed, fetched and serialized instances

use jschema_types::config::LoaderConfig;
use jschema_types::error::Error;
use jschema_types::http::HttpClient;
use jschema_types::parser::parse_document;
use jschema_types::reflect::{MethodKind, ModelGenerator, Runtime};
use jschema_types::schema::{Diagnostic, FieldType, PrimitiveKind, TypeLoader};
use jschema_types::types::{AutoCreate, ValueMap};
use jschema_types::value::{serialize, Value};
use jschema_types::SourceUnit;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORDER_SCHEMA: &str = r#"{
  "__typedefs": {
    "Money": {"amount": "number", "currency": "string"},
    "Sku": "string"
  },
  "id": "int",
  "status": {"__enum": ["open", "shipped", "in-transit"]},
  "total": "Money",
  "lines": [{"sku": "Sku", "price": "Money", "qty": "int"}],
  "notes": {"map_of": "string"}
}"#;

const INVOICE_SAMPLE: &str = r#"{
  "number": "INV-1",
  "issued": "2024-01-05",
  "link": "https://example.com/inv/1",
  "lines": [{"sku": "a", "qty": 1}, {"sku": "b", "price": 2.5}]
}"#;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn schema_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "acme/shop/Order.jschema", ORDER_SCHEMA);
    write(dir.path(), "acme/samples/Invoice.json", INVOICE_SAMPLE);
    write(dir.path(), "acme/shop/Orders.jschema", r#"[["acme.shop.Order"]]"#);
    dir
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_registry_from_directory() {
    let dir = schema_dir();
    let loader = TypeLoader::default();
    let registry = loader.rebuild_from_dir(dir.path()).unwrap();

    assert_eq!(
        registry.sources().collect::<Vec<_>>(),
        vec!["acme.shop.Order", "acme.shop.Orders", "acme.samples.Invoice"]
    );
    assert!(registry.diagnostics().next().is_none());
    assert!(registry.is_namespace("acme.shop"));
    assert_eq!(registry.generation(), 1);

    let order = registry.get("acme.shop.Order").unwrap();
    let order = order.as_struct().unwrap();
    assert_eq!(
        order.field("total").unwrap().field_type,
        FieldType::named("acme.shop.Order.Money")
    );
    assert_eq!(
        order.field("status").unwrap().field_type,
        FieldType::named("acme.shop.Order.status")
    );
    assert_eq!(
        order.field("notes").unwrap().field_type,
        FieldType::map_of(FieldType::primitive(PrimitiveKind::String))
    );

    let line = registry.get("acme.shop.Order.lines").unwrap();
    let line = line.as_struct().unwrap();
    assert_eq!(
        line.field("sku").unwrap().field_type,
        FieldType::primitive(PrimitiveKind::String)
    );
    assert_eq!(
        line.field("price").unwrap().field_type,
        FieldType::named("acme.shop.Order.Money")
    );

    let orders = registry.get("acme.shop.Orders").unwrap();
    let wrapper = orders.as_list_wrapper().unwrap();
    assert_eq!(wrapper.wrap_depth, 2);

    let invoice = registry.get("acme.samples.Invoice").unwrap();
    let invoice = invoice.as_struct().unwrap();
    assert_eq!(
        invoice.field("issued").unwrap().field_type,
        FieldType::primitive(PrimitiveKind::Date)
    );
    assert_eq!(
        invoice.field("link").unwrap().field_type,
        FieldType::primitive(PrimitiveKind::Uri)
    );
    let invoice_line = registry.get("acme.samples.Invoice.lines").unwrap();
    let keys: Vec<_> = invoice_line
        .as_struct()
        .unwrap()
        .fields
        .iter()
        .map(|f| f.raw_key.as_str())
        .collect();
    assert_eq!(keys, vec!["sku", "qty", "price"]);
}

#[test]
fn test_malformed_source_does_not_stop_others() {
    let dir = schema_dir();
    write(dir.path(), "acme/Broken.jschema", r#"{"name": }"#);

    let registry = TypeLoader::default().rebuild_from_dir(dir.path()).unwrap();
    let broken = registry.get("acme.Broken").unwrap();
    assert!(broken.as_struct().unwrap().fields.is_empty());
    assert_eq!(broken.diagnostics.len(), 1);
    match &broken.diagnostics[0] {
        Diagnostic::Parse(err) => assert_eq!((err.line, err.column), (1, 10)),
        other => panic!("unexpected diagnostic {other:?}"),
    }
    assert!(registry.contains("acme.shop.Order"));
}

#[test]
fn test_custom_markers_from_yaml() {
    let config = LoaderConfig::from_yaml(
        "markers:\n  enum_marker: \"$enum\"\n  typedefs_marker: \"$types\"\n",
    )
    .unwrap();
    let loader = TypeLoader::new(config);
    let registry = loader
        .rebuild(&[SourceUnit::jschema(
            "acme.Shirt",
            r#"{"$types": {"Label": "string"}, "size": {"$enum": ["s", "m"]}, "tag": "Label"}"#,
        )])
        .unwrap();

    let size = registry.get("acme.Shirt.size").unwrap();
    assert_eq!(size.as_enum().unwrap().values.len(), 2);
    let shirt = registry.get("acme.Shirt").unwrap();
    assert_eq!(
        shirt.as_struct().unwrap().field("tag").unwrap().field_type,
        FieldType::primitive(PrimitiveKind::String)
    );
}

#[test]
fn test_rebuild_replaces_published_registry() {
    let loader = TypeLoader::default();
    let first = loader
        .rebuild(&[SourceUnit::jschema("ns.A", r#"{"x": "int"}"#)])
        .unwrap();
    let second = loader
        .rebuild(&[SourceUnit::jschema("ns.B", r#"{"y": "int"}"#)])
        .unwrap();

    assert!(first.contains("ns.A"));
    assert!(!second.contains("ns.A"));
    assert_eq!(second.generation(), 2);
    assert_eq!(loader.registry().generation(), 2);
}

// ============================================================================
// Models and instances
// ============================================================================

#[test]
fn test_models_and_instances() {
    let dir = schema_dir();
    let registry = TypeLoader::default().rebuild_from_dir(dir.path()).unwrap();

    let generator = ModelGenerator::new(&registry);
    let order_model = generator.model_for("acme.shop.Order").unwrap();
    assert_eq!(
        order_model.property("total").unwrap().auto_create,
        AutoCreate::EmptyMap
    );
    assert_eq!(
        order_model.property("status").unwrap().auto_create,
        AutoCreate::None
    );
    let lines_model = generator.model_for("acme.shop.Order.lines").unwrap();
    assert_eq!(
        lines_model.method(MethodKind::Parent).unwrap().return_type,
        "acme.shop.Order"
    );
    let status_model = generator.model_for("acme.shop.Order.status").unwrap();
    assert!(status_model.property("IN_TRANSIT").is_some());

    let runtime = Runtime::new(registry.clone());
    let order = runtime.new_instance("acme.shop.Order").unwrap();
    runtime.set_property(&order, "id", Value::from(7i64)).unwrap();
    let total = runtime.get_property(&order, "total").unwrap().unwrap();
    total.as_map().unwrap().put("amount", Value::from(12i64)).unwrap();

    assert_eq!(
        runtime.write(&order).unwrap(),
        r#"{"id":7,"total":{"amount":12}}"#
    );
    assert!(runtime
        .parent(total.as_map().unwrap())
        .unwrap()
        .ptr_eq(&order));
}

#[test]
fn test_round_trip() {
    let text = r#"{"b": [1, 2.5, {"c": null}], "a": "x\ny", "d": true}"#;
    let first = parse_document(text).into_result().unwrap();
    let compact = serialize(&first, None).unwrap();
    let pretty = serialize(&first, Some(3)).unwrap();

    assert_eq!(compact, r#"{"b":[1,2.5,{"c":null}],"a":"x\ny","d":true}"#);
    assert_eq!(parse_document(&compact).into_result().unwrap(), first);
    assert_eq!(parse_document(&pretty).into_result().unwrap(), first);
}

// ============================================================================
// Fetching
// ============================================================================

#[tokio::test]
async fn test_fetch_with_configured_client() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"[[{"id": 1, "status": "open", "lines": [{"sku": "a"}]}]]"#),
        )
        .mount(&mock_server)
        .await;

    let dir = schema_dir();
    let config = LoaderConfig::from_yaml("http:\n  max_retries: 0\n").unwrap();
    let client = HttpClient::with_config(config.http.to_client_config()).unwrap();
    let registry = TypeLoader::new(config).rebuild_from_dir(dir.path()).unwrap();
    let runtime = Runtime::new(registry);

    let args: ValueMap = [("page".to_string(), json!(2))].into_iter().collect();
    let orders = runtime
        .get(
            &client,
            "acme.shop.Orders",
            &format!("{}/orders", mock_server.uri()),
            Some(&args),
        )
        .await
        .unwrap();

    let outer = orders.as_list().unwrap();
    let inner = outer.get(0).unwrap();
    let order = inner.as_list().unwrap().get(0).unwrap();
    let order = order.as_map().unwrap();
    assert_eq!(order.type_name().as_deref(), Some("acme.shop.Order"));

    let line = runtime
        .descendents(order)
        .next()
        .expect("one line");
    assert_eq!(line.type_name().as_deref(), Some("acme.shop.Order.lines"));
}

#[tokio::test]
async fn test_fetch_failure_reaches_caller() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&mock_server)
        .await;

    let registry = TypeLoader::default()
        .rebuild(&[SourceUnit::jschema("acme.Order", r#"{"id": "int"}"#)])
        .unwrap();
    let runtime = Runtime::new(registry);
    let client = HttpClient::new().unwrap();

    let err = runtime
        .post(
            &client,
            "acme.Order",
            &format!("{}/orders", mock_server.uri()),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 400, .. }));
}
