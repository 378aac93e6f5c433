use pretty_assertions::assert_eq;
use weatherlink_store::{ActionSpec, Column, NodeOrigin, NodeSpec, NodeStore, NodeTree, StoreError};
use weatherlink_types::{NodePath, Value, ValueType};

fn path(s: &str) -> NodePath {
    NodePath::parse(s).unwrap()
}

async fn tree_with_static_nodes() -> NodeTree {
    let tree = NodeTree::new();
    tree.register(
        NodeSpec::new(path("/sdk version"))
            .display_name("SDK Version")
            .value("0.3.0"),
    )
    .await
    .unwrap();
    tree.register(
        NodeSpec::new(path("/OpenWeatherData"))
            .display_name("OpenWeatherData")
            .value_type(ValueType::String)
            .writable(),
    )
    .await
    .unwrap();
    tree.register(
        NodeSpec::new(path("/set_text")).display_name("Set Text").action(
            ActionSpec::new()
                .with_param(Column::new("String", ValueType::String))
                .with_column(Column::new("Success", ValueType::Bool)),
        ),
    )
    .await
    .unwrap();
    tree
}

// ── Registration ────────────────────────────────────────────────

#[tokio::test]
async fn register_static_nodes() {
    let tree = tree_with_static_nodes().await;
    assert_eq!(tree.len().await, 3);

    let sdk = tree.get(&path("/sdk version")).await.unwrap();
    assert_eq!(sdk.display_name, "SDK Version");
    assert_eq!(sdk.value, Some(Value::from("0.3.0")));
    assert_eq!(sdk.origin, NodeOrigin::Static);
    assert!(!sdk.writable);
    assert!(sdk.updated_at.is_some());

    let raw = tree.get(&path("/OpenWeatherData")).await.unwrap();
    assert!(raw.writable);
    assert_eq!(raw.value, None);
    assert_eq!(raw.updated_at, None);
}

#[tokio::test]
async fn register_duplicate_fails() {
    let tree = NodeTree::new();
    tree.register(NodeSpec::new(path("/a"))).await.unwrap();
    let err = tree.register(NodeSpec::new(path("/a"))).await.unwrap_err();
    assert_eq!(err, StoreError::AlreadyExists("/a".into()));
}

#[tokio::test]
async fn display_name_defaults_to_path_name() {
    let tree = NodeTree::new();
    tree.register(NodeSpec::new(path("/status"))).await.unwrap();
    assert_eq!(tree.get(&path("/status")).await.unwrap().display_name, "status");
}

#[tokio::test]
async fn list_is_path_ordered() {
    let tree = tree_with_static_nodes().await;
    let paths: Vec<String> = tree
        .list()
        .await
        .into_iter()
        .map(|n| n.path.to_string())
        .collect();
    assert_eq!(paths, vec!["/OpenWeatherData", "/sdk version", "/set_text"]);
}

// ── Upsert ──────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_creates_dynamic_node() {
    let tree = NodeTree::new();
    tree.upsert_node(&path("/temp"), "temp", Value::Number(285.35))
        .await
        .unwrap();

    let node = tree.get(&path("/temp")).await.unwrap();
    assert_eq!(node.display_name, "temp");
    assert_eq!(node.value_type, ValueType::Number);
    assert_eq!(node.value, Some(Value::Number(285.35)));
    assert_eq!(node.origin, NodeOrigin::Dynamic);
    assert!(!node.writable);
}

#[tokio::test]
async fn upsert_updates_value_and_type() {
    let tree = NodeTree::new();
    let p = path("/pressure");
    tree.upsert_node(&p, "pressure", Value::Int(1021)).await.unwrap();
    tree.upsert_node(&p, "pressure", Value::Number(1021.5)).await.unwrap();

    let node = tree.get(&p).await.unwrap();
    assert_eq!(node.value_type, ValueType::Number);
    assert_eq!(node.value, Some(Value::Number(1021.5)));
    assert_eq!(tree.len().await, 1);
}

#[tokio::test]
async fn upsert_same_value_is_idempotent() {
    let tree = NodeTree::new();
    let p = path("/humidity");
    tree.upsert_node(&p, "humidity", Value::Int(58)).await.unwrap();
    let first = tree.get(&p).await.unwrap();
    tree.upsert_node(&p, "humidity", Value::Int(58)).await.unwrap();
    let second = tree.get(&p).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn upsert_keeps_original_display_name() {
    let tree = NodeTree::new();
    let p = path("/temp");
    tree.upsert_node(&p, "temp", Value::Int(1)).await.unwrap();
    tree.upsert_node(&p, "other", Value::Int(2)).await.unwrap();
    assert_eq!(tree.get(&p).await.unwrap().display_name, "temp");
}

#[tokio::test]
async fn upsert_static_node_is_reserved() {
    let tree = tree_with_static_nodes().await;
    let err = tree
        .upsert_node(&path("/set_text"), "set_text", Value::Int(1))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::Reserved("/set_text".into()));
}

// ── Raw value ───────────────────────────────────────────────────

#[tokio::test]
async fn raw_value_goes_into_static_string_node() {
    let tree = tree_with_static_nodes().await;
    let p = path("/OpenWeatherData");
    tree.set_raw_value(&p, br#"{"main":{}}"#).await.unwrap();

    let node = tree.get(&p).await.unwrap();
    assert_eq!(node.value, Some(Value::from(r#"{"main":{}}"#)));
    assert_eq!(node.origin, NodeOrigin::Static);
}

#[tokio::test]
async fn raw_value_creates_missing_node() {
    let tree = NodeTree::new();
    let p = path("/raw%2Fbody");
    tree.set_raw_value(&p, b"hello").await.unwrap();

    let node = tree.get(&p).await.unwrap();
    assert_eq!(node.display_name, "raw/body");
    assert_eq!(node.value, Some(Value::from("hello")));
}

#[tokio::test]
async fn raw_value_lossy_utf8() {
    let tree = NodeTree::new();
    let p = path("/raw");
    tree.set_raw_value(&p, &[0x61, 0xff, 0x62]).await.unwrap();
    assert_eq!(
        tree.get(&p).await.unwrap().value,
        Some(Value::from("a\u{FFFD}b"))
    );
}

#[tokio::test]
async fn raw_value_into_action_is_reserved() {
    let tree = tree_with_static_nodes().await;
    let err = tree
        .set_raw_value(&path("/set_text"), b"x")
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::Reserved("/set_text".into()));
}

#[tokio::test]
async fn raw_value_into_non_string_node_fails() {
    let tree = NodeTree::new();
    let p = path("/count");
    tree.upsert_node(&p, "count", Value::Int(3)).await.unwrap();
    let err = tree.set_raw_value(&p, b"4").await.unwrap_err();
    assert!(matches!(err, StoreError::TypeMismatch { .. }));
}

// ── Writes ──────────────────────────────────────────────────────

#[tokio::test]
async fn write_to_writable_node() {
    let tree = tree_with_static_nodes().await;
    let node = tree
        .write(&path("/OpenWeatherData"), Value::from("hello"))
        .await
        .unwrap();
    assert_eq!(node.value, Some(Value::from("hello")));
    assert!(node.updated_at.is_some());
}

#[tokio::test]
async fn write_to_read_only_node_fails() {
    let tree = tree_with_static_nodes().await;
    let err = tree
        .write(&path("/sdk version"), Value::from("9.9.9"))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::NotWritable("/sdk version".into()));
}

#[tokio::test]
async fn write_wrong_type_fails() {
    let tree = tree_with_static_nodes().await;
    let err = tree
        .write(&path("/OpenWeatherData"), Value::Int(1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::TypeMismatch {
            path: "/OpenWeatherData".into(),
            expected: ValueType::String,
            actual: ValueType::Int,
        }
    );
}

#[tokio::test]
async fn write_missing_node_fails() {
    let tree = NodeTree::new();
    let err = tree.write(&path("/nope"), Value::Int(1)).await.unwrap_err();
    assert_eq!(err, StoreError::NotFound("/nope".into()));
}

// ── Serialization ───────────────────────────────────────────────

#[tokio::test]
async fn node_serializes_with_bare_value() {
    let tree = NodeTree::new();
    tree.upsert_node(&path("/humidity"), "humidity", Value::Int(58))
        .await
        .unwrap();
    let node = tree.get(&path("/humidity")).await.unwrap();
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["path"], "/humidity");
    assert_eq!(json["value_type"], "int");
    assert_eq!(json["value"], 58);
    assert_eq!(json["origin"], "dynamic");
    assert!(json.get("action").is_none());
}
