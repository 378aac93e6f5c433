//! In-memory node tree.

use crate::error::{StoreError, StoreResult};
use crate::node::{Node, NodeOrigin, NodeSpec};
use crate::node_store::NodeStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;
use weatherlink_types::{NodePath, Value, ValueType, decode_segment};

/// Node tree keyed by path, ordered for stable listings.
#[derive(Debug, Default)]
pub struct NodeTree {
    nodes: RwLock<BTreeMap<NodePath, Node>>,
}

impl NodeTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a static node.
    pub async fn register(&self, spec: NodeSpec) -> StoreResult<()> {
        let mut nodes = self.nodes.write().await;
        if nodes.contains_key(spec.path()) {
            return Err(StoreError::AlreadyExists(spec.path().to_string()));
        }
        let node = spec.into_node();
        debug!("Registered node {} ({})", node.path, node.value_type);
        nodes.insert(node.path.clone(), node);
        Ok(())
    }

    /// Returns a copy of the node at `path`.
    pub async fn get(&self, path: &NodePath) -> Option<Node> {
        self.nodes.read().await.get(path).cloned()
    }

    /// Returns copies of all nodes in path order.
    pub async fn list(&self) -> Vec<Node> {
        self.nodes.read().await.values().cloned().collect()
    }

    /// Number of nodes in the tree.
    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }

    /// Writes a client-supplied value into a writable node.
    pub async fn write(&self, path: &NodePath, value: Value) -> StoreResult<Node> {
        let mut nodes = self.nodes.write().await;
        let node = nodes
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        if !node.writable {
            return Err(StoreError::NotWritable(path.to_string()));
        }
        check_type(node, &value)?;
        node.value = Some(value);
        node.updated_at = Some(Utc::now());
        debug!("Wrote node {}", path);
        Ok(node.clone())
    }
}

fn check_type(node: &Node, value: &Value) -> StoreResult<()> {
    if node.value_type != value.value_type() {
        return Err(StoreError::TypeMismatch {
            path: node.path.to_string(),
            expected: node.value_type,
            actual: value.value_type(),
        });
    }
    Ok(())
}

/// Replaces the node's value, bumping the timestamp only on change.
fn replace_value(node: &mut Node, value: Value) -> bool {
    let changed = node.value.as_ref() != Some(&value) || node.value_type != value.value_type();
    if changed {
        node.value_type = value.value_type();
        node.value = Some(value);
        node.updated_at = Some(Utc::now());
    }
    changed
}

fn dynamic_node(path: &NodePath, display_name: String, value: Value) -> Node {
    Node {
        path: path.clone(),
        display_name,
        value_type: value.value_type(),
        value: Some(value),
        writable: false,
        action: None,
        origin: NodeOrigin::Dynamic,
        updated_at: Some(Utc::now()),
    }
}

#[async_trait]
impl NodeStore for NodeTree {
    async fn upsert_node(
        &self,
        path: &NodePath,
        display_name: &str,
        value: Value,
    ) -> StoreResult<()> {
        let mut nodes = self.nodes.write().await;
        match nodes.get_mut(path) {
            Some(node) if node.origin == NodeOrigin::Static => {
                Err(StoreError::Reserved(path.to_string()))
            }
            Some(node) => {
                if replace_value(node, value) {
                    debug!("Updated node {} ({})", path, node.value_type);
                }
                Ok(())
            }
            None => {
                let node = dynamic_node(path, display_name.to_string(), value);
                debug!("Created node {} ({})", path, node.value_type);
                nodes.insert(path.clone(), node);
                Ok(())
            }
        }
    }

    async fn set_raw_value(&self, path: &NodePath, bytes: &[u8]) -> StoreResult<()> {
        let value = Value::String(String::from_utf8_lossy(bytes).into_owned());
        let mut nodes = self.nodes.write().await;
        match nodes.get_mut(path) {
            Some(node) if node.action.is_some() => Err(StoreError::Reserved(path.to_string())),
            Some(node) if node.value_type != ValueType::String => Err(StoreError::TypeMismatch {
                path: path.to_string(),
                expected: node.value_type,
                actual: ValueType::String,
            }),
            Some(node) => {
                replace_value(node, value);
                debug!("Set raw value of {} ({} bytes)", path, bytes.len());
                Ok(())
            }
            None => {
                let display_name = path
                    .name()
                    .map(|name| decode_segment(name).unwrap_or_else(|_| name.to_string()))
                    .unwrap_or_default();
                nodes.insert(path.clone(), dynamic_node(path, display_name, value));
                debug!("Created raw node {} ({} bytes)", path, bytes.len());
                Ok(())
            }
        }
    }
}
