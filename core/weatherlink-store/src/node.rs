//! Node definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use weatherlink_types::{NodePath, Value, ValueType};

/// How a node came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeOrigin {
    /// Registered at startup; reserved against dynamic publishing.
    Static,
    /// Created by an upsert from the synchronizer.
    Dynamic,
}

/// A named, typed column of an action's parameters or results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub value_type: ValueType,
}

impl Column {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// Declares an invokable action on a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub params: Vec<Column>,
    pub columns: Vec<Column>,
}

impl ActionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input parameter.
    pub fn with_param(mut self, column: Column) -> Self {
        self.params.push(column);
        self
    }

    /// Adds a result column.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }
}

/// A node stored in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub path: NodePath,
    pub display_name: String,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub writable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionSpec>,
    pub origin: NodeOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Builder for a static node registered with [`crate::NodeTree::register`].
#[derive(Debug, Clone)]
pub struct NodeSpec {
    path: NodePath,
    display_name: Option<String>,
    value_type: ValueType,
    value: Option<Value>,
    writable: bool,
    action: Option<ActionSpec>,
}

impl NodeSpec {
    /// Starts a spec for a string node at `path`.
    pub fn new(path: NodePath) -> Self {
        Self {
            path,
            display_name: None,
            value_type: ValueType::String,
            value: None,
            writable: false,
            action: None,
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Sets the initial value and the declared type with it.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.value_type = value.value_type();
        self.value = Some(value);
        self
    }

    pub fn writable(mut self) -> Self {
        self.writable = true;
        self
    }

    pub fn action(mut self, action: ActionSpec) -> Self {
        self.action = Some(action);
        self
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub(crate) fn into_node(self) -> Node {
        let display_name = self
            .display_name
            .or_else(|| self.path.name().map(str::to_string))
            .unwrap_or_default();
        let updated_at = self.value.as_ref().map(|_| Utc::now());
        Node {
            path: self.path,
            display_name,
            value_type: self.value_type,
            value: self.value,
            writable: self.writable,
            action: self.action,
            origin: NodeOrigin::Static,
            updated_at,
        }
    }
}
