//! Store boundary used by the synchronizer.

use crate::error::StoreResult;
use async_trait::async_trait;
use weatherlink_types::{NodePath, Value};

/// A key/value node store that dynamic fields are published into.
///
/// Both operations are idempotent: repeating a call with identical
/// arguments leaves the store in the same state.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Creates the node at `path` if absent, otherwise replaces its value
    /// and declared type. The declared type is `value.value_type()`.
    async fn upsert_node(
        &self,
        path: &NodePath,
        display_name: &str,
        value: Value,
    ) -> StoreResult<()>;

    /// Publishes a raw document body as the string value of `path`.
    async fn set_raw_value(&self, path: &NodePath, bytes: &[u8]) -> StoreResult<()>;
}
