//! Field synchronizer: one fetch, decode and publish pass.

use crate::config::SourceSettings;
use crate::decode::{FieldRecord, ScalarDecoder};
use crate::error::SyncResult;
use crate::fetch::Fetcher;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use weatherlink_store::NodeStore;
use weatherlink_types::NodePath;

/// Outcome of a successful pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Whether the raw body reached the raw document node.
    pub raw_published: bool,
    /// Fields upserted into the store.
    pub published: usize,
    /// Unsupported fields dropped.
    pub skipped: usize,
    /// Names of fields the store rejected.
    pub failed: Vec<String>,
}

/// Keeps the store's field nodes in line with the upstream document.
pub struct FieldSynchronizer {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn NodeStore>,
    decoder: ScalarDecoder,
    url: String,
    node_root: NodePath,
    raw_node_path: NodePath,
}

impl FieldSynchronizer {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn NodeStore>,
        settings: &SourceSettings,
    ) -> Self {
        Self {
            fetcher,
            store,
            decoder: ScalarDecoder::new(&settings.fields_pointer),
            url: settings.url.clone(),
            node_root: settings.node_root.clone(),
            raw_node_path: settings.raw_node_path.clone(),
        }
    }

    pub fn raw_node_path(&self) -> &NodePath {
        &self.raw_node_path
    }

    /// Runs one pass.
    ///
    /// Returns `SyncError::FetchFailed` if the document could not be
    /// fetched; the store is not touched in that case. Store rejections
    /// are reported per field and never abort the pass.
    pub async fn sync_once(&self) -> SyncResult<SyncReport> {
        let body = self.fetcher.fetch(&self.url).await?;
        let mut report = SyncReport::default();

        match self.store.set_raw_value(&self.raw_node_path, &body).await {
            Ok(()) => report.raw_published = true,
            Err(e) => warn!("Failed to publish raw document to {}: {}", self.raw_node_path, e),
        }

        for FieldRecord { name, value } in self.decoder.decode(&body) {
            let Some(value) = value.into_node_value() else {
                debug!("Skipping unsupported field {name:?}");
                report.skipped += 1;
                continue;
            };

            let path = match self.node_root.child(&name) {
                Ok(path) => path,
                Err(e) => {
                    warn!("No node path for field {name:?}: {e}");
                    report.failed.push(name);
                    continue;
                }
            };

            match self.store.upsert_node(&path, &name, value).await {
                Ok(()) => report.published += 1,
                Err(e) => {
                    warn!("Failed to publish field {name:?} to {path}: {e}");
                    report.failed.push(name);
                }
            }
        }

        info!(
            "Synchronized {} fields ({} skipped, {} failed)",
            report.published,
            report.skipped,
            report.failed.len()
        );
        Ok(report)
    }
}
