//! The responder link: static nodes, client writes and the poll lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use weatherlink_store::{ActionSpec, Column, Node, NodeSpec, NodeTree, StoreResult};
use weatherlink_sync::{
    Fetcher, FieldSynchronizer, HttpFetcher, PollScheduler, SchedulerStatus, SyncResult,
    TaskScheduler, TokioTimer,
};
use weatherlink_types::{NodePath, Value, ValueType};

use crate::config::LinkConfig;

pub const SDK_VERSION_PATH: &str = "/sdk version";
pub const SET_TEXT_PATH: &str = "/set_text";
const SET_TEXT_FAILED: &str = "Could not set value";

/// Parameters of the `set_text` action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTextParams {
    #[serde(rename = "String", default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Result row of the `set_text` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTextResult {
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "Message")]
    pub message: String,
}

impl SetTextResult {
    fn failed() -> Self {
        Self {
            success: false,
            message: SET_TEXT_FAILED.to_string(),
        }
    }
}

/// Snapshot reported by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LinkStatus {
    pub name: String,
    pub version: &'static str,
    pub connected: bool,
    pub started_at: DateTime<Utc>,
    pub nodes: usize,
    pub scheduler: SchedulerStatus,
}

pub struct Link {
    name: String,
    tree: Arc<NodeTree>,
    scheduler: PollScheduler,
    raw_node_path: NodePath,
    sdk_version_path: NodePath,
    set_text_path: NodePath,
    connected: AtomicBool,
    started_at: DateTime<Utc>,
}

impl Link {
    pub fn new(
        config: &LinkConfig,
        fetcher: Arc<dyn Fetcher>,
        timer: Arc<dyn TaskScheduler>,
    ) -> SyncResult<Self> {
        let settings = config.source.settings()?;
        let tree = Arc::new(NodeTree::new());
        let synchronizer = FieldSynchronizer::new(fetcher, tree.clone(), &settings);
        let scheduler = PollScheduler::new(
            synchronizer,
            timer,
            settings.initial_delay,
            settings.poll_interval,
        );
        Ok(Self {
            name: config.name.clone(),
            tree,
            scheduler,
            raw_node_path: settings.raw_node_path,
            sdk_version_path: NodePath::parse(SDK_VERSION_PATH)?,
            set_text_path: NodePath::parse(SET_TEXT_PATH)?,
            connected: AtomicBool::new(false),
            started_at: Utc::now(),
        })
    }

    /// Builds a link that fetches over HTTP on the current tokio runtime.
    pub fn from_config(config: &LinkConfig) -> SyncResult<Self> {
        let timeout = config.source.request_timeout_secs.map(std::time::Duration::from_secs);
        let fetcher = Arc::new(HttpFetcher::new(timeout)?);
        let timer = Arc::new(TokioTimer::current()?);
        Self::new(config, fetcher, timer)
    }

    /// Registers the static nodes. Call once, before connecting.
    pub async fn initialize(&self) -> StoreResult<()> {
        let specs = [
            NodeSpec::new(self.sdk_version_path.clone())
                .display_name("SDK Version")
                .value(env!("CARGO_PKG_VERSION")),
            NodeSpec::new(self.raw_node_path.clone())
                .value_type(ValueType::String)
                .writable(),
            NodeSpec::new(self.set_text_path.clone()).action(
                ActionSpec::new()
                    .with_param(Column::new("String", ValueType::String))
                    .with_column(Column::new("Success", ValueType::Bool))
                    .with_column(Column::new("Message", ValueType::String)),
            ),
        ];
        for spec in specs {
            let path = spec.path().clone();
            self.tree.register(spec).await?;
            debug!("Created path {path}");
        }
        info!("{} initialized with {} static nodes", self.name, self.tree.len().await);
        Ok(())
    }

    /// The broker connection came up; starts polling.
    pub fn connected(&self) {
        info!("{} connected", self.name);
        self.connected.store(true, Ordering::SeqCst);
        self.scheduler.on_connected();
    }

    /// The broker connection went away; stops polling.
    pub fn disconnected(&self) {
        info!("{} disconnected", self.name);
        self.connected.store(false, Ordering::SeqCst);
        self.scheduler.on_disconnected();
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Writes a client value into a writable node.
    pub async fn write_node(&self, path: &NodePath, value: Value) -> StoreResult<Node> {
        let node = self.tree.write(path, value).await?;
        if let Some(value) = &node.value {
            info!("Set {} to {}", path, value);
        }
        Ok(node)
    }

    /// Invokes the `set_text` action: stores the text in the raw document node.
    pub async fn set_text(&self, params: &SetTextParams) -> SetTextResult {
        let Some(text) = params.text.clone() else {
            warn!("set_text called without a String parameter");
            return SetTextResult::failed();
        };
        match self
            .write_node(&self.raw_node_path, Value::String(text.clone()))
            .await
        {
            Ok(_) => SetTextResult {
                success: true,
                message: text,
            },
            Err(e) => {
                warn!("set_text failed: {e}");
                SetTextResult::failed()
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tree(&self) -> &Arc<NodeTree> {
        &self.tree
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn raw_node_path(&self) -> &NodePath {
        &self.raw_node_path
    }

    pub async fn status(&self) -> LinkStatus {
        LinkStatus {
            name: self.name.clone(),
            version: env!("CARGO_PKG_VERSION"),
            connected: self.is_connected(),
            started_at: self.started_at,
            nodes: self.tree.len().await,
            scheduler: self.scheduler.status(),
        }
    }
}
