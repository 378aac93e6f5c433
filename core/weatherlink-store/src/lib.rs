//! Node storage for the weather responder link.
//!
//! The link publishes its data as a tree of addressable, typed nodes. This
//! crate defines the store boundary the synchronizer writes through
//! ([`NodeStore`]) and an in-memory tree implementing it ([`NodeTree`]).
//!
//! # Architecture
//!
//! - Static nodes are registered once at startup and are reserved: dynamic
//!   publishing can never overwrite them
//! - Dynamic nodes are created on first upsert and updated in place
//! - Writable static nodes accept typed writes from clients

mod error;
mod node;
mod node_store;
mod node_tree;

pub use error::{StoreError, StoreResult};
pub use node::{ActionSpec, Column, Node, NodeOrigin, NodeSpec};
pub use node_store::NodeStore;
pub use node_tree::NodeTree;
