//! The durable window-state contract and its built-in backends.
//
//! The engine treats persistence as an opaque key-value contract over
//! `(FeatureKind, InstanceId)`. Schema and migration concerns belong to
//! the backend; the engine only reads and writes plain record sets.

mod json;
mod memory;
pub mod writer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::WindowGeometry;
use crate::instance::{FeatureKind, InstanceId};
use crate::opening::Opening;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Everything persisted for one overlay instance. An instance is
/// durably "active" exactly as long as its record exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<WindowGeometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openings: Option<Vec<Opening>>,
}

/// Durable key-value store of per-instance window state.
///
/// Writes merge into the instance record: committing geometry leaves a
/// previously committed opening collection intact and vice versa.
/// `list_active` drives crash recovery and must reflect every record
/// that survived the last process.
#[async_trait]
pub trait WindowStateStore: Send + Sync {
    async fn get_state(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
    ) -> Result<Option<InstanceState>, StoreError>;

    async fn put_geometry(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
        geometry: WindowGeometry,
    ) -> Result<(), StoreError>;

    async fn put_openings(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
        openings: &[Opening],
    ) -> Result<(), StoreError>;

    async fn delete_state(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
    ) -> Result<(), StoreError>;

    /// Instance ids with a durable record, ascending.
    async fn list_active(&self, kind: FeatureKind) -> Result<Vec<InstanceId>, StoreError>;
}
