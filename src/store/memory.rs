//! In-memory store backend for tests and embedders that persist
//! elsewhere.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{InstanceState, StoreError, WindowStateStore};
use crate::geometry::WindowGeometry;
use crate::instance::{FeatureKind, InstanceId};
use crate::opening::Opening;

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<(FeatureKind, InstanceId), InstanceState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct read of one record, bypassing the trait's `Result`
    /// plumbing; this backend cannot fail.
    pub async fn snapshot(&self, kind: FeatureKind, instance: InstanceId) -> Option<InstanceState> {
        self.records.read().await.get(&(kind, instance)).cloned()
    }
}

#[async_trait]
impl WindowStateStore for MemoryStore {
    async fn get_state(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
    ) -> Result<Option<InstanceState>, StoreError> {
        Ok(self.snapshot(kind, instance).await)
    }

    async fn put_geometry(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
        geometry: WindowGeometry,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.entry((kind, instance)).or_default().geometry = Some(geometry);
        Ok(())
    }

    async fn put_openings(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
        openings: &[Opening],
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.entry((kind, instance)).or_default().openings = Some(openings.to_vec());
        Ok(())
    }

    async fn delete_state(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
    ) -> Result<(), StoreError> {
        self.records.write().await.remove(&(kind, instance));
        Ok(())
    }

    async fn list_active(&self, kind: FeatureKind) -> Result<Vec<InstanceId>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .keys()
            .filter(|(record_kind, _)| *record_kind == kind)
            .map(|(_, instance)| *instance)
            .collect())
    }
}
