//! Single-document JSON store backend with atomic replace.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{InstanceState, StoreError, WindowStateStore};
use crate::geometry::WindowGeometry;
use crate::instance::{FeatureKind, InstanceId};
use crate::opening::Opening;

#[derive(Debug, Serialize, Deserialize)]
struct InstanceRow {
    kind: FeatureKind,
    instance: InstanceId,
    #[serde(flatten)]
    state: InstanceState,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    instances: Vec<InstanceRow>,
}

/// Durable [`WindowStateStore`] over one JSON file.
///
/// The whole document is held in memory and rewritten on every commit
/// through a temp file in the same directory, so a crash mid-write can
/// never leave a torn document behind.
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<BTreeMap<(FeatureKind, InstanceId), InstanceState>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading any existing document. A
    /// missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match std::fs::read(&path) {
            Ok(bytes) => {
                let document: StoreDocument = serde_json::from_slice(&bytes)?;
                document
                    .instances
                    .into_iter()
                    .map(|row| ((row.kind, row.instance), row.state))
                    .collect()
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, records: &BTreeMap<(FeatureKind, InstanceId), InstanceState>) -> Result<(), StoreError> {
        let document = StoreDocument {
            instances: records
                .iter()
                .map(|(&(kind, instance), state)| InstanceRow {
                    kind,
                    instance,
                    state: state.clone(),
                })
                .collect(),
        };
        let json = serde_json::to_vec_pretty(&document)?;
        let directory = self.path.parent().unwrap_or_else(|| Path::new("."));
        let temp = tempfile::NamedTempFile::new_in(directory)?;
        std::fs::write(temp.path(), &json)?;
        temp.persist(&self.path)
            .map_err(|err| StoreError::Io(err.error))?;
        Ok(())
    }
}

#[async_trait]
impl WindowStateStore for JsonFileStore {
    async fn get_state(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
    ) -> Result<Option<InstanceState>, StoreError> {
        Ok(self.records.lock().await.get(&(kind, instance)).cloned())
    }

    async fn put_geometry(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
        geometry: WindowGeometry,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        records.entry((kind, instance)).or_default().geometry = Some(geometry);
        self.save(&records)
    }

    async fn put_openings(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
        openings: &[Opening],
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        records.entry((kind, instance)).or_default().openings = Some(openings.to_vec());
        self.save(&records)
    }

    async fn delete_state(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        if records.remove(&(kind, instance)).is_some() {
            self.save(&records)?;
        }
        Ok(())
    }

    async fn list_active(&self, kind: FeatureKind) -> Result<Vec<InstanceId>, StoreError> {
        Ok(self
            .records
            .lock()
            .await
            .keys()
            .filter(|(record_kind, _)| *record_kind == kind)
            .map(|(_, instance)| *instance)
            .collect())
    }
}
