//! Background commit workers feeding the durable store.
//
//! The UI-bound surfaces never wait on storage: controllers and opening
//! sets enqueue commits here and return immediately. Commits for one
//! instance always land on the same lane, so they are applied in order,
//! while different instances proceed concurrently across lanes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::WindowStateStore;
use crate::geometry::WindowGeometry;
use crate::instance::{FeatureKind, InstanceId};
use crate::opening::{CommittedOpenings, Opening, OpeningPublisher};

enum Job {
    Geometry {
        kind: FeatureKind,
        instance: InstanceId,
        geometry: WindowGeometry,
    },
    Openings {
        kind: FeatureKind,
        instance: InstanceId,
        revision: u64,
        openings: Vec<Opening>,
        publisher: OpeningPublisher,
    },
    Barrier(oneshot::Sender<()>),
}

/// Cheaply cloneable handle to the commit worker pool.
///
/// A failed write is never surfaced to the caller: it is logged,
/// remembered per instance, and flushed on the next successful commit
/// opportunity for that instance. A newer commit for the same field
/// simply supersedes the remembered one.
#[derive(Clone)]
pub struct StateWriter {
    lanes: Arc<Vec<mpsc::UnboundedSender<Job>>>,
}

impl StateWriter {
    /// Start `lanes` worker tasks over the store. Must be called from
    /// within a tokio runtime.
    pub fn spawn(store: Arc<dyn WindowStateStore>, lanes: usize) -> Self {
        let senders = (0..lanes.max(1))
            .map(|lane| {
                let (sender, receiver) = mpsc::unbounded_channel();
                tokio::spawn(run_lane(lane, store.clone(), receiver));
                sender
            })
            .collect();
        Self {
            lanes: Arc::new(senders),
        }
    }

    fn lane(&self, instance: InstanceId) -> &mpsc::UnboundedSender<Job> {
        &self.lanes[instance as usize % self.lanes.len()]
    }

    pub fn commit_geometry(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
        geometry: WindowGeometry,
    ) {
        let job = Job::Geometry {
            kind,
            instance,
            geometry,
        };
        if self.lane(instance).send(job).is_err() {
            tracing::warn!(%kind, instance, "commit lane gone, geometry commit dropped");
        }
    }

    pub fn commit_openings(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
        revision: u64,
        openings: Vec<Opening>,
        publisher: OpeningPublisher,
    ) {
        let job = Job::Openings {
            kind,
            instance,
            revision,
            openings,
            publisher,
        };
        if self.lane(instance).send(job).is_err() {
            tracing::warn!(%kind, instance, revision, "commit lane gone, opening commit dropped");
        }
    }

    /// Wait until every commit enqueued before this call has been
    /// processed on all lanes.
    pub async fn drain(&self) {
        for lane in self.lanes.iter() {
            let (sender, receiver) = oneshot::channel();
            if lane.send(Job::Barrier(sender)).is_ok() {
                let _ = receiver.await;
            }
        }
    }
}

#[derive(Default)]
struct Pending {
    geometry: Option<WindowGeometry>,
    openings: Option<(u64, Vec<Opening>, OpeningPublisher)>,
}

async fn run_lane(
    lane: usize,
    store: Arc<dyn WindowStateStore>,
    mut receiver: mpsc::UnboundedReceiver<Job>,
) {
    let mut pending: HashMap<(FeatureKind, InstanceId), Pending> = HashMap::new();
    while let Some(job) = receiver.recv().await {
        match job {
            Job::Barrier(ack) => {
                let _ = ack.send(());
            }
            Job::Geometry {
                kind,
                instance,
                geometry,
            } => {
                let key = (kind, instance);
                // This write supersedes any remembered failed geometry.
                pending.entry(key).or_default().geometry = None;
                match store.put_geometry(kind, instance, geometry).await {
                    Ok(()) => flush_pending_openings(&store, &mut pending, key).await,
                    Err(err) => {
                        tracing::warn!(
                            %kind, instance, lane, error = %err,
                            "geometry commit failed, deferring to next opportunity"
                        );
                        pending.entry(key).or_default().geometry = Some(geometry);
                    }
                }
            }
            Job::Openings {
                kind,
                instance,
                revision,
                openings,
                publisher,
            } => {
                let key = (kind, instance);
                pending.entry(key).or_default().openings = None;
                match store.put_openings(kind, instance, &openings).await {
                    Ok(()) => {
                        publisher.publish(CommittedOpenings {
                            instance,
                            revision,
                            openings,
                        });
                        flush_pending_geometry(&store, &mut pending, key).await;
                    }
                    Err(err) => {
                        tracing::warn!(
                            %kind, instance, revision, lane, error = %err,
                            "opening commit failed, deferring to next opportunity"
                        );
                        pending.entry(key).or_default().openings =
                            Some((revision, openings, publisher));
                    }
                }
            }
        }
    }
}

async fn flush_pending_geometry(
    store: &Arc<dyn WindowStateStore>,
    pending: &mut HashMap<(FeatureKind, InstanceId), Pending>,
    key: (FeatureKind, InstanceId),
) {
    let Some(geometry) = pending.get_mut(&key).and_then(|p| p.geometry.take()) else {
        return;
    };
    let (kind, instance) = key;
    match store.put_geometry(kind, instance, geometry).await {
        Ok(()) => {
            tracing::debug!(%kind, instance, "deferred geometry commit flushed");
        }
        Err(err) => {
            tracing::warn!(%kind, instance, error = %err, "deferred geometry commit failed again");
            pending.entry(key).or_default().geometry = Some(geometry);
        }
    }
}

async fn flush_pending_openings(
    store: &Arc<dyn WindowStateStore>,
    pending: &mut HashMap<(FeatureKind, InstanceId), Pending>,
    key: (FeatureKind, InstanceId),
) {
    let Some((revision, openings, publisher)) =
        pending.get_mut(&key).and_then(|p| p.openings.take())
    else {
        return;
    };
    let (kind, instance) = key;
    match store.put_openings(kind, instance, &openings).await {
        Ok(()) => {
            tracing::debug!(%kind, instance, revision, "deferred opening commit flushed");
            publisher.publish(CommittedOpenings {
                instance,
                revision,
                openings,
            });
        }
        Err(err) => {
            tracing::warn!(%kind, instance, error = %err, "deferred opening commit failed again");
            pending.entry(key).or_default().openings = Some((revision, openings, publisher));
        }
    }
}
