//! Bounded, ordered opening collection with optimistic local mutation,
//! asynchronous durable commits, and fan-out of committed snapshots.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc;

use super::{Opening, OpeningId, OverlayUiState};
use crate::constants::{DEFAULT_OPENING_RADIUS, MAX_OPENINGS, OPENING_STAGGER_PX};
use crate::instance::{FeatureKind, InstanceId};
use crate::store::writer::StateWriter;
use crate::store::{StoreError, WindowStateStore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpeningError {
    /// The instance already shows the maximum number of openings.
    #[error("opening limit of {max} reached")]
    CapacityExceeded { max: usize },
    /// Deleting the sole remaining opening is refused; an instance must
    /// always show at least one.
    #[error("the last opening cannot be deleted")]
    LastOpening,
}

/// One durably committed state of an instance's opening collection.
/// Revisions increase by one per commit, so observers can assert order.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedOpenings {
    pub instance: InstanceId,
    pub revision: u64,
    pub openings: Vec<Opening>,
}

impl CommittedOpenings {
    pub fn ui_state(&self) -> OverlayUiState {
        OverlayUiState::project(self.instance, &self.openings, false, None)
    }
}

struct PublisherInner {
    next_token: u64,
    subscribers: Vec<(u64, mpsc::UnboundedSender<CommittedOpenings>)>,
}

/// Explicit publish/subscribe channel for committed snapshots.
///
/// Registration and unregistration are plain calls, not tied to any
/// platform lifecycle. Delivery is per-subscriber FIFO over unbounded
/// channels: commit order is preserved and no snapshot is skipped.
#[derive(Clone)]
pub struct OpeningPublisher {
    inner: Arc<Mutex<PublisherInner>>,
}

impl OpeningPublisher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PublisherInner {
                next_token: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self) -> OpeningSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let token = inner.next_token;
        inner.next_token += 1;
        inner.subscribers.push((token, sender));
        OpeningSubscription {
            token,
            receiver,
            publisher: self.clone(),
        }
    }

    pub fn unsubscribe(&self, token: u64) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.subscribers.retain(|(existing, _)| *existing != token);
    }

    /// Deliver a committed snapshot to every live subscriber, pruning
    /// the ones whose receiving side is gone.
    pub fn publish(&self, snapshot: CommittedOpenings) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .subscribers
            .retain(|(_, sender)| sender.send(snapshot.clone()).is_ok());
    }

    fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .subscribers
            .len()
    }
}

impl Default for OpeningPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// A live registration with the publisher. Receive committed snapshots
/// with [`recv`](Self::recv); dropping the subscription unregisters it.
pub struct OpeningSubscription {
    token: u64,
    receiver: mpsc::UnboundedReceiver<CommittedOpenings>,
    publisher: OpeningPublisher,
}

impl OpeningSubscription {
    pub async fn recv(&mut self) -> Option<CommittedOpenings> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<CommittedOpenings> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for OpeningSubscription {
    fn drop(&mut self) {
        self.publisher.unsubscribe(self.token);
    }
}

/// The opening collection of one spotlight-style instance.
///
/// Mutators apply to the in-memory collection synchronously, so a drag
/// renders with zero latency, and independently enqueue a durable
/// commit. Observers see committed snapshots only; the optimistic view
/// is read through [`openings`](Self::openings) /
/// [`ui_state`](Self::ui_state) by the owning feature surface.
pub struct OverlayOpeningSet {
    kind: FeatureKind,
    instance: InstanceId,
    container_width: f32,
    container_height: f32,
    openings: Vec<Opening>,
    next_id: OpeningId,
    revision: u64,
    writer: StateWriter,
    publisher: OpeningPublisher,
}

impl OverlayOpeningSet {
    /// Load the persisted collection for the instance, or seed a single
    /// centered default opening when none exists. The seed is committed
    /// so a restart before any edit still finds it.
    pub async fn load(
        kind: FeatureKind,
        instance: InstanceId,
        container_width: f32,
        container_height: f32,
        store: &Arc<dyn WindowStateStore>,
        writer: StateWriter,
    ) -> Result<Self, StoreError> {
        let persisted = store
            .get_state(kind, instance)
            .await?
            .and_then(|state| state.openings);
        let mut set = Self {
            kind,
            instance,
            container_width,
            container_height,
            openings: Vec::new(),
            next_id: 1,
            revision: 0,
            writer,
            publisher: OpeningPublisher::new(),
        };
        match persisted {
            Some(openings) if !openings.is_empty() => {
                set.next_id = openings.iter().map(|o| o.id).max().unwrap_or(0) + 1;
                set.openings = openings;
                set.renumber();
            }
            _ => {
                let seed = Opening::circular(
                    1,
                    container_width / 2.0,
                    container_height / 2.0,
                    DEFAULT_OPENING_RADIUS,
                    0,
                );
                set.next_id = 2;
                set.openings.push(seed);
                set.commit();
            }
        }
        Ok(set)
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Optimistic view of the collection, in display order.
    pub fn openings(&self) -> &[Opening] {
        &self.openings
    }

    /// Projection of the optimistic view for the owning surface.
    pub fn ui_state(&self) -> OverlayUiState {
        OverlayUiState::project(self.instance, &self.openings, false, None)
    }

    /// Revision of the most recently enqueued commit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe(&self) -> OpeningSubscription {
        self.publisher.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.publisher.subscriber_count()
    }

    /// Add a new opening, staggered from center by the number of
    /// existing openings and clamped into the container.
    pub fn add_opening(&mut self) -> Result<Opening, OpeningError> {
        if self.openings.len() >= MAX_OPENINGS {
            tracing::debug!(
                instance = self.instance,
                max = MAX_OPENINGS,
                "add refused, opening limit reached"
            );
            return Err(OpeningError::CapacityExceeded { max: MAX_OPENINGS });
        }
        let stagger = OPENING_STAGGER_PX * self.openings.len() as f32;
        let radius = DEFAULT_OPENING_RADIUS;
        let center_x = (self.container_width / 2.0 + stagger)
            .clamp(radius, (self.container_width - radius).max(radius));
        let center_y = (self.container_height / 2.0 + stagger)
            .clamp(radius, (self.container_height - radius).max(radius));
        let opening = Opening::circular(
            self.next_id,
            center_x,
            center_y,
            radius,
            self.openings.len() as u32,
        );
        self.next_id += 1;
        self.openings.push(opening.clone());
        self.commit();
        Ok(opening)
    }

    /// Move an opening's center. Locked and unknown openings are left
    /// untouched.
    pub fn update_position(&mut self, id: OpeningId, center_x: f32, center_y: f32) {
        let Some(opening) = self.unlocked_mut(id) else {
            return;
        };
        if opening.center_x == center_x && opening.center_y == center_y {
            return;
        }
        opening.center_x = center_x;
        opening.center_y = center_y;
        self.commit();
    }

    /// Resize an opening; see [`Opening::set_dimensions`] for how the
    /// per-shape invariants are kept. Locked openings are left
    /// untouched.
    pub fn update_size(
        &mut self,
        id: OpeningId,
        radius: Option<f32>,
        width: Option<f32>,
        height: Option<f32>,
    ) {
        let Some(opening) = self.unlocked_mut(id) else {
            return;
        };
        let before = opening.clone();
        opening.set_dimensions(radius, width, height);
        if *opening != before {
            self.commit();
        }
    }

    /// Swap an opening to its paired shape. Locked openings keep their
    /// shape along with everything else.
    pub fn toggle_shape(&mut self, id: OpeningId) {
        let Some(opening) = self.unlocked_mut(id) else {
            return;
        };
        opening.toggle_shape();
        self.commit();
    }

    /// Flip one opening's lock. Always applies; the lock itself is the
    /// only mutable thing about a locked opening.
    pub fn toggle_lock(&mut self, id: OpeningId) {
        let Some(opening) = self.openings.iter_mut().find(|o| o.id == id) else {
            return;
        };
        opening.locked = !opening.locked;
        self.commit();
    }

    /// Lock every opening, or unlock every opening when all are already
    /// locked.
    pub fn toggle_all_locks(&mut self) {
        if self.openings.is_empty() {
            return;
        }
        let all_locked = self.openings.iter().all(|o| o.locked);
        for opening in &mut self.openings {
            opening.locked = !all_locked;
        }
        self.commit();
    }

    /// Delete an opening. Refused when it is the last one; an instance
    /// always shows at least one opening.
    pub fn delete_opening(&mut self, id: OpeningId) -> Result<(), OpeningError> {
        let Some(index) = self.openings.iter().position(|o| o.id == id) else {
            return Ok(());
        };
        if self.openings.len() == 1 {
            tracing::debug!(instance = self.instance, "delete refused, last opening");
            return Err(OpeningError::LastOpening);
        }
        self.openings.remove(index);
        self.renumber();
        self.commit();
        Ok(())
    }

    fn unlocked_mut(&mut self, id: OpeningId) -> Option<&mut Opening> {
        self.openings.iter_mut().find(|o| o.id == id && !o.locked)
    }

    /// Keep display_order contiguous after removals.
    fn renumber(&mut self) {
        for (index, opening) in self.openings.iter_mut().enumerate() {
            opening.display_order = index as u32;
        }
    }

    fn commit(&mut self) {
        self.revision += 1;
        self.writer.commit_openings(
            self.kind,
            self.instance,
            self.revision,
            self.openings.clone(),
            self.publisher.clone(),
        );
    }
}
