//! The opinion board: the in-memory list every page renders from.
//!
//! Two persistence strategies sit behind the same `reduce` function:
//! a local JSON slot that the board rewrites itself, and a shared live
//! store whose subscription pushes replace the list wholesale.

pub mod hub;
pub mod reducer;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::Utc;
use serde::Serialize;

use crate::models::opinion::{Opinion, OpinionId, OpinionRecord, Stance, Tally};
use crate::store::{LocalSlot, OpinionStore, SnapshotEvent, SnapshotHandler, StoreError, Subscription};

pub use hub::FeedHub;
pub use reducer::{BoardEvent, reduce};

/// How long the "submitted" banner stays on screen.
pub const SUCCESS_FLASH_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Loading,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Loading => "loading",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
        }
    }
}

#[derive(Debug)]
pub enum BoardError {
    Store(StoreError),
    NotMounted,
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::Store(e) => write!(f, "{e}"),
            BoardError::NotMounted => write!(f, "Board has not loaded its opinions yet"),
        }
    }
}

impl std::error::Error for BoardError {}

impl From<StoreError> for BoardError {
    fn from(e: StoreError) -> Self {
        BoardError::Store(e)
    }
}

/// Where the board's opinions live.
pub enum Backend {
    Local(LocalSlot),
    Live(Arc<dyn OpinionStore>),
}

impl Backend {
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Local(_) => "local",
            Backend::Live(store) => store.kind(),
        }
    }
}

/// Everything a page or socket needs to render the board.
#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    pub opinions: Vec<Opinion>,
    pub tally: Tally,
    pub status: ConnectionStatus,
}

struct BoardState {
    opinions: Vec<Opinion>,
    status: ConnectionStatus,
    // Bumped on every mount and unmount. Pushes tagged with an older
    // generation are dropped; checked under the same lock as the write.
    generation: u64,
}

pub struct OpinionBoard {
    backend: Backend,
    state: RwLock<BoardState>,
    // Serializes read-modify-write of the local slot.
    local_writes: tokio::sync::Mutex<()>,
    subscription: Mutex<Option<Subscription>>,
    hub: FeedHub,
}

impl OpinionBoard {
    pub fn new(backend: Backend, hub: FeedHub) -> Arc<Self> {
        Arc::new(OpinionBoard {
            backend,
            state: RwLock::new(BoardState {
                opinions: Vec::new(),
                status: ConnectionStatus::Loading,
                generation: 0,
            }),
            local_writes: tokio::sync::Mutex::new(()),
            subscription: Mutex::new(None),
            hub,
        })
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    pub fn hub(&self) -> &FeedHub {
        &self.hub
    }

    /// Load the list. Local mode reads the slot once; live mode opens the
    /// board's single subscription, replacing any previous one.
    pub async fn mount(self: &Arc<Self>) -> Result<(), BoardError> {
        match &self.backend {
            Backend::Local(slot) => {
                let _guard = self.local_writes.lock().await;
                let opinions = slot.read().await?;
                self.update(|state| {
                    state.opinions = reduce(std::mem::take(&mut state.opinions), BoardEvent::ReplacedAll(opinions));
                    state.status = ConnectionStatus::Connected;
                });
            }
            Backend::Live(store) => {
                let generation = self.update(|state| {
                    state.generation += 1;
                    state.status = ConnectionStatus::Loading;
                    state.generation
                });

                let weak = Arc::downgrade(self);
                let handler: SnapshotHandler = Arc::new(move |event| {
                    if let Some(board) = weak.upgrade() {
                        board.on_snapshot(generation, event);
                    }
                });

                match store.subscribe(handler).await {
                    Ok(subscription) => {
                        let previous = self
                            .subscription
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .replace(subscription);
                        if let Some(previous) = previous {
                            previous.cancel();
                        }
                        log::info!("Subscribed to {} opinion store", store.kind());
                    }
                    Err(e) => {
                        log::error!("Failed to subscribe to {} opinion store: {e}", store.kind());
                        self.update(|state| state.status = ConnectionStatus::Disconnected);
                        self.publish();
                        return Err(e.into());
                    }
                }
            }
        }
        self.publish();
        Ok(())
    }

    /// Tear down the live subscription. Late pushes from it are dropped.
    pub fn unmount(&self) {
        self.update(|state| state.generation += 1);
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            subscription.cancel();
            log::info!("Unsubscribed from {} opinion store", self.backend.kind());
        }
    }

    /// Explicit reconnect: drop the current subscription and open a new one,
    /// starting again from `Loading`.
    pub async fn remount(self: &Arc<Self>) -> Result<(), BoardError> {
        self.unmount();
        self.mount().await
    }

    /// Create an opinion stamped with the current time.
    ///
    /// Local mode persists the whole list before the new record becomes
    /// visible. Live mode only asks the store to create it; the list changes
    /// when the subscription pushes the new snapshot.
    pub async fn submit(
        &self,
        name: &str,
        partner: &str,
        stance: Stance,
        opinion: &str,
    ) -> Result<Opinion, BoardError> {
        let record = OpinionRecord {
            name: name.to_string(),
            partner: partner.to_string(),
            stance,
            opinion: opinion.to_string(),
            timestamp: Utc::now(),
        };

        match &self.backend {
            Backend::Local(slot) => {
                let _guard = self.local_writes.lock().await;
                self.require_mounted()?;
                let created = record.into_opinion(OpinionId::generate());
                let next = reduce(self.feed(), BoardEvent::Created(created.clone()));
                slot.write(&next).await?;
                self.update(|state| state.opinions = next);
                self.publish();
                Ok(created)
            }
            Backend::Live(store) => {
                let id = store.create(record.clone()).await?;
                log::debug!("Created opinion {id} in {} store", store.kind());
                Ok(record.into_opinion(id))
            }
        }
    }

    /// Remove the opinion with `id`. Unknown ids leave the list as it is.
    pub async fn delete(&self, id: &OpinionId) -> Result<(), BoardError> {
        match &self.backend {
            Backend::Local(slot) => {
                let _guard = self.local_writes.lock().await;
                self.require_mounted()?;
                let next = reduce(self.feed(), BoardEvent::Removed(id.clone()));
                slot.write(&next).await?;
                self.update(|state| state.opinions = next);
                self.publish();
                Ok(())
            }
            Backend::Live(store) => {
                store.delete(id).await?;
                Ok(())
            }
        }
    }

    /// Current list in display order.
    pub fn feed(&self) -> Vec<Opinion> {
        self.read(|state| state.opinions.clone())
    }

    pub fn tally(&self) -> Tally {
        self.read(|state| Tally::of(&state.opinions))
    }

    pub fn status(&self) -> ConnectionStatus {
        self.read(|state| state.status)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.read(|state| BoardSnapshot {
            opinions: state.opinions.clone(),
            tally: Tally::of(&state.opinions),
            status: state.status,
        })
    }

    /// JSON message pushed to sockets whenever the board changes.
    pub fn snapshot_message(&self) -> String {
        let snapshot = self.snapshot();
        serde_json::json!({
            "type": "snapshot",
            "opinions": snapshot.opinions,
            "tally": snapshot.tally,
            "total": snapshot.opinions.len(),
            "status": snapshot.status,
        })
        .to_string()
    }

    fn on_snapshot(&self, generation: u64, event: SnapshotEvent) {
        let applied = self.update(|state| {
            if state.generation != generation {
                return None;
            }
            match event {
                Ok(opinions) => {
                    // Only a remount leaves Disconnected.
                    if state.status == ConnectionStatus::Disconnected {
                        return None;
                    }
                    let was_loading = state.status == ConnectionStatus::Loading;
                    state.opinions = reduce(std::mem::take(&mut state.opinions), BoardEvent::ReplacedAll(opinions));
                    state.status = ConnectionStatus::Connected;
                    Some(Ok(was_loading))
                }
                Err(e) => {
                    state.status = ConnectionStatus::Disconnected;
                    Some(Err(e))
                }
            }
        });

        match applied {
            None => return,
            Some(Ok(true)) => log::info!("Live opinion feed connected"),
            Some(Ok(false)) => {}
            Some(Err(e)) => log::error!("Live opinion feed disconnected: {e}"),
        }
        self.publish();
    }

    fn require_mounted(&self) -> Result<(), BoardError> {
        if self.status() == ConnectionStatus::Loading {
            return Err(BoardError::NotMounted);
        }
        Ok(())
    }

    fn publish(&self) {
        self.hub.broadcast(&self.snapshot_message());
    }

    fn read<T>(&self, f: impl FnOnce(&BoardState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn update<T>(&self, f: impl FnOnce(&mut BoardState) -> T) -> T {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl Drop for OpinionBoard {
    fn drop(&mut self) {
        self.unmount();
    }
}
