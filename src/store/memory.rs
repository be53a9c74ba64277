use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;

use super::{OpinionStore, SnapshotHandler, StoreError, Subscription};
use crate::models::opinion::{Opinion, OpinionId, OpinionRecord};

type Feed = Result<Vec<Opinion>, String>;

/// In-process live store. Shares one ordered list between every board in
/// the process and pushes full snapshots through a watch channel.
///
/// `set_unreachable` and `interrupt` simulate a store that stops accepting
/// writes or drops its subscriptions.
pub struct MemoryOpinionStore {
    records: Mutex<Vec<Opinion>>,
    feed: watch::Sender<Feed>,
    unreachable: AtomicBool,
}

impl Default for MemoryOpinionStore {
    fn default() -> Self {
        let (feed, _) = watch::channel(Ok(Vec::new()));
        MemoryOpinionStore {
            records: Mutex::new(Vec::new()),
            feed,
            unreachable: AtomicBool::new(false),
        }
    }
}

impl MemoryOpinionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent create/delete calls fail as if the store were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// End every open subscription with an error.
    pub fn interrupt(&self, reason: &str) {
        self.feed.send_replace(Err(reason.to_string()));
    }

    /// Replace the whole collection, as if another writer had rewritten it.
    pub fn replace_all(&self, mut opinions: Vec<Opinion>) {
        opinions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let snapshot = {
            let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
            *records = opinions;
            records.clone()
        };
        self.feed.send_replace(Ok(snapshot));
    }

    /// Current ordered contents.
    pub fn snapshot(&self) -> Vec<Opinion> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OpinionStore for MemoryOpinionStore {
    async fn create(&self, record: OpinionRecord) -> Result<OpinionId, StoreError> {
        self.check_reachable()?;
        let id = OpinionId::generate();
        let opinion = record.into_opinion(id.clone());
        let snapshot = {
            let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
            // Newest first; a tie goes ahead of the records already stored.
            let pos = records
                .iter()
                .position(|o| o.timestamp <= opinion.timestamp)
                .unwrap_or(records.len());
            records.insert(pos, opinion);
            records.clone()
        };
        self.feed.send_replace(Ok(snapshot));
        Ok(id)
    }

    async fn delete(&self, id: &OpinionId) -> Result<(), StoreError> {
        self.check_reachable()?;
        let snapshot = {
            let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
            let before = records.len();
            records.retain(|o| &o.id != id);
            if records.len() == before {
                return Ok(());
            }
            records.clone()
        };
        self.feed.send_replace(Ok(snapshot));
        Ok(())
    }

    async fn subscribe(&self, handler: SnapshotHandler) -> Result<Subscription, StoreError> {
        let mut rx = self.feed.subscribe();
        let initial = Ok(self.snapshot());

        let task = tokio::spawn(async move {
            handler(initial);
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().clone();
                match next {
                    Ok(list) => handler(Ok(list)),
                    Err(reason) => {
                        handler(Err(StoreError::Subscription(reason)));
                        return;
                    }
                }
            }
            handler(Err(StoreError::Subscription("store closed".to_string())));
        });

        Ok(Subscription::from_task(task))
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
