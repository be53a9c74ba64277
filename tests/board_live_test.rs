//! Integration tests for the board on a shared live store.
//!
//! Uses the in-process store so subscription pushes, write failures and
//! dropped connections can be driven from the test.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use opinion_drop::board::{Backend, BoardError, ConnectionStatus, FeedHub, OpinionBoard};
use opinion_drop::models::opinion::{OpinionId, OpinionRecord, Stance, Tally};
use opinion_drop::store::{
    MemoryOpinionStore, OpinionStore, SnapshotHandler, StoreError, Subscription,
};

use common::{LEE, SAM, TUTORING, live_board_on, settle, setup_live_board, wait_until};

#[tokio::test]
async fn test_empty_push_renders_zero_everything() {
    let (store, board) = setup_live_board().await;
    board.submit(SAM, LEE, Stance::Beneficial, TUTORING).await.unwrap();
    wait_until(|| board.feed().len() == 1).await;

    store.replace_all(Vec::new());
    wait_until(|| board.feed().is_empty()).await;

    assert_eq!(board.tally(), Tally::default());
    assert_eq!(board.status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn test_submit_appears_first_after_push() {
    let (_store, board) = setup_live_board().await;
    board.submit("Ana", "Ben", Stance::Neutral, "Depends.").await.unwrap();
    wait_until(|| board.feed().len() == 1).await;

    let len_before = board.feed().len();
    let beneficial_before = board.tally().beneficial;

    let created = board.submit(SAM, LEE, Stance::Beneficial, TUTORING).await.unwrap();
    wait_until(|| board.feed().len() == len_before + 1).await;

    let feed = board.feed();
    assert_eq!(feed[0].id, created.id);
    assert_eq!(feed[0].name, SAM);
    assert_eq!(feed[0].stance, Stance::Beneficial);
    assert_eq!(board.tally().beneficial, beneficial_before + 1);
    assert_eq!(board.tally().total(), feed.len());
}

#[tokio::test]
async fn test_submit_then_delete_restores_counts() {
    let (_store, board) = setup_live_board().await;
    let len_before = board.feed().len();
    let detrimental_before = board.tally().detrimental;

    let created = board
        .submit("Kai", "Mo", Stance::Detrimental, "Makes cheating easy.")
        .await
        .unwrap();
    wait_until(|| board.tally().detrimental == detrimental_before + 1).await;

    board.delete(&created.id).await.unwrap();
    wait_until(|| board.feed().len() == len_before).await;

    assert_eq!(board.tally().detrimental, detrimental_before);
}

#[tokio::test]
async fn test_board_waits_for_push_instead_of_mutating() {
    let (store, board) = setup_live_board().await;

    store.set_unreachable(true);
    let result = board.submit(SAM, LEE, Stance::Beneficial, TUTORING).await;
    assert!(matches!(result, Err(BoardError::Store(StoreError::Unavailable(_)))));

    settle().await;
    assert!(board.feed().is_empty());
    assert_eq!(board.status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn test_failed_delete_keeps_record() {
    let (store, board) = setup_live_board().await;
    let created = board.submit(SAM, LEE, Stance::Beneficial, TUTORING).await.unwrap();
    wait_until(|| board.feed().len() == 1).await;

    store.set_unreachable(true);
    assert!(board.delete(&created.id).await.is_err());

    settle().await;
    assert_eq!(board.feed().len(), 1);
    assert_eq!(store.snapshot().len(), 1);
}

#[tokio::test]
async fn test_delete_unknown_id_leaves_list_unchanged() {
    let (_store, board) = setup_live_board().await;
    board.submit(SAM, LEE, Stance::Beneficial, TUTORING).await.unwrap();
    wait_until(|| board.feed().len() == 1).await;
    let before = board.feed();

    board.delete(&OpinionId::from("missing")).await.unwrap();
    settle().await;

    assert_eq!(board.feed(), before);
}

#[tokio::test]
async fn test_every_device_sees_the_same_feed() {
    let (store, first) = setup_live_board().await;
    let second = live_board_on(&store).await;

    first.submit(SAM, LEE, Stance::Beneficial, TUTORING).await.unwrap();
    second.submit("Kai", "Mo", Stance::Detrimental, "Privacy.").await.unwrap();

    wait_until(|| first.feed().len() == 2 && second.feed().len() == 2).await;
    assert_eq!(first.feed(), second.feed());
    assert_eq!(first.tally(), second.tally());
}

#[tokio::test]
async fn test_subscription_error_disconnects_until_remount() {
    let (store, board) = setup_live_board().await;

    store.interrupt("connection reset");
    wait_until(|| board.status() == ConnectionStatus::Disconnected).await;

    // Writes still land in the store, but the frozen board doesn't see them.
    store
        .create(OpinionRecord {
            name: SAM.into(),
            partner: LEE.into(),
            stance: Stance::Neutral,
            opinion: TUTORING.into(),
            timestamp: chrono::Utc::now(),
        })
        .await
        .unwrap();
    settle().await;
    assert!(board.feed().is_empty());
    assert_eq!(board.status(), ConnectionStatus::Disconnected);

    board.remount().await.expect("remount");
    wait_until(|| board.status() == ConnectionStatus::Connected).await;
    assert_eq!(board.feed().len(), 1);
}

#[tokio::test]
async fn test_unmount_stops_updates() {
    let (store, board) = setup_live_board().await;
    board.unmount();

    let shared: Arc<dyn OpinionStore> = store.clone();
    shared
        .create(OpinionRecord {
            name: "Late".into(),
            partner: "Arrival".into(),
            stance: Stance::Beneficial,
            opinion: "after teardown".into(),
            timestamp: chrono::Utc::now(),
        })
        .await
        .unwrap();
    settle().await;

    assert!(board.feed().is_empty());
    assert_eq!(store.snapshot().len(), 1);
}

#[tokio::test]
async fn test_status_starts_loading_before_mount() {
    let store: Arc<dyn OpinionStore> = Arc::new(MemoryOpinionStore::new());
    let board = OpinionBoard::new(Backend::Live(store), FeedHub::new());
    assert_eq!(board.status(), ConnectionStatus::Loading);
    assert_eq!(board.backend_kind(), "memory");
}

#[tokio::test]
async fn test_pushes_reach_sockets_with_status() {
    let store = Arc::new(MemoryOpinionStore::new());
    let shared: Arc<dyn OpinionStore> = store.clone();
    let board = OpinionBoard::new(Backend::Live(shared), FeedHub::new());
    let mut rx = board.hub().register();

    board.mount().await.unwrap();
    wait_until(|| board.status() == ConnectionStatus::Connected).await;
    store.interrupt("gone");
    wait_until(|| board.status() == ConnectionStatus::Disconnected).await;

    let mut statuses = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        let json: serde_json::Value = serde_json::from_str(&msg).unwrap();
        statuses.push(json["status"].as_str().unwrap().to_string());
    }
    assert_eq!(statuses.first().map(String::as_str), Some("loading"));
    assert!(statuses.contains(&"connected".to_string()));
    assert_eq!(statuses.last().map(String::as_str), Some("disconnected"));
}

/// Store whose first subscription fails over and over until cancelled;
/// every later one pushes a single empty snapshot.
#[derive(Default)]
struct FailingFirstStore {
    subscriptions: AtomicUsize,
}

#[async_trait]
impl OpinionStore for FailingFirstStore {
    async fn create(&self, _record: OpinionRecord) -> Result<OpinionId, StoreError> {
        Err(StoreError::Unavailable("read only".to_string()))
    }

    async fn delete(&self, _id: &OpinionId) -> Result<(), StoreError> {
        Ok(())
    }

    async fn subscribe(&self, handler: SnapshotHandler) -> Result<Subscription, StoreError> {
        let first = self.subscriptions.fetch_add(1, Ordering::SeqCst) == 0;
        let task = tokio::spawn(async move {
            if !first {
                handler(Ok(Vec::new()));
                return;
            }
            loop {
                handler(Err(StoreError::Subscription("connection reset".to_string())));
                tokio::task::yield_now().await;
            }
        });
        Ok(Subscription::from_task(task))
    }

    fn kind(&self) -> &'static str {
        "failing-first"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_remount_is_not_undone_by_old_subscription() {
    for _ in 0..200 {
        let store: Arc<dyn OpinionStore> = Arc::new(FailingFirstStore::default());
        let board = OpinionBoard::new(Backend::Live(store), FeedHub::new());

        board.mount().await.unwrap();
        wait_until(|| board.status() == ConnectionStatus::Disconnected).await;

        board.remount().await.expect("remount");
        wait_until(|| board.status() == ConnectionStatus::Connected).await;
        tokio::task::yield_now().await;
        assert_eq!(board.status(), ConnectionStatus::Connected);
    }
}
