//! Shared test infrastructure for board and HTTP tests.
//!
//! - `setup_local_board()` - board on a fresh JSON slot in a temp dir
//! - `setup_live_board()` - board subscribed to a fresh in-process store
//! - `wait_until()` - poll until a subscription push has landed
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use opinion_drop::board::{Backend, ConnectionStatus, FeedHub, OpinionBoard};
use opinion_drop::store::{LocalSlot, MemoryOpinionStore, OpinionStore};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const SAM: &str = "Sam";
pub const LEE: &str = "Lee";
pub const TUTORING: &str = "Helps with tutoring.";

// ============================================================================
// BOARD SETUP
// ============================================================================

/// Board on a local slot inside a new temp dir, already mounted.
///
/// The TempDir must be kept alive for the slot file to remain valid.
pub async fn setup_local_board() -> (TempDir, Arc<OpinionBoard>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let board = local_board_in(&dir).await;
    (dir, board)
}

/// Mounted board on the slot inside an existing dir.
pub async fn local_board_in(dir: &TempDir) -> Arc<OpinionBoard> {
    let board = OpinionBoard::new(Backend::Local(LocalSlot::in_dir(dir.path())), FeedHub::new());
    board.mount().await.expect("Failed to mount local board");
    board
}

/// Board subscribed to a new in-process store, waited until connected.
pub async fn setup_live_board() -> (Arc<MemoryOpinionStore>, Arc<OpinionBoard>) {
    let store = Arc::new(MemoryOpinionStore::new());
    let board = live_board_on(&store).await;
    (store, board)
}

/// Another board on the same shared store, as a second classroom device.
pub async fn live_board_on(store: &Arc<MemoryOpinionStore>) -> Arc<OpinionBoard> {
    let shared: Arc<dyn OpinionStore> = store.clone();
    let board = OpinionBoard::new(Backend::Live(shared), FeedHub::new());
    board.mount().await.expect("Failed to subscribe live board");
    wait_until(|| board.status() == ConnectionStatus::Connected).await;
    board
}

// ============================================================================
// ASYNC HELPERS
// ============================================================================

/// Poll `cond` until it holds, failing the test after two seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 2s");
}

/// Give background tasks a chance to run without expecting any change.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
