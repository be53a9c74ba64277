use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;

/// Fan-out of board messages to every open WebSocket.
#[derive(Clone, Default)]
pub struct FeedHub {
    senders: Arc<RwLock<Vec<mpsc::UnboundedSender<String>>>>,
}

impl FeedHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener; messages arrive on the returned receiver.
    pub fn register(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Send `msg` to every listener and forget the ones that went away.
    pub fn broadcast(&self, msg: &str) {
        let mut senders = self.senders.write().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|s| s.send(msg.to_string()).is_ok());
    }

    /// Drop closed senders without sending anything.
    pub fn prune(&self) {
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|s| !s.is_closed());
    }

    pub fn listener_count(&self) -> usize {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
