use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::events::PushEvent;

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out of push events to every subscriber (WebSocket connections and
/// in-process renderers).
#[derive(Clone)]
pub struct PushChannel {
    tx: broadcast::Sender<PushEvent>,
    clients: Arc<AtomicUsize>,
}

impl PushChannel {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            clients: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns how many subscribers received the event.
    pub fn send(&self, event: PushEvent) -> usize {
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                log::trace!("No subscribers for {}", name);
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.tx.subscribe()
    }

    /// Registers a WebSocket client until the guard is dropped.
    pub fn connect(&self) -> ClientGuard {
        self.clients.fetch_add(1, Ordering::SeqCst);
        ClientGuard {
            clients: self.clients.clone(),
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::SeqCst)
    }
}

impl Default for PushChannel {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ClientGuard {
    clients: Arc<AtomicUsize>,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.clients.fetch_sub(1, Ordering::SeqCst);
    }
}
