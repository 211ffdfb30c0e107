//! Registry of open SSE connections
//!
//! Each `GET /sse` connection owns a session id and the receiving half of a
//! channel; `POST /messages/` looks the sender up by id to deliver responses.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

pub const SESSION_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    senders: Mutex<HashMap<Uuid, mpsc::Sender<Value>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session; it lives until the returned guard is dropped.
    pub fn open(self: &Arc<Self>) -> (SessionGuard, mpsc::Receiver<Value>) {
        let (sender, receiver) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let id = Uuid::new_v4();
        self.lock().insert(id, sender);
        debug!(session_id = %id.simple(), "sse session opened");

        (
            SessionGuard {
                id,
                registry: Arc::clone(self),
            },
            receiver,
        )
    }

    pub fn sender(&self, id: &Uuid) -> Option<mpsc::Sender<Value>> {
        self.lock().get(id).cloned()
    }

    /// Drops every sender so open event streams end; used on shutdown.
    pub fn close_all(&self) {
        let closed = std::mem::take(&mut *self.lock()).len();
        if closed > 0 {
            debug!(sessions = closed, "sse sessions closed for shutdown");
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: &Uuid) {
        if self.lock().remove(id).is_some() {
            debug!(session_id = %id.simple(), "sse session closed");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, mpsc::Sender<Value>>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct SessionGuard {
    id: Uuid,
    registry: Arc<SessionRegistry>,
}

impl SessionGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
    }
}
