//! Registry of live room sessions.
//!
//! Owns the map from room id to session queue. Sessions are created lazily
//! on first dispatch and removed after they report retirement. The map lock
//! is only ever held for map operations, never across a command await, so
//! rooms stay independent.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc, oneshot};

use crate::common::time::Clock;
use crate::domain::{MessagePusher, RoomId, RoomStore};

use super::actor::{RetiredSession, SessionDeps, spawn_session};
use super::command::{RoomCommand, RoomSnapshot};

struct SessionHandle {
    tx: mpsc::UnboundedSender<RoomCommand>,
    generation: u64,
}

pub struct RoomRegistry {
    sessions: Mutex<HashMap<RoomId, SessionHandle>>,
    next_generation: AtomicU64,
    store: Arc<dyn RoomStore>,
    pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    retired_tx: mpsc::UnboundedSender<RetiredSession>,
}

impl RoomRegistry {
    pub fn new(
        store: Arc<dyn RoomStore>,
        pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let (retired_tx, retired_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            store,
            pusher,
            clock,
            retired_tx,
        });
        tokio::spawn(Self::reap_retired(Arc::clone(&registry), retired_rx));
        registry
    }

    /// Remove handles of sessions that finished retiring. Generation
    /// comparison keeps a freshly respawned session for the same room id
    /// from being reaped by its predecessor's notification.
    async fn reap_retired(
        registry: Arc<Self>,
        mut retired_rx: mpsc::UnboundedReceiver<RetiredSession>,
    ) {
        while let Some(retired) = retired_rx.recv().await {
            let mut sessions = registry.sessions.lock().await;
            let matches = sessions
                .get(&retired.room_id)
                .is_some_and(|handle| handle.generation == retired.generation);
            if matches {
                sessions.remove(&retired.room_id);
                tracing::debug!(room = %retired.room_id, "session handle removed");
            }
        }
    }

    /// Enqueue a command on the room's serialized queue, creating the
    /// session if needed. If the session retired between lookup and send,
    /// the command is re-dispatched against a fresh session; a join racing
    /// a retirement is therefore never lost.
    pub(crate) async fn dispatch(&self, room_id: &RoomId, command: RoomCommand) {
        let mut command = command;
        loop {
            let (tx, generation) = self.obtain(room_id).await;
            match tx.send(command) {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    command = returned;
                    self.remove_stale(room_id, generation).await;
                }
            }
        }
    }

    /// Existing live handle, or a freshly spawned session seeded with
    /// `Stopped` state. Never touches the store; the session lazy-loads its
    /// room record on the first join it processes.
    async fn obtain(&self, room_id: &RoomId) -> (mpsc::UnboundedSender<RoomCommand>, u64) {
        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(room_id) {
            if !handle.tx.is_closed() {
                return (handle.tx.clone(), handle.generation);
            }
        }
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let deps = SessionDeps {
            store: Arc::clone(&self.store),
            pusher: Arc::clone(&self.pusher),
            clock: Arc::clone(&self.clock),
            retired_tx: self.retired_tx.clone(),
        };
        let tx = spawn_session(room_id.clone(), generation, deps);
        sessions.insert(
            room_id.clone(),
            SessionHandle {
                tx: tx.clone(),
                generation,
            },
        );
        tracing::debug!(room = %room_id, generation, "session spawned");
        (tx, generation)
    }

    async fn remove_stale(&self, room_id: &RoomId, generation: u64) {
        let mut sessions = self.sessions.lock().await;
        let matches = sessions
            .get(room_id)
            .is_some_and(|handle| handle.generation == generation);
        if matches {
            sessions.remove(room_id);
        }
    }

    /// Query the live session's state, if the room currently has one.
    pub async fn snapshot(&self, room_id: &RoomId) -> Option<RoomSnapshot> {
        let tx = {
            let sessions = self.sessions.lock().await;
            sessions.get(room_id).map(|handle| handle.tx.clone())
        }?;
        let (reply_tx, reply_rx) = oneshot::channel();
        if tx.send(RoomCommand::Snapshot { reply: reply_tx }).is_err() {
            return None;
        }
        reply_rx.await.ok()
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.len()
    }
}
