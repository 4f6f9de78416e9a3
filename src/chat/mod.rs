// Chat session
// Serialises every store mutation behind one async mutex, publishes a snapshot
// to the renderer after each change and owns the scheduled background tasks
// (acknowledgments, simulated replies).

use log::{debug, warn};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio::task::JoinHandle;

pub mod chat_states;
pub mod delivery_receipts;
pub mod notifications;
pub mod presence;

use crate::config::ChatConfig;
use crate::models::{Attachment, Conversation, ConversationId, DeliveryStatus, MessageId, Participant};
use crate::store::{Action, ChatState, ConversationStore, StoreError};

/// Key of a scheduled background task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    Acknowledgment(ConversationId, MessageId),
    Reply(ConversationId),
}

#[derive(Clone)]
pub struct ChatSession {
    store: Arc<TokioMutex<ConversationStore>>,
    snapshot_tx: mpsc::Sender<Arc<ChatState>>,
    tasks: Arc<TokioMutex<HashMap<TaskKey, JoinHandle<()>>>>,
    ack_delay: Duration,
}

impl ChatSession {
    /// Create a session over `seed`. The receiver gets a snapshot after every
    /// mutation that changed something and must be drained; once it is
    /// dropped, snapshots are discarded.
    pub fn new(config: &ChatConfig, seed: Vec<Conversation>) -> (Self, mpsc::Receiver<Arc<ChatState>>) {
        let (snapshot_tx, snapshot_rx) = mpsc::channel(config.snapshot_buffer.max(1));
        let store = ConversationStore::from_config(config, seed);

        (Self {
            store: Arc::new(TokioMutex::new(store)),
            snapshot_tx,
            tasks: Arc::new(TokioMutex::new(HashMap::new())),
            ack_delay: config.ack_delay(),
        }, snapshot_rx)
    }

    pub fn ack_delay(&self) -> Duration {
        self.ack_delay
    }

    pub async fn snapshot(&self) -> Arc<ChatState> {
        self.store.lock().await.snapshot()
    }

    pub async fn list_conversations(&self) -> Vec<Arc<Conversation>> {
        self.store.lock().await.list_conversations().to_vec()
    }

    pub async fn dispatch(&self, action: Action) -> Arc<ChatState> {
        self.mutate(|store| store.dispatch(action)).await
    }

    pub async fn set_active_conversation(&self, id: Option<ConversationId>) -> Arc<ChatState> {
        self.mutate(|store| store.set_active_conversation(id)).await
    }

    pub async fn add_conversation(&self, participant: Participant) -> ConversationId {
        self.mutate(|store| store.add_conversation(participant)).await
    }

    pub async fn mark_read(&self, id: ConversationId) -> Arc<ChatState> {
        self.mutate(|store| store.mark_read(id)).await
    }

    pub async fn receive_message(
        &self,
        id: ConversationId,
        text: Option<String>,
        attachment: Option<Attachment>,
    ) -> Result<Option<MessageId>, StoreError> {
        self.mutate(|store| store.receive_message(id, text, attachment)).await
    }

    pub async fn update_message_status(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
        status: DeliveryStatus,
    ) -> Arc<ChatState> {
        self.mutate(|store| store.update_message_status(conversation_id, message_id, status)).await
    }

    /// Run `f` with exclusive access to the store and publish the result if
    /// the snapshot changed. The publish happens under the lock so snapshots
    /// reach the renderer in mutation order, and a full channel holds back
    /// the next mutation until the renderer catches up.
    pub(crate) async fn mutate<T>(&self, f: impl FnOnce(&mut ConversationStore) -> T) -> T {
        let mut store = self.store.lock().await;
        let before = store.snapshot();
        let result = f(&mut *store);
        let after = store.snapshot();
        if !Arc::ptr_eq(&before, &after) {
            self.publish(after).await;
        }
        result
    }

    async fn publish(&self, snapshot: Arc<ChatState>) {
        if self.snapshot_tx.send(snapshot).await.is_err() {
            debug!("Snapshot receiver gone, not publishing");
        }
    }

    /// Spawn a tracked task. A task already registered under `key` is aborted
    /// and replaced.
    pub(crate) async fn schedule<F>(&self, key: TaskKey, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        let registry = Arc::clone(&self.tasks);
        let handle = tokio::spawn(async move {
            task.await;
            registry.lock().await.remove(&key);
        });
        if let Some(previous) = tasks.insert(key, handle) {
            debug!("Replacing scheduled task {:?}", key);
            previous.abort();
        }
    }

    /// Abort a scheduled task. Returns false if it already ran or never existed.
    pub(crate) async fn cancel(&self, key: TaskKey) -> bool {
        match self.tasks.lock().await.remove(&key) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub async fn pending_tasks(&self) -> Vec<TaskKey> {
        self.tasks.lock().await.keys().copied().collect()
    }

    /// Wait until every task scheduled so far has finished
    pub async fn wait_for_pending(&self) {
        let handles: Vec<_> = self.tasks.lock().await.drain().map(|(_, handle)| handle).collect();
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                if e.is_panic() {
                    warn!("Scheduled chat task panicked: {}", e);
                }
            }
        }
    }

    /// End of session: abort everything still scheduled
    pub async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        for (key, handle) in tasks.drain() {
            debug!("Aborting scheduled task {:?}", key);
            handle.abort();
        }
    }
}
