use std::sync::Arc;
use uuid::Uuid;

use crate::models::Notification;
use crate::store::ChatState;
use super::ChatSession;

impl ChatSession {
    /// Pending notifications, oldest first
    pub async fn notifications(&self) -> Vec<Notification> {
        self.snapshot().await.notifications().iter().cloned().collect()
    }

    pub async fn dismiss_notification(&self, id: Uuid) -> Arc<ChatState> {
        self.mutate(|store| store.dismiss_notification(id)).await
    }

    pub async fn clear_notifications(&self) -> Arc<ChatState> {
        self.mutate(|store| store.clear_notifications()).await
    }
}
