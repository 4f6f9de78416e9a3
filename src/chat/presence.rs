// Online state of conversation participants

use std::sync::Arc;

use crate::models::ParticipantId;
use crate::store::ChatState;
use super::ChatSession;

impl ChatSession {
    pub async fn set_participant_online(&self, participant_id: ParticipantId, online: bool) -> Arc<ChatState> {
        self.mutate(|store| store.set_participant_online(participant_id, online)).await
    }

    pub async fn online_participants(&self) -> Vec<ParticipantId> {
        self.snapshot().await.online_participants().iter().cloned().collect()
    }
}
