//! Messaging service
//!
//! `MessagingService` is the only component that talks to both the store and
//! the realtime hub, and the single place authorization happens. Every
//! operation persists first; live events are published after the write
//! succeeds and are best-effort, so a sender's response reflects persistence
//! only.

use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::messaging::store::ConversationStore;
use crate::backend::realtime::hub::HubHandle;
use crate::shared::event::LiveEvent;
use crate::shared::messaging::{
    Conversation, ConversationKind, CreateConversationRequest, EditMessageRequest,
    ListConversationsResponse, ListMessagesResponse, Message, ParticipantRole,
    SendMessageRequest, UnreadCountResponse,
};

const DEFAULT_CONVERSATION_LIMIT: i64 = 20;
const MAX_CONVERSATION_LIMIT: i64 = 50;
const DEFAULT_MESSAGE_LIMIT: i64 = 50;
const MAX_MESSAGE_LIMIT: i64 = 100;

/// Clamp a requested page size into 1..=max, falling back to the default
fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    match requested {
        None => default,
        Some(value) if value < 1 => default,
        Some(value) => value.min(max),
    }
}

fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Orchestrates the conversation store and the realtime hub
#[derive(Clone)]
pub struct MessagingService {
    store: ConversationStore,
    hub: HubHandle,
}

impl MessagingService {
    /// The hub handle is injected at construction; the hub itself is spawned
    /// before the service exists.
    pub fn new(store: ConversationStore, hub: HubHandle) -> Self {
        Self { store, hub }
    }

    /// Create a conversation on behalf of a user
    ///
    /// A `direct` request must name exactly one other participant and reuses
    /// the existing conversation for the pair when there is one. A `group`
    /// request creates a fresh conversation with the caller as admin.
    pub async fn create_conversation(
        &self,
        user_id: Uuid,
        req: CreateConversationRequest,
    ) -> Result<Conversation, BackendError> {
        match req.kind {
            ConversationKind::Direct => {
                let mut others: Vec<Uuid> = req
                    .participant_ids
                    .iter()
                    .copied()
                    .filter(|id| *id != user_id)
                    .collect();
                others.sort_unstable();
                others.dedup();

                if others.len() != 1 {
                    return Err(BackendError::validation(
                        "a direct conversation needs exactly one other participant",
                    ));
                }

                self.get_or_create_direct_conversation(user_id, others[0])
                    .await
            }
            ConversationKind::Group => {
                let conversation = Conversation::new(
                    ConversationKind::Group,
                    req.name.clone(),
                    req.image_url.clone(),
                    Some(user_id),
                );

                let mut members: Vec<(Uuid, ParticipantRole)> =
                    vec![(user_id, ParticipantRole::Admin)];
                for id in req.participant_ids.iter().copied().filter(|id| *id != user_id) {
                    if !members.iter().any(|(member, _)| *member == id) {
                        members.push((id, ParticipantRole::Member));
                    }
                }

                self.store.create_conversation(&conversation, &members).await?;

                let conversation = self
                    .store
                    .get_conversation(conversation.id, user_id)
                    .await?
                    .ok_or_else(|| BackendError::not_found("conversation"))?;

                tracing::info!(
                    "[Messaging] Created group conversation {} with {} participants",
                    conversation.id,
                    conversation.participants.len()
                );

                let event = LiveEvent::conversation_updated(&conversation);
                for participant in &conversation.participants {
                    if participant.user_id != user_id {
                        self.hub.broadcast_to_user(participant.user_id, &event);
                    }
                }

                Ok(conversation)
            }
        }
    }

    /// Fetch a conversation the caller participates in
    ///
    /// A conversation the caller does not belong to is reported exactly like
    /// one that does not exist.
    pub async fn get_conversation(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Conversation, BackendError> {
        self.store
            .get_conversation(conversation_id, user_id)
            .await?
            .ok_or_else(|| BackendError::not_participant(conversation_id))
    }

    /// List the caller's conversations, most recent activity first
    pub async fn list_conversations(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<ListConversationsResponse, BackendError> {
        let limit = clamp_limit(limit, DEFAULT_CONVERSATION_LIMIT, MAX_CONVERSATION_LIMIT);
        let offset = clamp_offset(offset);

        let (conversations, total) = self
            .store
            .list_user_conversations(user_id, limit, offset)
            .await?;

        Ok(ListConversationsResponse {
            conversations,
            total,
        })
    }

    /// Get or create the direct conversation between the caller and another user
    ///
    /// Safe to call repeatedly and from both sides of the pair; every call
    /// yields the same conversation. A caller who previously left the
    /// conversation is reactivated rather than refused.
    pub async fn get_or_create_direct_conversation(
        &self,
        user_id: Uuid,
        other_id: Uuid,
    ) -> Result<Conversation, BackendError> {
        if user_id == other_id {
            return Err(BackendError::validation(
                "cannot start a direct conversation with yourself",
            ));
        }

        let (conversation_id, created) =
            self.store.get_or_create_direct(user_id, other_id).await?;

        if !created {
            // Reopening the pair reactivates a membership the caller left;
            // the upsert is a no-op while the membership is active.
            self.store
                .add_participant(conversation_id, user_id, ParticipantRole::Member)
                .await?;
        }

        let conversation = self
            .store
            .get_conversation(conversation_id, user_id)
            .await?
            .ok_or_else(|| BackendError::not_found("conversation"))?;

        if created {
            tracing::info!(
                "[Messaging] Created direct conversation {} for {} and {}",
                conversation.id,
                user_id,
                other_id
            );
            self.hub
                .broadcast_to_user(other_id, &LiveEvent::conversation_updated(&conversation));
        }

        Ok(conversation)
    }

    /// Leave a conversation
    ///
    /// Membership is soft-removed; history and read state stay behind.
    pub async fn leave_conversation(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<(), BackendError> {
        let removed = self.store.remove_participant(conversation_id, user_id).await?;
        if !removed {
            return Err(BackendError::not_participant(conversation_id));
        }

        tracing::debug!(
            "[Messaging] User {} left conversation {}",
            user_id,
            conversation_id
        );
        Ok(())
    }

    /// Send a message to a conversation
    ///
    /// The caller must be an active participant and the message must carry
    /// text content or media. The response reflects persistence; live
    /// delivery to subscribers is fire-and-forget.
    pub async fn send_message(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        req: SendMessageRequest,
    ) -> Result<Message, BackendError> {
        if !self
            .store
            .is_active_participant(conversation_id, user_id)
            .await?
        {
            return Err(BackendError::not_participant(conversation_id));
        }

        let content = req
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if content.is_none() && req.media.is_none() {
            return Err(BackendError::validation("message needs content or media"));
        }

        let message = Message::new(
            conversation_id,
            user_id,
            content,
            req.kind,
            req.media,
            req.parent_message_id,
        );
        self.store.create_message(&message).await?;

        tracing::debug!(
            "[Messaging] User {} sent message {} to conversation {}",
            user_id,
            message.id,
            conversation_id
        );

        self.hub
            .broadcast_to_conversation(conversation_id, &LiveEvent::new_message(&message));

        Ok(message)
    }

    /// Page through a conversation's messages, newest first
    ///
    /// Soft-deleted messages appear with null content; clients render the
    /// tombstone, and pagination never shifts under an active reader.
    pub async fn list_messages(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<ListMessagesResponse, BackendError> {
        let limit = clamp_limit(limit, DEFAULT_MESSAGE_LIMIT, MAX_MESSAGE_LIMIT);
        let offset = clamp_offset(offset);

        let (messages, total) = self
            .store
            .list_messages(conversation_id, user_id, limit, offset)
            .await?
            .ok_or_else(|| BackendError::not_participant(conversation_id))?;

        Ok(ListMessagesResponse { messages, total })
    }

    /// Edit a message's content. Sender-only.
    pub async fn edit_message(
        &self,
        user_id: Uuid,
        message_id: Uuid,
        req: EditMessageRequest,
    ) -> Result<Message, BackendError> {
        let message = self
            .store
            .get_message(message_id)
            .await?
            .ok_or_else(|| BackendError::not_found("message"))?;

        if message.sender_id != user_id {
            return Err(BackendError::unauthorized("only the sender can edit a message"));
        }
        if message.is_deleted {
            return Err(BackendError::validation("cannot edit a deleted message"));
        }

        let content = req.content.trim().to_string();
        if content.is_empty() {
            return Err(BackendError::validation("message content cannot be empty"));
        }

        self.store.edit_message(message_id, &content).await?;

        let message = self
            .store
            .get_message(message_id)
            .await?
            .ok_or_else(|| BackendError::not_found("message"))?;

        self.hub.broadcast_to_conversation(
            message.conversation_id,
            &LiveEvent::message_edited(&message),
        );

        Ok(message)
    }

    /// Soft-delete a message. Sender-only; idempotent.
    pub async fn delete_message(
        &self,
        user_id: Uuid,
        message_id: Uuid,
    ) -> Result<(), BackendError> {
        let message = self
            .store
            .get_message(message_id)
            .await?
            .ok_or_else(|| BackendError::not_found("message"))?;

        if message.sender_id != user_id {
            return Err(BackendError::unauthorized(
                "only the sender can delete a message",
            ));
        }

        self.store.soft_delete_message(message_id).await?;

        self.hub.broadcast_to_conversation(
            message.conversation_id,
            &LiveEvent::message_deleted(message.conversation_id, message_id),
        );

        Ok(())
    }

    /// Acknowledge messages as read up to `message_id`
    ///
    /// Zeroes the caller's unread counter; this is the only way it resets.
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        message_id: Uuid,
    ) -> Result<(), BackendError> {
        let updated = self.store.mark_read(conversation_id, user_id, message_id).await?;
        if !updated {
            return Err(BackendError::not_participant(conversation_id));
        }

        self.hub.broadcast_to_conversation(
            conversation_id,
            &LiveEvent::read(conversation_id, user_id, message_id),
        );

        Ok(())
    }

    /// Total unread messages across the caller's conversations
    pub async fn unread_count(&self, user_id: Uuid) -> Result<UnreadCountResponse, BackendError> {
        let unread_count = self.store.unread_total(user_id).await?;
        Ok(UnreadCountResponse { unread_count })
    }

    /// Participation check run before honoring a live `subscribe` frame
    ///
    /// The hub itself never consults the store; this is the only gate
    /// between a connection and a conversation's event stream.
    pub async fn authorize_subscription(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<(), BackendError> {
        if self
            .store
            .is_active_participant(conversation_id, user_id)
            .await?
        {
            Ok(())
        } else {
            Err(BackendError::not_participant(conversation_id))
        }
    }
}
