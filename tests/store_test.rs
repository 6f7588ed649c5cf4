//! Integration tests for the conversation store
//!
//! Exercises the durable contract directly: the transactional message
//! write, read cursors, direct-pair uniqueness, soft membership, and soft
//! deletion.

mod common;

use pretty_assertions::assert_eq;
use uuid::Uuid;

use common::memory_pool;
use ripple::backend::messaging::ConversationStore;
use ripple::shared::messaging::{
    Conversation, ConversationKind, Message, ParticipantRole,
};

async fn store() -> ConversationStore {
    ConversationStore::new(memory_pool().await)
}

/// Create a group conversation with the given members, first one admin
async fn seed_group(store: &ConversationStore, members: &[Uuid]) -> Uuid {
    let conversation = Conversation::new(
        ConversationKind::Group,
        Some("room".to_string()),
        None,
        Some(members[0]),
    );
    let rows: Vec<(Uuid, ParticipantRole)> = members
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            let role = if i == 0 {
                ParticipantRole::Admin
            } else {
                ParticipantRole::Member
            };
            (id, role)
        })
        .collect();
    store.create_conversation(&conversation, &rows).await.unwrap();
    conversation.id
}

#[tokio::test]
async fn test_create_message_updates_pointer_and_counters() {
    let store = store().await;
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let conversation_id = seed_group(&store, &[a, b, c]).await;

    let message = Message::new_text(conversation_id, a, "hi".to_string());
    store.create_message(&message).await.unwrap();

    let seen_by_b = store
        .get_conversation(conversation_id, b)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen_by_b.last_message_id, Some(message.id));
    assert_eq!(seen_by_b.last_message_at, Some(message.created_at));
    assert_eq!(seen_by_b.unread_count, 1);

    // Sender's own counter is untouched.
    let seen_by_a = store
        .get_conversation(conversation_id, a)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen_by_a.unread_count, 0);

    let seen_by_c = store
        .get_conversation(conversation_id, c)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen_by_c.unread_count, 1);
}

#[tokio::test]
async fn test_unread_skips_departed_participants() {
    let store = store().await;
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let conversation_id = seed_group(&store, &[a, b, c]).await;

    assert!(store.remove_participant(conversation_id, c).await.unwrap());

    let message = Message::new_text(conversation_id, a, "hi".to_string());
    store.create_message(&message).await.unwrap();

    let participants = store.get_participants(conversation_id).await.unwrap();
    assert_eq!(participants.len(), 2);
    assert!(participants.iter().all(|p| p.user_id != c));

    // The departed row kept its counter at zero.
    let seen_by_b = store
        .get_conversation(conversation_id, b)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen_by_b.unread_count, 1);
    assert!(store
        .get_conversation(conversation_id, c)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_mark_read_zeroes_only_that_participant() {
    let store = store().await;
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let conversation_id = seed_group(&store, &[a, b, c]).await;

    let message = Message::new_text(conversation_id, a, "hi".to_string());
    store.create_message(&message).await.unwrap();

    assert!(store.mark_read(conversation_id, b, message.id).await.unwrap());

    let participants = store.get_participants(conversation_id).await.unwrap();
    let by_user = |id: Uuid| participants.iter().find(|p| p.user_id == id).unwrap();

    assert_eq!(by_user(b).unread_count, 0);
    assert_eq!(by_user(b).last_read_message_id, Some(message.id));
    assert_eq!(by_user(c).unread_count, 1);
    assert!(by_user(c).last_read_message_id.is_none());
}

#[tokio::test]
async fn test_mark_read_without_membership() {
    let store = store().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conversation_id = seed_group(&store, &[a, b]).await;

    let updated = store
        .mark_read(conversation_id, Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();
    assert!(!updated);
}

#[tokio::test]
async fn test_get_or_create_direct_is_idempotent() {
    let store = store().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    let (first, created_first) = store.get_or_create_direct(a, b).await.unwrap();
    assert!(created_first);

    // Same pair, both argument orders.
    let (second, created_second) = store.get_or_create_direct(a, b).await.unwrap();
    let (third, created_third) = store.get_or_create_direct(b, a).await.unwrap();
    assert!(!created_second);
    assert!(!created_third);
    assert_eq!(first, second);
    assert_eq!(first, third);

    let conversation = store.get_conversation(first, a).await.unwrap().unwrap();
    assert_eq!(conversation.kind, ConversationKind::Direct);
    assert_eq!(conversation.participants.len(), 2);
}

#[tokio::test]
async fn test_get_conversation_gates_non_participants() {
    let store = store().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conversation_id = seed_group(&store, &[a, b]).await;

    // A stranger and a missing conversation look identical.
    assert!(store
        .get_conversation(conversation_id, Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
    assert!(store
        .get_conversation(Uuid::new_v4(), a)
        .await
        .unwrap()
        .is_none());

    // Message listing is gated the same way.
    assert!(store
        .list_messages(conversation_id, Uuid::new_v4(), 10, 0)
        .await
        .unwrap()
        .is_none());
    assert!(store
        .list_messages(conversation_id, a, 10, 0)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_soft_delete_preserves_position_and_total() {
    let store = store().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conversation_id = seed_group(&store, &[a, b]).await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let message = Message::new_text(conversation_id, a, format!("m{}", i));
        store.create_message(&message).await.unwrap();
        ids.push(message.id);
    }

    store.soft_delete_message(ids[1]).await.unwrap();

    let (messages, total) = store
        .list_messages(conversation_id, b, 10, 0)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(messages.len(), 3);

    // Newest first; the deleted row keeps its slot with null content.
    assert_eq!(messages[0].id, ids[2]);
    assert_eq!(messages[1].id, ids[1]);
    assert_eq!(messages[2].id, ids[0]);
    assert!(messages[1].is_deleted);
    assert!(messages[1].content.is_none());
    assert!(messages[1].deleted_at.is_some());
    assert_eq!(messages[2].content.as_deref(), Some("m0"));
}

#[tokio::test]
async fn test_edit_message_sets_flag_keeps_identity() {
    let store = store().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conversation_id = seed_group(&store, &[a, b]).await;

    let message = Message::new_text(conversation_id, a, "first".to_string());
    store.create_message(&message).await.unwrap();

    store.edit_message(message.id, "second").await.unwrap();

    let edited = store.get_message(message.id).await.unwrap().unwrap();
    assert_eq!(edited.id, message.id);
    assert_eq!(edited.content.as_deref(), Some("second"));
    assert!(edited.is_edited);
    assert!(edited.edited_at.is_some());
    assert_eq!(edited.created_at, message.created_at);
}

#[tokio::test]
async fn test_message_pagination_newest_first() {
    let store = store().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conversation_id = seed_group(&store, &[a, b]).await;

    for i in 0..5 {
        let message = Message::new_text(conversation_id, a, format!("m{}", i));
        store.create_message(&message).await.unwrap();
    }

    let (page_one, total) = store
        .list_messages(conversation_id, b, 2, 0)
        .await
        .unwrap()
        .unwrap();
    let (page_two, _) = store
        .list_messages(conversation_id, b, 2, 2)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(total, 5);
    assert_eq!(page_one[0].content.as_deref(), Some("m4"));
    assert_eq!(page_one[1].content.as_deref(), Some("m3"));
    assert_eq!(page_two[0].content.as_deref(), Some("m2"));
    assert_eq!(page_two[1].content.as_deref(), Some("m1"));
}

#[tokio::test]
async fn test_list_conversations_ordering_and_exclusions() {
    let store = store().await;
    let user = Uuid::new_v4();
    let peer = Uuid::new_v4();

    let older = seed_group(&store, &[user, peer]).await;
    let newer = seed_group(&store, &[user, peer]).await;
    let left = seed_group(&store, &[user, peer]).await;
    let archived = seed_group(&store, &[user, peer]).await;

    // A message in the older conversation makes it the most recent.
    let message = Message::new_text(older, peer, "bump".to_string());
    store.create_message(&message).await.unwrap();

    store.remove_participant(left, user).await.unwrap();
    store
        .set_participant_flags(archived, user, None, Some(true))
        .await
        .unwrap();

    let (conversations, total) = store.list_user_conversations(user, 10, 0).await.unwrap();
    assert_eq!(total, 2);
    let ids: Vec<Uuid> = conversations.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![older, newer]);
}

#[tokio::test]
async fn test_rejoin_clears_left_at() {
    let store = store().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conversation_id = seed_group(&store, &[a, b]).await;

    assert!(store.remove_participant(conversation_id, b).await.unwrap());
    assert!(!store
        .is_active_participant(conversation_id, b)
        .await
        .unwrap());

    store
        .add_participant(conversation_id, b, ParticipantRole::Member)
        .await
        .unwrap();
    assert!(store
        .is_active_participant(conversation_id, b)
        .await
        .unwrap());

    // Leaving again reports true exactly once.
    assert!(store.remove_participant(conversation_id, b).await.unwrap());
    assert!(!store.remove_participant(conversation_id, b).await.unwrap());
}

#[tokio::test]
async fn test_rejoin_keeps_previous_role() {
    let store = store().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conversation_id = seed_group(&store, &[a, b]).await;

    // The admin leaves and comes back through the member-level upsert.
    assert!(store.remove_participant(conversation_id, a).await.unwrap());
    store
        .add_participant(conversation_id, a, ParticipantRole::Member)
        .await
        .unwrap();

    let participants = store.get_participants(conversation_id).await.unwrap();
    let rejoined = participants.iter().find(|p| p.user_id == a).unwrap();
    assert_eq!(rejoined.role, ParticipantRole::Admin);
    assert!(rejoined.left_at.is_none());
}

#[tokio::test]
async fn test_unread_total_spans_conversations() {
    let store = store().await;
    let user = Uuid::new_v4();
    let peer = Uuid::new_v4();

    let first = seed_group(&store, &[peer, user]).await;
    let second = seed_group(&store, &[peer, user]).await;

    for conversation_id in [first, second] {
        let message = Message::new_text(conversation_id, peer, "ping".to_string());
        store.create_message(&message).await.unwrap();
    }
    assert_eq!(store.unread_total(user).await.unwrap(), 2);

    let message = Message::new_text(second, peer, "again".to_string());
    store.create_message(&message).await.unwrap();
    assert_eq!(store.unread_total(user).await.unwrap(), 3);

    // Archiving hides that conversation's count from the badge.
    store
        .set_participant_flags(second, user, None, Some(true))
        .await
        .unwrap();
    assert_eq!(store.unread_total(user).await.unwrap(), 1);
}
