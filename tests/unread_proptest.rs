//! Property-based test for unread-counter accounting
//!
//! Uses proptest to generate random send/read interleavings and verifies
//! the store's counters against a trivial in-memory model: a send adds one
//! to every other active participant, an acknowledgement zeroes exactly the
//! reader's counter.

mod common;

use proptest::prelude::*;
use uuid::Uuid;

use common::memory_pool;
use ripple::backend::messaging::ConversationStore;
use ripple::shared::messaging::{Conversation, ConversationKind, Message, ParticipantRole};

const PARTICIPANTS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    /// Participant at this index sends a message
    Send(usize),
    /// Participant at this index acknowledges everything as read
    Read(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PARTICIPANTS).prop_map(Op::Send),
        (0..PARTICIPANTS).prop_map(Op::Read),
    ]
}

async fn run_ops(ops: &[Op]) -> (Vec<i64>, Vec<i64>) {
    let store = ConversationStore::new(memory_pool().await);
    let users: Vec<Uuid> = (0..PARTICIPANTS).map(|_| Uuid::new_v4()).collect();

    let conversation = Conversation::new(ConversationKind::Group, None, None, Some(users[0]));
    let rows: Vec<(Uuid, ParticipantRole)> = users
        .iter()
        .map(|&id| (id, ParticipantRole::Member))
        .collect();
    store.create_conversation(&conversation, &rows).await.unwrap();

    let mut expected = vec![0i64; PARTICIPANTS];
    let mut last_message_id = None;

    for op in ops {
        match *op {
            Op::Send(sender) => {
                let message =
                    Message::new_text(conversation.id, users[sender], "x".to_string());
                store.create_message(&message).await.unwrap();
                last_message_id = Some(message.id);
                for (i, count) in expected.iter_mut().enumerate() {
                    if i != sender {
                        *count += 1;
                    }
                }
            }
            Op::Read(reader) => {
                // Acknowledge against the latest message, or any id when
                // nothing has been sent yet; the cursor value does not
                // affect the counter reset.
                let message_id = last_message_id.unwrap_or_else(Uuid::new_v4);
                store
                    .mark_read(conversation.id, users[reader], message_id)
                    .await
                    .unwrap();
                expected[reader] = 0;
            }
        }
    }

    let participants = store.get_participants(conversation.id).await.unwrap();
    let actual: Vec<i64> = users
        .iter()
        .map(|&id| {
            participants
                .iter()
                .find(|p| p.user_id == id)
                .unwrap()
                .unread_count
        })
        .collect();

    (expected, actual)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_unread_counters_match_model(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (expected, actual) = runtime.block_on(run_ops(&ops));
        prop_assert_eq!(expected, actual);
    }

    #[test]
    fn test_counters_never_negative(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (_, actual) = runtime.block_on(run_ops(&ops));
        prop_assert!(actual.iter().all(|&count| count >= 0));
    }
}
