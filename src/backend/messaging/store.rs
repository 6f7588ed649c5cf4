//! Database operations for conversations and messages
//!
//! `ConversationStore` is the durable source of truth. Writes that must be
//! observed together (a message, the conversation's last-message pointers,
//! the unread counters) happen in one transaction. Nothing in this module
//! touches the realtime layer.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::shared::messaging::{
    Conversation, ConversationKind, MediaDescriptor, Message, MessageKind, Participant,
    ParticipantRole,
};

/// Canonical key for a direct conversation pair, smaller uuid first.
/// Both argument orders produce the same key.
fn direct_key(a: Uuid, b: Uuid) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("{}:{}", low, high)
}

/// Decode a TEXT column as a UUID
fn parse_uuid(row: &SqliteRow, column: &str) -> Result<Uuid, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn parse_uuid_opt(row: &SqliteRow, column: &str) -> Result<Option<Uuid>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|value| {
        Uuid::parse_str(&value).map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
    .transpose()
}

fn row_to_conversation(row: &SqliteRow) -> Result<Conversation, sqlx::Error> {
    Ok(Conversation {
        id: parse_uuid(row, "id")?,
        kind: ConversationKind::from_str(&row.try_get::<String, _>("kind")?),
        name: row.try_get("name")?,
        image_url: row.try_get("image_url")?,
        created_by: parse_uuid_opt(row, "created_by")?,
        last_message_id: parse_uuid_opt(row, "last_message_id")?,
        last_message_at: row.try_get("last_message_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        participants: Vec::new(),
        unread_count: 0,
    })
}

fn row_to_participant(row: &SqliteRow) -> Result<Participant, sqlx::Error> {
    Ok(Participant {
        conversation_id: parse_uuid(row, "conversation_id")?,
        user_id: parse_uuid(row, "user_id")?,
        role: ParticipantRole::from_str(&row.try_get::<String, _>("role")?),
        joined_at: row.try_get("joined_at")?,
        left_at: row.try_get("left_at")?,
        last_read_at: row.try_get("last_read_at")?,
        last_read_message_id: parse_uuid_opt(row, "last_read_message_id")?,
        is_muted: row.try_get("is_muted")?,
        is_archived: row.try_get("is_archived")?,
        unread_count: row.try_get("unread_count")?,
    })
}

fn row_to_message(row: &SqliteRow) -> Result<Message, sqlx::Error> {
    let media = match row.try_get::<Option<String>, _>("media_url")? {
        Some(url) => Some(MediaDescriptor {
            url,
            thumbnail_url: row.try_get("media_thumbnail_url")?,
            size: row.try_get("media_size")?,
            duration: row.try_get("media_duration")?,
        }),
        None => None,
    };

    Ok(Message {
        id: parse_uuid(row, "id")?,
        conversation_id: parse_uuid(row, "conversation_id")?,
        sender_id: parse_uuid(row, "sender_id")?,
        parent_message_id: parse_uuid_opt(row, "parent_message_id")?,
        content: row.try_get("content")?,
        kind: MessageKind::from_str(&row.try_get::<String, _>("kind")?),
        media,
        is_edited: row.try_get("is_edited")?,
        edited_at: row.try_get("edited_at")?,
        is_deleted: row.try_get("is_deleted")?,
        deleted_at: row.try_get("deleted_at")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Durable store for conversations, participants, and messages
#[derive(Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
}

impl ConversationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema. Idempotent.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(include_str!("schema.sql"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert a conversation and its initial participants in one transaction
    ///
    /// Used for the group path; direct conversations go through
    /// `get_or_create_direct` so the pair key is always set there.
    pub async fn create_conversation(
        &self,
        conversation: &Conversation,
        participants: &[(Uuid, ParticipantRole)],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO conversations (id, kind, name, image_url, created_by, direct_key, last_message_id, last_message_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, NULL, NULL, NULL, ?, ?)
            "#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.kind.as_str())
        .bind(&conversation.name)
        .bind(&conversation.image_url)
        .bind(conversation.created_by.map(|id| id.to_string()))
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&mut *tx)
        .await?;

        for (user_id, role) in participants {
            sqlx::query(
                r#"
                INSERT INTO conversation_participants (conversation_id, user_id, role, joined_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(conversation_id, user_id) DO NOTHING
                "#,
            )
            .bind(conversation.id.to_string())
            .bind(user_id.to_string())
            .bind(role.as_str())
            .bind(conversation.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetch a conversation as seen by one of its active participants
    ///
    /// Returns `None` when the conversation does not exist *or* the user is
    /// not an active participant; callers cannot tell the two apart.
    pub async fn get_conversation(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Conversation>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT c.id, c.kind, c.name, c.image_url, c.created_by, c.last_message_id, c.last_message_at, c.created_at, c.updated_at,
                   cp.unread_count
            FROM conversations c
            INNER JOIN conversation_participants cp ON cp.conversation_id = c.id
            WHERE c.id = ? AND cp.user_id = ? AND cp.left_at IS NULL
            "#,
        )
        .bind(conversation_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let mut conversation = row_to_conversation(&row)?;
        conversation.unread_count = row.try_get("unread_count")?;
        conversation.participants = self.get_participants(conversation_id).await?;
        Ok(Some(conversation))
    }

    /// Get the direct conversation for a pair of users, creating it if absent
    ///
    /// The pair key is unique, so two concurrent first messages resolve to
    /// one conversation: the loser of the insert race re-reads the winner's
    /// row. Returns the conversation id and whether this call created it.
    pub async fn get_or_create_direct(
        &self,
        creator_id: Uuid,
        other_id: Uuid,
    ) -> Result<(Uuid, bool), sqlx::Error> {
        let key = direct_key(creator_id, other_id);

        if let Some(row) = sqlx::query("SELECT id FROM conversations WHERE direct_key = ?")
            .bind(&key)
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok((parse_uuid(&row, "id")?, false));
        }

        let conversation =
            Conversation::new(ConversationKind::Direct, None, None, Some(creator_id));
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO conversations (id, kind, name, image_url, created_by, direct_key, last_message_id, last_message_at, created_at, updated_at)
            VALUES (?, 'direct', NULL, NULL, ?, ?, NULL, NULL, ?, ?)
            ON CONFLICT(direct_key) DO NOTHING
            "#,
        )
        .bind(conversation.id.to_string())
        .bind(creator_id.to_string())
        .bind(&key)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            // Lost the race; another request created the pair first.
            tx.rollback().await?;
            let row = sqlx::query("SELECT id FROM conversations WHERE direct_key = ?")
                .bind(&key)
                .fetch_one(&self.pool)
                .await?;
            return Ok((parse_uuid(&row, "id")?, false));
        }

        for (user_id, role) in [
            (creator_id, ParticipantRole::Admin),
            (other_id, ParticipantRole::Member),
        ] {
            sqlx::query(
                r#"
                INSERT INTO conversation_participants (conversation_id, user_id, role, joined_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(conversation.id.to_string())
            .bind(user_id.to_string())
            .bind(role.as_str())
            .bind(conversation.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok((conversation.id, true))
    }

    /// Add a user to a conversation, or reactivate a membership they left
    ///
    /// A returning participant keeps their previous role and read state;
    /// the `role` argument only applies to a brand-new membership.
    pub async fn add_participant(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        role: ParticipantRole,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO conversation_participants (conversation_id, user_id, role, joined_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(conversation_id, user_id) DO UPDATE SET left_at = NULL
            "#,
        )
        .bind(conversation_id.to_string())
        .bind(user_id.to_string())
        .bind(role.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mark a participant as having left
    ///
    /// The row is kept so their read state survives a rejoin. Returns false
    /// when there was no active membership to remove.
    pub async fn remove_participant(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE conversation_participants
            SET left_at = ?
            WHERE conversation_id = ? AND user_id = ? AND left_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(conversation_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Active participants of a conversation
    pub async fn get_participants(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT conversation_id, user_id, role, joined_at, left_at, last_read_at, last_read_message_id, is_muted, is_archived, unread_count
            FROM conversation_participants
            WHERE conversation_id = ? AND left_at IS NULL
            ORDER BY joined_at ASC
            "#,
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_participant).collect()
    }

    /// Check if a user is an active participant in a conversation
    pub async fn is_active_participant(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM conversation_participants
            WHERE conversation_id = ? AND user_id = ? AND left_at IS NULL
            "#,
        )
        .bind(conversation_id.to_string())
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = result.get("count");
        Ok(count > 0)
    }

    /// Update a participant's mute / archive flags
    ///
    /// `None` leaves a flag unchanged. Returns false when the user has no
    /// active membership.
    pub async fn set_participant_flags(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        muted: Option<bool>,
        archived: Option<bool>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE conversation_participants
            SET is_muted = COALESCE(?, is_muted), is_archived = COALESCE(?, is_archived)
            WHERE conversation_id = ? AND user_id = ? AND left_at IS NULL
            "#,
        )
        .bind(muted)
        .bind(archived)
        .bind(conversation_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Persist a message
    ///
    /// One transaction covers the message insert, the conversation's
    /// last-message pointers, and the unread counters of every *other*
    /// active participant. Readers never observe a message without its
    /// side effects.
    pub async fn create_message(&self, message: &Message) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, parent_message_id, content, kind, media_url, media_thumbnail_url, media_size, media_duration, is_edited, edited_at, is_deleted, deleted_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, NULL, 0, NULL, ?)
            "#,
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.sender_id.to_string())
        .bind(message.parent_message_id.map(|id| id.to_string()))
        .bind(&message.content)
        .bind(message.kind.as_str())
        .bind(message.media.as_ref().map(|m| m.url.clone()))
        .bind(message.media.as_ref().and_then(|m| m.thumbnail_url.clone()))
        .bind(message.media.as_ref().and_then(|m| m.size))
        .bind(message.media.as_ref().and_then(|m| m.duration))
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE conversations
            SET last_message_id = ?, last_message_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(message.id.to_string())
        .bind(message.created_at)
        .bind(message.created_at)
        .bind(message.conversation_id.to_string())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE conversation_participants
            SET unread_count = unread_count + 1
            WHERE conversation_id = ? AND user_id != ? AND left_at IS NULL
            "#,
        )
        .bind(message.conversation_id.to_string())
        .bind(message.sender_id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Fetch a message by id
    pub async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, parent_message_id, content, kind, media_url, media_thumbnail_url, media_size, media_duration, is_edited, edited_at, is_deleted, deleted_at, created_at
            FROM messages
            WHERE id = ?
            "#,
        )
        .bind(message_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_message).transpose()
    }

    /// Page of messages for a conversation, newest first
    ///
    /// Returns `None` unless the requester is an active participant; as
    /// with `get_conversation`, a stranger and a missing conversation look
    /// identical. Soft-deleted rows are included (with null content) so
    /// pagination stays stable; the total uses the same predicate as the
    /// page.
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Option<(Vec<Message>, i64)>, sqlx::Error> {
        if !self.is_active_participant(conversation_id, user_id).await? {
            return Ok(None);
        }

        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, parent_message_id, content, kind, media_url, media_thumbnail_url, media_size, media_duration, is_edited, edited_at, is_deleted, deleted_at, created_at
            FROM messages
            WHERE conversation_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(conversation_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let messages = rows
            .iter()
            .map(row_to_message)
            .collect::<Result<Vec<_>, _>>()?;

        let total_row =
            sqlx::query("SELECT COUNT(*) as count FROM messages WHERE conversation_id = ?")
                .bind(conversation_id.to_string())
                .fetch_one(&self.pool)
                .await?;
        let total: i64 = total_row.get("count");

        Ok(Some((messages, total)))
    }

    /// Overwrite a message's content and mark it edited
    ///
    /// The id and position never change.
    pub async fn edit_message(&self, message_id: Uuid, content: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE messages
            SET content = ?, is_edited = 1, edited_at = ?
            WHERE id = ?
            "#,
        )
        .bind(content)
        .bind(Utc::now())
        .bind(message_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Clear a message's content and media and mark it deleted
    ///
    /// The row stays so ordering and totals are preserved.
    pub async fn soft_delete_message(&self, message_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE messages
            SET content = NULL, media_url = NULL, media_thumbnail_url = NULL,
                media_size = NULL, media_duration = NULL, is_deleted = 1, deleted_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(message_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Set a participant's read cursor and zero their unread counter
    ///
    /// Only an explicit acknowledgement resets the counter. Returns false
    /// when the user has no active membership.
    pub async fn mark_read(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        message_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE conversation_participants
            SET last_read_at = ?, last_read_message_id = ?, unread_count = 0
            WHERE conversation_id = ? AND user_id = ? AND left_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(message_id.to_string())
        .bind(conversation_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Conversations a user belongs to, most recent activity first
    ///
    /// Rows the user left or archived are excluded; the total uses the
    /// same predicate as the page.
    pub async fn list_user_conversations(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Conversation>, i64), sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.kind, c.name, c.image_url, c.created_by, c.last_message_id, c.last_message_at, c.created_at, c.updated_at,
                   cp.unread_count
            FROM conversations c
            INNER JOIN conversation_participants cp ON cp.conversation_id = c.id
            WHERE cp.user_id = ? AND cp.left_at IS NULL AND cp.is_archived = 0
            ORDER BY COALESCE(c.last_message_at, c.created_at) DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut conversations = Vec::new();
        for row in rows {
            let mut conversation = row_to_conversation(&row)?;
            conversation.unread_count = row.try_get("unread_count")?;
            conversation.participants = self.get_participants(conversation.id).await?;
            conversations.push(conversation);
        }

        let total_row = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM conversation_participants
            WHERE user_id = ? AND left_at IS NULL AND is_archived = 0
            "#,
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        let total: i64 = total_row.get("count");

        Ok((conversations, total))
    }

    /// Total unread messages across a user's active, unarchived conversations
    pub async fn unread_total(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(unread_count), 0) as total
            FROM conversation_participants
            WHERE user_id = ? AND left_at IS NULL AND is_archived = 0
            "#,
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("total"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_key_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(direct_key(a, b), direct_key(b, a));
        assert_ne!(direct_key(a, b), direct_key(a, a));
    }

    #[test]
    fn test_direct_key_format() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let key = direct_key(a, b);

        let (low, high) = key.split_once(':').unwrap();
        assert!(low <= high);
        assert!(Uuid::parse_str(low).is_ok());
        assert!(Uuid::parse_str(high).is_ok());
    }
}
