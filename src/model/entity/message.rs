use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Message {
    id: Uuid,
    sender_id: Uuid,
    recipient_id: Uuid,
    body: String,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for Message {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Message
    }
}

/// Trimmed body, or `None` when empty or too long.
pub fn normalize_body(body: &str) -> Option<&str> {
    let body = body.trim();
    let len = body.chars().count();
    (1..=MAX_MESSAGE_CHARS).contains(&len).then_some(body)
}

impl Message {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub async fn send(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        recipient_id: Uuid,
        body: &str,
    ) -> DatabaseResult<Self> {
        let message = sqlx::query_as(
            "INSERT INTO messages (id, sender_id, recipient_id, body) VALUES ($1,$2,$3,$4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(recipient_id)
        .bind(body)
        .fetch_one(mm.executor())
        .await?;
        Ok(message)
    }

    /// Oldest first.
    pub async fn conversation(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        other: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
            OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at, id
            "#,
        )
        .bind(actor.user_id())
        .bind(other)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn mark_read_from(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        sender_id: Uuid,
    ) -> DatabaseResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET read_at = now() WHERE recipient_id = $1 AND sender_id = $2 AND read_at IS NULL",
        )
        .bind(actor.user_id())
        .bind(sender_id)
        .execute(mm.executor())
        .await?;
        Ok(result.rows_affected())
    }
}

// Utils

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct InboxEntryRow {
    pub partner_id: Uuid,
    pub partner_name: String,
    pub last_body: String,
    pub last_at: DateTime<Utc>,
    pub unread: i64,
}

impl InboxEntryRow {
    /// One row per conversation partner, newest first.
    pub async fn fetch_for(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            WITH mine AS (
                SELECT
                    m.*,
                    CASE WHEN m.sender_id = $1 THEN m.recipient_id ELSE m.sender_id END AS partner_id
                FROM messages m
                WHERE m.sender_id = $1 OR m.recipient_id = $1
            ),
            latest AS (
                SELECT DISTINCT ON (partner_id) partner_id, body, created_at
                FROM mine
                ORDER BY partner_id, created_at DESC, id DESC
            )
            SELECT
                l.partner_id,
                COALESCE(NULLIF(u.display_name, ''), u.username) AS partner_name,
                l.body AS last_body,
                l.created_at AS last_at,
                (
                    SELECT COUNT(*) FROM mine
                    WHERE mine.partner_id = l.partner_id
                    AND mine.recipient_id = $1
                    AND mine.read_at IS NULL
                ) AS unread
            FROM latest l
            JOIN users u ON u.id = l.partner_id
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn body_is_trimmed_and_bounded() {
        assert_eq!(normalize_body("  hello \n"), Some("hello"));
        assert_eq!(normalize_body("   "), None);
        assert_eq!(normalize_body(""), None);

        let max = "a".repeat(MAX_MESSAGE_CHARS);
        assert_eq!(normalize_body(&max), Some(max.as_str()));
        assert_eq!(normalize_body(&format!("{max}b")), None);
    }

    #[test]
    fn body_length_counts_chars_not_bytes() {
        let body = "é".repeat(MAX_MESSAGE_CHARS);
        assert!(normalize_body(&body).is_some());
    }
}
