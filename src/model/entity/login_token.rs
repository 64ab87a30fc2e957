use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{DatabaseResult, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

/// Single-use magic-link token.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct LoginToken {
    id: Uuid,
    token: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct LoginTokenCreate {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl ResourceTyped for LoginToken {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::LoginToken
    }
}

impl LoginToken {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn expires_at(&self) -> &DateTime<Utc> {
        &self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl LoginToken {
    pub async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LoginTokenCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO login_tokens (id, token, user_id, expires_at)
            VALUES ($1,$2,$3,$4)
            RETURNING id, token, user_id, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.token)
        .bind(data.user_id)
        .bind(data.expires_at)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    /// Deletes the token and hands it back; a token can be consumed once.
    pub async fn consume(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        token: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("DELETE FROM login_tokens WHERE token = $1 RETURNING *")
            .bind(token)
            .fetch_optional(mm.executor())
            .await?;

        Ok(result)
    }

    pub async fn cleanup_expired(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<u64> {
        let result = sqlx::query(r#"DELETE FROM login_tokens WHERE expires_at < now()"#)
            .execute(mm.executor())
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn expiry_is_inclusive() {
        let now = Utc::now();
        let token = LoginToken {
            id: Uuid::new_v4(),
            token: String::from("t"),
            user_id: Uuid::new_v4(),
            expires_at: now,
            created_at: now,
        };
        assert!(token.is_expired(now));
        assert!(!token.is_expired(now - chrono::Duration::seconds(1)));
    }
}
