use chrono::Duration;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

pub const MIN_SESSION_MINUTES: i32 = 15;
pub const MAX_SESSION_MINUTES: i32 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EducatorTier {
    Instructor,
    Mentor,
}

impl EducatorTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instructor => "instructor",
            Self::Mentor => "mentor",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Educator {
    id: Uuid,
    user_id: Uuid,
    tier: String,
    headline: String,
    session_minutes: i32,
    active: bool,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct EducatorCreate {
    pub tier: EducatorTier,
    pub headline: String,
    pub session_minutes: i32,
}

impl ResourceTyped for Educator {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Educator
    }
}

impl Educator {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn session_length(&self) -> Duration {
        Duration::minutes(self.session_minutes.into())
    }

    /// Registers the actor as educator and promotes the account role in one transaction.
    pub async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: EducatorCreate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.executor().begin().await?;

        let educator = sqlx::query_as(
            r#"
            INSERT INTO educators (id, user_id, tier, headline, session_minutes)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(data.tier.as_str())
        .bind(data.headline.trim())
        .bind(data.session_minutes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET role = 'educator' WHERE id = $1 AND role = 'user'")
            .bind(actor.user_id())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(educator)
    }

    pub async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM educators WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn find_by_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM educators WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}

pub fn valid_session_minutes(minutes: i32) -> bool {
    (MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&minutes)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn session_minutes_bounds() {
        assert!(!valid_session_minutes(14));
        assert!(valid_session_minutes(15));
        assert!(valid_session_minutes(60));
        assert!(valid_session_minutes(240));
        assert!(!valid_session_minutes(241));
    }
}
