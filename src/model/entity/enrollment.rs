use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Enrollment {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    progress_pct: i32,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn progress_pct(&self) -> i32 {
        self.progress_pct
    }

    pub fn completed_at(&self) -> Option<&DateTime<Utc>> {
        self.completed_at.as_ref()
    }
}

impl Enrollment {
    /// Idempotent: an existing enrollment is returned untouched.
    pub async fn upsert(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO enrollments (id, user_id, course_id)
            VALUES ($1,$2,$3)
            ON CONFLICT (user_id, course_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    pub async fn set_progress(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
        progress_pct: i32,
    ) -> DatabaseResult<()> {
        sqlx::query("UPDATE enrollments SET progress_pct = $1 WHERE user_id = $2 AND course_id = $3")
            .bind(progress_pct.clamp(0, 100))
            .bind(user_id)
            .bind(course_id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    pub async fn mark_completed(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE enrollments
            SET progress_pct = 100, completed_at = COALESCE(completed_at, now())
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .execute(mm.executor())
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl HasOwner for Enrollment {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

// Utils

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct EnrollmentWithCourseRow {
    pub course_id: Uuid,
    pub course_title: String,
    pub progress_pct: i32,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl EnrollmentWithCourseRow {
    pub async fn fetch_by_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                e.course_id,
                c.title AS course_title,
                e.progress_pct,
                e.enrolled_at,
                e.completed_at
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            WHERE e.user_id = $1
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
