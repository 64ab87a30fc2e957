use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct LessonProgress {
    id: Uuid,
    user_id: Uuid,
    lesson_id: Uuid,
    completed_at: DateTime<Utc>,
}

impl ResourceTyped for LessonProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::LessonProgress
    }
}

impl LessonProgress {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn completed_at(&self) -> &DateTime<Utc> {
        &self.completed_at
    }
}

impl LessonProgress {
    /// Returns `true` only for the call that actually inserted the row.
    pub async fn record(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO lesson_progress (id, user_id, lesson_id)
            VALUES ($1,$2,$3)
            ON CONFLICT (user_id, lesson_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(lesson_id)
        .execute(mm.executor())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn count_completed_in_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM lesson_progress lp
            JOIN lessons l ON l.id = lp.lesson_id
            JOIN modules m ON m.id = l.module_id
            WHERE lp.user_id = $1 AND m.course_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn count_completed(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lesson_progress WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}
