use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Lesson {
    id: Uuid,
    module_id: Uuid,
    title: String,
    content: String,
    order_index: i32,
    xp_reward: i32,
}

impl ResourceTyped for Lesson {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Lesson
    }
}

impl Lesson {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn module_id(&self) -> uuid::Uuid {
        self.module_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }

    pub fn xp_reward(&self) -> i32 {
        self.xp_reward
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonCreate {
    pub module_id: Uuid,
    pub title: String,
    pub content: String,
    pub order_index: Option<i32>,
    pub xp_reward: Option<i32>,
}

#[async_trait]
impl CrudRepository<Lesson, LessonCreate, uuid::Uuid> for Lesson {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        let lesson = sqlx::query_as(
            r#"
            INSERT INTO lessons (id, module_id, title, content, order_index, xp_reward)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.module_id)
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.order_index.unwrap_or(0))
        .bind(data.xp_reward.unwrap_or(10))
        .fetch_one(mm.executor())
        .await?;

        Ok(lesson)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        let lesson = sqlx::query_as(
            r#"
            UPDATE lessons
            SET module_id = $1, title = $2, content = $3, order_index = $4, xp_reward = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(data.module_id)
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.order_index.unwrap_or(self.order_index))
        .bind(data.xp_reward.unwrap_or(self.xp_reward))
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(lesson)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM lessons WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM lessons ORDER BY module_id, order_index LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Lesson {
    pub async fn course_id_of(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Option<Uuid>> {
        let result = sqlx::query_scalar(
            "SELECT m.course_id FROM lessons l JOIN modules m ON m.id = l.module_id WHERE l.id = $1",
        )
        .bind(lesson_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn count_in_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM lessons l
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = $1
            "#,
        )
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}

// Utils

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LessonWithStatusRow {
    pub id: Uuid,
    pub module_id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub content: String,
    pub xp_reward: i32,
    pub completed: bool,
}

impl LessonWithStatusRow {
    pub async fn find_by_id(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            SELECT
                l.id,
                l.module_id,
                m.course_id,
                l.title,
                l.content,
                l.xp_reward,
                (lp.id IS NOT NULL) AS completed
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            LEFT JOIN lesson_progress lp
                ON l.id = lp.lesson_id AND lp.user_id = $2
            WHERE l.id = $1
            "#,
        )
        .bind(lesson_id)
        .bind(actor.user_id())
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }

    /// Next lesson of the same course, in outline order, that the caller has not completed.
    pub async fn find_next_uncompleted(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            WITH cur AS (
                SELECT l.id, l.order_index AS lesson_order, m.id AS module_id, m.order_index AS module_order, m.course_id
                FROM lessons l
                JOIN modules m ON m.id = l.module_id
                WHERE l.id = $1
            )
            SELECT
                l.id,
                l.module_id,
                m.course_id,
                l.title,
                l.content,
                l.xp_reward,
                FALSE AS completed
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            JOIN cur ON cur.course_id = m.course_id
            LEFT JOIN lesson_progress lp
                ON lp.lesson_id = l.id
                AND lp.user_id = $2
            WHERE (m.order_index, m.id, l.order_index, l.id)
                > (cur.module_order, cur.module_id, cur.lesson_order, cur.id)
            AND lp.id IS NULL
            ORDER BY m.order_index ASC, m.id ASC, l.order_index ASC, l.id ASC
            LIMIT 1;
            "#,
        )
        .bind(lesson_id)
        .bind(actor.user_id())
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }
}
