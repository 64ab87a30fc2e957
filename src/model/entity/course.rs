use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::{AuthenticatedUser, UserRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    slug: String,
    title: String,
    description: String,
    xp_reward: i32,
    published: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub xp_reward: Option<i32>,
    pub published: Option<bool>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn xp_reward(&self) -> i32 {
        self.xp_reward
    }

    pub fn published(&self) -> bool {
        self.published
    }

    /// Unpublished courses exist only for admins.
    pub fn visible_to(&self, actor: &AuthenticatedUser) -> bool {
        self.published || actor.user_role() == UserRole::Admin
    }
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, Uuid> for Course {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let course = sqlx::query_as(
            r#"
            INSERT INTO courses (id, slug, title, description, xp_reward, published)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.slug)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.xp_reward.unwrap_or(0))
        .bind(data.published.unwrap_or(false))
        .fetch_one(mm.executor())
        .await?;

        Ok(course)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE courses SET slug = $1, title = $2, description = $3, xp_reward = $4, published = $5 WHERE id = $6",
        )
        .bind(&data.slug)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.xp_reward.unwrap_or(self.xp_reward))
        .bind(data.published.unwrap_or(self.published))
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.xp_reward = data.xp_reward.unwrap_or(self.xp_reward);
        self.published = data.published.unwrap_or(self.published);
        self.slug = data.slug;
        self.title = data.title;
        self.description = data.description;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM courses WHERE published OR $1 ORDER BY created_at LIMIT $2 OFFSET $3",
        )
        .bind(actor.user_role() == UserRole::Admin)
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE published OR $1")
            .bind(actor.user_role() == UserRole::Admin)
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Course, CourseCreate, Uuid);

impl Course {
    pub async fn find_by_slug(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        slug: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE slug = $1")
            .bind(slug)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}

// Utils

/// Catalog row with the caller's enrollment, if any.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseWithProgressRow {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub xp_reward: i32,
    pub published: bool,
    pub lesson_count: i64,
    pub enrolled: bool,
    pub progress_pct: i32,
}

impl CourseWithProgressRow {
    pub async fn fetch_all(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                c.id,
                c.slug,
                c.title,
                c.description,
                c.xp_reward,
                c.published,
                (
                    SELECT COUNT(*) FROM lessons l
                    JOIN modules m ON m.id = l.module_id
                    WHERE m.course_id = c.id
                ) AS lesson_count,
                (e.id IS NOT NULL) AS enrolled,
                COALESCE(e.progress_pct, 0) AS progress_pct
            FROM courses c
            LEFT JOIN enrollments e
                ON e.course_id = c.id
                AND e.user_id = $1
            WHERE c.published OR $2
            ORDER BY c.created_at
            "#,
        )
        .bind(actor.user_id())
        .bind(actor.user_role() == UserRole::Admin)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
