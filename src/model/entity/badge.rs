use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Badge {
    id: Uuid,
    slug: String,
    title: String,
    description: String,
    criteria: String,
    threshold: i64,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct BadgeCreate {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub criteria: BadgeCriteria,
    pub threshold: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCriteria {
    FirstLesson,
    LessonsCompleted,
    CoursesCompleted,
    Xp,
}

impl BadgeCriteria {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "first_lesson" => Some(Self::FirstLesson),
            "lessons_completed" => Some(Self::LessonsCompleted),
            "courses_completed" => Some(Self::CoursesCompleted),
            "xp" => Some(Self::Xp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstLesson => "first_lesson",
            Self::LessonsCompleted => "lessons_completed",
            Self::CoursesCompleted => "courses_completed",
            Self::Xp => "xp",
        }
    }

    pub fn is_met(&self, threshold: i64, stats: &LearnerStats) -> bool {
        match self {
            Self::FirstLesson => stats.lessons_completed >= 1,
            Self::LessonsCompleted => stats.lessons_completed >= threshold,
            Self::CoursesCompleted => stats.courses_completed >= threshold,
            Self::Xp => stats.xp >= threshold,
        }
    }
}

/// Counters badge criteria are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, FromRow)]
pub struct LearnerStats {
    pub lessons_completed: i64,
    pub courses_completed: i64,
    pub xp: i64,
}

impl LearnerStats {
    pub async fn fetch(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Self> {
        let stats = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM lesson_progress WHERE user_id = u.id) AS lessons_completed,
                (SELECT COUNT(*) FROM certificates WHERE user_id = u.id) AS courses_completed,
                u.xp
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(mm.executor())
        .await?;

        Ok(stats.unwrap_or_default())
    }
}

impl ResourceTyped for Badge {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Badge
    }
}

impl Badge {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn criteria(&self) -> Option<BadgeCriteria> {
        BadgeCriteria::parse(&self.criteria)
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }
}

#[async_trait]
impl CrudRepository<Badge, BadgeCreate, Uuid> for Badge {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: BadgeCreate,
    ) -> DatabaseResult<Self> {
        let badge = sqlx::query_as(
            r#"
            INSERT INTO badges (id, slug, title, description, criteria, threshold)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.slug)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.criteria.as_str())
        .bind(data.threshold.unwrap_or(1))
        .fetch_one(mm.executor())
        .await?;

        Ok(badge)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: BadgeCreate,
    ) -> DatabaseResult<Self> {
        let badge = sqlx::query_as(
            r#"
            UPDATE badges
            SET slug = $1, title = $2, description = $3, criteria = $4, threshold = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&data.slug)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.criteria.as_str())
        .bind(data.threshold.unwrap_or(self.threshold))
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(badge)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM badges WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM badges WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM badges ORDER BY slug LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM badges")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

impl Badge {
    pub async fn all(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM badges ORDER BY slug")
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn unearned_by(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT b.* FROM badges b
            WHERE NOT EXISTS (
                SELECT 1 FROM user_badges ub WHERE ub.badge_id = b.id AND ub.user_id = $1
            )
            "#,
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    /// `true` when the badge was not held before.
    pub async fn award(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "INSERT INTO user_badges (user_id, badge_id) VALUES ($1,$2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(self.id)
        .execute(mm.executor())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Awards every badge the user now qualifies for, returns the new slugs.
    pub async fn evaluate_for(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<String>> {
        let stats = LearnerStats::fetch(mm, actor, user_id).await?;
        let candidates = Badge::unearned_by(mm, actor, user_id).await?;

        let mut awarded = Vec::new();
        for badge in qualifying(candidates, &stats) {
            if badge.award(mm, actor, user_id).await? {
                tracing::debug!(%user_id, badge = badge.slug(), "badge awarded");
                awarded.push(badge.slug);
            }
        }
        Ok(awarded)
    }
}

/// Filters badges whose criteria hold; unknown criteria never qualify.
pub fn qualifying(badges: Vec<Badge>, stats: &LearnerStats) -> Vec<Badge> {
    badges
        .into_iter()
        .filter(|b| b.criteria().is_some_and(|c| c.is_met(b.threshold, stats)))
        .collect()
}

// Utils

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserBadgeRow {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub awarded_at: DateTime<Utc>,
}

impl UserBadgeRow {
    pub async fn fetch_by_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT b.slug, b.title, b.description, ub.awarded_at
            FROM user_badges ub
            JOIN badges b ON b.id = ub.badge_id
            WHERE ub.user_id = $1
            ORDER BY ub.awarded_at
            "#,
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
