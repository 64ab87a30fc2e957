use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::prelude::Row;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizQuestion {
    id: Uuid,
    quiz_id: Uuid,
    question: String,
    explanation: String,
    order_index: i32,
}

impl ResourceTyped for QuizQuestion {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuizQuestion
    }
}

impl QuizQuestion {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn quiz_id(&self) -> uuid::Uuid {
        self.quiz_id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuizQuestionCreate {
    pub quiz_id: Uuid,
    pub question: String,
    pub explanation: String,
    pub order_index: Option<i32>,
}

#[async_trait]
impl CrudRepository<QuizQuestion, QuizQuestionCreate, uuid::Uuid> for QuizQuestion {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizQuestionCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query("INSERT INTO quiz_questions (id, quiz_id, question, explanation, order_index) VALUES ($1,$2,$3,$4,$5) RETURNING id")
            .bind(Uuid::new_v4())
            .bind(data.quiz_id)
            .bind(&data.question)
            .bind(&data.explanation)
            .bind(data.order_index.unwrap_or(0))
            .fetch_one(mm.executor())
            .await?;

        let id = result.try_get("id")?;
        Ok(QuizQuestion {
            id,
            quiz_id: data.quiz_id,
            question: data.question,
            explanation: data.explanation,
            order_index: data.order_index.unwrap_or(0),
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizQuestionCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE quiz_questions SET quiz_id = $1, question = $2, explanation = $3, order_index = $4 WHERE id = $5")
            .bind(data.quiz_id)
            .bind(&data.question)
            .bind(&data.explanation)
            .bind(data.order_index.unwrap_or(0))
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.quiz_id = data.quiz_id;
        self.question = data.question;
        self.explanation = data.explanation;
        self.order_index = data.order_index.unwrap_or(0);
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM quiz_questions WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM quiz_questions WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM quiz_questions LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_questions")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

// Utils
impl QuizQuestion {
    pub async fn find_all_by_quiz(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        quiz_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<Self> = sqlx::query_as(
            r#"
            SELECT *
            FROM quiz_questions q
            WHERE q.quiz_id = $1
            ORDER BY q.order_index
            "#
        )
        .bind(quiz_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
