use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizAnswer {
    id: Uuid,
    question_id: Uuid,
    answer_text: String,
    is_correct: bool,
}

impl ResourceTyped for QuizAnswer {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuizAnswer
    }
}

impl QuizAnswer {
    pub fn new(id: Uuid, question_id: Uuid, answer_text: String, is_correct: bool) -> Self {
        Self {
            id,
            question_id,
            answer_text,
            is_correct,
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn question_id(&self) -> uuid::Uuid {
        self.question_id
    }

    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuizAnswerCreate {
    pub question_id: Uuid,
    pub answer_text: String,
    pub is_correct: Option<bool>,
}

#[async_trait]
impl CrudRepository<QuizAnswer, QuizAnswerCreate, uuid::Uuid> for QuizAnswer {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizAnswerCreate,
    ) -> DatabaseResult<Self> {
        let answer = sqlx::query_as(
            "INSERT INTO quiz_answers (id, question_id, answer_text, is_correct) VALUES ($1,$2,$3,$4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.question_id)
        .bind(&data.answer_text)
        .bind(data.is_correct.unwrap_or(false))
        .fetch_one(mm.executor())
        .await?;

        Ok(answer)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizAnswerCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE quiz_answers SET question_id = $1, answer_text = $2, is_correct = $3 WHERE id = $4")
            .bind(data.question_id)
            .bind(&data.answer_text)
            .bind(data.is_correct.unwrap_or(false))
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.question_id = data.question_id;
        self.answer_text = data.answer_text;
        self.is_correct = data.is_correct.unwrap_or(false);
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM quiz_answers WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM quiz_answers WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM quiz_answers LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_answers")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

// Utils

impl QuizAnswer {
    pub async fn find_all_by_quiz(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        quiz_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<Self> = sqlx::query_as(
            r#"
            SELECT a.*
            FROM quiz_answers a
            JOIN quiz_questions q ON q.id = a.question_id
            WHERE q.quiz_id = $1
            "#
        )
        .bind(quiz_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
