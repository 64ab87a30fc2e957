use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::access::HasOwner;
use crate::model::entity::QuizAnswer;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizAttempt {
    id: Uuid,
    user_id: Uuid,
    quiz_id: Uuid,
    score: i32,
    passed: bool,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for QuizAttempt {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuizAttempt
    }
}

impl QuizAttempt {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn passed(&self) -> bool {
        self.passed
    }
}

pub struct QuizAttemptCreate {
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub score: i32,
    pub passed: bool,
}

impl QuizAttempt {
    pub async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizAttemptCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO quiz_attempts (id, user_id, quiz_id, score, passed)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.quiz_id)
        .bind(data.score)
        .bind(data.passed)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    pub async fn has_passed(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> DatabaseResult<bool> {
        let result: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM quiz_attempts WHERE user_id = $1 AND quiz_id = $2 AND passed)",
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}

#[async_trait::async_trait]
impl HasOwner for QuizAttempt {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

// Grading

#[derive(Debug, Clone, Copy, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AnswerSubmission {
    pub question_id: Uuid,
    pub answer_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestionOutcome {
    pub question_id: Uuid,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub score: i32,
    pub passed: bool,
    pub outcomes: Vec<QuestionOutcome>,
}

/// Grades a submission against the quiz's answer key.
///
/// Unanswered questions count as wrong, so does an answer id that belongs to
/// another question. Only the first submission per question is considered.
/// A quiz without questions scores 100.
pub fn grade(
    question_ids: &[Uuid],
    answer_key: &[QuizAnswer],
    submissions: &[AnswerSubmission],
    pass_score: i32,
) -> Grade {
    let outcomes: Vec<QuestionOutcome> = question_ids
        .iter()
        .map(|&question_id| {
            let correct = submissions
                .iter()
                .find(|s| s.question_id == question_id)
                .and_then(|s| answer_key.iter().find(|a| a.id() == s.answer_id))
                .is_some_and(|a| a.question_id() == question_id && a.is_correct());
            QuestionOutcome {
                question_id,
                correct,
            }
        })
        .collect();

    let total = outcomes.len() as i64;
    let correct = outcomes.iter().filter(|o| o.correct).count() as i64;
    let score = if total == 0 {
        100
    } else {
        (correct * 100 / total) as i32
    };

    Grade {
        score,
        passed: score >= pass_score,
        outcomes,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Fixture {
        q1: Uuid,
        q2: Uuid,
        q3: Uuid,
        key: Vec<QuizAnswer>,
    }

    impl Fixture {
        fn new() -> Self {
            let (q1, q2, q3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
            let key = vec![
                QuizAnswer::new(Uuid::new_v4(), q1, String::from("right"), true),
                QuizAnswer::new(Uuid::new_v4(), q1, String::from("wrong"), false),
                QuizAnswer::new(Uuid::new_v4(), q2, String::from("right"), true),
                QuizAnswer::new(Uuid::new_v4(), q3, String::from("right"), true),
            ];
            Self { q1, q2, q3, key }
        }

        fn questions(&self) -> Vec<Uuid> {
            vec![self.q1, self.q2, self.q3]
        }

        fn submit(&self, question_id: Uuid, answer_idx: usize) -> AnswerSubmission {
            AnswerSubmission {
                question_id,
                answer_id: self.key[answer_idx].id(),
            }
        }
    }

    #[test]
    fn all_correct_passes() {
        let f = Fixture::new();
        let subs = [f.submit(f.q1, 0), f.submit(f.q2, 2), f.submit(f.q3, 3)];
        let grade = grade(&f.questions(), &f.key, &subs, 70);
        assert_eq!(grade.score, 100);
        assert!(grade.passed);
        assert!(grade.outcomes.iter().all(|o| o.correct));
    }

    #[test]
    fn score_rounds_down() {
        let f = Fixture::new();
        let subs = [f.submit(f.q1, 0), f.submit(f.q2, 2), f.submit(f.q3, 1)];
        let grade = grade(&f.questions(), &f.key, &subs, 67);
        assert_eq!(grade.score, 66);
        assert!(!grade.passed);
    }

    #[test]
    fn unanswered_is_wrong() {
        let f = Fixture::new();
        let subs = [f.submit(f.q1, 0)];
        let grade = grade(&f.questions(), &f.key, &subs, 30);
        assert_eq!(grade.score, 33);
        assert!(grade.passed);
        assert!(!grade.outcomes[1].correct);
        assert!(!grade.outcomes[2].correct);
    }

    #[test]
    fn answer_from_other_question_is_wrong() {
        let f = Fixture::new();
        // correct answer of q2 submitted for q1
        let subs = [f.submit(f.q1, 2)];
        let grade = grade(&[f.q1], &f.key, &subs, 50);
        assert_eq!(grade.score, 0);
        assert!(!grade.passed);
    }

    #[test]
    fn first_submission_wins() {
        let f = Fixture::new();
        let subs = [f.submit(f.q1, 1), f.submit(f.q1, 0)];
        let grade = grade(&[f.q1], &f.key, &subs, 50);
        assert_eq!(grade.score, 0);
    }

    #[test]
    fn unknown_answer_is_wrong() {
        let f = Fixture::new();
        let subs = [AnswerSubmission {
            question_id: f.q1,
            answer_id: Uuid::new_v4(),
        }];
        assert_eq!(grade(&[f.q1], &f.key, &subs, 50).score, 0);
    }

    #[test]
    fn empty_quiz_scores_full() {
        let grade = grade(&[], &[], &[], 70);
        assert_eq!(grade.score, 100);
        assert!(grade.passed);
    }
}
