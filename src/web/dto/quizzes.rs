use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{
    AnswerSubmission, Certificate, Grade, Quiz, QuizAnswer, QuizQuestion,
};
use crate::model::progression::CourseStatus;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct AnswerOption {
    id: Uuid,
    answer_text: String,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuestionView {
    id: Uuid,
    question: String,
    order_index: i32,
    answers: Vec<AnswerOption>,
}

/// A quiz as learners see it, correctness is never exposed.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuizView {
    id: Uuid,
    course_id: Uuid,
    title: String,
    pass_score: i32,
    questions: Vec<QuestionView>,
}

impl QuizView {
    pub fn from_entities(quiz: &Quiz, questions: Vec<QuizQuestion>, answers: Vec<QuizAnswer>) -> Self {
        let questions = questions
            .into_iter()
            .map(|q| QuestionView {
                id: q.id(),
                question: q.question().to_string(),
                order_index: q.order_index(),
                answers: answers
                    .iter()
                    .filter(|a| a.question_id() == q.id())
                    .map(|a| AnswerOption {
                        id: a.id(),
                        answer_text: a.answer_text().to_string(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            id: quiz.id(),
            course_id: quiz.course_id(),
            title: quiz.title().to_string(),
            pass_score: quiz.pass_score(),
            questions,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AttemptBody {
    pub answers: Vec<AnswerSubmission>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuestionResult {
    question_id: Uuid,
    correct: bool,
    explanation: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AttemptResult {
    pub attempt_id: Uuid,
    pub score: i32,
    pub passed: bool,
    pub pass_score: i32,
    pub results: Vec<QuestionResult>,
    pub course_status: Option<CourseStatus>,
    pub certificate: Option<Certificate>,
}

impl QuestionResult {
    pub fn from_grade(grade: &Grade, questions: &[QuizQuestion]) -> Vec<Self> {
        grade
            .outcomes
            .iter()
            .map(|o| QuestionResult {
                question_id: o.question_id,
                correct: o.correct,
                explanation: questions
                    .iter()
                    .find(|q| q.id() == o.question_id)
                    .map(|q| q.explanation().to_string())
                    .unwrap_or_default(),
            })
            .collect()
    }
}
