use serde::Serialize;
use uuid::Uuid;

use crate::model::entity::LessonWithStatusRow;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LessonResponse {
    id: Uuid,
    module_id: Uuid,
    course_id: Uuid,
    title: String,
    content: String,
    xp_reward: i32,
    completed: bool,
    next_lesson_id: Option<Uuid>,
}

impl LessonResponse {
    pub fn new(row: LessonWithStatusRow, next: Option<LessonWithStatusRow>) -> Self {
        Self {
            id: row.id,
            module_id: row.module_id,
            course_id: row.course_id,
            title: row.title,
            content: row.content,
            xp_reward: row.xp_reward,
            completed: row.completed,
            next_lesson_id: next.map(|n| n.id),
        }
    }
}
