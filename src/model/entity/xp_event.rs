use uuid::Uuid;

use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

/// What an XP grant was for. Together with the source id it makes a grant unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XpReason {
    LessonCompleted,
    CourseCompleted,
}

impl XpReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessonCompleted => "lesson_completed",
            Self::CourseCompleted => "course_completed",
        }
    }
}

/// Balance and level right after a grant.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct XpBalance {
    pub xp: i64,
    pub level: i32,
}

pub struct XpEvent;

impl XpEvent {
    /// Records the grant, bumps `users.xp` and recomputes `users.level` in one statement,
    /// so concurrent grants cannot leave the level behind the balance.
    /// `None` means this grant was already recorded.
    pub async fn grant(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        reason: XpReason,
        source_id: Uuid,
        amount: i64,
        level_base_xp: i64,
    ) -> DatabaseResult<Option<XpBalance>> {
        // level = 1 + isqrt(xp / base), evaluated on the row being updated
        let row = sqlx::query_as(
            r#"
            WITH ev AS (
                INSERT INTO xp_events (id, user_id, amount, reason, source_id)
                VALUES ($1,$2,$3,$4,$5)
                ON CONFLICT (user_id, reason, source_id) DO NOTHING
                RETURNING user_id, amount
            )
            UPDATE users u
            SET xp = u.xp + ev.amount,
                level = 1 + floor(sqrt(((u.xp + ev.amount) / $6)::numeric))::int
            FROM ev
            WHERE u.id = ev.user_id
            RETURNING u.xp AS xp, u.level AS level
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(amount.max(0))
        .bind(reason.as_str())
        .bind(source_id)
        .bind(level_base_xp.max(1))
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }
}
