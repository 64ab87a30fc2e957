use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::entity::Educator;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Requested,
    Confirmed,
    Cancelled,
    Completed,
}

/// Which side of a session the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionParty {
    Educator,
    Student,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDenied {
    /// The caller's side may never set this status.
    NotAllowed,
    /// The status cannot be reached from the current one.
    InvalidState,
}

impl SessionStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "requested" => Some(Self::Requested),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Requested | Self::Confirmed)
    }

    pub fn check_transition(
        &self,
        party: SessionParty,
        to: SessionStatus,
    ) -> Result<(), TransitionDenied> {
        let permitted = match party {
            SessionParty::Educator => matches!(to, Self::Confirmed | Self::Cancelled | Self::Completed),
            SessionParty::Student => to == Self::Cancelled,
        };
        if !permitted {
            return Err(TransitionDenied::NotAllowed);
        }

        let reachable = match (self, to) {
            (Self::Requested, Self::Confirmed) => true,
            (Self::Requested | Self::Confirmed, Self::Cancelled) => true,
            (Self::Confirmed, Self::Completed) => true,
            _ => false,
        };
        if reachable {
            Ok(())
        } else {
            Err(TransitionDenied::InvalidState)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct MentorshipSession {
    id: Uuid,
    educator_id: Uuid,
    student_id: Uuid,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    status: String,
    notes: String,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for MentorshipSession {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::MentorshipSession
    }
}

impl MentorshipSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn educator_id(&self) -> Uuid {
        self.educator_id
    }

    pub fn student_id(&self) -> Uuid {
        self.student_id
    }

    pub fn starts_at(&self) -> &DateTime<Utc> {
        &self.starts_at
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::parse(&self.status).unwrap_or(SessionStatus::Requested)
    }

    /// `None` when the slot overlaps an active session of the educator.
    pub async fn book(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        educator: &Educator,
        starts_at: DateTime<Utc>,
        notes: &str,
    ) -> DatabaseResult<Option<Self>> {
        let ends_at = starts_at + educator.session_length();
        let mut tx = mm.executor().begin().await?;

        // Serializes bookings per educator.
        sqlx::query("SELECT id FROM educators WHERE id = $1 FOR UPDATE")
            .bind(educator.id())
            .execute(&mut *tx)
            .await?;

        let overlapping: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM mentorship_sessions
                WHERE educator_id = $1
                AND status IN ('requested', 'confirmed')
                AND starts_at < $3
                AND ends_at > $2
            )
            "#,
        )
        .bind(educator.id())
        .bind(starts_at)
        .bind(ends_at)
        .fetch_one(&mut *tx)
        .await?;

        if overlapping {
            return Ok(None);
        }

        let session = sqlx::query_as(
            r#"
            INSERT INTO mentorship_sessions (id, educator_id, student_id, starts_at, ends_at, notes)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(educator.id())
        .bind(actor.user_id())
        .bind(starts_at)
        .bind(ends_at)
        .bind(notes.trim())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(session))
    }

    pub async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM mentorship_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Sessions where the actor is the student or the educator.
    pub async fn list_mine(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT s.* FROM mentorship_sessions s
            JOIN educators e ON e.id = s.educator_id
            WHERE s.student_id = $1 OR e.user_id = $1
            ORDER BY s.starts_at
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    /// `None` if the status changed concurrently.
    pub async fn set_status(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        to: SessionStatus,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            "UPDATE mentorship_sessions SET status = $1 WHERE id = $2 AND status = $3 RETURNING *",
        )
        .bind(to.as_str())
        .bind(self.id)
        .bind(self.status().as_str())
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use SessionParty::{Educator as Edu, Student};
    use SessionStatus::*;

    #[test]
    fn educator_transitions() {
        assert_eq!(Requested.check_transition(Edu, Confirmed), Ok(()));
        assert_eq!(Requested.check_transition(Edu, Cancelled), Ok(()));
        assert_eq!(Confirmed.check_transition(Edu, Completed), Ok(()));
        assert_eq!(Confirmed.check_transition(Edu, Cancelled), Ok(()));

        assert_eq!(
            Requested.check_transition(Edu, Completed),
            Err(TransitionDenied::InvalidState)
        );
        assert_eq!(
            Cancelled.check_transition(Edu, Confirmed),
            Err(TransitionDenied::InvalidState)
        );
        assert_eq!(
            Confirmed.check_transition(Edu, Requested),
            Err(TransitionDenied::NotAllowed)
        );
    }

    #[test]
    fn student_may_only_cancel() {
        assert_eq!(Requested.check_transition(Student, Cancelled), Ok(()));
        assert_eq!(Confirmed.check_transition(Student, Cancelled), Ok(()));
        assert_eq!(
            Requested.check_transition(Student, Confirmed),
            Err(TransitionDenied::NotAllowed)
        );
        assert_eq!(
            Confirmed.check_transition(Student, Completed),
            Err(TransitionDenied::NotAllowed)
        );
        assert_eq!(
            Completed.check_transition(Student, Cancelled),
            Err(TransitionDenied::InvalidState)
        );
    }

    #[test]
    fn active_statuses() {
        assert!(Requested.is_active());
        assert!(Confirmed.is_active());
        assert!(!Cancelled.is_active());
        assert!(!Completed.is_active());
    }
}
