use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::{DatabaseError, DatabaseResult}};
use crate::web::AuthenticatedUser;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Certificate {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    serial: String,
    issued_at: DateTime<Utc>,
}

impl ResourceTyped for Certificate {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Certificate
    }
}

impl Certificate {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn issued_at(&self) -> &DateTime<Utc> {
        &self.issued_at
    }
}

/// `CERT-YYYYMMDD-XXXXXXXX`, the suffix being the first 8 hex digits of the id.
pub fn certificate_serial(issued_at: DateTime<Utc>, id: Uuid) -> String {
    let hex = id.simple().to_string();
    format!(
        "CERT-{}-{}",
        issued_at.format("%Y%m%d"),
        hex[..8].to_uppercase()
    )
}

const SERIAL_CONSTRAINT: &str = "certificates_serial_key";
const SERIAL_ATTEMPTS: usize = 3;

impl Certificate {
    /// `None` when the user already holds a certificate for the course.
    pub async fn issue(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let ids: Vec<Uuid> = (0..SERIAL_ATTEMPTS).map(|_| Uuid::new_v4()).collect();
        Self::issue_with_ids(mm, actor, user_id, course_id, &ids).await
    }

    /// Tries each id in turn, moving on only when its serial is already taken.
    pub async fn issue_with_ids(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
        ids: &[Uuid],
    ) -> DatabaseResult<Option<Self>> {
        let issued_at = Utc::now();
        let mut last_err = None;

        for &id in ids {
            let result = sqlx::query_as(
                r#"
                INSERT INTO certificates (id, user_id, course_id, serial, issued_at)
                VALUES ($1,$2,$3,$4,$5)
                ON CONFLICT (user_id, course_id) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(user_id)
            .bind(course_id)
            .bind(certificate_serial(issued_at, id))
            .bind(issued_at)
            .fetch_optional(mm.executor())
            .await
            .map_err(DatabaseError::from);

            match result {
                Ok(row) => return Ok(row),
                Err(e) if e.violates(SERIAL_CONSTRAINT) => {
                    tracing::warn!(%user_id, %course_id, "certificate serial collision, retrying");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound)))
    }

    pub async fn find_for(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM certificates WHERE user_id = $1 AND course_id = $2")
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }

    pub async fn count_by_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM certificates WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

#[async_trait::async_trait]
impl HasOwner for Certificate {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

// Utils

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CertificateDetailsRow {
    pub id: Uuid,
    pub serial: String,
    pub course_id: Uuid,
    pub course_title: String,
    pub holder_name: String,
    pub issued_at: DateTime<Utc>,
}

impl CertificateDetailsRow {
    const SELECT: &'static str = r#"
        SELECT
            ce.id,
            ce.serial,
            ce.course_id,
            c.title AS course_title,
            COALESCE(NULLIF(u.display_name, ''), u.username) AS holder_name,
            ce.issued_at
        FROM certificates ce
        JOIN courses c ON c.id = ce.course_id
        JOIN users u ON u.id = ce.user_id
    "#;

    pub async fn find_by_serial(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        serial: &str,
    ) -> DatabaseResult<Option<Self>> {
        let sql = format!("{} WHERE ce.serial = $1", Self::SELECT);
        let row = sqlx::query_as(&sql)
            .bind(serial.trim().to_uppercase())
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }

    pub async fn fetch_by_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let sql = format!("{} WHERE ce.user_id = $1 ORDER BY ce.issued_at DESC", Self::SELECT);
        let rows = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn serial_format() {
        let issued = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let id = Uuid::parse_str("0a1b2c3d-0000-4000-8000-000000000000").unwrap();
        assert_eq!(certificate_serial(issued, id), "CERT-20240309-0A1B2C3D");
    }
}
