use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::entity::{Educator, SessionStatus};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct BookingBody {
    pub educator_id: uuid::Uuid,
    pub starts_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SessionStatusBody {
    pub status: SessionStatus,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EducatorProfile {
    pub educator: Educator,
    pub display_name: String,
}
