use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SendMessageBody {
    pub recipient_id: Uuid,
    pub body: String,
}
