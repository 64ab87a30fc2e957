use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use crate::model::ResourceTyped;
use crate::model::entity::{Certificate, CertificateDetailsRow};
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebError, WebResult};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/mine", get(certificates_mine_handler))
        .route("/verify/{serial}", get(certificates_verify_handler))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates/mine",
    description = "Certificates held by the caller, newest first",
    responses(
        (status = 200, description = "Certificates", body = [CertificateDetailsRow]),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "certificates",
    security(("cookie" = []))
)]
pub(crate) async fn certificates_mine_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let certificates = CertificateDetailsRow::fetch_by_user(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Certificate::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(certificates)))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates/verify/{serial}",
    description = "Public certificate lookup by serial number",
    params(("serial" = String, Path, description = "Serial printed on the certificate")),
    responses(
        (status = 200, description = "Certificate is genuine", body = CertificateDetailsRow),
        (status = 404, description = "No such certificate", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "certificates"
)]
pub(crate) async fn certificates_verify_handler(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> WebResult<impl IntoResponse> {
    let certificate =
        CertificateDetailsRow::find_by_serial(state.pool(), &RequestContext::guest(), &serial)
            .await
            .map_err(|e| WebError::resource_fetch_error(Certificate::get_resource_type(), e))?
            .ok_or(WebError::resource_not_found(Certificate::get_resource_type()))?;

    Ok((StatusCode::OK, Json(certificate)))
}
