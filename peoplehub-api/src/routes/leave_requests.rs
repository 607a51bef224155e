/// Leave request endpoints
///
/// - `GET /v1/leave-requests` - filters `employee_id`, `leave_type_id`, `status`
/// - `POST /v1/leave-requests` - starts `pending`
/// - `GET|PUT|DELETE /v1/leave-requests/:id` (`PUT` only while pending)
/// - `POST /v1/leave-requests/:id/approve`
/// - `POST /v1/leave-requests/:id/reject` - `{ "rejection_reason": ... }`
/// - `POST /v1/leave-requests/:id/cancel`
///
/// The approver is always the authenticated employee, never a body field,
/// and may not decide on their own request.

use axum::{extract::State, http::StatusCode, Extension, Json};
use peoplehub_shared::{
    auth::middleware::AuthContext,
    models::leave_request::{LeaveRequest, LeaveRequestFilter, LeaveRequestInput, RejectLeaveRequest},
    tenancy::{scope, Page, TenantContext},
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{validate_request, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
};

pub async fn list(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppQuery(page): AppQuery<Page>,
    AppQuery(filter): AppQuery<LeaveRequestFilter>,
) -> ApiResult<Json<Vec<LeaveRequest>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(LeaveRequest::list(&mut conn, &tenant, filter, page).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppJson(input): AppJson<LeaveRequestInput>,
) -> ApiResult<(StatusCode, Json<LeaveRequest>)> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    let request = LeaveRequest::create(&mut conn, &tenant, input).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<LeaveRequest>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(scope::find::<LeaveRequest>(&mut conn, &tenant, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<LeaveRequestInput>,
) -> ApiResult<Json<LeaveRequest>> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(LeaveRequest::update(&mut conn, &tenant, id, input).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    LeaveRequest::delete(&mut conn, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn approve(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<LeaveRequest>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(LeaveRequest::approve(&mut conn, &tenant, id, auth.employee_id).await?))
}

pub async fn reject(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<RejectLeaveRequest>,
) -> ApiResult<Json<LeaveRequest>> {
    validate_request(&body)?;

    let mut conn = state.db.acquire().await?;
    let request = LeaveRequest::reject(&mut conn, &tenant, id, auth.employee_id, body.rejection_reason).await?;
    Ok(Json(request))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<LeaveRequest>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(LeaveRequest::cancel(&mut conn, &tenant, id).await?))
}
