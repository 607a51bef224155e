/// Leave type endpoints
///
/// - `GET /v1/leave-types` - filter `is_active`
/// - `POST /v1/leave-types`
/// - `GET|PUT|DELETE /v1/leave-types/:id` (delete refused while requests use it)

use axum::{extract::State, http::StatusCode, Extension, Json};
use peoplehub_shared::{
    models::leave_type::{LeaveType, LeaveTypeFilter, LeaveTypeInput},
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
    AppQuery(filter): AppQuery<LeaveTypeFilter>,
) -> ApiResult<Json<Vec<LeaveType>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(LeaveType::list(&mut conn, &tenant, filter, page).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppJson(input): AppJson<LeaveTypeInput>,
) -> ApiResult<(StatusCode, Json<LeaveType>)> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    let leave_type = LeaveType::create(&mut conn, &tenant, input).await?;
    Ok((StatusCode::CREATED, Json(leave_type)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<LeaveType>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(scope::find::<LeaveType>(&mut conn, &tenant, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<LeaveTypeInput>,
) -> ApiResult<Json<LeaveType>> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(LeaveType::update(&mut conn, &tenant, id, input).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    LeaveType::delete(&mut conn, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
