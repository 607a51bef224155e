/// Position endpoints
///
/// - `GET /v1/positions` - filters `department_id`, `is_active`
/// - `GET /v1/positions/active`
/// - `POST /v1/positions`
/// - `GET|PUT|DELETE /v1/positions/:id` (delete refused while held)

use axum::{extract::State, http::StatusCode, Extension, Json};
use peoplehub_shared::{
    models::position::{Position, PositionFilter, PositionInput},
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
    AppQuery(filter): AppQuery<PositionFilter>,
) -> ApiResult<Json<Vec<Position>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Position::list(&mut conn, &tenant, filter, page).await?))
}

pub async fn active(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppQuery(page): AppQuery<Page>,
) -> ApiResult<Json<Vec<Position>>> {
    let filter = PositionFilter {
        is_active: Some(true),
        ..Default::default()
    };

    let mut conn = state.db.acquire().await?;
    Ok(Json(Position::list(&mut conn, &tenant, filter, page).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppJson(input): AppJson<PositionInput>,
) -> ApiResult<(StatusCode, Json<Position>)> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    let position = Position::create(&mut conn, &tenant, input).await?;
    Ok((StatusCode::CREATED, Json(position)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Position>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(scope::find::<Position>(&mut conn, &tenant, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<PositionInput>,
) -> ApiResult<Json<Position>> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(Position::update(&mut conn, &tenant, id, input).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    Position::delete(&mut conn, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
