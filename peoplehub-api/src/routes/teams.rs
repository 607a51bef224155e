/// Team endpoints
///
/// - `GET /v1/teams` - filter `department_id`
/// - `POST /v1/teams`
/// - `GET /v1/teams/:id` - the team with its members
/// - `PUT|DELETE /v1/teams/:id` (delete refused while it has members)
/// - `POST /v1/teams/:id/members` - `{ "employee_id": ... }`
/// - `DELETE /v1/teams/:id/members` - `{ "employee_id": ... }`

use axum::{extract::State, http::StatusCode, Extension, Json};
use peoplehub_shared::{
    models::team::{Team, TeamDetail, TeamFilter, TeamInput, TeamMember},
    tenancy::{Page, TenantContext},
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
    AppQuery(filter): AppQuery<TeamFilter>,
) -> ApiResult<Json<Vec<Team>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Team::list(&mut conn, &tenant, filter, page).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppJson(input): AppJson<TeamInput>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    let team = Team::create(&mut conn, &tenant, input).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<TeamDetail>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Team::detail(&mut conn, &tenant, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<TeamInput>,
) -> ApiResult<Json<Team>> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(Team::update(&mut conn, &tenant, id, input).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    Team::delete(&mut conn, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_member(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(member): AppJson<TeamMember>,
) -> ApiResult<Json<TeamDetail>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Team::add_member(&mut conn, &tenant, id, member.employee_id).await?))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(member): AppJson<TeamMember>,
) -> ApiResult<Json<TeamDetail>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Team::remove_member(&mut conn, &tenant, id, member.employee_id).await?))
}
