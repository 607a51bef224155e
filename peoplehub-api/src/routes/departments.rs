/// Department endpoints
///
/// - `GET /v1/departments` - page of departments
/// - `POST /v1/departments`
/// - `GET /v1/departments/tree` - every department nested under its parent
/// - `GET|PUT|DELETE /v1/departments/:id`
/// - `GET /v1/departments/:id/positions`
///
/// A department of another tenant is `403`; a parent or head from another
/// tenant is `422 cross_tenant_reference`.

use axum::{extract::State, http::StatusCode, Extension, Json};
use peoplehub_shared::{
    models::{
        department::{Department, DepartmentInput, DepartmentNode},
        position::Position,
    },
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
) -> ApiResult<Json<Vec<Department>>> {
    let mut conn = state.db.acquire().await?;
    let departments = scope::list::<Department>(&mut conn, &tenant, page).await?;
    Ok(Json(departments))
}

pub async fn tree(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
) -> ApiResult<Json<Vec<DepartmentNode>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Department::tree(&mut conn, &tenant).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppJson(input): AppJson<DepartmentInput>,
) -> ApiResult<(StatusCode, Json<Department>)> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    let department = Department::create(&mut conn, &tenant, input).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Department>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(scope::find::<Department>(&mut conn, &tenant, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<DepartmentInput>,
) -> ApiResult<Json<Department>> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(Department::update(&mut conn, &tenant, id, input).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    Department::delete(&mut conn, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn positions(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(page): AppQuery<Page>,
) -> ApiResult<Json<Vec<Position>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Position::in_department(&mut conn, &tenant, id, page).await?))
}
