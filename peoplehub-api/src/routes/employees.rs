/// Employee endpoints
///
/// - `GET /v1/employees` - filters `department_id`, `position_id`,
///   `team_id`, `employment_status`
/// - `POST /v1/employees` - profile plus `password`
/// - `GET /v1/employees/code/:code`
/// - `GET|PUT|DELETE /v1/employees/:id`
/// - `PATCH /v1/employees/:id/status` - `{ "employment_status": ... }`
/// - `GET /v1/employees/:id/contracts`
///
/// Password hashes are never serialized. `PUT` replaces the profile and
/// changes the password only when one is given.

use axum::{extract::State, http::StatusCode, Extension, Json};
use peoplehub_shared::{
    models::{
        contract::Contract,
        employee::{Employee, EmployeeFilter, NewEmployee, ReplaceEmployee},
        enums::EmploymentStatus,
    },
    tenancy::{scope, Page, TenantContext},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
};

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub employment_status: EmploymentStatus,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppQuery(page): AppQuery<Page>,
    AppQuery(filter): AppQuery<EmployeeFilter>,
) -> ApiResult<Json<Vec<Employee>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Employee::list(&mut conn, &tenant, filter, page).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppJson(input): AppJson<NewEmployee>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    validate_request(&input)?;

    let password_hash = super::hash_password(input.password).await?;

    let mut conn = state.db.acquire().await?;
    let employee = Employee::create(&mut conn, &tenant, input.profile, password_hash).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Employee>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(scope::find::<Employee>(&mut conn, &tenant, id).await?))
}

pub async fn show_by_code(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(code): AppPath<String>,
) -> ApiResult<Json<Employee>> {
    let mut conn = state.db.acquire().await?;
    let employee = Employee::find_by_code(&mut conn, &tenant, &code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("employee with code '{}' not found", code)))?;

    Ok(Json(employee))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<ReplaceEmployee>,
) -> ApiResult<Json<Employee>> {
    validate_request(&input)?;

    let password_hash = match input.password {
        Some(password) => Some(super::hash_password(password).await?),
        None => None,
    };

    let mut conn = state.db.acquire().await?;
    Ok(Json(Employee::update(&mut conn, &tenant, id, input.profile, password_hash).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<StatusUpdate>,
) -> ApiResult<Json<Employee>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Employee::update_status(&mut conn, &tenant, id, body.employment_status).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    Employee::delete(&mut conn, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn contracts(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(page): AppQuery<Page>,
) -> ApiResult<Json<Vec<Contract>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Contract::for_employee(&mut conn, &tenant, id, page).await?))
}
