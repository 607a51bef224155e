/// Job posting endpoints
///
/// - `GET /v1/job-postings` - filters `department_id`, `status`
/// - `POST /v1/job-postings` - starts as `draft`
/// - `GET|PUT|DELETE /v1/job-postings/:id`
/// - `POST /v1/job-postings/:id/publish` - sets `published_at`
/// - `POST /v1/job-postings/:id/close` - only from `published`

use axum::{extract::State, http::StatusCode, Extension, Json};
use peoplehub_shared::{
    models::job_posting::{JobPosting, JobPostingFilter, JobPostingInput},
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
    AppQuery(filter): AppQuery<JobPostingFilter>,
) -> ApiResult<Json<Vec<JobPosting>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(JobPosting::list(&mut conn, &tenant, filter, page).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppJson(input): AppJson<JobPostingInput>,
) -> ApiResult<(StatusCode, Json<JobPosting>)> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    let posting = JobPosting::create(&mut conn, &tenant, input).await?;
    Ok((StatusCode::CREATED, Json(posting)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<JobPosting>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(scope::find::<JobPosting>(&mut conn, &tenant, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<JobPostingInput>,
) -> ApiResult<Json<JobPosting>> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(JobPosting::update(&mut conn, &tenant, id, input).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    JobPosting::delete(&mut conn, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<JobPosting>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(JobPosting::publish(&mut conn, &tenant, id).await?))
}

pub async fn close(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<JobPosting>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(JobPosting::close(&mut conn, &tenant, id).await?))
}
