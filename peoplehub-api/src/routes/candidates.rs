/// Candidate endpoints
///
/// - `GET /v1/candidates` - filters `job_posting_id`, `status`
/// - `POST /v1/candidates` - starts as `applied`
/// - `GET|PUT|DELETE /v1/candidates/:id`
/// - `PATCH /v1/candidates/:id/status` - `{ "status": ... }`

use axum::{extract::State, http::StatusCode, Extension, Json};
use peoplehub_shared::{
    models::candidate::{Candidate, CandidateFilter, CandidateInput, CandidateStatusUpdate},
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
    AppQuery(filter): AppQuery<CandidateFilter>,
) -> ApiResult<Json<Vec<Candidate>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Candidate::list(&mut conn, &tenant, filter, page).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppJson(input): AppJson<CandidateInput>,
) -> ApiResult<(StatusCode, Json<Candidate>)> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    let candidate = Candidate::create(&mut conn, &tenant, input).await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Candidate>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(scope::find::<Candidate>(&mut conn, &tenant, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<CandidateInput>,
) -> ApiResult<Json<Candidate>> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(Candidate::update(&mut conn, &tenant, id, input).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<CandidateStatusUpdate>,
) -> ApiResult<Json<Candidate>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Candidate::update_status(&mut conn, &tenant, id, body.status).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    Candidate::delete(&mut conn, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
