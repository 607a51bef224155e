/// Interview endpoints
///
/// - `GET /v1/interviews` - filters `candidate_id`, `interviewer_id`, `status`
/// - `POST /v1/interviews` - starts as `scheduled`
/// - `GET|PUT|DELETE /v1/interviews/:id` (`PUT` only while scheduled)
/// - `POST /v1/interviews/:id/complete` - `{ "rating": 1..=5, "feedback"? }`
/// - `POST /v1/interviews/:id/cancel`

use axum::{extract::State, http::StatusCode, Extension, Json};
use peoplehub_shared::{
    models::interview::{CompleteInterview, Interview, InterviewFilter, InterviewInput},
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
    AppQuery(filter): AppQuery<InterviewFilter>,
) -> ApiResult<Json<Vec<Interview>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Interview::list(&mut conn, &tenant, filter, page).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppJson(input): AppJson<InterviewInput>,
) -> ApiResult<(StatusCode, Json<Interview>)> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    let interview = Interview::create(&mut conn, &tenant, input).await?;
    Ok((StatusCode::CREATED, Json(interview)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Interview>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(scope::find::<Interview>(&mut conn, &tenant, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<InterviewInput>,
) -> ApiResult<Json<Interview>> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(Interview::update(&mut conn, &tenant, id, input).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    Interview::delete(&mut conn, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn complete(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<CompleteInterview>,
) -> ApiResult<Json<Interview>> {
    validate_request(&body)?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(Interview::complete(&mut conn, &tenant, id, body).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Interview>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Interview::cancel(&mut conn, &tenant, id).await?))
}
