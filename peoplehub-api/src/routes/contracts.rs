/// Contract endpoints
///
/// - `GET /v1/contracts` - filters `employee_id`, `status`
/// - `GET /v1/contracts/active`
/// - `POST /v1/contracts`
/// - `GET|PUT /v1/contracts/:id`
/// - `DELETE /v1/contracts/:id` - drafts only
/// - `POST /v1/contracts/:id/sign` - `{ "signed_by": "employee" | "employer" }`
/// - `POST /v1/contracts/:id/terminate` - `{ "termination_date", "termination_reason" }`
///
/// Creating, updating or fully signing an active contract also moves the
/// employee to the contract's position, in the same transaction.

use axum::{extract::State, http::StatusCode, Extension, Json};
use peoplehub_shared::{
    models::{
        contract::{Contract, ContractFilter, ContractTerms, NewContract, SignContract, TerminateContract},
        enums::ContractStatus,
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
    AppQuery(filter): AppQuery<ContractFilter>,
) -> ApiResult<Json<Vec<Contract>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Contract::list(&mut conn, &tenant, filter, page).await?))
}

pub async fn active(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppQuery(page): AppQuery<Page>,
) -> ApiResult<Json<Vec<Contract>>> {
    let filter = ContractFilter {
        employee_id: None,
        status: Some(ContractStatus::Active),
    };

    let mut conn = state.db.acquire().await?;
    Ok(Json(Contract::list(&mut conn, &tenant, filter, page).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppJson(input): AppJson<NewContract>,
) -> ApiResult<(StatusCode, Json<Contract>)> {
    validate_request(&input)?;

    let mut conn = state.db.acquire().await?;
    let contract = Contract::create(&mut conn, &tenant, input).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Contract>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(scope::find::<Contract>(&mut conn, &tenant, id).await?))
}

/// Replaces the terms; the employee of a contract never changes
pub async fn update(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(terms): AppJson<ContractTerms>,
) -> ApiResult<Json<Contract>> {
    validate_request(&terms)?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(Contract::update(&mut conn, &tenant, id, terms).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    Contract::delete(&mut conn, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn sign(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<SignContract>,
) -> ApiResult<Json<Contract>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Contract::sign(&mut conn, &tenant, id, body.signed_by).await?))
}

pub async fn terminate(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<TerminateContract>,
) -> ApiResult<Json<Contract>> {
    validate_request(&body)?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(Contract::terminate(&mut conn, &tenant, id, body).await?))
}
