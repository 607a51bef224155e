/// Tenant isolation tests against a real database
///
/// Each test provisions two tenants and talks to the full router through
/// their hosts. Tests return early when `DATABASE_URL` is not set.
///
/// ```bash
/// DATABASE_URL=postgresql://localhost/peoplehub_test cargo test -p peoplehub-api
/// ```

mod common;

use axum::http::StatusCode;
use common::*;
use peoplehub_shared::models::{
    department::{Department, DepartmentInput},
    employee::{Employee, EmployeeProfile},
    enums::{ContractType, EmploymentStatus, EmploymentType, RemoteType},
    job_posting::{JobPosting, JobPostingInput},
    position::{Position, PositionInput},
};
use serde_json::{json, Value};

macro_rules! context_or_skip {
    () => {
        match TestContext::new().await {
            Some(ctx) => ctx,
            None => {
                eprintln!("DATABASE_URL not set; skipping");
                return;
            }
        }
    };
}

async fn create_department(ctx: &TestContext, tenant: &TestTenant, code: &str) -> Value {
    let (status, body) = send(
        &ctx.app,
        json_body(
            request("POST", "/v1/departments", Some(&tenant.host()), Some(&tenant.token)),
            json!({ "name": format!("Department {}", code), "code": code }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

async fn count(ctx: &TestContext, tenant: &TestTenant, uri: &str) -> usize {
    let (status, body) = send(
        &ctx.app,
        empty_body(request("GET", uri, Some(&tenant.host()), Some(&tenant.token))),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    body.as_array().map(Vec::len).unwrap_or_default()
}

#[tokio::test]
async fn test_health_reports_connected_database() {
    let ctx = context_or_skip!();

    let (status, body) = send(&ctx.app, empty_body(request("GET", "/health", None, None))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_other_tenants_department_is_forbidden() {
    let ctx = context_or_skip!();
    let department = create_department(&ctx, &ctx.acme, "ENG").await;
    let uri = format!("/v1/departments/{}", department["id"].as_str().unwrap());

    let (status, _) = send(
        &ctx.app,
        empty_body(request("GET", &uri, Some(&ctx.acme.host()), Some(&ctx.acme.token))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for method in ["GET", "DELETE"] {
        let (status, body) = send(
            &ctx.app,
            empty_body(request(method, &uri, Some(&ctx.globex.host()), Some(&ctx.globex.token))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, body);
    }

    let (status, _) = send(
        &ctx.app,
        json_body(
            request("PUT", &uri, Some(&ctx.globex.host()), Some(&ctx.globex.token)),
            json!({ "name": "Hijacked", "code": "ENG" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(count(&ctx, &ctx.globex, "/v1/departments").await, 0);
    assert_eq!(count(&ctx, &ctx.acme, "/v1/departments").await, 1);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_missing_id_is_not_found() {
    let ctx = context_or_skip!();
    let uri = format!("/v1/departments/{}", uuid::Uuid::new_v4());

    let (status, body) = send(
        &ctx.app,
        empty_body(request("GET", &uri, Some(&ctx.acme.host()), Some(&ctx.acme.token))),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let ctx = context_or_skip!();

    let (status, body) = send(
        &ctx.app,
        empty_body(request("GET", "/v1/departments/not-a-uuid", Some(&ctx.acme.host()), Some(&ctx.acme.token))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_body_tenant_id_is_ignored() {
    let ctx = context_or_skip!();

    let (status, body) = send(
        &ctx.app,
        json_body(
            request("POST", "/v1/departments", Some(&ctx.acme.host()), Some(&ctx.acme.token)),
            json!({ "name": "Sales", "code": "SAL", "tenant_id": ctx.globex.tenant.id }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tenant_id"], json!(ctx.acme.tenant.id));
    assert_eq!(count(&ctx, &ctx.globex, "/v1/departments").await, 0);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_cross_tenant_reference_is_rejected_without_partial_state() {
    let ctx = context_or_skip!();
    let globex_department = create_department(&ctx, &ctx.globex, "OPS").await;

    let (status, body) = send(
        &ctx.app,
        json_body(
            request("POST", "/v1/employees", Some(&ctx.acme.host()), Some(&ctx.acme.token)),
            json!({
                "email": "grace@acme.test",
                "employee_code": "E-002",
                "first_name": "Grace",
                "last_name": "Hopper",
                "department_id": globex_department["id"],
                "password": PASSWORD
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    assert_eq!(body["error"], "cross_tenant_reference");
    assert_eq!(count(&ctx, &ctx.acme, "/v1/employees").await, 1);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_contract_with_foreign_position_rolls_back() {
    let ctx = context_or_skip!();

    let mut conn = ctx.db.acquire().await.unwrap();
    let department = Department::create(
        &mut conn,
        &ctx.globex.ctx,
        DepartmentInput {
            name: "Engineering".to_string(),
            code: "ENG".to_string(),
            description: None,
            parent_id: None,
            head_id: None,
            is_active: true,
        },
    )
    .await
    .unwrap();
    let position = Position::create(
        &mut conn,
        &ctx.globex.ctx,
        PositionInput {
            department_id: department.id,
            title: "Engineer".to_string(),
            code: "ENG-1".to_string(),
            description: None,
            level: 1,
            min_salary: 100_000,
            max_salary: 200_000,
            is_active: true,
        },
    )
    .await
    .unwrap();
    drop(conn);

    let (status, body) = send(
        &ctx.app,
        json_body(
            request("POST", "/v1/contracts", Some(&ctx.acme.host()), Some(&ctx.acme.token)),
            json!({
                "employee_id": ctx.acme.admin.id,
                "position_id": position.id,
                "contract_number": "C-001",
                "contract_type": "full_time",
                "start_date": "2026-01-01",
                "salary": 150_000,
                "status": "active"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    assert_eq!(body["error"], "cross_tenant_reference");
    assert_eq!(count(&ctx, &ctx.acme, "/v1/contracts").await, 0);

    let (_, admin) = send(
        &ctx.app,
        empty_body(request("GET", "/v1/auth/me", Some(&ctx.acme.host()), Some(&ctx.acme.token))),
    )
    .await;
    assert_eq!(admin["employee"]["position_id"], Value::Null);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_login_is_scoped_to_the_host_tenant() {
    let ctx = context_or_skip!();
    let credentials = json!({ "email": "admin@acme.test", "password": PASSWORD });

    let (status, body) = send(
        &ctx.app,
        json_body(
            request("POST", "/v1/auth/login", Some(&ctx.acme.host()), None),
            credentials.clone(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["tenant"]["tenant_id"], json!(ctx.acme.tenant.id));

    let token = body["access_token"].as_str().unwrap().to_string();
    let (status, me) = send(
        &ctx.app,
        empty_body(request("GET", "/v1/auth/me", Some(&ctx.acme.host()), Some(&token))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["employee"]["id"], json!(ctx.acme.admin.id));

    // same credentials, other tenant's host
    let (status, _) = send(
        &ctx.app,
        json_body(request("POST", "/v1/auth/login", Some(&ctx.globex.host()), None), credentials),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // acme's fresh token is useless on globex
    let (status, _) = send(
        &ctx.app,
        empty_body(request("GET", "/v1/auth/me", Some(&ctx.globex.host()), Some(&token))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let ctx = context_or_skip!();

    let (status, body) = send(
        &ctx.app,
        json_body(
            request("POST", "/v1/auth/login", Some(&ctx.acme.host()), None),
            json!({ "email": "admin@acme.test", "password": "wrong password" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_employee_cannot_approve_own_leave() {
    let ctx = context_or_skip!();
    let host = ctx.acme.host();

    let (status, leave_type) = send(
        &ctx.app,
        json_body(
            request("POST", "/v1/leave-types", Some(&host), Some(&ctx.acme.token)),
            json!({ "name": "Annual", "default_days": 25 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, leave) = send(
        &ctx.app,
        json_body(
            request("POST", "/v1/leave-requests", Some(&host), Some(&ctx.acme.token)),
            json!({
                "employee_id": ctx.acme.admin.id,
                "leave_type_id": leave_type["id"],
                "start_date": "2026-03-02",
                "end_date": "2026-03-03",
                "days": 2.0,
                "reason": "Holiday"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", leave);
    assert_eq!(leave["status"], "pending");

    let uri = format!("/v1/leave-requests/{}/approve", leave["id"].as_str().unwrap());
    let (status, body) = send(
        &ctx.app,
        empty_body(request("POST", &uri, Some(&host), Some(&ctx.acme.token))),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_state");

    ctx.cleanup().await;
}

/// Second acme employee with a token of their own
async fn hire(ctx: &TestContext, code: &str) -> (Employee, String) {
    let mut conn = ctx.db.acquire().await.unwrap();
    let employee = Employee::create(
        &mut conn,
        &ctx.acme.ctx,
        EmployeeProfile {
            email: format!("{}@acme.test", code.to_lowercase()),
            employee_code: code.to_string(),
            first_name: "Bob".to_string(),
            last_name: "Builder".to_string(),
            phone: None,
            department_id: None,
            position_id: None,
            team_id: None,
            manager_id: None,
            hire_date: None,
            employment_status: EmploymentStatus::Active,
            employment_type: EmploymentType::FullTime,
            salary: 0,
        },
        "unused-hash".to_string(),
    )
    .await
    .unwrap();

    let token = token_for(employee.id, ctx.acme.tenant.id);
    (employee, token)
}

#[tokio::test]
async fn test_deleted_employee_token_stops_working() {
    let ctx = context_or_skip!();
    let host = ctx.acme.host();
    let (bob, bob_token) = hire(&ctx, "E-BOB").await;

    let (status, _) = send(
        &ctx.app,
        empty_body(request("GET", "/v1/employees", Some(&host), Some(&bob_token))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/v1/employees/{}", bob.id);
    let (status, _) = send(
        &ctx.app,
        empty_body(request("DELETE", &uri, Some(&host), Some(&ctx.acme.token))),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &ctx.app,
        json_body(
            request("POST", "/v1/departments", Some(&host), Some(&bob_token)),
            json!({ "name": "Shadow", "code": "SHD" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", body);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(
        &ctx.app,
        empty_body(request("GET", "/v1/employees", Some(&host), Some(&bob_token))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(count(&ctx, &ctx.acme, "/v1/departments").await, 0);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_terminated_employee_token_stops_working() {
    let ctx = context_or_skip!();
    let host = ctx.acme.host();
    let (bob, bob_token) = hire(&ctx, "E-BOB").await;

    let uri = format!("/v1/employees/{}/status", bob.id);
    let (status, body) = send(
        &ctx.app,
        json_body(
            request("PATCH", &uri, Some(&host), Some(&ctx.acme.token)),
            json!({ "employment_status": "terminated" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["is_active"], false);

    let (status, _) = send(
        &ctx.app,
        empty_body(request("GET", "/v1/auth/me", Some(&host), Some(&bob_token))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_logout_revokes_only_the_presented_token() {
    let ctx = context_or_skip!();
    let host = ctx.acme.host();
    let other_token = token_for(ctx.acme.admin.id, ctx.acme.tenant.id);

    let (status, body) = send(
        &ctx.app,
        empty_body(request("POST", "/v1/auth/logout", Some(&host), Some(&ctx.acme.token))),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT, "{}", body);

    let (status, body) = send(
        &ctx.app,
        empty_body(request("GET", "/v1/auth/me", Some(&host), Some(&ctx.acme.token))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    // a second logout with the revoked token is refused, not repeated
    let (status, _) = send(
        &ctx.app,
        empty_body(request("POST", "/v1/auth/logout", Some(&host), Some(&ctx.acme.token))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = send(
        &ctx.app,
        empty_body(request("GET", "/v1/auth/me", Some(&host), Some(&other_token))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["employee"]["id"], json!(ctx.acme.admin.id));

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_job_posting_list_filters_and_sort_from_query_string() {
    let ctx = context_or_skip!();
    let host = ctx.acme.host();

    let mut conn = ctx.db.acquire().await.unwrap();
    let department = Department::create(
        &mut conn,
        &ctx.acme.ctx,
        DepartmentInput {
            name: "Engineering".to_string(),
            code: "ENG".to_string(),
            description: None,
            parent_id: None,
            head_id: None,
            is_active: true,
        },
    )
    .await
    .unwrap();
    let position = Position::create(
        &mut conn,
        &ctx.acme.ctx,
        PositionInput {
            department_id: department.id,
            title: "Engineer".to_string(),
            code: "ENG-1".to_string(),
            description: None,
            level: 1,
            min_salary: 100_000,
            max_salary: 200_000,
            is_active: true,
        },
    )
    .await
    .unwrap();
    for (title, salary_max) in [("Rust Engineer", 150_000), ("Go Engineer", 90_000), ("Rust Intern", 30_000)] {
        JobPosting::create(
            &mut conn,
            &ctx.acme.ctx,
            JobPostingInput {
                department_id: department.id,
                position_id: position.id,
                title: title.to_string(),
                description: "Join us".to_string(),
                job_type: ContractType::FullTime,
                location: None,
                remote_type: RemoteType::Remote,
                salary_min: Some(10_000),
                salary_max: Some(salary_max),
                closing_date: None,
                is_active: true,
            },
        )
        .await
        .unwrap();
    }
    drop(conn);

    let (status, body) = send(
        &ctx.app,
        empty_body(request(
            "GET",
            "/v1/job-postings?title=RUST&salary_from=50000&remote_type=remote&sort=-title",
            Some(&host),
            Some(&ctx.acme.token),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Rust Engineer"]);

    let (status, body) = send(
        &ctx.app,
        empty_body(request("GET", "/v1/job-postings?sort=title", Some(&host), Some(&ctx.acme.token))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["title"], "Go Engineer");

    let (status, body) = send(
        &ctx.app,
        empty_body(request("GET", "/v1/candidates?sort=password_hash", Some(&host), Some(&ctx.acme.token))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "sort");

    ctx.cleanup().await;
}
