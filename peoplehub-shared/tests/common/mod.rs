//! Fixture shared by the database-backed model tests
//!
//! Every test gets two freshly provisioned tenants, `acme` and `globex`,
//! and removes them (with all their rows) in [`Fixture::cleanup`].

#![allow(dead_code)]

use peoplehub_shared::{
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
    },
    models::{
        department::{Department, DepartmentInput},
        employee::{Employee, EmployeeProfile},
        enums::{ContractType, EmploymentStatus, EmploymentType, RemoteType},
        job_posting::{JobPosting, JobPostingInput},
        position::{Position, PositionInput},
        tenant::{CreateTenant, Tenant},
    },
    tenancy::TenantContext,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub struct Fixture {
    pub pool: PgPool,
    pub acme: TenantContext,
    pub globex: TenantContext,
}

impl Fixture {
    /// Returns `None` when `DATABASE_URL` is not set
    pub async fn new() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = create_pool(&DatabaseConfig {
            url,
            max_connections: 2,
            min_connections: 0,
            ..Default::default()
        })
        .await
        .expect("pool");
        run_migrations(&pool).await.expect("migrations");

        let acme = tenant(&pool, "acme").await;
        let globex = tenant(&pool, "globex").await;

        Some(Self { pool, acme, globex })
    }

    pub async fn cleanup(self) {
        Tenant::delete(&self.pool, self.acme.tenant_id).await.ok();
        Tenant::delete(&self.pool, self.globex.tenant_id).await.ok();
    }
}

async fn tenant(pool: &PgPool, prefix: &str) -> TenantContext {
    let suffix = Uuid::new_v4().simple().to_string();
    let mut conn = pool.acquire().await.expect("connection");
    let tenant = Tenant::create(
        &mut conn,
        CreateTenant {
            name: prefix.to_string(),
            subdomain: format!("{}-{}", prefix, &suffix[..12]),
            domain: None,
            email: None,
            settings: None,
        },
    )
    .await
    .expect("tenant");

    TenantContext::from_tenant(&tenant)
}

pub fn department(code: &str, parent_id: Option<Uuid>) -> DepartmentInput {
    DepartmentInput {
        name: format!("Department {}", code),
        code: code.to_string(),
        description: None,
        parent_id,
        head_id: None,
        is_active: true,
    }
}

pub fn profile(code: &str, manager_id: Option<Uuid>) -> EmployeeProfile {
    EmployeeProfile {
        email: format!("{}@example.test", code.to_lowercase()),
        employee_code: code.to_string(),
        first_name: "First".to_string(),
        last_name: code.to_string(),
        phone: None,
        department_id: None,
        position_id: None,
        team_id: None,
        manager_id,
        hire_date: None,
        employment_status: EmploymentStatus::Active,
        employment_type: EmploymentType::FullTime,
        salary: 0,
    }
}

pub async fn employee(conn: &mut PgConnection, ctx: &TenantContext, code: &str) -> Employee {
    Employee::create(conn, ctx, profile(code, None), "unused-hash".to_string())
        .await
        .expect("employee")
}

/// A department with one position in it
pub async fn position(conn: &mut PgConnection, ctx: &TenantContext, code: &str) -> Position {
    let department = Department::create(&mut *conn, ctx, department(code, None))
        .await
        .expect("department");

    Position::create(
        conn,
        ctx,
        PositionInput {
            department_id: department.id,
            title: format!("Position {}", code),
            code: format!("{}-1", code),
            description: None,
            level: 1,
            min_salary: 100_000,
            max_salary: 200_000,
            is_active: true,
        },
    )
    .await
    .expect("position")
}

pub fn posting_input(position: &Position, title: &str) -> JobPostingInput {
    JobPostingInput {
        department_id: position.department_id,
        position_id: position.id,
        title: title.to_string(),
        description: "Join us".to_string(),
        job_type: ContractType::FullTime,
        location: None,
        remote_type: RemoteType::OnSite,
        salary_min: None,
        salary_max: None,
        closing_date: None,
        is_active: true,
    }
}

pub async fn posting(conn: &mut PgConnection, ctx: &TenantContext, position: &Position, title: &str) -> JobPosting {
    JobPosting::create(conn, ctx, posting_input(position, title))
        .await
        .expect("job posting")
}
