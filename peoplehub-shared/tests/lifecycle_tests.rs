/// State transitions and cross-entity side effects of the models
///
/// Requires `DATABASE_URL`; returns early without it.

mod common;

use chrono::{Duration, NaiveDate, Utc};
use common::*;
use peoplehub_shared::{
    models::{
        candidate::{Candidate, CandidateInput},
        contract::{Contract, ContractTerms, NewContract},
        department::Department,
        employee::Employee,
        enums::{
            CandidateStatus, ContractStatus, ContractType, InterviewStatus, InterviewType,
            JobPostingStatus, Signatory,
        },
        interview::{CompleteInterview, Interview, InterviewInput},
        job_posting::JobPosting,
        team::{Team, TeamInput},
    },
    tenancy::{scope, ScopeError},
};

#[tokio::test]
async fn test_department_cannot_move_under_its_descendant() {
    let Some(fx) = Fixture::new().await else { return };
    let mut conn = fx.pool.acquire().await.unwrap();

    let root = Department::create(&mut conn, &fx.acme, department("ROOT", None)).await.unwrap();
    let child = Department::create(&mut conn, &fx.acme, department("CHILD", Some(root.id))).await.unwrap();
    let leaf = Department::create(&mut conn, &fx.acme, department("LEAF", Some(child.id))).await.unwrap();

    let result = Department::update(&mut conn, &fx.acme, root.id, department("ROOT", Some(leaf.id))).await;
    assert!(matches!(result, Err(ScopeError::InvalidState(_))));

    let result = Department::update(&mut conn, &fx.acme, root.id, department("ROOT", Some(root.id))).await;
    assert!(matches!(result, Err(ScopeError::InvalidState(_))));

    let unchanged: Department = scope::find(&mut conn, &fx.acme, root.id).await.unwrap();
    assert_eq!(unchanged.parent_id, None);

    // moving a leaf elsewhere in the tree is fine
    let moved = Department::update(&mut conn, &fx.acme, leaf.id, department("LEAF", Some(root.id)))
        .await
        .unwrap();
    assert_eq!(moved.parent_id, Some(root.id));

    drop(conn);
    fx.cleanup().await;
}

#[tokio::test]
async fn test_employee_cannot_report_to_their_own_report() {
    let Some(fx) = Fixture::new().await else { return };
    let mut conn = fx.pool.acquire().await.unwrap();

    let boss = employee(&mut conn, &fx.acme, "E-BOSS").await;
    let lead = employee(&mut conn, &fx.acme, "E-LEAD").await;
    let dev = employee(&mut conn, &fx.acme, "E-DEV").await;

    Employee::update(&mut conn, &fx.acme, lead.id, profile("E-LEAD", Some(boss.id)), None)
        .await
        .unwrap();
    let dev = Employee::update(&mut conn, &fx.acme, dev.id, profile("E-DEV", Some(lead.id)), None)
        .await
        .unwrap();
    assert_eq!(dev.manager_id, Some(lead.id));

    let result = Employee::update(&mut conn, &fx.acme, boss.id, profile("E-BOSS", Some(dev.id)), None).await;
    assert!(matches!(result, Err(ScopeError::InvalidState(_))));

    let result = Employee::update(&mut conn, &fx.acme, boss.id, profile("E-BOSS", Some(boss.id)), None).await;
    assert!(matches!(result, Err(ScopeError::InvalidState(_))));

    let unchanged: Employee = scope::find(&mut conn, &fx.acme, boss.id).await.unwrap();
    assert_eq!(unchanged.manager_id, None);

    drop(conn);
    fx.cleanup().await;
}

fn contract_terms(position_id: uuid::Uuid, status: ContractStatus) -> ContractTerms {
    ContractTerms {
        position_id,
        contract_number: "C-001".to_string(),
        contract_type: ContractType::FullTime,
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        end_date: None,
        salary: 150_000,
        benefits: None,
        terms: None,
        status,
    }
}

#[tokio::test]
async fn test_second_signature_activates_contract_and_assigns_position() {
    let Some(fx) = Fixture::new().await else { return };
    let mut conn = fx.pool.acquire().await.unwrap();

    let ada = employee(&mut conn, &fx.acme, "E-ADA").await;
    let role = position(&mut conn, &fx.acme, "ENG").await;

    let contract = Contract::create(
        &mut conn,
        &fx.acme,
        NewContract {
            employee_id: ada.id,
            terms: contract_terms(role.id, ContractStatus::Draft),
        },
    )
    .await
    .unwrap();
    assert_eq!(contract.status, ContractStatus::Draft);

    let half = Contract::sign(&mut conn, &fx.acme, contract.id, Signatory::Employee).await.unwrap();
    assert_eq!(half.status, ContractStatus::Draft);
    assert!(half.signed_by_employee && !half.signed_by_employer);
    assert!(half.signed_at.is_none());

    let still_unassigned: Employee = scope::find(&mut conn, &fx.acme, ada.id).await.unwrap();
    assert_eq!(still_unassigned.position_id, None);

    let signed = Contract::sign(&mut conn, &fx.acme, contract.id, Signatory::Employer).await.unwrap();
    assert_eq!(signed.status, ContractStatus::Active);
    assert!(signed.signed_at.is_some());

    let assigned: Employee = scope::find(&mut conn, &fx.acme, ada.id).await.unwrap();
    assert_eq!(assigned.position_id, Some(role.id));

    // another tenant cannot sign it
    let foreign = Contract::sign(&mut conn, &fx.globex, contract.id, Signatory::Employer).await;
    assert!(matches!(foreign, Err(ScopeError::Forbidden { .. })));

    drop(conn);
    fx.cleanup().await;
}

#[tokio::test]
async fn test_completing_interview_moves_candidate_to_interviewed() {
    let Some(fx) = Fixture::new().await else { return };
    let mut conn = fx.pool.acquire().await.unwrap();

    let interviewer = employee(&mut conn, &fx.acme, "E-INT").await;
    let role = position(&mut conn, &fx.acme, "ENG").await;
    let opening = posting(&mut conn, &fx.acme, &role, "Backend Engineer").await;

    let candidate = Candidate::create(
        &mut conn,
        &fx.acme,
        CandidateInput {
            job_posting_id: opening.id,
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.test".to_string(),
            phone: None,
            cover_letter: None,
            expected_salary: None,
            is_active: true,
        },
    )
    .await
    .unwrap();
    assert_eq!(candidate.status, CandidateStatus::Applied);

    let interview = Interview::create(
        &mut conn,
        &fx.acme,
        InterviewInput {
            candidate_id: candidate.id,
            interviewer_id: interviewer.id,
            interview_type: InterviewType::Video,
            scheduled_at: Utc::now() + Duration::days(1),
            duration_minutes: 45,
            location: None,
        },
    )
    .await
    .unwrap();

    let done = Interview::complete(
        &mut conn,
        &fx.acme,
        interview.id,
        CompleteInterview {
            feedback: Some("Strong".to_string()),
            rating: 5,
        },
    )
    .await
    .unwrap();
    assert_eq!(done.status, InterviewStatus::Completed);

    let after: Candidate = scope::find(&mut conn, &fx.acme, candidate.id).await.unwrap();
    assert_eq!(after.status, CandidateStatus::Interviewed);

    let again = Interview::cancel(&mut conn, &fx.acme, interview.id).await;
    assert!(matches!(again, Err(ScopeError::InvalidState(_))));

    drop(conn);
    fx.cleanup().await;
}

#[tokio::test]
async fn test_team_membership_and_leader_clearing() {
    let Some(fx) = Fixture::new().await else { return };
    let mut conn = fx.pool.acquire().await.unwrap();

    let role = position(&mut conn, &fx.acme, "ENG").await;
    let lead = employee(&mut conn, &fx.acme, "E-LEAD").await;
    let dev = employee(&mut conn, &fx.acme, "E-DEV").await;
    let outsider = employee(&mut conn, &fx.globex, "E-OUT").await;

    let team = Team::create(
        &mut conn,
        &fx.acme,
        TeamInput {
            department_id: role.department_id,
            name: "Platform".to_string(),
            code: "PLT".to_string(),
            description: None,
            leader_id: Some(lead.id),
            is_active: true,
        },
    )
    .await
    .unwrap();

    Team::add_member(&mut conn, &fx.acme, team.id, lead.id).await.unwrap();
    let detail = Team::add_member(&mut conn, &fx.acme, team.id, dev.id).await.unwrap();
    assert_eq!(detail.members.len(), 2);

    let foreign = Team::add_member(&mut conn, &fx.acme, team.id, outsider.id).await;
    assert!(matches!(
        foreign,
        Err(ScopeError::CrossTenantReference { field: "employee_id", .. })
    ));
    let outsider_after: Employee = scope::find(&mut conn, &fx.globex, outsider.id).await.unwrap();
    assert_eq!(outsider_after.team_id, None);

    let detail = Team::remove_member(&mut conn, &fx.acme, team.id, lead.id).await.unwrap();
    assert_eq!(detail.members.len(), 1);
    assert_eq!(detail.members[0].id, dev.id);
    assert_eq!(detail.team.leader_id, None);

    let not_member = Team::remove_member(&mut conn, &fx.acme, team.id, lead.id).await;
    assert!(matches!(not_member, Err(ScopeError::InvalidState(_))));

    let busy = Team::delete(&mut conn, &fx.acme, team.id).await;
    assert!(matches!(busy, Err(ScopeError::InvalidState(_))));

    drop(conn);
    fx.cleanup().await;
}

#[tokio::test]
async fn test_job_posting_publish_and_close() {
    let Some(fx) = Fixture::new().await else { return };
    let mut conn = fx.pool.acquire().await.unwrap();

    let role = position(&mut conn, &fx.acme, "ENG").await;
    let opening = posting(&mut conn, &fx.acme, &role, "Backend Engineer").await;
    assert_eq!(opening.status, JobPostingStatus::Draft);
    assert!(opening.published_at.is_none());

    let early_close = JobPosting::close(&mut conn, &fx.acme, opening.id).await;
    assert!(matches!(early_close, Err(ScopeError::InvalidState(_))));

    let published = JobPosting::publish(&mut conn, &fx.acme, opening.id).await.unwrap();
    assert_eq!(published.status, JobPostingStatus::Published);
    assert!(published.published_at.is_some());

    let twice = JobPosting::publish(&mut conn, &fx.acme, opening.id).await;
    assert!(matches!(twice, Err(ScopeError::InvalidState(_))));

    let closed = JobPosting::close(&mut conn, &fx.acme, opening.id).await.unwrap();
    assert_eq!(closed.status, JobPostingStatus::Closed);

    let reopened = JobPosting::publish(&mut conn, &fx.acme, opening.id).await.unwrap();
    assert_eq!(reopened.status, JobPostingStatus::Published);

    let foreign = JobPosting::close(&mut conn, &fx.globex, opening.id).await;
    assert!(matches!(foreign, Err(ScopeError::Forbidden { .. })));

    drop(conn);
    fx.cleanup().await;
}
