/// Database models for PeopleHub
///
/// `tenant` is the directory of tenants and is not itself scoped. Every
/// other model is tenant-owned: its functions take a [`TenantContext`] and
/// never touch another tenant's rows.
///
/// # Models
///
/// - `tenant`: tenant directory (admin provisioning, host resolution)
/// - `department`, `position`, `team`, `employee`: organization structure
/// - `contract`: employment contracts and signing
/// - `leave_type`, `leave_request`: leave management
/// - `job_posting`, `candidate`, `interview`: recruitment
/// - `enums`: status and type values stored as text
///
/// [`TenantContext`]: crate::tenancy::TenantContext

pub mod candidate;
pub mod contract;
pub mod department;
pub mod employee;
pub mod enums;
pub mod interview;
pub mod job_posting;
pub mod leave_request;
pub mod leave_type;
pub mod position;
pub mod team;
pub mod tenant;
