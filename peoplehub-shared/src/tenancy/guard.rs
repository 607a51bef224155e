/// Authorization guard for loaded entities
///
/// The single place where a loaded row's owner is compared with the request
/// tenant. [`super::scope::find`] calls it for every by-id access, so
/// show/update/delete/action paths all share the same check.

use tracing::warn;

use super::context::TenantContext;
use super::scope::{ScopeError, TenantOwned};

/// Fails with `Forbidden` unless `entity` belongs to the request tenant
pub fn assert_owned_by_current_tenant<T: TenantOwned>(
    ctx: &TenantContext,
    entity: &T,
) -> Result<(), ScopeError> {
    if ctx.owns(entity.tenant_id()) {
        return Ok(());
    }

    warn!(
        tenant_id = %ctx.tenant_id,
        owner_tenant_id = %entity.tenant_id(),
        kind = T::KIND.label(),
        id = %entity.id(),
        "Rejected cross-tenant access"
    );

    Err(ScopeError::Forbidden {
        kind: T::KIND,
        id: entity.id(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::leave_type::LeaveType;
    use crate::tenancy::scope::EntityKind;
    use chrono::Utc;
    use uuid::Uuid;

    fn leave_type(tenant_id: Uuid) -> LeaveType {
        LeaveType {
            id: Uuid::new_v4(),
            tenant_id,
            name: "Annual".to_string(),
            description: None,
            default_days: 25,
            is_paid: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ctx(tenant_id: Uuid) -> TenantContext {
        TenantContext {
            tenant_id,
            subdomain: "acme".to_string(),
            name: "Acme".to_string(),
        }
    }

    #[test]
    fn test_owner_passes() {
        let tenant_id = Uuid::new_v4();
        assert!(assert_owned_by_current_tenant(&ctx(tenant_id), &leave_type(tenant_id)).is_ok());
    }

    #[test]
    fn test_other_tenant_is_forbidden() {
        let entity = leave_type(Uuid::new_v4());

        let err = assert_owned_by_current_tenant(&ctx(Uuid::new_v4()), &entity).unwrap_err();
        match err {
            ScopeError::Forbidden { kind, id } => {
                assert_eq!(kind, EntityKind::LeaveType);
                assert_eq!(id, entity.id);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
