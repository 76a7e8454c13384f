//! S6 — cross-tenant isolation: a caller authenticated for tenant A must get
//! a 404, never a 403, when the path names tenant B. A 403 would leak that
//! tenant B exists; a 404 reads identically to "no such tenant at all".

use axum::http::StatusCode;

use kugel_pos_core::gateway::envelope::error_codes;
use kugel_pos_core::identity::context::CallerContext;
use kugel_pos_core::tenant::TenantId;

fn caller_for(tenant_id: &str) -> CallerContext {
    CallerContext {
        tenant_id: TenantId::parse(tenant_id).unwrap(),
        store_code: None,
        terminal_id: None,
        staff_id: Some("staff1".to_string()),
        is_superuser: false,
        roles: vec!["cashier".to_string()],
    }
}

#[test]
fn matching_tenant_is_allowed() {
    let caller = caller_for("A0001");
    assert!(caller.require_tenant(&TenantId::parse("A0001").unwrap()).is_ok());
}

#[test]
fn mismatched_tenant_is_not_found_not_forbidden() {
    let caller = caller_for("A0001");
    let err = caller.require_tenant(&TenantId::parse("B0002").unwrap()).unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
    assert_eq!(err.code, error_codes::ACCOUNT_NOT_FOUND);
}

#[test]
fn superuser_flag_does_not_bypass_tenant_scoping() {
    // Even a superuser-flagged caller only carries one tenant_id; the
    // isolation check itself makes no exception for it.
    let mut caller = caller_for("A0001");
    caller.is_superuser = true;
    assert!(caller.require_tenant(&TenantId::parse("B0002").unwrap()).is_err());
}
