//! Common test utilities for demanda-core integration tests.
//!
//! All tests run against in-memory stores for isolation and speed.

pub mod fixtures;

use std::sync::Arc;

use uuid::Uuid;

use demanda_core::{
    Actor, DemandLifecycleService, InMemoryAuditStore, InMemoryDemandStore, InMemoryMemberStore,
    MemberId, OrgRole, TransitionValidator,
};

/// The in-memory stores backing one isolated test.
#[derive(Clone)]
pub struct TestStores {
    pub demand_store: Arc<InMemoryDemandStore>,
    pub member_store: Arc<InMemoryMemberStore>,
    pub audit_store: Arc<InMemoryAuditStore>,
}

impl TestStores {
    pub fn new() -> Self {
        let audit_store = Arc::new(InMemoryAuditStore::new());
        Self {
            demand_store: Arc::new(InMemoryDemandStore::with_audit_sink(audit_store.clone())),
            member_store: Arc::new(InMemoryMemberStore::new()),
            audit_store,
        }
    }
}

/// One isolated engine instance plus the identifiers tests need.
pub struct TestContext {
    pub stores: TestStores,
    pub service: DemandLifecycleService,
    pub unit_id: Uuid,
    pub applicant_id: Uuid,
}

impl TestContext {
    pub fn new() -> Self {
        let stores = TestStores::new();
        let service = DemandLifecycleService::new(
            stores.demand_store.clone(),
            stores.member_store.clone(),
            stores.audit_store.clone(),
            TransitionValidator::standard(),
        );
        Self {
            stores,
            service,
            unit_id: Uuid::new_v4(),
            applicant_id: Uuid::new_v4(),
        }
    }

    /// An actor without a member identity (e.g. an organization admin).
    pub fn actor(&self, role: OrgRole) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            member_id: None,
            display_name: Some("Teste".to_string()),
            role,
        }
    }

    /// An actor acting through a member identity.
    pub fn member_actor(&self, role: OrgRole, member_id: MemberId) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            member_id: Some(member_id),
            display_name: Some("Teste".to_string()),
            role,
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
