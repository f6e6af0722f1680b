//! Admin authentication, privilege checks and manual grants.

use std::sync::Arc;

use tollgate_store::{AccessStore, StoreResult};
use tollgate_types::{
    ActivationSource, AdminSession, AdminSessionId, AuditAction, AuditEntry, DurationClass,
    Entitlement, PrivilegeLevel, SubjectId,
};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::ServiceConfig;
use crate::error::AdminError;
use crate::reconciler::{Grant, GrantKind, Reconciler};

/// Verifies admin credentials and gates privileged operations.
#[derive(Clone)]
pub struct AdminGuard {
    store: AccessStore,
    reconciler: Reconciler,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl AdminGuard {
    pub fn new(
        store: AccessStore,
        reconciler: Reconciler,
        clock: Arc<dyn Clock>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            reconciler,
            clock,
            config,
        }
    }

    /// Checks credentials and opens a time-boxed session.
    ///
    /// Unknown accounts and wrong passwords get the same refusal so the
    /// response does not leak which accounts exist.
    pub fn authenticate(&self, admin_id: &str, password: &str) -> Result<AdminSession, AdminError> {
        let now = self.clock.now();
        let Some(account) = self.config.account(admin_id) else {
            warn!("Sign-in attempt for unknown admin account");
            return Err(AdminError::InvalidCredentials);
        };
        if !account.verify(password) {
            warn!("Failed sign-in for admin {}", admin_id);
            return Err(AdminError::InvalidCredentials);
        }
        let session = AdminSession {
            id: AdminSessionId::new(),
            admin_id: account.admin_id.clone(),
            level: account.level,
            granted_at: now,
            expires_at: now + self.config.admin_session_ttl,
        };
        self.store.save_admin_session(&session)?;
        self.store.save_audit_entry(&AuditEntry {
            actor: session.admin_id.clone(),
            action: AuditAction::AdminAuthenticated,
            target: None,
            timestamp: now,
            details: format!("level={}", session.level),
        })?;
        info!("Admin {} signed in at level {}", session.admin_id, session.level);
        Ok(session)
    }

    /// Resolves a session and checks it against the required privilege.
    /// Expiry is judged lazily against the clock, not by a sweeper.
    pub fn authorize(
        &self,
        id: &AdminSessionId,
        required: PrivilegeLevel,
    ) -> Result<AdminSession, AdminError> {
        let now = self.clock.now();
        let Some(session) = self.store.get_admin_session(id)? else {
            return Err(AdminError::SessionNotFound);
        };
        if session.is_expired_at(now) {
            warn!("Admin {} presented an expired session", session.admin_id);
            return Err(AdminError::SessionExpired);
        }
        if !session.permits(required) {
            warn!(
                "Admin {} (level {}) refused an operation requiring {}",
                session.admin_id, session.level, required
            );
            return Err(AdminError::InsufficientPrivilege);
        }
        Ok(session)
    }

    /// Grants `class` to a subject directly. Super privilege only.
    pub fn grant(
        &self,
        session_id: &AdminSessionId,
        subject: SubjectId,
        class: DurationClass,
    ) -> Result<Entitlement, AdminError> {
        let now = self.clock.now();
        let session = self.authorize(session_id, PrivilegeLevel::Super)?;
        let grant = Grant {
            kind: GrantKind::Class(class),
            source: ActivationSource::AdminGrant,
            reference: Some(session.admin_id.clone()),
        };
        let entitlement = self.reconciler.reconcile(subject, &grant)?;
        self.store.save_audit_entry(&AuditEntry {
            actor: session.admin_id.clone(),
            action: AuditAction::ManualGrant,
            target: Some(subject.to_string()),
            timestamp: now,
            details: format!("class={class}"),
        })?;
        info!(
            "Admin {} granted {} to subject {}",
            session.admin_id, class, subject
        );
        Ok(entitlement)
    }

    /// Drops expired admin sessions. Purely hygiene; expiry is enforced
    /// lazily either way.
    pub fn sweep_expired_sessions(&self) -> StoreResult<usize> {
        let deleted = self.store.delete_expired_admin_sessions(self.clock.now())?;
        if deleted > 0 {
            info!("Deleted {} expired admin session(s)", deleted);
        }
        Ok(deleted)
    }
}
