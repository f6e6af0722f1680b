//! Shared test helpers for entitlement engine tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tollgate_entitlement::{
    AccessService, AdminAccount, AdminGuard, CodeRegistry, ManualClock, PaymentManager,
    Reconciler, ServiceConfig, TrialManager,
};
use tollgate_store::AccessStore;
use tollgate_types::PrivilegeLevel;

/// Fixed test epoch: 2023-11-14T22:13:20Z.
pub const T0_MILLIS: i64 = 1_700_000_000_000;

pub fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(T0_MILLIS).unwrap()
}

/// Default config plus one standard and one super admin account.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        admins: vec![
            AdminAccount::with_password(
                "ops@example.com",
                PrivilegeLevel::Standard,
                "salt-ops",
                "ops-password",
            ),
            AdminAccount::with_password(
                "root@example.com",
                PrivilegeLevel::Super,
                "salt-root",
                "root-password",
            ),
        ],
        ..ServiceConfig::default()
    }
}

/// In-memory service frozen at [`t0`], plus handles to drive it.
pub fn service_at_t0() -> (AccessService, ManualClock, AccessStore) {
    let store = AccessStore::open_in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let service = AccessService::with_clock(store.clone(), test_config(), Arc::new(clock.clone()));
    (service, clock, store)
}

/// Bare reconciler over an in-memory store, for tests below the facade.
pub fn reconciler_at_t0() -> (Reconciler, ManualClock, AccessStore) {
    let store = AccessStore::open_in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let reconciler = Reconciler::new(store.clone(), Arc::new(clock.clone()));
    (reconciler, clock, store)
}

/// Code registry plus the reconciler it feeds, for tests below the facade.
pub fn registry_at_t0() -> (CodeRegistry, ManualClock, AccessStore) {
    let store = AccessStore::open_in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let shared: Arc<ManualClock> = Arc::new(clock.clone());
    let reconciler = Reconciler::new(store.clone(), shared.clone());
    let registry = CodeRegistry::new(store.clone(), reconciler, shared);
    (registry, clock, store)
}

/// Payment manager wired to an in-memory store and manual clock.
pub fn payments_at_t0() -> (PaymentManager, ManualClock, AccessStore) {
    let store = AccessStore::open_in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let shared: Arc<ManualClock> = Arc::new(clock.clone());
    let reconciler = Reconciler::new(store.clone(), shared.clone());
    let payments = PaymentManager::new(store.clone(), reconciler, shared, test_config());
    (payments, clock, store)
}

/// Trial manager wired to an in-memory store and manual clock.
pub fn trials_at_t0() -> (TrialManager, ManualClock, AccessStore) {
    let store = AccessStore::open_in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let shared: Arc<ManualClock> = Arc::new(clock.clone());
    let reconciler = Reconciler::new(store.clone(), shared.clone());
    let trials = TrialManager::new(store.clone(), reconciler, shared, test_config());
    (trials, clock, store)
}

/// Admin guard wired to an in-memory store and manual clock.
pub fn admin_at_t0() -> (AdminGuard, ManualClock, AccessStore) {
    let store = AccessStore::open_in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let shared: Arc<ManualClock> = Arc::new(clock.clone());
    let reconciler = Reconciler::new(store.clone(), shared.clone());
    let admin = AdminGuard::new(store.clone(), reconciler, shared, test_config());
    (admin, clock, store)
}
