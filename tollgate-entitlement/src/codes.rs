//! Access code issuance and redemption.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tollgate_store::{AccessStore, StoreResult};
use tollgate_types::{
    AccessCode, ActivationSource, AuditAction, AuditEntry, CodeStatus, DurationClass, Entitlement,
    SubjectId,
};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::RedeemError;
use crate::reconciler::{Grant, GrantKind, Reconciler};

/// Token alphabet. 0/O and 1/I/L are left out so codes survive being
/// read aloud or retyped.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_GROUPS: usize = 4;
const CODE_GROUP_LEN: usize = 4;

/// Issues, redeems and withdraws access codes.
#[derive(Clone)]
pub struct CodeRegistry {
    store: AccessStore,
    reconciler: Reconciler,
    clock: Arc<dyn Clock>,
}

impl CodeRegistry {
    pub fn new(store: AccessStore, reconciler: Reconciler, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            reconciler,
            clock,
        }
    }

    /// Mints a fresh unredeemed code granting `class`.
    pub fn generate(
        &self,
        class: DurationClass,
        created_by: &str,
        valid_until: Option<DateTime<Utc>>,
    ) -> StoreResult<AccessCode> {
        let now = self.clock.now();
        let code = AccessCode {
            code: generate_token(),
            class,
            status: CodeStatus::Unredeemed,
            valid_until,
            created_by: created_by.to_string(),
            created_at: now,
            redeemed_by: None,
            redeemed_at: None,
        };
        self.store.save_code(&code)?;
        self.store.save_audit_entry(&AuditEntry {
            actor: created_by.to_string(),
            action: AuditAction::CodeGenerated,
            target: Some(code.code.clone()),
            timestamp: now,
            details: match valid_until {
                Some(deadline) => format!("class={} valid_until={}", class, deadline.to_rfc3339()),
                None => format!("class={class}"),
            },
        })?;
        info!("Generated {} access code on behalf of {}", class, created_by);
        Ok(code)
    }

    /// Redeems `value` for `subject` and returns the merged entitlement.
    ///
    /// The redemption itself is a single conditional update, so under any
    /// number of concurrent calls exactly one wins; the rest get a precise
    /// refusal based on what the code looks like afterwards.
    pub fn redeem(&self, value: &str, subject: SubjectId) -> Result<Entitlement, RedeemError> {
        let now = self.clock.now();
        let value = normalize(value);
        if self.store.mark_code_redeemed(&value, &subject, now)? {
            let code = self.store.get_code(&value)?.ok_or(RedeemError::NotFound)?;
            self.store.save_audit_entry(&AuditEntry {
                actor: subject.to_string(),
                action: AuditAction::CodeRedeemed,
                target: Some(value.clone()),
                timestamp: now,
                details: format!("class={}", code.class),
            })?;
            info!("Subject {} redeemed a {} code", subject, code.class);
            let grant = Grant {
                kind: GrantKind::Class(code.class),
                source: ActivationSource::Code,
                reference: Some(value),
            };
            return Ok(self.reconciler.reconcile(subject, &grant)?);
        }

        // The conditional update matched nothing; classify the refusal.
        let Some(code) = self.store.get_code(&value)? else {
            return Err(RedeemError::NotFound);
        };
        let refusal = match code.status {
            CodeStatus::Revoked => RedeemError::Revoked,
            CodeStatus::Unredeemed if !code.is_redeemable_at(now) => RedeemError::Expired,
            _ => RedeemError::AlreadyUsed,
        };
        warn!("Refused code redemption for subject {}: {}", subject, refusal);
        Err(refusal)
    }

    /// Withdraws an unredeemed code. Withdrawing twice is a no-op.
    pub fn revoke(&self, value: &str, revoked_by: &str) -> Result<(), RedeemError> {
        let now = self.clock.now();
        let value = normalize(value);
        if self.store.mark_code_revoked(&value)? {
            self.store.save_audit_entry(&AuditEntry {
                actor: revoked_by.to_string(),
                action: AuditAction::CodeRevoked,
                target: Some(value),
                timestamp: now,
                details: String::new(),
            })?;
            info!("Revoked an access code on behalf of {}", revoked_by);
            return Ok(());
        }
        let Some(code) = self.store.get_code(&value)? else {
            return Err(RedeemError::NotFound);
        };
        match code.status {
            CodeStatus::Revoked => Ok(()),
            _ => Err(RedeemError::AlreadyUsed),
        }
    }

    /// Pages through issued codes, newest first.
    pub fn list(&self, limit: usize, offset: usize) -> StoreResult<Vec<AccessCode>> {
        self.store.list_codes(limit, offset)
    }
}

/// Codes compare case-insensitively and ignore surrounding whitespace.
fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let mut groups = Vec::with_capacity(CODE_GROUPS);
    for _ in 0..CODE_GROUPS {
        let group: String = (0..CODE_GROUP_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        groups.push(group);
    }
    groups.join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_use_the_safe_alphabet() {
        for _ in 0..50 {
            let token = generate_token();
            assert_eq!(token.len(), CODE_GROUPS * CODE_GROUP_LEN + CODE_GROUPS - 1);
            for (i, ch) in token.chars().enumerate() {
                if (i + 1) % (CODE_GROUP_LEN + 1) == 0 {
                    assert_eq!(ch, '-');
                } else {
                    assert!(CODE_ALPHABET.contains(&(ch as u8)), "unexpected char {ch}");
                }
            }
        }
    }

    #[test]
    fn normalize_uppercases_and_trims() {
        assert_eq!(normalize("  abcd-efgh "), "ABCD-EFGH");
        assert_eq!(normalize("ABCD-EFGH"), "ABCD-EFGH");
    }
}
