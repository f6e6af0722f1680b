//! Persistent storage for entitlement state (entitlements, codes,
//! payment sessions, admin sessions, trial records, audit log).
//!
//! All tables live in one SQLite database so every conditional update and
//! the audit trail share a single connection. The conditional updates are
//! the concurrency story of the whole system: each "exactly once" rule is
//! a single UPDATE with its precondition in the WHERE clause, and the row
//! count tells the caller whether it won. Nothing here blocks on external
//! I/O while the connection lock is held.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tollgate_types::{
    AccessCode, ActivationSource, AdminSession, AdminSessionId, AuditAction, AuditEntry,
    CodeStatus, DurationClass, Entitlement, PaymentMethod, PaymentSession, PaymentSessionId,
    PaymentStatus, PrivilegeLevel, SubjectId, Tier,
};

/// One row per subject that has ever received a trial. The primary key
/// is the trial-once guard; the nullable grace column is the grace-once
/// guard.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub subject_id: SubjectId,
    pub trial_granted_at: DateTime<Utc>,
    pub grace_granted_at: Option<DateTime<Utc>>,
}

/// Persistent store for entitlement state backed by SQLite.
///
/// Cloning is cheap: clones share the underlying connection.
#[derive(Clone)]
pub struct AccessStore {
    conn: Arc<Mutex<Connection>>,
}

impl AccessStore {
    /// Opens (or creates) a store at the given path. Parent directories
    /// are created if missing.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS entitlements (
                subject_id TEXT PRIMARY KEY,
                is_active INTEGER NOT NULL,
                tier TEXT NOT NULL,
                activated_at INTEGER NOT NULL,
                expires_at INTEGER,
                activation_source TEXT NOT NULL,
                activation_reference TEXT,
                revision INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS codes (
                code TEXT PRIMARY KEY,
                class TEXT NOT NULL,
                status TEXT NOT NULL,
                valid_until INTEGER,
                created_by TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                redeemed_by TEXT,
                redeemed_at INTEGER
            );

            CREATE TABLE IF NOT EXISTS payment_sessions (
                id TEXT PRIMARY KEY,
                subject_id TEXT NOT NULL,
                method TEXT NOT NULL,
                plan TEXT NOT NULL,
                amount INTEGER NOT NULL,
                currency TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                deadline INTEGER NOT NULL,
                external_reference TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_payment_sessions_subject
                ON payment_sessions(subject_id);
            CREATE INDEX IF NOT EXISTS idx_payment_sessions_sweep
                ON payment_sessions(status, deadline);

            CREATE TABLE IF NOT EXISTS admin_sessions (
                id TEXT PRIMARY KEY,
                admin_id TEXT NOT NULL,
                level TEXT NOT NULL,
                granted_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS trial_records (
                subject_id TEXT PRIMARY KEY,
                trial_granted_at INTEGER NOT NULL,
                grace_granted_at INTEGER
            );

            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                actor TEXT NOT NULL,
                action TEXT NOT NULL,
                target TEXT,
                timestamp INTEGER NOT NULL,
                details TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ── Entitlements ─────────────────────────────────────────────

    /// Loads the entitlement for a subject, if any.
    pub fn get_entitlement(&self, subject: &SubjectId) -> StoreResult<Option<Entitlement>> {
        Ok(self
            .get_entitlement_versioned(subject)?
            .map(|(entitlement, _)| entitlement))
    }

    /// Loads the entitlement together with its revision counter. The
    /// revision is a store-internal concurrency token consumed by
    /// [`AccessStore::update_entitlement`].
    pub fn get_entitlement_versioned(
        &self,
        subject: &SubjectId,
    ) -> StoreResult<Option<(Entitlement, i64)>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT subject_id, is_active, tier, activated_at, expires_at,
                        activation_source, activation_reference, revision
                 FROM entitlements WHERE subject_id = ?1",
                params![subject.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, i64>(7)?,
                    ))
                },
            )
            .optional()?;
        drop(conn);

        match row {
            None => Ok(None),
            Some((sid, is_active, tier, activated, expires, source, reference, revision)) => {
                let entitlement = Entitlement {
                    subject_id: parse_subject_id(&sid)?,
                    is_active,
                    tier: parse_tier(&tier)?,
                    activated_at: from_millis(activated)?,
                    expires_at: expires.map(from_millis).transpose()?,
                    activation_source: parse_source(&source)?,
                    activation_reference: reference,
                };
                Ok(Some((entitlement, revision)))
            }
        }
    }

    /// Inserts a first entitlement row for a subject at revision 0.
    /// Returns false if a row already exists (a concurrent writer got
    /// there first); nothing is overwritten.
    pub fn insert_entitlement(&self, entitlement: &Entitlement) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "INSERT INTO entitlements (subject_id, is_active, tier, activated_at, expires_at,
                                       activation_source, activation_reference, revision)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)
             ON CONFLICT(subject_id) DO NOTHING",
            params![
                entitlement.subject_id.to_string(),
                entitlement.is_active,
                entitlement.tier.label(),
                to_millis(entitlement.activated_at),
                entitlement.expires_at.map(to_millis),
                entitlement.activation_source.label(),
                entitlement.activation_reference,
            ],
        )?;
        Ok(rows == 1)
    }

    /// Replaces the entitlement row, but only if its revision still
    /// matches `expected_revision`. Returns false when a concurrent
    /// writer bumped the revision first; the caller re-reads and retries.
    pub fn update_entitlement(
        &self,
        entitlement: &Entitlement,
        expected_revision: i64,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE entitlements
             SET is_active = ?2, tier = ?3, activated_at = ?4, expires_at = ?5,
                 activation_source = ?6, activation_reference = ?7,
                 revision = revision + 1
             WHERE subject_id = ?1 AND revision = ?8",
            params![
                entitlement.subject_id.to_string(),
                entitlement.is_active,
                entitlement.tier.label(),
                to_millis(entitlement.activated_at),
                entitlement.expires_at.map(to_millis),
                entitlement.activation_source.label(),
                entitlement.activation_reference,
                expected_revision,
            ],
        )?;
        Ok(rows == 1)
    }

    // ── Access codes ─────────────────────────────────────────────

    /// Saves a freshly issued code.
    pub fn save_code(&self, code: &AccessCode) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO codes (code, class, status, valid_until, created_by, created_at,
                                redeemed_by, redeemed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                code.code,
                code.class.label(),
                code.status.label(),
                code.valid_until.map(to_millis),
                code.created_by,
                to_millis(code.created_at),
                code.redeemed_by.map(|s| s.to_string()),
                code.redeemed_at.map(to_millis),
            ],
        )?;
        Ok(())
    }

    /// Loads a code by value.
    pub fn get_code(&self, value: &str) -> StoreResult<Option<AccessCode>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT code, class, status, valid_until, created_by, created_at,
                        redeemed_by, redeemed_at
                 FROM codes WHERE code = ?1",
                params![value],
                decode_code_row,
            )
            .optional()?;
        drop(conn);
        row.map(code_from_parts).transpose()
    }

    /// Lists issued codes, newest first, with pagination.
    pub fn list_codes(&self, limit: usize, offset: usize) -> StoreResult<Vec<AccessCode>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT code, class, status, valid_until, created_by, created_at,
                    redeemed_by, redeemed_at
             FROM codes ORDER BY created_at DESC, code ASC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], decode_code_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(code_from_parts(row?)?);
        }
        Ok(result)
    }

    /// Consumes a code: flips it to `redeemed` and records the redeemer,
    /// but only if it is still unredeemed and not past its deadline.
    /// The whole precondition lives in one UPDATE, so of any number of
    /// concurrent redeemers exactly one sees `true`.
    pub fn mark_code_redeemed(
        &self,
        value: &str,
        subject: &SubjectId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE codes
             SET status = 'redeemed', redeemed_by = ?2, redeemed_at = ?3
             WHERE code = ?1 AND status = 'unredeemed'
               AND (valid_until IS NULL OR valid_until > ?3)",
            params![value, subject.to_string(), to_millis(now)],
        )?;
        Ok(rows == 1)
    }

    /// Withdraws a code, but only while it is still unredeemed. Returns
    /// false if it was already redeemed or revoked.
    pub fn mark_code_revoked(&self, value: &str) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE codes SET status = 'revoked' WHERE code = ?1 AND status = 'unredeemed'",
            params![value],
        )?;
        Ok(rows == 1)
    }

    // ── Payment sessions ─────────────────────────────────────────

    /// Saves a newly created payment session.
    pub fn save_payment_session(&self, session: &PaymentSession) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO payment_sessions (id, subject_id, method, plan, amount, currency,
                                           status, created_at, deadline, external_reference)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                session.id.to_string(),
                session.subject_id.to_string(),
                session.method.label(),
                session.plan.label(),
                session.amount as i64,
                session.currency,
                session.status.label(),
                to_millis(session.created_at),
                to_millis(session.deadline),
                session.external_reference,
            ],
        )?;
        Ok(())
    }

    /// Loads a payment session by id.
    pub fn get_payment_session(
        &self,
        id: &PaymentSessionId,
    ) -> StoreResult<Option<PaymentSession>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, subject_id, method, plan, amount, currency, status,
                        created_at, deadline, external_reference
                 FROM payment_sessions WHERE id = ?1",
                params![id.to_string()],
                decode_session_row,
            )
            .optional()?;
        drop(conn);
        row.map(session_from_parts).transpose()
    }

    /// Loads all payment sessions for a subject, newest first.
    pub fn get_payment_sessions_for_subject(
        &self,
        subject: &SubjectId,
    ) -> StoreResult<Vec<PaymentSession>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, subject_id, method, plan, amount, currency, status,
                    created_at, deadline, external_reference
             FROM payment_sessions WHERE subject_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![subject.to_string()], decode_session_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(session_from_parts(row?)?);
        }
        Ok(result)
    }

    /// Moves a pending session to `processing`, recording the gateway
    /// reference if one was supplied. Returns false unless the session
    /// was pending.
    pub fn mark_payment_processing(
        &self,
        id: &PaymentSessionId,
        external_reference: Option<&str>,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE payment_sessions
             SET status = 'processing',
                 external_reference = COALESCE(?2, external_reference)
             WHERE id = ?1 AND status = 'pending'",
            params![id.to_string(), external_reference],
        )?;
        Ok(rows == 1)
    }

    /// Settles an open session into a terminal status. Returns false if
    /// the session was already terminal (or missing); of concurrent
    /// settlers exactly one sees `true`. `next` must be terminal.
    pub fn settle_payment(&self, id: &PaymentSessionId, next: PaymentStatus) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE payment_sessions SET status = ?2
             WHERE id = ?1 AND status IN ('pending', 'processing')",
            params![id.to_string(), next.label()],
        )?;
        Ok(rows == 1)
    }

    /// Cancels a session, but only while it is still pending. Once the
    /// gateway has acknowledged it the subject can no longer back out.
    pub fn cancel_payment_if_pending(&self, id: &PaymentSessionId) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE payment_sessions SET status = 'cancelled'
             WHERE id = ?1 AND status = 'pending'",
            params![id.to_string()],
        )?;
        Ok(rows == 1)
    }

    /// Expires one open session, but only if its deadline has actually
    /// passed. Used by the lazy check-on-read path.
    pub fn mark_payment_expired(
        &self,
        id: &PaymentSessionId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE payment_sessions SET status = 'expired'
             WHERE id = ?1 AND status IN ('pending', 'processing') AND deadline <= ?2",
            params![id.to_string(), to_millis(now)],
        )?;
        Ok(rows == 1)
    }

    /// Expires every open session whose deadline has passed. Returns the
    /// number of sessions swept.
    pub fn sweep_expired_payments(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE payment_sessions SET status = 'expired'
             WHERE status IN ('pending', 'processing') AND deadline <= ?1",
            params![to_millis(now)],
        )?;
        Ok(rows)
    }

    // ── Admin sessions ───────────────────────────────────────────

    /// Saves a new admin session.
    pub fn save_admin_session(&self, session: &AdminSession) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO admin_sessions (id, admin_id, level, granted_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.id.to_string(),
                session.admin_id,
                session.level.label(),
                to_millis(session.granted_at),
                to_millis(session.expires_at),
            ],
        )?;
        Ok(())
    }

    /// Loads an admin session by id. Expiry is the caller's concern;
    /// lapsed rows are returned as stored.
    pub fn get_admin_session(&self, id: &AdminSessionId) -> StoreResult<Option<AdminSession>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, admin_id, level, granted_at, expires_at
                 FROM admin_sessions WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;
        drop(conn);

        match row {
            None => Ok(None),
            Some((id, admin_id, level, granted, expires)) => Ok(Some(AdminSession {
                id: parse_admin_session_id(&id)?,
                admin_id,
                level: parse_level(&level)?,
                granted_at: from_millis(granted)?,
                expires_at: from_millis(expires)?,
            })),
        }
    }

    /// Deletes sessions past their expiry. Housekeeping only: authorize
    /// checks expiry on every use regardless.
    pub fn delete_expired_admin_sessions(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "DELETE FROM admin_sessions WHERE expires_at <= ?1",
            params![to_millis(now)],
        )?;
        Ok(rows)
    }

    // ── Trial records ────────────────────────────────────────────

    /// Records that a subject received its trial. Returns false if a
    /// record already exists; the primary key makes this the atomic
    /// once-only guard.
    pub fn insert_trial_record(&self, subject: &SubjectId, now: DateTime<Utc>) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "INSERT INTO trial_records (subject_id, trial_granted_at, grace_granted_at)
             VALUES (?1, ?2, NULL)
             ON CONFLICT(subject_id) DO NOTHING",
            params![subject.to_string(), to_millis(now)],
        )?;
        Ok(rows == 1)
    }

    /// Loads the trial record for a subject, if any.
    pub fn get_trial_record(&self, subject: &SubjectId) -> StoreResult<Option<TrialRecord>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT subject_id, trial_granted_at, grace_granted_at
                 FROM trial_records WHERE subject_id = ?1",
                params![subject.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                    ))
                },
            )
            .optional()?;
        drop(conn);

        match row {
            None => Ok(None),
            Some((sid, trial, grace)) => Ok(Some(TrialRecord {
                subject_id: parse_subject_id(&sid)?,
                trial_granted_at: from_millis(trial)?,
                grace_granted_at: grace.map(from_millis).transpose()?,
            })),
        }
    }

    /// Records the one-time grace grant. Returns false if grace was
    /// already granted (or the subject never had a trial); the NULL
    /// check makes this the atomic once-only guard.
    pub fn mark_grace_granted(&self, subject: &SubjectId, now: DateTime<Utc>) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE trial_records SET grace_granted_at = ?2
             WHERE subject_id = ?1 AND grace_granted_at IS NULL",
            params![subject.to_string(), to_millis(now)],
        )?;
        Ok(rows == 1)
    }

    // ── Audit log ────────────────────────────────────────────────

    /// Appends an audit entry. The log is append-only; there is no
    /// update or delete.
    pub fn save_audit_entry(&self, entry: &AuditEntry) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO audit_log (actor, action, target, timestamp, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.actor,
                entry.action.label(),
                entry.target,
                to_millis(entry.timestamp),
                entry.details,
            ],
        )?;
        Ok(())
    }

    /// Loads audit log entries with pagination, newest first.
    pub fn load_audit_log(&self, limit: usize, offset: usize) -> StoreResult<Vec<AuditEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT actor, action, target, timestamp, details
             FROM audit_log ORDER BY id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (actor, action, target, timestamp, details) = row?;
            result.push(AuditEntry {
                actor,
                action: parse_action(&action)?,
                target,
                timestamp: from_millis(timestamp)?,
                details,
            });
        }
        Ok(result)
    }

    /// Returns the total number of audit log entries.
    pub fn audit_log_count(&self) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

// ── Row decoding ─────────────────────────────────────────────────

type CodeRow = (
    String,
    String,
    String,
    Option<i64>,
    String,
    i64,
    Option<String>,
    Option<i64>,
);

fn decode_code_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CodeRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn code_from_parts(parts: CodeRow) -> StoreResult<AccessCode> {
    let (code, class, status, valid_until, created_by, created_at, redeemed_by, redeemed_at) =
        parts;
    Ok(AccessCode {
        code,
        class: parse_class(&class)?,
        status: parse_code_status(&status)?,
        valid_until: valid_until.map(from_millis).transpose()?,
        created_by,
        created_at: from_millis(created_at)?,
        redeemed_by: redeemed_by.as_deref().map(parse_subject_id).transpose()?,
        redeemed_at: redeemed_at.map(from_millis).transpose()?,
    })
}

type SessionRow = (
    String,
    String,
    String,
    String,
    i64,
    String,
    String,
    i64,
    i64,
    Option<String>,
);

fn decode_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn session_from_parts(parts: SessionRow) -> StoreResult<PaymentSession> {
    let (id, subject, method, plan, amount, currency, status, created, deadline, reference) =
        parts;
    Ok(PaymentSession {
        id: parse_payment_session_id(&id)?,
        subject_id: parse_subject_id(&subject)?,
        method: parse_method(&method)?,
        plan: parse_class(&plan)?,
        amount: amount as u64,
        currency,
        status: parse_payment_status(&status)?,
        created_at: from_millis(created)?,
        deadline: from_millis(deadline)?,
        external_reference: reference,
    })
}

// ── Column conversions ───────────────────────────────────────────

fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(ms: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::InvalidData(format!("timestamp out of range: {ms}")))
}

fn parse_subject_id(s: &str) -> StoreResult<SubjectId> {
    SubjectId::parse(s).map_err(|e| StoreError::InvalidData(format!("invalid subject id: {e}")))
}

fn parse_payment_session_id(s: &str) -> StoreResult<PaymentSessionId> {
    PaymentSessionId::parse(s)
        .map_err(|e| StoreError::InvalidData(format!("invalid session id: {e}")))
}

fn parse_admin_session_id(s: &str) -> StoreResult<AdminSessionId> {
    AdminSessionId::parse(s)
        .map_err(|e| StoreError::InvalidData(format!("invalid admin session id: {e}")))
}

fn parse_tier(s: &str) -> StoreResult<Tier> {
    Tier::from_label(s).ok_or_else(|| StoreError::InvalidData(format!("unknown tier: {s}")))
}

fn parse_source(s: &str) -> StoreResult<ActivationSource> {
    ActivationSource::from_label(s)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown activation source: {s}")))
}

fn parse_class(s: &str) -> StoreResult<DurationClass> {
    DurationClass::from_label(s)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown duration class: {s}")))
}

fn parse_code_status(s: &str) -> StoreResult<CodeStatus> {
    CodeStatus::from_label(s)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown code status: {s}")))
}

fn parse_method(s: &str) -> StoreResult<PaymentMethod> {
    PaymentMethod::from_label(s)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown payment method: {s}")))
}

fn parse_payment_status(s: &str) -> StoreResult<PaymentStatus> {
    PaymentStatus::from_label(s)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown payment status: {s}")))
}

fn parse_level(s: &str) -> StoreResult<PrivilegeLevel> {
    PrivilegeLevel::from_label(s)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown privilege level: {s}")))
}

fn parse_action(s: &str) -> StoreResult<AuditAction> {
    AuditAction::from_label(s)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown audit action: {s}")))
}
