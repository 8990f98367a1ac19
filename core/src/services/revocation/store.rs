//! Revocation store backed by a hash map behind a read/write lock

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error};
use uuid::Uuid;

use wd_shared::config::RevocationConfig;

use crate::domain::entities::revocation::{RevocationReason, RevocationRecord};
use crate::domain::entities::token::TokenKind;

/// Keyed store of revoked-token records with per-record expiry
///
/// No method awaits, so the lock is never held across a suspension point.
pub struct RevocationStore {
    records: RwLock<HashMap<Uuid, RevocationRecord>>,
    fail_closed: bool,
}

impl Default for RevocationStore {
    fn default() -> Self {
        Self::new(&RevocationConfig::default())
    }
}

impl RevocationStore {
    pub fn new(config: &RevocationConfig) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            fail_closed: config.fail_closed,
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, RevocationRecord>> {
        // a writer that panicked mid-update leaves a valid map behind; keep
        // accepting revocations rather than dropping them
        self.records.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, RevocationRecord>> {
        self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert or overwrite the record for `jti`
    ///
    /// Repeated calls are idempotent; the latest reason and timestamp win.
    /// Records whose expiry has already passed are not stored.
    pub fn blacklist(
        &self,
        jti: Uuid,
        principal_id: Uuid,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
        reason: RevocationReason,
    ) {
        let now = Utc::now();
        if expires_at <= now {
            return;
        }
        self.write().insert(
            jti,
            RevocationRecord {
                jti,
                principal_id,
                kind,
                blacklisted_at: now,
                expires_at,
                reason,
            },
        );
        debug!(%jti, %principal_id, %reason, "token blacklisted");
    }

    /// Insert a record only if none exists for `jti`.
    ///
    /// Returns `true` if a record was inserted.
    pub fn blacklist_if_absent(
        &self,
        jti: Uuid,
        principal_id: Uuid,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
        reason: RevocationReason,
    ) -> bool {
        let now = Utc::now();
        if expires_at <= now {
            return false;
        }
        let mut records = self.write();
        if records.get(&jti).is_some_and(|r| !r.is_expired_at(now)) {
            return false;
        }
        records.insert(
            jti,
            RevocationRecord {
                jti,
                principal_id,
                kind,
                blacklisted_at: now,
                expires_at,
                reason,
            },
        );
        true
    }

    /// Whether `jti` is currently blacklisted
    ///
    /// Expired records report `false` and are removed. A lookup that finds
    /// the lock poisoned answers with the configured fail-closed policy and
    /// clears the poison, so later lookups read the map again.
    pub fn is_blacklisted(&self, jti: Uuid) -> bool {
        let now = Utc::now();
        let expired = match self.records.read() {
            Ok(records) => match records.get(&jti) {
                None => return false,
                Some(record) if !record.is_expired_at(now) => return true,
                Some(_) => true,
            },
            Err(_) => {
                error!(%jti, fail_closed = self.fail_closed, "revocation store poisoned");
                self.records.clear_poison();
                return self.fail_closed;
            }
        };

        if expired {
            let mut records = self.write();
            if records.get(&jti).is_some_and(|r| r.is_expired_at(now)) {
                records.remove(&jti);
            }
        }
        false
    }

    /// Current record for `jti`, if live
    pub fn get(&self, jti: Uuid) -> Option<RevocationRecord> {
        let now = Utc::now();
        self.read()
            .get(&jti)
            .filter(|r| !r.is_expired_at(now))
            .cloned()
    }

    /// Restamp every live record of a principal with `reason`
    ///
    /// Records already carrying a more specific reason keep it. Returns the
    /// number of records restamped.
    pub fn blacklist_all_for_principal(
        &self,
        principal_id: Uuid,
        reason: RevocationReason,
    ) -> usize {
        self.restamp_where(reason, |r| r.principal_id == principal_id)
    }

    /// Same as [`Self::blacklist_all_for_principal`] restricted to refresh tokens
    pub fn blacklist_all_refresh_for_principal(
        &self,
        principal_id: Uuid,
        reason: RevocationReason,
    ) -> usize {
        self.restamp_where(reason, |r| {
            r.principal_id == principal_id && r.kind == TokenKind::Refresh
        })
    }

    fn restamp_where<F>(&self, reason: RevocationReason, matches: F) -> usize
    where
        F: Fn(&RevocationRecord) -> bool,
    {
        let now = Utc::now();
        let mut records = self.write();
        let mut stamped = 0;
        for record in records.values_mut() {
            if !record.is_expired_at(now) && matches(record) && record.restamp(reason, now) {
                stamped += 1;
            }
        }
        stamped
    }

    /// Remove every expired record. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut records = self.write();
        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        before - records.len()
    }

    /// Number of records held, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a record verbatim, bypassing the expiry guard
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, record: RevocationRecord) {
        self.write().insert(record.jti, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn store() -> RevocationStore {
        RevocationStore::default()
    }

    fn in_ten_minutes() -> DateTime<Utc> {
        Utc::now() + Duration::minutes(10)
    }

    fn stamp(
        store: &RevocationStore,
        jti: Uuid,
        principal_id: Uuid,
        kind: TokenKind,
        reason: RevocationReason,
    ) {
        store.blacklist(jti, principal_id, kind, in_ten_minutes(), reason);
    }

    fn expired_record(principal_id: Uuid) -> RevocationRecord {
        let now = Utc::now();
        RevocationRecord {
            jti: Uuid::new_v4(),
            principal_id,
            kind: TokenKind::Access,
            blacklisted_at: now - Duration::minutes(20),
            expires_at: now - Duration::seconds(1),
            reason: RevocationReason::Logout,
        }
    }

    #[test]
    fn test_blacklist_then_lookup() {
        let store = store();
        let jti = Uuid::new_v4();
        assert!(!store.is_blacklisted(jti));

        stamp(&store, jti, Uuid::new_v4(), TokenKind::Access, RevocationReason::Logout);
        assert!(store.is_blacklisted(jti));
        assert!(store.is_blacklisted(jti));
    }

    #[test]
    fn test_blacklist_is_last_write_wins() {
        let store = store();
        let jti = Uuid::new_v4();
        let principal = Uuid::new_v4();

        stamp(&store, jti, principal, TokenKind::Access, RevocationReason::SecurityBreach);
        stamp(&store, jti, principal, TokenKind::Access, RevocationReason::Logout);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(jti).unwrap().reason, RevocationReason::Logout);
    }

    #[test]
    fn test_already_expired_blacklist_is_ignored() {
        let store = store();
        let jti = Uuid::new_v4();
        store.blacklist(
            jti,
            Uuid::new_v4(),
            TokenKind::Access,
            Utc::now() - Duration::seconds(1),
            RevocationReason::Manual,
        );
        assert!(store.is_empty());
        assert!(!store.is_blacklisted(jti));
    }

    #[test]
    fn test_expired_record_reports_false_and_is_removed_lazily() {
        let store = store();
        let record = expired_record(Uuid::new_v4());
        let jti = record.jti;
        store.insert_raw(record);
        assert_eq!(store.len(), 1);

        assert!(!store.is_blacklisted(jti));
        assert_eq!(store.len(), 0);
        assert!(!store.is_blacklisted(jti));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let store = store();
        let principal = Uuid::new_v4();
        store.insert_raw(expired_record(principal));
        store.insert_raw(expired_record(principal));
        let live = Uuid::new_v4();
        stamp(&store, live, principal, TokenKind::Refresh, RevocationReason::Logout);

        assert_eq!(store.sweep_expired(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.is_blacklisted(live));
    }

    #[test]
    fn test_blacklist_if_absent_keeps_existing_reason() {
        let store = store();
        let jti = Uuid::new_v4();
        let principal = Uuid::new_v4();

        let (kind, expires) = (TokenKind::Access, in_ten_minutes());
        let first = RevocationReason::TokenRefresh;
        assert!(store.blacklist_if_absent(jti, principal, kind, expires, first));
        let second = RevocationReason::Manual;
        assert!(!store.blacklist_if_absent(jti, principal, kind, expires, second));
        assert_eq!(store.get(jti).unwrap().reason, RevocationReason::TokenRefresh);
    }

    #[test]
    fn test_bulk_stamp_keeps_more_specific_reason() {
        let store = store();
        let principal = Uuid::new_v4();
        let other = Uuid::new_v4();
        let (logged_out, breached, foreign) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        stamp(&store, logged_out, principal, TokenKind::Access, RevocationReason::Logout);
        stamp(&store, breached, principal, TokenKind::Refresh, RevocationReason::SecurityBreach);
        stamp(&store, foreign, other, TokenKind::Access, RevocationReason::Logout);

        let stamped = store.blacklist_all_for_principal(principal, RevocationReason::LogoutAll);
        assert_eq!(stamped, 1);
        assert_eq!(store.get(logged_out).unwrap().reason, RevocationReason::LogoutAll);
        assert_eq!(store.get(breached).unwrap().reason, RevocationReason::SecurityBreach);
        assert_eq!(store.get(foreign).unwrap().reason, RevocationReason::Logout);
    }

    #[test]
    fn test_bulk_refresh_stamp_skips_access_records() {
        let store = store();
        let principal = Uuid::new_v4();
        let (access, refresh) = (Uuid::new_v4(), Uuid::new_v4());

        stamp(&store, access, principal, TokenKind::Access, RevocationReason::TokenRefresh);
        stamp(&store, refresh, principal, TokenKind::Refresh, RevocationReason::TokenRefresh);

        let stamped =
            store.blacklist_all_refresh_for_principal(principal, RevocationReason::PasswordChange);
        assert_eq!(stamped, 1);
        assert_eq!(store.get(refresh).unwrap().reason, RevocationReason::PasswordChange);
        assert_eq!(store.get(access).unwrap().reason, RevocationReason::TokenRefresh);
    }

    fn poison(store: &RevocationStore) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.records.write().unwrap();
            panic!("poison the revocation lock");
        }));
    }

    #[test]
    fn test_unreadable_store_fails_closed_by_default() {
        let store = store();
        poison(&store);
        assert!(store.is_blacklisted(Uuid::new_v4()));
    }

    #[test]
    fn test_poisoned_lookup_recovers_after_first_answer() {
        let store = store();
        let (revoked, clean) = (Uuid::new_v4(), Uuid::new_v4());
        stamp(&store, revoked, Uuid::new_v4(), TokenKind::Access, RevocationReason::Logout);
        poison(&store);

        assert!(store.is_blacklisted(clean));
        assert!(!store.is_blacklisted(clean));
        assert!(store.is_blacklisted(revoked));
    }

    #[test]
    fn test_bulk_stamp_counts_each_matching_record() {
        let store = store();
        let principal = Uuid::new_v4();
        for _ in 0..3 {
            stamp(&store, Uuid::new_v4(), principal, TokenKind::Access, RevocationReason::Logout);
        }
        store.insert_raw(expired_record(principal));

        let stamped =
            store.blacklist_all_for_principal(principal, RevocationReason::SecurityBreach);
        assert_eq!(stamped, 3);
        assert_eq!(store.blacklist_all_for_principal(principal, RevocationReason::Logout), 0);
    }

    #[test]
    fn test_unreadable_store_can_fail_open() {
        let store = RevocationStore::new(&RevocationConfig {
            fail_closed: false,
            ..Default::default()
        });
        poison(&store);
        assert!(!store.is_blacklisted(Uuid::new_v4()));

        // writes keep working after the lock was poisoned
        let jti = Uuid::new_v4();
        stamp(&store, jti, Uuid::new_v4(), TokenKind::Access, RevocationReason::Manual);
        assert_eq!(store.sweep_expired(), 0);
    }
}
