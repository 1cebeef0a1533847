//! Hash-chained audit trail of provisioning decisions
//!
//! Every entry commits to its predecessor's hash, so any in-place edit
//! breaks [`AuditLog::verify_integrity`]. Credentials are never stored,
//! only a short SHA-256 fingerprint.
//!
//! The in-memory window is bounded. Each entry is also emitted as a
//! `tracing` event on the `agency::audit` target, which is the durable
//! record; the oldest entries are evicted once the window is full and the
//! chain is verified from the last evicted hash onward.

use agency_model::{Credential, ProjectId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::fmt;

/// Entries kept in memory by default
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    AccessGranted,
    AccessDenied,
    BlueprintRejected,
    ProjectCommitted,
    ProjectRolledBack,
    RollbackIncomplete,
}

impl AuditAction {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AccessGranted => "access_granted",
            AuditAction::AccessDenied => "access_denied",
            AuditAction::BlueprintRejected => "blueprint_rejected",
            AuditAction::ProjectCommitted => "project_committed",
            AuditAction::ProjectRolledBack => "project_rolled_back",
            AuditAction::RollbackIncomplete => "rollback_incomplete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    /// Credential fingerprint
    pub actor: String,
    pub action: AuditAction,
    pub project_id: Option<ProjectId>,
    pub detail: String,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

/// Audit chain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    #[error("audit chain broken at entry {sequence}")]
    IntegrityViolation { sequence: u64 },
}

#[derive(Debug, Default)]
struct Chain {
    entries: VecDeque<AuditEntry>,
    next_sequence: u64,
    /// Hash of the newest evicted entry, zero while nothing was evicted
    anchor: [u8; 32],
}

/// Append-only audit chain with a bounded in-memory window
#[derive(Debug)]
pub struct AuditLog {
    inner: Mutex<Chain>,
    capacity: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` entries in memory (at least one)
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Chain::default()),
            capacity: capacity.max(1),
        }
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry and return its sequence number
    pub fn append(
        &self,
        credential: &Credential,
        action: AuditAction,
        project_id: Option<ProjectId>,
        detail: impl Into<String>,
    ) -> u64 {
        let mut chain = self.inner.lock();
        let prev_hash = chain.entries.back().map_or(chain.anchor, |e| e.hash);
        let mut entry = AuditEntry {
            sequence: chain.next_sequence,
            timestamp: Utc::now(),
            actor: fingerprint(credential),
            action,
            project_id,
            detail: detail.into(),
            prev_hash,
            hash: [0u8; 32],
        };
        entry.hash = compute_hash(&entry);
        tracing::info!(
            target: "agency::audit",
            sequence = entry.sequence,
            actor = %entry.actor,
            action = %entry.action,
            project_id = ?entry.project_id,
            detail = %entry.detail,
            hash = %hex::encode(entry.hash),
            "audit"
        );

        let sequence = entry.sequence;
        chain.next_sequence += 1;
        chain.entries.push_back(entry);
        while chain.entries.len() > self.capacity {
            if let Some(evicted) = chain.entries.pop_front() {
                chain.anchor = evicted.hash;
            }
        }
        sequence
    }

    /// Snapshot of the retained entries, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.inner.lock().entries.iter().cloned().collect()
    }

    /// Retained entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Recompute the retained chain
    ///
    /// # Errors
    /// `AuditError::IntegrityViolation` naming the first bad entry
    pub fn verify_integrity(&self) -> Result<(), AuditError> {
        let chain = self.inner.lock();
        let mut prev = chain.anchor;
        for e in &chain.entries {
            if e.prev_hash != prev || e.hash != compute_hash(e) {
                return Err(AuditError::IntegrityViolation {
                    sequence: e.sequence,
                });
            }
            prev = e.hash;
        }
        Ok(())
    }

    #[cfg(test)]
    fn tamper(&self, index: usize, detail: &str) {
        if let Some(entry) = self.inner.lock().entries.get_mut(index) {
            entry.detail = detail.to_string();
        }
    }
}

/// First eight bytes of the credential's SHA-256, hex encoded
#[must_use]
pub fn fingerprint(credential: &Credential) -> String {
    let digest = Sha256::digest(credential.expose().as_bytes());
    hex::encode(&digest[..8])
}

fn compute_hash(entry: &AuditEntry) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(entry.sequence.to_le_bytes());
    hasher.update(entry.timestamp.timestamp_micros().to_le_bytes());
    hasher.update(entry.actor.as_bytes());
    hasher.update([0]);
    hasher.update(entry.action.as_str().as_bytes());
    hasher.update([0]);
    if let Some(id) = entry.project_id {
        hasher.update(id.as_uuid().as_bytes());
    }
    hasher.update([0]);
    hasher.update(entry.detail.as_bytes());
    hasher.update([0]);
    hasher.update(entry.prev_hash);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_verifies_and_detects_tampering() {
        let log = AuditLog::new();
        let cred = Credential::new("token-a");
        log.append(&cred, AuditAction::AccessGranted, None, "admin");
        log.append(&cred, AuditAction::ProjectCommitted, Some(ProjectId::new()), "6 steps");
        assert_eq!(log.len(), 2);
        assert!(log.verify_integrity().is_ok());

        log.tamper(0, "client");
        assert_eq!(
            log.verify_integrity(),
            Err(AuditError::IntegrityViolation { sequence: 0 })
        );
    }

    #[test]
    fn actor_is_a_fingerprint_not_the_token() {
        let log = AuditLog::new();
        let cred = Credential::new("super-secret");
        log.append(&cred, AuditAction::AccessDenied, None, "client");
        let entry = &log.entries()[0];
        assert_eq!(entry.actor.len(), 16);
        assert!(!entry.actor.contains("secret"));
        assert_eq!(entry.actor, fingerprint(&Credential::new("super-secret")));
    }

    #[test]
    fn window_evicts_oldest_and_still_verifies() {
        let log = AuditLog::with_capacity(2);
        let cred = Credential::new("token-a");
        for detail in ["one", "two", "three"] {
            log.append(&cred, AuditAction::AccessGranted, None, detail);
        }

        let sequences: Vec<u64> = log.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
        assert!(log.verify_integrity().is_ok());

        log.tamper(0, "forged");
        assert_eq!(
            log.verify_integrity(),
            Err(AuditError::IntegrityViolation { sequence: 1 })
        );
    }
}
