//! Error types for project provisioning
//!
//! Failure taxonomy:
//! - Authentication / authorization / validation: fail fast, before any write
//! - Provisioning step failure: always preceded by the compensation cascade
//! - Compensation failure: secondary, logged and attached to the step error
//! - Assembly failure: post-commit, reported next to a successful project id

use crate::saga::{Produced, StepName};
use agency_model::{ClientId, ProfileId, ProjectId, Role};
use agency_store::StoreError;
use std::fmt;

/// Main provisioning error type
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Credential missing or unparseable
    #[error("authentication required: {0}")]
    Authentication(String),

    /// Credential valid but not permitted
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    /// Blueprint structurally invalid
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A step failed; compensation has already run
    #[error(transparent)]
    Provisioning(#[from] ProvisioningStepError),
}

impl ProvisionError {
    /// Classification used by transports
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Provisioning(_) => ErrorKind::Provisioning,
        }
    }

    /// True when the failure happened before any storage call
    #[inline]
    #[must_use]
    pub fn is_pre_mutation(&self) -> bool {
        !matches!(self, Self::Provisioning(_))
    }
}

/// Coarse error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    Authorization,
    Validation,
    Provisioning,
    Assembly,
}

/// Authorization gate rejections
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    /// Resolved role is not allowed to provision
    #[error("role '{role}' may not create projects")]
    RoleNotPermitted { role: Role },

    /// Role lookup failed; treated as a denial
    #[error("role lookup failed: {0}")]
    LookupFailed(#[source] StoreError),
}

/// One structural problem in a blueprint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Violation {
    /// Path of the offending field, e.g. `phases[1].tasks[0].title`
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

impl Violation {
    #[inline]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found in a blueprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid blueprint: ")?;
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Why a step failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepCause {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("run cancelled")]
    Cancelled,

    #[error("run deadline exceeded")]
    DeadlineExceeded,

    /// An id expected from an earlier step is absent
    #[error("missing dependency: {0}")]
    MissingDependency(&'static str),

    /// The blueprint names a client or profile the directory does not know
    #[error("unknown {kind} {id}")]
    UnknownReference { kind: &'static str, id: String },
}

impl StepCause {
    pub(crate) fn unknown(kind: &'static str, id: impl ToString) -> Self {
        StepCause::UnknownReference {
            kind,
            id: id.to_string(),
        }
    }
}

/// A step failed; compensation has already run
#[derive(Debug, thiserror::Error)]
#[error("step {failed_step} failed: {cause} ({compensation})")]
pub struct ProvisioningStepError {
    pub failed_step: StepName,
    #[source]
    pub cause: StepCause,
    pub compensation: CompensationOutcome,
}

/// A compensation that could not complete; needs manual cleanup
#[derive(Debug, Clone, thiserror::Error)]
#[error("compensation of {step} failed for {produced:?}: {source}")]
pub struct CompensationError {
    pub step: StepName,
    pub produced: Produced,
    pub source: StoreError,
}

/// Result of unwinding a failed run
#[derive(Debug, Clone, Default)]
pub struct CompensationOutcome {
    /// Steps whose effects were removed, in the order they were undone
    pub compensated: Vec<StepName>,
    /// Compensations that failed
    pub failures: Vec<CompensationError>,
}

impl CompensationOutcome {
    /// True when every compensation succeeded
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for CompensationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complete() {
            write!(f, "rolled back {} step(s)", self.compensated.len())
        } else {
            write!(
                f,
                "rolled back {} step(s), {} compensation(s) failed",
                self.compensated.len(),
                self.failures.len()
            )
        }
    }
}

/// Post-commit read-back failed
#[derive(Debug, Clone, thiserror::Error)]
pub enum AssemblyError {
    #[error("read-back failed: {0}")]
    Read(#[from] StoreError),

    #[error("project {0} not found after commit")]
    ProjectMissing(ProjectId),

    #[error("client {0} not found")]
    ClientMissing(ClientId),

    #[error("profile {0} not found")]
    ProfileMissing(ProfileId),
}

impl AssemblyError {
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Assembly
    }
}
