//! Agency Provision - all-or-nothing project creation
//!
//! Turns a validated [`ProjectBlueprint`](agency_model::ProjectBlueprint)
//! into a project, its phases and tasks, team assignments, payment
//! schedule and client dashboard configuration. Either every resource is
//! created or, after compensation, none remain.
//!
//! Pipeline stages:
//! - [`AuthorizationGate`]: server-side role check, before any write
//! - [`BlueprintValidator`]: collects every structural violation
//! - [`SagaOrchestrator`]: ordered steps with LIFO compensation
//! - [`ResponseAssembler`]: post-commit read-back into a view
//!
//! [`Provisioner`] wires the stages together and records each decision in
//! a hash-chained [`AuditLog`].

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod assemble;
pub mod audit;
pub mod config;
pub mod control;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod saga;
pub mod validate;

pub use assemble::ResponseAssembler;
pub use audit::{AuditAction, AuditEntry, AuditError, AuditLog, DEFAULT_AUDIT_CAPACITY};
pub use config::ProvisioningConfig;
pub use control::RunControl;
pub use error::{
    AssemblyError, AuthorizationError, CompensationError, CompensationOutcome, ErrorKind,
    ProvisionError, ProvisioningStepError, StepCause, ValidationError, Violation,
};
pub use gate::{bearer_credential, AuthorizationGate};
pub use pipeline::{ProvisionOutcome, Provisioner};
pub use saga::{
    CompletedStep, Produced, ProvisioningContext, ProvisioningStep, References, SagaOrchestrator,
    SagaReport, StepFailure, StepName,
};
pub use validate::BlueprintValidator;

/// Common imports
pub mod prelude {
    pub use crate::{
        bearer_credential, ProvisionError, ProvisionOutcome, Provisioner, ProvisioningConfig,
        RunControl,
    };
    pub use agency_model::{Credential, GeneratedProjectView, ProjectBlueprint};
}
