//! Agency Model - provisioning data types
//!
//! Defines the types that flow through project provisioning:
//! - Strongly-typed entity identifiers
//! - The [`ProjectBlueprint`] submitted by the admin wizard
//! - Created entities and their insert payloads
//! - Directory records (clients, profiles, roles)
//! - Dashboard configuration and its defaulting rules
//! - The [`GeneratedProjectView`] read model returned to the caller

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod blueprint;
pub mod dashboard;
pub mod directory;
pub mod entity;
pub mod ids;
pub mod view;

pub use blueprint::{
    BrandingSpec, DashboardConfigSpec, GenerateProjectRequest, NotificationsSpec, PaymentSpec,
    PermissionsSpec, PhaseSpec, ProjectBlueprint, ProjectInfo, TaskSpec, TeamAssignmentSpec,
};
pub use dashboard::{merge_with_defaults, Branding, DashboardSettings, Notifications, Permissions};
pub use directory::{Client, Credential, Profile, Role};
pub use entity::{
    DashboardConfig, NewDashboardConfig, NewPayment, NewPhase, NewProject, NewProjectMember,
    NewTask, PaymentScheduleEntry, Phase, Project, ProjectMember, ProjectStatus, ResourceKind,
    Task, TaskPriority,
};
pub use ids::{
    ClientId, DashboardConfigId, MemberId, PaymentId, PhaseId, ProfileId, ProjectId, TaskId,
};
pub use view::{ClientView, GeneratedProjectView, PaymentView, PhaseView, TeamMemberView};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
