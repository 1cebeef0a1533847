use agency_model::{
    Client, ClientId, PaymentSpec, PhaseSpec, Profile, ProfileId, ProjectBlueprint, ProjectInfo,
    Role, TaskSpec, TeamAssignmentSpec,
};
use agency_store::InMemoryDirectory;
use chrono::NaiveDate;
use std::sync::Arc;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const TEAM_TOKEN: &str = "team-token";
pub const CLIENT_TOKEN: &str = "client-token";

/// Directory with one client and staff/client sessions
#[derive(Debug, Clone)]
pub struct Seeded {
    pub directory: Arc<InMemoryDirectory>,
    pub client: Client,
    pub admin: Profile,
    pub team_member: Profile,
    pub client_user: Profile,
    /// Profile without a session, used for team assignments
    pub designer: Profile,
}

pub fn seeded_directory() -> Seeded {
    let client = Client {
        id: ClientId::new(),
        name: "Acme Corp".to_string(),
        company: Some("Acme Holdings".to_string()),
    };
    let admin = profile("Alice Admin", Role::Admin);
    let team_member = profile("Tom Team", Role::TeamMember);
    let client_user = profile("Carl Client", Role::Client);
    let designer = profile("Dana Designer", Role::TeamMember);

    let directory = InMemoryDirectory::new()
        .with_client(client.clone())
        .with_session(ADMIN_TOKEN, admin.clone())
        .with_session(TEAM_TOKEN, team_member.clone())
        .with_session(CLIENT_TOKEN, client_user.clone())
        .with_profile(designer.clone());

    Seeded {
        directory: Arc::new(directory),
        client,
        admin,
        team_member,
        client_user,
        designer,
    }
}

fn profile(name: &str, role: Role) -> Profile {
    Profile {
        id: ProfileId::new(),
        full_name: name.to_string(),
        role,
    }
}

/// Panics on an invalid date; fixtures only
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}

/// Smallest blueprint that passes validation
pub fn minimal_blueprint(client: ClientId) -> ProjectBlueprint {
    ProjectBlueprint {
        client_reference: Some(client),
        project_info: ProjectInfo {
            name: "Minimal".to_string(),
            total_budget: 100.0,
            ..ProjectInfo::default()
        },
        phases: vec![PhaseSpec::new("Only")],
        ..ProjectBlueprint::default()
    }
}

/// Two phases (2 + 0 tasks), one team member, two payments totalling 10000
pub fn scenario_a(client: ClientId, member: ProfileId) -> ProjectBlueprint {
    ProjectBlueprint {
        client_reference: Some(client),
        project_info: ProjectInfo {
            name: "Website Relaunch".to_string(),
            description: Some("Full redesign and rebuild".to_string()),
            start_date: Some(date(2025, 1, 6)),
            end_date: Some(date(2025, 3, 28)),
            total_budget: 10_000.0,
            ..ProjectInfo::default()
        },
        phases: vec![
            PhaseSpec::new("Discovery")
                .with_dates(date(2025, 1, 6), date(2025, 1, 20))
                .with_tasks(vec![
                    TaskSpec::new("Stakeholder interviews").with_hours(8.0),
                    TaskSpec::new("Content audit").with_hours(12.0),
                ]),
            PhaseSpec::new("Build"),
        ],
        team_assignments: vec![TeamAssignmentSpec::new(member, "Lead designer").liaison()],
        payment_schedule: vec![
            PaymentSpec::new("Deposit", 4_000.0).for_phase(0),
            PaymentSpec::new("Final", 6_000.0),
        ],
        ..ProjectBlueprint::default()
    }
}

/// Scenario A without team or payments
pub fn scenario_c(client: ClientId) -> ProjectBlueprint {
    ProjectBlueprint {
        team_assignments: Vec::new(),
        payment_schedule: Vec::new(),
        ..scenario_a(client, ProfileId::new())
    }
}
