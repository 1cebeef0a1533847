//! Structural blueprint validation
//!
//! Pure: no I/O, no clock. Every violation is collected in a fixed
//! traversal order so the caller can fix the whole blueprint at once and
//! the same input always yields the same list.

use crate::error::{ValidationError, Violation};
use agency_model::{PaymentSpec, PhaseSpec, ProjectBlueprint, ProjectInfo, TeamAssignmentSpec};
use chrono::NaiveDate;

/// Upper bound for `allocationPercent`
pub const MAX_ALLOCATION_PERCENT: u32 = 100;

/// Blueprint validator
#[derive(Debug, Clone, Copy, Default)]
pub struct BlueprintValidator;

impl BlueprintValidator {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate a blueprint
    ///
    /// # Errors
    /// `ValidationError` carrying every violation found
    pub fn validate(&self, blueprint: &ProjectBlueprint) -> Result<(), ValidationError> {
        let violations = self.violations(blueprint);
        if violations.is_empty() {
            if blueprint.liaison_count() > 1 {
                tracing::warn!(
                    liaisons = blueprint.liaison_count(),
                    "more than one client liaison assigned"
                );
            }
            Ok(())
        } else {
            tracing::warn!(violations = violations.len(), "blueprint rejected");
            Err(ValidationError { violations })
        }
    }

    /// All violations, in traversal order
    #[must_use]
    pub fn violations(&self, blueprint: &ProjectBlueprint) -> Vec<Violation> {
        let mut out = Vec::new();

        if blueprint.client_reference.is_none() {
            out.push(Violation::new("clientReference", "is required"));
        }
        check_project_info(&blueprint.project_info, &mut out);

        if blueprint.phases.is_empty() {
            out.push(Violation::new("phases", "at least one phase is required"));
        }
        for (i, phase) in blueprint.phases.iter().enumerate() {
            check_phase(i, phase, &mut out);
        }
        for (i, assignment) in blueprint.team_assignments.iter().enumerate() {
            check_assignment(i, assignment, &mut out);
        }
        for (i, payment) in blueprint.payment_schedule.iter().enumerate() {
            check_payment(i, payment, blueprint.phases.len(), &mut out);
        }

        out
    }
}

fn check_project_info(info: &ProjectInfo, out: &mut Vec<Violation>) {
    if info.name.trim().is_empty() {
        out.push(Violation::new("projectInfo.name", "must not be empty"));
    }
    if !is_positive(info.total_budget) {
        out.push(Violation::new(
            "projectInfo.totalBudget",
            "must be greater than 0",
        ));
    }
    check_dates("projectInfo", info.start_date, info.end_date, out);
    if info.currency.trim().is_empty() {
        out.push(Violation::new("projectInfo.currency", "must not be empty"));
    }
}

fn check_phase(index: usize, phase: &PhaseSpec, out: &mut Vec<Violation>) {
    let path = format!("phases[{index}]");
    if phase.name.trim().is_empty() {
        out.push(Violation::new(format!("{path}.name"), "must not be empty"));
    }
    check_dates(&path, phase.start_date, phase.end_date, out);
    for (t, task) in phase.tasks.iter().enumerate() {
        if task.title.trim().is_empty() {
            out.push(Violation::new(
                format!("{path}.tasks[{t}].title"),
                "must not be empty",
            ));
        }
        if task.estimated_hours.is_nan() || task.estimated_hours < 0.0 {
            out.push(Violation::new(
                format!("{path}.tasks[{t}].estimatedHours"),
                "must not be negative",
            ));
        }
    }
}

fn check_assignment(index: usize, assignment: &TeamAssignmentSpec, out: &mut Vec<Violation>) {
    if assignment.allocation_percent > MAX_ALLOCATION_PERCENT {
        out.push(Violation::new(
            format!("teamAssignments[{index}].allocationPercent"),
            format!("must be between 0 and {MAX_ALLOCATION_PERCENT}"),
        ));
    }
}

fn check_payment(index: usize, payment: &PaymentSpec, phases: usize, out: &mut Vec<Violation>) {
    let path = format!("paymentSchedule[{index}]");
    if !is_positive(payment.amount) {
        out.push(Violation::new(
            format!("{path}.amount"),
            "must be greater than 0",
        ));
    }
    if let Some(phase) = payment.phase_index {
        if phase >= phases {
            out.push(Violation::new(
                format!("{path}.phaseIndex"),
                format!("refers to phase {phase} but only {phases} defined"),
            ));
        }
    }
}

/// False for NaN
fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn check_dates(
    path: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    out: &mut Vec<Violation>,
) {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            out.push(Violation::new(
                format!("{path}.endDate"),
                "must not be before startDate",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agency_model::{ClientId, ProfileId, TaskSpec};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn valid() -> ProjectBlueprint {
        ProjectBlueprint {
            client_reference: Some(ClientId::new()),
            project_info: ProjectInfo {
                name: "Website".to_string(),
                total_budget: 1000.0,
                ..ProjectInfo::default()
            },
            phases: vec![PhaseSpec::new("Design").with_tasks(vec![TaskSpec::new("Wireframes")])],
            ..ProjectBlueprint::default()
        }
    }

    fn fields(bp: &ProjectBlueprint) -> Vec<String> {
        BlueprintValidator::new()
            .violations(bp)
            .into_iter()
            .map(|v| v.field)
            .collect()
    }

    #[test]
    fn valid_blueprint_passes() {
        assert!(BlueprintValidator::new().validate(&valid()).is_ok());
    }

    #[test]
    fn empty_blueprint_reports_all_required_fields() {
        assert_eq!(
            fields(&ProjectBlueprint::default()),
            vec![
                "clientReference",
                "projectInfo.name",
                "projectInfo.totalBudget",
                "phases",
            ]
        );
    }

    #[test]
    fn nested_violations_use_paths() {
        let mut bp = valid();
        bp.phases.push(
            PhaseSpec::new("")
                .with_dates(
                    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                )
                .with_tasks(vec![TaskSpec::new(" ").with_hours(-1.0)]),
        );
        let mut assignment = TeamAssignmentSpec::new(ProfileId::new(), "dev");
        assignment.allocation_percent = 150;
        bp.team_assignments.push(assignment);
        bp.payment_schedule.push(PaymentSpec::new("Deposit", 0.0).for_phase(5));

        assert_eq!(
            fields(&bp),
            vec![
                "phases[1].name",
                "phases[1].endDate",
                "phases[1].tasks[0].title",
                "phases[1].tasks[0].estimatedHours",
                "teamAssignments[0].allocationPercent",
                "paymentSchedule[0].amount",
                "paymentSchedule[0].phaseIndex",
            ]
        );
    }

    #[test]
    fn nan_budget_is_rejected() {
        let mut bp = valid();
        bp.project_info.total_budget = f64::NAN;
        assert_eq!(fields(&bp), vec!["projectInfo.totalBudget"]);
    }

    #[test]
    fn multiple_liaisons_are_not_a_violation() {
        let mut bp = valid();
        bp.team_assignments = vec![
            TeamAssignmentSpec::new(ProfileId::new(), "pm").liaison(),
            TeamAssignmentSpec::new(ProfileId::new(), "lead").liaison(),
        ];
        assert!(BlueprintValidator::new().validate(&bp).is_ok());
    }

    proptest! {
        #[test]
        fn validation_is_deterministic(
            name in ".{0,8}",
            budget in -100.0f64..100.0,
            phase_names in proptest::collection::vec(".{0,4}", 0..4),
            has_client in any::<bool>(),
            amounts in proptest::collection::vec(-10.0f64..10.0, 0..3),
        ) {
            let bp = ProjectBlueprint {
                client_reference: has_client.then(ClientId::new),
                project_info: ProjectInfo {
                    name,
                    total_budget: budget,
                    ..ProjectInfo::default()
                },
                phases: phase_names.into_iter().map(PhaseSpec::new).collect(),
                payment_schedule: amounts
                    .into_iter()
                    .enumerate()
                    .map(|(i, a)| PaymentSpec::new("p", a).for_phase(i))
                    .collect(),
                ..ProjectBlueprint::default()
            };
            let validator = BlueprintValidator::new();
            let first = validator.validate(&bp);
            let second = validator.validate(&bp);
            prop_assert_eq!(first, second);
        }
    }
}
