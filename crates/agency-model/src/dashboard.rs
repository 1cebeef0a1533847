//! Client dashboard settings and defaulting
//!
//! The wizard may omit any dashboard sub-object. [`merge_with_defaults`]
//! fills every absent sub-object from a [`DashboardSettings`] baseline,
//! so the persisted configuration is always complete.

use crate::blueprint::DashboardConfigSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Widget keys enabled when the wizard does not choose any
pub const DEFAULT_WIDGETS: [&str; 5] = [
    "milestones",
    "payments",
    "project_overview",
    "team",
    "timeline",
];

/// Default brand colour
pub const DEFAULT_PRIMARY_COLOR: &str = "#3b82f6";

/// Default welcome banner
pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to your project dashboard";

/// Dashboard branding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Branding {
    pub primary_color: String,
    pub welcome_message: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
        }
    }
}

/// What the client may see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Permissions {
    pub view_tasks: bool,
    pub view_payments: bool,
    pub view_team: bool,
    pub view_timeline: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            view_tasks: true,
            view_payments: true,
            view_team: true,
            view_timeline: true,
        }
    }
}

/// Which notifications the client receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Notifications {
    pub email_updates: bool,
    pub deadline_reminders: bool,
    pub payment_reminders: bool,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            email_updates: true,
            deadline_reminders: true,
            payment_reminders: true,
        }
    }
}

/// Fully resolved dashboard configuration, as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSettings {
    pub widgets: BTreeSet<String>,
    pub branding: Branding,
    pub permissions: Permissions,
    pub notifications: Notifications,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            widgets: DEFAULT_WIDGETS.iter().map(|w| (*w).to_string()).collect(),
            branding: Branding::default(),
            permissions: Permissions::default(),
            notifications: Notifications::default(),
        }
    }
}

/// Overlay the blueprint's dashboard sub-objects on `defaults`.
///
/// A supplied sub-object replaces the default wholesale; an absent one
/// is taken from `defaults`. Pure and total.
#[must_use]
pub fn merge_with_defaults(
    spec: &DashboardConfigSpec,
    defaults: &DashboardSettings,
) -> DashboardSettings {
    DashboardSettings {
        widgets: spec
            .widgets
            .clone()
            .unwrap_or_else(|| defaults.widgets.clone()),
        branding: spec
            .branding
            .clone()
            .unwrap_or_else(|| defaults.branding.clone()),
        permissions: spec.permissions.unwrap_or(defaults.permissions),
        notifications: spec.notifications.unwrap_or(defaults.notifications),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_spec_yields_defaults() {
        let merged =
            merge_with_defaults(&DashboardConfigSpec::default(), &DashboardSettings::default());
        assert_eq!(merged, DashboardSettings::default());
        assert_eq!(merged.widgets.len(), DEFAULT_WIDGETS.len());
    }

    #[test]
    fn supplied_sub_object_wins() {
        let spec = DashboardConfigSpec {
            notifications: Some(Notifications {
                email_updates: false,
                deadline_reminders: true,
                payment_reminders: false,
            }),
            ..DashboardConfigSpec::default()
        };

        let merged = merge_with_defaults(&spec, &DashboardSettings::default());
        assert!(!merged.notifications.email_updates);
        assert!(!merged.notifications.payment_reminders);
        assert_eq!(merged.branding, Branding::default());
        assert_eq!(merged.permissions, Permissions::default());
    }

    #[test]
    fn partial_branding_fills_missing_fields() {
        let branding: Branding = serde_json::from_str(r##"{"primaryColor":"#000000"}"##).unwrap();
        assert_eq!(branding.primary_color, "#000000");
        assert_eq!(branding.welcome_message, DEFAULT_WELCOME_MESSAGE);
    }

    #[test]
    fn configured_defaults_are_respected() {
        let defaults = DashboardSettings {
            widgets: ["timeline".to_string()].into_iter().collect(),
            ..DashboardSettings::default()
        };
        let merged = merge_with_defaults(&DashboardConfigSpec::default(), &defaults);
        assert_eq!(merged.widgets.len(), 1);
    }
}
