// SPDX-License-Identifier: MIT

//! Base lifecycle statuses and the display value object derived from them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ci::error::PipekitError;

/// Lifecycle status of a job, stage or pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Created,
    WaitingForResource,
    Preparing,
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
}

impl StatusKind {
    pub const ALL: [StatusKind; 11] = [
        StatusKind::Created,
        StatusKind::WaitingForResource,
        StatusKind::Preparing,
        StatusKind::Pending,
        StatusKind::Running,
        StatusKind::Success,
        StatusKind::Failed,
        StatusKind::Canceled,
        StatusKind::Skipped,
        StatusKind::Manual,
        StatusKind::Scheduled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusKind::Created => "created",
            StatusKind::WaitingForResource => "waiting_for_resource",
            StatusKind::Preparing => "preparing",
            StatusKind::Pending => "pending",
            StatusKind::Running => "running",
            StatusKind::Success => "success",
            StatusKind::Failed => "failed",
            StatusKind::Canceled => "canceled",
            StatusKind::Skipped => "skipped",
            StatusKind::Manual => "manual",
            StatusKind::Scheduled => "scheduled",
        }
    }

    /// Statuses of work that is queued or executing
    pub fn is_active(self) -> bool {
        matches!(
            self,
            StatusKind::WaitingForResource
                | StatusKind::Preparing
                | StatusKind::Pending
                | StatusKind::Running
        )
    }

    /// Terminal statuses
    pub fn is_complete(self) -> bool {
        matches!(
            self,
            StatusKind::Success | StatusKind::Failed | StatusKind::Canceled | StatusKind::Skipped
        )
    }

    pub fn is_cancelable(self) -> bool {
        self.is_active() || matches!(self, StatusKind::Created | StatusKind::Scheduled)
    }

    /// Display attributes before any decoration
    pub fn core(self) -> DetailedStatus {
        let (text, label, icon, group) = match self {
            StatusKind::Created => ("created", "created", "status_created", "created"),
            StatusKind::WaitingForResource => (
                "waiting",
                "waiting for resource",
                "status_pending",
                "waiting-for-resource",
            ),
            StatusKind::Preparing => ("preparing", "preparing", "status_preparing", "preparing"),
            StatusKind::Pending => ("pending", "pending", "status_pending", "pending"),
            StatusKind::Running => ("running", "running", "status_running", "running"),
            StatusKind::Success => ("passed", "passed", "status_success", "success"),
            StatusKind::Failed => ("failed", "failed", "status_failed", "failed"),
            StatusKind::Canceled => ("canceled", "canceled", "status_canceled", "canceled"),
            StatusKind::Skipped => ("skipped", "skipped", "status_skipped", "skipped"),
            StatusKind::Manual => ("manual", "manual action", "status_manual", "manual"),
            StatusKind::Scheduled => ("delayed", "delayed", "status_scheduled", "scheduled"),
        };

        DetailedStatus {
            status: self,
            text: text.to_string(),
            label: label.to_string(),
            icon: icon.to_string(),
            favicon: format!("favicon_{}", icon),
            group: group.to_string(),
            tooltip: label.to_string(),
            illustration: None,
            has_details: false,
            details_path: None,
            has_action: false,
            action_icon: None,
            action_title: None,
            action_path: None,
            action_method: None,
            action_button_title: None,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusKind {
    type Err = PipekitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatusKind::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| PipekitError::other(format!("Unknown status `{}`", s)))
    }
}

/// HTTP method of a status action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionMethod {
    Post,
}

/// Empty-state illustration shown on a job page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Illustration {
    pub image: String,
    pub size: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Illustration {
    pub fn new(image: &str, size: &str, title: &str) -> Self {
        Self {
            image: image.to_string(),
            size: size.to_string(),
            title: title.to_string(),
            content: None,
        }
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = Some(content.to_string());
        self
    }
}

/// Display-only projection of a subject's status for a viewing user
///
/// Recomputed on every request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedStatus {
    #[serde(skip)]
    pub status: StatusKind,
    pub text: String,
    pub label: String,
    pub icon: String,
    pub favicon: String,
    pub group: String,
    pub tooltip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub illustration: Option<Illustration>,
    pub has_details: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details_path: Option<String>,
    pub has_action: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_method: Option<ActionMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_button_title: Option<String>,
}

impl DetailedStatus {
    /// Attach an action affordance; `allowed` decides whether it is rendered
    pub fn set_action(
        &mut self,
        icon: &str,
        title: &str,
        button_title: &str,
        path: String,
        allowed: bool,
    ) {
        self.action_icon = Some(icon.to_string());
        self.action_title = Some(title.to_string());
        self.action_button_title = Some(button_title.to_string());
        self.action_path = Some(path);
        self.action_method = Some(ActionMethod::Post);
        self.has_action = allowed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_attributes() {
        let status = StatusKind::Success.core();
        assert_eq!(status.text, "passed");
        assert_eq!(status.label, "passed");
        assert_eq!(status.icon, "status_success");
        assert_eq!(status.favicon, "favicon_status_success");
        assert_eq!(status.group, "success");
        assert!(!status.has_action);
        assert!(status.action_icon.is_none());
    }

    #[test]
    fn test_every_status_has_core_attributes() {
        for kind in StatusKind::ALL {
            let status = kind.core();
            assert!(!status.text.is_empty(), "{}", kind);
            assert!(status.favicon.starts_with("favicon_status_"), "{}", kind);
            assert_eq!(status.status, kind);
        }
    }

    #[test]
    fn test_waiting_for_resource_display() {
        let status = StatusKind::WaitingForResource.core();
        assert_eq!(status.text, "waiting");
        assert_eq!(status.group, "waiting-for-resource");
        assert_eq!(status.icon, "status_pending");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "waiting_for_resource".parse::<StatusKind>().unwrap(),
            StatusKind::WaitingForResource
        );
        assert!("blocked".parse::<StatusKind>().is_err());
    }

    #[test]
    fn test_status_sets() {
        assert!(StatusKind::Running.is_active());
        assert!(!StatusKind::Created.is_active());
        assert!(StatusKind::Created.is_cancelable());
        assert!(StatusKind::Skipped.is_complete());
        assert!(!StatusKind::Manual.is_complete());
        assert!(!StatusKind::Manual.is_cancelable());
    }

    #[test]
    fn test_serialize_omits_missing_action() {
        let json = serde_json::to_value(StatusKind::Pending.core()).unwrap();
        assert_eq!(json["text"], "pending");
        assert_eq!(json["has_action"], false);
        assert!(json.get("action_icon").is_none());
    }
}
