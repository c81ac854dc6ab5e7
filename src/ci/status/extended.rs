// SPDX-License-Identifier: MIT

//! Status decorators
//!
//! A decorator declares which subjects it applies to through `matches` and
//! overrides some display attributes in `decorate`. Decorators are
//! stateless and read-only with respect to the subject.

use chrono::{DateTime, Utc};

use super::ability::{Ability, Permission};
use super::core::{DetailedStatus, Illustration, StatusKind};
use super::subject::Subject;

/// Everything a decorator may consult
pub struct Context<'a> {
    pub subject: &'a dyn Subject,
    pub user: &'a dyn Ability,
    pub now: DateTime<Utc>,
}

impl Context<'_> {
    pub fn can(&self, permission: Permission) -> bool {
        self.user.can(permission, self.subject)
    }

    fn action_path(&self, action: &str) -> String {
        let base = self.subject.action_base_path().unwrap_or_default();
        format!("{}/{}", base, action)
    }
}

/// A status decorator
pub trait Extended: Sync {
    fn name(&self) -> &'static str;

    fn matches(&self, ctx: &Context<'_>) -> bool;

    fn decorate(&self, status: &mut DetailedStatus, ctx: &Context<'_>);
}

// ============================================================================
// Shared by several subject kinds
// ============================================================================

/// A successful subject with allowed failures
pub struct SuccessWarning;

impl Extended for SuccessWarning {
    fn name(&self) -> &'static str {
        "success_warning"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.status() == StatusKind::Success && ctx.subject.has_warnings()
    }

    fn decorate(&self, status: &mut DetailedStatus, _ctx: &Context<'_>) {
        status.text = "warning".to_string();
        status.label = "passed with warnings".to_string();
        status.tooltip = status.label.clone();
        status.icon = "status_warning".to_string();
        status.group = "success-with-warnings".to_string();
    }
}

/// A playable job the viewer may not start
pub struct Action;

impl Extended for Action {
    fn name(&self) -> &'static str {
        "action"
    }

    /// Same permission `Play` and `Stop` grant their action with
    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.is_playable() && !ctx.can(Permission::PlayJob)
    }

    fn decorate(&self, status: &mut DetailedStatus, _ctx: &Context<'_>) {
        status.label = format!("{} (not allowed)", status.label);
        status.tooltip = status.label.clone();
        status.has_action = false;
    }
}

/// A failed job, annotated with why it failed
pub struct Failed;

impl Extended for Failed {
    fn name(&self) -> &'static str {
        "failed"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.status() == StatusKind::Failed
    }

    fn decorate(&self, status: &mut DetailedStatus, ctx: &Context<'_>) {
        if let Some(reason) = ctx.subject.failure_reason() {
            status.tooltip = format!("{} - ({})", status.tooltip, reason.description());
        }
    }
}

/// A manual job waiting for a user
pub struct Manual;

impl Extended for Manual {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.status() == StatusKind::Manual && ctx.subject.is_playable()
    }

    fn decorate(&self, status: &mut DetailedStatus, ctx: &Context<'_>) {
        let content = if ctx.can(Permission::UpdateBuild) {
            "This job requires manual intervention to start. Before starting this job, you can add variables below for last-minute configuration changes."
        } else {
            "This job does not run automatically and must be started manually, but you do not have access to it."
        };
        status.illustration = Some(
            Illustration::new("illustrations/manual_action", "svg-394", "This job requires a manual action")
                .with_content(content),
        );
    }
}

/// Start a manual job
pub struct Play;

impl Extended for Play {
    fn name(&self) -> &'static str {
        "play"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.is_playable() && !ctx.subject.stops_environment()
    }

    fn decorate(&self, status: &mut DetailedStatus, ctx: &Context<'_>) {
        status.label = "manual play action".to_string();
        status.set_action(
            "play",
            "Play",
            "Trigger this manual action",
            ctx.action_path("play"),
            ctx.can(Permission::PlayJob),
        );
    }
}

// ============================================================================
// Job decorators
// ============================================================================

/// Stop an environment through a manual job
pub struct Stop;

impl Extended for Stop {
    fn name(&self) -> &'static str {
        "stop"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.is_playable() && ctx.subject.stops_environment()
    }

    fn decorate(&self, status: &mut DetailedStatus, ctx: &Context<'_>) {
        status.label = "manual stop action".to_string();
        status.set_action(
            "stop",
            "Stop",
            "Stop this environment",
            ctx.action_path("play"),
            ctx.can(Permission::PlayJob),
        );
    }
}

/// A delayed job, with the time left before it starts
pub struct Scheduled;

impl Scheduled {
    fn remaining(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let seconds = (scheduled_at - now).num_seconds().max(0);
        format!(
            "{:02}:{:02}:{:02}",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        )
    }
}

impl Extended for Scheduled {
    fn name(&self) -> &'static str {
        "scheduled"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.status() == StatusKind::Scheduled && ctx.subject.scheduled_at().is_some()
    }

    fn decorate(&self, status: &mut DetailedStatus, ctx: &Context<'_>) {
        if let Some(scheduled_at) = ctx.subject.scheduled_at() {
            status.tooltip = format!(
                "delayed manual action ({})",
                Self::remaining(scheduled_at, ctx.now)
            );
        }
        status.illustration = Some(
            Illustration::new("illustrations/illustrations_scheduled-job_countdown", "svg-394", "This is a delayed job to run in")
                .with_content("This job will automatically run after its timer finishes. Often they are used for incremental roll-out deploys to production environments. When unscheduled it converts into a manual action."),
        );
    }
}

/// Cancel a job that has not finished
pub struct Cancelable;

impl Extended for Cancelable {
    fn name(&self) -> &'static str {
        "cancelable"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.is_cancelable()
    }

    fn decorate(&self, status: &mut DetailedStatus, ctx: &Context<'_>) {
        status.set_action(
            "cancel",
            "Cancel",
            "Cancel this job",
            ctx.action_path("cancel"),
            ctx.can(Permission::UpdateBuild),
        );
    }
}

/// Run a finished job again
pub struct Retryable;

impl Extended for Retryable {
    fn name(&self) -> &'static str {
        "retryable"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.is_retryable()
    }

    fn decorate(&self, status: &mut DetailedStatus, ctx: &Context<'_>) {
        status.set_action(
            "retry",
            "Retry",
            "Retry this job",
            ctx.action_path("retry"),
            ctx.can(Permission::UpdateBuild),
        );
    }
}

/// Turn a delayed job back into a manual one
pub struct Unschedule;

impl Extended for Unschedule {
    fn name(&self) -> &'static str {
        "unschedule"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.status() == StatusKind::Scheduled
    }

    fn decorate(&self, status: &mut DetailedStatus, ctx: &Context<'_>) {
        status.label = "unschedule action".to_string();
        status.set_action(
            "time-out",
            "Unschedule",
            "Unschedule job",
            ctx.action_path("unschedule"),
            ctx.can(Permission::UpdateBuild),
        );
    }
}

/// A failure the pipeline tolerates
pub struct FailedAllowed;

impl Extended for FailedAllowed {
    fn name(&self) -> &'static str {
        "failed_allowed"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.status() == StatusKind::Failed && ctx.subject.allow_failure()
    }

    fn decorate(&self, status: &mut DetailedStatus, _ctx: &Context<'_>) {
        status.label = "failed (allowed to fail)".to_string();
        status.tooltip = format!("{} (allowed to fail)", status.tooltip);
        status.icon = "status_warning".to_string();
        status.group = "failed-with-warnings".to_string();
    }
}

/// A job superseded by a retry
pub struct Retried;

impl Extended for Retried {
    fn name(&self) -> &'static str {
        "retried"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.is_retried()
    }

    fn decorate(&self, status: &mut DetailedStatus, _ctx: &Context<'_>) {
        status.tooltip = format!("{} (retried)", status.tooltip);
    }
}

/// Generates an illustration-only decorator for a plain status
macro_rules! illustrated {
    ($name:ident, $key:literal, $status:expr, $image:literal, $title:literal) => {
        pub struct $name;

        impl Extended for $name {
            fn name(&self) -> &'static str {
                $key
            }

            fn matches(&self, ctx: &Context<'_>) -> bool {
                ctx.subject.status() == $status
            }

            fn decorate(&self, status: &mut DetailedStatus, _ctx: &Context<'_>) {
                status.illustration = Some(Illustration::new($image, "svg-430", $title));
            }
        }
    };
}

illustrated!(Canceled, "canceled", StatusKind::Canceled, "illustrations/canceled-job_empty", "This job has been canceled");
illustrated!(Created, "created", StatusKind::Created, "illustrations/job_not_triggered", "This job has not been triggered yet");
illustrated!(Pending, "pending", StatusKind::Pending, "illustrations/pending_job_empty", "This job has not started yet");
illustrated!(Skipped, "skipped", StatusKind::Skipped, "illustrations/skipped-job_empty", "This job has been skipped");

// ============================================================================
// Stage and pipeline decorators
// ============================================================================

/// Start every manual job of a stage at once
pub struct PlayManual;

impl Extended for PlayManual {
    fn name(&self) -> &'static str {
        "play_manual"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.is_manual_playable()
    }

    fn decorate(&self, status: &mut DetailedStatus, ctx: &Context<'_>) {
        status.set_action(
            "play",
            "Play all manual",
            "Play all manual",
            ctx.action_path("play_manual"),
            ctx.can(Permission::UpdatePipeline),
        );
    }
}

/// A pipeline waiting on a manual job
pub struct Blocked;

impl Extended for Blocked {
    fn name(&self) -> &'static str {
        "blocked"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.status() == StatusKind::Manual
    }

    fn decorate(&self, status: &mut DetailedStatus, _ctx: &Context<'_>) {
        status.text = "blocked".to_string();
        status.label = "waiting for manual action".to_string();
        status.tooltip = status.label.clone();
    }
}

/// A pipeline waiting on a delayed job
pub struct Delayed;

impl Extended for Delayed {
    fn name(&self) -> &'static str {
        "delayed"
    }

    fn matches(&self, ctx: &Context<'_>) -> bool {
        ctx.subject.status() == StatusKind::Scheduled
    }

    fn decorate(&self, status: &mut DetailedStatus, _ctx: &Context<'_>) {
        status.text = "delayed".to_string();
        status.label = "waiting for delayed job".to_string();
        status.tooltip = status.label.clone();
    }
}
