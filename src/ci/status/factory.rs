// SPDX-License-Identifier: MIT

//! Builds the detailed status of a subject for a viewing user

use chrono::{DateTime, Utc};

use super::ability::{Ability, Permission};
use super::core::DetailedStatus;
use super::extended::{self as ext, Context, Extended};
use super::subject::{Subject, SubjectKind};

/// Decorators of which at most one (the first matching) is applied
pub type Group<'a> = &'a [&'static dyn Extended];

static BUILD_GROUPS: &[Group<'static>] = &[
    &[
        &ext::Scheduled,
        &ext::Manual,
        &ext::Canceled,
        &ext::Created,
        &ext::Pending,
        &ext::Skipped,
    ],
    &[&ext::Cancelable, &ext::Retryable],
    &[&ext::Failed],
    &[&ext::FailedAllowed, &ext::Unschedule, &ext::Play, &ext::Stop],
    &[&ext::Action],
    &[&ext::Retried],
];

static BRIDGE_GROUPS: &[Group<'static>] = &[
    &[&ext::Failed, &ext::Manual],
    &[&ext::Play],
    &[&ext::Action],
];

static STAGE_GROUPS: &[Group<'static>] = &[&[&ext::SuccessWarning], &[&ext::PlayManual]];

static PIPELINE_GROUPS: &[Group<'static>] =
    &[&[&ext::SuccessWarning, &ext::Blocked, &ext::Delayed]];

/// Decorator groups for a subject kind, in application order
pub fn extended_statuses(kind: SubjectKind) -> &'static [Group<'static>] {
    match kind {
        SubjectKind::Build => BUILD_GROUPS,
        SubjectKind::Bridge => BRIDGE_GROUPS,
        SubjectKind::Stage => STAGE_GROUPS,
        SubjectKind::Pipeline => PIPELINE_GROUPS,
    }
}

/// Adds decorator groups on top of the built-in ones
pub trait FactoryExtension {
    /// Groups applied after the built-in groups of `kind`
    fn extended_statuses(&self, kind: SubjectKind) -> Vec<Group<'_>>;
}

pub struct Factory<'a> {
    subject: &'a dyn Subject,
    user: &'a dyn Ability,
    now: DateTime<Utc>,
    extension: Option<&'a dyn FactoryExtension>,
}

impl<'a> Factory<'a> {
    pub fn new(subject: &'a dyn Subject, user: &'a dyn Ability) -> Self {
        Self {
            subject,
            user,
            now: Utc::now(),
            extension: None,
        }
    }

    /// Clock used for time-relative tooltips
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_extension(mut self, extension: &'a dyn FactoryExtension) -> Self {
        self.extension = Some(extension);
        self
    }

    /// Core status plus the details every subject kind carries
    pub fn core_status(&self) -> DetailedStatus {
        let mut status = self.subject.status().core();
        let permission = match self.subject.kind() {
            SubjectKind::Build | SubjectKind::Bridge => Permission::ReadBuild,
            SubjectKind::Stage | SubjectKind::Pipeline => Permission::ReadPipeline,
        };
        status.details_path = self.subject.details_path();
        status.has_details =
            status.details_path.is_some() && self.user.can(permission, self.subject);
        status
    }

    /// Decorators that apply to the subject, one per group at most
    pub fn extended_statuses(&self) -> Vec<&'static dyn Extended> {
        let ctx = self.context();
        let mut groups: Vec<Group<'_>> = extended_statuses(self.subject.kind()).to_vec();
        if let Some(extension) = self.extension {
            groups.extend(extension.extended_statuses(self.subject.kind()));
        }

        groups
            .into_iter()
            .filter_map(|group| group.iter().copied().find(|status| status.matches(&ctx)))
            .collect()
    }

    pub fn fabricate(&self) -> DetailedStatus {
        let ctx = self.context();
        let mut status = self.core_status();
        for decorator in self.extended_statuses() {
            log::trace!("Applying {} status decorator", decorator.name());
            decorator.decorate(&mut status, &ctx);
        }
        status
    }

    fn context(&self) -> Context<'a> {
        Context {
            subject: self.subject,
            user: self.user,
            now: self.now,
        }
    }
}

/// Detailed status of `subject` as seen by `user`
pub fn detailed_status(subject: &dyn Subject, user: &dyn Ability) -> DetailedStatus {
    Factory::new(subject, user).fabricate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ci::build::When;
    use crate::ci::status::ability::User;
    use crate::ci::status::core::StatusKind;
    use crate::ci::status::subject::{Bridge, Build, Pipeline, Stage};

    fn manual_job() -> Build {
        Build::new(5, "deploy", "group/app")
            .with_status(StatusKind::Manual)
            .with_when(When::Manual)
    }

    fn stage_with(jobs: Vec<Build>) -> Stage {
        Stage::new("deploy", 11, "group/app").with_jobs(jobs)
    }

    #[test]
    fn test_stage_with_manual_jobs_and_permission() {
        let stage = stage_with(vec![manual_job()]);
        let user = User::new("dev").with_permissions([Permission::UpdatePipeline]);

        let status = detailed_status(&stage, &user);
        assert!(status.has_action);
        assert_eq!(status.action_icon.as_deref(), Some("play"));
        assert_eq!(status.action_title.as_deref(), Some("Play all manual"));
        assert_eq!(
            status.action_path.as_deref(),
            Some("/group/app/-/pipelines/11/stages/deploy/play_manual")
        );
    }

    #[test]
    fn test_stage_with_manual_jobs_without_permission() {
        let stage = stage_with(vec![manual_job()]);

        let status = detailed_status(&stage, &User::anonymous());
        assert!(!status.has_action);
        assert_eq!(status.action_icon.as_deref(), Some("play"));
    }

    #[test]
    fn test_stage_success_with_warnings() {
        let stage = stage_with(vec![
            Build::new(1, "a", "group/app").with_status(StatusKind::Success),
            Build::new(2, "b", "group/app")
                .with_status(StatusKind::Failed)
                .with_allow_failure(true),
        ]);
        let status = detailed_status(&stage, &User::anonymous());
        assert_eq!(status.group, "success-with-warnings");
        assert_eq!(status.icon, "status_warning");
        assert!(!status.has_action);
        assert!(status.action_icon.is_none());
    }

    #[test]
    fn test_manual_build_for_developer() {
        let job = manual_job();
        let status = detailed_status(&job, &User::developer("dev"));

        assert_eq!(status.label, "manual play action");
        assert!(status.has_action);
        assert_eq!(status.action_icon.as_deref(), Some("play"));
        assert_eq!(status.action_path.as_deref(), Some("/group/app/-/jobs/5/play"));
        assert!(status.illustration.is_some());
        assert!(status.has_details);
        assert_eq!(status.details_path.as_deref(), Some("/group/app/-/jobs/5"));
    }

    #[test]
    fn test_manual_build_for_anonymous() {
        let status = detailed_status(&manual_job(), &User::anonymous());

        assert_eq!(status.label, "manual play action (not allowed)");
        assert!(!status.has_action);
        assert!(!status.has_details);
    }

    #[test]
    fn test_manual_build_for_player_without_update() {
        let user = User::new("player").with_permissions([Permission::PlayJob]);
        let status = detailed_status(&manual_job(), &user);

        assert_eq!(status.label, "manual play action");
        assert!(status.has_action);
        assert_eq!(status.action_icon.as_deref(), Some("play"));
    }

    #[test]
    fn test_failed_allowed_build_keeps_retry() {
        let job = Build::new(8, "lint", "group/app")
            .with_status(StatusKind::Failed)
            .with_allow_failure(true);
        let status = detailed_status(&job, &User::developer("dev"));

        assert_eq!(status.group, "failed-with-warnings");
        assert_eq!(status.action_icon.as_deref(), Some("retry"));
        assert!(status.has_action);
    }

    #[test]
    fn test_running_build_is_cancelable() {
        let job = Build::new(8, "rspec", "group/app").with_status(StatusKind::Running);
        let status = detailed_status(&job, &User::developer("dev"));
        assert_eq!(status.text, "running");
        assert_eq!(status.action_icon.as_deref(), Some("cancel"));
    }

    #[test]
    fn test_scheduled_build_unschedule_wins_over_play() {
        let mut job = Build::new(8, "deploy", "group/app")
            .with_status(StatusKind::Scheduled)
            .with_when(When::Delayed);
        job.scheduled_at = Some(Utc::now() + chrono::Duration::hours(1));

        let status = detailed_status(&job, &User::developer("dev"));
        assert_eq!(status.action_icon.as_deref(), Some("time-out"));
        assert!(status.tooltip.starts_with("delayed manual action ("));
    }

    #[test]
    fn test_manual_bridge() {
        let mut bridge = Bridge::new(4, "trigger", "group/app");
        bridge.status = StatusKind::Manual;
        bridge.when = When::Manual;

        let status = detailed_status(&bridge, &User::new("dev").with_permissions([Permission::PlayJob]));
        assert!(status.has_action);
        assert_eq!(status.action_icon.as_deref(), Some("play"));
        assert!(!status.has_details);
    }

    #[test]
    fn test_blocked_pipeline() {
        let pipeline = Pipeline::new(11, "group/app").with_stages(vec![
            Stage::new("build", 11, "group/app")
                .with_jobs(vec![Build::new(1, "a", "group/app").with_status(StatusKind::Success)]),
            stage_with(vec![manual_job()]),
        ]);
        let status = detailed_status(&pipeline, &User::developer("dev"));
        assert_eq!(status.text, "blocked");
        assert_eq!(status.label, "waiting for manual action");
        assert!(status.has_details);
    }

    #[test]
    fn test_fabricate_is_repeatable() {
        let job = manual_job();
        let user = User::developer("dev");
        let factory = Factory::new(&job, &user);
        assert_eq!(factory.fabricate(), factory.fabricate());
    }

    struct Flagged;

    impl Extended for Flagged {
        fn name(&self) -> &'static str {
            "flagged"
        }

        fn matches(&self, ctx: &Context<'_>) -> bool {
            ctx.subject.status() == StatusKind::Success
        }

        fn decorate(&self, status: &mut DetailedStatus, _ctx: &Context<'_>) {
            status.tooltip = format!("{} (flagged)", status.tooltip);
        }
    }

    struct Extension;

    impl FactoryExtension for Extension {
        fn extended_statuses(&self, kind: SubjectKind) -> Vec<Group<'_>> {
            static FLAGGED: Group<'static> = &[&Flagged];
            match kind {
                SubjectKind::Build => vec![FLAGGED],
                _ => vec![],
            }
        }
    }

    #[test]
    fn test_extension_groups_apply_after_builtin() {
        let job = Build::new(1, "a", "group/app").with_status(StatusKind::Success);
        let user = User::anonymous();

        let plain = Factory::new(&job, &user).fabricate();
        assert_eq!(plain.tooltip, "passed");

        let extension = Extension;
        let extended = Factory::new(&job, &user)
            .with_extension(&extension)
            .fabricate();
        assert_eq!(extended.tooltip, "passed (flagged)");
        assert_eq!(extended.action_icon.as_deref(), Some("retry"));
    }
}
