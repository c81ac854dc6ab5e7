// SPDX-License-Identifier: MIT

//! Entities whose status can be presented
//!
//! Each subject exposes the capability predicates status decorators match
//! on. Defaults describe a subject offering no actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::composite::Composite;
use super::core::StatusKind;
use crate::ci::build::When;

/// Which factory a subject is presented through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectKind {
    Build,
    Bridge,
    Stage,
    Pipeline,
}

/// Why a job failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    UnknownFailure,
    ScriptFailure,
    ApiFailure,
    StuckOrTimeoutFailure,
    RunnerSystemFailure,
    MissingDependencyFailure,
    RunnerUnsupported,
    ArchivedFailure,
    UnmetPrerequisites,
    SchedulerFailure,
    DataIntegrityFailure,
    JobExecutionTimeout,
}

impl FailureReason {
    pub fn description(self) -> &'static str {
        match self {
            FailureReason::UnknownFailure => "unknown failure",
            FailureReason::ScriptFailure => "script failure",
            FailureReason::ApiFailure => "API failure",
            FailureReason::StuckOrTimeoutFailure => {
                "There has been a timeout failure or the job got stuck. Check your timeout limits or try again"
            }
            FailureReason::RunnerSystemFailure => "There has been a runner system failure, please try again",
            FailureReason::MissingDependencyFailure => {
                "There has been a missing dependency failure"
            }
            FailureReason::RunnerUnsupported => {
                "Your runner is outdated, please upgrade your runner"
            }
            FailureReason::ArchivedFailure => "The job is archived and cannot be run",
            FailureReason::UnmetPrerequisites => "The job failed to complete prerequisite tasks",
            FailureReason::SchedulerFailure => "The scheduler failed to assign job to the runner, please try again or contact system administrator",
            FailureReason::DataIntegrityFailure => "There has been a structural integrity problem detected, please contact system administrator",
            FailureReason::JobExecutionTimeout => "The job has exceeded its execution time limit",
        }
    }
}

/// Anything with a status that can be presented to a user
pub trait Subject {
    fn kind(&self) -> SubjectKind;

    fn status(&self) -> StatusKind;

    fn project_path(&self) -> &str;

    /// Page showing the subject, when it has one
    fn details_path(&self) -> Option<String> {
        None
    }

    /// Base path that action endpoints hang off
    fn action_base_path(&self) -> Option<String> {
        None
    }

    fn is_playable(&self) -> bool {
        false
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn is_cancelable(&self) -> bool {
        false
    }

    fn is_retried(&self) -> bool {
        false
    }

    fn allow_failure(&self) -> bool {
        false
    }

    fn has_warnings(&self) -> bool {
        false
    }

    /// Whether it has manual jobs a user could start in bulk
    fn is_manual_playable(&self) -> bool {
        false
    }

    fn stops_environment(&self) -> bool {
        false
    }

    fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn failure_reason(&self) -> Option<FailureReason> {
        None
    }
}

/// A CI job
#[derive(Debug, Clone, PartialEq)]
pub struct Build {
    pub id: u64,
    pub name: String,
    pub project_path: String,
    pub status: StatusKind,
    pub when: When,
    pub allow_failure: bool,
    pub retried: bool,
    pub archived: bool,
    pub environment_action: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<FailureReason>,
}

impl Build {
    pub fn new(id: u64, name: impl Into<String>, project_path: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            project_path: project_path.into(),
            status: StatusKind::Created,
            when: When::OnSuccess,
            allow_failure: false,
            retried: false,
            archived: false,
            environment_action: None,
            scheduled_at: None,
            failure_reason: None,
        }
    }

    pub fn with_status(mut self, status: StatusKind) -> Self {
        self.status = status;
        self
    }

    pub fn with_when(mut self, when: When) -> Self {
        self.when = when;
        self
    }

    pub fn with_allow_failure(mut self, allow_failure: bool) -> Self {
        self.allow_failure = allow_failure;
        self
    }

    /// Whether the job needs a user to start it
    pub fn is_action(&self) -> bool {
        matches!(self.when, When::Manual | When::Delayed)
    }

    /// Status as counted by a composite: allowed failures become warnings
    pub fn composite_status(&self) -> Composite {
        Composite::of(self.status, self.allow_failure)
    }
}

impl Subject for Build {
    fn kind(&self) -> SubjectKind {
        SubjectKind::Build
    }

    fn status(&self) -> StatusKind {
        self.status
    }

    fn project_path(&self) -> &str {
        &self.project_path
    }

    fn details_path(&self) -> Option<String> {
        Some(format!("/{}/-/jobs/{}", self.project_path, self.id))
    }

    fn action_base_path(&self) -> Option<String> {
        self.details_path()
    }

    fn is_playable(&self) -> bool {
        self.is_action()
            && !self.archived
            && (matches!(self.status, StatusKind::Manual | StatusKind::Scheduled)
                || self.is_retryable())
    }

    fn is_retryable(&self) -> bool {
        !self.archived
            && matches!(
                self.status,
                StatusKind::Success | StatusKind::Failed | StatusKind::Canceled
            )
    }

    fn is_cancelable(&self) -> bool {
        self.status.is_cancelable()
    }

    fn is_retried(&self) -> bool {
        self.retried
    }

    fn allow_failure(&self) -> bool {
        self.allow_failure
    }

    fn stops_environment(&self) -> bool {
        self.environment_action.as_deref() == Some("stop")
    }

    fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.scheduled_at
    }

    fn failure_reason(&self) -> Option<FailureReason> {
        self.failure_reason
    }
}

/// A trigger job starting a downstream pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Bridge {
    pub id: u64,
    pub name: String,
    pub project_path: String,
    pub status: StatusKind,
    pub when: When,
    pub allow_failure: bool,
    pub failure_reason: Option<FailureReason>,
}

impl Bridge {
    pub fn new(id: u64, name: impl Into<String>, project_path: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            project_path: project_path.into(),
            status: StatusKind::Created,
            when: When::OnSuccess,
            allow_failure: false,
            failure_reason: None,
        }
    }
}

impl Subject for Bridge {
    fn kind(&self) -> SubjectKind {
        SubjectKind::Bridge
    }

    fn status(&self) -> StatusKind {
        self.status
    }

    fn project_path(&self) -> &str {
        &self.project_path
    }

    fn action_base_path(&self) -> Option<String> {
        Some(format!("/{}/-/jobs/{}", self.project_path, self.id))
    }

    fn is_playable(&self) -> bool {
        self.when == When::Manual && self.status == StatusKind::Manual
    }

    fn allow_failure(&self) -> bool {
        self.allow_failure
    }

    fn failure_reason(&self) -> Option<FailureReason> {
        self.failure_reason
    }
}

/// A pipeline stage and the jobs in it
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    pub pipeline_id: u64,
    pub project_path: String,
    pub jobs: Vec<Build>,
}

impl Stage {
    pub fn new(name: impl Into<String>, pipeline_id: u64, project_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pipeline_id,
            project_path: project_path.into(),
            jobs: Vec::new(),
        }
    }

    pub fn with_jobs(mut self, jobs: Vec<Build>) -> Self {
        self.jobs = jobs;
        self
    }

    fn latest_jobs(&self) -> impl Iterator<Item = &Build> {
        self.jobs.iter().filter(|job| !job.retried)
    }
}

impl Subject for Stage {
    fn kind(&self) -> SubjectKind {
        SubjectKind::Stage
    }

    /// Composite of the stage's latest jobs
    fn status(&self) -> StatusKind {
        Composite::status_of(self.latest_jobs().map(Build::composite_status))
    }

    fn project_path(&self) -> &str {
        &self.project_path
    }

    fn details_path(&self) -> Option<String> {
        Some(format!(
            "/{}/-/pipelines/{}#{}",
            self.project_path, self.pipeline_id, self.name
        ))
    }

    fn action_base_path(&self) -> Option<String> {
        Some(format!(
            "/{}/-/pipelines/{}/stages/{}",
            self.project_path, self.pipeline_id, self.name
        ))
    }

    fn has_warnings(&self) -> bool {
        self.latest_jobs().any(|job| {
            job.allow_failure && matches!(job.status, StatusKind::Failed | StatusKind::Canceled)
        })
    }

    fn is_manual_playable(&self) -> bool {
        self.latest_jobs()
            .any(|job| job.status == StatusKind::Manual && job.is_playable())
    }
}

/// A pipeline and its stages
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub id: u64,
    pub project_path: String,
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(id: u64, project_path: impl Into<String>) -> Self {
        Self {
            id,
            project_path: project_path.into(),
            stages: Vec::new(),
        }
    }

    pub fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = stages;
        self
    }

    fn latest_jobs(&self) -> impl Iterator<Item = &Build> {
        self.stages.iter().flat_map(|stage| stage.latest_jobs())
    }
}

impl Subject for Pipeline {
    fn kind(&self) -> SubjectKind {
        SubjectKind::Pipeline
    }

    fn status(&self) -> StatusKind {
        Composite::status_of(self.latest_jobs().map(Build::composite_status))
    }

    fn project_path(&self) -> &str {
        &self.project_path
    }

    fn details_path(&self) -> Option<String> {
        Some(format!("/{}/-/pipelines/{}", self.project_path, self.id))
    }

    fn action_base_path(&self) -> Option<String> {
        self.details_path()
    }

    fn has_warnings(&self) -> bool {
        self.stages.iter().any(Stage::has_warnings)
    }

    fn is_retryable(&self) -> bool {
        self.latest_jobs().any(Subject::is_retryable)
    }

    fn is_cancelable(&self) -> bool {
        self.latest_jobs().any(Subject::is_cancelable)
    }
}
