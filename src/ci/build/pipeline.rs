// SPDX-License-Identifier: MIT

//! Pipeline-level context a job decision is made in

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ci::error::PipekitError;
use crate::ci::variables::Variables;

/// What triggered the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineSource {
    #[default]
    Push,
    Web,
    Trigger,
    Schedule,
    Api,
    External,
    Pipeline,
    Chat,
    MergeRequestEvent,
    ParentPipeline,
}

impl PipelineSource {
    pub const ALL: [PipelineSource; 10] = [
        PipelineSource::Push,
        PipelineSource::Web,
        PipelineSource::Trigger,
        PipelineSource::Schedule,
        PipelineSource::Api,
        PipelineSource::External,
        PipelineSource::Pipeline,
        PipelineSource::Chat,
        PipelineSource::MergeRequestEvent,
        PipelineSource::ParentPipeline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineSource::Push => "push",
            PipelineSource::Web => "web",
            PipelineSource::Trigger => "trigger",
            PipelineSource::Schedule => "schedule",
            PipelineSource::Api => "api",
            PipelineSource::External => "external",
            PipelineSource::Pipeline => "pipeline",
            PipelineSource::Chat => "chat",
            PipelineSource::MergeRequestEvent => "merge_request_event",
            PipelineSource::ParentPipeline => "parent_pipeline",
        }
    }

    /// Source name without the `_event` suffix, as used by `only`/`except`
    pub fn keyword(self) -> &'static str {
        let name = self.as_str();
        name.strip_suffix("_event").unwrap_or(name)
    }

    /// Plural keyword (`pushes`, `schedules`, `merge_requests`, ...)
    pub fn plural_keyword(self) -> String {
        match self {
            PipelineSource::Push => "pushes".to_string(),
            other => format!("{}s", other.keyword()),
        }
    }
}

impl fmt::Display for PipelineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineSource {
    type Err = PipekitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineSource::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| PipekitError::config(format!("Unknown pipeline source: {}", s)))
    }
}

/// The pipeline a set of jobs is being planned for
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineContext {
    pub ref_name: String,
    pub tag: bool,
    pub source: PipelineSource,
    pub sha: Option<String>,
    pub project_path: String,
    pub default_branch: String,
    /// Variables supplied when the pipeline was created (web form, API, trigger)
    pub variables: Variables,
    /// Repository paths, consulted by `exists:` clauses
    pub files: Vec<String>,
}

impl PipelineContext {
    pub fn new(ref_name: impl Into<String>, source: PipelineSource) -> Self {
        Self {
            ref_name: ref_name.into(),
            tag: false,
            source,
            sha: None,
            project_path: String::new(),
            default_branch: "main".to_string(),
            variables: Variables::new(),
            files: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: bool) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = Some(sha.into());
        self
    }

    pub fn with_project_path(mut self, path: impl Into<String>) -> Self {
        self.project_path = path.into();
        self
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_tag(&self) -> bool {
        self.tag
    }

    /// Branch pipelines: neither tags nor merge request pipelines
    pub fn is_branch(&self) -> bool {
        !self.tag && self.source != PipelineSource::MergeRequestEvent
    }

    /// Variables derived from the pipeline itself
    pub fn predefined_variables(&self) -> Variables {
        let mut vars = Variables::new()
            .with("CI", "true")
            .with("CI_COMMIT_REF_NAME", self.ref_name.as_str())
            .with("CI_COMMIT_REF_SLUG", slugify(&self.ref_name))
            .with("CI_PIPELINE_SOURCE", self.source.as_str())
            .with("CI_DEFAULT_BRANCH", self.default_branch.as_str());

        if self.tag {
            vars.append("CI_COMMIT_TAG", self.ref_name.as_str());
        } else if self.is_branch() {
            vars.append("CI_COMMIT_BRANCH", self.ref_name.as_str());
        }
        if let Some(sha) = &self.sha {
            vars.append("CI_COMMIT_SHA", sha.as_str());
            vars.append("CI_COMMIT_SHORT_SHA", sha.chars().take(8).collect::<String>());
        }
        if !self.project_path.is_empty() {
            vars.append("CI_PROJECT_PATH", self.project_path.as_str());
        }
        vars
    }
}

/// Lowercased ref with everything but `0-9a-z` replaced by `-`, at most 63
/// characters, no leading or trailing `-`
pub fn slugify(value: &str) -> String {
    let replaced: String = value
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .take(63)
        .collect();
    replaced.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_keywords() {
        assert_eq!(PipelineSource::MergeRequestEvent.keyword(), "merge_request");
        assert_eq!(PipelineSource::MergeRequestEvent.plural_keyword(), "merge_requests");
        assert_eq!(PipelineSource::Push.plural_keyword(), "pushes");
        assert_eq!(PipelineSource::Schedule.plural_keyword(), "schedules");
    }

    #[test]
    fn test_source_from_str() {
        assert_eq!(
            "merge_request_event".parse::<PipelineSource>().unwrap(),
            PipelineSource::MergeRequestEvent
        );
        assert!("cron".parse::<PipelineSource>().is_err());
    }

    #[test]
    fn test_source_serde() {
        let source: PipelineSource = serde_yaml::from_str("parent_pipeline").unwrap();
        assert_eq!(source, PipelineSource::ParentPipeline);
    }

    #[test]
    fn test_branch_predefined_variables() {
        let pipeline = PipelineContext::new("feature/Login", PipelineSource::Push)
            .with_sha("0123456789abcdef")
            .with_project_path("group/project");
        let vars = pipeline.predefined_variables();

        assert_eq!(vars.get("CI_COMMIT_REF_NAME"), Some("feature/Login"));
        assert_eq!(vars.get("CI_COMMIT_REF_SLUG"), Some("feature-login"));
        assert_eq!(vars.get("CI_COMMIT_BRANCH"), Some("feature/Login"));
        assert_eq!(vars.get("CI_COMMIT_TAG"), None);
        assert_eq!(vars.get("CI_COMMIT_SHORT_SHA"), Some("01234567"));
        assert_eq!(vars.get("CI_PIPELINE_SOURCE"), Some("push"));
        assert_eq!(vars.get("CI_PROJECT_PATH"), Some("group/project"));
    }

    #[test]
    fn test_tag_predefined_variables() {
        let pipeline = PipelineContext::new("v1.0.0", PipelineSource::Push).with_tag(true);
        let vars = pipeline.predefined_variables();

        assert_eq!(vars.get("CI_COMMIT_TAG"), Some("v1.0.0"));
        assert_eq!(vars.get("CI_COMMIT_BRANCH"), None);
        assert!(pipeline.is_tag());
        assert!(!pipeline.is_branch());
    }

    #[test]
    fn test_merge_request_is_not_branch() {
        let pipeline = PipelineContext::new("refs/merge-requests/1/head", PipelineSource::MergeRequestEvent);
        assert!(!pipeline.is_branch());
        assert!(pipeline.predefined_variables().get("CI_COMMIT_BRANCH").is_none());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Feature/ABC_123"), "feature-abc-123");
        assert_eq!(slugify("--x--"), "x");
        assert_eq!(slugify(&"a".repeat(80)).len(), 63);
    }
}
