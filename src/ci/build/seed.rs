// SPDX-License-Identifier: MIT

//! Prospective jobs ("seeds") and the decision whether to create them

use serde::Serialize;
use std::collections::BTreeMap;

use super::clause::VariableScope;
use super::pipeline::PipelineContext;
use super::policy::OnlyExcept;
use super::rules::{Rules, RulesResult, When};
use crate::ci::variables::Variables;

/// A prospective job, evaluated before anything is persisted
pub trait Seed {
    fn name(&self) -> &str;

    /// Flat `name -> value` mapping of every variable visible to the job
    fn scoped_variables(&self) -> Variables;
}

/// `environment:` of a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Environment {
    pub name: String,
    pub action: Option<String>,
}

impl Environment {
    pub fn stops(&self) -> bool {
        self.action.as_deref() == Some("stop")
    }
}

/// Job definition after config validation
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub stage: String,
    pub when: When,
    pub start_in: Option<String>,
    pub allow_failure: Option<bool>,
    pub variables: Variables,
    pub rules: Option<Rules>,
    pub only_except: OnlyExcept,
    pub environment: Option<Environment>,
}

impl Job {
    pub fn new(name: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage: stage.into(),
            when: When::OnSuccess,
            start_in: None,
            allow_failure: None,
            variables: Variables::new(),
            rules: None,
            only_except: OnlyExcept::default(),
            environment: None,
        }
    }
}

/// Effective attributes of an included job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobAttributes {
    pub name: String,
    pub stage: String,
    pub when: When,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_in: Option<String>,
    pub allow_failure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    /// Job variables with the matching rule's `variables:` on top
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

/// A job seed bound to the pipeline it is planned for
#[derive(Debug, Clone)]
pub struct BuildSeed<'p> {
    pipeline: &'p PipelineContext,
    global_variables: Variables,
    job: Job,
}

impl<'p> BuildSeed<'p> {
    pub fn new(pipeline: &'p PipelineContext, global_variables: Variables, job: Job) -> Self {
        Self {
            pipeline,
            global_variables,
            job,
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Result of the job's `rules:`, when it has any
    pub fn rules_result(&self) -> Option<RulesResult> {
        self.job
            .rules
            .as_ref()
            .map(|rules| rules.evaluate(self.pipeline, self))
    }

    /// Whether the job is created: `rules:` when present, `only`/`except`
    /// otherwise
    pub fn included(&self) -> bool {
        match self.rules_result() {
            Some(result) => result.pass(),
            None => self.job.only_except.included(self.pipeline, self),
        }
    }

    /// Effective attributes, or `None` when the job is not created
    pub fn evaluate(&self) -> Option<JobAttributes> {
        let mut variables = self.job.variables.clone();
        let (when, start_in, allow_failure) = match self.rules_result() {
            Some(result) if !result.pass() => return None,
            Some(result) => {
                variables.concat(&result.variables);
                (
                    result.when,
                    result.start_in,
                    // rules-based manual jobs block by default
                    result.allow_failure.or(self.job.allow_failure).unwrap_or(false),
                )
            }
            None => {
                if !self.job.only_except.included(self.pipeline, self) {
                    return None;
                }
                (
                    self.job.when,
                    self.job.start_in.clone(),
                    self.job
                        .allow_failure
                        .unwrap_or(self.job.when == When::Manual),
                )
            }
        };

        Some(JobAttributes {
            name: self.job.name.clone(),
            stage: self.job.stage.clone(),
            when,
            start_in,
            allow_failure,
            environment: self.job.environment.clone(),
            variables: variables.to_hash().into_iter().collect(),
        })
    }

    fn job_scoped_variables(&self) -> Variables {
        self.pipeline
            .predefined_variables()
            .with("CI_JOB_NAME", self.job.name.as_str())
            .with("CI_JOB_STAGE", self.job.stage.as_str())
    }
}

impl Seed for BuildSeed<'_> {
    fn name(&self) -> &str {
        &self.job.name
    }

    /// predefined < global config < job < pipeline-supplied variables
    fn scoped_variables(&self) -> Variables {
        let mut vars = self.job_scoped_variables();
        vars.concat(&self.global_variables);
        vars.concat(&self.job.variables);
        vars.concat(&self.pipeline.variables);
        vars
    }
}

impl VariableScope for BuildSeed<'_> {
    fn variables(&self) -> Variables {
        self.scoped_variables()
    }
}
