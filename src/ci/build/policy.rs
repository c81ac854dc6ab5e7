// SPDX-License-Identifier: MIT

//! `only:` / `except:` policies over a prospective job

use std::fmt;

use super::pipeline::PipelineContext;
use super::seed::Seed;
use crate::ci::error::{PipekitError, Result};
use crate::ci::expression::{Pattern, Statement};

/// A predicate over a pipeline and a prospective job
pub trait Specification: fmt::Debug {
    fn satisfied_by(&self, pipeline: &PipelineContext, seed: &dyn Seed) -> bool;
}

/// `variables:` policy: any expression holding against the job's variables
/// satisfies it
#[derive(Debug, Clone, PartialEq)]
pub struct VariablesPolicy {
    expressions: Vec<String>,
}

impl VariablesPolicy {
    /// Every expression must parse; a malformed one is a configuration error
    pub fn new<I, S>(expressions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let expressions: Vec<String> = expressions.into_iter().map(Into::into).collect();
        for expression in &expressions {
            Statement::parse(expression).map_err(|e| {
                PipekitError::config(format!(
                    "variables policy: invalid expression syntax in `{}`: {}",
                    expression, e
                ))
            })?;
        }
        Ok(Self { expressions })
    }

    pub fn expressions(&self) -> &[String] {
        &self.expressions
    }
}

impl Specification for VariablesPolicy {
    fn satisfied_by(&self, _pipeline: &PipelineContext, seed: &dyn Seed) -> bool {
        let variables = seed.scoped_variables();
        self.expressions
            .iter()
            .any(|expression| Statement::new(expression, &variables).truthful())
    }
}

/// `refs:` policy
///
/// Patterns are `branches`, `tags`, source keywords (`pushes`, `schedules`,
/// `merge_requests`, ...), `/regex/` patterns or literal ref names. A
/// pattern may be scoped to a project with `pattern@group/project`.
#[derive(Debug, Clone, PartialEq)]
pub struct RefsPolicy {
    patterns: Vec<String>,
}

impl RefsPolicy {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    fn matches_path(path: Option<&str>, pipeline: &PipelineContext) -> bool {
        match path {
            None => true,
            Some(path) => path == pipeline.project_path,
        }
    }

    fn matches_pattern(pattern: &str, pipeline: &PipelineContext) -> bool {
        if pipeline.is_tag() && pattern == "tags" {
            return true;
        }
        if pipeline.is_branch() && pattern == "branches" {
            return true;
        }
        if pipeline.source.keyword() == pattern || pipeline.source.plural_keyword() == pattern {
            return true;
        }

        // ref patterns only apply to branch and tag pipelines
        if !(pipeline.is_branch() || pipeline.is_tag()) {
            return false;
        }

        if pattern.starts_with('/') {
            if let Some(regex) = Pattern::fabricate(pattern) {
                return regex.is_match(&pipeline.ref_name);
            }
        }
        pattern == pipeline.ref_name
    }
}

impl Specification for RefsPolicy {
    fn satisfied_by(&self, pipeline: &PipelineContext, _seed: &dyn Seed) -> bool {
        self.patterns.iter().any(|entry| {
            let (pattern, path) = match entry.rsplit_once('@') {
                Some((pattern, path)) if !pattern.starts_with('/') || pattern.ends_with('/') => {
                    (pattern, Some(path))
                }
                _ => (entry.as_str(), None),
            };
            Self::matches_path(path, pipeline) && Self::matches_pattern(pattern, pipeline)
        })
    }
}

/// Policy variants accepted under `only:` and `except:`
#[derive(Debug, Clone, PartialEq)]
pub enum Policy {
    Refs(RefsPolicy),
    Variables(VariablesPolicy),
}

impl Specification for Policy {
    fn satisfied_by(&self, pipeline: &PipelineContext, seed: &dyn Seed) -> bool {
        match self {
            Policy::Refs(policy) => policy.satisfied_by(pipeline, seed),
            Policy::Variables(policy) => policy.satisfied_by(pipeline, seed),
        }
    }
}

/// Combined `only` / `except` decision
#[derive(Debug, Clone, PartialEq)]
pub struct OnlyExcept {
    only: Vec<Policy>,
    except: Vec<Policy>,
}

impl OnlyExcept {
    pub fn new(only: Vec<Policy>, except: Vec<Policy>) -> Self {
        Self { only, except }
    }

    /// `only: [branches, tags]`, nothing excepted
    pub fn default_only() -> Vec<Policy> {
        vec![Policy::Refs(RefsPolicy::new(["branches", "tags"]))]
    }

    /// Included when every `only` policy holds and no `except` policy does
    pub fn included(&self, pipeline: &PipelineContext, seed: &dyn Seed) -> bool {
        self.only.iter().all(|spec| spec.satisfied_by(pipeline, seed))
            && !self.except.iter().any(|spec| spec.satisfied_by(pipeline, seed))
    }
}

impl Default for OnlyExcept {
    fn default() -> Self {
        Self::new(Self::default_only(), vec![])
    }
}
