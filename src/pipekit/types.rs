// SPDX-License-Identifier: MIT

//! YAML schema types for pipeline configuration documents
//!
//! These mirror the `.gitlab-ci.yml` keys the planner understands and
//! compile into the validated types of `ci::build`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ci::build::{
    Environment, Exists, If, Job, OnlyExcept, Policy, RefsPolicy, Rule, RuleAttributes,
    RuleClause, Rules, VariablesPolicy, When,
};
use crate::ci::error::{PipekitError, Result};
use crate::ci::variables::Variables;

/// Stages used when a document declares none
pub const DEFAULT_STAGES: [&str; 5] = [".pre", "build", "test", "deploy", ".post"];

/// Stage a job lands in when it names none
pub const DEFAULT_STAGE: &str = "test";

/// Whole configuration document
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub stages: Vec<String>,
    pub variables: BTreeMap<String, VariableDefinition>,
    pub workflow: Option<WorkflowDefinition>,
    /// Visible jobs in document order
    pub jobs: Vec<(String, JobDefinition)>,
}

impl PipelineConfig {
    pub fn global_variables(&self) -> Variables {
        variables_of(&self.variables)
    }

    /// Declared stages framed by `.pre` and `.post`
    pub fn stages(&self) -> Vec<String> {
        if self.stages.is_empty() {
            return DEFAULT_STAGES.iter().map(|s| s.to_string()).collect();
        }
        let mut stages = vec![".pre".to_string()];
        stages.extend(
            self.stages
                .iter()
                .filter(|s| s.as_str() != ".pre" && s.as_str() != ".post")
                .cloned(),
        );
        stages.push(".post".to_string());
        stages
    }

    pub fn job(&self, name: &str) -> Option<&JobDefinition> {
        self.jobs
            .iter()
            .find(|(job_name, _)| job_name == name)
            .map(|(_, def)| def)
    }
}

/// A variable value: a scalar or `{ value, description }`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum VariableDefinition {
    Detailed {
        value: ScalarValue,
        description: Option<String>,
    },
    Simple(ScalarValue),
}

impl VariableDefinition {
    pub fn value(&self) -> String {
        match self {
            VariableDefinition::Detailed { value, .. } | VariableDefinition::Simple(value) => {
                value.to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Integer(i) => write!(f, "{}", i),
            ScalarValue::Float(x) => write!(f, "{}", x),
            ScalarValue::Text(s) => f.write_str(s),
        }
    }
}

fn variables_of(map: &BTreeMap<String, VariableDefinition>) -> Variables {
    map.iter()
        .map(|(key, definition)| (key.clone(), definition.value()))
        .collect()
}

/// `workflow:` section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub rules: Option<Vec<RuleDefinition>>,
}

impl WorkflowDefinition {
    /// Workflow rules resolve to `always` unless a rule says `never`
    pub fn compile(&self) -> Result<Rules> {
        let rules = match &self.rules {
            None => None,
            Some(list) => {
                let mut compiled = Vec::with_capacity(list.len());
                for (index, rule) in list.iter().enumerate() {
                    if let Some(when) = rule.when {
                        if !matches!(when, When::Always | When::Never) {
                            return Err(PipekitError::config(format!(
                                "workflow:rules:rule #{} when must be `always` or `never`, got `{}`",
                                index + 1,
                                when
                            )));
                        }
                    }
                    compiled.push(rule.compile("workflow")?);
                }
                Some(compiled)
            }
        };
        Ok(Rules::new(rules, When::Always))
    }
}

/// One `rules:` entry
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    #[serde(rename = "if")]
    pub if_clause: Option<String>,
    pub exists: Option<StringList>,
    pub when: Option<When>,
    pub start_in: Option<String>,
    pub allow_failure: Option<bool>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableDefinition>,
}

impl RuleDefinition {
    pub fn compile(&self, owner: &str) -> Result<Rule> {
        let mut clauses = Vec::new();
        if let Some(expression) = &self.if_clause {
            let clause = If::new(expression.as_str()).map_err(|e| {
                PipekitError::config(format!(
                    "{}: invalid `if` expression `{}`: {}",
                    owner, expression, e
                ))
            })?;
            clauses.push(RuleClause::If(clause));
        }
        if let Some(globs) = &self.exists {
            clauses.push(RuleClause::Exists(Exists::new(globs.to_vec())?));
        }

        Rule::new(
            clauses,
            RuleAttributes {
                when: self.when,
                start_in: self.start_in.clone(),
                allow_failure: self.allow_failure,
                variables: variables_of(&self.variables),
            },
        )
        .map_err(|e| PipekitError::config(format!("{}: {}", owner, e)))
    }
}

/// A single string or a list of strings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StringList {
    Single(String),
    Multiple(Vec<String>),
}

impl StringList {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            StringList::Single(s) => vec![s.clone()],
            StringList::Multiple(v) => v.clone(),
        }
    }
}

/// `only:` / `except:` value: a list of refs or `{ refs, variables }`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PolicyDefinition {
    Refs(StringList),
    Detailed {
        refs: Option<Vec<String>>,
        variables: Option<Vec<String>>,
    },
}

impl PolicyDefinition {
    pub fn compile(&self, owner: &str) -> Result<Vec<Policy>> {
        match self {
            PolicyDefinition::Refs(refs) => Ok(vec![Policy::Refs(RefsPolicy::new(refs.to_vec()))]),
            PolicyDefinition::Detailed { refs, variables } => {
                let mut policies = Vec::new();
                if let Some(refs) = refs {
                    policies.push(Policy::Refs(RefsPolicy::new(refs.iter().cloned())));
                }
                if let Some(variables) = variables {
                    let policy = VariablesPolicy::new(variables.iter().cloned())
                        .map_err(|e| PipekitError::config(format!("{}: {}", owner, e)))?;
                    policies.push(Policy::Variables(policy));
                }
                Ok(policies)
            }
        }
    }
}

/// `environment:` value: a name or `{ name, action }`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum EnvironmentDefinition {
    Name(String),
    Detailed { name: String, action: Option<String> },
}

impl EnvironmentDefinition {
    pub fn compile(&self) -> Environment {
        match self {
            EnvironmentDefinition::Name(name) => Environment {
                name: name.clone(),
                action: None,
            },
            EnvironmentDefinition::Detailed { name, action } => Environment {
                name: name.clone(),
                action: action.clone(),
            },
        }
    }
}

/// A job entry
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobDefinition {
    pub stage: Option<String>,
    pub when: Option<When>,
    pub start_in: Option<String>,
    pub allow_failure: Option<bool>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableDefinition>,
    pub rules: Option<Vec<RuleDefinition>>,
    pub only: Option<PolicyDefinition>,
    pub except: Option<PolicyDefinition>,
    pub environment: Option<EnvironmentDefinition>,
}

impl JobDefinition {
    /// Validate the entry and turn it into a `Job`
    ///
    /// Without `rules:` or `only:` a job runs on branches and tags, unless
    /// the document has workflow rules, which then decide alone.
    pub fn compile(&self, name: &str, workflow_rules: bool) -> Result<Job> {
        let owner = format!("jobs:{}", name);
        let when = self.when.unwrap_or_default();

        match (when, &self.start_in) {
            (When::Delayed, None) => {
                return Err(PipekitError::config(format!(
                    "{} start in should be specified for delayed jobs",
                    owner
                )))
            }
            (_, Some(_)) if self.rules.is_some() => {
                return Err(PipekitError::config(format!(
                    "{} start in should be blank when using rules, set it on the rule",
                    owner
                )))
            }
            (w, Some(_)) if w != When::Delayed => {
                return Err(PipekitError::config(format!(
                    "{} start in should be blank when not a delayed job",
                    owner
                )))
            }
            _ => {}
        }

        if self.rules.is_some() && (self.only.is_some() || self.except.is_some()) {
            return Err(PipekitError::config(format!(
                "{} config key may not be used with `rules`: only, except",
                owner
            )));
        }

        let rules = match &self.rules {
            Some(list) => {
                let compiled = list
                    .iter()
                    .map(|rule| rule.compile(&owner))
                    .collect::<Result<Vec<_>>>()?;
                Some(Rules::new(Some(compiled), when))
            }
            None => None,
        };

        let only = match &self.only {
            Some(only) => only.compile(&owner)?,
            None if workflow_rules => vec![],
            None => OnlyExcept::default_only(),
        };
        let except = match &self.except {
            Some(except) => except.compile(&owner)?,
            None => vec![],
        };

        let mut job = Job::new(name, self.stage.as_deref().unwrap_or(DEFAULT_STAGE));
        job.when = when;
        job.start_in = self.start_in.clone();
        job.allow_failure = self.allow_failure;
        job.variables = variables_of(&self.variables);
        job.rules = rules;
        job.only_except = OnlyExcept::new(only, except);
        job.environment = self.environment.as_ref().map(EnvironmentDefinition::compile);
        Ok(job)
    }
}
