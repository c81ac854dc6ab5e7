// SPDX-License-Identifier: MIT

//! `rules:` evaluation
//!
//! The first rule whose clauses are all satisfied decides the job's `when`
//! and related attributes. When no rule matches the job is not created.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::clause::{Clause, RuleClause, VariableScope};
use super::pipeline::PipelineContext;
use crate::ci::error::{PipekitError, Result};
use crate::ci::variables::Variables;

/// When a job runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum When {
    #[default]
    OnSuccess,
    OnFailure,
    Always,
    Manual,
    Delayed,
    Never,
}

impl When {
    pub const ALL: [When; 6] = [
        When::OnSuccess,
        When::OnFailure,
        When::Always,
        When::Manual,
        When::Delayed,
        When::Never,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            When::OnSuccess => "on_success",
            When::OnFailure => "on_failure",
            When::Always => "always",
            When::Manual => "manual",
            When::Delayed => "delayed",
            When::Never => "never",
        }
    }
}

impl fmt::Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for When {
    type Err = PipekitError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        When::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| PipekitError::config(format!("Unknown when: {}", s)))
    }
}

/// Attributes a matching rule applies to the job
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleAttributes {
    pub when: Option<When>,
    pub start_in: Option<String>,
    pub allow_failure: Option<bool>,
    pub variables: Variables,
}

/// One entry of a `rules:` list
#[derive(Debug, Clone)]
pub struct Rule {
    clauses: Vec<RuleClause>,
    attributes: RuleAttributes,
}

impl Rule {
    pub fn new(clauses: Vec<RuleClause>, attributes: RuleAttributes) -> Result<Self> {
        match (attributes.when, &attributes.start_in) {
            (Some(When::Delayed), None) => {
                return Err(PipekitError::config("rule with `when: delayed` needs `start_in`"))
            }
            (when, Some(_)) if when != Some(When::Delayed) => {
                return Err(PipekitError::config(
                    "`start_in` is only allowed with `when: delayed`",
                ))
            }
            _ => {}
        }
        Ok(Self { clauses, attributes })
    }

    /// All clauses must hold; a rule without clauses always matches
    pub fn matches(&self, pipeline: &PipelineContext, context: &dyn VariableScope) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.satisfied_by(pipeline, context))
    }

    pub fn attributes(&self) -> &RuleAttributes {
        &self.attributes
    }

    pub fn clauses(&self) -> &[RuleClause] {
        &self.clauses
    }
}

/// Outcome of evaluating a rule list
#[derive(Debug, Clone, PartialEq)]
pub struct RulesResult {
    pub when: When,
    pub start_in: Option<String>,
    pub allow_failure: Option<bool>,
    pub variables: Variables,
}

impl RulesResult {
    fn with_when(when: When) -> Self {
        Self {
            when,
            start_in: None,
            allow_failure: None,
            variables: Variables::new(),
        }
    }

    /// Whether the job (or pipeline) is created
    pub fn pass(&self) -> bool {
        self.when != When::Never
    }
}

/// An optional rule list with the `when` used when a matching rule omits it
#[derive(Debug, Clone)]
pub struct Rules {
    rule_list: Option<Vec<Rule>>,
    default_when: When,
}

impl Rules {
    pub fn new(rule_list: Option<Vec<Rule>>, default_when: When) -> Self {
        Self {
            rule_list,
            default_when,
        }
    }

    pub fn evaluate(&self, pipeline: &PipelineContext, context: &dyn VariableScope) -> RulesResult {
        let Some(rule_list) = &self.rule_list else {
            return RulesResult::with_when(self.default_when);
        };

        match rule_list
            .iter()
            .position(|rule| rule.matches(pipeline, context))
        {
            Some(index) => {
                log::debug!("Rule #{} matched on ref {}", index + 1, pipeline.ref_name);
                let attributes = &rule_list[index].attributes;
                RulesResult {
                    when: attributes.when.unwrap_or(self.default_when),
                    start_in: attributes.start_in.clone(),
                    allow_failure: attributes.allow_failure,
                    variables: attributes.variables.clone(),
                }
            }
            None => {
                log::debug!("No rule matched on ref {}", pipeline.ref_name);
                RulesResult::with_when(When::Never)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rule_list.as_ref().map_or(true, |list| list.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ci::build::clause::{Exists, If};
    use crate::ci::build::pipeline::PipelineSource;

    fn if_rule(expression: &str, when: Option<When>) -> Rule {
        Rule::new(
            vec![RuleClause::If(If::new(expression).unwrap())],
            RuleAttributes {
                when,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn ref_vars(name: &str) -> Variables {
        Variables::new().with("CI_COMMIT_REF_NAME", name)
    }

    fn workflow_rules() -> Rules {
        Rules::new(
            Some(vec![
                if_rule("$CI_COMMIT_REF_NAME =~ /master/", None),
                if_rule("$CI_COMMIT_REF_NAME =~ /wip$/", Some(When::Never)),
                if_rule("$CI_COMMIT_REF_NAME =~ /feature/", None),
            ]),
            When::Always,
        )
    }

    fn pipeline() -> PipelineContext {
        PipelineContext::new("master", PipelineSource::Push)
    }

    #[test]
    fn test_when_parse_and_display() {
        assert_eq!("manual".parse::<When>().unwrap(), When::Manual);
        assert_eq!(When::OnSuccess.to_string(), "on_success");
        assert!("sometimes".parse::<When>().is_err());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = workflow_rules();

        let result = rules.evaluate(&pipeline(), &ref_vars("master"));
        assert_eq!(result.when, When::Always);
        assert!(result.pass());

        let result = rules.evaluate(&pipeline(), &ref_vars("feature"));
        assert!(result.pass());
    }

    #[test]
    fn test_when_never_rule() {
        let result = workflow_rules().evaluate(&pipeline(), &ref_vars("wip"));
        assert_eq!(result.when, When::Never);
        assert!(!result.pass());
    }

    #[test]
    fn test_no_match_is_never() {
        let result = workflow_rules().evaluate(&pipeline(), &ref_vars("other"));
        assert_eq!(result.when, When::Never);
        assert!(!result.pass());
    }

    #[test]
    fn test_no_rule_list_uses_default() {
        let rules = Rules::new(None, When::Manual);
        let result = rules.evaluate(&pipeline(), &Variables::new());
        assert_eq!(result.when, When::Manual);
        assert!(rules.is_empty());
    }

    #[test]
    fn test_all_clauses_must_hold() {
        let rule = Rule::new(
            vec![
                RuleClause::If(If::new("$CI_COMMIT_REF_NAME =~ /^feature/").unwrap()),
                RuleClause::Exists(Exists::new(vec!["README.md".to_string()]).unwrap()),
            ],
            RuleAttributes::default(),
        )
        .unwrap();

        let with_readme = pipeline().with_files(["README.md"]);
        assert!(rule.matches(&with_readme, &ref_vars("feature-x")));
        assert!(!rule.matches(&pipeline(), &ref_vars("feature-x")));
        assert!(!rule.matches(&with_readme, &ref_vars("main")));
    }

    #[test]
    fn test_rule_without_clauses_always_matches() {
        let rule = Rule::new(vec![], RuleAttributes::default()).unwrap();
        assert!(rule.matches(&pipeline(), &Variables::new()));
    }

    #[test]
    fn test_delayed_rule_attributes() {
        let rule = Rule::new(
            vec![],
            RuleAttributes {
                when: Some(When::Delayed),
                start_in: Some("4 hours".to_string()),
                allow_failure: Some(true),
                variables: Variables::new().with("DEPLOY", "later"),
            },
        )
        .unwrap();
        let rules = Rules::new(Some(vec![rule]), When::OnSuccess);
        let result = rules.evaluate(&pipeline(), &Variables::new());

        assert_eq!(result.when, When::Delayed);
        assert_eq!(result.start_in.as_deref(), Some("4 hours"));
        assert_eq!(result.allow_failure, Some(true));
        assert_eq!(result.variables.get("DEPLOY"), Some("later"));
    }

    #[test]
    fn test_delayed_requires_start_in() {
        let attributes = RuleAttributes {
            when: Some(When::Delayed),
            ..Default::default()
        };
        assert!(Rule::new(vec![], attributes).is_err());

        let attributes = RuleAttributes {
            when: Some(When::Manual),
            start_in: Some("1 hour".to_string()),
            ..Default::default()
        };
        assert!(Rule::new(vec![], attributes).is_err());
    }
}
