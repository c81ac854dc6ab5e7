// SPDX-License-Identifier: MIT

//! Rule clauses: the individual conditions of a `rules:` entry

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use super::pipeline::PipelineContext;
use crate::ci::error::{ExpressionError, Result};
use crate::ci::expression::Statement;
use crate::ci::variables::Variables;

/// Anything that supplies the variables a clause is evaluated against
pub trait VariableScope {
    fn variables(&self) -> Variables;
}

impl VariableScope for Variables {
    fn variables(&self) -> Variables {
        self.clone()
    }
}

/// A single condition of a rule
pub trait Clause {
    fn satisfied_by(&self, pipeline: &PipelineContext, context: &dyn VariableScope) -> bool;
}

/// `if:` clause wrapping one expression string
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    expression: String,
}

impl If {
    /// Create the clause, rejecting expressions that do not parse
    pub fn new(expression: impl Into<String>) -> std::result::Result<Self, ExpressionError> {
        let expression = expression.into();
        Statement::parse(&expression)?;
        Ok(Self { expression })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl Clause for If {
    fn satisfied_by(&self, _pipeline: &PipelineContext, context: &dyn VariableScope) -> bool {
        let variables = context.variables();
        Statement::new(&self.expression, &variables).truthful()
    }
}

/// `exists:` clause: any glob matches a file in the repository
///
/// `*` and `?` stay within one path segment, `**` spans directories and
/// `{a,b}` alternates.
#[derive(Debug, Clone)]
pub struct Exists {
    globs: Vec<String>,
    set: GlobSet,
}

impl Exists {
    pub fn new(globs: Vec<String>) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for glob in &globs {
            let glob = GlobBuilder::new(glob.trim_start_matches("./"))
                .literal_separator(true)
                .build()?;
            builder.add(glob);
        }
        let set = builder.build()?;
        Ok(Self { globs, set })
    }

    pub fn globs(&self) -> &[String] {
        &self.globs
    }
}

impl Clause for Exists {
    fn satisfied_by(&self, pipeline: &PipelineContext, _context: &dyn VariableScope) -> bool {
        pipeline
            .files
            .iter()
            .any(|path| self.set.is_match(path.trim_start_matches("./")))
    }
}

/// Clause variants a rule can hold
#[derive(Debug, Clone)]
pub enum RuleClause {
    If(If),
    Exists(Exists),
}

impl Clause for RuleClause {
    fn satisfied_by(&self, pipeline: &PipelineContext, context: &dyn VariableScope) -> bool {
        match self {
            RuleClause::If(clause) => clause.satisfied_by(pipeline, context),
            RuleClause::Exists(clause) => clause.satisfied_by(pipeline, context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ci::build::pipeline::PipelineSource;

    fn pipeline() -> PipelineContext {
        PipelineContext::new("main", PipelineSource::Push).with_files([
            "README.md",
            "app/models/user.rb",
            "docs/guide/index.md",
            "Dockerfile",
        ])
    }

    #[test]
    fn test_if_clause_uses_context_variables() {
        let clause = If::new(r#"$A == "1""#).unwrap();
        let one = Variables::new().with("A", "1");
        let two = Variables::new().with("A", "2");

        assert!(clause.satisfied_by(&pipeline(), &one));
        assert!(!clause.satisfied_by(&pipeline(), &two));
    }

    #[test]
    fn test_if_clause_rejects_bad_syntax() {
        assert!(If::new("$A ==").is_err());
        assert!(If::new("").is_err());
    }

    #[test]
    fn test_exists_exact_file() {
        let clause = Exists::new(vec!["README.md".to_string()]).unwrap();
        assert!(clause.satisfied_by(&pipeline(), &Variables::new()));

        let clause = Exists::new(vec!["app.rb".to_string()]).unwrap();
        assert!(!clause.satisfied_by(&pipeline(), &Variables::new()));
    }

    #[test]
    fn test_exists_globs() {
        let cases = [
            ("*.md", true),
            ("app/*.rb", false),
            ("app/**/*.rb", true),
            ("**/index.md", true),
            ("Dockerfil?", true),
            ("./Dockerfile", true),
            ("docs/*", false),
            ("docs/**", true),
            ("*.{yml,md}", true),
            ("app/**/*.{py,js}", false),
        ];
        for (glob, expected) in cases {
            let clause = Exists::new(vec![glob.to_string()]).unwrap();
            assert_eq!(
                clause.satisfied_by(&pipeline(), &Variables::new()),
                expected,
                "glob: {}",
                glob
            );
        }
    }

    #[test]
    fn test_exists_brace_alternation() {
        let clause = Exists::new(vec!["ci/*.{yml,yaml}".to_string()]).unwrap();
        let pipeline = PipelineContext::new("main", PipelineSource::Push)
            .with_files(["ci/config.yaml"]);
        assert!(clause.satisfied_by(&pipeline, &Variables::new()));

        let nested = PipelineContext::new("main", PipelineSource::Push)
            .with_files(["ci/nested/config.yaml"]);
        assert!(!clause.satisfied_by(&nested, &Variables::new()));
    }

    #[test]
    fn test_exists_invalid_glob() {
        let err = Exists::new(vec!["src/{a,b".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Glob pattern error"));
    }

    #[test]
    fn test_rule_clause_dispatch() {
        let clause = RuleClause::If(If::new("$DEPLOY").unwrap());
        let vars = Variables::new().with("DEPLOY", "true");
        assert!(clause.satisfied_by(&pipeline(), &vars));
        assert!(!clause.satisfied_by(&pipeline(), &Variables::new()));
    }
}
