// SPDX-License-Identifier: MIT

//! Deciding which jobs a pipeline contains
//!
//! This module provides:
//! - `PipelineContext` - the ref, source and variables of a pipeline
//! - `Rules` / `Clause` - `rules:` lists and their `if:` / `exists:` clauses
//! - `Specification` - `only:` / `except:` policies
//! - `BuildSeed` - a prospective job and its inclusion decision

pub mod clause;
pub mod pipeline;
pub mod policy;
pub mod rules;
pub mod seed;

pub use clause::{Clause, Exists, If, RuleClause, VariableScope};
pub use pipeline::{PipelineContext, PipelineSource};
pub use policy::{OnlyExcept, Policy, RefsPolicy, Specification, VariablesPolicy};
pub use rules::{Rule, RuleAttributes, Rules, RulesResult, When};
pub use seed::{BuildSeed, Environment, Job, JobAttributes, Seed};
