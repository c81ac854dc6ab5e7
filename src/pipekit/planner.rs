// SPDX-License-Identifier: MIT

//! Pipeline planner - decides which jobs a pipeline gets
//!
//! Workflow rules are evaluated first; a pipeline they resolve to `never`
//! is not created. Every visible job is then seeded and kept when its
//! `rules:` or `only`/`except` include it.

use serde::Serialize;

use super::types::PipelineConfig;
use crate::ci::build::{BuildSeed, JobAttributes, PipelineContext, PipelineSource};
use crate::ci::error::{PipekitError, Result};
use crate::ci::variables::Variables;

/// Jobs of one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedStage {
    pub name: String,
    pub jobs: Vec<JobAttributes>,
}

/// Outcome of planning a pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub source: PipelineSource,
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub stages: Vec<PlannedStage>,
}

impl Plan {
    fn dropped(pipeline: &PipelineContext, reason: &str) -> Self {
        log::info!("Pipeline for {} not created: {}", pipeline.ref_name, reason);
        Self {
            ref_name: pipeline.ref_name.clone(),
            source: pipeline.source,
            created: false,
            reason: Some(reason.to_string()),
            stages: vec![],
        }
    }

    /// Included jobs in stage order
    pub fn jobs(&self) -> impl Iterator<Item = &JobAttributes> {
        self.stages.iter().flat_map(|stage| stage.jobs.iter())
    }

    pub fn job(&self, name: &str) -> Option<&JobAttributes> {
        self.jobs().find(|job| job.name == name)
    }
}

/// Plans pipelines for a configuration document
pub struct Planner<'c> {
    config: &'c PipelineConfig,
}

impl<'c> Planner<'c> {
    pub fn new(config: &'c PipelineConfig) -> Self {
        Self { config }
    }

    /// Variables visible to workflow rules
    fn workflow_variables(&self, pipeline: &PipelineContext) -> Variables {
        let mut vars = pipeline.predefined_variables();
        vars.concat(&self.config.global_variables());
        vars.concat(&pipeline.variables);
        vars
    }

    pub fn plan(&self, pipeline: &PipelineContext) -> Result<Plan> {
        let mut global_variables = self.config.global_variables();

        if let Some(workflow) = &self.config.workflow {
            let result = workflow
                .compile()?
                .evaluate(pipeline, &self.workflow_variables(pipeline));
            if !result.pass() {
                return Ok(Plan::dropped(pipeline, "filtered out by workflow rules"));
            }
            global_variables.concat(&result.variables);
        }

        let workflow_rules = self
            .config
            .workflow
            .as_ref()
            .map_or(false, |workflow| workflow.rules.is_some());
        let stages = self.config.stages();
        let mut planned: Vec<PlannedStage> = stages
            .iter()
            .map(|name| PlannedStage {
                name: name.clone(),
                jobs: vec![],
            })
            .collect();

        for (name, definition) in &self.config.jobs {
            let job = definition.compile(name, workflow_rules)?;
            let Some(stage) = planned.iter_mut().find(|s| s.name == job.stage) else {
                return Err(PipekitError::config(format!(
                    "jobs:{} chosen stage `{}` does not exist; available stages are {}",
                    name,
                    job.stage,
                    stages.join(", ")
                )));
            };

            let seed = BuildSeed::new(pipeline, global_variables.clone(), job);
            match seed.evaluate() {
                Some(attributes) => {
                    log::debug!("Job {} included as {}", name, attributes.when);
                    stage.jobs.push(attributes);
                }
                None => log::debug!("Job {} excluded", name),
            }
        }

        planned.retain(|stage| !stage.jobs.is_empty());

        // a pipeline made only of .pre/.post jobs is not created
        if planned
            .iter()
            .all(|stage| stage.name == ".pre" || stage.name == ".post")
        {
            return Ok(Plan::dropped(pipeline, "no stages / jobs for this pipeline"));
        }

        log::info!(
            "Planned {} job(s) for {}",
            planned.iter().map(|s| s.jobs.len()).sum::<usize>(),
            pipeline.ref_name
        );
        Ok(Plan {
            ref_name: pipeline.ref_name.clone(),
            source: pipeline.source,
            created: true,
            reason: None,
            stages: planned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ci::build::When;
    use crate::pipekit::loader::ConfigLoader;

    const CONFIG: &str = r#"
stages: [build, test, deploy]

variables:
  DEPLOY_TARGET: staging

workflow:
  rules:
    - if: '$CI_COMMIT_REF_NAME =~ /wip$/'
      when: never
    - when: always

compile:
  stage: build
  script: make

rspec:
  stage: test
  script: rspec
  except: [tags]

deploy:
  stage: deploy
  script: deploy
  rules:
    - if: '$CI_COMMIT_BRANCH == $CI_DEFAULT_BRANCH && $DEPLOY_TARGET == "production"'
      when: manual
    - if: '$CI_COMMIT_BRANCH == $CI_DEFAULT_BRANCH'
    - when: never
"#;

    fn plan(pipeline: PipelineContext) -> Plan {
        let config = ConfigLoader::parse_yaml(CONFIG).unwrap();
        Planner::new(&config).plan(&pipeline).unwrap()
    }

    #[test]
    fn test_plan_default_branch() {
        let plan = plan(PipelineContext::new("main", PipelineSource::Push));
        assert!(plan.created);
        let names: Vec<&str> = plan.jobs().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["compile", "rspec", "deploy"]);
        assert_eq!(plan.job("deploy").unwrap().when, When::OnSuccess);
    }

    #[test]
    fn test_plan_pipeline_variables_reach_rules() {
        let pipeline = PipelineContext::new("main", PipelineSource::Push)
            .with_variables(Variables::new().with("DEPLOY_TARGET", "production"));
        let plan = plan(pipeline);
        assert_eq!(plan.job("deploy").unwrap().when, When::Manual);
    }

    #[test]
    fn test_plan_feature_branch() {
        let plan = plan(PipelineContext::new("feature", PipelineSource::Push));
        assert!(plan.job("deploy").is_none());
        assert_eq!(plan.stages.len(), 2);
    }

    #[test]
    fn test_plan_tag() {
        let plan = plan(PipelineContext::new("v1.0", PipelineSource::Push).with_tag(true));
        assert!(plan.job("rspec").is_none());
        assert!(plan.job("compile").is_some());
    }

    #[test]
    fn test_workflow_drops_pipeline() {
        let plan = plan(PipelineContext::new("feature-wip", PipelineSource::Push));
        assert!(!plan.created);
        assert_eq!(plan.jobs().count(), 0);
        assert!(plan.reason.unwrap().contains("workflow"));
    }

    #[test]
    fn test_unknown_stage_is_config_error() {
        let config = ConfigLoader::parse_yaml("lint:\n  stage: check\n  script: x\n").unwrap();
        let err = Planner::new(&config)
            .plan(&PipelineContext::new("main", PipelineSource::Push))
            .unwrap_err();
        assert!(err.to_string().contains("chosen stage `check` does not exist"));
    }

    #[test]
    fn test_no_jobs_is_not_created() {
        let config =
            ConfigLoader::parse_yaml("lint:\n  script: x\n  only: [schedules]\n").unwrap();
        let plan = Planner::new(&config)
            .plan(&PipelineContext::new("main", PipelineSource::Push))
            .unwrap();
        assert!(!plan.created);
    }

    #[test]
    fn test_workflow_rule_variables_are_global() {
        let yaml = r#"
workflow:
  rules:
    - if: '$CI_PIPELINE_SOURCE == "schedule"'
      variables:
        NIGHTLY: "true"
    - when: always

nightly:
  script: x
  rules:
    - if: '$NIGHTLY == "true"'
"#;
        let config = ConfigLoader::parse_yaml(yaml).unwrap();
        let planner = Planner::new(&config);

        let scheduled = planner
            .plan(&PipelineContext::new("main", PipelineSource::Schedule))
            .unwrap();
        assert!(scheduled.job("nightly").is_some());

        let pushed = planner
            .plan(&PipelineContext::new("main", PipelineSource::Push))
            .unwrap();
        assert!(!pushed.created);
    }

    #[test]
    fn test_job_rule_variables_in_plan() {
        let yaml = r#"
deploy:
  script: deploy
  rules:
    - if: '$CI_COMMIT_BRANCH == "main"'
      variables:
        TARGET: production
"#;
        let config = ConfigLoader::parse_yaml(yaml).unwrap();
        let plan = Planner::new(&config)
            .plan(&PipelineContext::new("main", PipelineSource::Push))
            .unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["stages"][0]["jobs"][0]["variables"]["TARGET"], "production");
    }

    #[test]
    fn test_plan_serializes() {
        let plan = plan(PipelineContext::new("main", PipelineSource::Push));
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["ref"], "main");
        assert_eq!(json["source"], "push");
        assert_eq!(json["stages"][0]["name"], "build");
        assert_eq!(json["stages"][0]["jobs"][0]["when"], "on_success");
    }
}
