// SPDX-License-Identifier: MIT

//! Config loader - YAML file loading and parsing
//!
//! This module handles loading pipeline configuration documents.

use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

use super::types::{JobDefinition, PipelineConfig, WorkflowDefinition};
use crate::ci::error::{PipekitError, Result};

/// Top-level keys that are not jobs
const RESERVED_KEYS: [&str; 11] = [
    "default",
    "include",
    "stages",
    "types",
    "variables",
    "workflow",
    "image",
    "services",
    "cache",
    "before_script",
    "after_script",
];

/// Loads pipeline configuration from YAML files
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a configuration document from a YAML file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<PipelineConfig> {
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    /// Load a configuration document without blocking the runtime
    pub async fn load_async<P: AsRef<Path>>(&self, path: P) -> Result<PipelineConfig> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse_yaml(&content)
    }

    /// Parse a configuration document from a YAML string
    pub fn parse_yaml(content: &str) -> Result<PipelineConfig> {
        let document: Mapping = serde_yaml::from_str(content)?;
        let mut config = PipelineConfig::default();

        for (key, value) in document {
            let Value::String(key) = key else {
                return Err(PipekitError::config(format!(
                    "config contains a non-string key: {:?}",
                    key
                )));
            };

            match key.as_str() {
                "stages" | "types" => config.stages = serde_yaml::from_value(value)?,
                "variables" => config.variables = serde_yaml::from_value(value)?,
                "workflow" => {
                    config.workflow = Some(serde_yaml::from_value::<WorkflowDefinition>(value)?)
                }
                _ if RESERVED_KEYS.contains(&key.as_str()) => {
                    log::debug!("Ignoring global keyword `{}`", key);
                }
                _ if key.starts_with('.') => log::debug!("Skipping hidden job `{}`", key),
                _ => {
                    if !value.is_mapping() {
                        return Err(PipekitError::config(format!(
                            "jobs:{} config should be a hash",
                            key
                        )));
                    }
                    let job: JobDefinition = serde_yaml::from_value(value).map_err(|e| {
                        PipekitError::config(format!("jobs:{} config is invalid: {}", key, e))
                    })?;
                    config.jobs.push((key, job));
                }
            }
        }

        if config.jobs.is_empty() {
            return Err(PipekitError::config(
                "jobs config should contain at least one visible job",
            ));
        }
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
