// SPDX-License-Identifier: MIT

pub mod loader;
pub mod planner;
pub mod types;

pub use loader::ConfigLoader;
pub use planner::{Plan, PlannedStage, Planner};
pub use types::PipelineConfig;
