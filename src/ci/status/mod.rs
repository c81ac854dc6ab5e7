// SPDX-License-Identifier: MIT

//! Job, stage and pipeline statuses and how they are presented
//!
//! This module provides:
//! - `StatusKind` - the lifecycle status and its core display attributes
//! - `Subject` - entities that carry a status (builds, bridges, stages, pipelines)
//! - `Extended` - decorators refining the display for a subject and viewer
//! - `Factory` - composes core status and decorators into a `DetailedStatus`
//! - `Composite` - aggregate status of a set of jobs
//! - `machine` - legal status transitions

pub mod ability;
pub mod composite;
pub mod core;
pub mod extended;
pub mod factory;
pub mod machine;
pub mod subject;

pub use ability::{Ability, Permission, User};
pub use composite::Composite;
pub use self::core::{ActionMethod, DetailedStatus, Illustration, StatusKind};
pub use extended::{Context, Extended};
pub use factory::{detailed_status, Factory, FactoryExtension, Group};
pub use machine::{event_for, fire, fire_pipeline, pipeline_target, update_status, Event};
pub use subject::{Bridge, Build, FailureReason, Pipeline, Stage, Subject, SubjectKind};
