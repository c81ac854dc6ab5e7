// SPDX-License-Identifier: MIT

//! Status transitions
//!
//! Jobs follow a strict table: each event lists the statuses it may fire
//! from. Pipelines follow their jobs, so most pipeline events fire from any
//! status but their own target.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::core::StatusKind;
use crate::ci::error::TransitionError;

/// A lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Process,
    Enqueue,
    RequestResource,
    Prepare,
    Run,
    Skip,
    Drop,
    Succeed,
    Cancel,
    Block,
    Delay,
}

impl Event {
    pub const ALL: [Event; 11] = [
        Event::Process,
        Event::Enqueue,
        Event::RequestResource,
        Event::Prepare,
        Event::Run,
        Event::Skip,
        Event::Drop,
        Event::Succeed,
        Event::Cancel,
        Event::Block,
        Event::Delay,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Event::Process => "process",
            Event::Enqueue => "enqueue",
            Event::RequestResource => "request_resource",
            Event::Prepare => "prepare",
            Event::Run => "run",
            Event::Skip => "skip",
            Event::Drop => "drop",
            Event::Succeed => "succeed",
            Event::Cancel => "cancel",
            Event::Block => "block",
            Event::Delay => "delay",
        }
    }

    /// Status the event moves to
    pub fn target(self) -> StatusKind {
        match self {
            Event::Process => StatusKind::Created,
            Event::Enqueue => StatusKind::Pending,
            Event::RequestResource => StatusKind::WaitingForResource,
            Event::Prepare => StatusKind::Preparing,
            Event::Run => StatusKind::Running,
            Event::Skip => StatusKind::Skipped,
            Event::Drop => StatusKind::Failed,
            Event::Succeed => StatusKind::Success,
            Event::Cancel => StatusKind::Canceled,
            Event::Block => StatusKind::Manual,
            Event::Delay => StatusKind::Scheduled,
        }
    }

    /// Statuses the event may fire from
    pub fn sources(self) -> &'static [StatusKind] {
        use StatusKind::*;

        match self {
            Event::Process => &[Skipped, Manual],
            Event::Enqueue => &[Created, Skipped, Manual, Scheduled, WaitingForResource, Preparing],
            Event::RequestResource => &[Created, Skipped, Manual, Scheduled],
            Event::Prepare => &[Created, Skipped, Manual, Scheduled, WaitingForResource],
            Event::Run => &[Pending],
            Event::Skip => &[Created, WaitingForResource, Preparing, Pending],
            Event::Drop => &[
                Created,
                WaitingForResource,
                Preparing,
                Pending,
                Running,
                Manual,
                Scheduled,
            ],
            Event::Succeed => &[Created, WaitingForResource, Preparing, Pending, Running],
            Event::Cancel => &[
                Created,
                WaitingForResource,
                Preparing,
                Pending,
                Running,
                Manual,
                Scheduled,
            ],
            Event::Block => &[Created, Skipped],
            Event::Delay => &[Created, Skipped],
        }
    }

    pub fn can_fire(self, from: StatusKind) -> bool {
        self.sources().contains(&from)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event a pipeline fires to reach an aggregate status; `None` when the
/// status is not reached through an event
pub fn event_for(target: StatusKind) -> Option<Event> {
    match target {
        StatusKind::Created => None,
        StatusKind::WaitingForResource => Some(Event::RequestResource),
        StatusKind::Preparing => Some(Event::Prepare),
        StatusKind::Pending => Some(Event::Enqueue),
        StatusKind::Running => Some(Event::Run),
        StatusKind::Success => Some(Event::Succeed),
        StatusKind::Failed => Some(Event::Drop),
        StatusKind::Canceled => Some(Event::Cancel),
        StatusKind::Skipped => Some(Event::Skip),
        StatusKind::Manual => Some(Event::Block),
        StatusKind::Scheduled => Some(Event::Delay),
    }
}

/// Fire `event` from `from`
pub fn fire(from: StatusKind, event: Event) -> Result<StatusKind, TransitionError> {
    if event.can_fire(from) {
        log::debug!("Status transition {} -> {} via {}", from, event.target(), event);
        Ok(event.target())
    } else {
        Err(TransitionError { event, from })
    }
}

/// Status a pipeline moves to when `event` fires from `from`
///
/// `enqueue` restarts a finished pipeline as running, since it means a job
/// was retried. Pipelines have no `process` or `request_resource` events.
pub fn pipeline_target(from: StatusKind, event: Event) -> Option<StatusKind> {
    use StatusKind::*;

    match event {
        Event::Process | Event::RequestResource => None,
        Event::Enqueue => match from {
            Created | Preparing | Skipped | Scheduled => Some(Pending),
            Success | Failed | Canceled => Some(Running),
            _ => None,
        },
        event if event.target() == from => None,
        event => Some(event.target()),
    }
}

/// Fire `event` on a pipeline in status `from`
pub fn fire_pipeline(from: StatusKind, event: Event) -> Result<StatusKind, TransitionError> {
    match pipeline_target(from, event) {
        Some(target) => {
            log::debug!("Pipeline transition {} -> {} via {}", from, target, event);
            Ok(target)
        }
        None => Err(TransitionError { event, from }),
    }
}

/// Move a pipeline to the status its jobs aggregate to
///
/// Returns the status unchanged when it already matches or when the
/// target is `created`.
pub fn update_status(from: StatusKind, target: StatusKind) -> Result<StatusKind, TransitionError> {
    if from == target {
        return Ok(from);
    }
    match event_for(target) {
        Some(event) => fire_pipeline(from, event),
        None => Ok(from),
    }
}
