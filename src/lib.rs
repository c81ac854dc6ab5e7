// SPDX-License-Identifier: MIT

//! CI pipeline planning and status presentation
//!
//! - `ci` - expressions, rules, `only`/`except` policies and statuses
//! - `pipekit` - configuration loading and pipeline planning

pub mod ci;
pub mod pipekit;
