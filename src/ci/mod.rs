// SPDX-License-Identifier: MIT

pub mod build;
pub mod error;
pub mod expression;
pub mod status;
pub mod variables;
