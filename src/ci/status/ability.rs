// SPDX-License-Identifier: MIT

//! Permission checks consulted while decorating statuses

use std::collections::HashSet;

use super::subject::Subject;

/// Permissions a status decorator may ask about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadBuild,
    UpdateBuild,
    PlayJob,
    ReadPipeline,
    UpdatePipeline,
}

/// Answers whether the viewing user holds a permission on a subject
pub trait Ability {
    fn can(&self, permission: Permission, subject: &dyn Subject) -> bool;
}

/// A viewer with a fixed permission set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub username: String,
    permissions: HashSet<Permission>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            permissions: HashSet::new(),
        }
    }

    /// A viewer holding no permission at all
    pub fn anonymous() -> Self {
        Self::new("anonymous")
    }

    /// A viewer allowed to read, play, retry and cancel everything
    pub fn developer(username: impl Into<String>) -> Self {
        Self::new(username).with_permissions([
            Permission::ReadBuild,
            Permission::UpdateBuild,
            Permission::PlayJob,
            Permission::ReadPipeline,
            Permission::UpdatePipeline,
        ])
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    pub fn grant(&mut self, permission: Permission) {
        self.permissions.insert(permission);
    }
}

impl Ability for User {
    fn can(&self, permission: Permission, _subject: &dyn Subject) -> bool {
        self.permissions.contains(&permission)
    }
}
