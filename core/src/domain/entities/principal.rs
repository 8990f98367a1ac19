//! Principal and resolved authorization data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// An authenticated subject as seen by the token subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
}

impl Principal {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            is_active: true,
        }
    }
}

/// Role assigned to a principal
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleRef {
    pub id: Uuid,
    pub name: String,
}

/// Roles and permission keys resolved for one principal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub roles: Vec<RoleRef>,
    pub permissions: BTreeSet<String>,
}

impl PermissionSet {
    pub fn new(roles: Vec<RoleRef>, permissions: impl IntoIterator<Item = String>) -> Self {
        Self {
            roles,
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn has_permission(&self, key: &str) -> bool {
        self.permissions.contains(key)
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }

    pub fn has_role_id(&self, role_id: Uuid) -> bool {
        self.roles.iter().any(|r| r.id == role_id)
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn permission_keys(&self) -> Vec<String> {
        self.permissions.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_set_queries() {
        let admin = RoleRef {
            id: Uuid::new_v4(),
            name: "admin".to_string(),
        };
        let set = PermissionSet::new(
            vec![admin.clone()],
            vec!["users:read".to_string(), "users:write".to_string()],
        );

        assert!(set.has_permission("users:read"));
        assert!(!set.has_permission("users:delete"));
        assert!(set.has_role("admin"));
        assert!(set.has_role_id(admin.id));
        assert!(!set.has_role_id(Uuid::new_v4()));
        assert_eq!(set.role_names(), vec!["admin".to_string()]);
        assert_eq!(set.permission_keys(), vec!["users:read", "users:write"]);
    }
}
