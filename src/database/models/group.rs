use serde::{Deserialize, Serialize};
use std::fmt;

/// Named collection of permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: i64,
    pub app_label: String,
    pub model: String,
    pub codename: String,
    pub name: String,
}

impl Permission {
    /// The `"<app_label>.<codename>"` form used in permission checks
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.app_label, self.codename)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.app_label, self.model, self.codename)
    }
}

/// Static description of a permission, used to populate the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSpec {
    pub app_label: &'static str,
    pub model: &'static str,
    pub codename: &'static str,
    pub name: &'static str,
}
