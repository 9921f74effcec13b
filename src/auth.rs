use log::debug;
use std::collections::HashSet;

use crate::database::common::ANONYMOUS_GROUP_NAME;
use crate::database::models::User;
use crate::database::service::DatabaseService;
use crate::error::Error;
use crate::settings::general::SYSTEM_ENABLE_ANONYMOUS;
use crate::settings::ConfigStore;

/// The party performing an operation, with the permissions resolved up front.
#[derive(Debug, Clone)]
pub struct Actor {
    user: Option<User>,
    permissions: HashSet<String>,
}

impl Actor {
    pub async fn for_user(db: &DatabaseService, user: User) -> Result<Self, Error> {
        let permissions = db.user_permissions(user.id).await?.into_iter().collect();
        Ok(Self {
            user: Some(user),
            permissions,
        })
    }

    /// Anonymous visitor. Gets the permissions of the "Anonymous" group,
    /// but only while anonymous access is enabled.
    pub async fn anonymous(db: &DatabaseService, store: &ConfigStore) -> Result<Self, Error> {
        if !store.get_bool(SYSTEM_ENABLE_ANONYMOUS).await? {
            return Err(Error::Unauthorized);
        }
        let repo = db.repository();
        let permissions = match repo.get_group_by_name(ANONYMOUS_GROUP_NAME).await? {
            Some(group) => repo
                .list_group_permissions(group.id)
                .await?
                .iter()
                .map(|p| p.qualified_name())
                .collect(),
            None => HashSet::new(),
        };
        debug!("Anonymous actor with {} permissions", permissions.len());
        Ok(Self {
            user: None,
            permissions,
        })
    }

    /// Verify credentials against the user table
    pub async fn authenticate(
        db: &DatabaseService,
        username: &str,
        password: &str,
    ) -> Result<Self, Error> {
        match db.repository().get_user_by_username(username).await? {
            Some(user) if user.is_active && user.verify_password(password) => {
                Self::for_user(db, user).await
            }
            _ => Err(Error::Unauthorized),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The authenticated user, or `Unauthorized` for anonymous visitors
    pub fn require_user(&self) -> Result<&User, Error> {
        self.user.as_ref().ok_or(Error::Unauthorized)
    }

    pub fn has_perm(&self, perm: &str) -> bool {
        if self.user.as_ref().is_some_and(|u| u.is_superuser) {
            return true;
        }
        self.permissions.contains(perm)
    }

    pub fn require_perm(&self, perm: &str) -> Result<(), Error> {
        if self.has_perm(perm) {
            Ok(())
        } else if self.user.is_none() {
            Err(Error::Unauthorized)
        } else {
            Err(Error::PermissionDenied(perm.to_string()))
        }
    }
}
