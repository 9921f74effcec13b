pub mod common;
pub(crate) mod models;
pub(crate) mod service;
pub(crate) mod sqlite;

use crate::error::Error;
use async_trait::async_trait;
use models::{
    Assignment, Candidate, Group, Permission, PermissionSpec, Poll, PollOption, User, Vote,
};

/// Database configuration enum to support multiple database backends
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite { path: String },
}

impl std::fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseConfig::Sqlite { path } => {
                write!(f, "sqlite({})", path)
            }
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Sqlite {
            path: "plenum.db".to_string(),
        }
    }
}

/// Trait defining the database operations interface
#[async_trait]
pub trait DatabaseRepository: Send + Sync {
    /// Initialize the database (create tables, run migrations, etc.)
    async fn initialize(&self) -> Result<(), Error>;

    /// Permission operations
    async fn sync_permissions(&self, catalog: &[PermissionSpec]) -> Result<(), Error>;
    async fn get_permission(
        &self,
        app_label: &str,
        model: &str,
        codename: &str,
    ) -> Result<Option<Permission>, Error>;
    async fn list_permissions_by_codenames(
        &self,
        codenames: &[&str],
    ) -> Result<Vec<Permission>, Error>;

    /// Group operations
    async fn create_group(&self, id: Option<i64>, name: &str) -> Result<Group, Error>;
    async fn get_group_by_id(&self, id: i64) -> Result<Option<Group>, Error>;
    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>, Error>;
    async fn list_groups(&self) -> Result<Vec<Group>, Error>;
    async fn any_group_exists(&self, ids: &[i64]) -> Result<bool, Error>;
    async fn add_group_permissions(
        &self,
        group_id: i64,
        permission_ids: &[i64],
    ) -> Result<(), Error>;
    async fn list_group_permissions(&self, group_id: i64) -> Result<Vec<Permission>, Error>;

    /// User operations
    async fn create_user(&self, user: &User) -> Result<User, Error>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, Error>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error>;
    async fn update_user(&self, user: &User) -> Result<User, Error>;
    async fn list_users(&self) -> Result<Vec<User>, Error>;
    async fn add_user_to_group(&self, user_id: i64, group_id: i64) -> Result<(), Error>;
    async fn list_user_groups(&self, user_id: i64) -> Result<Vec<Group>, Error>;
    async fn list_user_permissions(&self, user_id: i64) -> Result<Vec<Permission>, Error>;

    /// Config store operations, values are JSON text
    async fn get_config_value(&self, key: &str) -> Result<Option<String>, Error>;
    async fn set_config_value(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Assignment operations
    async fn create_assignment(&self, assignment: &Assignment) -> Result<Assignment, Error>;
    async fn get_assignment(&self, id: i64) -> Result<Option<Assignment>, Error>;
    async fn update_assignment(&self, assignment: &Assignment) -> Result<Assignment, Error>;
    async fn delete_assignment(&self, id: i64) -> Result<bool, Error>;
    async fn list_assignments(&self) -> Result<Vec<Assignment>, Error>;

    /// Candidate operations
    async fn add_candidate(&self, assignment_id: i64, user_id: i64) -> Result<(), Error>;
    async fn remove_candidate(&self, assignment_id: i64, user_id: i64) -> Result<bool, Error>;
    async fn set_candidate_elected(
        &self,
        assignment_id: i64,
        user_id: i64,
        elected: bool,
    ) -> Result<bool, Error>;
    async fn list_candidates(&self, assignment_id: i64) -> Result<Vec<Candidate>, Error>;

    /// Poll operations
    async fn create_poll(
        &self,
        assignment_id: i64,
        yesnoabstain: bool,
        candidate_ids: &[i64],
    ) -> Result<Poll, Error>;
    async fn get_poll(&self, id: i64) -> Result<Option<Poll>, Error>;
    async fn list_polls(&self, assignment_id: i64) -> Result<Vec<Poll>, Error>;
    async fn update_poll(&self, poll: &Poll) -> Result<Poll, Error>;
    async fn delete_poll(&self, id: i64) -> Result<bool, Error>;
    async fn list_poll_options(&self, poll_id: i64) -> Result<Vec<PollOption>, Error>;
    async fn set_option_votes(&self, option_id: i64, votes: &[Vote]) -> Result<(), Error>;
    async fn list_poll_votes(&self, poll_id: i64) -> Result<Vec<Vote>, Error>;
}

/// Database factory to create appropriate repository based on configuration
pub async fn create_repository(
    config: &DatabaseConfig,
) -> Result<Box<dyn DatabaseRepository>, Error> {
    match config {
        DatabaseConfig::Sqlite { path } => {
            let repo = sqlite::SqliteRepository::new(path).await?;
            Ok(Box::new(repo))
        }
    }
}
