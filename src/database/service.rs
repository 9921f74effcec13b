use log::info;
use std::sync::Arc;

use crate::database::common::PERMISSION_CATALOG;
use crate::database::{create_repository, DatabaseConfig, DatabaseRepository};
use crate::error::Error;

/// Database service that provides high-level operations
#[derive(Clone)]
pub struct DatabaseService {
    repository: Arc<Box<dyn DatabaseRepository>>,
}

impl DatabaseService {
    /// Create a new database service with the given configuration.
    /// Tables are created and the permission catalogue is synchronised.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, Error> {
        info!("Initializing database service: {}", config);
        let repository = create_repository(config).await?;
        repository.sync_permissions(&PERMISSION_CATALOG).await?;
        Ok(Self {
            repository: Arc::new(repository),
        })
    }

    /// Get a reference to the repository for direct access
    pub fn repository(&self) -> &dyn DatabaseRepository {
        self.repository.as_ref().as_ref()
    }

    /// Permission strings (`app_label.codename`) granted to a user through its groups.
    /// Authenticated users implicitly belong to the built-in "Registered" group.
    pub async fn user_permissions(&self, user_id: i64) -> Result<Vec<String>, Error> {
        let repo = self.repository();
        let mut perms = repo
            .list_user_permissions(user_id)
            .await?
            .iter()
            .map(|p| p.qualified_name())
            .collect::<Vec<_>>();
        perms.extend(
            repo.list_group_permissions(super::common::GROUP_REGISTERED)
                .await?
                .iter()
                .map(|p| p.qualified_name()),
        );
        perms.sort();
        perms.dedup();
        Ok(perms)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::models::{Assignment, AssignmentStatus, User, Vote, VoteValue};
    use tempfile::TempDir;

    /// Fresh database in a temporary directory. Keep the `TempDir` alive for the test.
    pub(crate) async fn create_test_service() -> (DatabaseService, TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let config = DatabaseConfig::Sqlite {
            path: db_path.to_string_lossy().to_string(),
        };
        let db = DatabaseService::new(&config).await.unwrap();
        (db, temp_dir)
    }

    /// Run a statement on the test database behind the repository's back
    pub(crate) async fn execute_raw(dir: &TempDir, sql: &str) {
        let url = format!("sqlite://{}", dir.path().join("test.db").display());
        let pool = sqlx::SqlitePool::connect(&url).await.unwrap();
        sqlx::query(sql).execute(&pool).await.unwrap();
        pool.close().await;
    }

    #[tokio::test]
    async fn test_permission_catalog_synced() {
        let (db, _dir) = create_test_service().await;
        let repo = db.repository();

        let p = repo
            .get_permission("assignment", "assignment", "can_nominate_self")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p.qualified_name(), "assignment.can_nominate_self");

        // mediafile and config both define `can_manage`
        let perms = repo.list_permissions_by_codenames(&["can_manage"]).await.unwrap();
        assert_eq!(perms.len(), 2);

        assert!(repo
            .get_permission("agenda", "speaker", "can_see_agenda")
            .await
            .unwrap()
            .is_none());

        // syncing twice doesn't duplicate anything
        repo.sync_permissions(&PERMISSION_CATALOG).await.unwrap();
        let perms = repo.list_permissions_by_codenames(&["can_manage"]).await.unwrap();
        assert_eq!(perms.len(), 2);
    }

    #[tokio::test]
    async fn test_groups_and_user_permissions() {
        let (db, _dir) = create_test_service().await;
        let repo = db.repository();

        assert!(!repo.any_group_exists(&[1, 2, 3, 4]).await.unwrap());
        let g = repo.create_group(Some(3), "Delegates").await.unwrap();
        assert_eq!(g.id, 3);
        assert!(repo.any_group_exists(&[1, 2, 3, 4]).await.unwrap());
        assert!(!repo.any_group_exists(&[1, 2]).await.unwrap());

        let other = repo.create_group(None, "Press").await.unwrap();
        assert!(other.id > 3);
        assert!(repo.create_group(None, "Press").await.is_err());

        let p = repo
            .get_permission("motion", "motion", "can_create_motion")
            .await
            .unwrap()
            .unwrap();
        repo.add_group_permissions(g.id, &[p.id]).await.unwrap();
        // adding the same permission twice is a no-op
        repo.add_group_permissions(g.id, &[p.id]).await.unwrap();
        assert_eq!(repo.list_group_permissions(g.id).await.unwrap().len(), 1);

        let user = repo.create_user(&User::new("carol")).await.unwrap();
        assert!(user.id > 0);
        repo.add_user_to_group(user.id, g.id).await.unwrap();
        assert_eq!(repo.list_user_groups(user.id).await.unwrap(), vec![g]);

        let perms = db.user_permissions(user.id).await.unwrap();
        assert_eq!(perms, vec!["motion.can_create_motion".to_string()]);
    }

    #[tokio::test]
    async fn test_config_values() {
        let (db, _dir) = create_test_service().await;
        let repo = db.repository();

        assert!(repo.get_config_value("event_name").await.unwrap().is_none());
        repo.set_config_value("event_name", "\"Annual meeting\"")
            .await
            .unwrap();
        repo.set_config_value("event_name", "\"General assembly\"")
            .await
            .unwrap();
        assert_eq!(
            repo.get_config_value("event_name").await.unwrap().as_deref(),
            Some("\"General assembly\"")
        );
    }

    #[tokio::test]
    async fn test_assignment_candidates_and_polls() {
        let (db, _dir) = create_test_service().await;
        let repo = db.repository();

        let a = repo
            .create_assignment(&Assignment::new("Board", 2))
            .await
            .unwrap();
        let mut a = repo.get_assignment(a.id).await.unwrap().unwrap();
        assert_eq!(a.status, AssignmentStatus::Searching);
        a.status = AssignmentStatus::Voting;
        repo.update_assignment(&a).await.unwrap();
        assert_eq!(
            repo.get_assignment(a.id).await.unwrap().unwrap().status,
            AssignmentStatus::Voting
        );

        let u1 = repo.create_user(&User::new("u1")).await.unwrap();
        let u2 = repo.create_user(&User::new("u2")).await.unwrap();
        repo.add_candidate(a.id, u1.id).await.unwrap();
        repo.add_candidate(a.id, u2.id).await.unwrap();
        assert!(repo.add_candidate(a.id, u2.id).await.is_err());
        assert_eq!(repo.list_candidates(a.id).await.unwrap().len(), 2);

        assert!(repo.set_candidate_elected(a.id, u1.id, true).await.unwrap());
        let elected = repo
            .list_candidates(a.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.elected)
            .map(|c| c.user_id)
            .collect::<Vec<_>>();
        assert_eq!(elected, vec![u1.id]);

        let poll = repo.create_poll(a.id, true, &[u1.id, u2.id]).await.unwrap();
        let options = repo.list_poll_options(poll.id).await.unwrap();
        assert_eq!(options.len(), 2);

        let votes = vec![
            Vote {
                option_id: options[0].id,
                value: VoteValue::Yes,
                weight: 10,
            },
            Vote {
                option_id: options[0].id,
                value: VoteValue::No,
                weight: 3,
            },
        ];
        repo.set_option_votes(options[0].id, &votes).await.unwrap();
        // replacing votes drops the old ones
        repo.set_option_votes(options[0].id, &votes[..1]).await.unwrap();
        assert_eq!(repo.list_poll_votes(poll.id).await.unwrap(), votes[..1].to_vec());

        assert!(repo.remove_candidate(a.id, u2.id).await.unwrap());
        assert!(!repo.remove_candidate(a.id, u2.id).await.unwrap());

        assert!(repo.delete_assignment(a.id).await.unwrap());
        assert!(repo.get_poll(poll.id).await.unwrap().is_none());
        assert!(repo.list_poll_votes(poll.id).await.unwrap().is_empty());
    }
}
