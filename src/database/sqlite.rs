use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool},
    Pool, Sqlite,
};
use std::str::FromStr;

use crate::database::models::{
    Assignment, Candidate, Group, Permission, PermissionSpec, Poll, PollOption, User, Vote,
};
use crate::database::DatabaseRepository;
use crate::error::Error;

const PERMISSION_COLUMNS: &str = r#"p.id, ct.app_label, ct.model, p.codename, p.name
    FROM auth_permissions p INNER JOIN auth_content_types ct ON p.content_type_id = ct.id"#;

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, password_hash, is_active, is_superuser, updated_at";

const ASSIGNMENT_COLUMNS: &str = "id, name, description, posts, polldescription, status, updated_at";

const POLL_COLUMNS: &str =
    "id, assignment_id, yesnoabstain, votesvalid, votesinvalid, votescast, published, created_at";

pub struct SqliteRepository {
    pool: Pool<Sqlite>,
}

impl SqliteRepository {
    pub async fn new(database_path: &str) -> Result<Self, Error> {
        let database_url = format!("sqlite:{}", database_path);
        info!("Connecting to SQLite database: {}", database_path);

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| Error::Database(format!("Invalid SQLite path: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to SQLite database: {}", e)))?;

        let repo = Self { pool };
        repo.initialize().await?;

        Ok(repo)
    }

    async fn create_tables(&self) -> Result<(), Error> {
        let statements = [
            (
                "auth_content_types",
                r#"
                CREATE TABLE IF NOT EXISTS auth_content_types (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    app_label TEXT NOT NULL,
                    model TEXT NOT NULL,
                    UNIQUE(app_label, model)
                )
                "#,
            ),
            (
                "auth_permissions",
                r#"
                CREATE TABLE IF NOT EXISTS auth_permissions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    content_type_id INTEGER NOT NULL,
                    codename TEXT NOT NULL,
                    name TEXT NOT NULL,
                    FOREIGN KEY (content_type_id) REFERENCES auth_content_types (id) ON DELETE CASCADE,
                    UNIQUE(content_type_id, codename)
                )
                "#,
            ),
            (
                "auth_groups",
                r#"
                CREATE TABLE IF NOT EXISTS auth_groups (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT UNIQUE NOT NULL
                )
                "#,
            ),
            (
                "auth_group_permissions",
                r#"
                CREATE TABLE IF NOT EXISTS auth_group_permissions (
                    group_id INTEGER NOT NULL,
                    permission_id INTEGER NOT NULL,
                    FOREIGN KEY (group_id) REFERENCES auth_groups (id) ON DELETE CASCADE,
                    FOREIGN KEY (permission_id) REFERENCES auth_permissions (id) ON DELETE CASCADE,
                    PRIMARY KEY (group_id, permission_id)
                )
                "#,
            ),
            (
                "users",
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT UNIQUE NOT NULL,
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    password_hash TEXT,
                    is_active BOOLEAN NOT NULL CHECK (is_active IN (0, 1)),
                    is_superuser BOOLEAN NOT NULL CHECK (is_superuser IN (0, 1)),
                    updated_at INTEGER NOT NULL
                )
                "#,
            ),
            (
                "auth_user_groups",
                r#"
                CREATE TABLE IF NOT EXISTS auth_user_groups (
                    user_id INTEGER NOT NULL,
                    group_id INTEGER NOT NULL,
                    FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
                    FOREIGN KEY (group_id) REFERENCES auth_groups (id) ON DELETE CASCADE,
                    PRIMARY KEY (user_id, group_id)
                )
                "#,
            ),
            (
                "config_store",
                r#"
                CREATE TABLE IF NOT EXISTS config_store (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,  -- Stores JSON
                    updated_at INTEGER NOT NULL,
                    CHECK (json_valid(value))
                )
                "#,
            ),
            (
                "assignments",
                r#"
                CREATE TABLE IF NOT EXISTS assignments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL,
                    posts INTEGER NOT NULL CHECK (posts > 0),
                    polldescription TEXT NOT NULL,
                    status TEXT NOT NULL CHECK (status IN ('sea', 'vot', 'fin')),
                    updated_at INTEGER NOT NULL
                )
                "#,
            ),
            (
                "assignment_candidates",
                r#"
                CREATE TABLE IF NOT EXISTS assignment_candidates (
                    assignment_id INTEGER NOT NULL,
                    user_id INTEGER NOT NULL,
                    elected BOOLEAN NOT NULL CHECK (elected IN (0, 1)),
                    FOREIGN KEY (assignment_id) REFERENCES assignments (id) ON DELETE CASCADE,
                    FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
                    PRIMARY KEY (assignment_id, user_id)
                )
                "#,
            ),
            (
                "assignment_polls",
                r#"
                CREATE TABLE IF NOT EXISTS assignment_polls (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    assignment_id INTEGER NOT NULL,
                    yesnoabstain BOOLEAN NOT NULL CHECK (yesnoabstain IN (0, 1)),
                    votesvalid INTEGER,
                    votesinvalid INTEGER,
                    votescast INTEGER,
                    published BOOLEAN NOT NULL CHECK (published IN (0, 1)),
                    created_at INTEGER NOT NULL,
                    FOREIGN KEY (assignment_id) REFERENCES assignments (id) ON DELETE CASCADE
                )
                "#,
            ),
            (
                "assignment_options",
                r#"
                CREATE TABLE IF NOT EXISTS assignment_options (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    poll_id INTEGER NOT NULL,
                    candidate_id INTEGER NOT NULL,
                    FOREIGN KEY (poll_id) REFERENCES assignment_polls (id) ON DELETE CASCADE,
                    FOREIGN KEY (candidate_id) REFERENCES users (id) ON DELETE CASCADE
                )
                "#,
            ),
            (
                "assignment_votes",
                r#"
                CREATE TABLE IF NOT EXISTS assignment_votes (
                    option_id INTEGER NOT NULL,
                    value TEXT NOT NULL CHECK (value IN ('Yes', 'No', 'Abstain', 'Votes')),
                    weight INTEGER NOT NULL,
                    FOREIGN KEY (option_id) REFERENCES assignment_options (id) ON DELETE CASCADE,
                    PRIMARY KEY (option_id, value)
                )
                "#,
            ),
        ];

        for (table, sql) in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to create {} table: {}", table, e)))?;
        }

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_options_poll_id ON assignment_options (poll_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(format!("Failed to create options poll_id index: {}", e))
            })?;

        info!("Database tables and indexes created successfully");
        Ok(())
    }
}

fn placeholders(n: usize) -> String {
    (0..n).map(|_| "?").collect::<Vec<_>>().join(", ")
}

#[async_trait]
impl DatabaseRepository for SqliteRepository {
    async fn initialize(&self) -> Result<(), Error> {
        debug!("Initializing SQLite database");
        self.create_tables().await
    }

    // Permission operations
    async fn sync_permissions(&self, catalog: &[PermissionSpec]) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        for spec in catalog {
            sqlx::query("INSERT OR IGNORE INTO auth_content_types (app_label, model) VALUES (?, ?)")
                .bind(spec.app_label)
                .bind(spec.model)
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::Database(format!("Failed to create content type: {}", e)))?;

            sqlx::query(
                r#"
                INSERT OR IGNORE INTO auth_permissions (content_type_id, codename, name)
                SELECT id, ?, ? FROM auth_content_types WHERE app_label = ? AND model = ?
                "#,
            )
            .bind(spec.codename)
            .bind(spec.name)
            .bind(spec.app_label)
            .bind(spec.model)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Database(format!("Failed to create permission: {}", e)))?;
        }

        tx.commit().await?;
        debug!("Synchronised {} permissions", catalog.len());
        Ok(())
    }

    async fn get_permission(
        &self,
        app_label: &str,
        model: &str,
        codename: &str,
    ) -> Result<Option<Permission>, Error> {
        let sql = format!(
            "SELECT {} WHERE ct.app_label = ? AND ct.model = ? AND p.codename = ?",
            PERMISSION_COLUMNS
        );
        sqlx::query_as::<_, Permission>(&sql)
            .bind(app_label)
            .bind(model)
            .bind(codename)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get permission: {}", e)))
    }

    async fn list_permissions_by_codenames(
        &self,
        codenames: &[&str],
    ) -> Result<Vec<Permission>, Error> {
        if codenames.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} WHERE p.codename IN ({}) ORDER BY p.id",
            PERMISSION_COLUMNS,
            placeholders(codenames.len())
        );
        let mut query = sqlx::query_as::<_, Permission>(&sql);
        for c in codenames {
            query = query.bind(*c);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list permissions: {}", e)))
    }

    // Group operations
    async fn create_group(&self, id: Option<i64>, name: &str) -> Result<Group, Error> {
        let result = sqlx::query("INSERT INTO auth_groups (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to create group: {}", e)))?;

        Ok(Group {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    async fn get_group_by_id(&self, id: i64) -> Result<Option<Group>, Error> {
        sqlx::query_as::<_, Group>("SELECT id, name FROM auth_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get group by id: {}", e)))
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>, Error> {
        sqlx::query_as::<_, Group>("SELECT id, name FROM auth_groups WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get group by name: {}", e)))
    }

    async fn list_groups(&self) -> Result<Vec<Group>, Error> {
        sqlx::query_as::<_, Group>("SELECT id, name FROM auth_groups ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list groups: {}", e)))
    }

    async fn any_group_exists(&self, ids: &[i64]) -> Result<bool, Error> {
        if ids.is_empty() {
            return Ok(false);
        }
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM auth_groups WHERE id IN ({}))",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_scalar::<_, bool>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to check groups: {}", e)))
    }

    async fn add_group_permissions(
        &self,
        group_id: i64,
        permission_ids: &[i64],
    ) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        for permission_id in permission_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO auth_group_permissions (group_id, permission_id) VALUES (?, ?)",
            )
            .bind(group_id)
            .bind(*permission_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Database(format!("Failed to add group permission: {}", e)))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_group_permissions(&self, group_id: i64) -> Result<Vec<Permission>, Error> {
        let sql = format!(
            r#"SELECT {} INNER JOIN auth_group_permissions gp ON gp.permission_id = p.id
            WHERE gp.group_id = ? ORDER BY p.id"#,
            PERMISSION_COLUMNS
        );
        sqlx::query_as::<_, Permission>(&sql)
            .bind(group_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list group permissions: {}", e)))
    }

    // User operations
    async fn create_user(&self, user: &User) -> Result<User, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, first_name, last_name, password_hash, is_active, is_superuser, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_superuser)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create user: {}", e)))?;

        let mut created = user.clone();
        created.id = result.last_insert_rowid();
        Ok(created)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, Error> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get user by id: {}", e)))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get user by username: {}", e)))
    }

    async fn update_user(&self, user: &User) -> Result<User, Error> {
        let mut updated_user = user.clone();
        updated_user.updated_at = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, first_name = ?, last_name = ?, password_hash = ?,
            is_active = ?, is_superuser = ?, updated_at = ? WHERE id = ?
            "#,
        )
        .bind(&updated_user.username)
        .bind(&updated_user.first_name)
        .bind(&updated_user.last_name)
        .bind(&updated_user.password_hash)
        .bind(updated_user.is_active)
        .bind(updated_user.is_superuser)
        .bind(updated_user.updated_at)
        .bind(updated_user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to update user: {}", e)))?;

        Ok(updated_user)
    }

    async fn list_users(&self) -> Result<Vec<User>, Error> {
        let sql = format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list users: {}", e)))
    }

    async fn add_user_to_group(&self, user_id: i64, group_id: i64) -> Result<(), Error> {
        sqlx::query("INSERT OR IGNORE INTO auth_user_groups (user_id, group_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(group_id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to add user to group: {}", e)))?;
        Ok(())
    }

    async fn list_user_groups(&self, user_id: i64) -> Result<Vec<Group>, Error> {
        sqlx::query_as::<_, Group>(
            r#"SELECT g.id, g.name FROM auth_groups g
            INNER JOIN auth_user_groups ug ON ug.group_id = g.id
            WHERE ug.user_id = ? ORDER BY g.id"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list user groups: {}", e)))
    }

    async fn list_user_permissions(&self, user_id: i64) -> Result<Vec<Permission>, Error> {
        let sql = format!(
            r#"SELECT DISTINCT {} INNER JOIN auth_group_permissions gp ON gp.permission_id = p.id
            INNER JOIN auth_user_groups ug ON ug.group_id = gp.group_id
            WHERE ug.user_id = ? ORDER BY p.id"#,
            PERMISSION_COLUMNS
        );
        sqlx::query_as::<_, Permission>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list user permissions: {}", e)))
    }

    // Config store operations
    async fn get_config_value(&self, key: &str) -> Result<Option<String>, Error> {
        sqlx::query_scalar::<_, String>("SELECT value FROM config_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get config value: {}", e)))
    }

    async fn set_config_value(&self, key: &str, value: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO config_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to set config value: {}", e)))?;
        Ok(())
    }

    // Assignment operations
    async fn create_assignment(&self, assignment: &Assignment) -> Result<Assignment, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO assignments (name, description, posts, polldescription, status, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&assignment.name)
        .bind(&assignment.description)
        .bind(assignment.posts)
        .bind(&assignment.polldescription)
        .bind(assignment.status)
        .bind(assignment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create assignment: {}", e)))?;

        let mut created = assignment.clone();
        created.id = result.last_insert_rowid();
        Ok(created)
    }

    async fn get_assignment(&self, id: i64) -> Result<Option<Assignment>, Error> {
        let sql = format!("SELECT {} FROM assignments WHERE id = ?", ASSIGNMENT_COLUMNS);
        sqlx::query_as::<_, Assignment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get assignment: {}", e)))
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<Assignment, Error> {
        let mut updated = assignment.clone();
        updated.updated_at = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            UPDATE assignments
            SET name = ?, description = ?, posts = ?, polldescription = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(updated.posts)
        .bind(&updated.polldescription)
        .bind(updated.status)
        .bind(updated.updated_at)
        .bind(updated.id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to update assignment: {}", e)))?;

        Ok(updated)
    }

    async fn delete_assignment(&self, id: i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete assignment: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_assignments(&self) -> Result<Vec<Assignment>, Error> {
        let sql = format!("SELECT {} FROM assignments ORDER BY name", ASSIGNMENT_COLUMNS);
        sqlx::query_as::<_, Assignment>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list assignments: {}", e)))
    }

    // Candidate operations
    async fn add_candidate(&self, assignment_id: i64, user_id: i64) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO assignment_candidates (assignment_id, user_id, elected) VALUES (?, ?, 0)",
        )
        .bind(assignment_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to add candidate: {}", e)))?;
        Ok(())
    }

    async fn remove_candidate(&self, assignment_id: i64, user_id: i64) -> Result<bool, Error> {
        let result =
            sqlx::query("DELETE FROM assignment_candidates WHERE assignment_id = ? AND user_id = ?")
                .bind(assignment_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to remove candidate: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_candidate_elected(
        &self,
        assignment_id: i64,
        user_id: i64,
        elected: bool,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE assignment_candidates SET elected = ? WHERE assignment_id = ? AND user_id = ?",
        )
        .bind(elected)
        .bind(assignment_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to set candidate elected: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_candidates(&self, assignment_id: i64) -> Result<Vec<Candidate>, Error> {
        sqlx::query_as::<_, Candidate>(
            r#"SELECT u.id AS user_id, u.username, u.first_name, u.last_name, c.elected
            FROM assignment_candidates c INNER JOIN users u ON c.user_id = u.id
            WHERE c.assignment_id = ? ORDER BY u.last_name, u.first_name, u.username"#,
        )
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list candidates: {}", e)))
    }

    // Poll operations
    async fn create_poll(
        &self,
        assignment_id: i64,
        yesnoabstain: bool,
        candidate_ids: &[i64],
    ) -> Result<Poll, Error> {
        let mut tx = self.pool.begin().await?;

        let poll = Poll {
            id: 0,
            assignment_id,
            yesnoabstain,
            votesvalid: None,
            votesinvalid: None,
            votescast: None,
            published: false,
            created_at: Utc::now().timestamp_millis(),
        };
        let result = sqlx::query(
            r#"
            INSERT INTO assignment_polls (assignment_id, yesnoabstain, published, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(poll.assignment_id)
        .bind(poll.yesnoabstain)
        .bind(poll.published)
        .bind(poll.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Database(format!("Failed to create poll: {}", e)))?;
        let poll_id = result.last_insert_rowid();

        for candidate_id in candidate_ids {
            sqlx::query("INSERT INTO assignment_options (poll_id, candidate_id) VALUES (?, ?)")
                .bind(poll_id)
                .bind(*candidate_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::Database(format!("Failed to create poll option: {}", e)))?;
        }

        tx.commit().await?;

        Ok(Poll { id: poll_id, ..poll })
    }

    async fn get_poll(&self, id: i64) -> Result<Option<Poll>, Error> {
        let sql = format!("SELECT {} FROM assignment_polls WHERE id = ?", POLL_COLUMNS);
        sqlx::query_as::<_, Poll>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get poll: {}", e)))
    }

    async fn list_polls(&self, assignment_id: i64) -> Result<Vec<Poll>, Error> {
        let sql = format!(
            "SELECT {} FROM assignment_polls WHERE assignment_id = ? ORDER BY id",
            POLL_COLUMNS
        );
        sqlx::query_as::<_, Poll>(&sql)
            .bind(assignment_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list polls: {}", e)))
    }

    async fn update_poll(&self, poll: &Poll) -> Result<Poll, Error> {
        sqlx::query(
            r#"
            UPDATE assignment_polls
            SET votesvalid = ?, votesinvalid = ?, votescast = ?, published = ?
            WHERE id = ?
            "#,
        )
        .bind(poll.votesvalid)
        .bind(poll.votesinvalid)
        .bind(poll.votescast)
        .bind(poll.published)
        .bind(poll.id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to update poll: {}", e)))?;

        Ok(poll.clone())
    }

    async fn delete_poll(&self, id: i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM assignment_polls WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete poll: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_poll_options(&self, poll_id: i64) -> Result<Vec<PollOption>, Error> {
        sqlx::query_as::<_, PollOption>(
            "SELECT id, poll_id, candidate_id FROM assignment_options WHERE poll_id = ? ORDER BY id",
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list poll options: {}", e)))
    }

    async fn set_option_votes(&self, option_id: i64, votes: &[Vote]) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM assignment_votes WHERE option_id = ?")
            .bind(option_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Database(format!("Failed to clear votes: {}", e)))?;

        for vote in votes {
            sqlx::query("INSERT INTO assignment_votes (option_id, value, weight) VALUES (?, ?, ?)")
                .bind(option_id)
                .bind(vote.value)
                .bind(vote.weight)
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::Database(format!("Failed to insert vote: {}", e)))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_poll_votes(&self, poll_id: i64) -> Result<Vec<Vote>, Error> {
        sqlx::query_as::<_, Vote>(
            r#"SELECT v.option_id, v.value, v.weight FROM assignment_votes v
            INNER JOIN assignment_options o ON v.option_id = o.id
            WHERE o.poll_id = ? ORDER BY v.option_id, v.rowid"#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list poll votes: {}", e)))
    }
}
