use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// User model for database storage
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub(in crate::database) password_hash: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub updated_at: i64,
}

impl User {
    /// A user that has not been stored yet. The id is assigned by the database.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: 0,
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: None,
            is_active: true,
            is_superuser: false,
            updated_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn with_name(mut self, first_name: &str, last_name: &str) -> Self {
        self.first_name = first_name.to_string();
        self.last_name = last_name.to_string();
        self
    }

    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }

    pub(crate) fn set_password(&mut self, password: &str) -> Result<(), crate::error::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| crate::error::Error::Server("hash user's password failed".to_string()))?;
        self.password_hash = Some(hash.to_string());
        Ok(())
    }

    /// Verify a password against the stored hash
    pub(crate) fn verify_password(&self, password: &str) -> bool {
        let hash = match self.password_hash.as_ref() {
            Some(h) => h,
            None => return false,
        };
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let mut u = User::new("alice");
        assert!(!u.verify_password("secret"));

        u.set_password("secret").unwrap();
        assert!(u.password_hash.is_some());
        assert!(u.verify_password("secret"));
        assert!(!u.verify_password("Secret"));
    }

    #[test]
    fn test_full_name_falls_back_to_username() {
        let u = User::new("bob");
        assert_eq!(u.full_name(), "bob");
        let u = u.with_name("Bob", "Builder");
        assert_eq!(u.full_name(), "Bob Builder");
        let u = User::new("admin").with_name("", "Administrator");
        assert_eq!(u.full_name(), "Administrator");
    }
}
