//! User accounts
//!
//! Passwords are stored as Argon2id PHC strings; salt and cost parameters
//! travel inside the string.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use homestay_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    Guest,
    Host,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Guest => "guest",
            UserType::Host => "host",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "guest" => Ok(UserType::Guest),
            "host" => Ok(UserType::Host),
            other => Err(Error::InvalidInput(format!("Unknown user type '{}'", other))),
        }
    }
}

/// Account as seen by the rest of the app (no credentials)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub guid: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
}

/// Signup data
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub password: String,
}

/// Hash a password into a PHC string with a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored PHC string
///
/// An unparsable stored hash never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub(crate) fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("Invalid user guid '{}': {}", guid_str, e)))?;
    let user_type: String = row.get("user_type");

    Ok(User {
        guid,
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        user_type: user_type.parse()?,
    })
}

/// Create an account; duplicate email is `InvalidInput`
pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    let hash = hash_password(&user.password)?;
    let email = user.email.trim().to_lowercase();

    let result = sqlx::query(
        r#"
        INSERT INTO users (guid, email, first_name, last_name, user_type, password_hash)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(guid.to_string())
    .bind(&email)
    .bind(user.first_name.trim())
    .bind(user.last_name.trim())
    .bind(user.user_type.as_str())
    .bind(&hash)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(guid),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            Error::InvalidInput(format!("Email already registered: {}", email)),
        ),
        Err(e) => Err(e.into()),
    }
}

/// Check an email/password pair
pub async fn verify_credentials(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT guid, email, first_name, last_name, user_type, password_hash
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let stored_hash: String = row.get("password_hash");
    if !verify_password(password, &stored_hash) {
        return Ok(None);
    }

    user_from_row(&row).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use homestay_common::db::init_memory_database;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            first_name: "Pat".to_string(),
            last_name: "Host".to_string(),
            user_type: UserType::Host,
            password: "correct horse".to_string(),
        }
    }

    #[test]
    fn test_password_hash_is_salted_argon2() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(verify_password("correct horse", &first));
        assert!(verify_password("correct horse", &second));
        assert!(!verify_password("wrong horse", &first));
    }

    #[test]
    fn test_legacy_or_garbage_hash_never_verifies() {
        // Hex digest without PHC framing
        let digest = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";
        assert!(!verify_password("test", digest));
        assert!(!verify_password("", ""));
    }

    #[tokio::test]
    async fn test_stored_hash_is_phc_string() {
        let pool = init_memory_database().await.unwrap();
        create_user(&pool, &new_user("pat@example.com")).await.unwrap();

        let stored: String = sqlx::query_scalar("SELECT password_hash FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(!stored.contains("correct horse"));
    }

    #[tokio::test]
    async fn test_create_and_verify() {
        let pool = init_memory_database().await.unwrap();
        let guid = create_user(&pool, &new_user("Pat@Example.com")).await.unwrap();

        let user = verify_credentials(&pool, "pat@example.com", "correct horse")
            .await
            .unwrap()
            .expect("credentials should verify");
        assert_eq!(user.guid, guid);
        assert_eq!(user.email, "pat@example.com");
        assert_eq!(user.user_type, UserType::Host);

        assert!(verify_credentials(&pool, "pat@example.com", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(verify_credentials(&pool, "nobody@example.com", "correct horse")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_invalid_input() {
        let pool = init_memory_database().await.unwrap();
        create_user(&pool, &new_user("pat@example.com")).await.unwrap();

        let err = create_user(&pool, &new_user("PAT@example.com")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
