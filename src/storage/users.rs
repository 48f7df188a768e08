//! `users` table access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};
use std::fmt;
use std::str::FromStr;

/// Account role. New accounts are always `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Full row from the `users` table.
///
/// Holds the password hash: never serialize it into a response, map it to a
/// view type first.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload. `login` and `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

const USER_COLUMNS: &str =
    "id, name, login, email, password_hash, role, created_at, updated_at";

pub struct UserRepository;

impl UserRepository {
    pub async fn insert(conn: &mut SqliteConnection, user: &NewUser) -> Result<i64, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (name, login, email, password_hash, role, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.name)
        .bind(&user.login)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(now)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Exact match on the stored (lowercase) login.
    pub async fn find_by_login(
        conn: &mut SqliteConnection,
        login: &str,
    ) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE login = ?",
            USER_COLUMNS
        ))
        .bind(login)
        .fetch_optional(conn)
        .await
    }

    pub async fn find_by_email(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(conn)
        .await
    }

    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
            .fetch_all(conn)
            .await
    }

    pub async fn exists_with_role(conn: &mut SqliteConnection, role: Role) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role)
            .fetch_one(conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn update_password(
        conn: &mut SqliteConnection,
        id: i64,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Writes the mutable profile fields of `user` back and bumps `updated_at`.
    pub async fn update_profile(conn: &mut SqliteConnection, user: &UserRecord) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET name = ?, email = ?, role = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
