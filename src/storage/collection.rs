//! `user_collection` table access.

use serde::Serialize;
use sqlx::{FromRow, SqliteConnection};

/// One row: a user's relationship to a single catalog item.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CollectionEntry {
    pub id: i64,
    pub user_id: i64,
    pub type_id: i64,
    pub code: String,
    pub name: String,
    pub image_url: Option<String>,
    pub is_favorite: bool,
    pub is_on_team: bool,
}

/// Entry joined with its type name. `tipo` is `None` when the type row is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CollectionView {
    pub id: i64,
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "imagem")]
    pub image_url: Option<String>,
    pub tipo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEntry<'a> {
    pub user_id: i64,
    pub type_id: i64,
    pub code: &'a str,
    pub name: &'a str,
    pub image_url: &'a str,
    pub is_favorite: bool,
    pub is_on_team: bool,
}

/// Which flag a listing filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Favorite,
    Team,
}

impl Flag {
    fn column(self) -> &'static str {
        match self {
            Flag::Favorite => "is_favorite",
            Flag::Team => "is_on_team",
        }
    }
}

pub struct CollectionRepository;

impl CollectionRepository {
    pub async fn find(
        conn: &mut SqliteConnection,
        user_id: i64,
        code: &str,
    ) -> Result<Option<CollectionEntry>, sqlx::Error> {
        sqlx::query_as::<_, CollectionEntry>(
            "SELECT id, user_id, type_id, code, name, image_url, is_favorite, is_on_team \
             FROM user_collection WHERE user_id = ? AND code = ?",
        )
        .bind(user_id)
        .bind(code)
        .fetch_optional(conn)
        .await
    }

    /// All entries of a user, both flags included.
    pub async fn list_for_user(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<Vec<CollectionEntry>, sqlx::Error> {
        sqlx::query_as::<_, CollectionEntry>(
            "SELECT id, user_id, type_id, code, name, image_url, is_favorite, is_on_team \
             FROM user_collection WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
    }

    pub async fn list_flagged(
        conn: &mut SqliteConnection,
        user_id: i64,
        flag: Flag,
    ) -> Result<Vec<CollectionView>, sqlx::Error> {
        let sql = format!(
            "SELECT c.id, c.code, c.name, c.image_url, t.name AS tipo \
             FROM user_collection c LEFT JOIN catalog_types t ON t.id = c.type_id \
             WHERE c.user_id = ? AND c.{} = 1 ORDER BY c.id",
            flag.column()
        );
        sqlx::query_as::<_, CollectionView>(&sql)
            .bind(user_id)
            .fetch_all(conn)
            .await
    }

    pub async fn count_team(conn: &mut SqliteConnection, user_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_collection WHERE user_id = ? AND is_on_team = 1",
        )
        .bind(user_id)
        .fetch_one(conn)
        .await
    }

    pub async fn insert(conn: &mut SqliteConnection, entry: &NewEntry<'_>) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO user_collection (user_id, type_id, code, name, image_url, is_favorite, is_on_team) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.user_id)
        .bind(entry.type_id)
        .bind(entry.code)
        .bind(entry.name)
        .bind(entry.image_url)
        .bind(entry.is_favorite)
        .bind(entry.is_on_team)
        .execute(conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn set_flags(
        conn: &mut SqliteConnection,
        id: i64,
        is_favorite: bool,
        is_on_team: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE user_collection SET is_favorite = ?, is_on_team = ? WHERE id = ?")
            .bind(is_favorite)
            .bind(is_on_team)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM user_collection WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
