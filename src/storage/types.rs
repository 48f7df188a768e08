//! `catalog_types` table access.

use sqlx::SqliteConnection;

pub struct CatalogTypeRepository;

impl CatalogTypeRepository {
    pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM catalog_types WHERE name = ?")
            .bind(name)
            .fetch_optional(conn)
            .await
    }

    /// Returns the id for `name`, inserting the row on first sight.
    ///
    /// A concurrent insert of the same name is absorbed by the UNIQUE
    /// constraint (`ON CONFLICT DO NOTHING`) and the winner's id is returned.
    pub async fn get_or_create(conn: &mut SqliteConnection, name: &str) -> Result<i64, sqlx::Error> {
        if let Some(id) = Self::find_by_name(&mut *conn, name).await? {
            return Ok(id);
        }

        sqlx::query("INSERT INTO catalog_types (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&mut *conn)
            .await?;

        sqlx::query_scalar::<_, i64>("SELECT id FROM catalog_types WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await
    }
}
