//! Per-user favorites and battle team.
//!
//! Both lists live in one row per (user, code) with two flags. A row exists
//! only while at least one flag is set.

use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::type_cache::TypeCache;
use crate::core::errors::is_write_conflict;
use crate::core::validation::{
    ensure_max_len, MAX_CODE_LEN, MAX_IMAGE_URL_LEN, MAX_ITEM_NAME_LEN, MSG_TOO_LONG,
};
use crate::core::{ApiError, ApiResult};
use crate::storage::{CollectionRepository, CollectionView, Database, Flag, NewEntry};

pub const MAX_TEAM_SIZE: i64 = 6;

pub const MSG_INCOMPLETE: &str = "Dados incompletos (codigo, nome, imagem são obrigatórios)";
pub const MSG_INVALID_IMAGE_URL: &str = "URL de imagem inválida";
pub const MSG_TEAM_FULL: &str = "Equipe já possui 6 Pokémon!";
pub const MSG_ALREADY_ON_TEAM: &str = "Pokémon já está na equipe";
pub const MSG_NOT_IN_FAVORITES: &str = "Pokémon não encontrado nos favoritos";
pub const MSG_NOT_IN_TEAM: &str = "Pokémon não encontrado na equipe";

/// Body of `POST /user-pokemon/favoritos` and `POST /user-pokemon/equipe`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryRequest {
    pub codigo: Option<String>,
    pub nome: Option<String>,
    pub imagem: Option<String>,
}

/// Trimmed and checked entry fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInput {
    pub code: String,
    pub name: String,
    pub image_url: String,
}

impl EntryInput {
    pub fn validate(req: EntryRequest) -> ApiResult<Self> {
        let (Some(code), Some(name), Some(image_url)) = (req.codigo, req.nome, req.imagem) else {
            return Err(ApiError::bad_request(MSG_INCOMPLETE));
        };
        let (code, name, image_url) = (code.trim(), name.trim(), image_url.trim());
        if code.is_empty() || name.is_empty() || image_url.is_empty() {
            return Err(ApiError::bad_request(MSG_INCOMPLETE));
        }

        ensure_max_len(code, MAX_CODE_LEN, MSG_TOO_LONG)?;
        ensure_max_len(name, MAX_ITEM_NAME_LEN, MSG_TOO_LONG)?;
        ensure_max_len(image_url, MAX_IMAGE_URL_LEN, MSG_TOO_LONG)?;

        if !image_url.starts_with("http") {
            return Err(ApiError::bad_request(MSG_INVALID_IMAGE_URL));
        }

        Ok(Self {
            code: code.to_string(),
            name: name.to_string(),
            image_url: image_url.to_string(),
        })
    }
}

pub struct CollectionService {
    db: Database,
    types: TypeCache,
}

impl CollectionService {
    pub fn new(db: Database, types: TypeCache) -> Self {
        Self { db, types }
    }

    pub async fn list_favorites(&self, user_id: i64) -> ApiResult<Vec<CollectionView>> {
        let mut conn = self.db.pool().acquire().await?;
        Ok(CollectionRepository::list_flagged(&mut conn, user_id, Flag::Favorite).await?)
    }

    pub async fn list_team(&self, user_id: i64) -> ApiResult<Vec<CollectionView>> {
        let mut conn = self.db.pool().acquire().await?;
        Ok(CollectionRepository::list_flagged(&mut conn, user_id, Flag::Team).await?)
    }

    /// Idempotent: favoriting twice leaves a single favorite row, also when
    /// both calls race.
    pub async fn add_favorite(&self, user_id: i64, req: EntryRequest) -> ApiResult<()> {
        let input = EntryInput::validate(req)?;
        let type_name = self.type_name_if_new(user_id, &input.code).await?;

        match self.try_add_favorite(user_id, &input, type_name.as_deref()).await {
            Err(e) if is_write_conflict(&e) => {
                debug!(user_id, code = %input.code, "Concurrent favorite write, retrying: {}", e);
                self.try_add_favorite(user_id, &input, type_name.as_deref()).await?;
            }
            other => other?,
        }

        info!(user_id, code = %input.code, "Favorite added");
        Ok(())
    }

    async fn try_add_favorite(
        &self,
        user_id: i64,
        input: &EntryInput,
        type_name: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.db.pool().begin().await?;
        match CollectionRepository::find(&mut tx, user_id, &input.code).await? {
            Some(entry) => {
                if !entry.is_favorite {
                    CollectionRepository::set_flags(&mut tx, entry.id, true, entry.is_on_team).await?;
                }
            }
            None => {
                let type_id = self.type_id(&mut tx, &input.code, type_name).await?;
                CollectionRepository::insert(&mut tx, &new_entry(user_id, type_id, input, true, false))
                    .await?;
            }
        }
        tx.commit().await
    }

    pub async fn remove_favorite(&self, user_id: i64, code: &str) -> ApiResult<()> {
        let mut tx = self.db.pool().begin().await?;
        let entry = CollectionRepository::find(&mut tx, user_id, code)
            .await?
            .ok_or_else(|| ApiError::not_found(MSG_NOT_IN_FAVORITES))?;

        if entry.is_on_team {
            CollectionRepository::set_flags(&mut tx, entry.id, false, true).await?;
        } else {
            CollectionRepository::delete(&mut tx, entry.id).await?;
        }
        tx.commit().await?;

        info!(user_id, code, "Favorite removed");
        Ok(())
    }

    /// Fails when the team already has six members or already holds `code`.
    pub async fn add_to_team(&self, user_id: i64, req: EntryRequest) -> ApiResult<()> {
        let input = EntryInput::validate(req)?;
        let type_name = self.type_name_if_new(user_id, &input.code).await?;

        let outcome = match self.try_add_to_team(user_id, &input, type_name.as_deref()).await {
            Err(e) if is_write_conflict(&e) => {
                debug!(user_id, code = %input.code, "Concurrent team write, retrying: {}", e);
                self.try_add_to_team(user_id, &input, type_name.as_deref()).await?
            }
            other => other?,
        };

        match outcome {
            TeamAdd::Added => {
                info!(user_id, code = %input.code, "Team member added");
                Ok(())
            }
            TeamAdd::Full => Err(ApiError::bad_request(MSG_TEAM_FULL)),
            TeamAdd::AlreadyOnTeam => Err(ApiError::bad_request(MSG_ALREADY_ON_TEAM)),
        }
    }

    async fn try_add_to_team(
        &self,
        user_id: i64,
        input: &EntryInput,
        type_name: Option<&str>,
    ) -> Result<TeamAdd, sqlx::Error> {
        let mut tx = self.db.pool().begin().await?;
        if CollectionRepository::count_team(&mut tx, user_id).await? >= MAX_TEAM_SIZE {
            return Ok(TeamAdd::Full);
        }

        match CollectionRepository::find(&mut tx, user_id, &input.code).await? {
            Some(entry) if entry.is_on_team => return Ok(TeamAdd::AlreadyOnTeam),
            Some(entry) => {
                CollectionRepository::set_flags(&mut tx, entry.id, entry.is_favorite, true).await?;
            }
            None => {
                let type_id = self.type_id(&mut tx, &input.code, type_name).await?;
                CollectionRepository::insert(&mut tx, &new_entry(user_id, type_id, input, false, true))
                    .await?;
            }
        }
        tx.commit().await?;
        Ok(TeamAdd::Added)
    }

    pub async fn remove_from_team(&self, user_id: i64, code: &str) -> ApiResult<()> {
        let mut tx = self.db.pool().begin().await?;
        let entry = match CollectionRepository::find(&mut tx, user_id, code).await? {
            Some(entry) if entry.is_on_team => entry,
            _ => return Err(ApiError::not_found(MSG_NOT_IN_TEAM)),
        };

        if entry.is_favorite {
            CollectionRepository::set_flags(&mut tx, entry.id, true, false).await?;
        } else {
            CollectionRepository::delete(&mut tx, entry.id).await?;
        }
        tx.commit().await?;

        info!(user_id, code, "Team member removed");
        Ok(())
    }

    /// Looks the type up before any transaction is opened, and only for
    /// codes the user has no row for yet.
    async fn type_name_if_new(&self, user_id: i64, code: &str) -> ApiResult<Option<String>> {
        let exists = {
            let mut conn = self.db.pool().acquire().await?;
            CollectionRepository::find(&mut conn, user_id, code).await?.is_some()
        };
        if exists {
            return Ok(None);
        }
        Ok(Some(self.types.fetch_type_name(code).await))
    }

    /// Local type id for a new row. `type_name` is the name looked up before
    /// the transaction; the catalog is asked again only if there was none.
    async fn type_id(
        &self,
        conn: &mut SqliteConnection,
        code: &str,
        type_name: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let type_name = match type_name {
            Some(name) => name.to_string(),
            None => self.types.fetch_type_name(code).await,
        };
        TypeCache::resolve_type(conn, &type_name).await
    }
}

/// Result of one team insertion attempt.
enum TeamAdd {
    Added,
    Full,
    AlreadyOnTeam,
}

fn new_entry<'a>(
    user_id: i64,
    type_id: i64,
    input: &'a EntryInput,
    is_favorite: bool,
    is_on_team: bool,
) -> NewEntry<'a> {
    NewEntry {
        user_id,
        type_id,
        code: &input.code,
        name: &input.name,
        image_url: &input.image_url,
        is_favorite,
        is_on_team,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::client::{CatalogError, CatalogSource};
    use crate::catalog::types::{Generation, ItemDetail, NamedResource, ResourcePage, Sprites, TypeSlot};
    use crate::config::DatabaseConfig;
    use crate::storage::{memory_db, NewUser, Role, UserRepository};
    use async_trait::async_trait;
    use futures::future::join_all;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    /// Every code is a grass type, except `missingno` which is unreachable.
    struct GrassCatalog;

    #[async_trait]
    impl CatalogSource for GrassCatalog {
        async fn list_page(&self, _: u32, _: u32) -> Result<ResourcePage, CatalogError> {
            Err(CatalogError::Status(500))
        }

        async fn generation(&self, _: u8) -> Result<Generation, CatalogError> {
            Err(CatalogError::Status(500))
        }

        async fn item_detail(&self, code: &str) -> Result<ItemDetail, CatalogError> {
            if code == "missingno" {
                return Err(CatalogError::Status(404));
            }
            Ok(ItemDetail {
                id: 1,
                name: code.to_string(),
                sprites: Sprites::default(),
                types: vec![TypeSlot {
                    kind: NamedResource {
                        name: "grass".to_string(),
                        url: None,
                    },
                }],
            })
        }
    }

    async fn setup() -> (CollectionService, Database, i64) {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let user_id = UserRepository::insert(
            &mut conn,
            &NewUser {
                name: "Ana".to_string(),
                login: "ana".to_string(),
                email: "a@b.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
            },
        )
        .await
        .unwrap();
        drop(conn);

        let service = CollectionService::new(db.clone(), TypeCache::new(Arc::new(GrassCatalog)));
        (service, db, user_id)
    }

    fn entry(code: &str) -> EntryRequest {
        EntryRequest {
            codigo: Some(code.to_string()),
            nome: Some(code.to_uppercase()),
            imagem: Some(format!("https://img.test/{}.png", code)),
        }
    }

    async fn rows(db: &Database, user_id: i64) -> Vec<(String, bool, bool)> {
        let mut conn = db.pool().acquire().await.unwrap();
        CollectionRepository::list_for_user(&mut conn, user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| (e.code, e.is_favorite, e.is_on_team))
            .collect()
    }

    #[test]
    fn test_entry_validation() {
        let mut req = entry("bulbasaur");
        req.imagem = None;
        assert_eq!(
            EntryInput::validate(req).unwrap_err(),
            ApiError::BadRequest(MSG_INCOMPLETE.to_string())
        );

        let mut req = entry("bulbasaur");
        req.imagem = Some("ftp://img.test/1.png".to_string());
        assert_eq!(
            EntryInput::validate(req).unwrap_err(),
            ApiError::BadRequest(MSG_INVALID_IMAGE_URL.to_string())
        );

        let mut req = entry("bulbasaur");
        req.codigo = Some("x".repeat(51));
        assert_eq!(
            EntryInput::validate(req).unwrap_err(),
            ApiError::BadRequest(MSG_TOO_LONG.to_string())
        );

        let mut req = entry("bulbasaur");
        req.nome = Some("  Bulbasaur  ".to_string());
        assert_eq!(EntryInput::validate(req).unwrap().name, "Bulbasaur");
    }

    #[tokio::test]
    async fn test_add_favorite_is_idempotent() {
        let (service, db, user) = setup().await;
        service.add_favorite(user, entry("bulbasaur")).await.unwrap();
        service.add_favorite(user, entry("bulbasaur")).await.unwrap();

        assert_eq!(rows(&db, user).await, vec![("bulbasaur".to_string(), true, false)]);

        let favorites = service.list_favorites(user).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].tipo.as_deref(), Some("Grass"));
        assert_eq!(favorites[0].name, "BULBASAUR");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_favorites_leave_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(&DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("race.db").display()),
            max_connections: 4,
        })
        .await
        .unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let user = UserRepository::insert(
            &mut conn,
            &NewUser {
                name: "Ana".to_string(),
                login: "ana".to_string(),
                email: "a@b.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
            },
        )
        .await
        .unwrap();
        drop(conn);

        let service = Arc::new(CollectionService::new(
            db.clone(),
            TypeCache::new(Arc::new(GrassCatalog)),
        ));
        let calls = (0..3).map(|_| {
            let service = service.clone();
            async move { service.add_favorite(user, entry("ditto")).await }
        });
        for result in join_all(calls).await {
            result.unwrap();
        }

        assert_eq!(rows(&db, user).await, vec![("ditto".to_string(), true, false)]);
        db.pool().close().await;
    }

    #[tokio::test]
    async fn test_unknown_item_gets_normal_type() {
        let (service, _, user) = setup().await;
        service.add_to_team(user, entry("missingno")).await.unwrap();
        let team = service.list_team(user).await.unwrap();
        assert_eq!(team[0].tipo.as_deref(), Some("Normal"));
    }

    #[tokio::test]
    async fn test_team_is_capped_at_six() {
        let (service, _, user) = setup().await;
        for code in ["a1", "a2", "a3", "a4", "a5", "a6"] {
            service.add_to_team(user, entry(code)).await.unwrap();
        }

        let err = service.add_to_team(user, entry("a7")).await.unwrap_err();
        assert_eq!(err, ApiError::BadRequest(MSG_TEAM_FULL.to_string()));
        assert_eq!(service.list_team(user).await.unwrap().len(), 6);

        // A full team also rejects re-adding an existing member with the cap message.
        let err = service.add_to_team(user, entry("a1")).await.unwrap_err();
        assert_eq!(err, ApiError::BadRequest(MSG_TEAM_FULL.to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_team_member_rejected() {
        let (service, _, user) = setup().await;
        service.add_to_team(user, entry("eevee")).await.unwrap();
        assert_eq!(
            service.add_to_team(user, entry("eevee")).await.unwrap_err(),
            ApiError::BadRequest(MSG_ALREADY_ON_TEAM.to_string())
        );
    }

    #[tokio::test]
    async fn test_flags_share_one_row() {
        let (service, db, user) = setup().await;
        service.add_favorite(user, entry("snorlax")).await.unwrap();
        service.add_to_team(user, entry("snorlax")).await.unwrap();
        assert_eq!(rows(&db, user).await, vec![("snorlax".to_string(), true, true)]);

        service.remove_favorite(user, "snorlax").await.unwrap();
        assert_eq!(rows(&db, user).await, vec![("snorlax".to_string(), false, true)]);
        assert!(service.list_favorites(user).await.unwrap().is_empty());

        service.remove_from_team(user, "snorlax").await.unwrap();
        assert!(rows(&db, user).await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_from_team_keeps_favorite() {
        let (service, db, user) = setup().await;
        service.add_to_team(user, entry("mew")).await.unwrap();
        service.add_favorite(user, entry("mew")).await.unwrap();

        service.remove_from_team(user, "mew").await.unwrap();
        assert_eq!(rows(&db, user).await, vec![("mew".to_string(), true, false)]);
    }

    #[tokio::test]
    async fn test_remove_missing_entries() {
        let (service, _, user) = setup().await;
        assert_eq!(
            service.remove_favorite(user, "ghost").await.unwrap_err(),
            ApiError::NotFound(MSG_NOT_IN_FAVORITES.to_string())
        );
        assert_eq!(
            service.remove_from_team(user, "ghost").await.unwrap_err(),
            ApiError::NotFound(MSG_NOT_IN_TEAM.to_string())
        );

        // A favorite that is not on the team is not a team member.
        service.add_favorite(user, entry("pidgey")).await.unwrap();
        assert!(matches!(
            service.remove_from_team(user, "pidgey").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_collections_are_per_user() {
        let (service, db, user) = setup().await;
        service.add_favorite(user, entry("onix")).await.unwrap();
        assert!(service.list_favorites(user + 1).await.unwrap().is_empty());
        assert!(matches!(
            service.remove_favorite(user + 1, "onix").await,
            Err(ApiError::NotFound(_))
        ));
        assert_eq!(rows(&db, user).await.len(), 1);
    }
}
