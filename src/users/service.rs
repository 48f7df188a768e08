//! Account management: listing, profile reads and edits, deletion, and the
//! startup admin bootstrap.

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use crate::auth::access::Caller;
use crate::auth::core::PasswordService;
use crate::auth::service::{unique_to_conflict, MSG_EMAIL_TAKEN, MSG_USER_NOT_FOUND};
use crate::auth::types::{UpdateUserRequest, UpdatedUser, UserDetails, UserSummary, UserView};
use crate::config::{BootstrapConfig, DEFAULT_ADMIN_PASSWORD};
use crate::core::validation::{self, ensure_max_len, MAX_EMAIL_LEN, MAX_NAME_LEN, MSG_TOO_LONG};
use crate::core::{ApiError, ApiResult};
use crate::storage::{Database, NewUser, Role, UserRepository};

pub const MSG_INVALID_NAME: &str = "Nome inválido";
pub const MSG_INVALID_ROLE: &str = "Role inválido";
pub const MSG_DELETE_SELF: &str = "Você não pode deletar seu próprio usuário.";

pub struct UserAdminService {
    db: Database,
}

impl UserAdminService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Admin only. Full view of every account.
    pub async fn list_users(&self, caller: &Caller) -> ApiResult<Vec<UserDetails>> {
        caller.require_admin()?;
        let mut conn = self.db.pool().acquire().await?;
        let users = UserRepository::list(&mut conn).await?;
        Ok(users.iter().map(UserDetails::from).collect())
    }

    /// Self or admin. Non-admins get the reduced view.
    pub async fn get_user(&self, caller: &Caller, id: i64) -> ApiResult<UserView> {
        caller.require_self_or_admin(id)?;
        let mut conn = self.db.pool().acquire().await?;
        let user = UserRepository::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| ApiError::not_found(MSG_USER_NOT_FOUND))?;

        if caller.is_admin() {
            Ok(UserView::Full(UserDetails::from(&user)))
        } else {
            Ok(UserView::Reduced(UserSummary::from(&user)))
        }
    }

    /// Self or admin. `role` is only honoured for admin callers.
    pub async fn update_user(
        &self,
        caller: &Caller,
        id: i64,
        req: UpdateUserRequest,
    ) -> ApiResult<UpdatedUser> {
        caller.require_self_or_admin(id)?;

        let name = match req.nome {
            Some(raw) => {
                let name = raw.trim().to_string();
                if name.is_empty() {
                    return Err(ApiError::bad_request(MSG_INVALID_NAME));
                }
                ensure_max_len(&name, MAX_NAME_LEN, MSG_TOO_LONG)?;
                Some(name)
            }
            None => None,
        };

        let email = match req.email {
            Some(raw) => {
                let email = validation::normalize_identifier(&raw);
                ensure_max_len(&email, MAX_EMAIL_LEN, MSG_TOO_LONG)?;
                validation::validate_email(&email)?;
                Some(email)
            }
            None => None,
        };

        let role = match req.role {
            Some(raw) if caller.is_admin() => Some(
                raw.parse::<Role>()
                    .map_err(|_| ApiError::bad_request(MSG_INVALID_ROLE))?,
            ),
            _ => None,
        };

        let mut tx = self.db.pool().begin().await?;
        let mut user = UserRepository::find_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| ApiError::not_found(MSG_USER_NOT_FOUND))?;

        if let Some(email) = email {
            if let Some(other) = UserRepository::find_by_email(&mut tx, &email).await? {
                if other.id != user.id {
                    return Err(ApiError::conflict(MSG_EMAIL_TAKEN));
                }
            }
            user.email = email;
        }
        if let Some(name) = name {
            user.name = name;
        }
        if let Some(role) = role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        UserRepository::update_profile(&mut tx, &user)
            .await
            .map_err(unique_to_conflict)?;
        tx.commit().await?;

        info!(user_id = user.id, by = caller.id, "User updated");
        Ok(UpdatedUser {
            id: user.id,
            nome: user.name,
            login: user.login,
            email: user.email,
            role: caller.is_admin().then_some(user.role),
        })
    }

    /// Admin only, never the caller's own account. Collection rows go with
    /// the user.
    pub async fn delete_user(&self, caller: &Caller, id: i64) -> ApiResult<()> {
        caller.require_admin()?;
        if id == caller.id {
            return Err(ApiError::bad_request(MSG_DELETE_SELF));
        }

        let mut tx = self.db.pool().begin().await?;
        if !UserRepository::delete(&mut tx, id).await? {
            return Err(ApiError::not_found(MSG_USER_NOT_FOUND));
        }
        tx.commit().await?;

        info!(user_id = id, by = caller.id, "User deleted");
        Ok(())
    }

    /// Makes sure some account holds the admin role.
    ///
    /// With no admin in the store, the configured login is promoted back if it
    /// still exists, otherwise it is created. Returns the id of the account
    /// that became admin, if any.
    pub async fn ensure_admin(
        &self,
        passwords: &PasswordService,
        config: &BootstrapConfig,
    ) -> anyhow::Result<Option<i64>> {
        if !config.enabled {
            return Ok(None);
        }

        let login = validation::normalize_identifier(&config.admin_login);
        let email = validation::normalize_identifier(&config.admin_email);

        let mut tx = self.db.pool().begin().await?;
        if UserRepository::exists_with_role(&mut tx, Role::Admin).await? {
            return Ok(None);
        }

        if let Some(mut existing) = UserRepository::find_by_login(&mut tx, &login).await? {
            existing.role = Role::Admin;
            existing.updated_at = Utc::now();
            UserRepository::update_profile(&mut tx, &existing)
                .await
                .context("Failed to promote bootstrap admin")?;
            tx.commit().await?;

            warn!(user_id = existing.id, login = %login, "No admin left, bootstrap login promoted back to admin");
            return Ok(Some(existing.id));
        }

        if UserRepository::find_by_email(&mut tx, &email).await?.is_some() {
            warn!(email = %email, "No admin exists and the bootstrap email belongs to another account, skipping bootstrap");
            return Ok(None);
        }

        let password_hash = passwords
            .hash_password(&config.admin_password)
            .context("Failed to hash bootstrap admin password")?;
        let admin = NewUser {
            name: config.admin_name.trim().to_string(),
            login,
            email,
            password_hash,
            role: Role::Admin,
        };
        let id = UserRepository::insert(&mut tx, &admin)
            .await
            .context("Failed to create bootstrap admin")?;
        tx.commit().await?;

        info!(user_id = id, login = %admin.login, "Bootstrap admin created");
        if config.admin_password == DEFAULT_ADMIN_PASSWORD {
            warn!("Bootstrap admin uses the built-in password; set ADMIN_PASSWORD and change it");
        }
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::core::password_service::fast_config;
    use crate::storage::memory_db;
    use pretty_assertions::assert_eq;

    struct Fixture {
        service: UserAdminService,
        db: Database,
        admin: Caller,
        ana: Caller,
        bia: Caller,
    }

    async fn insert(db: &Database, login: &str, role: Role) -> i64 {
        let mut conn = db.pool().acquire().await.unwrap();
        UserRepository::insert(
            &mut conn,
            &NewUser {
                name: login.to_uppercase(),
                login: login.to_string(),
                email: format!("{}@poke.dex", login),
                password_hash: "hash".to_string(),
                role,
            },
        )
        .await
        .unwrap()
    }

    async fn fixture() -> Fixture {
        let db = memory_db().await;
        let admin = insert(&db, "root", Role::Admin).await;
        let ana = insert(&db, "ana", Role::User).await;
        let bia = insert(&db, "bia", Role::User).await;
        Fixture {
            service: UserAdminService::new(db.clone()),
            db,
            admin: Caller { id: admin, role: Some(Role::Admin) },
            ana: Caller { id: ana, role: Some(Role::User) },
            bia: Caller { id: bia, role: Some(Role::User) },
        }
    }

    #[tokio::test]
    async fn test_list_users_is_admin_only() {
        let f = fixture().await;
        assert_eq!(f.service.list_users(&f.admin).await.unwrap().len(), 3);
        assert!(matches!(
            f.service.list_users(&f.ana).await,
            Err(ApiError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_get_user_views() {
        let f = fixture().await;

        let own = f.service.get_user(&f.ana, f.ana.id).await.unwrap();
        assert!(matches!(own, UserView::Reduced(_)));

        let as_admin = f.service.get_user(&f.admin, f.ana.id).await.unwrap();
        assert!(matches!(as_admin, UserView::Full(_)));

        assert!(matches!(
            f.service.get_user(&f.ana, f.bia.id).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.get_user(&f.admin, 999).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_user_cannot_promote_self() {
        let f = fixture().await;
        let req = UpdateUserRequest {
            nome: Some("  Ana Maria ".to_string()),
            email: None,
            role: Some("admin".to_string()),
        };
        let updated = f.service.update_user(&f.ana, f.ana.id, req).await.unwrap();
        assert_eq!(updated.nome, "Ana Maria");
        assert_eq!(updated.role, None);

        let mut conn = f.db.pool().acquire().await.unwrap();
        let stored = UserRepository::find_by_id(&mut conn, f.ana.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::User);
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn test_admin_updates_role_and_email() {
        let f = fixture().await;
        let req = UpdateUserRequest {
            nome: None,
            email: Some("ANA@New.com".to_string()),
            role: Some("admin".to_string()),
        };
        let updated = f.service.update_user(&f.admin, f.ana.id, req).await.unwrap();
        assert_eq!(updated.email, "ana@new.com");
        assert_eq!(updated.role, Some(Role::Admin));

        let bad_role = UpdateUserRequest {
            role: Some("superuser".to_string()),
            ..Default::default()
        };
        assert_eq!(
            f.service.update_user(&f.admin, f.ana.id, bad_role).await.unwrap_err(),
            ApiError::BadRequest(MSG_INVALID_ROLE.to_string())
        );
    }

    #[tokio::test]
    async fn test_update_email_conflict() {
        let f = fixture().await;
        let req = UpdateUserRequest {
            email: Some("bia@poke.dex".to_string()),
            ..Default::default()
        };
        assert_eq!(
            f.service.update_user(&f.ana, f.ana.id, req).await.unwrap_err(),
            ApiError::Conflict(MSG_EMAIL_TAKEN.to_string())
        );

        // Keeping one's own email is not a conflict.
        let req = UpdateUserRequest {
            email: Some("ana@poke.dex".to_string()),
            ..Default::default()
        };
        assert!(f.service.update_user(&f.ana, f.ana.id, req).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let f = fixture().await;
        assert_eq!(
            f.service.delete_user(&f.admin, f.admin.id).await.unwrap_err(),
            ApiError::BadRequest(MSG_DELETE_SELF.to_string())
        );
        assert!(matches!(
            f.service.delete_user(&f.ana, f.bia.id).await,
            Err(ApiError::Forbidden(_))
        ));

        f.service.delete_user(&f.admin, f.bia.id).await.unwrap();
        assert!(matches!(
            f.service.delete_user(&f.admin, f.bia.id).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_admin_runs_once() {
        let db = memory_db().await;
        let service = UserAdminService::new(db.clone());
        let passwords = PasswordService::new(&fast_config()).unwrap();
        let config = BootstrapConfig::default();

        let created = service.ensure_admin(&passwords, &config).await.unwrap();
        assert!(created.is_some());
        assert_eq!(service.ensure_admin(&passwords, &config).await.unwrap(), None);

        let mut conn = db.pool().acquire().await.unwrap();
        let admin = UserRepository::find_by_login(&mut conn, "admin").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(passwords.verify_password(DEFAULT_ADMIN_PASSWORD, &admin.password_hash));
    }

    #[tokio::test]
    async fn test_ensure_admin_after_self_demotion() {
        let db = memory_db().await;
        let service = UserAdminService::new(db.clone());
        let passwords = PasswordService::new(&fast_config()).unwrap();
        let config = BootstrapConfig::default();

        let admin_id = service.ensure_admin(&passwords, &config).await.unwrap().unwrap();
        let admin = Caller { id: admin_id, role: Some(Role::Admin) };
        let demote = UpdateUserRequest {
            role: Some("user".to_string()),
            ..Default::default()
        };
        service.update_user(&admin, admin_id, demote).await.unwrap();

        // Next startup: the same account is promoted again, nothing is inserted.
        assert_eq!(service.ensure_admin(&passwords, &config).await.unwrap(), Some(admin_id));

        let mut conn = db.pool().acquire().await.unwrap();
        let users = UserRepository::list(&mut conn).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Admin);
    }

    #[tokio::test]
    async fn test_ensure_admin_skips_when_email_taken() {
        let db = memory_db().await;
        insert(&db, "someone", Role::User).await;
        let service = UserAdminService::new(db.clone());
        let passwords = PasswordService::new(&fast_config()).unwrap();
        let config = BootstrapConfig {
            admin_email: "someone@poke.dex".to_string(),
            ..Default::default()
        };

        assert_eq!(service.ensure_admin(&passwords, &config).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ensure_admin_disabled() {
        let db = memory_db().await;
        let service = UserAdminService::new(db);
        let passwords = PasswordService::new(&fast_config()).unwrap();
        let config = BootstrapConfig {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(service.ensure_admin(&passwords, &config).await.unwrap(), None);
    }
}
