use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::{
    auth::{self, AuthKeys},
    db::now_sec,
    entities::user,
    error::{AppError, AppResult},
    models::{Identity, Role, UserStatus, UserSummary},
};

#[derive(Clone)]
pub struct IdentityStore {
    db: DatabaseConnection,
    keys: AuthKeys,
}

pub struct NewAccount<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub display_name: &'a str,
    pub email: &'a str,
}

impl IdentityStore {
    pub fn new(db: DatabaseConnection, keys: AuthKeys) -> Self {
        Self { db, keys }
    }

    /// Creates a `user` account and returns a token for it.
    pub async fn signup(&self, account: NewAccount<'_>) -> AppResult<String> {
        let username = account.username.trim();
        if username.is_empty()
            || account.password.is_empty()
            || account.display_name.trim().is_empty()
            || account.email.trim().is_empty()
        {
            return Err(AppError::validation("All fields are required"));
        }

        self.insert(
            username,
            account.password,
            account.display_name.trim(),
            account.email.trim(),
            Role::User,
        )
            .await?;
        tracing::info!(username = %username, "account created");
        self.keys.issue(username, Role::User)
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<String> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::validation("Username and password are required"));
        }

        let invalid = || AppError::AuthenticationRequired("Invalid credentials".to_string());
        let account = user::Entity::find_by_id(username.trim().to_string())
            .one(&self.db)
            .await?
            .ok_or_else(invalid)?;

        if !auth::verify_password(password, &account.password_hash)? {
            return Err(invalid());
        }

        let identity = to_identity(&account);
        if identity.status == UserStatus::Blocked {
            return Err(AppError::forbidden("This account is blocked by the admin"));
        }

        tracing::debug!(username = %identity.username, "login");
        self.keys.issue(&identity.username, identity.role)
    }

    pub async fn identity(&self, username: &str) -> AppResult<Option<Identity>> {
        let account = user::Entity::find_by_id(username.to_string()).one(&self.db).await?;
        Ok(account.as_ref().map(to_identity))
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserSummary>> {
        let rows = user::Entity::find()
            .order_by_asc(user::Column::Username)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(UserSummary::from).collect())
    }

    /// Creates the configured admin account unless the username is taken.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> AppResult<()> {
        if user::Entity::find_by_id(username.to_string()).one(&self.db).await?.is_some() {
            return Ok(());
        }
        self.insert(username, password, username, "", Role::Admin).await?;
        tracing::info!(username = %username, "bootstrap admin created");
        Ok(())
    }

    async fn insert(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
        email: &str,
        role: Role,
    ) -> AppResult<()> {
        let model = user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(auth::hash_password(password)?),
            display_name: Set(display_name.to_string()),
            email: Set(email.to_string()),
            role: Set(role.as_code().to_string()),
            status: Set(UserStatus::Active.as_code().to_string()),
            created_at: Set(now_sec()),
        };

        match user::Entity::insert(model).exec_without_returning(&self.db).await {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(AppError::conflict("Username already exists"))
            },
            Err(err) => Err(err.into()),
        }
    }
}

fn to_identity(m: &user::Model) -> Identity {
    Identity {
        username: m.username.clone(),
        role: Role::from_code(&m.role).unwrap_or(Role::User),
        status: UserStatus::from_code(&m.status).unwrap_or(UserStatus::Active),
    }
}

pub(crate) fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(err.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) async fn store() -> IdentityStore {
        IdentityStore::new(crate::db::memory().await, AuthKeys::new("test-secret", 60))
    }

    pub(crate) fn account(username: &str) -> NewAccount<'_> {
        NewAccount {
            username,
            password: "password123",
            display_name: "Test User",
            email: "t@example.com",
        }
    }

    #[tokio::test]
    async fn signup_then_login() {
        let store = store().await;
        store.signup(account("alice")).await.unwrap();
        let token = store.login("alice", "password123").await.unwrap();
        assert!(!token.is_empty());

        let identity = store.identity("alice").await.unwrap().unwrap();
        assert_eq!(identity.role, Role::User);
        assert_eq!(identity.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = store().await;
        store.signup(account("alice")).await.unwrap();
        let err = store.signup(account("alice")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_fields_rejected() {
        let store = store().await;
        let err = store
            .signup(NewAccount { username: "bob", password: "", display_name: "Bob", email: "b@x" })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.identity("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthenticated() {
        let store = store().await;
        store.signup(account("alice")).await.unwrap();
        let err = store.login("alice", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::AuthenticationRequired(_)));
        let err = store.login("nobody", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::AuthenticationRequired(_)));
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let store = store().await;
        store.ensure_admin("root", "secret").await.unwrap();
        store.ensure_admin("root", "other").await.unwrap();
        let users = store.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Admin);
        assert!(store.login("root", "secret").await.is_ok());
    }
}
