//! User accounts: repository seam, in-memory store and the service rules.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserError {
    #[error("user does not exist")]
    NotFound,

    #[error("user already exists")]
    AlreadyExists,

    #[error("incorrect password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),
}

/// A stored account. Only the salted password digest is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// The public view of an account returned by the API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserView {
    pub email: String,
    pub username: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

pub type RepoFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Storage for accounts, keyed by email.
pub trait UserRepository: Send + Sync {
    fn get_by_email<'a>(&'a self, email: &'a str) -> RepoFuture<'a, Option<User>>;

    /// Inserts or replaces; last write wins.
    fn save(&self, user: User) -> RepoFuture<'_, User>;

    /// Removes and returns the account, if present.
    fn delete<'a>(&'a self, email: &'a str) -> RepoFuture<'a, Option<User>>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl UserRepository for InMemoryUserRepository {
    fn get_by_email<'a>(&'a self, email: &'a str) -> RepoFuture<'a, Option<User>> {
        Box::pin(async move { self.users.read().await.get(email).cloned() })
    }

    fn save(&self, user: User) -> RepoFuture<'_, User> {
        Box::pin(async move {
            self.users
                .write()
                .await
                .insert(user.email.clone(), user.clone());
            user
        })
    }

    fn delete<'a>(&'a self, email: &'a str) -> RepoFuture<'a, Option<User>> {
        Box::pin(async move { self.users.write().await.remove(email) })
    }
}

/// Account rules on top of a [`UserRepository`].
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    salt: String,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, salt: impl Into<String>) -> Self {
        Self {
            repo,
            salt: salt.into(),
        }
    }

    fn hash_password(&self, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(password.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        let candidate = self.hash_password(password);
        candidate.as_bytes().ct_eq(stored_hash.as_bytes()).into()
    }

    /// # Errors
    ///
    /// [`UserError::NotFound`] for an unknown email, [`UserError::InvalidCredentials`]
    /// for a wrong password.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserView, UserError> {
        let user = self
            .repo
            .get_by_email(email.trim())
            .await
            .ok_or(UserError::NotFound)?;
        if !self.verify_password(password, &user.password_hash) {
            tracing::info!(email = %user.email, "login rejected: bad password");
            return Err(UserError::InvalidCredentials);
        }
        Ok(UserView::from(&user))
    }

    /// # Errors
    ///
    /// [`UserError::Validation`] for malformed fields, [`UserError::AlreadyExists`]
    /// if the email is taken.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<UserView, UserError> {
        let email = validate_email(email)?;
        let username = username.trim();
        if username.is_empty() {
            return Err(UserError::Validation("username must not be empty".to_string()));
        }
        validate_password(password)?;

        if self.repo.get_by_email(&email).await.is_some() {
            return Err(UserError::AlreadyExists);
        }

        let user = self
            .repo
            .save(User {
                email,
                username: username.to_string(),
                password_hash: self.hash_password(password),
            })
            .await;
        tracing::info!(email = %user.email, "user registered");
        Ok(UserView::from(&user))
    }

    /// # Errors
    ///
    /// [`UserError::NotFound`] for an unknown email.
    pub async fn delete(&self, email: &str) -> Result<UserView, UserError> {
        let user = self
            .repo
            .delete(email.trim())
            .await
            .ok_or(UserError::NotFound)?;
        tracing::info!(email = %user.email, "user deleted");
        Ok(UserView::from(&user))
    }

    /// # Errors
    ///
    /// [`UserError::Validation`] for an empty password, [`UserError::NotFound`]
    /// for an unknown email.
    pub async fn update_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<UserView, UserError> {
        validate_password(new_password)?;
        let mut user = self
            .repo
            .get_by_email(email.trim())
            .await
            .ok_or(UserError::NotFound)?;
        user.password_hash = self.hash_password(new_password);
        let user = self.repo.save(user).await;
        tracing::info!(email = %user.email, "password updated");
        Ok(UserView::from(&user))
    }
}

fn validate_email(email: &str) -> Result<String, UserError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
            Ok(email.to_string())
        }
        _ => Err(UserError::Validation(format!(
            "'{email}' is not a valid email address"
        ))),
    }
}

fn validate_password(password: &str) -> Result<(), UserError> {
    if password.is_empty() {
        Err(UserError::Validation("password must not be empty".to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryUserRepository::default()), "test-salt")
    }

    #[tokio::test]
    async fn register_then_login() {
        let svc = service();
        let view = svc.register("kim@example.com", "kim", "pw1").await.unwrap();
        assert_eq!(view.username, "kim");
        assert_eq!(svc.login("kim@example.com", "pw1").await.unwrap(), view);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let svc = service();
        svc.register("kim@example.com", "kim", "pw1").await.unwrap();
        assert_eq!(
            svc.register("kim@example.com", "other", "pw2").await,
            Err(UserError::AlreadyExists)
        );
    }

    #[tokio::test]
    async fn login_errors_distinguish_unknown_and_wrong_password() {
        let svc = service();
        assert_eq!(svc.login("nobody@example.com", "x").await, Err(UserError::NotFound));
        svc.register("kim@example.com", "kim", "pw1").await.unwrap();
        assert_eq!(
            svc.login("kim@example.com", "wrong").await,
            Err(UserError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn update_password_replaces_credentials() {
        let svc = service();
        svc.register("kim@example.com", "kim", "old").await.unwrap();
        svc.update_password("kim@example.com", "new").await.unwrap();
        assert_eq!(
            svc.login("kim@example.com", "old").await,
            Err(UserError::InvalidCredentials)
        );
        assert!(svc.login("kim@example.com", "new").await.is_ok());
        assert_eq!(
            svc.update_password("nobody@example.com", "x").await,
            Err(UserError::NotFound)
        );
    }

    #[tokio::test]
    async fn delete_removes_account() {
        let svc = service();
        svc.register("kim@example.com", "kim", "pw").await.unwrap();
        svc.delete("kim@example.com").await.unwrap();
        assert_eq!(svc.delete("kim@example.com").await, Err(UserError::NotFound));
        assert_eq!(svc.login("kim@example.com", "pw").await, Err(UserError::NotFound));
    }

    #[tokio::test]
    async fn invalid_fields_are_validation_errors() {
        let svc = service();
        assert!(matches!(
            svc.register("not-an-email", "kim", "pw").await,
            Err(UserError::Validation(_))
        ));
        assert!(matches!(
            svc.register("kim@example.com", "  ", "pw").await,
            Err(UserError::Validation(_))
        ));
        assert!(matches!(
            svc.register("kim@example.com", "kim", "").await,
            Err(UserError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn password_is_stored_salted_not_plain() {
        let repo = Arc::new(InMemoryUserRepository::default());
        let svc = UserService::new(repo.clone(), "salt-a");
        svc.register("kim@example.com", "kim", "pw").await.unwrap();
        let stored = repo.get_by_email("kim@example.com").await.unwrap();
        assert_ne!(stored.password_hash, "pw");
        assert_eq!(stored.password_hash.len(), 64);

        let other_salt = UserService::new(repo, "salt-b");
        assert_eq!(
            other_salt.login("kim@example.com", "pw").await,
            Err(UserError::InvalidCredentials)
        );
    }
}
