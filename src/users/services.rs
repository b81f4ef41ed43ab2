use std::sync::Arc;

use tracing::{info, warn};

use super::{
    dto::RegisterRequest,
    repo::UserRepository,
    repo_types::{NewUser, User},
};
use crate::{
    auth::password::hash_password_blocking,
    error::AppError,
    repo::RepoError,
};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User, AppError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User with id {id} not found")))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User, AppError> {
        self.repo
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User with username {username} not found")))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User, AppError> {
        self.repo
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User with email {email} not found")))
    }

    /// Expects a request already passed through [`RegisterRequest::validate`].
    ///
    /// The pre-checks give friendly messages; the store's unique constraints
    /// still decide a concurrent duplicate.
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AppError> {
        if self.repo.get_by_email(&req.email).await?.is_some() {
            warn!(email = %req.email, "email already registered");
            return Err(AppError::AlreadyExists(format!(
                "User with email {} already exists",
                req.email
            )));
        }
        if self.repo.get_by_username(&req.username).await?.is_some() {
            warn!(username = %req.username, "username already taken");
            return Err(AppError::AlreadyExists(format!(
                "User with username {} already exists",
                req.username
            )));
        }

        let hashed_password = hash_password_blocking(req.password).await?;
        let new_user = NewUser {
            first_name: req.first_name,
            last_name: req.last_name,
            username: req.username,
            email: req.email,
            hashed_password,
        };

        let user = self.repo.create(&new_user).await.map_err(|e| match e {
            RepoError::Conflict(constraint) => {
                warn!(%constraint, "registration lost a uniqueness race");
                AppError::AlreadyExists(format!(
                    "User with email {} or username {} already exists",
                    new_user.email, new_user.username
                ))
            }
            other => other.into(),
        })?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub async fn activate(&self, id: i64) -> Result<User, AppError> {
        Self::vanished(id, self.repo.activate_user(id).await?)
    }

    pub async fn deactivate(&self, id: i64) -> Result<User, AppError> {
        Self::vanished(id, self.repo.deactivate_user(id).await?)
    }

    pub async fn verify(&self, id: i64) -> Result<User, AppError> {
        Self::vanished(id, self.repo.verify_user(id).await?)
    }

    pub async fn update_password(&self, id: i64, hashed_password: &str) -> Result<User, AppError> {
        Self::vanished(id, self.repo.update_password(id, hashed_password).await?)
    }

    fn vanished(id: i64, user: Option<User>) -> Result<User, AppError> {
        user.ok_or_else(|| AppError::not_found(format!("User with id {id} not found")))
    }
}
