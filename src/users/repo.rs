use async_trait::async_trait;

use super::repo_types::User;
use crate::repo::{Patch, PgRepository, RepoError, Repository};

/// User-specific lookups and state changes on top of the generic CRUD.
#[async_trait]
pub trait UserRepository: Repository<User> {
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        self.find_one_by("username", username.into()).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        self.find_one_by("email", email.into()).await
    }

    async fn activate_user(&self, user_id: i64) -> Result<Option<User>, RepoError> {
        self.update(user_id, Patch::new().set("is_active", true)).await
    }

    async fn deactivate_user(&self, user_id: i64) -> Result<Option<User>, RepoError> {
        self.update(user_id, Patch::new().set("is_active", false)).await
    }

    async fn verify_user(&self, user_id: i64) -> Result<Option<User>, RepoError> {
        self.update(user_id, Patch::new().set("is_verified", true)).await
    }

    async fn update_password(
        &self,
        user_id: i64,
        hashed_password: &str,
    ) -> Result<Option<User>, RepoError> {
        self.update(user_id, Patch::new().set("hashed_password", hashed_password))
            .await
    }
}

impl UserRepository for PgRepository<User> {}

#[cfg(test)]
impl UserRepository for crate::repo::MemoryRepository<User> {}
