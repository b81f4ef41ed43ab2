use std::sync::Arc;

use tracing::{info, warn};

use super::{
    dto::CreateAccount,
    repo::AccountRepository,
    repo_types::{Account, NewAccount},
};
use crate::{
    error::AppError,
    repo::RepoError,
};

#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn AccountRepository>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self { repo }
    }

    fn not_found(id: i64) -> AppError {
        AppError::not_found(format!("Account with id {id} not found"))
    }

    pub async fn list_accounts(&self, user_id: i64) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.get_accounts_by_user(user_id).await?)
    }

    pub async fn get_account(&self, id: i64, user_id: i64) -> Result<Account, AppError> {
        match self.repo.get_account_by_id_and_user(id, user_id).await? {
            Some(account) => Ok(account),
            None => {
                warn!(account_id = id, user_id, "account not found for user");
                Err(Self::not_found(id))
            }
        }
    }

    pub async fn add_account(&self, data: CreateAccount, user_id: i64) -> Result<Account, AppError> {
        let new = NewAccount {
            name: data.name,
            number: data.number,
            holder: data.holder,
            value: data.value,
            description: data.description,
            kind: data.kind,
            user_id,
        };
        let account = self.repo.create(&new).await.map_err(|e| match e {
            RepoError::Conflict(_) => {
                AppError::AlreadyExists(format!("Account with number {} already exists", new.number))
            }
            other => other.into(),
        })?;
        info!(account_id = account.id, user_id, "account created");
        Ok(account)
    }

    /// Removes the account together with its transactions.
    pub async fn delete_account(&self, id: i64, user_id: i64) -> Result<(), AppError> {
        self.get_account(id, user_id).await?;
        if !self.repo.delete(id).await? {
            return Err(Self::not_found(id));
        }
        info!(account_id = id, user_id, "account deleted");
        Ok(())
    }
}
