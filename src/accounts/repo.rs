use async_trait::async_trait;

use super::repo_types::Account;
use crate::repo::{PgRepository, RepoError, Repository};

#[async_trait]
pub trait AccountRepository: Repository<Account> {
    async fn get_accounts_by_user(&self, user_id: i64) -> Result<Vec<Account>, RepoError> {
        self.get_by_field("user_id", user_id.into(), false).await
    }

    /// `None` both when the account is absent and when someone else owns it.
    async fn get_account_by_id_and_user(
        &self,
        account_id: i64,
        user_id: i64,
    ) -> Result<Option<Account>, RepoError> {
        Ok(self
            .get(account_id)
            .await?
            .filter(|account| account.user_id == user_id))
    }
}

impl AccountRepository for PgRepository<Account> {}

#[cfg(test)]
impl AccountRepository for crate::repo::MemoryRepository<Account> {}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::accounts::repo_types::{AccountType, NewAccount};
    use crate::repo::MemoryRepository;

    fn new_account(user_id: i64, number: &str) -> NewAccount {
        NewAccount {
            name: "Main".into(),
            number: number.into(),
            holder: "Holder".into(),
            value: Decimal::new(10000, 2),
            description: None,
            kind: AccountType::Debit,
            user_id,
        }
    }

    #[tokio::test]
    async fn listing_only_returns_the_owners_accounts() {
        let repo = MemoryRepository::<Account>::new();
        repo.create(&new_account(1, "0001")).await.unwrap();
        repo.create(&new_account(1, "0002")).await.unwrap();
        repo.create(&new_account(2, "0001")).await.unwrap();

        assert_eq!(repo.get_accounts_by_user(1).await.unwrap().len(), 2);
        assert_eq!(repo.get_accounts_by_user(2).await.unwrap().len(), 1);
        assert!(repo.get_accounts_by_user(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookup_by_id_respects_the_owner() {
        let repo = MemoryRepository::<Account>::new();
        let account = repo.create(&new_account(1, "0001")).await.unwrap();

        assert!(repo
            .get_account_by_id_and_user(account.id, 1)
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .get_account_by_id_and_user(account.id, 2)
            .await
            .unwrap()
            .is_none());
        assert!(repo.get_account_by_id_and_user(99, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn number_is_unique_per_user() {
        let repo = MemoryRepository::<Account>::new();
        repo.create(&new_account(1, "0001")).await.unwrap();
        let err = repo.create(&new_account(1, "0001")).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
    }
}
