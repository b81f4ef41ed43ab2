use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{
    dto::{CreateTransaction, TransactionSummary, UpdateTransaction},
    repo::TransactionRepository,
    repo_types::{NewTransaction, Transaction, TransactionType},
};
use crate::{
    accounts::repo::AccountRepository,
    error::AppError,
    repo::Patch,
};

#[derive(Clone)]
pub struct TransactionService {
    repo: Arc<dyn TransactionRepository>,
    accounts: Arc<dyn AccountRepository>,
}

impl TransactionService {
    pub fn new(
        repo: Arc<dyn TransactionRepository>,
        accounts: Arc<dyn AccountRepository>,
    ) -> Self {
        Self { repo, accounts }
    }

    /// Same message whether the row is missing or owned by someone else.
    fn not_found(id: i64) -> AppError {
        AppError::not_found(format!("Transaction with id {id} not found"))
    }

    pub async fn get_transactions(
        &self,
        user_id: i64,
        kind: TransactionType,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, AppError> {
        Ok(self
            .repo
            .get_transactions_by_user_and_type(user_id, kind, skip, limit)
            .await?)
    }

    pub async fn get_transaction(&self, id: i64, user_id: i64) -> Result<Transaction, AppError> {
        match self.repo.get_transaction_by_id_and_user(id, user_id).await? {
            Some(t) => Ok(t),
            None => {
                warn!(transaction_id = id, user_id, "transaction not found for user");
                Err(Self::not_found(id))
            }
        }
    }

    /// The owner always comes from the caller, never from `data`.
    pub async fn add_transaction(
        &self,
        data: CreateTransaction,
        user_id: i64,
    ) -> Result<Transaction, AppError> {
        if let Some(account_id) = data.account_id {
            if self
                .accounts
                .get_account_by_id_and_user(account_id, user_id)
                .await?
                .is_none()
            {
                warn!(account_id, user_id, "transaction names a foreign or missing account");
                return Err(AppError::not_found(format!(
                    "Account with id {account_id} not found"
                )));
            }
        }

        let new = NewTransaction {
            amount: data.amount.value(),
            description: data.description,
            kind: data.kind,
            user_id,
            account_id: data.account_id,
        };
        let t = self.repo.create(&new).await?;
        info!(transaction_id = t.id, user_id, kind = %t.kind, "transaction created");
        Ok(t)
    }

    pub async fn update_transaction(
        &self,
        id: i64,
        data: UpdateTransaction,
        user_id: i64,
    ) -> Result<Transaction, AppError> {
        let current = self.get_transaction(id, user_id).await?;

        let mut patch = Patch::new().set_if("amount", data.amount.map(Decimal::from));
        if let Some(description) = data.description {
            patch = patch.set("description", description);
        }
        if patch.is_empty() {
            return Ok(current);
        }

        let t = self
            .repo
            .update(id, patch)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        info!(transaction_id = id, user_id, "transaction updated");
        Ok(t)
    }

    pub async fn delete_transaction(&self, id: i64, user_id: i64) -> Result<(), AppError> {
        self.get_transaction(id, user_id).await?;
        if !self.repo.delete(id).await? {
            return Err(Self::not_found(id));
        }
        info!(transaction_id = id, user_id, "transaction deleted");
        Ok(())
    }

    pub async fn total_by_type(
        &self,
        user_id: i64,
        kind: TransactionType,
    ) -> Result<Decimal, AppError> {
        Ok(self.repo.get_total_by_type(user_id, kind).await?)
    }

    /// Incomes minus expenses.
    pub async fn balance(&self, user_id: i64) -> Result<Decimal, AppError> {
        let incomes = self.total_by_type(user_id, TransactionType::Income).await?;
        let expenses = self.total_by_type(user_id, TransactionType::Expense).await?;
        Ok(incomes - expenses)
    }

    pub async fn summary(&self, user_id: i64) -> Result<TransactionSummary, AppError> {
        let total_expenses = self.total_by_type(user_id, TransactionType::Expense).await?;
        let total_incomes = self.total_by_type(user_id, TransactionType::Income).await?;
        let expense_count = self.repo.count_by_type(user_id, TransactionType::Expense).await?;
        let income_count = self.repo.count_by_type(user_id, TransactionType::Income).await?;
        Ok(TransactionSummary {
            total_expenses,
            total_incomes,
            balance: total_incomes - total_expenses,
            expense_count,
            income_count,
        })
    }
}
