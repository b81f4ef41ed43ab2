use async_trait::async_trait;
use rust_decimal::Decimal;

use super::repo_types::{Transaction, TransactionRecord, TransactionType};
use crate::repo::{PgRepository, RepoError, Repository};

/// Per-user queries on top of the generic CRUD.
#[async_trait]
pub trait TransactionRepository: Repository<Transaction> {
    /// Newest first; ties broken by id so pages are stable.
    async fn get_transactions_by_user_and_type(
        &self,
        user_id: i64,
        kind: TransactionType,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, RepoError>;

    /// `None` both when the row is absent and when another user owns it.
    async fn get_transaction_by_id_and_user(
        &self,
        transaction_id: i64,
        user_id: i64,
    ) -> Result<Option<Transaction>, RepoError> {
        Ok(self
            .get(transaction_id)
            .await?
            .filter(|t| t.user_id == user_id))
    }

    /// Sum of amounts; zero when the user has none of this type.
    async fn get_total_by_type(
        &self,
        user_id: i64,
        kind: TransactionType,
    ) -> Result<Decimal, RepoError>;

    async fn count_by_type(&self, user_id: i64, kind: TransactionType) -> Result<i64, RepoError>;
}

#[async_trait]
impl TransactionRepository for PgRepository<Transaction> {
    async fn get_transactions_by_user_and_type(
        &self,
        user_id: i64,
        kind: TransactionType,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, RepoError> {
        let rows = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT *
            FROM transactions
            WHERE user_id = $1 AND type = $2
            ORDER BY created_at DESC, id DESC
            OFFSET $3
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(skip)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    async fn get_transaction_by_id_and_user(
        &self,
        transaction_id: i64,
        user_id: i64,
    ) -> Result<Option<Transaction>, RepoError> {
        let row = sqlx::query_as::<_, TransactionRecord>(
            "SELECT * FROM transactions WHERE id = $1 AND user_id = $2",
        )
        .bind(transaction_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Transaction::from))
    }

    async fn get_total_by_type(
        &self,
        user_id: i64,
        kind: TransactionType,
    ) -> Result<Decimal, RepoError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE user_id = $1 AND type = $2",
        )
        .bind(user_id)
        .bind(kind)
        .fetch_one(self.pool())
        .await?;
        Ok(total)
    }

    async fn count_by_type(&self, user_id: i64, kind: TransactionType) -> Result<i64, RepoError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM transactions WHERE user_id = $1 AND type = $2",
        )
        .bind(user_id)
        .bind(kind)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }
}
