use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{Columns, Entity, FieldValue, Patch, Record, RepoError, Repository};

/// Postgres-backed repository, one instance per entity type.
pub struct PgRepository<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> PgRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub(crate) fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: FieldValue) {
    match value {
        FieldValue::Int(v) => {
            qb.push_bind(v);
        }
        FieldValue::Text(v) => {
            qb.push_bind(v);
        }
        FieldValue::Bool(v) => {
            qb.push_bind(v);
        }
        FieldValue::Decimal(v) => {
            qb.push_bind(v);
        }
        FieldValue::Enum(type_name, label) => {
            qb.push_bind(label).push("::").push(type_name);
        }
        FieldValue::Timestamp(v) => {
            qb.push_bind(v);
        }
    }
}

/// Maps a unique violation (SQLSTATE 23505) to [`RepoError::Conflict`].
pub(crate) fn classify(err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") {
            let constraint = db.constraint().unwrap_or("unique").to_string();
            return RepoError::Conflict(constraint);
        }
    }
    RepoError::Database(err)
}

fn check_column<R: Record>(name: &str) -> Result<(), RepoError> {
    if R::has_column(name) {
        Ok(())
    } else {
        Err(RepoError::UnknownField(name.to_string()))
    }
}

fn insert_statement<R: Record>(
    columns: Columns,
) -> Result<QueryBuilder<'static, Postgres>, RepoError> {
    for (name, _) in &columns {
        check_column::<R>(name)?;
    }

    let mut qb = QueryBuilder::new(format!("INSERT INTO {} (", R::TABLE));
    let names: Vec<&str> = columns.iter().map(|(c, _)| *c).collect();
    qb.push(names.join(", "));
    qb.push(") VALUES (");
    for (i, (_, value)) in columns.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_value(&mut qb, value);
    }
    qb.push(") RETURNING *");
    Ok(qb)
}

/// `patch` must not be empty.
fn update_statement<R: Record>(
    id: i64,
    patch: Patch,
) -> Result<QueryBuilder<'static, Postgres>, RepoError> {
    for (name, _) in patch.columns() {
        check_column::<R>(name)?;
    }

    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", R::TABLE));
    for (i, (name, value)) in patch.into_columns().into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(name).push(" = ");
        push_value(&mut qb, value);
    }
    if R::TIMESTAMPS {
        qb.push(", updated_at = now()");
    }
    qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");
    Ok(qb)
}

fn select_by_field_statement<R: Record>(
    field: &str,
    value: FieldValue,
    single: bool,
) -> Result<QueryBuilder<'static, Postgres>, RepoError> {
    check_column::<R>(field)?;

    let mut qb = QueryBuilder::new(format!("SELECT * FROM {} WHERE {} = ", R::TABLE, field));
    push_value(&mut qb, value);
    qb.push(" ORDER BY id");
    if single {
        qb.push(" LIMIT 1");
    }
    Ok(qb)
}

#[async_trait]
impl<E: Entity> Repository<E> for PgRepository<E> {
    async fn get(&self, id: i64) -> Result<Option<E>, RepoError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", E::Record::TABLE);
        let row = sqlx::query_as::<_, E::Record>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(E::from))
    }

    async fn create(&self, new: &E::New) -> Result<E, RepoError> {
        let mut qb = insert_statement::<E::Record>(E::insert_columns(new))?;

        let mut tx = self.pool.begin().await?;
        let record = qb
            .build_query_as::<E::Record>()
            .fetch_one(&mut *tx)
            .await
            .map_err(classify)?;
        tx.commit().await?;

        debug!(table = E::Record::TABLE, id = record.id(), "row inserted");
        Ok(E::from(record))
    }

    async fn update(&self, id: i64, patch: Patch) -> Result<Option<E>, RepoError> {
        if patch.is_empty() {
            return self.get(id).await;
        }
        let mut qb = update_statement::<E::Record>(id, patch)?;

        let mut tx = self.pool.begin().await?;
        let record = qb
            .build_query_as::<E::Record>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(classify)?;
        tx.commit().await?;

        Ok(record.map(E::from))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", E::Record::TABLE);
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_by_field(
        &self,
        field: &str,
        value: FieldValue,
        single: bool,
    ) -> Result<Vec<E>, RepoError> {
        let mut qb = select_by_field_statement::<E::Record>(field, value, single)?;

        let rows = qb
            .build_query_as::<E::Record>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(E::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::repo_types::TransactionRecord;
    use crate::users::repo_types::UserRecord;
    use rust_decimal::Decimal;

    #[test]
    fn check_column_rejects_unknown_names() {
        assert!(check_column::<UserRecord>("email").is_ok());
        assert!(check_column::<UserRecord>("id").is_ok());
        let err = check_column::<UserRecord>("email; DROP TABLE users").unwrap_err();
        assert!(matches!(err, RepoError::UnknownField(_)));
    }

    #[test]
    fn enum_values_are_cast_to_their_type() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM t WHERE type = ");
        push_value(&mut qb, FieldValue::Enum("transaction_type", "income"));
        assert_eq!(qb.sql(), "SELECT * FROM t WHERE type = $1::transaction_type");
    }

    #[test]
    fn insert_returns_the_stored_row() {
        let columns = vec![
            ("amount", FieldValue::from(Decimal::new(1050, 2))),
            ("type", FieldValue::Enum("transaction_type", "income")),
            ("user_id", FieldValue::from(7_i64)),
        ];
        let qb = insert_statement::<TransactionRecord>(columns).unwrap();
        assert_eq!(
            qb.sql(),
            "INSERT INTO transactions (amount, type, user_id) \
             VALUES ($1, $2::transaction_type, $3) RETURNING *"
        );

        let err =
            insert_statement::<UserRecord>(vec![("nope", FieldValue::from(1_i64))]).err().unwrap();
        assert!(matches!(err, RepoError::UnknownField(_)));
    }

    #[test]
    fn update_refreshes_updated_at_only_on_timestamped_tables() {
        let patch = Patch::new().set("description", Some("rent".to_string()));
        let qb = update_statement::<TransactionRecord>(3, patch).unwrap();
        assert_eq!(
            qb.sql(),
            "UPDATE transactions SET description = $1, updated_at = now() \
             WHERE id = $2 RETURNING *"
        );

        let patch = Patch::new().set("is_active", false);
        let qb = update_statement::<UserRecord>(3, patch).unwrap();
        assert_eq!(
            qb.sql(),
            "UPDATE users SET is_active = $1 WHERE id = $2 RETURNING *"
        );
    }

    #[test]
    fn select_by_field_limits_single_lookups() {
        let qb =
            select_by_field_statement::<UserRecord>("username", "alice".into(), true).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM users WHERE username = $1 ORDER BY id LIMIT 1"
        );

        let owner = FieldValue::from(7_i64);
        let qb = select_by_field_statement::<TransactionRecord>("user_id", owner, false).unwrap();
        assert_eq!(qb.sql(), "SELECT * FROM transactions WHERE user_id = $1 ORDER BY id");
    }
}
