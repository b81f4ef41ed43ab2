//! Generic persistence layer shared by every entity.
//!
//! An [`Entity`] is the domain value services work with; its [`Record`] is the
//! persisted row shape. A single [`Repository`] implementation per backend maps
//! between the two.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, FromRow};
use thiserror::Error;
use time::OffsetDateTime;

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[cfg(test)]
pub use memory::MemoryRepository;
pub use postgres::PgRepository;

#[derive(Debug, Error)]
pub enum RepoError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("unknown column {0}")]
    UnknownField(String),
    #[error("column {0} does not hold the expected type")]
    Mapping(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A column value with enough type information to be bound to a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(Option<i64>),
    Text(Option<String>),
    Bool(bool),
    Decimal(Decimal),
    /// Postgres enum: (type name, label).
    Enum(&'static str, &'static str),
    Timestamp(OffsetDateTime),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(Some(v))
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(v: Option<i64>) -> Self {
        Self::Int(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(Some(v))
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(Some(v.to_string()))
    }
}

impl From<Option<String>> for FieldValue {
    fn from(v: Option<String>) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<OffsetDateTime> for FieldValue {
    fn from(v: OffsetDateTime) -> Self {
        Self::Timestamp(v)
    }
}

/// Typed extraction out of a [`FieldValue`].
pub trait FromField: Sized {
    fn from_field(value: &FieldValue) -> Option<Self>;
}

impl FromField for i64 {
    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Int(Some(v)) => Some(*v),
            _ => None,
        }
    }
}

impl FromField for Option<i64> {
    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromField for String {
    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(Some(v)) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromField for Option<String> {
    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromField for bool {
    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromField for Decimal {
    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromField for OffsetDateTime {
    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }
}

/// Ordered `(column, value)` pairs describing one row, id excluded.
pub type Columns = Vec<(&'static str, FieldValue)>;

/// Looks up `name` in `columns` and converts it.
pub fn column<T: FromField>(columns: &[(&'static str, FieldValue)], name: &str) -> Result<T, RepoError> {
    let (_, value) = columns
        .iter()
        .find(|(c, _)| *c == name)
        .ok_or_else(|| RepoError::UnknownField(name.to_string()))?;
    T::from_field(value).ok_or_else(|| RepoError::Mapping(name.to_string()))
}

/// Only the fields explicitly set; everything else stays untouched on update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch(Columns);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        self.0.retain(|(c, _)| *c != column);
        self.0.push((column, value.into()));
        self
    }

    /// Sets `column` only when `value` is present.
    pub fn set_if<V: Into<FieldValue>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> &[(&'static str, FieldValue)] {
        &self.0
    }

    pub fn into_columns(self) -> Columns {
        self.0
    }
}

/// Persisted row shape of an entity.
pub trait Record: for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;
    /// Every persisted column except the surrogate `id`.
    const COLUMNS: &'static [&'static str];
    /// Column groups backed by a unique constraint. Postgres enforces these
    /// itself; the test `MemoryRepository` reads them to raise the same conflicts.
    const UNIQUE: &'static [&'static [&'static str]];
    /// Whether the table carries `created_at`/`updated_at`.
    const TIMESTAMPS: bool;

    fn id(&self) -> i64;

    /// Value of `column`; `"id"` is admitted too. Only the in-memory store
    /// and [`Record::columns`] read rows this way; `PgRepository` decodes
    /// through `FromRow`.
    fn value(&self, column: &str) -> Option<FieldValue>;

    /// Rebuilds a row from its id and its columns. The in-memory store's
    /// counterpart to `FromRow`.
    fn from_columns(id: i64, columns: &[(&'static str, FieldValue)]) -> Result<Self, RepoError>;

    fn columns(&self) -> Columns {
        Self::COLUMNS
            .iter()
            .filter_map(|c| self.value(c).map(|v| (*c, v)))
            .collect()
    }

    fn has_column(name: &str) -> bool {
        name == "id" || Self::COLUMNS.contains(&name)
    }
}

/// Domain value backed by a [`Record`].
pub trait Entity: From<Self::Record> + Clone + Send + Sync + 'static {
    type Record: Record;
    /// What a caller supplies to create one; the store assigns id and timestamps.
    type New: Send + Sync;

    fn insert_columns(new: &Self::New) -> Columns;
}

#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<E>, RepoError>;

    async fn create(&self, new: &E::New) -> Result<E, RepoError>;

    /// Applies `patch`; `None` when no row has `id`.
    async fn update(&self, id: i64, patch: Patch) -> Result<Option<E>, RepoError>;

    /// `true` iff a row existed and was removed.
    async fn delete(&self, id: i64) -> Result<bool, RepoError>;

    /// Rows whose `field` equals `value`; at most one when `single`.
    async fn get_by_field(
        &self,
        field: &str,
        value: FieldValue,
        single: bool,
    ) -> Result<Vec<E>, RepoError>;

    async fn find_one_by(&self, field: &str, value: FieldValue) -> Result<Option<E>, RepoError> {
        Ok(self.get_by_field(field, value, true).await?.into_iter().next())
    }
}
