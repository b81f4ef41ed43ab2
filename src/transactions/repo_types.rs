use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::repo::{column, Columns, Entity, FieldValue, FromField, Record, RepoError};

/// Direction of a money movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    #[serde(alias = "EXPENSE")]
    Expense,
    #[serde(alias = "INCOME")]
    Income,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TransactionType> for FieldValue {
    fn from(t: TransactionType) -> Self {
        FieldValue::Enum("transaction_type", t.as_str())
    }
}

impl FromField for TransactionType {
    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Enum("transaction_type", "expense") => Some(Self::Expense),
            FieldValue::Enum("transaction_type", "income") => Some(Self::Income),
            _ => None,
        }
    }
}

/// Transaction row in the database.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TransactionRecord {
    pub id: i64,
    pub amount: Decimal,
    pub description: Option<String>,
    #[sqlx(rename = "type")]
    pub kind: TransactionType,
    pub user_id: i64,
    pub account_id: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub amount: Decimal,
    pub description: Option<String>,
    pub kind: TransactionType,
    pub user_id: i64,
    pub account_id: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub description: Option<String>,
    pub kind: TransactionType,
    pub user_id: i64,
    pub account_id: Option<i64>,
}

impl From<TransactionRecord> for Transaction {
    fn from(r: TransactionRecord) -> Self {
        Self {
            id: r.id,
            amount: r.amount,
            description: r.description,
            kind: r.kind,
            user_id: r.user_id,
            account_id: r.account_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl Record for TransactionRecord {
    const TABLE: &'static str = "transactions";
    const COLUMNS: &'static [&'static str] = &[
        "amount",
        "description",
        "type",
        "user_id",
        "account_id",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[];
    const TIMESTAMPS: bool = true;

    fn id(&self) -> i64 {
        self.id
    }

    fn value(&self, column: &str) -> Option<FieldValue> {
        let v = match column {
            "id" => self.id.into(),
            "amount" => self.amount.into(),
            "description" => self.description.clone().into(),
            "type" => self.kind.into(),
            "user_id" => self.user_id.into(),
            "account_id" => self.account_id.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        };
        Some(v)
    }

    fn from_columns(id: i64, columns: &[(&'static str, FieldValue)]) -> Result<Self, RepoError> {
        Ok(Self {
            id,
            amount: column(columns, "amount")?,
            description: column(columns, "description")?,
            kind: column(columns, "type")?,
            user_id: column(columns, "user_id")?,
            account_id: column(columns, "account_id")?,
            created_at: column(columns, "created_at")?,
            updated_at: column(columns, "updated_at")?,
        })
    }
}

impl Entity for Transaction {
    type Record = TransactionRecord;
    type New = NewTransaction;

    fn insert_columns(new: &NewTransaction) -> Columns {
        vec![
            ("amount", new.amount.into()),
            ("description", new.description.clone().into()),
            ("type", new.kind.into()),
            ("user_id", new.user_id.into()),
            ("account_id", new.account_id.into()),
        ]
    }
}
