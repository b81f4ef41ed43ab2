use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::repo::{column, Columns, Entity, FieldValue, FromField, Record, RepoError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    #[serde(alias = "DEBIT")]
    Debit,
    #[serde(alias = "CREDIT")]
    Credit,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl From<AccountType> for FieldValue {
    fn from(t: AccountType) -> Self {
        FieldValue::Enum("account_type", t.as_str())
    }
}

impl FromField for AccountType {
    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Enum("account_type", "debit") => Some(Self::Debit),
            FieldValue::Enum("account_type", "credit") => Some(Self::Credit),
            _ => None,
        }
    }
}

/// Account row in the database.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AccountRecord {
    pub id: i64,
    pub name: String,
    pub number: String,
    pub holder: String,
    pub value: Decimal,
    pub description: Option<String>,
    #[sqlx(rename = "type")]
    pub kind: AccountType,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub number: String,
    pub holder: String,
    pub value: Decimal,
    pub description: Option<String>,
    pub kind: AccountType,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub number: String,
    pub holder: String,
    pub value: Decimal,
    pub description: Option<String>,
    pub kind: AccountType,
    pub user_id: i64,
}

impl From<AccountRecord> for Account {
    fn from(r: AccountRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            number: r.number,
            holder: r.holder,
            value: r.value,
            description: r.description,
            kind: r.kind,
            user_id: r.user_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl Record for AccountRecord {
    const TABLE: &'static str = "accounts";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "number",
        "holder",
        "value",
        "description",
        "type",
        "user_id",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["user_id", "number"]];
    const TIMESTAMPS: bool = true;

    fn id(&self) -> i64 {
        self.id
    }

    fn value(&self, column: &str) -> Option<FieldValue> {
        let v = match column {
            "id" => self.id.into(),
            "name" => self.name.clone().into(),
            "number" => self.number.clone().into(),
            "holder" => self.holder.clone().into(),
            "value" => self.value.into(),
            "description" => self.description.clone().into(),
            "type" => self.kind.into(),
            "user_id" => self.user_id.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        };
        Some(v)
    }

    fn from_columns(id: i64, columns: &[(&'static str, FieldValue)]) -> Result<Self, RepoError> {
        Ok(Self {
            id,
            name: column(columns, "name")?,
            number: column(columns, "number")?,
            holder: column(columns, "holder")?,
            value: column(columns, "value")?,
            description: column(columns, "description")?,
            kind: column(columns, "type")?,
            user_id: column(columns, "user_id")?,
            created_at: column(columns, "created_at")?,
            updated_at: column(columns, "updated_at")?,
        })
    }
}

impl Entity for Account {
    type Record = AccountRecord;
    type New = NewAccount;

    fn insert_columns(new: &NewAccount) -> Columns {
        vec![
            ("name", new.name.clone().into()),
            ("number", new.number.clone().into()),
            ("holder", new.holder.clone().into()),
            ("value", new.value.into()),
            ("description", new.description.clone().into()),
            ("type", new.kind.into()),
            ("user_id", new.user_id.into()),
        ]
    }
}
