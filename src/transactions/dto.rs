use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Transaction, TransactionType};
use crate::error::AppError;

pub const MAX_PAGE_SIZE: i64 = 100;
const MAX_DESCRIPTION_CHARS: usize = 255;

/// Whether `value` fits a NUMERIC(10, 2) column.
pub(crate) fn fits_money_column(value: Decimal) -> bool {
    value.normalize().scale() <= 2 && value.abs() < Decimal::new(100_000_000, 0)
}

pub(crate) fn check_description(description: Option<&str>) -> Result<(), AppError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_CHARS => Err(AppError::validation(
            format!("description must be at most {MAX_DESCRIPTION_CHARS} characters"),
        )),
        _ => Ok(()),
    }
}

/// Distinguishes an explicit `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Strictly positive money amount; rejected at deserialization otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = String;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value <= Decimal::ZERO {
            return Err("amount must be greater than 0".into());
        }
        if !fits_money_column(value) {
            return Err("amount allows at most 8 integer digits and 2 decimal places".into());
        }
        Ok(Self(value))
    }
}

impl From<Amount> for Decimal {
    fn from(a: Amount) -> Self {
        a.0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransaction {
    pub amount: Amount,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub account_id: Option<i64>,
}

impl CreateTransaction {
    pub fn validate(self) -> Result<Self, AppError> {
        check_description(self.description.as_deref())?;
        Ok(self)
    }
}

/// Only the fields present in the body are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTransaction {
    #[serde(default)]
    pub amount: Option<Amount>,
    /// `Some(None)` clears the description.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
}

impl UpdateTransaction {
    pub fn validate(self) -> Result<Self, AppError> {
        check_description(self.description.as_ref().and_then(|d| d.as_deref()))?;
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(rename = "type", default)]
    pub kind: TransactionType,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    MAX_PAGE_SIZE
}

impl ListParams {
    /// `(skip, limit)` with skip floored at 0 and limit kept in `1..=100`.
    pub fn window(&self) -> (i64, i64) {
        (self.skip.max(0), self.limit.clamp(1, MAX_PAGE_SIZE))
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub amount: Decimal,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub user_id: i64,
    pub account_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            amount: t.amount,
            description: t.description,
            kind: t.kind,
            user_id: t.user_id,
            account_id: t.account_id,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSummary {
    pub total_expenses: Decimal,
    pub total_incomes: Decimal,
    pub balance: Decimal,
    pub expense_count: i64,
    pub income_count: i64,
}
