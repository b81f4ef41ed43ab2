use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Account, AccountType};
use crate::{
    error::AppError,
    transactions::dto::{check_description, fits_money_column},
};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccount {
    pub name: String,
    pub number: String,
    pub holder: String,
    pub value: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: AccountType,
}

impl CreateAccount {
    pub fn validate(mut self) -> Result<Self, AppError> {
        self.name = self.name.trim().to_string();
        self.number = self.number.trim().to_string();
        self.holder = self.holder.trim().to_string();

        for (field, value, max) in [
            ("name", &self.name, 255),
            ("number", &self.number, 20),
            ("holder", &self.holder, 255),
        ] {
            if value.is_empty() {
                return Err(AppError::validation(format!("{field} must not be empty")));
            }
            if value.chars().count() > max {
                return Err(AppError::validation(format!(
                    "{field} must be at most {max} characters"
                )));
            }
        }
        if !fits_money_column(self.value) {
            return Err(AppError::validation(
                "value allows at most 8 integer digits and 2 decimal places",
            ));
        }
        check_description(self.description.as_deref())?;
        Ok(self)
    }
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub name: String,
    pub number: String,
    pub holder: String,
    pub value: Decimal,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: AccountType,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            name: a.name,
            number: a.number,
            holder: a.holder,
            value: a.value,
            description: a.description,
            kind: a.kind,
            user_id: a.user_id,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}
