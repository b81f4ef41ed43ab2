use sqlx::FromRow;

use crate::repo::{column, Columns, Entity, FieldValue, Record, RepoError};

/// User row in the database.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub hashed_password: String, // Argon2 PHC string
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

/// A registered user as the services see it.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

/// Data for a user about to be inserted. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            username: r.username,
            email: r.email,
            hashed_password: r.hashed_password,
            is_active: r.is_active,
            is_superuser: r.is_superuser,
            is_verified: r.is_verified,
        }
    }
}

impl Record for UserRecord {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "username",
        "email",
        "hashed_password",
        "is_active",
        "is_superuser",
        "is_verified",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["username"], &["email"]];
    const TIMESTAMPS: bool = false;

    fn id(&self) -> i64 {
        self.id
    }

    fn value(&self, column: &str) -> Option<FieldValue> {
        let v = match column {
            "id" => self.id.into(),
            "first_name" => self.first_name.clone().into(),
            "last_name" => self.last_name.clone().into(),
            "username" => self.username.clone().into(),
            "email" => self.email.clone().into(),
            "hashed_password" => self.hashed_password.clone().into(),
            "is_active" => self.is_active.into(),
            "is_superuser" => self.is_superuser.into(),
            "is_verified" => self.is_verified.into(),
            _ => return None,
        };
        Some(v)
    }

    fn from_columns(id: i64, columns: &[(&'static str, FieldValue)]) -> Result<Self, RepoError> {
        Ok(Self {
            id,
            first_name: column(columns, "first_name")?,
            last_name: column(columns, "last_name")?,
            username: column(columns, "username")?,
            email: column(columns, "email")?,
            hashed_password: column(columns, "hashed_password")?,
            is_active: column(columns, "is_active")?,
            is_superuser: column(columns, "is_superuser")?,
            is_verified: column(columns, "is_verified")?,
        })
    }
}

impl Entity for User {
    type Record = UserRecord;
    type New = NewUser;

    fn insert_columns(new: &NewUser) -> Columns {
        vec![
            ("first_name", new.first_name.clone().into()),
            ("last_name", new.last_name.clone().into()),
            ("username", new.username.clone().into()),
            ("email", new.email.clone().into()),
            ("hashed_password", new.hashed_password.clone().into()),
            ("is_active", true.into()),
            ("is_superuser", false.into()),
            ("is_verified", false.into()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            id: 7,
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            hashed_password: "$argon2id$stub".into(),
            is_active: true,
            is_superuser: false,
            is_verified: true,
        }
    }

    #[test]
    fn columns_rebuild_the_same_row() {
        let r = record();
        let rebuilt = UserRecord::from_columns(r.id, &r.columns()).unwrap();
        assert_eq!(rebuilt, r);
    }

    #[test]
    fn id_is_not_a_writable_column() {
        let r = record();
        assert!(r.columns().iter().all(|(c, _)| *c != "id"));
        assert_eq!(r.value("id"), Some(FieldValue::Int(Some(7))));
    }

    #[test]
    fn new_users_start_active_and_unverified() {
        let cols = User::insert_columns(&NewUser {
            first_name: "Bob".into(),
            last_name: "Builder".into(),
            username: "bob".into(),
            email: "bob@x.com".into(),
            hashed_password: "h".into(),
        });
        let r = UserRecord::from_columns(1, &cols).unwrap();
        assert!(r.is_active);
        assert!(!r.is_superuser);
        assert!(!r.is_verified);
    }
}
