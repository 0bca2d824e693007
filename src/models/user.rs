use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::JsonValue;

/// A registered account
///
/// The password column holds an argon2 PHC string and is never serialized
/// into API responses.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    /// Unique identifier for the user (UUID v4 as string)
    id: String,

    /// Display name
    name: String,

    /// Login email, unique across users
    email: String,

    /// Argon2 hash of the password
    #[serde(skip_serializing, default)]
    password: String,

    /// Optional avatar image
    avatar_url: Option<String>,

    /// Free-form UI preferences (theme, notification toggles)
    preferences: JsonValue,

    /// When the account was created
    created_at: NaiveDateTime,

    /// When the user last logged in
    last_login: Option<NaiveDateTime>,
}

impl User {
    /// Creates a new user with an already-hashed password
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password: password_hash,
            avatar_url: None,
            preferences: JsonValue::default(),
            created_at: Utc::now().naive_utc(),
            last_login: None,
        }
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_email(&self) -> &str {
        &self.email
    }

    pub fn get_password_hash(&self) -> &str {
        &self.password
    }

    pub fn get_preferences(&self) -> &JsonValue {
        &self.preferences
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    pub fn get_last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login.map(|ts| DateTime::from_naive_utc_and_offset(ts, Utc))
    }
}

/// A pending password reset
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::password_resets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PasswordReset {
    id: String,
    user_id: String,
    token: String,
    expires_at: NaiveDateTime,
    created_at: NaiveDateTime,
}

impl PasswordReset {
    pub fn new(user_id: &str, token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            token,
            expires_at: expires_at.naive_utc(),
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn get_user_id(&self) -> &str {
        &self.user_id
    }

    pub fn get_token(&self) -> &str {
        &self.token
    }

    /// Whether the reset has passed its expiry time
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now.naive_utc()
    }
}
