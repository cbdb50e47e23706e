use serde::Serialize;
use sqlx::FromRow;

use crate::security::HashedPassword;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    #[serde(skip_serializing)]
    pub password: HashedPassword, // argon2, never exposed in JSON
}

/// A user that has not been stored yet, so it has no id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub password: HashedPassword,
}

/// Column updates for an existing user. `None` leaves the column alone;
/// for the nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub avatar: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub password: Option<HashedPassword>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.username.is_none()
            && self.avatar.is_none()
            && self.bio.is_none()
            && self.password.is_none()
    }
}
