use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::AppError,
    security::HashedPassword,
    users::{
        dto::{UserRequest, UserUpdate},
        repo_types::{NewUser, UserChanges},
    },
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    Ok(email)
}

fn normalize_username(username: &str) -> Result<String, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::validation("Username must not be empty"));
    }
    Ok(username.to_string())
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::validation("Password must not be empty"));
    }
    Ok(())
}

impl NewUser {
    /// Validates a create request and hashes its password.
    pub fn from_request(req: UserRequest) -> Result<Self, AppError> {
        let email = normalize_email(&req.email)?;
        let username = normalize_username(&req.username)?;
        check_password(&req.password)?;
        let password = HashedPassword::hash(&req.password)?;
        Ok(Self {
            email,
            username,
            avatar: req.avatar,
            bio: req.bio,
            password,
        })
    }
}

impl UserChanges {
    /// Validates an update request; a new password is hashed here.
    pub fn from_update(req: UserUpdate) -> Result<Self, AppError> {
        let email = req.email.as_deref().map(normalize_email).transpose()?;
        let username = req.username.as_deref().map(normalize_username).transpose()?;
        let password = match req.password {
            Some(plain) => {
                check_password(&plain)?;
                Some(HashedPassword::hash(&plain)?)
            }
            None => None,
        };
        Ok(Self {
            email,
            username,
            avatar: req.avatar,
            bio: req.bio,
            password,
        })
    }
}
