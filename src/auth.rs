// src/auth.rs
//! Caller identity passed explicitly into every write.

use serde::{Deserialize, Serialize};

use crate::errors::DedupeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
    Guest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub uid: String,
    pub role: UserRole,
}

impl Caller {
    pub fn guest() -> Self {
        Self {
            uid: "guest".to_string(),
            role: UserRole::Guest,
        }
    }

    pub fn user(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            role: UserRole::User,
        }
    }

    pub fn admin(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            role: UserRole::Admin,
        }
    }

    /// Signed-in callers get the admin role when their email is the
    /// configured administrator address.
    pub fn signed_in(uid: &str, email: &str, admin_email: Option<&str>) -> Self {
        let is_admin = admin_email
            .map(|admin| !admin.is_empty() && admin.eq_ignore_ascii_case(email.trim()))
            .unwrap_or(false);
        if is_admin {
            Self::admin(uid)
        } else {
            Self::user(uid)
        }
    }

    pub fn is_guest(&self) -> bool {
        self.role == UserRole::Guest
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Adding people needs a signed-in caller.
    pub fn require_writer(&self) -> Result<(), DedupeError> {
        if self.is_guest() || self.uid.is_empty() {
            return Err(DedupeError::AuthRequired);
        }
        Ok(())
    }

    /// Editing, deleting and clearing need an administrator.
    pub fn require_admin(&self) -> Result<(), DedupeError> {
        self.require_writer()?;
        if !self.is_admin() {
            return Err(DedupeError::AdminRequired);
        }
        Ok(())
    }
}
