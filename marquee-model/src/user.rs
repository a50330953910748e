//! User account records and the payloads that create or modify them.
//!
//! The password hash is deliberately absent from [`User`]; it is stored and
//! fetched separately by the users repository so it can never leak through
//! serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// Display name
    pub full_name: String,
    /// Login identifier, unique across all users
    pub email: String,
    /// Inactive accounts cannot log in
    pub is_active: bool,
    /// Grants access to the movie mutation endpoints
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn from_new(new: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            full_name: new.full_name,
            email: new.email,
            is_active: new.is_active,
            is_admin: new.is_admin,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: &UserUpdate) {
        if let Some(full_name) = &update.full_name {
            self.full_name = full_name.clone();
        }
        if let Some(email) = &update.email {
            self.email = email.clone();
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        if let Some(is_admin) = update.is_admin {
            self.is_admin = is_admin;
        }
        self.updated_at = Utc::now();
    }
}

/// Account data handed to the repository on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
}

impl NewUser {
    /// A regular, active, non-admin account.
    pub fn regular(
        full_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            is_active: true,
            is_admin: false,
        }
    }

    pub fn admin(
        full_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            is_admin: true,
            ..Self::regular(full_name, email)
        }
    }
}

/// Partial update for a user; only supplied fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

/// Self-service registration payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub old_password: String,
    pub new_password: String,
}
