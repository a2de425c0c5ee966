//! User model

use serde::{Deserialize, Serialize};

/// Rights flag of a standard account
pub const RIGHTS_STANDARD: i64 = 0;

/// Rights flag of an administrator account
pub const RIGHTS_ADMIN: i64 = 1;

/// Stored credential record, keyed by username in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub rights: i64,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.rights == RIGHTS_ADMIN
    }
}

/// Permission level an operation requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rights {
    Standard,
    Admin,
}

impl Rights {
    pub fn as_flag(&self) -> i64 {
        match self {
            Self::Standard => RIGHTS_STANDARD,
            Self::Admin => RIGHTS_ADMIN,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub rights: Option<i64>,
}

impl RegisterRequest {
    pub fn into_record(self) -> UserRecord {
        UserRecord {
            username: self.username,
            password: self.password,
            rights: self.rights.unwrap_or(RIGHTS_STANDARD),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoveUserRequest {
    pub user: String,
}

/// Plain message body used by status and user management routes
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
