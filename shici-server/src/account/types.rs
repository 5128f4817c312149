//! Account records and request/response shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shici_common::{Error, Result, TargetRef};

/// Account state; registration creates `Active`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Disabled,
    Active,
}

impl UserStatus {
    pub fn as_i64(self) -> i64 {
        match self {
            UserStatus::Disabled => 0,
            UserStatus::Active => 1,
        }
    }

    pub fn from_i64(value: i64) -> Result<Self> {
        match value {
            0 => Ok(UserStatus::Disabled),
            1 => Ok(UserStatus::Active),
            other => Err(Error::Internal(format!("unknown user status {}", other))),
        }
    }
}

/// Stored user. The password hash never serializes.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub nickname: String,
    pub avatar_url: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// 0 unknown, 1 male, 2 female
    pub gender: i64,
    pub province: String,
    pub city: String,
    pub level: i64,
    pub experience: i64,
    pub coins: i64,
    pub vip_level: i64,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields visible to anyone
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub id: i64,
    pub username: String,
    pub nickname: String,
    pub avatar_url: String,
    pub level: i64,
}

impl From<User> for PublicProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            nickname: user.nickname,
            avatar_url: user.avatar_url,
            level: user.level,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

/// Partial profile update; absent or blank fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<i64>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// A fresh session credential
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Returned by register and login
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// One favorite or history entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserTarget {
    pub id: i64,
    pub target: TargetRef,
    pub created_at: DateTime<Utc>,
}
