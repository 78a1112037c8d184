//! User profiles and corporate accounts.
//!
//! Profiles are created at signup by the identity provider; every bounded
//! context reads them to authorize callers and to resolve names and emails.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Platform-wide role of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular learner or community member.
    User,
    /// Platform administrator (module review, moderation).
    Admin,
}

/// Role of a profile inside its corporate account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorporateRole {
    /// Buys modules and reads reports for the account.
    Admin,
    /// Receives enrollments bought by the account.
    Employee,
}

impl UserRole {
    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl CorporateRole {
    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(DomainError::infrastructure(format!(
                "unknown user role: {other}"
            ))),
        }
    }
}

impl FromStr for CorporateRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "employee" => Ok(Self::Employee),
            other => Err(DomainError::infrastructure(format!(
                "unknown corporate role: {other}"
            ))),
        }
    }
}

/// A user or corporate-employee identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile identifier (same as the auth user id).
    pub id: Uuid,
    /// Contact email.
    pub email: String,
    /// Display name; used on certificates.
    pub full_name: String,
    /// Platform role.
    pub role: UserRole,
    /// Corporate account the profile belongs to, if any.
    pub corporate_account_id: Option<Uuid>,
    /// Role inside the corporate account, if any.
    pub corporate_role: Option<CorporateRole>,
}

impl Profile {
    /// Whether the profile is a platform administrator.
    #[must_use]
    pub fn is_platform_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Returns the corporate account this profile administers, if any.
    #[must_use]
    pub fn administered_account(&self) -> Option<Uuid> {
        match (self.corporate_account_id, self.corporate_role) {
            (Some(account_id), Some(CorporateRole::Admin)) => Some(account_id),
            _ => None,
        }
    }
}

/// A company buying training for its employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporateAccount {
    /// Account identifier.
    pub id: Uuid,
    /// Legal or display name of the company.
    pub company_name: String,
}

/// Read access to profiles and corporate accounts.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Loads a profile by id.
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, DomainError>;

    /// Lists every profile attached to a corporate account.
    async fn list_account_members(&self, account_id: Uuid) -> Result<Vec<Profile>, DomainError>;

    /// Loads a corporate account by id.
    async fn find_corporate_account(
        &self,
        account_id: Uuid,
    ) -> Result<Option<CorporateAccount>, DomainError>;
}

/// Loads the caller's profile.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized` if the authenticated user has no
/// profile.
pub async fn require_profile(
    user_id: Uuid,
    repo: &dyn ProfileRepository,
) -> Result<Profile, DomainError> {
    repo.find_profile(user_id)
        .await?
        .ok_or_else(|| DomainError::Unauthorized("Perfil no encontrado".to_owned()))
}

/// Loads the caller's profile and checks it is a platform administrator.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized` if the profile is missing and
/// `DomainError::Forbidden` if it is not an administrator.
pub async fn require_platform_admin(
    user_id: Uuid,
    repo: &dyn ProfileRepository,
) -> Result<Profile, DomainError> {
    let profile = require_profile(user_id, repo).await?;
    if profile.is_platform_admin() {
        Ok(profile)
    } else {
        Err(DomainError::Forbidden(
            "Se requieren permisos de administrador".to_owned(),
        ))
    }
}
