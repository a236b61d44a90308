use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

/// Clinic roles carried in the token's `role` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Dentist,
    Patient,
}

impl Role {
    pub fn parse(claim: &str) -> Option<Self> {
        match claim {
            "admin" => Some(Role::Admin),
            "dentist" => Some(Role::Dentist),
            "patient" => Some(Role::Patient),
            _ => None,
        }
    }

    /// Capability grants. Route groups are scoped by capability once in the
    /// middleware stack instead of comparing role strings per handler.
    pub fn can(&self, capability: Capability) -> bool {
        match capability {
            Capability::BookAppointment => matches!(self, Role::Patient),
            Capability::ManageSchedule => matches!(self, Role::Dentist),
            Capability::ManageAppointments => matches!(self, Role::Dentist | Role::Admin),
            Capability::ViewAppointments => true,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Dentist => write!(f, "dentist"),
            Role::Patient => write!(f, "patient"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    BookAppointment,
    ManageSchedule,
    ManageAppointments,
    ViewAppointments,
}

/// Authenticated caller, produced once by the auth middleware from a
/// validated token and injected as a request extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Identity-level check: the caller must be the named subject.
    pub fn ensure_self(&self, subject_id: &str, action: &str) -> Result<(), AppError> {
        if self.id == subject_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Not authorized to {} for this user",
                action
            )))
        }
    }

    /// Identity-level check that also admits administrators.
    pub fn ensure_self_or_admin(&self, subject_id: &str, action: &str) -> Result<(), AppError> {
        if self.is_admin() {
            return Ok(());
        }
        self.ensure_self(subject_id, action)
    }
}
