use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Hr,
    Applicant,
}

impl Role {
    /// Staff may inspect any application; applicants only their own.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Hr => "hr",
            Role::Applicant => "applicant",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "hr" => Ok(Role::Hr),
            "applicant" => Ok(Role::Applicant),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The acting principal as resolved by the identity collaborator. The
/// engine trusts the resolved role for its authorization checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}
