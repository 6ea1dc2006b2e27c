use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// The three role tiers. Stored as TEXT and embedded in the JWT claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    Member,
    Manager,
    SupremeAdmin,
}

/// Role-gated operations. Every gated handler checks against this table and
/// nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewAllDemandas,
    ListUsers,
    ChangeRoles,
    DeleteUsers,
}

impl Role {
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "member" => Ok(Self::Member),
            "manager" => Ok(Self::Manager),
            "supreme_admin" => Ok(Self::SupremeAdmin),
            other => Err(ApiError::validation(
                "invalid_role",
                format!("Tipo de usuário inválido: {other}"),
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Manager => "manager",
            Self::SupremeAdmin => "supreme_admin",
        }
    }

    pub fn allows(self, cap: Capability) -> bool {
        match cap {
            Capability::ViewAllDemandas | Capability::ListUsers => {
                matches!(self, Self::Manager | Self::SupremeAdmin)
            }
            Capability::ChangeRoles | Capability::DeleteUsers => self == Self::SupremeAdmin,
        }
    }

    pub fn require(self, cap: Capability) -> Result<(), ApiError> {
        if self.allows(cap) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Member
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
