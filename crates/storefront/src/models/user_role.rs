//! Back-office roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use greenbasket_core::{Role, UserId, UserRoleId};

/// A `user_roles` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: UserRoleId,
    pub user_id: UserId,
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
