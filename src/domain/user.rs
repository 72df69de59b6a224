use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UserId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

/// Account standing.
///
/// New registrations start `Unapproved` and cannot authenticate until an
/// admin approves them. `Blocked` is only left by a manual unblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    Unapproved,
    Active,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_number: String,
    pub role: Role,
    pub standing: Standing,
    pub created_on: DateTime<Utc>,
}

/// Registration payload; the engine fills in role, standing and timestamps.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_number: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Unapproved -> Active. Returns false (and leaves the user unchanged)
    /// from any other standing.
    pub fn approve(&mut self) -> bool {
        if self.standing == Standing::Unapproved {
            self.standing = Standing::Active;
            true
        } else {
            false
        }
    }

    /// Active -> Blocked. Already-blocked users are left unchanged; an
    /// unapproved user cannot be blocked.
    pub fn block(&mut self) -> bool {
        if self.standing == Standing::Active {
            self.standing = Standing::Blocked;
            true
        } else {
            false
        }
    }

    /// Blocked -> Active. Unblocking a user that was never blocked would
    /// bypass the approval gate, so it is refused.
    pub fn unblock(&mut self) -> bool {
        if self.standing == Standing::Blocked {
            self.standing = Standing::Active;
            true
        } else {
            false
        }
    }
}
