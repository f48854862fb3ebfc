use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Moderator,
    Scanner,
    User,
}

impl Role {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Scanner => "scanner",
            Role::User => "user",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            "moderator" => Some(Role::Moderator),
            "scanner" => Some(Role::Scanner),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    /// Helper: accept input from the CLI in any case
    pub fn from_code(code: &str) -> Option<Self> {
        Role::from_db_str(&code.trim().to_lowercase())
    }
}

/// Identity as handed over by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl User {
    pub fn new(id: &str, email: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub business_id: i64,
    pub user_id: String,
    pub role: Role,
    pub custom_data: BTreeMap<String, String>, // ⇔ members.custom_data (JSON object)
}

impl Member {
    pub fn new(business_id: i64, user_id: &str, role: Role) -> Self {
        Self {
            business_id,
            user_id: user_id.to_string(),
            role,
            custom_data: BTreeMap::new(),
        }
    }
}

/// A member joined with its user row; what imports and reports match against.
#[derive(Debug, Clone, Serialize)]
pub struct MemberProfile {
    pub member: Member,
    pub email: String,
    pub name: String,
}
