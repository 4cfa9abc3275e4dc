use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Role carried by the session claims. The coordinator dispatches per-role
/// behavior on this value and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Advisor,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Advisor => "advisor",
            Role::Student => "student",
        }
    }
}

/// Validated request identity, produced by the auth middleware from the
/// session claims. Trusted verbatim; the coordinator never re-validates
/// credentials.
#[derive(Debug, Clone)]
pub struct Actor {
    /// Subject (user) id from the identity provider.
    pub user_id: Uuid,
    /// Linked student id, present only for student accounts.
    pub student_id: Option<Uuid>,
    pub role: Role,
    pub permissions: HashSet<String>,
}

impl Actor {
    pub fn student(user_id: Uuid, student_id: Uuid) -> Self {
        Self {
            user_id,
            student_id: Some(student_id),
            role: Role::Student,
            permissions: HashSet::new(),
        }
    }

    pub fn advisor(user_id: Uuid) -> Self {
        Self { user_id, student_id: None, role: Role::Advisor, permissions: HashSet::new() }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self { user_id, student_id: None, role: Role::Admin, permissions: HashSet::new() }
    }
}
