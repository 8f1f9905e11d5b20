//! User profiles, identities and loyalty points entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, PointsEntryId, PointsKind, Role, UserId};

/// An authenticated identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: Email,
}

/// A customer or staff profile from the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    /// Loyalty points balance.
    pub points: u32,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Profile for a freshly registered customer.
    #[must_use]
    pub fn new_customer(identity: &Identity, name: &str, welcome_points: u32) -> Self {
        let now = Utc::now();
        Self {
            id: identity.user_id.clone(),
            name: name.trim().to_owned(),
            email: identity.email.clone(),
            role: Role::User,
            points: welcome_points,
            phone: None,
            birth_date: None,
            created_at: now,
            last_login: Some(now),
        }
    }

    /// Whether the profile has CRM access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A recorded movement of loyalty points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsEntry {
    pub id: PointsEntryId,
    pub user_id: UserId,
    pub date: DateTime<Utc>,
    pub description: String,
    pub points: u32,
    pub kind: PointsKind,
}

/// Payload for recording a points movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPointsEntry {
    pub user_id: UserId,
    pub description: String,
    pub points: u32,
    pub kind: PointsKind,
}

impl NewPointsEntry {
    /// An `earn` entry.
    #[must_use]
    pub fn earned(user_id: UserId, points: u32, description: impl Into<String>) -> Self {
        Self {
            user_id,
            description: description.into(),
            points,
            kind: PointsKind::Earn,
        }
    }
}
