// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Users, roles and the signed-in identity.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Privilege level of a gym user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Role {
    Admin,
    Member,
}

/// The authenticated user, as held by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Profile row in the `users` table.
///
/// Trainers are users with the admin role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
}

impl Profile {
    /// Name to show next to records, falling back to the email.
    pub fn display_name(&self) -> Option<String> {
        self.full_name.clone().or_else(|| self.email.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "email": "ana@example.com",
            "role": "admin",
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(profile.role, Role::Admin);
        assert_eq!(profile.full_name, None);
        assert_eq!(profile.display_name().as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result: Result<Profile, _> = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "role": "superuser"
        }));
        assert!(result.is_err());
    }
}
