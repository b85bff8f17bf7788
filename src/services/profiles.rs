// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lookups in the `users` table.
//!
//! Views that show who a record belongs to join names client-side: collect
//! the ids, fetch the matching profiles in one query, and index by id.

use std::collections::{BTreeSet, HashMap};

use crate::db::{self, tables, DataService, Query};
use crate::error::AppError;
use crate::models::{Profile, Role};

/// Profile of a single user, if it exists.
pub async fn get_profile(db: &dyn DataService, user_id: &str) -> Result<Option<Profile>, AppError> {
    db::select_one(db, tables::USERS, Query::new().eq("id", user_id)).await
}

/// Profiles for a set of ids, keyed by id. Unknown ids are simply absent.
pub async fn profiles_by_id<'a>(
    db: &dyn DataService,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<HashMap<String, Profile>, AppError> {
    let ids: BTreeSet<&str> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let profiles: Vec<Profile> =
        db::select_as(db, tables::USERS, &Query::new().in_list("id", ids)).await?;

    Ok(profiles.into_iter().map(|p| (p.id.clone(), p)).collect())
}

/// All users with a role, ordered by name.
pub async fn list_by_role(db: &dyn DataService, role: Role) -> Result<Vec<Profile>, AppError> {
    db::select_as(
        db,
        tables::USERS,
        &Query::new()
            .columns("id, email, full_name, role")
            .eq("role", role_value(role))
            .order_asc("full_name"),
    )
    .await
}

fn role_value(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::Member => "member",
    }
}

/// Display name for `id` from a lookup table built by [`profiles_by_id`].
pub fn name_of(profiles: &HashMap<String, Profile>, id: &str) -> Option<String> {
    profiles.get(id).and_then(Profile::display_name)
}
