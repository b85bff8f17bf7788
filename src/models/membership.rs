//! Membership (enrollment) rows.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Expired,
    Cancelled,
    /// Any status this build does not know about.
    #[serde(other)]
    Other,
}

/// Row in the `memberships` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub user_id: String,
    pub plan_name: String,
    pub status: MembershipStatus,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}
