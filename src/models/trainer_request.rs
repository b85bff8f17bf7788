//! Personal-trainer session requests.

use serde::{Deserialize, Serialize};

/// Review state of a trainer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// Row in the `personal_trainer_requests` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerRequest {
    pub id: String,
    pub user_id: String,
    pub trainer_id: String,
    pub requested_date: String,
    pub status: RequestStatus,
    #[serde(default)]
    pub notes: Option<String>,
}
