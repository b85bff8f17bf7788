//! Gym attendance (check-in/check-out) rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::duration_minutes;

/// Row in the `attendance` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub user_id: String,
    pub check_in: DateTime<Utc>,
    #[serde(default)]
    pub check_out: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    /// Still in the gym: checked in, not yet checked out.
    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }

    /// Visit length in whole minutes, `None` while in progress.
    pub fn duration_minutes(&self) -> Option<i64> {
        self.check_out
            .map(|check_out| duration_minutes(self.check_in, check_out))
    }
}
