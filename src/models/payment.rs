//! Payment rows.

use serde::{Deserialize, Serialize};

/// Settlement status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
    #[serde(other)]
    Other,
}

/// Row in the `payments` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    pub status: PaymentStatus,
    pub payment_date: String,
}

/// Sum of completed payment amounts.
pub fn completed_total(payments: &[Payment]) -> f64 {
    payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed)
        .map(|p| p.amount)
        .sum()
}
