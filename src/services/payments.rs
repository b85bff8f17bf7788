// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment ledger for administrators.

use serde::Serialize;

use crate::db::{self, tables, DataService, Query};
use crate::error::AppError;
use crate::models::Payment;
use crate::services::profiles::{self, name_of};
use crate::services::recover_or_default;

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRow {
    #[serde(flatten)]
    pub payment: Payment,
    pub member_name: Option<String>,
}

/// Every payment, most recent first.
pub async fn list_payments(db: &dyn DataService) -> Vec<PaymentRow> {
    recover_or_default("payments", fetch_payments(db)).await
}

async fn fetch_payments(db: &dyn DataService) -> Result<Vec<PaymentRow>, AppError> {
    let payments: Vec<Payment> = db::select_as(
        db,
        tables::PAYMENTS,
        &Query::new().order_desc("payment_date"),
    )
    .await?;

    let members = recover_or_default(
        "payment member names",
        profiles::profiles_by_id(db, payments.iter().map(|p| p.user_id.as_str())),
    )
    .await;

    Ok(payments
        .into_iter()
        .map(|payment| PaymentRow {
            member_name: name_of(&members, &payment.user_id),
            payment,
        })
        .collect())
}
