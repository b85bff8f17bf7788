// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod attendance;
pub mod membership;
pub mod payment;
pub mod trainer_request;
pub mod user;

pub use attendance::AttendanceRecord;
pub use membership::{Membership, MembershipStatus};
pub use payment::{Payment, PaymentStatus};
pub use trainer_request::{RequestStatus, TrainerRequest};
pub use user::{Identity, Profile, Role};
