// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (session/route guard, security headers).

pub mod auth;
pub mod security;

pub use auth::route_guard;
