// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role-gated navigation.
//!
//! A session is in exactly one of three navigation trees. Only the paths of
//! the active tree are reachable; every other path (including ones no tree
//! knows about) redirects to the active tree's home. The decision is a pure
//! function of the session and the requested path.

use crate::session::Session;

/// The three disjoint navigation trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTree {
    Unauthenticated,
    Administrator,
    Member,
}

const UNAUTHENTICATED_PATHS: &[&str] = &["/login", "/register"];

const ADMIN_PATHS: &[&str] = &[
    "/admin",
    "/admin/payments",
    "/admin/enrollments",
    "/admin/enrollments/new",
    "/admin/trainer-requests",
    "/admin/trainer-requests/{id}/status",
    "/logout",
];

const MEMBER_PATHS: &[&str] = &[
    "/member",
    "/member/status",
    "/member/attendance",
    "/member/attendance/check-in",
    "/member/attendance/check-out",
    "/member/personal",
    "/logout",
];

impl NavTree {
    pub fn for_session(session: &Session) -> Self {
        match (session.identity(), session.is_admin()) {
            (None, _) => NavTree::Unauthenticated,
            (Some(_), true) => NavTree::Administrator,
            (Some(_), false) => NavTree::Member,
        }
    }

    /// Where unmatched paths in this tree land.
    pub fn home(self) -> &'static str {
        match self {
            NavTree::Unauthenticated => "/login",
            NavTree::Administrator => "/admin",
            NavTree::Member => "/member",
        }
    }

    /// Path patterns reachable in this tree. `{name}` matches one segment.
    pub fn patterns(self) -> &'static [&'static str] {
        match self {
            NavTree::Unauthenticated => UNAUTHENTICATED_PATHS,
            NavTree::Administrator => ADMIN_PATHS,
            NavTree::Member => MEMBER_PATHS,
        }
    }

    pub fn contains(self, path: &str) -> bool {
        let path = normalize(path);
        self.patterns()
            .iter()
            .any(|pattern| pattern_matches(pattern, path))
    }
}

/// Outcome of evaluating the guard for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// The path belongs to the active tree.
    Allow(NavTree),
    /// The path is outside the active tree; go to this home instead.
    Redirect(&'static str),
}

/// Decide whether `path` is reachable for `session`.
pub fn resolve(session: &Session, path: &str) -> RouteDecision {
    let tree = NavTree::for_session(session);
    if tree.contains(path) {
        RouteDecision::Allow(tree)
    } else {
        RouteDecision::Redirect(tree.home())
    }
}

/// Drop a single trailing slash (but keep `/` itself).
fn normalize(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) if p.starts_with('{') && p.ends_with('}') => {
                if s.is_empty() {
                    return false;
                }
            }
            (Some(p), Some(s)) if p == s => {}
            _ => return false,
        }
    }
}
