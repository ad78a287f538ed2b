// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route table: which paths are public and which roles the others require.
//!
//! Patterns are either exact paths (`/api/health`) or prefixes ending in
//! `/**` (`/api/admin/**`, matching `/api/admin` and everything below it).

use super::roles::{Role, RoleSet};

/// Paths reachable without a token unless `PUBLIC_ROUTES` overrides them.
pub const DEFAULT_PUBLIC_ROUTES: &[&str] = &[
    "/api/auth/login",
    "/api/auth/logout",
    "/api/auth/validate",
    "/api/info",
    "/api/health",
    "/docs/**",
    "/api-doc/**",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Prefix(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim();
        if !pattern.starts_with('/') {
            return None;
        }
        match pattern.strip_suffix("/**") {
            Some(prefix) => Some(PathPattern::Prefix(prefix.to_string())),
            None => Some(PathPattern::Exact(pattern.to_string())),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Prefix(prefix) => match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
        }
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathPattern::Exact(path) => f.write_str(path),
            PathPattern::Prefix(prefix) => write!(f, "{prefix}/**"),
        }
    }
}

#[derive(Debug, Clone)]
struct RoleRule {
    pattern: PathPattern,
    roles: RoleSet,
}

/// Public allow-list plus per-route role requirements.
#[derive(Debug, Clone, Default)]
pub struct RoutePolicy {
    public: Vec<PathPattern>,
    rules: Vec<RoleRule>,
}

impl RoutePolicy {
    /// Build a policy from public patterns. Invalid patterns are skipped.
    pub fn new<'a>(public: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            public: public.into_iter().filter_map(PathPattern::parse).collect(),
            rules: Vec::new(),
        }
    }

    /// Default table: the built-in public routes and `ADMIN` for `/api/admin/**`.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_PUBLIC_ROUTES.iter().copied())
            .require("/api/admin/**", RoleSet::from([Role::ADMIN]))
    }

    /// Register a role requirement. Earlier rules take precedence.
    pub fn require(mut self, pattern: &str, roles: RoleSet) -> Self {
        if let Some(pattern) = PathPattern::parse(pattern) {
            self.rules.push(RoleRule { pattern, roles });
        }
        self
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public.iter().any(|p| p.matches(path))
    }

    /// Roles required for `path`, if any rule matches.
    pub fn required_roles(&self, path: &str) -> Option<&RoleSet> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map(|rule| &rule.roles)
    }

    pub fn public_patterns(&self) -> impl Iterator<Item = &PathPattern> {
        self.public.iter()
    }
}
