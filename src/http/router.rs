//! Route registration.
//!
//! Thin wrapper around `axum::Router` that registers every pattern together
//! with its trailing-slash twin, so `/api` and `/api/` reach the same handler.

use axum::{routing::MethodRouter, Router};

#[derive(Debug, Clone, Default)]
pub struct Routes {
    router: Router,
}

/// Twin of `pattern` with the trailing slash toggled, if it has one.
fn twin(pattern: &str) -> Option<String> {
    if pattern == "/" || pattern.contains("{*") {
        return None;
    }
    match pattern.strip_suffix('/') {
        Some("") => None,
        Some(trimmed) => Some(trimmed.to_string()),
        None => Some(format!("{}/", pattern)),
    }
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `route` under `pattern` and its trailing-slash twin.
    ///
    /// Panics on invalid or overlapping patterns, like `axum::Router::route`.
    pub fn handle(mut self, pattern: &str, route: MethodRouter) -> Self {
        if let Some(twin) = twin(pattern) {
            self.router = self.router.route(&twin, route.clone());
        }
        self.router = self.router.route(pattern, route);
        self
    }

    /// Mount `routes` under `prefix`.
    pub fn nest(mut self, prefix: &str, routes: Routes) -> Self {
        self.router = self.router.nest(prefix, routes.router);
        self
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

impl From<Routes> for Router {
    fn from(routes: Routes) -> Self {
        routes.into_router()
    }
}
