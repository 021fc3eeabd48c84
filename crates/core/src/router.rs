//! Client-side route table.
//!
//! Two static routes. Anything else falls back to `/`.

use std::fmt;

/// A known client route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Torrents,
}

impl Route {
    pub const ALL: [Route; 2] = [Route::Home, Route::Torrents];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Torrents => "/torrents",
        }
    }

    /// View template bound to this route.
    pub fn template(&self) -> &'static str {
        match self {
            Route::Home => "/routes/home.html",
            Route::Torrents => "/routes/torrents.html",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Result of resolving a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub route: Route,
    /// True when the path matched nothing and was sent to `/`.
    pub redirected: bool,
}

/// Map a path to its route.
pub fn resolve(path: &str) -> Resolution {
    let trimmed = path.trim_end_matches('/');
    let normalized = if trimmed.is_empty() { "/" } else { trimmed };

    match Route::ALL.into_iter().find(|r| r.path() == normalized) {
        Some(route) => Resolution {
            route,
            redirected: false,
        },
        None => Resolution {
            route: Route::Home,
            redirected: true,
        },
    }
}
