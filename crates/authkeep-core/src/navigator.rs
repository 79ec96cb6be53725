//! Redirecting the front end when the session ends.

/// Route of the login view
pub const LOGIN_ROUTE: &str = "/auth";

/// Moves the application UI to another view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator for headless embedders that have no view to redirect.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _route: &str) {}
}
