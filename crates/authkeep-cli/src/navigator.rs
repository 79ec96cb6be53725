use authkeep_core::{Navigator, LOGIN_ROUTE};
use tracing::debug;

/// There are no views in a terminal; "going to the login view" means telling
/// the user how to sign back in.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: &str) {
        if route == LOGIN_ROUTE {
            eprintln!("Signed out. Run `authkeep login` to sign in again.");
        } else {
            debug!(route, "Ignoring navigation to unknown route");
        }
    }
}
