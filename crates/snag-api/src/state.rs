//! Shared application state.

use std::sync::Arc;

use snag_service::Services;

/// State handed to every route handler: the assembled service layer plus
/// the transport flags.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    /// Accept the development identity headers (X-User-Id / X-Roles)
    /// instead of requiring a bearer credential. Off in production.
    pub dev_auth: bool,
}

impl AppState {
    pub fn new(services: Arc<Services>, dev_auth: bool) -> Self {
        Self { services, dev_auth }
    }
}
