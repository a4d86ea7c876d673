//! Login, logout and session inspection.
//!
//! This is the portal's two-state machine: every other service asks the
//! session gate first and answers 401 once the token is missing or expired,
//! which sends the client back to the login screen.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod current;
mod login;
mod logout;

const API_PATH: &str = "/api/auth";

/// Configures and returns the Actix scope for the auth routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/login", post().to(login::process))
        .route("/logout", post().to(logout::process))
        .route("/session", get().to(current::process))
}
