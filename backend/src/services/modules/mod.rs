//! The generic module surface: every catalog entry gets the same four
//! routes, driven entirely by its `EntitySchema`.
//!
//! Registered routes under `/api/modules`:
//! - `GET  /`: module listing for the menu.
//! - `GET  /{key}/template`: empty upload template plus reference sheets.
//! - `GET  /{key}/export?format=xlsx|csv`: flattened existing records.
//! - `POST /{key}/upload`: multipart spreadsheet → reconciliation results.
//! - `POST /{key}/delete`: comma-separated id list → per-id outcomes.

use actix_web::web::{get, post, scope};
use actix_web::{HttpResponse, Scope};

mod delete;
mod export;
mod list;
mod template;
pub(crate) mod upload;

const API_PATH: &str = "/api/modules";

/// Configures and returns the Actix scope for the schema-driven module
/// routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/{key}/template", get().to(template::process))
        .route("/{key}/export", get().to(export::process))
        .route("/{key}/upload", post().to(upload::process))
        .route("/{key}/delete", post().to(delete::process))
}

pub(crate) fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().body("not logged in or session expired")
}

pub(crate) fn unknown_module(key: &str) -> HttpResponse {
    HttpResponse::NotFound().body(format!("unknown module: {key}"))
}
