use actix_web::{web, HttpResponse, Responder};

use crate::state::PortalState;

/// `POST /api/auth/logout` — clear the session and the per-module
/// duplicate-upload memory.
pub(crate) async fn process(state: web::Data<PortalState>) -> impl Responder {
    state.end_session().await;
    HttpResponse::Ok().body("logged out")
}
