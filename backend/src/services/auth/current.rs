use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;

use common::requests::SessionInfo;

use crate::state::PortalState;

/// `GET /api/auth/session` — who is logged in and for how much longer.
pub(crate) async fn process(state: web::Data<PortalState>) -> impl Responder {
    match state.sessions.current().await {
        Some(session) => HttpResponse::Ok().json(SessionInfo {
            expires_in_secs: session.expires_in_secs(Utc::now(), state.sessions.ttl_secs()),
            host: session.base_host,
            username: session.username,
        }),
        None => HttpResponse::Unauthorized().body("not logged in"),
    }
}
