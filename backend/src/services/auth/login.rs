use actix_web::{web, HttpResponse, Responder};
use log::{info, warn};

use common::requests::{LoginRequest, LoginResponse};

use crate::auth::{self, AuthError};
use crate::state::PortalState;

/// `POST /api/auth/login` — exchange credentials for a bearer token and
/// open the session. No retry; the failure reason is shown to the operator.
pub(crate) async fn process(
    state: web::Data<PortalState>,
    payload: web::Json<LoginRequest>,
) -> impl Responder {
    let req = payload.into_inner();

    match auth::login(
        &state.http,
        &state.config.client_credential,
        &req.host,
        &req.username,
        &req.password,
    )
    .await
    {
        Ok(session) => {
            info!("{} logged in against {}", session.username, session.base_host);
            let body = LoginResponse {
                username: session.username.clone(),
                expires_in_secs: state.sessions.ttl_secs(),
            };
            state.sessions.establish(session).await;
            HttpResponse::Ok().json(body)
        }
        Err(e @ AuthError::InvalidCredentials) => {
            warn!("login rejected for {}", req.username);
            HttpResponse::Unauthorized().body(e.to_string())
        }
        Err(e) => {
            warn!("login failed: {e}");
            HttpResponse::BadGateway().body(e.to_string())
        }
    }
}
