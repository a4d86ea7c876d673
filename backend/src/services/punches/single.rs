use actix_web::{web, HttpResponse, Responder};

use common::requests::SinglePunchRequest;

use crate::state::PortalState;

use super::{action_url, punch_payload};
use crate::client::ResourceClient;
use crate::services::modules::unauthorized;

/// `POST /api/punches/single` — one punch for one employee.
pub(crate) async fn process(
    state: web::Data<PortalState>,
    payload: web::Json<SinglePunchRequest>,
) -> impl Responder {
    let Some((api, session)) = state.authorized().await else {
        return unauthorized();
    };

    let body = match punch_payload(&payload.external_number, &payload.date, &payload.time) {
        Ok(body) => body,
        Err(e) => return HttpResponse::BadRequest().body(e),
    };

    match api.post(&action_url(&session.base_host), &body).await {
        Ok(resp) if resp.status == 200 => HttpResponse::Ok().json(serde_json::json!({
            "status": "Success",
            "punchTime": body["punch"]["punchTime"],
        })),
        Ok(resp) => HttpResponse::Ok().json(serde_json::json!({
            "status": "Failed",
            "http_status": resp.status,
            "message": resp.body,
        })),
        Err(e) => HttpResponse::Ok().json(serde_json::json!({
            "status": "Failed",
            "message": e.to_string(),
        })),
    }
}
