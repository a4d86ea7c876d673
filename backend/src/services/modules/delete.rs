use actix_web::{web, HttpResponse, Responder};

use common::model::result::DeleteResponse;
use common::requests::DeleteRequest;

use crate::catalog;
use crate::engine::reconcile::{delete_ids, parse_delete_ids};
use crate::state::PortalState;

use super::{unauthorized, unknown_module};

/// `POST /api/modules/{key}/delete` — one independent DELETE per parseable
/// id. Backend refusals (referential integrity) are surfaced verbatim.
pub(crate) async fn process(
    state: web::Data<PortalState>,
    key: web::Path<String>,
    payload: web::Json<DeleteRequest>,
) -> impl Responder {
    let Some((api, session)) = state.authorized().await else {
        return unauthorized();
    };
    let Some(schema) = catalog::find(&key) else {
        return unknown_module(&key);
    };
    if schema.download_only {
        return HttpResponse::MethodNotAllowed().body("this module is download-only");
    }

    let ids = parse_delete_ids(&payload.ids);
    let results = delete_ids(&api, &schema, &session.base_host, &ids).await;

    HttpResponse::Ok().json(DeleteResponse {
        module: schema.key.to_string(),
        results,
    })
}
