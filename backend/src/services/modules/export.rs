use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::catalog;
use crate::engine::export::{export_records, ExportError, ExportFormat};
use crate::state::PortalState;

use super::{unauthorized, unknown_module};

#[derive(Deserialize)]
pub(crate) struct ExportQuery {
    format: Option<String>,
}

/// `GET /api/modules/{key}/export` — all existing records, flattened back
/// into spreadsheet rows.
pub(crate) async fn process(
    state: web::Data<PortalState>,
    key: web::Path<String>,
    query: web::Query<ExportQuery>,
) -> impl Responder {
    let Some((api, session)) = state.authorized().await else {
        return unauthorized();
    };
    let Some(schema) = catalog::find(&key) else {
        return unknown_module(&key);
    };
    let Some(format) = ExportFormat::from_query(query.format.as_deref()) else {
        return HttpResponse::BadRequest().body("format must be xlsx or csv");
    };

    match export_records(&api, &schema, &session.base_host, format).await {
        Ok(file) => HttpResponse::Ok()
            .content_type(file.format.content_type())
            .insert_header((
                "Content-Disposition",
                format!(
                    "attachment; filename=\"{}_export.{}\"",
                    schema.key,
                    file.format.extension()
                ),
            ))
            .body(file.bytes),
        Err(e @ (ExportError::Fetch { .. } | ExportError::Transport { .. } | ExportError::Malformed { .. })) => {
            HttpResponse::BadGateway().body(e.to_string())
        }
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}
