use actix_web::{web, HttpResponse, Responder};

use crate::catalog;
use crate::engine::template::{build_template, TemplateError};
use crate::state::PortalState;

use super::{unauthorized, unknown_module};

pub(crate) const XLSX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// `GET /api/modules/{key}/template` — the empty upload template workbook.
pub(crate) async fn process(
    state: web::Data<PortalState>,
    key: web::Path<String>,
) -> impl Responder {
    let Some((api, session)) = state.authorized().await else {
        return unauthorized();
    };
    let Some(schema) = catalog::find(&key) else {
        return unknown_module(&key);
    };

    match build_template(&api, &schema, &session.base_host).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(XLSX_MIME)
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}_template.xlsx\"", schema.key),
            ))
            .body(bytes),
        Err(e @ TemplateError::NoData { .. }) => HttpResponse::NotFound().body(e.to_string()),
        Err(e @ TemplateError::Fetch { .. }) => HttpResponse::BadGateway().body(e.to_string()),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}
