use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};

use common::model::result::{RowAction, UploadResponse, UploadResult};

use crate::client::ResourceClient;
use crate::engine::rows::parse_upload;
use crate::services::modules::{unauthorized, upload::read_upload};
use crate::state::PortalState;

use super::{action_url, punch_payload};

/// `POST /api/punches/upload` — bulk punches from a spreadsheet with
/// `externalNumber`, `date`, `time` columns. One POST per row, strictly
/// sequential; failures are collected, never fatal.
pub(crate) async fn process(state: web::Data<PortalState>, payload: Multipart) -> impl Responder {
    let Some((api, session)) = state.authorized().await else {
        return unauthorized();
    };

    let (filename, bytes, _digest) = match read_upload(payload).await {
        Ok(file) => file,
        Err(e) => return HttpResponse::BadRequest().body(e),
    };
    let rows = match parse_upload(&filename, &bytes) {
        Ok(rows) => rows,
        Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
    };

    let url = action_url(&session.base_host);
    let mut results = Vec::new();

    for row in &rows.rows {
        let external_number = row.get("externalNumber").trim().to_string();
        let body = match punch_payload(&external_number, row.get("date"), row.get("time")) {
            Ok(body) => body,
            Err(e) => {
                results.push(UploadResult {
                    row: Some(row.line),
                    key: external_number,
                    action: RowAction::Error,
                    http_status: None,
                    status: "Error".to_string(),
                    message: e,
                });
                continue;
            }
        };

        let result = match api.post(&url, &body).await {
            Ok(resp) => UploadResult {
                row: Some(row.line),
                key: external_number,
                action: RowAction::Create,
                http_status: Some(resp.status),
                status: if resp.status == 200 { "Success" } else { "Failed" }.to_string(),
                message: resp.body,
            },
            Err(e) => UploadResult {
                row: Some(row.line),
                key: external_number,
                action: RowAction::Create,
                http_status: None,
                status: "Failed".to_string(),
                message: e.to_string(),
            },
        };
        results.push(result);
    }

    HttpResponse::Ok().json(UploadResponse {
        module: "punches".to_string(),
        rows_detected: rows.rows.len(),
        duplicate_upload: false,
        results,
    })
}
