use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures_util::StreamExt;
use log::info;

use common::model::result::UploadResponse;

use crate::catalog;
use crate::engine::reconcile::reconcile;
use crate::engine::rows::parse_upload;
use crate::engine::EngineOptions;
use crate::state::PortalState;

use super::{unauthorized, unknown_module};

/// `POST /api/modules/{key}/upload` — multipart spreadsheet in,
/// reconciliation results out. Rows are processed strictly sequentially;
/// a bad row never aborts the batch.
pub(crate) async fn process(
    state: web::Data<PortalState>,
    key: web::Path<String>,
    payload: Multipart,
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

    let (filename, bytes, digest) = match read_upload(payload).await {
        Ok(file) => file,
        Err(e) => return HttpResponse::BadRequest().body(e),
    };

    // Soft duplicate guard: the identical bytes again in the same session
    // mean a double click, not a new upload. An edited file hashes fresh.
    if schema.guard_duplicate_upload {
        let hashes = state.upload_hashes.read().await;
        if hashes.get(schema.key).map(String::as_str) == Some(digest.as_str()) {
            return HttpResponse::Ok().json(UploadResponse {
                module: schema.key.to_string(),
                rows_detected: 0,
                duplicate_upload: true,
                results: vec![],
            });
        }
    }

    let rows = match parse_upload(&filename, &bytes) {
        Ok(rows) => rows,
        Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
    };
    info!("{}: processing upload {} ({} rows)", schema.key, filename, rows.rows.len());

    let opts = EngineOptions {
        event_start_date: state.config.event_start_date.clone(),
    };
    let results = reconcile(&api, &schema, &session.base_host, &rows, &opts).await;

    if schema.guard_duplicate_upload {
        state
            .upload_hashes
            .write()
            .await
            .insert(schema.key.to_string(), digest);
    }

    HttpResponse::Ok().json(UploadResponse {
        module: schema.key.to_string(),
        rows_detected: rows.rows.len(),
        duplicate_upload: false,
        results,
    })
}

/// Drain the multipart stream looking for the `file` field; hash the bytes
/// while buffering them.
pub(crate) async fn read_upload(mut payload: Multipart) -> Result<(String, Vec<u8>, String), String> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| e.to_string())?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        if filename.is_empty() {
            return Err("uploaded file has no filename".to_string());
        }

        let mut hasher = md5::Context::new();
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            hasher.consume(&chunk);
            bytes.extend_from_slice(&chunk);
        }
        return Ok((filename, bytes, format!("{:x}", hasher.finalize())));
    }
    Err("multipart payload is missing the 'file' field".to_string())
}
