use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::{json, Value};

use common::model::result::{RowAction, UploadResponse, UploadResult};

use crate::client::{resource_url, timecard_proxy_url, ResourceClient};
use crate::engine::cell;
use crate::engine::rows::{parse_upload, SourceRow};
use crate::services::modules::{unauthorized, upload::read_upload};
use crate::state::PortalState;

const TIMECARD_ATTRIBUTES: &str =
    "attendancePunches(organizationLocation|shiftTemplate),schedule(shiftTemplate)";

#[derive(Deserialize)]
pub(crate) struct TimecardQuery {
    preview: Option<bool>,
}

/// `POST /api/timecards/upload` — columns `externalNumber`,
/// `attendanceDate`, `paycode_id`. With `?preview=true` the payloads are
/// built and returned but nothing is posted.
pub(crate) async fn process(
    state: web::Data<PortalState>,
    query: web::Query<TimecardQuery>,
    payload: Multipart,
) -> impl Responder {
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

    let preview = query.preview.unwrap_or(false);
    let mut results = Vec::new();
    for row in &rows.rows {
        results.push(process_row(&api, &session.base_host, row, preview).await);
    }

    HttpResponse::Ok().json(UploadResponse {
        module: "timecard_updation".to_string(),
        rows_detected: rows.rows.len(),
        duplicate_upload: false,
        results,
    })
}

async fn process_row<C: ResourceClient>(
    api: &C,
    host: &str,
    row: &SourceRow,
    preview: bool,
) -> UploadResult {
    let external_number = row.get("externalNumber").trim().to_string();

    match build_update(api, host, row, &external_number).await {
        Ok(body) if preview => UploadResult {
            row: Some(row.line),
            key: external_number,
            action: RowAction::Skipped,
            http_status: None,
            status: "Preview".to_string(),
            message: body.to_string(),
        },
        Ok(body) => match api.post(&resource_url(host, "timecards"), &body).await {
            Ok(resp) => UploadResult {
                row: Some(row.line),
                key: external_number,
                action: RowAction::Update,
                http_status: Some(resp.status),
                status: if matches!(resp.status, 200 | 201) { "Success" } else { "Failed" }
                    .to_string(),
                message: resp.body,
            },
            Err(e) => UploadResult {
                row: Some(row.line),
                key: external_number,
                action: RowAction::Update,
                http_status: None,
                status: "Failed".to_string(),
                message: e.to_string(),
            },
        },
        Err(message) => UploadResult {
            row: Some(row.line),
            key: external_number,
            action: RowAction::Error,
            http_status: None,
            status: "Error".to_string(),
            message,
        },
    }
}

/// Read the timecard and assemble the paycode-change payload: the matching
/// attendance paycode supplies the employee id and the version the backend
/// checks on write.
async fn build_update<C: ResourceClient>(
    api: &C,
    host: &str,
    row: &SourceRow,
    external_number: &str,
) -> Result<Value, String> {
    if external_number.is_empty() {
        return Err("externalNumber is mandatory".to_string());
    }
    let paycode_id = cell::parse_id(row.get("paycode_id"))
        .ok_or_else(|| format!("invalid paycode_id '{}'", row.get("paycode_id")))?;
    let attendance_date = cell::normalize_date(row.get("attendanceDate"))
        .ok_or_else(|| format!("invalid attendanceDate '{}'", row.get("attendanceDate")))?;

    let query: Vec<(&str, String)> = vec![
        ("attributes", TIMECARD_ATTRIBUTES.to_string()),
        ("startDate", attendance_date.clone()),
        ("endDate", attendance_date.clone()),
        ("externalNumber", external_number.to_string()),
    ];
    let resp = api
        .get_query(&timecard_proxy_url(host), &query)
        .await
        .map_err(|e| e.to_string())?;
    if resp.status != 200 {
        return Err(format!("timecard lookup failed (HTTP {})", resp.status));
    }

    let timecards = resp.json().map_err(|e| e.to_string())?;
    let timecard = timecards
        .as_array()
        .and_then(|a| a.first())
        .ok_or_else(|| "no timecard found".to_string())?;
    let paycodes = timecard
        .get("attendancePaycodes")
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| "attendancePaycodes not found in response".to_string())?;
    let matched = paycodes
        .iter()
        .find(|ap| ap.get("attendanceDate").and_then(Value::as_str) == Some(&attendance_date))
        .ok_or_else(|| "no matching attendancePaycode for given date".to_string())?;

    let employee_id = matched
        .pointer("/employee/id")
        .cloned()
        .ok_or_else(|| "attendancePaycode has no employee id".to_string())?;
    let version = matched
        .get("version")
        .cloned()
        .ok_or_else(|| "attendancePaycode has no version".to_string())?;

    Ok(json!({
        "attendanceDate": attendance_date,
        "entries": [
            {
                "index": 0,
                "employee": { "id": employee_id },
                "attendancePaycode": {
                    "employee": { "id": employee_id },
                    "attendanceDate": attendance_date,
                    "paycode": { "id": paycode_id },
                    "version": version
                }
            }
        ]
    }))
}
