//! Reconciliation: one HTTP write per entity group, results as data.
//!
//! The loop never aborts: every group ends as exactly one `UploadResult`,
//! whether it validated, hit the wire, or failed transport.

use serde_json::{json, Value};

use common::model::result::{DeleteOutcome, RowAction, UploadResult};
use common::model::schema::{EntitySchema, UpdateStrategy};

use crate::client::{resource_url, ResourceClient};

use super::group::{group_rows, EntityGroup};
use super::rows::UploadRows;
use super::{cell, entries, payload, EngineOptions};

/// Process a parsed upload against the remote resource. Strictly
/// sequential: one group at a time, exactly one PUT or POST per group.
pub async fn reconcile<C: ResourceClient>(
    client: &C,
    schema: &EntitySchema,
    host: &str,
    upload: &UploadRows,
    opts: &EngineOptions,
) -> Vec<UploadResult> {
    let base = resource_url(host, schema.resource);
    let mut results = Vec::new();

    for group in group_rows(schema, &upload.rows) {
        results.push(process_group(client, schema, &base, &group, opts).await);
    }
    results
}

async fn process_group<C: ResourceClient>(
    client: &C,
    schema: &EntitySchema,
    base: &str,
    group: &EntityGroup,
    opts: &EngineOptions,
) -> UploadResult {
    let key = group.key.to_string();
    let row = Some(group.first_line());
    let target_id = group.key.target_id();
    let intended = if target_id.is_some() {
        RowAction::Update
    } else {
        RowAction::Create
    };

    // Validation and payload assembly; any failure is this group's result.
    let mut body = match payload::build_base(schema, group) {
        Ok(body) => body,
        Err(e) => return error_result(row, key, e.to_string()),
    };
    for family in &schema.families {
        match entries::build_entries(family, group, opts) {
            Ok(list) => {
                body.insert(family.json_field.to_string(), Value::Array(list));
            }
            Err(e) => return error_result(row, key, e.to_string()),
        }
    }

    if let Some(id) = target_id {
        body.insert("id".to_string(), json!(id));
        if schema.update == UpdateStrategy::MergeEntries {
            if let Err(message) = merge_existing(client, schema, base, id, &mut body).await {
                return error_result(row, key, message);
            }
        }
    }

    let payload = Value::Object(body);
    let sent = match target_id {
        Some(id) => client.put(&format!("{base}/{id}"), &payload).await,
        None => client.post(base, &payload).await,
    };

    match sent {
        Ok(resp) => UploadResult {
            row,
            key,
            action: intended,
            http_status: Some(resp.status),
            status: if resp.is_success() { "Success" } else { "Failed" }.to_string(),
            message: resp.body,
        },
        Err(e) => UploadResult {
            row,
            key,
            action: intended,
            http_status: None,
            status: "Failed".to_string(),
            message: e.to_string(),
        },
    }
}

fn error_result(row: Option<usize>, key: String, message: String) -> UploadResult {
    UploadResult {
        row,
        key,
        action: RowAction::Error,
        http_status: None,
        status: "Error".to_string(),
        message,
    }
}

/// Write-preserving update: fetch the record being replaced, re-attach the
/// ids of sub-entries the upload names, and carry over sub-entries it does
/// not, so a partial spreadsheet cannot truncate remote data.
async fn merge_existing<C: ResourceClient>(
    client: &C,
    schema: &EntitySchema,
    base: &str,
    id: i64,
    body: &mut serde_json::Map<String, Value>,
) -> Result<(), String> {
    let resp = client
        .get(&format!("{base}/{id}"))
        .await
        .map_err(|e| e.to_string())?;
    if resp.status != 200 {
        return Err(format!("unable to fetch existing record {id} (HTTP {})", resp.status));
    }
    let existing = resp.json().map_err(|e| e.to_string())?;

    for family in &schema.families {
        let Some(pointer) = family.dedup_pointer else { continue };
        let Some(existing_list) = existing.get(family.json_field).and_then(Value::as_array) else {
            continue;
        };
        let Some(Value::Array(uploaded)) = body.get_mut(family.json_field) else {
            continue;
        };

        let mut named: Vec<Value> = Vec::new();
        for entry in uploaded.iter_mut() {
            let Some(ref_id) = entry.pointer(pointer).cloned() else { continue };
            named.push(ref_id.clone());
            let previous = existing_list
                .iter()
                .find(|e| e.pointer(pointer) == Some(&ref_id))
                .and_then(|e| e.get("id"));
            if let (Some(obj), Some(entry_id)) = (entry.as_object_mut(), previous) {
                obj.insert("id".to_string(), entry_id.clone());
            }
        }
        for remote in existing_list {
            match remote.pointer(pointer) {
                Some(ref_id) if !named.contains(ref_id) => uploaded.push(remote.clone()),
                _ => {}
            }
        }
    }
    Ok(())
}

/// Comma-separated delete input. Tokens that fail the float-then-int parse
/// are dropped before any HTTP call.
pub fn parse_delete_ids(input: &str) -> Vec<i64> {
    input.split(',').filter_map(cell::parse_id).collect()
}

/// Independent `DELETE {base}/{id}` per id; one failure never blocks the
/// rest, and failure bodies are surfaced verbatim.
pub async fn delete_ids<C: ResourceClient>(
    client: &C,
    schema: &EntitySchema,
    host: &str,
    ids: &[i64],
) -> Vec<DeleteOutcome> {
    let base = resource_url(host, schema.resource);
    let mut outcomes = Vec::new();

    for &id in ids {
        let outcome = match client.delete(&format!("{base}/{id}")).await {
            Ok(resp) => DeleteOutcome {
                id,
                http_status: Some(resp.status),
                deleted: resp.is_deleted(),
                message: resp.body,
            },
            Err(e) => DeleteOutcome {
                id,
                http_status: None,
                deleted: false,
                message: e.to_string(),
            },
        };
        if outcome.deleted {
            log::info!("deleted {} id {id}", schema.resource);
        } else {
            log::warn!("delete failed for {} id {id}: {}", schema.resource, outcome.message);
        }
        outcomes.push(outcome);
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiResponse, ClientError};
    use crate::engine::rows::parse_upload;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        method: &'static str,
        url: String,
        body: Option<Value>,
    }

    /// Recording fake: answers from a canned (method, url) table, default
    /// 200 with an empty object.
    #[derive(Default)]
    struct FakeClient {
        calls: Mutex<Vec<Call>>,
        canned: Vec<(&'static str, String, ApiResponse)>,
    }

    impl FakeClient {
        fn with(mut self, method: &'static str, url: &str, status: u16, body: &str) -> Self {
            self.canned.push((
                method,
                url.to_string(),
                ApiResponse { status, body: body.to_string() },
            ));
            self
        }

        fn record(&self, method: &'static str, url: &str, body: Option<&Value>) -> ApiResponse {
            self.calls.lock().unwrap().push(Call {
                method,
                url: url.to_string(),
                body: body.cloned(),
            });
            self.canned
                .iter()
                .find(|(m, u, _)| *m == method && u == url)
                .map(|(_, _, r)| r.clone())
                .unwrap_or(ApiResponse { status: 200, body: "{}".to_string() })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ResourceClient for FakeClient {
        async fn get(&self, url: &str) -> Result<ApiResponse, ClientError> {
            Ok(self.record("GET", url, None))
        }
        async fn get_query(
            &self,
            url: &str,
            _query: &[(&str, String)],
        ) -> Result<ApiResponse, ClientError> {
            Ok(self.record("GET", url, None))
        }
        async fn post(&self, url: &str, body: &Value) -> Result<ApiResponse, ClientError> {
            Ok(self.record("POST", url, Some(body)))
        }
        async fn put(&self, url: &str, body: &Value) -> Result<ApiResponse, ClientError> {
            Ok(self.record("PUT", url, Some(body)))
        }
        async fn delete(&self, url: &str) -> Result<ApiResponse, ClientError> {
            Ok(self.record("DELETE", url, None))
        }
    }

    const HOST: &str = "https://backend.example";

    fn opts() -> EngineOptions {
        EngineOptions { event_start_date: "2026-01-01".to_string() }
    }

    #[actix_web::test]
    async fn paycode_batch_mixes_create_update_and_error() {
        // Three paycode rows: create, update by id, and a blank-code row
        // that must fail validation without reaching the wire.
        let csv = "id,code,description\n,A1,Alpha\n5,B2,Beta\n,,x\n";
        let upload = parse_upload("paycodes.csv", csv.as_bytes()).unwrap();
        let schema = crate::catalog::find("paycodes").unwrap();
        let fake = FakeClient::default().with(
            "POST",
            "https://backend.example/resource-server/api/paycodes",
            201,
            "{\"id\":9}",
        );

        let results = reconcile(&fake, &schema, HOST, &upload, &opts()).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].action, RowAction::Create);
        assert!(results[0].is_success());
        assert_eq!(results[1].action, RowAction::Update);
        assert_eq!(results[1].http_status, Some(200));
        assert_eq!(results[2].action, RowAction::Error);
        assert_eq!(results[2].http_status, None);

        let calls = fake.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, "POST");
        assert_eq!(
            calls[1].url,
            "https://backend.example/resource-server/api/paycodes/5"
        );
        assert_eq!(calls[1].body.as_ref().unwrap()["code"], "B2");
        assert_eq!(calls[1].body.as_ref().unwrap()["id"], 5);
    }

    #[actix_web::test]
    async fn remote_rejection_keeps_the_batch_going() {
        let csv = "id,name,description\n,One,\n,Two,\n";
        let upload = parse_upload("accruals.csv", csv.as_bytes()).unwrap();
        let schema = crate::catalog::find("accruals").unwrap();
        let url = "https://backend.example/resource-server/api/accruals";
        let fake = FakeClient::default().with("POST", url, 409, "name already exists");

        let results = reconcile(&fake, &schema, HOST, &upload, &opts()).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, "Failed");
        assert_eq!(results[0].message, "name already exists");
        assert_eq!(fake.calls().len(), 2);
    }

    #[actix_web::test]
    async fn merge_update_attaches_entry_ids_and_preserves_unnamed() {
        let schema = crate::catalog::find("paycode_event_sets").unwrap();
        let base = "https://backend.example/resource-server/api/paycode_event_sets";
        let existing = serde_json::json!({
            "id": 12,
            "name": "Holidays",
            "entries": [
                { "id": 101, "paycodeEvent": { "id": 42 }, "priority": 1 },
                { "id": 102, "paycodeEvent": { "id": 77 }, "priority": 2 }
            ]
        });
        let fake = FakeClient::default().with("GET", &format!("{base}/12"), 200, &existing.to_string());

        let csv = "id,name,description,PaycodeEvent1,Priority1\n12,Holidays,,42,5\n";
        let upload = parse_upload("sets.csv", csv.as_bytes()).unwrap();
        let results = reconcile(&fake, &schema, HOST, &upload, &opts()).await;

        assert_eq!(results[0].action, RowAction::Update);
        let calls = fake.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].method, "PUT");
        let entries = calls[1].body.as_ref().unwrap()["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        // Uploaded entry re-attached to its existing id.
        assert_eq!(entries[0]["paycodeEvent"]["id"], 42);
        assert_eq!(entries[0]["id"], 101);
        assert_eq!(entries[0]["priority"], 5);
        // The entry the upload did not name is carried over untouched.
        assert_eq!(entries[1]["id"], 102);
        assert_eq!(entries[1]["paycodeEvent"]["id"], 77);
    }

    #[actix_web::test]
    async fn merge_update_fails_when_existing_record_is_unreadable() {
        let schema = crate::catalog::find("paycode_event_sets").unwrap();
        let base = "https://backend.example/resource-server/api/paycode_event_sets";
        let fake = FakeClient::default().with("GET", &format!("{base}/99"), 404, "not found");

        let csv = "id,name,description,PaycodeEvent1,Priority1\n99,Gone,,42,1\n";
        let upload = parse_upload("sets.csv", csv.as_bytes()).unwrap();
        let results = reconcile(&fake, &schema, HOST, &upload, &opts()).await;

        assert_eq!(results[0].action, RowAction::Error);
        // Only the GET went out; no PUT on a record we could not read.
        assert_eq!(fake.calls().len(), 1);
    }

    #[test]
    fn delete_input_filters_non_numeric_tokens() {
        assert_eq!(parse_delete_ids("12, 13, abc, 14"), vec![12, 13, 14]);
        assert_eq!(parse_delete_ids(""), Vec::<i64>::new());
        assert_eq!(parse_delete_ids("5.0,x,"), vec![5]);
    }

    #[actix_web::test]
    async fn delete_continues_past_failures() {
        let schema = crate::catalog::find("paycodes").unwrap();
        let base = "https://backend.example/resource-server/api/paycodes";
        let fake = FakeClient::default()
            .with("DELETE", &format!("{base}/13"), 409, "referenced by a timecard");

        let outcomes = delete_ids(&fake, &schema, HOST, &[12, 13, 14]).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].deleted);
        assert!(!outcomes[1].deleted);
        assert_eq!(outcomes[1].message, "referenced by a timecard");
        assert!(outcomes[2].deleted);
    }
}
