//! Download of existing records: fetch everything, flatten nested entry
//! lists back into numbered columns (or one row per entry), and render as
//! a workbook or flat CSV.

use std::collections::HashMap;

use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::Value;
use thiserror::Error;

use common::model::schema::{EntitySchema, EntryPart, Grouping};

use crate::client::{resource_url, ResourceClient};

use super::template;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to fetch {resource} (HTTP {status}): {body}")]
    Fetch {
        resource: String,
        status: u16,
        body: String,
    },

    #[error("could not reach {resource}: {detail}")]
    Transport { resource: String, detail: String },

    #[error("unexpected response shape from {resource}: {detail}")]
    Malformed { resource: String, detail: String },

    #[error("could not assemble workbook: {0}")]
    Workbook(String),

    #[error("could not assemble CSV: {0}")]
    Csv(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn from_query(raw: Option<&str>) -> Option<Self> {
        match raw {
            None | Some("xlsx") => Some(ExportFormat::Xlsx),
            Some("csv") => Some(ExportFormat::Csv),
            Some(_) => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

pub struct ExportFile {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
}

/// Fetch all remote records of the module's resource and flatten them into
/// spreadsheet rows.
pub async fn export_records<C: ResourceClient>(
    client: &C,
    schema: &EntitySchema,
    host: &str,
    format: ExportFormat,
) -> Result<ExportFile, ExportError> {
    let records = fetch_all(client, schema, host).await?;

    let (headers, rows) = if schema.download_only {
        flatten_generic(&records)
    } else {
        flatten_schema(schema, &records)
    };

    let bytes = match format {
        ExportFormat::Csv => to_csv(&headers, &rows)?,
        ExportFormat::Xlsx => to_xlsx(client, schema, host, &headers, &rows).await?,
    };
    Ok(ExportFile { bytes, format })
}

async fn fetch_all<C: ResourceClient>(
    client: &C,
    schema: &EntitySchema,
    host: &str,
) -> Result<Vec<Value>, ExportError> {
    let resource = schema.resource.to_string();
    let resp = client
        .get(&resource_url(host, schema.resource))
        .await
        .map_err(|e| ExportError::Transport {
            resource: resource.clone(),
            detail: e.to_string(),
        })?;
    if resp.status != 200 {
        return Err(ExportError::Fetch {
            resource,
            status: resp.status,
            body: resp.body,
        });
    }
    match resp.json() {
        Ok(Value::Array(records)) => Ok(records),
        Ok(_) => Err(ExportError::Malformed {
            resource,
            detail: "expected a JSON array".to_string(),
        }),
        Err(e) => Err(ExportError::Malformed {
            resource,
            detail: e.to_string(),
        }),
    }
}

type FlatRows = (Vec<String>, Vec<HashMap<String, Value>>);

/// Flatten records per the schema: numbered family columns for
/// self-contained modules, one output row per sub-entry for row-per-entry
/// modules.
pub fn flatten_schema(schema: &EntitySchema, records: &[Value]) -> FlatRows {
    let mut rows: Vec<HashMap<String, Value>> = Vec::new();
    // A record may carry more entries than the template declares slots;
    // extra numbered columns are appended rather than truncated.
    let mut slot_usage: HashMap<&str, u16> = HashMap::new();

    for record in records {
        let mut base = HashMap::new();
        if !schema.id_column.is_empty() {
            base.insert(
                schema.id_column.to_string(),
                record.get("id").cloned().unwrap_or(Value::Null),
            );
        }
        for field in &schema.base_fields {
            let value = if field.id_ref {
                record
                    .pointer(&format!("/{}/id", field.json))
                    .cloned()
                    .unwrap_or(Value::Null)
            } else {
                record.get(field.json).cloned().unwrap_or(Value::Null)
            };
            base.insert(field.column.to_string(), value);
        }

        match schema.grouping {
            Grouping::RowPerEntry => {
                let Some(family) = schema.families.first() else {
                    rows.push(base);
                    continue;
                };
                let entries = sorted_entries(record, family.json_field, family.order_json);
                if entries.is_empty() {
                    rows.push(base);
                    continue;
                }
                for entry in entries {
                    let mut row = base.clone();
                    write_entry_columns(&mut row, family, &entry, 0);
                    rows.push(row);
                }
            }
            Grouping::SelfContained => {
                let mut row = base;
                for family in &schema.families {
                    let entries = sorted_entries(record, family.json_field, family.order_json);
                    let used = slot_usage.entry(family.json_field).or_insert(0);
                    *used = (*used).max(entries.len() as u16);
                    for (i, entry) in entries.iter().enumerate() {
                        write_entry_columns(&mut row, family, entry, (i + 1) as u16);
                    }
                }
                rows.push(row);
            }
        }
    }

    let mut headers = Vec::new();
    if !schema.id_column.is_empty() {
        headers.push(schema.id_column.to_string());
    }
    for field in &schema.base_fields {
        headers.push(field.column.to_string());
    }
    for family in &schema.families {
        if family.slots == 0 {
            headers.extend(family.slot_columns(0));
        } else {
            let used = slot_usage.get(family.json_field).copied().unwrap_or(0);
            for slot in 1..=family.slots.max(used) {
                headers.extend(family.slot_columns(slot));
            }
        }
    }
    (headers, rows)
}

fn sorted_entries(record: &Value, json_field: &str, order_json: Option<&str>) -> Vec<Value> {
    let mut entries: Vec<Value> = record
        .get(json_field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if let Some(key) = order_json {
        entries.sort_by_key(|e| e.get(key).and_then(Value::as_i64).unwrap_or(0));
    }
    entries
}

fn write_entry_columns(row: &mut HashMap<String, Value>, family: &common::model::schema::EntryFamily, entry: &Value, slot: u16) {
    let col = |c: &str| {
        if family.slots == 0 {
            c.to_string()
        } else {
            format!("{c}{slot}")
        }
    };
    for part in &family.parts {
        match part {
            EntryPart::Cell { column, json, .. } => {
                if let Some(v) = entry.get(*json) {
                    row.insert(col(column), v.clone());
                }
            }
            EntryPart::IdRef { column, json, .. } => {
                if let Some(v) = entry.pointer(&format!("/{json}/id")) {
                    row.insert(col(column), v.clone());
                }
            }
            EntryPart::BareId { column, .. } => {
                if let Some(v) = entry.get("id") {
                    row.insert(col(column), v.clone());
                }
            }
            EntryPart::DateParts {
                column,
                year_json,
                month_json,
                day_json,
            } => {
                let y = entry.get(*year_json).and_then(Value::as_i64);
                let m = entry.get(*month_json).and_then(Value::as_i64);
                let d = entry.get(*day_json).and_then(Value::as_i64);
                if let (Some(y), Some(m), Some(d)) = (y, m, d) {
                    row.insert(col(column), Value::String(format!("{y:04}-{m:02}-{d:02}")));
                }
            }
            EntryPart::Const { .. } => {}
        }
    }
}

/// Dot-flatten arbitrary records (lookup tables whose columns are not
/// declared up front). Arrays are kept as JSON text.
pub fn flatten_generic(records: &[Value]) -> FlatRows {
    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::new();

    for record in records {
        let mut flat = Vec::new();
        flatten_into(String::new(), record, &mut flat);
        let mut row = HashMap::new();
        for (key, value) in flat {
            if !headers.contains(&key) {
                headers.push(key.clone());
            }
            row.insert(key, value);
        }
        rows.push(row);
    }
    (headers, rows)
}

fn flatten_into(prefix: String, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten_into(key, v, out);
            }
        }
        other => out.push((prefix, other.clone())),
    }
}

fn to_csv(headers: &[String], rows: &[HashMap<String, Value>]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(headers)
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    for row in rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(h).map(cell_string).unwrap_or_default())
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| ExportError::Csv(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))
}

async fn to_xlsx<C: ResourceClient>(
    client: &C,
    schema: &EntitySchema,
    host: &str,
    headers: &[String],
    rows: &[HashMap<String, Value>],
) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let mut sheet = Worksheet::new();
    sheet
        .set_name(schema.template_sheet)
        .map_err(|e| ExportError::Workbook(e.to_string()))?;
    for (j, header) in headers.iter().enumerate() {
        sheet
            .write_string(0, j as u16, header.as_str())
            .map_err(|e| ExportError::Workbook(e.to_string()))?;
    }
    for (i, row) in rows.iter().enumerate() {
        for (j, header) in headers.iter().enumerate() {
            if let Some(value) = row.get(header) {
                template::write_value(&mut sheet, (i + 1) as u32, j as u16, value)
                    .map_err(|e| ExportError::Workbook(e.to_string()))?;
            }
        }
    }
    workbook.push_worksheet(sheet);

    // Exports ship the same reference sheets as templates so a downloaded
    // file can be edited and re-uploaded without a second download.
    for reference in &schema.reference_sheets {
        let sheet = template::reference_sheet(client, host, reference)
            .await
            .map_err(|e| ExportError::Workbook(e.to_string()))?;
        workbook.push_worksheet(sheet);
    }

    workbook
        .save_to_buffer()
        .map_err(|e| ExportError::Workbook(e.to_string()))
}

/// Spreadsheet rendering of a JSON scalar: whole numbers without the
/// decimal tail, null as blank.
pub fn cell_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else {
                n.to_string()
            }
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn self_contained_records_flatten_to_numbered_columns() {
        let schema = crate::catalog::find("paycode_event_sets").unwrap();
        let records = vec![json!({
            "id": 12,
            "name": "Holidays",
            "description": "All holidays",
            "entries": [
                { "id": 2, "paycodeEvent": { "id": 77 }, "priority": 2 },
                { "id": 1, "paycodeEvent": { "id": 42 }, "priority": 1 }
            ]
        })];

        let (headers, rows) = flatten_schema(&schema, &records);
        assert!(headers.contains(&"PaycodeEvent1".to_string()));
        let row = &rows[0];
        // Ascending priority order, regardless of the list order.
        assert_eq!(row["PaycodeEvent1"], json!(42));
        assert_eq!(row["Priority1"], json!(1));
        assert_eq!(row["PaycodeEvent2"], json!(77));
        assert_eq!(row["id"], json!(12));
    }

    #[test]
    fn row_per_entry_records_emit_one_row_per_entry() {
        let schema = crate::catalog::find("timeoff_policy_sets").unwrap();
        let records = vec![json!({
            "id": 3,
            "name": "Set",
            "description": "d",
            "entries": [
                { "id": 10, "paycode": { "id": 5 } },
                { "id": 11, "paycode": { "id": 6 } }
            ]
        })];

        let (headers, rows) = flatten_schema(&schema, &records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["policy_id"], json!(10));
        assert_eq!(rows[1]["paycode_id"], json!(6));
        assert_eq!(headers.first().map(String::as_str), Some("id"));
    }

    #[test]
    fn extra_entries_extend_the_numbered_columns() {
        let schema = crate::catalog::find("shift_template_sets").unwrap();
        let slots = schema.families[0].slots as usize;
        let entries: Vec<Value> = (1..=slots + 2).map(|i| json!({ "id": i })).collect();
        let records = vec![json!({
            "id": 1, "name": "big", "description": "d", "entries": entries
        })];

        let (headers, rows) = flatten_schema(&schema, &records);
        assert!(headers.contains(&format!("entryId{}", slots + 2)));
        assert_eq!(rows[0][&format!("entryId{}", slots + 2)], json!(slots + 2));
    }

    #[test]
    fn generic_flatten_uses_dotted_keys() {
        let records = vec![json!({
            "id": 1,
            "employee": { "externalNumber": "E-77", "site": { "code": "HQ" } },
            "active": true
        })];
        let (headers, rows) = flatten_generic(&records);
        assert!(headers.contains(&"employee.site.code".to_string()));
        assert_eq!(rows[0]["employee.externalNumber"], json!("E-77"));
        assert_eq!(cell_string(&rows[0]["active"]), "true");
    }

    #[test]
    fn csv_bytes_round_trip_through_the_row_parser() {
        let schema = crate::catalog::find("timeoff_policy_sets").unwrap();
        let records = vec![json!({
            "id": 3, "name": "Set", "description": "d",
            "entries": [ { "id": 10, "paycode": { "id": 5 } } ]
        })];
        let (headers, rows) = flatten_schema(&schema, &records);
        let bytes = to_csv(&headers, &rows).unwrap();

        let parsed = crate::engine::rows::parse_upload("export.csv", &bytes).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].get("policy_id"), "10");
        assert_eq!(parsed.rows[0].get("name"), "Set");
    }
}
