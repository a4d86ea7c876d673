//! Downloadable upload templates: an empty primary sheet with the schema's
//! columns plus live "reference data" sheets fetched from the backend.
//!
//! A failed reference lookup degrades to a headers-only sheet; template
//! downloads never hard-fail because a lookup did.

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use serde_json::Value;
use thiserror::Error;

use common::model::schema::{EntitySchema, ReferenceSheet};

use crate::client::{resource_url, ResourceClient};

use super::export;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("could not assemble workbook: {0}")]
    Workbook(String),

    #[error("failed to fetch {resource}: {detail}")]
    Fetch { resource: String, detail: String },

    #[error("no data available in {resource}")]
    NoData { resource: String },
}

impl From<XlsxError> for TemplateError {
    fn from(e: XlsxError) -> Self {
        TemplateError::Workbook(e.to_string())
    }
}

/// Build the template workbook for a module.
///
/// Declarative modules emit their configured columns; download-only lookup
/// modules mirror the columns of the live data and ship it as a second
/// sheet, so the fetch is mandatory for them.
pub async fn build_template<C: ResourceClient>(
    client: &C,
    schema: &EntitySchema,
    host: &str,
) -> Result<Vec<u8>, TemplateError> {
    let mut workbook = Workbook::new();

    if schema.download_only {
        let records = fetch_all(client, host, schema.resource).await?;
        if records.is_empty() {
            return Err(TemplateError::NoData {
                resource: schema.resource.to_string(),
            });
        }
        let (headers, rows) = export::flatten_generic(&records);

        let mut template = Worksheet::new();
        template.set_name(schema.template_sheet)?;
        write_headers(&mut template, &headers)?;
        workbook.push_worksheet(template);

        let mut existing = Worksheet::new();
        existing.set_name("Existing_Data")?;
        write_headers(&mut existing, &headers)?;
        write_rows(&mut existing, &headers, &rows)?;
        workbook.push_worksheet(existing);
    } else {
        let mut template = Worksheet::new();
        template.set_name(schema.template_sheet)?;
        write_headers(&mut template, &schema.columns())?;
        workbook.push_worksheet(template);

        for reference in &schema.reference_sheets {
            workbook.push_worksheet(reference_sheet(client, host, reference).await?);
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| TemplateError::Workbook(e.to_string()))
}

/// One read-only reference sheet. Fetch problems leave the rows empty.
pub async fn reference_sheet<C: ResourceClient>(
    client: &C,
    host: &str,
    reference: &ReferenceSheet,
) -> Result<Worksheet, TemplateError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(reference.sheet)?;
    let headers: Vec<String> = reference.fields.iter().map(|f| f.to_string()).collect();
    write_headers(&mut sheet, &headers)?;

    let records = match fetch_all(client, host, reference.resource).await {
        Ok(records) => records,
        Err(e) => {
            log::warn!("reference sheet {} degraded to headers only: {e}", reference.sheet);
            return Ok(sheet);
        }
    };

    for (i, record) in records.iter().enumerate() {
        for (j, field) in reference.fields.iter().enumerate() {
            let value = record.get(*field).cloned().unwrap_or(Value::Null);
            write_value(&mut sheet, (i + 1) as u32, j as u16, &value)?;
        }
    }
    Ok(sheet)
}

async fn fetch_all<C: ResourceClient>(
    client: &C,
    host: &str,
    resource: &str,
) -> Result<Vec<Value>, TemplateError> {
    let fetch_err = |detail: String| TemplateError::Fetch {
        resource: resource.to_string(),
        detail,
    };

    let resp = client
        .get(&resource_url(host, resource))
        .await
        .map_err(|e| fetch_err(e.to_string()))?;
    if resp.status != 200 {
        return Err(fetch_err(format!("HTTP {}", resp.status)));
    }
    match resp.json() {
        Ok(Value::Array(records)) => Ok(records),
        Ok(_) => Err(fetch_err("expected a JSON array".to_string())),
        Err(e) => Err(fetch_err(e.to_string())),
    }
}

fn write_headers(sheet: &mut Worksheet, headers: &[String]) -> Result<(), XlsxError> {
    for (j, header) in headers.iter().enumerate() {
        sheet.write_string(0, j as u16, header.as_str())?;
    }
    Ok(())
}

fn write_rows(
    sheet: &mut Worksheet,
    headers: &[String],
    rows: &[std::collections::HashMap<String, Value>],
) -> Result<(), XlsxError> {
    for (i, row) in rows.iter().enumerate() {
        for (j, header) in headers.iter().enumerate() {
            if let Some(value) = row.get(header) {
                write_value(sheet, (i + 1) as u32, j as u16, value)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn write_value(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
) -> Result<(), XlsxError> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => {
            sheet.write_number(row, col, n.as_f64().unwrap_or(0.0))?;
        }
        Value::String(s) => {
            sheet.write_string(row, col, s.as_str())?;
        }
        other => {
            let text = other.to_string();
            sheet.write_string(row, col, text.as_str())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiResponse, ClientError};

    /// Always-failing client: every call reports a refused connection.
    struct DownClient;

    impl ResourceClient for DownClient {
        async fn get(&self, _url: &str) -> Result<ApiResponse, ClientError> {
            Err(ClientError::Connect("refused".to_string()))
        }
        async fn get_query(
            &self,
            _url: &str,
            _query: &[(&str, String)],
        ) -> Result<ApiResponse, ClientError> {
            Err(ClientError::Connect("refused".to_string()))
        }
        async fn post(&self, _url: &str, _body: &Value) -> Result<ApiResponse, ClientError> {
            Err(ClientError::Connect("refused".to_string()))
        }
        async fn put(&self, _url: &str, _body: &Value) -> Result<ApiResponse, ClientError> {
            Err(ClientError::Connect("refused".to_string()))
        }
        async fn delete(&self, _url: &str) -> Result<ApiResponse, ClientError> {
            Err(ClientError::Connect("refused".to_string()))
        }
    }

    #[actix_web::test]
    async fn template_survives_reference_fetch_failure() {
        // paycode_event_sets declares a reference sheet; with the backend
        // down the workbook must still be produced.
        let schema = crate::catalog::find("paycode_event_sets").unwrap();
        let bytes = build_template(&DownClient, &schema, "https://down.example")
            .await
            .unwrap();
        assert!(!bytes.is_empty());
    }

    #[actix_web::test]
    async fn lookup_template_requires_live_data() {
        let schema = crate::catalog::find("employee_lookup_table").unwrap();
        let err = build_template(&DownClient, &schema, "https://down.example")
            .await
            .unwrap_err();
        assert!(matches!(err, TemplateError::Fetch { .. }));
    }
}
