//! Entity-level payload assembly from the base (non-family) columns of a
//! group.

use serde_json::{json, Map, Value};

use common::model::schema::{BaseField, CellDefault, CellKind, EntitySchema};

use super::cell;
use super::group::EntityGroup;
use super::ValidationError;

/// First non-blank value of a column across the group, with the invariant
/// that rows sharing a key must agree on entity-level fields.
fn gather(group: &EntityGroup, column: &str) -> Result<Option<(usize, String)>, ValidationError> {
    let mut found: Option<(usize, String)> = None;
    for row in &group.rows {
        let raw = row.get(column).trim();
        if raw.is_empty() {
            continue;
        }
        match &found {
            None => found = Some((row.line, raw.to_string())),
            Some((_, first)) if first != raw => {
                return Err(ValidationError::ConflictingField {
                    column: column.to_string(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(found)
}

/// Build the scalar part of the payload. Families are appended by the
/// caller.
pub fn build_base(schema: &EntitySchema, group: &EntityGroup) -> Result<Map<String, Value>, ValidationError> {
    let name = gather(group, schema.name_column)?.map(|(_, v)| v);
    let mut body = Map::new();

    for field in &schema.base_fields {
        let value = gather(group, field.column)?;
        match value {
            Some((line, raw)) => {
                body.insert(field.json.to_string(), coerce_base(field, &raw, line)?);
            }
            None => {
                if let (CellDefault::NameColumn, Some(name)) = (field.default, name.as_ref()) {
                    body.insert(field.json.to_string(), json!(name));
                } else if field.required {
                    return Err(ValidationError::MissingField {
                        row: group.first_line(),
                        column: field.column.to_string(),
                    });
                } else if field.kind == CellKind::Bool && !field.id_ref {
                    // Booleans are total: a blank cell means false, and the
                    // backend expects the field to be present.
                    body.insert(field.json.to_string(), json!(false));
                }
            }
        }
    }

    Ok(body)
}

fn coerce_base(field: &BaseField, raw: &str, line: usize) -> Result<Value, ValidationError> {
    let bad = |expected: &'static str| ValidationError::BadValue {
        row: line,
        column: field.column.to_string(),
        expected,
        value: raw.to_string(),
    };

    if field.id_ref {
        let id = cell::parse_id(raw).ok_or_else(|| bad("numeric id"))?;
        return Ok(json!({ "id": id }));
    }

    match field.kind {
        CellKind::Text => Ok(json!(raw)),
        CellKind::Int => cell::parse_int(raw).map(|v| json!(v)).ok_or_else(|| bad("number")),
        CellKind::Bool => Ok(json!(cell::parse_bool(raw, false))),
        CellKind::Time => cell::normalize_time_hm(raw)
            .map(|v| json!(v))
            .ok_or_else(|| bad("HH:MM time")),
        CellKind::Date => cell::normalize_date(raw)
            .map(|v| json!(v))
            .ok_or_else(|| bad("YYYY-MM-DD date")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::group::GroupKey;
    use crate::engine::rows::SourceRow;
    use std::collections::HashMap;

    fn row(line: usize, pairs: &[(&str, &str)]) -> SourceRow {
        let cells: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SourceRow::new(line, cells)
    }

    fn group_of(rows: Vec<SourceRow>) -> EntityGroup {
        EntityGroup {
            key: GroupKey::Name("g".to_string()),
            rows,
        }
    }

    #[test]
    fn description_defaults_to_name() {
        let schema = crate::catalog::find("accruals").unwrap();
        let g = group_of(vec![row(1, &[("name", "Annual Leave")])]);
        let body = build_base(&schema, &g).unwrap();
        assert_eq!(body["name"], "Annual Leave");
        assert_eq!(body["description"], "Annual Leave");
    }

    #[test]
    fn missing_mandatory_name_is_reported() {
        let schema = crate::catalog::find("accruals").unwrap();
        let g = group_of(vec![row(3, &[("description", "x")])]);
        match build_base(&schema, &g) {
            Err(ValidationError::MissingField { row, column }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "name");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn group_rows_must_agree_on_base_fields() {
        let schema = crate::catalog::find("timeoff_policy_sets").unwrap();
        let g = group_of(vec![
            row(1, &[("name", "Set A"), ("description", "one")]),
            row(2, &[("name", "Set A"), ("description", "two")]),
        ]);
        assert!(matches!(
            build_base(&schema, &g),
            Err(ValidationError::ConflictingField { .. })
        ));
    }

    #[test]
    fn blank_later_rows_do_not_conflict() {
        let schema = crate::catalog::find("timeoff_policy_sets").unwrap();
        let g = group_of(vec![
            row(1, &[("name", "Set A"), ("description", "one")]),
            row(2, &[("name", "Set A"), ("description", "")]),
        ]);
        let body = build_base(&schema, &g).unwrap();
        assert_eq!(body["description"], "one");
    }

    #[test]
    fn optional_id_ref_is_wrapped_or_omitted() {
        let schema = crate::catalog::find("shift_templates").unwrap();
        let g = group_of(vec![row(
            1,
            &[
                ("name", "Morning"),
                ("description", "d"),
                ("startTime", "09:00"),
                ("endTime", "17:30"),
                ("beforeStartToleranceMinute", "5"),
                ("afterStartToleranceMinute", "5"),
                ("lateInToleranceMinute", "10"),
                ("earlyOutToleranceMinute", "10"),
                ("monday", "true"),
                ("optionalShiftTemplateId", "7.0"),
            ],
        )]);
        let body = build_base(&schema, &g).unwrap();
        assert_eq!(body["optionalShiftTemplate"]["id"], 7);
        assert_eq!(body["startTime"], "09:00");
        assert_eq!(body["monday"], true);
        // Blank weekday bools are false-filled, not absent.
        assert_eq!(body["tuesday"], false);
        assert_eq!(body["report"], false);
    }
}
