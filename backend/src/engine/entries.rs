//! Sub-entry assembly: numbered-column-family unflattening, row-per-entry
//! accumulation, referenced-id deduplication, and the max-flag convention
//! for open-ended range lists.

use serde_json::{json, Map, Value};

use common::model::schema::{CellDefault, CellKind, ConstValue, EntryFamily, EntryPart};

use super::cell;
use super::group::EntityGroup;
use super::rows::SourceRow;
use super::{EngineOptions, ValidationError};

fn column_name(family: &EntryFamily, column: &str, slot: u16) -> String {
    if family.slots == 0 {
        column.to_string()
    } else {
        format!("{column}{slot}")
    }
}

/// Build the ordered entry list for one family from all rows of a group.
///
/// Slotted families read `{column}{i}` from every row; row-per-entry
/// families contribute one entry per row. A slot is present only when its
/// primary column is non-blank.
pub fn build_entries(
    family: &EntryFamily,
    group: &EntityGroup,
    opts: &EngineOptions,
) -> Result<Vec<Value>, ValidationError> {
    let mut entries: Vec<Value> = Vec::new();
    let mut seen: Vec<Value> = Vec::new();

    for row in &group.rows {
        let slots: Vec<u16> = if family.slots == 0 {
            vec![0]
        } else {
            (1..=family.slots).collect()
        };

        for slot in slots {
            let primary = column_name(family, family.primary, slot);
            if cell::is_blank(row.get(&primary)) {
                continue;
            }

            let entry = build_entry(family, row, slot, opts)?;

            if let Some(pointer) = family.dedup_pointer {
                if let Some(id) = entry.pointer(pointer) {
                    if seen.contains(id) {
                        continue;
                    }
                    seen.push(id.clone());
                }
            }
            entries.push(entry);
        }
    }

    if family.max_flag {
        apply_max_flag(family, &mut entries);
    }

    if family.required && entries.is_empty() {
        return Err(ValidationError::NoEntries {
            list: family.json_field,
        });
    }
    Ok(entries)
}

fn build_entry(
    family: &EntryFamily,
    row: &SourceRow,
    slot: u16,
    opts: &EngineOptions,
) -> Result<Value, ValidationError> {
    let mut entry = Map::new();

    for part in &family.parts {
        match part {
            EntryPart::Cell {
                column,
                json,
                kind,
                required,
                default,
            } => {
                let name = column_name(family, column, slot);
                let raw = row.get(&name);
                if cell::is_blank(raw) {
                    match default {
                        CellDefault::SlotIndex => {
                            entry.insert(json.to_string(), json!(slot));
                        }
                        CellDefault::Star => {
                            entry.insert(json.to_string(), json!("*"));
                        }
                        CellDefault::NameColumn | CellDefault::None => {
                            if *required {
                                return Err(ValidationError::MissingField {
                                    row: row.line,
                                    column: name,
                                });
                            }
                        }
                    }
                } else {
                    entry.insert(json.to_string(), coerce(raw, *kind, row.line, &name)?);
                }
            }
            EntryPart::IdRef {
                column,
                json,
                required,
            } => {
                let name = column_name(family, column, slot);
                let raw = row.get(&name);
                if cell::is_blank(raw) {
                    if *required {
                        return Err(ValidationError::MissingField {
                            row: row.line,
                            column: name,
                        });
                    }
                } else {
                    let id = parse_id(raw, row.line, &name)?;
                    entry.insert(json.to_string(), json!({ "id": id }));
                }
            }
            EntryPart::BareId { column, required } => {
                let name = column_name(family, column, slot);
                let raw = row.get(&name);
                if cell::is_blank(raw) {
                    if *required {
                        return Err(ValidationError::MissingField {
                            row: row.line,
                            column: name,
                        });
                    }
                } else {
                    let id = parse_id(raw, row.line, &name)?;
                    entry.insert("id".to_string(), json!(id));
                }
            }
            EntryPart::Const { json: key, value } => {
                let v = match value {
                    ConstValue::Bool(b) => json!(b),
                    ConstValue::EventStartDate => json!(opts.event_start_date),
                };
                entry.insert(key.to_string(), v);
            }
            EntryPart::DateParts {
                column,
                year_json,
                month_json,
                day_json,
            } => {
                let name = column_name(family, column, slot);
                let raw = row.get(&name);
                let date = cell::normalize_date(raw).ok_or_else(|| ValidationError::BadValue {
                    row: row.line,
                    column: name,
                    expected: "YYYY-MM-DD date",
                    value: raw.to_string(),
                })?;
                let mut parts = date.split('-').map(|p| p.parse::<i64>().unwrap_or(0));
                entry.insert(year_json.to_string(), json!(parts.next().unwrap_or(0)));
                entry.insert(month_json.to_string(), json!(parts.next().unwrap_or(0)));
                entry.insert(day_json.to_string(), json!(parts.next().unwrap_or(0)));
            }
        }
    }

    Ok(Value::Object(entry))
}

fn parse_id(raw: &str, row: usize, column: &str) -> Result<i64, ValidationError> {
    cell::parse_id(raw).ok_or_else(|| ValidationError::BadValue {
        row,
        column: column.to_string(),
        expected: "numeric id",
        value: raw.to_string(),
    })
}

fn coerce(raw: &str, kind: CellKind, row: usize, column: &str) -> Result<Value, ValidationError> {
    let bad = |expected: &'static str| ValidationError::BadValue {
        row,
        column: column.to_string(),
        expected,
        value: raw.to_string(),
    };
    match kind {
        CellKind::Text => Ok(json!(raw.trim())),
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

/// Range-list convention: order by the start key, mark exactly the last
/// entry `"max": true` and drop its open-end key. Every other entry gets an
/// explicit `"max": false`.
fn apply_max_flag(family: &EntryFamily, entries: &mut [Value]) {
    if let Some(order_key) = family.order_json {
        entries.sort_by_key(|e| e.get(order_key).and_then(Value::as_i64).unwrap_or(0));
    }
    let last = entries.len().saturating_sub(1);
    for (i, entry) in entries.iter_mut().enumerate() {
        if let Some(obj) = entry.as_object_mut() {
            obj.insert("max".to_string(), json!(i == last));
            if i == last {
                if let Some(open_end) = family.open_end_json {
                    obj.remove(open_end);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::group::GroupKey;
    use std::collections::HashMap;

    fn opts() -> EngineOptions {
        EngineOptions {
            event_start_date: "2026-01-01".to_string(),
        }
    }

    fn group_of(rows: Vec<SourceRow>) -> EntityGroup {
        EntityGroup {
            key: GroupKey::Name("x".to_string()),
            rows,
        }
    }

    fn row(line: usize, pairs: &[(&str, &str)]) -> SourceRow {
        let cells: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SourceRow::new(line, cells)
    }

    fn family(schema_key: &str, json_field: &str) -> EntryFamily {
        crate::catalog::find(schema_key)
            .unwrap()
            .families
            .iter()
            .find(|f| f.json_field == json_field)
            .cloned()
            .unwrap()
    }

    #[test]
    fn open_ended_second_paycode_entry() {
        // Two slots, the second without an endMinute: it becomes the single
        // max entry and carries no endMinute field.
        let fam = family("shift_templates", "paycodes");
        let g = group_of(vec![row(
            1,
            &[
                ("paycode_id1", "10"),
                ("paycode_startMinute1", "0"),
                ("paycode_endMinute1", "240"),
                ("paycode_id2", "11"),
                ("paycode_startMinute2", "241"),
            ],
        )]);

        let entries = build_entries(&fam, &g, &opts()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["paycode"]["id"], 10);
        assert_eq!(entries[0]["max"], false);
        assert_eq!(entries[0]["endMinute"], 240);
        assert_eq!(entries[1]["paycode"]["id"], 11);
        assert_eq!(entries[1]["max"], true);
        assert!(entries[1].get("endMinute").is_none());
    }

    #[test]
    fn max_entry_is_last_by_start_order() {
        // Slots listed out of order still mark the highest start as max.
        let fam = family("shift_templates", "paycodes");
        let g = group_of(vec![row(
            1,
            &[
                ("paycode_id1", "10"),
                ("paycode_startMinute1", "300"),
                ("paycode_id2", "11"),
                ("paycode_startMinute2", "0"),
                ("paycode_endMinute2", "299"),
            ],
        )]);

        let entries = build_entries(&fam, &g, &opts()).unwrap();
        let max_flags: Vec<bool> = entries.iter().map(|e| e["max"] == true).collect();
        assert_eq!(max_flags.iter().filter(|m| **m).count(), 1);
        assert_eq!(entries[1]["startMinute"], 300);
        assert_eq!(entries[1]["max"], true);
        assert_eq!(entries[0]["startMinute"], 0);
    }

    #[test]
    fn duplicate_referenced_ids_collapse() {
        let fam = family("paycode_event_sets", "entries");
        let g = group_of(vec![row(
            1,
            &[
                ("PaycodeEvent1", "42"),
                ("Priority1", "1"),
                ("PaycodeEvent2", "42"),
                ("Priority2", "2"),
                ("PaycodeEvent3", "43"),
            ],
        )]);

        let entries = build_entries(&fam, &g, &opts()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["paycodeEvent"]["id"], 42);
        assert_eq!(entries[1]["paycodeEvent"]["id"], 43);
    }

    #[test]
    fn priority_defaults_to_slot_number() {
        let fam = family("paycode_event_sets", "entries");
        let g = group_of(vec![row(1, &[("PaycodeEvent3", "42")])]);

        let entries = build_entries(&fam, &g, &opts()).unwrap();
        assert_eq!(entries[0]["priority"], 3);
        assert_eq!(entries[0]["overridable"], false);
    }

    #[test]
    fn empty_required_family_is_an_error() {
        let fam = family("paycode_event_sets", "entries");
        let g = group_of(vec![row(1, &[("name", "set")])]);
        assert!(matches!(
            build_entries(&fam, &g, &opts()),
            Err(ValidationError::NoEntries { .. })
        ));
    }

    #[test]
    fn rounding_slot_needs_all_columns() {
        // Overtime roundings carry no max flag; a slot missing endMinute is
        // rejected rather than treated as open-ended.
        let fam = family("overtime_policies", "roundings");
        let g = group_of(vec![row(
            1,
            &[("rounding_startMinute1", "0"), ("rounding_roundMinute1", "15")],
        )]);
        assert!(matches!(
            build_entries(&fam, &g, &opts()),
            Err(ValidationError::MissingField { .. })
        ));
    }

    #[test]
    fn schedule_rows_accumulate_with_date_split() {
        let fam = family("paycode_events", "schedules");
        let g = group_of(vec![
            row(
                1,
                &[
                    ("holiday_name", "New Year"),
                    ("holiday_date(YYYY-MM-DD)", "2026-01-01"),
                ],
            ),
            row(
                2,
                &[
                    ("holiday_name", "May Day"),
                    ("holiday_date(YYYY-MM-DD)", "2026-05-01 00:00:00"),
                    ("repeatWeek", "2"),
                ],
            ),
        ]);

        let entries = build_entries(&fam, &g, &opts()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["repeatYear"], 2026);
        assert_eq!(entries[0]["repeatMonth"], 1);
        assert_eq!(entries[0]["repeatDay"], 1);
        assert_eq!(entries[0]["repeatWeek"], "*");
        assert_eq!(entries[0]["startDate"], "2026-01-01");
        assert_eq!(entries[1]["repeatMonth"], 5);
        assert_eq!(entries[1]["repeatWeek"], "2");
    }
}
