//! The module catalog: every configuration screen as one declarative
//! `EntitySchema`. The engines contain no per-module code; everything a
//! module does differently is declared here.
//!
//! Punches and timecard updation have dedicated flows (see
//! `services::punches` / `services::timecards`) and are not schema-driven.

use common::model::schema::{
    BaseField, CellDefault, CellKind, ConstValue, EntitySchema, EntryFamily, EntryPart, Grouping,
    ReferenceSheet, UpdateStrategy,
};

fn cell(column: &'static str, json: &'static str, kind: CellKind, required: bool) -> EntryPart {
    EntryPart::Cell {
        column,
        json,
        kind,
        required,
        default: CellDefault::None,
    }
}

fn cell_with_default(
    column: &'static str,
    json: &'static str,
    kind: CellKind,
    default: CellDefault,
) -> EntryPart {
    EntryPart::Cell {
        column,
        json,
        kind,
        required: false,
        default,
    }
}

fn id_ref(column: &'static str, json: &'static str) -> EntryPart {
    EntryPart::IdRef {
        column,
        json,
        required: true,
    }
}

fn reference(
    sheet: &'static str,
    resource: &'static str,
    fields: &'static [&'static str],
) -> ReferenceSheet {
    ReferenceSheet { sheet, resource, fields }
}

const ID_NAME_DESC: &[&str] = &["id", "name", "description"];
const PAYCODE_FIELDS: &[&str] = &["id", "code", "description"];

/// A range family following the max-flag convention: ordered by
/// `startMinute`, last entry open-ended.
fn range_family(
    json_field: &'static str,
    slots: u16,
    primary: &'static str,
    parts: Vec<EntryPart>,
) -> EntryFamily {
    EntryFamily {
        json_field,
        slots,
        primary,
        parts,
        dedup_pointer: None,
        order_json: Some("startMinute"),
        max_flag: true,
        open_end_json: Some("endMinute"),
        required: false,
    }
}

/// A `{id, name, description}` module with no sub-entries.
fn simple_schema(
    key: &'static str,
    title: &'static str,
    resource: &'static str,
    template_sheet: &'static str,
    reference_sheets: Vec<ReferenceSheet>,
) -> EntitySchema {
    EntitySchema {
        key,
        title,
        resource,
        template_sheet,
        id_column: "id",
        name_column: "name",
        base_fields: vec![
            BaseField::text("name", "name", true),
            BaseField::text_or_name("description", "description"),
        ],
        families: vec![],
        grouping: Grouping::SelfContained,
        update: UpdateStrategy::Replace,
        reference_sheets,
        guard_duplicate_upload: false,
        download_only: false,
    }
}

/// A set module assembled from one `policy_id`-style entry per upload row.
fn entry_per_row_set(
    key: &'static str,
    title: &'static str,
    resource: &'static str,
    template_sheet: &'static str,
    parts: Vec<EntryPart>,
    primary: &'static str,
    reference_sheets: Vec<ReferenceSheet>,
) -> EntitySchema {
    EntitySchema {
        key,
        title,
        resource,
        template_sheet,
        id_column: "id",
        name_column: "name",
        base_fields: vec![
            BaseField::text("name", "name", true),
            BaseField::text_or_name("description", "description"),
        ],
        families: vec![EntryFamily {
            json_field: "entries",
            slots: 0,
            primary,
            parts,
            dedup_pointer: Some("/id"),
            order_json: None,
            max_flag: false,
            open_end_json: None,
            required: true,
        }],
        grouping: Grouping::RowPerEntry,
        update: UpdateStrategy::Replace,
        reference_sheets,
        guard_duplicate_upload: false,
        download_only: false,
    }
}

/// A set module whose entries are a flat `entryId1..N` grid of ids.
fn id_list_set(
    key: &'static str,
    title: &'static str,
    resource: &'static str,
    reference_sheets: Vec<ReferenceSheet>,
    guard_duplicate_upload: bool,
) -> EntitySchema {
    EntitySchema {
        key,
        title,
        resource,
        template_sheet: "Template",
        id_column: "id",
        name_column: "name",
        base_fields: vec![
            BaseField::text("name", "name", true),
            BaseField::text_or_name("description", "description"),
        ],
        families: vec![EntryFamily {
            json_field: "entries",
            slots: 50,
            primary: "entryId",
            parts: vec![EntryPart::BareId {
                column: "entryId",
                required: true,
            }],
            dedup_pointer: Some("/id"),
            order_json: None,
            max_flag: false,
            open_end_json: None,
            required: true,
        }],
        grouping: Grouping::SelfContained,
        update: UpdateStrategy::Replace,
        reference_sheets,
        guard_duplicate_upload,
        download_only: false,
    }
}

fn lookup_table(key: &'static str, title: &'static str, resource: &'static str) -> EntitySchema {
    EntitySchema {
        key,
        title,
        resource,
        template_sheet: "Template",
        id_column: "",
        name_column: "",
        base_fields: vec![],
        families: vec![],
        grouping: Grouping::SelfContained,
        update: UpdateStrategy::Replace,
        reference_sheets: vec![],
        guard_duplicate_upload: false,
        download_only: true,
    }
}

fn paycodes() -> EntitySchema {
    EntitySchema {
        key: "paycodes",
        title: "Paycodes",
        resource: "paycodes",
        template_sheet: "Paycodes",
        id_column: "id",
        name_column: "code",
        base_fields: vec![
            BaseField::text("code", "code", true),
            BaseField::text("description", "description", false),
        ],
        families: vec![],
        grouping: Grouping::SelfContained,
        update: UpdateStrategy::Replace,
        reference_sheets: vec![],
        guard_duplicate_upload: false,
        download_only: false,
    }
}

fn paycode_events() -> EntitySchema {
    EntitySchema {
        key: "paycode_events",
        title: "Paycode Events",
        resource: "paycode_events",
        template_sheet: "Paycode Events",
        id_column: "id",
        name_column: "Paycode Event Name",
        base_fields: vec![
            BaseField::text("Paycode Event Name", "name", true),
            BaseField::text_or_name("Description", "description"),
            BaseField::id_ref("paycode_id", "paycode", true),
        ],
        families: vec![EntryFamily {
            json_field: "schedules",
            slots: 0,
            primary: "holiday_name",
            parts: vec![
                cell("holiday_name", "name", CellKind::Text, true),
                EntryPart::Const {
                    json: "startDate",
                    value: ConstValue::EventStartDate,
                },
                EntryPart::DateParts {
                    column: "holiday_date(YYYY-MM-DD)",
                    year_json: "repeatYear",
                    month_json: "repeatMonth",
                    day_json: "repeatDay",
                },
                cell_with_default("repeatWeek", "repeatWeek", CellKind::Text, CellDefault::Star),
                cell_with_default("repeatWeekday", "repeatWeekday", CellKind::Text, CellDefault::Star),
            ],
            dedup_pointer: None,
            order_json: None,
            max_flag: false,
            open_end_json: None,
            required: true,
        }],
        grouping: Grouping::RowPerEntry,
        update: UpdateStrategy::Replace,
        reference_sheets: vec![reference("Paycodes", "paycodes", PAYCODE_FIELDS)],
        guard_duplicate_upload: false,
        download_only: false,
    }
}

fn paycode_combinations() -> EntitySchema {
    EntitySchema {
        key: "paycode_combinations",
        title: "Paycode Combinations",
        resource: "paycode_combinations",
        template_sheet: "Combinations",
        id_column: "id",
        name_column: "first_paycode",
        base_fields: vec![
            BaseField::id_ref("first_paycode", "firstPaycode", true),
            BaseField::id_ref("second_paycode", "secondPaycode", true),
            BaseField::id_ref("combined_paycode", "combinedPaycode", true),
        ],
        families: vec![],
        grouping: Grouping::SelfContained,
        update: UpdateStrategy::Replace,
        reference_sheets: vec![reference("Paycodes", "paycodes", PAYCODE_FIELDS)],
        guard_duplicate_upload: false,
        download_only: false,
    }
}

fn paycode_event_sets() -> EntitySchema {
    EntitySchema {
        key: "paycode_event_sets",
        title: "Paycode Event Sets",
        resource: "paycode_event_sets",
        template_sheet: "Paycode_Event_Sets",
        id_column: "id",
        name_column: "name",
        base_fields: vec![
            BaseField::text("name", "name", true),
            BaseField::text_or_name("description", "description"),
        ],
        families: vec![EntryFamily {
            json_field: "entries",
            slots: 5,
            primary: "PaycodeEvent",
            parts: vec![
                id_ref("PaycodeEvent", "paycodeEvent"),
                cell_with_default("Priority", "priority", CellKind::Int, CellDefault::SlotIndex),
                EntryPart::Const {
                    json: "overridable",
                    value: ConstValue::Bool(false),
                },
            ],
            dedup_pointer: Some("/paycodeEvent/id"),
            order_json: Some("priority"),
            max_flag: false,
            open_end_json: None,
            required: true,
        }],
        grouping: Grouping::SelfContained,
        update: UpdateStrategy::MergeEntries,
        reference_sheets: vec![reference(
            "Available_Paycode_Events",
            "paycode_events",
            ID_NAME_DESC,
        )],
        guard_duplicate_upload: false,
        download_only: false,
    }
}

fn shift_templates() -> EntitySchema {
    EntitySchema {
        key: "shift_templates",
        title: "Shift Templates",
        resource: "shift_templates",
        template_sheet: "Template",
        id_column: "id",
        name_column: "name",
        base_fields: vec![
            BaseField::text("name", "name", true),
            BaseField::text_or_name("description", "description"),
            BaseField::time("startTime", "startTime", true),
            BaseField::time("endTime", "endTime", true),
            BaseField::int("beforeStartToleranceMinute", "beforeStartToleranceMinute", true),
            BaseField::int("afterStartToleranceMinute", "afterStartToleranceMinute", true),
            BaseField::int("lateInToleranceMinute", "lateInToleranceMinute", true),
            BaseField::int("earlyOutToleranceMinute", "earlyOutToleranceMinute", true),
            BaseField::boolean("report", "report"),
            BaseField::boolean("monday", "monday"),
            BaseField::boolean("tuesday", "tuesday"),
            BaseField::boolean("wednesday", "wednesday"),
            BaseField::boolean("thursday", "thursday"),
            BaseField::boolean("friday", "friday"),
            BaseField::boolean("saturday", "saturday"),
            BaseField::boolean("sunday", "sunday"),
            BaseField {
                column: "optionalShiftTemplateId",
                json: "optionalShiftTemplate",
                kind: CellKind::Int,
                required: false,
                default: CellDefault::None,
                id_ref: true,
            },
        ],
        families: vec![
            range_family(
                "paycodes",
                5,
                "paycode_id",
                vec![
                    id_ref("paycode_id", "paycode"),
                    cell("paycode_startMinute", "startMinute", CellKind::Int, true),
                    cell("paycode_endMinute", "endMinute", CellKind::Int, false),
                ],
            ),
            range_family(
                "exceptions",
                2,
                "exception_paycode_id",
                vec![
                    id_ref("exception_paycode_id", "paycode"),
                    cell("exception_type", "type", CellKind::Text, true),
                    cell("exception_startMinute", "startMinute", CellKind::Int, true),
                    cell("exception_endMinute", "endMinute", CellKind::Int, false),
                ],
            ),
            range_family(
                "adjustments",
                2,
                "adjustment_type_id",
                vec![
                    id_ref("adjustment_type_id", "adjustmentType"),
                    cell("adjustment_startMinute", "startMinute", CellKind::Int, true),
                    cell("adjustment_amountMinute", "amountMinute", CellKind::Int, true),
                    cell("adjustment_endMinute", "endMinute", CellKind::Int, false),
                ],
            ),
            range_family(
                "exceptionRoundings",
                2,
                "rounding_startMinute",
                vec![
                    cell("rounding_startMinute", "startMinute", CellKind::Int, true),
                    cell("rounding_roundMinute", "roundMinute", CellKind::Int, true),
                    cell("rounding_endMinute", "endMinute", CellKind::Int, false),
                ],
            ),
        ],
        grouping: Grouping::SelfContained,
        update: UpdateStrategy::Replace,
        reference_sheets: vec![reference("Paycodes_Master", "paycodes", PAYCODE_FIELDS)],
        guard_duplicate_upload: true,
        download_only: false,
    }
}

fn schedule_patterns() -> EntitySchema {
    EntitySchema {
        key: "schedule_patterns",
        title: "Schedule Patterns",
        resource: "schedule_patterns",
        template_sheet: "Template",
        id_column: "id",
        name_column: "name",
        base_fields: vec![
            BaseField::text("name", "name", true),
            BaseField::text_or_name("description", "description"),
        ],
        families: vec![EntryFamily {
            json_field: "entries",
            slots: 7,
            primary: "shiftTemplate_id",
            parts: vec![
                cell_with_default("dayIndex", "dayIndex", CellKind::Int, CellDefault::SlotIndex),
                id_ref("shiftTemplate_id", "shiftTemplate"),
            ],
            dedup_pointer: None,
            order_json: Some("dayIndex"),
            max_flag: false,
            open_end_json: None,
            required: true,
        }],
        grouping: Grouping::SelfContained,
        update: UpdateStrategy::Replace,
        reference_sheets: vec![reference("Shift_Templates", "shift_templates", ID_NAME_DESC)],
        guard_duplicate_upload: false,
        download_only: false,
    }
}

fn overtime_policies() -> EntitySchema {
    EntitySchema {
        key: "overtime_policies",
        title: "Overtime Policies",
        resource: "overtime_policies",
        template_sheet: "Overtime_Policies",
        id_column: "id",
        name_column: "name",
        base_fields: vec![
            BaseField::text("name", "name", true),
            BaseField::text_or_name("description", "description"),
            BaseField::text("mode", "mode", false),
            BaseField::int("minMinute", "minMinute", false),
            BaseField::int("maxDailyMinute", "maxDailyMinute", false),
            BaseField::int("maxWeeklyMinute", "maxWeeklyMinute", false),
            BaseField::int("maxMonthlyMinute", "maxMonthlyMinute", false),
            BaseField::int("maxQuarterlyMinute", "maxQuarterlyMinute", false),
            BaseField::int("weekoffMinMinute", "weekoffMinMinute", false),
            BaseField::int("weekoffMaxDailyMinute", "weekoffMaxDailyMinute", false),
            BaseField::int("holidayMinMinute", "holidayMinMinute", false),
            BaseField::int("holidayMaxDailyMinute", "holidayMaxDailyMinute", false),
            BaseField::boolean("skipTotalizationRoundings", "skipTotalizationRoundings"),
        ],
        families: vec![
            // Totalization roundings are closed ranges: every slot carries
            // all three minutes, and no entry is open-ended.
            EntryFamily {
                json_field: "roundings",
                slots: 10,
                primary: "rounding_startMinute",
                parts: vec![
                    cell("rounding_startMinute", "startMinute", CellKind::Int, true),
                    cell("rounding_endMinute", "endMinute", CellKind::Int, true),
                    cell("rounding_roundMinute", "roundMinute", CellKind::Int, true),
                ],
                dedup_pointer: None,
                order_json: Some("startMinute"),
                max_flag: false,
                open_end_json: None,
                required: false,
            },
            EntryFamily {
                json_field: "holidayGroupLimits",
                slots: 10,
                primary: "holidayGroup",
                parts: vec![
                    cell("holidayGroup", "holidayGroup", CellKind::Text, true),
                    cell("holidayGroup_minMinute", "minMinute", CellKind::Int, false),
                    cell("holidayGroup_maxDailyMinute", "maxDailyMinute", CellKind::Int, false),
                ],
                dedup_pointer: None,
                order_json: None,
                max_flag: false,
                open_end_json: None,
                required: false,
            },
        ],
        grouping: Grouping::SelfContained,
        update: UpdateStrategy::Replace,
        reference_sheets: vec![],
        guard_duplicate_upload: false,
        download_only: false,
    }
}

fn policy_with_ref(
    key: &'static str,
    title: &'static str,
    resource: &'static str,
    ref_column: &'static str,
    ref_json: &'static str,
    reference_sheets: Vec<ReferenceSheet>,
) -> EntitySchema {
    let mut schema = simple_schema(key, title, resource, "Template", reference_sheets);
    schema.base_fields.push(BaseField::id_ref(ref_column, ref_json, true));
    schema
}

pub fn catalog() -> Vec<EntitySchema> {
    vec![
        paycodes(),
        paycode_events(),
        paycode_combinations(),
        paycode_event_sets(),
        shift_templates(),
        id_list_set(
            "shift_template_sets",
            "Shift Template Sets",
            "shift_template_sets",
            vec![reference("Existing_Shifts", "shift_templates", ID_NAME_DESC)],
            true,
        ),
        schedule_patterns(),
        id_list_set(
            "schedule_pattern_sets",
            "Schedule Pattern Sets",
            "schedule_pattern_sets",
            vec![reference("Schedule_Patterns", "schedule_patterns", ID_NAME_DESC)],
            false,
        ),
        lookup_table(
            "employee_lookup_table",
            "Employee Lookup Table",
            "employee_lookup_table",
        ),
        lookup_table(
            "organization_location_lookup_table",
            "Organization Location Lookup Table",
            "organization_location_lookup_table",
        ),
        simple_schema(
            "accruals",
            "Accruals",
            "accruals",
            "Accruals_Upload",
            vec![reference("Existing_Accruals", "accruals", ID_NAME_DESC)],
        ),
        policy_with_ref(
            "accrual_policies",
            "Accrual Policies",
            "accrual_policies",
            "accrual_id",
            "accrual",
            vec![reference("Accruals", "accruals", ID_NAME_DESC)],
        ),
        entry_per_row_set(
            "accrual_policy_sets",
            "Accrual Policy Sets",
            "accrual_policy_sets",
            "Accrual Policy Sets",
            vec![EntryPart::BareId {
                column: "policy_id",
                required: true,
            }],
            "policy_id",
            vec![reference("Accrual_Policies", "accrual_policies", ID_NAME_DESC)],
        ),
        policy_with_ref(
            "timeoff_policies",
            "Timeoff Policies",
            "timeoff_policies",
            "paycode_id",
            "paycode",
            vec![reference("Paycodes", "paycodes", PAYCODE_FIELDS)],
        ),
        entry_per_row_set(
            "timeoff_policy_sets",
            "Timeoff Policy Sets",
            "timeoff_policy_sets",
            "Timeoff Policy Sets",
            vec![
                EntryPart::BareId {
                    column: "policy_id",
                    required: true,
                },
                id_ref("paycode_id", "paycode"),
            ],
            "policy_id",
            vec![reference("Paycodes", "paycodes", PAYCODE_FIELDS)],
        ),
        simple_schema(
            "regularization_policies",
            "Regularization Policies",
            "regularization_policies",
            "Template",
            vec![],
        ),
        entry_per_row_set(
            "regularization_policy_sets",
            "Regularization Policy Sets",
            "regularization_policy_sets",
            "Regularization Policy Sets",
            vec![EntryPart::BareId {
                column: "policy_id",
                required: true,
            }],
            "policy_id",
            vec![reference(
                "Regularization_Policies",
                "regularization_policies",
                ID_NAME_DESC,
            )],
        ),
        simple_schema("roles", "Roles", "roles", "Roles", vec![]),
        overtime_policies(),
    ]
}

pub fn find(key: &str) -> Option<EntitySchema> {
    catalog().into_iter().find(|s| s.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<&str> = catalog().iter().map(|s| s.key).collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), before);
    }

    #[test]
    fn row_per_entry_modules_have_exactly_one_family() {
        for schema in catalog() {
            if schema.grouping == Grouping::RowPerEntry {
                assert_eq!(schema.families.len(), 1, "{}", schema.key);
                assert_eq!(schema.families[0].slots, 0, "{}", schema.key);
            }
        }
    }

    #[test]
    fn template_columns_interleave_slot_members() {
        let schema = find("paycode_event_sets").unwrap();
        let cols = schema.columns();
        assert_eq!(
            &cols[..5],
            &["id", "name", "description", "PaycodeEvent1", "Priority1"]
        );
        assert!(cols.contains(&"PaycodeEvent5".to_string()));
    }

    #[test]
    fn lookup_tables_are_download_only() {
        let schema = find("employee_lookup_table").unwrap();
        assert!(schema.download_only);
        assert!(schema.columns().is_empty());
    }
}
