use serde::Serialize;

/// Declarative description of one configuration module: which spreadsheet
/// columns it accepts, how rows collapse into remote entities, and how the
/// remote resource is addressed.
///
/// Every upload/template/export/delete screen of the portal is driven by one
/// of these values; the engines in the backend contain no per-module code.
#[derive(Debug, Clone, Serialize)]
pub struct EntitySchema {
    /// URL-safe module key, e.g. `paycode_event_sets`.
    pub key: &'static str,
    /// Human title shown in the module listing.
    pub title: &'static str,
    /// Resource path segment under `/resource-server/api/`.
    pub resource: &'static str,
    /// Name of the primary sheet in generated workbooks.
    pub template_sheet: &'static str,
    /// Column holding the numeric id (update target). Empty when absent.
    pub id_column: &'static str,
    /// Column holding the natural key used to group create rows.
    pub name_column: &'static str,
    pub base_fields: Vec<BaseField>,
    pub families: Vec<EntryFamily>,
    pub grouping: Grouping,
    pub update: UpdateStrategy,
    pub reference_sheets: Vec<ReferenceSheet>,
    /// Reject an identical re-upload of the same file within the session.
    pub guard_duplicate_upload: bool,
    /// Template/export only; the module has no upload or delete surface.
    pub download_only: bool,
}

/// How upload rows map onto remote entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grouping {
    /// Rows sharing a key describe one entity; sub-entries come from
    /// numbered column slots on each row.
    SelfContained,
    /// Each row contributes exactly one sub-entry to its group; the entity
    /// is assembled from all rows sharing the key.
    RowPerEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateStrategy {
    /// PUT sends the rebuilt payload as-is (full replace).
    Replace,
    /// Fetch the existing record first, re-attach existing sub-entry ids and
    /// carry over sub-entries the upload did not name.
    MergeEntries,
}

/// A scalar field of the entity payload sourced from one spreadsheet column.
#[derive(Debug, Clone, Serialize)]
pub struct BaseField {
    pub column: &'static str,
    pub json: &'static str,
    pub kind: CellKind,
    pub required: bool,
    pub default: CellDefault,
    /// Wrap the parsed id as `{"<json>": {"id": n}}`.
    pub id_ref: bool,
}

impl BaseField {
    pub fn text(column: &'static str, json: &'static str, required: bool) -> Self {
        Self { column, json, kind: CellKind::Text, required, default: CellDefault::None, id_ref: false }
    }

    pub fn int(column: &'static str, json: &'static str, required: bool) -> Self {
        Self { column, json, kind: CellKind::Int, required, default: CellDefault::None, id_ref: false }
    }

    pub fn boolean(column: &'static str, json: &'static str) -> Self {
        Self { column, json, kind: CellKind::Bool, required: false, default: CellDefault::None, id_ref: false }
    }

    pub fn time(column: &'static str, json: &'static str, required: bool) -> Self {
        Self { column, json, kind: CellKind::Time, required, default: CellDefault::None, id_ref: false }
    }

    pub fn id_ref(column: &'static str, json: &'static str, required: bool) -> Self {
        Self { column, json, kind: CellKind::Int, required, default: CellDefault::None, id_ref: true }
    }

    /// Text field that falls back to the natural-key column when blank
    /// (the description-defaults-to-name convention).
    pub fn text_or_name(column: &'static str, json: &'static str) -> Self {
        Self { column, json, kind: CellKind::Text, required: false, default: CellDefault::NameColumn, id_ref: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellKind {
    Text,
    Int,
    Bool,
    /// `HH:MM` wall-clock time.
    Time,
    /// `YYYY-MM-DD` calendar date.
    Date,
}

/// Value used when the cell is blank and the field is not required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellDefault {
    None,
    /// Fall back to the row's natural-key column.
    NameColumn,
    /// Fall back to the 1-based slot number (priority columns).
    SlotIndex,
    /// Fall back to the literal `*` (cron-style repeat columns).
    Star,
}

/// A variable-length list of sub-entries encoded either as numbered column
/// slots (`{column}{i}` for i = 1..slots) or as one entry per upload row.
#[derive(Debug, Clone, Serialize)]
pub struct EntryFamily {
    /// JSON field the assembled list is written to, e.g. `entries`.
    pub json_field: &'static str,
    /// Number of column slots; 0 means one entry per row with unnumbered
    /// column names.
    pub slots: u16,
    /// Column (prefix when slotted) that decides whether a slot is present.
    pub primary: &'static str,
    pub parts: Vec<EntryPart>,
    /// JSON pointer to the referenced id used for deduplication and for
    /// matching existing entries on merge updates.
    pub dedup_pointer: Option<&'static str>,
    /// Entry key the list is ordered by (export order and max-flag order).
    pub order_json: Option<&'static str>,
    /// Mark the highest-ordered entry `"max": true` and drop its open-end
    /// key; all other entries get `"max": false`.
    pub max_flag: bool,
    pub open_end_json: Option<&'static str>,
    /// At least one entry must survive unflattening.
    pub required: bool,
}

/// One building block of a sub-entry object.
#[derive(Debug, Clone, Serialize)]
pub enum EntryPart {
    /// `"<json>": <coerced cell>`.
    Cell {
        column: &'static str,
        json: &'static str,
        kind: CellKind,
        required: bool,
        default: CellDefault,
    },
    /// `"<json>": {"id": <cell as id>}`.
    IdRef {
        column: &'static str,
        json: &'static str,
        required: bool,
    },
    /// `"id": <cell as id>` on the entry itself.
    BareId {
        column: &'static str,
        required: bool,
    },
    /// A constant the remote API expects on every entry.
    Const { json: &'static str, value: ConstValue },
    /// A `YYYY-MM-DD` cell split into three numeric JSON fields.
    DateParts {
        column: &'static str,
        year_json: &'static str,
        month_json: &'static str,
        day_json: &'static str,
    },
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum ConstValue {
    Bool(bool),
    /// The portal-wide schedule start date (configured at startup).
    EventStartDate,
}

/// A read-only workbook sheet populated from a live resource listing.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceSheet {
    pub sheet: &'static str,
    pub resource: &'static str,
    pub fields: &'static [&'static str],
}

impl EntryPart {
    /// The spreadsheet column this part reads, if any.
    pub fn column(&self) -> Option<&'static str> {
        match self {
            EntryPart::Cell { column, .. }
            | EntryPart::IdRef { column, .. }
            | EntryPart::BareId { column, .. }
            | EntryPart::DateParts { column, .. } => Some(column),
            EntryPart::Const { .. } => None,
        }
    }
}

impl EntryFamily {
    /// Column headers contributed by one slot (or by the unnumbered entry
    /// columns when `slots == 0`).
    pub fn slot_columns(&self, slot: u16) -> Vec<String> {
        self.parts
            .iter()
            .filter_map(EntryPart::column)
            .map(|c| {
                if self.slots == 0 {
                    c.to_string()
                } else {
                    format!("{c}{slot}")
                }
            })
            .collect()
    }
}

impl EntitySchema {
    /// All template columns in declared order: id, base fields, then the
    /// numbered families slot by slot.
    pub fn columns(&self) -> Vec<String> {
        let mut cols = Vec::new();
        if !self.id_column.is_empty() {
            cols.push(self.id_column.to_string());
        }
        for f in &self.base_fields {
            cols.push(f.column.to_string());
        }
        for family in &self.families {
            if family.slots == 0 {
                cols.extend(family.slot_columns(0));
            } else {
                for slot in 1..=family.slots {
                    cols.extend(family.slot_columns(slot));
                }
            }
        }
        cols
    }

    /// Trimmed listing entry for the module menu.
    pub fn summary(&self) -> ModuleSummary {
        ModuleSummary {
            key: self.key.to_string(),
            title: self.title.to_string(),
            columns: self.columns(),
            download_only: self.download_only,
            custom: false,
        }
    }
}

/// One row of the module menu.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleSummary {
    pub key: String,
    pub title: String,
    pub columns: Vec<String>,
    pub download_only: bool,
    /// Modules with a dedicated flow (punches, timecards) rather than the
    /// generic template/upload/export/delete surface.
    pub custom: bool,
}
