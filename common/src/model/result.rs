use serde::Serialize;

/// What the reconciliation engine did (or could not do) for one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowAction {
    Create,
    Update,
    /// The group never reached the wire (validation or payload failure).
    Error,
    /// Deliberately not sent: duplicate upload or preview mode.
    Skipped,
}

/// One line of the upload result table.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    /// 1-based spreadsheet row the group started at, where known.
    pub row: Option<usize>,
    /// Group key: the numeric id for updates, the natural key otherwise.
    pub key: String,
    pub action: RowAction,
    pub http_status: Option<u16>,
    pub status: String,
    pub message: String,
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        matches!(self.http_status, Some(200) | Some(201))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub module: String,
    pub rows_detected: usize,
    /// The identical file was already processed this session; nothing was
    /// sent.
    pub duplicate_upload: bool,
    pub results: Vec<UploadResult>,
}

/// Outcome of one independent `DELETE {base}/{id}` call.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub id: i64,
    pub http_status: Option<u16>,
    pub deleted: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub module: String,
    pub results: Vec<DeleteOutcome>,
}
