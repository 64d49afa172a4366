use crate::period::Period;
use serde::Serialize;

/// Result of completing a task instance from an extracted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// The task instance that was marked completed.
    pub task_instance_id: i64,
    /// Client the document belongs to.
    pub client_id: i64,
    pub client_name: String,
    /// Activity text of the completed instance.
    pub activity_text: String,
    /// Normalized reference period.
    pub period: Period,
    /// Brasília wall-clock completion time (`YYYY-MM-DD HH:MM:SS`).
    pub completed_at: String,
    /// Whether the document was archived and attached to the instance.
    pub archived: bool,
    /// Whether a notification reached the primary or fallback store.
    pub notified: bool,
    /// Department mapped from the obligation keyword table, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}
