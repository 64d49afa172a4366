pub mod sqlite;

use crate::error::BaixaError;
use crate::model::{
    ActivityDefinition, Client, DownloadedFileRecord, Layout, LayoutStatus, Notification,
    TaskInstance,
};
use crate::period::Period;

pub use sqlite::SqliteStore;

/// Completion of one task instance plus the audit comment on its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub task_instance_id: i64,
    pub group_id: i64,
    pub completed_at: String,
    pub comment: String,
}

/// Persistence the pipeline depends on. Reads are tenant-keyed where a
/// tenant applies.
pub trait Store {
    fn list_layouts(&self, tenant_id: i64) -> Result<Vec<Layout>, BaixaError>;

    fn get_layout(&self, layout_id: i64) -> Result<Layout, BaixaError>;

    /// Insert (id 0) or replace a layout with its fields. Patterns are
    /// compiled first; an invalid one rejects the whole save.
    fn save_layout(&mut self, layout: &Layout) -> Result<i64, BaixaError>;

    fn update_layout_status(
        &mut self,
        layout_id: i64,
        status: LayoutStatus,
    ) -> Result<(), BaixaError>;

    fn find_client_by_tax_id(
        &self,
        tenant_id: i64,
        tax_id: &str,
    ) -> Result<Option<Client>, BaixaError>;

    fn activities_for_layout(&self, layout_id: i64) -> Result<Vec<ActivityDefinition>, BaixaError>;

    /// Not-yet-completed, PDF-sourced instances of `client_id` for `period`
    /// whose obligation is one of `obligation_ids`, in id order.
    fn pending_instances(
        &self,
        client_id: i64,
        obligation_ids: &[i64],
        period: Period,
    ) -> Result<Vec<TaskInstance>, BaixaError>;

    /// Mark the instance completed and record the comment atomically.
    /// Returns `false` when the instance was no longer pending.
    fn complete_instance(&mut self, completion: &Completion) -> Result<bool, BaixaError>;

    fn archive_file(&mut self, record: &DownloadedFileRecord) -> Result<(), BaixaError>;

    fn attach_file(
        &mut self,
        task_instance_id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), BaixaError>;

    fn insert_notification(&mut self, notification: &Notification) -> Result<(), BaixaError>;

    fn insert_notification_fallback(
        &mut self,
        notification: &Notification,
    ) -> Result<(), BaixaError>;
}

/// Reject a layout whose patterns do not compile.
pub fn check_patterns(layout: &Layout) -> Result<(), BaixaError> {
    for field in &layout.fields {
        field.compile()?;
    }
    Ok(())
}
