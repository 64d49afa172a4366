use super::{check_patterns, Completion, Store};
use crate::error::BaixaError;
use crate::layouts::schema::ActivityDef;
use crate::model::{
    ActivityDefinition, Client, DownloadedFileRecord, FieldKind, FieldSpec, Layout, LayoutStatus,
    Notification, SourceDocument, TaskInstance,
};
use crate::period::Period;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, BaixaError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, BaixaError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, BaixaError> {
        Self::create_schema(&conn)?;
        Ok(SqliteStore { conn })
    }

    fn create_schema(conn: &Connection) -> Result<(), BaixaError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS layouts (
                id INTEGER PRIMARY KEY,
                tenant_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                source_filename TEXT,
                source_bytes BLOB
            );

            CREATE TABLE IF NOT EXISTS field_specs (
                id INTEGER PRIMARY KEY,
                layout_id INTEGER NOT NULL REFERENCES layouts(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                kind TEXT NOT NULL,
                expected_value TEXT,
                validation_pattern TEXT,
                target_line INTEGER
            );

            CREATE TABLE IF NOT EXISTS clients (
                id INTEGER PRIMARY KEY,
                tenant_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                tax_id TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS activity_definitions (
                id INTEGER PRIMARY KEY,
                obligation_id INTEGER NOT NULL,
                obligation_name TEXT NOT NULL,
                activity_text TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS layout_activities (
                layout_id INTEGER NOT NULL REFERENCES layouts(id) ON DELETE CASCADE,
                activity_id INTEGER NOT NULL REFERENCES activity_definitions(id),
                PRIMARY KEY (layout_id, activity_id)
            );

            CREATE TABLE IF NOT EXISTS task_instances (
                id INTEGER PRIMARY KEY,
                client_id INTEGER NOT NULL REFERENCES clients(id),
                obligation_id INTEGER NOT NULL,
                group_id INTEGER NOT NULL,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                activity_text TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                type_tag TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS task_group_comments (
                id INTEGER PRIMARY KEY,
                group_id INTEGER NOT NULL,
                comment TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS downloaded_files (
                id INTEGER PRIMARY KEY,
                client_id INTEGER NOT NULL,
                task_instance_id INTEGER NOT NULL,
                filename TEXT NOT NULL,
                bytes BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS task_attachments (
                id INTEGER PRIMARY KEY,
                task_instance_id INTEGER NOT NULL,
                filename TEXT NOT NULL,
                bytes BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY,
                tenant_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                message TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notifications_fallback (
                id INTEGER PRIMARY KEY,
                tenant_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                message TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_layouts_tenant ON layouts(tenant_id);
            CREATE INDEX IF NOT EXISTS idx_clients_tax_id ON clients(tenant_id, tax_id);
            CREATE INDEX IF NOT EXISTS idx_instances_client_period
                ON task_instances(client_id, year, month);
            "#,
        )?;
        Ok(())
    }

    fn load_fields(&self, layout_id: i64) -> Result<Vec<FieldSpec>, BaixaError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, expected_value, validation_pattern, target_line
             FROM field_specs WHERE layout_id = ?1 ORDER BY position",
        )?;
        let fields = stmt
            .query_map(params![layout_id], |row| {
                let kind: String = row.get(1)?;
                let target_line: Option<i64> = row.get(4)?;
                Ok(FieldSpec {
                    id: row.get(0)?,
                    kind: FieldKind::from(kind),
                    expected_value: row.get(2)?,
                    validation_pattern: row.get(3)?,
                    target_line: target_line.and_then(|n| usize::try_from(n).ok()),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fields)
    }

    fn layout_from_row(row: &Row<'_>) -> rusqlite::Result<Layout> {
        let status: String = row.get(3)?;
        let source_filename: Option<String> = row.get(4)?;
        let source_bytes: Option<Vec<u8>> = row.get(5)?;
        let source_document = match (source_filename, source_bytes) {
            (Some(filename), Some(bytes)) => Some(SourceDocument { filename, bytes }),
            _ => None,
        };
        Ok(Layout {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            name: row.get(2)?,
            status: LayoutStatus::from_str_loose(&status),
            source_document,
            fields: Vec::new(),
        })
    }

    // Seeding and inspection helpers. The rest of the back office owns these
    // tables; the engine only reads them through `Store`.

    pub fn add_client(
        &mut self,
        tenant_id: i64,
        name: &str,
        tax_id: &str,
    ) -> Result<i64, BaixaError> {
        self.conn.execute(
            "INSERT INTO clients (tenant_id, name, tax_id) VALUES (?1, ?2, ?3)",
            params![tenant_id, name, tax_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn add_activity(
        &mut self,
        obligation_id: i64,
        obligation_name: &str,
        activity_text: &str,
    ) -> Result<i64, BaixaError> {
        self.conn.execute(
            "INSERT INTO activity_definitions (obligation_id, obligation_name, activity_text)
             VALUES (?1, ?2, ?3)",
            params![obligation_id, obligation_name, activity_text],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn link_activity(&mut self, layout_id: i64, activity_id: i64) -> Result<(), BaixaError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO layout_activities (layout_id, activity_id) VALUES (?1, ?2)",
            params![layout_id, activity_id],
        )?;
        Ok(())
    }

    /// Save a layout together with its linked activities in one transaction.
    /// Nothing is written when any step fails.
    pub fn import_layout(
        &mut self,
        layout: &Layout,
        activities: &[ActivityDef],
    ) -> Result<i64, BaixaError> {
        check_patterns(layout)?;
        let tx = self.conn.transaction()?;

        let mut activity_ids = Vec::with_capacity(activities.len());
        for activity in activities {
            tx.execute(
                "INSERT INTO activity_definitions (obligation_id, obligation_name, activity_text)
                 VALUES (?1, ?2, ?3)",
                params![
                    activity.obligation_id,
                    activity.obligation_name,
                    activity.activity_text
                ],
            )?;
            activity_ids.push(tx.last_insert_rowid());
        }

        let layout_id = write_layout(&tx, layout)?;
        for activity_id in activity_ids {
            tx.execute(
                "INSERT OR IGNORE INTO layout_activities (layout_id, activity_id) VALUES (?1, ?2)",
                params![layout_id, activity_id],
            )?;
        }
        tx.commit()?;

        tracing::debug!(layout_id, name = %layout.name, "imported layout");
        Ok(layout_id)
    }

    /// Insert a task instance; `instance.id` is ignored.
    pub fn add_task_instance(&mut self, instance: &TaskInstance) -> Result<i64, BaixaError> {
        self.conn.execute(
            "INSERT INTO task_instances
                (client_id, obligation_id, group_id, year, month, activity_text,
                 completed, completed_at, type_tag)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                instance.client_id,
                instance.obligation_id,
                instance.group_id,
                instance.year,
                instance.month,
                instance.activity_text,
                instance.completed,
                instance.completed_at,
                instance.type_tag,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn task_instance(&self, id: i64) -> Result<Option<TaskInstance>, BaixaError> {
        let instance = self
            .conn
            .query_row(
                &format!("{INSTANCE_COLUMNS} WHERE id = ?1"),
                params![id],
                instance_from_row,
            )
            .optional()?;
        Ok(instance)
    }

    pub fn group_comments(&self, group_id: i64) -> Result<Vec<String>, BaixaError> {
        let mut stmt = self
            .conn
            .prepare("SELECT comment FROM task_group_comments WHERE group_id = ?1 ORDER BY id")?;
        let comments = stmt
            .query_map(params![group_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(comments)
    }

    pub fn archived_files(
        &self,
        task_instance_id: i64,
    ) -> Result<Vec<DownloadedFileRecord>, BaixaError> {
        let mut stmt = self.conn.prepare(
            "SELECT client_id, task_instance_id, filename, bytes
             FROM downloaded_files WHERE task_instance_id = ?1 ORDER BY id",
        )?;
        let files = stmt
            .query_map(params![task_instance_id], |row| {
                Ok(DownloadedFileRecord {
                    client_id: row.get(0)?,
                    task_instance_id: row.get(1)?,
                    filename: row.get(2)?,
                    bytes: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(files)
    }

    pub fn attachment_names(&self, task_instance_id: i64) -> Result<Vec<String>, BaixaError> {
        let mut stmt = self.conn.prepare(
            "SELECT filename FROM task_attachments WHERE task_instance_id = ?1 ORDER BY id",
        )?;
        let names = stmt
            .query_map(params![task_instance_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn notifications(&self, tenant_id: i64) -> Result<Vec<Notification>, BaixaError> {
        self.read_notifications("notifications", tenant_id)
    }

    pub fn fallback_notifications(&self, tenant_id: i64) -> Result<Vec<Notification>, BaixaError> {
        self.read_notifications("notifications_fallback", tenant_id)
    }

    fn read_notifications(
        &self,
        table: &str,
        tenant_id: i64,
    ) -> Result<Vec<Notification>, BaixaError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT tenant_id, title, message FROM {table} WHERE tenant_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![tenant_id], |row| {
                Ok(Notification {
                    tenant_id: row.get(0)?,
                    title: row.get(1)?,
                    message: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn write_notification(&mut self, table: &str, n: &Notification) -> Result<(), BaixaError> {
        self.conn.execute(
            &format!("INSERT INTO {table} (tenant_id, title, message) VALUES (?1, ?2, ?3)"),
            params![n.tenant_id, n.title, n.message],
        )?;
        Ok(())
    }
}

const INSTANCE_COLUMNS: &str = "SELECT id, client_id, obligation_id, group_id, year, month, \
     activity_text, completed, completed_at, type_tag FROM task_instances";

/// Insert (id 0) or replace a layout and its field specs on `conn`.
fn write_layout(conn: &Connection, layout: &Layout) -> Result<i64, BaixaError> {
    let (source_filename, source_bytes) = match &layout.source_document {
        Some(doc) => (Some(doc.filename.as_str()), Some(doc.bytes.as_slice())),
        None => (None, None),
    };

    let id = if layout.id == 0 {
        conn.execute(
            "INSERT INTO layouts (tenant_id, name, status, source_filename, source_bytes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                layout.tenant_id,
                layout.name,
                layout.status.as_str(),
                source_filename,
                source_bytes
            ],
        )?;
        conn.last_insert_rowid()
    } else {
        let updated = conn.execute(
            "UPDATE layouts SET tenant_id = ?1, name = ?2, status = ?3,
                source_filename = ?4, source_bytes = ?5
             WHERE id = ?6",
            params![
                layout.tenant_id,
                layout.name,
                layout.status.as_str(),
                source_filename,
                source_bytes,
                layout.id
            ],
        )?;
        if updated == 0 {
            return Err(BaixaError::LayoutNotFound(layout.id));
        }
        conn.execute("DELETE FROM field_specs WHERE layout_id = ?1", params![layout.id])?;
        layout.id
    };

    for (position, field) in layout.fields.iter().enumerate() {
        conn.execute(
            "INSERT INTO field_specs
                (layout_id, position, kind, expected_value, validation_pattern, target_line)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                position as i64,
                field.kind.as_str(),
                field.expected_value,
                field.validation_pattern,
                field.target_line.map(|n| n as i64),
            ],
        )?;
    }
    Ok(id)
}

fn instance_from_row(row: &Row<'_>) -> rusqlite::Result<TaskInstance> {
    Ok(TaskInstance {
        id: row.get(0)?,
        client_id: row.get(1)?,
        obligation_id: row.get(2)?,
        group_id: row.get(3)?,
        year: row.get(4)?,
        month: row.get(5)?,
        activity_text: row.get(6)?,
        completed: row.get(7)?,
        completed_at: row.get(8)?,
        type_tag: row.get(9)?,
    })
}

impl Store for SqliteStore {
    fn list_layouts(&self, tenant_id: i64) -> Result<Vec<Layout>, BaixaError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tenant_id, name, status, source_filename, source_bytes
             FROM layouts WHERE tenant_id = ?1 ORDER BY id",
        )?;
        let mut layouts = stmt
            .query_map(params![tenant_id], Self::layout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for layout in &mut layouts {
            layout.fields = self.load_fields(layout.id)?;
        }
        Ok(layouts)
    }

    fn get_layout(&self, layout_id: i64) -> Result<Layout, BaixaError> {
        let mut layout = self
            .conn
            .query_row(
                "SELECT id, tenant_id, name, status, source_filename, source_bytes
                 FROM layouts WHERE id = ?1",
                params![layout_id],
                Self::layout_from_row,
            )
            .optional()?
            .ok_or(BaixaError::LayoutNotFound(layout_id))?;
        layout.fields = self.load_fields(layout.id)?;
        Ok(layout)
    }

    fn save_layout(&mut self, layout: &Layout) -> Result<i64, BaixaError> {
        check_patterns(layout)?;
        let tx = self.conn.transaction()?;
        let id = write_layout(&tx, layout)?;
        tx.commit()?;

        tracing::debug!(layout_id = id, name = %layout.name, "saved layout");
        Ok(id)
    }

    fn update_layout_status(
        &mut self,
        layout_id: i64,
        status: LayoutStatus,
    ) -> Result<(), BaixaError> {
        let updated = self.conn.execute(
            "UPDATE layouts SET status = ?1 WHERE id = ?2",
            params![status.as_str(), layout_id],
        )?;
        if updated == 0 {
            return Err(BaixaError::LayoutNotFound(layout_id));
        }
        Ok(())
    }

    fn find_client_by_tax_id(
        &self,
        tenant_id: i64,
        tax_id: &str,
    ) -> Result<Option<Client>, BaixaError> {
        let client = self
            .conn
            .query_row(
                "SELECT id, tenant_id, name, tax_id FROM clients
                 WHERE tenant_id = ?1 AND tax_id = ?2 ORDER BY id LIMIT 1",
                params![tenant_id, tax_id],
                |row| {
                    Ok(Client {
                        id: row.get(0)?,
                        tenant_id: row.get(1)?,
                        name: row.get(2)?,
                        tax_id: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(client)
    }

    fn activities_for_layout(&self, layout_id: i64) -> Result<Vec<ActivityDefinition>, BaixaError> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.obligation_id, a.obligation_name, a.activity_text
             FROM activity_definitions a
             JOIN layout_activities la ON la.activity_id = a.id
             WHERE la.layout_id = ?1
             ORDER BY a.id",
        )?;
        let activities = stmt
            .query_map(params![layout_id], |row| {
                Ok(ActivityDefinition {
                    id: row.get(0)?,
                    obligation_id: row.get(1)?,
                    obligation_name: row.get(2)?,
                    activity_text: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(activities)
    }

    fn pending_instances(
        &self,
        client_id: i64,
        obligation_ids: &[i64],
        period: Period,
    ) -> Result<Vec<TaskInstance>, BaixaError> {
        let mut stmt = self.conn.prepare(&format!(
            "{INSTANCE_COLUMNS}
             WHERE client_id = ?1 AND completed = 0 AND year = ?2 AND month = ?3
               AND LOWER(type_tag) LIKE '%pdf%'
             ORDER BY id"
        ))?;
        let instances = stmt
            .query_map(params![client_id, period.year, period.month], instance_from_row)?
            .filter(|row| {
                row.as_ref()
                    .map_or(true, |t| obligation_ids.contains(&t.obligation_id))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(instances)
    }

    fn complete_instance(&mut self, completion: &Completion) -> Result<bool, BaixaError> {
        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE task_instances SET completed = 1, completed_at = ?1
             WHERE id = ?2 AND completed = 0",
            params![completion.completed_at, completion.task_instance_id],
        )?;
        if updated == 0 {
            // dropping the transaction rolls it back
            return Ok(false);
        }
        tx.execute(
            "INSERT INTO task_group_comments (group_id, comment, created_at) VALUES (?1, ?2, ?3)",
            params![completion.group_id, completion.comment, completion.completed_at],
        )?;
        tx.commit()?;
        Ok(true)
    }

    fn archive_file(&mut self, record: &DownloadedFileRecord) -> Result<(), BaixaError> {
        self.conn.execute(
            "INSERT INTO downloaded_files (client_id, task_instance_id, filename, bytes)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.client_id,
                record.task_instance_id,
                record.filename,
                record.bytes
            ],
        )?;
        Ok(())
    }

    fn attach_file(
        &mut self,
        task_instance_id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), BaixaError> {
        self.conn.execute(
            "INSERT INTO task_attachments (task_instance_id, filename, bytes) VALUES (?1, ?2, ?3)",
            params![task_instance_id, filename, bytes],
        )?;
        Ok(())
    }

    fn insert_notification(&mut self, notification: &Notification) -> Result<(), BaixaError> {
        self.write_notification("notifications", notification)
    }

    fn insert_notification_fallback(
        &mut self,
        notification: &Notification,
    ) -> Result<(), BaixaError> {
        self.write_notification("notifications_fallback", notification)
    }
}
