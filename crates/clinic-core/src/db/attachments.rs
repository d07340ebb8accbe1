//! Attachment metadata operations for events and invoices.

use rusqlite::{params, params_from_iter};

use super::{placeholders, Database, DbResult};
use crate::models::{Attachment, AttachmentOwner};

impl AttachmentOwner {
    pub(crate) fn table(&self) -> &'static str {
        match self {
            AttachmentOwner::Event => "animal_event_attachments",
            AttachmentOwner::Invoice => "invoice_attachments",
        }
    }

    pub(crate) fn parent_column(&self) -> &'static str {
        match self {
            AttachmentOwner::Event => "event_id",
            AttachmentOwner::Invoice => "invoice_id",
        }
    }
}

impl Database {
    /// Insert attachment metadata after the object has been stored.
    pub fn insert_attachment(&self, owner: AttachmentOwner, attachment: &Attachment) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} (id, {}, storage_key, file_name, size_bytes, content_type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                owner.table(),
                owner.parent_column()
            ),
            params![
                attachment.id,
                attachment.parent_id,
                attachment.storage_key,
                attachment.file_name,
                attachment.size_bytes as i64,
                attachment.content_type,
                attachment.created_at,
            ],
        )?;
        Ok(())
    }

    /// List attachments belonging to any of the given parents.
    pub fn list_attachments(
        &self,
        owner: AttachmentOwner,
        parent_ids: &[String],
    ) -> DbResult<Vec<Attachment>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, {col}, storage_key, file_name, size_bytes, content_type, created_at
             FROM {table} WHERE {col} IN ({ph}) ORDER BY created_at",
            col = owner.parent_column(),
            table = owner.table(),
            ph = placeholders(parent_ids.len()),
        ))?;
        let rows = stmt.query_map(params_from_iter(parent_ids.iter()), |row| {
            let size: i64 = row.get(4)?;
            Ok(Attachment {
                id: row.get(0)?,
                parent_id: row.get(1)?,
                storage_key: row.get(2)?,
                file_name: row.get(3)?,
                size_bytes: size.max(0) as u64,
                content_type: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
