//! Persistence boundary used by the workflow services.
//!
//! Services only need "insert row", "update row by id", "delete rows by
//! id/ids" and "select rows with a filter". [`Database`] implements the
//! boundary over SQLite; tests wrap it to inject backend failures.

use std::collections::HashMap;

use rusqlite::params_from_iter;

use super::{placeholders, Database, DbResult};
use crate::models::{
    Animal, AnimalEvent, AnimalStatus, Attachment, AttachmentOwner, Contact, Invoice,
    InvoiceStatus,
};

/// Tables rows can be deleted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Animals,
    Contacts,
    Events,
    Invoices,
    EventAttachments,
    InvoiceAttachments,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Animals => "animals",
            Table::Contacts => "contacts",
            Table::Events => "animal_events",
            Table::Invoices => "invoices",
            Table::EventAttachments => "animal_event_attachments",
            Table::InvoiceAttachments => "invoice_attachments",
        }
    }
}

/// Parent → child foreign-key relations checked before deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// animal_events.animal_id
    AnimalEvents,
    /// invoices.animal_id
    AnimalInvoices,
    /// animals.owner_id
    OwnedAnimals,
    /// invoices.veterinarian_id
    VeterinarianInvoices,
    /// animal_event_attachments.event_id
    EventAttachments,
    /// invoice_attachments.invoice_id
    InvoiceAttachments,
}

impl Relation {
    pub fn child_table(&self) -> Table {
        match self {
            Relation::AnimalEvents => Table::Events,
            Relation::AnimalInvoices | Relation::VeterinarianInvoices => Table::Invoices,
            Relation::OwnedAnimals => Table::Animals,
            Relation::EventAttachments => Table::EventAttachments,
            Relation::InvoiceAttachments => Table::InvoiceAttachments,
        }
    }

    pub fn parent_column(&self) -> &'static str {
        match self {
            Relation::AnimalEvents | Relation::AnimalInvoices => "animal_id",
            Relation::OwnedAnimals => "owner_id",
            Relation::VeterinarianInvoices => "veterinarian_id",
            Relation::EventAttachments => "event_id",
            Relation::InvoiceAttachments => "invoice_id",
        }
    }
}

/// Remote-table operations the workflow services depend on.
pub trait ClinicStore {
    fn get_animal(&self, id: &str) -> DbResult<Option<Animal>>;
    fn list_animals(&self) -> DbResult<Vec<Animal>>;
    fn update_animal_status(
        &self,
        id: &str,
        status: AnimalStatus,
        owner_id: Option<&str>,
    ) -> DbResult<bool>;

    fn get_contact(&self, id: &str) -> DbResult<Option<Contact>>;
    fn list_contacts(&self) -> DbResult<Vec<Contact>>;

    fn insert_event(&self, event: &AnimalEvent) -> DbResult<()>;
    fn list_events(&self) -> DbResult<Vec<AnimalEvent>>;

    fn get_invoice(&self, id: &str) -> DbResult<Option<Invoice>>;
    fn list_invoices(&self) -> DbResult<Vec<Invoice>>;
    fn update_invoice_status(&self, id: &str, status: InvoiceStatus) -> DbResult<bool>;

    fn insert_attachment(&self, owner: AttachmentOwner, attachment: &Attachment) -> DbResult<()>;
    fn list_attachments(
        &self,
        owner: AttachmentOwner,
        parent_ids: &[String],
    ) -> DbResult<Vec<Attachment>>;

    /// Child row ids per parent id, for parents that have any.
    fn child_ids(
        &self,
        relation: Relation,
        parent_ids: &[String],
    ) -> DbResult<HashMap<String, Vec<String>>>;

    /// Delete every child row of the given parents.
    fn delete_children(&self, relation: Relation, parent_ids: &[String]) -> DbResult<usize>;

    /// Delete one row; `false` when nothing matched.
    fn delete_row(&self, table: Table, id: &str) -> DbResult<bool>;

    /// Delete many rows in one statement.
    fn delete_rows(&self, table: Table, ids: &[String]) -> DbResult<usize>;
}

impl Database {
    /// Child row ids per parent id.
    pub fn child_ids(
        &self,
        relation: Relation,
        parent_ids: &[String],
    ) -> DbResult<HashMap<String, Vec<String>>> {
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        if parent_ids.is_empty() {
            return Ok(children);
        }

        let column = relation.parent_column();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {col}, id FROM {table} WHERE {col} IN ({ph})",
            col = column,
            table = relation.child_table().name(),
            ph = placeholders(parent_ids.len()),
        ))?;
        let rows = stmt.query_map(params_from_iter(parent_ids.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (parent, child) = row?;
            children.entry(parent).or_default().push(child);
        }
        Ok(children)
    }

    /// Delete every child row of the given parents.
    pub fn delete_children(&self, relation: Relation, parent_ids: &[String]) -> DbResult<usize> {
        if parent_ids.is_empty() {
            return Ok(0);
        }
        let deleted = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} IN ({})",
                relation.child_table().name(),
                relation.parent_column(),
                placeholders(parent_ids.len())
            ),
            params_from_iter(parent_ids.iter()),
        )?;
        Ok(deleted)
    }

    /// Delete one row by id.
    pub fn delete_row(&self, table: Table, id: &str) -> DbResult<bool> {
        let deleted = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?", table.name()), [id])?;
        Ok(deleted > 0)
    }

    /// Delete rows by id in a single statement. Fails as a whole if any row
    /// is still referenced.
    pub fn delete_rows(&self, table: Table, ids: &[String]) -> DbResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE id IN ({})",
                table.name(),
                placeholders(ids.len())
            ),
            params_from_iter(ids.iter()),
        )?;
        Ok(deleted)
    }
}

impl ClinicStore for Database {
    fn get_animal(&self, id: &str) -> DbResult<Option<Animal>> {
        Database::get_animal(self, id)
    }

    fn list_animals(&self) -> DbResult<Vec<Animal>> {
        Database::list_animals(self)
    }

    fn update_animal_status(
        &self,
        id: &str,
        status: AnimalStatus,
        owner_id: Option<&str>,
    ) -> DbResult<bool> {
        Database::update_animal_status(self, id, status, owner_id)
    }

    fn get_contact(&self, id: &str) -> DbResult<Option<Contact>> {
        Database::get_contact(self, id)
    }

    fn list_contacts(&self) -> DbResult<Vec<Contact>> {
        Database::list_contacts(self)
    }

    fn insert_event(&self, event: &AnimalEvent) -> DbResult<()> {
        Database::insert_event(self, event)
    }

    fn list_events(&self) -> DbResult<Vec<AnimalEvent>> {
        Database::list_events(self)
    }

    fn get_invoice(&self, id: &str) -> DbResult<Option<Invoice>> {
        Database::get_invoice(self, id)
    }

    fn list_invoices(&self) -> DbResult<Vec<Invoice>> {
        Database::list_invoices(self)
    }

    fn update_invoice_status(&self, id: &str, status: InvoiceStatus) -> DbResult<bool> {
        Database::update_invoice_status(self, id, status)
    }

    fn insert_attachment(&self, owner: AttachmentOwner, attachment: &Attachment) -> DbResult<()> {
        Database::insert_attachment(self, owner, attachment)
    }

    fn list_attachments(
        &self,
        owner: AttachmentOwner,
        parent_ids: &[String],
    ) -> DbResult<Vec<Attachment>> {
        Database::list_attachments(self, owner, parent_ids)
    }

    fn child_ids(
        &self,
        relation: Relation,
        parent_ids: &[String],
    ) -> DbResult<HashMap<String, Vec<String>>> {
        Database::child_ids(self, relation, parent_ids)
    }

    fn delete_children(&self, relation: Relation, parent_ids: &[String]) -> DbResult<usize> {
        Database::delete_children(self, relation, parent_ids)
    }

    fn delete_row(&self, table: Table, id: &str) -> DbResult<bool> {
        Database::delete_row(self, table, id)
    }

    fn delete_rows(&self, table: Table, ids: &[String]) -> DbResult<usize> {
        Database::delete_rows(self, table, ids)
    }
}
