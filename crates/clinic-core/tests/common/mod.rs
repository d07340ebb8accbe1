//! Store wrapper shared by the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;

use clinic_core::db::{ClinicStore, Database, DbError, DbResult, Relation, Table};
use clinic_core::models::{
    Animal, AnimalEvent, AnimalStatus, Attachment, AttachmentOwner, Contact, ContactRole, Invoice,
    InvoiceStatus,
};

/// Wraps a real database, counts calls and fails chosen operations.
pub struct FlakyStore {
    pub db: Database,
    pub calls: Cell<usize>,
    pub fail_bulk_delete: bool,
    pub fail_status_update: bool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            db: Database::open_in_memory().unwrap(),
            calls: Cell::new(0),
            fail_bulk_delete: false,
            fail_status_update: false,
        }
    }

    fn hit(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

fn injected(what: &str) -> DbError {
    DbError::Constraint(format!("injected failure: {}", what))
}

impl ClinicStore for FlakyStore {
    fn get_animal(&self, id: &str) -> DbResult<Option<Animal>> {
        self.hit();
        self.db.get_animal(id)
    }

    fn list_animals(&self) -> DbResult<Vec<Animal>> {
        self.hit();
        self.db.list_animals()
    }

    fn update_animal_status(
        &self,
        id: &str,
        status: AnimalStatus,
        owner_id: Option<&str>,
    ) -> DbResult<bool> {
        self.hit();
        if self.fail_status_update {
            return Err(injected("update_animal_status"));
        }
        self.db.update_animal_status(id, status, owner_id)
    }

    fn get_contact(&self, id: &str) -> DbResult<Option<Contact>> {
        self.hit();
        self.db.get_contact(id)
    }

    fn list_contacts(&self) -> DbResult<Vec<Contact>> {
        self.hit();
        self.db.list_contacts()
    }

    fn insert_event(&self, event: &AnimalEvent) -> DbResult<()> {
        self.hit();
        self.db.insert_event(event)
    }

    fn list_events(&self) -> DbResult<Vec<AnimalEvent>> {
        self.hit();
        self.db.list_events()
    }

    fn get_invoice(&self, id: &str) -> DbResult<Option<Invoice>> {
        self.hit();
        self.db.get_invoice(id)
    }

    fn list_invoices(&self) -> DbResult<Vec<Invoice>> {
        self.hit();
        self.db.list_invoices()
    }

    fn update_invoice_status(&self, id: &str, status: InvoiceStatus) -> DbResult<bool> {
        self.hit();
        self.db.update_invoice_status(id, status)
    }

    fn insert_attachment(&self, owner: AttachmentOwner, attachment: &Attachment) -> DbResult<()> {
        self.hit();
        self.db.insert_attachment(owner, attachment)
    }

    fn list_attachments(
        &self,
        owner: AttachmentOwner,
        parent_ids: &[String],
    ) -> DbResult<Vec<Attachment>> {
        self.hit();
        self.db.list_attachments(owner, parent_ids)
    }

    fn child_ids(
        &self,
        relation: Relation,
        parent_ids: &[String],
    ) -> DbResult<HashMap<String, Vec<String>>> {
        self.hit();
        self.db.child_ids(relation, parent_ids)
    }

    fn delete_children(&self, relation: Relation, parent_ids: &[String]) -> DbResult<usize> {
        self.hit();
        self.db.delete_children(relation, parent_ids)
    }

    fn delete_row(&self, table: Table, id: &str) -> DbResult<bool> {
        self.hit();
        self.db.delete_row(table, id)
    }

    fn delete_rows(&self, table: Table, ids: &[String]) -> DbResult<usize> {
        self.hit();
        if self.fail_bulk_delete {
            return Err(injected("delete_rows"));
        }
        self.db.delete_rows(table, ids)
    }
}

pub fn add_animal(db: &Database, name: &str) -> Animal {
    let animal = Animal::new(name.to_string(), "dog".to_string());
    db.insert_animal(&animal).unwrap();
    animal
}

pub fn add_contact(db: &Database, first: &str, role: ContactRole) -> Contact {
    let contact = Contact::new(first.to_string(), "Tester".to_string(), vec![role]);
    db.insert_contact(&contact).unwrap();
    contact
}

pub fn add_invoice(db: &Database, animal: &Animal, number: &str) -> Invoice {
    let invoice = Invoice::new(number.to_string(), animal.id.clone(), "2024-03-01".to_string());
    db.insert_invoice(&invoice).unwrap();
    invoice
}
