//! Dependency-checked deletes.
//!
//! Per kind:
//! - animal: blocked by invoices; events and their attachments cascade;
//! - invoice: blocked when it is not a draft and has line items; attachments cascade;
//! - contact: blocked while it owns an animal or is an invoice veterinarian;
//! - event: attachments cascade.
//!
//! Storage objects of removed attachments are deleted after the rows, and
//! failures there are only logged.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::policy::{BatchDeleteReport, BlockedItem, DeleteOutcome, EntityKind, FailedItem};
use crate::db::{ClinicStore, DbError, Relation};
use crate::models::{Attachment, AttachmentOwner};
use crate::notify::{RefreshBus, Topic};
use crate::storage::ObjectStore;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type GuardResult<T> = Result<T, GuardError>;

fn counted(count: usize, singular: &str) -> String {
    if count == 1 {
        format!("1 {}", singular)
    } else {
        format!("{} {}s", count, singular)
    }
}

/// Deletes records after checking their dependents.
pub struct DeletionGuard<'a, S: ClinicStore + ?Sized> {
    store: &'a S,
    objects: Option<&'a dyn ObjectStore>,
    bus: Option<&'a RefreshBus>,
}

impl<'a, S: ClinicStore + ?Sized> DeletionGuard<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            objects: None,
            bus: None,
        }
    }

    /// Remove attachment objects from `objects` after their rows are gone.
    pub fn with_objects(mut self, objects: &'a dyn ObjectStore) -> Self {
        self.objects = Some(objects);
        self
    }

    pub fn with_refresh(mut self, bus: &'a RefreshBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Blocking reason per id, for the ids that cannot be deleted.
    pub fn blockers(&self, kind: EntityKind, ids: &[String]) -> GuardResult<HashMap<String, String>> {
        let mut reasons = HashMap::new();
        match kind {
            EntityKind::Animal => {
                for (id, invoices) in self.store.child_ids(Relation::AnimalInvoices, ids)? {
                    reasons.insert(id, format!("Animal has {}", counted(invoices.len(), "invoice")));
                }
            }
            EntityKind::Contact => {
                let owned = self.store.child_ids(Relation::OwnedAnimals, ids)?;
                let billed = self.store.child_ids(Relation::VeterinarianInvoices, ids)?;
                for id in ids {
                    let mut parts = Vec::new();
                    if let Some(animals) = owned.get(id) {
                        parts.push(format!("owns {}", counted(animals.len(), "animal")));
                    }
                    if let Some(invoices) = billed.get(id) {
                        parts.push(format!(
                            "is the veterinarian on {}",
                            counted(invoices.len(), "invoice")
                        ));
                    }
                    if !parts.is_empty() {
                        reasons.insert(id.clone(), format!("Contact {}", parts.join(" and ")));
                    }
                }
            }
            EntityKind::Invoice => {
                for id in ids {
                    if let Some(invoice) = self.store.get_invoice(id)? {
                        if !invoice.is_draft() && !invoice.line_items.is_empty() {
                            reasons.insert(
                                id.clone(),
                                format!("Invoice is {} and has line items", invoice.status),
                            );
                        }
                    }
                }
            }
            EntityKind::Event => {}
        }
        Ok(reasons)
    }

    /// Delete one record with its cascading children.
    pub fn delete(&self, kind: EntityKind, id: &str) -> GuardResult<DeleteOutcome> {
        let ids = vec![id.to_string()];
        if let Some(reason) = self.blockers(kind, &ids)?.remove(id) {
            tracing::info!(kind = ?kind, id, reason = %reason, "delete blocked");
            return Ok(DeleteOutcome::Blocked { reason });
        }

        let attachments = self.attachments_of(kind, &ids)?.remove(id).unwrap_or_default();
        self.remove_children(kind, &ids)?;
        if !self.store.delete_row(kind.table(), id)? {
            return Ok(DeleteOutcome::NotFound);
        }

        tracing::info!(kind = ?kind, id, attachments = attachments.len(), "record deleted");
        self.purge_objects(&attachments);
        self.publish(kind, ids);
        Ok(DeleteOutcome::Deleted)
    }

    /// Delete every id that has no blocking dependents.
    ///
    /// The deletable subset goes out as one bulk delete. When that call
    /// fails, each id is deleted on its own and tallied.
    pub fn delete_batch(&self, kind: EntityKind, ids: &[String]) -> GuardResult<BatchDeleteReport> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let mut report = BatchDeleteReport::new(kind, ids.len());
        let blockers = self.blockers(kind, &ids)?;
        let mut deletable = Vec::new();
        for id in ids {
            match blockers.get(&id) {
                Some(reason) => report.blocked.push(BlockedItem {
                    id,
                    reason: reason.clone(),
                }),
                None => deletable.push(id),
            }
        }

        if deletable.is_empty() {
            return Ok(report);
        }

        // Listed before any delete: a failed bulk call may already have
        // removed the attachment rows.
        let mut attachments = self.attachments_of(kind, &deletable)?;

        match self.delete_bulk(kind, &deletable) {
            Ok(count) => {
                report.deleted = count;
                for listed in attachments.values() {
                    self.purge_objects(listed);
                }
                self.publish(kind, deletable);
            }
            Err(e) => {
                tracing::warn!(kind = ?kind, count = deletable.len(), error = %e, "bulk delete failed, deleting individually");
                report.used_fallback = true;
                let mut removed = Vec::new();
                for id in deletable {
                    match self.delete_single(kind, &id) {
                        Ok(true) => {
                            report.deleted += 1;
                            if let Some(listed) = attachments.remove(&id) {
                                self.purge_objects(&listed);
                            }
                            removed.push(id);
                        }
                        Ok(false) => {}
                        Err(e) => {
                            tracing::warn!(kind = ?kind, id = %id, error = %e, "delete failed");
                            report.failed.push(FailedItem {
                                id,
                                error: e.to_string(),
                            });
                        }
                    }
                }
                if !removed.is_empty() {
                    self.publish(kind, removed);
                }
            }
        }

        tracing::info!(
            kind = ?kind,
            requested = report.requested,
            deleted = report.deleted,
            blocked = report.blocked.len(),
            failed = report.failed.len(),
            "batch delete finished"
        );
        Ok(report)
    }

    fn delete_bulk(&self, kind: EntityKind, ids: &[String]) -> Result<usize, DbError> {
        self.remove_children(kind, ids)?;
        self.store.delete_rows(kind.table(), ids)
    }

    /// `false` when the row was already gone.
    fn delete_single(&self, kind: EntityKind, id: &str) -> Result<bool, DbError> {
        let ids = [id.to_string()];
        self.remove_children(kind, &ids)?;
        self.store.delete_row(kind.table(), id)
    }

    /// Attachments that go with each of `ids`, keyed by the id being deleted.
    fn attachments_of(
        &self,
        kind: EntityKind,
        ids: &[String],
    ) -> Result<HashMap<String, Vec<Attachment>>, DbError> {
        let mut by_record: HashMap<String, Vec<Attachment>> = HashMap::new();
        match kind {
            EntityKind::Animal => {
                let mut owner_of = HashMap::new();
                for (animal_id, event_ids) in self.store.child_ids(Relation::AnimalEvents, ids)? {
                    for event_id in event_ids {
                        owner_of.insert(event_id, animal_id.clone());
                    }
                }
                let event_ids: Vec<String> = owner_of.keys().cloned().collect();
                for attachment in self.store.list_attachments(AttachmentOwner::Event, &event_ids)? {
                    if let Some(animal_id) = owner_of.get(&attachment.parent_id) {
                        by_record.entry(animal_id.clone()).or_default().push(attachment);
                    }
                }
            }
            EntityKind::Event | EntityKind::Invoice => {
                let owner = if kind == EntityKind::Event {
                    AttachmentOwner::Event
                } else {
                    AttachmentOwner::Invoice
                };
                for attachment in self.store.list_attachments(owner, ids)? {
                    by_record.entry(attachment.parent_id.clone()).or_default().push(attachment);
                }
            }
            EntityKind::Contact => {}
        }
        Ok(by_record)
    }

    /// Delete the cascading child rows of `ids`.
    fn remove_children(&self, kind: EntityKind, ids: &[String]) -> Result<(), DbError> {
        match kind {
            EntityKind::Animal => {
                let event_ids: Vec<String> = self
                    .store
                    .child_ids(Relation::AnimalEvents, ids)?
                    .into_values()
                    .flatten()
                    .collect();
                self.store.delete_children(Relation::EventAttachments, &event_ids)?;
                self.store.delete_children(Relation::AnimalEvents, ids)?;
            }
            EntityKind::Event => {
                self.store.delete_children(Relation::EventAttachments, ids)?;
            }
            EntityKind::Invoice => {
                self.store.delete_children(Relation::InvoiceAttachments, ids)?;
            }
            EntityKind::Contact => {}
        }
        Ok(())
    }

    fn purge_objects(&self, attachments: &[Attachment]) {
        let Some(objects) = self.objects else {
            return;
        };
        for attachment in attachments {
            if let Err(e) = objects.delete_object(&attachment.storage_key) {
                tracing::warn!(key = %attachment.storage_key, error = %e, "failed to delete attachment object");
            }
        }
    }

    fn publish(&self, kind: EntityKind, ids: Vec<String>) {
        let Some(bus) = self.bus else {
            return;
        };
        if kind == EntityKind::Animal {
            bus.publish(Topic::Events, Vec::new());
        }
        bus.publish(kind.topic(), ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{
        Animal, AnimalEvent, Contact, ContactRole, EventDetails, Invoice, InvoiceLineItem,
        InvoiceStatus, NoteDetails,
    };
    use crate::storage::MemoryObjectStore;

    fn animal(db: &Database, name: &str) -> Animal {
        let animal = Animal::new(name.into(), "dog".into());
        db.insert_animal(&animal).unwrap();
        animal
    }

    fn invoice(db: &Database, animal_id: &str, status: InvoiceStatus, lines: usize) -> Invoice {
        let mut invoice = Invoice::new(
            format!("INV-{}", uuid::Uuid::new_v4()),
            animal_id.into(),
            "2024-03-01".into(),
        );
        invoice.status = status;
        for i in 0..lines {
            invoice.push_line_item(InvoiceLineItem {
                item_id: format!("item-{}", i),
                description: "Exam".into(),
                quantity: 1.0,
                unit_price: 20.0,
            });
        }
        db.insert_invoice(&invoice).unwrap();
        invoice
    }

    #[test]
    fn test_animal_with_invoice_blocked() {
        let db = Database::open_in_memory().unwrap();
        let rex = animal(&db, "Rex");
        invoice(&db, &rex.id, InvoiceStatus::Draft, 0);

        let outcome = DeletionGuard::new(&db).delete(EntityKind::Animal, &rex.id).unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome::Blocked {
                reason: "Animal has 1 invoice".into()
            }
        );
        assert!(db.get_animal(&rex.id).unwrap().is_some());
    }

    #[test]
    fn test_animal_events_cascade_with_objects() {
        let db = Database::open_in_memory().unwrap();
        let objects = MemoryObjectStore::new();
        let rex = animal(&db, "Rex");

        let event = AnimalEvent::new(
            rex.id.clone(),
            "2024-03-02".into(),
            EventDetails::Note(NoteDetails {
                content: "bath".into(),
            }),
        );
        db.insert_event(&event).unwrap();
        objects.put_object("events/x/photo.jpg", b"jpg", "image/jpeg").unwrap();
        db.insert_attachment(
            AttachmentOwner::Event,
            &Attachment {
                id: "att-1".into(),
                parent_id: event.id.clone(),
                storage_key: "events/x/photo.jpg".into(),
                file_name: "photo.jpg".into(),
                size_bytes: 3,
                content_type: "image/jpeg".into(),
                created_at: "2024-03-02T00:00:00Z".into(),
            },
        )
        .unwrap();

        let guard = DeletionGuard::new(&db).with_objects(&objects);
        assert_eq!(guard.delete(EntityKind::Animal, &rex.id).unwrap(), DeleteOutcome::Deleted);
        assert!(db.get_animal(&rex.id).unwrap().is_none());
        assert!(db.list_events().unwrap().is_empty());
        assert!(objects.is_empty());

        assert_eq!(guard.delete(EntityKind::Animal, &rex.id).unwrap(), DeleteOutcome::NotFound);
    }

    #[test]
    fn test_invoice_rule() {
        let db = Database::open_in_memory().unwrap();
        let rex = animal(&db, "Rex");
        let sent_with_lines = invoice(&db, &rex.id, InvoiceStatus::Sent, 2);
        let sent_empty = invoice(&db, &rex.id, InvoiceStatus::Sent, 0);
        let draft_with_lines = invoice(&db, &rex.id, InvoiceStatus::Draft, 2);

        let guard = DeletionGuard::new(&db);
        assert!(matches!(
            guard.delete(EntityKind::Invoice, &sent_with_lines.id).unwrap(),
            DeleteOutcome::Blocked { .. }
        ));
        assert_eq!(guard.delete(EntityKind::Invoice, &sent_empty.id).unwrap(), DeleteOutcome::Deleted);
        assert_eq!(
            guard.delete(EntityKind::Invoice, &draft_with_lines.id).unwrap(),
            DeleteOutcome::Deleted
        );
    }

    #[test]
    fn test_contact_in_use_blocked() {
        let db = Database::open_in_memory().unwrap();
        let owner = Contact::new("Kim".into(), "Park".into(), vec![ContactRole::Owner, ContactRole::Veterinarian]);
        db.insert_contact(&owner).unwrap();
        let mut pet = Animal::new("Bean".into(), "cat".into());
        pet.owner_id = Some(owner.id.clone());
        db.insert_animal(&pet).unwrap();
        let mut bill = Invoice::new("INV-9".into(), pet.id.clone(), "2024-01-01".into());
        bill.veterinarian_id = Some(owner.id.clone());
        db.insert_invoice(&bill).unwrap();

        let reasons = DeletionGuard::new(&db)
            .blockers(EntityKind::Contact, &[owner.id.clone()])
            .unwrap();
        assert_eq!(
            reasons[&owner.id],
            "Contact owns 1 animal and is the veterinarian on 1 invoice"
        );
    }

    #[test]
    fn test_batch_partition() {
        let db = Database::open_in_memory().unwrap();
        let bus = RefreshBus::new();
        let free: Vec<Animal> = (0..3).map(|i| animal(&db, &format!("Free {}", i))).collect();
        let billed = animal(&db, "Billed");
        invoice(&db, &billed.id, InvoiceStatus::Paid, 1);

        let mut ids: Vec<String> = free.iter().map(|a| a.id.clone()).collect();
        ids.push(billed.id.clone());
        ids.push(free[0].id.clone());

        let report = DeletionGuard::new(&db)
            .with_refresh(&bus)
            .delete_batch(EntityKind::Animal, &ids)
            .unwrap();
        assert_eq!(report.requested, 4);
        assert_eq!(report.deleted, 3);
        assert_eq!(report.blocked.len(), 1);
        assert_eq!(report.blocked[0].id, billed.id);
        assert!(!report.used_fallback);
        assert_eq!(db.list_animals().unwrap().len(), 1);
    }
}
