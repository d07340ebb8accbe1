//! Invoice workflow: create, edit, and submit to the billing webhook.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{ContactRole, Invoice, InvoiceLineItem, InvoiceStatus};
use crate::notify::{Notice, RefreshBus, Topic};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Webhook request failed: {0}")]
    Transport(String),
}

/// Outbound endpoint receiving submitted invoices.
pub trait InvoiceWebhook {
    /// Deliver the submission and return the HTTP status code.
    fn post(&self, submission: &InvoiceSubmission) -> Result<u16, WebhookError>;
}

#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("Invalid invoice: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Contact {0} is not a veterinarian")]
    NotVeterinarian(String),

    #[error("{0}")]
    Webhook(#[from] WebhookError),

    #[error("Webhook rejected the invoice with status {0}")]
    Rejected(u16),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type InvoiceResult<T> = Result<T, InvoiceError>;

/// Payload posted to the webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSubmission {
    pub invoice_id: String,
    pub invoice_number: String,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub animal_id: String,
    pub animal_name: String,
    pub veterinarian_id: Option<String>,
    pub veterinarian_name: Option<String>,
    pub line_items: Vec<InvoiceLineItem>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub notes: Option<String>,
    pub submitted_at: String,
}

/// Invoice operations over the database.
pub struct InvoiceDesk<'a> {
    db: &'a Database,
    bus: Option<&'a RefreshBus>,
}

impl<'a> InvoiceDesk<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db, bus: None }
    }

    pub fn with_refresh(mut self, bus: &'a RefreshBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Recompute totals, check references and store a new invoice.
    pub fn create(&self, mut invoice: Invoice) -> InvoiceResult<Invoice> {
        self.prepare(&mut invoice)?;
        self.db.insert_invoice(&invoice)?;
        tracing::info!(invoice_id = %invoice.id, number = %invoice.invoice_number, total = invoice.total, "invoice created");
        self.publish(&invoice.id);
        Ok(invoice)
    }

    pub fn update(&self, mut invoice: Invoice) -> InvoiceResult<Invoice> {
        self.prepare(&mut invoice)?;
        invoice.touch();
        if !self.db.update_invoice(&invoice)? {
            return Err(InvoiceError::NotFound(invoice.id));
        }
        self.publish(&invoice.id);
        Ok(invoice)
    }

    pub fn set_status(&self, id: &str, status: InvoiceStatus) -> InvoiceResult<()> {
        if !self.db.update_invoice_status(id, status)? {
            return Err(InvoiceError::NotFound(id.to_string()));
        }
        self.publish(id);
        Ok(())
    }

    fn prepare(&self, invoice: &mut Invoice) -> InvoiceResult<()> {
        invoice.recompute_totals();
        invoice.validate().map_err(InvoiceError::Validation)?;

        if self.db.get_animal(&invoice.animal_id)?.is_none() {
            return Err(InvoiceError::NotFound(format!("animal {}", invoice.animal_id)));
        }
        if let Some(vet_id) = invoice.veterinarian_id.as_deref() {
            match self.db.get_contact(vet_id)? {
                Some(contact) if contact.has_role(ContactRole::Veterinarian) => {}
                _ => return Err(InvoiceError::NotVeterinarian(vet_id.to_string())),
            }
        }
        Ok(())
    }

    /// Build the webhook payload for a stored invoice.
    pub fn submission(&self, id: &str) -> InvoiceResult<InvoiceSubmission> {
        let invoice = self
            .db
            .get_invoice(id)?
            .ok_or_else(|| InvoiceError::NotFound(format!("invoice {}", id)))?;
        let animal = self
            .db
            .get_animal(&invoice.animal_id)?
            .ok_or_else(|| InvoiceError::NotFound(format!("animal {}", invoice.animal_id)))?;
        let veterinarian_name = match invoice.veterinarian_id.as_deref() {
            Some(vet_id) => self.db.get_contact(vet_id)?.map(|c| c.full_name()),
            None => None,
        };

        Ok(InvoiceSubmission {
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            animal_id: animal.id,
            animal_name: animal.name,
            veterinarian_id: invoice.veterinarian_id,
            veterinarian_name,
            line_items: invoice.line_items,
            subtotal: invoice.subtotal,
            discount: invoice.discount,
            total: invoice.total,
            notes: invoice.notes,
            submitted_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Post the invoice to `webhook`. Any 2xx answer marks it sent.
    pub fn submit<W: InvoiceWebhook + ?Sized>(&self, id: &str, webhook: &W) -> InvoiceResult<Notice> {
        let submission = self.submission(id)?;
        if submission.line_items.is_empty() {
            return Err(InvoiceError::Validation("Invoice has no line items".into()));
        }

        let status = webhook.post(&submission)?;
        if !(200..300).contains(&status) {
            tracing::warn!(invoice_id = id, status, "webhook rejected invoice");
            return Err(InvoiceError::Rejected(status));
        }

        self.db.update_invoice_status(id, InvoiceStatus::Sent)?;
        tracing::info!(invoice_id = id, status, "invoice submitted");
        self.publish(id);
        Ok(Notice::success(format!("Invoice {} sent", submission.invoice_number)))
    }

    fn publish(&self, id: &str) {
        if let Some(bus) = self.bus {
            bus.publish(Topic::Invoices, vec![id.to_string()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Animal, Contact};
    use std::cell::RefCell;

    struct RecordingWebhook {
        status: u16,
        posted: RefCell<Vec<InvoiceSubmission>>,
    }

    impl InvoiceWebhook for RecordingWebhook {
        fn post(&self, submission: &InvoiceSubmission) -> Result<u16, WebhookError> {
            self.posted.borrow_mut().push(submission.clone());
            Ok(self.status)
        }
    }

    fn setup() -> (Database, Animal, Contact) {
        let db = Database::open_in_memory().unwrap();
        let animal = Animal::new("Otis".into(), "dog".into());
        db.insert_animal(&animal).unwrap();
        let vet = Contact::new("Lena".into(), "Cho".into(), vec![ContactRole::Veterinarian]);
        db.insert_contact(&vet).unwrap();
        (db, animal, vet)
    }

    fn draft(animal: &Animal, vet: &Contact) -> Invoice {
        let mut invoice = Invoice::new("INV-100".into(), animal.id.clone(), "2024-06-01".into());
        invoice.veterinarian_id = Some(vet.id.clone());
        invoice.discount = 5.0;
        invoice.line_items = vec![InvoiceLineItem {
            item_id: "exam".into(),
            description: "Wellness exam".into(),
            quantity: 2.0,
            unit_price: 30.0,
        }];
        invoice
    }

    #[test]
    fn test_create_recomputes_totals() {
        let (db, animal, vet) = setup();
        let created = InvoiceDesk::new(&db).create(draft(&animal, &vet)).unwrap();
        assert_eq!(created.subtotal, 60.0);
        assert_eq!(created.total, 55.0);
        assert_eq!(db.get_invoice(&created.id).unwrap().unwrap().total, 55.0);
    }

    #[test]
    fn test_create_rejects_non_vet() {
        let (db, animal, _) = setup();
        let owner = Contact::new("Al".into(), "Bo".into(), vec![ContactRole::Owner]);
        db.insert_contact(&owner).unwrap();
        assert!(matches!(
            InvoiceDesk::new(&db).create(draft(&animal, &owner)),
            Err(InvoiceError::NotVeterinarian(_))
        ));
    }

    #[test]
    fn test_submit_marks_sent_on_2xx() {
        let (db, animal, vet) = setup();
        let desk = InvoiceDesk::new(&db);
        let invoice = desk.create(draft(&animal, &vet)).unwrap();
        let webhook = RecordingWebhook {
            status: 202,
            posted: RefCell::new(Vec::new()),
        };

        let notice = desk.submit(&invoice.id, &webhook).unwrap();
        assert_eq!(notice.message, "Invoice INV-100 sent");
        let posted = webhook.posted.borrow();
        assert_eq!(posted[0].animal_name, "Otis");
        assert_eq!(posted[0].veterinarian_name.as_deref(), Some("Lena Cho"));
        assert_eq!(
            db.get_invoice(&invoice.id).unwrap().unwrap().status,
            InvoiceStatus::Sent
        );
    }

    #[test]
    fn test_submit_rejected_keeps_draft() {
        let (db, animal, vet) = setup();
        let desk = InvoiceDesk::new(&db);
        let invoice = desk.create(draft(&animal, &vet)).unwrap();
        let webhook = RecordingWebhook {
            status: 500,
            posted: RefCell::new(Vec::new()),
        };

        assert!(matches!(
            desk.submit(&invoice.id, &webhook),
            Err(InvoiceError::Rejected(500))
        ));
        assert!(db.get_invoice(&invoice.id).unwrap().unwrap().is_draft());
    }
}
