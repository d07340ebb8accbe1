//! Clinic Core Library
//!
//! Records for an animal rescue clinic: animals, contacts, animal events and
//! invoices, with the workflows that keep them consistent.
//!
//! # Architecture
//!
//! ```text
//!   EventForm ──validate──▶ EventRecorder ──insert──▶ animal_events
//!                               │
//!                  status_change│ CascadePlan
//!                               ▼
//!                        animals.status / owner_id
//!
//!   TableLoader ──join──▶ DataTable (search, sort, page, select)
//!                               │ selected ids
//!                               ▼
//!                        DeletionGuard ──▶ block │ cascade │ batch + fallback
//! ```
//!
//! Every multi-step write is sequential and not transactional. Later steps
//! report failures as warning [`Notice`]s instead of undoing earlier ones.
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence and the [`ClinicStore`] boundary
//! - [`models`]: Domain types (Animal, Contact, AnimalEvent, Invoice)
//! - [`events`]: Event form controller, status cascade and recorder
//! - [`table`]: Joined display rows and client-side table state
//! - [`guard`]: Dependency-checked single and batch deletes
//! - [`invoicing`]: Invoice totals, validation and webhook submission
//! - [`cache`]: TTL cache over the accounting item catalog
//! - [`storage`]: Attachment object storage
//! - [`notify`]: Notices and the typed refresh bus
//! - [`export`]: Invoice and animal history export
//! - [`config`], [`logging`]: Host configuration and tracing setup

pub mod cache;
pub mod config;
pub mod db;
pub mod events;
pub mod export;
pub mod guard;
pub mod invoicing;
pub mod logging;
pub mod models;
pub mod notify;
pub mod storage;
pub mod table;

// Re-export commonly used types
pub use config::ClinicConfig;
pub use db::{ClinicStore, Database};
pub use events::{EventForm, EventRecorder, NewAttachment, SubmitOutcome};
pub use guard::{BatchDeleteReport, DeleteOutcome, DeletionGuard, EntityKind};
pub use models::{
    Animal, AnimalEvent, AnimalStatus, Contact, ContactRole, EventDetails, EventType, Invoice,
    InvoiceLineItem, InvoiceStatus,
};
pub use notify::{Notice, NoticeLevel, RefreshBus, Topic};
pub use storage::{FsObjectStore, MemoryObjectStore, ObjectStore};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};
use std::time::Duration;

use table::TableLoader;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for ClinicError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => ClinicError::NotFound(what),
            other => ClinicError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(e: serde_json::Error) -> Self {
        ClinicError::SerializationError(e.to_string())
    }
}

impl From<storage::StorageError> for ClinicError {
    fn from(e: storage::StorageError) -> Self {
        ClinicError::StorageError(e.to_string())
    }
}

impl From<events::ValidationErrors> for ClinicError {
    fn from(e: events::ValidationErrors) -> Self {
        ClinicError::InvalidInput(e.to_string())
    }
}

impl From<events::SubmitError> for ClinicError {
    fn from(e: events::SubmitError) -> Self {
        match e {
            events::SubmitError::Database(e) => e.into(),
            events::SubmitError::AnimalNotFound(id) => ClinicError::NotFound(format!("animal {}", id)),
            other => ClinicError::InvalidInput(other.to_string()),
        }
    }
}

impl From<guard::GuardError> for ClinicError {
    fn from(e: guard::GuardError) -> Self {
        match e {
            guard::GuardError::Database(e) => e.into(),
        }
    }
}

impl From<invoicing::InvoiceError> for ClinicError {
    fn from(e: invoicing::InvoiceError) -> Self {
        match e {
            invoicing::InvoiceError::Database(e) => e.into(),
            invoicing::InvoiceError::NotFound(what) => ClinicError::NotFound(what),
            other => ClinicError::InvalidInput(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ClinicError {
    fn from(e: anyhow::Error) -> Self {
        ClinicError::ConfigError(format!("{:#}", e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T, ClinicError> {
    value.parse().map_err(ClinicError::InvalidInput)
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database, storing attachments under `attachments_dir`.
#[uniffi::export]
pub fn open_database(path: String, attachments_dir: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open(&path)?;
    let objects = FsObjectStore::new(attachments_dir)?;
    Ok(Arc::new(ClinicCore::new(
        db,
        Arc::new(objects),
        TableLoader::default(),
        10,
    )))
}

/// Open the database named in a TOML config file and install logging from
/// its `log_filter`/`log_json` settings.
#[uniffi::export]
pub fn open_with_config(config_path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let config = ClinicConfig::load(&config_path)?;
    logging::init_from_config(&config);
    let db = Database::open(&config.database_path)?;
    let objects = FsObjectStore::new(&config.attachments_dir)?;
    Ok(Arc::new(ClinicCore::new(
        db,
        Arc::new(objects),
        TableLoader::new(config.min_loading_delay()),
        config.page_size,
    )))
}

/// Create an in-memory database with in-memory attachments (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(ClinicCore::new(
        db,
        Arc::new(MemoryObjectStore::new()),
        TableLoader::new(Duration::ZERO),
        10,
    )))
}

/// Install the tracing subscriber. Returns `false` if one was already set.
#[uniffi::export]
pub fn init_logging(filter: String, json: bool) -> bool {
    logging::init(&filter, json)
}

/// Fields the form shows for an event type, mandatory fields first.
#[uniffi::export]
pub fn event_form_fields(event_type: String) -> Result<Vec<FfiFieldSpec>, ClinicError> {
    let event_type: EventType = parse(&event_type)?;
    Ok(events::fields_for(event_type)
        .iter()
        .map(FfiFieldSpec::from)
        .collect())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe clinic handle for FFI.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    db: Arc<Mutex<Database>>,
    objects: Arc<dyn ObjectStore>,
    loader: TableLoader,
    page_size: usize,
}

impl ClinicCore {
    /// Run `fetch` under the lock; the guard is released on return.
    fn with_db<T>(&self, fetch: impl FnOnce(&Database) -> db::DbResult<T>) -> Result<T, ClinicError> {
        let db = self.db.lock()?;
        Ok(fetch(&db)?)
    }

    fn new(db: Database, objects: Arc<dyn ObjectStore>, loader: TableLoader, page_size: usize) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            objects,
            loader,
            page_size,
        }
    }
}

#[uniffi::export]
impl ClinicCore {
    /// Page size hosts should use for tables.
    pub fn page_size(&self) -> u32 {
        self.page_size as u32
    }

    // =========================================================================
    // Animal Operations
    // =========================================================================

    /// Create an animal with status `active` and no owner.
    pub fn create_animal(&self, input: FfiNewAnimal) -> Result<FfiAnimal, ClinicError> {
        if input.name.trim().is_empty() {
            return Err(ClinicError::InvalidInput("Name is required".into()));
        }
        let mut animal = Animal::new(input.name, input.animal_type);
        animal.breed = input.breed;
        animal.gender = parse(input.gender.as_deref().unwrap_or(""))?;
        animal.date_of_birth = input.date_of_birth;
        animal.microchip = input.microchip;
        animal.notes = input.notes;

        let db = self.db.lock()?;
        db.insert_animal(&animal)?;
        Ok(animal.into())
    }

    /// Update descriptive fields. Status and owner change only through
    /// status-change events.
    pub fn update_animal(&self, input: FfiAnimal) -> Result<FfiAnimal, ClinicError> {
        let db = self.db.lock()?;
        let mut animal = db
            .get_animal(&input.id)?
            .ok_or_else(|| ClinicError::NotFound(format!("animal {}", input.id)))?;
        animal.name = input.name;
        animal.animal_type = input.animal_type;
        animal.breed = input.breed;
        animal.gender = parse(&input.gender)?;
        animal.date_of_birth = input.date_of_birth;
        animal.microchip = input.microchip;
        animal.notes = input.notes;
        animal.touch();
        db.update_animal(&animal)?;
        Ok(animal.into())
    }

    pub fn get_animal(&self, id: String) -> Result<Option<FfiAnimal>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_animal(&id)?.map(|a| a.into()))
    }

    /// Search animals by name.
    pub fn search_animals(&self, query: String, limit: u32) -> Result<Vec<FfiAnimal>, ClinicError> {
        let db = self.db.lock()?;
        let animals = db.search_animals(&query, limit as usize)?;
        Ok(animals.into_iter().map(|a| a.into()).collect())
    }

    // =========================================================================
    // Contact Operations
    // =========================================================================

    pub fn create_contact(&self, input: FfiNewContact) -> Result<FfiContact, ClinicError> {
        let roles = input
            .roles
            .iter()
            .map(|r| parse::<ContactRole>(r))
            .collect::<Result<Vec<_>, _>>()?;
        let mut contact = Contact::new(input.first_name, input.last_name, roles);
        contact.email = input.email;
        contact.phone = input.phone;
        contact.address = input.address;
        contact.notes = input.notes;

        let db = self.db.lock()?;
        db.insert_contact(&contact)?;
        Ok(contact.into())
    }

    pub fn update_contact(&self, input: FfiContact) -> Result<FfiContact, ClinicError> {
        let db = self.db.lock()?;
        let mut contact = db
            .get_contact(&input.id)?
            .ok_or_else(|| ClinicError::NotFound(format!("contact {}", input.id)))?;
        let mut roles = input
            .roles
            .iter()
            .map(|r| parse::<ContactRole>(r))
            .collect::<Result<Vec<_>, _>>()?;
        roles.sort();
        roles.dedup();
        contact.first_name = input.first_name;
        contact.last_name = input.last_name;
        contact.email = input.email;
        contact.phone = input.phone;
        contact.address = input.address;
        contact.roles = roles;
        contact.notes = input.notes;
        db.update_contact(&contact)?;
        Ok(contact.into())
    }

    pub fn get_contact(&self, id: String) -> Result<Option<FfiContact>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_contact(&id)?.map(|c| c.into()))
    }

    /// Contacts eligible for a picker (owner, foster or veterinarian).
    pub fn list_contacts_with_role(&self, role: String) -> Result<Vec<FfiContact>, ClinicError> {
        let role: ContactRole = parse(&role)?;
        let db = self.db.lock()?;
        let contacts = db.list_contacts_with_role(role)?;
        Ok(contacts.into_iter().map(|c| c.into()).collect())
    }

    // =========================================================================
    // Event Operations
    // =========================================================================

    /// Validate and record an event, then upload its attachments.
    ///
    /// Validation failures are errors and nothing is stored. Failures after
    /// the event insert come back as warning notices.
    pub fn record_event(
        &self,
        animal_id: String,
        event_type: String,
        event_date: Option<String>,
        fields: Vec<FfiField>,
        attachments: Vec<FfiAttachmentUpload>,
    ) -> Result<FfiEventOutcome, ClinicError> {
        let mut form = EventForm::new(animal_id, parse(&event_type)?);
        if let Some(date) = event_date {
            form.event_date = date;
        }
        for field in fields {
            form.set(&field.name, field.value)?;
        }
        let uploads = attachments
            .into_iter()
            .map(|a| NewAttachment {
                file_name: a.file_name,
                content_type: a.content_type,
                bytes: a.bytes,
            })
            .collect();

        let db = self.db.lock()?;
        let recorder = EventRecorder::new(&*db, self.objects.as_ref());
        let outcome = recorder.submit(&form, uploads)?;
        Ok(outcome.into())
    }

    // =========================================================================
    // Invoice Operations
    // =========================================================================

    pub fn create_invoice(&self, input: FfiNewInvoice) -> Result<FfiInvoice, ClinicError> {
        let mut invoice = Invoice::new(input.invoice_number, input.animal_id, input.issue_date);
        invoice.veterinarian_id = input.veterinarian_id;
        invoice.due_date = input.due_date;
        invoice.line_items = input.line_items.into_iter().map(|i| i.into()).collect();
        invoice.discount = input.discount;
        invoice.notes = input.notes;

        let db = self.db.lock()?;
        let created = invoicing::InvoiceDesk::new(&db).create(invoice)?;
        Ok(created.into())
    }

    pub fn update_invoice(&self, input: FfiInvoice) -> Result<FfiInvoice, ClinicError> {
        let db = self.db.lock()?;
        let mut invoice = db
            .get_invoice(&input.id)?
            .ok_or_else(|| ClinicError::NotFound(format!("invoice {}", input.id)))?;
        invoice.invoice_number = input.invoice_number;
        invoice.animal_id = input.animal_id;
        invoice.veterinarian_id = input.veterinarian_id;
        invoice.status = parse(&input.status)?;
        invoice.issue_date = input.issue_date;
        invoice.due_date = input.due_date;
        invoice.line_items = input.line_items.into_iter().map(|i| i.into()).collect();
        invoice.discount = input.discount;
        invoice.notes = input.notes;

        let updated = invoicing::InvoiceDesk::new(&db).update(invoice)?;
        Ok(updated.into())
    }

    pub fn get_invoice(&self, id: String) -> Result<Option<FfiInvoice>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_invoice(&id)?.map(|i| i.into()))
    }

    pub fn set_invoice_status(&self, id: String, status: String) -> Result<(), ClinicError> {
        let status: InvoiceStatus = parse(&status)?;
        let db = self.db.lock()?;
        invoicing::InvoiceDesk::new(&db).set_status(&id, status)?;
        Ok(())
    }

    // =========================================================================
    // Table Operations
    // =========================================================================

    pub fn list_animal_rows(&self) -> Result<Vec<FfiAnimalRow>, ClinicError> {
        let rows = self.loader.timed("animals", || self.with_db(|db| table::load_animals(db)))?;
        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub fn list_contact_rows(&self) -> Result<Vec<FfiContactRow>, ClinicError> {
        let rows = self.loader.timed("contacts", || self.with_db(|db| table::load_contacts(db)))?;
        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub fn list_event_rows(&self) -> Result<Vec<FfiEventRow>, ClinicError> {
        let rows = self.loader.timed("events", || self.with_db(|db| table::load_events(db)))?;
        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub fn list_invoice_rows(&self) -> Result<Vec<FfiInvoiceRow>, ClinicError> {
        let rows = self.loader.timed("invoices", || self.with_db(|db| table::load_invoices(db)))?;
        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    // =========================================================================
    // Delete Operations
    // =========================================================================

    /// Delete one record (`animal`, `contact`, `event` or `invoice`).
    pub fn delete_record(&self, kind: String, id: String) -> Result<FfiNotice, ClinicError> {
        let kind: EntityKind = parse(&kind)?;
        let db = self.db.lock()?;
        let guard = DeletionGuard::new(&*db).with_objects(self.objects.as_ref());
        let outcome = guard.delete(kind, &id)?;
        Ok(outcome.notice(kind).into())
    }

    /// Delete every id without blocking dependents.
    pub fn delete_records(&self, kind: String, ids: Vec<String>) -> Result<FfiDeleteReport, ClinicError> {
        let kind: EntityKind = parse(&kind)?;
        let db = self.db.lock()?;
        let guard = DeletionGuard::new(&*db).with_objects(self.objects.as_ref());
        let report = guard.delete_batch(kind, &ids)?;
        Ok(report.into())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export invoices as JSON; all invoices when `ids` is empty.
    pub fn export_invoices_json(&self, ids: Vec<String>) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let exporter = export::InvoiceExporter::new(&db);
        let batch = if ids.is_empty() {
            exporter.export_all()?
        } else {
            exporter.export(&ids)?
        };
        Ok(batch.to_json()?)
    }

    /// Export invoices as CSV; all invoices when `ids` is empty.
    pub fn export_invoices_csv(&self, ids: Vec<String>) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let exporter = export::InvoiceExporter::new(&db);
        let batch = if ids.is_empty() {
            exporter.export_all()?
        } else {
            exporter.export(&ids)?
        };
        Ok(batch.to_csv())
    }

    /// Export an animal with its full event history as JSON.
    pub fn export_animal_history_json(&self, animal_id: String) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let exporter = export::HistoryExporter::new(&db);
        Ok(exporter.export(&animal_id)?.to_json()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe animal.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAnimal {
    pub id: String,
    pub name: String,
    pub animal_type: String,
    pub breed: Option<String>,
    pub gender: String,
    pub date_of_birth: Option<String>,
    pub microchip: Option<String>,
    pub status: String,
    pub owner_id: Option<String>,
    pub notes: Option<String>,
}

impl From<Animal> for FfiAnimal {
    fn from(animal: Animal) -> Self {
        Self {
            id: animal.id,
            name: animal.name,
            animal_type: animal.animal_type,
            breed: animal.breed,
            gender: animal.gender.as_str().to_string(),
            date_of_birth: animal.date_of_birth,
            microchip: animal.microchip,
            status: animal.status.as_str().to_string(),
            owner_id: animal.owner_id,
            notes: animal.notes,
        }
    }
}

/// Input for a new animal.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewAnimal {
    pub name: String,
    pub animal_type: String,
    pub breed: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub microchip: Option<String>,
    pub notes: Option<String>,
}

/// FFI-safe contact.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiContact {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub roles: Vec<String>,
    pub notes: Option<String>,
}

impl From<Contact> for FfiContact {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.id,
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            phone: contact.phone,
            address: contact.address,
            roles: contact.roles.iter().map(|r| r.as_str().to_string()).collect(),
            notes: contact.notes,
        }
    }
}

/// Input for a new contact.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub roles: Vec<String>,
    pub notes: Option<String>,
}

/// One raw form value.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiField {
    pub name: String,
    pub value: String,
}

/// A form field for an event type.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFieldSpec {
    pub name: String,
    pub label: String,
    pub kind: String,
    pub required: bool,
    /// Set when one field of a group must be filled in
    pub any_of_group: Option<String>,
}

impl From<&events::FieldSpec> for FfiFieldSpec {
    fn from(spec: &events::FieldSpec) -> Self {
        let kind = match spec.kind {
            events::FieldKind::Text => "text",
            events::FieldKind::Number => "number",
            events::FieldKind::Date => "date",
            events::FieldKind::Status => "status",
            events::FieldKind::WeightUnit => "weight_unit",
            events::FieldKind::Contact => "contact",
        };
        let (required, any_of_group) = match spec.requirement {
            events::Requirement::Required => (true, None),
            events::Requirement::Optional => (false, None),
            events::Requirement::AnyOf(group) => (false, Some(group.to_string())),
        };
        Self {
            name: spec.name.to_string(),
            label: spec.label.to_string(),
            kind: kind.to_string(),
            required,
            any_of_group,
        }
    }
}

/// File to attach to a new event.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAttachmentUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// FFI-safe notice.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotice {
    pub level: String,
    pub message: String,
}

impl From<Notice> for FfiNotice {
    fn from(notice: Notice) -> Self {
        let level = match notice.level {
            NoticeLevel::Success => "success",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        Self {
            level: level.to_string(),
            message: notice.message,
        }
    }
}

/// Result of recording an event.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEventOutcome {
    pub event_id: String,
    /// Unset for events that are not status changes
    pub status_updated: Option<bool>,
    pub attachment_count: u32,
    pub notices: Vec<FfiNotice>,
}

impl From<SubmitOutcome> for FfiEventOutcome {
    fn from(outcome: SubmitOutcome) -> Self {
        Self {
            event_id: outcome.event.id,
            status_updated: outcome.status_updated,
            attachment_count: outcome.attachments.len() as u32,
            notices: outcome.notices.into_iter().map(|n| n.into()).collect(),
        }
    }
}

/// FFI-safe invoice line item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLineItem {
    pub item_id: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl From<FfiLineItem> for InvoiceLineItem {
    fn from(item: FfiLineItem) -> Self {
        InvoiceLineItem {
            item_id: item.item_id,
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

impl From<InvoiceLineItem> for FfiLineItem {
    fn from(item: InvoiceLineItem) -> Self {
        Self {
            item_id: item.item_id,
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

/// Input for a new invoice.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewInvoice {
    pub invoice_number: String,
    pub animal_id: String,
    pub veterinarian_id: Option<String>,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub line_items: Vec<FfiLineItem>,
    pub discount: f64,
    pub notes: Option<String>,
}

/// FFI-safe invoice.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInvoice {
    pub id: String,
    pub invoice_number: String,
    pub animal_id: String,
    pub veterinarian_id: Option<String>,
    pub status: String,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub line_items: Vec<FfiLineItem>,
    pub discount: f64,
    pub subtotal: f64,
    pub total: f64,
    pub notes: Option<String>,
}

impl From<Invoice> for FfiInvoice {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            animal_id: invoice.animal_id,
            veterinarian_id: invoice.veterinarian_id,
            status: invoice.status.as_str().to_string(),
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            line_items: invoice.line_items.into_iter().map(|i| i.into()).collect(),
            discount: invoice.discount,
            subtotal: invoice.subtotal,
            total: invoice.total,
            notes: invoice.notes,
        }
    }
}

/// Animal table row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAnimalRow {
    pub id: String,
    pub name: String,
    pub animal_type: String,
    pub breed: Option<String>,
    pub gender: String,
    pub status: String,
    pub owner_name: Option<String>,
}

impl From<table::AnimalRow> for FfiAnimalRow {
    fn from(row: table::AnimalRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            animal_type: row.animal_type,
            breed: row.breed,
            gender: row.gender,
            status: row.status,
            owner_name: row.owner_name,
        }
    }
}

/// Contact table row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiContactRow {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub roles: String,
}

impl From<table::ContactRow> for FfiContactRow {
    fn from(row: table::ContactRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            roles: row.roles,
        }
    }
}

/// Event table row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEventRow {
    pub id: String,
    pub animal_id: String,
    pub animal_name: Option<String>,
    pub event_date: String,
    pub event_type: String,
    pub summary: String,
}

impl From<table::EventRow> for FfiEventRow {
    fn from(row: table::EventRow) -> Self {
        Self {
            id: row.id,
            animal_id: row.animal_id,
            animal_name: row.animal_name,
            event_date: row.event_date,
            event_type: row.event_type,
            summary: row.summary,
        }
    }
}

/// Invoice table row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInvoiceRow {
    pub id: String,
    pub invoice_number: String,
    pub animal_id: String,
    pub animal_name: Option<String>,
    pub veterinarian_name: Option<String>,
    pub status: String,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub line_item_count: u32,
    pub total: f64,
}

impl From<table::InvoiceRow> for FfiInvoiceRow {
    fn from(row: table::InvoiceRow) -> Self {
        Self {
            id: row.id,
            invoice_number: row.invoice_number,
            animal_id: row.animal_id,
            animal_name: row.animal_name,
            veterinarian_name: row.veterinarian_name,
            status: row.status,
            issue_date: row.issue_date,
            due_date: row.due_date,
            line_item_count: row.line_item_count as u32,
            total: row.total,
        }
    }
}

/// Batch delete tally.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDeleteReport {
    pub requested: u32,
    pub deleted: u32,
    pub blocked_ids: Vec<String>,
    pub failed_ids: Vec<String>,
    pub used_fallback: bool,
    pub notice: FfiNotice,
}

impl From<BatchDeleteReport> for FfiDeleteReport {
    fn from(report: BatchDeleteReport) -> Self {
        let notice = report.notice().into();
        Self {
            requested: report.requested as u32,
            deleted: report.deleted as u32,
            blocked_ids: report.blocked.into_iter().map(|b| b.id).collect(),
            failed_ids: report.failed.into_iter().map(|f| f.id).collect(),
            used_fallback: report.used_fallback,
            notice,
        }
    }
}
