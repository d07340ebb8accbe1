//! Flat display rows built by joining collections client-side.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Animal, AnimalEvent, Contact, Invoice};

/// A column of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    /// Included in global search.
    pub searchable: bool,
}

const fn column(key: &'static str, label: &'static str, searchable: bool) -> Column {
    Column {
        key,
        label,
        searchable,
    }
}

/// A single cell value, typed for sorting.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    fn text(value: &str) -> Self {
        Cell::Text(value.to_string())
    }

    fn opt(value: Option<&str>) -> Self {
        value.map(Cell::text).unwrap_or(Cell::Empty)
    }

    /// Text shown to the user.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format!("{:.2}", n),
        }
    }

    /// Ascending order; empty cells first, text compared case-insensitively.
    pub fn compare(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Empty, Cell::Empty) => Ordering::Equal,
            (Cell::Empty, _) => Ordering::Less,
            (_, Cell::Empty) => Ordering::Greater,
            (Cell::Number(a), Cell::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (a, b) => a.display().to_lowercase().cmp(&b.display().to_lowercase()),
        }
    }
}

/// A row a [`DataTable`](super::DataTable) can hold.
pub trait TableRow {
    fn columns() -> &'static [Column];
    fn row_id(&self) -> &str;
    fn cell(&self, key: &str) -> Cell;
}

fn names(contacts: &[Contact]) -> HashMap<&str, String> {
    contacts
        .iter()
        .map(|c| (c.id.as_str(), c.full_name()))
        .collect()
}

fn animal_names(animals: &[Animal]) -> HashMap<&str, &str> {
    animals
        .iter()
        .map(|a| (a.id.as_str(), a.name.as_str()))
        .collect()
}

/// Invoice joined with its animal and veterinarian.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub id: String,
    pub invoice_number: String,
    pub animal_id: String,
    pub animal_name: Option<String>,
    pub veterinarian_name: Option<String>,
    pub status: String,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub line_item_count: usize,
    pub total: f64,
}

const INVOICE_COLUMNS: &[Column] = &[
    column("invoice_number", "Invoice #", true),
    column("animal_name", "Animal", true),
    column("veterinarian_name", "Veterinarian", true),
    column("status", "Status", true),
    column("issue_date", "Issued", false),
    column("due_date", "Due", false),
    column("total", "Total", false),
];

impl TableRow for InvoiceRow {
    fn columns() -> &'static [Column] {
        INVOICE_COLUMNS
    }

    fn row_id(&self) -> &str {
        &self.id
    }

    fn cell(&self, key: &str) -> Cell {
        match key {
            "invoice_number" => Cell::text(&self.invoice_number),
            "animal_name" => Cell::opt(self.animal_name.as_deref()),
            "veterinarian_name" => Cell::opt(self.veterinarian_name.as_deref()),
            "status" => Cell::text(&self.status),
            "issue_date" => Cell::text(&self.issue_date),
            "due_date" => Cell::opt(self.due_date.as_deref()),
            "total" => Cell::Number(self.total),
            _ => Cell::Empty,
        }
    }
}

/// Join invoices with animals and veterinarians. Missing references show
/// as empty cells.
pub fn invoice_rows(invoices: &[Invoice], animals: &[Animal], contacts: &[Contact]) -> Vec<InvoiceRow> {
    let animals = animal_names(animals);
    let contacts = names(contacts);

    invoices
        .iter()
        .map(|invoice| InvoiceRow {
            id: invoice.id.clone(),
            invoice_number: invoice.invoice_number.clone(),
            animal_id: invoice.animal_id.clone(),
            animal_name: animals.get(invoice.animal_id.as_str()).map(|n| n.to_string()),
            veterinarian_name: invoice
                .veterinarian_id
                .as_deref()
                .and_then(|id| contacts.get(id).cloned()),
            status: invoice.status.to_string(),
            issue_date: invoice.issue_date.clone(),
            due_date: invoice.due_date.clone(),
            line_item_count: invoice.line_items.len(),
            total: invoice.total,
        })
        .collect()
}

/// Animal joined with its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalRow {
    pub id: String,
    pub name: String,
    pub animal_type: String,
    pub breed: Option<String>,
    pub gender: String,
    pub status: String,
    pub owner_name: Option<String>,
}

const ANIMAL_COLUMNS: &[Column] = &[
    column("name", "Name", true),
    column("animal_type", "Type", true),
    column("breed", "Breed", true),
    column("gender", "Gender", false),
    column("status", "Status", true),
    column("owner_name", "Owner", true),
];

impl TableRow for AnimalRow {
    fn columns() -> &'static [Column] {
        ANIMAL_COLUMNS
    }

    fn row_id(&self) -> &str {
        &self.id
    }

    fn cell(&self, key: &str) -> Cell {
        match key {
            "name" => Cell::text(&self.name),
            "animal_type" => Cell::text(&self.animal_type),
            "breed" => Cell::opt(self.breed.as_deref()),
            "gender" => Cell::text(&self.gender),
            "status" => Cell::text(&self.status),
            "owner_name" => Cell::opt(self.owner_name.as_deref()),
            _ => Cell::Empty,
        }
    }
}

pub fn animal_rows(animals: &[Animal], contacts: &[Contact]) -> Vec<AnimalRow> {
    let contacts = names(contacts);

    animals
        .iter()
        .map(|animal| AnimalRow {
            id: animal.id.clone(),
            name: animal.name.clone(),
            animal_type: animal.animal_type.clone(),
            breed: animal.breed.clone(),
            gender: animal.gender.as_str().to_string(),
            status: animal.status.to_string(),
            owner_name: animal
                .owner_id
                .as_deref()
                .and_then(|id| contacts.get(id).cloned()),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRow {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Comma separated role names
    pub roles: String,
}

const CONTACT_COLUMNS: &[Column] = &[
    column("name", "Name", true),
    column("email", "Email", true),
    column("phone", "Phone", true),
    column("roles", "Roles", true),
];

impl TableRow for ContactRow {
    fn columns() -> &'static [Column] {
        CONTACT_COLUMNS
    }

    fn row_id(&self) -> &str {
        &self.id
    }

    fn cell(&self, key: &str) -> Cell {
        match key {
            "name" => Cell::text(&self.name),
            "email" => Cell::opt(self.email.as_deref()),
            "phone" => Cell::opt(self.phone.as_deref()),
            "roles" => Cell::text(&self.roles),
            _ => Cell::Empty,
        }
    }
}

pub fn contact_rows(contacts: &[Contact]) -> Vec<ContactRow> {
    contacts
        .iter()
        .map(|contact| ContactRow {
            id: contact.id.clone(),
            name: contact.full_name(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            roles: contact
                .roles
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

/// Event joined with its animal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub id: String,
    pub animal_id: String,
    pub animal_name: Option<String>,
    pub event_date: String,
    pub event_type: String,
    pub summary: String,
}

const EVENT_COLUMNS: &[Column] = &[
    column("event_date", "Date", false),
    column("animal_name", "Animal", true),
    column("event_type", "Type", true),
    column("summary", "Details", true),
];

impl TableRow for EventRow {
    fn columns() -> &'static [Column] {
        EVENT_COLUMNS
    }

    fn row_id(&self) -> &str {
        &self.id
    }

    fn cell(&self, key: &str) -> Cell {
        match key {
            "event_date" => Cell::text(&self.event_date),
            "animal_name" => Cell::opt(self.animal_name.as_deref()),
            "event_type" => Cell::text(&self.event_type),
            "summary" => Cell::text(&self.summary),
            _ => Cell::Empty,
        }
    }
}

pub fn event_rows(events: &[AnimalEvent], animals: &[Animal]) -> Vec<EventRow> {
    let animals = animal_names(animals);

    events
        .iter()
        .map(|event| EventRow {
            id: event.id.clone(),
            animal_id: event.animal_id.clone(),
            animal_name: animals.get(event.animal_id.as_str()).map(|n| n.to_string()),
            event_date: event.event_date.clone(),
            event_type: event.event_type().label().to_string(),
            summary: event.details.summary(),
        })
        .collect()
}
