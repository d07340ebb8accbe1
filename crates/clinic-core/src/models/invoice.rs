//! Invoice models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(format!("Unknown invoice status: {}", other)),
        }
    }
}

/// One billable entry on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLineItem {
    /// Item id from the accounting catalog
    pub item_id: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl InvoiceLineItem {
    pub fn amount(&self) -> f64 {
        round_cents(self.quantity * self.unit_price)
    }
}

/// A billing document for an animal's care.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub animal_id: String,
    /// Veterinarian contact
    pub veterinarian_id: Option<String>,
    pub status: InvoiceStatus,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub line_items: Vec<InvoiceLineItem>,
    pub discount: f64,
    pub subtotal: f64,
    pub total: f64,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Invoice {
    /// Create an empty draft invoice.
    pub fn new(invoice_number: String, animal_id: String, issue_date: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_number,
            animal_id,
            veterinarian_id: None,
            status: InvoiceStatus::Draft,
            issue_date,
            due_date: None,
            line_items: Vec::new(),
            discount: 0.0,
            subtotal: 0.0,
            total: 0.0,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Recompute subtotal and total from the line items and discount.
    pub fn recompute_totals(&mut self) {
        self.subtotal = round_cents(self.line_items.iter().map(|i| i.quantity * i.unit_price).sum());
        self.total = round_cents((self.subtotal - self.discount).max(0.0));
    }

    pub fn push_line_item(&mut self, item: InvoiceLineItem) {
        self.line_items.push(item);
        self.recompute_totals();
    }

    /// Check line items and discount for values a bill cannot carry.
    pub fn validate(&self) -> Result<(), String> {
        if self.invoice_number.trim().is_empty() {
            return Err("Invoice number is required".into());
        }
        if self.discount < 0.0 {
            return Err("Discount cannot be negative".into());
        }
        for (index, item) in self.line_items.iter().enumerate() {
            if item.item_id.trim().is_empty() {
                return Err(format!("Line {}: item is required", index + 1));
            }
            if item.quantity <= 0.0 {
                return Err(format!("Line {}: quantity must be positive", index + 1));
            }
            if item.unit_price < 0.0 {
                return Err(format!("Line {}: price cannot be negative", index + 1));
            }
        }
        Ok(())
    }

    pub fn is_draft(&self) -> bool {
        self.status == InvoiceStatus::Draft
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
