//! Invoice export for accounting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::{Animal, Contact, Invoice, InvoiceStatus};

/// Export of one invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceExport {
    pub invoice_id: String,
    pub invoice_number: String,
    pub status: InvoiceStatus,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub animal_name: Option<String>,
    pub veterinarian_name: Option<String>,
    pub line_items: Vec<InvoiceExportLine>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceExportLine {
    pub item_id: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
}

const CSV_HEADER: &str =
    "invoice_number,status,issue_date,animal,veterinarian,item_id,description,quantity,unit_price,amount,invoice_total\n";

impl InvoiceExport {
    pub fn from_invoice(
        invoice: &Invoice,
        animal: Option<&Animal>,
        veterinarian: Option<&Contact>,
    ) -> Self {
        Self {
            invoice_id: invoice.id.clone(),
            invoice_number: invoice.invoice_number.clone(),
            status: invoice.status,
            issue_date: invoice.issue_date.clone(),
            due_date: invoice.due_date.clone(),
            animal_name: animal.map(|a| a.name.clone()),
            veterinarian_name: veterinarian.map(Contact::full_name),
            line_items: invoice
                .line_items
                .iter()
                .map(|item| InvoiceExportLine {
                    item_id: item.item_id.clone(),
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    amount: item.amount(),
                })
                .collect(),
            subtotal: invoice.subtotal,
            discount: invoice.discount,
            total: invoice.total,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        self.write_csv_lines(&mut csv);
        csv
    }

    fn write_csv_lines(&self, csv: &mut String) {
        for item in &self.line_items {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{:.2},{:.2},{:.2}\n",
                escape_csv(&self.invoice_number),
                self.status,
                escape_csv(&self.issue_date),
                escape_csv(self.animal_name.as_deref().unwrap_or("")),
                escape_csv(self.veterinarian_name.as_deref().unwrap_or("")),
                escape_csv(&item.item_id),
                escape_csv(&item.description),
                item.quantity,
                item.unit_price,
                item.amount,
                self.total,
            ));
        }
    }
}

/// Export of several invoices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInvoiceExport {
    pub exported_at: String,
    pub invoices: Vec<InvoiceExport>,
    pub grand_total: f64,
}

impl BatchInvoiceExport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One line per line item across all invoices.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        for invoice in &self.invoices {
            invoice.write_csv_lines(&mut csv);
        }
        csv
    }
}

/// Invoice exporter.
pub struct InvoiceExporter<'a> {
    db: &'a Database,
}

impl<'a> InvoiceExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Export the given invoices; unknown ids are skipped.
    pub fn export(&self, ids: &[String]) -> DbResult<BatchInvoiceExport> {
        let mut invoices = Vec::new();
        for id in ids {
            if let Some(invoice) = self.db.get_invoice(id)? {
                invoices.push(invoice);
            }
        }
        self.build(invoices)
    }

    pub fn export_all(&self) -> DbResult<BatchInvoiceExport> {
        self.build(self.db.list_invoices()?)
    }

    fn build(&self, invoices: Vec<Invoice>) -> DbResult<BatchInvoiceExport> {
        let animals: HashMap<String, Animal> = self
            .db
            .list_animals()?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();
        let contacts: HashMap<String, Contact> = self
            .db
            .list_contacts()?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        let exports: Vec<InvoiceExport> = invoices
            .iter()
            .map(|invoice| {
                InvoiceExport::from_invoice(
                    invoice,
                    animals.get(&invoice.animal_id),
                    invoice
                        .veterinarian_id
                        .as_ref()
                        .and_then(|id| contacts.get(id)),
                )
            })
            .collect();
        let grand_total = crate::models::round_cents(exports.iter().map(|e| e.total).sum());

        Ok(BatchInvoiceExport {
            exported_at: chrono::Utc::now().to_rfc3339(),
            invoices: exports,
            grand_total,
        })
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceLineItem;

    fn make_invoice(animal: &Animal) -> Invoice {
        let mut invoice = Invoice::new("INV-7".into(), animal.id.clone(), "2024-02-10".into());
        invoice.push_line_item(InvoiceLineItem {
            item_id: "vacc-r".into(),
            description: "Rabies, 1 year".into(),
            quantity: 1.0,
            unit_price: 25.0,
        });
        invoice.push_line_item(InvoiceLineItem {
            item_id: "exam".into(),
            description: "Exam".into(),
            quantity: 1.0,
            unit_price: 40.5,
        });
        invoice
    }

    #[test]
    fn test_invoice_export_csv() {
        let animal = Animal::new("Juno".into(), "cat".into());
        let export = InvoiceExport::from_invoice(&make_invoice(&animal), Some(&animal), None);

        let csv = export.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3); // Header + 2 items
        assert!(lines[0].starts_with("invoice_number"));
        assert_eq!(
            lines[1],
            "INV-7,draft,2024-02-10,Juno,,vacc-r,\"Rabies, 1 year\",1,25.00,25.00,65.50"
        );
    }

    #[test]
    fn test_invoice_export_json() {
        let animal = Animal::new("Juno".into(), "cat".into());
        let export = InvoiceExport::from_invoice(&make_invoice(&animal), Some(&animal), None);
        let json = export.to_json().unwrap();
        assert!(json.contains("\"animal_name\": \"Juno\""));
        assert!(json.contains("\"total\": 65.5"));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_export_all_from_db() {
        let db = Database::open_in_memory().unwrap();
        let animal = Animal::new("Juno".into(), "cat".into());
        db.insert_animal(&animal).unwrap();
        db.insert_invoice(&make_invoice(&animal)).unwrap();

        let batch = InvoiceExporter::new(&db).export_all().unwrap();
        assert_eq!(batch.invoices.len(), 1);
        assert_eq!(batch.grand_total, 65.5);
        assert_eq!(batch.to_csv().lines().count(), 3);

        let none = InvoiceExporter::new(&db).export(&["missing".into()]).unwrap();
        assert!(none.invoices.is_empty());
    }
}
