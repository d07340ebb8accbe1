//! Invoice database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Invoice, InvoiceLineItem, InvoiceStatus};

const INVOICE_COLUMNS: &str = "id, invoice_number, animal_id, veterinarian_id, status, issue_date, \
                               due_date, line_items, discount, subtotal, total, notes, \
                               created_at, updated_at";

impl Database {
    /// Insert a new invoice. Totals are stored as given.
    pub fn insert_invoice(&self, invoice: &Invoice) -> DbResult<()> {
        let line_items_json = serde_json::to_string(&invoice.line_items)?;
        self.conn.execute(
            r#"
            INSERT INTO invoices (
                id, invoice_number, animal_id, veterinarian_id, status, issue_date,
                due_date, line_items, discount, subtotal, total, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                invoice.id,
                invoice.invoice_number,
                invoice.animal_id,
                invoice.veterinarian_id,
                invoice.status.as_str(),
                invoice.issue_date,
                invoice.due_date,
                line_items_json,
                invoice.discount,
                invoice.subtotal,
                invoice.total,
                invoice.notes,
                invoice.created_at,
                invoice.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing invoice.
    pub fn update_invoice(&self, invoice: &Invoice) -> DbResult<bool> {
        let line_items_json = serde_json::to_string(&invoice.line_items)?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE invoices SET
                invoice_number = ?2,
                animal_id = ?3,
                veterinarian_id = ?4,
                status = ?5,
                issue_date = ?6,
                due_date = ?7,
                line_items = ?8,
                discount = ?9,
                subtotal = ?10,
                total = ?11,
                notes = ?12,
                updated_at = ?13
            WHERE id = ?1
            "#,
            params![
                invoice.id,
                invoice.invoice_number,
                invoice.animal_id,
                invoice.veterinarian_id,
                invoice.status.as_str(),
                invoice.issue_date,
                invoice.due_date,
                line_items_json,
                invoice.discount,
                invoice.subtotal,
                invoice.total,
                invoice.notes,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Change only the status of an invoice.
    pub fn update_invoice_status(&self, id: &str, status: InvoiceStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE invoices SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an invoice by ID.
    pub fn get_invoice(&self, id: &str) -> DbResult<Option<Invoice>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM invoices WHERE id = ?", INVOICE_COLUMNS),
                [id],
                read_invoice_row,
            )
            .optional()?
            .map(Invoice::try_from)
            .transpose()
    }

    /// List all invoices, newest issue date first.
    pub fn list_invoices(&self) -> DbResult<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM invoices ORDER BY issue_date DESC, invoice_number DESC",
            INVOICE_COLUMNS
        ))?;
        let rows = stmt.query_map([], read_invoice_row)?;

        let mut invoices = Vec::new();
        for row in rows {
            invoices.push(row?.try_into()?);
        }
        Ok(invoices)
    }

    /// List invoices billed for an animal.
    pub fn list_invoices_for_animal(&self, animal_id: &str) -> DbResult<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM invoices WHERE animal_id = ? ORDER BY issue_date DESC",
            INVOICE_COLUMNS
        ))?;
        let rows = stmt.query_map([animal_id], read_invoice_row)?;

        let mut invoices = Vec::new();
        for row in rows {
            invoices.push(row?.try_into()?);
        }
        Ok(invoices)
    }
}

struct InvoiceRow {
    id: String,
    invoice_number: String,
    animal_id: String,
    veterinarian_id: Option<String>,
    status: String,
    issue_date: String,
    due_date: Option<String>,
    line_items: String,
    discount: f64,
    subtotal: f64,
    total: f64,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_invoice_row(row: &Row<'_>) -> rusqlite::Result<InvoiceRow> {
    Ok(InvoiceRow {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        animal_id: row.get(2)?,
        veterinarian_id: row.get(3)?,
        status: row.get(4)?,
        issue_date: row.get(5)?,
        due_date: row.get(6)?,
        line_items: row.get(7)?,
        discount: row.get(8)?,
        subtotal: row.get(9)?,
        total: row.get(10)?,
        notes: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DbError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let line_items: Vec<InvoiceLineItem> = serde_json::from_str(&row.line_items)?;
        Ok(Invoice {
            id: row.id,
            invoice_number: row.invoice_number,
            animal_id: row.animal_id,
            veterinarian_id: row.veterinarian_id,
            status: row.status.parse().map_err(DbError::Constraint)?,
            issue_date: row.issue_date,
            due_date: row.due_date,
            line_items,
            discount: row.discount,
            subtotal: row.subtotal,
            total: row.total,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
