//! SQLite schema definition.

/// Complete database schema for the clinic.
///
/// Child tables reference their parents without `ON DELETE CASCADE`:
/// dependents are removed explicitly by the deletion guard.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Contacts
-- ============================================================================

CREATE TABLE IF NOT EXISTS contacts (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL DEFAULT '',
    email TEXT,
    phone TEXT,
    address TEXT,
    roles TEXT NOT NULL DEFAULT '[]',             -- JSON array of role tags
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts(last_name, first_name);

-- ============================================================================
-- Animals
-- ============================================================================

CREATE TABLE IF NOT EXISTS animals (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    animal_type TEXT NOT NULL,
    breed TEXT,
    gender TEXT NOT NULL DEFAULT 'unknown',
    date_of_birth TEXT,
    microchip TEXT,
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'adopted', 'foster', 'treatment', 'quarantine', 'deceased')),
    owner_id TEXT REFERENCES contacts(id),
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_animals_status ON animals(status);
CREATE INDEX IF NOT EXISTS idx_animals_owner ON animals(owner_id);

-- ============================================================================
-- Animal Events (append-only history)
-- ============================================================================

CREATE TABLE IF NOT EXISTS animal_events (
    id TEXT PRIMARY KEY,
    animal_id TEXT NOT NULL REFERENCES animals(id),
    event_type TEXT NOT NULL
        CHECK (event_type IN ('weight', 'vaccination', 'medication', 'status_change', 'note', 'visit')),
    event_date TEXT NOT NULL,
    details TEXT NOT NULL,                        -- JSON EventDetails
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_events_animal ON animal_events(animal_id, event_date);

CREATE TABLE IF NOT EXISTS animal_event_attachments (
    id TEXT PRIMARY KEY,
    event_id TEXT NOT NULL REFERENCES animal_events(id),
    storage_key TEXT NOT NULL,
    file_name TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    content_type TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_event_attachments_event ON animal_event_attachments(event_id);

-- ============================================================================
-- Invoices
-- ============================================================================

CREATE TABLE IF NOT EXISTS invoices (
    id TEXT PRIMARY KEY,
    invoice_number TEXT NOT NULL UNIQUE,
    animal_id TEXT NOT NULL REFERENCES animals(id),
    veterinarian_id TEXT REFERENCES contacts(id),
    status TEXT NOT NULL DEFAULT 'draft'
        CHECK (status IN ('draft', 'sent', 'paid', 'cancelled')),
    issue_date TEXT NOT NULL,
    due_date TEXT,
    line_items TEXT NOT NULL DEFAULT '[]',        -- JSON array of InvoiceLineItem
    discount REAL NOT NULL DEFAULT 0,
    subtotal REAL NOT NULL DEFAULT 0,
    total REAL NOT NULL DEFAULT 0,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_invoices_animal ON invoices(animal_id);
CREATE INDEX IF NOT EXISTS idx_invoices_vet ON invoices(veterinarian_id);

CREATE TABLE IF NOT EXISTS invoice_attachments (
    id TEXT PRIMARY KEY,
    invoice_id TEXT NOT NULL REFERENCES invoices(id),
    storage_key TEXT NOT NULL,
    file_name TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    content_type TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_invoice_attachments_invoice ON invoice_attachments(invoice_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_status_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO animals (id, name, animal_type, status) VALUES ('a1', 'Rex', 'dog', 'lost')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO animals (id, name, animal_type, status) VALUES ('a1', 'Rex', 'dog', 'foster')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_event_requires_animal() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO animal_events (id, animal_id, event_type, event_date, details)
             VALUES ('e1', 'missing', 'note', '2024-01-01', '{}')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_animal_with_events_cannot_be_deleted_directly() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO animals (id, name, animal_type) VALUES ('a1', 'Rex', 'dog')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO animal_events (id, animal_id, event_type, event_date, details)
             VALUES ('e1', 'a1', 'note', '2024-01-01', '{}')",
            [],
        )
        .unwrap();

        let result = conn.execute("DELETE FROM animals WHERE id = 'a1'", []);
        assert!(result.is_err());
    }
}
