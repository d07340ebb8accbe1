//! Contact database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Contact, ContactRole};

const CONTACT_COLUMNS: &str =
    "id, first_name, last_name, email, phone, address, roles, notes, created_at, updated_at";

impl Database {
    /// Insert a new contact.
    pub fn insert_contact(&self, contact: &Contact) -> DbResult<()> {
        let roles_json = serde_json::to_string(&contact.roles)?;
        self.conn.execute(
            r#"
            INSERT INTO contacts (
                id, first_name, last_name, email, phone, address, roles, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                contact.id,
                contact.first_name,
                contact.last_name,
                contact.email,
                contact.phone,
                contact.address,
                roles_json,
                contact.notes,
                contact.created_at,
                contact.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing contact.
    pub fn update_contact(&self, contact: &Contact) -> DbResult<bool> {
        let roles_json = serde_json::to_string(&contact.roles)?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE contacts SET
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                phone = ?5,
                address = ?6,
                roles = ?7,
                notes = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
            params![
                contact.id,
                contact.first_name,
                contact.last_name,
                contact.email,
                contact.phone,
                contact.address,
                roles_json,
                contact.notes,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a contact by ID.
    pub fn get_contact(&self, id: &str) -> DbResult<Option<Contact>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM contacts WHERE id = ?", CONTACT_COLUMNS),
                [id],
                read_contact_row,
            )
            .optional()?
            .map(Contact::try_from)
            .transpose()
    }

    /// List all contacts ordered by last name, first name.
    pub fn list_contacts(&self) -> DbResult<Vec<Contact>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM contacts ORDER BY last_name, first_name",
            CONTACT_COLUMNS
        ))?;
        let rows = stmt.query_map([], read_contact_row)?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row?.try_into()?);
        }
        Ok(contacts)
    }

    /// Contacts eligible for a selection context.
    pub fn list_contacts_with_role(&self, role: ContactRole) -> DbResult<Vec<Contact>> {
        Ok(self
            .list_contacts()?
            .into_iter()
            .filter(|c| c.has_role(role))
            .collect())
    }
}

struct ContactRow {
    id: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    roles: String,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_contact_row(row: &Row<'_>) -> rusqlite::Result<ContactRow> {
    Ok(ContactRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        roles: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl TryFrom<ContactRow> for Contact {
    type Error = DbError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(Contact {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            roles: serde_json::from_str(&row.roles)?,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();

        let mut contact = Contact::new(
            "Ada".into(),
            "Moss".into(),
            vec![ContactRole::Foster, ContactRole::Owner],
        );
        contact.email = Some("ada@example.org".into());
        db.insert_contact(&contact).unwrap();

        let retrieved = db.get_contact(&contact.id).unwrap().unwrap();
        assert_eq!(retrieved.full_name(), "Ada Moss");
        assert_eq!(retrieved.roles, vec![ContactRole::Owner, ContactRole::Foster]);
        assert_eq!(retrieved.email, Some("ada@example.org".into()));
    }

    #[test]
    fn test_update_roles() {
        let db = Database::open_in_memory().unwrap();

        let mut contact = Contact::new("Ada".into(), "Moss".into(), vec![]);
        db.insert_contact(&contact).unwrap();

        contact.roles = vec![ContactRole::Veterinarian];
        assert!(db.update_contact(&contact).unwrap());

        let vets = db.list_contacts_with_role(ContactRole::Veterinarian).unwrap();
        assert_eq!(vets.len(), 1);
        assert!(db.list_contacts_with_role(ContactRole::Owner).unwrap().is_empty());
    }
}
