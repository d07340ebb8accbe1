//! Animal database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Animal, AnimalStatus};

const ANIMAL_COLUMNS: &str = "id, name, animal_type, breed, gender, date_of_birth, microchip, \
                              status, owner_id, notes, created_at, updated_at";

impl Database {
    /// Insert a new animal.
    pub fn insert_animal(&self, animal: &Animal) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO animals (
                id, name, animal_type, breed, gender, date_of_birth, microchip,
                status, owner_id, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                animal.id,
                animal.name,
                animal.animal_type,
                animal.breed,
                animal.gender.as_str(),
                animal.date_of_birth,
                animal.microchip,
                animal.status.as_str(),
                animal.owner_id,
                animal.notes,
                animal.created_at,
                animal.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update the descriptive fields of an animal.
    ///
    /// Status and owner only change through [`Database::update_animal_status`].
    pub fn update_animal(&self, animal: &Animal) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE animals SET
                name = ?2,
                animal_type = ?3,
                breed = ?4,
                gender = ?5,
                date_of_birth = ?6,
                microchip = ?7,
                notes = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
            params![
                animal.id,
                animal.name,
                animal.animal_type,
                animal.breed,
                animal.gender.as_str(),
                animal.date_of_birth,
                animal.microchip,
                animal.notes,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Set status and owner in one write.
    pub fn update_animal_status(
        &self,
        id: &str,
        status: AnimalStatus,
        owner_id: Option<&str>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE animals SET status = ?2, owner_id = ?3, updated_at = ?4 WHERE id = ?1",
            params![id, status.as_str(), owner_id, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an animal by ID.
    pub fn get_animal(&self, id: &str) -> DbResult<Option<Animal>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM animals WHERE id = ?", ANIMAL_COLUMNS),
                [id],
                read_animal_row,
            )
            .optional()?
            .map(Animal::try_from)
            .transpose()
    }

    /// List all animals ordered by name.
    pub fn list_animals(&self) -> DbResult<Vec<Animal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM animals ORDER BY name", ANIMAL_COLUMNS))?;
        let rows = stmt.query_map([], read_animal_row)?;

        let mut animals = Vec::new();
        for row in rows {
            animals.push(row?.try_into()?);
        }
        Ok(animals)
    }

    /// List animals with the given status.
    pub fn list_animals_by_status(&self, status: AnimalStatus) -> DbResult<Vec<Animal>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM animals WHERE status = ? ORDER BY name",
            ANIMAL_COLUMNS
        ))?;
        let rows = stmt.query_map([status.as_str()], read_animal_row)?;

        let mut animals = Vec::new();
        for row in rows {
            animals.push(row?.try_into()?);
        }
        Ok(animals)
    }

    /// Search animals by name (prefix match).
    pub fn search_animals(&self, query: &str, limit: usize) -> DbResult<Vec<Animal>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM animals WHERE name LIKE ? ORDER BY name LIMIT ?",
            ANIMAL_COLUMNS
        ))?;
        let rows = stmt.query_map(params![pattern, limit as i64], read_animal_row)?;

        let mut animals = Vec::new();
        for row in rows {
            animals.push(row?.try_into()?);
        }
        Ok(animals)
    }
}

/// Intermediate row struct for database mapping.
struct AnimalRow {
    id: String,
    name: String,
    animal_type: String,
    breed: Option<String>,
    gender: String,
    date_of_birth: Option<String>,
    microchip: Option<String>,
    status: String,
    owner_id: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_animal_row(row: &Row<'_>) -> rusqlite::Result<AnimalRow> {
    Ok(AnimalRow {
        id: row.get(0)?,
        name: row.get(1)?,
        animal_type: row.get(2)?,
        breed: row.get(3)?,
        gender: row.get(4)?,
        date_of_birth: row.get(5)?,
        microchip: row.get(6)?,
        status: row.get(7)?,
        owner_id: row.get(8)?,
        notes: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

impl TryFrom<AnimalRow> for Animal {
    type Error = DbError;

    fn try_from(row: AnimalRow) -> Result<Self, Self::Error> {
        Ok(Animal {
            id: row.id,
            name: row.name,
            animal_type: row.animal_type,
            breed: row.breed,
            gender: row.gender.parse().map_err(DbError::Constraint)?,
            date_of_birth: row.date_of_birth,
            microchip: row.microchip,
            status: row.status.parse().map_err(DbError::Constraint)?,
            owner_id: row.owner_id,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
