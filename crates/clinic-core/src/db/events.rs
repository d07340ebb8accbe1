//! Animal event database operations.
//!
//! There is no update statement here: events are append-only.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{AnimalEvent, EventDetails, EventType};

const EVENT_COLUMNS: &str = "id, animal_id, event_type, event_date, details, created_at";

impl Database {
    /// Insert a new event.
    pub fn insert_event(&self, event: &AnimalEvent) -> DbResult<()> {
        let details_json = serde_json::to_string(&event.details)?;
        self.conn.execute(
            r#"
            INSERT INTO animal_events (
                id, animal_id, event_type, event_date, details, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                event.id,
                event.animal_id,
                event.event_type().as_str(),
                event.event_date,
                details_json,
                event.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get an event by ID.
    pub fn get_event(&self, id: &str) -> DbResult<Option<AnimalEvent>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM animal_events WHERE id = ?", EVENT_COLUMNS),
                [id],
                read_event_row,
            )
            .optional()?
            .map(AnimalEvent::try_from)
            .transpose()
    }

    /// List all events, newest first.
    pub fn list_events(&self) -> DbResult<Vec<AnimalEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM animal_events ORDER BY event_date DESC, created_at DESC",
            EVENT_COLUMNS
        ))?;
        let rows = stmt.query_map([], read_event_row)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?.try_into()?);
        }
        Ok(events)
    }

    /// List an animal's events in chronological order.
    pub fn list_events_for_animal(&self, animal_id: &str) -> DbResult<Vec<AnimalEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM animal_events WHERE animal_id = ? ORDER BY event_date, created_at",
            EVENT_COLUMNS
        ))?;
        let rows = stmt.query_map([animal_id], read_event_row)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?.try_into()?);
        }
        Ok(events)
    }
}

struct EventRow {
    id: String,
    animal_id: String,
    event_type: String,
    event_date: String,
    details: String,
    created_at: String,
}

fn read_event_row(row: &Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        animal_id: row.get(1)?,
        event_type: row.get(2)?,
        event_date: row.get(3)?,
        details: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl TryFrom<EventRow> for AnimalEvent {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let event_type: EventType = row.event_type.parse().map_err(DbError::Constraint)?;
        let details: EventDetails = serde_json::from_str(&row.details)?;
        if details.event_type() != event_type {
            return Err(DbError::Constraint(format!(
                "Event {} is tagged {} but carries {} details",
                row.id,
                event_type,
                details.event_type()
            )));
        }

        Ok(AnimalEvent {
            id: row.id,
            animal_id: row.animal_id,
            event_date: row.event_date,
            details,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Animal, NoteDetails, WeightDetails, WeightUnit};

    fn setup_db() -> (Database, Animal) {
        let db = Database::open_in_memory().unwrap();
        let animal = Animal::new("Biscuit".into(), "dog".into());
        db.insert_animal(&animal).unwrap();
        (db, animal)
    }

    #[test]
    fn test_insert_and_get_event() {
        let (db, animal) = setup_db();

        let event = AnimalEvent::new(
            animal.id.clone(),
            "2024-02-01".into(),
            EventDetails::Weight(WeightDetails {
                weight: 11.2,
                unit: WeightUnit::Kg,
                notes: None,
            }),
        );
        db.insert_event(&event).unwrap();

        let retrieved = db.get_event(&event.id).unwrap().unwrap();
        assert_eq!(retrieved, event);
    }

    #[test]
    fn test_events_for_animal_chronological() {
        let (db, animal) = setup_db();

        for date in ["2024-03-01", "2024-01-01", "2024-02-01"] {
            let event = AnimalEvent::new(
                animal.id.clone(),
                date.into(),
                EventDetails::Note(NoteDetails {
                    content: format!("seen {}", date),
                }),
            );
            db.insert_event(&event).unwrap();
        }

        let dates: Vec<String> = db
            .list_events_for_animal(&animal.id)
            .unwrap()
            .into_iter()
            .map(|e| e.event_date)
            .collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-02-01", "2024-03-01"]);

        let newest = db.list_events().unwrap();
        assert_eq!(newest[0].event_date, "2024-03-01");
    }

    #[test]
    fn test_mismatched_tag_rejected() {
        let (db, animal) = setup_db();
        db.conn()
            .execute(
                "INSERT INTO animal_events (id, animal_id, event_type, event_date, details)
                 VALUES ('e1', ?1, 'weight', '2024-01-01', '{\"type\":\"note\",\"content\":\"x\"}')",
                [&animal.id],
            )
            .unwrap();

        let result = db.get_event("e1");
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }
}
