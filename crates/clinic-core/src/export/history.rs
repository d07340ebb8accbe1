//! Animal history export: the animal, its owner, and every event in date
//! order with attachment metadata.

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbError, DbResult};
use crate::models::{Animal, AnimalEvent, Attachment, AttachmentOwner, Contact};

/// Full history of one animal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalHistoryExport {
    pub metadata: HistoryMetadata,
    pub animal: Animal,
    pub owner: Option<Contact>,
    pub events: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMetadata {
    /// Export format version
    pub format_version: String,
    pub exported_at: String,
    pub event_count: usize,
    /// Exporting system identifier
    pub system_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub event: AnimalEvent,
    pub summary: String,
    pub attachments: Vec<Attachment>,
}

impl AnimalHistoryExport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Animal history exporter.
pub struct HistoryExporter<'a> {
    db: &'a Database,
    system_id: Option<String>,
}

impl<'a> HistoryExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            system_id: None,
        }
    }

    /// Set the system identifier for exports.
    pub fn with_system_id(mut self, system_id: String) -> Self {
        self.system_id = Some(system_id);
        self
    }

    pub fn export(&self, animal_id: &str) -> DbResult<AnimalHistoryExport> {
        let animal = self
            .db
            .get_animal(animal_id)?
            .ok_or_else(|| DbError::NotFound(format!("animal {}", animal_id)))?;
        let owner = match animal.owner_id.as_deref() {
            Some(id) => self.db.get_contact(id)?,
            None => None,
        };

        let events = self.db.list_events_for_animal(animal_id)?;
        let event_ids: Vec<String> = events.iter().map(|e| e.id.clone()).collect();
        let mut attachments = self.db.list_attachments(AttachmentOwner::Event, &event_ids)?;

        let entries: Vec<HistoryEntry> = events
            .into_iter()
            .map(|event| {
                let (mine, rest): (Vec<Attachment>, Vec<Attachment>) = attachments
                    .drain(..)
                    .partition(|a| a.parent_id == event.id);
                attachments = rest;
                HistoryEntry {
                    summary: event.details.summary(),
                    event,
                    attachments: mine,
                }
            })
            .collect();

        Ok(AnimalHistoryExport {
            metadata: HistoryMetadata {
                format_version: "1.0".to_string(),
                exported_at: chrono::Utc::now().to_rfc3339(),
                event_count: entries.len(),
                system_id: self.system_id.clone(),
            },
            animal,
            owner,
            events: entries,
        })
    }
}
