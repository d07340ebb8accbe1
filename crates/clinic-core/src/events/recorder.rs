//! Event submission.
//!
//! Order of writes:
//! 1. validate the form (no store access on failure);
//! 2. insert the event;
//! 3. for status changes, update the animal's status and owner;
//! 4. upload and record attachments.
//!
//! Steps 3 and 4 never unwind step 2. Their failures come back as warning
//! notices on the outcome.

use thiserror::Error;

use super::cascade::CascadePlan;
use super::form::{EventForm, ValidationErrors};
use crate::db::{ClinicStore, DbError};
use crate::models::{
    AnimalEvent, Attachment, AttachmentOwner, ContactRole, EventDetails,
};
use crate::notify::{Notice, RefreshBus, Topic};
use crate::storage::{attachment_key, ObjectStore};

/// Event submission errors. Any of these means no event was stored.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Animal not found: {0}")]
    AnimalNotFound(String),

    #[error("Contact {contact_id} cannot be selected as {role}")]
    IneligibleContact { contact_id: String, role: String },

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type SubmitResult<T> = Result<T, SubmitError>;

/// A file picked in the form, not yet uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Result of a submission whose event insert succeeded.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub event: AnimalEvent,
    /// `Some(true)` when the animal was updated, `Some(false)` when the
    /// status write failed, `None` for non status-change events.
    pub status_updated: Option<bool>,
    pub attachments: Vec<Attachment>,
    pub notices: Vec<Notice>,
}

impl SubmitOutcome {
    pub fn has_warnings(&self) -> bool {
        self.notices
            .iter()
            .any(|n| n.level != crate::notify::NoticeLevel::Success)
    }
}

/// Records events against animals.
pub struct EventRecorder<'a, S: ClinicStore + ?Sized> {
    store: &'a S,
    objects: &'a dyn ObjectStore,
    bus: Option<&'a RefreshBus>,
}

impl<'a, S: ClinicStore + ?Sized> EventRecorder<'a, S> {
    pub fn new(store: &'a S, objects: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            objects,
            bus: None,
        }
    }

    /// Publish refreshes on `bus` after successful writes.
    pub fn with_refresh(mut self, bus: &'a RefreshBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn submit(
        &self,
        form: &EventForm,
        attachments: Vec<NewAttachment>,
    ) -> SubmitResult<SubmitOutcome> {
        let mut event = form.build()?;

        let animal = self
            .store
            .get_animal(&event.animal_id)?
            .ok_or_else(|| SubmitError::AnimalNotFound(event.animal_id.clone()))?;

        self.check_contacts(&event.details)?;

        let plan = match &mut event.details {
            EventDetails::StatusChange(change) => {
                let plan = CascadePlan::plan(&animal, change);
                plan.annotate(change);
                Some(plan)
            }
            _ => None,
        };

        self.store.insert_event(&event)?;
        tracing::info!(
            event_id = %event.id,
            animal_id = %event.animal_id,
            event_type = %event.event_type(),
            "event recorded"
        );

        let mut notices = Vec::new();
        let status_updated = plan.map(|plan| match plan.apply(self.store) {
            Ok(true) => {
                tracing::info!(
                    animal_id = %plan.animal_id,
                    from = %plan.previous_status,
                    to = %plan.new_status,
                    owner_cleared = plan.displaces_owner(),
                    "animal status updated"
                );
                if let Some(bus) = self.bus {
                    bus.publish(Topic::Animals, vec![plan.animal_id.clone()]);
                }
                true
            }
            Ok(false) => {
                tracing::warn!(animal_id = %plan.animal_id, "status update matched no animal");
                notices.push(Notice::warning("Event added but failed to update status"));
                false
            }
            Err(e) => {
                tracing::warn!(animal_id = %plan.animal_id, error = %e, "status update failed");
                notices.push(Notice::warning(format!(
                    "Event added but failed to update status: {}",
                    e
                )));
                false
            }
        });

        let mut stored = Vec::new();
        for file in attachments {
            match self.store_attachment(&event.id, file) {
                Ok(attachment) => stored.push(attachment),
                Err(message) => notices.push(Notice::warning(message)),
            }
        }

        if let Some(bus) = self.bus {
            bus.publish(Topic::Events, vec![event.id.clone()]);
        }

        notices.insert(0, Notice::success(format!("{} recorded", event.event_type().label())));

        Ok(SubmitOutcome {
            event,
            status_updated,
            attachments: stored,
            notices,
        })
    }

    /// Contacts picked in the form must carry the role of the picker.
    fn check_contacts(&self, details: &EventDetails) -> SubmitResult<()> {
        let wanted: Option<(&str, ContactRole)> = match details {
            EventDetails::StatusChange(change) => change
                .contact_id
                .as_deref()
                .zip(ContactRole::for_placement(change.new_status)),
            EventDetails::Vaccination(v) => v
                .veterinarian_id
                .as_deref()
                .map(|id| (id, ContactRole::Veterinarian)),
            EventDetails::Visit(v) => v
                .veterinarian_id
                .as_deref()
                .map(|id| (id, ContactRole::Veterinarian)),
            _ => None,
        };

        let Some((contact_id, role)) = wanted else {
            return Ok(());
        };

        match self.store.get_contact(contact_id)? {
            Some(contact) if contact.has_role(role) => Ok(()),
            _ => Err(SubmitError::IneligibleContact {
                contact_id: contact_id.to_string(),
                role: role.as_str().to_string(),
            }),
        }
    }

    /// Upload one file, then record its metadata. On a metadata failure the
    /// uploaded object is removed again.
    fn store_attachment(&self, event_id: &str, file: NewAttachment) -> Result<Attachment, String> {
        let key = attachment_key(AttachmentOwner::Event, event_id, &file.file_name, &file.bytes);
        let storage_key = self
            .objects
            .put_object(&key, &file.bytes, &file.content_type)
            .map_err(|e| {
                tracing::warn!(event_id, file = %file.file_name, error = %e, "attachment upload failed");
                format!("Event saved but uploading {} failed: {}", file.file_name, e)
            })?;

        let attachment = Attachment {
            id: uuid::Uuid::new_v4().to_string(),
            parent_id: event_id.to_string(),
            storage_key,
            file_name: file.file_name,
            size_bytes: file.bytes.len() as u64,
            content_type: file.content_type,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        if let Err(e) = self.store.insert_attachment(AttachmentOwner::Event, &attachment) {
            tracing::warn!(event_id, file = %attachment.file_name, error = %e, "attachment record failed");
            if let Err(cleanup) = self.objects.delete_object(&attachment.storage_key) {
                tracing::warn!(key = %attachment.storage_key, error = %cleanup, "orphaned attachment object");
            }
            return Err(format!(
                "Event saved but attaching {} failed: {}",
                attachment.file_name, e
            ));
        }

        Ok(attachment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Animal, AnimalStatus, Contact, EventType};
    use crate::notify::NoticeLevel;
    use crate::storage::MemoryObjectStore;

    fn setup() -> (Database, MemoryObjectStore, Animal) {
        let db = Database::open_in_memory().unwrap();
        let animal = Animal::new("Pip".into(), "cat".into());
        db.insert_animal(&animal).unwrap();
        (db, MemoryObjectStore::new(), animal)
    }

    #[test]
    fn test_note_with_attachment() {
        let (db, objects, animal) = setup();
        let recorder = EventRecorder::new(&db, &objects);

        let mut form = EventForm::new(animal.id.clone(), EventType::Note);
        form.set("content", "Ate well").unwrap();
        let outcome = recorder
            .submit(
                &form,
                vec![NewAttachment {
                    file_name: "bowl.jpg".into(),
                    content_type: "image/jpeg".into(),
                    bytes: vec![1, 2, 3],
                }],
            )
            .unwrap();

        assert_eq!(outcome.status_updated, None);
        assert_eq!(outcome.attachments.len(), 1);
        assert!(objects.contains(&outcome.attachments[0].storage_key));
        assert!(!outcome.has_warnings());
        assert_eq!(outcome.notices[0].message, "Note recorded");

        let listed = db
            .list_attachments(AttachmentOwner::Event, &[outcome.event.id.clone()])
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn test_unknown_animal_rejected() {
        let (db, objects, _) = setup();
        let recorder = EventRecorder::new(&db, &objects);

        let mut form = EventForm::new("ghost", EventType::Note);
        form.set("content", "boo").unwrap();
        assert!(matches!(
            recorder.submit(&form, vec![]),
            Err(SubmitError::AnimalNotFound(_))
        ));
        assert!(db.list_events().unwrap().is_empty());
    }

    #[test]
    fn test_vet_role_required() {
        let (db, objects, animal) = setup();
        let owner = Contact::new("Ada".into(), "Moss".into(), vec![ContactRole::Owner]);
        db.insert_contact(&owner).unwrap();
        let recorder = EventRecorder::new(&db, &objects);

        let mut form = EventForm::new(animal.id.clone(), EventType::Visit);
        form.set("veterinarian_id", owner.id.clone()).unwrap();
        assert!(matches!(
            recorder.submit(&form, vec![]),
            Err(SubmitError::IneligibleContact { .. })
        ));
    }

    #[test]
    fn test_status_change_updates_animal() {
        let (db, objects, animal) = setup();
        let foster = Contact::new("Bo".into(), "Lee".into(), vec![ContactRole::Foster]);
        db.insert_contact(&foster).unwrap();
        let bus = RefreshBus::new();
        let recorder = EventRecorder::new(&db, &objects).with_refresh(&bus);

        let mut form = EventForm::new(animal.id.clone(), EventType::StatusChange);
        form.set("new_status", "foster").unwrap();
        form.set("contact_id", foster.id.clone()).unwrap();
        let outcome = recorder.submit(&form, vec![]).unwrap();

        assert_eq!(outcome.status_updated, Some(true));
        let updated = db.get_animal(&animal.id).unwrap().unwrap();
        assert_eq!(updated.status, AnimalStatus::Foster);
        assert_eq!(updated.owner_id, Some(foster.id));
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(outcome.notices[0].level, NoticeLevel::Success);
    }
}
