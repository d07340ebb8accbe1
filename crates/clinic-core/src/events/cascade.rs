//! Status cascade: a status-change event also updates the animal.
//!
//! Rules:
//! - entering `adopted` or `foster` with a contact makes that contact the owner;
//! - entering `adopted` or `foster` without a contact keeps the current owner;
//! - any other status clears the owner.
//!
//! Whenever an owner is removed or replaced, the previous owner id is
//! written into the event payload. No transition is rejected.

use crate::db::{ClinicStore, DbResult};
use crate::models::{Animal, AnimalStatus, StatusChangeDetails};

/// The animal write a status-change event implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    pub animal_id: String,
    pub previous_status: AnimalStatus,
    pub new_status: AnimalStatus,
    pub previous_owner_id: Option<String>,
    pub new_owner_id: Option<String>,
}

impl CascadePlan {
    pub fn plan(animal: &Animal, change: &StatusChangeDetails) -> Self {
        let new_owner_id = if change.new_status.is_placed() {
            change
                .contact_id
                .clone()
                .or_else(|| animal.owner_id.clone())
        } else {
            None
        };

        Self {
            animal_id: animal.id.clone(),
            previous_status: animal.status,
            new_status: change.new_status,
            previous_owner_id: animal.owner_id.clone(),
            new_owner_id,
        }
    }

    /// The previous owner no longer holds the animal.
    pub fn displaces_owner(&self) -> bool {
        self.previous_owner_id.is_some() && self.previous_owner_id != self.new_owner_id
    }

    /// Record the audit fields on the event payload.
    pub fn annotate(&self, change: &mut StatusChangeDetails) {
        change.previous_status = Some(self.previous_status);
        if self.displaces_owner() {
            change.previous_owner_id = self.previous_owner_id.clone();
        }
    }

    /// Write the new status and owner. `Ok(false)` when the animal row is gone.
    pub fn apply<S: ClinicStore + ?Sized>(&self, store: &S) -> DbResult<bool> {
        store.update_animal_status(&self.animal_id, self.new_status, self.new_owner_id.as_deref())
    }
}
