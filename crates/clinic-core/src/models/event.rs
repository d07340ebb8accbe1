//! Animal event models.
//!
//! Events form an append-only history per animal. Each event carries a
//! typed details payload; the variant decides which fields exist.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::AnimalStatus;

/// Event type tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Weight,
    Vaccination,
    Medication,
    StatusChange,
    Note,
    Visit,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::Weight,
        EventType::Vaccination,
        EventType::Medication,
        EventType::StatusChange,
        EventType::Note,
        EventType::Visit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Weight => "weight",
            EventType::Vaccination => "vaccination",
            EventType::Medication => "medication",
            EventType::StatusChange => "status_change",
            EventType::Note => "note",
            EventType::Visit => "visit",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            EventType::Weight => "Weight",
            EventType::Vaccination => "Vaccination",
            EventType::Medication => "Medication",
            EventType::StatusChange => "Status change",
            EventType::Note => "Note",
            EventType::Visit => "Visit",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        EventType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("Unknown event type: {}", s))
    }
}

/// Unit a weight was recorded in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

impl FromStr for WeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" => Ok(WeightUnit::Kg),
            "lb" | "lbs" => Ok(WeightUnit::Lb),
            other => Err(format!("Unknown weight unit: {}", other)),
        }
    }
}

// Field order below is the payload order: mandatory fields first.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightDetails {
    pub weight: f64,
    #[serde(default)]
    pub unit: WeightUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VaccinationDetails {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veterinarian_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationDetails {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusChangeDetails {
    pub new_status: AnimalStatus,
    /// Status before the change; filled in by the cascade
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<AnimalStatus>,
    /// Adopter or foster parent taking the animal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    /// Owner cleared by this change, kept for audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Visit details. At least one of `reason` and `veterinarian_id` is present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veterinarian_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteDetails {
    pub content: String,
}

/// Type-dependent event payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventDetails {
    Weight(WeightDetails),
    Vaccination(VaccinationDetails),
    Medication(MedicationDetails),
    StatusChange(StatusChangeDetails),
    Note(NoteDetails),
    Visit(VisitDetails),
}

impl EventDetails {
    pub fn event_type(&self) -> EventType {
        match self {
            EventDetails::Weight(_) => EventType::Weight,
            EventDetails::Vaccination(_) => EventType::Vaccination,
            EventDetails::Medication(_) => EventType::Medication,
            EventDetails::StatusChange(_) => EventType::StatusChange,
            EventDetails::Note(_) => EventType::Note,
            EventDetails::Visit(_) => EventType::Visit,
        }
    }

    /// One-line summary for tables and exports.
    pub fn summary(&self) -> String {
        match self {
            EventDetails::Weight(w) => {
                let unit = match w.unit {
                    WeightUnit::Kg => "kg",
                    WeightUnit::Lb => "lb",
                };
                format!("{} {}", w.weight, unit)
            }
            EventDetails::Vaccination(v) => v.name.clone(),
            EventDetails::Medication(m) => match &m.dosage {
                Some(dosage) => format!("{} ({})", m.name, dosage),
                None => m.name.clone(),
            },
            EventDetails::StatusChange(s) => match s.previous_status {
                Some(prev) => format!("{} -> {}", prev, s.new_status),
                None => format!("-> {}", s.new_status),
            },
            EventDetails::Note(n) => n.content.clone(),
            EventDetails::Visit(v) => v
                .reason
                .clone()
                .unwrap_or_else(|| "Veterinary visit".to_string()),
        }
    }

    /// Contact ids referenced by this payload.
    pub fn referenced_contacts(&self) -> Vec<&str> {
        match self {
            EventDetails::Vaccination(v) => v.veterinarian_id.as_deref().into_iter().collect(),
            EventDetails::Visit(v) => v.veterinarian_id.as_deref().into_iter().collect(),
            EventDetails::StatusChange(s) => s
                .contact_id
                .as_deref()
                .into_iter()
                .chain(s.previous_owner_id.as_deref())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A recorded event. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnimalEvent {
    pub id: String,
    pub animal_id: String,
    /// Date the event happened (YYYY-MM-DD)
    pub event_date: String,
    pub details: EventDetails,
    pub created_at: String,
}

impl AnimalEvent {
    pub fn new(animal_id: String, event_date: String, details: EventDetails) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            animal_id,
            event_date,
            details,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.details.event_type()
    }
}

/// Parent record an attachment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentOwner {
    Event,
    Invoice,
}

/// Metadata for a file kept in object storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub id: String,
    /// Event or invoice id, depending on the table
    pub parent_id: String,
    /// Object storage key
    pub storage_key: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_tagged_payload() {
        let details = EventDetails::Weight(WeightDetails {
            weight: 12.5,
            unit: WeightUnit::Kg,
            notes: None,
        });
        let json = serde_json::to_string(&details).unwrap();
        assert_eq!(json, r#"{"type":"weight","weight":12.5,"unit":"kg"}"#);

        let back: EventDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_type(), EventType::Weight);
    }

    #[test]
    fn test_mandatory_fields_serialized_first() {
        let details = EventDetails::Medication(MedicationDetails {
            name: "Amoxicillin".into(),
            dosage: Some("50mg".into()),
            frequency: None,
            start_date: None,
            end_date: None,
            notes: Some("with food".into()),
        });
        let json = serde_json::to_string(&details).unwrap();
        let name_pos = json.find("\"name\"").unwrap();
        let dosage_pos = json.find("\"dosage\"").unwrap();
        let notes_pos = json.find("\"notes\"").unwrap();
        assert!(name_pos < dosage_pos && dosage_pos < notes_pos);
        assert!(!json.contains("frequency"));
    }

    #[test]
    fn test_status_change_summary() {
        let details = EventDetails::StatusChange(StatusChangeDetails {
            new_status: AnimalStatus::Adopted,
            previous_status: Some(AnimalStatus::Foster),
            contact_id: Some("c-1".into()),
            previous_owner_id: Some("c-0".into()),
            reason: None,
        });
        assert_eq!(details.summary(), "foster -> adopted");
        assert_eq!(details.referenced_contacts(), vec!["c-1", "c-0"]);
    }

    #[test]
    fn test_event_type_parse() {
        assert_eq!("status_change".parse::<EventType>(), Ok(EventType::StatusChange));
        assert!("surgery".parse::<EventType>().is_err());
    }
}
