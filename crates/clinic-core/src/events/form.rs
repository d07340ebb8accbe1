//! Event form controller.
//!
//! Holds the selected event type and the raw field values typed by the
//! user, exposes which fields the type offers, and turns the values into a
//! typed [`EventDetails`] payload.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use crate::models::{
    AnimalEvent, AnimalStatus, EventDetails, EventType, MedicationDetails, NoteDetails,
    StatusChangeDetails, VaccinationDetails, VisitDetails, WeightDetails, WeightUnit,
};

/// Input widget kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Status,
    WeightUnit,
    /// Contact picker; carries a contact id
    Contact,
}

/// Whether a field must be filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
    /// At least one field of the named group must be filled in.
    AnyOf(&'static str),
}

/// One field offered for an event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub requirement: Requirement,
}

const fn field(
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    requirement: Requirement,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        requirement,
    }
}

use FieldKind as K;
use Requirement::{AnyOf, Optional, Required};

const WEIGHT_FIELDS: &[FieldSpec] = &[
    field("weight", "Weight", K::Number, Required),
    field("unit", "Unit", K::WeightUnit, Optional),
    field("notes", "Notes", K::Text, Optional),
];

const VACCINATION_FIELDS: &[FieldSpec] = &[
    field("name", "Vaccine", K::Text, Required),
    field("batch_number", "Batch number", K::Text, Optional),
    field("next_due_date", "Next due", K::Date, Optional),
    field("veterinarian_id", "Veterinarian", K::Contact, Optional),
    field("notes", "Notes", K::Text, Optional),
];

const MEDICATION_FIELDS: &[FieldSpec] = &[
    field("name", "Medication", K::Text, Required),
    field("dosage", "Dosage", K::Text, Optional),
    field("frequency", "Frequency", K::Text, Optional),
    field("start_date", "Start date", K::Date, Optional),
    field("end_date", "End date", K::Date, Optional),
    field("notes", "Notes", K::Text, Optional),
];

const STATUS_CHANGE_FIELDS: &[FieldSpec] = &[
    field("new_status", "New status", K::Status, Required),
    field("contact_id", "Adopter / foster parent", K::Contact, Optional),
    field("reason", "Reason", K::Text, Optional),
];

const NOTE_FIELDS: &[FieldSpec] = &[field("content", "Note", K::Text, Required)];

const VISIT_FIELDS: &[FieldSpec] = &[
    field("reason", "Reason", K::Text, AnyOf("reason_or_veterinarian")),
    field(
        "veterinarian_id",
        "Veterinarian",
        K::Contact,
        AnyOf("reason_or_veterinarian"),
    ),
    field("diagnosis", "Diagnosis", K::Text, Optional),
    field("treatment", "Treatment", K::Text, Optional),
    field("notes", "Notes", K::Text, Optional),
];

/// Fields offered for `event_type`, mandatory fields first.
pub fn fields_for(event_type: EventType) -> &'static [FieldSpec] {
    match event_type {
        EventType::Weight => WEIGHT_FIELDS,
        EventType::Vaccination => VACCINATION_FIELDS,
        EventType::Medication => MEDICATION_FIELDS,
        EventType::StatusChange => STATUS_CHANGE_FIELDS,
        EventType::Note => NOTE_FIELDS,
        EventType::Visit => VISIT_FIELDS,
    }
}

/// Field-level validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "Validation failed ({})", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Form state for logging one event against an animal.
#[derive(Debug, Clone, PartialEq)]
pub struct EventForm {
    pub animal_id: String,
    pub event_date: String,
    event_type: EventType,
    values: BTreeMap<String, String>,
}

impl EventForm {
    /// Start a form for today's date.
    pub fn new(animal_id: impl Into<String>, event_type: EventType) -> Self {
        Self {
            animal_id: animal_id.into(),
            event_date: chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string(),
            event_type,
            values: BTreeMap::new(),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Fields to render for the active type.
    pub fn fields(&self) -> &'static [FieldSpec] {
        fields_for(self.event_type)
    }

    /// Switch type; values for fields the new type lacks are dropped.
    pub fn select_type(&mut self, event_type: EventType) {
        self.event_type = event_type;
        let valid = fields_for(event_type);
        self.values
            .retain(|name, _| valid.iter().any(|spec| spec.name == name.as_str()));
    }

    /// Set a raw value. Rejects fields the active type does not offer.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), ValidationErrors> {
        if !self.fields().iter().any(|spec| spec.name == name) {
            return Err(ValidationErrors::single(
                name,
                format!("not a field of {} events", self.event_type),
            ));
        }
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Trimmed, non-blank value.
    fn text(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Check required fields and value formats without touching any store.
    pub fn validate(&self) -> Result<EventDetails, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let fields = self.fields();

        for spec in fields {
            if spec.requirement == Required && self.text(spec.name).is_none() {
                errors.add(spec.name, format!("{} is required", spec.label));
            }
        }

        let mut groups: Vec<&'static str> = fields
            .iter()
            .filter_map(|spec| match spec.requirement {
                AnyOf(group) => Some(group),
                _ => None,
            })
            .collect();
        groups.dedup();
        for group in groups {
            let members: Vec<&FieldSpec> = fields
                .iter()
                .filter(|spec| spec.requirement == AnyOf(group))
                .collect();
            if members.iter().all(|spec| self.text(spec.name).is_none()) {
                let labels: Vec<&str> = members.iter().map(|spec| spec.label).collect();
                let message = format!("Provide {}", labels.join(" or "));
                for spec in members {
                    errors.add(spec.name, message.clone());
                }
            }
        }

        for spec in fields {
            let Some(value) = self.text(spec.name) else {
                continue;
            };
            match spec.kind {
                FieldKind::Number => match value.parse::<f64>() {
                    Ok(n) if n.is_finite() && n > 0.0 => {}
                    _ => errors.add(spec.name, format!("{} must be a positive number", spec.label)),
                },
                FieldKind::Date => {
                    if parse_date(&value).is_none() {
                        errors.add(spec.name, format!("{} must be a date (YYYY-MM-DD)", spec.label));
                    }
                }
                FieldKind::Status => {
                    if value.parse::<AnimalStatus>().is_err() {
                        errors.add(spec.name, format!("Unknown status: {}", value));
                    }
                }
                FieldKind::WeightUnit => {
                    if value.parse::<WeightUnit>().is_err() {
                        errors.add(spec.name, format!("Unknown unit: {}", value));
                    }
                }
                FieldKind::Text | FieldKind::Contact => {}
            }
        }

        errors.into_result()?;
        Ok(self.details())
    }

    /// Validate the whole form and build the event to insert.
    pub fn build(&self) -> Result<AnimalEvent, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.animal_id.trim().is_empty() {
            errors.add("animal_id", "Animal is required");
        }
        if parse_date(&self.event_date).is_none() {
            errors.add("event_date", "Date must be a date (YYYY-MM-DD)");
        }

        let details = match self.validate() {
            Ok(details) => Some(details),
            Err(field_errors) => {
                for (field, message) in field_errors.errors {
                    errors.add(&field, message);
                }
                None
            }
        };

        match details {
            Some(details) if errors.is_empty() => Ok(AnimalEvent::new(
                self.animal_id.trim().to_string(),
                self.event_date.trim().to_string(),
                details,
            )),
            _ => Err(errors),
        }
    }

    /// Assemble the payload. Only called once validation passed.
    fn details(&self) -> EventDetails {
        match self.event_type {
            EventType::Weight => EventDetails::Weight(WeightDetails {
                weight: self
                    .text("weight")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_default(),
                unit: self
                    .text("unit")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_default(),
                notes: self.text("notes"),
            }),
            EventType::Vaccination => EventDetails::Vaccination(VaccinationDetails {
                name: self.text("name").unwrap_or_default(),
                batch_number: self.text("batch_number"),
                next_due_date: self.text("next_due_date"),
                veterinarian_id: self.text("veterinarian_id"),
                notes: self.text("notes"),
            }),
            EventType::Medication => EventDetails::Medication(MedicationDetails {
                name: self.text("name").unwrap_or_default(),
                dosage: self.text("dosage"),
                frequency: self.text("frequency"),
                start_date: self.text("start_date"),
                end_date: self.text("end_date"),
                notes: self.text("notes"),
            }),
            EventType::StatusChange => EventDetails::StatusChange(StatusChangeDetails {
                new_status: self
                    .text("new_status")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(AnimalStatus::Active),
                previous_status: None,
                contact_id: self.text("contact_id"),
                previous_owner_id: None,
                reason: self.text("reason"),
            }),
            EventType::Note => EventDetails::Note(NoteDetails {
                content: self.text("content").unwrap_or_default(),
            }),
            EventType::Visit => EventDetails::Visit(VisitDetails {
                reason: self.text("reason"),
                veterinarian_id: self.text("veterinarian_id"),
                diagnosis: self.text("diagnosis"),
                treatment: self.text("treatment"),
                notes: self.text("notes"),
            }),
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mandatory_field_table() {
        let required: Vec<(EventType, Vec<&str>)> = EventType::ALL
            .iter()
            .map(|t| {
                (
                    *t,
                    fields_for(*t)
                        .iter()
                        .filter(|f| f.requirement == Required)
                        .map(|f| f.name)
                        .collect(),
                )
            })
            .collect();

        assert_eq!(
            required,
            vec![
                (EventType::Weight, vec!["weight"]),
                (EventType::Vaccination, vec!["name"]),
                (EventType::Medication, vec!["name"]),
                (EventType::StatusChange, vec!["new_status"]),
                (EventType::Note, vec!["content"]),
                (EventType::Visit, vec![]),
            ]
        );
    }

    #[test]
    fn test_blank_mandatory_field_rejected() {
        let mut form = EventForm::new("animal-1", EventType::Note);
        form.set("content", "   ").unwrap();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("content"), Some("Note is required"));
    }

    #[test]
    fn test_visit_needs_reason_or_vet() {
        let mut form = EventForm::new("animal-1", EventType::Visit);
        form.set("diagnosis", "otitis").unwrap();
        let errors = form.validate().unwrap_err();
        assert!(errors.get("reason").is_some());
        assert!(errors.get("veterinarian_id").is_some());

        form.set("veterinarian_id", "vet-1").unwrap();
        let details = form.validate().unwrap();
        match details {
            EventDetails::Visit(visit) => {
                assert_eq!(visit.veterinarian_id.as_deref(), Some("vet-1"));
                assert!(visit.reason.is_none());
            }
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_weight_must_be_positive_number() {
        let mut form = EventForm::new("animal-1", EventType::Weight);
        form.set("weight", "heavy").unwrap();
        assert!(form.validate().unwrap_err().get("weight").is_some());

        form.set("weight", "-3").unwrap();
        assert!(form.validate().is_err());

        form.set("weight", "4.25").unwrap();
        form.set("unit", "lb").unwrap();
        assert_eq!(
            form.validate().unwrap(),
            EventDetails::Weight(WeightDetails {
                weight: 4.25,
                unit: WeightUnit::Lb,
                notes: None,
            })
        );
    }

    #[test]
    fn test_field_not_offered_for_type() {
        let mut form = EventForm::new("animal-1", EventType::Note);
        assert!(form.set("weight", "3").is_err());
    }

    #[test]
    fn test_select_type_drops_foreign_values() {
        let mut form = EventForm::new("animal-1", EventType::Medication);
        form.set("name", "Carprofen").unwrap();
        form.set("dosage", "25mg").unwrap();
        form.set("notes", "with food").unwrap();

        form.select_type(EventType::Vaccination);
        assert_eq!(form.value("name"), Some("Carprofen"));
        assert_eq!(form.value("notes"), Some("with food"));
        assert_eq!(form.value("dosage"), None);
    }

    #[test]
    fn test_status_must_be_known() {
        let mut form = EventForm::new("animal-1", EventType::StatusChange);
        form.set("new_status", "escaped").unwrap();
        assert!(form.validate().unwrap_err().get("new_status").is_some());

        form.set("new_status", "adopted").unwrap();
        form.set("contact_id", "c-1").unwrap();
        match form.validate().unwrap() {
            EventDetails::StatusChange(change) => {
                assert_eq!(change.new_status, AnimalStatus::Adopted);
                assert_eq!(change.contact_id.as_deref(), Some("c-1"));
            }
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_build_checks_date_and_animal() {
        let mut form = EventForm::new("", EventType::Note);
        form.event_date = "03/04/2024".into();
        form.set("content", "ok").unwrap();
        let errors = form.build().unwrap_err();
        assert!(errors.get("animal_id").is_some());
        assert!(errors.get("event_date").is_some());

        form.animal_id = "animal-1".into();
        form.event_date = "2024-04-03".into();
        let event = form.build().unwrap();
        assert_eq!(event.event_type(), EventType::Note);
        assert_eq!(event.event_date, "2024-04-03");
    }

    #[test]
    fn test_date_fields_validated() {
        let mut form = EventForm::new("animal-1", EventType::Vaccination);
        form.set("name", "Rabies").unwrap();
        form.set("next_due_date", "next year").unwrap();
        assert!(form.validate().unwrap_err().get("next_due_date").is_some());
    }
}
