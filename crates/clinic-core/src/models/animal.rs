//! Animal models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an animal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnimalStatus {
    Active,
    Adopted,
    Foster,
    Treatment,
    Quarantine,
    Deceased,
}

impl AnimalStatus {
    pub const ALL: [AnimalStatus; 6] = [
        AnimalStatus::Active,
        AnimalStatus::Adopted,
        AnimalStatus::Foster,
        AnimalStatus::Treatment,
        AnimalStatus::Quarantine,
        AnimalStatus::Deceased,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimalStatus::Active => "active",
            AnimalStatus::Adopted => "adopted",
            AnimalStatus::Foster => "foster",
            AnimalStatus::Treatment => "treatment",
            AnimalStatus::Quarantine => "quarantine",
            AnimalStatus::Deceased => "deceased",
        }
    }

    /// Statuses where the animal lives with a contact (adopter or foster parent).
    pub fn is_placed(&self) -> bool {
        matches!(self, AnimalStatus::Adopted | AnimalStatus::Foster)
    }
}

impl fmt::Display for AnimalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        AnimalStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| format!("Unknown animal status: {}", s))
    }
}

/// Recorded gender of an animal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "unknown" | "" => Ok(Gender::Unknown),
            other => Err(format!("Unknown gender: {}", other)),
        }
    }
}

/// An animal in the clinic's care.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Animal {
    /// UUID
    pub id: String,
    pub name: String,
    /// Species (e.g., "dog", "cat")
    pub animal_type: String,
    pub breed: Option<String>,
    pub gender: Gender,
    pub date_of_birth: Option<String>,
    pub microchip: Option<String>,
    pub status: AnimalStatus,
    /// Contact the animal is placed with; only meaningful while adopted or fostered
    pub owner_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Animal {
    /// Create a new active animal with required fields.
    pub fn new(name: String, animal_type: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            animal_type,
            breed: None,
            gender: Gender::Unknown,
            date_of_birth: None,
            microchip: None,
            status: AnimalStatus::Active,
            owner_id: None,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_animal() {
        let animal = Animal::new("Biscuit".into(), "dog".into());
        assert_eq!(animal.name, "Biscuit");
        assert_eq!(animal.status, AnimalStatus::Active);
        assert!(animal.owner_id.is_none());
        assert_eq!(animal.id.len(), 36);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Foster".parse::<AnimalStatus>(), Ok(AnimalStatus::Foster));
        assert_eq!(" deceased ".parse::<AnimalStatus>(), Ok(AnimalStatus::Deceased));
        assert!("missing".parse::<AnimalStatus>().is_err());
    }

    #[test]
    fn test_placed_statuses() {
        let placed: Vec<_> = AnimalStatus::ALL.iter().filter(|s| s.is_placed()).collect();
        assert_eq!(placed, vec![&AnimalStatus::Adopted, &AnimalStatus::Foster]);
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&AnimalStatus::Quarantine).unwrap();
        assert_eq!(json, "\"quarantine\"");
    }
}
