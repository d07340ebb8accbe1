//! Contact models.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::AnimalStatus;

/// Role tags deciding which selection contexts a contact appears in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ContactRole {
    Owner,
    Foster,
    Veterinarian,
}

impl ContactRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactRole::Owner => "owner",
            ContactRole::Foster => "foster",
            ContactRole::Veterinarian => "veterinarian",
        }
    }

    /// Role a contact needs to take an animal entering `status`.
    pub fn for_placement(status: AnimalStatus) -> Option<Self> {
        match status {
            AnimalStatus::Adopted => Some(ContactRole::Owner),
            AnimalStatus::Foster => Some(ContactRole::Foster),
            _ => None,
        }
    }
}

impl FromStr for ContactRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(ContactRole::Owner),
            "foster" => Ok(ContactRole::Foster),
            "veterinarian" | "vet" => Ok(ContactRole::Veterinarian),
            other => Err(format!("Unknown contact role: {}", other)),
        }
    }
}

/// A person the clinic works with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub roles: Vec<ContactRole>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Contact {
    pub fn new(first_name: String, last_name: String, roles: Vec<ContactRole>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let mut roles = roles;
        roles.sort();
        roles.dedup();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email: None,
            phone: None,
            address: None,
            roles,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn has_role(&self, role: ContactRole) -> bool {
        self.roles.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_deduplicated() {
        let contact = Contact::new(
            "Ada".into(),
            "Moss".into(),
            vec![ContactRole::Foster, ContactRole::Owner, ContactRole::Foster],
        );
        assert_eq!(contact.roles, vec![ContactRole::Owner, ContactRole::Foster]);
        assert!(contact.has_role(ContactRole::Foster));
        assert!(!contact.has_role(ContactRole::Veterinarian));
    }

    #[test]
    fn test_full_name() {
        let contact = Contact::new("Ada".into(), "".into(), vec![]);
        assert_eq!(contact.full_name(), "Ada");
    }

    #[test]
    fn test_placement_role() {
        assert_eq!(
            ContactRole::for_placement(AnimalStatus::Adopted),
            Some(ContactRole::Owner)
        );
        assert_eq!(
            ContactRole::for_placement(AnimalStatus::Foster),
            Some(ContactRole::Foster)
        );
        assert_eq!(ContactRole::for_placement(AnimalStatus::Treatment), None);
    }
}
