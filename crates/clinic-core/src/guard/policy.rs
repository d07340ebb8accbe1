//! Deletion outcomes and batch reports.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::db::Table;
use crate::notify::{Notice, Topic};

/// Record kinds the guard can delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Animal,
    Contact,
    Event,
    Invoice,
}

impl EntityKind {
    pub fn table(&self) -> Table {
        match self {
            EntityKind::Animal => Table::Animals,
            EntityKind::Contact => Table::Contacts,
            EntityKind::Event => Table::Events,
            EntityKind::Invoice => Table::Invoices,
        }
    }

    pub fn topic(&self) -> Topic {
        match self {
            EntityKind::Animal => Topic::Animals,
            EntityKind::Contact => Topic::Contacts,
            EntityKind::Event => Topic::Events,
            EntityKind::Invoice => Topic::Invoices,
        }
    }

    pub fn noun(&self, count: usize) -> &'static str {
        match (self, count == 1) {
            (EntityKind::Animal, true) => "animal",
            (EntityKind::Animal, false) => "animals",
            (EntityKind::Contact, true) => "contact",
            (EntityKind::Contact, false) => "contacts",
            (EntityKind::Event, true) => "event",
            (EntityKind::Event, false) => "events",
            (EntityKind::Invoice, true) => "invoice",
            (EntityKind::Invoice, false) => "invoices",
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "animal" | "animals" => Ok(EntityKind::Animal),
            "contact" | "contacts" => Ok(EntityKind::Contact),
            "event" | "events" => Ok(EntityKind::Event),
            "invoice" | "invoices" => Ok(EntityKind::Invoice),
            other => Err(format!("Unknown record kind: {}", other)),
        }
    }
}

/// Result of deleting one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    Blocked { reason: String },
    NotFound,
}

impl DeleteOutcome {
    pub fn notice(&self, kind: EntityKind) -> Notice {
        let noun = kind.noun(1);
        match self {
            DeleteOutcome::Deleted => Notice::success(format!("Deleted {}", noun)),
            DeleteOutcome::Blocked { reason } => {
                Notice::error(format!("Cannot delete {}: {}", noun, reason))
            }
            DeleteOutcome::NotFound => Notice::error(format!("The {} no longer exists", noun)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedItem {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub id: String,
    pub error: String,
}

/// Tally of a batch delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeleteReport {
    pub kind: EntityKind,
    /// Distinct ids requested
    pub requested: usize,
    pub deleted: usize,
    pub blocked: Vec<BlockedItem>,
    pub failed: Vec<FailedItem>,
    /// The bulk delete failed and rows were deleted one at a time.
    pub used_fallback: bool,
}

impl BatchDeleteReport {
    pub fn new(kind: EntityKind, requested: usize) -> Self {
        Self {
            kind,
            requested,
            deleted: 0,
            blocked: Vec::new(),
            failed: Vec::new(),
            used_fallback: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.blocked.is_empty() && self.failed.is_empty()
    }

    /// One notice naming every count.
    pub fn notice(&self) -> Notice {
        let mut message = format!("Deleted {} {}", self.deleted, self.kind.noun(self.deleted));
        if !self.blocked.is_empty() {
            message.push_str(&format!(
                "; {} could not be deleted because of dependent records",
                self.blocked.len()
            ));
        }
        if !self.failed.is_empty() {
            message.push_str(&format!("; {} failed", self.failed.len()));
        }

        if self.is_complete() {
            Notice::success(message)
        } else if self.deleted == 0 {
            Notice::error(message)
        } else {
            Notice::warning(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NoticeLevel;

    #[test]
    fn test_report_notice_levels() {
        let mut report = BatchDeleteReport::new(EntityKind::Animal, 3);
        report.deleted = 3;
        assert_eq!(report.notice(), Notice::success("Deleted 3 animals"));

        report.deleted = 2;
        report.blocked.push(BlockedItem {
            id: "a".into(),
            reason: "Animal has 1 invoice".into(),
        });
        let notice = report.notice();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(
            notice.message,
            "Deleted 2 animals; 1 could not be deleted because of dependent records"
        );

        report.deleted = 0;
        report.failed.push(FailedItem {
            id: "b".into(),
            error: "timeout".into(),
        });
        assert_eq!(report.notice().level, NoticeLevel::Error);
    }

    #[test]
    fn test_single_outcome_notice() {
        let notice = DeleteOutcome::Blocked {
            reason: "Contact owns 1 animal".into(),
        }
        .notice(EntityKind::Contact);
        assert_eq!(notice.message, "Cannot delete contact: Contact owns 1 animal");
        assert_eq!(DeleteOutcome::Deleted.notice(EntityKind::Invoice).message, "Deleted invoice");
    }
}
