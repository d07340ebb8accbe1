//! Collection loaders with a minimum perceived loading time.

use std::thread;
use std::time::{Duration, Instant};

use super::rows::{
    animal_rows, contact_rows, event_rows, invoice_rows, AnimalRow, ContactRow, EventRow,
    InvoiceRow,
};
use crate::db::{ClinicStore, DbResult};

pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(800);

/// Fetches collections plus their related entities once per load and joins
/// them into display rows.
#[derive(Debug, Clone, Copy)]
pub struct TableLoader {
    min_delay: Duration,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DELAY)
    }
}

impl TableLoader {
    pub fn new(min_delay: Duration) -> Self {
        Self { min_delay }
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Run `fetch`, then wait out the rest of the minimum delay. Errors are
    /// delayed too so the loading indicator never flickers.
    pub fn timed<T, E>(&self, what: &str, fetch: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let started = Instant::now();
        let result = fetch();
        let elapsed = started.elapsed();
        if elapsed < self.min_delay {
            thread::sleep(self.min_delay - elapsed);
        }
        tracing::debug!(table = what, fetch_ms = elapsed.as_millis() as u64, ok = result.is_ok(), "table loaded");
        result
    }

    pub fn invoices<S: ClinicStore + ?Sized>(&self, store: &S) -> DbResult<Vec<InvoiceRow>> {
        self.timed("invoices", || load_invoices(store))
    }

    pub fn animals<S: ClinicStore + ?Sized>(&self, store: &S) -> DbResult<Vec<AnimalRow>> {
        self.timed("animals", || load_animals(store))
    }

    pub fn contacts<S: ClinicStore + ?Sized>(&self, store: &S) -> DbResult<Vec<ContactRow>> {
        self.timed("contacts", || load_contacts(store))
    }

    pub fn events<S: ClinicStore + ?Sized>(&self, store: &S) -> DbResult<Vec<EventRow>> {
        self.timed("events", || load_events(store))
    }
}

// Undelayed fetch-and-join. Callers sharing a locked store should fetch with
// these inside `timed` and release the lock before the delay runs.

pub fn load_invoices<S: ClinicStore + ?Sized>(store: &S) -> DbResult<Vec<InvoiceRow>> {
    let invoices = store.list_invoices()?;
    let animals = store.list_animals()?;
    let contacts = store.list_contacts()?;
    Ok(invoice_rows(&invoices, &animals, &contacts))
}

pub fn load_animals<S: ClinicStore + ?Sized>(store: &S) -> DbResult<Vec<AnimalRow>> {
    let animals = store.list_animals()?;
    let contacts = store.list_contacts()?;
    Ok(animal_rows(&animals, &contacts))
}

pub fn load_contacts<S: ClinicStore + ?Sized>(store: &S) -> DbResult<Vec<ContactRow>> {
    Ok(contact_rows(&store.list_contacts()?))
}

pub fn load_events<S: ClinicStore + ?Sized>(store: &S) -> DbResult<Vec<EventRow>> {
    let events = store.list_events()?;
    let animals = store.list_animals()?;
    Ok(event_rows(&events, &animals))
}
