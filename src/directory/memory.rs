//! In-memory [`DirectoryStore`] used by tests and local demo seeding.
//!
//! Keeps the same row semantics as the sheet layer: append/replace/delete by
//! key, a separate trash list for entities, and append-only logs. Also
//! counts list calls so cache tests can observe read-through behavior.

use std::sync::{Mutex, MutexGuard};

use super::{DirectoryError, DirectoryStore};
use crate::records::{Contact, Entity, FieldChange, InteractionLogEntry, Opportunity};

#[derive(Default)]
struct Inner {
    contacts: Vec<Contact>,
    entities: Vec<Entity>,
    deleted_entities: Vec<Entity>,
    tags: Vec<String>,
    interactions: Vec<InteractionLogEntry>,
    changes: Vec<FieldChange>,
    opportunities: Vec<Opportunity>,
    contact_list_calls: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_tags(tags: Vec<String>) -> Self {
        let store = MemoryStore::new();
        if let Ok(mut inner) = store.inner.lock() {
            inner.tags = tags;
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, DirectoryError> {
        self.inner
            .lock()
            .map_err(|_| DirectoryError::Backend("memory store lock poisoned".to_string()))
    }

    /// Seed rows directly, bypassing key derivation and timestamps.
    pub fn seed_contacts(&self, contacts: Vec<Contact>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.contacts.extend(contacts);
        }
    }

    pub fn seed_entities(&self, entities: Vec<Entity>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entities.extend(entities);
        }
    }

    pub fn contact_list_calls(&self) -> usize {
        self.inner.lock().map(|i| i.contact_list_calls).unwrap_or(0)
    }

    pub fn interactions(&self) -> Vec<InteractionLogEntry> {
        self.inner
            .lock()
            .map(|i| i.interactions.clone())
            .unwrap_or_default()
    }

    pub fn changes(&self) -> Vec<FieldChange> {
        self.inner
            .lock()
            .map(|i| i.changes.clone())
            .unwrap_or_default()
    }
}

impl DirectoryStore for MemoryStore {
    fn list_contacts(&self) -> Result<Vec<Contact>, DirectoryError> {
        let mut inner = self.lock()?;
        inner.contact_list_calls += 1;
        Ok(inner.contacts.clone())
    }

    fn append_contact(&self, contact: &Contact) -> Result<(), DirectoryError> {
        let mut inner = self.lock()?;
        if inner.contacts.iter().any(|c| c.key == contact.key) {
            return Err(DirectoryError::Duplicate(contact.name.clone()));
        }
        inner.contacts.push(contact.clone());
        Ok(())
    }

    fn update_contact(&self, key: &str, updated: &Contact) -> Result<(), DirectoryError> {
        let mut inner = self.lock()?;
        match inner.contacts.iter_mut().find(|c| c.key == key) {
            Some(row) => {
                *row = updated.clone();
                Ok(())
            }
            None => Err(DirectoryError::NotFound(key.to_string())),
        }
    }

    fn delete_contact(&self, key: &str) -> Result<(), DirectoryError> {
        let mut inner = self.lock()?;
        let before = inner.contacts.len();
        inner.contacts.retain(|c| c.key != key);
        if inner.contacts.len() == before {
            return Err(DirectoryError::NotFound(key.to_string()));
        }
        Ok(())
    }

    fn list_entities(&self) -> Result<Vec<Entity>, DirectoryError> {
        Ok(self.lock()?.entities.clone())
    }

    fn append_entity(&self, entity: &Entity) -> Result<(), DirectoryError> {
        let mut inner = self.lock()?;
        if inner.entities.iter().any(|e| e.key == entity.key) {
            return Err(DirectoryError::Duplicate(entity.name.clone()));
        }
        inner.entities.push(entity.clone());
        Ok(())
    }

    fn update_entity(&self, key: &str, updated: &Entity) -> Result<(), DirectoryError> {
        let mut inner = self.lock()?;
        match inner.entities.iter_mut().find(|e| e.key == key) {
            Some(row) => {
                *row = updated.clone();
                Ok(())
            }
            None => Err(DirectoryError::NotFound(key.to_string())),
        }
    }

    fn soft_delete_entity(
        &self,
        key: &str,
        deleted_date: &str,
        deleted_by: &str,
    ) -> Result<Entity, DirectoryError> {
        let mut inner = self.lock()?;
        let position = inner
            .entities
            .iter()
            .position(|e| e.key == key)
            .ok_or_else(|| DirectoryError::NotFound(key.to_string()))?;
        let mut entity = inner.entities.remove(position);
        entity.deleted_date = Some(deleted_date.to_string());
        entity.deleted_by = Some(deleted_by.to_string());
        inner.deleted_entities.push(entity.clone());
        Ok(entity)
    }

    fn list_deleted_entities(&self) -> Result<Vec<Entity>, DirectoryError> {
        Ok(self.lock()?.deleted_entities.clone())
    }

    fn restore_entity(&self, key: &str) -> Result<Entity, DirectoryError> {
        let mut inner = self.lock()?;
        let position = inner
            .deleted_entities
            .iter()
            .position(|e| e.key == key)
            .ok_or_else(|| DirectoryError::NotFound(key.to_string()))?;
        let mut entity = inner.deleted_entities.remove(position);
        entity.deleted_date = None;
        entity.deleted_by = None;
        inner.entities.push(entity.clone());
        Ok(entity)
    }

    fn purge_entity(&self, key: &str) -> Result<(), DirectoryError> {
        let mut inner = self.lock()?;
        let before = inner.deleted_entities.len();
        inner.deleted_entities.retain(|e| e.key != key);
        if inner.deleted_entities.len() == before {
            return Err(DirectoryError::NotFound(key.to_string()));
        }
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<String>, DirectoryError> {
        Ok(self.lock()?.tags.clone())
    }

    fn append_interaction(&self, entry: &InteractionLogEntry) -> Result<(), DirectoryError> {
        self.lock()?.interactions.push(entry.clone());
        Ok(())
    }

    fn append_change(&self, change: &FieldChange) -> Result<(), DirectoryError> {
        self.lock()?.changes.push(change.clone());
        Ok(())
    }

    fn list_opportunities(&self) -> Result<Vec<Opportunity>, DirectoryError> {
        Ok(self.lock()?.opportunities.clone())
    }

    fn append_opportunity(&self, opportunity: &Opportunity) -> Result<(), DirectoryError> {
        self.lock()?.opportunities.push(opportunity.clone());
        Ok(())
    }

    fn update_opportunity(&self, opportunity: &Opportunity) -> Result<(), DirectoryError> {
        let mut inner = self.lock()?;
        match inner
            .opportunities
            .iter_mut()
            .find(|o| o.opp_id == opportunity.opp_id)
        {
            Some(row) => {
                *row = opportunity.clone();
                Ok(())
            }
            None => Err(DirectoryError::NotFound(opportunity.opp_id.clone())),
        }
    }

    fn delete_opportunity(&self, opp_id: &str) -> Result<(), DirectoryError> {
        let mut inner = self.lock()?;
        let before = inner.opportunities.len();
        inner.opportunities.retain(|o| o.opp_id != opp_id);
        if inner.opportunities.len() == before {
            return Err(DirectoryError::NotFound(opp_id.to_string()));
        }
        Ok(())
    }
}
