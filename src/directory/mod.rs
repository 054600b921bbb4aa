//! Relationship directory: contacts and business entities.
//!
//! The source of truth is an external spreadsheet-backed store reached
//! through the [`DirectoryStore`] trait; this crate never talks to the sheet
//! API directly. [`Directory`] wraps a store with TTL-cached list reads,
//! name resolution, field-level updates with change logging, and the entity
//! trash. Every write path invalidates the affected cache slot before
//! returning, so a follow-up read is never served a stale row.

pub mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::identity::{composite_key, normalize_name, record_key};
use crate::records::{Contact, Entity, FieldChange, InteractionLogEntry, Opportunity};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory store error: {0}")]
    Backend(String),

    #[error("no directory record for {0:?}")]
    NotFound(String),

    #[error("a record named {0:?} already exists")]
    Duplicate(String),
}

// ---------------------------------------------------------------------------
// Storage seam
// ---------------------------------------------------------------------------

/// Row-level operations the external sheet layer must provide.
///
/// Implementations own row location and column mapping; callers address rows
/// by the derived record key. Updates replace the row found under `key` with
/// the supplied record (whose own key may differ after a rename).
pub trait DirectoryStore: Send + Sync {
    fn list_contacts(&self) -> Result<Vec<Contact>, DirectoryError>;
    fn append_contact(&self, contact: &Contact) -> Result<(), DirectoryError>;
    fn update_contact(&self, key: &str, updated: &Contact) -> Result<(), DirectoryError>;
    fn delete_contact(&self, key: &str) -> Result<(), DirectoryError>;

    fn list_entities(&self) -> Result<Vec<Entity>, DirectoryError>;
    fn append_entity(&self, entity: &Entity) -> Result<(), DirectoryError>;
    fn update_entity(&self, key: &str, updated: &Entity) -> Result<(), DirectoryError>;
    /// Move a live entity row to the trash, stamping the deletion metadata.
    fn soft_delete_entity(
        &self,
        key: &str,
        deleted_date: &str,
        deleted_by: &str,
    ) -> Result<Entity, DirectoryError>;
    fn list_deleted_entities(&self) -> Result<Vec<Entity>, DirectoryError>;
    /// Move a trashed row back to the live sheet, clearing deletion metadata.
    fn restore_entity(&self, key: &str) -> Result<Entity, DirectoryError>;
    /// Drop a trashed row permanently.
    fn purge_entity(&self, key: &str) -> Result<(), DirectoryError>;

    fn list_tags(&self) -> Result<Vec<String>, DirectoryError>;

    fn append_interaction(&self, entry: &InteractionLogEntry) -> Result<(), DirectoryError>;
    fn append_change(&self, change: &FieldChange) -> Result<(), DirectoryError>;

    fn list_opportunities(&self) -> Result<Vec<Opportunity>, DirectoryError>;
    fn append_opportunity(&self, opportunity: &Opportunity) -> Result<(), DirectoryError>;
    fn update_opportunity(&self, opportunity: &Opportunity) -> Result<(), DirectoryError>;
    fn delete_opportunity(&self, opp_id: &str) -> Result<(), DirectoryError>;
}

// ---------------------------------------------------------------------------
// Name resolution
// ---------------------------------------------------------------------------

/// Outcome of resolving a user-typed name to a contact row.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum NameResolution {
    /// Keyed match (name, or name+employer).
    Exact { contact: Contact },
    /// Substring matches only; the caller must disambiguate.
    Candidates { candidates: Vec<Contact> },
    NotFound,
}

// ---------------------------------------------------------------------------
// Cached facade
// ---------------------------------------------------------------------------

const SLOT_CONTACTS: &str = "contacts";
const SLOT_ENTITIES: &str = "entities";
const SLOT_DELETED_ENTITIES: &str = "deleted_entities";
const SLOT_TAGS: &str = "tags";

/// Length of the short opportunity id (leading hex of a v4 UUID).
const OPP_ID_LEN: usize = 8;

pub struct Directory {
    store: Arc<dyn DirectoryStore>,
    clock: Clock,
    contacts: TtlCache<Vec<Contact>>,
    entities: TtlCache<Vec<Entity>>,
    tags: TtlCache<Vec<String>>,
}

impl Directory {
    pub fn new(store: Arc<dyn DirectoryStore>, clock: Clock, cache_ttl_secs: i64) -> Self {
        Directory {
            store,
            clock,
            contacts: TtlCache::new(cache_ttl_secs, clock),
            entities: TtlCache::new(cache_ttl_secs, clock),
            tags: TtlCache::new(cache_ttl_secs, clock),
        }
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    // -- cached reads -------------------------------------------------------

    pub fn contacts(&self) -> Result<Vec<Contact>, DirectoryError> {
        if let Some(cached) = self.contacts.get(SLOT_CONTACTS) {
            return Ok(cached);
        }
        let rows = self.store.list_contacts()?;
        self.contacts.put(SLOT_CONTACTS, rows.clone());
        Ok(rows)
    }

    pub fn entities(&self) -> Result<Vec<Entity>, DirectoryError> {
        if let Some(cached) = self.entities.get(SLOT_ENTITIES) {
            return Ok(cached);
        }
        let rows = self.store.list_entities()?;
        self.entities.put(SLOT_ENTITIES, rows.clone());
        Ok(rows)
    }

    pub fn deleted_entities(&self) -> Result<Vec<Entity>, DirectoryError> {
        if let Some(cached) = self.entities.get(SLOT_DELETED_ENTITIES) {
            return Ok(cached);
        }
        let rows = self.store.list_deleted_entities()?;
        self.entities.put(SLOT_DELETED_ENTITIES, rows.clone());
        Ok(rows)
    }

    pub fn tags(&self) -> Result<Vec<String>, DirectoryError> {
        if let Some(cached) = self.tags.get(SLOT_TAGS) {
            return Ok(cached);
        }
        let rows = self.store.list_tags()?;
        self.tags.put(SLOT_TAGS, rows.clone());
        Ok(rows)
    }

    /// Drop every cached slot, forcing the next reads through the store.
    pub fn invalidate_caches(&self) {
        self.contacts.invalidate_all();
        self.entities.invalidate_all();
        self.tags.invalidate_all();
    }

    // -- name resolution ----------------------------------------------------

    pub fn contact_by_key(&self, key: &str) -> Result<Option<Contact>, DirectoryError> {
        Ok(self.contacts()?.into_iter().find(|c| c.key == key))
    }

    /// Resolve a typed name: keyed lookup first, then name+employer when an
    /// employer hint is supplied, then case-insensitive substring search.
    pub fn resolve_contact(
        &self,
        name: &str,
        employer: Option<&str>,
    ) -> Result<NameResolution, DirectoryError> {
        let rows = self.contacts()?;
        let key = record_key(name);
        if let Some(found) = rows.iter().find(|c| c.key == key) {
            return Ok(NameResolution::Exact {
                contact: found.clone(),
            });
        }
        if let Some(employer) = employer {
            let key = composite_key(name, employer);
            if let Some(found) = rows
                .iter()
                .find(|c| composite_key(&c.name, &c.employer) == key)
            {
                return Ok(NameResolution::Exact {
                    contact: found.clone(),
                });
            }
        }
        let needle = normalize_name(name);
        if needle.is_empty() {
            return Ok(NameResolution::NotFound);
        }
        let candidates: Vec<Contact> = rows
            .into_iter()
            .filter(|c| normalize_name(&c.name).contains(&needle))
            .collect();
        Ok(match candidates.len() {
            0 => NameResolution::NotFound,
            1 => NameResolution::Exact {
                contact: candidates.into_iter().next().unwrap_or_default(),
            },
            _ => NameResolution::Candidates { candidates },
        })
    }

    pub fn entity_by_key(&self, key: &str) -> Result<Option<Entity>, DirectoryError> {
        Ok(self.entities()?.into_iter().find(|e| e.key == key))
    }

    /// Exact key match, then unique substring match. Multiple substring hits
    /// resolve to nothing; entity names are expected to be distinctive.
    pub fn find_entity(&self, name: &str) -> Result<Option<Entity>, DirectoryError> {
        let rows = self.entities()?;
        let key = record_key(name);
        if let Some(found) = rows.iter().find(|e| e.key == key) {
            return Ok(Some(found.clone()));
        }
        let needle = normalize_name(name);
        if needle.is_empty() {
            return Ok(None);
        }
        let mut hits = rows
            .into_iter()
            .filter(|e| normalize_name(&e.name).contains(&needle));
        match (hits.next(), hits.next()) {
            (Some(only), None) => Ok(Some(only)),
            _ => Ok(None),
        }
    }

    // -- contact writes -----------------------------------------------------

    /// Append a new contact row. Fills key and timestamps; the caller is
    /// responsible for validating fields first.
    pub fn create_contact(&self, mut contact: Contact) -> Result<Contact, DirectoryError> {
        contact.key = record_key(&contact.name);
        let duplicate = self.contacts()?.iter().any(|c| c.key == contact.key);
        if duplicate {
            return Err(DirectoryError::Duplicate(contact.name));
        }
        contact.created_date = self.clock.today_label();
        contact.last_modified = self.clock.timestamp_label();
        self.store.append_contact(&contact)?;
        self.contacts.invalidate(SLOT_CONTACTS);
        Ok(contact)
    }

    /// Apply a sparse field update to the contact under `key`, logging one
    /// change-log row per field that actually changed. Unknown field names
    /// are ignored.
    pub fn update_contact(
        &self,
        key: &str,
        fields: &BTreeMap<String, String>,
        changed_by: &str,
    ) -> Result<Contact, DirectoryError> {
        let mut updated = self
            .contact_by_key(key)?
            .ok_or_else(|| DirectoryError::NotFound(key.to_string()))?;
        let timestamp = self.clock.timestamp_label();
        let mut changes = Vec::new();
        let mut renamed = false;
        for (field, value) in fields {
            let old = match updated.field(field) {
                Some(old) => old.to_string(),
                None => continue,
            };
            if old == *value {
                continue;
            }
            updated.set_field(field, value);
            if field == "name" {
                renamed = true;
            }
            changes.push(FieldChange {
                timestamp: timestamp.clone(),
                target_name: updated.name.clone(),
                field: field.clone(),
                old_value: old,
                new_value: value.clone(),
                changed_by: changed_by.to_string(),
            });
        }
        if changes.is_empty() {
            return Ok(updated);
        }
        // Only a rename moves the row to a new key; other edits must not
        // disturb namesake rows stored under composite keys.
        if renamed {
            updated.key = record_key(&updated.name);
        }
        updated.last_modified = timestamp;
        self.store.update_contact(key, &updated)?;
        for change in &changes {
            self.store.append_change(change)?;
        }
        self.contacts.invalidate(SLOT_CONTACTS);
        Ok(updated)
    }

    pub fn delete_contact(&self, key: &str) -> Result<(), DirectoryError> {
        self.store.delete_contact(key)?;
        self.contacts.invalidate(SLOT_CONTACTS);
        Ok(())
    }

    /// Append an interaction-log row stamped with the directory clock.
    pub fn log_interaction(
        &self,
        target_name: &str,
        summary: &str,
        logged_by: &str,
    ) -> Result<(), DirectoryError> {
        self.store.append_interaction(&InteractionLogEntry {
            timestamp: self.clock.timestamp_label(),
            target_name: target_name.to_string(),
            summary: summary.to_string(),
            logged_by: logged_by.to_string(),
        })
    }

    // -- entity writes ------------------------------------------------------

    pub fn create_entity(&self, mut entity: Entity) -> Result<Entity, DirectoryError> {
        entity.key = record_key(&entity.name);
        let duplicate = self.entities()?.iter().any(|e| e.key == entity.key);
        if duplicate {
            return Err(DirectoryError::Duplicate(entity.name));
        }
        entity.created_date = self.clock.today_label();
        entity.last_modified = self.clock.timestamp_label();
        self.store.append_entity(&entity)?;
        self.entities.invalidate(SLOT_ENTITIES);
        Ok(entity)
    }

    pub fn update_entity(
        &self,
        key: &str,
        fields: &BTreeMap<String, String>,
        changed_by: &str,
    ) -> Result<Entity, DirectoryError> {
        let mut updated = self
            .entity_by_key(key)?
            .ok_or_else(|| DirectoryError::NotFound(key.to_string()))?;
        let timestamp = self.clock.timestamp_label();
        let mut changes = Vec::new();
        let mut renamed = false;
        for (field, value) in fields {
            let old = match updated.field(field) {
                Some(old) => old.to_string(),
                None => continue,
            };
            if old == *value {
                continue;
            }
            updated.set_field(field, value);
            if field == "name" {
                renamed = true;
            }
            changes.push(FieldChange {
                timestamp: timestamp.clone(),
                target_name: updated.name.clone(),
                field: field.clone(),
                old_value: old,
                new_value: value.clone(),
                changed_by: changed_by.to_string(),
            });
        }
        if changes.is_empty() {
            return Ok(updated);
        }
        if renamed {
            updated.key = record_key(&updated.name);
        }
        updated.last_modified = timestamp;
        self.store.update_entity(key, &updated)?;
        for change in &changes {
            self.store.append_change(change)?;
        }
        self.entities.invalidate(SLOT_ENTITIES);
        Ok(updated)
    }

    /// Move an entity to the trash sheet. Recoverable via [`Self::restore_entity`].
    pub fn soft_delete_entity(
        &self,
        key: &str,
        deleted_by: &str,
    ) -> Result<Entity, DirectoryError> {
        let deleted =
            self.store
                .soft_delete_entity(key, &self.clock.timestamp_label(), deleted_by)?;
        self.entities.invalidate(SLOT_ENTITIES);
        self.entities.invalidate(SLOT_DELETED_ENTITIES);
        Ok(deleted)
    }

    pub fn restore_entity(&self, key: &str) -> Result<Entity, DirectoryError> {
        let restored = self.store.restore_entity(key)?;
        self.entities.invalidate(SLOT_ENTITIES);
        self.entities.invalidate(SLOT_DELETED_ENTITIES);
        Ok(restored)
    }

    pub fn purge_entity(&self, key: &str) -> Result<(), DirectoryError> {
        self.store.purge_entity(key)?;
        self.entities.invalidate(SLOT_DELETED_ENTITIES);
        Ok(())
    }

    // -- opportunities ------------------------------------------------------

    pub fn opportunities_for(&self, entity_key: &str) -> Result<Vec<Opportunity>, DirectoryError> {
        Ok(self
            .store
            .list_opportunities()?
            .into_iter()
            .filter(|o| o.entity_key == entity_key)
            .collect())
    }

    pub fn add_opportunity(
        &self,
        entity_key: &str,
        title: &str,
        details: &str,
    ) -> Result<Opportunity, DirectoryError> {
        let opportunity = Opportunity {
            entity_key: entity_key.to_string(),
            opp_id: uuid::Uuid::new_v4().simple().to_string()[..OPP_ID_LEN].to_string(),
            title: title.to_string(),
            details: details.to_string(),
            created_date: self.clock.today_label(),
        };
        self.store.append_opportunity(&opportunity)?;
        Ok(opportunity)
    }

    pub fn update_opportunity(
        &self,
        opp_id: &str,
        title: &str,
        details: &str,
    ) -> Result<Opportunity, DirectoryError> {
        let mut opportunity = self
            .store
            .list_opportunities()?
            .into_iter()
            .find(|o| o.opp_id == opp_id)
            .ok_or_else(|| DirectoryError::NotFound(opp_id.to_string()))?;
        opportunity.title = title.to_string();
        opportunity.details = details.to_string();
        self.store.update_opportunity(&opportunity)?;
        Ok(opportunity)
    }

    pub fn delete_opportunity(&self, opp_id: &str) -> Result<(), DirectoryError> {
        self.store.delete_opportunity(opp_id)
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;
    use chrono::TimeZone;

    fn fixed_clock() -> Clock {
        let now = chrono::Utc.with_ymd_and_hms(2025, 8, 25, 3, 0, 0).unwrap();
        Clock::fixed(now, chrono_tz::Asia::Seoul)
    }

    fn directory() -> (Arc<MemoryStore>, Directory) {
        let store = Arc::new(MemoryStore::new());
        let directory = Directory::new(store.clone(), fixed_clock(), 300);
        (store, directory)
    }

    fn contact(name: &str, employer: &str) -> Contact {
        Contact {
            name: name.to_string(),
            employer: employer.to_string(),
            contact_priority: "3C-인적 네트워킹".to_string(),
            follow_up_priority: "FU5".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_contacts_read_through_cache() {
        let (store, directory) = directory();
        directory.create_contact(contact("김민준", "네이버")).unwrap();
        assert_eq!(directory.contacts().unwrap().len(), 1);
        assert_eq!(directory.contacts().unwrap().len(), 1);
        // One list for the duplicate check, one for the first cached read.
        assert_eq!(store.contact_list_calls(), 2);
    }

    #[test]
    fn test_create_fills_key_and_timestamps() {
        let (_, directory) = directory();
        let created = directory.create_contact(contact("김민준", "네이버")).unwrap();
        assert_eq!(created.key, record_key("김민준"));
        assert_eq!(created.created_date, "2025-08-25");
        assert_eq!(created.last_modified, "2025-08-25 12:00:00");
    }

    #[test]
    fn test_create_rejects_duplicate_name() {
        let (_, directory) = directory();
        directory.create_contact(contact("김민준", "네이버")).unwrap();
        let err = directory.create_contact(contact("김민준 ", "카카오")).unwrap_err();
        assert!(matches!(err, DirectoryError::Duplicate(_)));
    }

    #[test]
    fn test_resolution_chain() {
        let (_, directory) = directory();
        directory.create_contact(contact("김민준", "네이버")).unwrap();
        directory.create_contact(contact("박민준수", "카카오")).unwrap();

        // Stage 1: keyed match wins even with a substring rival.
        match directory.resolve_contact("김민준", None).unwrap() {
            NameResolution::Exact { contact } => assert_eq!(contact.employer, "네이버"),
            other => panic!("expected exact, got {other:?}"),
        }
        // Stage 3: unique substring.
        match directory.resolve_contact("민준수", None).unwrap() {
            NameResolution::Exact { contact } => assert_eq!(contact.name, "박민준수"),
            other => panic!("expected exact, got {other:?}"),
        }
        // Stage 3: ambiguous substring.
        match directory.resolve_contact("민준", None).unwrap() {
            NameResolution::Candidates { candidates } => assert_eq!(candidates.len(), 2),
            other => panic!("expected candidates, got {other:?}"),
        }
        assert!(matches!(
            directory.resolve_contact("없는사람", None).unwrap(),
            NameResolution::NotFound
        ));
    }

    #[test]
    fn test_resolution_uses_employer_hint() {
        let (store, directory) = directory();
        // Two namesakes, keyed rows seeded directly so the keyed stage misses.
        let mut a = contact("김민준", "네이버");
        a.key = composite_key("김민준", "네이버");
        let mut b = contact("김민준", "카카오");
        b.key = composite_key("김민준", "카카오");
        store.seed_contacts(vec![a, b]);

        match directory.resolve_contact("김민준", Some("카카오")).unwrap() {
            NameResolution::Exact { contact } => assert_eq!(contact.employer, "카카오"),
            other => panic!("expected exact, got {other:?}"),
        }
    }

    #[test]
    fn test_update_logs_only_real_changes() {
        let (store, directory) = directory();
        let created = directory.create_contact(contact("이수진", "토스")).unwrap();

        let mut fields = BTreeMap::new();
        fields.insert("follow_up_priority".to_string(), "FU1".to_string());
        fields.insert("employer".to_string(), "토스".to_string());
        fields.insert("연봉".to_string(), "비밀".to_string());
        let updated = directory
            .update_contact(&created.key, &fields, "AI")
            .unwrap();

        assert_eq!(updated.follow_up_priority, "FU1");
        let changes = store.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "follow_up_priority");
        assert_eq!(changes[0].old_value, "FU5");
        assert_eq!(changes[0].new_value, "FU1");
        assert_eq!(changes[0].changed_by, "AI");
    }

    #[test]
    fn test_update_invalidates_cache() {
        let (_, directory) = directory();
        let created = directory.create_contact(contact("이수진", "토스")).unwrap();
        assert_eq!(directory.contacts().unwrap()[0].follow_up_priority, "FU5");

        let mut fields = BTreeMap::new();
        fields.insert("follow_up_priority".to_string(), "FU3".to_string());
        directory.update_contact(&created.key, &fields, "Auto").unwrap();
        assert_eq!(directory.contacts().unwrap()[0].follow_up_priority, "FU3");
    }

    #[test]
    fn test_rename_rekeys_row() {
        let (_, directory) = directory();
        let created = directory.create_contact(contact("이수진", "토스")).unwrap();
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), "이수진(결혼 후 최수진)".to_string());
        let updated = directory.update_contact(&created.key, &fields, "user").unwrap();
        assert_eq!(updated.key, record_key("이수진(결혼 후 최수진)"));
        assert!(directory.contact_by_key(&created.key).unwrap().is_none());
        assert!(directory.contact_by_key(&updated.key).unwrap().is_some());
    }

    #[test]
    fn test_entity_trash_round_trip() {
        let (_, directory) = directory();
        let entity = Entity {
            name: "한빛출판네트워크".to_string(),
            business_priority: "1-High".to_string(),
            ..Default::default()
        };
        let created = directory.create_entity(entity).unwrap();

        let deleted = directory.soft_delete_entity(&created.key, "user").unwrap();
        assert_eq!(deleted.deleted_by.as_deref(), Some("user"));
        assert!(directory.entities().unwrap().is_empty());
        assert_eq!(directory.deleted_entities().unwrap().len(), 1);

        let restored = directory.restore_entity(&created.key).unwrap();
        assert!(restored.deleted_date.is_none());
        assert_eq!(directory.entities().unwrap().len(), 1);
        assert!(directory.deleted_entities().unwrap().is_empty());
    }

    #[test]
    fn test_purge_is_permanent() {
        let (_, directory) = directory();
        let created = directory
            .create_entity(Entity {
                name: "사라질 모임".to_string(),
                ..Default::default()
            })
            .unwrap();
        directory.soft_delete_entity(&created.key, "user").unwrap();
        directory.purge_entity(&created.key).unwrap();
        assert!(directory.deleted_entities().unwrap().is_empty());
        assert!(matches!(
            directory.restore_entity(&created.key),
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[test]
    fn test_opportunity_lifecycle() {
        let (_, directory) = directory();
        let entity = directory
            .create_entity(Entity {
                name: "서울북클럽".to_string(),
                ..Default::default()
            })
            .unwrap();

        let opp = directory
            .add_opportunity(&entity.key, "공동 독서모임", "10월 시작 논의")
            .unwrap();
        assert_eq!(opp.opp_id.len(), 8);
        assert_eq!(opp.created_date, "2025-08-25");

        let updated = directory
            .update_opportunity(&opp.opp_id, "공동 독서모임", "11월로 연기")
            .unwrap();
        assert_eq!(updated.details, "11월로 연기");

        directory.delete_opportunity(&opp.opp_id).unwrap();
        assert!(directory.opportunities_for(&entity.key).unwrap().is_empty());
    }

    #[test]
    fn test_interaction_log_is_stamped() {
        let (store, directory) = directory();
        directory
            .log_interaction("김민준", "점심 식사, 이직 고민 상담", "AI")
            .unwrap();
        let logs = store.interactions();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].timestamp, "2025-08-25 12:00:00");
        assert_eq!(logs[0].logged_by, "AI");
    }
}
