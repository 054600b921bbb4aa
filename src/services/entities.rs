// Entity listings and writes, the trash lifecycle, opportunities, and the
// contact suggestions behind an entity page.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::directory::{Directory, DirectoryError};
use crate::matching::{self, ContactSuggestion};
use crate::records::{Entity, Opportunity};
use crate::scoring;
use crate::services::contacts::{EscalationReport, AUTO_EDITOR};
use crate::validation;

#[derive(Debug, Error)]
pub enum EntitiesError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// One message per rejected field. Nothing was written.
    #[error("invalid fields: {}", .0.join("; "))]
    Rejected(Vec<String>),
}

/// All live entities ranked by relationship score, highest first.
pub fn ranked_entities(directory: &Directory) -> Result<Vec<Entity>, DirectoryError> {
    let mut rows = directory.entities()?;
    let today = directory.clock().today();
    scoring::rank_entities(&mut rows, today);
    Ok(rows)
}

/// Validate and append a new entity row.
pub fn create_entity(directory: &Directory, entity: Entity) -> Result<Entity, EntitiesError> {
    let tags = directory.tags()?;
    let problems = validation::validate_entity(&entity, &tags);
    if !problems.is_empty() {
        return Err(EntitiesError::Rejected(problems));
    }
    let created = directory.create_entity(entity)?;
    log::info!("Created entity {}", created.name);
    Ok(created)
}

/// Validate a sparse field update, then apply it under the editor's name.
pub fn update_entity(
    directory: &Directory,
    key: &str,
    fields: &BTreeMap<String, String>,
    changed_by: &str,
) -> Result<Entity, EntitiesError> {
    let tags = directory.tags()?;
    let problems = validation::validate_update_fields(fields, &tags);
    if !problems.is_empty() {
        return Err(EntitiesError::Rejected(problems));
    }
    Ok(directory.update_entity(key, fields, changed_by)?)
}

/// Exact key match, then unique substring match.
pub fn find_entity(directory: &Directory, name: &str) -> Result<Option<Entity>, DirectoryError> {
    directory.find_entity(name)
}

/// Move an entity to the trash. Recoverable until purged.
pub fn delete_entity(
    directory: &Directory,
    key: &str,
    deleted_by: &str,
) -> Result<Entity, DirectoryError> {
    let deleted = directory.soft_delete_entity(key, deleted_by)?;
    log::info!("Moved entity {} to trash", deleted.name);
    Ok(deleted)
}

pub fn restore_entity(directory: &Directory, key: &str) -> Result<Entity, DirectoryError> {
    let restored = directory.restore_entity(key)?;
    log::info!("Restored entity {}", restored.name);
    Ok(restored)
}

pub fn purge_entity(directory: &Directory, key: &str) -> Result<(), DirectoryError> {
    directory.purge_entity(key)?;
    log::info!("Purged entity {key}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Opportunities
// ---------------------------------------------------------------------------

pub fn opportunities(
    directory: &Directory,
    entity_key: &str,
) -> Result<Vec<Opportunity>, DirectoryError> {
    directory.opportunities_for(entity_key)
}

/// Attach an opportunity to an entity. The entity must exist; opportunities
/// must never dangle on a key with no row behind it.
pub fn add_opportunity(
    directory: &Directory,
    entity_key: &str,
    title: &str,
    details: &str,
) -> Result<Opportunity, DirectoryError> {
    if directory.entity_by_key(entity_key)?.is_none() {
        return Err(DirectoryError::NotFound(entity_key.to_string()));
    }
    directory.add_opportunity(entity_key, title, details)
}

pub fn update_opportunity(
    directory: &Directory,
    opp_id: &str,
    title: &str,
    details: &str,
) -> Result<Opportunity, DirectoryError> {
    directory.update_opportunity(opp_id, title, details)
}

pub fn delete_opportunity(directory: &Directory, opp_id: &str) -> Result<(), DirectoryError> {
    directory.delete_opportunity(opp_id)
}

// ---------------------------------------------------------------------------
// Suggestions and the sweep
// ---------------------------------------------------------------------------

/// Contacts ranked against one entity, strongest signal first.
pub fn suggested_contacts(
    directory: &Directory,
    entity_key: &str,
) -> Result<Vec<ContactSuggestion>, DirectoryError> {
    let entity = directory
        .entity_by_key(entity_key)?
        .ok_or_else(|| DirectoryError::NotFound(entity_key.to_string()))?;
    let contacts = directory.contacts()?;
    Ok(matching::suggest_contacts(&entity, &contacts))
}

/// Entity twin of [`crate::services::contacts::escalate_followups`].
pub fn escalate_followups(directory: &Directory) -> Result<EscalationReport, DirectoryError> {
    let mut rows = directory.entities()?;
    let today = directory.clock().today();
    let escalations = scoring::escalate_overdue_entities(&mut rows, today);
    for escalation in &escalations {
        let mut fields = BTreeMap::new();
        fields.insert(
            "follow_up_priority".to_string(),
            escalation.to.label().to_string(),
        );
        directory.update_entity(&escalation.key, &fields, AUTO_EDITOR)?;
        log::info!(
            "Escalated {} {} -> {}",
            escalation.name,
            escalation.from.label(),
            escalation.to.label()
        );
    }
    Ok(EscalationReport {
        scanned: rows.len(),
        escalations,
        swept_at: directory.clock().timestamp_label(),
    })
}
