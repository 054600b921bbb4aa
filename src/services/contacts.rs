// Contact listings and validated writes, plus the follow-up escalation sweep.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::directory::{Directory, DirectoryError, NameResolution};
use crate::records::Contact;
use crate::scoring::{self, Escalation};
use crate::validation;

/// Editor name stamped on change-log rows written by the escalation sweep.
pub const AUTO_EDITOR: &str = "Auto";

#[derive(Debug, Error)]
pub enum ContactsError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// One message per rejected field. Nothing was written.
    #[error("invalid fields: {}", .0.join("; "))]
    Rejected(Vec<String>),
}

/// Outcome of one follow-up escalation sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationReport {
    pub scanned: usize,
    pub escalations: Vec<Escalation>,
    pub swept_at: String,
}

/// All contacts ranked by relationship score, highest first.
///
/// Today is read from the clock once, so every row in a listing is scored
/// against the same date even when the call straddles midnight.
pub fn ranked_contacts(directory: &Directory) -> Result<Vec<Contact>, DirectoryError> {
    let mut rows = directory.contacts()?;
    let today = directory.clock().today();
    scoring::rank_contacts(&mut rows, today);
    Ok(rows)
}

/// Validate and append a new contact row.
pub fn create_contact(directory: &Directory, contact: Contact) -> Result<Contact, ContactsError> {
    let tags = directory.tags()?;
    let problems = validation::validate_contact(&contact, &tags);
    if !problems.is_empty() {
        return Err(ContactsError::Rejected(problems));
    }
    let created = directory.create_contact(contact)?;
    log::info!("Created contact {}", created.name);
    Ok(created)
}

/// Validate a sparse field update, then apply it under the editor's name.
pub fn update_contact(
    directory: &Directory,
    key: &str,
    fields: &BTreeMap<String, String>,
    changed_by: &str,
) -> Result<Contact, ContactsError> {
    let tags = directory.tags()?;
    let problems = validation::validate_update_fields(fields, &tags);
    if !problems.is_empty() {
        return Err(ContactsError::Rejected(problems));
    }
    Ok(directory.update_contact(key, fields, changed_by)?)
}

/// Resolve a typed name to a contact row, with an optional employer hint
/// for namesakes.
pub fn find_contact(
    directory: &Directory,
    name: &str,
    employer: Option<&str>,
) -> Result<NameResolution, DirectoryError> {
    directory.resolve_contact(name, employer)
}

pub fn delete_contact(directory: &Directory, key: &str) -> Result<(), DirectoryError> {
    directory.delete_contact(key)?;
    log::info!("Deleted contact {key}");
    Ok(())
}

/// Bump the follow-up tier of every contact sitting more than a week past
/// its follow-up date. Each bump is persisted as an ordinary field update,
/// so the change log keeps the old and new tier under [`AUTO_EDITOR`].
pub fn escalate_followups(directory: &Directory) -> Result<EscalationReport, DirectoryError> {
    let mut rows = directory.contacts()?;
    let today = directory.clock().today();
    let escalations = scoring::escalate_overdue_contacts(&mut rows, today);
    for escalation in &escalations {
        let mut fields = BTreeMap::new();
        fields.insert(
            "follow_up_priority".to_string(),
            escalation.to.label().to_string(),
        );
        directory.update_contact(&escalation.key, &fields, AUTO_EDITOR)?;
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
