//! Suggested contacts for a business entity.
//!
//! Ranks the contact sheet against one entity using three signals, strongest
//! first: employer affiliation, shared tags, and name containment. Contacts
//! already listed in the entity's related-individuals cell are still
//! returned (flagged) so the caller can render them as linked rather than
//! re-suggest them.

use serde::Serialize;

use crate::identity::normalize_name;
use crate::records::{Contact, Entity};

/// A near-miss employer spelling still counts as an affiliation.
const FUZZY_EMPLOYER_THRESHOLD: f64 = 0.85;

pub const RANK_EMPLOYER: u8 = 1;
pub const RANK_TAG: u8 = 2;
pub const RANK_NAME: u8 = 3;

/// One ranked suggestion. Lower rank is a stronger signal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSuggestion {
    pub contact: Contact,
    pub rank: u8,
    pub reason: String,
    pub already_related: bool,
}

/// Rank every contact against the entity, strongest signal first. Contacts
/// with no signal are omitted. Ordering is rank ascending, input order on
/// ties.
pub fn suggest_contacts(entity: &Entity, contacts: &[Contact]) -> Vec<ContactSuggestion> {
    let entity_name = normalize_name(&entity.name);
    if entity_name.is_empty() {
        return Vec::new();
    }
    let entity_tags = tag_tokens(&entity.tag);
    let related = related_names(&entity.related_individuals);

    let mut suggestions: Vec<ContactSuggestion> = Vec::new();
    for contact in contacts {
        let Some((rank, reason)) = match_contact(contact, &entity_name, &entity_tags) else {
            continue;
        };
        let already_related = related.contains(&normalize_name(&contact.name));
        suggestions.push(ContactSuggestion {
            contact: contact.clone(),
            rank,
            reason,
            already_related,
        });
    }
    suggestions.sort_by_key(|s| s.rank);
    suggestions
}

fn match_contact(
    contact: &Contact,
    entity_name: &str,
    entity_tags: &[String],
) -> Option<(u8, String)> {
    let employer = normalize_name(&contact.employer);
    if !employer.is_empty() && employer_affiliated(&employer, entity_name) {
        return Some((RANK_EMPLOYER, format!("직장 연관: {}", contact.employer)));
    }

    let shared = tag_tokens(&contact.tag)
        .into_iter()
        .find(|t| entity_tags.contains(t));
    if let Some(tag) = shared {
        return Some((RANK_TAG, format!("태그 일치: {tag}")));
    }

    let name = normalize_name(&contact.name);
    if !name.is_empty() && (name.contains(entity_name) || entity_name.contains(&name)) {
        return Some((RANK_NAME, "이름 연관".to_string()));
    }
    None
}

fn employer_affiliated(employer: &str, entity_name: &str) -> bool {
    employer.contains(entity_name)
        || entity_name.contains(employer)
        || strsim::jaro_winkler(employer, entity_name) >= FUZZY_EMPLOYER_THRESHOLD
}

fn tag_tokens(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(|t| normalize_name(t))
        .filter(|t| !t.is_empty())
        .collect()
}

fn related_names(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(normalize_name)
        .filter(|n| !n.is_empty())
        .collect()
}
