//! Sheet-shaped directory records.
//!
//! The directory's source of truth is a spreadsheet, so every field is a raw
//! string and an empty string means "cell not filled in". Typed views over
//! the categorical cells live in [`crate::tiers`]; `score` is a transient
//! annotation written by the scorer, never stored.

use serde::{Deserialize, Serialize};

/// One row of the contact sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Stable lookup key derived from the normalized name. See [`crate::identity`].
    pub key: String,
    pub name: String,
    pub contact_priority: String,
    pub employer: String,
    pub title: String,
    pub follow_up_priority: String,
    pub follow_up_date: String,
    pub follow_up_note: String,
    pub last_contact: String,
    pub key_value_interest: String,
    pub tag: String,
    pub referred_by: String,
    pub email: String,
    pub phone: String,
    pub last_modified: String,
    pub created_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// One row of the business-entity sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub key: String,
    pub name: String,
    pub business_priority: String,
    pub follow_up_priority: String,
    pub follow_up_date: String,
    pub follow_up_note: String,
    pub last_contact: String,
    pub interaction_context: String,
    pub tag: String,
    pub related_individuals: String,
    pub referred_by: String,
    pub last_modified: String,
    pub created_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Set only on rows listed from the trash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

/// An opportunity attached to a business entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub entity_key: String,
    /// Short random id, 8 hex chars.
    pub opp_id: String,
    pub title: String,
    pub details: String,
    pub created_date: String,
}

/// A row of the interaction log (free-form "what happened" entries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionLogEntry {
    pub timestamp: String,
    pub target_name: String,
    pub summary: String,
    pub logged_by: String,
}

/// A row of the change log (one field edit per row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub timestamp: String,
    pub target_name: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub changed_by: String,
}

impl Contact {
    /// Fields an update is allowed to touch, in sheet column order.
    pub const UPDATABLE_FIELDS: [&'static str; 13] = [
        "name",
        "contact_priority",
        "employer",
        "title",
        "follow_up_priority",
        "follow_up_date",
        "follow_up_note",
        "last_contact",
        "key_value_interest",
        "tag",
        "referred_by",
        "email",
        "phone",
    ];

    /// Read one updatable field by its snake_case name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "contact_priority" => Some(&self.contact_priority),
            "employer" => Some(&self.employer),
            "title" => Some(&self.title),
            "follow_up_priority" => Some(&self.follow_up_priority),
            "follow_up_date" => Some(&self.follow_up_date),
            "follow_up_note" => Some(&self.follow_up_note),
            "last_contact" => Some(&self.last_contact),
            "key_value_interest" => Some(&self.key_value_interest),
            "tag" => Some(&self.tag),
            "referred_by" => Some(&self.referred_by),
            "email" => Some(&self.email),
            "phone" => Some(&self.phone),
            _ => None,
        }
    }

    /// Write one updatable field by its snake_case name. Unknown names are
    /// ignored so a stale agent payload cannot fail an otherwise-good update.
    pub fn set_field(&mut self, name: &str, value: &str) -> bool {
        let slot = match name {
            "name" => &mut self.name,
            "contact_priority" => &mut self.contact_priority,
            "employer" => &mut self.employer,
            "title" => &mut self.title,
            "follow_up_priority" => &mut self.follow_up_priority,
            "follow_up_date" => &mut self.follow_up_date,
            "follow_up_note" => &mut self.follow_up_note,
            "last_contact" => &mut self.last_contact,
            "key_value_interest" => &mut self.key_value_interest,
            "tag" => &mut self.tag,
            "referred_by" => &mut self.referred_by,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            _ => return false,
        };
        *slot = value.to_string();
        true
    }
}

impl Entity {
    pub const UPDATABLE_FIELDS: [&'static str; 10] = [
        "name",
        "business_priority",
        "follow_up_priority",
        "follow_up_date",
        "follow_up_note",
        "last_contact",
        "interaction_context",
        "tag",
        "related_individuals",
        "referred_by",
    ];

    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "business_priority" => Some(&self.business_priority),
            "follow_up_priority" => Some(&self.follow_up_priority),
            "follow_up_date" => Some(&self.follow_up_date),
            "follow_up_note" => Some(&self.follow_up_note),
            "last_contact" => Some(&self.last_contact),
            "interaction_context" => Some(&self.interaction_context),
            "tag" => Some(&self.tag),
            "related_individuals" => Some(&self.related_individuals),
            "referred_by" => Some(&self.referred_by),
            _ => None,
        }
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> bool {
        let slot = match name {
            "name" => &mut self.name,
            "business_priority" => &mut self.business_priority,
            "follow_up_priority" => &mut self.follow_up_priority,
            "follow_up_date" => &mut self.follow_up_date,
            "follow_up_note" => &mut self.follow_up_note,
            "last_contact" => &mut self.last_contact,
            "interaction_context" => &mut self.interaction_context,
            "tag" => &mut self.tag,
            "related_individuals" => &mut self.related_individuals,
            "referred_by" => &mut self.referred_by,
            _ => return false,
        };
        *slot = value.to_string();
        true
    }
}
