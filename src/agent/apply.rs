//! Action application with confidence gating.
//!
//! The model only proposes; this module decides. Low-confidence proposals
//! and every delete come back as `NeedsConfirmation` without touching the
//! store. High-confidence updates and adds are validated against the same
//! rules as manual edits, resolved through the directory, and written with
//! `changed_by = "AI"` so the change log records who edited what.

use crate::agent::actions::{ActionKind, AgentAction, Confidence};
use crate::agent::prompts::display_name;
use crate::directory::{Directory, DirectoryError, NameResolution};
use crate::records::Contact;
use crate::validation;

use serde::Serialize;

/// Who the change log credits for agent-driven edits.
pub const AGENT_EDITOR: &str = "AI";

/// Result of applying one action. Serialized to the chat client so it can
/// render confirmations, disambiguation pickers, and search results.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ActionOutcome {
    /// The write went through.
    Applied { name: String, detail: String },
    /// Nothing was written; the user must confirm first.
    NeedsConfirmation { name: String, reason: String },
    /// Several contacts match; the user must pick one of `candidates`.
    NeedsDisambiguation {
        name: String,
        candidates: Vec<String>,
    },
    NotFound { name: String },
    /// Field validation failed; nothing was written.
    Rejected { name: String, problems: Vec<String> },
    SearchResults {
        name: String,
        matches: Vec<Contact>,
    },
    Failed { name: String, error: String },
}

/// Apply one parsed action against the directory.
pub fn apply_action(directory: &Directory, action: &AgentAction) -> ActionOutcome {
    let name = action.name.trim().to_string();
    let Some(kind) = action.kind() else {
        return ActionOutcome::Failed {
            name,
            error: format!("지원하지 않는 액션입니다: {}", action.action),
        };
    };
    match kind {
        ActionKind::Search => search(directory, name),
        // Deletes never auto-execute, whatever the stated confidence.
        ActionKind::DeleteContact => ActionOutcome::NeedsConfirmation {
            name,
            reason: "삭제는 사용자 확인 후에만 실행됩니다.".to_string(),
        },
        _ if action.confidence == Confidence::Low => ActionOutcome::NeedsConfirmation {
            name,
            reason: "확신도가 낮은 제안입니다. 확인이 필요합니다.".to_string(),
        },
        ActionKind::UpdateContact => update_contact(directory, name, action),
        ActionKind::AddContact => add_contact(directory, name, action),
    }
}

fn search(directory: &Directory, name: String) -> ActionOutcome {
    let (base, employer) = split_display_name(&name);
    match directory.resolve_contact(base, employer) {
        Ok(NameResolution::Exact { contact }) => ActionOutcome::SearchResults {
            name,
            matches: vec![contact],
        },
        Ok(NameResolution::Candidates { candidates }) => ActionOutcome::SearchResults {
            name,
            matches: candidates,
        },
        Ok(NameResolution::NotFound) => ActionOutcome::SearchResults {
            name,
            matches: Vec::new(),
        },
        Err(err) => failed(name, err),
    }
}

fn update_contact(directory: &Directory, name: String, action: &AgentAction) -> ActionOutcome {
    let fields = merged_fields(action);
    let tags = match directory.tags() {
        Ok(tags) => tags,
        Err(err) => return failed(name, err),
    };
    let problems = validation::validate_update_fields(&fields, &tags);
    if !problems.is_empty() {
        return ActionOutcome::Rejected { name, problems };
    }

    let (base, employer) = split_display_name(&name);
    let contact = match directory.resolve_contact(base, employer) {
        Ok(NameResolution::Exact { contact }) => contact,
        Ok(NameResolution::Candidates { candidates }) => {
            return ActionOutcome::NeedsDisambiguation {
                name,
                candidates: candidates.iter().map(display_name).collect(),
            }
        }
        Ok(NameResolution::NotFound) => return ActionOutcome::NotFound { name },
        Err(err) => return failed(name, err),
    };

    let updated = match directory.update_contact(&contact.key, &fields, AGENT_EDITOR) {
        Ok(updated) => updated,
        Err(err) => return failed(name, err),
    };
    match append_interaction(directory, &updated.name, action) {
        Ok(logged) => ActionOutcome::Applied {
            name,
            detail: if logged {
                "연락처를 업데이트하고 상호작용을 기록했습니다.".to_string()
            } else {
                "연락처를 업데이트했습니다.".to_string()
            },
        },
        Err(err) => failed(name, err),
    }
}

fn add_contact(directory: &Directory, name: String, action: &AgentAction) -> ActionOutcome {
    let fields = merged_fields(action);
    let tags = match directory.tags() {
        Ok(tags) => tags,
        Err(err) => return failed(name, err),
    };

    let (base, employer) = split_display_name(&name);
    let mut contact = Contact {
        name: base.to_string(),
        employer: employer.unwrap_or("").to_string(),
        ..Default::default()
    };
    for (field, value) in &fields {
        contact.set_field(field, value);
    }

    let problems = validation::validate_contact(&contact, &tags);
    if !problems.is_empty() {
        return ActionOutcome::Rejected { name, problems };
    }
    let created = match directory.create_contact(contact) {
        Ok(created) => created,
        Err(err) => return failed(name, err),
    };
    match append_interaction(directory, &created.name, action) {
        Ok(_) => ActionOutcome::Applied {
            name,
            detail: "연락처를 추가했습니다.".to_string(),
        },
        Err(err) => failed(name, err),
    }
}

/// Action fields plus the detected-interest fallback: a `key_value_extract`
/// only lands in `key_value_interest` when the model did not already set
/// that field explicitly.
fn merged_fields(action: &AgentAction) -> std::collections::BTreeMap<String, String> {
    let mut fields = action.string_fields();
    if let Some(extract) = action.key_value_extract.as_deref() {
        let extract = extract.trim();
        if !extract.is_empty() {
            fields
                .entry("key_value_interest".to_string())
                .or_insert_with(|| extract.to_string());
        }
    }
    fields
}

fn append_interaction(
    directory: &Directory,
    target_name: &str,
    action: &AgentAction,
) -> Result<bool, DirectoryError> {
    match action.interaction_log.as_deref().map(str::trim) {
        Some(summary) if !summary.is_empty() => {
            directory.log_interaction(target_name, summary, AGENT_EDITOR)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Split the prompt's namesake format `이름(회사)` into name and employer
/// hint. Anything else passes through unchanged.
fn split_display_name(name: &str) -> (&str, Option<&str>) {
    let trimmed = name.trim();
    if let Some(rest) = trimmed.strip_suffix(')') {
        if let Some(open) = rest.rfind('(') {
            let base = rest[..open].trim();
            let employer = rest[open + 1..].trim();
            if !base.is_empty() && !employer.is_empty() {
                return (base, Some(employer));
            }
        }
    }
    (trimmed, None)
}

fn failed(name: String, err: DirectoryError) -> ActionOutcome {
    ActionOutcome::Failed {
        name,
        error: err.to_string(),
    }
}
