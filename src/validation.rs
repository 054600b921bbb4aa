//! Field validation for directory writes.
//!
//! Validators collect human-readable problems instead of failing fast: a
//! sheet edit form (or an agent payload) wants every problem at once, in the
//! product's language. An empty cell is always acceptable here; "required"
//! is enforced only by [`validate_contact`] for the name.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::tiers::{ContactTier, EntityTier, FollowUpTier};

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$")
            .expect("email regex should compile")
    })
}

/// Empty ok, otherwise strict `YYYY-MM-DD`.
pub fn validate_date(cell: &str) -> Result<(), String> {
    if cell.is_empty() {
        return Ok(());
    }
    match NaiveDate::parse_from_str(cell, "%Y-%m-%d") {
        Ok(_) => Ok(()),
        Err(_) => Err(format!(
            "잘못된 날짜 형식입니다: {cell} (YYYY-MM-DD 형식으로 입력해주세요)"
        )),
    }
}

/// Empty ok, otherwise a plausible address shape.
pub fn validate_email(cell: &str) -> Result<(), String> {
    if cell.is_empty() || email_regex().is_match(cell) {
        Ok(())
    } else {
        Err(format!("잘못된 이메일 형식입니다: {cell}"))
    }
}

/// Empty ok, otherwise one of the fixed contact tier labels.
pub fn validate_contact_priority(cell: &str) -> Result<(), String> {
    if cell.is_empty() || ContactTier::parse(cell).is_some() {
        Ok(())
    } else {
        Err(format!("잘못된 Contact Priority입니다: {cell}"))
    }
}

/// Empty ok, otherwise one of the fixed entity tier labels.
pub fn validate_business_priority(cell: &str) -> Result<(), String> {
    if cell.is_empty() || EntityTier::parse(cell).is_some() {
        Ok(())
    } else {
        Err(format!("잘못된 Business Priority입니다: {cell}"))
    }
}

/// Empty ok, otherwise one of FU0/FU1/FU3/FU5/FU9.
pub fn validate_followup_priority(cell: &str) -> Result<(), String> {
    if cell.is_empty() || FollowUpTier::parse(cell).is_some() {
        Ok(())
    } else {
        Err(format!("잘못된 Follow-up Priority입니다: {cell}"))
    }
}

/// Empty ok, otherwise every comma-separated token must be a registered tag.
pub fn validate_tag(cell: &str, valid_tags: &[String]) -> Result<(), String> {
    if cell.is_empty() {
        return Ok(());
    }
    for token in cell.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if !valid_tags.iter().any(|t| t == token) {
            return Err(format!("등록되지 않은 태그입니다: {token}"));
        }
    }
    Ok(())
}

fn check(problems: &mut Vec<String>, result: Result<(), String>) {
    if let Err(problem) = result {
        problems.push(problem);
    }
}

fn validate_field(problems: &mut Vec<String>, field: &str, value: &str, valid_tags: &[String]) {
    match field {
        "contact_priority" => check(problems, validate_contact_priority(value)),
        "business_priority" => check(problems, validate_business_priority(value)),
        "follow_up_priority" => check(problems, validate_followup_priority(value)),
        "follow_up_date" | "last_contact" => check(problems, validate_date(value)),
        "email" => check(problems, validate_email(value)),
        "tag" => check(problems, validate_tag(value, valid_tags)),
        "name" => {
            if value.trim().is_empty() {
                problems.push("이름은 필수 항목입니다".to_string());
            }
        }
        // Free-text fields carry no rules.
        _ => {}
    }
}

/// Validate a full contact row before create. Returns every problem found;
/// an empty list means the row is good to write.
pub fn validate_contact(contact: &crate::records::Contact, valid_tags: &[String]) -> Vec<String> {
    let mut problems = Vec::new();
    if contact.name.trim().is_empty() {
        problems.push("이름은 필수 항목입니다".to_string());
    }
    check(&mut problems, validate_contact_priority(&contact.contact_priority));
    check(&mut problems, validate_followup_priority(&contact.follow_up_priority));
    check(&mut problems, validate_date(&contact.follow_up_date));
    check(&mut problems, validate_date(&contact.last_contact));
    check(&mut problems, validate_email(&contact.email));
    check(&mut problems, validate_tag(&contact.tag, valid_tags));
    problems
}

/// Validate a full entity row before create.
pub fn validate_entity(entity: &crate::records::Entity, valid_tags: &[String]) -> Vec<String> {
    let mut problems = Vec::new();
    if entity.name.trim().is_empty() {
        problems.push("이름은 필수 항목입니다".to_string());
    }
    check(&mut problems, validate_business_priority(&entity.business_priority));
    check(&mut problems, validate_followup_priority(&entity.follow_up_priority));
    check(&mut problems, validate_date(&entity.follow_up_date));
    check(&mut problems, validate_date(&entity.last_contact));
    check(&mut problems, validate_tag(&entity.tag, valid_tags));
    problems
}

/// Validate only the fields an update supplies.
pub fn validate_update_fields(
    fields: &BTreeMap<String, String>,
    valid_tags: &[String],
) -> Vec<String> {
    let mut problems = Vec::new();
    for (field, value) in fields {
        validate_field(&mut problems, field, value, valid_tags);
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Contact, Entity};

    fn tags() -> Vec<String> {
        vec!["독서".to_string(), "스타트업".to_string(), "운동".to_string()]
    }

    #[test]
    fn test_date_rules() {
        assert!(validate_date("").is_ok());
        assert!(validate_date("2025-08-25").is_ok());
        assert!(validate_date("2025-8-5").is_ok());
        assert!(validate_date("25-08-2025").is_err());
        assert!(validate_date("다음주").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("").is_ok());
        assert!(validate_email("minjun.kim@example.co.kr").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_priority_membership() {
        assert!(validate_contact_priority("2A-비즈니스 우선순위").is_ok());
        assert!(validate_contact_priority("2A").is_err());
        assert!(validate_business_priority("0-Critical").is_ok());
        assert!(validate_business_priority("Critical").is_err());
        assert!(validate_followup_priority("FU3").is_ok());
        assert!(validate_followup_priority("FU2").is_err());
    }

    #[test]
    fn test_tag_tokens_must_be_registered() {
        assert!(validate_tag("", &tags()).is_ok());
        assert!(validate_tag("독서", &tags()).is_ok());
        assert!(validate_tag("독서, 운동", &tags()).is_ok());
        assert!(validate_tag("독서, , 운동", &tags()).is_ok());
        let err = validate_tag("독서, 골프", &tags()).unwrap_err();
        assert!(err.contains("골프"), "{err}");
    }

    #[test]
    fn test_validate_contact_requires_name_and_collects_all() {
        let contact = Contact {
            name: "  ".to_string(),
            contact_priority: "9Z".to_string(),
            follow_up_date: "어제".to_string(),
            email: "broken@".to_string(),
            ..Default::default()
        };
        let problems = validate_contact(&contact, &tags());
        assert_eq!(problems.len(), 4, "{problems:?}");
    }

    #[test]
    fn test_validate_entity_checks_business_fields() {
        let entity = Entity {
            name: "한빛출판네트워크".to_string(),
            business_priority: "아주 중요".to_string(),
            follow_up_priority: "FU1".to_string(),
            ..Default::default()
        };
        let problems = validate_entity(&entity, &tags());
        assert_eq!(problems.len(), 1, "{problems:?}");
        assert!(problems[0].contains("Business Priority"), "{problems:?}");
    }

    #[test]
    fn test_validate_update_checks_only_supplied_fields() {
        let mut fields = BTreeMap::new();
        fields.insert("follow_up_priority".to_string(), "FU1".to_string());
        fields.insert("follow_up_note".to_string(), "점심 약속 잡기".to_string());
        assert!(validate_update_fields(&fields, &tags()).is_empty());

        fields.insert("name".to_string(), "".to_string());
        fields.insert("tag".to_string(), "등산".to_string());
        let problems = validate_update_fields(&fields, &tags());
        assert_eq!(problems.len(), 2, "{problems:?}");
    }
}
