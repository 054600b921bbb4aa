//! System prompt assembly for the contact agent.
//!
//! The prompt is rebuilt every turn from live directory data so the model
//! always sees the current roster and tag vocabulary. All user-facing copy
//! is Korean; the agent is instructed to answer in Korean as well.

use crate::records::Contact;

/// `이름(회사)` when an employer is known, bare name otherwise. This is the
/// namesake-disambiguation format the prompt rules mandate.
pub fn display_name(contact: &Contact) -> String {
    if contact.employer.is_empty() {
        contact.name.clone()
    } else {
        format!("{}({})", contact.name, contact.employer)
    }
}

/// Roster block injected into the system prompt. One line per contact,
/// pipe-joined, only non-empty cells.
pub fn contacts_summary(contacts: &[Contact]) -> String {
    if contacts.is_empty() {
        return "현재 등록된 연락처가 없습니다.".to_string();
    }
    let mut lines = vec!["## 등록된 연락처 목록".to_string()];
    for contact in contacts {
        let mut parts = vec![display_name(contact)];
        if !contact.title.is_empty() {
            parts.push(contact.title.clone());
        }
        if !contact.contact_priority.is_empty() {
            parts.push(contact.contact_priority.clone());
        }
        if !contact.follow_up_priority.is_empty() {
            parts.push(contact.follow_up_priority.clone());
        }
        if !contact.last_contact.is_empty() {
            parts.push(format!("최근연락: {}", contact.last_contact));
        }
        if !contact.key_value_interest.is_empty() {
            parts.push(format!("관심사: {}", contact.key_value_interest));
        }
        if !contact.tag.is_empty() {
            parts.push(format!("태그: {}", contact.tag));
        }
        lines.push(format!("- {}", parts.join(" | ")));
    }
    lines.join("\n")
}

/// Full system prompt. `tags` is `None` when the tag sheet could not be
/// read; the prompt says so instead of silently showing an empty list.
pub fn build_system_prompt(contacts: &[Contact], tags: Option<&[String]>) -> String {
    let summary = contacts_summary(contacts);
    let tag_line = match tags {
        None => "(태그 로드 실패)".to_string(),
        Some([]) => "(없음)".to_string(),
        Some(list) => list.join(", "),
    };

    format!(
        r#"당신은 개인 연락처 관리 AI 비서입니다. 사용자의 연락처를 관리하고, 만남/통화 기록을 정리하며, 연락처 정보를 검색하고 업데이트합니다.

{summary}

## 사용 가능한 태그
{tag_line}

## 4가지 모드
1. **Quick Log**: 만남/통화/미팅/식사 등의 키워드가 있으면 해당 연락처의 Last Contact를 업데이트하고, Interaction Log를 기록하고, Key Value & Interest를 자동 감지하고, 필요하면 Follow-up을 제안합니다.
2. **Search**: "아는 사람?", "누구 있어?", "검색", "찾아" 등의 요청에는 연락처를 검색해서 알려줍니다. 검색은 어떤 데이터도 수정하지 않습니다.
3. **Auto-Update**: 이직, 새 관심사, 직급 변경 등의 정보가 대화에 나오면 해당 필드 업데이트를 제안합니다.
4. **Delete**: "삭제", "지워줘", "제거" 요청 시 삭제 액션을 만듭니다. 삭제는 반드시 confidence="low"로 제안합니다.

## 핵심 규칙
1. 어떤 연락처를 말하는지 확신이 없으면 confidence="low"로 제안하고 사용자에게 확인을 받습니다.
2. 동명이인이 있으면 반드시 `이름(회사)` 형식으로 구분합니다.
3. Interaction Context는 `[날짜] 만남유형 @장소 | 핵심내용 | → 다음 액션` 형식으로 기록합니다.
4. 태그는 위의 "사용 가능한 태그" 목록에 있는 것만 사용합니다.
5. 대화에서 새로운 관심사나 가치가 드러나면 Key Value & Interest를 자동으로 업데이트합니다.
6. 삭제 안전장치: delete_contact에는 fields가 필요 없습니다. name만 지정하고 반드시 confidence="low"를 사용합니다.

## 응답 형식
사용자에게 보여줄 메시지를 먼저 쓰고, 실행할 작업이 있으면 그 뒤에 [ACTION] 마커와 JSON을 붙입니다:

[ACTION]
{{
  "action": "update_contact" | "add_contact" | "search" | "delete_contact",
  "name": "연락처 이름",
  "confidence": "high" | "low",
  "fields": {{
    "last_contact": "YYYY-MM-DD",
    "follow_up_note": "...",
    "follow_up_priority": "FU0 ~ FU9",
    "follow_up_date": "YYYY-MM-DD",
    "employer": "...",
    "title": "...",
    "key_value_interest": "...",
    "contact_priority": "...",
    "tag": "..."
  }},
  "interaction_log": "[날짜] 만남유형 @장소 | 핵심내용 | → 다음 액션",
  "key_value_extract": "새로 감지된 관심사/가치"
}}

confidence="high"는 자동 실행되고, confidence="low"는 사용자 확인 후 실행됩니다.

중요: 불필요한 필드는 포함하지 마세요. 변경할 필드만 fields에 포함합니다.
항상 한국어로 응답하세요."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Contact {
        Contact {
            name: "김민준".to_string(),
            employer: "네이버".to_string(),
            title: "팀장".to_string(),
            contact_priority: "2A-비즈니스 우선순위".to_string(),
            follow_up_priority: "FU3".to_string(),
            last_contact: "2025-08-01".to_string(),
            key_value_interest: "AI 인프라".to_string(),
            tag: "비즈니스".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_joins_nonempty_cells_with_pipes() {
        let line = contacts_summary(&[sample()]);
        assert!(line.starts_with("## 등록된 연락처 목록\n"));
        assert!(line.contains(
            "- 김민준(네이버) | 팀장 | 2A-비즈니스 우선순위 | FU3 | 최근연락: 2025-08-01 | 관심사: AI 인프라 | 태그: 비즈니스"
        ));
    }

    #[test]
    fn test_summary_drops_empty_cells() {
        let contact = Contact {
            name: "박서연".to_string(),
            ..Default::default()
        };
        let line = contacts_summary(&[contact]);
        assert!(line.contains("- 박서연"));
        assert!(!line.contains(" | "));
    }

    #[test]
    fn test_summary_for_empty_roster() {
        assert_eq!(contacts_summary(&[]), "현재 등록된 연락처가 없습니다.");
    }

    #[test]
    fn test_prompt_tag_states() {
        let loaded = build_system_prompt(&[], Some(&["독서".to_string(), "운동".to_string()]));
        assert!(loaded.contains("## 사용 가능한 태그\n독서, 운동"));

        let empty = build_system_prompt(&[], Some(&[]));
        assert!(empty.contains("## 사용 가능한 태그\n(없음)"));

        let failed = build_system_prompt(&[], None);
        assert!(failed.contains("## 사용 가능한 태그\n(태그 로드 실패)"));
    }

    #[test]
    fn test_prompt_contains_protocol_sections() {
        let prompt = build_system_prompt(&[sample()], Some(&[]));
        assert!(prompt.contains("## 4가지 모드"));
        assert!(prompt.contains("## 핵심 규칙"));
        assert!(prompt.contains("## 응답 형식"));
        assert!(prompt.contains("[ACTION]"));
        assert!(prompt.contains("항상 한국어로 응답하세요."));
    }
}
