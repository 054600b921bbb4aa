//! Priority scoring and follow-up auto-escalation (pure math, no I/O).
//!
//! A record's score is recomputed on every read from its priority tier, its
//! follow-up tier, and how overdue its follow-up date is. Nothing here
//! persists: ranking annotates the transient `score` field, escalation
//! mutates the in-memory tier and hands the caller a change list to write
//! back through the directory.
//!
//! Callers resolve "today" once per batch (see [`crate::clock`]) so a call
//! that straddles midnight scores every record against the same date.

use chrono::NaiveDate;
use serde::Serialize;

use crate::records::{Contact, Entity};
use crate::tiers::{
    contact_priority_weight, entity_priority_weight, followup_weight, FollowUpTier,
};

/// Each day past the follow-up date costs this much score pressure.
pub const OVERDUE_MULTIPLIER: f64 = 2.0;
/// The overdue penalty saturates here (50 days out).
pub const OVERDUE_CAP: f64 = 100.0;
/// Escalation fires only strictly beyond this many days overdue.
pub const ESCALATION_GRACE_DAYS: i64 = 7;

const CONTACT_PRIORITY_WEIGHT: f64 = 0.30;
const CONTACT_FOLLOWUP_WEIGHT: f64 = 0.25;
const CONTACT_OVERDUE_WEIGHT: f64 = 0.30;
/// Reserved for a future interaction-context signal. Always multiplies zero
/// today; kept in the formula so the published weights sum to 1.0.
const CONTACT_CONTEXT_WEIGHT: f64 = 0.15;

const ENTITY_PRIORITY_WEIGHT: f64 = 0.35;
const ENTITY_FOLLOWUP_WEIGHT: f64 = 0.30;
const ENTITY_OVERDUE_WEIGHT: f64 = 0.35;

/// One tier promotion produced by the escalation sweep. The record itself is
/// mutated in place; this is what the caller persists and reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Escalation {
    pub key: String,
    pub name: String,
    pub from: FollowUpTier,
    pub to: FollowUpTier,
}

/// Penalty for a follow-up date strictly in the past: 2 points per day,
/// capped at 100. An empty or malformed cell is "no signal", never an error.
pub fn overdue_penalty(date_cell: &str, today: NaiveDate) -> f64 {
    if date_cell.is_empty() {
        return 0.0;
    }
    let due = match NaiveDate::parse_from_str(date_cell, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => return 0.0,
    };
    let days_overdue = (today - due).num_days();
    if days_overdue > 0 {
        (days_overdue as f64 * OVERDUE_MULTIPLIER).min(OVERDUE_CAP)
    } else {
        0.0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Composite contact score, rounded to one decimal.
pub fn score_contact(contact: &Contact, today: NaiveDate) -> f64 {
    let priority = contact_priority_weight(&contact.contact_priority);
    let followup = followup_weight(&contact.follow_up_priority);
    let overdue = overdue_penalty(&contact.follow_up_date, today);
    round1(
        CONTACT_PRIORITY_WEIGHT * priority
            + CONTACT_FOLLOWUP_WEIGHT * followup
            + CONTACT_OVERDUE_WEIGHT * overdue
            + CONTACT_CONTEXT_WEIGHT * 0.0,
    )
}

/// Composite entity score, rounded to one decimal.
pub fn score_entity(entity: &Entity, today: NaiveDate) -> f64 {
    let priority = entity_priority_weight(&entity.business_priority);
    let followup = followup_weight(&entity.follow_up_priority);
    let overdue = overdue_penalty(&entity.follow_up_date, today);
    round1(
        ENTITY_PRIORITY_WEIGHT * priority
            + ENTITY_FOLLOWUP_WEIGHT * followup
            + ENTITY_OVERDUE_WEIGHT * overdue,
    )
}

/// Annotate every contact's `score` and sort descending. The sort is stable,
/// so equal scores keep their input order.
pub fn rank_contacts(contacts: &mut [Contact], today: NaiveDate) {
    for contact in contacts.iter_mut() {
        contact.score = Some(score_contact(contact, today));
    }
    contacts.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Annotate every entity's `score` and sort descending, stable on ties.
pub fn rank_entities(entities: &mut [Entity], today: NaiveDate) {
    for entity in entities.iter_mut() {
        entity.score = Some(score_entity(entity, today));
    }
    entities.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn escalate(
    tier_cell: &str,
    date_cell: &str,
    today: NaiveDate,
) -> Option<(FollowUpTier, FollowUpTier)> {
    let from = FollowUpTier::parse(tier_cell)?;
    // FU0 and FU9 have no next step and are never touched.
    let to = from.escalated()?;
    let due = NaiveDate::parse_from_str(date_cell, "%Y-%m-%d").ok()?;
    if (today - due).num_days() > ESCALATION_GRACE_DAYS {
        Some((from, to))
    } else {
        None
    }
}

/// Promote stale contact follow-ups one chain step (FU5→FU3→FU1→FU0).
///
/// Fires only when the follow-up date parses and is more than
/// [`ESCALATION_GRACE_DAYS`] days past. Missing or malformed dates are
/// skipped silently. Changes are applied in memory; the caller persists
/// them through the directory write path.
pub fn escalate_overdue_contacts(contacts: &mut [Contact], today: NaiveDate) -> Vec<Escalation> {
    let mut escalations = Vec::new();
    for contact in contacts.iter_mut() {
        if let Some((from, to)) =
            escalate(&contact.follow_up_priority, &contact.follow_up_date, today)
        {
            contact.follow_up_priority = to.label().to_string();
            escalations.push(Escalation {
                key: contact.key.clone(),
                name: contact.name.clone(),
                from,
                to,
            });
        }
    }
    escalations
}

/// Entity version of [`escalate_overdue_contacts`], same chain and window.
pub fn escalate_overdue_entities(entities: &mut [Entity], today: NaiveDate) -> Vec<Escalation> {
    let mut escalations = Vec::new();
    for entity in entities.iter_mut() {
        if let Some((from, to)) =
            escalate(&entity.follow_up_priority, &entity.follow_up_date, today)
        {
            entity.follow_up_priority = to.label().to_string();
            escalations.push(Escalation {
                key: entity.key.clone(),
                name: entity.name.clone(),
                from,
                to,
            });
        }
    }
    escalations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 25).unwrap()
    }

    fn days_ago(n: i64) -> String {
        (today() - chrono::Duration::days(n))
            .format("%Y-%m-%d")
            .to_string()
    }

    fn contact(priority: &str, followup: &str, date: &str) -> Contact {
        Contact {
            name: "박서연".to_string(),
            contact_priority: priority.to_string(),
            follow_up_priority: followup.to_string(),
            follow_up_date: date.to_string(),
            ..Default::default()
        }
    }

    fn entity(priority: &str, followup: &str, date: &str) -> Entity {
        Entity {
            name: "한빛출판네트워크".to_string(),
            business_priority: priority.to_string(),
            follow_up_priority: followup.to_string(),
            follow_up_date: date.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_penalty_zero_for_empty_and_malformed() {
        assert_eq!(overdue_penalty("", today()), 0.0);
        assert_eq!(overdue_penalty("내일", today()), 0.0);
        assert_eq!(overdue_penalty("2025/08/01", today()), 0.0);
        assert_eq!(overdue_penalty("2025-13-40", today()), 0.0);
    }

    #[test]
    fn test_penalty_zero_for_today_and_future() {
        assert_eq!(overdue_penalty(&days_ago(0), today()), 0.0);
        assert_eq!(overdue_penalty(&days_ago(-10), today()), 0.0);
    }

    #[test]
    fn test_penalty_two_per_day_until_cap() {
        assert_eq!(overdue_penalty(&days_ago(1), today()), 2.0);
        assert_eq!(overdue_penalty(&days_ago(25), today()), 50.0);
        assert_eq!(overdue_penalty(&days_ago(50), today()), 100.0);
        assert_eq!(overdue_penalty(&days_ago(51), today()), 100.0);
        assert_eq!(overdue_penalty(&days_ago(365), today()), 100.0);
    }

    #[test]
    fn test_penalty_monotonic() {
        let mut last = 0.0;
        for n in 0..80 {
            let p = overdue_penalty(&days_ago(n), today());
            assert!(p >= last, "penalty dipped at day {n}: {p} < {last}");
            last = p;
        }
    }

    #[test]
    fn test_contact_score_top_tier_urgent_no_date() {
        // 100*0.30 + 100*0.25, nothing overdue.
        let c = contact("1A-인생관계", "FU0", "");
        assert_eq!(score_contact(&c, today()), 55.0);
    }

    #[test]
    fn test_contact_score_overdue_term_applies_even_on_fu9() {
        // FU9 is exempt from escalation but not from the overdue term:
        // 30 days late is a 60-point penalty, weighted 0.30.
        let c = contact("", "FU9", &days_ago(30));
        assert_eq!(score_contact(&c, today()), 18.0);
        // At the cap the term contributes its 30-point maximum.
        let c = contact("", "FU9", &days_ago(60));
        assert_eq!(score_contact(&c, today()), 30.0);
    }

    #[test]
    fn test_contact_score_unknown_tiers_weigh_zero() {
        let c = contact("9Z-미분류", "FU7", "");
        assert_eq!(score_contact(&c, today()), 0.0);
    }

    #[test]
    fn test_contact_score_bounded_by_weighted_maxima() {
        let c = contact("1A-인생관계", "FU0", &days_ago(400));
        // 0.30*100 + 0.25*100 + 0.30*100 = 85, the contact ceiling.
        assert_eq!(score_contact(&c, today()), 85.0);
    }

    #[test]
    fn test_entity_score() {
        let e = entity("0-Critical", "FU0", "");
        assert_eq!(score_entity(&e, today()), 65.0);
        let e = entity("2-Medium", "FU3", &days_ago(10));
        // 0.35*50 + 0.30*50 + 0.35*20 = 17.5 + 15 + 7 = 39.5
        assert_eq!(score_entity(&e, today()), 39.5);
        let e = entity("0-Critical", "FU0", &days_ago(100));
        assert_eq!(score_entity(&e, today()), 100.0);
    }

    #[test]
    fn test_rank_empty_is_empty() {
        let mut contacts: Vec<Contact> = Vec::new();
        rank_contacts(&mut contacts, today());
        assert!(contacts.is_empty());
    }

    #[test]
    fn test_rank_sorts_descending_and_annotates() {
        let mut contacts = vec![
            contact("4A-Passive", "FU9", ""),
            contact("1A-인생관계", "FU0", ""),
            contact("2C-비즈니스", "FU3", ""),
        ];
        rank_contacts(&mut contacts, today());
        let scores: Vec<f64> = contacts.iter().map(|c| c.score.unwrap()).collect();
        assert_eq!(scores, vec![55.0, 27.5, 6.0]);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let mut a = contact("1F-Family", "FU0", "");
        a.name = "첫째".to_string();
        let mut b = contact("1F-Family", "FU0", "");
        b.name = "둘째".to_string();
        // Different tier, same score: 1F(70)*0.30 = 3A(70)*0.30.
        let mut c = contact("3A-인적 우선순위", "FU0", "");
        c.name = "셋째".to_string();
        let mut contacts = vec![a, b, c];
        rank_contacts(&mut contacts, today());
        let names: Vec<&str> = contacts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["첫째", "둘째", "셋째"]);
    }

    #[test]
    fn test_escalation_eight_days_fires_seven_does_not() {
        let mut contacts = vec![contact("", "FU5", &days_ago(8))];
        let escalations = escalate_overdue_contacts(&mut contacts, today());
        assert_eq!(escalations.len(), 1);
        assert_eq!(escalations[0].from, FollowUpTier::Fu5);
        assert_eq!(escalations[0].to, FollowUpTier::Fu3);
        assert_eq!(contacts[0].follow_up_priority, "FU3");

        let mut contacts = vec![contact("", "FU5", &days_ago(7))];
        let escalations = escalate_overdue_contacts(&mut contacts, today());
        assert!(escalations.is_empty());
        assert_eq!(contacts[0].follow_up_priority, "FU5");
    }

    #[test]
    fn test_escalation_single_step_per_sweep() {
        // A year late still moves only one chain step per sweep.
        let mut contacts = vec![contact("", "FU5", &days_ago(365))];
        escalate_overdue_contacts(&mut contacts, today());
        assert_eq!(contacts[0].follow_up_priority, "FU3");
    }

    #[test]
    fn test_escalation_chain_terminates_at_fu0() {
        let mut contacts = vec![
            contact("", "FU3", &days_ago(20)),
            contact("", "FU1", &days_ago(20)),
            contact("", "FU0", &days_ago(20)),
        ];
        let escalations = escalate_overdue_contacts(&mut contacts, today());
        assert_eq!(escalations.len(), 2);
        assert_eq!(contacts[0].follow_up_priority, "FU1");
        assert_eq!(contacts[1].follow_up_priority, "FU0");
        assert_eq!(contacts[2].follow_up_priority, "FU0");
    }

    #[test]
    fn test_escalation_never_touches_fu9() {
        let mut contacts = vec![contact("", "FU9", &days_ago(500))];
        let escalations = escalate_overdue_contacts(&mut contacts, today());
        assert!(escalations.is_empty());
        assert_eq!(contacts[0].follow_up_priority, "FU9");
    }

    #[test]
    fn test_escalation_skips_missing_or_malformed_dates() {
        let mut contacts = vec![
            contact("", "FU5", ""),
            contact("", "FU5", "지난주"),
            contact("", "FU5", "08-01-2025"),
        ];
        let escalations = escalate_overdue_contacts(&mut contacts, today());
        assert!(escalations.is_empty());
        for c in &contacts {
            assert_eq!(c.follow_up_priority, "FU5");
        }
    }

    #[test]
    fn test_entity_escalation_mirrors_contacts() {
        let mut entities = vec![
            entity("1-High", "FU5", &days_ago(10)),
            entity("1-High", "FU9", &days_ago(10)),
        ];
        let escalations = escalate_overdue_entities(&mut entities, today());
        assert_eq!(escalations.len(), 1);
        assert_eq!(escalations[0].name, "한빛출판네트워크");
        assert_eq!(entities[0].follow_up_priority, "FU3");
        assert_eq!(entities[1].follow_up_priority, "FU9");
    }
}
