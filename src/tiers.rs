//! Categorical tier labels used by the directory sheets.
//!
//! The sheets store tiers as raw strings ("2A-비즈니스 우선순위", "FU3", ...).
//! These enums are typed views over those labels: parse is lossy on purpose,
//! and weight lookups on unrecognized labels yield 0 rather than an error so
//! a hand-edited sheet cell can never break a scoring batch.

use serde::{Deserialize, Serialize};

/// Relationship tier for an individual contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactTier {
    LifeRelationship,
    Mentor,
    Family,
    BusinessPriority,
    Business,
    PersonalPriority,
    PersonalNetwork,
    Passive,
    Inactive,
}

impl ContactTier {
    pub const ALL: [ContactTier; 9] = [
        ContactTier::LifeRelationship,
        ContactTier::Mentor,
        ContactTier::Family,
        ContactTier::BusinessPriority,
        ContactTier::Business,
        ContactTier::PersonalPriority,
        ContactTier::PersonalNetwork,
        ContactTier::Passive,
        ContactTier::Inactive,
    ];

    /// Sheet label for this tier.
    pub fn label(&self) -> &'static str {
        match self {
            ContactTier::LifeRelationship => "1A-인생관계",
            ContactTier::Mentor => "1M-Mentor, 은인",
            ContactTier::Family => "1F-Family",
            ContactTier::BusinessPriority => "2A-비즈니스 우선순위",
            ContactTier::Business => "2C-비즈니스",
            ContactTier::PersonalPriority => "3A-인적 우선순위",
            ContactTier::PersonalNetwork => "3C-인적 네트워킹",
            ContactTier::Passive => "4A-Passive",
            ContactTier::Inactive => "5A-Inactive",
        }
    }

    /// Parse a sheet label. Unknown labels are `None`, not an error.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.label() == label)
    }

    /// Base priority weight on the 0..=100 scale.
    pub fn weight(&self) -> f64 {
        match self {
            ContactTier::LifeRelationship => 100.0,
            ContactTier::Mentor => 100.0,
            ContactTier::Family => 70.0,
            ContactTier::BusinessPriority => 80.0,
            ContactTier::Business => 50.0,
            ContactTier::PersonalPriority => 70.0,
            ContactTier::PersonalNetwork => 40.0,
            ContactTier::Passive => 20.0,
            ContactTier::Inactive => 0.0,
        }
    }
}

/// Priority tier for a business entity (org, firm, community).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTier {
    Critical,
    High,
    Medium,
    Low,
}

impl EntityTier {
    pub const ALL: [EntityTier; 4] = [
        EntityTier::Critical,
        EntityTier::High,
        EntityTier::Medium,
        EntityTier::Low,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EntityTier::Critical => "0-Critical",
            EntityTier::High => "1-High",
            EntityTier::Medium => "2-Medium",
            EntityTier::Low => "3-Low",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.label() == label)
    }

    pub fn weight(&self) -> f64 {
        match self {
            EntityTier::Critical => 100.0,
            EntityTier::High => 75.0,
            EntityTier::Medium => 50.0,
            EntityTier::Low => 25.0,
        }
    }
}

/// Follow-up urgency tier. FU0 is "today", FU9 is "someday/never".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FollowUpTier {
    Fu0,
    Fu1,
    Fu3,
    Fu5,
    Fu9,
}

impl FollowUpTier {
    pub const ALL: [FollowUpTier; 5] = [
        FollowUpTier::Fu0,
        FollowUpTier::Fu1,
        FollowUpTier::Fu3,
        FollowUpTier::Fu5,
        FollowUpTier::Fu9,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FollowUpTier::Fu0 => "FU0",
            FollowUpTier::Fu1 => "FU1",
            FollowUpTier::Fu3 => "FU3",
            FollowUpTier::Fu5 => "FU5",
            FollowUpTier::Fu9 => "FU9",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.label() == label)
    }

    pub fn weight(&self) -> f64 {
        match self {
            FollowUpTier::Fu0 => 100.0,
            FollowUpTier::Fu1 => 80.0,
            FollowUpTier::Fu3 => 50.0,
            FollowUpTier::Fu5 => 20.0,
            FollowUpTier::Fu9 => 0.0,
        }
    }

    /// Next tier up the escalation chain: FU5 → FU3 → FU1 → FU0.
    ///
    /// FU0 is already maximal and FU9 is deliberately parked, so both
    /// return `None` and are never auto-escalated.
    pub fn escalated(&self) -> Option<Self> {
        match self {
            FollowUpTier::Fu5 => Some(FollowUpTier::Fu3),
            FollowUpTier::Fu3 => Some(FollowUpTier::Fu1),
            FollowUpTier::Fu1 => Some(FollowUpTier::Fu0),
            FollowUpTier::Fu0 | FollowUpTier::Fu9 => None,
        }
    }
}

/// Weight for a raw contact-priority cell. Unknown labels weigh 0.
pub fn contact_priority_weight(label: &str) -> f64 {
    ContactTier::parse(label).map(|t| t.weight()).unwrap_or(0.0)
}

/// Weight for a raw business-priority cell. Unknown labels weigh 0.
pub fn entity_priority_weight(label: &str) -> f64 {
    EntityTier::parse(label).map(|t| t.weight()).unwrap_or(0.0)
}

/// Weight for a raw follow-up cell. Unknown labels weigh 0.
pub fn followup_weight(label: &str) -> f64 {
    FollowUpTier::parse(label).map(|t| t.weight()).unwrap_or(0.0)
}
