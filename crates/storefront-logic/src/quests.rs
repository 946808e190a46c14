//! Daily quests - content definitions, the per-slot progress state machine,
//! and the gameplay signals that advance it.
//!
//! # Lifecycle
//!
//! ```text
//! Available ──accept──▶ Active ──target reached──▶ Completed ──collect──▶ Collected
//!                         │
//!                         └──day boundary, target missed──▶ Failed
//! ```
//!
//! Collected and Failed are terminal. Penalties for a failed quest are
//! handed out once, guarded by [`QuestProgress::penalty_applied`].

use serde::{Deserialize, Serialize};

use crate::effects::StatKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestId(pub u32);

/// Difficulty tier. Ordered so that `Easy < Medium < Hard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuestTier {
    Easy,
    Medium,
    Hard,
}

impl QuestTier {
    pub const ALL: [QuestTier; 3] = [QuestTier::Easy, QuestTier::Medium, QuestTier::Hard];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The tier above this one, saturating at `Hard`.
    pub fn next(self) -> QuestTier {
        match self {
            QuestTier::Easy => QuestTier::Medium,
            QuestTier::Medium | QuestTier::Hard => QuestTier::Hard,
        }
    }
}

/// What the player has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestType {
    CompleteMinigame,
    PlaceOnShelf,
    CompleteDelivery,
    ServeCustomer,
    IgnoreCustomer,
    PackItem,
}

/// A trackable gameplay action published on the quest-progress bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestSignal {
    MinigameCompleted,
    ItemShelved { subtype: String },
    DeliveryCompleted,
    CustomerServed,
    CustomerIgnored,
    ItemPacked { subtype: String },
}

impl QuestSignal {
    pub fn quest_type(&self) -> QuestType {
        match self {
            QuestSignal::MinigameCompleted => QuestType::CompleteMinigame,
            QuestSignal::ItemShelved { .. } => QuestType::PlaceOnShelf,
            QuestSignal::DeliveryCompleted => QuestType::CompleteDelivery,
            QuestSignal::CustomerServed => QuestType::ServeCustomer,
            QuestSignal::CustomerIgnored => QuestType::IgnoreCustomer,
            QuestSignal::ItemPacked { .. } => QuestType::PackItem,
        }
    }

    pub fn subtype(&self) -> Option<&str> {
        match self {
            QuestSignal::ItemShelved { subtype } | QuestSignal::ItemPacked { subtype } => {
                Some(subtype.as_str())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestRequirement {
    pub target: u32,
    /// Only signals tagged with this resource subtype count.
    #[serde(default)]
    pub subtype: Option<String>,
}

impl QuestRequirement {
    pub fn matches(&self, quest_type: QuestType, signal: &QuestSignal) -> bool {
        if signal.quest_type() != quest_type {
            return false;
        }
        match &self.subtype {
            None => true,
            Some(required) => signal.subtype() == Some(required.as_str()),
        }
    }
}

/// A reward or penalty effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// Positive credits, negative debits.
    Currency(i64),
    /// Grant a buff; `days == 0` is permanent.
    Buff { stat: StatKind, amount: f32, days: u32 },
}

/// Immutable quest content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestDefinition {
    pub id: QuestId,
    pub name: String,
    pub tier: QuestTier,
    pub quest_type: QuestType,
    pub requirement: QuestRequirement,
    #[serde(default)]
    pub rewards: Vec<Outcome>,
    #[serde(default)]
    pub penalties: Vec<Outcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestStatus {
    Available,
    Active,
    Completed,
    Collected,
    Failed,
}

impl QuestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, QuestStatus::Collected | QuestStatus::Failed)
    }
}

/// A lifecycle transition was attempted from the wrong status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrongStatus {
    pub expected: QuestStatus,
    pub found: QuestStatus,
}

/// Effect of a progress signal on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStep {
    Ignored,
    Advanced,
    Completed,
}

/// Mutable state of one daily quest slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestProgress {
    pub quest_id: QuestId,
    pub quest_type: QuestType,
    pub requirement: QuestRequirement,
    pub status: QuestStatus,
    pub current: u32,
    /// Rewards drawn at assignment.
    pub rewards: Vec<Outcome>,
    /// Penalties drawn at assignment.
    pub penalties: Vec<Outcome>,
    pub penalty_applied: bool,
}

impl QuestProgress {
    /// Fresh slot for a definition with the drawn outcomes fixed.
    pub fn assign(def: &QuestDefinition, rewards: Vec<Outcome>, penalties: Vec<Outcome>) -> Self {
        Self {
            quest_id: def.id,
            quest_type: def.quest_type,
            requirement: def.requirement.clone(),
            status: QuestStatus::Available,
            current: 0,
            rewards,
            penalties,
            penalty_applied: false,
        }
    }

    pub fn target(&self) -> u32 {
        self.requirement.target
    }

    pub fn accept(&mut self) -> Result<(), WrongStatus> {
        self.expect(QuestStatus::Available)?;
        self.status = QuestStatus::Active;
        // A zero-target quest is done as soon as it is taken.
        if self.current >= self.target() {
            self.status = QuestStatus::Completed;
        }
        Ok(())
    }

    /// Apply a progress signal. Only Active slots move; progress is capped
    /// at the target and flips the slot to Completed exactly once.
    pub fn advance(&mut self, signal: &QuestSignal) -> ProgressStep {
        if self.status != QuestStatus::Active
            || !self.requirement.matches(self.quest_type, signal)
        {
            return ProgressStep::Ignored;
        }
        self.current = (self.current + 1).min(self.target());
        if self.current >= self.target() {
            self.status = QuestStatus::Completed;
            ProgressStep::Completed
        } else {
            ProgressStep::Advanced
        }
    }

    /// Mark the slot collected and return the rewards to pay out.
    pub fn collect(&mut self) -> Result<Vec<Outcome>, WrongStatus> {
        self.expect(QuestStatus::Completed)?;
        self.status = QuestStatus::Collected;
        Ok(self.rewards.clone())
    }

    /// Day-boundary failure check. Returns the penalties the first time the
    /// slot is failed; any later call returns `None`.
    pub fn fail_if_unfinished(&mut self) -> Option<Vec<Outcome>> {
        if self.status == QuestStatus::Active && self.current < self.target() {
            self.status = QuestStatus::Failed;
        }
        if self.status != QuestStatus::Failed || self.penalty_applied {
            return None;
        }
        self.penalty_applied = true;
        Some(self.penalties.clone())
    }

    fn expect(&self, expected: QuestStatus) -> Result<(), WrongStatus> {
        if self.status == expected {
            Ok(())
        } else {
            Err(WrongStatus {
                expected,
                found: self.status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shelf_quest(target: u32, subtype: Option<&str>) -> QuestDefinition {
        QuestDefinition {
            id: QuestId(1),
            name: "Stock the shelves".into(),
            tier: QuestTier::Easy,
            quest_type: QuestType::PlaceOnShelf,
            requirement: QuestRequirement {
                target,
                subtype: subtype.map(str::to_string),
            },
            rewards: vec![Outcome::Currency(50)],
            penalties: vec![Outcome::Currency(-20)],
        }
    }

    fn shelved(subtype: &str) -> QuestSignal {
        QuestSignal::ItemShelved {
            subtype: subtype.into(),
        }
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(QuestTier::Easy < QuestTier::Medium);
        assert!(QuestTier::Medium < QuestTier::Hard);
        assert_eq!(QuestTier::Hard.next(), QuestTier::Hard);
    }

    #[test]
    fn five_signals_complete_once() {
        let def = shelf_quest(5, None);
        let mut p = QuestProgress::assign(&def, def.rewards.clone(), def.penalties.clone());
        p.accept().unwrap();
        for _ in 0..4 {
            assert_eq!(p.advance(&shelved("fruit")), ProgressStep::Advanced);
        }
        assert_eq!(p.advance(&shelved("fruit")), ProgressStep::Completed);
        assert_eq!(p.status, QuestStatus::Completed);
        assert_eq!(p.advance(&shelved("fruit")), ProgressStep::Ignored);
        assert_eq!(p.current, 5);
    }

    #[test]
    fn subtype_filter() {
        let def = shelf_quest(2, Some("dairy"));
        let mut p = QuestProgress::assign(&def, vec![], vec![]);
        p.accept().unwrap();
        assert_eq!(p.advance(&shelved("fruit")), ProgressStep::Ignored);
        assert_eq!(p.advance(&QuestSignal::CustomerServed), ProgressStep::Ignored);
        assert_eq!(p.advance(&shelved("dairy")), ProgressStep::Advanced);
    }

    #[test]
    fn available_slot_ignores_signals() {
        let def = shelf_quest(1, None);
        let mut p = QuestProgress::assign(&def, vec![], vec![]);
        assert_eq!(p.advance(&shelved("x")), ProgressStep::Ignored);
        assert_eq!(p.current, 0);
    }

    #[test]
    fn accept_twice_rejected() {
        let def = shelf_quest(3, None);
        let mut p = QuestProgress::assign(&def, vec![], vec![]);
        p.accept().unwrap();
        let err = p.accept().unwrap_err();
        assert_eq!(err.expected, QuestStatus::Available);
        assert_eq!(err.found, QuestStatus::Active);
    }

    #[test]
    fn collect_is_terminal() {
        let def = shelf_quest(1, None);
        let mut p = QuestProgress::assign(&def, def.rewards.clone(), vec![]);
        p.accept().unwrap();
        p.advance(&shelved("x"));
        assert_eq!(p.collect().unwrap(), vec![Outcome::Currency(50)]);
        assert!(p.collect().is_err());
        assert!(p.status.is_terminal());
        assert!(p.fail_if_unfinished().is_none());
        assert_eq!(p.status, QuestStatus::Collected);
    }

    #[test]
    fn penalty_handed_out_once() {
        let def = shelf_quest(3, None);
        let mut p = QuestProgress::assign(&def, vec![], def.penalties.clone());
        p.accept().unwrap();
        p.advance(&shelved("x"));
        assert_eq!(p.fail_if_unfinished(), Some(vec![Outcome::Currency(-20)]));
        assert!(p.penalty_applied);
        assert_eq!(p.status, QuestStatus::Failed);
        assert_eq!(p.fail_if_unfinished(), None);
    }

    #[test]
    fn untouched_slot_is_not_failed() {
        let def = shelf_quest(3, None);
        let mut p = QuestProgress::assign(&def, vec![], def.penalties.clone());
        assert!(p.fail_if_unfinished().is_none());
        assert_eq!(p.status, QuestStatus::Available);
    }
}
