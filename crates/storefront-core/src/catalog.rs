//! Content catalog - quest definitions, event modifiers and stat bases.
//!
//! Loaded from JSON. The built-in catalog is the same file the harness
//! uses, embedded at compile time.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use storefront_logic::effects::StatKind;
use storefront_logic::events::{EventId, EventModifier};
use storefront_logic::quests::{QuestDefinition, QuestId};

use crate::error::CatalogError;

const BUILTIN_CATALOG_JSON: &str = include_str!("../../../data/catalog.json");

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBase {
    pub stat: StatKind,
    pub base: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub stats: Vec<StatBase>,
    #[serde(default)]
    pub quests: Vec<QuestDefinition>,
    #[serde(default)]
    pub events: Vec<EventModifier>,
}

impl Catalog {
    /// Parse and validate a catalog.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG_JSON)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut quest_ids = HashSet::new();
        for quest in &self.quests {
            if !quest_ids.insert(quest.id) {
                return Err(CatalogError::DuplicateQuest(quest.id.0));
            }
            if quest.requirement.target == 0 {
                return Err(CatalogError::ZeroTarget(quest.id.0));
            }
        }

        let mut event_ids = HashSet::new();
        for event in &self.events {
            if !event_ids.insert(event.id) {
                return Err(CatalogError::DuplicateEvent(event.id.0));
            }
        }

        // Price bases come from the upgrade specs, not the catalog.
        for stat in StatKind::ALL {
            if stat != StatKind::UpgradePrice && !self.stats.iter().any(|s| s.stat == stat) {
                return Err(CatalogError::MissingStatBase(format!("{:?}", stat)));
            }
        }
        Ok(())
    }

    pub fn quest(&self, id: QuestId) -> Option<&QuestDefinition> {
        self.quests.iter().find(|q| q.id == id)
    }

    pub fn event(&self, id: EventId) -> Option<&EventModifier> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn event_ids(&self) -> Vec<EventId> {
        self.events.iter().map(|e| e.id).collect()
    }

    /// Unmodified base value of a stat; 0.0 when the catalog has none.
    pub fn base(&self, stat: StatKind) -> f32 {
        self.stats
            .iter()
            .find(|s| s.stat == stat)
            .map(|s| s.base)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_logic::quests::{Outcome, QuestTier};

    #[test]
    fn builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.quests.len() >= 6);
        assert!(!catalog.events.is_empty());
        assert!(catalog.quests.iter().any(|q| q.tier == QuestTier::Hard));
        assert!((catalog.base(StatKind::MovementSpeed) - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn outcomes_parse() {
        let catalog = Catalog::builtin().unwrap();
        let q = catalog.quest(QuestId(1)).unwrap();
        assert_eq!(q.rewards[0], Outcome::Currency(60));
        assert!(matches!(q.rewards[1], Outcome::Buff { days: 2, .. }));
    }

    #[test]
    fn duplicate_quest_rejected() {
        let json = r#"{
            "stats": [
                { "stat": "MovementSpeed", "base": 1.0 },
                { "stat": "CustomerWaitTime", "base": 1.0 },
                { "stat": "CustomerSpawnInterval", "base": 1.0 },
                { "stat": "DeliveryReward", "base": 1.0 }
            ],
            "quests": [
                { "id": 1, "name": "a", "tier": "Easy", "quest_type": "ServeCustomer", "requirement": { "target": 1 } },
                { "id": 1, "name": "b", "tier": "Easy", "quest_type": "ServeCustomer", "requirement": { "target": 1 } }
            ]
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::DuplicateQuest(1))
        ));
    }

    #[test]
    fn missing_stat_base_rejected() {
        assert!(matches!(
            Catalog::from_json("{}"),
            Err(CatalogError::MissingStatBase(_))
        ));
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(Catalog::from_json("{"), Err(CatalogError::Json(_))));
    }
}
