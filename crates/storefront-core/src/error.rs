//! Error types for the session runtime.
//!
//! None of these are fatal. A [`Rejection`] means an intent was declined
//! without mutating or broadcasting anything; the caller may retry.

use storefront_logic::quests::{QuestStatus, WrongStatus};
use storefront_logic::upgrades::{MaxLevelReached, UpgradeTrack};

use crate::gateway::ParticipantId;

/// Why an intent was declined at apply time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UnknownParticipant(ParticipantId),
    SlotOutOfRange { slot: usize, slots: usize },
    SlotUnassigned(usize),
    WrongStatus { expected: QuestStatus, found: QuestStatus },
    MaxLevelReached { track: UpgradeTrack, max_level: u8 },
    InsufficientFunds { price: i64, balance: i64 },
    EventOutOfRange { index: usize, events: usize },
    UnknownBuff(u32),
}

impl From<WrongStatus> for Rejection {
    fn from(e: WrongStatus) -> Self {
        Rejection::WrongStatus {
            expected: e.expected,
            found: e.found,
        }
    }
}

impl From<MaxLevelReached> for Rejection {
    fn from(e: MaxLevelReached) -> Self {
        Rejection::MaxLevelReached {
            track: e.track,
            max_level: e.max_level,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::UnknownParticipant(id) => write!(f, "unknown participant {}", id.0),
            Rejection::SlotOutOfRange { slot, slots } => {
                write!(f, "slot {} out of range ({} slots)", slot, slots)
            }
            Rejection::SlotUnassigned(slot) => write!(f, "slot {} has no quest", slot),
            Rejection::WrongStatus { expected, found } => {
                write!(f, "quest status is {:?}, expected {:?}", found, expected)
            }
            Rejection::MaxLevelReached { track, max_level } => {
                write!(f, "{:?} already at max level {}", track, max_level)
            }
            Rejection::InsufficientFunds { price, balance } => {
                write!(f, "price {} exceeds balance {}", price, balance)
            }
            Rejection::EventOutOfRange { index, events } => {
                write!(f, "event index {} out of range ({} events)", index, events)
            }
            Rejection::UnknownBuff(id) => write!(f, "no buff with id {}", id),
        }
    }
}

impl std::error::Error for Rejection {}

/// Errors from encoding or decoding replication frames.
#[derive(Debug)]
pub enum CodecError {
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u8, found: u8 },
}

impl From<Box<bincode::ErrorKind>> for CodecError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        CodecError::Bincode(e)
    }
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Bincode(e) => write!(f, "Serialization error: {}", e),
            CodecError::VersionMismatch { expected, found } => write!(
                f,
                "Frame version mismatch: expected {}, found {}",
                expected, found
            ),
        }
    }
}

impl std::error::Error for CodecError {}

/// Errors from loading or validating a content catalog.
#[derive(Debug)]
pub enum CatalogError {
    Json(serde_json::Error),
    DuplicateQuest(u32),
    DuplicateEvent(u16),
    ZeroTarget(u32),
    MissingStatBase(String),
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Json(e)
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Json(e) => write!(f, "Catalog JSON error: {}", e),
            CatalogError::DuplicateQuest(id) => write!(f, "Duplicate quest id {}", id),
            CatalogError::DuplicateEvent(id) => write!(f, "Duplicate event id {}", id),
            CatalogError::ZeroTarget(id) => write!(f, "Quest {} has a zero target", id),
            CatalogError::MissingStatBase(stat) => write!(f, "No base value for stat {}", stat),
        }
    }
}

impl std::error::Error for CatalogError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_status_converts() {
        let r: Rejection = WrongStatus {
            expected: QuestStatus::Completed,
            found: QuestStatus::Collected,
        }
        .into();
        assert_eq!(
            r,
            Rejection::WrongStatus {
                expected: QuestStatus::Completed,
                found: QuestStatus::Collected
            }
        );
        assert!(r.to_string().contains("Collected"));
    }

    #[test]
    fn funds_message() {
        let r = Rejection::InsufficientFunds {
            price: 200,
            balance: 50,
        };
        assert_eq!(r.to_string(), "price 200 exceeds balance 50");
    }
}
