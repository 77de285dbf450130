//! Core types for batch dispatch.
//!
//! Lifecycle of one item:
//! Extracting → Analyzing → Persisting → {Succeeded, Failed}.

use serde::{Serialize, Serializer};
use uuid::Uuid;

// ═══════════════════════════════════════════
// Per-item state
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStage {
    Extracting,
    Analyzing,
    Persisting,
}

impl ItemStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extracting => "extracting",
            Self::Analyzing => "analyzing",
            Self::Persisting => "persisting",
        }
    }
}

impl std::fmt::Display for ItemStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    Recoverable,
    Severe,
}

/// Terminal state of one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Succeeded {
        processed_key: String,
        /// Model output did not parse and a fallback record was stored.
        fallback: bool,
    },
    Failed {
        stage: ItemStage,
        class: FailureClass,
        message: String,
    },
}

impl ItemOutcome {
    pub fn code(&self) -> OutcomeCode {
        match self {
            Self::Succeeded { .. } => OutcomeCode::Succeeded,
            Self::Failed {
                class: FailureClass::Recoverable,
                ..
            } => OutcomeCode::PartialFailure,
            Self::Failed {
                class: FailureClass::Severe,
                ..
            } => OutcomeCode::SevereFailure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReport {
    pub item_id: String,
    pub source_key: String,
    pub outcome: ItemOutcome,
}

// ═══════════════════════════════════════════
// Batch outcome
// ═══════════════════════════════════════════

/// Aggregate batch outcome. Variant order is escalation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum OutcomeCode {
    #[default]
    Succeeded,
    PartialFailure,
    SevereFailure,
}

impl OutcomeCode {
    pub fn code(self) -> u16 {
        match self {
            Self::Succeeded => 200,
            Self::PartialFailure => 202,
            Self::SevereFailure => 500,
        }
    }

    /// Keep the more severe of two outcomes.
    pub fn escalate(self, other: Self) -> Self {
        self.max(other)
    }

    /// Reduce item outcomes by precedence; an empty batch succeeds.
    pub fn reduce<'a>(outcomes: impl IntoIterator<Item = &'a ItemOutcome>) -> Self {
        outcomes
            .into_iter()
            .map(ItemOutcome::code)
            .fold(Self::Succeeded, Self::escalate)
    }
}

impl Serialize for OutcomeCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

/// Full result of one invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub invocation_id: Uuid,
    pub outcome_code: OutcomeCode,
    pub message: String,
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn succeeded_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Succeeded { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.items.len() - self.succeeded_count()
    }

    pub fn response(&self) -> InvocationResponse {
        InvocationResponse {
            outcome_code: self.outcome_code.code(),
            message: self.message.clone(),
        }
    }
}

/// Wire shape returned to the invoker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub outcome_code: u16,
    pub message: String,
}
