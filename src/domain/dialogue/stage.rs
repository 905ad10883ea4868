//! Workflow stages of a script-writing session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// The step of the workflow a session is in.
///
/// `CollectToneAndGenerate` is transient: it is only occupied while a draft is
/// being generated and is never committed to the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing collected yet; the next message triggers the topic question.
    #[default]
    AskTopic,
    /// The topic question was asked; the next message is the topic.
    CollectTopic,
    /// The next message is the program duration.
    AskDuration,
    /// The next message is the tone, which triggers generation.
    AskTone,
    /// A draft is being generated.
    CollectToneAndGenerate,
    /// A draft is awaiting confirmation or revision.
    ConfirmDraft,
}

impl Stage {
    /// All stages in workflow order.
    pub const ALL: [Stage; 6] = [
        Stage::AskTopic,
        Stage::CollectTopic,
        Stage::AskDuration,
        Stage::AskTone,
        Stage::CollectToneAndGenerate,
        Stage::ConfirmDraft,
    ];

    /// Returns the snake_case name of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::AskTopic => "ask_topic",
            Stage::CollectTopic => "collect_topic",
            Stage::AskDuration => "ask_duration",
            Stage::AskTone => "ask_tone",
            Stage::CollectToneAndGenerate => "collect_tone_and_generate",
            Stage::ConfirmDraft => "confirm_draft",
        }
    }

    /// Returns true if a session may be stored in this stage.
    pub fn is_committable(&self) -> bool {
        !matches!(self, Stage::CollectToneAndGenerate)
    }

    /// Returns true if entering this stage requires a generation call.
    pub fn generates(&self) -> bool {
        matches!(self, Stage::CollectToneAndGenerate)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ValidationError::invalid_format("stage", format!("unknown stage '{}'", s)))
    }
}

impl StateMachine for Stage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use Stage::*;
        matches!(
            (self, target),
            (AskTopic, CollectTopic)
                | (CollectTopic, AskDuration)
                | (AskDuration, AskTone)
                | (AskTone, CollectToneAndGenerate)
                | (CollectToneAndGenerate, ConfirmDraft)
                | (CollectToneAndGenerate, AskTone)
                | (ConfirmDraft, AskTopic)
                | (ConfirmDraft, AskTone)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use Stage::*;
        match self {
            AskTopic => vec![CollectTopic],
            CollectTopic => vec![AskDuration],
            AskDuration => vec![AskTone],
            AskTone => vec![CollectToneAndGenerate],
            CollectToneAndGenerate => vec![ConfirmDraft, AskTone],
            ConfirmDraft => vec![AskTopic, AskTone],
        }
    }
}
