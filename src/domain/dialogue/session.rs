//! Session aggregate: one user's progress through the script workflow.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SessionId, Timestamp};

use super::history::{HistoryWindow, TurnRole};
use super::{DialogueError, Stage};

/// Script parameters collected from the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFields {
    pub topic: Option<String>,
    pub duration: Option<String>,
    pub tone: Option<String>,
}

impl ScriptFields {
    /// Returns true once topic, duration and tone are all present.
    pub fn is_complete(&self) -> bool {
        self.topic.is_some() && self.duration.is_some() && self.tone.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Session aggregate.
///
/// # Invariants
///
/// - `stage` only changes along [`Stage`]'s transition table
/// - `CollectTopic` has no fields; `AskDuration` has a topic; `AskTone` has
///   topic and duration; `ConfirmDraft` has all three plus a draft
/// - `history` never holds more than its configured capacity
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: SessionId,
    stage: Stage,
    fields: ScriptFields,
    draft_script: Option<String>,
    revision_count: u32,
    history: HistoryWindow,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Session {
    /// Creates a fresh session at `AskTopic`.
    pub fn new(id: SessionId, max_history: usize) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            stage: Stage::AskTopic,
            fields: ScriptFields::default(),
            draft_script: None,
            revision_count: 0,
            history: HistoryWindow::new(max_history),
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitute a session from stored parts (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SessionId,
        stage: Stage,
        fields: ScriptFields,
        draft_script: Option<String>,
        revision_count: u32,
        history: HistoryWindow,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            stage,
            fields,
            draft_script,
            revision_count,
            history,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn fields(&self) -> &ScriptFields {
        &self.fields
    }

    pub fn topic(&self) -> Option<&str> {
        self.fields.topic.as_deref()
    }

    pub fn duration(&self) -> Option<&str> {
        self.fields.duration.as_deref()
    }

    pub fn tone(&self) -> Option<&str> {
        self.fields.tone.as_deref()
    }

    pub fn draft_script(&self) -> Option<&str> {
        self.draft_script.as_deref()
    }

    /// Number of regenerations of the current draft.
    pub fn revision_count(&self) -> u32 {
        self.revision_count
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Consistency
    // ─────────────────────────────────────────────────────────────────────────

    /// Checks that the stored stage agrees with the collected fields.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the session is in the transient generation stage or
    ///   lacks a field its stage requires
    pub fn validate(&self) -> Result<(), DialogueError> {
        let missing = |name: &str| {
            Err(DialogueError::invalid_state(
                self.stage,
                format!("{} is required at this stage", name),
            ))
        };

        match self.stage {
            Stage::AskTopic => Ok(()),
            Stage::CollectTopic => {
                if self.fields != ScriptFields::default() {
                    return Err(DialogueError::invalid_state(
                        self.stage,
                        "fields are set before the topic was collected",
                    ));
                }
                Ok(())
            }
            Stage::AskDuration => {
                if self.fields.topic.is_none() {
                    return missing("topic");
                }
                Ok(())
            }
            Stage::AskTone => {
                if self.fields.topic.is_none() {
                    return missing("topic");
                }
                if self.fields.duration.is_none() {
                    return missing("duration");
                }
                Ok(())
            }
            Stage::CollectToneAndGenerate => Err(DialogueError::invalid_state(
                self.stage,
                "generation stage cannot be stored",
            )),
            Stage::ConfirmDraft => {
                if !self.fields.is_complete() {
                    return missing("topic, duration and tone");
                }
                if self.draft_script.is_none() {
                    return missing("draft_script");
                }
                Ok(())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations (driven by the transition engine)
    // ─────────────────────────────────────────────────────────────────────────

    /// Clears every field and the history, returning to `AskTopic`.
    pub fn reset(&mut self) {
        self.stage = Stage::AskTopic;
        self.fields.clear();
        self.draft_script = None;
        self.revision_count = 0;
        self.history.clear();
        self.touch();
    }

    /// Records a committed exchange, user turn first.
    pub fn record_exchange(&mut self, user_text: &str, assistant_text: &str) {
        self.history.append(TurnRole::User, user_text);
        self.history.append(TurnRole::Assistant, assistant_text);
        self.touch();
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
        self.touch();
    }

    pub(crate) fn set_topic(&mut self, topic: impl Into<String>) {
        self.fields.topic = Some(topic.into());
    }

    pub(crate) fn set_duration(&mut self, duration: impl Into<String>) {
        self.fields.duration = Some(duration.into());
    }

    pub(crate) fn set_tone(&mut self, tone: impl Into<String>) {
        self.fields.tone = Some(tone.into());
    }

    pub(crate) fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft_script = Some(draft.into());
    }

    pub(crate) fn increment_revision(&mut self) {
        self.revision_count = self.revision_count.saturating_add(1);
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
