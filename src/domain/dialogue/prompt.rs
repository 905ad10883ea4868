//! Prompt assembly: turns session state into a generation request.
//!
//! The builder is deterministic. Identical sessions produce identical
//! requests; any randomness comes from the provider's sampling temperature,
//! which is passed through untouched.

use crate::ports::{GenerationRequest, MessageRole, RequestMetadata};

use super::history::TurnRole;
use super::{DialogueError, Session, Stage};

/// Persona used when none is configured.
pub const DEFAULT_PERSONA: &str = "You are Radio AI, a smart radio assistant who writes \
scripts for radio hosts. Write in a warm, conversational voice that sounds natural when \
read aloud. Keep the script to at most 12 sentences. Reply with the script only and never \
comment on being an AI or on how the script was written.";

/// Sampling parameters and persona for generation calls.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptConfig {
    pub persona: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            temperature: 0.8,
            max_output_tokens: 600,
        }
    }
}

/// Composes generation requests.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    config: PromptConfig,
}

impl PromptBuilder {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PromptConfig {
        &self.config
    }

    /// Builds the request for a session in the generation stage.
    ///
    /// The message list is the history window (oldest first) followed by the
    /// brief. A session that still holds a draft is a revision: the brief
    /// carries the previous draft and the new tone as style guidance.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the stage does not generate or a field is missing
    pub fn build(&self, session: &Session) -> Result<GenerationRequest, DialogueError> {
        let stage = session.stage();
        if !stage.generates() {
            return Err(DialogueError::invalid_state(
                stage,
                "prompt requested outside the generation stage",
            ));
        }

        let (topic, duration, tone) = match (session.topic(), session.duration(), session.tone()) {
            (Some(topic), Some(duration), Some(tone)) => (topic, duration, tone),
            _ => {
                return Err(DialogueError::invalid_state(
                    Stage::CollectToneAndGenerate,
                    "topic, duration and tone are required to generate",
                ))
            }
        };

        let brief = match session.draft_script() {
            Some(previous) => revision_brief(topic, duration, tone, previous),
            None => draft_brief(topic, duration, tone),
        };

        let revision = session.revision_count() + u32::from(session.draft_script().is_some());
        let metadata = RequestMetadata::new(session.id().clone(), revision);
        let mut request = GenerationRequest::new(metadata)
            .with_system_prompt(self.config.persona.clone())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_output_tokens);

        for turn in session.history().iter() {
            let role = match turn.role {
                TurnRole::User => MessageRole::User,
                TurnRole::Assistant => MessageRole::Assistant,
            };
            request = request.with_message(role, turn.text.clone());
        }

        Ok(request.with_message(MessageRole::User, brief))
    }
}

fn draft_brief(topic: &str, duration: &str, tone: &str) -> String {
    format!(
        "Write a radio program script.\n\
         Topic: {topic}\n\
         Duration: {duration}\n\
         Tone: {tone}"
    )
}

fn revision_brief(topic: &str, duration: &str, guidance: &str, previous: &str) -> String {
    format!(
        "Revise the radio program script below.\n\
         Topic: {topic}\n\
         Duration: {duration}\n\
         New tone and style guidance: {guidance}\n\n\
         Previous draft:\n{previous}"
    )
}
