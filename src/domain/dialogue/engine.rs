//! Stage transition engine.
//!
//! Decides, for one incoming message, the next stage of a session, whether a
//! draft must be generated, and what to reply. The engine performs no I/O:
//! generation is requested through [`Step::Generate`] and folded back with
//! [`StageTransitionEngine::complete_generation`] or
//! [`StageTransitionEngine::fail_generation`].

use crate::domain::foundation::StateMachine;
use crate::ports::{GenerationError, GenerationRequest};

use super::prompt::PromptBuilder;
use super::{DialogueError, Session, Stage};

/// Asked when a session starts.
pub const TOPIC_PROMPT: &str = "Hi! I'm your radio script assistant. What's today's topic?";

/// Asked once the topic is known.
pub const DURATION_PROMPT: &str = "Great topic! How long should the program run?";

/// Asked once the duration is known.
pub const TONE_PROMPT: &str = "Got it. What tone or style would you like for the script?";

/// Default keyword that finalizes a draft.
pub const DEFAULT_CONFIRMATION_KEYWORD: &str = "confirm";

/// Configuration for transition decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTransitionConfig {
    /// Case-sensitive substring that finalizes a draft.
    pub confirmation_keyword: String,
}

impl Default for StageTransitionConfig {
    fn default() -> Self {
        Self {
            confirmation_keyword: DEFAULT_CONFIRMATION_KEYWORD.to_string(),
        }
    }
}

/// Outcome of advancing a session by one message.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Commit `session` and answer with `reply`.
    Reply { session: Session, reply: String },

    /// A draft must be generated. `pending` sits in the generation stage and
    /// must not be committed as is.
    Generate {
        pending: Session,
        request: GenerationRequest,
    },

    /// The draft was confirmed. `session` is already reset.
    Finalize { session: Session, script: String },
}

impl Step {
    /// Stage the session will be stored in, if this step is committed now.
    pub fn committed_stage(&self) -> Option<Stage> {
        match self {
            Step::Reply { session, .. } | Step::Finalize { session, .. } => Some(session.stage()),
            Step::Generate { .. } => None,
        }
    }
}

/// The script workflow's finite-state machine.
#[derive(Debug, Clone, Default)]
pub struct StageTransitionEngine {
    config: StageTransitionConfig,
    prompt_builder: PromptBuilder,
}

impl StageTransitionEngine {
    pub fn new(config: StageTransitionConfig, prompt_builder: PromptBuilder) -> Self {
        Self {
            config,
            prompt_builder,
        }
    }

    pub fn config(&self) -> &StageTransitionConfig {
        &self.config
    }

    /// Returns true if the message finalizes a draft.
    pub fn is_confirmation(&self, message: &str) -> bool {
        message.contains(self.config.confirmation_keyword.as_str())
    }

    /// Stage a successful turn lands in, given the current stage and message.
    pub fn next_stage(&self, stage: Stage, message: &str) -> Stage {
        match stage {
            Stage::AskTopic => Stage::CollectTopic,
            Stage::CollectTopic => Stage::AskDuration,
            Stage::AskDuration => Stage::AskTone,
            Stage::AskTone | Stage::CollectToneAndGenerate => Stage::ConfirmDraft,
            Stage::ConfirmDraft if self.is_confirmation(message) => Stage::AskTopic,
            Stage::ConfirmDraft => Stage::ConfirmDraft,
        }
    }

    /// Advances `session` by one message.
    ///
    /// `message` is expected to be validated (non-blank) by the caller; it is
    /// trimmed before being stored.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the session's stage and fields disagree
    pub fn advance(&self, session: &Session, message: &str) -> Result<Step, DialogueError> {
        session.validate()?;

        let text = message.trim();
        let mut next = session.clone();

        match session.stage() {
            Stage::AskTopic => self.ask(next, Stage::CollectTopic, message, TOPIC_PROMPT),
            Stage::CollectTopic => {
                next.set_topic(text);
                self.ask(next, Stage::AskDuration, message, DURATION_PROMPT)
            }
            Stage::AskDuration => {
                next.set_duration(text);
                self.ask(next, Stage::AskTone, message, TONE_PROMPT)
            }
            Stage::AskTone => {
                next.set_tone(text);
                self.generate(next)
            }
            Stage::ConfirmDraft => {
                if self.is_confirmation(message) {
                    let script = next.draft_script().unwrap_or_default().to_string();
                    transition(&mut next, Stage::AskTopic)?;
                    next.reset();
                    return Ok(Step::Finalize {
                        session: next,
                        script,
                    });
                }
                next.set_tone(text);
                transition(&mut next, Stage::AskTone)?;
                self.generate(next)
            }
            // validate() rejects a stored generation stage
            Stage::CollectToneAndGenerate => Err(DialogueError::invalid_state(
                Stage::CollectToneAndGenerate,
                "generation stage cannot be advanced",
            )),
        }
    }

    /// Folds a generated draft into the pending session.
    ///
    /// # Errors
    ///
    /// - `GenerationFailure` if the draft is blank
    /// - `InvalidState` if `pending` is not in the generation stage
    pub fn complete_generation(
        &self,
        mut pending: Session,
        message: &str,
        draft: &str,
    ) -> Result<Step, DialogueError> {
        let draft = draft.trim();
        if draft.is_empty() {
            return Err(DialogueError::generation(GenerationError::EmptyResponse));
        }

        let is_revision = pending.draft_script().is_some();
        transition(&mut pending, Stage::ConfirmDraft)?;
        pending.set_draft(draft);
        if is_revision {
            pending.increment_revision();
        }

        let reply = self.draft_reply(draft);
        pending.record_exchange(message, &reply);
        Ok(Step::Reply {
            session: pending,
            reply,
        })
    }

    /// Returns the session to commit after a failed generation.
    ///
    /// The session goes back to `AskTone` with the requested tone kept and no
    /// new draft. Nothing is recorded in the history.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if `pending` is not in the generation stage
    pub fn fail_generation(&self, mut pending: Session) -> Result<Session, DialogueError> {
        transition(&mut pending, Stage::AskTone)?;
        Ok(pending)
    }

    /// Reply shown with a fresh draft.
    pub fn draft_reply(&self, draft: &str) -> String {
        format!(
            "{}\n\nReply \"{}\" to finalize this script, or tell me how you'd like it changed.",
            draft, self.config.confirmation_keyword
        )
    }

    /// Reply shown when a draft is finalized.
    pub fn final_reply(script: &str) -> String {
        format!("Here is your final script:\n\n{}", script)
    }

    fn ask(
        &self,
        mut next: Session,
        target: Stage,
        message: &str,
        prompt: &str,
    ) -> Result<Step, DialogueError> {
        transition(&mut next, target)?;
        next.record_exchange(message, prompt);
        Ok(Step::Reply {
            session: next,
            reply: prompt.to_string(),
        })
    }

    fn generate(&self, mut next: Session) -> Result<Step, DialogueError> {
        transition(&mut next, Stage::CollectToneAndGenerate)?;
        let request = self.prompt_builder.build(&next)?;
        Ok(Step::Generate {
            pending: next,
            request,
        })
    }
}

fn transition(session: &mut Session, target: Stage) -> Result<(), DialogueError> {
    let stage = session.stage();
    let next = stage
        .transition_to(target)
        .map_err(|err| DialogueError::invalid_state(stage, err.to_string()))?;
    session.set_stage(next);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;

    fn engine() -> StageTransitionEngine {
        StageTransitionEngine::default()
    }

    fn new_session() -> Session {
        Session::new(SessionId::new("engine-test").unwrap(), 8)
    }

    fn expect_reply(step: Step) -> (Session, String) {
        match step {
            Step::Reply { session, reply } => (session, reply),
            other => panic!("expected reply, got {:?}", other),
        }
    }

    fn expect_generate(step: Step) -> (Session, GenerationRequest) {
        match step {
            Step::Generate { pending, request } => (pending, request),
            other => panic!("expected generate, got {:?}", other),
        }
    }

    /// Drives a fresh session up to ConfirmDraft with the given draft.
    fn session_with_draft(draft: &str) -> Session {
        let engine = engine();
        let mut session = new_session();
        for message in ["anything", "sunset jazz", "10 minutes"] {
            session = expect_reply(engine.advance(&session, message).unwrap()).0;
        }
        let (pending, _) = expect_generate(engine.advance(&session, "warm and intimate").unwrap());
        expect_reply(engine.complete_generation(pending, "warm and intimate", draft).unwrap()).0
    }

    mod collecting {
        use super::*;

        #[test]
        fn any_first_message_asks_for_topic() {
            let (session, reply) = expect_reply(engine().advance(&new_session(), "hello").unwrap());
            assert_eq!(reply, TOPIC_PROMPT);
            assert_eq!(session.stage(), Stage::CollectTopic);
            assert!(session.topic().is_none());
        }

        #[test]
        fn topic_then_duration_are_stored_trimmed() {
            let engine = engine();
            let session = expect_reply(engine.advance(&new_session(), "hi").unwrap()).0;

            let (session, reply) = expect_reply(engine.advance(&session, "  sunset jazz ").unwrap());
            assert_eq!(reply, DURATION_PROMPT);
            assert_eq!(session.stage(), Stage::AskDuration);
            assert_eq!(session.topic(), Some("sunset jazz"));

            let (session, reply) = expect_reply(engine.advance(&session, "10 minutes").unwrap());
            assert_eq!(reply, TONE_PROMPT);
            assert_eq!(session.stage(), Stage::AskTone);
            assert_eq!(session.duration(), Some("10 minutes"));
        }

        #[test]
        fn each_committed_turn_records_an_exchange() {
            let engine = engine();
            let session = expect_reply(engine.advance(&new_session(), "hi").unwrap()).0;
            let session = expect_reply(engine.advance(&session, "jazz").unwrap()).0;
            assert_eq!(session.history().len(), 4);
        }

        #[test]
        fn advance_does_not_mutate_the_input() {
            let session = new_session();
            let _ = engine().advance(&session, "hello").unwrap();
            assert_eq!(session.stage(), Stage::AskTopic);
            assert!(session.history().is_empty());
        }
    }

    mod generating {
        use super::*;

        #[test]
        fn tone_requests_generation() {
            let engine = engine();
            let mut session = new_session();
            for message in ["anything", "sunset jazz", "10 minutes"] {
                session = expect_reply(engine.advance(&session, message).unwrap()).0;
            }

            let (pending, request) = expect_generate(engine.advance(&session, "warm").unwrap());

            assert_eq!(pending.stage(), Stage::CollectToneAndGenerate);
            assert_eq!(pending.tone(), Some("warm"));
            assert!(request.last_user_message().unwrap().contains("Tone: warm"));
        }

        #[test]
        fn completion_lands_in_confirm_draft() {
            let session = session_with_draft("Good evening, jazz lovers.");
            assert_eq!(session.stage(), Stage::ConfirmDraft);
            assert_eq!(session.draft_script(), Some("Good evening, jazz lovers."));
            assert_eq!(session.revision_count(), 0);
            assert!(session.validate().is_ok());
        }

        #[test]
        fn draft_reply_contains_draft_and_keyword() {
            let reply = engine().draft_reply("Hello listeners");
            assert!(reply.starts_with("Hello listeners"));
            assert!(reply.contains("\"confirm\""));
        }

        #[test]
        fn blank_draft_is_a_generation_failure() {
            let engine = engine();
            let mut session = new_session();
            for message in ["anything", "jazz", "5 minutes"] {
                session = expect_reply(engine.advance(&session, message).unwrap()).0;
            }
            let (pending, _) = expect_generate(engine.advance(&session, "warm").unwrap());

            let err = engine.complete_generation(pending, "warm", "  \n").unwrap_err();
            assert_eq!(
                err,
                DialogueError::GenerationFailure {
                    cause: GenerationError::EmptyResponse
                }
            );
        }

        #[test]
        fn failure_returns_to_ask_tone_keeping_tone() {
            let engine = engine();
            let mut session = new_session();
            for message in ["anything", "jazz", "5 minutes"] {
                session = expect_reply(engine.advance(&session, message).unwrap()).0;
            }
            let history_before = session.history().len();
            let (pending, _) = expect_generate(engine.advance(&session, "noir").unwrap());

            let failed = engine.fail_generation(pending).unwrap();

            assert_eq!(failed.stage(), Stage::AskTone);
            assert_eq!(failed.tone(), Some("noir"));
            assert!(failed.draft_script().is_none());
            assert_eq!(failed.history().len(), history_before);
            assert!(failed.validate().is_ok());
        }

        #[test]
        fn fail_generation_rejects_committed_session() {
            let err = engine().fail_generation(new_session()).unwrap_err();
            assert!(matches!(err, DialogueError::InvalidState { .. }));
        }
    }

    mod confirming {
        use super::*;

        #[test]
        fn keyword_finalizes_and_resets() {
            let session = session_with_draft("The final words.");

            match engine().advance(&session, "yes, confirm please").unwrap() {
                Step::Finalize { session, script } => {
                    assert_eq!(script, "The final words.");
                    assert_eq!(session.stage(), Stage::AskTopic);
                    assert!(session.topic().is_none());
                    assert!(session.duration().is_none());
                    assert!(session.tone().is_none());
                    assert!(session.draft_script().is_none());
                    assert!(session.history().is_empty());
                }
                other => panic!("expected finalize, got {:?}", other),
            }
        }

        #[test]
        fn keyword_match_is_case_sensitive() {
            let session = session_with_draft("Draft");
            let step = engine().advance(&session, "CONFIRM").unwrap();
            assert!(matches!(step, Step::Generate { .. }));
        }

        #[test]
        fn other_messages_regenerate_with_previous_draft() {
            let engine = engine();
            let session = session_with_draft("First take.");

            let (pending, request) =
                expect_generate(engine.advance(&session, "make it funnier").unwrap());

            assert_eq!(pending.topic(), Some("sunset jazz"));
            assert_eq!(pending.duration(), Some("10 minutes"));
            assert_eq!(pending.tone(), Some("make it funnier"));
            let brief = request.last_user_message().unwrap();
            assert!(brief.contains("First take."));
            assert!(brief.contains("make it funnier"));
            assert_eq!(request.metadata.revision, 1);

            let revised = expect_reply(
                engine
                    .complete_generation(pending, "make it funnier", "Second take.")
                    .unwrap(),
            )
            .0;
            assert_eq!(revised.stage(), Stage::ConfirmDraft);
            assert_eq!(revised.draft_script(), Some("Second take."));
            assert_eq!(revised.revision_count(), 1);
        }

        #[test]
        fn failed_revision_keeps_previous_draft_as_context() {
            let engine = engine();
            let session = session_with_draft("First take.");
            let (pending, _) = expect_generate(engine.advance(&session, "darker").unwrap());

            let failed = engine.fail_generation(pending).unwrap();

            assert_eq!(failed.stage(), Stage::AskTone);
            assert_eq!(failed.tone(), Some("darker"));
            assert_eq!(failed.draft_script(), Some("First take."));
        }

        #[test]
        fn custom_keyword_is_honoured() {
            let engine = StageTransitionEngine::new(
                StageTransitionConfig {
                    confirmation_keyword: "ship it".to_string(),
                },
                PromptBuilder::default(),
            );
            assert!(engine.is_confirmation("ok ship it"));
            assert!(!engine.is_confirmation("confirm"));
        }
    }

    mod invalid_state {
        use super::*;
        use crate::domain::dialogue::{HistoryWindow, ScriptFields};
        use crate::domain::foundation::Timestamp;

        #[test]
        fn inconsistent_session_is_rejected() {
            let broken = Session::reconstitute(
                SessionId::new("broken").unwrap(),
                Stage::ConfirmDraft,
                ScriptFields::default(),
                None,
                0,
                HistoryWindow::default(),
                Timestamp::now(),
                Timestamp::now(),
            );

            let err = engine().advance(&broken, "confirm").unwrap_err();
            assert!(matches!(
                err,
                DialogueError::InvalidState {
                    stage: Stage::ConfirmDraft,
                    ..
                }
            ));
        }
    }

    mod next_stage {
        use super::*;

        #[test]
        fn follows_the_workflow_table() {
            let engine = engine();
            assert_eq!(engine.next_stage(Stage::AskTopic, "x"), Stage::CollectTopic);
            assert_eq!(engine.next_stage(Stage::CollectTopic, "x"), Stage::AskDuration);
            assert_eq!(engine.next_stage(Stage::AskDuration, "x"), Stage::AskTone);
            assert_eq!(engine.next_stage(Stage::AskTone, "x"), Stage::ConfirmDraft);
            assert_eq!(engine.next_stage(Stage::ConfirmDraft, "confirm"), Stage::AskTopic);
            assert_eq!(engine.next_stage(Stage::ConfirmDraft, "again"), Stage::ConfirmDraft);
        }

        #[test]
        fn final_reply_wraps_script() {
            assert_eq!(
                StageTransitionEngine::final_reply("Bye"),
                "Here is your final script:\n\nBye"
            );
        }
    }
}
