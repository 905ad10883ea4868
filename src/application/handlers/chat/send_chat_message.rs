//! SendChatMessageHandler - Advance a session by one user message.
//!
//! The whole turn runs under the session's exclusive section, including the
//! generation call. The engine works on a copy of the session and the guard
//! is only assigned once the turn has an outcome, so a dropped request or an
//! expired timeout never leaves a half-applied transition behind.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::dialogue::{DialogueError, Session, Stage, StageTransitionEngine, Step};
use crate::domain::foundation::{SessionId, ValidationError};
use crate::ports::{
    GenerationClient, GenerationError, GenerationRequest, GenerationResponse, SessionStore,
    SessionStoreError,
};

/// Longest accepted user message, in characters.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 4000;

/// Command to send a message in a session
#[derive(Debug, Clone)]
pub struct SendChatMessageCommand {
    pub session_id: SessionId,
    pub message: String,
}

/// Result of sending a message
#[derive(Debug, Clone, PartialEq)]
pub struct SendChatMessageResult {
    pub session_id: SessionId,
    pub reply: String,
    /// Stage the session was committed in.
    pub stage: Stage,
    /// True when this turn returned the final script.
    pub finalized: bool,
}

/// Tunables for the handler
#[derive(Debug, Clone)]
pub struct ChatHandlerConfig {
    /// Upper bound on a single generation call.
    pub generation_timeout: Duration,
    pub max_message_chars: usize,
}

impl Default for ChatHandlerConfig {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(60),
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }
}

impl From<SessionStoreError> for DialogueError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::NotFound(id) => DialogueError::SessionNotFound(id),
        }
    }
}

/// Handler for chat messages
pub struct SendChatMessageHandler {
    store: Arc<dyn SessionStore>,
    client: Arc<dyn GenerationClient>,
    engine: StageTransitionEngine,
    config: ChatHandlerConfig,
}

impl SendChatMessageHandler {
    pub fn new(
        store: Arc<dyn SessionStore>,
        client: Arc<dyn GenerationClient>,
        engine: StageTransitionEngine,
        config: ChatHandlerConfig,
    ) -> Self {
        Self {
            store,
            client,
            engine,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub async fn handle(
        &self,
        cmd: SendChatMessageCommand,
    ) -> Result<SendChatMessageResult, DialogueError> {
        self.validate_message(&cmd.message)?;

        let mut guard = self.store.lock(&cmd.session_id).await;
        let stage_before = guard.stage();

        let result = self.run_turn(&mut guard, &cmd.message).await;

        match &result {
            Ok((_, finalized)) => {
                tracing::info!(
                    session_id = %cmd.session_id,
                    from = %stage_before,
                    to = %guard.stage(),
                    revision = guard.revision_count(),
                    finalized = *finalized,
                    "chat turn committed"
                );
            }
            Err(DialogueError::InvalidState { stage, reason }) => {
                tracing::warn!(
                    session_id = %cmd.session_id,
                    stage = %stage,
                    reason = %reason,
                    "invalid session state, restarting workflow"
                );
                guard.reset();
            }
            Err(DialogueError::GenerationFailure { cause }) => {
                tracing::error!(
                    session_id = %cmd.session_id,
                    stage = %guard.stage(),
                    error = %cause,
                    "script generation failed"
                );
            }
            Err(err) => {
                tracing::error!(session_id = %cmd.session_id, error = %err, "chat turn failed");
            }
        }

        let (reply, finalized) = result?;
        Ok(SendChatMessageResult {
            session_id: cmd.session_id,
            reply,
            stage: guard.stage(),
            finalized,
        })
    }

    /// Rejects blank and oversized messages before the session is touched.
    fn validate_message(&self, message: &str) -> Result<(), ValidationError> {
        if message.trim().is_empty() {
            return Err(ValidationError::empty_field("message"));
        }
        let chars = message.chars().count();
        if chars > self.config.max_message_chars {
            return Err(ValidationError::too_long(
                "message",
                self.config.max_message_chars,
                chars,
            ));
        }
        Ok(())
    }

    /// Runs one turn against the locked session and commits its outcome.
    async fn run_turn(
        &self,
        session: &mut Session,
        message: &str,
    ) -> Result<(String, bool), DialogueError> {
        let step = match self.engine.advance(session, message)? {
            Step::Generate { pending, request } => {
                match self.generate_draft(pending.clone(), request, message).await {
                    Ok(step) => step,
                    Err(err @ DialogueError::GenerationFailure { .. }) => {
                        *session = self.engine.fail_generation(pending)?;
                        return Err(err);
                    }
                    Err(err) => return Err(err),
                }
            }
            step => step,
        };

        match step {
            Step::Reply {
                session: next,
                reply,
            } => {
                *session = next;
                Ok((reply, false))
            }
            Step::Finalize {
                session: next,
                script,
            } => {
                *session = next;
                Ok((StageTransitionEngine::final_reply(&script), true))
            }
            Step::Generate { pending, .. } => Err(DialogueError::invalid_state(
                pending.stage(),
                "generation step left unresolved",
            )),
        }
    }

    async fn generate_draft(
        &self,
        pending: Session,
        request: GenerationRequest,
        message: &str,
    ) -> Result<Step, DialogueError> {
        tracing::debug!(
            session_id = %request.metadata.session_id,
            revision = request.metadata.revision,
            messages = request.messages.len(),
            "requesting draft"
        );

        let response = self.call_with_timeout(request).await?;
        tracing::debug!(
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            "draft received"
        );

        self.engine
            .complete_generation(pending, message, &response.content)
    }

    async fn call_with_timeout(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let limit = self.config.generation_timeout;
        match tokio::time::timeout(limit, self.client.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::timeout(limit.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockError, MockGenerationClient};
    use crate::adapters::storage::InMemorySessionStore;
    use crate::domain::dialogue::{DURATION_PROMPT, TONE_PROMPT, TOPIC_PROMPT};

    fn handler_with(client: MockGenerationClient) -> (SendChatMessageHandler, MockGenerationClient) {
        let handler = SendChatMessageHandler::new(
            Arc::new(InMemorySessionStore::default()),
            Arc::new(client.clone()),
            StageTransitionEngine::default(),
            ChatHandlerConfig {
                generation_timeout: Duration::from_millis(200),
                ..Default::default()
            },
        );
        (handler, client)
    }

    fn cmd(session: &str, message: &str) -> SendChatMessageCommand {
        SendChatMessageCommand {
            session_id: SessionId::new(session).unwrap(),
            message: message.to_string(),
        }
    }

    async fn send(handler: &SendChatMessageHandler, session: &str, message: &str) -> String {
        handler.handle(cmd(session, message)).await.unwrap().reply
    }

    async fn reach_ask_tone(handler: &SendChatMessageHandler, session: &str) {
        for message in ["anything", "sunset jazz", "10 minutes"] {
            send(handler, session, message).await;
        }
    }

    mod happy_path {
        use super::*;

        #[tokio::test]
        async fn full_scenario_produces_and_finalizes_a_draft() {
            let (handler, client) =
                handler_with(MockGenerationClient::new().with_response("Good evening, jazz fans."));

            assert_eq!(send(&handler, "s", "anything").await, TOPIC_PROMPT);
            assert_eq!(send(&handler, "s", "sunset jazz").await, DURATION_PROMPT);
            assert_eq!(send(&handler, "s", "10 minutes").await, TONE_PROMPT);

            let draft = handler.handle(cmd("s", "warm and intimate")).await.unwrap();
            assert!(draft.reply.starts_with("Good evening, jazz fans."));
            assert_eq!(draft.stage, Stage::ConfirmDraft);
            assert!(!draft.finalized);
            assert_eq!(client.call_count(), 1);

            let last = handler.handle(cmd("s", "confirm")).await.unwrap();
            assert_eq!(last.reply, "Here is your final script:\n\nGood evening, jazz fans.");
            assert!(last.finalized);
            assert_eq!(last.stage, Stage::AskTopic);

            assert_eq!(send(&handler, "s", "anything").await, TOPIC_PROMPT);
        }

        #[tokio::test]
        async fn finalize_is_one_shot() {
            let (handler, _) = handler_with(MockGenerationClient::new().with_response("Once."));
            reach_ask_tone(&handler, "s").await;
            send(&handler, "s", "warm").await;

            let first = handler.handle(cmd("s", "confirm")).await.unwrap();
            let second = handler.handle(cmd("s", "confirm")).await.unwrap();

            assert!(first.finalized);
            assert!(!second.finalized);
            assert_eq!(second.reply, TOPIC_PROMPT);
        }

        #[tokio::test]
        async fn revision_regenerates_in_the_same_turn() {
            let (handler, client) = handler_with(
                MockGenerationClient::new()
                    .with_response("Take one.")
                    .with_response("Take two."),
            );
            reach_ask_tone(&handler, "s").await;
            send(&handler, "s", "warm").await;

            let revised = handler.handle(cmd("s", "more upbeat please")).await.unwrap();

            assert!(revised.reply.starts_with("Take two."));
            assert_eq!(revised.stage, Stage::ConfirmDraft);
            let calls = client.get_calls();
            assert!(calls[1].last_user_message().unwrap().contains("Take one."));
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn blank_message_is_rejected_without_creating_session() {
            let (handler, _) = handler_with(MockGenerationClient::new());

            let err = handler.handle(cmd("s", "   ")).await.unwrap_err();

            assert!(matches!(err, DialogueError::Validation(_)));
            assert!(handler.store().is_empty().await);
        }

        #[tokio::test]
        async fn oversized_message_is_rejected() {
            let (handler, _) = handler_with(MockGenerationClient::new());
            let long = "a".repeat(DEFAULT_MAX_MESSAGE_CHARS + 1);

            let err = handler.handle(cmd("s", &long)).await.unwrap_err();

            assert!(matches!(
                err,
                DialogueError::Validation(ValidationError::TooLong { .. })
            ));
        }

        #[tokio::test]
        async fn generation_failure_stays_in_ask_tone_with_tone_set() {
            let (handler, _) = handler_with(MockGenerationClient::new().with_error(
                MockError::Unavailable {
                    message: "down".to_string(),
                },
            ));
            reach_ask_tone(&handler, "s").await;

            let err = handler.handle(cmd("s", "noir")).await.unwrap_err();

            assert!(matches!(err, DialogueError::GenerationFailure { .. }));
            let session = handler.store().get_or_create(&SessionId::new("s").unwrap()).await;
            assert_eq!(session.stage(), Stage::AskTone);
            assert_eq!(session.tone(), Some("noir"));
            assert!(session.draft_script().is_none());
        }

        #[tokio::test]
        async fn timeout_is_a_generation_failure() {
            let (handler, _) = handler_with(
                MockGenerationClient::new()
                    .with_response("too late")
                    .with_delay(Duration::from_secs(5)),
            );
            reach_ask_tone(&handler, "s").await;

            let err = handler.handle(cmd("s", "warm")).await.unwrap_err();

            assert!(matches!(
                err,
                DialogueError::GenerationFailure {
                    cause: GenerationError::Timeout { .. }
                }
            ));
            let session = handler.store().get_or_create(&SessionId::new("s").unwrap()).await;
            assert_eq!(session.stage(), Stage::AskTone);
        }

        #[tokio::test]
        async fn retry_after_failure_generates_again() {
            let (handler, client) = handler_with(
                MockGenerationClient::new()
                    .with_error(MockError::EmptyResponse)
                    .with_response("Second try."),
            );
            reach_ask_tone(&handler, "s").await;

            assert!(handler.handle(cmd("s", "warm")).await.is_err());
            let retry = handler.handle(cmd("s", "warm")).await.unwrap();

            assert!(retry.reply.starts_with("Second try."));
            assert_eq!(client.call_count(), 2);
        }

        #[tokio::test]
        async fn invalid_state_resets_the_session() {
            let (handler, _) = handler_with(MockGenerationClient::new());
            let id = SessionId::new("s").unwrap();
            {
                // A draft-less ConfirmDraft session cannot arise from the engine.
                let mut guard = handler.store().lock(&id).await;
                let created_at = *guard.created_at();
                *guard = Session::reconstitute(
                    id.clone(),
                    Stage::ConfirmDraft,
                    Default::default(),
                    None,
                    0,
                    Default::default(),
                    created_at,
                    created_at,
                );
            }

            let err = handler.handle(cmd("s", "confirm")).await.unwrap_err();

            assert!(matches!(err, DialogueError::InvalidState { .. }));
            let session = handler.store().get_or_create(&id).await;
            assert_eq!(session.stage(), Stage::AskTopic);
        }
    }

    mod isolation {
        use super::*;

        #[tokio::test]
        async fn sessions_progress_independently() {
            let (handler, _) = handler_with(MockGenerationClient::new());

            send(&handler, "a", "hi").await;
            send(&handler, "a", "jazz").await;
            assert_eq!(send(&handler, "b", "hi").await, TOPIC_PROMPT);

            let a = handler.store().get_or_create(&SessionId::new("a").unwrap()).await;
            let b = handler.store().get_or_create(&SessionId::new("b").unwrap()).await;
            assert_eq!(a.stage(), Stage::AskDuration);
            assert_eq!(b.stage(), Stage::CollectTopic);
        }

        #[tokio::test]
        async fn concurrent_messages_on_one_session_are_serialized() {
            let (handler, _) = handler_with(MockGenerationClient::new());
            let handler = Arc::new(handler);

            let tasks: Vec<_> = (0..3)
                .map(|i| {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        handler.handle(cmd("shared", &format!("msg {}", i))).await
                    })
                })
                .collect();
            for task in tasks {
                task.await.unwrap().unwrap();
            }

            let session = handler
                .store()
                .get_or_create(&SessionId::new("shared").unwrap())
                .await;
            assert_eq!(session.stage(), Stage::AskTone);
            assert_eq!(session.history().len(), 6);
        }
    }
}
