//! Property tests for the dialogue state machine.
//!
//! Random message sequences with random generation outcomes are driven
//! through the engine the same way the chat handler drives it. After every
//! turn the committed session must be consistent and its history bounded.

use proptest::prelude::*;

use radio_script_studio::domain::dialogue::{
    DialogueError, PromptBuilder, Session, Stage, StageTransitionEngine, Step,
};
use radio_script_studio::domain::foundation::SessionId;

#[derive(Debug, Clone)]
enum Outcome {
    Draft(String),
    Blank,
    Failure,
}

fn outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        3 => "[a-zA-Z ,.!]{1,40}".prop_map(Outcome::Draft),
        1 => Just(Outcome::Blank),
        1 => Just(Outcome::Failure),
    ]
}

fn message() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-zA-Z0-9 ]{1,30}",
        1 => Just("confirm".to_string()),
        1 => Just("please confirm this".to_string()),
        1 => Just("CONFIRM".to_string()),
    ]
}

/// Runs one turn and returns the session that would be committed.
fn run_turn(
    engine: &StageTransitionEngine,
    session: &Session,
    message: &str,
    outcome: &Outcome,
) -> Result<Session, DialogueError> {
    let step = match engine.advance(session, message)? {
        Step::Generate { pending, request } => {
            assert!(request.last_user_message().is_some());
            let generated = match outcome {
                Outcome::Draft(text) => engine.complete_generation(pending.clone(), message, text),
                Outcome::Blank => engine.complete_generation(pending.clone(), message, "  "),
                Outcome::Failure => return engine.fail_generation(pending),
            };
            match generated {
                Ok(step) => step,
                Err(DialogueError::GenerationFailure { .. }) => {
                    return engine.fail_generation(pending)
                }
                Err(err) => return Err(err),
            }
        }
        step => step,
    };

    match step {
        Step::Reply { session, .. } | Step::Finalize { session, .. } => Ok(session),
        Step::Generate { .. } => unreachable!("generation was resolved above"),
    }
}

proptest! {
    #[test]
    fn committed_sessions_stay_consistent(
        max_history in 2usize..12,
        turns in prop::collection::vec((message(), outcome()), 1..40),
    ) {
        let engine = StageTransitionEngine::new(Default::default(), PromptBuilder::default());
        let mut session = Session::new(SessionId::new("prop").unwrap(), max_history);

        for (message, outcome) in &turns {
            session = run_turn(&engine, &session, message, outcome).unwrap();

            prop_assert!(Stage::ALL.contains(&session.stage()));
            prop_assert!(session.stage().is_committable());
            prop_assert!(session.validate().is_ok());
            prop_assert!(session.history().len() <= max_history);
        }
    }

    #[test]
    fn drafts_only_exist_while_awaiting_confirmation_or_revision(
        turns in prop::collection::vec((message(), outcome()), 1..40),
    ) {
        let engine = StageTransitionEngine::new(Default::default(), PromptBuilder::default());
        let mut session = Session::new(SessionId::new("prop").unwrap(), 8);

        for (message, outcome) in &turns {
            session = run_turn(&engine, &session, message, outcome).unwrap();

            match session.stage() {
                Stage::ConfirmDraft => prop_assert!(session.draft_script().is_some()),
                Stage::AskTopic | Stage::CollectTopic | Stage::AskDuration => {
                    prop_assert!(session.draft_script().is_none());
                    prop_assert_eq!(session.revision_count(), 0);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn next_stage_predicts_where_a_turn_lands(
        turns in prop::collection::vec((message(), outcome()), 1..30),
    ) {
        let engine = StageTransitionEngine::new(Default::default(), PromptBuilder::default());
        let mut session = Session::new(SessionId::new("prop").unwrap(), 8);

        for (message, outcome) in &turns {
            let predicted = engine.next_stage(session.stage(), message);
            let step = engine.advance(&session, message).unwrap();

            match &step {
                Step::Generate { pending, .. } => {
                    prop_assert_eq!(pending.stage(), Stage::CollectToneAndGenerate);
                    prop_assert_eq!(predicted, Stage::ConfirmDraft);
                }
                other => prop_assert_eq!(other.committed_stage(), Some(predicted)),
            }

            session = run_turn(&engine, &session, message, outcome).unwrap();
        }
    }
}
