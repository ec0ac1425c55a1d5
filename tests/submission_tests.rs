//! Submission against a mock platform API

use aula::evaluation::{
    start_game, submit_and_start, GamifiedEvaluationForm, GamifiedField, StandardEvaluationForm,
    StandardField,
};
use aula::wizard::{
    shared, HttpSubmitter, Phase, SharedWizard, SubmissionHandler, SubmitError, WizardAction,
    WizardError, WizardForm, WizardState,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn submitter(server: &MockServer) -> HttpSubmitter {
    HttpSubmitter::new(server.uri(), "test-token", Duration::from_secs(5)).unwrap()
}

/// Apply updates, then walk forward to the last step
fn walked<F: WizardForm>(updates: Vec<F::Update>) -> WizardState<F> {
    let mut state = updates
        .into_iter()
        .fold(WizardState::<F>::new(), |state, update| {
            state.reduce(WizardAction::SetField(update))
        });
    for _ in 1..F::TOTAL_STEPS {
        state.dispatch(WizardAction::NextStep);
    }
    assert!(state.is_last_step(), "errors: {:?}", state.errors());
    state
}

fn ready_standard() -> SharedWizard<StandardEvaluationForm> {
    shared(walked::<StandardEvaluationForm>(vec![
        StandardField::ClassId("class-5b".into()),
        StandardField::Title("Fracciones".into()),
        StandardField::Objectives(vec!["1".into()]),
    ]))
}

fn ready_gamified() -> SharedWizard<GamifiedEvaluationForm> {
    shared(walked::<GamifiedEvaluationForm>(vec![
        GamifiedField::Title("Contando animales".into()),
        GamifiedField::ClassId("class-3b".into()),
        GamifiedField::Objectives(vec!["MAT03-OA01".into()]),
    ]))
}

#[tokio::test]
async fn test_standard_evaluation_created() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/evaluation"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "class_id": "class-5b",
            "title": "Fracciones",
            "oa_ids": ["1"]
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "evaluation": { "evaluation_id": "ev-42" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let wizard = ready_standard();
    let handler = SubmissionHandler::new(submitter(&server));
    let mut seen = None;
    let submitted = handler
        .submit(&wizard, |id| seen = id.map(str::to_string))
        .await
        .unwrap();

    assert_eq!(submitted.evaluation_id.as_deref(), Some("ev-42"));
    assert_eq!(seen.as_deref(), Some("ev-42"));
    assert!(matches!(
        wizard.lock().await.phase(),
        Phase::Submitted { evaluation_id } if evaluation_id.as_deref() == Some("ev-42")
    ));
}

#[tokio::test]
async fn test_accepted_without_id_is_not_sent_twice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/evaluation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let wizard = ready_standard();
    let handler = SubmissionHandler::new(submitter(&server));
    let submitted = handler.submit(&wizard, |_| {}).await.unwrap();
    assert_eq!(submitted.evaluation_id, None);

    let retry = handler.submit(&wizard, |_| {}).await.unwrap_err();
    assert!(matches!(retry, SubmitError::Blocked(WizardError::AlreadySubmitted)));
    assert!(matches!(
        wizard.lock().await.phase(),
        Phase::Submitted { evaluation_id: None }
    ));
}

#[tokio::test]
async fn test_rejection_keeps_form_and_reports_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/evaluation"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "weight" })))
        .mount(&server)
        .await;

    let wizard = ready_standard();
    let handler = SubmissionHandler::new(submitter(&server));
    let err = handler.submit(&wizard, |_| {}).await.unwrap_err();

    assert!(matches!(err, SubmitError::Rejected { status: 400, .. }));
    let state = wizard.lock().await;
    assert!(matches!(state.phase(), Phase::Editing));
    assert_eq!(
        state.errors().submit_message(),
        Some(StandardEvaluationForm::SUBMIT_ERROR_MESSAGE)
    );
    assert_eq!(state.form().title, "Fracciones");
}

#[tokio::test]
async fn test_gamified_creation_opens_game() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/evaluation/gamified"))
        .and(body_partial_json(json!({ "type": "gamified", "class_id": "class-3b" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "evaluation": { "evaluation_id": "gx-7" } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/evaluation/gamified/gx-7/start-game"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "gameSession": {
                "session_id": "game_1",
                "join_code": "ABC123",
                "url": "http://localhost/join/ABC123",
                "status": "waiting"
            }
        })))
        .mount(&server)
        .await;

    let wizard = ready_gamified();
    let handler = SubmissionHandler::new(submitter(&server));
    let outcome = submit_and_start(&handler, &wizard, |_| {}).await.unwrap();

    assert_eq!(outcome.submitted.evaluation_id.as_deref(), Some("gx-7"));
    let game = outcome.game.unwrap();
    assert_eq!(game.join_code, "ABC123");
    assert_eq!(game.status.as_deref(), Some("waiting"));
}

#[tokio::test]
async fn test_gamified_start_failure_is_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/evaluation/gamified"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "evaluation_id": 9 })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/evaluation/gamified/9/start-game"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let wizard = ready_gamified();
    let handler = SubmissionHandler::new(submitter(&server));
    let outcome = submit_and_start(&handler, &wizard, |_| {}).await.unwrap();

    assert_eq!(outcome.submitted.evaluation_id.as_deref(), Some("9"));
    assert!(outcome.game.is_none());
}

#[tokio::test]
async fn test_start_game_without_session_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/evaluation/gamified/gx-1/start-game"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let err = start_game(&submitter(&server), "gx-1").await.unwrap_err();
    assert!(matches!(err, SubmitError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let submitter = HttpSubmitter::new("http://127.0.0.1:9", "t", Duration::from_secs(2)).unwrap();
    let wizard = ready_standard();
    let handler = SubmissionHandler::new(submitter);
    let err = handler.submit(&wizard, |_| {}).await.unwrap_err();

    assert!(matches!(err, SubmitError::Transport(_)));
    assert!(matches!(wizard.lock().await.phase(), Phase::Editing));
}
