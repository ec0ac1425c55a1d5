//! Submission handler and the submitter abstraction
//!
//! The handler owns the rules around a submission: final-step
//! re-validation, a single request in flight, and a uniform failure
//! message. How the payload travels is up to the [`Submitter`].

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::wizard::form::WizardForm;
use crate::wizard::state::{WizardError, WizardState};

/// A JSON body bound for an API path
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Path relative to the API base URL, starting with `/`
    pub endpoint: String,
    pub body: Value,
}

/// Server reply to an accepted request
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    pub status: u16,
    pub body: Value,
}

/// Errors from submitting a wizard
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Blocked(#[from] WizardError),

    #[error("no API URL configured. Set api_url in .aula/config.yaml or AULA_API_URL")]
    MissingApiUrl,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("server rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("{0} is not available offline")]
    Offline(String),

    #[error("cannot write outbox entry {path}: {message}")]
    Outbox { path: PathBuf, message: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("cannot encode payload: {0}")]
    Serialize(String),
}

impl SubmitError {
    /// True when the request was refused because another one is in flight
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmitError::Blocked(WizardError::InFlight))
    }
}

/// Transport for wizard payloads
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Deliver one request; any non-success outcome is an error
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse, SubmitError>;

    /// Submitter identifier for logging
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<S: Submitter + ?Sized> Submitter for Arc<S> {
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse, SubmitError> {
        (**self).submit(request).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Wizard state shared between the editor and the submission task
pub type SharedWizard<F> = Arc<Mutex<WizardState<F>>>;

/// Wrap a wizard for use with [`SubmissionHandler`]
pub fn shared<F: WizardForm>(state: WizardState<F>) -> SharedWizard<F> {
    Arc::new(Mutex::new(state))
}

/// Result of a successful submission
#[derive(Debug, Clone)]
pub struct Submitted {
    /// `None` when the server accepted the request without naming an id
    pub evaluation_id: Option<String>,
    /// Full server reply, for follow-up requests
    pub response: Value,
}

/// Drives a wizard's final submission through a [`Submitter`]
pub struct SubmissionHandler<S> {
    submitter: S,
}

impl<S: Submitter> SubmissionHandler<S> {
    pub fn new(submitter: S) -> Self {
        Self { submitter }
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Submit the wizard's accumulated form
    ///
    /// The lock is released while the request is in flight so the wizard
    /// stays observable. Any accepted reply is terminal, even one without a
    /// recognisable id, so a retry cannot create a duplicate. `on_success`
    /// receives the id, when there is one, once the wizard is submitted.
    pub async fn submit<F, C>(
        &self,
        wizard: &SharedWizard<F>,
        on_success: C,
    ) -> Result<Submitted, SubmitError>
    where
        F: WizardForm,
        C: FnOnce(Option<&str>),
    {
        let payload = {
            let mut state = wizard.lock().await;
            state.begin_submit()?
        };

        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => {
                wizard
                    .lock()
                    .await
                    .finish_submit(Err(F::SUBMIT_ERROR_MESSAGE));
                return Err(SubmitError::Serialize(e.to_string()));
            }
        };

        info!(
            "submitting to {} via {}",
            F::ENDPOINT,
            self.submitter.name()
        );

        let outcome = self
            .submitter
            .submit(SubmitRequest {
                endpoint: F::ENDPOINT.to_string(),
                body,
            })
            .await;

        let mut state = wizard.lock().await;
        match outcome {
            Ok(response) => {
                debug!(status = response.status, "submission accepted");
                let evaluation_id = extract_evaluation_id(&response.body);
                state.finish_submit(Ok(evaluation_id.clone()));
                drop(state);
                match &evaluation_id {
                    Some(id) => info!("created evaluation {}", id),
                    None => warn!("submission accepted but the reply names no evaluation id"),
                }
                on_success(evaluation_id.as_deref());
                Ok(Submitted {
                    evaluation_id,
                    response: response.body,
                })
            }
            Err(e) => {
                warn!("submission via {} failed: {}", self.submitter.name(), e);
                state.finish_submit(Err(F::SUBMIT_ERROR_MESSAGE));
                Err(e)
            }
        }
    }
}

/// Locate the evaluation id in a creation response
///
/// Accepts `{"evaluation": {"evaluation_id"}}` and a few flatter shapes;
/// numeric ids are converted to strings.
pub fn extract_evaluation_id(body: &Value) -> Option<String> {
    const POINTERS: [&str; 4] = [
        "/evaluation/evaluation_id",
        "/evaluation_id",
        "/evaluation/id",
        "/id",
    ];

    POINTERS.iter().find_map(|pointer| match body.pointer(pointer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::state::{Phase, WizardAction};
    use crate::wizard::test_form::{Field, ScriptedSubmitter, TestForm};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ready() -> SharedWizard<TestForm> {
        let state = WizardState::<TestForm>::new()
            .reduce(WizardAction::SetField(Field::Name("Ana".into())))
            .reduce(WizardAction::SetField(Field::Age(30)))
            .reduce(WizardAction::NextStep);
        shared(state)
    }

    #[tokio::test]
    async fn test_success_reaches_submitted_and_calls_back() {
        let wizard = ready();
        let handler = SubmissionHandler::new(ScriptedSubmitter::ok("ev-42"));
        let calls = AtomicUsize::new(0);

        let submitted = handler
            .submit(&wizard, |id| {
                assert_eq!(id, Some("ev-42"));
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        assert_eq!(submitted.evaluation_id.as_deref(), Some("ev-42"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            wizard.lock().await.phase(),
            &Phase::Submitted {
                evaluation_id: Some("ev-42".into())
            }
        );

        let requests = handler.submitter().requests.lock().unwrap();
        assert_eq!(requests[0].endpoint, "/api/test");
        assert_eq!(requests[0].body, json!({ "name": "Ana", "age": 30 }));
    }

    #[tokio::test]
    async fn test_invalid_final_step_issues_no_request() {
        let wizard = ready();
        wizard
            .lock()
            .await
            .dispatch(WizardAction::SetField(Field::Age(0)));
        let handler = SubmissionHandler::new(ScriptedSubmitter::ok("never"));

        let err = handler.submit(&wizard, |_| {}).await.unwrap_err();

        assert!(matches!(err, SubmitError::Blocked(WizardError::Invalid { step: 2, .. })));
        assert_eq!(handler.submitter().count(), 0);
        let state = wizard.lock().await;
        assert!(state.errors().contains("age"));
        assert_eq!(state.phase(), &Phase::Editing);
    }

    #[tokio::test]
    async fn test_rejection_stores_generic_message() {
        let wizard = ready();
        let handler = SubmissionHandler::new(ScriptedSubmitter::failing(500));

        let err = handler.submit(&wizard, |_| panic!("no callback")).await.unwrap_err();

        assert!(matches!(err, SubmitError::Rejected { status: 500, .. }));
        let state = wizard.lock().await;
        assert_eq!(state.errors().submit_message(), Some("could not save"));
        assert_eq!(state.phase(), &Phase::Editing);
        assert_eq!(handler.submitter().count(), 1);
    }

    #[tokio::test]
    async fn test_accepted_without_id_is_still_submitted() {
        let wizard = ready();
        let handler = SubmissionHandler::new(ScriptedSubmitter::replying(json!({ "ok": true })));
        let mut seen = Some("unset".to_string());

        let submitted = handler
            .submit(&wizard, |id| seen = id.map(str::to_string))
            .await
            .unwrap();

        assert_eq!(submitted.evaluation_id, None);
        assert_eq!(seen, None);
        assert_eq!(
            wizard.lock().await.phase(),
            &Phase::Submitted { evaluation_id: None }
        );
        assert!(wizard.lock().await.errors().submit_message().is_none());

        let again = handler.submit(&wizard, |_| {}).await.unwrap_err();
        assert!(matches!(again, SubmitError::Blocked(WizardError::AlreadySubmitted)));
        assert_eq!(handler.submitter().count(), 1);
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_rejected() {
        let wizard = ready();
        let handler = Arc::new(SubmissionHandler::new(ScriptedSubmitter::ok("ev-1").gated()));

        let first = {
            let wizard = wizard.clone();
            let handler = handler.clone();
            tokio::spawn(async move { handler.submit(&wizard, |_| {}).await })
        };

        while handler.submitter().count() == 0 {
            tokio::task::yield_now().await;
        }

        let second = handler.submit(&wizard, |_| {}).await.unwrap_err();
        assert!(second.is_in_flight());

        {
            let mut state = wizard.lock().await;
            state.dispatch(WizardAction::SetField(Field::Name("Changed".into())));
            assert_eq!(state.form().name, "Ana");
            assert!(state.is_submitting());
        }

        handler.submitter().release();
        let submitted = first.await.unwrap().unwrap();
        assert_eq!(submitted.evaluation_id.as_deref(), Some("ev-1"));
        assert_eq!(handler.submitter().count(), 1);
    }

    #[test]
    fn test_extract_evaluation_id_shapes() {
        assert_eq!(
            extract_evaluation_id(&json!({ "evaluation": { "evaluation_id": "a" } })),
            Some("a".into())
        );
        assert_eq!(extract_evaluation_id(&json!({ "id": 7 })), Some("7".into()));
        assert_eq!(extract_evaluation_id(&json!({ "evaluation_id": "" })), None);
        assert_eq!(extract_evaluation_id(&Value::Null), None);
    }
}
