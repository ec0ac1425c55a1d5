//! Wizard state and its reducer
//!
//! State is never mutated in place by callers: every change goes through
//! [`WizardState::reduce`], which consumes the old state and returns the
//! next one. Submission uses two internal transitions (`begin_submit`,
//! `finish_submit`) driven by the submission handler.

use thiserror::Error;
use tracing::debug;

use crate::wizard::errors::{FieldErrors, SUBMIT_FIELD};
use crate::wizard::form::WizardForm;

/// Lifecycle of the wizard's form data
#[derive(Debug, Clone, PartialEq)]
pub enum Phase<P> {
    /// Fields can change and steps can move
    Editing,
    /// A request is in flight carrying this frozen payload
    Submitting { snapshot: P },
    /// The form was consumed; the id is `None` when the server accepted it
    /// without naming one
    Submitted { evaluation_id: Option<String> },
}

/// User intents understood by the reducer
#[derive(Debug, Clone)]
pub enum WizardAction<U> {
    SetField(U),
    NextStep,
    PrevStep,
    SetErrors(FieldErrors),
}

/// Reasons a submission cannot start
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WizardError {
    #[error("submission is only available on the final step (currently on step {current} of {total})")]
    NotOnFinalStep { current: u8, total: u8 },

    #[error("step {step} is incomplete: {errors}")]
    Invalid { step: u8, errors: FieldErrors },

    #[error("a submission is already in flight")]
    InFlight,

    #[error("this wizard was already submitted")]
    AlreadySubmitted,
}

/// Step index, form data, errors and phase of one wizard instance
#[derive(Debug, Clone)]
pub struct WizardState<F: WizardForm> {
    current_step: u8,
    form: F,
    errors: FieldErrors,
    phase: Phase<F::Payload>,
}

impl<F: WizardForm> Default for WizardState<F> {
    fn default() -> Self {
        Self::with_initial(F::default())
    }
}

impl<F: WizardForm> WizardState<F> {
    /// Empty form on step 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated form on step 1
    pub fn with_initial(form: F) -> Self {
        Self {
            current_step: 1,
            form,
            errors: FieldErrors::new(),
            phase: Phase::Editing,
        }
    }

    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    pub fn total_steps(&self) -> u8 {
        F::TOTAL_STEPS
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn phase(&self) -> &Phase<F::Payload> {
        &self.phase
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step == 1
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == F::TOTAL_STEPS
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, Phase::Submitting { .. })
    }

    /// Run the validator for the current step without storing the result
    pub fn validate_current(&self) -> FieldErrors {
        self.form.validate(self.current_step)
    }

    /// Compute the next state
    pub fn reduce(mut self, action: WizardAction<F::Update>) -> Self {
        if !matches!(self.phase, Phase::Editing) {
            debug!(?action, phase = ?self.phase, "wizard is not editable; action ignored");
            return self;
        }

        match action {
            WizardAction::SetField(update) => {
                self.form.apply(update);
            }
            WizardAction::NextStep => {
                let errors = self.form.validate(self.current_step);
                if errors.is_empty() {
                    self.errors = FieldErrors::new();
                    if self.current_step < F::TOTAL_STEPS {
                        self.current_step += 1;
                    }
                } else {
                    debug!(step = self.current_step, %errors, "step validation failed");
                    self.errors = errors;
                }
            }
            WizardAction::PrevStep => {
                if self.current_step > 1 {
                    self.current_step -= 1;
                }
                self.errors = FieldErrors::new();
            }
            WizardAction::SetErrors(errors) => {
                self.errors = errors;
            }
        }

        self
    }

    /// Apply an action in place
    pub fn dispatch(&mut self, action: WizardAction<F::Update>) {
        let state = std::mem::take(self);
        *self = state.reduce(action);
    }

    /// Re-validate the final step and freeze the payload
    pub(crate) fn begin_submit(&mut self) -> Result<F::Payload, WizardError> {
        match &self.phase {
            Phase::Submitting { .. } => return Err(WizardError::InFlight),
            Phase::Submitted { .. } => return Err(WizardError::AlreadySubmitted),
            Phase::Editing => {}
        }

        if !self.is_last_step() {
            return Err(WizardError::NotOnFinalStep {
                current: self.current_step,
                total: F::TOTAL_STEPS,
            });
        }

        let errors = self.form.validate(self.current_step);
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(WizardError::Invalid {
                step: self.current_step,
                errors,
            });
        }

        let payload = self.form.payload();
        self.errors = FieldErrors::new();
        self.phase = Phase::Submitting {
            snapshot: payload.clone(),
        };
        Ok(payload)
    }

    /// Record the outcome of the in-flight submission
    ///
    /// On failure the wizard returns to editing with the message under
    /// `submit`, so the user can resubmit.
    pub(crate) fn finish_submit(&mut self, outcome: Result<Option<String>, &str>) {
        match outcome {
            Ok(evaluation_id) => {
                self.phase = Phase::Submitted { evaluation_id };
            }
            Err(message) => {
                let mut errors = FieldErrors::new();
                errors.insert(SUBMIT_FIELD, message);
                self.errors = errors;
                self.phase = Phase::Editing;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::test_form::{Field, TestForm};

    fn filled() -> WizardState<TestForm> {
        let mut state = WizardState::<TestForm>::new();
        state.dispatch(WizardAction::SetField(Field::Name("Ana".into())));
        state.dispatch(WizardAction::SetField(Field::Age(10)));
        state
    }

    #[test]
    fn test_next_blocked_by_validation() {
        let state = WizardState::<TestForm>::new().reduce(WizardAction::NextStep);
        assert_eq!(state.current_step(), 1);
        assert!(state.errors().contains("name"));
    }

    #[test]
    fn test_next_advances_and_clears_errors() {
        let state = WizardState::<TestForm>::new()
            .reduce(WizardAction::NextStep)
            .reduce(WizardAction::SetField(Field::Name("Ana".into())))
            .reduce(WizardAction::NextStep);
        assert_eq!(state.current_step(), 2);
        assert!(state.errors().is_empty());
    }

    #[test]
    fn test_prev_is_unguarded() {
        let mut state = filled();
        state.dispatch(WizardAction::NextStep);
        state.dispatch(WizardAction::SetField(Field::Age(500)));
        state.dispatch(WizardAction::NextStep);
        assert_eq!(state.current_step(), 2);
        assert!(!state.errors().is_empty());

        state.dispatch(WizardAction::PrevStep);
        assert_eq!(state.current_step(), 1);
        assert!(state.errors().is_empty());
    }

    #[test]
    fn test_prev_on_first_step_is_noop() {
        let state = WizardState::<TestForm>::new().reduce(WizardAction::PrevStep);
        assert_eq!(state.current_step(), 1);
    }

    #[test]
    fn test_next_on_last_step_stays() {
        let mut state = filled();
        state.dispatch(WizardAction::NextStep);
        state.dispatch(WizardAction::NextStep);
        assert_eq!(state.current_step(), TestForm::TOTAL_STEPS);
    }

    #[test]
    fn test_validation_is_pure() {
        let state = WizardState::<TestForm>::new();
        let before = state.form().clone();
        assert_eq!(state.validate_current(), state.validate_current());
        assert_eq!(state.form(), &before);
    }

    #[test]
    fn test_begin_submit_requires_final_step() {
        let mut state = filled();
        let err = state.begin_submit().unwrap_err();
        assert!(matches!(err, WizardError::NotOnFinalStep { current: 1, total: 2 }));
    }

    #[test]
    fn test_submitting_freezes_form() {
        let mut state = filled();
        state.dispatch(WizardAction::NextStep);
        let payload = state.begin_submit().unwrap();

        state.dispatch(WizardAction::SetField(Field::Name("Changed".into())));
        state.dispatch(WizardAction::PrevStep);
        assert_eq!(state.form().name, "Ana");
        assert_eq!(state.current_step(), 2);
        assert_eq!(state.begin_submit().unwrap_err(), WizardError::InFlight);
        assert_eq!(
            state.phase(),
            &Phase::Submitting { snapshot: payload }
        );
    }

    #[test]
    fn test_failed_submission_returns_to_editing() {
        let mut state = filled();
        state.dispatch(WizardAction::NextStep);
        state.begin_submit().unwrap();
        state.finish_submit(Err("boom"));

        assert_eq!(state.phase(), &Phase::Editing);
        assert_eq!(state.errors().submit_message(), Some("boom"));
        assert!(state.begin_submit().is_ok());
    }

    #[test]
    fn test_submitted_is_terminal() {
        let mut state = filled();
        state.dispatch(WizardAction::NextStep);
        state.begin_submit().unwrap();
        state.finish_submit(Ok(Some("eval-1".into())));

        assert_eq!(state.begin_submit().unwrap_err(), WizardError::AlreadySubmitted);
    }
}
