//! The contract a concrete multi-step form implements

use serde::Serialize;
use std::fmt::Debug;

use crate::wizard::errors::FieldErrors;

/// A form that can be driven through the wizard state machine
///
/// `validate` must be pure: it may only read `self` and must return the
/// same errors for the same data.
pub trait WizardForm: Clone + Debug + Default + Send + 'static {
    /// Number of steps; steps are numbered `1..=TOTAL_STEPS`
    const TOTAL_STEPS: u8;

    /// Path the payload is POSTed to, relative to the API base URL
    const ENDPOINT: &'static str;

    /// Message stored under `submit` when the submission fails for any reason
    const SUBMIT_ERROR_MESSAGE: &'static str;

    /// A single field change
    type Update: Clone + Debug + Send;

    /// Request body built from the accumulated form data
    type Payload: Serialize + Clone + Debug + Send + Sync + 'static;

    /// Heading shown for a step
    fn step_title(step: u8) -> &'static str;

    /// Check the fields owned by `step`
    fn validate(&self, step: u8) -> FieldErrors;

    /// Apply a single field change
    fn apply(&mut self, update: Self::Update);

    /// Compose the request payload
    fn payload(&self) -> Self::Payload;
}
