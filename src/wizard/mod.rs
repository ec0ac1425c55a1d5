//! Generic multi-step wizard
//!
//! A wizard is a [`WizardForm`] driven by [`WizardState`]: per-step
//! validation gates forward navigation, and the final step is submitted
//! through a [`SubmissionHandler`].

pub mod errors;
pub mod form;
pub mod http;
pub mod state;
pub mod submit;

#[cfg(test)]
pub(crate) mod test_form;

pub use errors::{FieldErrors, SUBMIT_FIELD};
pub use form::WizardForm;
pub use http::{HttpSubmitter, OutboxEntry, OutboxSubmitter};
pub use state::{Phase, WizardAction, WizardError, WizardState};
pub use submit::{
    extract_evaluation_id, shared, SharedWizard, SubmissionHandler, SubmitError, SubmitRequest,
    SubmitResponse, Submitted, Submitter,
};
