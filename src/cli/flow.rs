//! Driving a wizard from the command line
//!
//! Flag mode fills the form up front and walks every step; interactive mode
//! asks per step and lets the user go back. Both end in the same submission.

use console::style;
use miette::Result;
use std::sync::Arc;

use crate::cli::helpers::print_field_errors;
use crate::cli::prompt::{show_errors, step_header, Prompter, StepChoice};
use crate::wizard::{
    shared, SharedWizard, SubmissionHandler, Submitted, Submitter, WizardAction, WizardForm,
    WizardState,
};

/// Advance through every step; stops at the first step that does not validate
pub fn walk_steps<F: WizardForm>(mut state: WizardState<F>) -> Result<WizardState<F>> {
    while !state.is_last_step() {
        let step = state.current_step();
        state.dispatch(WizardAction::NextStep);
        if state.current_step() == step {
            print_field_errors(step, F::step_title(step), state.errors());
            return Err(miette::miette!(
                "step {} is incomplete; fix the fields above",
                step
            ));
        }
    }

    let last = state.validate_current();
    if !last.is_empty() {
        let step = state.current_step();
        print_field_errors(step, F::step_title(step), &last);
        return Err(miette::miette!(
            "step {} is incomplete; fix the fields above",
            step
        ));
    }
    Ok(state)
}

/// Run the wizard interactively; `None` means the user cancelled
///
/// `ask` prompts for the current step and returns the updated state.
pub fn run_interactive<F, A>(mut state: WizardState<F>, mut ask: A) -> Result<Option<WizardState<F>>>
where
    F: WizardForm,
    A: FnMut(&Prompter, WizardState<F>) -> Result<WizardState<F>>,
{
    let prompter = Prompter::new();

    loop {
        step_header(&state);
        if !state.errors().is_empty() {
            show_errors(state.errors());
        }

        state = ask(&prompter, state)?;

        match prompter.step_choice(&state)? {
            StepChoice::Cancel => return Ok(None),
            StepChoice::Back => state.dispatch(WizardAction::PrevStep),
            StepChoice::Next if state.is_last_step() => {
                let errors = state.validate_current();
                if errors.is_empty() {
                    return Ok(Some(state));
                }
                state.dispatch(WizardAction::SetErrors(errors));
            }
            StepChoice::Next => state.dispatch(WizardAction::NextStep),
        }
    }
}

/// Payload JSON for `--dry-run`
pub fn payload_json<F: WizardForm>(state: &WizardState<F>) -> Result<String> {
    serde_json::to_string_pretty(&state.form().payload())
        .map_err(|e| miette::miette!("cannot encode payload: {}", e))
}

/// Submit a completed wizard and report the new evaluation
pub fn submit<F: WizardForm>(
    state: WizardState<F>,
    submitter: Arc<dyn Submitter>,
    quiet: bool,
) -> Result<Submitted> {
    let wizard: SharedWizard<F> = shared(state);
    let handler = SubmissionHandler::new(submitter);
    let rt = crate::cli::helpers::runtime()?;

    let outcome = rt.block_on(handler.submit(&wizard, |id| {
        if !quiet {
            match id {
                Some(id) => {
                    println!("{} Evaluación creada: {}", style("✓").green(), style(id).cyan())
                }
                None => println!("{} Evaluación creada", style("✓").green()),
            }
        }
    }));

    outcome.map_err(|e| {
        let message = rt
            .block_on(wizard.lock())
            .errors()
            .submit_message()
            .unwrap_or(F::SUBMIT_ERROR_MESSAGE)
            .to_string();
        miette::miette!("{}: {}", message, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{GamifiedEvaluationForm, GamifiedField};

    #[test]
    fn test_walk_stops_on_invalid_step() {
        let state = WizardState::<GamifiedEvaluationForm>::new();
        assert!(walk_steps(state).is_err());
    }

    #[test]
    fn test_walk_reaches_final_step() {
        let state = WizardState::<GamifiedEvaluationForm>::new()
            .reduce(WizardAction::SetField(GamifiedField::Title("Quiz 1".into())))
            .reduce(WizardAction::SetField(GamifiedField::ClassId("c1".into())))
            .reduce(WizardAction::SetField(GamifiedField::Objectives(vec![
                "MAT05-OA04".into(),
            ])));

        let state = walk_steps(state).unwrap();
        assert!(state.is_last_step());
        let json = payload_json(&state).unwrap();
        assert!(json.contains("\"type\": \"gamified\""));
    }
}
