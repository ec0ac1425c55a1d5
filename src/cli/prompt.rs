//! Interactive prompts for the wizards and games

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Select};
use miette::{IntoDiagnostic, Result};

use crate::wizard::{FieldErrors, WizardForm, WizardState};

/// What the user wants after filling a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepChoice {
    Next,
    Back,
    Cancel,
}

/// Thin wrapper around dialoguer with a shared theme
pub struct Prompter {
    theme: ColorfulTheme,
}

impl Default for Prompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    pub fn text(&self, prompt: &str, initial: &str) -> Result<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .with_initial_text(initial)
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()
    }

    pub fn number<T>(&self, prompt: &str, default: T) -> Result<T>
    where
        T: Clone + ToString + std::str::FromStr,
        T::Err: ToString,
    {
        Input::<T>::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact_text()
            .into_diagnostic()
    }

    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .into_diagnostic()
    }

    /// Pick one item; returns its index
    pub fn select<T: ToString>(&self, prompt: &str, items: &[T], default: usize) -> Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default.min(items.len().saturating_sub(1)))
            .interact()
            .into_diagnostic()
    }

    /// Pick any number of items; returns their indices
    pub fn multi_select<T: ToString>(
        &self,
        prompt: &str,
        items: &[T],
        checked: &[bool],
    ) -> Result<Vec<usize>> {
        MultiSelect::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .defaults(checked)
            .interact()
            .into_diagnostic()
    }

    /// Ask where to go after a step
    pub fn step_choice<F: WizardForm>(&self, state: &WizardState<F>) -> Result<StepChoice> {
        let forward = if state.is_last_step() {
            "Crear evaluación"
        } else {
            "Siguiente"
        };
        let mut choices = vec![(forward, StepChoice::Next)];
        if !state.is_first_step() {
            choices.push(("Anterior", StepChoice::Back));
        }
        choices.push(("Cancelar", StepChoice::Cancel));

        let labels: Vec<&str> = choices.iter().map(|(label, _)| *label).collect();
        let picked = self.select("¿Qué quieres hacer?", &labels, 0)?;
        Ok(choices[picked].1)
    }
}

/// Heading printed before each step
pub fn step_header<F: WizardForm>(state: &WizardState<F>) {
    let step = state.current_step();
    println!();
    println!(
        "{} Paso {} de {}: {}",
        style("◆").cyan(),
        step,
        state.total_steps(),
        style(F::step_title(step)).bold()
    );
    println!("{}", style("─".repeat(50)).dim());
}

pub fn show_errors(errors: &FieldErrors) {
    for (field, message) in errors.iter() {
        println!("  {} {} {}", style("✗").red(), style(field).yellow(), message);
    }
}
