//! Rubric generation and criterion helpers

use tracing::debug;

use crate::content::{RubricCriterion, RubricLevel, RubricTemplate};
use crate::evaluation::standard::{RubricMode, StandardEvaluationForm, StandardField};
use crate::wizard::{FieldErrors, WizardAction, WizardState};

/// Propose rubric criteria for the selected objectives
///
/// Without any selected objective the state gains an `oas` error and is
/// otherwise untouched. On success the template's criteria replace the
/// current ones and the rubric mode becomes `ai_generated`.
pub fn generate_ai_rubric(
    state: WizardState<StandardEvaluationForm>,
    template: &RubricTemplate,
) -> WizardState<StandardEvaluationForm> {
    let mut errors = state.errors().clone();

    if state.form().selected_oas.is_empty() {
        errors.insert("oas", "Selecciona al menos un OA para generar rúbrica IA");
        return state.reduce(WizardAction::SetErrors(errors));
    }

    debug!(
        objectives = state.form().selected_oas.len(),
        criteria = template.criteria.len(),
        "generating rubric"
    );
    errors.remove("rubric");
    state
        .reduce(WizardAction::SetField(StandardField::Criteria(
            template.criteria.clone(),
        )))
        .reduce(WizardAction::SetField(StandardField::RubricMode(
            RubricMode::AiGenerated,
        )))
        .reduce(WizardAction::SetErrors(errors))
}

/// Four-level criterion using the standard level names
pub fn criterion(id: usize, name: &str, description: &str, weight: u32) -> RubricCriterion {
    const LEVELS: [(&str, u32); 4] = [
        ("Excelente", 4),
        ("Bueno", 3),
        ("Suficiente", 2),
        ("Insuficiente", 1),
    ];

    RubricCriterion {
        criterion_id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        weight,
        levels: LEVELS
            .iter()
            .enumerate()
            .map(|(i, (level, points))| RubricLevel {
                level_id: (i + 1).to_string(),
                name: level.to_string(),
                description: String::new(),
                points: *points,
            })
            .collect(),
    }
}

/// Sum of criterion weights
pub fn total_weight(criteria: &[RubricCriterion]) -> u32 {
    criteria.iter().map(|c| c.weight).sum()
}

/// Highest score a rubric can award
pub fn max_points(criteria: &[RubricCriterion]) -> u32 {
    criteria
        .iter()
        .map(|c| c.levels.iter().map(|l| l.points).max().unwrap_or(0))
        .sum()
}

/// Errors for a rubric whose weights do not add up to 100
pub fn check_weights(criteria: &[RubricCriterion]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let total = total_weight(criteria);
    if !criteria.is_empty() && total != 100 {
        errors.insert(
            "rubric",
            format!("Los pesos de los criterios suman {}%, deben sumar 100%", total),
        );
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentPack;
    use crate::wizard::WizardForm;

    #[test]
    fn test_generation_requires_objectives() {
        let pack = ContentPack::embedded().unwrap();
        let state = WizardState::<StandardEvaluationForm>::new();

        let state = generate_ai_rubric(state, &pack.rubric);

        assert_eq!(
            state.errors().get("oas"),
            Some("Selecciona al menos un OA para generar rúbrica IA")
        );
        assert!(state.form().rubric_criteria.is_empty());
        assert_eq!(state.form().rubric_mode, RubricMode::Automatic);
    }

    #[test]
    fn test_generation_fills_criteria() {
        let pack = ContentPack::embedded().unwrap();
        let state = WizardState::<StandardEvaluationForm>::new().reduce(WizardAction::SetField(
            StandardField::ToggleObjective("1".into()),
        ));

        let state = generate_ai_rubric(state, &pack.rubric);

        let form = state.form();
        assert_eq!(form.rubric_mode, RubricMode::AiGenerated);
        let names: Vec<_> = form.rubric_criteria.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Precisión Conceptual", "Aplicación Práctica", "Comunicación"]);
        assert_eq!(total_weight(&form.rubric_criteria), 100);
        assert_eq!(max_points(&form.rubric_criteria), 12);
        assert!(form.validate(4).is_empty());
        assert!(form.payload().compliance.ai_rubric_generated);
    }

    #[test]
    fn test_manual_criterion_levels() {
        let c = criterion(1, "Ortografía", "Escribe sin errores", 50);
        assert_eq!(c.levels.len(), 4);
        assert_eq!(c.levels[0].name, "Excelente");
        assert_eq!(c.levels[3].points, 1);
        assert!(check_weights(&[c]).contains("rubric"));
    }
}
