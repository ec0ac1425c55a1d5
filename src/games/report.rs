//! End-of-game reports rendered with Tera

use rust_embed::Embed;
use tera::Tera;
use thiserror::Error;

use crate::games::counting::CountingResults;
use crate::games::enigma::EnigmaReport;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const COUNTING_TEMPLATE: &str = "counting_results.txt.tera";
const ENIGMA_TEMPLATE: &str = "enigma_report.txt.tera";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),
}

pub struct ReportRenderer {
    tera: Tera,
}

impl ReportRenderer {
    /// Load the embedded report templates
    pub fn new() -> Result<Self, ReportError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| ReportError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    pub fn counting(
        &self,
        set_name: &str,
        results: &CountingResults,
        show_answers: bool,
    ) -> Result<String, ReportError> {
        let mut context = tera::Context::new();
        context.insert("set_name", set_name);
        context.insert("results", results);
        context.insert("show_answers", &show_answers);
        self.render(COUNTING_TEMPLATE, &context)
    }

    pub fn enigma(&self, report: &EnigmaReport) -> Result<String, ReportError> {
        let mut context = tera::Context::new();
        context.insert("report", report);
        self.render(ENIGMA_TEMPLATE, &context)
    }

    fn render(&self, name: &str, context: &tera::Context) -> Result<String, ReportError> {
        if !self.tera.get_template_names().any(|n| n == name) {
            return Err(ReportError::NotFound(name.to_string()));
        }
        self.tera
            .render(name, context)
            .map_err(|e| ReportError::RenderError(e.to_string()))
    }
}
