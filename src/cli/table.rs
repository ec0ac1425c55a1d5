//! Output helpers for list and show commands
//!
//! Lists render as a table for people and as TSV for pipes; YAML and JSON
//! serialize the underlying records.

use console::{style, Term};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;

/// Rows with a header, ready for tabular output
#[derive(Debug, Default)]
pub struct Rows {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Rows {
    pub fn new<const N: usize>(headers: [&str; N]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tab-separated lines, header first
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for line in std::iter::once(&self.headers).chain(self.rows.iter()) {
            let cells: Vec<String> = line.iter().map(|c| c.replace(['\t', '\n'], " ")).collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
        out
    }

    pub fn to_table(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.clone());
        for row in &self.rows {
            builder.push_record(row.clone());
        }
        builder.build().with(Style::rounded()).to_string()
    }
}

/// Print `rows`, or `records` when a structured format was requested
pub fn print_list<T: Serialize>(
    rows: &Rows,
    records: &T,
    format: OutputFormat,
    noun: &str,
    quiet: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(records, format),
        OutputFormat::Tsv => {
            print!("{}", rows.to_tsv());
            Ok(())
        }
        OutputFormat::Auto => {
            if !Term::stdout().is_term() {
                print!("{}", rows.to_tsv());
                return Ok(());
            }
            if rows.is_empty() {
                println!("No {} found.", noun);
                return Ok(());
            }
            println!("{}", rows.to_table());
            if !quiet {
                println!(
                    "{}",
                    style(format!("{} {}(s) found", rows.len(), noun)).dim()
                );
            }
            Ok(())
        }
    }
}

/// Serialize a value as YAML (the default) or JSON
pub fn print_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tsv_output() {
        let mut rows = Rows::new(["ID", "NAME"]);
        rows.push(vec!["granja".into(), "Granja\tFeliz".into()]);

        assert_eq!(rows.to_tsv(), "ID\tNAME\ngranja\tGranja Feliz\n");
    }

    #[test]
    fn test_table_contains_cells() {
        let mut rows = Rows::new(["ID", "NAME"]);
        rows.push(vec!["espacio".into(), "Espacio".into()]);

        let table = rows.to_table();
        assert!(table.contains("espacio"));
        assert!(table.contains("NAME"));
    }
}
