//! `lognorm formats` command handler

use std::io::Write;

use lognorm_core::types::SourceType;
use lognorm_log_pipeline::ParserRegistry;
use serde::Serialize;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `formats` command.
pub fn execute(writer: &OutputWriter) -> Result<(), CliError> {
    let registry = ParserRegistry::new()?;
    let report = FormatsReport::from_registry(&registry);
    writer.render(&report)
}

/// Supported source types and the fields their records carry.
#[derive(Serialize)]
pub struct FormatsReport {
    pub formats: Vec<FormatInfo>,
}

#[derive(Serialize)]
pub struct FormatInfo {
    /// Identifier accepted by `--source-type` and `source_type`
    pub name: &'static str,
    pub description: &'static str,
    /// Fields in emission order; `?` marks optional fields
    pub fields: &'static [&'static str],
}

impl FormatsReport {
    fn from_registry(registry: &ParserRegistry) -> Self {
        let formats = registry
            .registered_formats()
            .into_iter()
            .filter_map(|name| name.parse::<SourceType>().ok())
            .map(FormatInfo::for_source)
            .collect();
        Self { formats }
    }
}

impl FormatInfo {
    fn for_source(source_type: SourceType) -> Self {
        let (description, fields): (&'static str, &'static [&'static str]) = match source_type {
            SourceType::Kernel => (
                "kernel ring buffer log (kern.log)",
                &["t", "host?", "since_start_sec", "since_start_ns", "message"],
            ),
            SourceType::Combined => (
                "Apache/Nginx combined access log",
                &[
                    "host", "user?", "t", "method", "path", "proto", "status", "size", "ref?",
                    "user_agent",
                ],
            ),
            SourceType::ApacheError => (
                "Apache httpd 2.x error log",
                &["t", "level", "pid", "tid?", "client?", "message"],
            ),
            SourceType::Whitespace => (
                "three space-separated fields",
                &["method", "path", "status"],
            ),
            SourceType::Json => (
                "one JSON object per line, nested objects flattened",
                &["<any>"],
            ),
        };
        Self {
            name: source_type.as_str(),
            description,
            fields,
        }
    }
}

impl Render for FormatsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "{:<14} {:<52} {}", "FORMAT", "DESCRIPTION", "FIELDS")?;
        writeln!(w, "{}", "-".repeat(100))?;
        for format in &self.formats {
            writeln!(
                w,
                "{:<14} {:<52} {}",
                format.name.bold(),
                format.description,
                format.fields.join(", ")
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> FormatsReport {
        FormatsReport::from_registry(&ParserRegistry::new().expect("registry"))
    }

    #[test]
    fn test_every_source_type_is_listed() {
        let names: Vec<_> = report().formats.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec!["kernel", "combined", "apache_error", "whitespace", "json"]
        );
    }

    #[test]
    fn test_render_text_lists_formats() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        report().render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("apache_error"));
        assert!(output.contains("since_start_sec"));
    }

    #[test]
    fn test_json_lists_fields() {
        let json = serde_json::to_value(report()).expect("serialize");
        assert_eq!(json["formats"][0]["name"], "kernel");
        assert_eq!(json["formats"][3]["fields"][2], "status");
    }
}
