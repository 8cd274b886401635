//! Command reports: a `ggq.v1` JSON envelope or a terminal text block.
//!
//! Each command builds one serializable report. The JSON form is the report
//! itself under `data`; the text form comes from [`Report::render`].

use std::fmt;

use serde::Serialize;

use crate::error::{Error, JsonError, Result};

pub const SCHEMA_VERSION: &str = "ggq.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Result of one command, printable as JSON or text.
pub trait Report: Serialize {
    /// Command path as typed, e.g. `"notify diff"`.
    fn command(&self) -> &'static str;

    fn render(&self, text: &mut TextReport);
}

/// Terminal rendering of a report.
///
/// ```text
/// ggq filter show: quest-filters-default
///   status      active
///   search      ""
///
///   Status filter set to active
/// warning: ...
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextReport {
    title: String,
    facts: Vec<(String, String)>,
    rows: Vec<String>,
    warnings: Vec<String>,
}

impl TextReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    /// Labelled value, aligned with the other facts.
    pub fn fact(&mut self, label: impl Into<String>, value: impl fmt::Display) -> &mut Self {
        self.facts.push((label.into(), value.to_string()));
        self
    }

    pub fn row(&mut self, row: impl Into<String>) -> &mut Self {
        self.rows.push(row.into());
        self
    }

    /// Also copied into the JSON envelope's `warnings`.
    pub fn warn(&mut self, warning: impl Into<String>) -> &mut Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl fmt::Display for TextReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;

        let width = self
            .facts
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0);
        for (label, value) in &self.facts {
            write!(f, "\n  {label:<width$}  {value}")?;
        }

        if !self.rows.is_empty() {
            if !self.facts.is_empty() {
                writeln!(f)?;
            }
            for row in &self.rows {
                write!(f, "\n  {row}")?;
            }
        }

        for warning in &self.warnings {
            write!(f, "\nwarning: {warning}")?;
        }
        Ok(())
    }
}

/// Render `report` as text.
pub fn render_text<R: Report>(report: &R) -> TextReport {
    let mut text = TextReport::new(format!("ggq {}", report.command()));
    report.render(&mut text);
    text
}

pub fn emit<R: Report>(options: OutputOptions, report: &R) -> Result<()> {
    let text = render_text(report);

    if options.json {
        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'static str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command: report.command(),
            status: "success",
            data: report,
            warnings: text.warnings().to_vec(),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if !options.quiet {
        println!("{text}");
    }
    Ok(())
}

/// Print a failed command. JSON goes to stdout so callers parse one stream.
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let hint = error_hint(err);
    if !json {
        eprintln!("error: {err}");
        if let Some(hint) = hint {
            eprintln!("hint: {hint}");
        }
        return Ok(());
    }

    #[derive(Serialize)]
    struct ErrorBody {
        message: String,
        code: i32,
        kind: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    }

    #[derive(Serialize)]
    struct Envelope<'a> {
        schema_version: &'static str,
        command: &'a str,
        status: &'static str,
        error: ErrorBody,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<&'static str>,
    }

    let JsonError {
        error: message,
        code,
        details,
    } = JsonError::from(err);
    let payload = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: "error",
        error: ErrorBody {
            message,
            code,
            kind: error_kind(err),
            details,
        },
        hint,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        crate::error::exit_codes::USER_ERROR => "user_error",
        _ => "operation_failed",
    }
}

fn error_hint(err: &Error) -> Option<&'static str> {
    match err {
        Error::InvalidConfig(_) => Some("fix .ggq.toml or pass --config"),
        Error::QuestNotFound(_) => Some("run `ggq progress <file>` without --id to list quest ids"),
        Error::MissingCountScope | Error::InvalidTargetCount(_) | Error::InvalidPeriod(_) => {
            Some("quantitative quests need targetCount > 0, countScope and periodDays > 0")
        }
        Error::UnsupportedQuestKind(_) | Error::InvalidQuestKind { .. } => {
            Some("quest kind must be \"linked\" or \"quantitative\"")
        }
        Error::LockFailed(_) => Some("another ggq process holds the filter store; retry shortly"),
        Error::ProfileUnavailable(_) => Some("check the --profile path and its JSON"),
        _ => None,
    }
}
