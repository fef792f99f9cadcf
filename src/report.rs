//! Step-level test report.
//!
//! A [`ReportSink`] receives the log entries of a run in order. [`Report`] keeps them in
//! memory, [`HtmlReport`] additionally renders them into a standalone HTML page (plus a JSON
//! document with the same entries) when flushed.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::{Display, Formatter, Write as _};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Info,
    Pass,
    Fail,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Pass => "pass",
            Severity::Fail => "fail",
        })
    }
}

/// A file attached to a report, e.g. a failure screenshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub path: PathBuf,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
    pub attachment: Option<Attachment>,
    pub at: DateTime<Local>,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report to {path:?}.")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report.")]
    Json(#[from] serde_json::Error),
}

/// Receives the entries of a test run.
pub trait ReportSink {
    /// Appends an entry.
    fn log(&mut self, severity: Severity, message: &str);

    /// Appends an entry carrying the file at `path`.
    fn attach(&mut self, path: &Path, label: &str);

    /// Persists everything logged so far.
    ///
    /// # Errors
    ///
    /// When the report cannot be written.
    fn flush(&mut self) -> Result<(), ReportError>;

    /// Where [`ReportSink::flush`] writes to, if anywhere.
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// An in-memory, append-only report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    title: String,
    entries: Vec<LogEntry>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of entries with the given `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.severity == severity)
            .count()
    }

    /// Renders a standalone HTML page listing every entry.
    pub fn render_html(&self) -> String {
        let mut rows = String::new();
        for entry in &self.entries {
            let attachment = match &entry.attachment {
                None => String::new(),
                Some(attachment) => {
                    let src = escape_html(&attachment.path.to_string_lossy());
                    let label = escape_html(&attachment.label);
                    format!(r#"<br><a href="{src}"><img src="{src}" alt="{label}"></a>"#)
                }
            };
            // Writing into a String cannot fail.
            let _ = writeln!(
                rows,
                r#"<tr class="{severity}"><td>{at}</td><td>{severity}</td><td>{message}{attachment}</td></tr>"#,
                severity = entry.severity,
                at = entry.at.format("%H:%M:%S"),
                message = escape_html(&entry.message),
            );
        }

        let verdict = if self.count(Severity::Fail) == 0 {
            Severity::Pass
        } else {
            Severity::Fail
        };

        indoc::formatdoc! {r#"
            <!DOCTYPE html>
            <html lang="en">
            <head>
            <meta charset="utf-8">
            <title>{title}</title>
            <style>
            body {{ font-family: sans-serif; margin: 2em; }}
            table {{ border-collapse: collapse; width: 100%; }}
            td {{ border-bottom: 1px solid #ddd; padding: 0.4em; vertical-align: top; }}
            tr.pass td:nth-child(2) {{ color: #2e7d32; }}
            tr.fail td:nth-child(2) {{ color: #c62828; font-weight: bold; }}
            img {{ max-width: 640px; margin-top: 0.5em; }}
            </style>
            </head>
            <body>
            <h1>{title}</h1>
            <p class="{verdict}">{passed} passed, {failed} failed</p>
            <table>
            {rows}</table>
            </body>
            </html>
        "#,
            title = escape_html(&self.title),
            verdict = verdict,
            rows = rows,
            passed = self.count(Severity::Pass),
            failed = self.count(Severity::Fail),
        }
    }

    fn push(&mut self, severity: Severity, message: &str, attachment: Option<Attachment>) {
        self.entries.push(LogEntry {
            severity,
            message: message.to_owned(),
            attachment,
            at: Local::now(),
        });
    }
}

impl ReportSink for Report {
    fn log(&mut self, severity: Severity, message: &str) {
        self.push(severity, message, None);
    }

    fn attach(&mut self, path: &Path, label: &str) {
        self.push(
            Severity::Info,
            label,
            Some(Attachment {
                path: path.to_owned(),
                label: label.to_owned(),
            }),
        );
    }

    fn flush(&mut self) -> Result<(), ReportError> {
        Ok(())
    }
}

/// A [`Report`] written to `ScenarioReport_<timestamp>.html` (and `.json`) on flush.
#[derive(Debug)]
pub struct HtmlReport {
    report: Report,
    html_path: PathBuf,
    json_path: PathBuf,
}

impl HtmlReport {
    /// A report for a run started now. Files are written into `dir`.
    pub fn create(dir: &Path, title: impl Into<String>) -> Self {
        let stem = timestamped("ScenarioReport", Local::now());
        Self {
            report: Report::new(title),
            html_path: dir.join(format!("{stem}.html")),
            json_path: dir.join(format!("{stem}.json")),
        }
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn json_path(&self) -> &Path {
        &self.json_path
    }
}

impl ReportSink for HtmlReport {
    fn log(&mut self, severity: Severity, message: &str) {
        self.report.log(severity, message);
    }

    fn attach(&mut self, path: &Path, label: &str) {
        self.report.attach(path, label);
    }

    fn flush(&mut self) -> Result<(), ReportError> {
        if let Some(dir) = self.html_path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ReportError::Io {
                path: dir.to_owned(),
                source,
            })?;
        }

        std::fs::write(&self.html_path, self.report.render_html()).map_err(|source| {
            ReportError::Io {
                path: self.html_path.clone(),
                source,
            }
        })?;

        let json = serde_json::to_string_pretty(&self.report)?;
        std::fs::write(&self.json_path, json).map_err(|source| ReportError::Io {
            path: self.json_path.clone(),
            source,
        })?;

        tracing::info!("Report written to {:?}", self.html_path);
        Ok(())
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.html_path)
    }
}

/// `<prefix>_<yyyyMMdd_HHmmss>`, unique per second.
pub(crate) fn timestamped(prefix: &str, at: DateTime<Local>) -> String {
    format!("{prefix}_{}", at.format("%Y%m%d_%H%M%S"))
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
