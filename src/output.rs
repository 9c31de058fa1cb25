use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ModeSummary, ProgressEvent, ProgressSink, Resolution};
use crate::domain::GalleryMode;
use crate::error::GalleryError;
use crate::labels::format_label;
use crate::manifest::{LookupTable, ManifestReport};
use crate::selection::Selection;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabeledOption {
    pub value: String,
    pub label: String,
}

impl LabeledOption {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            label: format_label(value),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionsResult {
    pub mode: GalleryMode,
    pub manifest_error: Option<String>,
    pub var1: Vec<LabeledOption>,
    pub var2: Option<Vec<LabeledOption>>,
    pub filter: Option<Vec<LabeledOption>>,
    pub combinations: usize,
    pub skipped_lines: usize,
}

impl OptionsResult {
    pub fn unavailable(mode: GalleryMode, message: &str) -> Self {
        Self {
            mode,
            manifest_error: Some(message.to_string()),
            var1: Vec::new(),
            var2: None,
            filter: None,
            combinations: 0,
            skipped_lines: 0,
        }
    }

    pub fn ready(mode: GalleryMode, report: &ManifestReport) -> Self {
        Self {
            mode,
            manifest_error: None,
            var1: labeled(report.table.var1_options()),
            var2: None,
            filter: None,
            combinations: report.table.combination_count(),
            skipped_lines: report.skipped.len(),
        }
    }

    pub fn scope(
        &mut self,
        table: &LookupTable,
        var1: Option<&str>,
        var2: Option<&str>,
    ) -> Result<(), GalleryError> {
        let Some(var1) = var1 else {
            return Ok(());
        };
        let var2_options = table.var2_options(var1);
        let known_var1 = !var2_options.is_empty();
        self.var2 = Some(labeled(var2_options));
        if !known_var1 {
            return Err(GalleryError::UnknownSelection(var1.to_string()));
        }

        let Some(var2) = var2 else {
            return Ok(());
        };
        let filters = table.filter_options(var1, var2);
        let known_pair = !filters.is_empty();
        self.filter = Some(labeled(filters));
        if !known_pair {
            return Err(GalleryError::UnknownSelection(format!("{var1} vs {var2}")));
        }
        Ok(())
    }
}

fn labeled(values: Vec<&str>) -> Vec<LabeledOption> {
    values.into_iter().map(LabeledOption::new).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveResult {
    pub mode: GalleryMode,
    pub selection: Selection,
    pub heading: String,
    pub filename: String,
    pub status: &'static str,
    pub file_id: Option<String>,
    pub bytes: Option<usize>,
    pub message: Option<String>,
    pub notice: Option<String>,
    pub saved_to: Option<String>,
    pub html: Option<String>,
}

impl ResolveResult {
    pub fn new(mode: GalleryMode, selection: &Selection, resolution: &Resolution) -> Self {
        let (file_id, bytes, notice) = match resolution {
            Resolution::Found { file_id, bytes, .. } => {
                (Some(file_id.clone()), Some(bytes.len()), None)
            }
            Resolution::FetchFailed { file_id, .. } => (Some(file_id.clone()), None, None),
            Resolution::NotFound { notice, .. } => (None, None, notice.clone()),
        };
        Self {
            mode,
            selection: selection.clone(),
            heading: crate::labels::heading(&selection.var1, &selection.var2),
            filename: resolution.filename().to_string(),
            status: resolution.status(),
            file_id,
            bytes,
            message: resolution.message(),
            notice,
            saved_to: None,
            html: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelResult {
    pub labels: Vec<LabeledOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModesResult {
    pub modes: Vec<ModeSummary>,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_options(result: &OptionsResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_resolve(result: &ResolveResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_labels(result: &LabelResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_modes(result: &ModesResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, event: ProgressEvent) {
        tracing::debug!(elapsed = ?event.elapsed, "{}", event.message);
    }
}
