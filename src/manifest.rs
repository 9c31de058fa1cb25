use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::domain::{GalleryMode, Threshold};

const FILTER_DELIMITER: &str = "_filter";
const PAIR_DELIMITER: &str = "vs";
const BIN_DELIMITER: &str = "_bin_ge";
const IMAGE_EXTENSION: &str = ".png";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub var1: String,
    pub var2: String,
    pub filter: String,
    pub threshold: Option<Threshold>,
    pub mode: GalleryMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailure {
    NotPng,
    MissingFilter,
    MissingVs,
    MissingBinGe,
    EmptyToken,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ParseFailure::NotPng => "not a .png filename",
            ParseFailure::MissingFilter => "missing `_filter` delimiter",
            ParseFailure::MissingVs => "missing `vs` delimiter",
            ParseFailure::MissingBinGe => "missing `_bin_ge` delimiter",
            ParseFailure::EmptyToken => "empty variable token",
        };
        f.write_str(reason)
    }
}

pub fn parse_line(line: &str) -> Result<ManifestEntry, ParseFailure> {
    let filename = line.trim();
    if !filename.ends_with(IMAGE_EXTENSION) {
        return Err(ParseFailure::NotPng);
    }

    let (pair, rest) = filename
        .split_once(FILTER_DELIMITER)
        .ok_or(ParseFailure::MissingFilter)?;
    let (var1, var2) = pair
        .split_once(PAIR_DELIMITER)
        .ok_or(ParseFailure::MissingVs)?;
    let var1 = non_empty(var1.trim_matches('_'))?;
    let var2 = non_empty(var2.trim_matches('_'))?;

    let (filter, bin) = rest
        .split_once(BIN_DELIMITER)
        .ok_or(ParseFailure::MissingBinGe)?;
    let filter = non_empty(filter.trim_matches('_'))?;

    let mode = if filename.ends_with(GalleryMode::Ratio.suffix()) {
        GalleryMode::Ratio
    } else {
        GalleryMode::Hexbin
    };
    let threshold = bin
        .strip_suffix(mode.suffix())
        .and_then(|value| value.strip_prefix('_'))
        .filter(|value| value.len() == 1 && value.bytes().all(|byte| byte.is_ascii_digit()))
        .and_then(|value| value.parse::<Threshold>().ok());

    Ok(ManifestEntry {
        var1: var1.to_string(),
        var2: var2.to_string(),
        filter: filter.to_string(),
        threshold,
        mode,
    })
}

fn non_empty(token: &str) -> Result<&str, ParseFailure> {
    if token.is_empty() {
        Err(ParseFailure::EmptyToken)
    } else {
        Ok(token)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LookupTable {
    entries: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var1: &str, var2: &str, filter: &str) {
        self.entries
            .entry(var1.to_string())
            .or_default()
            .entry(var2.to_string())
            .or_default()
            .insert(filter.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn var1_options(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn var2_options(&self, var1: &str) -> Vec<&str> {
        self.entries
            .get(var1)
            .map(|inner| inner.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn filter_options(&self, var1: &str, var2: &str) -> Vec<&str> {
        self.entries
            .get(var1)
            .and_then(|inner| inner.get(var2))
            .map(|filters| filters.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, var1: &str, var2: &str, filter: &str) -> bool {
        self.entries
            .get(var1)
            .and_then(|inner| inner.get(var2))
            .map(|filters| filters.contains(filter))
            .unwrap_or(false)
    }

    pub fn combination_count(&self) -> usize {
        self.entries
            .values()
            .flat_map(|inner| inner.values())
            .map(BTreeSet::len)
            .sum()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestReport {
    pub table: LookupTable,
    pub parsed: usize,
    pub skipped: Vec<SkippedLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedLine {
    pub line: String,
    pub reason: ParseFailure,
}

pub fn parse_manifest<I, S>(lines: I) -> LookupTable
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse_manifest_report(lines).table
}

pub fn parse_manifest_report<I, S>(lines: I) -> ManifestReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = ManifestReport::default();
    for line in lines {
        let line = line.as_ref();
        match parse_line(line) {
            Ok(entry) => {
                report.table.insert(&entry.var1, &entry.var2, &entry.filter);
                report.parsed += 1;
            }
            Err(ParseFailure::NotPng) => {}
            Err(reason) => {
                debug!(line, %reason, "skipping manifest line");
                report.skipped.push(SkippedLine {
                    line: line.trim().to_string(),
                    reason,
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_doubled_underscore_layout() {
        let entry =
            parse_line("df1_AMT_CREDIT_vs_df1_DAYS_BIRTH__filter_df1_CODE_GENDER_bin_ge_3.png")
                .unwrap();
        assert_eq!(entry.var1, "df1_AMT_CREDIT");
        assert_eq!(entry.var2, "df1_DAYS_BIRTH");
        assert_eq!(entry.filter, "df1_CODE_GENDER");
        assert_eq!(entry.threshold, Some(Threshold::new(3).unwrap()));
        assert_eq!(entry.mode, GalleryMode::Hexbin);
    }

    #[test]
    fn detects_ratio_suffix() {
        let entry = parse_line("a_vsb_filter_c_bin_ge_9_ratio.png").unwrap();
        assert_eq!(entry.mode, GalleryMode::Ratio);
        assert_eq!(entry.threshold.map(Threshold::value), Some(9));
    }

    #[test]
    fn unparseable_threshold_keeps_entry() {
        let entry = parse_line("a_vsb_filter_c_bin_ge_12.png").unwrap();
        assert_eq!(entry.filter, "c");
        assert_eq!(entry.threshold, None);
    }

    #[test]
    fn threshold_must_be_a_single_digit() {
        for line in [
            "a_vsb_filter_c_bin_ge_+3.png",
            "a_vsb_filter_c_bin_ge_07.png",
            "a_vsb_filter_c_bin_ge_ 3.png",
            "a_vsb_filter_c_bin_ge__3.png",
            "a_vsb_filter_c_bin_ge3.png",
        ] {
            let entry = parse_line(line).unwrap();
            assert_eq!(entry.threshold, None, "{line}");
            assert_eq!(entry.selection(), None, "{line}");
        }
    }

    #[test]
    fn reports_failure_reasons() {
        assert_matches!(parse_line("notes.txt"), Err(ParseFailure::NotPng));
        assert_matches!(
            parse_line("a_vsb_bin_ge_0.png"),
            Err(ParseFailure::MissingFilter)
        );
        assert_matches!(
            parse_line("a_b_filter_c_bin_ge_0.png"),
            Err(ParseFailure::MissingVs)
        );
        assert_matches!(
            parse_line("a_vsb_filter_c_0.png"),
            Err(ParseFailure::MissingBinGe)
        );
        assert_matches!(
            parse_line("_vs_b_filter_c_bin_ge_0.png"),
            Err(ParseFailure::EmptyToken)
        );
        assert_matches!(
            parse_line("a_vsb_filter__bin_ge_0.png"),
            Err(ParseFailure::EmptyToken)
        );
    }

    #[test]
    fn report_counts_skips_but_not_foreign_lines() {
        let report = parse_manifest_report([
            "README",
            "a_vsb_filter_c_bin_ge_0.png",
            "broken.png",
            "",
        ]);
        assert_eq!(report.parsed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, "broken.png");
        assert_eq!(report.skipped[0].reason, ParseFailure::MissingFilter);
    }
}
