//! Turns the compiler's per-function frame report text into
//! `raw_name -> bytes` and normalized `base_name -> bytes` maps.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{normalize_base_name, Finding, Findings};

static NUMBER_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s+\w+\s*$").unwrap());
static FUNCTION_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r":[^:]+:([^\s:]+)\s+").unwrap());

/// Parsed frame report: both the raw per-symbol table and the
/// optimizer-suffix-normalized table (collisions keep the minimum).
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub raw: HashMap<String, u32>,
    pub by_base_name: HashMap<String, u32>,
}

impl FrameReport {
    pub fn get(&self, function_name: &str) -> Option<u32> {
        self.by_base_name
            .get(function_name)
            .copied()
            .or_else(|| self.raw.get(function_name).copied())
    }
}

/// Parses the full text of a frame report.
///
/// A malformed line is skipped with a warning recorded on `findings`;
/// total absence of any parseable line is not itself an error here — it
/// only becomes fatal later, per function, in the reconciliation step if
/// assembly analysis also finds nothing for that function.
pub fn parse_frame_report(text: &str, findings: &mut Findings) -> FrameReport {
    let mut raw = HashMap::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some((name, bytes)) => {
                raw.insert(name, bytes);
            }
            None => findings.push(Finding::MalformedFrameReportLine {
                line: line.to_string(),
            }),
        }
    }

    let mut by_base_name: HashMap<String, u32> = HashMap::new();
    for (name, bytes) in &raw {
        let base = normalize_base_name(name);
        by_base_name
            .entry(base)
            .and_modify(|existing| *existing = (*existing).min(*bytes))
            .or_insert(*bytes);
    }

    FrameReport { raw, by_base_name }
}

fn parse_line(line: &str) -> Option<(String, u32)> {
    let tail = NUMBER_TAIL.captures(line)?;
    let bytes: u32 = tail[1].parse().ok()?;
    let name_caps = FUNCTION_NAME.captures(line)?;
    let name = name_caps[1].to_string();
    Some((name, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_line() {
        let mut findings = Findings::new();
        let report = parse_frame_report("test.c:5:5:rec\t8\tstatic", &mut findings);
        assert!(findings.is_empty());
        assert_eq!(report.raw.get("rec"), Some(&8));
    }

    #[test]
    fn skips_malformed_line_with_warning() {
        let mut findings = Findings::new();
        let report = parse_frame_report("this is not a frame report line", &mut findings);
        assert!(report.raw.is_empty());
        assert_eq!(findings.0.len(), 1);
    }

    #[test]
    fn normalization_keeps_minimum_on_collision() {
        let mut findings = Findings::new();
        let text = "test.c:1:1:foo\t7\tstatic\ntest.c:2:1:foo.constprop.0\t5\tstatic";
        let report = parse_frame_report(text, &mut findings);
        assert_eq!(report.by_base_name.get("foo"), Some(&5));
    }
}
