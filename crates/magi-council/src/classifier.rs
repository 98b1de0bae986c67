//! Response classifier with tiered recovery from malformed output.
//!
//! Models answering yes/no questions are instructed to reply with a JSON
//! object, but real replies arrive fenced, truncated, or mangled. The
//! classifier never fails: every string input yields an answer and a
//! classification, degrading to the raw text with an `Info` status when
//! nothing better can be recovered.

use regex::Regex;
use tracing::debug;

use crate::verdict::{Classification, VerdictStatus};

/// Characters stripped during the tier-3 salvage pass.
const JSON_PUNCTUATION: &[char] = &['{', '}', '[', ']', '"', ':'];

/// Parses raw model output into a normalized `(answer, classification)` pair.
///
/// Parsing is idempotent and total: no input makes it panic or return an
/// error. For yes/no questions it attempts, in order:
///
/// 1. strict JSON (after stripping one pair of code fences),
/// 2. regex extraction of the `answer` and `status` fields,
/// 3. best-effort text salvage.
pub struct ResponseClassifier {
    /// Matches `"answer": "<text>"` including newlines, up to the next
    /// quote or the end of a truncated reply.
    answer_field: Regex,
    /// Matches `"status": "<word>"`.
    status_field: Regex,
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseClassifier {
    /// Creates a classifier with the standard repair patterns.
    pub fn new() -> Self {
        Self {
            answer_field: Regex::new(r#"(?s)"answer"\s*:\s*"([^"]+)"#).unwrap(),
            status_field: Regex::new(r#""status"\s*:\s*"(\w+)""#).unwrap(),
        }
    }

    /// Classifies raw model output.
    ///
    /// Open questions (`is_yes_or_no == false`) are never judged: the
    /// trimmed text is the answer and the classification is `Info`.
    pub fn parse(&self, raw: &str, is_yes_or_no: bool) -> (String, Classification) {
        if !is_yes_or_no {
            return (raw.trim().to_string(), Classification::info());
        }

        if let Some(parsed) = self.parse_strict(raw) {
            return parsed;
        }
        debug!("strict JSON parse failed, attempting field extraction");

        if let Some(parsed) = self.parse_repair(raw) {
            return parsed;
        }
        debug!("field extraction failed, falling back to text salvage");

        self.salvage(raw)
    }

    /// Tier 1: strict JSON parse after removing one pair of fence markers.
    fn parse_strict(&self, raw: &str) -> Option<(String, Classification)> {
        let cleaned = strip_fences(raw);
        let value: serde_json::Value = serde_json::from_str(cleaned).ok()?;

        let answer = value
            .get("answer")
            .and_then(|a| a.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| raw.trim().to_string());

        let classification = match value.get("classification") {
            Some(c) => {
                let status = c
                    .get("status")
                    .and_then(|s| s.as_str())
                    .and_then(VerdictStatus::from_keyword)
                    .unwrap_or(VerdictStatus::Info);
                let conditions = if status == VerdictStatus::Conditional {
                    c.get("conditions").and_then(|v| v.as_array()).map(|items| {
                        items
                            .iter()
                            .filter_map(|i| i.as_str())
                            .map(str::to_string)
                            .collect()
                    })
                } else {
                    None
                };
                Classification { status, conditions }
            }
            None => Classification::info(),
        };

        Some((answer, classification))
    }

    /// Tier 2: pull the `answer` and `status` fields out of broken JSON.
    fn parse_repair(&self, raw: &str) -> Option<(String, Classification)> {
        let captured = self.answer_field.captures(raw)?;
        let mut answer = captured[1].to_string();

        // A trailing run of three or more dots marks a truncated reply.
        let trailing_dots = answer.len() - answer.trim_end_matches('.').len();
        if trailing_dots >= 3 {
            answer.truncate(answer.len() - trailing_dots);
        }

        let status = self
            .status_field
            .captures(raw)
            .and_then(|c| VerdictStatus::from_keyword(&c[1]))
            .unwrap_or(VerdictStatus::Info);

        Some((answer, Classification::of(status)))
    }

    /// Tier 3: strip JSON punctuation and look for a bare `answer` token.
    ///
    /// When even that is absent, the raw content is echoed back unmodified.
    fn salvage(&self, raw: &str) -> (String, Classification) {
        let stripped: String = raw.replace(JSON_PUNCTUATION, " ");
        let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

        if let Some(index) = collapsed.find("answer") {
            let after = collapsed[index + "answer".len()..].trim_start();
            if !after.is_empty() {
                return (after.to_string(), Classification::info());
            }
        }

        (raw.to_string(), Classification::info())
    }
}

/// Strips one leading fence marker (bare or `json`-tagged) and one
/// trailing fence marker.
fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}
