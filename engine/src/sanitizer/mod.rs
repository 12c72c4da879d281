//! Output sanitization
//!
//! Inference backends are asked for plain prose on the conversational
//! path, but they occasionally leak structured output anyway: a whole
//! JSON object with the reply buried in a field, a fenced code block, or
//! prose with fragments of keys and braces mixed in. This module is the
//! single boundary where that leakage is stripped before text reaches the
//! candidate or the speech synthesizer.
//!
//! `clean` is a total function: it never fails, and it is idempotent
//! (`clean(clean(x)) == clean(x)`). Its output never contains unmatched
//! braces or key-like tokens; when nothing salvageable remains, a fixed
//! fallback phrase is returned instead of the raw artifact.

use regex::Regex;

/// Reply emitted when no human-readable text can be recovered
pub const FALLBACK_REPLY: &str =
    "Let's keep going. Could you tell me a bit more about that?";

/// Field names a backend may wrap the reply in, checked in order
const REPLY_FIELDS: &[&str] = &["reply", "response_text", "spoken_response"];

/// Strips structured-data artifacts from text bound for the voice channel
///
/// Four stages, each attempted only if the previous one did not yield a
/// clean result:
///
/// 1. Full JSON parse, extracting a known reply field
/// 2. Regex extraction of the reply field value from surrounding prose
/// 3. Split on structural delimiters, keeping the longest prose segment
/// 4. Fixed fallback phrase
///
/// Text without structural artifacts passes through unchanged.
pub struct OutputSanitizer {
    field_values: Vec<Regex>,
    key_token: Regex,
}

impl OutputSanitizer {
    /// Create a new sanitizer with patterns for all known reply fields
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile (should never happen
    /// with the hardcoded field names).
    pub fn new() -> anyhow::Result<Self> {
        let mut field_values = Vec::with_capacity(REPLY_FIELDS.len());
        for field in REPLY_FIELDS {
            field_values.push(Regex::new(&format!(
                r#""{field}"\s*:\s*"((?:[^"\\]|\\.)*)""#
            ))?);
        }

        Ok(Self {
            field_values,
            key_token: Regex::new(r#""[A-Za-z_][A-Za-z0-9_]*"\s*:"#)?,
        })
    }

    /// Clean raw backend text into candidate-safe prose
    pub fn clean(&self, raw: &str) -> String {
        let trimmed = raw.trim();

        // Fenced blocks are unwrapped first so the stages see the payload
        let candidate = strip_fence(trimmed).unwrap_or(trimmed).trim();

        if !self.has_artifacts(candidate) {
            return candidate.to_string();
        }

        // Stage 1: full structured parse
        if let Some(value) = extract_reply_field(candidate) {
            return self.finish(&value);
        }

        // Stage 2: field value embedded in prose
        if let Some(value) = self.regex_extract(candidate) {
            return self.finish(&value);
        }

        // Stage 3: longest segment between structural delimiters
        if let Some(value) = self.longest_prose_segment(candidate) {
            return self.finish(&value);
        }

        // Stage 4: nothing salvageable
        FALLBACK_REPLY.to_string()
    }

    /// Guard applied to every extracted value: empty or still-structured
    /// results collapse to the fallback phrase, which keeps `clean`
    /// idempotent and the postcondition unconditional.
    fn finish(&self, value: &str) -> String {
        let value = value.trim();
        // An extracted segment can itself carry a fence
        let value = strip_fence(value).unwrap_or(value).trim();
        if value.is_empty() || self.has_artifacts(value) {
            FALLBACK_REPLY.to_string()
        } else {
            value.to_string()
        }
    }

    /// True when the text carries structured-format residue: a key-like
    /// token, unbalanced braces, or a leading object/array delimiter
    fn has_artifacts(&self, text: &str) -> bool {
        if self.key_token.is_match(text) {
            return true;
        }
        if text.starts_with('{') || text.starts_with('[') {
            return true;
        }
        !braces_balanced(text)
    }

    fn regex_extract(&self, text: &str) -> Option<String> {
        for pattern in &self.field_values {
            if let Some(captures) = pattern.captures(text) {
                if let Some(m) = captures.get(1) {
                    return Some(unescape_json_string(m.as_str()));
                }
            }
        }
        None
    }

    fn longest_prose_segment(&self, text: &str) -> Option<String> {
        // Key tokens are cut out first so "reply": doesn't survive as prose
        let stripped = self.key_token.replace_all(text, " ");

        stripped
            .split(['{', '}', '[', ']'])
            .map(|segment| segment.trim_matches(|c: char| {
                c.is_whitespace() || matches!(c, '"' | ',' | ':')
            }))
            .filter(|segment| !segment.is_empty())
            .max_by_key(|segment| segment.chars().count())
            .map(str::to_string)
    }
}

/// Extract a known reply field from a fully parseable JSON object
fn extract_reply_field(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;
    for field in REPLY_FIELDS {
        if let Some(reply) = object.get(*field).and_then(|v| v.as_str()) {
            return Some(reply.to_string());
        }
    }
    None
}

/// Unwrap the body of a leading markdown code fence, if present
///
/// Works even when there is trailing prose after the closing ```.
fn strip_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;

    // Skip the language tag line (e.g. "json\n")
    let body_start = rest.find('\n')? + 1;
    let body = &rest[body_start..];

    let closing = body.find("```")?;
    Some(&body[..closing])
}

/// Check `{` / `}` balance, respecting string literals
fn braces_balanced(text: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in text.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Undo the escapes a JSON string value carries
fn unescape_json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
