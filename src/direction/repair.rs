//! Best-effort recovery of JSON objects from generator text.
//!
//! Stages run in order and the first one that parses wins:
//! 1. `Direct`: the slice between the first `{` and the last `}`.
//! 2. `Cleaned`: the same slice with comments and trailing commas removed.
//! 3. `Truncated`: everything from the first `{`, cut back to the last point where the text
//!    was structurally complete, with the still-open containers closed.
//!
//! All scanning is string-literal aware; bytes inside JSON strings are never interpreted.

use serde_json::Value;

/// Which repair stage produced the value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepairStage {
    /// Parsed as-is (after fence stripping and slicing).
    Direct,
    /// Parsed after removing comments and trailing commas.
    Cleaned,
    /// Parsed after truncation recovery.
    Truncated,
}

impl RepairStage {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Cleaned => "cleaned",
            Self::Truncated => "truncated",
        }
    }
}

/// A recovered JSON object.
#[derive(Clone, Debug, PartialEq)]
pub struct RepairedJson {
    /// Parsed object.
    pub value: Value,
    /// Stage that succeeded.
    pub stage: RepairStage,
}

/// Text that no stage could turn into a JSON object.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("generator output could not be repaired into a JSON object ({} bytes)", raw.len())]
pub struct RepairFailure {
    /// The original text.
    pub raw: String,
}

/// Recover a JSON object from raw generator output.
pub fn repair_json_text(raw: &str) -> Result<RepairedJson, RepairFailure> {
    let text = strip_code_fences(raw);
    let Some(open) = text.find('{') else {
        tracing::debug!(bytes = raw.len(), "repair: no opening brace");
        return Err(RepairFailure {
            raw: raw.to_owned(),
        });
    };

    if let Some(close) = text.rfind('}')
        && close > open
    {
        let slice = &text[open..=close];
        if let Some(value) = parse_object(slice) {
            return Ok(RepairedJson {
                value,
                stage: RepairStage::Direct,
            });
        }
        let cleaned = strip_trailing_commas(&strip_comments(slice));
        if let Some(value) = parse_object(&cleaned) {
            tracing::debug!("repair: parsed after comment/trailing-comma cleanup");
            return Ok(RepairedJson {
                value,
                stage: RepairStage::Cleaned,
            });
        }
    }

    let tail = strip_comments(&text[open..]);
    if let Some(closed) = close_truncated(&tail)
        && let Some(value) = parse_object(&closed)
    {
        tracing::debug!(
            kept = closed.len(),
            original = tail.len(),
            "repair: recovered truncated object"
        );
        return Ok(RepairedJson {
            value,
            stage: RepairStage::Truncated,
        });
    }

    Err(RepairFailure {
        raw: raw.to_owned(),
    })
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

/// Remove a surrounding Markdown code fence (with optional language tag), if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let Some(open) = raw.find("```") else {
        return raw.trim();
    };
    let after = &raw[open + 3..];
    let body_start = after
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after.len());
    let body = &after[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Remove `//` line comments and `/* */` block comments outside of strings.
pub fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            out.push(b);
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match (b, bytes.get(i + 1)) {
            (b'"', _) => {
                in_string = true;
                out.push(b);
                i += 1;
            }
            (b'/', Some(b'/')) => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            (b'/', Some(b'*')) => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }
    // Only ASCII bytes outside strings were removed, so UTF-8 stays intact.
    String::from_utf8(out).unwrap_or_default()
}

/// Remove commas directly followed (modulo whitespace) by `}` / `]` or end of input.
pub fn strip_trailing_commas(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            out.push(b);
            continue;
        }
        if b == b'"' {
            in_string = true;
        } else if b == b',' {
            let next = bytes[i + 1..].iter().find(|c| !c.is_ascii_whitespace());
            if matches!(next, None | Some(b'}') | Some(b']')) {
                continue;
            }
        }
        out.push(b);
    }
    String::from_utf8(out).unwrap_or_default()
}

struct Scan {
    open: Vec<u8>,
    last_safe: Option<usize>,
}

/// Track open containers and the last byte offset at which the text could be cut and closed.
///
/// Safe cuts: just after an opening bracket, just before a separating comma, just after a
/// closing bracket, and just after a complete string value. Scanning stops once the top-level
/// container closes.
fn scan(bytes: &[u8]) -> Scan {
    let mut open = Vec::new();
    let mut last_safe = None;
    let mut in_string = false;
    let mut escaped = false;
    let mut string_is_key = false;
    let mut after_colon = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
                if !string_is_key {
                    last_safe = Some(i + 1);
                }
            }
            continue;
        }
        match b {
            b'"' => {
                in_string = true;
                string_is_key = open.last() == Some(&b'}') && !after_colon;
                after_colon = false;
            }
            b'{' => {
                open.push(b'}');
                after_colon = false;
                last_safe = Some(i + 1);
            }
            b'[' => {
                open.push(b']');
                after_colon = false;
                last_safe = Some(i + 1);
            }
            b'}' | b']' => {
                // Stray closers are not structure.
                if open.last() != Some(&b) {
                    continue;
                }
                open.pop();
                after_colon = false;
                last_safe = Some(i + 1);
                // The top-level value is complete; whatever follows is prose.
                if open.is_empty() {
                    break;
                }
            }
            b':' => after_colon = true,
            b',' => {
                after_colon = false;
                last_safe = Some(i);
            }
            c if !c.is_ascii_whitespace() => after_colon = false,
            _ => {}
        }
    }
    Scan { open, last_safe }
}

/// Cut `text` back to its last safe point and append closers for every open container.
pub fn close_truncated(text: &str) -> Option<String> {
    let cut = scan(text.as_bytes()).last_safe?;
    let prefix = &text[..cut];
    let open = scan(prefix.as_bytes()).open;
    let mut out = String::with_capacity(prefix.len() + open.len());
    out.push_str(prefix.trim_end());
    out.extend(open.iter().rev().map(|&c| char::from(c)));
    Some(strip_trailing_commas(&out))
}

#[cfg(test)]
#[path = "../../tests/unit/direction/repair.rs"]
mod tests;
