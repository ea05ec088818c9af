use std::fmt;

use serde_json::Value;

use crate::foundation::core::Rgb;
use crate::model::direction::CinematicDirection;

/// Tolerance for chapter boundary comparisons.
pub const RATIO_TOLERANCE: f64 = 1e-3;

/// Minimum number of chapters in a valid document.
pub const MIN_CHAPTERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefectPathElem {
    Field(&'static str),
    Index(usize),
}

/// One advisory validation finding.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionDefect {
    /// JSON path of the offending value.
    pub path: Vec<DefectPathElem>,
    /// Human-readable description.
    pub message: String,
}

impl DirectionDefect {
    fn at(path: &[DefectPathElem], message: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            message: message.into(),
        }
    }

    /// Defect not tied to a particular path (decode failures, dropped sections).
    pub fn note(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DirectionDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "{}", self.message);
        }
        write!(f, "{}: {}", format_path(&self.path), self.message)
    }
}

fn format_path(path: &[DefectPathElem]) -> String {
    let mut s = String::from("$");
    for p in path {
        match *p {
            DefectPathElem::Field(name) => {
                s.push('.');
                s.push_str(name);
            }
            DefectPathElem::Index(i) => {
                s.push('[');
                s.push_str(&i.to_string());
                s.push(']');
            }
        }
    }
    s
}

use DefectPathElem::{Field, Index};

/// Validate a parsed direction document against the known line count.
///
/// Never fails; an empty result means the document is valid.
pub fn validate_direction(doc: Option<&Value>, line_count: usize) -> Vec<DirectionDefect> {
    let mut defects = Vec::new();
    let Some(doc) = doc.filter(|v| !v.is_null()) else {
        defects.push(DirectionDefect::at(&[], "direction document is missing"));
        return defects;
    };
    let Some(obj) = doc.as_object() else {
        defects.push(DirectionDefect::at(&[], "direction document must be an object"));
        return defects;
    };

    match obj.get("thesis").and_then(Value::as_str) {
        Some(t) if !t.trim().is_empty() => {}
        _ => defects.push(DirectionDefect::at(
            &[Field("thesis")],
            "thesis must be a non-empty string",
        )),
    }

    validate_palette(obj.get("palette"), &mut defects);
    validate_chapters(obj.get("chapters"), &mut defects);
    validate_storyboard(obj.get("storyboard"), line_count, &mut defects);
    validate_climax(obj.get("climax"), &mut defects);

    defects
}

/// Validate a typed document by way of its serialized form.
pub fn validate_document(doc: &CinematicDirection, line_count: usize) -> Vec<DirectionDefect> {
    match serde_json::to_value(doc) {
        Ok(v) => validate_direction(Some(&v), line_count),
        Err(e) => vec![DirectionDefect::note(format!("serialize direction: {e}"))],
    }
}

fn validate_palette(v: Option<&Value>, defects: &mut Vec<DirectionDefect>) {
    let Some(items) = v.and_then(Value::as_array) else {
        defects.push(DirectionDefect::at(
            &[Field("palette")],
            "palette must be an array of 3 hex colors",
        ));
        return;
    };
    if items.len() != 3 {
        defects.push(DirectionDefect::at(
            &[Field("palette")],
            format!("palette must have exactly 3 colors, got {}", items.len()),
        ));
    }
    for (i, c) in items.iter().enumerate() {
        if !c.as_str().is_some_and(Rgb::is_valid_hex) {
            defects.push(DirectionDefect::at(
                &[Field("palette"), Index(i)],
                "must be a 6-digit hex color",
            ));
        }
    }
}

fn validate_chapters(v: Option<&Value>, defects: &mut Vec<DirectionDefect>) {
    let Some(items) = v.and_then(Value::as_array) else {
        defects.push(DirectionDefect::at(
            &[Field("chapters")],
            "chapters must be an array",
        ));
        return;
    };
    if items.len() < MIN_CHAPTERS {
        defects.push(DirectionDefect::at(
            &[Field("chapters")],
            format!("at least {MIN_CHAPTERS} chapters required, got {}", items.len()),
        ));
    }

    let mut spans: Vec<(usize, f64, f64)> = Vec::with_capacity(items.len());
    for (i, ch) in items.iter().enumerate() {
        let start = ch.get("startRatio").and_then(Value::as_f64);
        let end = ch.get("endRatio").and_then(Value::as_f64);
        match (start, end) {
            (Some(s), Some(e))
                if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&e) && s < e =>
            {
                spans.push((i, s, e));
            }
            _ => defects.push(DirectionDefect::at(
                &[Field("chapters"), Index(i)],
                "startRatio/endRatio must be numbers in [0, 1] with start < end",
            )),
        }
        if !ch
            .get("dominantColor")
            .and_then(Value::as_str)
            .is_some_and(Rgb::is_valid_hex)
        {
            defects.push(DirectionDefect::at(
                &[Field("chapters"), Index(i), Field("dominantColor")],
                "must be a 6-digit hex color",
            ));
        }
    }

    spans.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (Some(first), Some(last)) = (spans.first(), spans.last()) else {
        return;
    };
    if first.1.abs() > RATIO_TOLERANCE {
        defects.push(DirectionDefect::at(
            &[Field("chapters"), Index(first.0), Field("startRatio")],
            "first chapter must start at 0",
        ));
    }
    if (last.2 - 1.0).abs() > RATIO_TOLERANCE {
        defects.push(DirectionDefect::at(
            &[Field("chapters"), Index(last.0), Field("endRatio")],
            "last chapter must end at 1",
        ));
    }
    for pair in spans.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if (next.1 - prev.2).abs() > RATIO_TOLERANCE {
            defects.push(DirectionDefect::at(
                &[Field("chapters"), Index(next.0), Field("startRatio")],
                format!(
                    "chapter leaves a gap or overlap: previous ends at {}, this starts at {}",
                    prev.2, next.1
                ),
            ));
        }
    }
}

fn validate_storyboard(v: Option<&Value>, line_count: usize, defects: &mut Vec<DirectionDefect>) {
    let Some(items) = v.and_then(Value::as_array) else {
        defects.push(DirectionDefect::at(
            &[Field("storyboard")],
            "storyboard must be an array",
        ));
        return;
    };
    if items.len() != line_count {
        defects.push(DirectionDefect::at(
            &[Field("storyboard")],
            format!(
                "storyboard has {} entries but there are {line_count} lines",
                items.len()
            ),
        ));
    }
    for (i, entry) in items.iter().enumerate() {
        if let Some(scale) = entry.get("iconScale")
            && !scale.is_null()
            && !scale.as_f64().is_some_and(|s| s.is_finite() && s > 0.0)
        {
            defects.push(DirectionDefect::at(
                &[Field("storyboard"), Index(i), Field("iconScale")],
                "iconScale must be a positive number",
            ));
        }
    }
}

fn validate_climax(v: Option<&Value>, defects: &mut Vec<DirectionDefect>) {
    let ratio = v
        .and_then(|c| c.get("timeRatio"))
        .and_then(Value::as_f64);
    match ratio {
        Some(r) if (0.0..=1.0).contains(&r) => {}
        Some(_) => defects.push(DirectionDefect::at(
            &[Field("climax"), Field("timeRatio")],
            "timeRatio must be in [0, 1]",
        )),
        None => defects.push(DirectionDefect::at(
            &[Field("climax"), Field("timeRatio")],
            "timeRatio is required",
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/direction/validate.rs"]
mod tests;
