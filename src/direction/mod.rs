//! Ingestion of generator-produced direction documents.
//!
//! Text goes through [`repair::repair_json_text`], then advisory validation, lenient decoding
//! and synthesis of whatever is missing. The result is a [`DirectionOutcome`] that forces each
//! caller to decide what to do with degraded data.

pub(crate) mod icons;
pub(crate) mod interpret;
pub(crate) mod repair;
pub(crate) mod synthesize;
pub(crate) mod validate;

use serde_json::Value;

use crate::direction::icons::{IconPlan, IconPlannerConfig, plan_icons};
use crate::direction::repair::{RepairStage, repair_json_text};
use crate::direction::synthesize::{SynthesisAction, fallback_direction, synthesize_missing};
use crate::direction::validate::{DirectionDefect, validate_direction};
use crate::model::direction::CinematicDirection;
use crate::model::lyrics::LyricLine;

/// Result of ingesting one generator response.
#[derive(Clone, Debug, PartialEq)]
pub enum DirectionOutcome {
    /// The document validated cleanly.
    Ok(CinematicDirection),
    /// Usable after repair/synthesis; the defects describe what was wrong.
    Partial(CinematicDirection, Vec<DirectionDefect>),
    /// Nothing could be recovered; carries the raw text for diagnostics.
    Unparseable(String),
}

impl DirectionOutcome {
    /// Return `true` for [`DirectionOutcome::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Recovered document, if any.
    pub fn document(&self) -> Option<&CinematicDirection> {
        match self {
            Self::Ok(doc) | Self::Partial(doc, _) => Some(doc),
            Self::Unparseable(_) => None,
        }
    }

    /// Defects found during ingestion (empty for `Ok` and `Unparseable`).
    pub fn defects(&self) -> &[DirectionDefect] {
        match self {
            Self::Partial(_, d) => d,
            _ => &[],
        }
    }

    /// Short label for logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ok(_) => "ok",
            Self::Partial(..) => "partial",
            Self::Unparseable(_) => "unparseable",
        }
    }

    /// Document to play: the recovered one, or the built-in fallback.
    pub fn into_playable(self, lines: &[LyricLine]) -> CinematicDirection {
        match self {
            Self::Ok(doc) | Self::Partial(doc, _) => doc,
            Self::Unparseable(_) => fallback_direction(lines),
        }
    }
}

/// Repair, validate, decode and backfill raw generator text.
#[tracing::instrument(skip(raw, lines), fields(bytes = raw.len(), lines = lines.len()))]
pub fn ingest_direction(raw: &str, lines: &[LyricLine]) -> DirectionOutcome {
    let repaired = match repair_json_text(raw) {
        Ok(r) => r,
        Err(failure) => {
            tracing::warn!(
                field = "document",
                action = "fallback",
                bytes = failure.raw.len(),
                "direction text is unparseable"
            );
            return DirectionOutcome::Unparseable(failure.raw);
        }
    };
    let mut outcome = ingest_value(&repaired.value, lines);
    if repaired.stage == RepairStage::Truncated {
        let note = DirectionDefect::note("document was truncated; recovered the complete prefix");
        outcome = match outcome {
            DirectionOutcome::Ok(doc) => DirectionOutcome::Partial(doc, vec![note]),
            DirectionOutcome::Partial(doc, mut defects) => {
                defects.push(note);
                DirectionOutcome::Partial(doc, defects)
            }
            other => other,
        };
    }
    tracing::debug!(
        stage = repaired.stage.as_str(),
        outcome = outcome.kind(),
        defects = outcome.defects().len(),
        "direction ingested"
    );
    outcome
}

/// Validate, decode and backfill an already-parsed document.
pub fn ingest_value(value: &Value, lines: &[LyricLine]) -> DirectionOutcome {
    let mut defects = validate_direction(Some(value), lines.len());
    let (mut doc, dropped) = CinematicDirection::from_value_lenient(value);
    defects.extend(dropped.into_iter().map(DirectionDefect::note));
    synthesize_missing(&mut doc, lines);
    if defects.is_empty() {
        DirectionOutcome::Ok(doc)
    } else {
        for d in &defects {
            tracing::warn!(defect = %d, "direction defect");
        }
        DirectionOutcome::Partial(doc, defects)
    }
}

/// A direction ready for playback.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedDirection {
    /// Complete document.
    pub doc: CinematicDirection,
    /// Backfills applied by synthesis.
    pub actions: Vec<SynthesisAction>,
    /// Icons added by the planner.
    pub icons: IconPlan,
}

/// Synthesis followed by icon planning; what playback sessions consume.
pub fn prepare_direction(
    mut doc: CinematicDirection,
    lines: &[LyricLine],
    cfg: &IconPlannerConfig,
) -> PreparedDirection {
    let actions = synthesize_missing(&mut doc, lines);
    let icons = plan_icons(&mut doc, lines, cfg);
    PreparedDirection {
        doc,
        actions,
        icons,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/direction/ingest.rs"]
mod tests;
