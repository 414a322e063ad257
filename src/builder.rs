//! Typed slide construction from raw generated JSON
//!
//! The builder runs after generation and before enrichment: each raw slide
//! entry is repaired in place, checked against the registry bounds for the
//! active density mode, and deserialized into [`Slide`]. Over-long text is
//! truncated silently with a trailing ellipsis; everything the builder
//! cannot fix locally becomes a [`Complaint`] that feeds the
//! regenerate-with-feedback loop. An unregistered slide type is the one
//! defect no amount of regeneration feedback fixes, so it aborts the run.

use deckgen_model::{DensityMode, Slide, SlideBody, SlideContent};
use deckgen_registry::{Bounds, UnknownSlideType, limits_for, spec_for};
use deckgen_repair::{Complaint, repair_content};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

const ELLIPSIS: &str = "...";

/// Why a generated deck could not be turned into slides
#[derive(Debug)]
pub(crate) enum BuildError {
    /// Fatal: the generator invented a slide type
    UnknownType(UnknownSlideType),
    /// Retryable: the deck violated bounds or shapes repair could not fix
    Rejected(Vec<Complaint>),
}

/// Build typed slides from the raw `slides` array of a generated deck
///
/// Slide indices are assigned from array position, so the generated order is
/// the presentation order.
pub(crate) fn build_slides(
    raw_slides: Vec<Value>,
    mode: DensityMode,
) -> Result<Vec<Slide>, BuildError> {
    let mut slides = Vec::with_capacity(raw_slides.len());
    let mut complaints = Vec::new();

    for (index, mut entry) in raw_slides.into_iter().enumerate() {
        let type_id = entry.get("type").and_then(Value::as_i64).unwrap_or(0);
        let spec = spec_for(type_id).map_err(BuildError::UnknownType)?;
        let limits = limits_for(mode, type_id).map_err(BuildError::UnknownType)?;

        let notes = entry
            .get("notes")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let Some(mut content) = entry
            .as_object_mut()
            .and_then(|slide| slide.remove("content"))
        else {
            complaints.push(Complaint::new(index, "the content object is missing"));
            continue;
        };

        let before = complaints.len();
        complaints.extend(repair_content(&mut content, spec, index));
        let repair_complained = complaints.len() > before;

        let mut parsed: SlideContent = match serde_json::from_value(content) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Repair complaints already name the defect; the serde
                // message would only restate it less readably.
                if !repair_complained {
                    complaints.push(Complaint::new(
                        index,
                        format!("the content does not fit the type-{} shape: {e}", spec.id),
                    ));
                }
                continue;
            }
        };

        enforce_limits(&mut parsed, &limits, index, &mut complaints);

        slides.push(Slide {
            id: Uuid::new_v4().to_string(),
            slide_type: spec.id,
            index,
            content: parsed,
            notes,
            image: None,
        });
    }

    if complaints.is_empty() {
        Ok(slides)
    } else {
        Err(BuildError::Rejected(complaints))
    }
}

/// Apply the mode bounds to one parsed slide
///
/// Generated fields under their minimum become complaints. Fields repair may
/// have synthesized (item text, image prompts) are never flagged for being
/// short, only trimmed when long.
fn enforce_limits(
    content: &mut SlideContent,
    limits: &deckgen_registry::ModeLimits,
    index: usize,
    complaints: &mut Vec<Complaint>,
) {
    clamp_text(&mut content.title, limits.title, "title", index, complaints);

    match &mut content.body {
        SlideBody::Text(text) => clamp_text(text, limits.body, "body", index, complaints),
        SlideBody::Items(items) => {
            if items.is_empty() {
                complaints.push(Complaint::new(index, "the body needs at least one item"));
            }
            if items.len() > limits.max_items {
                debug!(
                    slide = index,
                    kept = limits.max_items,
                    dropped = items.len() - limits.max_items,
                    "trimming surplus items"
                );
                items.truncate(limits.max_items);
            }
            for item in items.iter_mut() {
                truncate_over_max(&mut item.heading, limits.item_title.max);
                truncate_over_max(&mut item.description, limits.item_description.max);
                if let Some(prompt) = &mut item.image_prompt {
                    truncate_over_max(prompt, limits.image_prompt.max);
                }
            }
        }
    }

    if let Some(description) = &mut content.description {
        clamp_text(description, limits.description, "description", index, complaints);
    }
    if let Some(prompt) = &mut content.image_prompt {
        truncate_over_max(prompt, limits.image_prompt.max);
    }
}

fn clamp_text(
    text: &mut String,
    bounds: Bounds,
    field: &str,
    index: usize,
    complaints: &mut Vec<Complaint>,
) {
    if truncate_over_max(text, bounds.max) {
        debug!(slide = index, field, max = bounds.max, "truncated over-long field");
    } else if text.chars().count() < bounds.min {
        complaints.push(Complaint::new(
            index,
            format!(
                "the {field} needs at least {} characters, only {} were written",
                bounds.min,
                text.chars().count()
            ),
        ));
    }
}

/// Trim to the bound, counting characters rather than bytes
fn truncate_over_max(text: &mut String, max: usize) -> bool {
    if text.chars().count() <= max {
        return false;
    }
    let mut trimmed: String = text.chars().take(max.saturating_sub(ELLIPSIS.len())).collect();
    trimmed.push_str(ELLIPSIS);
    *text = trimmed;
    true
}
