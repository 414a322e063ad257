//! Prompt composition for the outline and content generation steps
//!
//! Prompts carry the instructions the response schema cannot express:
//! register, markdown conventions, image-prompt hygiene, and the corrective
//! feedback loop. Everything shape-related lives in [`crate::schema`].

use std::fmt::Write as _;

use deckgen_config::DeckRequest;
use deckgen_model::{DensityMode, Outline};
use deckgen_registry::all_specs;

pub(crate) const OUTLINE_SYSTEM_PROMPT: &str = "\
You are an expert presentation planner. Design the structure of a slide deck \
before any content is written.

Rules:
- Produce exactly the requested number of slides.
- Slide titles are short, distinct and unnumbered.
- Each slide lists 2-4 key points to cover.
- Order the slides as a narrative: opening, development, closing.
- Write every title and point in the requested output language.
- Optionally add deck-level presenter notes describing the through-line.

Respond with a single JSON object that satisfies the provided schema. \
No prose outside the JSON.";

/// Render the outline request for one deck
pub(crate) fn outline_user_prompt(request: &DeckRequest) -> String {
    let mut prompt = format!(
        "Topic: {}\n\nNumber of slides: {}\nOutput language: {}\n",
        request.prompt, request.n_slides, request.language
    );
    if let Some(summary) = &request.summary {
        let _ = write!(prompt, "\nSource material summary:\n{summary}\n");
    }
    prompt
}

/// Compose the content-generation system prompt for a density mode
///
/// The slide-type catalogue is rendered from the registry so the prompt can
/// never drift from the shapes the schema enforces.
pub(crate) fn content_system_prompt(mode: DensityMode) -> String {
    let mut prompt = String::from(
        "You are a professional presenter with years of experience creating clear, \
         engaging slide decks. Expand the outline supplied by the user into a complete \
         presentation, following every rule below.\n\n# Slide Types\n\
         Pick the slide type whose shape fits each outline entry:\n",
    );
    for spec in all_specs() {
        let _ = writeln!(prompt, "- **{}** ({}): {}", spec.id, spec.name, spec.usage);
    }

    prompt.push_str(WRITING_RULES);
    let _ = write!(
        prompt,
        "\n# Content Mode: {}\n{}\n",
        mode.as_str(),
        mode_rules(mode)
    );
    prompt.push_str(COMMON_CORRECTIONS);
    prompt.push_str(
        "\nRespond with a single JSON object that satisfies the provided schema. \
         No prose, no markdown fences.",
    );
    prompt
}

const WRITING_RULES: &str = "
# Writing Rules
- Write every piece of text in the requested output language.
- Vary slide types across the deck; never use the same type twice in a row.
- Bold all numbers and figures with **bold** markers in body and description text.
- Descriptions read as standalone prose. Never start with \"This slide\" or \"This presentation\".
- Image prompts describe one concrete professional scene and always end with \"don't include text in image\".
- Never ask an image for numbers, graphs, dashboards or report screenshots.
- Icon queries are three single-word terms ordered specific to generic, \
for example \"Led bulb\", \"bulb\", \"light\".
- Chart slides carry real numeric data only. Never repeat the same chart twice, \
and keep every series in a single unit.
";

const COMMON_CORRECTIONS: &str = "
# Common Corrections from Previous Attempts
- The body of a type-1 slide is a single prose string, never a list.
- The body of slide types 2, 3, 4, 6, 7 and 8 is a list of items, never a string.
- Slide types 6 and 8 must include a description field.
- Slide types 5 and 9 must include chart data.
- Every item needs a meaningful description, not a restatement of its heading.
";

const fn mode_rules(mode: DensityMode) -> &'static str {
    match mode {
        DensityMode::Compact => {
            "COMPACT MODE - ULTRA CONCISE CONTENT:
- Title: 3-5 words maximum
- Body: 10-20 words per point, keywords and key figures only
- Bullet points: short phrases, not sentences
- Style: scannable at a glance
- Example: \"Revenue up **25%**\""
        }
        DensityMode::Normal => {
            "NORMAL MODE - BALANCED PROFESSIONAL CONTENT:
- Title: 5-8 words
- Body: 25-40 words per point, complete sentences
- Bullet points: one clear statement each
- Style: professional and direct
- Example: \"Quarterly revenue grew **25%**, driven by strong enterprise demand.\""
        }
        DensityMode::Detailed => {
            "DETAILED MODE - COMPREHENSIVE EDUCATIONAL CONTENT:
- Title: 8-12 words allowed
- Body: 50-80 words per point with context and explanation
- Bullet points: full explanatory sentences
- Style: educational, understandable without a presenter
- Example: \"Quarterly revenue grew **25%** to **$4.2M**, driven primarily by \
enterprise demand; the new pricing tiers contributed roughly a third of that growth.\""
        }
    }
}

/// Render the outline as the content-generation user prompt
///
/// Corrections from a rejected attempt are appended verbatim so the next
/// attempt can fix exactly what was complained about.
pub(crate) fn content_user_prompt(
    outline: &Outline,
    language: &str,
    corrections: &[String],
) -> String {
    let mut prompt = format!("# {}\n", outline.title);
    for (position, slide) in outline.slides.iter().enumerate() {
        let _ = write!(prompt, "\n## Slide {}: {}\n", position + 1, slide.title);
        for point in &slide.points {
            let _ = writeln!(prompt, "- {point}");
        }
    }
    if let Some(notes) = &outline.notes {
        let _ = write!(prompt, "\nPresenter notes: {notes}\n");
    }
    let _ = write!(prompt, "\nOutput language: {language}\n");

    if !corrections.is_empty() {
        prompt.push_str(
            "\n# Corrections Required\n\
             The previous attempt violated the content rules. Fix every problem listed:\n",
        );
        for correction in corrections {
            let _ = writeln!(prompt, "- {correction}");
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use deckgen_model::OutlineSlide;

    use super::*;

    fn sample_outline() -> Outline {
        Outline {
            title: "Solar Power at Home".to_owned(),
            slides: vec![
                OutlineSlide {
                    title: "Why solar now".to_owned(),
                    points: vec!["falling panel prices".to_owned(), "grid independence".to_owned()],
                },
                OutlineSlide {
                    title: "Installation costs".to_owned(),
                    points: vec!["upfront vs amortized".to_owned()],
                },
            ],
            notes: Some("Keep the tone practical".to_owned()),
        }
    }

    #[test]
    fn test_content_system_prompt_lists_all_slide_types() {
        let prompt = content_system_prompt(DensityMode::Normal);
        for spec in all_specs() {
            assert!(
                prompt.contains(&format!("- **{}** ({})", spec.id, spec.name)),
                "catalogue entry for type {} missing",
                spec.id
            );
        }
        assert!(prompt.contains("# Content Mode: normal"));
        assert!(prompt.contains("NORMAL MODE - BALANCED PROFESSIONAL CONTENT"));
        assert!(prompt.contains("# Common Corrections from Previous Attempts"));
    }

    #[test]
    fn test_mode_blocks_differ() {
        let compact = content_system_prompt(DensityMode::Compact);
        let detailed = content_system_prompt(DensityMode::Detailed);
        assert!(compact.contains("ULTRA CONCISE"));
        assert!(!compact.contains("COMPREHENSIVE EDUCATIONAL"));
        assert!(detailed.contains("COMPREHENSIVE EDUCATIONAL"));
    }

    #[test]
    fn test_content_user_prompt_renders_outline() {
        let prompt = content_user_prompt(&sample_outline(), "English", &[]);
        assert!(prompt.starts_with("# Solar Power at Home\n"));
        assert!(prompt.contains("## Slide 1: Why solar now"));
        assert!(prompt.contains("- falling panel prices"));
        assert!(prompt.contains("## Slide 2: Installation costs"));
        assert!(prompt.contains("Presenter notes: Keep the tone practical"));
        assert!(prompt.contains("Output language: English"));
        assert!(!prompt.contains("# Corrections Required"));
    }

    #[test]
    fn test_corrections_are_appended() {
        let corrections = vec!["slide 1: the body field is missing".to_owned()];
        let prompt = content_user_prompt(&sample_outline(), "German", &corrections);
        assert!(prompt.contains("# Corrections Required"));
        assert!(prompt.contains("- slide 1: the body field is missing"));
    }

    #[test]
    fn test_outline_user_prompt_includes_summary_when_present() {
        let mut request = DeckRequest::new("the history of coffee", "/tmp/assets");
        assert!(!outline_user_prompt(&request).contains("Source material summary"));

        request.summary = Some("Coffee spread from Ethiopia through Yemen.".to_owned());
        let prompt = outline_user_prompt(&request);
        assert!(prompt.contains("Topic: the history of coffee"));
        assert!(prompt.contains("Number of slides: 8"));
        assert!(prompt.contains("Source material summary:\nCoffee spread"));
    }
}
