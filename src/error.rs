//! Pipeline-level error taxonomy
//!
//! Every failure that aborts a deck run is represented here. Asset fetch
//! failures are deliberately absent: they downgrade to placeholders inside
//! the enrichment engine and surface as warnings, never as errors.

use deckgen_config::ConfigError;
use deckgen_llm::LlmError;
use deckgen_registry::UnknownSlideType;
use thiserror::Error;

/// Errors that abort a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The outline step failed, so nothing downstream ran
    #[error("outline generation failed: {reason}")]
    OutlineGenerationFailed {
        reason: String,
        #[source]
        source: Option<LlmError>,
    },

    /// Content generation could not reach or use the model
    #[error("content generation failed")]
    GenerationTransport(#[source] LlmError),

    /// The model answered, but not with parseable deck JSON
    #[error("generated deck was not valid JSON: {message} (response began: {snippet:?})")]
    GenerationParse { message: String, snippet: String },

    /// The generator emitted a slide type outside the registry
    #[error(transparent)]
    UnknownSlideType(#[from] UnknownSlideType),

    /// Validation complaints survived every regeneration attempt
    #[error(
        "content failed validation after {attempts} attempts: {}",
        complaints.join("; ")
    )]
    ContentValidationFailed {
        attempts: u32,
        complaints: Vec<String>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Filesystem failure while preparing the asset directory
    #[error("asset directory setup failed")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failure_joins_complaints() {
        let err = PipelineError::ContentValidationFailed {
            attempts: 3,
            complaints: vec![
                "slide 0: the body field is missing".to_owned(),
                "slide 2: a type-5 slide (chart) requires a chart with kind, name and series"
                    .to_owned(),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("after 3 attempts"));
        assert!(text.contains("slide 0: the body field is missing; slide 2:"));
    }

    #[test]
    fn test_parse_error_reports_snippet() {
        let err = PipelineError::GenerationParse {
            message: "expected value at line 1 column 1".to_owned(),
            snippet: "Sure! Here is your deck:".to_owned(),
        };
        assert!(err.to_string().contains("Sure! Here is your deck:"));
    }

    #[test]
    fn test_unknown_slide_type_is_transparent() {
        let err = PipelineError::from(UnknownSlideType(42));
        assert_eq!(err.to_string(), UnknownSlideType(42).to_string());
    }
}
