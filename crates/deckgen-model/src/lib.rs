//! Core data model for deckgen presentations
//!
//! This crate defines the typed representation of a generated deck: density
//! modes, outlines, slide content shapes, charts, and the transient
//! [`Presentation`] that owns its slides until the caller takes over.
//!
//! The types here are deliberately free of generation logic. Repair of raw
//! generated JSON happens before these types are constructed; asset paths
//! are filled in after.

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Density mode controlling text-length and item-count bounds
///
/// Modes form a closed set with strictly increasing bounds: `compact` decks
/// carry the least text per slide, `detailed` the most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityMode {
    Compact,
    #[default]
    Normal,
    Detailed,
}

impl DensityMode {
    /// Parse a mode name string into a `DensityMode`
    ///
    /// # Errors
    ///
    /// Returns an error if the mode name is not recognized.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "normal" => Ok(Self::Normal),
            "detailed" => Ok(Self::Detailed),
            _ => Err(format!(
                "Unknown density mode '{}'. Available modes: compact, normal, detailed",
                s
            )),
        }
    }

    /// Get the mode name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Normal => "normal",
            Self::Detailed => "detailed",
        }
    }
}

/// Deck outline produced before content generation
///
/// The outline fixes the deck title and the per-slide topics; content
/// generation expands each entry into a fully shaped slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub slides: Vec<OutlineSlide>,
    /// Deck-level presenter notes, carried through to the presentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One outline entry: a slide title plus its key points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineSlide {
    pub title: String,
    #[serde(default)]
    pub points: Vec<String>,
}

/// Chart kind for slide types that render data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
}

/// A named data series within a chart
///
/// Every series uses a single consistent unit; mixing units within one
/// series is a generator contract violation the prompt forbids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub data: Vec<f64>,
}

/// Chart attached to a data slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    /// Category tick labels shared by all series
    #[serde(default, alias = "labels", skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

/// One item in a list-bodied slide
///
/// `heading` is the canonical name; generators that emit `title` instead are
/// normalized before this type is constructed, but the alias is accepted
/// here as well. After repair, `heading` is always populated and
/// `description` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(alias = "title")]
    pub heading: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    /// Icon search terms ordered specific to generic, at most three
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_query: Option<Vec<String>>,
    /// Resolved image path, filled by asset enrichment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Utf8PathBuf>,
    /// Resolved icon path, filled by asset enrichment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Utf8PathBuf>,
}

impl ContentItem {
    /// Create an item with a heading and description
    #[must_use]
    pub fn new(heading: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Set the image prompt
    #[must_use]
    pub fn with_image_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.image_prompt = Some(prompt.into());
        self
    }

    /// Set the icon query terms
    #[must_use]
    pub fn with_icon_query(mut self, terms: Vec<String>) -> Self {
        self.icon_query = Some(terms);
        self
    }
}

/// Slide body: scalar text or a list of items, dictated by the slide type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlideBody {
    Text(String),
    Items(Vec<ContentItem>),
}

impl SlideBody {
    /// Borrow the scalar text, if this body is scalar
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Items(_) => None,
        }
    }

    /// Borrow the item list, if this body is a list
    #[must_use]
    pub fn as_items(&self) -> Option<&[ContentItem]> {
        match self {
            Self::Text(_) => None,
            Self::Items(items) => Some(items),
        }
    }

    /// Mutably borrow the item list, if this body is a list
    pub fn as_items_mut(&mut self) -> Option<&mut Vec<ContentItem>> {
        match self {
            Self::Text(_) => None,
            Self::Items(items) => Some(items),
        }
    }

    #[must_use]
    pub fn is_items(&self) -> bool {
        matches!(self, Self::Items(_))
    }
}

/// Typed content of one slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideContent {
    pub title: String,
    pub body: SlideBody,
    /// Lead-in description, required by slide types 6 and 8
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Slide-level image prompt, required by slide types 1 and 3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    /// Chart payload, required by slide types 5 and 9
    #[serde(default, alias = "graph", skip_serializing_if = "Option::is_none")]
    pub chart: Option<Chart>,
}

/// One fully built slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Stable identifier; assigned during build when the generator omits one
    pub id: String,
    #[serde(rename = "type")]
    pub slide_type: u8,
    /// 0-based position, contiguous within the presentation
    pub index: usize,
    pub content: SlideContent,
    /// Speaker notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Resolved slide-level image path, filled by asset enrichment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Utf8PathBuf>,
}

/// A generated deck, transient until handed to the caller
///
/// The presentation exclusively owns its slides for the duration of the
/// pipeline run; asset enrichment writes resolved paths into slide slots
/// before the value is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    pub title: String,
    pub slides: Vec<Slide>,
    pub language: String,
    pub mode: DensityMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Deck-level presenter notes emitted by the generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Presentation {
    /// Number of slides in the deck
    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}
