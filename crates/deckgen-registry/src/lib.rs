//! Slide type registry and density-mode limits
//!
//! A static table maps each slide type id (1–9) to its content shape and to
//! per-mode text/item bounds. Lookups never allocate; `limits_for` resolves
//! the per-type multipliers at call time so validation is a table consult,
//! not a type construction.
//!
//! Unknown ids are a hard error everywhere. Generators that emit an id
//! outside 1–9 have violated their contract, and defaulting would mask that.

use deckgen_model::DensityMode;

/// Number of registered slide types
pub const SLIDE_TYPE_COUNT: usize = 9;

/// Error for slide type ids outside the registered 1–9 range
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown slide type {0}: expected an id between 1 and 9")]
pub struct UnknownSlideType(pub i64);

/// Body shape a slide type demands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// Scalar prose body
    Scalar,
    /// List of content items
    Items,
}

impl BodyShape {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar text",
            Self::Items => "list of items",
        }
    }
}

/// Static shape description for one slide type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideTypeSpec {
    pub id: u8,
    /// Short human name, used in the generation catalogue and in logs
    pub name: &'static str,
    /// When the generator should pick this type
    pub usage: &'static str,
    pub body: BodyShape,
    /// Chart payload is mandatory
    pub requires_chart: bool,
    /// Lead-in description is mandatory
    pub requires_description: bool,
    /// Slide carries one slide-level image prompt
    pub slide_image: bool,
    /// Every item carries its own image prompt
    pub item_images: bool,
    /// Every item carries its own icon query
    pub item_icons: bool,
}

static SPECS: [SlideTypeSpec; SLIDE_TYPE_COUNT] = [
    SlideTypeSpec {
        id: 1,
        name: "text with image",
        usage: "an opening, closing, or narrative slide: one prose paragraph beside a single image",
        body: BodyShape::Scalar,
        requires_chart: false,
        requires_description: false,
        slide_image: true,
        item_images: false,
        item_icons: false,
    },
    SlideTypeSpec {
        id: 2,
        name: "plain list",
        usage: "a straightforward enumeration of points, no imagery",
        body: BodyShape::Items,
        requires_chart: false,
        requires_description: false,
        slide_image: false,
        item_images: false,
        item_icons: false,
    },
    SlideTypeSpec {
        id: 3,
        name: "list with image",
        usage: "an enumeration supported by one shared illustrative image",
        body: BodyShape::Items,
        requires_chart: false,
        requires_description: false,
        slide_image: true,
        item_images: false,
        item_icons: false,
    },
    SlideTypeSpec {
        id: 4,
        name: "visual list",
        usage: "a small set of items where each item deserves its own image",
        body: BodyShape::Items,
        requires_chart: false,
        requires_description: false,
        slide_image: false,
        item_images: true,
        item_icons: false,
    },
    SlideTypeSpec {
        id: 5,
        name: "chart with commentary",
        usage: "a single metric or trend: short prose next to one chart",
        body: BodyShape::Scalar,
        requires_chart: true,
        requires_description: false,
        slide_image: false,
        item_images: false,
        item_icons: false,
    },
    SlideTypeSpec {
        id: 6,
        name: "described list",
        usage: "an enumeration that needs a lead-in description before the items",
        body: BodyShape::Items,
        requires_chart: false,
        requires_description: true,
        slide_image: false,
        item_images: false,
        item_icons: false,
    },
    SlideTypeSpec {
        id: 7,
        name: "icon list",
        usage: "a list of concepts, each marked with a small icon",
        body: BodyShape::Items,
        requires_chart: false,
        requires_description: false,
        slide_image: false,
        item_images: false,
        item_icons: true,
    },
    SlideTypeSpec {
        id: 8,
        name: "described visual list",
        usage: "a described enumeration where each item also carries its own image",
        body: BodyShape::Items,
        requires_chart: false,
        requires_description: true,
        slide_image: false,
        item_images: true,
        item_icons: false,
    },
    SlideTypeSpec {
        id: 9,
        name: "list with chart",
        usage: "a comparison or breakdown: items alongside one supporting chart",
        body: BodyShape::Items,
        requires_chart: true,
        requires_description: false,
        slide_image: false,
        item_images: false,
        item_icons: false,
    },
];

/// Look up the spec for a slide type id
///
/// # Errors
///
/// Returns [`UnknownSlideType`] for any id outside 1–9. There is no default
/// type; an out-of-range id always fails.
pub fn spec_for(type_id: i64) -> Result<&'static SlideTypeSpec, UnknownSlideType> {
    if (1..=SLIDE_TYPE_COUNT as i64).contains(&type_id) {
        Ok(&SPECS[(type_id - 1) as usize])
    } else {
        Err(UnknownSlideType(type_id))
    }
}

/// All registered slide type specs, in id order
#[must_use]
pub fn all_specs() -> &'static [SlideTypeSpec; SLIDE_TYPE_COUNT] {
    &SPECS
}

/// Inclusive character-count bounds for one text field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: usize,
    pub max: usize,
}

/// Resolved numeric limits for one {mode, slide type} pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeLimits {
    pub title: Bounds,
    pub body: Bounds,
    pub description: Bounds,
    pub item_title: Bounds,
    pub item_description: Bounds,
    pub image_prompt: Bounds,
    pub icon_query: Bounds,
    pub max_items: usize,
}

static COMPACT_LIMITS: ModeLimits = ModeLimits {
    title: Bounds { min: 5, max: 40 },
    body: Bounds { min: 20, max: 150 },
    description: Bounds { min: 15, max: 80 },
    item_title: Bounds { min: 3, max: 25 },
    item_description: Bounds { min: 15, max: 60 },
    image_prompt: Bounds { min: 10, max: 60 },
    icon_query: Bounds { min: 5, max: 25 },
    max_items: 3,
};

static NORMAL_LIMITS: ModeLimits = ModeLimits {
    title: Bounds { min: 10, max: 70 },
    body: Bounds { min: 80, max: 400 },
    description: Bounds { min: 60, max: 150 },
    item_title: Bounds { min: 8, max: 50 },
    item_description: Bounds { min: 60, max: 150 },
    image_prompt: Bounds { min: 15, max: 100 },
    icon_query: Bounds { min: 10, max: 40 },
    max_items: 5,
};

static DETAILED_LIMITS: ModeLimits = ModeLimits {
    title: Bounds { min: 15, max: 100 },
    body: Bounds { min: 200, max: 1200 },
    description: Bounds { min: 150, max: 400 },
    item_title: Bounds { min: 10, max: 80 },
    item_description: Bounds { min: 150, max: 400 },
    image_prompt: Bounds { min: 20, max: 180 },
    icon_query: Bounds { min: 10, max: 60 },
    max_items: 8,
};

/// Base limits for a density mode, before per-type adjustment
#[must_use]
pub fn base_limits(mode: DensityMode) -> &'static ModeLimits {
    match mode {
        DensityMode::Compact => &COMPACT_LIMITS,
        DensityMode::Normal => &NORMAL_LIMITS,
        DensityMode::Detailed => &DETAILED_LIMITS,
    }
}

/// Per-type (body-max, max-items) multipliers
///
/// Chart and image-heavy layouts leave less room for prose, so their body
/// budget shrinks; image-per-item layouts cap the item count harder.
const fn adjustments(type_id: u8) -> (f64, f64) {
    match type_id {
        1 => (1.2, 1.0),
        3 => (0.8, 1.2),
        4 => (1.0, 0.8),
        5 => (0.6, 1.0),
        6 => (0.5, 1.0),
        7 => (0.7, 1.0),
        8 => (0.6, 1.0),
        9 => (0.8, 1.0),
        _ => (1.0, 1.0),
    }
}

/// Resolve the numeric bounds for a {mode, slide type} pair
///
/// Applies the per-type multipliers to the mode's base body maximum and item
/// cap, truncating toward zero.
///
/// # Errors
///
/// Returns [`UnknownSlideType`] for any id outside 1–9.
pub fn limits_for(mode: DensityMode, type_id: i64) -> Result<ModeLimits, UnknownSlideType> {
    let spec = spec_for(type_id)?;
    let (body_factor, items_factor) = adjustments(spec.id);
    let base = base_limits(mode);

    let mut limits = *base;
    limits.body.max = (base.body.max as f64 * body_factor) as usize;
    limits.max_items = (base.max_items as f64 * items_factor) as usize;
    Ok(limits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_for_accepts_all_registered_ids() {
        for id in 1..=9_i64 {
            let spec = spec_for(id).unwrap();
            assert_eq!(i64::from(spec.id), id);
        }
    }

    #[test]
    fn test_spec_for_rejects_out_of_range_ids() {
        for id in [0, 10, -3, 47, 200, i64::MIN, i64::MAX] {
            assert_eq!(spec_for(id), Err(UnknownSlideType(id)));
        }
    }

    #[test]
    fn test_unknown_slide_type_message_names_the_id() {
        let err = spec_for(47).unwrap_err();
        assert!(err.to_string().contains("47"));
    }

    #[test]
    fn test_scalar_body_types() {
        for id in [1, 5] {
            assert_eq!(spec_for(id).unwrap().body, BodyShape::Scalar);
        }
        for id in [2, 3, 4, 6, 7, 8, 9] {
            assert_eq!(spec_for(id).unwrap().body, BodyShape::Items);
        }
    }

    #[test]
    fn test_chart_and_description_requirements() {
        for id in 1..=9_i64 {
            let spec = spec_for(id).unwrap();
            assert_eq!(spec.requires_chart, matches!(id, 5 | 9), "type {}", id);
            assert_eq!(spec.requires_description, matches!(id, 6 | 8), "type {}", id);
        }
    }

    #[test]
    fn test_asset_field_requirements() {
        for id in 1..=9_i64 {
            let spec = spec_for(id).unwrap();
            assert_eq!(spec.slide_image, matches!(id, 1 | 3), "type {}", id);
            assert_eq!(spec.item_images, matches!(id, 4 | 8), "type {}", id);
            assert_eq!(spec.item_icons, id == 7, "type {}", id);
        }
    }

    #[test]
    fn test_mode_bounds_strictly_increase() {
        let compact = base_limits(DensityMode::Compact);
        let normal = base_limits(DensityMode::Normal);
        let detailed = base_limits(DensityMode::Detailed);

        assert!(compact.body.max < normal.body.max);
        assert!(normal.body.max < detailed.body.max);
        assert!(compact.title.max < normal.title.max);
        assert!(normal.title.max < detailed.title.max);
        assert!(compact.item_description.max < normal.item_description.max);
        assert!(normal.item_description.max < detailed.item_description.max);
        assert!(compact.max_items < normal.max_items);
        assert!(normal.max_items < detailed.max_items);
    }

    #[test]
    fn test_body_multiplier_applies_to_max_only() {
        // Type 6 halves the body budget
        let limits = limits_for(DensityMode::Normal, 6).unwrap();
        assert_eq!(limits.body.max, 200);
        assert_eq!(limits.body.min, 80);

        // Type 1 gets a fifth more room
        let limits = limits_for(DensityMode::Normal, 1).unwrap();
        assert_eq!(limits.body.max, 480);

        // Type 2 is unadjusted
        let limits = limits_for(DensityMode::Normal, 2).unwrap();
        assert_eq!(limits.body.max, 400);
        assert_eq!(limits.max_items, 5);
    }

    #[test]
    fn test_item_multiplier_truncates_toward_zero() {
        // 3 * 1.2 truncates back to 3; 5 * 1.2 reaches 6; 8 * 1.2 truncates to 9
        assert_eq!(limits_for(DensityMode::Compact, 3).unwrap().max_items, 3);
        assert_eq!(limits_for(DensityMode::Normal, 3).unwrap().max_items, 6);
        assert_eq!(limits_for(DensityMode::Detailed, 3).unwrap().max_items, 9);

        // 3 * 0.8 truncates to 2; 5 * 0.8 is 4; 8 * 0.8 truncates to 6
        assert_eq!(limits_for(DensityMode::Compact, 4).unwrap().max_items, 2);
        assert_eq!(limits_for(DensityMode::Normal, 4).unwrap().max_items, 4);
        assert_eq!(limits_for(DensityMode::Detailed, 4).unwrap().max_items, 6);
    }

    #[test]
    fn test_limits_for_unknown_type_fails() {
        assert!(limits_for(DensityMode::Normal, 0).is_err());
        assert!(limits_for(DensityMode::Detailed, 12).is_err());
    }
}
