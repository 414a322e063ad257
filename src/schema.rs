//! JSON response schemas for structured generation
//!
//! Schemas are assembled from the slide-type registry so that what the model
//! is asked for and what the builder validates are always the same shapes.
//! Every object is closed (`additionalProperties: false`) and lists all of
//! its properties as required, with nullable unions for optional fields, as
//! strict structured-output modes demand. Numeric bounds come from
//! [`deckgen_registry::limits_for`] for the active density mode.

use deckgen_llm::ResponseSchema;
use deckgen_model::DensityMode;
use deckgen_registry::{BodyShape, Bounds, ModeLimits, SlideTypeSpec, all_specs, limits_for};
use serde_json::{Map, Value, json};

/// Schema for the outline step, pinned to an exact slide count
pub(crate) fn outline_schema(n_slides: usize) -> ResponseSchema {
    ResponseSchema::new(
        "deck_outline",
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["title", "slides", "notes"],
            "properties": {
                "title": { "type": "string", "minLength": 1 },
                "slides": {
                    "type": "array",
                    "minItems": n_slides,
                    "maxItems": n_slides,
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["title", "points"],
                        "properties": {
                            "title": { "type": "string", "minLength": 1 },
                            "points": {
                                "type": "array",
                                "minItems": 2,
                                "maxItems": 4,
                                "items": { "type": "string" }
                            }
                        }
                    }
                },
                "notes": { "type": ["string", "null"] }
            }
        }),
    )
}

/// Schema for the content step: one variant per slide type, bounds per mode
pub(crate) fn content_schema(mode: DensityMode, n_slides: usize) -> ResponseSchema {
    let variants: Vec<Value> = all_specs()
        .iter()
        .filter_map(|spec| {
            limits_for(mode, i64::from(spec.id))
                .ok()
                .map(|limits| slide_variant(spec, &limits))
        })
        .collect();

    ResponseSchema::new(
        "deck_content",
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["title", "notes", "slides"],
            "properties": {
                "title": { "type": "string", "minLength": 1 },
                "notes": { "type": ["string", "null"] },
                "slides": {
                    "type": "array",
                    "minItems": n_slides,
                    "maxItems": n_slides,
                    "items": { "anyOf": variants }
                }
            }
        }),
    )
}

fn slide_variant(spec: &SlideTypeSpec, limits: &ModeLimits) -> Value {
    let mut properties = Map::new();
    let mut required = vec!["title".to_owned(), "body".to_owned()];

    properties.insert("title".to_owned(), bounded_string(limits.title));
    let body = match spec.body {
        BodyShape::Scalar => bounded_string(limits.body),
        BodyShape::Items => json!({
            "type": "array",
            "minItems": 1,
            "maxItems": limits.max_items,
            "items": item_schema(spec, limits),
        }),
    };
    properties.insert("body".to_owned(), body);

    if spec.requires_description {
        properties.insert("description".to_owned(), bounded_string(limits.description));
        required.push("description".to_owned());
    }
    if spec.slide_image {
        properties.insert(
            "image_prompt".to_owned(),
            bounded_string(limits.image_prompt),
        );
        required.push("image_prompt".to_owned());
    }
    if spec.requires_chart {
        properties.insert("chart".to_owned(), chart_schema());
        required.push("chart".to_owned());
    }

    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["type", "notes", "content"],
        "properties": {
            "type": { "const": spec.id },
            "notes": { "type": ["string", "null"] },
            "content": {
                "type": "object",
                "additionalProperties": false,
                "required": required,
                "properties": Value::Object(properties),
            }
        }
    })
}

fn item_schema(spec: &SlideTypeSpec, limits: &ModeLimits) -> Value {
    let mut properties = Map::new();
    let mut required = vec!["heading".to_owned(), "description".to_owned()];

    properties.insert("heading".to_owned(), bounded_string(limits.item_title));
    properties.insert(
        "description".to_owned(),
        bounded_string(limits.item_description),
    );

    if spec.item_images {
        properties.insert(
            "image_prompt".to_owned(),
            bounded_string(limits.image_prompt),
        );
        required.push("image_prompt".to_owned());
    }
    if spec.item_icons {
        properties.insert(
            "icon_query".to_owned(),
            json!({
                "type": "array",
                "minItems": 3,
                "maxItems": 3,
                "items": {
                    "type": "string",
                    "minLength": limits.icon_query.min,
                    "maxLength": limits.icon_query.max,
                }
            }),
        );
        required.push("icon_query".to_owned());
    }

    json!({
        "type": "object",
        "additionalProperties": false,
        "required": required,
        "properties": Value::Object(properties),
    })
}

fn chart_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["kind", "name", "x_label", "y_label", "categories", "series"],
        "properties": {
            "kind": { "type": "string", "enum": ["pie", "bar", "line"] },
            "name": { "type": "string" },
            "x_label": { "type": ["string", "null"] },
            "y_label": { "type": ["string", "null"] },
            "categories": {
                "type": "array",
                "minItems": 1,
                "items": { "type": "string" }
            },
            "series": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["name", "unit", "data"],
                    "properties": {
                        "name": { "type": "string" },
                        "unit": { "type": ["string", "null"] },
                        "data": {
                            "type": "array",
                            "minItems": 1,
                            "items": { "type": "number" }
                        }
                    }
                }
            }
        }
    })
}

fn bounded_string(bounds: Bounds) -> Value {
    json!({
        "type": "string",
        "minLength": bounds.min,
        "maxLength": bounds.max,
    })
}
