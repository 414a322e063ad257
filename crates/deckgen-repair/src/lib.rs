//! Repair passes for malformed generated slide content
//!
//! Generators routinely deviate from the requested shape: items split into
//! alternating heading/description halves, fields renamed or dropped, charts
//! delivered as parallel label/value arrays. The functions here are
//! deterministic and total: they normalize raw JSON in place where a safe
//! normalization exists, and report a [`Complaint`] where one does not.
//!
//! Complaints are not errors. They feed the bounded regenerate-with-feedback
//! loop: each message is written to be pasted back at the generator as a
//! correction instruction.

use std::fmt;

use deckgen_registry::{BodyShape, SlideTypeSpec};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

/// A structural defect repair could not fix locally
///
/// The message is phrased as an instruction a generator can act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complaint {
    pub slide_index: usize,
    pub message: String,
}

impl Complaint {
    #[must_use]
    pub fn new(slide_index: usize, message: impl Into<String>) -> Self {
        Self {
            slide_index,
            message: message.into(),
        }
    }
}

impl fmt::Display for Complaint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slide {}: {}", self.slide_index, self.message)
    }
}

/// Repair one slide's content object in place
///
/// Runs every normalization pass that applies to the slide type: heading
/// aliasing, alternating-pair merging, missing-field synthesis, and chart
/// normalization. Returns the complaints the passes could not resolve.
pub fn repair_content(
    content: &mut Value,
    spec: &SlideTypeSpec,
    slide_index: usize,
) -> Vec<Complaint> {
    let mut complaints = Vec::new();

    let Some(obj) = content.as_object_mut() else {
        complaints.push(Complaint::new(
            slide_index,
            "content must be a JSON object with a title and a body",
        ));
        return complaints;
    };

    if spec.slide_image && !has_nonempty_str(obj, "image_prompt") {
        let title = obj
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let prompt = synthesize_image_prompt(&title);
        warn!(
            slide = slide_index,
            slide_type = spec.id,
            "image_prompt missing, synthesized from title"
        );
        obj.insert("image_prompt".to_owned(), json!(prompt));
    }

    if spec.requires_description && !has_nonempty_str(obj, "description") {
        complaints.push(Complaint::new(
            slide_index,
            format!(
                "a type-{} slide ({}) requires a lead-in description field",
                spec.id, spec.name
            ),
        ));
    }

    // Accept the older field name before checking the chart requirement
    if !obj.contains_key("chart") {
        if let Some(graph) = obj.remove("graph") {
            obj.insert("chart".to_owned(), graph);
        }
    }
    if let Some(chart) = obj.get_mut("chart") {
        normalize_chart(chart);
    } else if spec.requires_chart {
        complaints.push(Complaint::new(
            slide_index,
            format!(
                "a type-{} slide ({}) requires a chart with kind, name and series",
                spec.id, spec.name
            ),
        ));
    }

    match (spec.body, obj.get_mut("body")) {
        (_, None) => complaints.push(Complaint::new(slide_index, "the body field is missing")),
        (BodyShape::Scalar, Some(Value::String(_))) => {}
        (BodyShape::Scalar, Some(Value::Array(_))) => complaints.push(Complaint::new(
            slide_index,
            format!(
                "the body of a type-{} slide must be a single prose string, \
                 but a list of items was generated",
                spec.id
            ),
        )),
        (BodyShape::Items, Some(Value::Array(items))) => {
            repair_items(items, spec, slide_index);
        }
        (BodyShape::Items, Some(Value::String(_))) => complaints.push(Complaint::new(
            slide_index,
            format!(
                "the body of a type-{} slide must be a list of items, \
                 but a single prose string was generated",
                spec.id
            ),
        )),
        (_, Some(_)) => complaints.push(Complaint::new(
            slide_index,
            "the body field has an unexpected JSON type",
        )),
    }

    complaints
}

fn repair_items(items: &mut Vec<Value>, spec: &SlideTypeSpec, slide_index: usize) {
    for item in items.iter_mut() {
        apply_heading_alias(item);
    }

    if merge_alternating_pairs(items) {
        debug!(
            slide = slide_index,
            merged = items.len(),
            "merged alternating heading/description pairs"
        );
    }

    for item in items.iter_mut() {
        let Some(obj) = item.as_object_mut() else {
            continue;
        };
        fill_item_defaults(obj, spec, slide_index);
    }
}

/// Copy a `title` key to `heading` when `heading` is absent
///
/// Any leftover `title` key is dropped so the two names never coexist.
pub fn apply_heading_alias(item: &mut Value) {
    let Some(obj) = item.as_object_mut() else {
        return;
    };
    let title = obj.remove("title");
    if !obj.contains_key("heading") {
        if let Some(title) = title {
            obj.insert("heading".to_owned(), title);
        }
    }
}

/// Merge an alternating heading-only/description-only list into pairs
///
/// Applies only when the list is non-empty with even length and EVERY item
/// strictly alternates: objects at even indices carry a heading and no
/// description, objects at odd indices a description and no heading. Each
/// adjacent pair becomes one item (the odd object's keys win on conflict).
/// Returns whether a merge happened. Merged output never matches the
/// pattern again, so the pass is idempotent.
pub fn merge_alternating_pairs(items: &mut Vec<Value>) -> bool {
    if items.is_empty() || items.len() % 2 != 0 || !is_strictly_alternating(items) {
        return false;
    }

    let merged: Vec<Value> = items
        .chunks(2)
        .map(|pair| {
            let mut combined = Map::new();
            for half in pair {
                if let Some(obj) = half.as_object() {
                    for (key, value) in obj {
                        combined.insert(key.clone(), value.clone());
                    }
                }
            }
            Value::Object(combined)
        })
        .collect();
    *items = merged;
    true
}

fn is_strictly_alternating(items: &[Value]) -> bool {
    items.iter().enumerate().all(|(j, item)| {
        let Some(obj) = item.as_object() else {
            return false;
        };
        if j % 2 == 0 {
            obj.contains_key("heading") && !obj.contains_key("description")
        } else {
            obj.contains_key("description") && !obj.contains_key("heading")
        }
    })
}

fn fill_item_defaults(obj: &mut Map<String, Value>, spec: &SlideTypeSpec, slide_index: usize) {
    if !has_nonempty_str(obj, "heading") {
        obj.insert("heading".to_owned(), json!("Item"));
    }
    let heading = obj
        .get("heading")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    if !has_nonempty_str(obj, "description") {
        warn!(
            slide = slide_index,
            heading = %heading,
            "item description missing, synthesized"
        );
        obj.insert(
            "description".to_owned(),
            json!(format!("Details about {heading}")),
        );
    }

    // A single-term icon query from an older generator comes as a bare string
    if let Some(Value::String(term)) = obj.get("icon_query") {
        let term = term.clone();
        obj.insert("icon_query".to_owned(), json!([term]));
    }

    if spec.item_images && !has_nonempty_str(obj, "image_prompt") {
        warn!(
            slide = slide_index,
            heading = %heading,
            "item image_prompt missing, synthesized"
        );
        obj.insert(
            "image_prompt".to_owned(),
            json!(synthesize_image_prompt(&heading)),
        );
    }

    if spec.item_icons && !has_icon_terms(obj) {
        let icon_word = heading.split_whitespace().next().unwrap_or("info");
        warn!(
            slide = slide_index,
            heading = %heading,
            "item icon_query missing, synthesized"
        );
        obj.insert(
            "icon_query".to_owned(),
            json!([icon_word, "icon", "symbol"]),
        );
    }
}

fn synthesize_image_prompt(heading: &str) -> String {
    format!("Professional image representing {heading}, no text in image")
}

/// Normalize the loose chart shapes generators produce into the typed one
///
/// Handles the `type` → `kind` rename, missing chart/series names, axis
/// field aliases, a chart-level `unit` (pushed down into each series), and
/// the parallel `labels`/`values` form (converted into one series).
pub fn normalize_chart(chart: &mut Value) {
    let Some(obj) = chart.as_object_mut() else {
        return;
    };

    if !obj.contains_key("kind") {
        if let Some(kind) = obj.remove("type") {
            obj.insert("kind".to_owned(), kind);
        }
    }
    if !has_nonempty_str(obj, "name") {
        obj.insert("name".to_owned(), json!("Chart"));
    }
    for (alias, canonical) in [("x_axis", "x_label"), ("y_axis", "y_label")] {
        if !obj.contains_key(canonical) {
            if let Some(value) = obj.remove(alias) {
                obj.insert(canonical.to_owned(), value);
            }
        }
    }

    let unit = obj.get("unit").and_then(Value::as_str).map(str::to_owned);
    obj.remove("unit");

    let has_series = obj
        .get("series")
        .and_then(Value::as_array)
        .is_some_and(|s| !s.is_empty());
    if !has_series {
        let labels = obj.remove("labels");
        let values = obj.remove("values");
        if let (Some(labels), Some(Value::Array(values))) = (labels, values) {
            obj.insert("categories".to_owned(), labels);
            obj.insert(
                "series".to_owned(),
                json!([{ "name": "Data", "data": values }]),
            );
        }
    }

    if let Some(series) = obj.get_mut("series").and_then(Value::as_array_mut) {
        for entry in series {
            let Some(entry) = entry.as_object_mut() else {
                continue;
            };
            if !has_nonempty_str(entry, "name") {
                entry.insert("name".to_owned(), json!("Data"));
            }
            if let Some(unit) = &unit {
                if !unit.is_empty() && !has_nonempty_str(entry, "unit") {
                    entry.insert("unit".to_owned(), json!(unit));
                }
            }
        }
    }
}

fn has_nonempty_str(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty())
}

fn has_icon_terms(obj: &Map<String, Value>) -> bool {
    obj.get("icon_query")
        .and_then(Value::as_array)
        .is_some_and(|terms| !terms.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_registry::spec_for;

    fn items(value: Value) -> Vec<Value> {
        value.as_array().cloned().unwrap()
    }

    #[test]
    fn test_merge_combines_alternating_pairs() {
        let mut body = items(json!([
            {"heading": "Speed"},
            {"description": "Handles requests in under a millisecond"},
            {"heading": "Safety"},
            {"description": "No data races by construction"},
        ]));
        assert!(merge_alternating_pairs(&mut body));
        assert_eq!(body.len(), 2);
        assert_eq!(body[0]["heading"], "Speed");
        assert_eq!(
            body[0]["description"],
            "Handles requests in under a millisecond"
        );
        assert_eq!(body[1]["heading"], "Safety");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut body = items(json!([
            {"heading": "One"},
            {"description": "First"},
            {"heading": "Two"},
            {"description": "Second"},
        ]));
        merge_alternating_pairs(&mut body);
        let after_first = body.clone();
        assert!(!merge_alternating_pairs(&mut body));
        assert_eq!(body, after_first);
    }

    #[test]
    fn test_merge_skips_odd_length_lists() {
        let mut body = items(json!([
            {"heading": "One"},
            {"description": "First"},
            {"heading": "Two"},
        ]));
        let before = body.clone();
        assert!(!merge_alternating_pairs(&mut body));
        assert_eq!(body, before);
    }

    #[test]
    fn test_merge_requires_strict_alternation() {
        // A complete item at an even index means the list is already paired
        let mut body = items(json!([
            {"heading": "One", "description": "Already complete"},
            {"description": "First"},
        ]));
        let before = body.clone();
        assert!(!merge_alternating_pairs(&mut body));
        assert_eq!(body, before);

        // A non-object entry breaks the pattern
        let mut body = items(json!([{"heading": "One"}, "loose text"]));
        let before = body.clone();
        assert!(!merge_alternating_pairs(&mut body));
        assert_eq!(body, before);
    }

    #[test]
    fn test_merge_skips_empty_list() {
        let mut body: Vec<Value> = Vec::new();
        assert!(!merge_alternating_pairs(&mut body));
    }

    #[test]
    fn test_heading_alias_copies_title() {
        let mut item = json!({"title": "Growth", "description": "Up"});
        apply_heading_alias(&mut item);
        assert_eq!(item["heading"], "Growth");
        assert!(item.get("title").is_none());

        // An existing heading wins; the stray title is dropped
        let mut item = json!({"heading": "Kept", "title": "Dropped", "description": "d"});
        apply_heading_alias(&mut item);
        assert_eq!(item["heading"], "Kept");
        assert!(item.get("title").is_none());
    }

    #[test]
    fn test_missing_description_synthesized_from_heading() {
        let spec = spec_for(2).unwrap();
        let mut content = json!({
            "title": "Why Rust",
            "body": [{"heading": "Tooling"}],
        });
        let complaints = repair_content(&mut content, spec, 0);
        assert!(complaints.is_empty());
        assert_eq!(content["body"][0]["description"], "Details about Tooling");
    }

    #[test]
    fn test_missing_item_image_prompt_synthesized() {
        let spec = spec_for(4).unwrap();
        let mut content = json!({
            "title": "Product lineup",
            "body": [{"heading": "Solar panel", "description": "400W monocrystalline"}],
        });
        repair_content(&mut content, spec, 0);
        assert_eq!(
            content["body"][0]["image_prompt"],
            "Professional image representing Solar panel, no text in image"
        );
    }

    #[test]
    fn test_missing_icon_query_uses_first_heading_word() {
        let spec = spec_for(7).unwrap();
        let mut content = json!({
            "title": "Pillars",
            "body": [{"heading": "Led bulb efficiency", "description": "Uses 80% less power"}],
        });
        repair_content(&mut content, spec, 0);
        assert_eq!(content["body"][0]["icon_query"], json!(["Led", "icon", "symbol"]));
    }

    #[test]
    fn test_missing_icon_query_with_empty_heading_falls_back_to_info() {
        let spec = spec_for(7).unwrap();
        let mut content = json!({
            "title": "Pillars",
            "body": [{"description": "An unnamed point"}],
        });
        repair_content(&mut content, spec, 0);
        assert_eq!(content["body"][0]["heading"], "Item");
        assert_eq!(
            content["body"][0]["icon_query"],
            json!(["Item", "icon", "symbol"])
        );
    }

    #[test]
    fn test_bare_string_icon_query_wrapped_into_list() {
        let spec = spec_for(7).unwrap();
        let mut content = json!({
            "title": "Pillars",
            "body": [{"heading": "Security", "description": "Defense in depth", "icon_query": "lock"}],
        });
        repair_content(&mut content, spec, 0);
        assert_eq!(content["body"][0]["icon_query"], json!(["lock"]));
    }

    #[test]
    fn test_slide_level_image_prompt_synthesized_from_title() {
        let spec = spec_for(1).unwrap();
        let mut content = json!({
            "title": "The road ahead",
            "body": "A short closing paragraph about what comes next.",
        });
        let complaints = repair_content(&mut content, spec, 3);
        assert!(complaints.is_empty());
        assert_eq!(
            content["image_prompt"],
            "Professional image representing The road ahead, no text in image"
        );
    }

    #[test]
    fn test_scalar_body_delivered_as_list_is_flagged_not_coerced() {
        let spec = spec_for(1).unwrap();
        let mut content = json!({
            "title": "Intro",
            "image_prompt": "A sunrise over a data center",
            "body": [{"heading": "Wrong", "description": "Shape"}],
        });
        let complaints = repair_content(&mut content, spec, 2);
        assert_eq!(complaints.len(), 1);
        assert!(complaints[0].message.contains("single prose string"));
        // Body left untouched for the regeneration pass
        assert!(content["body"].is_array());
    }

    #[test]
    fn test_list_body_delivered_as_scalar_is_flagged() {
        let spec = spec_for(2).unwrap();
        let mut content = json!({"title": "Agenda", "body": "one long paragraph"});
        let complaints = repair_content(&mut content, spec, 0);
        assert_eq!(complaints.len(), 1);
        assert!(complaints[0].message.contains("list of items"));
    }

    #[test]
    fn test_missing_required_chart_is_a_complaint() {
        let spec = spec_for(5).unwrap();
        let mut content = json!({"title": "Revenue", "body": "Revenue grew strongly."});
        let complaints = repair_content(&mut content, spec, 1);
        assert_eq!(complaints.len(), 1);
        assert!(complaints[0].message.contains("chart"));
    }

    #[test]
    fn test_missing_required_description_is_a_complaint() {
        let spec = spec_for(6).unwrap();
        let mut content = json!({
            "title": "Rollout phases",
            "body": [{"heading": "Pilot", "description": "Two teams, four weeks"}],
        });
        let complaints = repair_content(&mut content, spec, 4);
        assert_eq!(complaints.len(), 1);
        assert!(complaints[0].message.contains("description"));
    }

    #[test]
    fn test_chart_labels_values_normalized_into_series() {
        let mut chart = json!({
            "type": "bar",
            "unit": "USD",
            "labels": ["Q1", "Q2", "Q3"],
            "values": [10, 20, 30],
        });
        normalize_chart(&mut chart);
        assert_eq!(chart["kind"], "bar");
        assert_eq!(chart["name"], "Chart");
        assert_eq!(chart["categories"], json!(["Q1", "Q2", "Q3"]));
        assert_eq!(chart["series"][0]["name"], "Data");
        assert_eq!(chart["series"][0]["unit"], "USD");
        assert_eq!(chart["series"][0]["data"], json!([10, 20, 30]));
        assert!(chart.get("unit").is_none());
    }

    #[test]
    fn test_chart_axis_aliases_renamed() {
        let mut chart = json!({
            "kind": "line",
            "name": "Adoption",
            "x_axis": "Month",
            "y_axis": "Users",
            "series": [{"name": "2025", "data": [1, 2, 4, 8]}],
        });
        normalize_chart(&mut chart);
        assert_eq!(chart["x_label"], "Month");
        assert_eq!(chart["y_label"], "Users");
        assert!(chart.get("x_axis").is_none());
    }

    #[test]
    fn test_graph_key_accepted_for_chart() {
        let spec = spec_for(9).unwrap();
        let mut content = json!({
            "title": "Head to head",
            "body": [{"heading": "Us", "description": "Faster cold starts"}],
            "graph": {
                "type": "pie",
                "labels": ["A", "B"],
                "values": [60, 40],
            },
        });
        let complaints = repair_content(&mut content, spec, 0);
        assert!(complaints.is_empty());
        assert_eq!(content["chart"]["kind"], "pie");
        assert!(content.get("graph").is_none());
    }

    #[test]
    fn test_content_must_be_an_object() {
        let spec = spec_for(2).unwrap();
        let mut content = json!("just a string");
        let complaints = repair_content(&mut content, spec, 6);
        assert_eq!(complaints.len(), 1);
        assert!(complaints[0].to_string().starts_with("slide 6:"));
    }
}
