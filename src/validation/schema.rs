//! Schema validation for the raw configuration document.

use serde_json::Value;

use super::{ValidationIssue, ValidationResult};

const SECTIONS: [&str; 6] = ["site", "artist", "images", "theme", "texts", "categories"];

const COMPLEXITIES: [&str; 3] = ["low", "medium", "high"];

/// Validates the document's structure: required sections, category shape,
/// and near-miss key names.
pub fn validate(document: &Value) -> ValidationResult {
    let mut result = ValidationResult::new();

    let map = match document.as_object() {
        Some(map) => map,
        None => {
            result.add(ValidationIssue::error(
                "(root)",
                "Document must be a JSON object",
            ));
            return result;
        }
    };

    for section in SECTIONS {
        if !map.contains_key(section) {
            result.add(ValidationIssue::error(
                section,
                format!("Required section '{}' is missing", section),
            ));
        }
    }

    // Unknown top-level keys are tolerated but flagged, with a
    // did-you-mean hint when one is close to a known section name.
    for key in map.keys() {
        if SECTIONS.contains(&key.as_str()) {
            continue;
        }
        let mut issue =
            ValidationIssue::warning(key.clone(), format!("Unknown section '{}'", key));
        if let Some(closest) = closest_section(key) {
            issue = issue.with_suggestion(format!("Did you mean '{}'?", closest));
        }
        result.add(issue);
    }

    if let Some(categories) = map.get("categories") {
        result.extend(validate_categories(categories));
    }

    result
}

fn validate_categories(categories: &Value) -> ValidationResult {
    let mut result = ValidationResult::new();

    let items = match categories.as_array() {
        Some(items) => items,
        None => {
            result.add(ValidationIssue::error(
                "categories",
                "Section 'categories' must be an array",
            ));
            return result;
        }
    };

    let mut seen_ids: Vec<&str> = Vec::new();

    for (i, item) in items.iter().enumerate() {
        let prefix = format!("categories[{}]", i);

        let category = match item.as_object() {
            Some(category) => category,
            None => {
                result.add(ValidationIssue::error(
                    &prefix,
                    "Category must be an object",
                ));
                continue;
            }
        };

        match category.get("id").and_then(Value::as_str) {
            Some(id) if !id.trim().is_empty() => {
                if seen_ids.contains(&id) {
                    result.add(ValidationIssue::error(
                        format!("{}.id", prefix),
                        format!("Duplicate category id '{}'", id),
                    ));
                } else {
                    seen_ids.push(id);
                }
            }
            _ => {
                result.add(ValidationIssue::error(
                    format!("{}.id", prefix),
                    "Category id is required",
                ));
            }
        }

        if category
            .get("name")
            .and_then(Value::as_str)
            .map(|n| n.trim().is_empty())
            .unwrap_or(true)
        {
            result.add(ValidationIssue::warning(
                format!("{}.name", prefix),
                "Category has no name; its card will render with an empty title",
            ));
        }

        if let Some(complexity) = category.get("complexity").and_then(Value::as_str) {
            if !COMPLEXITIES.contains(&complexity) {
                let mut issue = ValidationIssue::error(
                    format!("{}.complexity", prefix),
                    format!("Unknown complexity '{}'", complexity),
                );
                if let Some(closest) = closest(complexity, &COMPLEXITIES) {
                    issue = issue.with_suggestion(format!("Did you mean '{}'?", closest));
                }
                result.add(issue);
            }
        }
    }

    result
}

fn closest_section(key: &str) -> Option<&'static str> {
    closest(key, &SECTIONS)
}

/// Returns the candidate within edit distance 2 of the input, if any.
fn closest<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (strsim::levenshtein(&input.to_lowercase(), c), *c))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, c)| c)
}
