//! Deep merge of configuration documents.

use serde_json::Value;

/// Merges a partial update into a base document, returning a new value.
///
/// For each key in `update`: if both sides hold objects the merge recurses,
/// otherwise the update value replaces the base value wholesale (arrays and
/// primitives are never element-merged). Keys of `base` absent from `update`
/// are preserved verbatim. Neither input is mutated.
///
/// The operation has sequential-application semantics only; associativity
/// across three or more documents is not guaranteed.
pub fn deep_merge(base: &Value, update: &Value) -> Value {
    match (base, update) {
        (Value::Object(base_map), Value::Object(update_map)) => {
            let mut merged = base_map.clone();
            for (key, update_value) in update_map {
                match merged.get(key) {
                    Some(base_value) if base_value.is_object() && update_value.is_object() => {
                        merged.insert(key.clone(), deep_merge(base_value, update_value));
                    }
                    _ => {
                        merged.insert(key.clone(), update_value.clone());
                    }
                }
            }
            Value::Object(merged)
        }
        _ => update.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preserves_base_keys_absent_from_update() {
        let base = json!({"site": {"title": "InkMaster", "tagline": "Arte"}, "artist": {"name": "Alejandro"}});
        let update = json!({"site": {"tagline": "Nuevo"}});

        let merged = deep_merge(&base, &update);

        assert_eq!(merged["site"]["title"], "InkMaster");
        assert_eq!(merged["site"]["tagline"], "Nuevo");
        assert_eq!(merged["artist"]["name"], "Alejandro");
    }

    #[test]
    fn replaces_arrays_wholesale() {
        let base = json!({"categories": [{"id": "a"}, {"id": "b"}]});
        let update = json!({"categories": [{"id": "c"}]});

        let merged = deep_merge(&base, &update);

        assert_eq!(merged["categories"], json!([{"id": "c"}]));
    }

    #[test]
    fn empty_update_is_identity() {
        let base = json!({"site": {"title": "InkMaster"}, "theme": {"colors": {"primary": "#D4AF37"}}});

        let merged = deep_merge(&base, &json!({}));

        assert_eq!(merged, base);
    }

    #[test]
    fn does_not_mutate_inputs() {
        let base = json!({"a": {"b": 1}});
        let update = json!({"a": {"c": 2}});
        let base_before = base.clone();
        let update_before = update.clone();

        let _ = deep_merge(&base, &update);

        assert_eq!(base, base_before);
        assert_eq!(update, update_before);
    }

    #[test]
    fn sequential_application_semantics() {
        // merge(merge(a, b), c) is the contract; equality with
        // merge(a, merge(b, c)) is incidental, not guaranteed. Pin the
        // sequential result.
        let a = json!({"x": {"p": 1, "q": 1}});
        let b = json!({"x": [1, 2]});
        let c = json!({"x": {"q": 3}});

        let sequential = deep_merge(&deep_merge(&a, &b), &c);

        // b replaced the object with an array; c then replaces the array.
        assert_eq!(sequential["x"], json!({"q": 3}));
    }

    #[test]
    fn non_object_update_replaces_entirely() {
        let base = json!({"a": 1});
        let update = json!([1, 2, 3]);

        assert_eq!(deep_merge(&base, &update), update);
    }
}
