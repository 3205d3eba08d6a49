//! Merge-patch application per RFC 7396.

use serde_json::{Map, Value};

/// Apply `patch` to `target`, returning the patched document.
///
/// If `patch` is an object, it is merged member-wise into `target`: a `null`
/// member removes the corresponding target member, any other member value is
/// recursively merged over it. If `patch` is anything other than an object,
/// it replaces `target` entirely.
pub fn apply_patch(target: &Value, patch: &Value) -> Value {
    let Value::Object(patch_members) = patch else {
        return patch.clone();
    };

    let mut result = match target {
        Value::Object(members) => members.clone(),
        // A non-object target is discarded; the patch rebuilds from empty.
        _ => Map::new(),
    };

    for (name, patch_value) in patch_members {
        if patch_value.is_null() {
            result.remove(name);
        } else {
            let merged = match result.get(name) {
                Some(current) => apply_patch(current, patch_value),
                None => apply_patch(&Value::Null, patch_value),
            };
            result.insert(name.clone(), merged);
        }
    }

    Value::Object(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replaces_scalar_members() {
        let target = json!({"a": "b"});
        let patch = json!({"a": "c"});
        assert_eq!(apply_patch(&target, &patch), json!({"a": "c"}));
    }

    #[test]
    fn adds_new_members() {
        let target = json!({"a": "b"});
        let patch = json!({"b": "c"});
        assert_eq!(apply_patch(&target, &patch), json!({"a": "b", "b": "c"}));
    }

    #[test]
    fn null_removes_members() {
        let target = json!({"a": "b"});
        let patch = json!({"a": null});
        assert_eq!(apply_patch(&target, &patch), json!({}));
    }

    #[test]
    fn null_for_absent_member_is_noop() {
        let target = json!({"a": "b", "b": "c"});
        let patch = json!({"a": null});
        assert_eq!(apply_patch(&target, &patch), json!({"b": "c"}));
    }

    #[test]
    fn arrays_are_replaced_wholesale() {
        let target = json!({"a": ["b"]});
        let patch = json!({"a": "c"});
        assert_eq!(apply_patch(&target, &patch), json!({"a": "c"}));

        let target = json!({"a": "c"});
        let patch = json!({"a": ["b"]});
        assert_eq!(apply_patch(&target, &patch), json!({"a": ["b"]}));
    }

    #[test]
    fn nested_objects_merge_recursively() {
        let target = json!({"a": {"b": "c"}});
        let patch = json!({"a": {"b": "d", "c": null}});
        assert_eq!(apply_patch(&target, &patch), json!({"a": {"b": "d"}}));
    }

    #[test]
    fn patch_over_scalar_discards_it() {
        let target = json!({"a": [{"b": "c"}]});
        let patch = json!({"a": [1]});
        assert_eq!(apply_patch(&target, &patch), json!({"a": [1]}));

        let target = json!({"e": null});
        let patch = json!({"a": 1});
        assert_eq!(apply_patch(&target, &patch), json!({"e": null, "a": 1}));
    }

    #[test]
    fn non_object_patch_replaces_target() {
        let target = json!({"a": "b"});
        assert_eq!(apply_patch(&target, &json!(["c"])), json!(["c"]));
        assert_eq!(apply_patch(&target, &json!(null)), json!(null));
        assert_eq!(apply_patch(&json!(["a", "b"]), &json!(["c", "d"])), json!(["c", "d"]));
    }

    #[test]
    fn object_patch_over_array_rebuilds_from_empty() {
        let target = json!(["a", "b"]);
        let patch = json!({"a": "b"});
        assert_eq!(apply_patch(&target, &patch), json!({"a": "b"}));
    }

    #[test]
    fn deep_removal_inside_addition() {
        let target = json!({});
        let patch = json!({"a": {"bb": {"ccc": null}}});
        assert_eq!(apply_patch(&target, &patch), json!({"a": {"bb": {}}}));
    }
}
