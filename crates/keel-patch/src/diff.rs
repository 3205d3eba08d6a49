//! Merge-patch generation: the inverse of application.

use serde_json::{Map, Value};

/// Generate the merge-patch that turns `original` into `updated`.
///
/// For two objects the patch contains only the members that differ: changed
/// and added members carry their new value (objects recursing), removed
/// members become `null`. For any other pairing the patch is `updated`
/// itself. The round-trip `apply_patch(original, diff_values(original,
/// updated)) == updated` holds whenever `updated` contains no `null`
/// members, the RFC 7396 blind spot.
pub fn diff_values(original: &Value, updated: &Value) -> Value {
    match (original, updated) {
        (Value::Object(old_members), Value::Object(new_members)) => {
            let mut patch = Map::new();

            for (name, old_value) in old_members {
                match new_members.get(name) {
                    Some(new_value) if new_value != old_value => {
                        patch.insert(name.clone(), diff_values(old_value, new_value));
                    }
                    Some(_) => {}
                    None => {
                        patch.insert(name.clone(), Value::Null);
                    }
                }
            }

            for (name, new_value) in new_members {
                if !old_members.contains_key(name) {
                    patch.insert(name.clone(), new_value.clone());
                }
            }

            Value::Object(patch)
        }
        _ => updated.clone(),
    }
}
