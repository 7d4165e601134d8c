use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{error::PatchError, value::Value};

/// Structural difference between two component values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Patch {
    /// Overwrite the target with a new value
    Replace(Value),
    /// Field-wise update of a map value
    Map(MapPatch),
    /// Element-wise update of a sequence value
    Seq(SeqPatch),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapPatch {
    pub changed: BTreeMap<String, Patch>,
    pub removed: BTreeSet<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SeqPatch {
    /// New length, present only when the length changed
    pub len: Option<usize>,
    pub changed: BTreeMap<usize, Patch>,
}

impl Patch {
    /// An empty patch leaves any map or sequence untouched
    pub fn is_empty(&self) -> bool {
        match self {
            Patch::Replace(_) => false,
            Patch::Map(map_patch) => map_patch.changed.is_empty() && map_patch.removed.is_empty(),
            Patch::Seq(seq_patch) => seq_patch.len.is_none() && seq_patch.changed.is_empty(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Patch::Replace(_) => "replace",
            Patch::Map(_) => "map",
            Patch::Seq(_) => "sequence",
        }
    }
}

/// Computes the patch that turns `old` into `new`.
///
/// Top-level map fields named in `excluded` are never diffed, so changes to
/// them are not replicated.
pub fn diff(old: &Value, new: &Value, excluded: &BTreeSet<String>) -> Patch {
    match diff_value(old, new, Some(excluded)) {
        Patch::Replace(value) => Patch::Replace(strip_fields(&value, excluded)),
        patch => patch,
    }
}

/// Applies `patch` onto a copy of `old`.
pub fn apply(old: &Value, patch: &Patch) -> Result<Value, PatchError> {
    let mut value = old.clone();
    let mut path = Vec::new();
    apply_in_place(&mut value, patch, &mut path)?;
    Ok(value)
}

/// Removes the top-level map fields named in `excluded`.
pub fn strip_fields(value: &Value, excluded: &BTreeSet<String>) -> Value {
    match value {
        Value::Map(fields) if !excluded.is_empty() => Value::Map(
            fields
                .iter()
                .filter(|(name, _)| !excluded.contains(*name))
                .map(|(name, field)| (name.clone(), field.clone()))
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn diff_value(old: &Value, new: &Value, excluded: Option<&BTreeSet<String>>) -> Patch {
    match (old, new) {
        (Value::Map(old_fields), Value::Map(new_fields)) => {
            let is_excluded =
                |name: &String| excluded.map_or(false, |excluded| excluded.contains(name));
            let mut map_patch = MapPatch::default();

            for (name, new_field) in new_fields {
                if is_excluded(name) {
                    continue;
                }
                match old_fields.get(name) {
                    Some(old_field) if old_field == new_field => {}
                    Some(old_field) => {
                        map_patch
                            .changed
                            .insert(name.clone(), diff_value(old_field, new_field, None));
                    }
                    None => {
                        map_patch
                            .changed
                            .insert(name.clone(), Patch::Replace(new_field.clone()));
                    }
                }
            }
            for name in old_fields.keys() {
                if !new_fields.contains_key(name) && !is_excluded(name) {
                    map_patch.removed.insert(name.clone());
                }
            }

            Patch::Map(map_patch)
        }
        (Value::Seq(old_items), Value::Seq(new_items)) => {
            let mut seq_patch = SeqPatch::default();
            if old_items.len() != new_items.len() {
                seq_patch.len = Some(new_items.len());
            }
            for (index, new_item) in new_items.iter().enumerate() {
                match old_items.get(index) {
                    Some(old_item) if old_item == new_item => {}
                    Some(old_item) => {
                        seq_patch
                            .changed
                            .insert(index, diff_value(old_item, new_item, None));
                    }
                    None => {
                        seq_patch
                            .changed
                            .insert(index, Patch::Replace(new_item.clone()));
                    }
                }
            }

            Patch::Seq(seq_patch)
        }
        _ => Patch::Replace(new.clone()),
    }
}

fn apply_in_place(
    target: &mut Value,
    patch: &Patch,
    path: &mut Vec<String>,
) -> Result<(), PatchError> {
    match patch {
        Patch::Replace(value) => {
            *target = value.clone();
            Ok(())
        }
        Patch::Map(map_patch) => {
            let Value::Map(fields) = target else {
                return Err(incompatible(path, patch, target.type_name()));
            };

            for name in &map_patch.removed {
                fields.remove(name);
            }
            for (name, field_patch) in &map_patch.changed {
                path.push(name.clone());
                if let Some(field) = fields.get_mut(name) {
                    apply_in_place(field, field_patch, path)?;
                } else if let Patch::Replace(value) = field_patch {
                    fields.insert(name.clone(), value.clone());
                } else {
                    return Err(incompatible(path, field_patch, "missing field"));
                }
                path.pop();
            }
            Ok(())
        }
        Patch::Seq(seq_patch) => {
            let Value::Seq(items) = target else {
                return Err(incompatible(path, patch, target.type_name()));
            };

            if let Some(len) = seq_patch.len {
                items.truncate(len);
            }
            for (index, item_patch) in &seq_patch.changed {
                path.push(index.to_string());
                if let Some(item) = items.get_mut(*index) {
                    apply_in_place(item, item_patch, path)?;
                } else {
                    match item_patch {
                        Patch::Replace(value) if *index == items.len() => items.push(value.clone()),
                        _ => {
                            return Err(PatchError::MissingElement {
                                path: render_path(path),
                                index: *index,
                                base_len: items.len(),
                            })
                        }
                    }
                }
                path.pop();
            }
            if let Some(len) = seq_patch.len {
                if items.len() != len {
                    return Err(PatchError::MissingElement {
                        path: render_path(path),
                        index: items.len(),
                        base_len: items.len(),
                    });
                }
            }
            Ok(())
        }
    }
}

fn incompatible(path: &[String], patch: &Patch, found: &'static str) -> PatchError {
    PatchError::Incompatible {
        path: render_path(path),
        expected: patch.type_name(),
        found,
    }
}

fn render_path(path: &[String]) -> String {
    if path.is_empty() {
        "$".to_string()
    } else {
        format!("$.{}", path.join("."))
    }
}
