use super::{patch::Patch, value::Value};

/// Visits every entity reference held in `value`.
///
/// Traversal uses an explicit stack, so arbitrarily deep values cannot
/// overflow the call stack.
pub fn for_each_entity_mut<F: FnMut(&mut u64)>(value: &mut Value, mut visit: F) {
    let mut stack: Vec<&mut Value> = vec![value];
    while let Some(current) = stack.pop() {
        match current {
            Value::Entity(entity) => visit(entity),
            Value::Seq(items) => stack.extend(items.iter_mut()),
            Value::Map(fields) => stack.extend(fields.values_mut()),
            _ => {}
        }
    }
}

/// Visits every entity reference carried by the values inside `patch`.
pub fn for_each_entity_in_patch_mut<F: FnMut(&mut u64)>(patch: &mut Patch, mut visit: F) {
    enum Node<'a> {
        Patch(&'a mut Patch),
        Value(&'a mut Value),
    }

    let mut stack: Vec<Node> = vec![Node::Patch(patch)];
    while let Some(current) = stack.pop() {
        match current {
            Node::Patch(Patch::Replace(value)) => stack.push(Node::Value(value)),
            Node::Patch(Patch::Map(map_patch)) => {
                stack.extend(map_patch.changed.values_mut().map(Node::Patch))
            }
            Node::Patch(Patch::Seq(seq_patch)) => {
                stack.extend(seq_patch.changed.values_mut().map(Node::Patch))
            }
            Node::Value(Value::Entity(entity)) => visit(entity),
            Node::Value(Value::Seq(items)) => stack.extend(items.iter_mut().map(Node::Value)),
            Node::Value(Value::Map(fields)) => {
                stack.extend(fields.values_mut().map(Node::Value))
            }
            Node::Value(_) => {}
        }
    }
}
